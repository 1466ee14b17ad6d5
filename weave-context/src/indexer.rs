//! Resource Indexer (`§4.3`, C3).
//!
//! Turns MCP resources and tool results into embedded vector store rows.
//! Tool results get one extra pass: referenced-resource expansion, which
//! walks the result JSON for `resource_uri` fields and indexes whatever they
//! point at, so a tool that merely names a recipe still makes that recipe's
//! full text retrievable next turn.

use serde_json::Value;
use weave_types::{BoxedResourceReader, IndexedKind, McpError};

use crate::framing::{frame_resource, frame_tool_result};
use weave_embed::EmbeddingService;
use weave_vectorstore::VectorStore;

/// Indexes resources and tool results into the vector store.
pub struct ResourceIndexer<'a> {
    embeddings: &'a EmbeddingService,
    store: &'a VectorStore,
    reader: &'a BoxedResourceReader,
}

impl<'a> ResourceIndexer<'a> {
    /// Build an indexer over the shared embedding service, vector store, and
    /// resource reader for one facade instance.
    #[must_use]
    pub fn new(
        embeddings: &'a EmbeddingService,
        store: &'a VectorStore,
        reader: &'a BoxedResourceReader,
    ) -> Self {
        Self {
            embeddings,
            store,
            reader,
        }
    }

    /// Index one resource under `res://<uri>`. Embedding failure is logged
    /// and the item is skipped, not propagated — a single bad resource must
    /// not block the rest of the catalog.
    pub async fn index_resource(
        &self,
        uri: &str,
        description: Option<&str>,
        content: &str,
        now_millis: i64,
    ) {
        let framed = frame_resource(uri, description, content);
        match self.embeddings.embed(&framed).await {
            Ok(embedding) => {
                if let Err(err) = self
                    .store
                    .add(uri, &framed, embedding, IndexedKind::Resource, now_millis)
                    .await
                {
                    tracing::warn!(%uri, error = %err, "failed to store indexed resource");
                }
            }
            Err(err) => {
                tracing::warn!(%uri, error = %err, "failed to embed resource, skipping");
            }
        }
    }

    /// Index a full resource catalog, e.g. at `bootServer` time.
    pub async fn index_resources(&self, resources: &[(String, Option<String>, String)], now_millis: i64) {
        for (uri, description, content) in resources {
            self.index_resource(uri, description.as_deref(), content, now_millis).await;
        }
    }

    /// Index a tool execution's arguments/result under
    /// `tool://<toolName>/<executionId>`, then expand any `resource_uri`
    /// fields found in the result by fetching and indexing those resources
    /// too.
    pub async fn index_tool_result(
        &self,
        tool_name: &str,
        execution_id: &str,
        arguments: &Value,
        result: &Value,
        now_millis: i64,
    ) {
        let uri = format!("tool://{tool_name}/{execution_id}");
        let framed = frame_tool_result(tool_name, arguments, result);
        match self.embeddings.embed(&framed).await {
            Ok(embedding) => {
                if let Err(err) = self
                    .store
                    .add(&uri, &framed, embedding, IndexedKind::ToolResult, now_millis)
                    .await
                {
                    tracing::warn!(%uri, error = %err, "failed to store indexed tool result");
                }
            }
            Err(err) => {
                tracing::warn!(%uri, error = %err, "failed to embed tool result, skipping");
            }
        }

        for referenced_uri in find_referenced_resource_uris(result) {
            self.expand_referenced_resource(&referenced_uri, now_millis).await;
        }
    }

    async fn expand_referenced_resource(&self, uri: &str, now_millis: i64) {
        match self.reader.read_resource(uri).await {
            Ok(content) => {
                self.index_resource(uri, content.description.as_deref(), &content.text, now_millis)
                    .await;
            }
            Err(err) => {
                tracing::warn!(%uri, error = %err, "failed to expand referenced resource, skipping");
            }
        }
    }
}

/// Recursively walk `value` for string fields named `resource_uri`.
fn find_referenced_resource_uris(value: &Value) -> Vec<String> {
    let mut found = Vec::new();
    collect_referenced_resource_uris(value, &mut found);
    found
}

fn collect_referenced_resource_uris(value: &Value, found: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == "resource_uri" {
                    if let Some(uri) = child.as_str() {
                        found.push(uri.to_string());
                    }
                } else {
                    collect_referenced_resource_uris(child, found);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_referenced_resource_uris(item, found);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use weave_types::ResourceContent;

    struct FixedBackend;

    impl weave_embed::EmbeddingBackend for FixedBackend {
        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, String> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
        fn dimension(&self) -> usize {
            2
        }
    }

    struct FakeReader {
        text: String,
    }

    impl weave_types::ResourceReader for FakeReader {
        async fn read_resource(&self, uri: &str) -> Result<ResourceContent, McpError> {
            Ok(ResourceContent {
                uri: uri.to_string(),
                description: None,
                text: self.text.clone(),
            })
        }
    }

    fn harness() -> (EmbeddingService, VectorStore, BoxedResourceReader) {
        let embeddings = EmbeddingService::with_backend(Arc::new(FixedBackend));
        let store = VectorStore::new();
        let reader = BoxedResourceReader::new(FakeReader {
            text: "full recipe text".to_string(),
        });
        (embeddings, store, reader)
    }

    #[tokio::test]
    async fn finds_nested_resource_uri_fields() {
        let result = serde_json::json!({
            "matches": [
                {"name": "Vegan Pasta", "resource_uri": "res://vegan_pasta"},
                {"name": "Thai Curry", "resource_uri": "res://thai_curry"},
            ]
        });
        let found = find_referenced_resource_uris(&result);
        assert_eq!(found, vec!["res://vegan_pasta".to_string(), "res://thai_curry".to_string()]);
    }

    #[tokio::test]
    async fn index_tool_result_expands_referenced_resources() {
        let (embeddings, store, reader) = harness();
        store.init().await;
        let indexer = ResourceIndexer::new(&embeddings, &store, &reader);

        let result = serde_json::json!({"resource_uri": "res://vegan_pasta"});
        indexer
            .index_tool_result("find_recipes", "exec-1", &serde_json::json!({}), &result, 0)
            .await;

        let uris = store.all_uris().await.unwrap();
        assert!(uris.contains(&"tool://find_recipes/exec-1".to_string()));
        assert!(uris.contains(&"res://vegan_pasta".to_string()));
    }

    #[tokio::test]
    async fn index_resource_skips_on_embed_failure_without_panicking() {
        struct FailingBackend;
        impl weave_embed::EmbeddingBackend for FailingBackend {
            fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, String> {
                Err("boom".to_string())
            }
            fn dimension(&self) -> usize {
                2
            }
        }
        let embeddings = EmbeddingService::with_backend(Arc::new(FailingBackend));
        let store = VectorStore::new();
        store.init().await;
        let reader = BoxedResourceReader::new(FakeReader {
            text: String::new(),
        });
        let indexer = ResourceIndexer::new(&embeddings, &store, &reader);
        indexer.index_resource("res://x", None, "content", 0).await;
        assert_eq!(store.stats().await.count, 0);
    }
}
