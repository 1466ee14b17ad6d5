//! Property-based tests for the context manager's retrieval invariants
//! (`§8`): vector search gating, tail-segment recall, recency-boost
//! arithmetic, and tool-result indexing metadata.

use std::sync::Arc;

use proptest::prelude::*;

use weave_context::framing::frame_tool_result;
use weave_context::{ContextManager, ResourceIndexer};
use weave_embed::{EmbeddingBackend, EmbeddingService};
use weave_types::{BoxedResourceReader, ChatMessage, IndexedKind, McpError, ResourceContent, WeaveConfig};
use weave_vectorstore::VectorStore;

fn block_on<F: std::future::Future>(fut: F) -> F::Output {
    tokio::runtime::Runtime::new().unwrap().block_on(fut)
}

/// Returns `hit` for any text containing `marker`, `miss` otherwise.
struct MarkerBackend {
    marker: String,
    hit: [f32; 2],
    miss: [f32; 2],
}

impl EmbeddingBackend for MarkerBackend {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, String> {
        Ok(texts
            .iter()
            .map(|t| if t.contains(&self.marker) { self.hit.to_vec() } else { self.miss.to_vec() })
            .collect())
    }

    fn dimension(&self) -> usize {
        2
    }
}

/// Returns the same fixed vector regardless of input text, so a query's
/// embedded score against a stored vector is controlled entirely by what was
/// stored, not by what the query says.
struct FixedBackend {
    vector: Vec<f32>,
}

impl EmbeddingBackend for FixedBackend {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, String> {
        Ok(texts.iter().map(|_| self.vector.clone()).collect())
    }

    fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// A unit vector at angle `acos(score)` from `[1.0, 0.0]`, so its dot product
/// against `[1.0, 0.0]` is exactly `score` (up to `f32` rounding).
fn unit_vector_at_score(score: f32) -> Vec<f32> {
    let theta = score.clamp(-1.0, 1.0).acos();
    vec![theta.cos(), theta.sin()]
}

struct UnreachableReader;

impl weave_types::ResourceReader for UnreachableReader {
    async fn read_resource(&self, _uri: &str) -> Result<ResourceContent, McpError> {
        Err(McpError::Initialization("not used in this test".to_string()))
    }
}

proptest! {
    /// `use_vector_search=false` always yields an empty resource list,
    /// regardless of what is indexed or asked.
    #[test]
    fn vector_search_disabled_returns_no_resources(query in "[a-zA-Z ]{1,40}") {
        block_on(async {
            let embeddings = EmbeddingService::with_backend(Arc::new(FixedBackend { vector: vec![1.0, 0.0] }));
            let store = VectorStore::new();
            store.init().await;
            store.add("res://x", "indexed body", vec![1.0, 0.0], IndexedKind::Resource, 0).await.unwrap();

            let mut config = WeaveConfig::default();
            config.use_vector_search = false;

            let bundle = ContextManager::new()
                .build(&query, &[], Vec::new(), "server-1", 0, &embeddings, &store, &config)
                .await
                .unwrap();
            prop_assert!(bundle.relevant_resources.is_empty());
            Ok(())
        })?;
    }

    /// A query literally containing an indexed URI's tail segment surfaces
    /// that URI within `resource_max_results`, at `t_final <= 0.35`.
    #[test]
    fn tail_segment_query_surfaces_its_resource(tail in "[a-z]{3,12}") {
        block_on(async {
            let uri = format!("res://{tail}");
            let embeddings = EmbeddingService::with_backend(Arc::new(MarkerBackend {
                marker: tail.clone(),
                hit: [1.0, 0.0],
                miss: [0.0, 1.0],
            }));
            let store = VectorStore::new();
            store.init().await;
            store.add(&uri, &format!("RESOURCE: {tail}\nCONTENT:\n{tail} details"), vec![1.0, 0.0], IndexedKind::Resource, 0)
                .await
                .unwrap();

            let mut config = WeaveConfig::default();
            config.resource_candidate_threshold = 0.1;
            config.resource_final_threshold = 0.35;
            config.resource_max_results = 5;

            let query = format!("tell me about {tail}");
            let bundle = ContextManager::new()
                .build(&query, &[], Vec::new(), "server-1", 0, &embeddings, &store, &config)
                .await
                .unwrap();
            prop_assert!(bundle.relevant_resources.iter().any(|h| h.uri == uri));
            Ok(())
        })?;
    }

    /// A recency-mentioned resource's post-boost score is exactly its
    /// pre-boost score plus `delta`, and boosted scores stay ordered the same
    /// way their pre-boost scores were.
    #[test]
    fn recency_boost_adds_delta_and_preserves_order(
        base_a in 0.0f32..0.6,
        base_b in 0.0f32..0.6,
        delta in 0.05f32..0.5,
    ) {
        block_on(async {
            let embeddings = EmbeddingService::with_backend(Arc::new(FixedBackend { vector: vec![1.0, 0.0] }));
            let store = VectorStore::new();
            store.init().await;
            store.add("res://a", "resource a", unit_vector_at_score(base_a), IndexedKind::Resource, 0).await.unwrap();
            store.add("res://b", "resource b", unit_vector_at_score(base_b), IndexedKind::Resource, 0).await.unwrap();

            let mut config = WeaveConfig::default();
            config.resource_candidate_threshold = -1.0;
            config.resource_final_threshold = -1.0;
            config.resource_recency_boost = delta;
            config.resource_max_results = 5;

            let history = vec![ChatMessage::assistant("mentions res://a and res://b here".to_string())];
            let bundle = ContextManager::new()
                .build("what else", &history, Vec::new(), "server-1", 0, &embeddings, &store, &config)
                .await
                .unwrap();

            let hit_a = bundle.relevant_resources.iter().find(|h| h.uri == "res://a").expect("res://a survives a permissive threshold");
            let hit_b = bundle.relevant_resources.iter().find(|h| h.uri == "res://b").expect("res://b survives a permissive threshold");
            prop_assert!((hit_a.score - (base_a + delta)).abs() < 1e-3);
            prop_assert!((hit_b.score - (base_b + delta)).abs() < 1e-3);
            if base_a > base_b {
                prop_assert!(hit_a.score > hit_b.score);
            } else if base_b > base_a {
                prop_assert!(hit_b.score > hit_a.score);
            }
            Ok(())
        })?;
    }

    /// Immediately after a successful `tools/call`, the vector store carries
    /// a `tool://<toolName>/*` row whose `full_text_length` matches the
    /// pre-index framed string's length exactly.
    #[test]
    fn tool_result_metadata_records_framed_length(
        tool_name in "[a-z_]{3,12}",
        text in "[a-zA-Z0-9 ]{0,80}",
    ) {
        block_on(async {
            let embeddings = EmbeddingService::with_backend(Arc::new(FixedBackend { vector: vec![1.0, 0.0] }));
            let store = VectorStore::new();
            store.init().await;
            let reader = BoxedResourceReader::new(UnreachableReader);
            let indexer = ResourceIndexer::new(&embeddings, &store, &reader);

            let arguments = serde_json::json!({"q": text});
            let result = serde_json::json!([text]);
            let expected = frame_tool_result(&tool_name, &arguments, &result);

            indexer.index_tool_result(&tool_name, "exec-1", &arguments, &result, 0).await;

            let uri = format!("tool://{tool_name}/exec-1");
            let hits = store.search(&[1.0, 0.0], 5, -1.0).await.unwrap();
            let hit = hits.iter().find(|h| h.uri == uri).expect("the tool result was indexed");
            prop_assert_eq!(hit.metadata.full_text_length, expected.len());
            Ok(())
        })?;
    }
}
