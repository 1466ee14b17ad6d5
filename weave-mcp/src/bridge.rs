//! MCP Bridge (`§4.7`, C7).
//!
//! The single JSON-RPC client this core speaks through. One bridge instance
//! is owned by the Agent Facade and rebuilt wholesale on every server switch
//! (`§4.8`); it never holds state longer than one server's lifetime.
//!
//! Tool dispatch is deliberately NOT polymorphic: there is no per-tool trait
//! object, just a flat `name -> Tool` catalog and a single `execute_tool`
//! entry point driven by the name string the model produced.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;

use weave_types::{BoxedTransport, JsonRpcRequest, McpError, ResourceContent, ResourceReader, Tool};

use crate::types::{PromptDescriptor, PromptResult, ResourceDescriptor, ToolCallOutcome};
use crate::validate;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const PROTOCOL_VERSION: &str = "2024-11-05";

struct Catalog {
    tools: HashMap<String, Tool>,
    resources: Vec<ResourceDescriptor>,
    prompts: Vec<PromptDescriptor>,
}

/// The MCP JSON-RPC bridge for one connected server.
pub struct McpBridge {
    transport: BoxedTransport,
    next_id: AtomicU64,
    catalog: RwLock<Option<Catalog>>,
}

impl McpBridge {
    /// Wrap a connected transport. Call [`Self::init`] before use.
    #[must_use]
    pub fn new(transport: BoxedTransport) -> Self {
        Self {
            transport,
            next_id: AtomicU64::new(1),
            catalog: RwLock::new(None),
        }
    }

    fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Perform the `initialize` handshake and fetch the tool/resource/prompt
    /// catalogs. Fatal on failure: the caller (`bootServer`) aborts the
    /// server switch rather than leaving a half-initialized bridge.
    pub async fn init(&self) -> Result<(), McpError> {
        let params = serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {"name": "weave", "version": env!("CARGO_PKG_VERSION")},
        });
        let response = self.call("initialize", Some(params)).await?;
        let server_protocol = response.get("protocolVersion").and_then(Value::as_str);
        if server_protocol.is_some_and(|v| v != PROTOCOL_VERSION) {
            tracing::warn!(
                server_protocol,
                expected = PROTOCOL_VERSION,
                "MCP server reported a different protocol version"
            );
        }

        let tools = self.fetch_tools().await?;
        let resources = self.fetch_resources().await?;
        let prompts = self.fetch_prompts().await?;

        *self.catalog.write().await = Some(Catalog {
            tools: tools.into_iter().map(|t| (t.name.clone(), t)).collect(),
            resources,
            prompts,
        });
        Ok(())
    }

    async fn fetch_tools(&self) -> Result<Vec<Tool>, McpError> {
        let response = self.call("tools/list", None).await?;
        let raw = response.get("tools").cloned().unwrap_or(Value::Array(vec![]));
        let entries = raw.as_array().cloned().unwrap_or_default();
        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                let name = entry.get("name")?.as_str()?.to_string();
                let description = entry
                    .get("description")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let parameters = entry.get("inputSchema").cloned().unwrap_or(serde_json::json!({}));
                Some(Tool {
                    name,
                    description,
                    parameters,
                })
            })
            .collect())
    }

    async fn fetch_resources(&self) -> Result<Vec<ResourceDescriptor>, McpError> {
        let response = self.call("resources/list", None).await?;
        let raw = response.get("resources").cloned().unwrap_or(Value::Array(vec![]));
        let entries = raw.as_array().cloned().unwrap_or_default();
        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                Some(ResourceDescriptor {
                    uri: entry.get("uri")?.as_str()?.to_string(),
                    name: entry.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                    description: entry.get("description").and_then(Value::as_str).map(str::to_string),
                    mime_type: entry.get("mimeType").and_then(Value::as_str).map(str::to_string),
                })
            })
            .collect())
    }

    async fn fetch_prompts(&self) -> Result<Vec<PromptDescriptor>, McpError> {
        let response = self.call("prompts/list", None).await?;
        let raw = response.get("prompts").cloned().unwrap_or(Value::Array(vec![]));
        let entries = raw.as_array().cloned().unwrap_or_default();
        Ok(entries
            .into_iter()
            .filter_map(|entry| {
                let name = entry.get("name")?.as_str()?.to_string();
                let description = entry.get("description").and_then(Value::as_str).map(str::to_string);
                let arguments = entry
                    .get("arguments")
                    .and_then(Value::as_array)
                    .map(|args| {
                        args.iter()
                            .filter_map(|a| {
                                Some(crate::types::PromptArgument {
                                    name: a.get("name")?.as_str()?.to_string(),
                                    description: a.get("description").and_then(Value::as_str).map(str::to_string),
                                    required: a.get("required").and_then(Value::as_bool),
                                })
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                Some(PromptDescriptor {
                    name,
                    description,
                    arguments,
                })
            })
            .collect())
    }

    /// The cached tool catalog from the last `init()`.
    pub async fn list_tools(&self) -> Vec<Tool> {
        match &*self.catalog.read().await {
            Some(catalog) => catalog.tools.values().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// The cached resource catalog from the last `init()`.
    pub async fn list_resources(&self) -> Vec<ResourceDescriptor> {
        match &*self.catalog.read().await {
            Some(catalog) => catalog.resources.clone(),
            None => Vec::new(),
        }
    }

    /// The cached prompt catalog from the last `init()`.
    pub async fn list_prompts(&self) -> Vec<PromptDescriptor> {
        match &*self.catalog.read().await {
            Some(catalog) => catalog.prompts.clone(),
            None => Vec::new(),
        }
    }

    /// A generic JSON-RPC call with a 30-second default timeout. Request ids
    /// are monotonically increasing; the transport may have other calls in
    /// flight concurrently, correlated by id alone.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        let request = JsonRpcRequest::new(self.next_request_id(), method, params);
        let response = tokio::time::timeout(DEFAULT_TIMEOUT, self.transport.send(request))
            .await
            .map_err(|_| McpError::Transport(weave_types::TransportError::Timeout(DEFAULT_TIMEOUT)))??;

        if let Some(error) = response.error {
            return Err(McpError::JsonRpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    /// Validate arguments against the tool's schema, dispatch `tools/call`,
    /// and unwrap the `content[].text` envelope to a JSON value where
    /// possible. Never propagates a tool failure as an `Err`; callers get a
    /// normalized [`ToolCallOutcome`] instead, matching the controller's
    /// "errors become observations" policy (`§4.6.3`).
    pub async fn execute_tool(&self, tool_name: &str, args: Value) -> ToolCallOutcome {
        match self.dispatch_tool(tool_name, args).await {
            Ok(result) => ToolCallOutcome {
                ok: true,
                result: Some(result),
                error: None,
            },
            Err(err) => ToolCallOutcome {
                ok: false,
                result: None,
                error: Some(err.to_string()),
            },
        }
    }

    async fn dispatch_tool(&self, tool_name: &str, args: Value) -> Result<Value, McpError> {
        let schema = {
            let catalog = self.catalog.read().await;
            let catalog = catalog.as_ref().ok_or_else(|| McpError::UnknownTool(tool_name.to_string()))?;
            let tool = catalog.tools.get(tool_name).ok_or_else(|| McpError::UnknownTool(tool_name.to_string()))?;
            tool.parameters.clone()
        };

        validate::validate(&args, &schema).map_err(|detail| McpError::SchemaValidation {
            tool: tool_name.to_string(),
            detail,
        })?;

        let response = self
            .call(
                "tools/call",
                Some(serde_json::json!({"name": tool_name, "arguments": args})),
            )
            .await?;

        if response.get("isError").and_then(Value::as_bool).unwrap_or(false) {
            return Err(McpError::ToolRuntime {
                tool: tool_name.to_string(),
                message: extract_text(&response),
            });
        }

        if let Some(structured) = response.get("structuredContent") {
            return Ok(structured.clone());
        }

        let text = extract_text(&response);
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Ok(value),
            Err(_) => Ok(Value::String(text)),
        }
    }

    /// Fetch one resource's content via `resources/read`.
    pub async fn read_resource_content(&self, uri: &str) -> Result<ResourceContent, McpError> {
        let response = self.call("resources/read", Some(serde_json::json!({"uri": uri}))).await?;
        let contents = response.get("contents").and_then(Value::as_array).cloned().unwrap_or_default();
        let text = contents
            .iter()
            .filter_map(|c| c.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n");
        let description = self
            .catalog
            .read()
            .await
            .as_ref()
            .and_then(|c| c.resources.iter().find(|r| r.uri == uri))
            .and_then(|r| r.description.clone());
        Ok(ResourceContent {
            uri: uri.to_string(),
            description,
            text,
        })
    }
}

impl ResourceReader for McpBridge {
    async fn read_resource(&self, uri: &str) -> Result<ResourceContent, McpError> {
        self.read_resource_content(uri).await
    }
}

fn extract_text(response: &Value) -> String {
    response
        .get("content")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use weave_types::{JsonRpcResponse, Transport};

    struct ScriptedTransport {
        responses: Mutex<Vec<Value>>,
    }

    impl Transport for ScriptedTransport {
        async fn send(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, McpError> {
            let result = self.responses.lock().unwrap().remove(0);
            Ok(JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id: request.id,
                result: Some(result),
                error: None,
            })
        }
    }

    fn bridge(responses: Vec<Value>) -> McpBridge {
        McpBridge::new(BoxedTransport::new(ScriptedTransport {
            responses: Mutex::new(responses),
        }))
    }

    #[tokio::test]
    async fn init_populates_catalogs() {
        let b = bridge(vec![
            serde_json::json!({"protocolVersion": PROTOCOL_VERSION}),
            serde_json::json!({"tools": [{"name": "search", "description": "find things", "inputSchema": {"type": "object"}}]}),
            serde_json::json!({"resources": [{"uri": "res://a", "name": "A"}]}),
            serde_json::json!({"prompts": []}),
        ]);
        b.init().await.unwrap();
        assert_eq!(b.list_tools().await.len(), 1);
        assert_eq!(b.list_resources().await.len(), 1);
    }

    #[tokio::test]
    async fn execute_tool_rejects_invalid_args_without_calling_transport() {
        let b = bridge(vec![
            serde_json::json!({"protocolVersion": PROTOCOL_VERSION}),
            serde_json::json!({"tools": [{"name": "search", "description": "d", "inputSchema": {"type": "object", "required": ["q"]}}]}),
            serde_json::json!({"resources": []}),
            serde_json::json!({"prompts": []}),
        ]);
        b.init().await.unwrap();
        let outcome = b.execute_tool("search", serde_json::json!({})).await;
        assert!(!outcome.ok);
        assert!(outcome.error.unwrap().contains('q'));
    }

    #[tokio::test]
    async fn execute_tool_unwraps_json_text_content() {
        let b = bridge(vec![
            serde_json::json!({"protocolVersion": PROTOCOL_VERSION}),
            serde_json::json!({"tools": [{"name": "search", "description": "d", "inputSchema": {"type": "object"}}]}),
            serde_json::json!({"resources": []}),
            serde_json::json!({"prompts": []}),
            serde_json::json!({"content": [{"type": "text", "text": "[\"a\",\"b\"]"}]}),
        ]);
        b.init().await.unwrap();
        let outcome = b.execute_tool("search", serde_json::json!({})).await;
        assert!(outcome.ok);
        assert_eq!(outcome.result, Some(serde_json::json!(["a", "b"])));
    }

    #[tokio::test]
    async fn execute_tool_on_unknown_tool_is_an_error_observation() {
        let b = bridge(vec![
            serde_json::json!({"protocolVersion": PROTOCOL_VERSION}),
            serde_json::json!({"tools": []}),
            serde_json::json!({"resources": []}),
            serde_json::json!({"prompts": []}),
        ]);
        b.init().await.unwrap();
        let outcome = b.execute_tool("ghost", serde_json::json!({})).await;
        assert!(!outcome.ok);
    }
}
