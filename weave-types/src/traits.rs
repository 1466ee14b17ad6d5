//! Trait boundaries between the core and its external collaborators.
//!
//! RPITIT (`impl Future<...>` in trait position) gives callers zero-cost
//! generic dispatch, but such traits aren't dyn-compatible. Where the core
//! needs a trait object (one facade instance holding one boxed LLM client,
//! one boxed transport), we pair the public RPITIT trait with a hidden
//! `Erased*` trait plus a `Boxed*` wrapper, following the same shape
//! throughout: the public trait is what implementors write against, the
//! erased/boxed pair is what the facade actually stores.

use std::future::Future;
use std::sync::Arc;

use crate::error::{LlmError, McpError};
use crate::types::{ChatMessage, ChatOptions, JsonRpcRequest, JsonRpcResponse, ResourceContent};
use crate::wasm::{WasmBoxedFuture, WasmCompatSend, WasmCompatSync};

/// The external LLM collaborator (`§6.1`). The core never relies on native
/// function calling: every model is driven through the same ReAct text
/// protocol, so this trait only needs a plain chat turn plus cancellation.
pub trait LlmClient: WasmCompatSend + WasmCompatSync {
    /// Send the full message list (history + system preamble) and return the
    /// model's single response message. Never streams.
    fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> impl Future<Output = Result<ChatMessage, LlmError>> + WasmCompatSend;

    /// Cancel the current in-flight call, if the client supports it.
    fn interrupt(&self) -> impl Future<Output = ()> + WasmCompatSend;
}

trait ErasedLlmClient: WasmCompatSend + WasmCompatSync {
    fn chat_dyn<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        options: &'a ChatOptions,
    ) -> WasmBoxedFuture<'a, Result<ChatMessage, LlmError>>;

    fn interrupt_dyn(&self) -> WasmBoxedFuture<'_, ()>;
}

impl<T: LlmClient> ErasedLlmClient for T {
    fn chat_dyn<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        options: &'a ChatOptions,
    ) -> WasmBoxedFuture<'a, Result<ChatMessage, LlmError>> {
        Box::pin(self.chat(messages, options))
    }

    fn interrupt_dyn(&self) -> WasmBoxedFuture<'_, ()> {
        Box::pin(self.interrupt())
    }
}

/// A type-erased, cheaply cloned handle to an [`LlmClient`].
#[derive(Clone)]
pub struct BoxedLlmClient(Arc<dyn ErasedLlmClient>);

impl BoxedLlmClient {
    /// Box any [`LlmClient`] implementation.
    pub fn new<T: LlmClient + 'static>(client: T) -> Self {
        Self(Arc::new(client))
    }

    /// Forward to the wrapped client's `chat`.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<ChatMessage, LlmError> {
        self.0.chat_dyn(messages, options).await
    }

    /// Forward to the wrapped client's `interrupt`.
    pub async fn interrupt(&self) {
        self.0.interrupt_dyn().await
    }
}

/// The abstract JSON-RPC pipe to the tool runtime (`§6.3`, C10). Exactly one
/// of three pluggable transports (worker pipe, intercepting service worker,
/// native IPC bridge) is selected at `bootServer` time; all three speak the
/// same contract.
pub trait Transport: WasmCompatSend + WasmCompatSync {
    /// Send one JSON-RPC request and return its correlated response.
    ///
    /// Implementations MAY have multiple calls in flight concurrently;
    /// correlation is by `request.id` alone, not by arrival order.
    fn send(
        &self,
        request: JsonRpcRequest,
    ) -> impl Future<Output = Result<JsonRpcResponse, McpError>> + WasmCompatSend;

    /// `GET /health` on transports that expose it (service worker, native
    /// IPC bridge). The in-process worker pipe has no network hop and always
    /// reports healthy.
    fn health_check(&self) -> impl Future<Output = bool> + WasmCompatSend {
        async { true }
    }
}

trait ErasedTransport: WasmCompatSend + WasmCompatSync {
    fn send_dyn(&self, request: JsonRpcRequest) -> WasmBoxedFuture<'_, Result<JsonRpcResponse, McpError>>;
    fn health_check_dyn(&self) -> WasmBoxedFuture<'_, bool>;
}

impl<T: Transport> ErasedTransport for T {
    fn send_dyn(
        &self,
        request: JsonRpcRequest,
    ) -> WasmBoxedFuture<'_, Result<JsonRpcResponse, McpError>> {
        Box::pin(self.send(request))
    }

    fn health_check_dyn(&self) -> WasmBoxedFuture<'_, bool> {
        Box::pin(self.health_check())
    }
}

/// A type-erased, cheaply cloned handle to a [`Transport`].
#[derive(Clone)]
pub struct BoxedTransport(Arc<dyn ErasedTransport>);

impl BoxedTransport {
    /// Box any [`Transport`] implementation.
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Self(Arc::new(transport))
    }

    /// Forward to the wrapped transport's `send`.
    pub async fn send(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse, McpError> {
        self.0.send_dyn(request).await
    }

    /// Forward to the wrapped transport's `health_check`.
    pub async fn health_check(&self) -> bool {
        self.0.health_check_dyn().await
    }
}

/// The context builder's view of the MCP bridge (`§4.3`). Separated from
/// [`Transport`] so the resource indexer can trigger referenced-resource
/// expansion (`resources/read`) without depending on the bridge crate that
/// owns the actual JSON-RPC plumbing.
pub trait ResourceReader: WasmCompatSend + WasmCompatSync {
    /// Fetch one resource's content by URI, for indexing.
    fn read_resource(
        &self,
        uri: &str,
    ) -> impl Future<Output = Result<ResourceContent, McpError>> + WasmCompatSend;
}

trait ErasedResourceReader: WasmCompatSend + WasmCompatSync {
    fn read_resource_dyn<'a>(&'a self, uri: &'a str) -> WasmBoxedFuture<'a, Result<ResourceContent, McpError>>;
}

impl<T: ResourceReader> ErasedResourceReader for T {
    fn read_resource_dyn<'a>(&'a self, uri: &'a str) -> WasmBoxedFuture<'a, Result<ResourceContent, McpError>> {
        Box::pin(self.read_resource(uri))
    }
}

/// A type-erased, cheaply cloned handle to a [`ResourceReader`].
#[derive(Clone)]
pub struct BoxedResourceReader(Arc<dyn ErasedResourceReader>);

impl BoxedResourceReader {
    /// Box any [`ResourceReader`] implementation.
    pub fn new<T: ResourceReader + 'static>(reader: T) -> Self {
        Self(Arc::new(reader))
    }

    /// Forward to the wrapped reader's `read_resource`.
    pub async fn read_resource(&self, uri: &str) -> Result<ResourceContent, McpError> {
        self.0.read_resource_dyn(uri).await
    }
}
