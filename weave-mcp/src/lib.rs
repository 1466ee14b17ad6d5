#![deny(missing_docs)]
//! MCP Bridge (`§4.7`, C7): JSON-RPC tool, resource, and prompt dispatch
//! against whichever transport `weave-runtime` hands it at boot time.
//!
//! This crate owns the wire-level concerns (request correlation, timeouts,
//! schema validation, content unwrapping) and is deliberately silent on
//! transport choice — see [`weave_types::Transport`] for the three pluggable
//! implementations the spec describes.

pub mod bridge;
pub mod error;
pub mod types;
pub mod validate;

pub use bridge::McpBridge;
pub use error::McpError;
pub use types::{PromptArgument, PromptDescriptor, PromptMessage, PromptResult, ResourceDescriptor, ToolCallOutcome};
pub use validate::tool_enum_hints;
