//! Re-export of the MCP error type shared across crates.

pub use weave_types::McpError;
