#![deny(missing_docs)]
//! ReAct Controller (`§4.6`, C6): the text-protocol reasoning loop that
//! steers an [`weave_types::LlmClient`] through tool calls against an
//! [`weave_mcp::McpBridge`].
//!
//! Deliberately narrower than a native function-calling agent loop: at most
//! one action per model response, no parallel tool dispatch, no durability
//! machinery, no context compaction (that's [`weave_context::ContextManager`]'s
//! job, run once per turn before this controller ever sees a message list).

pub mod controller;
pub mod preamble;

pub use controller::{ReActController, ReActRun};
