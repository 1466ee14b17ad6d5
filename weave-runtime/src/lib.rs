#![deny(missing_docs)]
//! Agent Facade (`§4.8`/`§4.9`, C8/C9): the single entry point a host
//! application drives. Owns the embedding service, vector store, and chat
//! history for the process lifetime; boots an MCP server via whichever
//! [`weave_types::Transport`] the host selects; and runs one turn at a time
//! through [`weave_context::ContextManager`] and [`weave_loop::ReActController`].
//!
//! Deliberately narrower than a production agent runtime: no sessions,
//! sub-agents, guardrail policies, durable execution, or sandboxing — this
//! core is single-process, single-user, with no persistence across restarts
//! (`§1` Non-goals).

pub mod facade;
pub mod tracing_hook;

pub use facade::{AgentFacade, INTERRUPTED_ANSWER, SERVER_SWITCH_NOTICE};
pub use tracing_hook::TracingHook;
