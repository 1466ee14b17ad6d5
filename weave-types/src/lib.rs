#![deny(missing_docs)]
//! Core data model and trait boundaries for the weave ReAct agent core.
//!
//! This crate has no async runtime or transport opinions of its own — it is
//! the shared vocabulary that `weave-embed`, `weave-vectorstore`,
//! `weave-context`, `weave-parser`, `weave-mcp`, `weave-loop`, and
//! `weave-runtime` all build on.

pub mod error;
pub mod hooks;
pub mod traits;
pub mod types;
pub mod wasm;

pub use error::*;
pub use hooks::*;
pub use traits::*;
pub use types::*;
pub use wasm::*;
