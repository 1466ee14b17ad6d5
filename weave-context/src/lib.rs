#![deny(missing_docs)]
//! Retrieval-augmented context builder (`§4.3`/`§4.4`, C3/C4).
//!
//! Two collaborating pieces: [`indexer::ResourceIndexer`] turns resources and
//! tool results into embedded vector store rows, and [`manager::ContextManager`]
//! turns a turn's user message and history into the `ContextBundle` the
//! ReAct Controller drives its prompt from.

pub mod counter;
pub mod framing;
pub mod indexer;
pub mod manager;
pub mod query;

pub use indexer::ResourceIndexer;
pub use manager::ContextManager;
