//! Execution Adapters
//!
//! Implementations of `ExecutionPort`.

pub mod paper;

pub use paper::{PaperExecutionAdapter, PaperExecutionConfig};
