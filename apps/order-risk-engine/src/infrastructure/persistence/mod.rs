//! Persistence Adapters
//!
//! In-memory implementations of the risk data ports.

pub mod in_memory;

pub use in_memory::InMemoryRiskStore;
