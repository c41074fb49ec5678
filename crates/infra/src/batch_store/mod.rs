//! Batch store boundary.
//!
//! This module defines the infrastructure-facing abstraction for holding
//! batches and their audit trail without making any storage assumptions.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryBatchStore;
pub use r#trait::{BatchStore, StoreError};
