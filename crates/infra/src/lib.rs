//! Infrastructure layer: the store boundary and the adjustment engine.
//!
//! Domain crates stay pure; this crate owns everything that touches shared
//! mutable state: the [`batch_store::BatchStore`] trait (compare-and-swap
//! quantity updates committed atomically with their audit record), the
//! read-only [`catalog::ItemCatalog`] trait, in-memory implementations for
//! tests/dev, and [`engine::AdjustmentEngine`] — the only writer of batch
//! quantities.

pub mod batch_store;
pub mod catalog;
pub mod engine;

#[cfg(test)]
mod integration_tests;

pub use batch_store::{BatchStore, InMemoryBatchStore, StoreError};
pub use catalog::{InMemoryCatalog, ItemCatalog};
pub use engine::{AdjustmentEngine, AdjustmentError, AdjustmentOutcome, BulkReceiptReport};
