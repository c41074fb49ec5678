//! Inventory ledger domain module.
//!
//! This crate contains the business rules for the batch & stock ledger,
//! implemented purely as deterministic domain logic (no IO, no storage):
//!
//! - [`batch`] — the `Batch` record, one per physical receipt of stock.
//! - [`adjustment`] — the audit record, the increase/decrease commands, and
//!   the pure planners that validate a command against a batch snapshot.
//! - [`aggregator`] — read-side computations over a batch slice (totals,
//!   available packs, low-stock and expiry signals).

pub mod adjustment;
pub mod aggregator;
pub mod batch;

pub use adjustment::{
    AdjustmentDirection, AdjustmentPlan, AdjustmentReason, AdjustmentRecord, BatchWrite,
    DecreaseStock, IncreaseStock, plan_decrease, plan_increase,
};
pub use aggregator::{
    StockSummary, available_batches, expiring_within, has_any_stock, has_expired, nearest_expiry,
    stock_summary, total_atomic_quantity,
};
pub use batch::{Batch, NewBatch};
