use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;

use rxstock_core::{BatchId, ItemId};
use rxstock_inventory::{AdjustmentRecord, Batch, NewBatch};

/// Batch store operation error.
///
/// These are collaborator failures (storage, concurrency) as opposed to
/// domain errors (validation, quantity invariants).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Compare-and-swap precondition failed: the batch no longer holds the
    /// expected quantity. Carries the quantity observed at commit time so
    /// callers can retry from a fresh read.
    #[error("concurrent modification (current quantity: {current})")]
    Conflict { current: Decimal },

    /// The referenced batch does not exist.
    #[error("batch not found")]
    BatchNotFound,

    /// The write itself was malformed (e.g. negative quantity).
    #[error("invalid write: {0}")]
    InvalidWrite(String),

    /// Transport/storage failure. Fatal to the operation, not the process.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable holder of batches and their adjustment audit trail.
///
/// ## Commit semantics
///
/// Every mutation carries the [`AdjustmentRecord`] describing it, and
/// implementations must commit the batch write and the audit append
/// **atomically** — there is no path that persists one half. The audit
/// trail is append-only: records are never updated or deleted.
///
/// ## Concurrency
///
/// `update_batch_quantity` is a compare-and-swap keyed on the previously
/// observed quantity. Two concurrent decreases from the same stale read
/// must never both commit; the loser gets [`StoreError::Conflict`] with the
/// fresh quantity. Operations on distinct batches may proceed in parallel.
///
/// ## Batch numbering
///
/// `create_batch` assigns an item-scoped, monotonically increasing batch
/// number that is never reused, independent of any other item's count.
pub trait BatchStore: Send + Sync {
    /// Single batch by id, depleted or not.
    fn get_batch(&self, id: BatchId) -> Result<Option<Batch>, StoreError>;

    /// All batches belonging to an item, including depleted ones. Callers
    /// impose whatever ordering they need.
    fn list_batches_by_item(&self, item_id: ItemId) -> Result<Vec<Batch>, StoreError>;

    /// Open a new batch and append its audit record in one commit.
    fn create_batch(&self, new: NewBatch, record: AdjustmentRecord) -> Result<Batch, StoreError>;

    /// Compare-and-swap quantity update plus audit append in one commit.
    ///
    /// Commits only if the batch currently holds `expected`; rejects
    /// `new_quantity < 0` with [`StoreError::InvalidWrite`].
    fn update_batch_quantity(
        &self,
        id: BatchId,
        expected: Decimal,
        new_quantity: Decimal,
        record: AdjustmentRecord,
    ) -> Result<Batch, StoreError>;

    /// Audit trail for an item, in append order.
    fn list_adjustments_by_item(&self, item_id: ItemId) -> Result<Vec<AdjustmentRecord>, StoreError>;
}

impl<S> BatchStore for Arc<S>
where
    S: BatchStore + ?Sized,
{
    fn get_batch(&self, id: BatchId) -> Result<Option<Batch>, StoreError> {
        (**self).get_batch(id)
    }

    fn list_batches_by_item(&self, item_id: ItemId) -> Result<Vec<Batch>, StoreError> {
        (**self).list_batches_by_item(item_id)
    }

    fn create_batch(&self, new: NewBatch, record: AdjustmentRecord) -> Result<Batch, StoreError> {
        (**self).create_batch(new, record)
    }

    fn update_batch_quantity(
        &self,
        id: BatchId,
        expected: Decimal,
        new_quantity: Decimal,
        record: AdjustmentRecord,
    ) -> Result<Batch, StoreError> {
        (**self).update_batch_quantity(id, expected, new_quantity, record)
    }

    fn list_adjustments_by_item(&self, item_id: ItemId) -> Result<Vec<AdjustmentRecord>, StoreError> {
        (**self).list_adjustments_by_item(item_id)
    }
}
