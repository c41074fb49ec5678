//! The adjustment engine: the only writer of batch quantities.
//!
//! Orchestration pipeline for every mutation:
//!
//! ```text
//! request
//!   ↓
//! 1. Resolve the item's catalog configuration
//!   ↓
//! 2. Load the targeted batch snapshot (when one is named)
//!   ↓
//! 3. Plan (pure validation, produces the write + audit data)
//!   ↓
//! 4. Commit through the store (CAS + audit append, atomic)
//!   ↓
//! 5. On CAS conflict: fresh read, re-plan, bounded retry
//! ```
//!
//! Planning is deterministic domain logic in `rxstock-inventory`; this
//! module composes it with the [`BatchStore`] and [`ItemCatalog`] traits,
//! so it is testable with in-memory implementations and swappable with
//! real backends.

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;

use rxstock_catalog::CatalogItem;
use rxstock_core::{AdjustmentId, BatchId, DomainError, ItemId};
use rxstock_inventory::{
    self as inventory, AdjustmentPlan, AdjustmentRecord, Batch, BatchWrite, DecreaseStock,
    IncreaseStock, StockSummary, plan_decrease, plan_increase,
};

use crate::batch_store::{BatchStore, StoreError};
use crate::catalog::ItemCatalog;

/// CAS retries before surfacing `ConcurrentModification`.
const MAX_CAS_RETRIES: u32 = 3;

/// Public failure taxonomy. Every engine operation returns a success value
/// or exactly one of these.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdjustmentError {
    /// Non-positive delta requested. Caller input validation; never retried.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// New-batch increase missing expiry/cost/price.
    #[error("missing batch details: {0}")]
    MissingBatchDetails(String),

    /// Decrease exceeds the batch's current quantity. Carries the quantity
    /// actually available so the UI can clamp or re-prompt.
    #[error("insufficient quantity (available: {available})")]
    InsufficientQuantity { available: Decimal },

    #[error("batch not found")]
    BatchNotFound,

    #[error("item not found")]
    ItemNotFound,

    /// Read-modify-write precondition failed and retries were exhausted.
    /// Safe to retry manually from a fresh read.
    #[error("concurrent modification: {0}")]
    ConcurrentModification(String),

    /// Transport/storage failure. Fatal to the operation, not the process.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<DomainError> for AdjustmentError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::InvalidQuantity(msg) => Self::InvalidQuantity(msg),
            DomainError::MissingBatchDetails(msg) => Self::MissingBatchDetails(msg),
            DomainError::InsufficientQuantity { available } => {
                Self::InsufficientQuantity { available }
            }
            DomainError::NotFound => Self::BatchNotFound,
            // The planners never emit these two: catalog configuration is
            // validated when the item is written, and ids reach the engine
            // already typed. Kept total so new call sites stay covered.
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::InvalidQuantity(msg),
        }
    }
}

impl From<StoreError> for AdjustmentError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict { current } => Self::ConcurrentModification(format!(
                "quantity changed underneath the request (current: {current})"
            )),
            StoreError::BatchNotFound => Self::BatchNotFound,
            StoreError::InvalidWrite(msg) => Self::InvalidQuantity(msg),
            StoreError::Unavailable(msg) => Self::StoreUnavailable(msg),
        }
    }
}

/// Result of a committed adjustment: which batch changed (or was created)
/// and the item's refreshed stock view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustmentOutcome {
    pub batch_id: BatchId,
    pub batch_number: String,
    pub summary: StockSummary,
}

/// Outcome of a bulk receipt (import path): one result per request, no
/// cross-request rollback.
#[derive(Debug)]
pub struct BulkReceiptReport {
    pub results: Vec<Result<AdjustmentOutcome, AdjustmentError>>,
    pub succeeded: usize,
    pub failed: usize,
}

/// The state machine driver for batch quantities.
///
/// Generic over the store and catalog boundaries; all IO goes through the
/// injected implementations.
pub struct AdjustmentEngine<S, C> {
    store: S,
    catalog: C,
}

impl<S, C> AdjustmentEngine<S, C>
where
    S: BatchStore,
    C: ItemCatalog,
{
    pub fn new(store: S, catalog: C) -> Self {
        Self { store, catalog }
    }

    /// Receive stock: into an existing batch (`cmd.target = Some`) or by
    /// opening a new one (`cmd.target = None`).
    ///
    /// Increasing into an existing batch keeps the batch's original cost
    /// basis; supplied pricing is ignored on that path. An increase may
    /// target a depleted batch and re-activate it — the ledger is
    /// append-only per batch identity, so that path is valid, just unusual.
    pub fn apply_increase(
        &self,
        cmd: &IncreaseStock,
    ) -> Result<AdjustmentOutcome, AdjustmentError> {
        let item = self.require_item(cmd.item_id)?;

        let mut attempts = 0;
        loop {
            let target = match cmd.target {
                Some(batch_id) => Some(self.require_batch(batch_id)?),
                None => None,
            };
            let plan = plan_increase(cmd, target.as_ref())?;

            match self.commit(&item, plan) {
                Ok(batch) => return self.outcome(&item, batch),
                Err(StoreError::Conflict { current }) if attempts < MAX_CAS_RETRIES => {
                    attempts += 1;
                    tracing::warn!(
                        item_id = %cmd.item_id,
                        current = %current,
                        attempt = attempts,
                        "increase hit concurrent modification, retrying from fresh read"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Remove stock from one specific batch. The batch may reach exactly
    /// zero; it then drops out of availability but stays readable forever.
    pub fn apply_decrease(
        &self,
        cmd: &DecreaseStock,
    ) -> Result<AdjustmentOutcome, AdjustmentError> {
        let item = self.require_item(cmd.item_id)?;

        let mut attempts = 0;
        loop {
            // Fresh read each attempt: sufficiency is re-validated against
            // the current quantity, so a raced-away batch fails with
            // InsufficientQuantity rather than a blind retry.
            let batch = self.require_batch(cmd.batch_id)?;
            let plan = plan_decrease(cmd, &batch)?;

            match self.commit(&item, plan) {
                Ok(batch) => return self.outcome(&item, batch),
                Err(StoreError::Conflict { current }) if attempts < MAX_CAS_RETRIES => {
                    attempts += 1;
                    tracing::warn!(
                        item_id = %cmd.item_id,
                        batch_id = %cmd.batch_id,
                        current = %current,
                        attempt = attempts,
                        "decrease hit concurrent modification, retrying from fresh read"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Import path: apply each receipt independently. One failure never
    /// rolls back the others; the report aggregates per-request results.
    pub fn receive_bulk(&self, requests: &[IncreaseStock]) -> BulkReceiptReport {
        let results: Vec<_> = requests.iter().map(|req| self.apply_increase(req)).collect();
        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        let failed = results.len() - succeeded;
        BulkReceiptReport {
            results,
            succeeded,
            failed,
        }
    }

    /// Current derived stock view for an item.
    pub fn stock_summary(&self, item_id: ItemId) -> Result<StockSummary, AdjustmentError> {
        let item = self.require_item(item_id)?;
        let batches = self.store.list_batches_by_item(item_id)?;
        Ok(inventory::stock_summary(&item, &batches))
    }

    /// Earliest expiry among an item's stocked batches within
    /// `[today, today + months]`, if any.
    pub fn nearest_expiry(
        &self,
        item_id: ItemId,
        months: u32,
    ) -> Result<Option<chrono::NaiveDate>, AdjustmentError> {
        self.require_item(item_id)?;
        let batches = self.store.list_batches_by_item(item_id)?;
        Ok(inventory::nearest_expiry(
            &batches,
            Utc::now().date_naive(),
            months,
        ))
    }

    /// Items with stocked batches expiring within `[today, today + months]`.
    pub fn expiring_items(&self, months: u32) -> Result<Vec<ItemId>, AdjustmentError> {
        let today = Utc::now().date_naive();
        let mut out = Vec::new();
        for item in self.catalog.list_items()? {
            let batches = self.store.list_batches_by_item(item.id_typed())?;
            if inventory::expiring_within(&batches, today, months) {
                out.push(item.id_typed());
            }
        }
        Ok(out)
    }

    /// Items holding stock that has already expired.
    pub fn expired_items(&self) -> Result<Vec<ItemId>, AdjustmentError> {
        let today = Utc::now().date_naive();
        let mut out = Vec::new();
        for item in self.catalog.list_items()? {
            let batches = self.store.list_batches_by_item(item.id_typed())?;
            if inventory::has_expired(&batches, today) {
                out.push(item.id_typed());
            }
        }
        Ok(out)
    }

    /// Immutable audit trail for an item, in append order.
    pub fn adjustment_history(
        &self,
        item_id: ItemId,
    ) -> Result<Vec<AdjustmentRecord>, AdjustmentError> {
        self.require_item(item_id)?;
        Ok(self.store.list_adjustments_by_item(item_id)?)
    }

    fn require_item(&self, item_id: ItemId) -> Result<CatalogItem, AdjustmentError> {
        self.catalog
            .get_item(item_id)?
            .ok_or(AdjustmentError::ItemNotFound)
    }

    fn require_batch(&self, batch_id: BatchId) -> Result<Batch, AdjustmentError> {
        self.store
            .get_batch(batch_id)?
            .ok_or(AdjustmentError::BatchNotFound)
    }

    /// Execute a validated plan: one store commit carrying both the batch
    /// write and its audit record.
    fn commit(&self, item: &CatalogItem, plan: AdjustmentPlan) -> Result<Batch, StoreError> {
        let item_id = item.id_typed();
        let direction = plan.direction;
        let delta = plan.quantity_delta;

        let committed = match plan.write.clone() {
            BatchWrite::Create(new) => {
                let record: AdjustmentRecord =
                    plan.into_record(AdjustmentId::new(), item_id, None, Utc::now());
                self.store.create_batch(new, record)?
            }
            BatchWrite::SetQuantity {
                batch_id,
                expected,
                new_quantity,
            } => {
                let record =
                    plan.into_record(AdjustmentId::new(), item_id, Some(batch_id), Utc::now());
                self.store
                    .update_batch_quantity(batch_id, expected, new_quantity, record)?
            }
        };

        tracing::info!(
            item_id = %item_id,
            batch_id = %committed.id_typed(),
            batch_number = committed.batch_number(),
            direction = direction.as_str(),
            delta = %delta,
            quantity = %committed.quantity(),
            "adjustment committed"
        );

        Ok(committed)
    }

    fn outcome(
        &self,
        item: &CatalogItem,
        batch: Batch,
    ) -> Result<AdjustmentOutcome, AdjustmentError> {
        let batches = self.store.list_batches_by_item(item.id_typed())?;
        Ok(AdjustmentOutcome {
            batch_id: batch.id_typed(),
            batch_number: batch.batch_number().to_string(),
            summary: inventory::stock_summary(item, &batches),
        })
    }
}
