//! Read-side stock computations.
//!
//! Pure functions over a snapshot of an item's batches. Nothing here
//! mutates or caches: callers recompute from current store state on every
//! call (batch counts per item are small, correctness wins).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rxstock_catalog::CatalogItem;

use crate::batch::Batch;

/// Derived per-item stock view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSummary {
    pub total_atomic_quantity: Decimal,
    pub available_packs: u64,
    pub is_low_stock: bool,
    pub has_any_stock: bool,
}

/// Sum of remaining quantity over all batches (depleted batches add zero).
pub fn total_atomic_quantity(batches: &[Batch]) -> Decimal {
    batches.iter().map(Batch::quantity).sum()
}

/// Batches that still hold stock, in the order the store returned them.
pub fn available_batches(batches: &[Batch]) -> Vec<&Batch> {
    batches.iter().filter(|b| !b.is_depleted()).collect()
}

pub fn has_any_stock(batches: &[Batch]) -> bool {
    total_atomic_quantity(batches) > Decimal::ZERO
}

/// Compute the summary for one item from its batch snapshot.
///
/// Expired batches with remaining quantity still count toward availability;
/// expiry is surfaced as a separate signal, not subtracted here. That
/// mirrors how pharmacies alert on expiry without hiding shelf stock, and
/// is a business-policy choice, not arithmetic.
pub fn stock_summary(item: &CatalogItem, batches: &[Batch]) -> StockSummary {
    let total = total_atomic_quantity(batches);
    let available_packs = item.to_packs(total);
    StockSummary {
        total_atomic_quantity: total,
        available_packs,
        is_low_stock: available_packs < item.minimum_packs(),
        has_any_stock: total > Decimal::ZERO,
    }
}

/// Earliest expiry among stocked batches expiring within
/// `[today, today + months]`. `None` when nothing in the window.
pub fn nearest_expiry(batches: &[Batch], today: NaiveDate, months: u32) -> Option<NaiveDate> {
    batches
        .iter()
        .filter(|b| !b.is_depleted() && b.expires_within(today, months))
        .map(Batch::expiry_date)
        .min()
}

/// True if any stocked batch expires within the window. Batches already
/// expired relative to `today` are a distinct condition; see [`has_expired`].
pub fn expiring_within(batches: &[Batch], today: NaiveDate, months: u32) -> bool {
    nearest_expiry(batches, today, months).is_some()
}

/// True if any batch with remaining stock has already expired.
pub fn has_expired(batches: &[Batch], today: NaiveDate) -> bool {
    batches.iter().any(|b| !b.is_depleted() && b.is_expired(today))
}
