//! Stock batches: one record per physical receipt of stock.

use chrono::{DateTime, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rxstock_core::{BatchId, Entity, ItemId, SupplierId};

/// A discrete receipt of stock with its own expiry and cost/price basis.
///
/// A batch moves through `ACTIVE (quantity > 0) → DEPLETED (quantity == 0)`.
/// Depletion is terminal for availability purposes, but the record is never
/// deleted: the ledger is append-only per batch identity, and an increase
/// targeting a depleted batch re-activates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    id: BatchId,
    item_id: ItemId,
    /// Item-scoped, monotonically assigned, never reused.
    batch_number: String,
    /// Atomic quantity currently remaining. Never negative.
    quantity: Decimal,
    /// May be in the past; expired batches are not auto-removed.
    expiry_date: NaiveDate,
    /// Fixed at creation, never altered by later adjustments.
    cost_price_per_unit: Decimal,
    /// Fixed at creation, never altered by later adjustments.
    selling_price_per_unit: Decimal,
    supplier_id: Option<SupplierId>,
    received_at: DateTime<Utc>,
}

/// Payload for opening a new batch (id and number are assigned by the store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBatch {
    pub item_id: ItemId,
    pub quantity: Decimal,
    pub expiry_date: NaiveDate,
    pub cost_price_per_unit: Decimal,
    pub selling_price_per_unit: Decimal,
    pub supplier_id: Option<SupplierId>,
}

impl Batch {
    /// Materialize a batch from a creation payload. Called by the store once
    /// it has assigned the id and the item-scoped batch number.
    pub fn from_new(id: BatchId, batch_number: String, new: NewBatch, received_at: DateTime<Utc>) -> Self {
        Self {
            id,
            item_id: new.item_id,
            batch_number,
            quantity: new.quantity,
            expiry_date: new.expiry_date,
            cost_price_per_unit: new.cost_price_per_unit,
            selling_price_per_unit: new.selling_price_per_unit,
            supplier_id: new.supplier_id,
            received_at,
        }
    }

    pub fn id_typed(&self) -> BatchId {
        self.id
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn batch_number(&self) -> &str {
        &self.batch_number
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn expiry_date(&self) -> NaiveDate {
        self.expiry_date
    }

    pub fn cost_price_per_unit(&self) -> Decimal {
        self.cost_price_per_unit
    }

    pub fn selling_price_per_unit(&self) -> Decimal {
        self.selling_price_per_unit
    }

    pub fn supplier_id(&self) -> Option<SupplierId> {
        self.supplier_id
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Depleted batches are excluded from availability but kept for audit.
    pub fn is_depleted(&self) -> bool {
        self.quantity == Decimal::ZERO
    }

    /// Strictly before `today`. An expired batch is not "expiring soon";
    /// those are distinct signals.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date < today
    }

    /// Expiry falls within `[today, today + months]`.
    pub fn expires_within(&self, today: NaiveDate, months: u32) -> bool {
        let horizon = today
            .checked_add_months(Months::new(months))
            .unwrap_or(NaiveDate::MAX);
        self.expiry_date >= today && self.expiry_date <= horizon
    }

    /// Copy of this batch with a replaced quantity. Used by the store when
    /// committing a compare-and-swap update; quantity must stay non-negative.
    pub fn with_quantity(&self, quantity: Decimal) -> Self {
        debug_assert!(quantity >= Decimal::ZERO);
        Self {
            quantity,
            ..self.clone()
        }
    }
}

impl Entity for Batch {
    type Id = BatchId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_batch(quantity: Decimal, expiry: NaiveDate) -> Batch {
        Batch::from_new(
            BatchId::new(),
            "B0001".to_string(),
            NewBatch {
                item_id: ItemId::new(),
                quantity,
                expiry_date: expiry,
                cost_price_per_unit: dec!(2.00),
                selling_price_per_unit: dec!(5.00),
                supplier_id: None,
            },
            Utc::now(),
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn depletion_is_quantity_zero() {
        let batch = test_batch(dec!(5), date(2026, 12, 1));
        assert!(!batch.is_depleted());
        assert!(batch.with_quantity(Decimal::ZERO).is_depleted());
    }

    #[test]
    fn expired_is_strictly_before_today() {
        let today = date(2026, 6, 15);
        assert!(test_batch(dec!(1), date(2026, 6, 14)).is_expired(today));
        assert!(!test_batch(dec!(1), today).is_expired(today));
    }

    #[test]
    fn expiring_window_excludes_already_expired() {
        let today = date(2026, 6, 15);
        let expired = test_batch(dec!(1), date(2026, 6, 1));
        assert!(!expired.expires_within(today, 3));

        let soon = test_batch(dec!(1), date(2026, 8, 1));
        assert!(soon.expires_within(today, 3));
        assert!(!soon.expires_within(today, 1));

        let boundary = test_batch(dec!(1), date(2026, 9, 15));
        assert!(boundary.expires_within(today, 3));
    }
}
