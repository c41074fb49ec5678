use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use rust_decimal::Decimal;

use rxstock_core::{BatchId, ItemId};
use rxstock_inventory::{AdjustmentRecord, Batch, NewBatch};

use super::r#trait::{BatchStore, StoreError};

#[derive(Debug, Default)]
struct State {
    batches: HashMap<BatchId, Batch>,
    by_item: HashMap<ItemId, Vec<BatchId>>,
    /// Per-item batch-number counters. Never decremented: batches are never
    /// deleted, so numbers are never reused.
    counters: HashMap<ItemId, u64>,
    adjustments: Vec<AdjustmentRecord>,
}

/// In-memory batch store.
///
/// Intended for tests/dev. One lock guards batches, counters, and the audit
/// trail together, which makes every mutating call an atomic commit of the
/// quantity write plus its audit record.
#[derive(Debug, Default)]
pub struct InMemoryBatchStore {
    state: RwLock<State>,
}

impl InMemoryBatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn format_batch_number(n: u64) -> String {
        format!("B{n:04}")
    }
}

impl BatchStore for InMemoryBatchStore {
    fn get_batch(&self, id: BatchId) -> Result<Option<Batch>, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(state.batches.get(&id).cloned())
    }

    fn list_batches_by_item(&self, item_id: ItemId) -> Result<Vec<Batch>, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        let ids = state.by_item.get(&item_id).cloned().unwrap_or_default();
        Ok(ids
            .iter()
            .filter_map(|id| state.batches.get(id).cloned())
            .collect())
    }

    fn create_batch(&self, new: NewBatch, record: AdjustmentRecord) -> Result<Batch, StoreError> {
        if new.quantity < Decimal::ZERO {
            return Err(StoreError::InvalidWrite(format!(
                "batch quantity cannot be negative (got {})",
                new.quantity
            )));
        }

        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        let item_id = new.item_id;
        let counter = state.counters.entry(item_id).or_insert(0);
        *counter += 1;
        let batch_number = Self::format_batch_number(*counter);

        let id = BatchId::new();
        let batch = Batch::from_new(id, batch_number, new, Utc::now());

        state.batches.insert(id, batch.clone());
        state.by_item.entry(item_id).or_default().push(id);
        state.adjustments.push(record);

        Ok(batch)
    }

    fn update_batch_quantity(
        &self,
        id: BatchId,
        expected: Decimal,
        new_quantity: Decimal,
        record: AdjustmentRecord,
    ) -> Result<Batch, StoreError> {
        if new_quantity < Decimal::ZERO {
            return Err(StoreError::InvalidWrite(format!(
                "batch quantity cannot be negative (got {new_quantity})"
            )));
        }

        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        let batch = state.batches.get(&id).ok_or(StoreError::BatchNotFound)?;
        let current = batch.quantity();
        if current != expected {
            return Err(StoreError::Conflict { current });
        }

        let updated = batch.with_quantity(new_quantity);
        state.batches.insert(id, updated.clone());
        state.adjustments.push(record);

        Ok(updated)
    }

    fn list_adjustments_by_item(&self, item_id: ItemId) -> Result<Vec<AdjustmentRecord>, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(state
            .adjustments
            .iter()
            .filter(|r| r.item_id == item_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use rxstock_core::{Actor, ActorId, AdjustmentId};
    use rxstock_inventory::{AdjustmentDirection, AdjustmentReason};

    fn test_new_batch(item_id: ItemId, quantity: Decimal) -> NewBatch {
        NewBatch {
            item_id,
            quantity,
            expiry_date: NaiveDate::from_ymd_opt(2027, 3, 1).unwrap(),
            cost_price_per_unit: dec!(2.00),
            selling_price_per_unit: dec!(5.00),
            supplier_id: None,
        }
    }

    fn test_record(item_id: ItemId, batch_id: Option<BatchId>, previous: Decimal, new: Decimal) -> AdjustmentRecord {
        let actor = Actor::new(ActorId::new(), "pharmacist", "Test");
        AdjustmentRecord {
            id: AdjustmentId::new(),
            item_id,
            batch_id,
            direction: if new >= previous {
                AdjustmentDirection::Increase
            } else {
                AdjustmentDirection::Decrease
            },
            quantity_delta: (new - previous).abs(),
            previous_quantity: previous,
            new_quantity: new,
            reason: AdjustmentReason::Correction,
            notes: None,
            actor_id: actor.id,
            actor_role: actor.role,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn batch_numbers_are_item_scoped_and_monotonic() {
        let store = InMemoryBatchStore::new();
        let item_a = ItemId::new();
        let item_b = ItemId::new();

        let a1 = store
            .create_batch(test_new_batch(item_a, dec!(10)), test_record(item_a, None, dec!(0), dec!(10)))
            .unwrap();
        let a2 = store
            .create_batch(test_new_batch(item_a, dec!(10)), test_record(item_a, None, dec!(0), dec!(10)))
            .unwrap();
        let b1 = store
            .create_batch(test_new_batch(item_b, dec!(10)), test_record(item_b, None, dec!(0), dec!(10)))
            .unwrap();

        assert_eq!(a1.batch_number(), "B0001");
        assert_eq!(a2.batch_number(), "B0002");
        // Counter is per item, independent of the global batch count.
        assert_eq!(b1.batch_number(), "B0001");
    }

    #[test]
    fn cas_rejects_stale_expected_quantity() {
        let store = InMemoryBatchStore::new();
        let item_id = ItemId::new();
        let batch = store
            .create_batch(test_new_batch(item_id, dec!(5)), test_record(item_id, None, dec!(0), dec!(5)))
            .unwrap();
        let id = batch.id_typed();

        store
            .update_batch_quantity(id, dec!(5), dec!(3), test_record(item_id, Some(id), dec!(5), dec!(3)))
            .unwrap();

        // Second writer still believes quantity is 5.
        let err = store
            .update_batch_quantity(id, dec!(5), dec!(3), test_record(item_id, Some(id), dec!(5), dec!(3)))
            .unwrap_err();
        assert_eq!(err, StoreError::Conflict { current: dec!(3) });

        assert_eq!(store.get_batch(id).unwrap().unwrap().quantity(), dec!(3));
    }

    #[test]
    fn rejects_negative_quantity_writes() {
        let store = InMemoryBatchStore::new();
        let item_id = ItemId::new();
        let batch = store
            .create_batch(test_new_batch(item_id, dec!(5)), test_record(item_id, None, dec!(0), dec!(5)))
            .unwrap();

        let err = store
            .update_batch_quantity(
                batch.id_typed(),
                dec!(5),
                dec!(-1),
                test_record(item_id, Some(batch.id_typed()), dec!(5), dec!(-1)),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidWrite(_)));
    }

    #[test]
    fn audit_records_commit_with_their_mutation() {
        let store = InMemoryBatchStore::new();
        let item_id = ItemId::new();

        let batch = store
            .create_batch(test_new_batch(item_id, dec!(10)), test_record(item_id, None, dec!(0), dec!(10)))
            .unwrap();
        store
            .update_batch_quantity(
                batch.id_typed(),
                dec!(10),
                dec!(4),
                test_record(item_id, Some(batch.id_typed()), dec!(10), dec!(4)),
            )
            .unwrap();

        let trail = store.list_adjustments_by_item(item_id).unwrap();
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[0].batch_id, None);
        assert_eq!(trail[1].batch_id, Some(batch.id_typed()));

        // A failed CAS leaves no trace in the trail.
        let _ = store.update_batch_quantity(
            batch.id_typed(),
            dec!(10),
            dec!(2),
            test_record(item_id, Some(batch.id_typed()), dec!(10), dec!(2)),
        );
        assert_eq!(store.list_adjustments_by_item(item_id).unwrap().len(), 2);
    }
}
