//! Integration tests for the full adjustment pipeline.
//!
//! Tests: Request → AdjustmentEngine → BatchStore (CAS + audit commit)
//!
//! Verifies:
//! - Quantity conservation across sequences of adjustments
//! - Non-negativity and the insufficient-quantity failure path
//! - Audit completeness (one record per successful adjustment)
//! - Concurrent decreases never lose an update

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Months, NaiveDate, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use rxstock_catalog::{CatalogItem, UnitConversion};
    use rxstock_core::{Actor, ActorId, BatchId, ItemId};
    use rxstock_inventory::{
        AdjustmentDirection, AdjustmentReason, AdjustmentRecord, Batch, DecreaseStock,
        IncreaseStock, NewBatch,
    };

    use crate::batch_store::{BatchStore, InMemoryBatchStore, StoreError};
    use crate::catalog::InMemoryCatalog;
    use crate::engine::{AdjustmentEngine, AdjustmentError};

    type TestEngine = AdjustmentEngine<Arc<InMemoryBatchStore>, Arc<InMemoryCatalog>>;

    fn test_actor() -> Actor {
        Actor::new(ActorId::new(), "pharmacist", "Test Pharmacist")
    }

    fn months_from_now(months: u32) -> NaiveDate {
        Utc::now()
            .date_naive()
            .checked_add_months(Months::new(months))
            .unwrap()
    }

    fn setup(item: CatalogItem) -> (TestEngine, ItemId) {
        rxstock_observability::init();
        let item_id = item.id_typed();
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog.upsert(item).unwrap();
        let store = Arc::new(InMemoryBatchStore::new());
        (AdjustmentEngine::new(store, catalog), item_id)
    }

    fn tablets_item(minimum_packs: u64) -> CatalogItem {
        CatalogItem::new(
            ItemId::new(),
            "PARA-500",
            "Paracetamol 500mg",
            Some("Paracetamol".to_string()),
            Some(UnitConversion::new(dec!(10), "tablets").unwrap()),
            minimum_packs,
        )
        .unwrap()
    }

    fn new_batch_increase(item_id: ItemId, delta: Decimal, expiry_months: u32) -> IncreaseStock {
        IncreaseStock {
            item_id,
            target: None,
            delta,
            expiry_date: Some(months_from_now(expiry_months)),
            cost_price_per_unit: Some(dec!(2.00)),
            selling_price_per_unit: Some(dec!(5.00)),
            supplier_id: None,
            reason: AdjustmentReason::Correction,
            notes: None,
            actor: test_actor(),
        }
    }

    fn decrease(item_id: ItemId, batch_id: BatchId, delta: Decimal) -> DecreaseStock {
        DecreaseStock {
            item_id,
            batch_id,
            delta,
            reason: AdjustmentReason::Correction,
            notes: None,
            actor: test_actor(),
        }
    }

    /// The worked scenario: pack_size 10, minimum 3 packs. 45 tablets in a
    /// new batch, then a decrease of 20 from that batch.
    #[test]
    fn receipt_then_sale_scenario() {
        let (engine, item_id) = setup(tablets_item(3));

        let outcome = engine
            .apply_increase(&new_batch_increase(item_id, dec!(45), 2))
            .unwrap();
        assert_eq!(outcome.batch_number, "B0001");
        assert_eq!(outcome.summary.total_atomic_quantity, dec!(45));
        assert_eq!(outcome.summary.available_packs, 4);
        assert!(!outcome.summary.is_low_stock);
        assert!(!engine.expiring_items(3).unwrap().is_empty());
        assert_eq!(
            engine.nearest_expiry(item_id, 3).unwrap(),
            Some(months_from_now(2))
        );

        let outcome = engine
            .apply_decrease(&decrease(item_id, outcome.batch_id, dec!(20)))
            .unwrap();
        assert_eq!(outcome.summary.total_atomic_quantity, dec!(25));
        assert_eq!(outcome.summary.available_packs, 2);
        assert!(outcome.summary.is_low_stock);
    }

    /// Conservation: totals always equal increases minus decreases.
    #[test]
    fn conservation_across_adjustment_sequence() {
        let (engine, item_id) = setup(tablets_item(0));

        let first = engine
            .apply_increase(&new_batch_increase(item_id, dec!(100), 6))
            .unwrap();
        let second = engine
            .apply_increase(&new_batch_increase(item_id, dec!(40), 12))
            .unwrap();

        engine
            .apply_decrease(&decrease(item_id, first.batch_id, dec!(30)))
            .unwrap();
        engine
            .apply_decrease(&decrease(item_id, second.batch_id, dec!(15)))
            .unwrap();

        let mut top_up = new_batch_increase(item_id, dec!(5), 6);
        top_up.target = Some(first.batch_id);
        engine.apply_increase(&top_up).unwrap();

        // 100 + 40 - 30 - 15 + 5
        let summary = engine.stock_summary(item_id).unwrap();
        assert_eq!(summary.total_atomic_quantity, dec!(100));
    }

    /// Audit completeness: one record per successful adjustment, each
    /// matching the batch's state transition; failures leave no record.
    #[test]
    fn audit_trail_matches_transitions() {
        let (engine, item_id) = setup(tablets_item(0));

        let outcome = engine
            .apply_increase(&new_batch_increase(item_id, dec!(50), 6))
            .unwrap();
        engine
            .apply_decrease(&decrease(item_id, outcome.batch_id, dec!(20)))
            .unwrap();
        let _ = engine
            .apply_decrease(&decrease(item_id, outcome.batch_id, dec!(500)))
            .unwrap_err();

        let trail = engine.adjustment_history(item_id).unwrap();
        assert_eq!(trail.len(), 2);

        assert_eq!(trail[0].direction, AdjustmentDirection::Increase);
        assert_eq!(trail[0].batch_id, None);
        assert_eq!(trail[0].previous_quantity, Decimal::ZERO);
        assert_eq!(trail[0].new_quantity, dec!(50));

        assert_eq!(trail[1].direction, AdjustmentDirection::Decrease);
        assert_eq!(trail[1].batch_id, Some(outcome.batch_id));
        assert_eq!(trail[1].previous_quantity, dec!(50));
        assert_eq!(trail[1].new_quantity, dec!(30));
    }

    /// Two concurrent decreases of 3 against a batch of 5: exactly one
    /// commits, the other fails, and the final quantity is 2 — never -1,
    /// never a lost update back to 5.
    #[test]
    fn concurrent_decreases_never_lose_updates() {
        let (engine, item_id) = setup(tablets_item(0));
        let engine = Arc::new(engine);

        let outcome = engine
            .apply_increase(&new_batch_increase(item_id, dec!(5), 6))
            .unwrap();
        let batch_id = outcome.batch_id;

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    engine.apply_decrease(&decrease(item_id, batch_id, dec!(3)))
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let ok = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok, 1);

        let failure = results.iter().find(|r| r.is_err()).unwrap();
        match failure {
            Err(AdjustmentError::InsufficientQuantity { available }) => {
                assert_eq!(*available, dec!(2));
            }
            Err(AdjustmentError::ConcurrentModification(_)) => {}
            other => panic!("expected a concurrency-safe failure, got {other:?}"),
        }

        let summary = engine.stock_summary(item_id).unwrap();
        assert_eq!(summary.total_atomic_quantity, dec!(2));
    }

    /// Store wrapper whose quantity CAS always loses, as if another writer
    /// lands between every read and update.
    struct ContendedBatchStore {
        inner: InMemoryBatchStore,
    }

    impl BatchStore for ContendedBatchStore {
        fn get_batch(&self, id: BatchId) -> Result<Option<Batch>, StoreError> {
            self.inner.get_batch(id)
        }

        fn list_batches_by_item(&self, item_id: ItemId) -> Result<Vec<Batch>, StoreError> {
            self.inner.list_batches_by_item(item_id)
        }

        fn create_batch(
            &self,
            new: NewBatch,
            record: AdjustmentRecord,
        ) -> Result<Batch, StoreError> {
            self.inner.create_batch(new, record)
        }

        fn update_batch_quantity(
            &self,
            id: BatchId,
            _expected: Decimal,
            _new_quantity: Decimal,
            _record: AdjustmentRecord,
        ) -> Result<Batch, StoreError> {
            let current = self
                .inner
                .get_batch(id)?
                .ok_or(StoreError::BatchNotFound)?
                .quantity();
            Err(StoreError::Conflict { current })
        }

        fn list_adjustments_by_item(
            &self,
            item_id: ItemId,
        ) -> Result<Vec<AdjustmentRecord>, StoreError> {
            self.inner.list_adjustments_by_item(item_id)
        }
    }

    /// A CAS conflict that never resolves is retried a bounded number of
    /// times, then surfaced as `ConcurrentModification`. Nothing commits:
    /// the quantity is untouched and no audit record is appended.
    #[test]
    fn exhausted_cas_retries_surface_concurrent_modification() {
        rxstock_observability::init();
        let item = tablets_item(0);
        let item_id = item.id_typed();
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog.upsert(item).unwrap();
        let store = Arc::new(ContendedBatchStore {
            inner: InMemoryBatchStore::new(),
        });
        let engine = AdjustmentEngine::new(store, catalog);

        let outcome = engine
            .apply_increase(&new_batch_increase(item_id, dec!(5), 6))
            .unwrap();

        let err = engine
            .apply_decrease(&decrease(item_id, outcome.batch_id, dec!(3)))
            .unwrap_err();
        assert!(matches!(err, AdjustmentError::ConcurrentModification(_)));

        let summary = engine.stock_summary(item_id).unwrap();
        assert_eq!(summary.total_atomic_quantity, dec!(5));
        assert_eq!(engine.adjustment_history(item_id).unwrap().len(), 1);
    }

    /// Depleted batches stay out of availability but keep their number in
    /// the store, and an increase targeting one re-activates it.
    #[test]
    fn depleted_batch_reactivation() {
        let (engine, item_id) = setup(tablets_item(0));

        let outcome = engine
            .apply_increase(&new_batch_increase(item_id, dec!(10), 6))
            .unwrap();
        engine
            .apply_decrease(&decrease(item_id, outcome.batch_id, dec!(10)))
            .unwrap();

        let summary = engine.stock_summary(item_id).unwrap();
        assert!(!summary.has_any_stock);

        let mut reactivate = new_batch_increase(item_id, dec!(4), 6);
        reactivate.target = Some(outcome.batch_id);
        let outcome = engine.apply_increase(&reactivate).unwrap();

        // Same batch identity and number, stock available again.
        assert_eq!(outcome.batch_number, "B0001");
        assert_eq!(outcome.summary.total_atomic_quantity, dec!(4));
        assert!(outcome.summary.has_any_stock);
    }

    /// Bulk receipts are independent: one bad row fails alone.
    #[test]
    fn bulk_receipt_partial_failure() {
        let (engine, item_id) = setup(tablets_item(0));

        let mut bad = new_batch_increase(item_id, dec!(30), 6);
        bad.cost_price_per_unit = None;

        let report = engine.receive_bulk(&[
            new_batch_increase(item_id, dec!(10), 6),
            bad,
            new_batch_increase(item_id, dec!(20), 6),
        ]);

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert!(matches!(
            report.results[1],
            Err(AdjustmentError::MissingBatchDetails(_))
        ));

        let summary = engine.stock_summary(item_id).unwrap();
        assert_eq!(summary.total_atomic_quantity, dec!(30));
    }

    #[test]
    fn unknown_item_and_batch_are_referential_failures() {
        let (engine, item_id) = setup(tablets_item(0));

        let err = engine
            .apply_increase(&new_batch_increase(ItemId::new(), dec!(10), 6))
            .unwrap_err();
        assert_eq!(err, AdjustmentError::ItemNotFound);

        let err = engine
            .apply_decrease(&decrease(item_id, BatchId::new(), dec!(1)))
            .unwrap_err();
        assert_eq!(err, AdjustmentError::BatchNotFound);
    }

    /// Expiry report paths: expiring-soon and already-expired are distinct.
    #[test]
    fn expiry_reports_separate_soon_from_expired() {
        let soon_item = tablets_item(0);
        let soon_id = soon_item.id_typed();
        let expired_item = CatalogItem::new(
            ItemId::new(),
            "AMOX-250",
            "Amoxicillin 250mg",
            None,
            None,
            0,
        )
        .unwrap();
        let expired_id = expired_item.id_typed();

        let catalog = Arc::new(InMemoryCatalog::new());
        catalog.upsert(soon_item).unwrap();
        catalog.upsert(expired_item).unwrap();
        let store = Arc::new(InMemoryBatchStore::new());
        let engine = AdjustmentEngine::new(store, catalog);

        engine
            .apply_increase(&new_batch_increase(soon_id, dec!(10), 2))
            .unwrap();

        let mut expired_receipt = new_batch_increase(expired_id, dec!(10), 1);
        expired_receipt.expiry_date = Some(
            Utc::now()
                .date_naive()
                .checked_sub_months(Months::new(1))
                .unwrap(),
        );
        engine.apply_increase(&expired_receipt).unwrap();

        let expiring = engine.expiring_items(3).unwrap();
        assert!(expiring.contains(&soon_id));
        assert!(!expiring.contains(&expired_id));

        let expired = engine.expired_items().unwrap();
        assert!(expired.contains(&expired_id));
        assert!(!expired.contains(&soon_id));
    }
}
