//! Read-only catalog boundary.
//!
//! The engine resolves item configuration (pack size, reorder threshold)
//! through this trait; catalog management itself is a separate concern and
//! writes items elsewhere.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rxstock_catalog::CatalogItem;
use rxstock_core::ItemId;

use crate::batch_store::StoreError;

/// Item catalog lookups the ledger needs.
pub trait ItemCatalog: Send + Sync {
    fn get_item(&self, id: ItemId) -> Result<Option<CatalogItem>, StoreError>;

    /// All items, for catalog-wide scans (expiry reports).
    fn list_items(&self) -> Result<Vec<CatalogItem>, StoreError>;
}

impl<C> ItemCatalog for Arc<C>
where
    C: ItemCatalog + ?Sized,
{
    fn get_item(&self, id: ItemId) -> Result<Option<CatalogItem>, StoreError> {
        (**self).get_item(id)
    }

    fn list_items(&self) -> Result<Vec<CatalogItem>, StoreError> {
        (**self).list_items()
    }
}

/// In-memory catalog. Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    items: RwLock<HashMap<ItemId, CatalogItem>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an item definition.
    pub fn upsert(&self, item: CatalogItem) -> Result<(), StoreError> {
        let mut items = self
            .items
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        items.insert(item.id_typed(), item);
        Ok(())
    }
}

impl ItemCatalog for InMemoryCatalog {
    fn get_item(&self, id: ItemId) -> Result<Option<CatalogItem>, StoreError> {
        let items = self
            .items
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(items.get(&id).cloned())
    }

    fn list_items(&self) -> Result<Vec<CatalogItem>, StoreError> {
        let items = self
            .items
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(items.values().cloned().collect())
    }
}
