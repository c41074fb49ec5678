//! Catalog domain module.
//!
//! This crate defines what an item *is*: its display attributes, its
//! pack/unit conversion configuration, and its reorder threshold. It carries
//! no stock state; batches and quantities live in the ledger.

pub mod conversion;
pub mod item;

pub use conversion::UnitConversion;
pub use item::CatalogItem;
