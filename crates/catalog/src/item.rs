//! Catalog item definition.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rxstock_core::{DomainError, DomainResult, Entity, ItemId};

use crate::conversion::UnitConversion;

/// An item in the catalog: display attributes plus the configuration the
/// ledger reads (pack conversion, reorder threshold).
///
/// The ledger never mutates a `CatalogItem`; it only reads `pack_size` and
/// `minimum_packs` when computing availability and low-stock signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    id: ItemId,
    code: String,
    name: String,
    generic_name: Option<String>,
    /// Absent means the item is tracked in atomic units directly.
    unit_conversion: Option<UnitConversion>,
    /// Reorder threshold, expressed in packs.
    minimum_packs: u64,
}

impl CatalogItem {
    pub fn new(
        id: ItemId,
        code: impl Into<String>,
        name: impl Into<String>,
        generic_name: Option<String>,
        unit_conversion: Option<UnitConversion>,
        minimum_packs: u64,
    ) -> DomainResult<Self> {
        let code = code.into();
        let name = name.into();
        if code.trim().is_empty() {
            return Err(DomainError::validation("code cannot be empty"));
        }
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        Ok(Self {
            id,
            code,
            name,
            generic_name,
            unit_conversion,
            minimum_packs,
        })
    }

    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn generic_name(&self) -> Option<&str> {
        self.generic_name.as_deref()
    }

    pub fn unit_conversion(&self) -> Option<&UnitConversion> {
        self.unit_conversion.as_ref()
    }

    /// Pack size in atomic units; 1 when no conversion is configured.
    pub fn pack_size(&self) -> Decimal {
        self.unit_conversion
            .as_ref()
            .map(UnitConversion::pack_size)
            .unwrap_or(Decimal::ONE)
    }

    /// Display label for one atomic unit; "units" when unconfigured.
    pub fn unit_label(&self) -> &str {
        self.unit_conversion
            .as_ref()
            .map(UnitConversion::unit_label)
            .unwrap_or("units")
    }

    pub fn minimum_packs(&self) -> u64 {
        self.minimum_packs
    }

    /// Whole packs contained in `atomic` units of this item (floored).
    pub fn to_packs(&self, atomic: Decimal) -> u64 {
        match &self.unit_conversion {
            Some(conv) => conv.to_packs(atomic),
            None => UnitConversion::identity().to_packs(atomic),
        }
    }

    /// Replace the conversion configuration (rare catalog edit).
    pub fn set_unit_conversion(&mut self, conversion: Option<UnitConversion>) {
        self.unit_conversion = conversion;
    }

    /// Replace the reorder threshold (rare catalog edit).
    pub fn set_minimum_packs(&mut self, minimum_packs: u64) {
        self.minimum_packs = minimum_packs;
    }
}

impl Entity for CatalogItem {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
