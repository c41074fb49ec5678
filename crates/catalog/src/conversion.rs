//! Pack/unit conversion math.
//!
//! Stock is tracked in atomic units (e.g. single tablets); thresholds and
//! availability are reported in packs. Conversion always floors: a partial
//! pack is never reported as a usable whole pack.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rxstock_core::{DomainError, DomainResult};

/// Pack configuration for an item.
///
/// An item without a configured conversion behaves as `pack_size = 1` with
/// unit label "units"; see [`UnitConversion::identity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitConversion {
    pack_size: Decimal,
    unit_label: String,
}

impl UnitConversion {
    /// Create a conversion with a positive pack size.
    pub fn new(pack_size: Decimal, unit_label: impl Into<String>) -> DomainResult<Self> {
        if pack_size <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "pack_size must be positive (got {pack_size})"
            )));
        }
        Ok(Self {
            pack_size,
            unit_label: unit_label.into(),
        })
    }

    /// The implicit conversion for items tracked directly in atomic units.
    pub fn identity() -> Self {
        Self {
            pack_size: Decimal::ONE,
            unit_label: "units".to_string(),
        }
    }

    pub fn pack_size(&self) -> Decimal {
        self.pack_size
    }

    pub fn unit_label(&self) -> &str {
        &self.unit_label
    }

    /// Whole packs contained in `atomic` units (floored).
    ///
    /// Flooring, not rounding: `pack_size = 10`, `atomic = 25` is 2 packs,
    /// never 3.
    pub fn to_packs(&self, atomic: Decimal) -> u64 {
        debug_assert!(atomic >= Decimal::ZERO, "atomic quantity is non-negative");
        // A floored pack count beyond u64::MAX saturates; it must never
        // read as zero packs.
        (atomic / self.pack_size).floor().to_u64().unwrap_or(u64::MAX)
    }

    /// Atomic quantity equivalent to `packs` whole packs.
    pub fn to_atomic(&self, packs: u64) -> Decimal {
        Decimal::from(packs) * self.pack_size
    }
}
