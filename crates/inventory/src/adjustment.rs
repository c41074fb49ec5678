//! Adjustments: the only way a batch quantity ever changes.
//!
//! The pure half of the adjustment engine lives here. [`plan_increase`] and
//! [`plan_decrease`] validate a command against a snapshot of the targeted
//! batch and return an [`AdjustmentPlan`] describing exactly what to write;
//! they never touch storage. The orchestration half (load, commit, retry)
//! lives in `rxstock-infra`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rxstock_core::{Actor, ActorId, AdjustmentId, BatchId, DomainError, DomainResult, ItemId, SupplierId};

use crate::batch::{Batch, NewBatch};

/// Direction of a quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentDirection {
    Increase,
    Decrease,
}

impl AdjustmentDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentDirection::Increase => "increase",
            AdjustmentDirection::Decrease => "decrease",
        }
    }
}

/// Why an adjustment happened. Fixed taxonomy, consumed as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentReason {
    Correction,
    Damage,
    Expiry,
    Theft,
    Return,
    Recount,
    Other,
}

impl AdjustmentReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentReason::Correction => "correction",
            AdjustmentReason::Damage => "damage",
            AdjustmentReason::Expiry => "expiry",
            AdjustmentReason::Theft => "theft",
            AdjustmentReason::Return => "return",
            AdjustmentReason::Recount => "recount",
            AdjustmentReason::Other => "other",
        }
    }
}

/// Immutable audit entry: who changed what, when, why.
///
/// Written in the same commit as the quantity change it describes; never
/// updated or deleted afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentRecord {
    pub id: AdjustmentId,
    pub item_id: ItemId,
    /// `None` means this adjustment opened a new batch.
    pub batch_id: Option<BatchId>,
    pub direction: AdjustmentDirection,
    /// Positive atomic amount.
    pub quantity_delta: Decimal,
    pub previous_quantity: Decimal,
    pub new_quantity: Decimal,
    pub reason: AdjustmentReason,
    pub notes: Option<String>,
    pub actor_id: ActorId,
    pub actor_role: String,
    pub timestamp: DateTime<Utc>,
}

/// Command: receive stock, either into an existing batch or by opening a
/// new one (`target = None`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncreaseStock {
    pub item_id: ItemId,
    /// `Some` adds into that batch; `None` opens a new batch and requires
    /// the expiry/pricing fields below.
    pub target: Option<BatchId>,
    /// Positive atomic amount.
    pub delta: Decimal,
    pub expiry_date: Option<NaiveDate>,
    pub cost_price_per_unit: Option<Decimal>,
    pub selling_price_per_unit: Option<Decimal>,
    pub supplier_id: Option<SupplierId>,
    pub reason: AdjustmentReason,
    pub notes: Option<String>,
    pub actor: Actor,
}

/// Command: remove stock from one specific batch.
///
/// Decreases always name their batch: batches differ in cost basis and
/// expiry, so the choice has financial and audit consequences the caller
/// must make explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecreaseStock {
    pub item_id: ItemId,
    pub batch_id: BatchId,
    /// Positive atomic amount, at most the batch's current quantity.
    pub delta: Decimal,
    pub reason: AdjustmentReason,
    pub notes: Option<String>,
    pub actor: Actor,
}

/// The single store write an adjustment performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchWrite {
    /// Open a new batch holding the received quantity.
    Create(NewBatch),
    /// Compare-and-swap quantity update: commits only if the batch still
    /// holds `expected`.
    SetQuantity {
        batch_id: BatchId,
        expected: Decimal,
        new_quantity: Decimal,
    },
}

/// Validated outcome of planning: the write to perform plus everything the
/// audit record needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustmentPlan {
    pub write: BatchWrite,
    pub direction: AdjustmentDirection,
    pub quantity_delta: Decimal,
    pub previous_quantity: Decimal,
    pub new_quantity: Decimal,
    pub reason: AdjustmentReason,
    pub notes: Option<String>,
    pub actor: Actor,
}

impl AdjustmentPlan {
    /// Build the audit record for this plan.
    ///
    /// `batch_id` is `None` when the plan opened a new batch (the record's
    /// convention for "created by this adjustment").
    pub fn into_record(
        self,
        id: AdjustmentId,
        item_id: ItemId,
        batch_id: Option<BatchId>,
        timestamp: DateTime<Utc>,
    ) -> AdjustmentRecord {
        AdjustmentRecord {
            id,
            item_id,
            batch_id,
            direction: self.direction,
            quantity_delta: self.quantity_delta,
            previous_quantity: self.previous_quantity,
            new_quantity: self.new_quantity,
            reason: self.reason,
            notes: self.notes,
            actor_id: self.actor.id,
            actor_role: self.actor.role,
            timestamp,
        }
    }
}

/// Validate an increase command against the targeted batch snapshot.
///
/// `target` must be the current state of the batch named by `cmd.target`
/// (and `None` exactly when the command opens a new batch).
///
/// Increasing into an existing batch assumes the same cost basis as the
/// original receipt: any pricing supplied on that path is ignored, never
/// applied retroactively.
pub fn plan_increase(cmd: &IncreaseStock, target: Option<&Batch>) -> DomainResult<AdjustmentPlan> {
    if cmd.delta <= Decimal::ZERO {
        return Err(DomainError::invalid_quantity(format!(
            "increase delta must be positive (got {})",
            cmd.delta
        )));
    }

    match target {
        Some(batch) => {
            if batch.item_id() != cmd.item_id {
                return Err(DomainError::not_found());
            }
            let previous = batch.quantity();
            let new_quantity = previous + cmd.delta;
            Ok(AdjustmentPlan {
                write: BatchWrite::SetQuantity {
                    batch_id: batch.id_typed(),
                    expected: previous,
                    new_quantity,
                },
                direction: AdjustmentDirection::Increase,
                quantity_delta: cmd.delta,
                previous_quantity: previous,
                new_quantity,
                reason: cmd.reason,
                notes: cmd.notes.clone(),
                actor: cmd.actor.clone(),
            })
        }
        None => {
            let expiry_date = cmd.expiry_date.ok_or_else(|| {
                DomainError::missing_batch_details("expiry_date is required for a new batch")
            })?;
            let cost = require_positive_price(cmd.cost_price_per_unit, "cost_price_per_unit")?;
            let selling =
                require_positive_price(cmd.selling_price_per_unit, "selling_price_per_unit")?;

            Ok(AdjustmentPlan {
                write: BatchWrite::Create(NewBatch {
                    item_id: cmd.item_id,
                    quantity: cmd.delta,
                    expiry_date,
                    cost_price_per_unit: cost,
                    selling_price_per_unit: selling,
                    supplier_id: cmd.supplier_id,
                }),
                direction: AdjustmentDirection::Increase,
                quantity_delta: cmd.delta,
                previous_quantity: Decimal::ZERO,
                new_quantity: cmd.delta,
                reason: cmd.reason,
                notes: cmd.notes.clone(),
                actor: cmd.actor.clone(),
            })
        }
    }
}

/// Validate a decrease command against the targeted batch snapshot.
///
/// The batch may reach exactly zero (depleted); it then stays in the store
/// for audit but drops out of availability.
pub fn plan_decrease(cmd: &DecreaseStock, batch: &Batch) -> DomainResult<AdjustmentPlan> {
    if cmd.delta <= Decimal::ZERO {
        return Err(DomainError::invalid_quantity(format!(
            "decrease delta must be positive (got {})",
            cmd.delta
        )));
    }
    if batch.item_id() != cmd.item_id {
        return Err(DomainError::not_found());
    }

    let previous = batch.quantity();
    if cmd.delta > previous {
        return Err(DomainError::insufficient(previous));
    }
    let new_quantity = previous - cmd.delta;

    Ok(AdjustmentPlan {
        write: BatchWrite::SetQuantity {
            batch_id: batch.id_typed(),
            expected: previous,
            new_quantity,
        },
        direction: AdjustmentDirection::Decrease,
        quantity_delta: cmd.delta,
        previous_quantity: previous,
        new_quantity,
        reason: cmd.reason,
        notes: cmd.notes.clone(),
        actor: cmd.actor.clone(),
    })
}

fn require_positive_price(price: Option<Decimal>, field: &str) -> DomainResult<Decimal> {
    match price {
        Some(p) if p > Decimal::ZERO => Ok(p),
        Some(p) => Err(DomainError::missing_batch_details(format!(
            "{field} must be positive (got {p})"
        ))),
        None => Err(DomainError::missing_batch_details(format!(
            "{field} is required for a new batch"
        ))),
    }
}
