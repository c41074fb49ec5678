//! Caller identity, as supplied by an external auth context.
//!
//! The ledger never authenticates; it only records who asked for a change.

use serde::{Deserialize, Serialize};

use crate::id::ActorId;

/// Identity of the caller performing an adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    /// Role label resolved by the auth layer (e.g. "pharmacist", "admin").
    pub role: String,
    pub display_name: String,
}

impl Actor {
    pub fn new(id: ActorId, role: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id,
            role: role.into(),
            display_name: display_name.into(),
        }
    }
}
