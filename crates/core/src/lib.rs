//! `rxstock-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod actor;
pub mod entity;
pub mod error;
pub mod id;

pub use actor::Actor;
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{ActorId, AdjustmentId, BatchId, ItemId, SupplierId};
