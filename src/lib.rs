//! An archetype-based entity component system with relation-keyed columns.
//!
//! Per-entity data lives in homogeneous columnar tables ([archetypes]):
//! every entity is stored in exactly the table whose column-key set equals
//! its own component set, and moves between tables when that set changes.
//! A column is keyed not just by its data type but by a *target* — plain,
//! another entity (a relation), or an external object (a link) — and
//! [queries] match those keys with exact or wildcard predicates, iterating
//! the cross-join of wildcard matches single-threaded or across the rayon
//! pool.

pub mod archetypes;
pub mod components;
pub mod data_structures;
pub mod entities;
pub mod queries;
mod error;
mod world;

pub use error::EcsError;
pub use world::{ComponentRef, World, WorldGuard};

pub mod prelude {
	pub use crate::components::{Component, ComponentType, Match, ObjectId, Signature, Target, TypeExpr};
	pub use crate::entities::Entity;
	pub use crate::error::EcsError;
	pub use crate::queries::Query;
	pub use crate::world::{ComponentRef, World, WorldGuard};
}
