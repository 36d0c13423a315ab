//! [Archetypes](Archetype) partition the world: every entity lives in exactly
//! the table whose column-key set equals its own.

mod archetype;
mod archetype_store;

pub use archetype::Archetype;
pub use archetype_store::QueryId;
pub(crate) use archetype_store::ArchetypeStore;
