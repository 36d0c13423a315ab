//! [Queries](Query) compile a structural mask into a cached set of matching
//! archetypes and iterate them with a cross-join over wildcard-matched
//! columns.

mod cross_join;
mod query;

pub use query::*;
