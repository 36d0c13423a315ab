use std::any::TypeId;
use thiserror::Error;

/// Errors surfaced by world, storage and query operations.
///
/// Every failure propagates to the caller; the core never retries or swallows.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcsError {
	/// Operation on a stale or never-spawned entity handle.
	#[error("entity is not alive")]
	EntityNotAlive,

	/// Component lookup on an entity whose archetype has no matching column.
	#[error("component not found on entity")]
	ComponentNotFound,

	/// Bulk write targeted an archetype without the exact requested column.
	#[error("matched archetype is missing the target column")]
	ColumnMissing,

	/// Type-erased storage was handed a value of the wrong runtime type.
	#[error("type mismatch: column stores {expected:?}, got {actual:?}")]
	TypeMismatch {
		/// Element type of the column.
		expected: TypeId,
		/// Runtime type of the supplied value or destination column.
		actual: TypeId,
	},

	/// A wildcard match was passed to an operation that requires a specific target.
	#[error("wildcard match passed where a specific target is required")]
	InvalidMatch,

	/// A structural mutation was attempted while an iteration holds the world lock.
	#[error("structural mutation attempted during iteration")]
	StructuralMutationDuringIteration,
}
