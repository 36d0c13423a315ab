use crate::components::{Component, ComponentId};
use crate::entities::Entity;
use crate::error::EcsError;

/// An opaque identity for an external object referenced by a link component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

/// The second dimension of a column key: what the column is aimed at.
///
/// A component keyed by `Target::Entity` is a *relation*; one keyed by
/// `Target::Object` is a *link*. Relation targets are keys, not owning
/// pointers: despawning the target entity does not cascade, and a relation
/// pointing at a despawned entity keeps dangling until removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
	/// An ordinary component, keyed by its data type alone.
	Plain,
	/// A relation column, additionally keyed by another entity.
	Entity(Entity),
	/// A link column, additionally keyed by an external object identity.
	Object(ObjectId),
}

/// A predicate over column targets, carried by queries and lookups.
///
/// The three exact variants select a single column; the wildcard variants may
/// select several columns of the same component type within one archetype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Match {
	/// Only the plain-target column.
	Plain,
	/// Only the relation column aimed at this exact entity.
	Entity(Entity),
	/// Only the link column aimed at this exact object.
	Object(ObjectId),
	/// Any relation column, whatever its target entity.
	AnyEntity,
	/// Any link column, whatever its target object.
	AnyObject,
	/// Any column of the component type.
	Any,
}

impl Match {
	/// Returns true if a column with the given target satisfies this predicate.
	pub fn matches(&self, target: &Target) -> bool {
		match (self, target) {
			(Match::Plain, Target::Plain) => true,
			(Match::Entity(e), Target::Entity(t)) => e == t,
			(Match::Object(o), Target::Object(t)) => o == t,
			(Match::AnyEntity, Target::Entity(_)) => true,
			(Match::AnyObject, Target::Object(_)) => true,
			(Match::Any, _) => true,
			_ => false,
		}
	}

	/// Converts an exact predicate into the target it names.
	///
	/// Mutating operations must address a single column, so the wildcard
	/// variants fail with [EcsError::InvalidMatch].
	pub fn as_target(&self) -> Result<Target, EcsError> {
		match self {
			Match::Plain => Ok(Target::Plain),
			Match::Entity(e) => Ok(Target::Entity(*e)),
			Match::Object(o) => Ok(Target::Object(*o)),
			_ => Err(EcsError::InvalidMatch),
		}
	}
}

/// The full key of a column: component type plus target.
///
/// Ordered by component id first, then target, so signatures and archetype
/// column sets sort deterministically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeExpr {
	/// The component type dimension of the key.
	pub component: ComponentId,
	/// The target dimension of the key.
	pub target: Target,
}

impl TypeExpr {
	/// Creates a column key from its two dimensions.
	pub fn new(component: ComponentId, target: Target) -> Self {
		Self { component, target }
	}

	/// The plain-target key of component type `T`.
	pub fn plain<T: Component>() -> Self {
		Self::new(ComponentId::of::<T>(), Target::Plain)
	}

	/// The key of component type `T` at an explicit target.
	pub fn of<T: Component>(target: Target) -> Self {
		Self::new(ComponentId::of::<T>(), target)
	}

	/// Returns true if this key satisfies `(component, filter)`.
	pub fn matches(&self, component: ComponentId, filter: &Match) -> bool {
		self.component == component && filter.matches(&self.target)
	}
}
