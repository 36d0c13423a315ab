use crate::data_structures::AnyColumn;
use crate::components::ComponentId;
use std::hash::{Hash, Hasher};
use std::any::TypeId;

/// A piece of data associated with an entity.
///
/// Blanket-implemented for any `'static + Clone + Default + Send + Sync` type.
/// `Clone` powers bulk writes and multi-copy appends, `Default` powers slot
/// clearing and [get_or_create_component](crate::World::get_or_create_component),
/// and `Send + Sync` lets [job](crate::queries::Query) run callbacks on worker
/// threads.
pub trait Component: 'static + Clone + Default + Send + Sync {}

impl<T: 'static + Clone + Default + Send + Sync> Component for T {}

/// A runtime representation of a type implementing the [`Component`] trait.
///
/// Carries the column factory, so archetypes can materialize storage for the
/// type without knowing it statically.
#[derive(Clone)]
pub struct ComponentType {
	id: ComponentId,
	type_id: TypeId,
	make_column: fn() -> AnyColumn,
}

impl ComponentType {
	/// Retrieves the [ComponentType] of `T`.
	pub fn of<T: Component>() -> Self {
		Self {
			id: ComponentId::of::<T>(),
			type_id: TypeId::of::<T>(),
			make_column: AnyColumn::new::<T>,
		}
	}

	/// Retrieves the [ComponentType]'s unique runtime identifier.
	pub const fn id(&self) -> ComponentId {
		self.id
	}

	/// Retrieves the [ComponentType]'s unique compiletime identifier.
	pub const fn type_id(&self) -> TypeId {
		self.type_id
	}

	pub(crate) fn create_column(&self) -> AnyColumn {
		(self.make_column)()
	}
}

impl Eq for ComponentType {}

impl PartialEq<Self> for ComponentType {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Hash for ComponentType {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state)
	}
}
