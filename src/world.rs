use crate::archetypes::ArchetypeStore;
use crate::components::{Component, ComponentId, ComponentType, Match, Signature, Target, TypeExpr};
use crate::entities::{Entity, EntityDirectory, EntityLocation};
use crate::error::EcsError;
use crate::queries::{Query, StreamTuple};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::any::Any;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

/// A container for entities, the archetypes partitioning them, and the
/// structural-mutation lock.
///
/// ## Concurrency model
///
/// The world is single-writer: one structural mutation (spawn, despawn,
/// add/remove component, archetype creation) is in flight at a time, and each
/// query iteration holds the lock exclusively for its whole run because
/// callbacks receive mutable component references. Read-only access from
/// other threads goes through [lock](World::lock), which takes the lock
/// shared.
///
/// Structural mutation from inside an iteration callback is forbidden; the
/// attempt is detected best-effort and fails with
/// [EcsError::StructuralMutationDuringIteration]. Nested iteration over the
/// same world is likewise unsupported. Mutations performed under the write
/// lock are visible to the next iteration that acquires it.
pub struct World {
	pub(crate) core: RwLock<WorldCore>,
}

pub(crate) struct WorldCore {
	pub entities: EntityDirectory,
	pub store: ArchetypeStore,
}

impl World {
	/// Creates a new world holding only the empty archetype.
	pub fn new() -> Self {
		tracing::debug!("created world");
		Self {
			core: RwLock::new(WorldCore {
				entities: EntityDirectory::default(),
				store: ArchetypeStore::new(),
			}),
		}
	}

	fn write_core(&self) -> Result<RwLockWriteGuard<'_, WorldCore>, EcsError> {
		// an exclusively held core lock means an iteration or an outstanding
		// component borrow is in flight on this world
		if self.core.is_locked_exclusive() {
			return Err(EcsError::StructuralMutationDuringIteration);
		}
		Ok(self.core.write())
	}

	/// Creates an entity with no components.
	pub fn spawn(&self) -> Result<Entity, EcsError> {
		self.write_core()?.spawn()
	}

	/// Creates an entity carrying one plain component.
	pub fn spawn_with<T: Component>(&self, value: T) -> Result<Entity, EcsError> {
		let mut core = self.write_core()?;
		let entity = core.spawn()?;
		core.add_component(entity, ComponentType::of::<T>(), Target::Plain, Box::new(value))?;
		Ok(entity)
	}

	/// Destroys an entity, invalidating its handle.
	///
	/// Relation columns in other entities that target the despawned entity are
	/// left in place: relation targets are keys, not owning pointers, so they
	/// dangle until their owners remove them.
	pub fn despawn(&self, entity: Entity) -> Result<(), EcsError> {
		self.write_core()?.despawn(entity)
	}

	/// Returns true while `entity`'s generation is current.
	pub fn is_alive(&self, entity: Entity) -> bool {
		self.core.read().entities.is_alive(entity)
	}

	/// Number of live entities.
	pub fn entity_count(&self) -> usize {
		self.core.read().entities.live_count()
	}

	/// Adds (or overwrites) a plain component on `entity`.
	pub fn add_component<T: Component>(&self, entity: Entity, value: T) -> Result<(), EcsError> {
		self.add_component_at(entity, value, Target::Plain)
	}

	/// Adds (or overwrites) a component keyed by an explicit target.
	///
	/// Adding a column the entity already carries overwrites the stored value
	/// and leaves the signature unchanged.
	pub fn add_component_at<T: Component>(
		&self,
		entity: Entity,
		value: T,
		target: Target,
	) -> Result<(), EcsError> {
		let mut core = self.write_core()?;
		core.add_component(entity, ComponentType::of::<T>(), target, Box::new(value))
	}

	/// Removes the plain component of type `T`.
	pub fn remove_component<T: Component>(&self, entity: Entity) -> Result<(), EcsError> {
		self.remove_component_at::<T>(entity, Target::Plain)
	}

	/// Removes the component keyed by `(T, target)`.
	pub fn remove_component_at<T: Component>(&self, entity: Entity, target: Target) -> Result<(), EcsError> {
		let mut core = self.write_core()?;
		core.remove_component(entity, ComponentType::of::<T>(), target)
	}

	/// Returns true iff the entity's signature has a column matching
	/// `(T, filter)`. Wildcard filters are valid here.
	pub fn has_component<T: Component>(&self, entity: Entity, filter: Match) -> Result<bool, EcsError> {
		let core = self.core.read();
		let location = core.entities.location(entity)?;
		let signature = core.store.archetypes[location.archetype as usize].signature();
		Ok(signature.matches(ComponentId::of::<T>(), &filter))
	}

	/// Exclusive borrow of the first column matching `(T, filter)` at the
	/// entity's row. The world lock is held for the life of the returned ref.
	pub fn get_component<T: Component>(
		&self,
		entity: Entity,
		filter: Match,
	) -> Result<ComponentRef<'_, T>, EcsError> {
		let mut guard = self.write_core()?;
		let ptr = guard.component_ptr::<T>(entity, &filter)?;
		Ok(ComponentRef { _guard: guard, ptr, _marker: PhantomData })
	}

	/// Like [get_component](World::get_component), but a missing column is
	/// default-initialized at the target named by `filter` first. Creation
	/// needs a specific target, so a wildcard filter that matches nothing
	/// fails with [EcsError::InvalidMatch].
	pub fn get_or_create_component<T: Component>(
		&self,
		entity: Entity,
		filter: Match,
	) -> Result<ComponentRef<'_, T>, EcsError> {
		let mut guard = self.write_core()?;
		let ptr = match guard.component_ptr::<T>(entity, &filter) {
			Ok(ptr) => ptr,
			Err(EcsError::ComponentNotFound) => {
				let target = filter.as_target()?;
				guard.add_component(entity, ComponentType::of::<T>(), target, Box::new(T::default()))?;
				guard.component_ptr::<T>(entity, &filter)?
			},
			Err(e) => return Err(e),
		};
		Ok(ComponentRef { _guard: guard, ptr, _marker: PhantomData })
	}

	/// The entity's current signature.
	pub fn signature(&self, entity: Entity) -> Result<Signature, EcsError> {
		let core = self.core.read();
		let location = core.entities.location(entity)?;
		Ok(core.store.archetypes[location.archetype as usize].signature().clone())
	}

	/// Takes the structural lock shared, for read-only access that must not
	/// interleave with mutation. Many guards may be live at once.
	pub fn lock(&self) -> WorldGuard<'_> {
		WorldGuard { core: self.core.read() }
	}

	/// Builds a query over the stream tuple `S`; every stream defaults to a
	/// plain-target match.
	pub fn query<S: StreamTuple>(&self) -> Query<S> {
		Query::new()
	}
}

impl Default for World {
	fn default() -> Self {
		Self::new()
	}
}

impl WorldCore {
	pub(crate) fn spawn(&mut self) -> Result<Entity, EcsError> {
		let entity = self.entities.allocate(EntityLocation {
			archetype: ArchetypeStore::EMPTY as u32,
			row: 0,
		});
		let empty = &mut self.store.archetypes[ArchetypeStore::EMPTY];
		let row = empty.add_row(entity, &mut Vec::new())?;
		self.entities.set_location(entity, EntityLocation {
			archetype: ArchetypeStore::EMPTY as u32,
			row: row as u32,
		});
		Ok(entity)
	}

	pub(crate) fn despawn(&mut self, entity: Entity) -> Result<(), EcsError> {
		let location = self.entities.release(entity)?;
		let archetype = &mut self.store.archetypes[location.archetype as usize];
		if let Some(swapped) = archetype.remove_row(location.row as usize) {
			self.entities.set_location(swapped, location);
		}
		tracing::trace!(index = entity.index(), "despawned entity");
		Ok(())
	}

	pub(crate) fn add_component(
		&mut self,
		entity: Entity,
		ty: ComponentType,
		target: Target,
		value: Box<dyn Any + Send + Sync>,
	) -> Result<(), EcsError> {
		let location = self.entities.location(entity)?;
		let expr = TypeExpr::new(ty.id(), target);
		let source = location.archetype as usize;
		if let Some(index) = self.store.archetypes[source].column_index(&expr) {
			// idempotent on the signature: overwrite the stored value
			let archetype = &mut self.store.archetypes[source];
			return archetype.column_mut(index).data.store(location.row as usize, value.as_ref());
		}
		let destination = self.store.transition(source, expr, &ty, true);
		self.migrate(entity, location, destination, Some((expr, value)))
	}

	pub(crate) fn remove_component(
		&mut self,
		entity: Entity,
		ty: ComponentType,
		target: Target,
	) -> Result<(), EcsError> {
		let location = self.entities.location(entity)?;
		let expr = TypeExpr::new(ty.id(), target);
		let source = location.archetype as usize;
		if !self.store.archetypes[source].signature().contains(&expr) {
			return Err(EcsError::ComponentNotFound);
		}
		let destination = self.store.transition(source, expr, &ty, false);
		self.migrate(entity, location, destination, None)
	}

	fn migrate(
		&mut self,
		entity: Entity,
		location: EntityLocation,
		destination: usize,
		added: Option<(TypeExpr, Box<dyn Any + Send + Sync>)>,
	) -> Result<(), EcsError> {
		let source = location.archetype as usize;
		debug_assert_ne!(source, destination);
		let mut added: Vec<_> = added.into_iter().collect();
		let (src, dst) = self.store.pair_mut(source, destination);
		let (row, swapped) = crate::archetypes::Archetype::migrate_row(src, dst, location.row as usize, &mut added)?;
		self.entities.set_location(entity, EntityLocation {
			archetype: destination as u32,
			row: row as u32,
		});
		if let Some(swapped) = swapped {
			self.entities.set_location(swapped, location);
		}
		Ok(())
	}

	pub(crate) fn component_ptr<T: Component>(
		&mut self,
		entity: Entity,
		filter: &Match,
	) -> Result<*mut T, EcsError> {
		let location = self.entities.location(entity)?;
		let archetype = &mut self.store.archetypes[location.archetype as usize];
		let component = ComponentId::of::<T>();
		let index = (0..archetype.column_count())
			.find(|&i| archetype.column_expr(i).matches(component, filter))
			.ok_or(EcsError::ComponentNotFound)?;
		// SAFETY: a matching column key implies the column stores T, and the
		// directory row is in bounds for a live entity
		unsafe { Ok(archetype.column_ptr::<T>(index).add(location.row as usize)) }
	}
}

/// A scoped borrow of one component, holding the world's structural lock as
/// evidence that no structural mutation can move the row underneath it.
pub struct ComponentRef<'a, T> {
	_guard: RwLockWriteGuard<'a, WorldCore>,
	ptr: *mut T,
	_marker: PhantomData<&'a mut T>,
}

impl<T> Deref for ComponentRef<'_, T> {
	type Target = T;
	fn deref(&self) -> &T {
		// SAFETY: the exclusive guard pins the row for the borrow's lifetime
		unsafe { &*self.ptr }
	}
}

impl<T> DerefMut for ComponentRef<'_, T> {
	fn deref_mut(&mut self) -> &mut T {
		// SAFETY: as above; the guard is exclusive
		unsafe { &mut *self.ptr }
	}
}

/// A shared, read-only view of the world. While any guard is live, structural
/// mutation blocks, so references handed out here stay valid.
pub struct WorldGuard<'a> {
	core: RwLockReadGuard<'a, WorldCore>,
}

impl WorldGuard<'_> {
	/// Returns true while `entity`'s generation is current.
	pub fn is_alive(&self, entity: Entity) -> bool {
		self.core.entities.is_alive(entity)
	}

	/// The entity's current signature.
	pub fn signature(&self, entity: Entity) -> Result<&Signature, EcsError> {
		let location = self.core.entities.location(entity)?;
		Ok(self.core.store.archetypes[location.archetype as usize].signature())
	}

	/// Shared borrow of the first column matching `(T, filter)` at the
	/// entity's row.
	pub fn get<T: Component>(&self, entity: Entity, filter: Match) -> Result<&T, EcsError> {
		let location = self.core.entities.location(entity)?;
		let archetype = &self.core.store.archetypes[location.archetype as usize];
		let component = ComponentId::of::<T>();
		let index = (0..archetype.column_count())
			.find(|&i| archetype.column_expr(i).matches(component, &filter))
			.ok_or(EcsError::ComponentNotFound)?;
		let span = archetype.column(index).data.span::<T>()?;
		Ok(&span[location.row as usize])
	}
}
