use crate::entities::Entity;
use crate::error::EcsError;

/// Where a live entity currently lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct EntityLocation {
	pub archetype: u32,
	pub row: u32,
}

struct EntitySlot {
	location: EntityLocation,
	generation: u32,
	alive: bool,
}

/// The authoritative mapping from entity index to archetype and row.
///
/// Freed indices are recycled in LIFO order; each despawn bumps the slot
/// generation so the next occupant's handle is strictly greater than every
/// handle minted for the slot before it.
#[derive(Default)]
pub(crate) struct EntityDirectory {
	slots: Vec<EntitySlot>,
	free: Vec<u32>,
}

impl EntityDirectory {
	pub fn allocate(&mut self, location: EntityLocation) -> Entity {
		match self.free.pop() {
			Some(index) => {
				let slot = &mut self.slots[index as usize];
				slot.location = location;
				slot.alive = true;
				Entity { index, generation: slot.generation }
			},
			None => {
				let index = self.slots.len() as u32;
				self.slots.push(EntitySlot { location, generation: 1, alive: true });
				Entity { index, generation: 1 }
			},
		}
	}

	/// Invalidate the handle and queue its index for reuse.
	/// Returns the location the entity occupied.
	pub fn release(&mut self, entity: Entity) -> Result<EntityLocation, EcsError> {
		let location = self.location(entity)?;
		let slot = &mut self.slots[entity.index as usize];
		slot.alive = false;
		slot.generation += 1;
		self.free.push(entity.index);
		Ok(location)
	}

	pub fn is_alive(&self, entity: Entity) -> bool {
		self.slots
			.get(entity.index as usize)
			.map_or(false, |s| s.alive && s.generation == entity.generation)
	}

	pub fn location(&self, entity: Entity) -> Result<EntityLocation, EcsError> {
		match self.slots.get(entity.index as usize) {
			Some(s) if s.alive && s.generation == entity.generation => Ok(s.location),
			_ => Err(EcsError::EntityNotAlive),
		}
	}

	/// Rewrite a live entity's location. The caller has already validated the
	/// handle; this is the fix-up path after row moves and swap-fills.
	pub fn set_location(&mut self, entity: Entity, location: EntityLocation) {
		debug_assert!(self.is_alive(entity));
		self.slots[entity.index as usize].location = location;
	}

	pub fn live_count(&self) -> usize {
		self.slots.len() - self.free.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const LOCATION: EntityLocation = EntityLocation { archetype: 0, row: 0 };

	#[test]
	fn released_indices_recycle_lifo_with_greater_generation() {
		let mut directory = EntityDirectory::default();
		let a = directory.allocate(LOCATION);
		let b = directory.allocate(LOCATION);
		directory.release(a).unwrap();
		directory.release(b).unwrap();

		let c = directory.allocate(LOCATION);
		assert_eq!(b.index(), c.index(), "most recently freed index first");
		assert!(c.generation() > b.generation());
		assert!(!directory.is_alive(b), "stale handle stays dead");
		assert!(directory.is_alive(c));
	}

	#[test]
	fn stale_handles_fail_with_entity_not_alive() {
		let mut directory = EntityDirectory::default();
		let a = directory.allocate(LOCATION);
		directory.release(a).unwrap();
		assert_eq!(Err(EcsError::EntityNotAlive), directory.location(a));
		assert_eq!(Err(EcsError::EntityNotAlive), directory.release(a));
	}

	#[test]
	fn live_count_tracks_allocations() {
		let mut directory = EntityDirectory::default();
		let a = directory.allocate(LOCATION);
		let _b = directory.allocate(LOCATION);
		assert_eq!(2, directory.live_count());
		directory.release(a).unwrap();
		assert_eq!(1, directory.live_count());
	}
}
