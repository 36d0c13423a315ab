use std::sync::atomic::{AtomicUsize, Ordering};
use std::collections::HashMap;
use lazy_static::lazy_static;
use parking_lot::RwLock;
use std::any::TypeId;

type IdMap = HashMap<TypeId, ComponentId>;

lazy_static! {
	static ref COMPONENT_IDS: RwLock<IdMap> = RwLock::new(HashMap::default());
}

static NEXT_ID: AtomicUsize = AtomicUsize::new(1);

/// A `ComponentId` represents a globally unique identifier for a type used as a component.
///
/// Ids are dense, start at 1, and are assigned on first use of a type anywhere
/// in the process.
#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Debug)]
pub struct ComponentId {
	value: usize,
}

impl ComponentId {
	/// Get the [ComponentId] of the type `T`, registering it on first use.
	pub fn of<T: 'static>() -> ComponentId {
		let ids = COMPONENT_IDS.read();
		match ids.get(&TypeId::of::<T>()) {
			Some(id) => *id,
			None => {
				drop(ids);
				create_id::<T>()
			},
		}
	}

	pub(crate) const fn value(&self) -> usize {
		self.value
	}
}

#[inline(never)]
fn create_id<T: 'static>() -> ComponentId {
	let mut ids = COMPONENT_IDS.write();
	*ids.entry(TypeId::of::<T>()).or_insert_with(|| ComponentId {
		value: NEXT_ID.fetch_add(1, Ordering::Relaxed),
	})
}
