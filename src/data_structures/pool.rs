use parking_lot::Mutex;
use std::mem::MaybeUninit;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// A pool of reusable values, rented for the duration of a [PoolBorrow] and
/// returned when the borrow drops. Keeps hot iteration paths free of
/// per-call allocation.
pub struct Pool<T: Default> {
	values: Arc<Mutex<Vec<T>>>,
}

impl<T: Default> Default for Pool<T> {
	fn default() -> Self {
		Self { values: Arc::new(Mutex::new(Vec::new())) }
	}
}

pub struct PoolBorrow<T> {
	value: MaybeUninit<T>,
	values: Arc<Mutex<Vec<T>>>,
}

impl<T: Default> Pool<T> {
	/// Rent one value, creating a fresh default if the pool is empty.
	/// The value carries whatever state it was returned with.
	pub fn take_one(&self) -> PoolBorrow<T> {
		let value = self.values.lock().pop().unwrap_or_default();
		PoolBorrow {
			value: MaybeUninit::new(value),
			values: self.values.clone(),
		}
	}
}

impl<T> Deref for PoolBorrow<T> {
	type Target = T;
	fn deref(&self) -> &Self::Target {
		unsafe { self.value.assume_init_ref() }
	}
}

impl<T> DerefMut for PoolBorrow<T> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		unsafe { self.value.assume_init_mut() }
	}
}

impl<T> Drop for PoolBorrow<T> {
	fn drop(&mut self) {
		unsafe {
			let mut value = MaybeUninit::uninit();
			std::mem::swap(&mut value, &mut self.value);
			self.values.lock().push(value.assume_init());
		}
	}
}
