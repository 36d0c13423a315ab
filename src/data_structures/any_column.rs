use crate::components::Component;
use crate::error::EcsError;
use std::any::{Any, TypeId};
use std::iter::repeat_with;

/// Smallest capacity a column ever has.
pub(crate) const MIN_CAPACITY: usize = 2;

/// A polymorphic, densely packed column of component values.
///
/// The backing `Vec<T>`'s length is the column *capacity*; every slot is kept
/// initialized (defaulted while vacant) and a separate `count` tracks the live
/// prefix. Capacity is always a power of two and at least [MIN_CAPACITY]; it
/// grows on demand and shrinks only through [compact](AnyColumn::compact).
///
/// `append` and `delete` are the only operations that change `count`;
/// [store](AnyColumn::store) is an in-bounds overwrite.
pub struct AnyColumn {
	vec: Box<dyn Any + Send + Sync>,
	count: usize,
	capacity: usize,
	type_id: TypeId,

	store: fn(&mut Self, usize, &dyn Any) -> Result<(), EcsError>,
	append: fn(&mut Self, &dyn Any, usize) -> Result<(), EcsError>,
	delete: fn(&mut Self, usize, usize),
	blit: fn(&mut Self, &dyn Any) -> Result<(), EcsError>,
	clear: fn(&mut Self),
	reserve: fn(&mut Self, usize),
	compact: fn(&mut Self),
	migrate: fn(&mut Self, &mut Self) -> Result<(), EcsError>,
	move_to: fn(&mut Self, usize, &mut Self) -> Result<(), EcsError>,
}

impl AnyColumn {
	/// Create a new, empty column for items of type `T`.
	pub fn new<T: Component>() -> Self {
		let mut items: Vec<T> = Vec::with_capacity(MIN_CAPACITY);
		items.extend(repeat_with(T::default).take(MIN_CAPACITY));
		Self {
			vec: Box::new(items),
			count: 0,
			capacity: MIN_CAPACITY,
			type_id: TypeId::of::<T>(),

			store: store_impl::<T>,
			append: append_impl::<T>,
			delete: delete_impl::<T>,
			blit: blit_impl::<T>,
			clear: clear_impl::<T>,
			reserve: reserve_impl::<T>,
			compact: compact_impl::<T>,
			migrate: migrate_impl::<T>,
			move_to: move_to_impl::<T>,
		}
	}

	/// Number of live elements.
	pub fn len(&self) -> usize {
		self.count
	}

	/// Returns true if the column holds no live elements.
	pub fn is_empty(&self) -> bool {
		self.count == 0
	}

	/// Backing capacity in elements.
	pub fn capacity(&self) -> usize {
		self.capacity
	}

	/// The column's element type.
	pub fn type_id(&self) -> TypeId {
		self.type_id
	}

	/// Overwrite the element at `row` with a copy of `value`.
	/// Does not change the live count; `row` must be below it.
	pub fn store(&mut self, row: usize, value: &dyn Any) -> Result<(), EcsError> {
		(self.store)(self, row, value)
	}

	/// Append `n` copies of `value`, growing capacity if needed.
	pub fn append(&mut self, value: &dyn Any, n: usize) -> Result<(), EcsError> {
		(self.append)(self, value, n)
	}

	/// Remove `n` contiguous elements starting at `row`.
	///
	/// The hole is filled by moving the tail `n` elements into it when the
	/// tail is disjoint, otherwise by shifting; vacated tail slots are reset.
	/// Row indices are not stable across this call — the owning archetype
	/// rewrites the directory for any swapped-in entity.
	pub fn delete(&mut self, row: usize, n: usize) {
		(self.delete)(self, row, n)
	}

	/// Overwrite every live element with a copy of `value`.
	pub fn blit(&mut self, value: &dyn Any) -> Result<(), EcsError> {
		(self.blit)(self, value)
	}

	/// Reset the live region and set the count to zero. Capacity is kept.
	pub fn clear(&mut self) {
		(self.clear)(self)
	}

	/// Grow to the next power of two at or above `capacity`. Never shrinks.
	pub fn ensure_capacity(&mut self, capacity: usize) {
		(self.reserve)(self, capacity)
	}

	/// Shrink the backing storage to the next power of two at or above
	/// `max(2, len)`.
	pub fn compact(&mut self) {
		(self.compact)(self)
	}

	/// Move every live element from `self` into `dst`, which must store the
	/// same element type. `self` is empty afterwards; `dst` holds its old
	/// elements followed by `self`'s.
	pub fn migrate(&mut self, dst: &mut AnyColumn) -> Result<(), EcsError> {
		(self.migrate)(self, dst)
	}

	/// Move the element at `row` to the end of `dst`, deleting it here.
	pub fn move_to(&mut self, row: usize, dst: &mut AnyColumn) -> Result<(), EcsError> {
		(self.move_to)(self, row, dst)
	}

	/// Borrow the typed region `[start, start + len)`.
	pub fn as_memory<T: Component>(&self, start: usize, len: usize) -> Result<&[T], EcsError> {
		let items = self.items_ref::<T>()?;
		debug_assert!(start + len <= self.count);
		Ok(&items[start..start + len])
	}

	/// Borrow the live region `[0, count)` as a typed slice.
	pub fn span<T: Component>(&self) -> Result<&[T], EcsError> {
		self.as_memory(0, self.count)
	}

	/// Mutably borrow the live region as a typed slice.
	pub fn span_mut<T: Component>(&mut self) -> Result<&mut [T], EcsError> {
		let count = self.count;
		let type_id = self.type_id;
		match self.vec.downcast_mut::<Vec<T>>() {
			Some(items) => Ok(&mut items[..count]),
			None => Err(EcsError::TypeMismatch { expected: type_id, actual: TypeId::of::<T>() }),
		}
	}

	/// Base pointer of the typed backing storage.
	///
	/// # Safety
	/// `T` must be the column's element type. Rows dereferenced through the
	/// pointer must stay within `[0, len)` and must not alias other live
	/// borrows of this column.
	pub(crate) unsafe fn as_mut_ptr<T: Component>(&mut self) -> *mut T {
		debug_assert_eq!(self.type_id, TypeId::of::<T>());
		items_mut::<T>(&mut self.vec).as_mut_ptr()
	}

	fn items_ref<T: Component>(&self) -> Result<&Vec<T>, EcsError> {
		self.vec.downcast_ref::<Vec<T>>().ok_or(EcsError::TypeMismatch {
			expected: self.type_id,
			actual: TypeId::of::<T>(),
		})
	}
}

fn pow2_capacity(required: usize) -> usize {
	required.max(MIN_CAPACITY).next_power_of_two()
}

/// The element type is pinned by the function-pointer set bound in `new`.
fn items_mut<T: Component>(vec: &mut Box<dyn Any + Send + Sync>) -> &mut Vec<T> {
	match vec.downcast_mut::<Vec<T>>() {
		Some(items) => items,
		None => unreachable!("column element type invariant"),
	}
}

fn downcast_value<'a, T: Component>(value: &'a dyn Any) -> Result<&'a T, EcsError> {
	value.downcast_ref::<T>().ok_or(EcsError::TypeMismatch {
		expected: TypeId::of::<T>(),
		actual: value.type_id(),
	})
}

fn store_impl<T: Component>(col: &mut AnyColumn, row: usize, value: &dyn Any) -> Result<(), EcsError> {
	let value = downcast_value::<T>(value)?;
	debug_assert!(row < col.count, "store is an in-bounds overwrite");
	items_mut::<T>(&mut col.vec)[row] = value.clone();
	Ok(())
}

fn append_impl<T: Component>(col: &mut AnyColumn, value: &dyn Any, n: usize) -> Result<(), EcsError> {
	let value = downcast_value::<T>(value)?.clone();
	let count = col.count;
	reserve_impl::<T>(col, count + n);
	let items = items_mut::<T>(&mut col.vec);
	for slot in &mut items[count..count + n] {
		*slot = value.clone();
	}
	col.count = count + n;
	Ok(())
}

fn delete_impl<T: Component>(col: &mut AnyColumn, row: usize, n: usize) {
	let count = col.count;
	debug_assert!(n > 0 && row + n <= count);
	let items = items_mut::<T>(&mut col.vec);
	if count - n > row + n {
		// tail is disjoint from the hole: move the last n elements into it
		for i in 0..n {
			items.swap(row + i, count - n + i);
		}
	} else {
		items[row..count].rotate_left(n);
	}
	for slot in &mut items[count - n..count] {
		*slot = T::default();
	}
	col.count = count - n;
}

fn blit_impl<T: Component>(col: &mut AnyColumn, value: &dyn Any) -> Result<(), EcsError> {
	let value = downcast_value::<T>(value)?;
	let count = col.count;
	let items = items_mut::<T>(&mut col.vec);
	for slot in &mut items[..count] {
		*slot = value.clone();
	}
	Ok(())
}

fn clear_impl<T: Component>(col: &mut AnyColumn) {
	let count = col.count;
	let items = items_mut::<T>(&mut col.vec);
	for slot in &mut items[..count] {
		*slot = T::default();
	}
	col.count = 0;
}

fn reserve_impl<T: Component>(col: &mut AnyColumn, required: usize) {
	if required <= col.capacity {
		return;
	}
	let capacity = pow2_capacity(required);
	let items = items_mut::<T>(&mut col.vec);
	let grow = capacity - items.len();
	items.extend(repeat_with(T::default).take(grow));
	col.capacity = capacity;
}

fn compact_impl<T: Component>(col: &mut AnyColumn) {
	let capacity = pow2_capacity(col.count);
	if capacity >= col.capacity {
		return;
	}
	let items = items_mut::<T>(&mut col.vec);
	items.truncate(capacity);
	items.shrink_to_fit();
	col.capacity = capacity;
}

fn migrate_impl<T: Component>(src: &mut AnyColumn, dst: &mut AnyColumn) -> Result<(), EcsError> {
	if dst.type_id != TypeId::of::<T>() {
		return Err(EcsError::TypeMismatch { expected: TypeId::of::<T>(), actual: dst.type_id });
	}
	if dst.count == 0 {
		// the destination is empty: swapping buffers avoids the element copy
		std::mem::swap(&mut src.vec, &mut dst.vec);
		std::mem::swap(&mut src.capacity, &mut dst.capacity);
		dst.count = src.count;
		src.count = 0;
		return Ok(());
	}
	let moved = src.count;
	reserve_impl::<T>(dst, dst.count + moved);
	let src_items = items_mut::<T>(&mut src.vec);
	let dst_items = items_mut::<T>(&mut dst.vec);
	for i in 0..moved {
		dst_items[dst.count + i] = std::mem::take(&mut src_items[i]);
	}
	dst.count += moved;
	src.count = 0;
	Ok(())
}

fn move_to_impl<T: Component>(src: &mut AnyColumn, row: usize, dst: &mut AnyColumn) -> Result<(), EcsError> {
	if dst.type_id != TypeId::of::<T>() {
		return Err(EcsError::TypeMismatch { expected: TypeId::of::<T>(), actual: dst.type_id });
	}
	debug_assert!(row < src.count);
	let value = std::mem::take(&mut items_mut::<T>(&mut src.vec)[row]);
	let dst_count = dst.count;
	reserve_impl::<T>(dst, dst_count + 1);
	items_mut::<T>(&mut dst.vec)[dst_count] = value;
	dst.count = dst_count + 1;
	delete_impl::<T>(src, row, 1);
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn filled(values: &[u32]) -> AnyColumn {
		let mut col = AnyColumn::new::<u32>();
		for v in values {
			col.append(v, 1).unwrap();
		}
		col
	}

	#[test]
	fn append_grows_to_powers_of_two() {
		let mut col = AnyColumn::new::<u32>();
		assert_eq!(2, col.capacity());
		col.append(&7u32, 5).unwrap();
		assert_eq!(5, col.len());
		assert_eq!(8, col.capacity());
		assert_eq!(&[7, 7, 7, 7, 7], col.span::<u32>().unwrap());
	}

	#[test]
	fn ensure_capacity_at_or_below_is_a_noop() {
		let mut col = filled(&[1, 2, 3]);
		let capacity = col.capacity();
		col.ensure_capacity(capacity);
		assert_eq!(capacity, col.capacity());
		col.ensure_capacity(1);
		assert_eq!(capacity, col.capacity());
	}

	#[test]
	fn delete_fills_hole_from_tail() {
		let mut col = filled(&[0, 1, 2, 3, 4, 5, 6, 7]);
		col.delete(1, 2);
		assert_eq!(6, col.len());
		// tail elements 6 and 7 moved into the hole
		assert_eq!(&[0, 6, 7, 3, 4, 5], col.span::<u32>().unwrap());
	}

	#[test]
	fn delete_shifts_when_tail_overlaps() {
		let mut col = filled(&[0, 1, 2, 3, 4]);
		col.delete(1, 3);
		assert_eq!(&[0, 4], col.span::<u32>().unwrap());
	}

	#[test]
	fn delete_everything_then_append() {
		let mut col = filled(&[1, 2, 3, 4]);
		col.delete(0, 4);
		assert_eq!(0, col.len());
		col.append(&9u32, 1).unwrap();
		assert_eq!(&[9], col.span::<u32>().unwrap());
	}

	#[test]
	fn compact_shrinks_to_pow2_of_len() {
		let mut col = filled(&[1, 2, 3]);
		col.ensure_capacity(64);
		assert_eq!(64, col.capacity());
		col.compact();
		assert_eq!(4, col.capacity());
		assert_eq!(&[1, 2, 3], col.span::<u32>().unwrap());
		col.delete(0, 3);
		col.compact();
		assert_eq!(MIN_CAPACITY, col.capacity());
	}

	#[test]
	fn blit_overwrites_live_region_only() {
		let mut col = filled(&[1, 2, 3]);
		col.blit(&9u32).unwrap();
		assert_eq!(&[9, 9, 9], col.span::<u32>().unwrap());
		assert_eq!(3, col.len());
	}

	#[test]
	fn migrate_concatenates_and_empties_source() {
		let mut a = filled(&[1, 2, 3]);
		let mut b = filled(&[8, 9]);
		a.migrate(&mut b).unwrap();
		assert_eq!(0, a.len());
		assert_eq!(&[8, 9, 1, 2, 3], b.span::<u32>().unwrap());

		// empty destination takes the buffer-swap path
		let mut c = AnyColumn::new::<u32>();
		b.migrate(&mut c).unwrap();
		assert_eq!(0, b.len());
		assert_eq!(&[8, 9, 1, 2, 3], c.span::<u32>().unwrap());
	}

	#[test]
	fn move_to_appends_and_swap_fills() {
		let mut a = filled(&[10, 20, 30]);
		let mut b = filled(&[1]);
		a.move_to(0, &mut b).unwrap();
		assert_eq!(&[30, 20], a.span::<u32>().unwrap());
		assert_eq!(&[1, 10], b.span::<u32>().unwrap());
	}

	#[test]
	fn wrong_runtime_type_is_rejected() {
		let mut col = filled(&[1]);
		assert!(matches!(col.append(&1.0f64, 1), Err(EcsError::TypeMismatch { .. })));
		assert!(matches!(col.blit(&1.0f64), Err(EcsError::TypeMismatch { .. })));
		let mut other = AnyColumn::new::<f64>();
		assert!(matches!(col.migrate(&mut other), Err(EcsError::TypeMismatch { .. })));
		assert!(matches!(col.move_to(0, &mut other), Err(EcsError::TypeMismatch { .. })));
	}
}
