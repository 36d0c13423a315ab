use crate::components::{Component, ComponentId, Mask, Match, Target, TypeExpr};
use crate::entities::Entity;
use crate::error::EcsError;
use crate::queries::cross_join::CrossJoin;
use crate::world::World;
use rayon::prelude::{IntoParallelIterator, ParallelIterator};
use std::marker::PhantomData;
use paste::paste;

/// Declares the runtime stream list of a query tuple.
///
/// Implemented for component tuples of arity 1 through 5; every stream
/// defaults to a plain-target match.
pub trait StreamTuple {
	fn streams() -> Vec<(ComponentId, Match)>;
}

/// A compiled view over every archetype whose signature satisfies a mask,
/// with one declared stream per tuple position.
///
/// A query is a plain value: cheap to build and reusable. Its matching set is
/// cached inside the world it runs against and extended as archetypes appear,
/// so repeated iteration does no matching work.
///
/// Iteration holds the world's structural lock for its whole run. Callbacks
/// may write through the references they receive but must not perform
/// structural mutations; see [World](crate::World) for the locking contract.
pub struct Query<S> {
	streams: Vec<(ComponentId, Match)>,
	mask: Mask,
	_marker: PhantomData<fn(S)>,
}

impl<S: StreamTuple> Query<S> {
	pub(crate) fn new() -> Self {
		let streams = S::streams();
		let mask = Mask {
			all: streams.clone(),
			none: Vec::new(),
			any: Vec::new(),
		};
		Self {
			streams,
			mask,
			_marker: PhantomData,
		}
	}

	/// Replaces the target predicate of stream `index`.
	pub fn matching(mut self, index: usize, filter: Match) -> Self {
		self.streams[index].1 = filter;
		self.mask.all[index].1 = filter;
		self
	}

	/// Requires a matching column without streaming it.
	pub fn with<T: Component>(mut self, filter: Match) -> Self {
		self.mask.all.push((ComponentId::of::<T>(), filter));
		self
	}

	/// Excludes archetypes carrying a matching column.
	pub fn without<T: Component>(mut self, filter: Match) -> Self {
		self.mask.none.push((ComponentId::of::<T>(), filter));
		self
	}

	/// Adds an any-of predicate; archetypes must match at least one of the
	/// predicates added this way.
	pub fn any<T: Component>(mut self, filter: Match) -> Self {
		self.mask.any.push((ComponentId::of::<T>(), filter));
		self
	}

	/// The compiled structural predicates.
	pub fn mask(&self) -> &Mask {
		&self.mask
	}
}

impl<T0: Component> Query<(T0,)> {
	/// Write `value` into the stream's `(T0, target)` column of every matched
	/// archetype.
	///
	/// Checked up front: if any matched archetype lacks the exact column the
	/// call fails with [EcsError::ColumnMissing] before anything is written.
	pub fn blit(&self, world: &World, value: T0, target: Target) -> Result<(), EcsError> {
		let mut core = world.core.write();
		let core = &mut *core;
		let indices = core.store.matching_snapshot(&self.mask);
		let expr = TypeExpr::new(self.streams[0].0, target);
		for &ai in indices.iter() {
			if core.store.archetypes[ai].column_index(&expr).is_none() {
				return Err(EcsError::ColumnMissing);
			}
		}
		for &ai in indices.iter() {
			core.store.archetypes[ai].fill(&expr, &value)?;
		}
		Ok(())
	}
}

macro_rules! impl_query_iter {
	($(($t:ident, $idx:tt)),+) => { paste! {
		impl<$($t: Component),+> StreamTuple for ($($t,)+) {
			fn streams() -> Vec<(ComponentId, Match)> {
				vec![$((ComponentId::of::<$t>(), Match::Plain)),+]
			}
		}

		impl<$($t: Component),+> Query<($($t,)+)> {
			/// Invokes `action` once per entity per wildcard combination, with
			/// mutable references to the selected components in stream order.
			pub fn for_each(&self, world: &World, mut action: impl FnMut($(&mut $t),+)) {
				self.for_each_entity(world, |_entity, $([<v_ $t:lower>]),+| {
					action($([<v_ $t:lower>]),+)
				});
			}

			/// As [for_each](Self::for_each), threading a caller-supplied
			/// uniform through to every invocation.
			pub fn for_each_with<U>(
				&self,
				world: &World,
				uniform: &mut U,
				mut action: impl FnMut(&mut U, $(&mut $t),+),
			) {
				self.for_each_entity(world, |_entity, $([<v_ $t:lower>]),+| {
					action(&mut *uniform, $([<v_ $t:lower>]),+)
				});
			}

			/// As [for_each](Self::for_each), also passing the entity whose
			/// row is being visited.
			pub fn for_each_entity(&self, world: &World, mut action: impl FnMut(Entity, $(&mut $t),+)) {
				let mut core = world.core.write();
				let core = &mut *core;
				let indices = core.store.matching_snapshot(&self.mask);
				let mut join = CrossJoin::new(self.streams.len());
				for &ai in indices.iter() {
					let archetype = &mut core.store.archetypes[ai];
					let count = archetype.len();
					if count == 0 || !join.select(archetype, &self.streams) {
						continue;
					}
					loop {
						if !join.aliases() {
							$(let [<p_ $t:lower>] = unsafe { archetype.column_ptr::<$t>(join.column($idx)) };)+
							let entities = archetype.entities_ptr();
							for row in 0..count {
								// SAFETY: row is within the live region and the
								// combination selects pairwise distinct columns
								unsafe {
									action(*entities.add(row), $(&mut *[<p_ $t:lower>].add(row)),+);
								}
							}
						}
						if !join.advance() {
							break;
						}
					}
				}
			}

			/// Entity-aware variant of [for_each_with](Self::for_each_with).
			pub fn for_each_entity_with<U>(
				&self,
				world: &World,
				uniform: &mut U,
				mut action: impl FnMut(&mut U, Entity, $(&mut $t),+),
			) {
				self.for_each_entity(world, |entity, $([<v_ $t:lower>]),+| {
					action(&mut *uniform, entity, $([<v_ $t:lower>]),+)
				});
			}

			/// Invokes `action` once per archetype per wildcard combination
			/// with contiguous column views of length equal to the archetype's
			/// row count. Suited to early-exit searches and bulk memory
			/// handoff; an early exit is expressed by ignoring later calls.
			pub fn raw(&self, world: &World, mut action: impl FnMut($(&mut [$t]),+)) {
				let mut core = world.core.write();
				let core = &mut *core;
				let indices = core.store.matching_snapshot(&self.mask);
				let mut join = CrossJoin::new(self.streams.len());
				for &ai in indices.iter() {
					let archetype = &mut core.store.archetypes[ai];
					let count = archetype.len();
					if count == 0 || !join.select(archetype, &self.streams) {
						continue;
					}
					loop {
						if !join.aliases() {
							$(let [<p_ $t:lower>] = unsafe { archetype.column_ptr::<$t>(join.column($idx)) };)+
							// SAFETY: pairwise distinct columns, len == row count
							unsafe {
								action($(std::slice::from_raw_parts_mut([<p_ $t:lower>], count)),+);
							}
						}
						if !join.advance() {
							break;
						}
					}
				}
			}

			/// Uniform-threading variant of [raw](Self::raw).
			pub fn raw_with<U>(
				&self,
				world: &World,
				uniform: &mut U,
				mut action: impl FnMut(&mut U, $(&mut [$t]),+),
			) {
				self.raw(world, |$([<v_ $t:lower>]),+| action(&mut *uniform, $([<v_ $t:lower>]),+));
			}

			/// Parallel variant of [for_each](Self::for_each): each
			/// archetype's rows are split into chunks of
			/// `max(1, count / concurrency)` and dispatched to the rayon pool.
			/// Blocks until every chunk has completed. Rows are visited
			/// exactly once; chunk execution order is unspecified.
			pub fn job(&self, world: &World, action: impl Fn($(&mut $t),+) + Send + Sync) {
				let mut core = world.core.write();
				let core = &mut *core;
				let indices = core.store.matching_snapshot(&self.mask);
				let mut join = CrossJoin::new(self.streams.len());
				for &ai in indices.iter() {
					let archetype = &mut core.store.archetypes[ai];
					let count = archetype.len();
					if count == 0 || !join.select(archetype, &self.streams) {
						continue;
					}
					let chunk = usize::max(1, count / rayon::current_num_threads());
					loop {
						if !join.aliases() {
							$(let [<p_ $t:lower>] = unsafe { archetype.column_ptr::<$t>(join.column($idx)) } as usize;)+
							let starts: Vec<usize> = (0..count).step_by(chunk).collect();
							starts.into_par_iter().for_each(|start| {
								let end = usize::min(start + chunk, count);
								for row in start..end {
									// SAFETY: chunks are disjoint row ranges over
									// pairwise distinct columns
									unsafe {
										action($(&mut *(([<p_ $t:lower>] as *mut $t).add(row))),+);
									}
								}
							});
						}
						if !join.advance() {
							break;
						}
					}
				}
			}

			/// Uniform-threading variant of [job](Self::job).
			pub fn job_with<U: Sync>(
				&self,
				world: &World,
				uniform: &U,
				action: impl Fn(&U, $(&mut $t),+) + Send + Sync,
			) {
				self.job(world, move |$([<v_ $t:lower>]),+| action(uniform, $([<v_ $t:lower>]),+));
			}

			/// Runs a no-op [for_each](Self::for_each) and [job](Self::job) to
			/// pre-inflate match caches, scratch pools and the worker pool.
			/// Semantically a no-op.
			pub fn warmup(&self, world: &World) {
				self.for_each(world, |$([<_v $t:lower>]),+| {});
				self.job(world, |$([<_v $t:lower>]),+| {});
			}
		}
	}};
}

impl_query_iter!((T0, 0));
impl_query_iter!((T0, 0), (T1, 1));
impl_query_iter!((T0, 0), (T1, 1), (T2, 2));
impl_query_iter!((T0, 0), (T1, 1), (T2, 2), (T3, 3));
impl_query_iter!((T0, 0), (T1, 1), (T2, 2), (T3, 3), (T4, 4));
