use crate::archetypes::Archetype;
use crate::components::{ComponentType, Mask, Signature, TypeExpr};
use crate::data_structures::{Pool, PoolBorrow};
use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use nohash_hasher::NoHashHasher;

type IdHasher = BuildHasherDefault<NoHashHasher<QueryId>>;

/// A dense handle to an interned query mask.
#[derive(Debug, Hash, Copy, Clone, Eq, PartialEq)]
pub struct QueryId {
	index: usize,
}

impl nohash_hasher::IsEnabled for QueryId {}

/// Owns every archetype plus the caches that make structural transitions and
/// query matching cheap on the hot path:
///
/// * `by_signature` — the signature index; guarantees one archetype per
///   signature,
/// * `edges` — the transition graph, keyed by `(source, column key,
///   added/removed)`,
/// * `matches` — per interned mask, the indices of every satisfying
///   archetype, extended whenever an archetype is created.
///
/// Archetypes are created lazily on first signature miss and never destroyed;
/// an emptied archetype is retained for reuse.
pub(crate) struct ArchetypeStore {
	pub archetypes: Vec<Archetype>,
	by_signature: HashMap<Signature, usize>,
	edges: HashMap<(usize, TypeExpr, bool), usize>,
	mask_index: HashMap<Mask, QueryId>,
	masks: Vec<Mask>,
	matches: HashMap<QueryId, Vec<usize>, IdHasher>,
	scratch: Pool<Vec<usize>>,
}

impl ArchetypeStore {
	/// Index of the empty archetype every entity spawns into.
	pub const EMPTY: usize = 0;

	pub fn new() -> Self {
		let empty = Archetype::new(Vec::new());
		let mut by_signature = HashMap::new();
		by_signature.insert(empty.signature().clone(), Self::EMPTY);
		Self {
			archetypes: vec![empty],
			by_signature,
			edges: HashMap::new(),
			mask_index: HashMap::new(),
			masks: Vec::new(),
			matches: HashMap::default(),
			scratch: Pool::default(),
		}
	}

	/// Destination archetype for adding or removing one column from `source`,
	/// resolved through the edge cache. Falls back to the signature index and
	/// creates the archetype on a miss.
	pub fn transition(&mut self, source: usize, expr: TypeExpr, ty: &ComponentType, add: bool) -> usize {
		if let Some(&dst) = self.edges.get(&(source, expr, add)) {
			return dst;
		}
		let mut parts = self.archetypes[source].parts();
		if add {
			parts.push((expr, ty.clone()));
		} else {
			parts.retain(|(e, _)| *e != expr);
		}
		let dst = self.get_or_create(parts);
		self.edges.insert((source, expr, add), dst);
		dst
	}

	fn get_or_create(&mut self, parts: Vec<(TypeExpr, ComponentType)>) -> usize {
		let instance = Archetype::new(parts);
		if let Some(&index) = self.by_signature.get(instance.signature()) {
			return index;
		}
		let index = self.archetypes.len();
		// extend every cached query whose mask the new signature satisfies
		for (qid, list) in self.matches.iter_mut() {
			if self.masks[qid.index].matches(instance.signature()) {
				list.push(index);
			}
		}
		tracing::debug!(archetype = index, columns = instance.signature().len(), "created archetype");
		self.by_signature.insert(instance.signature().clone(), index);
		self.archetypes.push(instance);
		index
	}

	/// Intern a mask, computing its matching set on first use.
	pub fn intern(&mut self, mask: &Mask) -> QueryId {
		if let Some(&qid) = self.mask_index.get(mask) {
			return qid;
		}
		let qid = QueryId { index: self.masks.len() };
		let indices = self
			.archetypes
			.iter()
			.enumerate()
			.filter_map(|(i, a)| mask.matches(a.signature()).then_some(i))
			.collect();
		self.masks.push(mask.clone());
		self.mask_index.insert(mask.clone(), qid);
		self.matches.insert(qid, indices);
		qid
	}

	/// Snapshot of the matching set for `mask` into a pooled scratch vector,
	/// so the caller can walk archetypes mutably while holding it.
	pub fn matching_snapshot(&mut self, mask: &Mask) -> PoolBorrow<Vec<usize>> {
		let qid = self.intern(mask);
		let mut indices = self.scratch.take_one();
		indices.clear();
		indices.extend_from_slice(&self.matches[&qid]);
		indices
	}

	/// Two distinct archetypes, mutably.
	pub fn pair_mut(&mut self, a: usize, b: usize) -> (&mut Archetype, &mut Archetype) {
		debug_assert_ne!(a, b);
		if a < b {
			let (left, right) = self.archetypes.split_at_mut(b);
			(&mut left[a], &mut right[0])
		} else {
			let (left, right) = self.archetypes.split_at_mut(a);
			(&mut right[0], &mut left[b])
		}
	}
}
