use crate::archetypes::Archetype;
use crate::components::{ComponentId, Match};

/// Enumerates the cartesian product of per-stream column selections within
/// one archetype.
///
/// A wildcard stream may match several columns of the same component type
/// (one per relation or link target); every combination is visited exactly
/// once, in lexicographic order with the last stream advancing fastest. The
/// selection buffers are reused across archetypes, so priming a new archetype
/// allocates nothing after warmup.
pub(crate) struct CrossJoin {
	selections: Vec<Vec<usize>>,
	cursor: Vec<usize>,
}

impl CrossJoin {
	pub fn new(streams: usize) -> Self {
		Self {
			selections: (0..streams).map(|_| Vec::new()).collect(),
			cursor: vec![0; streams],
		}
	}

	/// Prime the join for one archetype. Returns false if any stream matches
	/// no column, in which case the archetype is skipped entirely.
	pub fn select(&mut self, archetype: &Archetype, streams: &[(ComponentId, Match)]) -> bool {
		for slot in &mut self.cursor {
			*slot = 0;
		}
		for (i, (component, filter)) in streams.iter().enumerate() {
			let selection = &mut self.selections[i];
			selection.clear();
			for column in 0..archetype.column_count() {
				if archetype.column_expr(column).matches(*component, filter) {
					selection.push(column);
				}
			}
			if selection.is_empty() {
				return false;
			}
		}
		true
	}

	/// Column index currently selected for `stream`.
	pub fn column(&self, stream: usize) -> usize {
		self.selections[stream][self.cursor[stream]]
	}

	/// True when the current combination selects one physical column twice;
	/// such a combination cannot be exposed as disjoint mutable views and is
	/// skipped by the iteration layer.
	pub fn aliases(&self) -> bool {
		for i in 0..self.cursor.len() {
			for j in (i + 1)..self.cursor.len() {
				if self.column(i) == self.column(j) {
					return true;
				}
			}
		}
		false
	}

	/// Advance to the next combination. Returns false when exhausted.
	pub fn advance(&mut self) -> bool {
		for i in (0..self.cursor.len()).rev() {
			self.cursor[i] += 1;
			if self.cursor[i] < self.selections[i].len() {
				return true;
			}
			self.cursor[i] = 0;
		}
		false
	}
}
