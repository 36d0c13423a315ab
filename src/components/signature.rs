use crate::components::{ComponentId, Match, TypeExpr};

/// The unordered, de-duplicated set of column keys an archetype carries.
///
/// Stored sorted so equal sets compare and hash equal. A signature is the
/// identity of an archetype: two archetypes with the same signature never
/// coexist in one world.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Signature {
	exprs: Vec<TypeExpr>,
}

impl Signature {
	/// Creates a signature from an arbitrary list of column keys.
	pub fn new(mut exprs: Vec<TypeExpr>) -> Self {
		exprs.sort_unstable();
		exprs.dedup();
		Self { exprs }
	}

	/// Returns true if the exact key is present.
	pub fn contains(&self, expr: &TypeExpr) -> bool {
		self.exprs.binary_search(expr).is_ok()
	}

	/// Returns true if at least one key matches `(component, filter)`.
	pub fn matches(&self, component: ComponentId, filter: &Match) -> bool {
		self.exprs.iter().any(|e| e.matches(component, filter))
	}

	/// A copy of this signature with `expr` added.
	pub fn with(&self, expr: TypeExpr) -> Self {
		let mut exprs = self.exprs.clone();
		if let Err(i) = exprs.binary_search(&expr) {
			exprs.insert(i, expr);
		}
		Self { exprs }
	}

	/// A copy of this signature with `expr` removed.
	pub fn without(&self, expr: &TypeExpr) -> Self {
		let mut exprs = self.exprs.clone();
		if let Ok(i) = exprs.binary_search(expr) {
			exprs.remove(i);
		}
		Self { exprs }
	}

	/// Iterate the keys in sorted order.
	pub fn iter(&self) -> impl Iterator<Item = &TypeExpr> {
		self.exprs.iter()
	}

	/// Number of column keys in the set.
	pub fn len(&self) -> usize {
		self.exprs.len()
	}

	/// Returns true for the signature of the empty archetype.
	pub fn is_empty(&self) -> bool {
		self.exprs.is_empty()
	}
}

/// Structural predicates compiled by a query: inclusion, exclusion, any-of.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Mask {
	pub(crate) all: Vec<(ComponentId, Match)>,
	pub(crate) none: Vec<(ComponentId, Match)>,
	pub(crate) any: Vec<(ComponentId, Match)>,
}

impl Mask {
	/// Returns true if `signature` satisfies every predicate of the mask:
	/// each `all` entry has at least one matching key, no `none` entry
	/// matches, and — when `any` is non-empty — at least one `any` entry
	/// matches.
	pub fn matches(&self, signature: &Signature) -> bool {
		if !self.all.iter().all(|(c, m)| signature.matches(*c, m)) {
			return false;
		}
		if self.none.iter().any(|(c, m)| signature.matches(*c, m)) {
			return false;
		}
		if !self.any.is_empty() && !self.any.iter().any(|(c, m)| signature.matches(*c, m)) {
			return false;
		}
		true
	}
}
