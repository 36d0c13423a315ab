use crate::components::{Component, ComponentType, Signature, TypeExpr};
use crate::data_structures::AnyColumn;
use crate::entities::Entity;
use crate::error::EcsError;
use std::any::Any;

/// One typed column of an archetype, keyed by its full [TypeExpr].
pub(crate) struct Column {
	pub expr: TypeExpr,
	pub ty: ComponentType,
	pub data: AnyColumn,
}

/// Stores all entities sharing one [Signature]: an entity-id column plus one
/// typed column per key, all densely packed and row-aligned.
///
/// Removal swap-fills from the tail, so row indices are not stable; the world
/// rewrites the directory entry of any entity moved into a vacated row.
///
/// Every distinct combination of relation and link targets yields a distinct
/// archetype. That keeps iteration allocation-free, but fine-grained relation
/// targets fragment the world into many small archetypes — callers attaching
/// per-entity relation data at scale should expect that cost.
pub struct Archetype {
	signature: Signature,
	entities: Vec<Entity>,
	columns: Vec<Column>,
}

impl Archetype {
	pub(crate) fn new(mut parts: Vec<(TypeExpr, ComponentType)>) -> Self {
		parts.sort_unstable_by(|a, b| a.0.cmp(&b.0));
		parts.dedup_by(|a, b| a.0 == b.0);
		let signature = Signature::new(parts.iter().map(|(expr, _)| *expr).collect());
		let columns = parts
			.into_iter()
			.map(|(expr, ty)| Column { expr, data: ty.create_column(), ty })
			.collect();
		Self {
			signature,
			entities: Vec::new(),
			columns,
		}
	}

	/// The archetype's identity: its set of column keys.
	pub fn signature(&self) -> &Signature {
		&self.signature
	}

	/// Number of entities stored.
	pub fn len(&self) -> usize {
		self.entities.len()
	}

	/// Returns true if no entities are stored.
	pub fn is_empty(&self) -> bool {
		self.entities.is_empty()
	}

	/// The entity occupying `row`.
	pub fn entity_at(&self, row: usize) -> Entity {
		self.entities[row]
	}

	pub(crate) fn column_count(&self) -> usize {
		self.columns.len()
	}

	pub(crate) fn column_expr(&self, index: usize) -> &TypeExpr {
		&self.columns[index].expr
	}

	pub(crate) fn column_index(&self, expr: &TypeExpr) -> Option<usize> {
		self.columns.binary_search_by(|c| c.expr.cmp(expr)).ok()
	}

	pub(crate) fn column(&self, index: usize) -> &Column {
		&self.columns[index]
	}

	pub(crate) fn column_mut(&mut self, index: usize) -> &mut Column {
		&mut self.columns[index]
	}

	/// The column keys paired with their factories, for deriving transition
	/// destinations.
	pub(crate) fn parts(&self) -> Vec<(TypeExpr, ComponentType)> {
		self.columns.iter().map(|c| (c.expr, c.ty.clone())).collect()
	}

	/// Append a full row: the entity plus one value per column, keyed by
	/// [TypeExpr]. Returns the new row index.
	pub(crate) fn add_row(
		&mut self,
		entity: Entity,
		values: &mut Vec<(TypeExpr, Box<dyn Any + Send + Sync>)>,
	) -> Result<usize, EcsError> {
		debug_assert_eq!(values.len(), self.columns.len());
		for column in &mut self.columns {
			let pos = values
				.iter()
				.position(|(expr, _)| *expr == column.expr)
				.ok_or(EcsError::ColumnMissing)?;
			let (_, value) = values.swap_remove(pos);
			column.data.append(value.as_ref(), 1)?;
		}
		self.entities.push(entity);
		Ok(self.entities.len() - 1)
	}

	/// Remove `row` from the entity column and every typed column,
	/// swap-filling from the tail. Returns the entity that now occupies
	/// `row`, if any — the caller must rewrite its directory entry.
	#[must_use]
	pub(crate) fn remove_row(&mut self, row: usize) -> Option<Entity> {
		for column in &mut self.columns {
			column.data.delete(row, 1);
		}
		self.entities.swap_remove(row);
		if row < self.entities.len() {
			Some(self.entities[row])
		} else {
			None
		}
	}

	/// Move the row at `row` from `src` into `dst`.
	///
	/// Columns present in both archetypes move their element; columns only in
	/// `src` discard theirs; columns only in `dst` consume a supplied value
	/// from `added`. Returns the destination row and the entity swap-filled
	/// into the vacated source row, if any — the caller rewrites directory
	/// entries for both.
	pub(crate) fn migrate_row(
		src: &mut Archetype,
		dst: &mut Archetype,
		row: usize,
		added: &mut Vec<(TypeExpr, Box<dyn Any + Send + Sync>)>,
	) -> Result<(usize, Option<Entity>), EcsError> {
		// two-pointer merge over the sorted column sets
		let mut i = 0;
		let mut j = 0;
		while i < src.columns.len() || j < dst.columns.len() {
			let src_expr = src.columns.get(i).map(|c| c.expr);
			let dst_expr = dst.columns.get(j).map(|c| c.expr);
			match (src_expr, dst_expr) {
				(Some(s), Some(d)) if s == d => {
					let from = &mut src.columns[i].data;
					let to = &mut dst.columns[j].data;
					from.move_to(row, to)?;
					i += 1;
					j += 1;
				},
				(Some(s), Some(d)) if s < d => {
					src.columns[i].data.delete(row, 1);
					i += 1;
				},
				(Some(_), None) => {
					src.columns[i].data.delete(row, 1);
					i += 1;
				},
				(_, Some(d)) => {
					let pos = added
						.iter()
						.position(|(expr, _)| *expr == d)
						.ok_or(EcsError::ColumnMissing)?;
					let (_, value) = added.swap_remove(pos);
					dst.columns[j].data.append(value.as_ref(), 1)?;
					j += 1;
				},
				(None, None) => unreachable!(),
			}
		}

		let entity = src.entities.swap_remove(row);
		dst.entities.push(entity);
		let swapped = if row < src.entities.len() {
			Some(src.entities[row])
		} else {
			None
		};
		Ok((dst.entities.len() - 1, swapped))
	}

	/// Overwrite every live element of the column keyed by `expr`.
	pub(crate) fn fill(&mut self, expr: &TypeExpr, value: &dyn Any) -> Result<(), EcsError> {
		let index = self.column_index(expr).ok_or(EcsError::ColumnMissing)?;
		self.columns[index].data.blit(value)
	}

	/// Base pointer of the typed column at `index`.
	///
	/// # Safety
	/// Same contract as [AnyColumn::as_mut_ptr]: `T` must be the column's
	/// element type and dereferenced rows must stay within the live region
	/// without aliasing other borrows.
	pub(crate) unsafe fn column_ptr<T: Component>(&mut self, index: usize) -> *mut T {
		self.columns[index].data.as_mut_ptr::<T>()
	}

	pub(crate) fn entities_ptr(&self) -> *const Entity {
		self.entities.as_ptr()
	}
}
