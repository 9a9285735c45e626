//! The kinds of fields used to steer groups of agents
//!

pub mod distance_field;
pub mod flow_field;

use crate::prelude::*;

/// Defines required access to field arrays
pub trait Field<T> {
	/// Get a reference to the row-major field array
	fn get(&self) -> &[T];
	/// Get the layout of the field
	fn get_grid(&self) -> &Grid;
	/// Retrieve a field cell value, [None] if the cell is outside of the field
	fn get_field_cell_value(&self, cell: GridCell) -> Option<T>;
	/// Set a field cell to a value
	fn set_field_cell_value(&mut self, value: T, cell: GridCell);
}
