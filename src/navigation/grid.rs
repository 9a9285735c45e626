//! Mapping between continuous world positions and discrete grid cells.
//!
//! A [Grid] is anchored at its bottom-left `origin`, every cell is a square of
//! `cell_size` and cells are addressed by a [GridCell] `(column, row)` with
//! columns growing along `x` and rows growing along `y`:
//!
//! ```text
//!  y
//!  ^ ___________________________
//!  |       |       |       |
//!  | (0,2) | (1,2) | (2,2) | ...
//!  |_______|_______|_______|____
//!  |       |       |       |
//!  | (0,1) | (1,1) | (2,1) | ...
//!  |_______|_______|_______|____
//!  |       |       |       |
//!  | (0,0) | (1,0) | (2,0) | ...
//!  o_______|_______|_______|____> x
//! ```
//!
//! Conversions are total: positions outside of the grid map onto cells outside
//! of the grid (negative or beyond `width`/`height`), range validity is checked
//! explicitly with [Grid::contains] or [Grid::index_of] wherever it matters.
//!

use bevy::prelude::*;

use crate::prelude::*;

/// ID of a cell within a [Grid], may sit outside of the grid
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct GridCell((i32, i32));

impl GridCell {
	/// Create a new instance of [GridCell]
	pub fn new(column: i32, row: i32) -> Self {
		GridCell((column, row))
	}
	/// Get the cell `(column, row)` tuple
	pub fn get_column_row(&self) -> (i32, i32) {
		self.0
	}
	/// Get the cell column
	pub fn get_column(&self) -> i32 {
		self.0 .0
	}
	/// Get the cell row
	pub fn get_row(&self) -> i32 {
		self.0 .1
	}
	/// The cell as an integer vector
	pub fn as_ivec2(&self) -> IVec2 {
		IVec2::new(self.get_column(), self.get_row())
	}
	/// The cell displaced by `offset`
	pub fn offset(&self, offset: IVec2) -> GridCell {
		GridCell::new(self.get_column() + offset.x, self.get_row() + offset.y)
	}
	/// The adjacent cell in the direction of `ordinal`
	pub fn get_neighbour(&self, ordinal: Ordinal) -> GridCell {
		self.offset(ordinal.get_offset())
	}
	/// Offset required to move from this cell to `target`
	pub fn get_offset_to(&self, target: &GridCell) -> IVec2 {
		target.as_ivec2() - self.as_ivec2()
	}
	/// Number of 8-connected steps between two cells ignoring obstacles, `max(|dx|, |dy|)`
	pub fn chebyshev_distance(&self, target: &GridCell) -> i32 {
		let delta = self.get_offset_to(target).abs();
		delta.x.max(delta.y)
	}
}

impl From<IVec2> for GridCell {
	fn from(value: IVec2) -> Self {
		GridCell::new(value.x, value.y)
	}
}

/// Describes the world-space layout of a uniform grid of square cells
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
pub struct Grid {
	/// World position of the bottom-left corner of cell `(0, 0)`
	origin: Vec2,
	/// Length of a side of a cell in world units
	cell_size: f32,
	/// Number of columns
	width: u32,
	/// Number of rows
	height: u32,
}

impl Grid {
	/// Create a new [Grid], the `cell_size` must be positive and finite
	pub fn new(origin: Vec2, cell_size: f32, width: u32, height: u32) -> NavResult<Self> {
		if !(cell_size.is_finite() && cell_size > 0.0) {
			return Err(NavError::InvalidCellSize(cell_size));
		}
		if width as u64 * height as u64 > MAX_CELL_COUNT {
			return Err(NavError::InvalidBounds {
				min: origin,
				max: origin + Vec2::new(width as f32, height as f32) * cell_size,
			});
		}
		Ok(Grid {
			origin,
			cell_size,
			width,
			height,
		})
	}
	/// Create a [Grid] covering the rectangle `min`..`max`, the number of columns and rows is rounded up so that the whole rectangle is covered
	pub fn from_bounds(min: Vec2, max: Vec2, cell_size: f32) -> NavResult<Self> {
		if !(min.is_finite() && max.is_finite()) {
			return Err(NavError::InvalidBounds { min, max });
		}
		if !(cell_size.is_finite() && cell_size > 0.0) {
			return Err(NavError::InvalidCellSize(cell_size));
		}
		let lower = min.min(max);
		let size = (max - min).abs();
		let columns = (size.x as f64 / cell_size as f64).ceil();
		let rows = (size.y as f64 / cell_size as f64).ceil();
		// checked before casting as the cast saturates
		if columns * rows > MAX_CELL_COUNT as f64 {
			return Err(NavError::InvalidBounds { min, max });
		}
		Grid::new(lower, cell_size, columns as u32, rows as u32)
	}
	/// Get the world position of the bottom-left corner of the grid
	pub fn get_origin(&self) -> Vec2 {
		self.origin
	}
	/// Get the size of a cell
	pub fn get_cell_size(&self) -> f32 {
		self.cell_size
	}
	/// Get the number of columns
	pub fn get_width(&self) -> u32 {
		self.width
	}
	/// Get the number of rows
	pub fn get_height(&self) -> u32 {
		self.height
	}
	/// Total number of cells in the grid
	pub fn get_cell_count(&self) -> usize {
		self.width as usize * self.height as usize
	}
	/// World position of the top-right corner of the grid
	pub fn get_max_corner(&self) -> Vec2 {
		self.origin + Vec2::new(self.width as f32, self.height as f32) * self.cell_size
	}
	/// Find the cell containing a world `position`, this floors so that negative offsets from the origin land in negative cells
	pub fn cell_of(&self, position: Vec2) -> GridCell {
		let scaled = ((position - self.origin) / self.cell_size).floor();
		GridCell::new(scaled.x as i32, scaled.y as i32)
	}
	/// World position of the centre of a `cell`
	pub fn world_centre_of(&self, cell: GridCell) -> Vec2 {
		self.world_corner_of(cell) + Vec2::splat(self.cell_size * 0.5)
	}
	/// World position of the bottom-left corner of a `cell`
	pub fn world_corner_of(&self, cell: GridCell) -> Vec2 {
		self.origin + cell.as_ivec2().as_vec2() * self.cell_size
	}
	/// Does the `cell` sit within the `width` and `height` of the grid
	pub fn contains(&self, cell: GridCell) -> bool {
		cell.get_column() >= 0
			&& cell.get_row() >= 0
			&& (cell.get_column() as u32) < self.width
			&& (cell.get_row() as u32) < self.height
	}
	/// Row-major index of a `cell` into a dense array covering the grid, [None] when the cell is out of range
	pub fn index_of(&self, cell: GridCell) -> Option<usize> {
		if self.contains(cell) {
			Some(cell.get_row() as usize * self.width as usize + cell.get_column() as usize)
		} else {
			None
		}
	}
	/// Inverse of [Grid::index_of]
	pub fn cell_from_index(&self, index: usize) -> GridCell {
		let width = self.width.max(1) as usize;
		GridCell::new((index % width) as i32, (index / width) as i32)
	}
	/// Iterate over every cell of the grid in row-major order
	pub fn iter_cells(&self) -> impl Iterator<Item = GridCell> + '_ {
		(0..self.get_cell_count()).map(|i| self.cell_from_index(i))
	}
}

impl Default for Grid {
	/// An empty grid without any cells
	fn default() -> Self {
		Grid {
			origin: Vec2::ZERO,
			cell_size: 1.0,
			width: 0,
			height: 0,
		}
	}
}

/// World-space rectangle that every agent footprint must stay within
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
pub struct PlayableArea {
	/// Lower-left corner
	min: Vec2,
	/// Upper-right corner
	max: Vec2,
}

impl PlayableArea {
	/// Create a [PlayableArea] from two corners, the corners may be given in any order but must be finite
	pub fn new(a: Vec2, b: Vec2) -> NavResult<Self> {
		if !(a.is_finite() && b.is_finite()) {
			return Err(NavError::InvalidBounds { min: a, max: b });
		}
		Ok(PlayableArea {
			min: a.min(b),
			max: a.max(b),
		})
	}
	/// The area covered by a [Grid]
	pub fn from_grid(grid: &Grid) -> Self {
		PlayableArea {
			min: grid.get_origin(),
			max: grid.get_max_corner(),
		}
	}
	/// Get the lower-left corner
	pub fn get_min(&self) -> Vec2 {
		self.min
	}
	/// Get the upper-right corner
	pub fn get_max(&self) -> Vec2 {
		self.max
	}
	/// Would a footprint with `half_extents` centred on `centre` sit entirely inside the area
	pub fn fits(&self, centre: Vec2, half_extents: Vec2) -> bool {
		let low = self.min + half_extents;
		let high = self.max - half_extents;
		centre.x >= low.x && centre.x <= high.x && centre.y >= low.y && centre.y <= high.y
	}
	/// Move `position` to the nearest point where a footprint of `half_extents` fits inside the area. If the footprint is larger than the area it gets pinned to the lower bound
	pub fn clamp_position(&self, position: Vec2, half_extents: Vec2) -> Vec2 {
		let low = self.min + half_extents;
		let high = self.max - half_extents;
		Vec2::new(
			position.x.min(high.x).max(low.x),
			position.y.min(high.y).max(low.y),
		)
	}
}
