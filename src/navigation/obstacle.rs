//! Obstacles are provided to the navigation core through the [ObstacleQuery]
//! trait, an overlap test of an axis-aligned box against whatever collision
//! world the host application uses. Trigger volumes are reported but never
//! block movement.
//!
//! [ObstacleMap] is a grid-aligned implementation which can be authored as
//! ASCII art or loaded from RON/CSV files:
//!
//! ```text
//! "..........",
//! "..####....",
//! "..#~~#....",
//! "..........",
//! ```
//!
//! where `#` is a solid wall, `~` a trigger volume and `.` open ground. The
//! first row of text is the top row of the grid.
//!

use bevy::prelude::*;

use crate::prelude::*;

/// A collider found overlapping a queried box
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColliderHit {
	/// Trigger volumes are ignored when deciding whether a cell is blocked
	is_trigger: bool,
}

impl ColliderHit {
	/// A collider that blocks movement
	pub fn solid() -> Self {
		ColliderHit { is_trigger: false }
	}
	/// A trigger volume which never blocks movement
	pub fn trigger() -> Self {
		ColliderHit { is_trigger: true }
	}
	/// Is the collider a trigger volume
	pub fn is_trigger(&self) -> bool {
		self.is_trigger
	}
}

/// Read-only access to the collision world
pub trait ObstacleQuery {
	/// Find all colliders overlapping the axis-aligned box of `size` centred on `centre`
	fn overlaps(&self, centre: Vec2, size: Vec2) -> Vec<ColliderHit>;
	/// Is the box overlapped by any non-trigger collider
	fn is_occupied(&self, centre: Vec2, size: Vec2) -> bool {
		self.overlaps(centre, size).iter().any(|hit| !hit.is_trigger())
	}
}

impl<T: ObstacleQuery + ?Sized> ObstacleQuery for &T {
	fn overlaps(&self, centre: Vec2, size: Vec2) -> Vec<ColliderHit> {
		(**self).overlaps(centre, size)
	}
	fn is_occupied(&self, centre: Vec2, size: Vec2) -> bool {
		(**self).is_occupied(centre, size)
	}
}

/// A world without any colliders
#[derive(Clone, Copy, Debug, Default)]
pub struct NoObstacles;

impl ObstacleQuery for NoObstacles {
	fn overlaps(&self, _centre: Vec2, _size: Vec2) -> Vec<ColliderHit> {
		Vec::new()
	}
}

/// Answers whether a grid cell is blocked for a footprint of a particular size
pub struct Occupancy<'a, Q: ObstacleQuery + ?Sized> {
	/// Layout used to locate cell centres
	grid: &'a Grid,
	/// Half the width and height of the footprint being tested
	half_extents: Vec2,
	/// Scale applied to the footprint before probing
	shrink: f32,
	/// Collision world
	query: &'a Q,
}

impl<Q: ObstacleQuery + ?Sized> Clone for Occupancy<'_, Q> {
	fn clone(&self) -> Self {
		*self
	}
}
impl<Q: ObstacleQuery + ?Sized> Copy for Occupancy<'_, Q> {}

impl<'a, Q: ObstacleQuery + ?Sized> Occupancy<'a, Q> {
	/// Create a new [Occupancy] probing with the [DEFAULT_OVERLAP_SHRINK]
	pub fn new(grid: &'a Grid, half_extents: Vec2, query: &'a Q) -> Self {
		Occupancy {
			grid,
			half_extents,
			shrink: DEFAULT_OVERLAP_SHRINK,
			query,
		}
	}
	/// Override the scale applied to the footprint
	pub fn with_shrink(mut self, shrink: f32) -> Self {
		self.shrink = shrink;
		self
	}
	/// Get the grid the occupancy is measured on
	pub fn get_grid(&self) -> &'a Grid {
		self.grid
	}
	/// Get the footprint half extents
	pub fn get_half_extents(&self) -> Vec2 {
		self.half_extents
	}
	/// Get the collision world
	pub fn get_query(&self) -> &'a Q {
		self.query
	}
	/// Would the shrunken footprint centred on the `cell` overlap a non-trigger collider
	pub fn is_blocked(&self, cell: GridCell) -> bool {
		let size = self.half_extents * 2.0 * self.shrink;
		self.query
			.is_occupied(self.grid.world_centre_of(cell), size)
	}
	/// Would stepping from `cell` in a diagonal `ordinal` squeeze between blocked corners. Always `false` for cardinal steps
	pub fn is_corner_cut(&self, cell: GridCell, ordinal: Ordinal) -> bool {
		match ordinal.get_diagonal_flanks() {
			Some((side_one, side_two)) => {
				self.is_blocked(cell.offset(side_one)) || self.is_blocked(cell.offset(side_two))
			}
			None => false,
		}
	}
}

/// Contents of a cell in an [ObstacleMap]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Reflect)]
pub enum Tile {
	/// Free to move through
	#[default]
	Open,
	/// Blocks movement
	Solid,
	/// Reported as a trigger, never blocks movement
	Trigger,
}

impl Tile {
	/// Parse an ASCII layout character
	pub fn from_char(c: char) -> NavResult<Tile> {
		match c {
			'.' => Ok(Tile::Open),
			'#' => Ok(Tile::Solid),
			'~' => Ok(Tile::Trigger),
			other => Err(NavError::UnknownTile(other.to_string())),
		}
	}
	/// Parse a CSV layout value, `0` open, `1` solid, `2` trigger
	pub fn from_csv_value(value: &str) -> NavResult<Tile> {
		match value.trim() {
			"0" => Ok(Tile::Open),
			"1" => Ok(Tile::Solid),
			"2" => Ok(Tile::Trigger),
			other => Err(NavError::UnknownTile(other.to_string())),
		}
	}
}

/// Serialisable description of an [ObstacleMap], rows are written top row first
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ObstacleLayout {
	/// World position of the bottom-left corner
	pub origin: (f32, f32),
	/// Length of a side of a cell
	pub cell_size: f32,
	/// One string per row using `.`, `#` and `~`
	pub rows: Vec<String>,
}

/// A static collision world made of grid-aligned square tiles
#[derive(Clone, Debug, PartialEq, Resource)]
pub struct ObstacleMap {
	/// Layout of the tiles
	grid: Grid,
	/// Row-major tiles
	tiles: Vec<Tile>,
}

impl ObstacleMap {
	/// Create an [ObstacleMap] where every tile of the `grid` is open
	pub fn new(grid: Grid) -> Self {
		ObstacleMap {
			grid,
			tiles: vec![Tile::Open; grid.get_cell_count()],
		}
	}
	/// Build from rows of tiles where the first row is the top of the map
	pub fn from_rows(origin: Vec2, cell_size: f32, rows: Vec<Vec<Tile>>) -> NavResult<Self> {
		let height = rows.len();
		let width = rows.first().map(|r| r.len()).unwrap_or(0);
		for (i, row) in rows.iter().enumerate() {
			if row.len() != width {
				return Err(NavError::RaggedLayout {
					row: i,
					found: row.len(),
					expected: width,
				});
			}
		}
		let grid = Grid::new(origin, cell_size, width as u32, height as u32)?;
		let mut tiles = Vec::with_capacity(width * height);
		// text is read top-down but rows grow upwards
		for row in rows.iter().rev() {
			tiles.extend_from_slice(row);
		}
		Ok(ObstacleMap { grid, tiles })
	}
	/// Build from ASCII art, see the module docs for the characters used
	pub fn from_ascii(origin: Vec2, cell_size: f32, rows: &[&str]) -> NavResult<Self> {
		let mut parsed = Vec::with_capacity(rows.len());
		for row in rows {
			let tiles = row
				.chars()
				.map(Tile::from_char)
				.collect::<NavResult<Vec<Tile>>>()?;
			parsed.push(tiles);
		}
		ObstacleMap::from_rows(origin, cell_size, parsed)
	}
	/// Build from a deserialised [ObstacleLayout]
	pub fn from_layout(layout: &ObstacleLayout) -> NavResult<Self> {
		let rows: Vec<&str> = layout.rows.iter().map(|r| r.as_str()).collect();
		ObstacleMap::from_ascii(
			Vec2::new(layout.origin.0, layout.origin.1),
			layout.cell_size,
			&rows,
		)
	}
	/// From a `.ron` file containing an [ObstacleLayout] create an [ObstacleMap]
	#[cfg(feature = "ron")]
	pub fn from_ron(path: impl AsRef<std::path::Path>) -> NavResult<Self> {
		let contents = std::fs::read_to_string(path)?;
		let layout: ObstacleLayout = ron::de::from_str(&contents)?;
		ObstacleMap::from_layout(&layout)
	}
	/// From a headerless `.csv` file of `0`, `1` and `2` values create an [ObstacleMap]
	#[cfg(feature = "csv")]
	pub fn from_csv(
		path: impl AsRef<std::path::Path>,
		origin: Vec2,
		cell_size: f32,
	) -> NavResult<Self> {
		let mut reader = csv::ReaderBuilder::new()
			.has_headers(false)
			.flexible(true)
			.from_path(path)?;
		let mut rows = Vec::new();
		for record in reader.records() {
			let record = record?;
			let row = record
				.iter()
				.map(Tile::from_csv_value)
				.collect::<NavResult<Vec<Tile>>>()?;
			rows.push(row);
		}
		ObstacleMap::from_rows(origin, cell_size, rows)
	}
	/// Get the layout of the map
	pub fn get_grid(&self) -> &Grid {
		&self.grid
	}
	/// Get the [Tile] of a `cell`, [None] if outside of the map
	pub fn get_tile(&self, cell: GridCell) -> Option<Tile> {
		self.grid.index_of(cell).map(|i| self.tiles[i])
	}
	/// Replace the [Tile] of a `cell`
	pub fn set_tile(&mut self, cell: GridCell, tile: Tile) {
		if let Some(i) = self.grid.index_of(cell) {
			self.tiles[i] = tile;
		} else {
			error!("Cannot set tile of {:?}, it is outside of the obstacle map", cell);
		}
	}
	/// Is the `cell` a solid tile
	pub fn is_solid(&self, cell: GridCell) -> bool {
		self.get_tile(cell) == Some(Tile::Solid)
	}
}

impl ObstacleQuery for ObstacleMap {
	fn overlaps(&self, centre: Vec2, size: Vec2) -> Vec<ColliderHit> {
		let mut hits = Vec::new();
		if size.x <= 0.0 || size.y <= 0.0 || self.tiles.is_empty() {
			return hits;
		}
		let low = centre - size * 0.5;
		let high = centre + size * 0.5;
		let first = self.grid.cell_of(low);
		let last = self.grid.cell_of(high);
		let max_column = self.grid.get_width() as i32 - 1;
		let max_row = self.grid.get_height() as i32 - 1;
		let cell_size = self.grid.get_cell_size();
		for row in first.get_row().max(0)..=last.get_row().min(max_row) {
			for column in first.get_column().max(0)..=last.get_column().min(max_column) {
				let cell = GridCell::new(column, row);
				let tile = match self.get_tile(cell) {
					Some(Tile::Open) | None => continue,
					Some(tile) => tile,
				};
				let corner = self.grid.world_corner_of(cell);
				let far = corner + Vec2::splat(cell_size);
				// touching edges is not an overlap
				let overlapping =
					low.x < far.x && high.x > corner.x && low.y < far.y && high.y > corner.y;
				if overlapping {
					hits.push(match tile {
						Tile::Trigger => ColliderHit::trigger(),
						_ => ColliderHit::solid(),
					});
				}
			}
		}
		hits
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	#[rustfmt::skip]
	fn walled() -> ObstacleMap {
		ObstacleMap::from_ascii(Vec2::ZERO, 1.0, &[
			".....",
			".#~..",
			".....",
		]).unwrap()
	}
	#[test]
	fn ascii_rows_grow_upwards() {
		let map = walled();
		assert_eq!(Some(Tile::Solid), map.get_tile(GridCell::new(1, 1)));
		assert_eq!(Some(Tile::Trigger), map.get_tile(GridCell::new(2, 1)));
		assert_eq!(Some(Tile::Open), map.get_tile(GridCell::new(1, 2)));
		assert_eq!(None, map.get_tile(GridCell::new(5, 0)));
	}
	#[test]
	fn ragged_rows_rejected() {
		let result = ObstacleMap::from_ascii(Vec2::ZERO, 1.0, &["...", ".."]);
		assert!(matches!(
			result,
			Err(NavError::RaggedLayout {
				row: 1,
				found: 2,
				expected: 3
			})
		));
	}
	#[test]
	fn unknown_tile_rejected() {
		let result = ObstacleMap::from_ascii(Vec2::ZERO, 1.0, &["..x"]);
		assert!(matches!(result, Err(NavError::UnknownTile(_))));
	}
	#[test]
	fn overlap_solid() {
		let map = walled();
		let result = map.overlaps(Vec2::new(1.5, 1.5), Vec2::splat(0.95));
		let actual = vec![ColliderHit::solid()];
		assert_eq!(actual, result);
	}
	#[test]
	fn trigger_is_not_occupied() {
		let map = walled();
		let hits = map.overlaps(Vec2::new(2.5, 1.5), Vec2::splat(0.95));
		assert_eq!(vec![ColliderHit::trigger()], hits);
		assert!(!map.is_occupied(Vec2::new(2.5, 1.5), Vec2::splat(0.95)));
	}
	#[test]
	fn touching_edges_do_not_overlap() {
		let map = walled();
		// a full cell sized box in the cell to the left of the wall only touches it
		assert!(!map.is_occupied(Vec2::new(0.5, 1.5), Vec2::splat(1.0)));
		// a slightly larger box reaches into the wall
		assert!(map.is_occupied(Vec2::new(0.5, 1.5), Vec2::splat(1.1)));
	}
	#[test]
	fn occupancy_shrinks_footprint() {
		let map = walled();
		let grid = *map.get_grid();
		let occupancy = Occupancy::new(&grid, Vec2::splat(0.5), &map);
		assert!(occupancy.is_blocked(GridCell::new(1, 1)));
		assert!(!occupancy.is_blocked(GridCell::new(0, 1)));
		assert!(!occupancy.is_blocked(GridCell::new(2, 1)));
		// no shrinking means the neighbour touches the wall without overlapping
		let unshrunk = occupancy.with_shrink(1.0);
		assert!(!unshrunk.is_blocked(GridCell::new(0, 1)));
	}
	#[test]
	fn occupancy_corner_cut() {
		let map = walled();
		let grid = *map.get_grid();
		let occupancy = Occupancy::new(&grid, Vec2::splat(0.5), &map);
		// from (0,0) going north-east passes between (1,0) and (0,1), both open
		assert!(!occupancy.is_corner_cut(GridCell::new(0, 0), Ordinal::NorthEast));
		// from (1,2) going south-west is flanked by (0,2) and the wall at (1,1)
		assert!(occupancy.is_corner_cut(GridCell::new(1, 2), Ordinal::SouthWest));
		assert!(!occupancy.is_corner_cut(GridCell::new(1, 2), Ordinal::West));
	}
	#[test]
	fn no_obstacles_is_empty() {
		assert!(!NoObstacles.is_occupied(Vec2::ZERO, Vec2::ONE));
	}
	#[test]
	fn set_tile_updates_overlaps() {
		let mut map = walled();
		map.set_tile(GridCell::new(4, 0), Tile::Solid);
		assert!(map.is_solid(GridCell::new(4, 0)));
		assert!(map.is_occupied(Vec2::new(4.5, 0.5), Vec2::splat(0.5)));
	}
	#[test]
	#[cfg(feature = "ron")]
	fn obstacle_map_file_ron() {
		let path = env!("CARGO_MANIFEST_DIR").to_string() + "/assets/obstacle_layout.ron";
		let map = ObstacleMap::from_ron(path).unwrap();
		assert_eq!(10, map.get_grid().get_width());
		assert!(map.is_solid(GridCell::new(4, 4)));
	}
	#[test]
	#[cfg(feature = "csv")]
	fn obstacle_map_file_csv() {
		let path = env!("CARGO_MANIFEST_DIR").to_string() + "/assets/obstacle_map.csv";
		let map = ObstacleMap::from_csv(path, Vec2::ZERO, 1.0).unwrap();
		assert_eq!(10, map.get_grid().get_width());
		assert!(map.is_solid(GridCell::new(4, 4)));
	}
}
