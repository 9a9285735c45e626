//! Describes the navigable world: the grid layout and the playable area agent
//! footprints must stay inside. Can be authored in code or, with the `ron`
//! feature, loaded from a file such as:
//!
//! ```text
//! (
//! 	origin: (-16.0, -16.0),
//! 	cell_size: 1.0,
//! 	width: 32,
//! 	height: 32,
//! 	playable_bounds: Some(((-15.0, -15.0), (15.0, 15.0))),
//! 	seed: Some(7),
//! )
//! ```
//!

use bevy::prelude::*;

use crate::prelude::*;

/// Grid and bounds of the navigable world
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Resource)]
pub struct NavigationConfig {
	/// World position of the bottom-left corner of the grid
	origin: (f32, f32),
	/// Length of a side of a cell
	cell_size: f32,
	/// Number of columns
	width: u32,
	/// Number of rows
	height: u32,
	/// Lower-left and upper-right corners of the playable area, defaults to the extent of the grid
	#[cfg_attr(feature = "serde", serde(default))]
	playable_bounds: Option<((f32, f32), (f32, f32))>,
	/// Seed for the pseudo-random choice of which agent steps aside
	#[cfg_attr(feature = "serde", serde(default))]
	seed: Option<u64>,
}

impl NavigationConfig {
	/// Create a new configuration where the playable area is the whole grid
	pub fn new(origin: Vec2, cell_size: f32, width: u32, height: u32) -> Self {
		NavigationConfig {
			origin: (origin.x, origin.y),
			cell_size,
			width,
			height,
			playable_bounds: None,
			seed: None,
		}
	}
	/// Restrict the playable area
	pub fn with_playable_bounds(mut self, min: Vec2, max: Vec2) -> Self {
		self.playable_bounds = Some(((min.x, min.y), (max.x, max.y)));
		self
	}
	/// Seed the random choice of who steps aside
	pub fn with_seed(mut self, seed: u64) -> Self {
		self.seed = Some(seed);
		self
	}
	/// Get the origin
	pub fn get_origin(&self) -> Vec2 {
		Vec2::new(self.origin.0, self.origin.1)
	}
	/// Get the cell size
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
	/// Get the seed
	pub fn get_seed(&self) -> Option<u64> {
		self.seed
	}
	/// Build the [Grid]
	pub fn build_grid(&self) -> NavResult<Grid> {
		Grid::new(self.get_origin(), self.cell_size, self.width, self.height)
	}
	/// Build the [PlayableArea], the whole `grid` when no bounds were given
	pub fn build_playable_area(&self, grid: &Grid) -> NavResult<PlayableArea> {
		match self.playable_bounds {
			Some((min, max)) => PlayableArea::new(Vec2::new(min.0, min.1), Vec2::new(max.0, max.1)),
			None => Ok(PlayableArea::from_grid(grid)),
		}
	}
	/// From a `.ron` file create a [NavigationConfig]
	#[cfg(feature = "ron")]
	pub fn from_ron(path: impl AsRef<std::path::Path>) -> NavResult<Self> {
		let contents = std::fs::read_to_string(path)?;
		Ok(ron::de::from_str(&contents)?)
	}
}
