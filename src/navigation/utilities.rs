//! Useful structures and constants shared by the search, the fields and the agents
//!

use bevy::prelude::*;

/// Cost of a step to an orthogonally adjacent cell
pub const CARDINAL_COST: f32 = 1.0;
/// Cost of a step to a diagonally adjacent cell
pub const DIAGONAL_COST: f32 = std::f32::consts::SQRT_2;
/// Default scale applied to an agents footprint when probing a cell for obstacles, slightly smaller than the footprint so that touching edges don't count as an overlap
pub const DEFAULT_OVERLAP_SHRINK: f32 = 0.95;
/// Distance within which an agent is considered to have reached a waypoint
pub const SNAP_TOLERANCE: f32 = 0.01;
/// Largest number of cells a [crate::prelude::Grid] may hold, every field allocates one value per cell
pub const MAX_CELL_COUNT: u64 = 1 << 24;

/// The 8 directions of movement between grid cells along with a [Ordinal::Zero] marker for "no movement".
///
/// Rows grow upwards so [Ordinal::North] is `(0, 1)`.
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Reflect)]
pub enum Ordinal {
	North,
	East,
	South,
	West,
	NorthEast,
	SouthEast,
	SouthWest,
	NorthWest,
	/// Special case, used to indicate a goal or unreachable cell in a [crate::prelude::FlowField]
	Zero,
}

impl Ordinal {
	/// Neighbour expansion order used everywhere a cell looks at its neighbours, the 4 cardinals followed by the 4 diagonals. Fixing the order fixes tie-breaking so that searches and fields are deterministic
	pub const EXPANSION_ORDER: [Ordinal; 8] = [
		Ordinal::East,
		Ordinal::West,
		Ordinal::North,
		Ordinal::South,
		Ordinal::NorthEast,
		Ordinal::SouthEast,
		Ordinal::NorthWest,
		Ordinal::SouthWest,
	];
	/// Get the `(column, row)` offset of a single step in this direction
	pub fn get_offset(&self) -> IVec2 {
		match self {
			Ordinal::North => IVec2::new(0, 1),
			Ordinal::East => IVec2::new(1, 0),
			Ordinal::South => IVec2::new(0, -1),
			Ordinal::West => IVec2::new(-1, 0),
			Ordinal::NorthEast => IVec2::new(1, 1),
			Ordinal::SouthEast => IVec2::new(1, -1),
			Ordinal::SouthWest => IVec2::new(-1, -1),
			Ordinal::NorthWest => IVec2::new(-1, 1),
			Ordinal::Zero => IVec2::ZERO,
		}
	}
	/// Find the [Ordinal] describing a single step of `offset`, [None] if the offset is not to an adjacent cell
	pub fn from_offset(offset: IVec2) -> Option<Ordinal> {
		match (offset.x, offset.y) {
			(0, 1) => Some(Ordinal::North),
			(1, 0) => Some(Ordinal::East),
			(0, -1) => Some(Ordinal::South),
			(-1, 0) => Some(Ordinal::West),
			(1, 1) => Some(Ordinal::NorthEast),
			(1, -1) => Some(Ordinal::SouthEast),
			(-1, -1) => Some(Ordinal::SouthWest),
			(-1, 1) => Some(Ordinal::NorthWest),
			(0, 0) => Some(Ordinal::Zero),
			_ => None,
		}
	}
	/// Is this a diagonal step
	pub fn is_diagonal(&self) -> bool {
		matches!(
			self,
			Ordinal::NorthEast | Ordinal::SouthEast | Ordinal::SouthWest | Ordinal::NorthWest
		)
	}
	/// Cost of taking a step in this direction
	pub fn get_step_cost(&self) -> f32 {
		match self {
			Ordinal::Zero => 0.0,
			o if o.is_diagonal() => DIAGONAL_COST,
			_ => CARDINAL_COST,
		}
	}
	/// Unit vector of this direction in world space, [Ordinal::Zero] produces a zero vector
	pub fn get_unit_vector(&self) -> Vec2 {
		self.get_offset().as_vec2().normalize_or_zero()
	}
	/// For a diagonal the two cardinal offsets that flank it, `(dx, 0)` and `(0, dy)`. A diagonal step is only allowed when neither flank is blocked
	pub fn get_diagonal_flanks(&self) -> Option<(IVec2, IVec2)> {
		if self.is_diagonal() {
			let offset = self.get_offset();
			Some((IVec2::new(offset.x, 0), IVec2::new(0, offset.y)))
		} else {
			None
		}
	}
}
