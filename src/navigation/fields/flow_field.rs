//! A FlowField is a shared map of directions: every cell stores the [Ordinal]
//! leading to the neighbour closest to a single goal. Any number of agents can
//! sample the same field so a group order only costs one field calculation
//! no matter how many agents follow it.
//!
//! The directions are derived from a [DistanceField]. Each reachable cell
//! looks at its neighbours in [Ordinal::EXPANSION_ORDER] and picks the first
//! neighbour with a strictly smaller distance than the best seen so far
//! (starting from its own distance). The goal and any unreachable cell store
//! [Ordinal::Zero]:
//!
//! ```text
//!  __________________________________
//! |      |      |      |      |      |
//! |  SE  |  SE  |  S   |  SW  |  SW  |
//! |______|______|______|______|______|
//! |      |      |      |      |      |
//! |  SE  |  SE  |  S   |  SW  |  SW  |
//! |______|______|______|______|______|
//! |      |      |      |      |      |
//! |  E   |  E   | goal |  W   |  W   |
//! |______|______|______|______|______|
//! |      |      |      |      |      |
//! |  NE  |  NE  |  N   |  NW  |  NW  |
//! |______|______|______|______|______|
//! |      |      |      |      |      |
//! |  NE  |  NE  |  N   |  NW  |  NW  |
//! |______|______|______|______|______|
//! ```
//!
//! Following the stored directions from any reachable cell strictly decreases
//! the distance at every step so a walker always arrives at the goal without
//! looping.
//!

use bevy::prelude::*;

use crate::prelude::*;

/// Per-cell directions toward a goal
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlowField {
	/// Layout of the field, an empty grid when the field has never been generated
	grid: Grid,
	/// The cell every direction leads toward
	goal: Option<GridCell>,
	/// Row-major directions
	directions: Vec<Ordinal>,
}

impl Field<Ordinal> for FlowField {
	fn get(&self) -> &[Ordinal] {
		&self.directions
	}
	fn get_grid(&self) -> &Grid {
		&self.grid
	}
	fn get_field_cell_value(&self, cell: GridCell) -> Option<Ordinal> {
		self.grid.index_of(cell).map(|i| self.directions[i])
	}
	fn set_field_cell_value(&mut self, value: Ordinal, cell: GridCell) {
		if let Some(i) = self.grid.index_of(cell) {
			self.directions[i] = value;
		} else {
			error!("Cannot set a FlowField value, {:?} is outside of the field", cell);
		}
	}
}

impl FlowField {
	/// Generate a field covering the rectangle `bounds_min`..`bounds_max` toward the world position `target`. Only an invalid cell size or non-finite bounds are rejected, a target outside of the bounds produces a field of zero directions
	pub fn generate(
		bounds_min: Vec2,
		bounds_max: Vec2,
		cell_size: f32,
		target: Vec2,
	) -> NavResult<FlowField> {
		let grid = Grid::from_bounds(bounds_min, bounds_max, cell_size)?;
		let target_cell = grid.cell_of(target);
		Ok(FlowField::generate_on_grid(&grid, target_cell))
	}
	/// Generate a field over open ground on an existing `grid` toward the `target_cell`
	pub fn generate_on_grid(grid: &Grid, target_cell: GridCell) -> FlowField {
		let mut distances = DistanceField::new(*grid);
		distances.calculate(target_cell);
		FlowField::from_distance_field(&distances)
	}
	/// Generate a field on the grid of the `occupancy` toward the `target_cell`, routing around blocked cells and never cutting their corners
	pub fn generate_avoiding<Q: ObstacleQuery + ?Sized>(
		occupancy: &Occupancy<Q>,
		target_cell: GridCell,
	) -> FlowField {
		let mut distances = DistanceField::new(*occupancy.get_grid());
		distances.calculate_avoiding(target_cell, occupancy);
		FlowField::from_distance_field(&distances)
	}
	/// Generate a field like [FlowField::generate_avoiding] that also never leads a footprint across the boundary of the `area`
	pub fn generate_within<Q: ObstacleQuery + ?Sized>(
		occupancy: &Occupancy<Q>,
		area: &PlayableArea,
		target_cell: GridCell,
	) -> FlowField {
		let mut distances = DistanceField::new(*occupancy.get_grid());
		distances.calculate_within(target_cell, occupancy, area);
		FlowField::from_distance_field(&distances)
	}
	/// Pick the steepest descent direction of every cell of a [DistanceField]
	pub fn from_distance_field(distances: &DistanceField) -> FlowField {
		let grid = *distances.get_grid();
		let mut directions = vec![Ordinal::Zero; grid.get_cell_count()];
		if distances.get_goal().is_none() {
			debug!("FlowField target is unreachable or outside of the grid");
		}
		for (i, direction) in directions.iter_mut().enumerate() {
			let cell = grid.cell_from_index(i);
			let mut best = distances.get_distance(cell);
			if !best.is_finite() {
				continue;
			}
			for ordinal in Ordinal::EXPANSION_ORDER {
				if !distances.is_step_allowed(cell, ordinal) {
					continue;
				}
				let distance = distances.get_distance(cell.get_neighbour(ordinal));
				if distance < best {
					best = distance;
					*direction = ordinal;
				}
			}
		}
		FlowField {
			grid,
			goal: distances.get_goal(),
			directions,
		}
	}
	/// Has the field been generated toward a reachable goal
	pub fn is_generated(&self) -> bool {
		self.goal.is_some()
	}
	/// Get the goal of the field
	pub fn get_goal(&self) -> Option<GridCell> {
		self.goal
	}
	/// Get the [Ordinal] stored for a `cell`, [Ordinal::Zero] when outside of the field
	pub fn get_ordinal(&self, cell: GridCell) -> Ordinal {
		self.get_field_cell_value(cell).unwrap_or(Ordinal::Zero)
	}
	/// Unit direction of travel for a `cell`, zero at the goal, for unreachable cells and outside of the field
	pub fn get_cell_direction(&self, cell: GridCell) -> Vec2 {
		self.get_ordinal(cell).get_unit_vector()
	}
	/// Unit direction of travel at a world `position`, zero at the goal, for unreachable positions, outside of the field or when the field was never generated
	pub fn get_direction(&self, position: Vec2) -> Vec2 {
		self.get_cell_direction(self.grid.cell_of(position))
	}
	/// The neighbour a walker standing on `cell` should move to next, [None] at the goal or when there is no way forward
	pub fn next_cell(&self, cell: GridCell) -> Option<GridCell> {
		match self.get_ordinal(cell) {
			Ordinal::Zero => None,
			ordinal => Some(cell.get_neighbour(ordinal)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn ungenerated_is_zero() {
		let field = FlowField::default();
		assert!(!field.is_generated());
		assert_eq!(Vec2::ZERO, field.get_direction(Vec2::new(3.0, 4.0)));
	}
	#[test]
	fn out_of_bounds_is_zero() {
		let field =
			FlowField::generate(Vec2::ZERO, Vec2::new(10.0, 10.0), 1.0, Vec2::new(5.5, 5.5))
				.unwrap();
		assert_eq!(Vec2::ZERO, field.get_direction(Vec2::new(-0.5, 3.0)));
		assert_eq!(Vec2::ZERO, field.get_direction(Vec2::new(3.0, 10.5)));
	}
	#[test]
	fn target_outside_bounds_is_empty() {
		let field =
			FlowField::generate(Vec2::ZERO, Vec2::new(10.0, 10.0), 1.0, Vec2::new(50.0, 5.0))
				.unwrap();
		assert!(!field.is_generated());
		assert!(field.get().iter().all(|o| *o == Ordinal::Zero));
	}
	#[test]
	fn invalid_cell_size() {
		let result = FlowField::generate(Vec2::ZERO, Vec2::new(10.0, 10.0), 0.0, Vec2::ZERO);
		assert!(matches!(result, Err(NavError::InvalidCellSize(_))));
	}
	#[test]
	fn corner_points_at_goal() {
		let field =
			FlowField::generate(Vec2::ZERO, Vec2::new(10.0, 10.0), 1.0, Vec2::new(5.5, 5.5))
				.unwrap();
		assert_eq!(Some(GridCell::new(5, 5)), field.get_goal());
		let direction = field.get_direction(Vec2::new(0.5, 0.5));
		let to_goal = Vec2::new(5.0, 5.0);
		assert!(direction.dot(to_goal) >= 0.0);
		assert_eq!(Ordinal::NorthEast, field.get_ordinal(GridCell::new(0, 0)));
	}
	#[test]
	fn goal_is_zero() {
		let grid = Grid::new(Vec2::ZERO, 1.0, 5, 5).unwrap();
		let field = FlowField::generate_on_grid(&grid, GridCell::new(2, 2));
		assert_eq!(Vec2::ZERO, field.get_cell_direction(GridCell::new(2, 2)));
		assert_eq!(None, field.next_cell(GridCell::new(2, 2)));
	}
	#[test]
	fn cardinals_win_ties() {
		let grid = Grid::new(Vec2::ZERO, 1.0, 5, 5).unwrap();
		let field = FlowField::generate_on_grid(&grid, GridCell::new(2, 2));
		assert_eq!(Ordinal::East, field.get_ordinal(GridCell::new(0, 2)));
		assert_eq!(Ordinal::South, field.get_ordinal(GridCell::new(2, 4)));
		assert_eq!(Ordinal::SouthWest, field.get_ordinal(GridCell::new(4, 4)));
	}
	#[test]
	fn directions_are_unit_or_zero() {
		let grid = Grid::new(Vec2::new(-3.0, 2.0), 0.5, 8, 6).unwrap();
		let field = FlowField::generate_on_grid(&grid, GridCell::new(1, 4));
		for cell in grid.iter_cells() {
			let length = field.get_cell_direction(cell).length();
			if cell == GridCell::new(1, 4) {
				assert_eq!(0.0, length);
			} else {
				assert!((length - 1.0).abs() < 1e-5);
			}
		}
	}
	#[test]
	fn following_always_descends() {
		let grid = Grid::new(Vec2::ZERO, 1.0, 12, 9).unwrap();
		let goal = GridCell::new(7, 2);
		let mut distances = DistanceField::new(grid);
		distances.calculate(goal);
		let field = FlowField::from_distance_field(&distances);
		for start in grid.iter_cells() {
			let mut current = start;
			let mut steps = 0;
			while let Some(next) = field.next_cell(current) {
				assert!(distances.get_distance(next) < distances.get_distance(current));
				current = next;
				steps += 1;
				assert!(steps <= grid.get_cell_count());
			}
			assert_eq!(goal, current);
		}
	}
	#[test]
	#[rustfmt::skip]
	fn avoiding_descends_around_walls() {
		let map = ObstacleMap::from_ascii(Vec2::ZERO, 1.0, &[
			"..........",
			".####.###.",
			".#......#.",
			".#.####.#.",
			"...#..#...",
			"####..####",
			"..........",
		]).unwrap();
		let grid = *map.get_grid();
		let occupancy = Occupancy::new(&grid, Vec2::splat(0.5), &map);
		let goal = GridCell::new(4, 2);
		let field = FlowField::generate_avoiding(&occupancy, goal);
		let mut distances = DistanceField::new(grid);
		distances.calculate_avoiding(goal, &occupancy);
		for start in grid.iter_cells() {
			if map.is_solid(start) || !distances.is_reachable(start) {
				assert_eq!(Ordinal::Zero, field.get_ordinal(start));
				continue;
			}
			let mut current = start;
			let mut steps = 0;
			while let Some(next) = field.next_cell(current) {
				assert!(!map.is_solid(next));
				let ordinal = field.get_ordinal(current);
				if let Some((a, b)) = ordinal.get_diagonal_flanks() {
					assert!(!map.is_solid(current.offset(a)));
					assert!(!map.is_solid(current.offset(b)));
				}
				assert!(distances.get_distance(next) < distances.get_distance(current));
				current = next;
				steps += 1;
				assert!(steps <= grid.get_cell_count());
			}
			assert_eq!(goal, current);
		}
	}
}
