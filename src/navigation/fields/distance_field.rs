//! The DistanceField holds, for every cell of a [Grid], the accumulated cost
//! of the cheapest 8-connected walk to a single goal cell. Cardinal steps cost
//! `1` and diagonal steps cost `sqrt(2)`.
//!
//! The field starts with every cell at `f32::INFINITY` and the goal at `0`.
//! A first-in first-out work queue seeded with the goal relaxes neighbours:
//!
//! 1. Pop a cell from the front of the queue
//! 2. For each neighbour in [Ordinal::EXPANSION_ORDER] add the step cost to the cells distance
//! 3. If that improves on the neighbours distance store it and push the neighbour to the back of the queue
//! 4. Repeat until no distance improves
//!
//! For the goal in the middle of a 5x5 grid the result is (rounded):
//!
//! ```text
//!  _____________________________
//! |     |     |     |     |     |
//! | 2.8 | 2.4 | 2.0 | 2.4 | 2.8 |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! | 2.4 | 1.4 | 1.0 | 1.4 | 2.4 |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! | 2.0 | 1.0 |  0  | 1.0 | 2.0 |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! | 2.4 | 1.4 | 1.0 | 1.4 | 2.4 |
//! |_____|_____|_____|_____|_____|
//! |     |     |     |     |     |
//! | 2.8 | 2.4 | 2.0 | 2.4 | 2.8 |
//! |_____|_____|_____|_____|_____|
//! ```
//!
//! When calculated against an [Occupancy] blocked cells are never entered and
//! diagonal steps that would squeeze between two blocked corners are refused,
//! so the wave flows around obstacles the same way the [Pathfinder] searches.
//! Calculating within a [PlayableArea] also keeps the wave out of cells where
//! the footprint would cross the edge of the area.
//!

use std::collections::VecDeque;

use bevy::prelude::*;

use crate::prelude::*;

/// Shortest accumulated cost from every cell to a goal
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DistanceField {
	/// Layout of the field
	grid: Grid,
	/// The cell the distances are measured to
	goal: Option<GridCell>,
	/// Row-major distances, `f32::INFINITY` when unreached
	distances: Vec<f32>,
	/// Row-major mask of cells which can't be entered
	blocked: Vec<bool>,
	/// Row-major mask of cells where the footprint would cross the [PlayableArea], they can't be entered but don't count as blocked corners
	outside: Vec<bool>,
}

impl Field<f32> for DistanceField {
	fn get(&self) -> &[f32] {
		&self.distances
	}
	fn get_grid(&self) -> &Grid {
		&self.grid
	}
	fn get_field_cell_value(&self, cell: GridCell) -> Option<f32> {
		self.grid.index_of(cell).map(|i| self.distances[i])
	}
	fn set_field_cell_value(&mut self, value: f32, cell: GridCell) {
		if let Some(i) = self.grid.index_of(cell) {
			self.distances[i] = value;
		} else {
			error!(
				"Cannot set a DistanceField value, {:?} is outside of the field",
				cell
			);
		}
	}
}

impl DistanceField {
	/// Creates a new [DistanceField] where every cell is unreached and unblocked
	pub fn new(grid: Grid) -> Self {
		let count = grid.get_cell_count();
		DistanceField {
			grid,
			goal: None,
			distances: vec![f32::INFINITY; count],
			blocked: vec![false; count],
			outside: vec![false; count],
		}
	}
	/// Get the goal the field was calculated for
	pub fn get_goal(&self) -> Option<GridCell> {
		self.goal
	}
	/// Distance from a `cell` to the goal, `f32::INFINITY` when unreachable or outside of the field
	pub fn get_distance(&self, cell: GridCell) -> f32 {
		self.get_field_cell_value(cell).unwrap_or(f32::INFINITY)
	}
	/// Can the goal be reached from the `cell`
	pub fn is_reachable(&self, cell: GridCell) -> bool {
		self.get_distance(cell).is_finite()
	}
	/// Is the `cell` marked as blocked, cells outside of the field count as blocked
	pub fn is_blocked(&self, cell: GridCell) -> bool {
		self.grid
			.index_of(cell)
			.map(|i| self.blocked[i])
			.unwrap_or(true)
	}
	/// Reset all distances to unreached and clear the blocked mask
	pub fn reset(&mut self) {
		self.goal = None;
		self.distances.iter_mut().for_each(|d| *d = f32::INFINITY);
		self.blocked.iter_mut().for_each(|b| *b = false);
		self.outside.iter_mut().for_each(|o| *o = false);
	}
	/// Would a footprint centred on the `cell` leave the playable area, cells outside of the field count as outside
	pub fn is_outside(&self, cell: GridCell) -> bool {
		self.grid
			.index_of(cell)
			.map(|i| self.outside[i])
			.unwrap_or(true)
	}
	/// Calculate the field over open ground toward the `goal`. A goal outside of the grid leaves every cell unreached
	pub fn calculate(&mut self, goal: GridCell) {
		self.reset();
		self.relax_from(goal);
	}
	/// Calculate the field toward the `goal` routing around any cell the `occupancy` reports as blocked. The occupancy is expected to measure the same grid as the field
	pub fn calculate_avoiding<Q: ObstacleQuery + ?Sized>(
		&mut self,
		goal: GridCell,
		occupancy: &Occupancy<Q>,
	) {
		self.reset();
		self.mask_blocked(occupancy);
		if self.is_blocked(goal) && self.grid.contains(goal) {
			debug!("DistanceField goal {:?} is blocked", goal);
			return;
		}
		self.relax_from(goal);
	}
	/// Calculate the field toward the `goal` routing around blocked cells and never entering a cell where the footprint of the `occupancy` would cross the `area`
	pub fn calculate_within<Q: ObstacleQuery + ?Sized>(
		&mut self,
		goal: GridCell,
		occupancy: &Occupancy<Q>,
		area: &PlayableArea,
	) {
		self.reset();
		self.mask_blocked(occupancy);
		let half_extents = occupancy.get_half_extents();
		for (i, outside) in self.outside.iter_mut().enumerate() {
			let centre = self.grid.world_centre_of(self.grid.cell_from_index(i));
			*outside = !area.fits(centre, half_extents);
		}
		if self.grid.contains(goal) && (self.is_blocked(goal) || self.is_outside(goal)) {
			debug!("DistanceField goal {:?} is blocked or outside of the playable area", goal);
			return;
		}
		self.relax_from(goal);
	}
	/// Mark every cell the `occupancy` reports as blocked
	fn mask_blocked<Q: ObstacleQuery + ?Sized>(&mut self, occupancy: &Occupancy<Q>) {
		for (i, blocked) in self.blocked.iter_mut().enumerate() {
			*blocked = occupancy.is_blocked(self.grid.cell_from_index(i));
		}
	}
	/// Can a walker move from `cell` one step in the direction of `ordinal` without leaving the field or the playable area, entering a blocked cell or cutting a blocked corner
	pub fn is_step_allowed(&self, cell: GridCell, ordinal: Ordinal) -> bool {
		let neighbour = cell.get_neighbour(ordinal);
		if self.is_blocked(neighbour) || self.is_outside(neighbour) {
			return false;
		}
		match ordinal.get_diagonal_flanks() {
			Some((side_one, side_two)) => {
				!self.is_blocked(cell.offset(side_one)) && !self.is_blocked(cell.offset(side_two))
			}
			None => true,
		}
	}
	/// Wavefront relaxation from the `goal` using a first-in first-out queue
	fn relax_from(&mut self, goal: GridCell) {
		let Some(goal_index) = self.grid.index_of(goal) else {
			debug!("DistanceField goal {:?} is outside of the grid", goal);
			return;
		};
		self.goal = Some(goal);
		self.distances[goal_index] = 0.0;
		let mut queue = VecDeque::new();
		queue.push_back(goal);
		while let Some(cell) = queue.pop_front() {
			let Some(index) = self.grid.index_of(cell) else {
				continue;
			};
			let base = self.distances[index];
			for ordinal in Ordinal::EXPANSION_ORDER {
				if !self.is_step_allowed(cell, ordinal) {
					continue;
				}
				let neighbour = cell.get_neighbour(ordinal);
				if let Some(n) = self.grid.index_of(neighbour) {
					let candidate = base + ordinal.get_step_cost();
					// don't overwrite a cell with a worse cost
					if candidate < self.distances[n] {
						self.distances[n] = candidate;
						queue.push_back(neighbour);
					}
				}
			}
		}
	}
}
