//! A* search over the grid for a single agent.
//!
//! The search expands the 8 neighbours of a cell in the fixed
//! [Ordinal::EXPANSION_ORDER], cardinal steps cost `1` and diagonal steps cost
//! `sqrt(2)`. The heuristic is the Chebyshev distance `max(|dx|, |dy|)`.
//!
//! A neighbour is discarded when:
//!
//! * the agents footprint centred on the neighbour would cross the [PlayableArea]
//! * the step is diagonal and either of the two cardinal cells flanking it is blocked, agents never squeeze between the corners of two obstacles
//! * the neighbour itself is blocked
//!
//! ```text
//!  _____ _____
//! |/////|     |
//! |/////|  G  |    a diagonal step from S to G would clip the corner of
//! |/////|_____|    the blocked cell, so it's forbidden even though G is open
//! |     |     |
//! |  S  |     |
//! |_____|_____|
//! ```
//!

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use bevy::prelude::*;

use crate::prelude::*;

/// Plans grid paths for an agent with a particular footprint
pub struct Pathfinder<'a, Q: ObstacleQuery + ?Sized> {
	/// Obstacle test for the agents footprint
	occupancy: Occupancy<'a, Q>,
	/// Bounds the footprint must stay inside
	area: &'a PlayableArea,
}

/// An entry in the open set
#[derive(Debug, Clone, Copy)]
struct OpenNode {
	/// Cell this entry refers to
	cell: GridCell,
	/// Accumulated cost from the start when this entry was pushed
	g: f32,
	/// `g` plus the heuristic
	f: f32,
	/// Insertion counter, equal scores are popped first-in first-out
	sequence: u64,
}

impl Ord for OpenNode {
	fn cmp(&self, other: &Self) -> Ordering {
		// BinaryHeap is a max-heap, reverse so the lowest score pops first
		other
			.f
			.total_cmp(&self.f)
			.then_with(|| other.sequence.cmp(&self.sequence))
	}
}

impl PartialOrd for OpenNode {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl PartialEq for OpenNode {
	fn eq(&self, other: &Self) -> bool {
		self.cmp(other) == Ordering::Equal
	}
}

impl Eq for OpenNode {}

impl<'a, Q: ObstacleQuery + ?Sized> Pathfinder<'a, Q> {
	/// Create a [Pathfinder] for a footprint of `half_extents` moving through `obstacles`
	pub fn new(
		grid: &'a Grid,
		area: &'a PlayableArea,
		half_extents: Vec2,
		obstacles: &'a Q,
	) -> Self {
		Pathfinder {
			occupancy: Occupancy::new(grid, half_extents, obstacles),
			area,
		}
	}
	/// Create a [Pathfinder] from an existing [Occupancy]
	pub fn from_occupancy(occupancy: Occupancy<'a, Q>, area: &'a PlayableArea) -> Self {
		Pathfinder { occupancy, area }
	}
	/// Get the obstacle test used by the search
	pub fn get_occupancy(&self) -> &Occupancy<'a, Q> {
		&self.occupancy
	}
	/// Is the `cell` blocked for the footprint
	pub fn is_blocked(&self, cell: GridCell) -> bool {
		self.occupancy.is_blocked(cell)
	}
	/// Would the footprint centred on the `cell` stay inside the [PlayableArea]
	pub fn is_in_bounds(&self, cell: GridCell) -> bool {
		let centre = self.occupancy.get_grid().world_centre_of(cell);
		self.area.fits(centre, self.occupancy.get_half_extents())
	}
	/// Can the footprint step from `cell` in the direction of `ordinal`
	pub fn can_step(&self, cell: GridCell, ordinal: Ordinal) -> bool {
		let neighbour = cell.get_neighbour(ordinal);
		self.is_in_bounds(neighbour)
			&& !self.occupancy.is_corner_cut(cell, ordinal)
			&& !self.is_blocked(neighbour)
	}
	/// Find the cheapest sequence of cells from `start` to `goal` inclusive.
	///
	/// An empty list means the goal cannot be reached. The `start` cell itself is never tested for obstacles, the agent is already standing on it
	pub fn find_path(&self, start: GridCell, goal: GridCell) -> Vec<GridCell> {
		if start == goal {
			return vec![start];
		}
		let mut open = BinaryHeap::new();
		let mut closed: HashSet<GridCell> = HashSet::new();
		let mut g_scores: HashMap<GridCell, f32> = HashMap::new();
		let mut parents: HashMap<GridCell, GridCell> = HashMap::new();
		let mut sequence = 0;

		g_scores.insert(start, 0.0);
		open.push(OpenNode {
			cell: start,
			g: 0.0,
			f: heuristic(start, goal),
			sequence,
		});

		while let Some(current) = open.pop() {
			if closed.contains(&current.cell) {
				continue;
			}
			if current.cell == goal {
				let path = reconstruct_path(&parents, start, goal);
				trace!("Path of {} cells found to {:?}", path.len(), goal);
				return path;
			}
			closed.insert(current.cell);
			for ordinal in Ordinal::EXPANSION_ORDER {
				let neighbour = current.cell.get_neighbour(ordinal);
				if closed.contains(&neighbour) || !self.can_step(current.cell, ordinal) {
					continue;
				}
				let tentative = current.g + ordinal.get_step_cost();
				let known = g_scores.get(&neighbour).copied().unwrap_or(f32::INFINITY);
				if tentative < known {
					g_scores.insert(neighbour, tentative);
					parents.insert(neighbour, current.cell);
					sequence += 1;
					open.push(OpenNode {
						cell: neighbour,
						g: tentative,
						f: tentative + heuristic(neighbour, goal),
						sequence,
					});
				}
			}
		}
		debug!("No path from {:?} to {:?}", start, goal);
		Vec::new()
	}
}

/// Chebyshev distance between two cells
fn heuristic(cell: GridCell, goal: GridCell) -> f32 {
	cell.chebyshev_distance(&goal) as f32
}

/// Walk the parent links back from the `goal` and reverse them so the path starts at `start`
fn reconstruct_path(
	parents: &HashMap<GridCell, GridCell>,
	start: GridCell,
	goal: GridCell,
) -> Vec<GridCell> {
	let mut path = vec![goal];
	let mut current = goal;
	while current != start {
		match parents.get(&current) {
			Some(parent) => {
				current = *parent;
				path.push(current);
			}
			None => {
				error!("Broken parent chain at {:?} while rebuilding a path", current);
				return Vec::new();
			}
		}
	}
	path.reverse();
	path
}
