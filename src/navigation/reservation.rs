//! Tick-scoped claims on grid cells.
//!
//! At the start of every tick the table is cleared and rebuilt: each agent
//! first claims the cell it stands on, then the cell it was in the middle of
//! entering. During the tick an agent must claim the next cell of its route
//! before moving into it, the first claimant wins and everyone else sees the
//! cell as blocked by that claimant for the rest of the tick.
//!

use std::collections::HashMap;

use crate::prelude::*;

/// Map of grid cells to the agent holding them this tick
#[derive(Debug, Clone, Default)]
pub struct ReservationTable {
	/// Current claims
	claims: HashMap<GridCell, AgentId>,
	/// Number of times [ReservationTable::begin_tick] has been called
	tick: u64,
}

impl ReservationTable {
	/// Drop every claim ready for a new tick
	pub fn begin_tick(&mut self) {
		self.claims.clear();
		self.tick += 1;
	}
	/// Get the number of ticks the table has seen
	pub fn get_tick(&self) -> u64 {
		self.tick
	}
	/// Claim a `cell` for the `claimant`. Returns `false` if another agent already holds it this tick, claiming a cell twice for the same agent succeeds
	pub fn try_claim(&mut self, cell: GridCell, claimant: AgentId) -> bool {
		match self.claims.get(&cell) {
			Some(owner) => *owner == claimant,
			None => {
				self.claims.insert(cell, claimant);
				true
			}
		}
	}
	/// Get the agent holding a `cell`
	pub fn get_claimant(&self, cell: GridCell) -> Option<AgentId> {
		self.claims.get(&cell).copied()
	}
	/// Is the `cell` held by an agent other than `agent`
	pub fn is_claimed_by_other(&self, cell: GridCell, agent: AgentId) -> bool {
		matches!(self.get_claimant(cell), Some(owner) if owner != agent)
	}
	/// Number of claimed cells
	pub fn len(&self) -> usize {
		self.claims.len()
	}
	/// Are there no claims
	pub fn is_empty(&self) -> bool {
		self.claims.is_empty()
	}
}
