//! The Simulation owns every agent and steps them forward in fixed ticks.
//!
//! Each tick:
//!
//! 1. The [ReservationTable] is rebuilt, every agent claims the cell it stands on and then the cell it committed to entering last tick
//! 2. Agents are updated one at a time in slot order. An agent flagged for replanning recalculates its route first, then it claims the cell of its next waypoint and moves toward it
//! 3. An agent that loses a claim is blocked. If the claimant is travelling a coin toss decides whether the claimant is asked to step aside or the blocked agent steps aside itself. An agent that has already stepped aside on this leg, or can't find room to, replans on its next update instead
//!
//! Static obstacles are supplied on every call so the host can mutate its
//! collision world between ticks. When planning, the footprints of the other
//! agents are treated as obstacles too.
//!

use std::sync::Arc;

use bevy::prelude::*;
use rand::Rng;

use crate::prelude::*;

/// A navigable world and the agents moving through it
#[derive(Debug, Clone, Resource)]
pub struct Simulation {
	/// Layout of the world
	grid: Grid,
	/// Bounds agent footprints must stay inside
	area: PlayableArea,
	/// Every agent
	agents: AgentRegistry,
	/// Claims of the current tick
	reservations: ReservationTable,
}

impl Simulation {
	/// Create an empty simulation
	pub fn new(grid: Grid, area: PlayableArea) -> Self {
		Simulation {
			grid,
			area,
			agents: AgentRegistry::default(),
			reservations: ReservationTable::default(),
		}
	}
	/// Create an empty simulation from a [NavigationConfig], a missing configuration is an error
	pub fn from_config(config: Option<&NavigationConfig>) -> NavResult<Self> {
		let config = config.ok_or(NavError::ConfigurationMissing)?;
		let grid = config.build_grid()?;
		let area = config.build_playable_area(&grid)?;
		Ok(Simulation::new(grid, area))
	}
	/// Get the grid
	pub fn get_grid(&self) -> &Grid {
		&self.grid
	}
	/// Get the playable area
	pub fn get_playable_area(&self) -> &PlayableArea {
		&self.area
	}
	/// Get the agents
	pub fn get_agents(&self) -> &AgentRegistry {
		&self.agents
	}
	/// Get the claims made during the last tick
	pub fn get_reservations(&self) -> &ReservationTable {
		&self.reservations
	}
	/// Get an agent
	pub fn get_agent(&self, id: AgentId) -> Option<&AgentController> {
		self.agents.get(id)
	}
	/// Add an idle agent at `position`
	pub fn spawn_agent(&mut self, position: Vec2, settings: AgentSettings) -> AgentId {
		let id = self.agents.insert(AgentController::new(position, settings));
		trace!("Spawned agent {:?} at {}", id, position);
		id
	}
	/// Remove an agent
	pub fn remove_agent(&mut self, id: AgentId) -> Option<AgentController> {
		self.agents.remove(id)
	}
	/// Send an agent to a world `target` along its own path. Other agents are treated as obstacles while planning
	pub fn set_destination<Q: ObstacleQuery + ?Sized>(
		&mut self,
		id: AgentId,
		target: Vec2,
		obstacles: &Q,
	) -> NavResult<()> {
		let mut agent = self
			.agents
			.check_out(id)
			.ok_or(NavError::UnknownAgent(id))?;
		{
			let crowd = CrowdObstacles::new(obstacles, &self.agents);
			let ctx = NavContext::new(&self.grid, &self.area, &crowd);
			agent.set_destination(target, &ctx);
		}
		debug!("Agent {:?} ordered to {}, {:?}", id, target, agent.get_state());
		self.agents.check_in(id, agent);
		Ok(())
	}
	/// Have an agent follow a shared [FlowField]
	pub fn apply_flow_field(&mut self, id: AgentId, field: Arc<FlowField>) -> NavResult<()> {
		let agent = self.agents.get_mut(id).ok_or(NavError::UnknownAgent(id))?;
		agent.apply_flow_field(field);
		Ok(())
	}
	/// Send a group of agents to a world `target` by generating one [FlowField] around the static obstacles, kept inside the [PlayableArea], and sharing it between them. The field is sized for the largest footprint in the group
	pub fn order_group<Q: ObstacleQuery + ?Sized>(
		&mut self,
		ids: &[AgentId],
		target: Vec2,
		obstacles: &Q,
	) -> NavResult<Arc<FlowField>> {
		let mut half_extents = Vec2::ZERO;
		for id in ids {
			let agent = self.agents.get(*id).ok_or(NavError::UnknownAgent(*id))?;
			half_extents = half_extents.max(agent.get_half_extents());
		}
		let clamped = self.area.clamp_position(target, half_extents);
		let goal = self.grid.cell_of(clamped);
		let occupancy = Occupancy::new(&self.grid, half_extents, obstacles);
		let field = Arc::new(FlowField::generate_within(&occupancy, &self.area, goal));
		debug!("Group of {} agents ordered to {:?}", ids.len(), goal);
		for id in ids {
			self.apply_flow_field(*id, field.clone())?;
		}
		Ok(field)
	}
	/// Plan a path for a footprint of `half_extents` through the static `obstacles`
	pub fn find_path<Q: ObstacleQuery + ?Sized>(
		&self,
		start: GridCell,
		goal: GridCell,
		half_extents: Vec2,
		obstacles: &Q,
	) -> Vec<GridCell> {
		Pathfinder::new(&self.grid, &self.area, half_extents, obstacles).find_path(start, goal)
	}
	/// Advance every agent by `dt` seconds
	pub fn tick<Q: ObstacleQuery + ?Sized>(&mut self, dt: f32, obstacles: &Q, rng: &mut impl Rng) {
		self.rebuild_reservations();
		for id in self.agents.ids() {
			self.update_agent(id, dt, obstacles, rng);
		}
		trace!(
			"Tick {} claimed {} cells",
			self.reservations.get_tick(),
			self.reservations.len()
		);
	}
	/// Clear last ticks claims, then claim every agents current cell followed by every committed cell
	fn rebuild_reservations(&mut self) {
		self.reservations.begin_tick();
		for (id, agent) in self.agents.iter() {
			if agent.is_enabled() {
				let cell = agent.get_current_cell(&self.grid);
				if !self.reservations.try_claim(cell, id) {
					trace!("Agents {:?} and {:?} share {:?}", id, self.reservations.get_claimant(cell), cell);
				}
			}
		}
		for (id, agent) in self.agents.iter() {
			if let Some(cell) = agent.get_committed_cell() {
				self.reservations.try_claim(cell, id);
			}
		}
	}
	/// Replan if requested then claim and move toward the next waypoint
	fn update_agent<Q: ObstacleQuery + ?Sized>(
		&mut self,
		id: AgentId,
		dt: f32,
		obstacles: &Q,
		rng: &mut impl Rng,
	) {
		let Some(mut agent) = self.agents.check_out(id) else {
			return;
		};
		if agent.is_enabled() {
			if agent.get_state() == AgentState::Replanning {
				let crowd = CrowdObstacles::new(obstacles, &self.agents);
				agent.replan(&NavContext::new(&self.grid, &self.area, &crowd));
			}
			if agent.is_moving() {
				self.step_agent(id, &mut agent, dt, obstacles, rng);
			}
		}
		self.agents.check_in(id, agent);
	}
	/// Claim the cell of the next waypoint and move toward it
	fn step_agent<Q: ObstacleQuery + ?Sized>(
		&mut self,
		id: AgentId,
		agent: &mut AgentController,
		dt: f32,
		obstacles: &Q,
		rng: &mut impl Rng,
	) {
		let Some(waypoint) = agent.next_target() else {
			agent.arrive();
			return;
		};
		let ctx = NavContext::new(&self.grid, &self.area, obstacles);
		let current = agent.get_current_cell(&self.grid);
		let target = self.grid.cell_of(waypoint.get_position());
		if target != current {
			if agent.is_statically_blocked(target, &ctx) {
				debug!("Agent {:?} found {:?} blocked, replanning", id, target);
				agent.request_replan();
				return;
			}
			if !self.reservations.try_claim(target, id) {
				resolve_block(
					id,
					agent,
					target,
					&mut self.agents,
					&self.reservations,
					&ctx,
					rng,
				);
				return;
			}
			agent.commit(target);
		}
		agent.advance(waypoint, dt);
	}
}

/// Decide who steps aside when `agent` fails to claim `contested`. The agent holding the claim is only ever asked, it updates its own route through [AgentController::offer_dodge]
fn resolve_block<Q: ObstacleQuery + ?Sized>(
	id: AgentId,
	agent: &mut AgentController,
	contested: GridCell,
	agents: &mut AgentRegistry,
	reservations: &ReservationTable,
	ctx: &NavContext<Q>,
	rng: &mut impl Rng,
) {
	agent.set_blocked();
	let own_cell = agent.get_current_cell(ctx.get_grid());
	let mut obstruction = contested;
	if let Some(blocker_id) = reservations.get_claimant(contested) {
		if let Some(blocker) = agents.get_mut(blocker_id) {
			obstruction = blocker.get_current_cell(ctx.get_grid());
			if blocker.is_moving()
				&& rng.random_bool(0.5)
				&& blocker.offer_dodge(blocker_id, own_cell, ctx, reservations)
			{
				trace!("Agent {:?} waits for {:?} to step aside", id, blocker_id);
				return;
			}
		}
	}
	if !agent.offer_dodge(id, obstruction, ctx, reservations) {
		debug!("Agent {:?} is stuck at {:?}, replanning", id, own_cell);
		agent.request_replan();
	}
}
