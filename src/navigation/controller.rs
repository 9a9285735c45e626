//! The AgentController is the per-agent navigation state machine. It owns the
//! agents continuous position and either a private list of waypoints produced
//! by the [Pathfinder] or a shared [FlowField] it samples one cell at a time.
//!
//! ```text
//!                 set_destination / apply_flow_field
//!   Idle ─────────────────────────────────────────────> Following
//!    ^                                                  │   ^  │
//!    │ waypoints exhausted                  claim lost  │   │  │ static obstacle
//!    │ or goal unreachable                              v   │  v
//!    └──────────────────────────────────────── Blocked ─┘  Replanning
//!                                                 │   ^
//!                                 dodge accepted  v   │ blocked again
//!                                               Dodging
//! ```
//!
//! Conflicts with other agents are resolved by the [crate::prelude::Simulation]
//! which decides who yields; an agent only ever changes its own route, a
//! blocking agent is asked to step aside through [AgentController::offer_dodge].
//!

use std::sync::Arc;

use bevy::prelude::*;

use crate::prelude::*;

/// Physical properties of an agent
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
pub struct AgentSettings {
	/// Half the width and height of the agents axis-aligned footprint
	half_extents: (f32, f32),
	/// World units travelled per second
	move_speed: f32,
	/// Scale applied to the footprint when probing cells for obstacles
	overlap_shrink: f32,
}

impl AgentSettings {
	/// Create settings with the default overlap shrink
	pub fn new(half_extents: Vec2, move_speed: f32) -> Self {
		AgentSettings {
			half_extents: (half_extents.x, half_extents.y),
			move_speed,
			overlap_shrink: DEFAULT_OVERLAP_SHRINK,
		}
	}
	/// Override the scale applied to the footprint when probing cells
	pub fn with_overlap_shrink(mut self, overlap_shrink: f32) -> Self {
		self.overlap_shrink = overlap_shrink;
		self
	}
	/// Get the footprint half extents
	pub fn get_half_extents(&self) -> Vec2 {
		Vec2::new(self.half_extents.0, self.half_extents.1)
	}
	/// Get the movement speed
	pub fn get_move_speed(&self) -> f32 {
		self.move_speed
	}
	/// Get the overlap shrink
	pub fn get_overlap_shrink(&self) -> f32 {
		self.overlap_shrink
	}
	/// Can an agent move with these settings
	pub fn is_valid(&self) -> bool {
		let half = self.get_half_extents();
		self.move_speed.is_finite()
			&& self.move_speed > 0.0
			&& half.is_finite()
			&& half.x >= 0.0
			&& half.y >= 0.0
			&& self.overlap_shrink.is_finite()
			&& self.overlap_shrink > 0.0
	}
}

/// What an agent is currently doing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Reflect)]
pub enum AgentState {
	/// No destination, or the destination has been reached or is unreachable
	#[default]
	Idle,
	/// Moving along a path or flow field
	Following,
	/// Failed to claim the next cell this tick
	Blocked,
	/// Moving to a one-cell detour inserted to get out of another agents way
	Dodging,
	/// The route will be recalculated at the start of the next update
	Replanning,
}

/// A world-space point an agent moves toward
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Waypoint {
	/// Centre of the target cell
	position: Vec2,
	/// Is the waypoint a one-cell detour rather than part of the planned route
	is_dodge: bool,
}

impl Waypoint {
	/// A waypoint of the planned route
	pub fn new(position: Vec2) -> Self {
		Waypoint {
			position,
			is_dodge: false,
		}
	}
	/// A one-cell detour
	pub fn dodge(position: Vec2) -> Self {
		Waypoint {
			position,
			is_dodge: true,
		}
	}
	/// Get the position
	pub fn get_position(&self) -> Vec2 {
		self.position
	}
	/// Is the waypoint a detour
	pub fn is_dodge(&self) -> bool {
		self.is_dodge
	}
}

/// Everything an agent needs to look at while planning
pub struct NavContext<'a, Q: ObstacleQuery + ?Sized> {
	/// Layout of the world
	grid: &'a Grid,
	/// Bounds every footprint must stay inside
	area: &'a PlayableArea,
	/// Obstacles to avoid
	obstacles: &'a Q,
}

impl<'a, Q: ObstacleQuery + ?Sized> NavContext<'a, Q> {
	/// Bundle the pieces of the world used for planning
	pub fn new(grid: &'a Grid, area: &'a PlayableArea, obstacles: &'a Q) -> Self {
		NavContext {
			grid,
			area,
			obstacles,
		}
	}
	/// Get the grid
	pub fn get_grid(&self) -> &'a Grid {
		self.grid
	}
	/// Get the playable area
	pub fn get_area(&self) -> &'a PlayableArea {
		self.area
	}
	/// Get the obstacles
	pub fn get_obstacles(&self) -> &'a Q {
		self.obstacles
	}
}

/// Navigation state of a single agent
#[derive(Debug, Clone)]
pub struct AgentController {
	/// Current world position of the footprint centre
	position: Vec2,
	/// Footprint and speed
	settings: AgentSettings,
	/// Where the agent has been asked to go, already clamped into the playable area
	destination: Option<Vec2>,
	/// The cell containing the destination
	destination_cell: Option<GridCell>,
	/// Waypoints, in flow field mode this only holds the next sampled cell and any detour
	path: Vec<Waypoint>,
	/// Index of the waypoint being moved toward
	target_index: usize,
	/// Shared field being followed in group mode
	flow_field: Option<Arc<FlowField>>,
	/// Set once a detour has been taken on the current leg
	has_dodged: bool,
	/// Current state
	state: AgentState,
	/// Cell being entered, claimed again at the start of the next tick
	committed_cell: Option<GridCell>,
	/// Disabled agents never move
	enabled: bool,
}

impl AgentController {
	/// Create an idle agent at `position`. Invalid settings disable the agent
	pub fn new(position: Vec2, settings: AgentSettings) -> Self {
		let enabled = settings.is_valid() && position.is_finite();
		if !enabled {
			error!(
				"Agent at {} has invalid settings {:?}, it will not move",
				position, settings
			);
		}
		AgentController {
			position,
			settings,
			destination: None,
			destination_cell: None,
			path: Vec::new(),
			target_index: 0,
			flow_field: None,
			has_dodged: false,
			state: AgentState::Idle,
			committed_cell: None,
			enabled,
		}
	}
	/// Get the world position
	pub fn get_position(&self) -> Vec2 {
		self.position
	}
	/// Get the settings
	pub fn get_settings(&self) -> &AgentSettings {
		&self.settings
	}
	/// Get the footprint half extents
	pub fn get_half_extents(&self) -> Vec2 {
		self.settings.get_half_extents()
	}
	/// Lower-left and upper-right corners of the footprint
	pub fn get_bounds(&self) -> (Vec2, Vec2) {
		let half = self.get_half_extents();
		(self.position - half, self.position + half)
	}
	/// Get the current state
	pub fn get_state(&self) -> AgentState {
		self.state
	}
	/// Get the clamped destination
	pub fn get_destination(&self) -> Option<Vec2> {
		self.destination
	}
	/// Get the cell of the destination
	pub fn get_destination_cell(&self) -> Option<GridCell> {
		self.destination_cell
	}
	/// Get the waypoints
	pub fn get_path(&self) -> &[Waypoint] {
		&self.path
	}
	/// Get the index of the waypoint being moved toward
	pub fn get_target_index(&self) -> usize {
		self.target_index
	}
	/// Get the waypoint being moved toward without sampling a flow field
	pub fn get_current_waypoint(&self) -> Option<&Waypoint> {
		self.path.get(self.target_index)
	}
	/// Get the flow field being followed
	pub fn get_flow_field(&self) -> Option<&Arc<FlowField>> {
		self.flow_field.as_ref()
	}
	/// Has the agent taken a detour on its current leg
	pub fn has_dodged(&self) -> bool {
		self.has_dodged
	}
	/// Get the cell the agent committed to entering
	pub fn get_committed_cell(&self) -> Option<GridCell> {
		self.committed_cell
	}
	/// Is the agent allowed to move
	pub fn is_enabled(&self) -> bool {
		self.enabled
	}
	/// Is the agent travelling, an agent that is travelling can be asked to step aside
	pub fn is_moving(&self) -> bool {
		self.enabled
			&& matches!(
				self.state,
				AgentState::Following | AgentState::Blocked | AgentState::Dodging
			)
	}
	/// Cell containing the agent
	pub fn get_current_cell(&self, grid: &Grid) -> GridCell {
		grid.cell_of(self.position)
	}
	/// Stop the agent from ever moving again
	pub fn disable(&mut self) {
		self.stop();
		self.enabled = false;
	}
	/// Drop the route and go idle where the agent stands
	pub fn stop(&mut self) {
		self.path.clear();
		self.target_index = 0;
		self.flow_field = None;
		self.committed_cell = None;
		self.state = AgentState::Idle;
	}
	/// Plan a route to a world `target`. The target is clamped so the footprint stays inside the playable area, an unreachable target leaves the agent [AgentState::Idle]
	pub fn set_destination<Q: ObstacleQuery + ?Sized>(
		&mut self,
		target: Vec2,
		ctx: &NavContext<Q>,
	) {
		if !self.enabled {
			warn!("Ignoring destination {} for a disabled agent", target);
			return;
		}
		let clamped = ctx.area.clamp_position(target, self.get_half_extents());
		if clamped != target {
			trace!("Destination {} clamped to {}", target, clamped);
		}
		self.destination = Some(clamped);
		self.destination_cell = Some(ctx.grid.cell_of(clamped));
		self.flow_field = None;
		self.state = AgentState::Replanning;
		self.plan(ctx);
	}
	/// Follow a shared [FlowField] toward its goal. A field without a goal leaves the agent [AgentState::Idle]
	pub fn apply_flow_field(&mut self, field: Arc<FlowField>) {
		if !self.enabled {
			warn!("Ignoring flow field for a disabled agent");
			return;
		}
		self.stop();
		self.has_dodged = false;
		self.destination_cell = field.get_goal();
		self.destination = field
			.get_goal()
			.map(|goal| field.get_grid().world_centre_of(goal));
		if field.is_generated() {
			self.flow_field = Some(field);
			self.state = AgentState::Following;
		} else {
			debug!("Flow field has no goal, agent stays idle");
		}
	}
	/// Recalculate the route from the current cell, a flow field agent switches to a private path toward the goal of the field
	pub fn replan<Q: ObstacleQuery + ?Sized>(&mut self, ctx: &NavContext<Q>) {
		if let Some(field) = self.flow_field.take() {
			if let Some(goal) = field.get_goal() {
				self.destination_cell = Some(ctx.grid.cell_of(field.get_grid().world_centre_of(goal)));
			}
		}
		debug!("Replanning toward {:?}", self.destination_cell);
		self.plan(ctx);
	}
	/// Request a replan at the start of the next update
	pub(crate) fn request_replan(&mut self) {
		self.committed_cell = None;
		self.state = AgentState::Replanning;
	}
	/// Mark the agent as unable to move this tick
	pub(crate) fn set_blocked(&mut self) {
		self.state = AgentState::Blocked;
	}
	/// Record the cell being entered
	pub(crate) fn commit(&mut self, cell: GridCell) {
		self.committed_cell = Some(cell);
	}
	/// Run the [Pathfinder] from the current cell to the destination cell
	fn plan<Q: ObstacleQuery + ?Sized>(&mut self, ctx: &NavContext<Q>) {
		self.path.clear();
		self.target_index = 0;
		self.has_dodged = false;
		self.committed_cell = None;
		let Some(goal) = self.destination_cell else {
			self.state = AgentState::Idle;
			return;
		};
		let start = self.get_current_cell(ctx.grid);
		let occupancy = Occupancy::new(ctx.grid, self.get_half_extents(), ctx.obstacles)
			.with_shrink(self.settings.get_overlap_shrink());
		let cells = Pathfinder::from_occupancy(occupancy, ctx.area).find_path(start, goal);
		if cells.is_empty() {
			debug!("Destination {:?} is unreachable from {:?}", goal, start);
			self.state = AgentState::Idle;
			return;
		}
		self.path = cells
			.into_iter()
			.map(|cell| Waypoint::new(ctx.grid.world_centre_of(cell)))
			.collect();
		self.state = AgentState::Following;
	}
	/// Find the waypoint to move toward. In flow field mode an exhausted path is extended by sampling the field at the current cell, an agent away from the centre of that cell is first sent to the centre
	pub(crate) fn next_target(&mut self) -> Option<Waypoint> {
		if let Some(waypoint) = self.path.get(self.target_index) {
			return Some(*waypoint);
		}
		let field = self.flow_field.clone()?;
		let field_grid = field.get_grid();
		let cell = field_grid.cell_of(self.position);
		let next = field.next_cell(cell);
		if next.is_none() && field.get_goal() != Some(cell) {
			return None;
		}
		// a step toward the next cell only ever starts from a cell centre
		let centre = field_grid.world_centre_of(cell);
		let waypoint = if self.position.distance(centre) > SNAP_TOLERANCE {
			Waypoint::new(centre)
		} else {
			Waypoint::new(field_grid.world_centre_of(next?))
		};
		self.path.clear();
		self.target_index = 0;
		self.path.push(waypoint);
		Some(waypoint)
	}
	/// Waypoints are exhausted, go idle
	pub(crate) fn arrive(&mut self) {
		trace!("Agent arrived at {}", self.position);
		self.stop();
	}
	/// Move toward `waypoint` by at most `move_speed * dt`, snapping onto it when within reach. Returns `true` when the waypoint was reached
	pub(crate) fn advance(&mut self, waypoint: Waypoint, dt: f32) -> bool {
		let step = self.settings.get_move_speed() * dt.max(0.0);
		let to_target = waypoint.get_position() - self.position;
		let distance = to_target.length();
		if distance <= step.max(SNAP_TOLERANCE) {
			self.position = waypoint.get_position();
			self.target_index += 1;
			self.committed_cell = None;
			if !waypoint.is_dodge() {
				// a new leg begins
				self.has_dodged = false;
			}
			self.state = AgentState::Following;
			if self.next_target().is_none() {
				self.arrive();
			}
			true
		} else {
			self.position += to_target / distance * step;
			self.state = if waypoint.is_dodge() {
				AgentState::Dodging
			} else {
				AgentState::Following
			};
			false
		}
	}
	/// Is the `cell` blocked by a static obstacle for this agents footprint, or would the footprint leave the playable area there
	pub(crate) fn is_statically_blocked<Q: ObstacleQuery + ?Sized>(
		&self,
		cell: GridCell,
		ctx: &NavContext<Q>,
	) -> bool {
		if !ctx.area.fits(ctx.grid.world_centre_of(cell), self.get_half_extents()) {
			return true;
		}
		Occupancy::new(ctx.grid, self.get_half_extents(), ctx.obstacles)
			.with_shrink(self.settings.get_overlap_shrink())
			.is_blocked(cell)
	}
	/// Try to step one cell aside, away from the `obstruction` cell, and then carry on. Accepting inserts a detour waypoint ahead of the current one, preceded by the centre of the current cell when the agent is part way through a step.
	///
	/// The detour is the cell diagonally ahead: forward along the direction of travel plus a quarter turn, the turn flipped if it leans toward the obstruction. It is refused when the agent already took a detour on this leg, when the cell leaves the playable area, is blocked, would cut a blocked corner or is claimed by another agent this tick
	pub fn offer_dodge<Q: ObstacleQuery + ?Sized>(
		&mut self,
		id: AgentId,
		obstruction: GridCell,
		ctx: &NavContext<Q>,
		reservations: &ReservationTable,
	) -> bool {
		if !self.is_moving() || self.has_dodged {
			return false;
		}
		let Some(next) = self.next_target() else {
			return false;
		};
		let current = self.get_current_cell(ctx.grid);
		let direction = current.get_offset_to(&ctx.grid.cell_of(next.get_position()));
		if direction == IVec2::ZERO {
			return false;
		}
		let mut perpendicular = IVec2::new(-direction.y, direction.x);
		if perpendicular.dot(current.get_offset_to(&obstruction)) > 0 {
			perpendicular = -perpendicular;
		}
		// keep the detour to an adjacent cell when travelling diagonally
		let step = (direction + perpendicular).signum();
		let ordinal = match Ordinal::from_offset(step) {
			Some(Ordinal::Zero) | None => return false,
			Some(ordinal) => ordinal,
		};
		let occupancy = Occupancy::new(ctx.grid, self.get_half_extents(), ctx.obstacles)
			.with_shrink(self.settings.get_overlap_shrink());
		if !Pathfinder::from_occupancy(occupancy, ctx.area).can_step(current, ordinal) {
			return false;
		}
		let candidate = current.get_neighbour(ordinal);
		if reservations.is_claimed_by_other(candidate, id) {
			return false;
		}
		if self.flow_field.is_some() {
			// resample the field once the detour is done
			self.path.truncate(self.target_index);
		}
		self.path
			.insert(self.target_index, Waypoint::dodge(ctx.grid.world_centre_of(candidate)));
		let centre = ctx.grid.world_centre_of(current);
		if self.position.distance(centre) > SNAP_TOLERANCE {
			// back onto the centre of the held cell first so the detour only sweeps the held and the detour cell
			self.path.insert(self.target_index, Waypoint::dodge(centre));
		}
		self.has_dodged = true;
		self.committed_cell = None;
		self.state = AgentState::Dodging;
		debug!("Agent {:?} steps aside to {:?}", id, candidate);
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	/// A 10x10 open world with unit cells
	fn open_world() -> (Grid, PlayableArea) {
		let grid = Grid::new(Vec2::ZERO, 1.0, 10, 10).unwrap();
		let area = PlayableArea::from_grid(&grid);
		(grid, area)
	}
	/// An agent with a unit footprint
	fn agent_at(x: f32, y: f32, speed: f32) -> AgentController {
		AgentController::new(Vec2::new(x, y), AgentSettings::new(Vec2::splat(0.5), speed))
	}
	/// A handle for an agent that isn't stored anywhere
	fn some_id() -> AgentId {
		let mut registry = AgentRegistry::default();
		registry.insert(agent_at(0.5, 0.5, 1.0))
	}

	#[test]
	fn invalid_settings_disable() {
		let agent = agent_at(0.5, 0.5, 0.0);
		assert!(!agent.is_enabled());
		let agent = AgentController::new(
			Vec2::ZERO,
			AgentSettings::new(Vec2::new(-1.0, 0.5), 1.0),
		);
		assert!(!agent.is_enabled());
	}
	#[test]
	fn disabled_ignores_destination() {
		let (grid, area) = open_world();
		let mut agent = agent_at(0.5, 0.5, 1.0);
		agent.disable();
		agent.set_destination(Vec2::new(5.5, 5.5), &NavContext::new(&grid, &area, &NoObstacles));
		assert_eq!(AgentState::Idle, agent.get_state());
		assert!(agent.get_path().is_empty());
	}
	#[test]
	fn destination_builds_path() {
		let (grid, area) = open_world();
		let mut agent = agent_at(0.5, 0.5, 1.0);
		agent.set_destination(Vec2::new(3.2, 0.7), &NavContext::new(&grid, &area, &NoObstacles));
		assert_eq!(AgentState::Following, agent.get_state());
		let result: Vec<Vec2> = agent.get_path().iter().map(|w| w.get_position()).collect();
		let actual = vec![
			Vec2::new(0.5, 0.5),
			Vec2::new(1.5, 0.5),
			Vec2::new(2.5, 0.5),
			Vec2::new(3.5, 0.5),
		];
		assert_eq!(actual, result);
		assert_eq!(Some(GridCell::new(3, 0)), agent.get_destination_cell());
	}
	#[test]
	fn destination_is_clamped() {
		let (grid, area) = open_world();
		let mut agent = agent_at(0.5, 0.5, 1.0);
		agent.set_destination(Vec2::new(-40.0, 99.0), &NavContext::new(&grid, &area, &NoObstacles));
		assert_eq!(Some(Vec2::new(0.5, 9.5)), agent.get_destination());
		assert_eq!(Some(GridCell::new(0, 9)), agent.get_destination_cell());
		assert_eq!(AgentState::Following, agent.get_state());
	}
	#[test]
	fn unreachable_destination_is_idle() {
		let map = ObstacleMap::from_ascii(Vec2::ZERO, 1.0, &[".#.", ".#.", ".#."]).unwrap();
		let grid = *map.get_grid();
		let area = PlayableArea::from_grid(&grid);
		let mut agent = agent_at(0.5, 0.5, 1.0);
		agent.set_destination(Vec2::new(2.5, 2.5), &NavContext::new(&grid, &area, &map));
		assert_eq!(AgentState::Idle, agent.get_state());
		assert!(agent.get_path().is_empty());
	}
	#[test]
	fn advance_never_overshoots() {
		let mut agent = agent_at(0.5, 0.5, 2.0);
		let waypoint = Waypoint::new(Vec2::new(1.5, 0.5));
		agent.path = vec![Waypoint::new(Vec2::new(0.5, 0.5)), waypoint];
		agent.target_index = 1;
		agent.state = AgentState::Following;
		assert!(!agent.advance(waypoint, 0.25));
		assert_eq!(Vec2::new(1.0, 0.5), agent.get_position());
		// a large step snaps exactly onto the waypoint
		assert!(agent.advance(waypoint, 10.0));
		assert_eq!(Vec2::new(1.5, 0.5), agent.get_position());
		assert_eq!(AgentState::Idle, agent.get_state());
	}
	#[test]
	fn advance_snaps_within_tolerance() {
		let mut agent = agent_at(0.5, 0.5, 1.0);
		let waypoint = Waypoint::new(Vec2::new(0.505, 0.5));
		agent.path = vec![waypoint, Waypoint::new(Vec2::new(1.5, 0.5))];
		agent.state = AgentState::Following;
		assert!(agent.advance(waypoint, 0.0));
		assert_eq!(Vec2::new(0.505, 0.5), agent.get_position());
		assert_eq!(1, agent.get_target_index());
		assert_eq!(AgentState::Following, agent.get_state());
	}
	#[test]
	fn regular_waypoint_resets_dodge() {
		let mut agent = agent_at(0.5, 0.5, 10.0);
		let dodge = Waypoint::dodge(Vec2::new(1.5, 1.5));
		let regular = Waypoint::new(Vec2::new(2.5, 1.5));
		agent.path = vec![dodge, regular, Waypoint::new(Vec2::new(3.5, 1.5))];
		agent.has_dodged = true;
		agent.state = AgentState::Dodging;
		assert!(agent.advance(dodge, 1.0));
		assert!(agent.has_dodged());
		assert!(agent.advance(regular, 1.0));
		assert!(!agent.has_dodged());
	}
	#[test]
	fn flow_field_sampling() {
		let (grid, _) = open_world();
		let field = Arc::new(FlowField::generate_on_grid(&grid, GridCell::new(3, 0)));
		let mut agent = agent_at(0.5, 0.5, 1.0);
		agent.apply_flow_field(field);
		assert_eq!(AgentState::Following, agent.get_state());
		assert_eq!(Some(Vec2::new(3.5, 0.5)), agent.get_destination());
		let result = agent.next_target().map(|w| w.get_position());
		assert_eq!(Some(Vec2::new(1.5, 0.5)), result);
	}
	#[test]
	fn flow_field_settles_on_goal_centre() {
		let (grid, _) = open_world();
		let field = Arc::new(FlowField::generate_on_grid(&grid, GridCell::new(3, 0)));
		let mut agent = agent_at(3.2, 0.3, 1.0);
		agent.apply_flow_field(field);
		let result = agent.next_target().map(|w| w.get_position());
		assert_eq!(Some(Vec2::new(3.5, 0.5)), result);
		let waypoint = agent.next_target().unwrap();
		assert!(agent.advance(waypoint, 1.0));
		assert_eq!(AgentState::Idle, agent.get_state());
		assert!(agent.get_flow_field().is_none());
	}
	#[test]
	fn empty_flow_field_is_idle() {
		let mut agent = agent_at(0.5, 0.5, 1.0);
		agent.apply_flow_field(Arc::new(FlowField::default()));
		assert_eq!(AgentState::Idle, agent.get_state());
	}
	#[test]
	fn replan_from_flow_field_uses_path() {
		let (grid, area) = open_world();
		let field = Arc::new(FlowField::generate_on_grid(&grid, GridCell::new(6, 6)));
		let mut agent = agent_at(0.5, 0.5, 1.0);
		agent.apply_flow_field(field);
		agent.request_replan();
		agent.replan(&NavContext::new(&grid, &area, &NoObstacles));
		assert!(agent.get_flow_field().is_none());
		assert_eq!(AgentState::Following, agent.get_state());
		assert_eq!(7, agent.get_path().len());
		assert_eq!(Some(GridCell::new(6, 6)), agent.get_destination_cell());
	}
	#[test]
	fn dodge_turns_away_from_obstruction() {
		let (grid, area) = open_world();
		let ctx = NavContext::new(&grid, &area, &NoObstacles);
		let mut agent = agent_at(4.5, 5.5, 1.0);
		agent.set_destination(Vec2::new(7.5, 5.5), &ctx);
		// step onto the first waypoint so the next target is the cell to the east
		let first = agent.next_target().unwrap();
		agent.advance(first, 0.1);
		// an obstruction to the north-east pushes the detour to the south-east
		let accepted = agent.offer_dodge(
			some_id(),
			GridCell::new(5, 6),
			&ctx,
			&ReservationTable::default(),
		);
		assert!(accepted);
		assert_eq!(AgentState::Dodging, agent.get_state());
		assert!(agent.has_dodged());
		let detour = agent.get_current_waypoint().unwrap();
		assert!(detour.is_dodge());
		assert_eq!(Vec2::new(5.5, 4.5), detour.get_position());
	}
	#[test]
	fn dodge_mid_step_returns_to_cell_centre() {
		let (grid, area) = open_world();
		let ctx = NavContext::new(&grid, &area, &NoObstacles);
		let mut agent = agent_at(4.5, 5.5, 1.0);
		agent.set_destination(Vec2::new(7.5, 5.5), &ctx);
		let first = agent.next_target().unwrap();
		agent.advance(first, 0.1);
		// part way toward the cell to the east
		let second = agent.next_target().unwrap();
		assert!(!agent.advance(second, 0.3));
		assert!(agent.get_position().distance(Vec2::new(4.8, 5.5)) < 1e-4);
		let accepted = agent.offer_dodge(
			some_id(),
			GridCell::new(5, 6),
			&ctx,
			&ReservationTable::default(),
		);
		assert!(accepted);
		let centre = agent.next_target().unwrap();
		assert!(centre.is_dodge());
		assert_eq!(Vec2::new(4.5, 5.5), centre.get_position());
		assert!(agent.advance(centre, 1.0));
		let detour = agent.next_target().unwrap();
		assert!(detour.is_dodge());
		assert_eq!(Vec2::new(5.5, 4.5), detour.get_position());
	}
	#[test]
	fn flow_field_starts_from_cell_centre() {
		let (grid, _) = open_world();
		let field = Arc::new(FlowField::generate_on_grid(&grid, GridCell::new(3, 3)));
		let mut agent = agent_at(0.9, 0.2, 1.0);
		agent.apply_flow_field(field);
		let centre = agent.next_target().unwrap();
		assert_eq!(Vec2::new(0.5, 0.5), centre.get_position());
		assert!(agent.advance(centre, 1.0));
		let result = agent.next_target().map(|w| w.get_position());
		assert_eq!(Some(Vec2::new(1.5, 1.5)), result);
	}
	#[test]
	fn dodge_only_once_per_leg() {
		let (grid, area) = open_world();
		let ctx = NavContext::new(&grid, &area, &NoObstacles);
		let mut agent = agent_at(4.5, 5.5, 1.0);
		agent.set_destination(Vec2::new(7.5, 5.5), &ctx);
		let first = agent.next_target().unwrap();
		agent.advance(first, 0.1);
		let table = ReservationTable::default();
		assert!(agent.offer_dodge(some_id(), GridCell::new(5, 5), &ctx, &table));
		assert!(!agent.offer_dodge(some_id(), GridCell::new(5, 5), &ctx, &table));
	}
	#[test]
	fn dodge_refused_into_wall() {
		#[rustfmt::skip]
		let map = ObstacleMap::from_ascii(Vec2::ZERO, 1.0, &[
			"....",
			"....",
			".#..",
		]).unwrap();
		let grid = *map.get_grid();
		let area = PlayableArea::from_grid(&grid);
		let ctx = NavContext::new(&grid, &area, &map);
		let mut agent = agent_at(0.5, 1.5, 1.0);
		agent.set_destination(Vec2::new(3.5, 1.5), &ctx);
		let first = agent.next_target().unwrap();
		agent.advance(first, 0.1);
		// obstruction to the north forces the detour south-east, straight into the wall
		let accepted =
			agent.offer_dodge(some_id(), GridCell::new(1, 2), &ctx, &ReservationTable::default());
		assert!(!accepted);
		assert!(!agent.has_dodged());
	}
	#[test]
	fn dodge_refused_into_claimed_cell() {
		let (grid, area) = open_world();
		let ctx = NavContext::new(&grid, &area, &NoObstacles);
		let mut registry = AgentRegistry::default();
		let me = registry.insert(agent_at(4.5, 5.5, 1.0));
		let other = registry.insert(agent_at(9.5, 9.5, 1.0));
		let mut agent = agent_at(4.5, 5.5, 1.0);
		agent.set_destination(Vec2::new(7.5, 5.5), &ctx);
		let first = agent.next_target().unwrap();
		agent.advance(first, 0.1);
		let mut table = ReservationTable::default();
		table.try_claim(GridCell::new(5, 6), other);
		// obstruction straight ahead leaves the turn to the north which is claimed
		let accepted = agent.offer_dodge(me, GridCell::new(5, 5), &ctx, &table);
		assert!(!accepted);
	}
}
