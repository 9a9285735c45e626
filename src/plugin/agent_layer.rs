//! Logic tying entities to agents of the [Simulation] and stepping it forward
//!

use std::collections::HashMap;

use crate::prelude::*;
use bevy::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

/// Marks an entity as a navigating agent, its [Transform] translation is the centre of the footprint
#[derive(Component, Clone, Debug, Reflect)]
pub struct NavigationAgent {
	/// Footprint and speed
	settings: AgentSettings,
	/// Handle within the [Simulation] once registered
	id: Option<AgentId>,
	/// Set when the agent could not be registered, it will never move
	disabled: bool,
}

impl NavigationAgent {
	/// Create a new instance of [NavigationAgent]
	pub fn new(settings: AgentSettings) -> Self {
		NavigationAgent {
			settings,
			id: None,
			disabled: false,
		}
	}
	pub fn get_settings(&self) -> &AgentSettings {
		&self.settings
	}
	pub fn get_id(&self) -> Option<AgentId> {
		self.id
	}
	pub fn is_disabled(&self) -> bool {
		self.disabled
	}
}

/// Lookup of the [AgentId] of every registered entity
#[derive(Resource, Default, Debug)]
pub struct AgentEntities(HashMap<Entity, AgentId>);

impl AgentEntities {
	/// Get the handle of an entity
	pub fn get(&self, entity: Entity) -> Option<AgentId> {
		self.0.get(&entity).copied()
	}
	/// Number of registered entities
	pub fn len(&self) -> usize {
		self.0.len()
	}
	/// Are there no registered entities
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

/// Source of the coin toss deciding which of two agents steps aside
#[derive(Resource)]
pub struct NavigationRng(StdRng);

impl NavigationRng {
	/// Create a generator, seeded for reproducible runs or from the operating system
	pub fn new(seed: Option<u64>) -> Self {
		match seed {
			Some(seed) => NavigationRng(StdRng::seed_from_u64(seed)),
			None => NavigationRng(StdRng::from_os_rng()),
		}
	}
}

/// Build the [Simulation] from the [NavigationConfig]
#[cfg(not(tarpaulin_include))]
pub fn setup_simulation(mut commands: Commands, config: Option<Res<NavigationConfig>>) {
	match Simulation::from_config(config.as_deref()) {
		Ok(simulation) => {
			let grid = simulation.get_grid();
			debug!(
				"Navigation grid of {}x{} cells created at {}",
				grid.get_width(),
				grid.get_height(),
				grid.get_origin()
			);
			commands.insert_resource(NavigationRng::new(
				config.and_then(|config| config.get_seed()),
			));
			commands.insert_resource(simulation);
		}
		Err(e) => error!("Navigation is unavailable, agents will not move: {}", e),
	}
}

/// Add newly spawned [NavigationAgent]s to the [Simulation]
#[cfg(not(tarpaulin_include))]
pub fn register_agents(
	mut simulation: Option<ResMut<Simulation>>,
	mut entities: ResMut<AgentEntities>,
	mut query: Query<(Entity, &Transform, &mut NavigationAgent)>,
) {
	for (entity, transform, mut agent) in query.iter_mut() {
		if agent.id.is_some() || agent.disabled {
			continue;
		}
		match simulation.as_mut() {
			Some(simulation) => {
				let id = simulation.spawn_agent(transform.translation.truncate(), agent.settings);
				agent.id = Some(id);
				entities.0.insert(entity, id);
				trace!("Registered {:?} as {:?}", entity, id);
			}
			None => {
				error!(
					"{:?}: {}, disabling agent",
					entity,
					NavError::ConfigurationMissing
				);
				agent.disabled = true;
			}
		}
	}
}

/// Drop agents whose entity or [NavigationAgent] component has gone
#[cfg(not(tarpaulin_include))]
pub fn remove_agents(
	mut removed: RemovedComponents<NavigationAgent>,
	mut simulation: Option<ResMut<Simulation>>,
	mut entities: ResMut<AgentEntities>,
) {
	for entity in removed.read() {
		if let Some(id) = entities.0.remove(&entity) {
			if let Some(simulation) = simulation.as_mut() {
				simulation.remove_agent(id);
			}
			trace!("Removed {:?}", entity);
		}
	}
}

/// Advance every agent by the fixed timestep
#[cfg(not(tarpaulin_include))]
pub fn tick_simulation(
	time: Res<Time>,
	simulation: Option<ResMut<Simulation>>,
	rng: Option<ResMut<NavigationRng>>,
	map: Option<Res<ObstacleMap>>,
) {
	let (Some(mut simulation), Some(mut rng)) = (simulation, rng) else {
		return;
	};
	let obstacles = super::static_obstacles(map.as_deref());
	simulation.tick(time.delta_secs(), obstacles, &mut rng.0);
}

/// Write the position of each agent onto its [Transform]
#[cfg(not(tarpaulin_include))]
pub fn sync_transforms(
	simulation: Option<Res<Simulation>>,
	mut query: Query<(&NavigationAgent, &mut Transform)>,
) {
	let Some(simulation) = simulation else {
		return;
	};
	for (agent, mut transform) in query.iter_mut() {
		let Some(id) = agent.id else {
			continue;
		};
		if let Some(controller) = simulation.get_agent(id) {
			let position = controller.get_position();
			transform.translation.x = position.x;
			transform.translation.y = position.y;
		}
	}
}
