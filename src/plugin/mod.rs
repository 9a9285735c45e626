//! Defines the Bevy [Plugin] for grid navigation.
//!
//! Entities carrying a [NavigationAgent] component are registered with the
//! [Simulation] resource, move orders arrive as events and the simulation is
//! stepped on the fixed timestep with the resulting positions written back to
//! each entities [Transform].
//!
//! The [Simulation] is built at startup from a [NavigationConfig] resource
//! which must be inserted by the host. Static obstacles are read from an
//! optional [ObstacleMap] resource.
//!

use crate::prelude::*;
use bevy::prelude::*;

pub mod agent_layer;
pub mod order_layer;

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum OrderingSet {
	/// Track agents spawned or despawned
	Register,
	/// Turn move orders into routes
	Orders,
	/// Step the simulation
	Tick,
	/// Copy positions back onto entities
	Sync,
}

pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
	#[cfg(not(tarpaulin_include))]
	fn build(&self, app: &mut App) {
		app.register_type::<Ordinal>()
			.register_type::<GridCell>()
			.register_type::<Grid>()
			.register_type::<PlayableArea>()
			.register_type::<Tile>()
			.register_type::<AgentId>()
			.register_type::<AgentSettings>()
			.register_type::<AgentState>()
			.register_type::<NavigationAgent>()
			.init_resource::<AgentEntities>()
			.add_event::<order_layer::EventMoveOrder>()
			.add_event::<order_layer::EventGroupMoveOrder>()
			.add_systems(Startup, agent_layer::setup_simulation)
			.configure_sets(Update, (OrderingSet::Register, OrderingSet::Orders).chain())
			.configure_sets(FixedUpdate, (OrderingSet::Tick, OrderingSet::Sync).chain())
			.add_systems(
				Update,
				(
					(agent_layer::register_agents, agent_layer::remove_agents)
						.chain()
						.in_set(OrderingSet::Register),
					(
						order_layer::process_move_orders,
						order_layer::process_group_move_orders,
					)
						.chain()
						.in_set(OrderingSet::Orders),
				),
			)
			.add_systems(
				FixedUpdate,
				(
					agent_layer::tick_simulation.in_set(OrderingSet::Tick),
					agent_layer::sync_transforms.in_set(OrderingSet::Sync),
				),
			);
	}
}

/// Static obstacles to plan around, an [ObstacleMap] when the host provides one
pub(crate) fn static_obstacles(map: Option<&ObstacleMap>) -> &dyn ObstacleQuery {
	match map {
		Some(map) => map,
		None => &NoObstacles,
	}
}
