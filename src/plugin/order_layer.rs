//! Logic turning move orders into routes for agents
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Send a single agent to a world position along its own path
#[derive(Event)]
pub struct EventMoveOrder {
	/// Entity of the agent
	agent: Entity,
	/// Where the agent should go
	target: Vec2,
}

impl EventMoveOrder {
	/// Create a new instance of [EventMoveOrder]
	pub fn new(agent: Entity, target: Vec2) -> Self {
		EventMoveOrder { agent, target }
	}
	pub fn get_agent(&self) -> Entity {
		self.agent
	}
	pub fn get_target(&self) -> Vec2 {
		self.target
	}
}

/// Send a group of agents to a world position by sharing one [FlowField] between them
#[derive(Event)]
pub struct EventGroupMoveOrder {
	/// Entities of the agents
	agents: Vec<Entity>,
	/// Where the group should go
	target: Vec2,
}

impl EventGroupMoveOrder {
	/// Create a new instance of [EventGroupMoveOrder]
	pub fn new(agents: Vec<Entity>, target: Vec2) -> Self {
		EventGroupMoveOrder { agents, target }
	}
	pub fn get_agents(&self) -> &[Entity] {
		&self.agents
	}
	pub fn get_target(&self) -> Vec2 {
		self.target
	}
}

/// Process [EventMoveOrder]s, planning a path for each agent
#[cfg(not(tarpaulin_include))]
pub fn process_move_orders(
	mut events: EventReader<EventMoveOrder>,
	simulation: Option<ResMut<Simulation>>,
	entities: Res<AgentEntities>,
	map: Option<Res<ObstacleMap>>,
) {
	let Some(mut simulation) = simulation else {
		if !events.is_empty() {
			error!("{}, dropping move orders", NavError::ConfigurationMissing);
			events.clear();
		}
		return;
	};
	let obstacles = super::static_obstacles(map.as_deref());
	for event in events.read() {
		let Some(id) = entities.get(event.get_agent()) else {
			warn!("{:?} is not a registered agent, ignoring order", event.get_agent());
			continue;
		};
		if let Err(e) = simulation.set_destination(id, event.get_target(), obstacles) {
			error!("Move order for {:?} failed: {}", event.get_agent(), e);
		}
	}
}

/// Process [EventGroupMoveOrder]s, generating one [FlowField] per order
#[cfg(not(tarpaulin_include))]
pub fn process_group_move_orders(
	mut events: EventReader<EventGroupMoveOrder>,
	simulation: Option<ResMut<Simulation>>,
	entities: Res<AgentEntities>,
	map: Option<Res<ObstacleMap>>,
) {
	let Some(mut simulation) = simulation else {
		if !events.is_empty() {
			error!("{}, dropping group move orders", NavError::ConfigurationMissing);
			events.clear();
		}
		return;
	};
	let obstacles = super::static_obstacles(map.as_deref());
	for event in events.read() {
		let ids: Vec<AgentId> = event
			.get_agents()
			.iter()
			.filter_map(|entity| entities.get(*entity))
			.collect();
		if ids.len() < event.get_agents().len() {
			warn!(
				"{} entities of a group order are not registered agents",
				event.get_agents().len() - ids.len()
			);
		}
		if ids.is_empty() {
			continue;
		}
		if let Err(e) = simulation.order_group(&ids, event.get_target(), obstacles) {
			error!("Group move order failed: {}", e);
		}
	}
}
