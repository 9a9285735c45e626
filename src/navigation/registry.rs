//! Arena owning every [AgentController] of a simulation.
//!
//! Agents are addressed by an [AgentId] made of a slot index and a generation.
//! Removing an agent frees its slot for reuse and bumps the generation, so a
//! stale id held by a caller never resolves to the agent that took its place.
//!

use bevy::prelude::*;

use crate::prelude::*;

/// Stable handle of an agent within an [AgentRegistry]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Reflect)]
pub struct AgentId {
	/// Slot of the agent in the arena
	index: u32,
	/// Incremented each time the slot is reused
	generation: u32,
}

impl AgentId {
	/// Get the arena slot
	pub fn get_index(&self) -> u32 {
		self.index
	}
	/// Get the generation of the slot
	pub fn get_generation(&self) -> u32 {
		self.generation
	}
}

/// A slot of the arena
#[derive(Debug, Clone)]
struct Slot {
	/// Current generation of the slot
	generation: u32,
	/// The agent living in the slot, [None] when vacant or while the agent is checked out for an update
	agent: Option<AgentController>,
}

/// Arena of agents
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
	/// All slots, live and vacant
	slots: Vec<Slot>,
	/// Indices of vacant slots available for reuse
	vacant: Vec<u32>,
	/// Number of live agents
	live: usize,
}

impl AgentRegistry {
	/// Add an agent and return its handle
	pub fn insert(&mut self, agent: AgentController) -> AgentId {
		self.live += 1;
		if let Some(index) = self.vacant.pop() {
			let slot = &mut self.slots[index as usize];
			slot.agent = Some(agent);
			AgentId {
				index,
				generation: slot.generation,
			}
		} else {
			let index = self.slots.len() as u32;
			self.slots.push(Slot {
				generation: 0,
				agent: Some(agent),
			});
			AgentId {
				index,
				generation: 0,
			}
		}
	}
	/// Remove an agent, returning it if the handle was live
	pub fn remove(&mut self, id: AgentId) -> Option<AgentController> {
		let slot = self.slots.get_mut(id.index as usize)?;
		if slot.generation != id.generation {
			return None;
		}
		let agent = slot.agent.take()?;
		slot.generation = slot.generation.wrapping_add(1);
		self.vacant.push(id.index);
		self.live -= 1;
		Some(agent)
	}
	/// Does the handle refer to a live agent
	pub fn contains(&self, id: AgentId) -> bool {
		self.get(id).is_some()
	}
	/// Get an agent
	pub fn get(&self, id: AgentId) -> Option<&AgentController> {
		self.slots
			.get(id.index as usize)
			.filter(|slot| slot.generation == id.generation)
			.and_then(|slot| slot.agent.as_ref())
	}
	/// Get an agent mutably
	pub fn get_mut(&mut self, id: AgentId) -> Option<&mut AgentController> {
		self.slots
			.get_mut(id.index as usize)
			.filter(|slot| slot.generation == id.generation)
			.and_then(|slot| slot.agent.as_mut())
	}
	/// Number of live agents
	pub fn len(&self) -> usize {
		self.live
	}
	/// Are there no live agents
	pub fn is_empty(&self) -> bool {
		self.live == 0
	}
	/// Handles of every live agent in slot order
	pub fn ids(&self) -> Vec<AgentId> {
		self.iter().map(|(id, _)| id).collect()
	}
	/// Iterate over live agents in slot order
	pub fn iter(&self) -> impl Iterator<Item = (AgentId, &AgentController)> {
		self.slots.iter().enumerate().filter_map(|(i, slot)| {
			slot.agent.as_ref().map(|agent| {
				(
					AgentId {
						index: i as u32,
						generation: slot.generation,
					},
					agent,
				)
			})
		})
	}
	/// Temporarily take an agent out of its slot so it can be updated while the rest of the registry is borrowed. It must be handed back with [AgentRegistry::check_in]
	pub(crate) fn check_out(&mut self, id: AgentId) -> Option<AgentController> {
		self.slots
			.get_mut(id.index as usize)
			.filter(|slot| slot.generation == id.generation)
			.and_then(|slot| slot.agent.take())
	}
	/// Return an agent taken with [AgentRegistry::check_out]
	pub(crate) fn check_in(&mut self, id: AgentId, agent: AgentController) {
		match self.slots.get_mut(id.index as usize) {
			Some(slot) if slot.generation == id.generation => slot.agent = Some(agent),
			_ => error!("Cannot check in {:?}, its slot has been reused", id),
		}
	}
}

impl ObstacleQuery for AgentRegistry {
	/// Every live agent footprint is a solid collider
	fn overlaps(&self, centre: Vec2, size: Vec2) -> Vec<ColliderHit> {
		let low = centre - size * 0.5;
		let high = centre + size * 0.5;
		self.iter()
			.filter(|(_, agent)| {
				let (agent_low, agent_high) = agent.get_bounds();
				low.x < agent_high.x
					&& high.x > agent_low.x
					&& low.y < agent_high.y
					&& high.y > agent_low.y
			})
			.map(|_| ColliderHit::solid())
			.collect()
	}
}

/// Static obstacles combined with the footprints of the agents in a registry
pub struct CrowdObstacles<'a, Q: ObstacleQuery + ?Sized> {
	/// The static collision world
	statics: &'a Q,
	/// Agents treated as dynamic obstacles
	agents: &'a AgentRegistry,
}

impl<'a, Q: ObstacleQuery + ?Sized> CrowdObstacles<'a, Q> {
	/// Combine `statics` with every agent currently in `agents`
	pub fn new(statics: &'a Q, agents: &'a AgentRegistry) -> Self {
		CrowdObstacles { statics, agents }
	}
}

impl<Q: ObstacleQuery + ?Sized> ObstacleQuery for CrowdObstacles<'_, Q> {
	fn overlaps(&self, centre: Vec2, size: Vec2) -> Vec<ColliderHit> {
		let mut hits = self.statics.overlaps(centre, size);
		hits.extend(self.agents.overlaps(centre, size));
		hits
	}
	fn is_occupied(&self, centre: Vec2, size: Vec2) -> bool {
		self.statics.is_occupied(centre, size) || self.agents.is_occupied(centre, size)
	}
}
