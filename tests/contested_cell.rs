//! Drive agents through a simulation where their routes cross
//!

use bevy::prelude::*;
use bevy_grid_navigation_plugin::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

/// Which of the crossing agents is spawned, and so updated, first
#[derive(Clone, Copy, Debug)]
enum SpawnOrder {
	EastFirst,
	SouthFirst,
}

/// Two agents whose paths cross at cell (3, 5), one travelling east and the other south
fn crossing_simulation(order: SpawnOrder) -> (Simulation, AgentId, AgentId) {
	let config = NavigationConfig::new(Vec2::ZERO, 1.0, 10, 10);
	let mut simulation = Simulation::from_config(Some(&config)).unwrap();
	let settings = AgentSettings::new(Vec2::splat(0.45), 1.0);
	let (east, south) = match order {
		SpawnOrder::EastFirst => {
			let east = simulation.spawn_agent(Vec2::new(2.5, 5.5), settings);
			let south = simulation.spawn_agent(Vec2::new(3.5, 6.5), settings);
			(east, south)
		}
		SpawnOrder::SouthFirst => {
			let south = simulation.spawn_agent(Vec2::new(3.5, 6.5), settings);
			let east = simulation.spawn_agent(Vec2::new(2.5, 5.5), settings);
			(east, south)
		}
	};
	simulation
		.set_destination(east, Vec2::new(6.5, 5.5), &NoObstacles)
		.unwrap();
	simulation
		.set_destination(south, Vec2::new(3.5, 2.5), &NoObstacles)
		.unwrap();
	(simulation, east, south)
}

/// Positions of both agents after each of `ticks` ticks
fn run(seed: u64, ticks: usize) -> Vec<(Vec2, Vec2)> {
	let (mut simulation, east, south) = crossing_simulation(SpawnOrder::EastFirst);
	let mut rng = StdRng::seed_from_u64(seed);
	let mut positions = Vec::with_capacity(ticks);
	for _ in 0..ticks {
		simulation.tick(0.1, &NoObstacles, &mut rng);
		positions.push((
			simulation.get_agent(east).unwrap().get_position(),
			simulation.get_agent(south).unwrap().get_position(),
		));
	}
	positions
}

#[test]
fn both_reach_their_destinations() {
	for seed in 0..8 {
		let (mut simulation, east, south) = crossing_simulation(SpawnOrder::EastFirst);
		let mut rng = StdRng::seed_from_u64(seed);
		for _ in 0..400 {
			simulation.tick(0.1, &NoObstacles, &mut rng);
		}
		let east = simulation.get_agent(east).unwrap();
		let south = simulation.get_agent(south).unwrap();
		assert_eq!(AgentState::Idle, east.get_state(), "seed {}", seed);
		assert_eq!(AgentState::Idle, south.get_state(), "seed {}", seed);
		assert_eq!(Vec2::new(6.5, 5.5), east.get_position(), "seed {}", seed);
		assert_eq!(Vec2::new(3.5, 2.5), south.get_position(), "seed {}", seed);
	}
}

#[test]
fn first_claim_wins_the_crossing() {
	let (mut simulation, east, south) = crossing_simulation(SpawnOrder::EastFirst);
	let mut rng = StdRng::seed_from_u64(9);
	// the first tick settles both agents on the centre of their start cell
	simulation.tick(0.1, &NoObstacles, &mut rng);
	simulation.tick(0.1, &NoObstacles, &mut rng);
	// both wanted (3, 5), the agent updated first claimed it
	let crossing = GridCell::new(3, 5);
	assert_eq!(Some(east), simulation.get_reservations().get_claimant(crossing));
	let south = simulation.get_agent(south).unwrap();
	assert!(matches!(
		south.get_state(),
		AgentState::Blocked | AgentState::Dodging | AgentState::Replanning
	));
	assert_ne!(Some(crossing), south.get_committed_cell());
}

#[test]
fn crossing_agents_never_share_a_cell() {
	for order in [SpawnOrder::EastFirst, SpawnOrder::SouthFirst] {
		for seed in 0..8 {
			let (mut simulation, east, south) = crossing_simulation(order);
			let mut rng = StdRng::seed_from_u64(seed);
			for tick in 0..400 {
				simulation.tick(0.1, &NoObstacles, &mut rng);
				let grid = simulation.get_grid();
				let east_cell = simulation.get_agent(east).unwrap().get_current_cell(grid);
				let south_cell = simulation.get_agent(south).unwrap().get_current_cell(grid);
				assert_ne!(
					east_cell, south_cell,
					"{:?} seed {} tick {}",
					order, seed, tick
				);
			}
		}
	}
}

#[test]
fn seeded_runs_repeat() {
	let result = run(21, 200);
	let actual = run(21, 200);
	assert_eq!(actual, result);
}

#[test]
fn corridor_blocked_by_wall() {
	#[rustfmt::skip]
	let map = ObstacleMap::from_ascii(Vec2::ZERO, 1.0, &[
		"#####",
		"..#..",
		"#####",
	]).unwrap();
	let grid = *map.get_grid();
	let area = PlayableArea::from_grid(&grid);
	let mut simulation = Simulation::new(grid, area);
	let id = simulation.spawn_agent(Vec2::new(0.5, 1.5), AgentSettings::new(Vec2::splat(0.45), 1.0));
	simulation.set_destination(id, Vec2::new(4.5, 1.5), &map).unwrap();
	let agent = simulation.get_agent(id).unwrap();
	assert_eq!(AgentState::Idle, agent.get_state());
	assert!(agent.get_path().is_empty());
	let path = simulation.find_path(
		GridCell::new(0, 1),
		GridCell::new(4, 1),
		Vec2::splat(0.45),
		&map,
	);
	assert!(path.is_empty());
}
