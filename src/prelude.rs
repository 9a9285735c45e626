//! `use bevy_grid_navigation_plugin::prelude::*;` to import common structures and methods
//!

#[doc(hidden)]
pub use crate::navigation::{
	config::*,
	controller::*,
	error::*,
	fields::{distance_field::*, flow_field::*, *},
	grid::*,
	obstacle::*,
	pathfinder::*,
	registry::*,
	reservation::*,
	simulation::*,
	utilities::*,
};

#[doc(hidden)]
pub use crate::plugin::{agent_layer::*, order_layer::*, *};
