//! This is a plugin for Bevy game engine to move crowds of agents around a grid based world without them overlapping, cutting corners or locking each other in place
//!

pub mod navigation;
pub mod plugin;

pub mod prelude;
