//! Failures that can be reported back to a caller.
//!
//! Most navigation outcomes are not errors: an unreachable goal produces an
//! empty path or a zero direction, an out of bounds target is clamped and a
//! contested cell is resolved by dodging or replanning. Only configuration and
//! loading problems surface as a [NavError].
//!

use bevy::prelude::*;
use thiserror::Error;

use crate::prelude::AgentId;

/// Errors raised while configuring the navigation world or loading obstacle layouts
#[derive(Debug, Error)]
pub enum NavError {
	/// No grid or bounds configuration was provided
	#[error("no grid or bounds configuration is available")]
	ConfigurationMissing,
	/// Cells must have a positive, finite size
	#[error("cell size must be a positive finite number, got {0}")]
	InvalidCellSize(f32),
	/// A playable area must be finite
	#[error("playable area must be finite, got min {min} max {max}")]
	InvalidBounds {
		/// Lower corner supplied
		min: Vec2,
		/// Upper corner supplied
		max: Vec2,
	},
	/// The id does not refer to a live agent
	#[error("agent {0:?} is not registered")]
	UnknownAgent(AgentId),
	/// A row of an obstacle layout doesn't match the width of the first row
	#[error("obstacle layout row {row} has {found} cells, expected {expected}")]
	RaggedLayout {
		/// Index of the offending row
		row: usize,
		/// Number of cells found in the row
		found: usize,
		/// Number of cells expected from the first row
		expected: usize,
	},
	/// A character or number in an obstacle layout that doesn't describe a tile
	#[error("unrecognised obstacle tile {0:?}")]
	UnknownTile(String),
	/// Reading a file failed
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
	/// Deserializing a RON document failed
	#[cfg(feature = "ron")]
	#[error("RON error: {0}")]
	Ron(#[from] ron::error::SpannedError),
	/// Reading a CSV document failed
	#[cfg(feature = "csv")]
	#[error("CSV error: {0}")]
	Csv(#[from] csv::Error),
}

/// Convenience alias for navigation results
pub type NavResult<T> = Result<T, NavError>;
