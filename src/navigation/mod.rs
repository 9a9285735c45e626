//! Grid based navigation for a crowd of agents sharing one discrete space.
//!
//! [Amit Patel - Introduction to A*](https://www.redblobgames.com/pathfinding/a-star/introduction.html)
//!
//! [leifnode](https://leifnode.com/2013/12/flow-field-pathfinding/)
//!
//! The world is a uniform [grid::Grid] of square cells indexed from the
//! bottom-left corner, columns grow along `x` and rows grow along `y`.
//!
//! ```text
//!  row
//!   3 |__|__|__|__|__|
//!   2 |__|__|__|__|__|
//!   1 |__|__|__|__|__|
//!   0 |__|__|__|__|__|
//!  origin  0  1  2  3  4  column
//! ```
//!
//! Definitions:
//!
//! * Footprint - the axis-aligned box of an agent. A cell is blocked for an agent when a solid collider overlaps its footprint centred on the cell
//! * Path - the cells an agent plans to visit, found with A* and owned by that agent alone
//! * Distance field - the cost of reaching one goal from every cell
//! * Flow field - for each cell the direction toward the neighbour closest to the goal. One field is generated per group order and shared by every agent in the group
//! * Reservation - a claim an agent makes on a cell for the duration of a tick before moving into it
//! * Dodge - a one cell detour an agent takes to get out of another agents way, at most once per leg of its route
//!
//! Agents live in a [simulation::Simulation] which steps them all forward
//! each tick and settles any fight over a cell.
//!

pub mod config;
pub mod controller;
pub mod error;
pub mod fields;
pub mod grid;
pub mod obstacle;
pub mod pathfinder;
pub mod registry;
pub mod reservation;
pub mod simulation;
pub mod utilities;
