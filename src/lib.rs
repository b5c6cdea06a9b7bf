//! gridbump: grid-bucketed occupancy testing and discrete movement resolution
//!
//! A broad-phase uniform grid over two populations (mobile entities and baked
//! tile geometry), an exact narrow phase over a closed five-shape vocabulary,
//! hypothetical-position occupancy queries with group/kind filtering, and
//! stepwise movement resolution (axis-separated sliding, directional sweeps,
//! seek-with-avoidance).

pub mod types;
pub mod api;
pub mod shape;
pub mod narrowphase;
pub mod grid;
pub mod world;
pub mod motion;

pub use crate::api::*;
pub use crate::motion::AvoidBias;
pub use crate::types::*;
pub use crate::world::{CollisionWorld, Entity, Tile};
