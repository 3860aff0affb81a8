//! Discrete-time traffic simulation
//!
//! Roads carry queues of vehicles, intersections arbitrate who may enter
//! them, and the world advances everything one tick at a time. Nothing
//! here draws or reads input; a renderer or headless driver calls
//! `SimWorld::update` or `SimWorld::tick` once per frame.

mod config;
mod intersection;
mod road;
mod types;
mod vehicle;
mod world;

pub use config::SimConfig;
pub use intersection::SimIntersection;
pub use road::SimRoad;
pub use types::{
    Color, IntersectionId, Position, RoadId, VehicleId, ARRIVAL_TOLERANCE, DEFAULT_MAX_SPEED,
    DEFAULT_MIN_SPEED, DEFAULT_SPAWN_PROBABILITY, MIN_CLEARANCE,
};
pub use vehicle::{SimVehicle, VehicleSpawner};
pub use world::{SimStats, SimWorld};
