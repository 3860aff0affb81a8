//! Core types for the traffic simulation
//!
//! Ids, positions and the constants shared by roads, intersections and
//! the engine.

use std::fmt;

use crate::network::{Direction, Node};

/// Index of a road in the engine's road arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoadId(pub usize);

/// Index of an intersection in the engine's intersection arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IntersectionId(pub usize);

/// Unique, monotonically assigned vehicle id
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VehicleId(pub u64);

/// A 2D position in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Moves `amount` along the unit vector `direction`
    pub fn advanced(&self, direction: &Position, amount: f64) -> Position {
        Position {
            x: self.x + direction.x * amount,
            y: self.y + direction.y * amount,
        }
    }
}

impl From<Node> for Position {
    fn from(node: Node) -> Self {
        Position::new(node.x as f64, node.y as f64)
    }
}

impl From<Direction> for Position {
    fn from(direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Position::new(dx as f64, dy as f64)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// RGB display colour of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Smallest clearance that keeps vehicles from colliding
pub const MIN_CLEARANCE: f64 = 6.0;

/// Chance per tick that an entry road spawns a vehicle
pub const DEFAULT_SPAWN_PROBABILITY: f64 = 0.05;

/// Default bounds of a vehicle's randomly drawn top speed
pub const DEFAULT_MIN_SPEED: f64 = 0.7;
pub const DEFAULT_MAX_SPEED: f64 = 1.3;

/// Distance under which a vehicle counts as having reached a road's end
pub const ARRIVAL_TOLERANCE: f64 = 1e-6;
