//! Vehicles and the generator that hands out their ids

use rand::Rng;
use std::ops::RangeInclusive;

use super::config::validate_speed_range;
use super::types::{Color, Position, VehicleId};
use crate::error::Result;

/// A vehicle moving through the network
#[derive(Debug, Clone, PartialEq)]
pub struct SimVehicle {
    pub id: VehicleId,
    pub color: Color,
    /// Furthest the vehicle may travel in one tick
    pub max_speed: f64,
    pub position: Position,
}

impl SimVehicle {
    pub fn new(id: VehicleId, color: Color, max_speed: f64, position: Position) -> Self {
        Self {
            id,
            color,
            max_speed,
            position,
        }
    }

    pub fn move_to(&mut self, position: Position) {
        self.position = position;
    }
}

/// Creates vehicles with unique ids, random colours and random top speeds.
///
/// Owned by the engine so separate simulations never share an id sequence.
#[derive(Debug, Clone)]
pub struct VehicleSpawner {
    next_id: u64,
    speed_range: RangeInclusive<f64>,
}

impl VehicleSpawner {
    /// Fails unless `speed_range` is finite, non-negative and ordered
    pub fn new(speed_range: RangeInclusive<f64>) -> Result<Self> {
        validate_speed_range(&speed_range)?;
        Ok(Self {
            next_id: 1,
            speed_range,
        })
    }

    fn next_vehicle_id(&mut self) -> VehicleId {
        let id = VehicleId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Number of vehicles created so far
    pub fn spawned(&self) -> u64 {
        self.next_id - 1
    }

    /// A new vehicle at `position` with a top speed drawn from the range
    pub fn spawn<R: Rng>(&mut self, position: Position, rng: &mut R) -> SimVehicle {
        let max_speed = rng.random_range(self.speed_range.clone());
        self.spawn_with_speed(position, max_speed, rng)
    }

    /// A new vehicle at `position` with a fixed top speed
    pub fn spawn_with_speed<R: Rng>(
        &mut self,
        position: Position,
        max_speed: f64,
        rng: &mut R,
    ) -> SimVehicle {
        let color = Color::new(rng.random(), rng.random(), rng.random());
        SimVehicle::new(self.next_vehicle_id(), color, max_speed, position)
    }
}
