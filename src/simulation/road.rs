//! One-way roads and their vehicle queues

use rand::Rng;
use std::collections::VecDeque;

use super::config::validate_probability;
use super::types::{IntersectionId, Position, RoadId, VehicleId};
use super::vehicle::{SimVehicle, VehicleSpawner};
use crate::error::{Error, Result};
use crate::network::Segment;

/// A directed road segment carrying a queue of vehicles.
///
/// The queue runs from the vehicle nearest the end node (front) to the one
/// nearest the start node (back). Vehicles only join at the back and leave
/// from the front.
#[derive(Debug, Clone)]
pub struct SimRoad {
    pub id: RoadId,
    pub segment: Segment,
    pub start: Position,
    pub end: Position,
    /// Unit vector from start to end
    pub direction: Position,
    clearance: f64,
    spawn_probability: f64,
    pub has_entry: bool,
    pub has_exit: bool,
    /// Where a vehicle denied entry to the intersection halts
    pub stop_line: Position,
    /// The intersection at this road's end node
    pub intersection: IntersectionId,
    vehicles: VecDeque<SimVehicle>,
}

impl SimRoad {
    /// Fails on a non-positive clearance, an out-of-range probability, a
    /// diagonal or null segment, or a road no longer than its clearance.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: RoadId,
        segment: Segment,
        intersection: IntersectionId,
        clearance: f64,
        spawn_probability: f64,
        has_entry: bool,
        has_exit: bool,
    ) -> Result<Self> {
        if clearance.is_nan() || clearance <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "clearance must be positive, got {clearance}"
            )));
        }
        validate_probability(spawn_probability)?;

        let direction = Position::from(segment.direction()?);
        let start = Position::from(segment.start);
        let end = Position::from(segment.end);
        if start.distance(&end) <= clearance {
            return Err(Error::InvalidParameter(format!(
                "road {segment} must be longer than the clearance {clearance}"
            )));
        }

        Ok(Self {
            id,
            segment,
            start,
            end,
            direction,
            clearance,
            spawn_probability,
            has_entry,
            has_exit,
            stop_line: end.advanced(&direction, -clearance),
            intersection,
            vehicles: VecDeque::new(),
        })
    }

    pub fn clearance(&self) -> f64 {
        self.clearance
    }

    /// Chance per tick that this road spawns a vehicle, if it has an entry
    pub fn spawn_probability(&self) -> f64 {
        self.spawn_probability
    }

    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }

    /// Vehicles from front (nearest the end) to back
    pub fn vehicles(&self) -> &VecDeque<SimVehicle> {
        &self.vehicles
    }

    pub(crate) fn vehicles_mut(&mut self) -> &mut VecDeque<SimVehicle> {
        &mut self.vehicles
    }

    pub fn front(&self) -> Option<&SimVehicle> {
        self.vehicles.front()
    }

    pub fn back(&self) -> Option<&SimVehicle> {
        self.vehicles.back()
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn enqueue_at_back(&mut self, vehicle: SimVehicle) {
        self.vehicles.push_back(vehicle);
    }

    /// Removes the vehicle nearest the end node, if any
    pub fn dequeue_front(&mut self) -> Option<SimVehicle> {
        self.vehicles.pop_front()
    }

    pub fn distance_to_end(&self, position: &Position) -> f64 {
        position.distance(&self.end)
    }

    /// On an entry road whose spawn point is clear, spawns a vehicle at the
    /// start node with probability `spawn_probability`.
    pub fn try_spawn<R: Rng>(&mut self, rng: &mut R, spawner: &mut VehicleSpawner) -> Option<VehicleId> {
        if !self.has_entry {
            return None;
        }
        let spawn_point_clear = match self.back() {
            Some(last) => last.position.distance(&self.start) >= self.clearance,
            None => true,
        };
        if !spawn_point_clear || !rng.random_bool(self.spawn_probability) {
            return None;
        }

        let vehicle = spawner.spawn(self.start, rng);
        let id = vehicle.id;
        self.enqueue_at_back(vehicle);
        Some(id)
    }
}
