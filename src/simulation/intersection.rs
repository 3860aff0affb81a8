//! Intersection admission control
//!
//! An intersection decides, once per approaching vehicle and tick, whether
//! the vehicle may move past its road's stop line, and which outgoing road
//! a vehicle at the junction may turn onto. Decisions never fail; they only
//! answer yes/no or none.

use ordered_float::OrderedFloat;
use rand::seq::IndexedRandom;
use rand::Rng;

use super::road::SimRoad;
use super::types::{IntersectionId, Position, RoadId};
use super::vehicle::SimVehicle;
use crate::network::Node;

/// A graph node joining the roads that end and start there
#[derive(Debug, Clone)]
pub struct SimIntersection {
    pub id: IntersectionId,
    pub node: Node,
    pub position: Position,
    pub clearance: f64,
    /// Roads ending at this node
    incoming: Vec<RoadId>,
    /// Roads starting at this node
    outgoing: Vec<RoadId>,
}

impl SimIntersection {
    pub fn new(id: IntersectionId, node: Node, clearance: f64) -> Self {
        Self {
            id,
            node,
            position: Position::from(node),
            clearance,
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }

    pub fn add_incoming_road(&mut self, road: RoadId) {
        self.incoming.push(road);
    }

    pub fn add_outgoing_road(&mut self, road: RoadId) {
        self.outgoing.push(road);
    }

    pub fn incoming_roads(&self) -> &[RoadId] {
        &self.incoming
    }

    pub fn outgoing_roads(&self) -> &[RoadId] {
        &self.outgoing
    }

    pub fn distance_to(&self, vehicle: &SimVehicle) -> f64 {
        self.position.distance(&vehicle.position)
    }

    /// The vehicle nearest this intersection among the fronts of all
    /// incoming roads and `priority` itself. Ties go to `priority`.
    pub fn closest_incoming<'a>(&self, roads: &'a [SimRoad], priority: &'a SimVehicle) -> &'a SimVehicle {
        let fronts = self
            .incoming
            .iter()
            .filter_map(|id| roads.get(id.0))
            .filter_map(SimRoad::front);

        std::iter::once(priority)
            .chain(fronts)
            .min_by_key(|vehicle| OrderedFloat(self.distance_to(vehicle)))
            .unwrap_or(priority)
    }

    /// The nearest vehicle that has most recently left this intersection,
    /// i.e. the nearest back vehicle over all outgoing roads
    pub fn closest_outgoing<'a>(&self, roads: &'a [SimRoad]) -> Option<&'a SimVehicle> {
        self.outgoing
            .iter()
            .filter_map(|id| roads.get(id.0))
            .filter_map(SimRoad::back)
            .min_by_key(|vehicle| OrderedFloat(self.distance_to(vehicle)))
    }

    /// Whether `vehicle` may move past its stop line this tick.
    ///
    /// Denied while a vehicle on an outgoing road is still within the
    /// clearance of the junction, or while another incoming vehicle is
    /// strictly closer.
    pub fn can_approach(&self, roads: &[SimRoad], vehicle: &SimVehicle) -> bool {
        if let Some(leaving) = self.closest_outgoing(roads) {
            if self.distance_to(leaving) < self.clearance {
                return false;
            }
        }
        self.closest_incoming(roads, vehicle).id == vehicle.id
    }

    /// A uniformly chosen outgoing road with room for one more vehicle:
    /// either empty, or with its last vehicle at least twice the clearance
    /// from the junction.
    pub fn find_available_outgoing<R: Rng>(&self, roads: &[SimRoad], rng: &mut R) -> Option<RoadId> {
        let available: Vec<RoadId> = self
            .outgoing
            .iter()
            .filter_map(|id| roads.get(id.0))
            .filter(|road| match road.back() {
                Some(last) => self.distance_to(last) >= 2.0 * self.clearance,
                None => true,
            })
            .map(|road| road.id)
            .collect();
        available.choose(rng).copied()
    }
}
