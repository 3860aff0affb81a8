//! Main simulation world that ties everything together
//!
//! The world owns every road and intersection in two arenas and refers
//! across them by index. It is advanced one tick at a time by an external
//! driver, headless or otherwise.

use log::{info, trace};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

use super::config::SimConfig;
use super::intersection::SimIntersection;
use super::road::SimRoad;
use super::types::{Color, IntersectionId, Position, RoadId, VehicleId, ARRIVAL_TOLERANCE};
use super::vehicle::{SimVehicle, VehicleSpawner};
use crate::error::{Error, Result};
use crate::network::{Node, RoadGraph, RoadNetwork, Segment};

/// Widest map `draw_map` renders, in characters
const MAP_WIDTH: usize = 72;

/// Running totals over the life of a simulation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimStats {
    pub ticks: u64,
    pub vehicles_spawned: u64,
    pub vehicles_exited: u64,
    /// Moves from one road onto another through an intersection
    pub vehicles_transferred: u64,
}

/// The main simulation world
pub struct SimWorld {
    /// All roads, indexed by `RoadId`
    roads: Vec<SimRoad>,

    /// All intersections, indexed by `IntersectionId`
    intersections: Vec<SimIntersection>,

    /// Maps graph nodes to their intersection
    node_to_intersection: BTreeMap<Node, IntersectionId>,

    /// Roads starting at an entry gate
    entry_roads: Vec<RoadId>,

    spawner: VehicleSpawner,

    config: SimConfig,

    /// Drives road order, outgoing road choice and spawn draws
    rng: StdRng,

    pub stats: SimStats,
}

impl SimWorld {
    /// Builds roads and intersections from a directed graph and its gates,
    /// drawing randomness from `rng`.
    ///
    /// Fails on invalid parameters, and on any road that is diagonal or
    /// shorter than twice the clearance.
    pub fn with_rng(
        graph: &RoadGraph,
        entry_gates: &[Node],
        exit_gates: &[Node],
        config: SimConfig,
        rng: StdRng,
    ) -> Result<Self> {
        config.validate()?;

        let mut intersections = Vec::with_capacity(graph.node_count());
        let mut node_to_intersection = BTreeMap::new();
        for node in graph.nodes() {
            let id = IntersectionId(intersections.len());
            intersections.push(SimIntersection::new(id, node, config.clearance));
            node_to_intersection.insert(node, id);
        }

        let mut roads = Vec::with_capacity(graph.edge_count());
        let mut entry_roads = Vec::new();
        for (start, _, end) in graph.edges() {
            let segment = Segment::new(start, end);
            segment.direction()?;
            if (segment.length() as f64) < 2.0 * config.clearance {
                return Err(Error::InvalidParameter(format!(
                    "road {segment} must be at least twice the clearance {} long",
                    config.clearance
                )));
            }

            let (Some(&from), Some(&to)) = (node_to_intersection.get(&start), node_to_intersection.get(&end))
            else {
                return Err(Error::InvalidParameter(format!(
                    "road {segment} references a node outside the graph"
                )));
            };

            let id = RoadId(roads.len());
            let road = SimRoad::new(
                id,
                segment,
                to,
                config.clearance,
                config.spawn_probability,
                entry_gates.contains(&start),
                exit_gates.contains(&end),
            )?;

            intersections[to.0].add_incoming_road(id);
            intersections[from.0].add_outgoing_road(id);
            if road.has_entry {
                entry_roads.push(id);
            }
            roads.push(road);
        }

        info!(
            "simulation ready: {} roads ({} entry), {} intersections, clearance {}, spawn probability {}",
            roads.len(),
            entry_roads.len(),
            intersections.len(),
            config.clearance,
            config.spawn_probability
        );

        Ok(Self {
            roads,
            intersections,
            node_to_intersection,
            entry_roads,
            spawner: VehicleSpawner::new(config.speed_range.clone())?,
            config,
            rng,
            stats: SimStats::default(),
        })
    }

    /// Like `with_rng`, seeded from the operating system
    pub fn new(graph: &RoadGraph, entry_gates: &[Node], exit_gates: &[Node], config: SimConfig) -> Result<Self> {
        Self::with_rng(graph, entry_gates, exit_gates, config, StdRng::from_os_rng())
    }

    /// Create a world with a seeded RNG for reproducible simulations
    pub fn new_with_seed(
        graph: &RoadGraph,
        entry_gates: &[Node],
        exit_gates: &[Node],
        config: SimConfig,
        seed: u64,
    ) -> Result<Self> {
        Self::with_rng(graph, entry_gates, exit_gates, config, StdRng::seed_from_u64(seed))
    }

    /// Builds a world over a validated network and its derived gates
    pub fn from_network(network: &RoadNetwork, config: SimConfig, seed: Option<u64>) -> Result<Self> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(network.graph(), network.entry_gates(), network.exit_gates(), config, rng)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn roads(&self) -> &[SimRoad] {
        &self.roads
    }

    pub fn road(&self, id: RoadId) -> Option<&SimRoad> {
        self.roads.get(id.0)
    }

    pub fn intersections(&self) -> &[SimIntersection] {
        &self.intersections
    }

    pub fn intersection(&self, id: IntersectionId) -> Option<&SimIntersection> {
        self.intersections.get(id.0)
    }

    pub fn intersection_at(&self, node: Node) -> Option<&SimIntersection> {
        self.node_to_intersection
            .get(&node)
            .and_then(|id| self.intersections.get(id.0))
    }

    /// Finds the road running from `start` to `end`
    pub fn road_between(&self, start: Node, end: Node) -> Option<RoadId> {
        self.roads
            .iter()
            .find(|road| road.segment == Segment::new(start, end))
            .map(|road| road.id)
    }

    /// All vehicles currently on the network, road by road
    pub fn vehicles(&self) -> impl Iterator<Item = &SimVehicle> + '_ {
        self.roads.iter().flat_map(|road| road.vehicles().iter())
    }

    pub fn vehicle_count(&self) -> usize {
        self.roads.iter().map(SimRoad::len).sum()
    }

    pub fn vehicle_position(&self, id: VehicleId) -> Option<Position> {
        self.vehicles().find(|v| v.id == id).map(|v| v.position)
    }

    /// Places a vehicle with a fixed top speed at the back of a road's
    /// queue. The caller keeps queue order consistent with positions.
    pub fn place_vehicle(&mut self, road: RoadId, position: Position, max_speed: f64) -> Result<VehicleId> {
        if max_speed.is_nan() || max_speed < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "max speed must be non-negative, got {max_speed}"
            )));
        }
        let road = self
            .roads
            .get_mut(road.0)
            .ok_or_else(|| Error::InvalidParameter(format!("no road with id {}", road.0)))?;
        let vehicle = self.spawner.spawn_with_speed(position, max_speed, &mut self.rng);
        let id = vehicle.id;
        road.enqueue_at_back(vehicle);
        Ok(id)
    }

    /// Advances one tick and reports every vehicle's position and colour,
    /// in matching order
    pub fn update(&mut self, positions: &mut Vec<Position>, colors: &mut Vec<Color>) {
        positions.clear();
        colors.clear();
        self.tick();
        for vehicle in self.vehicles() {
            positions.push(vehicle.position);
            colors.push(vehicle.color);
        }
    }

    /// Main simulation tick
    pub fn tick(&mut self) {
        self.stats.ticks += 1;

        // Random road order so no road keeps priority at a junction
        let mut order: Vec<RoadId> = (0..self.roads.len()).map(RoadId).collect();
        order.shuffle(&mut self.rng);
        for road_id in order {
            self.move_vehicles(road_id);
        }

        self.spawn_vehicles();
    }

    /// Moves every vehicle that was on the road when its turn came, front
    /// to back
    fn move_vehicles(&mut self, road_id: RoadId) {
        let snapshot: Vec<VehicleId> = self.roads[road_id.0].vehicles().iter().map(|v| v.id).collect();
        let mut front_position: Option<Position> = None;
        let mut departed = 0;

        for (i, vehicle_id) in snapshot.iter().enumerate() {
            let index = i - departed;
            let road = &self.roads[road_id.0];
            let Some(vehicle) = road.vehicles().get(index) else {
                break;
            };
            debug_assert_eq!(vehicle.id, *vehicle_id);

            let speed = free_speed(road, vehicle, front_position);
            let candidate = vehicle.position.advanced(&road.direction, speed);
            let intersection = &self.intersections[road.intersection.0];

            let new_position = if road.distance_to_end(&candidate) <= road.clearance()
                && !intersection.can_approach(&self.roads, vehicle)
            {
                // Halt at the stop line; a vehicle already past it holds still
                if road.distance_to_end(&vehicle.position) > road.clearance() {
                    road.stop_line
                } else {
                    vehicle.position
                }
            } else if road.distance_to_end(&candidate) <= ARRIVAL_TOLERANCE {
                road.end
            } else {
                candidate
            };
            let arrived = index == 0 && new_position == road.end;

            self.roads[road_id.0].vehicles_mut()[index].move_to(new_position);
            front_position = Some(new_position);

            if arrived && self.handle_exit(road_id) {
                departed += 1;
            }
        }
    }

    /// Takes the front vehicle off a road at its end node: out of the
    /// network on an exit road, otherwise onto an available outgoing road.
    /// Returns whether the vehicle left the road.
    fn handle_exit(&mut self, road_id: RoadId) -> bool {
        let road = &self.roads[road_id.0];
        if road.has_exit {
            if let Some(vehicle) = self.roads[road_id.0].dequeue_front() {
                trace!("vehicle {:?} left the network at {}", vehicle.id, vehicle.position);
                self.stats.vehicles_exited += 1;
                return true;
            }
            return false;
        }

        let intersection = &self.intersections[road.intersection.0];
        let Some(next_road) = intersection.find_available_outgoing(&self.roads, &mut self.rng) else {
            return false;
        };
        match self.roads[road_id.0].dequeue_front() {
            Some(vehicle) => {
                trace!("vehicle {:?} turned from {:?} onto {:?}", vehicle.id, road_id, next_road);
                self.roads[next_road.0].enqueue_at_back(vehicle);
                self.stats.vehicles_transferred += 1;
                true
            }
            None => false,
        }
    }

    fn spawn_vehicles(&mut self) {
        for road_id in &self.entry_roads {
            if let Some(vehicle_id) = self.roads[road_id.0].try_spawn(&mut self.rng, &mut self.spawner) {
                trace!("vehicle {:?} spawned on {:?}", vehicle_id, road_id);
                self.stats.vehicles_spawned += 1;
            }
        }
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        println!("=== Traffic Simulation Summary ===");
        println!("Ticks: {}", self.stats.ticks);
        println!(
            "Intersections: {}, Roads: {} ({} entry)",
            self.intersections.len(),
            self.roads.len(),
            self.entry_roads.len()
        );
        println!("Vehicles on network: {}", self.vehicle_count());
        println!("Vehicles spawned: {}", self.stats.vehicles_spawned);
        println!("Vehicles exited: {}", self.stats.vehicles_exited);
        println!("Turns through intersections: {}", self.stats.vehicles_transferred);

        let busy: Vec<&SimRoad> = self.roads.iter().filter(|road| !road.is_empty()).collect();
        if !busy.is_empty() {
            println!("--- Occupied Roads ---");
            for road in busy {
                println!("  Road {}: {} vehicle(s)", road.segment, road.len());
            }
        }
    }

    /// Draw a visual map of the world in the terminal
    pub fn draw_map(&self) {
        println!("\n=== World Map ===");
        println!("Legend: E=Entry, X=Exit, +=Intersection, o=Vehicle, -|=Road");
        println!();
        println!("{}", self.render_map());
        println!();
    }

    /// Renders the network and its vehicles as text, north up, scaled down
    /// to at most `MAP_WIDTH` columns
    pub fn render_map(&self) -> String {
        let Some(first) = self.intersections.first() else {
            return String::new();
        };

        let (mut min_x, mut max_x, mut min_y, mut max_y) = (first.node.x, first.node.x, first.node.y, first.node.y);
        for intersection in &self.intersections {
            min_x = min_x.min(intersection.node.x);
            max_x = max_x.max(intersection.node.x);
            min_y = min_y.min(intersection.node.y);
            max_y = max_y.max(intersection.node.y);
        }

        let (span_x, span_y) = (max_x.abs_diff(min_x) as f64, max_y.abs_diff(min_y) as f64);
        let extent = span_x.max(span_y).max(1.0);
        let scale = ((MAP_WIDTH - 1) as f64 / extent).min(1.0);
        let width = (span_x * scale).round() as usize + 1;
        let height = (span_y * scale).round() as usize + 1;
        let mut grid = vec![vec![' '; width]; height];

        let to_grid = |p: &Position| -> (usize, usize) {
            let col = ((p.x - min_x as f64) * scale).round().max(0.0) as usize;
            // Flip y so north is at the top
            let row = ((max_y as f64 - p.y) * scale).round().max(0.0) as usize;
            (row.min(height - 1), col.min(width - 1))
        };

        for road in &self.roads {
            let (start_row, start_col) = to_grid(&road.start);
            let (end_row, end_col) = to_grid(&road.end);
            let steps = start_row.abs_diff(end_row).max(start_col.abs_diff(end_col));
            let glyph = if start_row == end_row { '-' } else { '|' };
            for step in 0..=steps {
                let t = step as f64 / steps.max(1) as f64;
                let row = (start_row as f64 + (end_row as f64 - start_row as f64) * t).round() as usize;
                let col = (start_col as f64 + (end_col as f64 - start_col as f64) * t).round() as usize;
                if grid[row][col] == ' ' {
                    grid[row][col] = glyph;
                }
            }
        }

        for intersection in &self.intersections {
            let (row, col) = to_grid(&intersection.position);
            grid[row][col] = '+';
        }

        for road in &self.roads {
            if road.has_entry {
                let (row, col) = to_grid(&road.start);
                grid[row][col] = 'E';
            }
            if road.has_exit {
                let (row, col) = to_grid(&road.end);
                grid[row][col] = 'X';
            }
        }

        for vehicle in self.vehicles() {
            let (row, col) = to_grid(&vehicle.position);
            if matches!(grid[row][col], ' ' | '-' | '|') {
                grid[row][col] = 'o';
            }
        }

        grid.iter()
            .map(|row| row.iter().collect::<String>().trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// How far `vehicle` may move this tick: its top speed, capped by the
/// distance to the road's end and by the clearance behind the vehicle in
/// front.
fn free_speed(road: &SimRoad, vehicle: &SimVehicle, front: Option<Position>) -> f64 {
    let mut speed = vehicle.max_speed.min(road.distance_to_end(&vehicle.position));
    if let Some(front) = front {
        let gap = front.distance(&vehicle.position) - road.clearance();
        speed = speed.min(gap.max(0.0));
    }
    speed
}
