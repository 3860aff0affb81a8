//! Procedural road network generation
//!
//! Networks grow from the origin by a biased random walk. Each attempt is
//! a small state machine: `Generating` lays down segments, `Validating`
//! upscales the result and checks its gates, and the attempt ends either
//! `Accepted` or `Retry`. A retry resets all state and starts over.

use log::{debug, info, warn};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::HashSet;

use super::builder::RoadNetwork;
use super::graph::{Gates, RoadGraph};
use super::types::{Direction, Node, Segment};
use crate::error::{Error, Result};

/// Attempts before procedural generation gives up
pub const MAX_GENERATION_ATTEMPTS: usize = 10_000;

/// Walk steps allowed per requested segment before an attempt counts as stalled
const STEPS_PER_SEGMENT: usize = 64;

/// Relative weight of continuing straight while extending a segment
const STRAIGHT_WEIGHT: u32 = 2;

/// Where a generation attempt currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Generating,
    Validating,
    Accepted,
    Retry,
}

/// Mutable state of a single generation attempt
#[derive(Debug)]
pub struct NetworkGenerator {
    graph: RoadGraph,
    gates: Gates,
    /// Lattice points some segment passes through; later segments may not
    /// start, end or pass here
    blocked: HashSet<Node>,
    state: GenerationState,
}

impl Default for NetworkGenerator {
    fn default() -> Self {
        Self {
            graph: RoadGraph::new(),
            gates: Gates::default(),
            blocked: HashSet::new(),
            state: GenerationState::Generating,
        }
    }
}

impl NetworkGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GenerationState {
        self.state
    }

    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    /// Clears every segment, gate and blocked node
    pub fn reset(&mut self) {
        self.graph.clear();
        self.gates = Gates::default();
        self.blocked.clear();
        self.state = GenerationState::Generating;
    }

    /// Runs one attempt to completion and reports how it ended.
    ///
    /// Fails only when `scalar` cannot be applied to the walk, which no
    /// retry would fix.
    pub fn run_attempt<R: Rng>(
        &mut self,
        total_segments: usize,
        scalar: i64,
        enforce_reachability: bool,
        rng: &mut R,
    ) -> Result<GenerationState> {
        loop {
            self.state = match self.state {
                GenerationState::Generating => {
                    if self.generate_roads(total_segments, rng) {
                        GenerationState::Validating
                    } else {
                        GenerationState::Retry
                    }
                }
                GenerationState::Validating => {
                    if self.validate(scalar, enforce_reachability)? {
                        GenerationState::Accepted
                    } else {
                        GenerationState::Retry
                    }
                }
                finished => return Ok(finished),
            };
        }
    }

    fn into_network(self) -> RoadNetwork {
        RoadNetwork {
            graph: self.graph,
            gates: self.gates,
        }
    }

    /// Lays down `total_segments` segments. Returns false if the walk
    /// stalls or runs out of active nodes.
    fn generate_roads<R: Rng>(&mut self, total_segments: usize, rng: &mut R) -> bool {
        let spawn = Node::ORIGIN;
        let Some(first) = self.pick_direction(spawn, None, rng) else {
            return false;
        };
        let Some(first_end) = spawn.step(first) else {
            return false;
        };
        if self.graph.add_segment(Segment::new(spawn, first_end)).is_err() {
            return false;
        }

        let mut active = vec![spawn, first_end];
        let mut generated = 1;
        let step_budget = (total_segments + 1) * STEPS_PER_SEGMENT;
        let mut steps = 0;

        while generated < total_segments {
            steps += 1;
            if steps > step_budget || active.is_empty() {
                debug!("generation stalled after {} of {} segments", generated, total_segments);
                return false;
            }

            let index = rng.random_range(0..active.len());
            let start = active[index];
            let Some(direction) = self.pick_direction(start, None, rng) else {
                active.swap_remove(index);
                continue;
            };

            let Some(end) = self.find_endnode(start, direction, rng) else {
                continue;
            };
            let Some(segment) = self.choose_orientation(start, end, rng) else {
                continue;
            };

            let end_is_new = !self.graph.contains(end);
            if self.graph.add_segment(segment).is_err() {
                return false;
            }
            if end_is_new {
                active.push(end);
            }
            generated += 1;
        }
        true
    }

    /// Upscales the finished walk and checks gates and reachability
    fn validate(&mut self, scalar: i64, enforce_reachability: bool) -> Result<bool> {
        self.graph.upscale(scalar)?;
        self.gates = self.graph.derive_gates();
        if self.gates.entry.is_empty() || self.gates.exit.is_empty() {
            debug!("generated network lacks an entry or exit gate");
            return Ok(false);
        }
        if enforce_reachability && self.graph.enforce_reachability(&self.gates.entry).is_err() {
            return Ok(false);
        }
        Ok(true)
    }

    /// Cardinal directions still open from `node`: not already used by an
    /// outgoing edge, not stepping onto a blocked point, and not toward a
    /// neighbour that already has an edge back to `node`.
    fn available_directions(&self, node: Node) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|dir| {
                if self.graph.outgoing(node).iter().any(|(used, _)| used == dir) {
                    return false;
                }
                let Some(neighbour) = node.step(*dir) else {
                    return false;
                };
                if self.blocked.contains(&neighbour) {
                    return false;
                }
                !self
                    .graph
                    .outgoing(neighbour)
                    .iter()
                    .any(|(_, end)| *end == node)
            })
            .collect()
    }

    /// Picks an open direction, weighting `preferred` above the others
    fn pick_direction<R: Rng>(
        &self,
        node: Node,
        preferred: Option<Direction>,
        rng: &mut R,
    ) -> Option<Direction> {
        let available = self.available_directions(node);
        available
            .choose_weighted(rng, |dir| {
                if Some(*dir) == preferred {
                    STRAIGHT_WEIGHT
                } else {
                    1
                }
            })
            .ok()
            .copied()
    }

    /// Walks from `start` in `direction` until the walk turns or hits a
    /// node already in the network. Points passed through are blocked.
    fn find_endnode<R: Rng>(&mut self, start: Node, direction: Direction, rng: &mut R) -> Option<Node> {
        let mut current = start.step(direction)?;
        loop {
            let next = self.pick_direction(current, Some(direction), rng);
            match current.step(direction) {
                Some(ahead) if next == Some(direction) && !self.graph.contains(current) => {
                    self.blocked.insert(current);
                    current = ahead;
                }
                _ => return Some(current),
            }
        }
    }

    /// Decides which way the new segment between `start` and `end` runs.
    ///
    /// An outgoing segment needs `start` to have an entrance and `end` to
    /// be new or have an exit; an incoming one needs `start` to have an
    /// exit and `end` to be new or have an entrance.
    fn choose_orientation<R: Rng>(&self, start: Node, end: Node, rng: &mut R) -> Option<Segment> {
        let end_known = self.graph.contains(end);
        let mut options = Vec::with_capacity(2);

        if !self.graph.incoming(start).is_empty()
            && (!end_known || !self.graph.outgoing(end).is_empty())
        {
            options.push(Segment::new(start, end));
        }
        if !self.graph.outgoing(start).is_empty()
            && (!end_known || !self.graph.incoming(end).is_empty())
        {
            options.push(Segment::new(end, start));
        }
        options.choose(rng).copied()
    }
}

impl RoadNetwork {
    /// Generates a random network of `total_segments` segments grown from
    /// the origin, with every coordinate multiplied by `scalar`.
    ///
    /// Attempts lacking an entry or exit gate, or (with
    /// `enforce_reachability`) leaving nodes unreachable, are discarded and
    /// regenerated.
    pub fn generate<R: Rng>(
        total_segments: usize,
        scalar: i64,
        enforce_reachability: bool,
        rng: &mut R,
    ) -> Result<Self> {
        if total_segments < 1 {
            return Err(Error::InvalidParameter(
                "total segments must be a positive integer".to_string(),
            ));
        }
        if scalar < 1 {
            return Err(Error::InvalidParameter(format!(
                "scalar must be a positive integer, got {scalar}"
            )));
        }

        let mut generator = NetworkGenerator::new();
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            match generator.run_attempt(total_segments, scalar, enforce_reachability, rng)? {
                GenerationState::Accepted => {
                    info!(
                        "generated road network after {} attempt(s): {} nodes, {} roads",
                        attempt,
                        generator.graph.node_count(),
                        generator.graph.edge_count()
                    );
                    return Ok(generator.into_network());
                }
                _ => {
                    if attempt % 1_000 == 0 {
                        warn!("road generation still retrying after {} attempts", attempt);
                    }
                    generator.reset();
                }
            }
        }
        Err(Error::GenerationExhausted(MAX_GENERATION_ATTEMPTS))
    }
}
