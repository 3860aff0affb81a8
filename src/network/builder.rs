//! Road networks built from an explicit list of segments

use log::info;

use super::graph::{Gates, RoadGraph};
use super::types::{Node, Segment};
use super::validator;
use crate::error::{Error, Result};

/// A validated road graph together with its entry and exit gates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoadNetwork {
    pub(crate) graph: RoadGraph,
    pub(crate) gates: Gates,
}

impl RoadNetwork {
    /// Builds a network from caller-supplied segments.
    ///
    /// The network must have at least one entry and one exit gate, no
    /// overlapping or crossing segments, a single connected component and
    /// no dead ends. With `enforce_reachability` every node must also be
    /// reachable from an entry gate.
    pub fn from_segments(segments: &[Segment], enforce_reachability: bool) -> Result<Self> {
        let graph = RoadGraph::try_from(segments)?;
        let gates = graph.derive_gates();

        if gates.entry.is_empty() {
            return Err(Error::MissingGate("entry"));
        }
        if gates.exit.is_empty() {
            return Err(Error::MissingGate("exit"));
        }

        validator::validate(&graph, &gates.entry, &gates.exit)?;
        if enforce_reachability {
            graph.enforce_reachability(&gates.entry)?;
        }

        info!(
            "accepted road network: {} nodes, {} roads, {} entry / {} exit gates",
            graph.node_count(),
            graph.edge_count(),
            gates.entry.len(),
            gates.exit.len()
        );
        Ok(Self { graph, gates })
    }

    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }

    pub fn entry_gates(&self) -> &[Node] {
        &self.gates.entry
    }

    pub fn exit_gates(&self) -> &[Node] {
        &self.gates.exit
    }

    pub fn convert_to_segments(&self) -> Vec<Segment> {
        self.graph.convert_to_segments()
    }
}
