//! Directed, asymmetric road graph shared by both construction modes
//!
//! The graph keeps an outgoing and an incoming mapping in step with each
//! other. Between two adjacent nodes at most one directed edge may exist.

use log::debug;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Bfs;
use std::collections::{BTreeMap, BTreeSet};

use super::types::{Direction, Node, Segment};
use crate::error::{Error, Result};

/// Entry and exit gates derived from node degrees
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gates {
    pub entry: Vec<Node>,
    pub exit: Vec<Node>,
}

/// Directed graph of one-way road segments on the lattice
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoadGraph {
    /// Node -> (direction, neighbour) for every edge leaving the node
    outgoing: BTreeMap<Node, Vec<(Direction, Node)>>,

    /// Node -> predecessor for every edge entering the node
    incoming: BTreeMap<Node, Vec<Node>>,
}

impl RoadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.outgoing.len()
    }

    pub fn edge_count(&self) -> usize {
        self.outgoing.values().map(Vec::len).sum()
    }

    pub fn contains(&self, node: Node) -> bool {
        self.outgoing.contains_key(&node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.outgoing.keys().copied()
    }

    /// Edges leaving `node`; empty for unknown nodes
    pub fn outgoing(&self, node: Node) -> &[(Direction, Node)] {
        self.outgoing.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Predecessors of `node`; empty for unknown nodes
    pub fn incoming(&self, node: Node) -> &[Node] {
        self.incoming.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every directed edge as (start, direction, end)
    pub fn edges(&self) -> impl Iterator<Item = (Node, Direction, Node)> + '_ {
        self.outgoing
            .iter()
            .flat_map(|(start, edges)| edges.iter().map(move |(dir, end)| (*start, *dir, *end)))
    }

    /// Adds a directed segment, creating its endpoints on demand.
    ///
    /// Fails if the segment is diagonal or null, if its direction already
    /// leaves the start node, or if the opposite direction already leaves
    /// the end node.
    pub fn add_segment(&mut self, segment: Segment) -> Result<()> {
        let direction = segment.direction()?;
        self.ensure_node(segment.start);
        self.ensure_node(segment.end);

        let repeats = self.outgoing(segment.start).iter().any(|(d, _)| *d == direction);
        let reverses = self
            .outgoing(segment.end)
            .iter()
            .any(|(d, _)| *d == direction.opposite());
        if repeats || reverses {
            return Err(Error::DuplicateEdge(segment));
        }

        self.outgoing
            .entry(segment.start)
            .or_default()
            .push((direction, segment.end));
        self.incoming.entry(segment.end).or_default().push(segment.start);
        Ok(())
    }

    fn ensure_node(&mut self, node: Node) {
        self.outgoing.entry(node).or_default();
        self.incoming.entry(node).or_default();
    }

    /// Entry gates have one outgoing and no incoming edge, exit gates one
    /// incoming and no outgoing edge.
    pub fn derive_gates(&self) -> Gates {
        let entry = self
            .nodes()
            .filter(|node| self.outgoing(*node).len() == 1 && self.incoming(*node).is_empty())
            .collect();
        let exit = self
            .nodes()
            .filter(|node| self.incoming(*node).len() == 1 && self.outgoing(*node).is_empty())
            .collect();
        Gates { entry, exit }
    }

    /// Checks that a forward search from the entry gates visits every node
    pub fn enforce_reachability(&self, entry_gates: &[Node]) -> Result<()> {
        let digraph = self.to_digraph();
        let mut reached = BTreeSet::new();

        for &gate in entry_gates.iter().filter(|gate| self.contains(**gate)) {
            if reached.contains(&gate) {
                continue;
            }
            let mut bfs = Bfs::new(&digraph, gate);
            while let Some(node) = bfs.next(&digraph) {
                reached.insert(node);
            }
        }

        let unreached = self.node_count() - reached.len();
        if unreached > 0 {
            debug!("{} of {} nodes unreachable from entry gates", unreached, self.node_count());
            return Err(Error::UnreachableNode { unreached });
        }
        Ok(())
    }

    /// Lists every directed edge as a segment
    pub fn convert_to_segments(&self) -> Vec<Segment> {
        self.edges()
            .map(|(start, _, end)| Segment::new(start, end))
            .collect()
    }

    /// Multiplies every coordinate in both mappings by `scalar`.
    ///
    /// Fails, leaving the graph untouched, if `scalar` is below 1 or any
    /// scaled coordinate would overflow.
    pub fn upscale(&mut self, scalar: i64) -> Result<()> {
        if scalar < 1 {
            return Err(Error::InvalidParameter(format!(
                "scalar must be a positive integer, got {scalar}"
            )));
        }
        let scale = |node: Node| {
            node.scaled(scalar).ok_or_else(|| {
                Error::InvalidParameter(format!("scaling {node} by {scalar} overflows the lattice"))
            })
        };

        let outgoing = self
            .outgoing
            .iter()
            .map(|(node, edges)| {
                let edges = edges
                    .iter()
                    .map(|(dir, end)| Ok((*dir, scale(*end)?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok((scale(*node)?, edges))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;
        let incoming = self
            .incoming
            .iter()
            .map(|(node, preds)| {
                let preds = preds.iter().map(|p| scale(*p)).collect::<Result<Vec<_>>>()?;
                Ok((scale(*node)?, preds))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        self.outgoing = outgoing;
        self.incoming = incoming;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.outgoing.clear();
        self.incoming.clear();
    }

    /// Directed petgraph view with every node present, edges weighted by
    /// their direction
    pub(crate) fn to_digraph(&self) -> DiGraphMap<Node, Direction> {
        let mut digraph = DiGraphMap::with_capacity(self.node_count(), self.edge_count());
        for node in self.nodes() {
            digraph.add_node(node);
        }
        for (start, dir, end) in self.edges() {
            digraph.add_edge(start, end, dir);
        }
        digraph
    }
}

impl TryFrom<&[Segment]> for RoadGraph {
    type Error = Error;

    fn try_from(segments: &[Segment]) -> Result<Self> {
        let mut graph = RoadGraph::new();
        for segment in segments {
            graph.add_segment(*segment)?;
        }
        Ok(graph)
    }
}
