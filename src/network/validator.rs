//! Geometry and topology checks for explicit road networks
//!
//! All checks are pure; they either pass or return the first violation
//! they find.

use log::debug;
use petgraph::graphmap::UnGraphMap;
use petgraph::visit::Bfs;
use sorted_vec::SortedVec;

use super::graph::RoadGraph;
use super::types::{Node, Orientation, Segment};
use crate::error::{Error, Result};

/// Segments split by orientation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    pub horizontal: Vec<Segment>,
    pub vertical: Vec<Segment>,
}

/// Splits segments into horizontal and vertical sets, rejecting diagonal
/// and null segments.
pub fn classify(segments: &[Segment]) -> Result<Classified> {
    let mut classified = Classified::default();
    for segment in segments {
        match segment.orientation()? {
            Orientation::Horizontal => classified.horizontal.push(*segment),
            Orientation::Vertical => classified.vertical.push(*segment),
        }
    }
    Ok(classified)
}

/// A segment projected onto its line: fixed coordinate, then the covered
/// range on the varying axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Span {
    fixed: i64,
    low: i64,
    high: i64,
    index: usize,
}

impl Span {
    fn of(segment: &Segment, orientation: Orientation, index: usize) -> Self {
        let (fixed, a, b) = match orientation {
            Orientation::Horizontal => (segment.start.y, segment.start.x, segment.end.x),
            Orientation::Vertical => (segment.start.x, segment.start.y, segment.end.y),
        };
        Span {
            fixed,
            low: a.min(b),
            high: a.max(b),
            index,
        }
    }
}

/// Rejects collinear segments whose ranges overlap, identical ranges
/// included. Segments meeting at a single endpoint pass.
///
/// Every segment must have the given orientation.
pub fn check_no_overlap(segments: &[Segment], orientation: Orientation) -> Result<()> {
    let spans = SortedVec::from_unsorted(
        segments
            .iter()
            .enumerate()
            .map(|(index, segment)| Span::of(segment, orientation, index))
            .collect(),
    );

    // Sorted by line then start, an overlap always shows up between neighbours
    for pair in spans.windows(2) {
        let (current, next) = (pair[0], pair[1]);
        if current.fixed == next.fixed && next.low < current.high {
            return Err(Error::Overlap {
                orientation: orientation.name(),
                first: segments[current.index],
                second: segments[next.index],
            });
        }
    }
    Ok(())
}

/// Rejects horizontal/vertical pairs that cross, and pairs where an
/// endpoint of one lands inside the other. Sharing an endpoint is legal.
pub fn check_no_crossing(horizontal: &[Segment], vertical: &[Segment]) -> Result<()> {
    for h in horizontal {
        let (h_min_x, h_max_x) = (h.start.x.min(h.end.x), h.start.x.max(h.end.x));
        let h_y = h.start.y;
        for v in vertical {
            let (v_min_y, v_max_y) = (v.start.y.min(v.end.y), v.start.y.max(v.end.y));
            let v_x = v.start.x;

            // Covers true crossings and horizontal endpoints inside the vertical
            let crosses = (h_min_x..=h_max_x).contains(&v_x) && v_min_y < h_y && h_y < v_max_y;
            // A vertical endpoint inside the horizontal
            let lands_inside =
                h_min_x < v_x && v_x < h_max_x && (v_min_y == h_y || v_max_y == h_y);

            if crosses || lands_inside {
                return Err(Error::Crossing {
                    horizontal: *h,
                    vertical: *v,
                });
            }
        }
    }
    Ok(())
}

/// Checks that the undirected closure of the graph is a single component.
/// An empty graph is trivially connected.
pub fn check_connected(graph: &RoadGraph) -> Result<()> {
    let Some(start) = graph.nodes().next() else {
        return Ok(());
    };

    let mut closure = UnGraphMap::<Node, ()>::with_capacity(graph.node_count(), graph.edge_count());
    for node in graph.nodes() {
        closure.add_node(node);
    }
    for (from, _, to) in graph.edges() {
        closure.add_edge(from, to, ());
    }

    let mut bfs = Bfs::new(&closure, start);
    let mut reached = 0;
    while bfs.next(&closure).is_some() {
        reached += 1;
    }

    let unreached = graph.node_count() - reached;
    if unreached > 0 {
        return Err(Error::Connectivity { unreached });
    }
    Ok(())
}

/// Every node without an exit must be a declared exit gate, every node
/// without an entrance a declared entry gate.
pub fn check_all_gates_valid(graph: &RoadGraph, entry_gates: &[Node], exit_gates: &[Node]) -> Result<()> {
    for node in graph.nodes() {
        if graph.outgoing(node).is_empty() && !exit_gates.contains(&node) {
            return Err(Error::DeadEnd { node, missing: "exit" });
        }
        if graph.incoming(node).is_empty() && !entry_gates.contains(&node) {
            return Err(Error::DeadEnd { node, missing: "entrance" });
        }
    }
    Ok(())
}

/// Runs every geometry and topology check in order, stopping at the
/// first failure.
pub fn validate(graph: &RoadGraph, entry_gates: &[Node], exit_gates: &[Node]) -> Result<()> {
    let classified = classify(&graph.convert_to_segments())?;
    debug!(
        "classified {} horizontal and {} vertical segments",
        classified.horizontal.len(),
        classified.vertical.len()
    );

    check_no_overlap(&classified.vertical, Orientation::Vertical)?;
    check_no_overlap(&classified.horizontal, Orientation::Horizontal)?;
    debug!("no overlapping segments");

    check_no_crossing(&classified.horizontal, &classified.vertical)?;
    debug!("no crossing segments");

    check_connected(graph)?;
    debug!("all roads are connected");

    check_all_gates_valid(graph, entry_gates, exit_gates)?;
    debug!("every intersection has an entrance and an exit");
    Ok(())
}
