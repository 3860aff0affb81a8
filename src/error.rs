//! Error types for network construction and the simulation engine.

use thiserror::Error;

use crate::network::{Node, Segment};

/// Result type for fallible operations in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building a network or setting up a simulation.
///
/// Runtime admission decisions never produce one of these; they are plain
/// `bool`/`Option` results.
#[derive(Debug, Error)]
pub enum Error {
    /// Diagonal or zero-length segment
    #[error("invalid segment {0}: {1}")]
    Geometry(Segment, &'static str),

    /// Two collinear segments share part of their range
    #[error("{orientation} segments overlap: {first} and {second}")]
    Overlap {
        orientation: &'static str,
        first: Segment,
        second: Segment,
    },

    /// A horizontal and a vertical segment cross, or one ends inside the other
    #[error("segments {horizontal} and {vertical} cross or meet mid-segment")]
    Crossing {
        horizontal: Segment,
        vertical: Segment,
    },

    /// The undirected closure of the graph has more than one component
    #[error("road network is not connected: {unreached} node(s) unreached")]
    Connectivity { unreached: usize },

    /// A node lacks an entrance or exit and is not a declared gate
    #[error("intersection at {node} has no {missing}")]
    DeadEnd { node: Node, missing: &'static str },

    /// The edge or its reverse already exists
    #[error("road {0} (or its reverse) is already in the network")]
    DuplicateEdge(Segment),

    /// A node cannot be reached from any entry gate
    #[error("{unreached} node(s) cannot be reached from an entry gate")]
    UnreachableNode { unreached: usize },

    /// The network has no entry gate or no exit gate
    #[error("at least one {0} gate must be defined")]
    MissingGate(&'static str),

    /// Out-of-range construction parameter
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A line of a network description could not be read
    #[error("invalid line {line}: {content:?}")]
    Parse { line: usize, content: String },

    /// Procedural generation gave up after its attempt ceiling
    #[error("no valid network generated after {0} attempts")]
    GenerationExhausted(usize),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
