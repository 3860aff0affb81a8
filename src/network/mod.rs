//! Road network construction and validation
//!
//! Networks are built either from an explicit segment list, which is
//! checked for geometric and topological soundness, or procedurally by a
//! biased random walk on the integer lattice.

mod builder;
mod file;
mod generator;
mod graph;
mod types;
pub mod validator;

pub use builder::RoadNetwork;
pub use file::{load_segments, parse_segments};
pub use generator::{GenerationState, NetworkGenerator, MAX_GENERATION_ATTEMPTS};
pub use graph::{Gates, RoadGraph};
pub use types::{Direction, Node, Orientation, Segment};
