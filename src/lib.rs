//! Road Network Simulation Library
//!
//! Builds directed, axis-aligned road networks on an integer lattice and
//! simulates collision-free traffic through them, one tick at a time.

pub mod error;
pub mod network;
pub mod simulation;

pub use error::{Error, Result};
