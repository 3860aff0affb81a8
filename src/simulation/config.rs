//! Engine parameters

use std::ops::RangeInclusive;

use super::types::{DEFAULT_MAX_SPEED, DEFAULT_MIN_SPEED, DEFAULT_SPAWN_PROBABILITY, MIN_CLEARANCE};
use crate::error::{Error, Result};

/// Parameters shared by every road and intersection in a simulation
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Minimum spacing between vehicles, and between an intersection and
    /// the nearest vehicle leaving it
    pub clearance: f64,
    /// Chance per tick that an entry road spawns a vehicle
    pub spawn_probability: f64,
    /// Range a new vehicle's top speed is drawn from
    pub speed_range: RangeInclusive<f64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            clearance: MIN_CLEARANCE,
            spawn_probability: DEFAULT_SPAWN_PROBABILITY,
            speed_range: DEFAULT_MIN_SPEED..=DEFAULT_MAX_SPEED,
        }
    }
}

impl SimConfig {
    pub fn with_clearance(mut self, clearance: f64) -> Self {
        self.clearance = clearance;
        self
    }

    pub fn with_spawn_probability(mut self, spawn_probability: f64) -> Self {
        self.spawn_probability = spawn_probability;
        self
    }

    pub fn with_speed_range(mut self, speed_range: RangeInclusive<f64>) -> Self {
        self.speed_range = speed_range;
        self
    }

    /// Rejects parameters the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.clearance.is_nan() || self.clearance < MIN_CLEARANCE {
            return Err(Error::InvalidParameter(format!(
                "clearance must be at least {MIN_CLEARANCE} to avoid collisions, got {}",
                self.clearance
            )));
        }
        validate_probability(self.spawn_probability)?;
        validate_speed_range(&self.speed_range)
    }
}

pub(crate) fn validate_speed_range(speed_range: &RangeInclusive<f64>) -> Result<()> {
    let (low, high) = (*speed_range.start(), *speed_range.end());
    if !low.is_finite() || !high.is_finite() || low < 0.0 || low > high {
        return Err(Error::InvalidParameter(format!(
            "speed range must be finite, non-negative and ordered, got {low}..={high}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_probability(probability: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(Error::InvalidParameter(format!(
            "probability must be between 0 and 1, got {probability}"
        )));
    }
    Ok(())
}
