use std::f64::consts::SQRT_2;

use crate::errors::PlannerError;


/// Single grid move: row/column offset plus the base step length
/// Lengths are resolved once per mode rather than re-derived per expansion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offset {
    pub dr: i32,
    pub dc: i32,
    pub length: f64,
}

const FOUR_OFFSETS: [Offset; 4] = [
    Offset { dr: 1, dc: 0, length: 1.0 },
    Offset { dr: 0, dc: 1, length: 1.0 },
    Offset { dr: -1, dc: 0, length: 1.0 },
    Offset { dr: 0, dc: -1, length: 1.0 },
];

const EIGHT_OFFSETS: [Offset; 8] = [
    Offset { dr: 1, dc: 0, length: 1.0 },
    Offset { dr: 0, dc: 1, length: 1.0 },
    Offset { dr: -1, dc: 0, length: 1.0 },
    Offset { dr: 0, dc: -1, length: 1.0 },
    Offset { dr: 1, dc: 1, length: SQRT_2 },
    Offset { dr: 1, dc: -1, length: SQRT_2 },
    Offset { dr: -1, dc: 1, length: SQRT_2 },
    Offset { dr: -1, dc: -1, length: SQRT_2 },
];

/// How the vehicle is allowed to move between neighboring cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementMode {
    FourDirections,
    EightDirections,
}

impl MovementMode {
    /// Ordered offset table for this mode
    /// The order is fixed: axis moves first, then diagonals
    pub fn offsets(self) -> &'static [Offset] {
        match self {
            MovementMode::FourDirections => &FOUR_OFFSETS,
            MovementMode::EightDirections => &EIGHT_OFFSETS,
        }
    }
}

/// Planner parameters - passed explicitly into the engine, never global state
#[derive(Debug, Clone, Copy)]
pub struct PlannerConfig {
    /// Steepest slope the vehicle can climb, in degrees
    pub max_slope_deg: f64,
    /// Ground distance covered by one grid cell, in meters
    pub pixel_size_m: f64,
    pub movement_mode: MovementMode,
    /// Multiplier on the remaining-distance estimate
    /// 1.0 keeps the heuristic admissible; larger values trade optimality for speed
    pub heuristic_weight: f64,
    /// Radius (in cells) around the destination that counts as reaching it
    pub goal_tolerance: u32,
    /// Upper bound on expansions before the search gives up
    /// None leaves the search unbounded
    pub step_budget: Option<u64>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_slope_deg: 30.0,
            pixel_size_m: 0.1,
            movement_mode: MovementMode::EightDirections,
            heuristic_weight: 1.0,
            goal_tolerance: 0,
            step_budget: None,
        }
    }
}

impl PlannerConfig {
    /// Reject unusable parameters before any search state is built
    pub fn validate(&self) -> Result<(), PlannerError> {
        if !(self.max_slope_deg > 0.0) {
            return Err(PlannerError::InvalidConfiguration(format!(
                "max slope must be positive, got {}", self.max_slope_deg
            )));
        }
        if !(self.pixel_size_m > 0.0) {
            return Err(PlannerError::InvalidConfiguration(format!(
                "pixel size must be positive, got {}", self.pixel_size_m
            )));
        }
        if !self.heuristic_weight.is_finite() || self.heuristic_weight < 0.0 {
            return Err(PlannerError::InvalidConfiguration(format!(
                "heuristic weight must be finite and non-negative, got {}", self.heuristic_weight
            )));
        }
        Ok(())
    }
}
