use std::error::Error;
use std::fmt;

use crate::terrain::Cell;

#[derive(Debug, Clone, PartialEq)]
pub enum PlannerError {
    OutOfBounds(Cell), // Start or destination lies outside the grid
    InvalidConfiguration(String), // Rejected before any search state is built
    NoPathFound { blocked: Vec<Cell> }, // Both frontiers exhausted; carries rejected cells for diagnostics
    ObserverFailure(String), // A step tracer failed; the search was aborted
    BudgetExhausted(u64), // The configured step budget ran out mid-search
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerError::OutOfBounds(cell) => {
                write!(f, "cell ({}, {}) is outside the grid", cell.row, cell.col)
            }
            PlannerError::InvalidConfiguration(msg) => {
                write!(f, "invalid configuration: {msg}")
            }
            PlannerError::NoPathFound { blocked } => {
                write!(f, "no traversable path found ({} blocked cells)", blocked.len())
            }
            PlannerError::ObserverFailure(msg) => {
                write!(f, "step observer failed: {msg}")
            }
            PlannerError::BudgetExhausted(budget) => {
                write!(f, "search exceeded the step budget of {budget} expansions")
            }
        }
    }
}

impl Error for PlannerError {}
