//! Terrain-aware route planning over elevation grids
//!
//! Given a grid of terrain heights, an optional per-cell cost map, and the
//! physical limits of a ground vehicle, [`SearchEngine`] finds a
//! minimum-cost route between two cells using a bidirectional
//! meet-in-the-middle heuristic search. Edges steeper than the vehicle's
//! maximum climbable slope are rejected and reported back to the caller.
//!
//! Attach a [`StepTracer`] to receive a deterministic snapshot of the
//! search state after every expansion, e.g. to drive a visualization.

pub mod config;
pub mod errors;
pub mod geometry;
pub mod search;
pub mod terrain;

mod collections;

pub use config::{MovementMode, Offset, PlannerConfig};
pub use errors::PlannerError;
pub use search::engine::{Route, SearchEngine};
pub use search::heuristic::Heuristic;
pub use search::trace::{NoopTracer, SearchStep, StepRecorder, StepTracer};
pub use terrain::{Cell, Raster, TerrainModel};
