pub mod engine;
pub mod heuristic;
pub mod trace;
mod frontier;
mod path;

use crate::collections::FxIndexMap;
use crate::terrain::Cell;

/// Type alias for one frontier's node bookkeeping
/// The tuple contains (parent_index, cost) where:
/// - parent_index is the index of the parent cell in the map
/// - cost is the best known cost (g) to reach the cell from the frontier's roots
/// Root cells use usize::MAX as their parent index
pub(crate) type NodeMap = FxIndexMap<Cell, (usize, f64)>;
