use crate::geometry::euclidean;
use crate::terrain::Cell;


/// Weighted Euclidean estimate of the distance remaining to a target cell
/// A weight of 1.0 never overestimates the true remaining cost, which is
/// what the optimality guarantee of the search rests on. Larger weights
/// inflate the estimate to converge faster at the expense of optimality
#[derive(Debug, Clone, Copy)]
pub struct Heuristic {
    weight: f64,
}

impl Heuristic {
    pub fn new(weight: f64) -> Self {
        Self { weight }
    }

    pub fn estimate(&self, cell: Cell, target: Cell) -> f64 {
        euclidean(
            cell.row as f64,
            cell.col as f64,
            target.row as f64,
            target.col as f64,
        ) * self.weight
    }
}
