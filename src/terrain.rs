use crate::config::PlannerConfig;
use crate::errors::PlannerError;
use crate::geometry::slope_angle_deg;


/// Grid cell addressed by (row, column)
/// Signed so neighbors just outside the grid are still representable,
/// which lets blocked out-of-bounds moves be reported like any other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }
}

/// Row-major 2D array of real values
/// Backs both the elevation grid (heights in meters) and the cost map
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl Raster {
    /// Create a raster filled with a single value
    pub fn new(rows: usize, cols: usize, fill: f64) -> Result<Self, PlannerError> {
        if rows == 0 || cols == 0 {
            return Err(PlannerError::InvalidConfiguration(format!(
                "raster dimensions must be positive, got {rows}x{cols}"
            )));
        }
        Ok(Self { rows, cols, values: vec![fill; rows * cols] })
    }

    /// Create a raster from nested rows
    /// Every row must have the same length
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, PlannerError> {
        let row_count = rows.len();
        let col_count = rows.first().map(Vec::len).unwrap_or(0);
        if row_count == 0 || col_count == 0 {
            return Err(PlannerError::InvalidConfiguration(
                "raster dimensions must be positive".to_string(),
            ));
        }

        let mut values = Vec::with_capacity(row_count * col_count);
        for row in &rows {
            if row.len() != col_count {
                return Err(PlannerError::InvalidConfiguration(format!(
                    "ragged raster: expected {} columns, found a row with {}",
                    col_count,
                    row.len()
                )));
            }
            values.extend_from_slice(row);
        }

        Ok(Self { rows: row_count, cols: col_count, values })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Value at a cell, or None when the cell is out of bounds
    pub fn get(&self, cell: Cell) -> Option<f64> {
        if cell.row < 0 || cell.col < 0 {
            return None;
        }
        let (r, c) = (cell.row as usize, cell.col as usize);
        if r >= self.rows || c >= self.cols {
            return None;
        }
        Some(self.values[r * self.cols + c])
    }
}

/// Read-only view of the terrain a search runs over
/// Owns the elevation grid, the optional cost map, and the physical
/// parameters that decide whether an edge is climbable and what it costs
#[derive(Debug, Clone)]
pub struct TerrainModel {
    elevation: Raster,
    cost_map: Option<Raster>,
    max_slope_deg: f64,
    pixel_size_m: f64,
}

impl TerrainModel {
    /// Validate and assemble the terrain view
    /// Fails fast on dimension mismatches and unusable physical parameters
    pub fn new(
        elevation: Raster,
        cost_map: Option<Raster>,
        config: &PlannerConfig,
    ) -> Result<Self, PlannerError> {
        config.validate()?;

        for value in &elevation.values {
            if !value.is_finite() {
                return Err(PlannerError::InvalidConfiguration(
                    "elevation values must be finite".to_string(),
                ));
            }
        }

        if let Some(costs) = &cost_map {
            if costs.rows != elevation.rows || costs.cols != elevation.cols {
                return Err(PlannerError::InvalidConfiguration(format!(
                    "cost map is {}x{} but elevation grid is {}x{}",
                    costs.rows, costs.cols, elevation.rows, elevation.cols
                )));
            }
            for value in &costs.values {
                if !value.is_finite() || *value < 1.0 {
                    return Err(PlannerError::InvalidConfiguration(format!(
                        "cost map values must be >= 1.0, found {value}"
                    )));
                }
            }
        }

        Ok(Self {
            elevation,
            cost_map,
            max_slope_deg: config.max_slope_deg,
            pixel_size_m: config.pixel_size_m,
        })
    }

    pub fn rows(&self) -> usize {
        self.elevation.rows
    }

    pub fn cols(&self) -> usize {
        self.elevation.cols
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.row >= 0
            && cell.col >= 0
            && (cell.row as usize) < self.elevation.rows
            && (cell.col as usize) < self.elevation.cols
    }

    /// Whether the vehicle can move between two adjacent in-bounds cells
    /// The slope angle over the step must stay within the configured limit
    /// Symmetric in its arguments since only the absolute height delta is used
    pub fn traversable(&self, from: Cell, to: Cell) -> bool {
        if from == to {
            return true;
        }
        let (Some(h_from), Some(h_to)) = (self.elevation.get(from), self.elevation.get(to)) else {
            return false;
        };

        let rise = (h_to - h_from).abs();
        let diagonal = from.row != to.row && from.col != to.col;
        let run = self.pixel_size_m * if diagonal { std::f64::consts::SQRT_2 } else { 1.0 };

        slope_angle_deg(rise, run) <= self.max_slope_deg
    }

    /// Cost of stepping onto `to`: the base step length scaled by the
    /// cost-map multiplier at the target cell (1.0 without a cost map)
    pub fn step_cost(&self, to: Cell, base_length: f64) -> f64 {
        let multiplier = self
            .cost_map
            .as_ref()
            .and_then(|costs| costs.get(to))
            .unwrap_or(1.0);
        base_length * multiplier
    }
}
