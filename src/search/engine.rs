use indexmap::map::Entry::{Occupied, Vacant};
use log::debug;

use crate::collections::FxIndexSet;
use crate::config::{Offset, PlannerConfig};
use crate::errors::PlannerError;
use crate::geometry::squared_euclidean;
use crate::terrain::{Cell, Raster, TerrainModel};

use super::NodeMap;
use super::frontier::Frontier;
use super::heuristic::Heuristic;
use super::path::chain_to_root;
use super::trace::{SearchStep, StepTracer};


/// A planned route across the terrain
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Ordered cells from the start to the reached goal cell, inclusive
    pub cells: Vec<Cell>,
    /// Every cell rejected as untraversable during the search, deduplicated,
    /// in discovery order. Out-of-bounds neighbors appear here too
    pub blocked: Vec<Cell>,
}

/// One direction of the bidirectional search
/// Each side owns its frontier, its node bookkeeping, and its finalized set;
/// nothing here is ever shared with the opposite side
struct SearchSide {
    frontier: Frontier,
    nodes: NodeMap,
    visited: FxIndexSet<Cell>,
    /// Cell the heuristic aims this side at: the destination for the forward
    /// side, the start for the backward side
    target: Cell,
}

impl SearchSide {
    fn new(target: Cell) -> Self {
        Self {
            frontier: Frontier::new(),
            nodes: NodeMap::default(),
            visited: FxIndexSet::default(),
            target,
        }
    }
}

/// Bidirectional meet-in-the-middle route search over a terrain grid
///
/// Two frontiers grow simultaneously: one forward from the start, one
/// backward from the goal region around the destination. Whichever frontier
/// currently holds the smaller best priority advances, and the search ends
/// as soon as one side finalizes a cell the other side has already
/// finalized (or the forward side lands inside the goal region directly).
///
/// Reusing the forward traversability test for the backward frontier is
/// sound only because the slope predicate is symmetric in its endpoints;
/// that symmetry is asserted in the terrain tests rather than assumed
pub struct SearchEngine {
    model: TerrainModel,
    heuristic: Heuristic,
    offsets: &'static [Offset],
    goal_tolerance: u32,
    step_budget: Option<u64>,
}

impl SearchEngine {
    /// Validate the configuration and terrain, then assemble an engine
    /// All validation failures surface here, before any search runs
    pub fn new(
        elevation: Raster,
        cost_map: Option<Raster>,
        config: PlannerConfig,
    ) -> Result<Self, PlannerError> {
        let model = TerrainModel::new(elevation, cost_map, &config)?;
        Ok(Self {
            model,
            heuristic: Heuristic::new(config.heuristic_weight),
            offsets: config.movement_mode.offsets(),
            goal_tolerance: config.goal_tolerance,
            step_budget: config.step_budget,
        })
    }

    /// The terrain view this engine searches over
    pub fn model(&self) -> &TerrainModel {
        &self.model
    }

    /// Plan a route without tracing
    /// No snapshots are built, so an untraced search pays no observer cost
    pub fn plan(&self, start: Cell, end: Cell) -> Result<Route, PlannerError> {
        self.run(start, end, None)
    }

    /// Plan a route, handing the tracer a snapshot after every expansion
    /// and once more when the frontiers meet
    /// An error from the tracer aborts the search immediately
    pub fn plan_traced(
        &self,
        start: Cell,
        end: Cell,
        tracer: &mut dyn StepTracer,
    ) -> Result<Route, PlannerError> {
        self.run(start, end, Some(tracer))
    }

    fn run(
        &self,
        start: Cell,
        end: Cell,
        mut tracer: Option<&mut dyn StepTracer>,
    ) -> Result<Route, PlannerError> {
        if !self.model.in_bounds(start) {
            return Err(PlannerError::OutOfBounds(start));
        }
        if !self.model.in_bounds(end) {
            return Err(PlannerError::OutOfBounds(end));
        }
        if start == end {
            return Ok(Route { cells: vec![start], blocked: Vec::new() });
        }

        debug!(
            "planning {start:?} -> {end:?} on a {}x{} grid (tolerance {})",
            self.model.rows(),
            self.model.cols(),
            self.goal_tolerance,
        );

        let goal_region = self.goal_region(end);

        // Forward side roots at the start, aims at the destination
        let mut forward = SearchSide::new(end);
        forward.nodes.insert(start, (usize::MAX, 0.0));
        forward.frontier.push(self.heuristic.estimate(start, end), start);

        // Backward side roots at every goal cell, aims at the start
        let mut backward = SearchSide::new(start);
        for &cell in &goal_region {
            backward.nodes.insert(cell, (usize::MAX, 0.0));
            backward.frontier.push(self.heuristic.estimate(cell, start), cell);
        }

        // Rejected cells, deduplicated across the whole search
        let mut blocked: FxIndexSet<Cell> = FxIndexSet::default();
        // How much of `blocked` the previous snapshot already reported
        let mut reported_blocked = 0usize;

        let mut step_index = 0usize;
        let mut expansions = 0u64;

        // Once either side runs dry the destination is unreachable
        while !forward.frontier.is_empty() && !backward.frontier.is_empty() {
            if let Some(budget) = self.step_budget {
                if expansions >= budget {
                    debug!("giving up after {expansions} expansions, budget exhausted");
                    return Err(PlannerError::BudgetExhausted(budget));
                }
            }
            expansions += 1;

            // Advance whichever side currently looks cheaper to extend,
            // preferring the forward side on ties
            let advance_forward =
                match (forward.frontier.peek_priority(), backward.frontier.peek_priority()) {
                    (Some(f), Some(b)) => f <= b,
                    (Some(_), None) => true,
                    _ => false,
                };
            let (side, other) = if advance_forward {
                (&mut forward, &mut backward)
            } else {
                (&mut backward, &mut forward)
            };

            // The heap may hold only stale entries at this point
            let Some(current) = side.frontier.pop_fresh(&side.visited) else {
                break;
            };

            // Finalize: current's g is now proven for this side
            side.visited.insert(current);

            // The sides meet when one finalizes a cell the other already
            // finalized. The goal-region test only applies to the forward
            // side; the backward side starts inside the region
            let met = (advance_forward && goal_region.contains(&current))
                || other.visited.contains(&current);
            if met {
                if let Some(observer) = tracer.as_mut() {
                    let step = build_step(
                        step_index,
                        current,
                        true,
                        &forward,
                        &backward,
                        &blocked,
                        &mut reported_blocked,
                    );
                    observer.observe(&step)?;
                }
                debug!("frontiers met at {current:?} after {expansions} expansions");
                return Ok(Route {
                    cells: reconstruct(&forward, &backward, current),
                    blocked: blocked.iter().copied().collect(),
                });
            }

            // Expand every neighbor of the finalized cell
            let (current_index, _, &(_, current_g)) =
                side.nodes.get_full(&current).unwrap();

            for offset in self.offsets {
                let neighbor = Cell::new(current.row + offset.dr, current.col + offset.dc);

                if !self.model.in_bounds(neighbor)
                    || !self.model.traversable(current, neighbor)
                {
                    blocked.insert(neighbor);
                    continue;
                }
                if side.visited.contains(&neighbor) {
                    continue;
                }

                let tentative_g = current_g + self.model.step_cost(neighbor, offset.length);

                // Push only on a strict improvement of g; this is what keeps
                // the frontier's lazy deletion sound
                match side.nodes.entry(neighbor) {
                    Vacant(e) => {
                        e.insert((current_index, tentative_g));
                    }
                    Occupied(mut e) => {
                        if tentative_g < e.get().1 {
                            e.insert((current_index, tentative_g));
                        } else {
                            continue;
                        }
                    }
                }

                let priority = tentative_g + self.heuristic.estimate(neighbor, side.target);
                side.frontier.push(priority, neighbor);
            }

            if let Some(observer) = tracer.as_mut() {
                let step = build_step(
                    step_index,
                    current,
                    false,
                    &forward,
                    &backward,
                    &blocked,
                    &mut reported_blocked,
                );
                observer.observe(&step)?;
            }
            step_index += 1;
        }

        debug!("both frontiers exhausted after {expansions} expansions, no path");
        Err(PlannerError::NoPathFound {
            blocked: blocked.iter().copied().collect(),
        })
    }

    /// In-bounds cells within the tolerance radius of the destination,
    /// enumerated in row-major order. Collapses to the destination itself
    /// when the radius admits nothing else
    fn goal_region(&self, end: Cell) -> FxIndexSet<Cell> {
        let tolerance = self.goal_tolerance as i32;
        let radius_sq = (self.goal_tolerance as f64).powi(2);

        let mut region = FxIndexSet::default();
        for row in (end.row - tolerance)..=(end.row + tolerance) {
            for col in (end.col - tolerance)..=(end.col + tolerance) {
                let cell = Cell::new(row, col);
                if !self.model.in_bounds(cell) {
                    continue;
                }
                let dist_sq = squared_euclidean(
                    row as f64,
                    col as f64,
                    end.row as f64,
                    end.col as f64,
                );
                if dist_sq <= radius_sq {
                    region.insert(cell);
                }
            }
        }

        if region.is_empty() {
            region.insert(end);
        }
        region
    }
}

/// Join the two parent chains through the meeting cell
/// The forward chain runs start -> meeting once reversed; the backward
/// chain already runs meeting -> goal because backward parents point
/// toward the goal roots
fn reconstruct(forward: &SearchSide, backward: &SearchSide, meeting: Cell) -> Vec<Cell> {
    let forward_index = forward.nodes.get_index_of(&meeting).unwrap();
    let mut cells = chain_to_root(&forward.nodes, forward_index);
    cells.reverse();

    let backward_index = backward.nodes.get_index_of(&meeting).unwrap();
    let tail = chain_to_root(&backward.nodes, backward_index);
    // The meeting cell is already the last forward cell
    cells.extend(tail.into_iter().skip(1));

    cells
}

/// Assemble one observation snapshot
/// Only runs when a tracer is attached, so untraced searches never pay for
/// the sorting done here
fn build_step(
    step_index: usize,
    current: Cell,
    is_goal: bool,
    forward: &SearchSide,
    backward: &SearchSide,
    blocked: &FxIndexSet<Cell>,
    reported_blocked: &mut usize,
) -> SearchStep {
    let mut visited: Vec<Cell> = forward
        .visited
        .iter()
        .chain(backward.visited.iter())
        .copied()
        .collect();
    visited.sort();
    visited.dedup();

    let mut open: Vec<Cell> = forward
        .frontier
        .open_cells()
        .chain(backward.frontier.open_cells())
        .filter(|cell| !forward.visited.contains(cell) && !backward.visited.contains(cell))
        .collect();
    open.sort();
    open.dedup();

    let blocked_delta: Vec<Cell> = blocked.iter().skip(*reported_blocked).copied().collect();
    *reported_blocked = blocked.len();

    SearchStep {
        step_index,
        current,
        visited,
        open,
        blocked_delta,
        is_goal,
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MovementMode;
    use crate::search::trace::StepRecorder;
    use std::f64::consts::SQRT_2;

    fn flat_engine(rows: usize, cols: usize, config: PlannerConfig) -> SearchEngine {
        let elevation = Raster::new(rows, cols, 1.0).unwrap();
        SearchEngine::new(elevation, None, config).unwrap()
    }

    fn engine_from_rows(rows: Vec<Vec<f64>>, config: PlannerConfig) -> SearchEngine {
        let elevation = Raster::from_rows(rows).unwrap();
        SearchEngine::new(elevation, None, config).unwrap()
    }

    /// Sum of step costs along a route, using the engine's own cost model
    fn route_cost(engine: &SearchEngine, cells: &[Cell]) -> f64 {
        cells
            .windows(2)
            .map(|pair| {
                let (from, to) = (pair[0], pair[1]);
                let diagonal = from.row != to.row && from.col != to.col;
                let base = if diagonal { SQRT_2 } else { 1.0 };
                engine.model().step_cost(to, base)
            })
            .sum()
    }

    /// Unidirectional uniform-cost reference search, used as the optimality
    /// oracle. Deliberately naive: linear scans instead of a heap
    fn reference_cost(engine: &SearchEngine, start: Cell, end: Cell) -> Option<f64> {
        let model = engine.model();
        let offsets = MovementMode::EightDirections.offsets();

        let mut best: Vec<(Cell, f64)> = vec![(start, 0.0)];
        let mut finalized: Vec<Cell> = Vec::new();

        loop {
            let next = best
                .iter()
                .filter(|(cell, _)| !finalized.contains(cell))
                .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
                .copied()?;
            let (current, g) = next;
            if current == end {
                return Some(g);
            }
            finalized.push(current);

            for offset in offsets {
                let neighbor = Cell::new(current.row + offset.dr, current.col + offset.dc);
                if !model.in_bounds(neighbor) || !model.traversable(current, neighbor) {
                    continue;
                }
                let tentative = g + model.step_cost(neighbor, offset.length);
                match best.iter_mut().find(|(cell, _)| *cell == neighbor) {
                    Some(entry) => {
                        if tentative < entry.1 {
                            entry.1 = tentative;
                        }
                    }
                    None => best.push((neighbor, tentative)),
                }
            }
        }
    }

    /// Every consecutive pair in a route must be one movement-mode step apart
    fn assert_adjacent(cells: &[Cell], mode: MovementMode) {
        for pair in cells.windows(2) {
            let matched = mode.offsets().iter().any(|offset| {
                pair[0].row + offset.dr == pair[1].row && pair[0].col + offset.dc == pair[1].col
            });
            assert!(matched, "{:?} -> {:?} is not a single step", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_flat_grid_takes_the_diagonal() {
        // Scenario: 3x3 flat grid, corner to corner
        let engine = flat_engine(3, 3, PlannerConfig::default());
        let route = engine.plan(Cell::new(0, 0), Cell::new(2, 2)).unwrap();

        assert_eq!(
            route.cells,
            vec![Cell::new(0, 0), Cell::new(1, 1), Cell::new(2, 2)]
        );
        let cost = route_cost(&engine, &route.cells);
        assert!((cost - 2.0 * SQRT_2).abs() < 1e-9);
    }

    #[test]
    fn test_start_equals_destination() {
        let engine = flat_engine(3, 3, PlannerConfig::default());
        let mut recorder = StepRecorder::new();
        let route = engine
            .plan_traced(Cell::new(1, 1), Cell::new(1, 1), &mut recorder)
            .unwrap();

        assert_eq!(route.cells, vec![Cell::new(1, 1)]);
        assert!(route.blocked.is_empty());
        // No expansion ever ran, so nothing was observed
        assert!(recorder.steps().is_empty());
    }

    #[test]
    fn test_out_of_bounds_endpoints_fail_fast() {
        let engine = flat_engine(3, 3, PlannerConfig::default());
        let mut recorder = StepRecorder::new();

        let result = engine.plan_traced(Cell::new(5, 5), Cell::new(2, 2), &mut recorder);
        assert_eq!(result, Err(PlannerError::OutOfBounds(Cell::new(5, 5))));

        let result = engine.plan_traced(Cell::new(0, 0), Cell::new(0, -1), &mut recorder);
        assert_eq!(result, Err(PlannerError::OutOfBounds(Cell::new(0, -1))));

        assert!(recorder.steps().is_empty());
    }

    #[test]
    fn test_steep_edge_is_blocked_and_avoided() {
        // Scenario: a 2x3 grid with a single raised cell. One meter of rise
        // over a 0.1m pixel is far beyond the 30 degree default limit, so
        // (1,1) is unreachable from any neighbor
        let engine = engine_from_rows(
            vec![vec![0.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]],
            PlannerConfig::default(),
        );

        // The slope predicate rejects the edge from both directions
        let model = engine.model();
        assert!(!model.traversable(Cell::new(0, 1), Cell::new(1, 1)));
        assert!(!model.traversable(Cell::new(1, 1), Cell::new(0, 1)));

        let route = engine.plan(Cell::new(1, 0), Cell::new(1, 2)).unwrap();
        assert!(route.blocked.contains(&Cell::new(1, 1)));
        assert!(!route.cells.contains(&Cell::new(1, 1)));
        assert_adjacent(&route.cells, MovementMode::EightDirections);
    }

    #[test]
    fn test_unreachable_destination_reports_blocked_cells() {
        // A full-height wall splits the single row in two
        let engine = engine_from_rows(vec![vec![0.0, 5.0, 0.0]], PlannerConfig::default());
        let result = engine.plan(Cell::new(0, 0), Cell::new(0, 2));

        match result {
            Err(PlannerError::NoPathFound { blocked }) => {
                assert!(blocked.contains(&Cell::new(0, 1)));
            }
            other => panic!("expected NoPathFound, got {other:?}"),
        }
    }

    #[test]
    fn test_blocked_cells_are_deduplicated() {
        let engine = engine_from_rows(
            vec![vec![0.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 0.0]],
            PlannerConfig::default(),
        );
        let route = engine.plan(Cell::new(0, 0), Cell::new(2, 2)).unwrap();

        let mut seen = route.blocked.clone();
        seen.sort();
        let before = seen.len();
        seen.dedup();
        assert_eq!(seen.len(), before, "blocked list must hold no duplicates");
    }

    #[test]
    fn test_goal_tolerance_accepts_nearby_cells() {
        let mut config = PlannerConfig::default();
        config.goal_tolerance = 1;
        let engine = flat_engine(6, 6, config);

        let end = Cell::new(5, 5);
        let route = engine.plan(Cell::new(0, 0), end).unwrap();

        let last = *route.cells.last().unwrap();
        let dist = (((last.row - end.row).pow(2) + (last.col - end.col).pow(2)) as f64).sqrt();
        assert!(dist <= 1.0, "route ended at {last:?}, outside the goal region");
    }

    #[test]
    fn test_zero_tolerance_requires_exact_destination() {
        let engine = flat_engine(6, 6, PlannerConfig::default());
        let route = engine.plan(Cell::new(0, 0), Cell::new(5, 2)).unwrap();
        assert_eq!(*route.cells.last().unwrap(), Cell::new(5, 2));
        assert_eq!(*route.cells.first().unwrap(), Cell::new(0, 0));
    }

    #[test]
    fn test_admissible_weight_matches_reference_optimum() {
        // Flat grid: the diagonal is optimal
        let engine = flat_engine(4, 4, PlannerConfig::default());
        let route = engine.plan(Cell::new(0, 0), Cell::new(3, 3)).unwrap();
        let reference = reference_cost(&engine, Cell::new(0, 0), Cell::new(3, 3)).unwrap();
        assert!(route_cost(&engine, &route.cells) <= reference + 1e-9);

        // Walled grid: the only passage is the gap at (2,2)
        let engine = engine_from_rows(
            vec![
                vec![0.0, 0.0, 5.0, 0.0, 0.0],
                vec![0.0, 0.0, 5.0, 0.0, 0.0],
                vec![0.0, 0.0, 0.0, 0.0, 0.0],
            ],
            PlannerConfig::default(),
        );
        let route = engine.plan(Cell::new(0, 0), Cell::new(0, 4)).unwrap();
        let reference = reference_cost(&engine, Cell::new(0, 0), Cell::new(0, 4)).unwrap();
        assert!(route_cost(&engine, &route.cells) <= reference + 1e-9);
        assert_adjacent(&route.cells, MovementMode::EightDirections);
    }

    #[test]
    fn test_inflated_weight_still_reaches_the_destination() {
        let mut config = PlannerConfig::default();
        config.heuristic_weight = 5.0;
        let elevation = Raster::from_rows(vec![
            vec![0.0, 0.0, 5.0, 0.0, 0.0],
            vec![0.0, 0.0, 5.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0, 0.0],
        ])
        .unwrap();
        let engine = SearchEngine::new(elevation, None, config).unwrap();

        // Only reachability is promised at inflated weights
        let route = engine.plan(Cell::new(0, 0), Cell::new(0, 4)).unwrap();
        assert_eq!(*route.cells.last().unwrap(), Cell::new(0, 4));
        assert_adjacent(&route.cells, MovementMode::EightDirections);
    }

    #[test]
    fn test_cost_map_steers_the_route() {
        // A punishing cost band down the middle column pushes the route
        // around it even though the terrain itself is flat
        let elevation = Raster::new(3, 3, 0.0).unwrap();
        let costs = Raster::from_rows(vec![
            vec![1.0, 100.0, 1.0],
            vec![1.0, 100.0, 1.0],
            vec![1.0, 1.0, 1.0],
        ])
        .unwrap();
        let engine = SearchEngine::new(elevation, Some(costs), PlannerConfig::default()).unwrap();

        let route = engine.plan(Cell::new(0, 0), Cell::new(0, 2)).unwrap();
        assert!(!route.cells.contains(&Cell::new(0, 1)));
        assert!(!route.cells.contains(&Cell::new(1, 1)));
    }

    #[test]
    fn test_identical_runs_are_identical() {
        let rows = vec![
            vec![0.0, 0.01, 0.02, 0.01],
            vec![0.01, 0.03, 0.02, 0.0],
            vec![0.02, 0.01, 0.04, 0.01],
            vec![0.0, 0.02, 0.01, 0.0],
        ];
        let engine = engine_from_rows(rows, PlannerConfig::default());

        let mut first = StepRecorder::new();
        let mut second = StepRecorder::new();
        let route_a = engine
            .plan_traced(Cell::new(0, 0), Cell::new(3, 3), &mut first)
            .unwrap();
        let route_b = engine
            .plan_traced(Cell::new(0, 0), Cell::new(3, 3), &mut second)
            .unwrap();

        assert_eq!(route_a, route_b);
        assert_eq!(first.steps(), second.steps());
    }

    #[test]
    fn test_step_sequence_invariants() {
        let engine = flat_engine(5, 5, PlannerConfig::default());
        let mut recorder = StepRecorder::new();
        engine
            .plan_traced(Cell::new(0, 0), Cell::new(4, 4), &mut recorder)
            .unwrap();

        let steps = recorder.steps();
        assert!(!steps.is_empty());

        // The union visited set only ever grows, and exactly the final step
        // carries the goal flag
        for pair in steps.windows(2) {
            assert!(pair[0].visited.len() <= pair[1].visited.len());
        }
        for (i, step) in steps.iter().enumerate() {
            assert_eq!(step.is_goal, i == steps.len() - 1);
            // Snapshots are sorted and never overlap open with visited
            assert!(step.visited.is_sorted());
            assert!(step.open.is_sorted());
            for cell in &step.open {
                assert!(!step.visited.contains(cell));
            }
        }
    }

    #[test]
    fn test_step_budget_aborts_long_searches() {
        let mut config = PlannerConfig::default();
        config.step_budget = Some(3);
        let engine = flat_engine(20, 20, config);

        let result = engine.plan(Cell::new(0, 0), Cell::new(19, 19));
        assert_eq!(result, Err(PlannerError::BudgetExhausted(3)));
    }

    #[test]
    fn test_observer_failure_aborts_the_search() {
        struct FailingTracer {
            remaining: usize,
        }
        impl StepTracer for FailingTracer {
            fn observe(&mut self, _step: &SearchStep) -> Result<(), PlannerError> {
                if self.remaining == 0 {
                    return Err(PlannerError::ObserverFailure("disk full".to_string()));
                }
                self.remaining -= 1;
                Ok(())
            }
        }

        let engine = flat_engine(8, 8, PlannerConfig::default());
        let mut tracer = FailingTracer { remaining: 2 };
        let result = engine.plan_traced(Cell::new(0, 0), Cell::new(7, 7), &mut tracer);
        assert_eq!(
            result,
            Err(PlannerError::ObserverFailure("disk full".to_string()))
        );
    }

    #[test]
    fn test_four_direction_mode_never_moves_diagonally() {
        let mut config = PlannerConfig::default();
        config.movement_mode = MovementMode::FourDirections;
        let engine = flat_engine(4, 4, config);

        let route = engine.plan(Cell::new(0, 0), Cell::new(3, 3)).unwrap();
        assert_adjacent(&route.cells, MovementMode::FourDirections);
        // Manhattan distance is the best a 4-direction walk can do
        assert_eq!(route.cells.len(), 7);
    }
}
