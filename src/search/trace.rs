use crate::errors::PlannerError;
use crate::terrain::Cell;


/// Immutable snapshot of the search state after one expansion
/// A full sequence of these is enough to replay the search visually
#[derive(Debug, Clone, PartialEq)]
pub struct SearchStep {
    pub step_index: usize,
    /// Cell finalized by this expansion
    pub current: Cell,
    /// Sorted, deduplicated union of both frontiers' finalized cells
    pub visited: Vec<Cell>,
    /// Sorted, deduplicated cells queued in either frontier, minus anything
    /// already finalized
    pub open: Vec<Cell>,
    /// Blocked cells first discovered since the previous snapshot, in
    /// discovery order
    pub blocked_delta: Vec<Cell>,
    /// True only on the terminal snapshot, emitted when the frontiers meet
    pub is_goal: bool,
}

/// Observer invoked synchronously after each expansion
/// Runs inline on the search thread, so a slow observer slows the search.
/// Returning an error aborts the search immediately
pub trait StepTracer {
    fn observe(&mut self, step: &SearchStep) -> Result<(), PlannerError>;
}

/// Tracer that discards every step
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

impl StepTracer for NoopTracer {
    fn observe(&mut self, _step: &SearchStep) -> Result<(), PlannerError> {
        Ok(())
    }
}

/// Tracer that keeps every step for later playback
#[derive(Debug, Default)]
pub struct StepRecorder {
    steps: Vec<SearchStep>,
}

impl StepRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[SearchStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<SearchStep> {
        self.steps
    }
}

impl StepTracer for StepRecorder {
    fn observe(&mut self, step: &SearchStep) -> Result<(), PlannerError> {
        self.steps.push(step.clone());
        Ok(())
    }
}
