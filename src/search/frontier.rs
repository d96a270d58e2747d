use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::NotNan;

use crate::collections::FxIndexSet;
use crate::terrain::Cell;


/// Entry in the open structure
/// Ordered by (priority, seq) ascending; seq is assigned at push time and
/// strictly increases, so equal priorities always pop in insertion order
#[derive(Debug, Clone, Copy)]
struct FrontierEntry {
    priority: NotNan<f64>,
    seq: u64,
    cell: Cell,
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the BinaryHeap pops the smallest entry first
        (other.priority, other.seq).cmp(&(self.priority, self.seq))
    }
}
impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}
impl Eq for FrontierEntry {}


/// Priority queue over candidate cells with lazy deletion
/// There is no decrease-key: improving a cell's priority pushes a second
/// entry, and the stale one is filtered out against the visited set at pop
/// time. This stays correct because the engine only pushes on a strict
/// improvement of g, so a cell popped once fresh is never improved again
#[derive(Debug, Default)]
pub(crate) struct Frontier {
    heap: BinaryHeap<FrontierEntry>,
    next_seq: u64,
}

impl Frontier {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert a cell, assigning it the next insertion-sequence number
    /// A NaN priority is pushed as infinity so it sorts last
    pub(crate) fn push(&mut self, priority: f64, cell: Cell) {
        let priority = NotNan::new(priority)
            .unwrap_or_else(|_| NotNan::new(f64::INFINITY).unwrap());
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(FrontierEntry { priority, seq, cell });
    }

    /// Remove and return the lowest-priority cell not yet finalized
    /// Stale entries for already-visited cells are discarded along the way
    /// Returns None once the queue holds nothing fresh
    pub(crate) fn pop_fresh(&mut self, visited: &FxIndexSet<Cell>) -> Option<Cell> {
        while let Some(entry) = self.heap.pop() {
            if !visited.contains(&entry.cell) {
                return Some(entry.cell);
            }
        }
        None
    }

    /// Smallest queued priority, without removal
    /// Used by the engine to decide which frontier to advance next
    pub(crate) fn peek_priority(&self) -> Option<NotNan<f64>> {
        self.heap.peek().map(|entry| entry.priority)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Every queued cell, stale entries included, in no particular order
    /// Callers snapshotting the open set sort and deduplicate the result
    pub(crate) fn open_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.heap.iter().map(|entry| entry.cell)
    }
}
