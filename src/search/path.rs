use super::NodeMap;
use crate::terrain::Cell;

/// Walk a frontier's parent chain from the given index back to its root
/// Returns the cells in walk order, starting at the given cell and ending
/// at a root (a cell whose parent index is usize::MAX)
/// Every index in the map was produced by the same map's insertions, so the
/// walk always terminates at a root
pub(crate) fn chain_to_root(nodes: &NodeMap, from_index: usize) -> Vec<Cell> {
    let mut chain = Vec::new();
    let mut current_index = from_index;

    while current_index != usize::MAX {
        let Some((cell, &(parent_index, _))) = nodes.get_index(current_index) else {
            break;
        };
        chain.push(*cell);
        current_index = parent_index;
    }

    chain
}
