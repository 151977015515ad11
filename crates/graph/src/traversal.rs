use crate::error::Result;
use crate::store::GraphStore;
use crate::types::{Direction, EdgeType, NodeKey};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// One node reached during prerequisite traversal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraversalHop {
    pub key: NodeKey,
    /// Hops from the start node (1 = direct prerequisite)
    pub depth: usize,
    /// Weight of the edge that reached this node
    pub strength: f32,
}

/// Bounded-depth BFS over HAS_PREREQUISITE edges.
///
/// Visited-set de-duplication guarantees termination even when the
/// prerequisite edges contain a cycle; cycles are not expected but must
/// not hang a query. The start node itself is never reported.
pub(crate) async fn prerequisite_traversal(
    store: &dyn GraphStore,
    start: &NodeKey,
    direction: Direction,
    max_depth: usize,
) -> Result<Vec<TraversalHop>> {
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(start.id());

    let mut queue: VecDeque<(NodeKey, usize)> = VecDeque::new();
    queue.push_back((start.clone(), 0));

    let mut hops = Vec::new();
    while let Some((key, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        for (neighbor, strength) in store
            .neighbors(&key, EdgeType::HasPrerequisite, direction)
            .await?
        {
            if !visited.insert(neighbor.id()) {
                continue;
            }
            hops.push(TraversalHop {
                key: neighbor.clone(),
                depth: depth + 1,
                strength,
            });
            queue.push_back((neighbor, depth + 1));
        }
    }
    Ok(hops)
}
