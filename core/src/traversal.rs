use crate::error::{Error, Result};
use crate::graph::{Edge, Graph, Node, NodeIndex};

/// Which edges a search may follow out of the current node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalDirection {
    /// Only edges whose first endpoint is the current node.
    Outgoing,
    /// Only edges whose second endpoint is the current node.
    Incoming,
    /// Any incident edge.
    Both,
}

impl TraversalDirection {
    /// Gate for [`depth_first_search`]'s `traversable` argument.
    pub fn admits(self, current: &Node, edge: &Edge) -> bool {
        match self {
            TraversalDirection::Outgoing => edge.node1() == current.index(),
            TraversalDirection::Incoming => edge.node2() == current.index(),
            TraversalDirection::Both => true,
        }
    }
}

/// Depth-first search from `root` in adjacency order.
///
/// `visit` sees each reached node once, in pre-order; returning true stops
/// the whole search and makes it return `Ok(true)`. `traversable(current,
/// edge)` decides whether the search may cross `edge` out of `current`.
/// Visited state lives in a bitset owned by this call.
///
/// Returns `Error::NodeNotFound` if `root` is not in the graph.
pub fn depth_first_search<V, T>(
    graph: &Graph,
    root: &str,
    mut visit: V,
    mut traversable: T,
) -> Result<bool>
where
    V: FnMut(&Node) -> bool,
    T: FnMut(&Node, &Edge) -> bool,
{
    let start = graph
        .node(root)
        .ok_or_else(|| Error::NodeNotFound(root.to_string()))?;

    if visit(start) {
        return Ok(true);
    }

    let mut visited = vec![false; graph.slot_count()];
    visited[start.index()] = true;

    // Each frame is a node plus the position of the next link to try,
    // mirroring a recursive descent.
    let mut stack: Vec<(NodeIndex, usize)> = vec![(start.index(), 0)];

    while let Some(frame) = stack.last_mut() {
        let (current, next) = *frame;
        let node = match graph.node_at(current) {
            Some(node) => node,
            None => {
                stack.pop();
                continue;
            }
        };
        let link = match node.links().get(next) {
            Some(link) => *link,
            None => {
                stack.pop();
                continue;
            }
        };
        frame.1 += 1;

        if visited[link.neighbor] {
            continue;
        }
        let edge = match graph.edge_at(link.edge) {
            Some(edge) => edge,
            None => continue,
        };
        if !traversable(node, edge) {
            continue;
        }
        let neighbor = match graph.node_at(link.neighbor) {
            Some(neighbor) => neighbor,
            None => continue,
        };

        if visit(neighbor) {
            return Ok(true);
        }
        visited[link.neighbor] = true;
        stack.push((link.neighbor, 0));
    }

    Ok(false)
}

/// True if `to` can be reached from `from` over edges `direction` admits.
///
/// An unknown `to` is simply unreachable; an unknown `from` is an error.
pub fn can_reach(graph: &Graph, from: &str, to: &str, direction: TraversalDirection) -> Result<bool> {
    depth_first_search(
        graph,
        from,
        |n| n.id() == to,
        |current, edge| direction.admits(current, edge),
    )
}

impl Graph {
    pub fn can_reach(&self, from: &str, to: &str, direction: TraversalDirection) -> Result<bool> {
        can_reach(self, from, to, direction)
    }
}
