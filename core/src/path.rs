use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::graph::{Graph, NodeIndex};

/// Extra cost for moving between two node ids, added to the edge cost.
pub type Heuristic<'a> = &'a dyn Fn(&str, &str) -> f64;

/// How to derive a cost map from a graph.
#[derive(Clone, Copy, Default)]
pub struct AdjacencyOptions<'a> {
    /// Only fill the source→target direction of each edge.
    pub directed: bool,
    /// Treat each edge's second endpoint as its source.
    pub reversed: bool,
    /// Scale every row to sum to 1 (a transition-probability matrix).
    pub stochastic: bool,
    pub heuristic: Option<Heuristic<'a>>,
}

/// Per-source traversal costs: `cost = 1 - weight / 2 + heuristic(id1, id2)`.
///
/// Rows are indexed by node slot and keep edge insertion order, which makes
/// every algorithm built on them deterministic for a fixed graph.
#[derive(Debug, Clone)]
pub struct CostMap {
    rows: Vec<Vec<(NodeIndex, f64)>>,
    ids: Vec<String>,
    index: HashMap<String, NodeIndex>,
}

impl CostMap {
    /// Cost of moving from `id1` to `id2`, `None` if there is no such move.
    pub fn cost(&self, id1: &str, id2: &str) -> Option<f64> {
        let from = *self.index.get(id1)?;
        let to = *self.index.get(id2)?;
        self.row_at(from)
            .iter()
            .find(|(n, _)| *n == to)
            .map(|&(_, c)| c)
    }

    /// Outgoing moves from `id` as (neighbor id, cost) pairs.
    pub fn row(&self, id: &str) -> Vec<(&str, f64)> {
        match self.index.get(id) {
            Some(&from) => self
                .row_at(from)
                .iter()
                .map(|&(n, c)| (self.ids[n].as_str(), c))
                .collect(),
            None => Vec::new(),
        }
    }

    pub(crate) fn row_at(&self, idx: NodeIndex) -> &[(NodeIndex, f64)] {
        self.rows.get(idx).map(|r| r.as_slice()).unwrap_or(&[])
    }

    fn set(&mut self, from: NodeIndex, to: NodeIndex, cost: f64) {
        let row = &mut self.rows[from];
        match row.iter_mut().find(|(n, _)| *n == to) {
            Some(entry) => entry.1 = cost,
            None => row.push((to, cost)),
        }
    }
}

/// Build the cost map for `graph`.
pub fn adjacency(graph: &Graph, options: &AdjacencyOptions<'_>) -> CostMap {
    let slots = graph.slot_count();
    let mut ids = vec![String::new(); slots];
    let mut index = HashMap::with_capacity(graph.node_count());
    for n in graph.nodes() {
        ids[n.index()] = n.id().to_string();
        index.insert(n.id().to_string(), n.index());
    }

    let mut map = CostMap {
        rows: vec![Vec::new(); slots],
        ids,
        index,
    };

    for e in graph.edges() {
        let (from, to, from_id, to_id) = if options.reversed {
            (e.node2(), e.node1(), e.target(), e.source())
        } else {
            (e.node1(), e.node2(), e.source(), e.target())
        };

        let mut cost = 1.0 - e.weight() * 0.5;
        if let Some(heuristic) = options.heuristic {
            cost += heuristic(from_id, to_id);
        }

        map.set(from, to, cost);
        if !options.directed {
            map.set(to, from, cost);
        }
    }

    if options.stochastic {
        for row in &mut map.rows {
            let total: f64 = row.iter().map(|&(_, c)| c).sum();
            if total != 0.0 {
                for entry in row.iter_mut() {
                    entry.1 /= total;
                }
            }
        }
    }

    map
}

/// Min-heap entry ordered by cost, then by push sequence so equal costs pop
/// in insertion order.
#[derive(Debug, Clone, Copy)]
pub(crate) struct QueueItem {
    pub cost: f64,
    pub seq: u64,
    pub node: NodeIndex,
    pub pred: NodeIndex,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behavior on BinaryHeap.
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Least-cost path from `id1` to `id2`, both inclusive.
///
/// Returns `None` if either id is unknown or `id2` is unreachable.
/// `directed` restricts each edge to its insertion orientation.
pub fn dijkstra_shortest_path(
    graph: &Graph,
    id1: &str,
    id2: &str,
    heuristic: Option<Heuristic<'_>>,
    directed: bool,
) -> Option<Vec<String>> {
    let start = graph.index_of(id1)?;
    let end = graph.index_of(id2)?;
    if start == end {
        return Some(vec![id1.to_string()]);
    }

    let costs = adjacency(
        graph,
        &AdjacencyOptions {
            directed,
            heuristic,
            ..AdjacencyOptions::default()
        },
    );

    let slots = graph.slot_count();
    let mut best = vec![f64::INFINITY; slots];
    let mut parent: Vec<Option<NodeIndex>> = vec![None; slots];
    let mut done = vec![false; slots];
    let mut heap = BinaryHeap::new();
    let mut seq = 0u64;

    best[start] = 0.0;
    heap.push(QueueItem {
        cost: 0.0,
        seq,
        node: start,
        pred: start,
    });

    while let Some(QueueItem { cost, node, .. }) = heap.pop() {
        if done[node] {
            continue;
        }
        done[node] = true;

        if node == end {
            return Some(reconstruct_path(graph, &parent, start, end));
        }

        for &(next, step) in costs.row_at(node) {
            if done[next] {
                continue;
            }
            let candidate = cost + step;
            if candidate < best[next] {
                best[next] = candidate;
                parent[next] = Some(node);
                seq += 1;
                heap.push(QueueItem {
                    cost: candidate,
                    seq,
                    node: next,
                    pred: node,
                });
            }
        }
    }

    None
}

/// Walk parent pointers from `end` back to `start`.
fn reconstruct_path(
    graph: &Graph,
    parent: &[Option<NodeIndex>],
    start: NodeIndex,
    end: NodeIndex,
) -> Vec<String> {
    let mut path = Vec::new();
    let mut current = end;
    loop {
        if let Some(n) = graph.node_at(current) {
            path.push(n.id().to_string());
        }
        if current == start {
            break;
        }
        match parent[current] {
            Some(p) => current = p,
            None => break,
        }
    }
    path.reverse();
    path
}

impl Graph {
    /// Node ids on the least-cost path between two nodes, if one exists.
    pub fn shortest_path(
        &self,
        id1: &str,
        id2: &str,
        heuristic: Option<Heuristic<'_>>,
        directed: bool,
    ) -> Option<Vec<String>> {
        dijkstra_shortest_path(self, id1, id2, heuristic, directed)
    }
}
