use std::collections::{BTreeSet, HashSet, VecDeque};
use std::hash::Hash;

use crate::graph::{Graph, Node, NodeIndex};

/// Which nodes seed a [`subgraph`].
pub enum Selection<'a> {
    /// Explicit ids; unknown ids are skipped.
    Ids(Vec<&'a str>),
    /// Every node the predicate accepts.
    Predicate(&'a dyn Fn(&Node) -> bool),
}

impl<'a> From<Vec<&'a str>> for Selection<'a> {
    fn from(ids: Vec<&'a str>) -> Self {
        Selection::Ids(ids)
    }
}

impl<'a> From<&'a [String]> for Selection<'a> {
    fn from(ids: &'a [String]) -> Self {
        Selection::Ids(ids.iter().map(|s| s.as_str()).collect())
    }
}

impl<'a> From<&'a dyn Fn(&Node) -> bool> for Selection<'a> {
    fn from(predicate: &'a dyn Fn(&Node) -> bool) -> Self {
        Selection::Predicate(predicate)
    }
}

/// Nodes within `distance` hops of `start`, layer by layer, `start` first.
pub(crate) fn flatten_indices(graph: &Graph, start: NodeIndex, distance: usize) -> Vec<NodeIndex> {
    if graph.node_at(start).is_none() {
        return Vec::new();
    }

    let mut seen = vec![false; graph.slot_count()];
    let mut order = vec![start];
    let mut queue = VecDeque::new();
    seen[start] = true;
    queue.push_back((start, 0usize));

    while let Some((current, depth)) = queue.pop_front() {
        if depth >= distance {
            continue;
        }
        for next in graph.neighbors(current) {
            if !seen[next] {
                seen[next] = true;
                order.push(next);
                queue.push_back((next, depth + 1));
            }
        }
    }
    order
}

/// Ids within `distance` hops of `id`, deduplicated, `id` first.
///
/// Distance 0 yields just `[id]`; an unknown id yields nothing.
pub fn flatten(graph: &Graph, id: &str, distance: usize) -> Vec<String> {
    match graph.index_of(id) {
        Some(start) => ids_of(graph, &flatten_indices(graph, start, distance)),
        None => Vec::new(),
    }
}

fn ids_of(graph: &Graph, indices: &[NodeIndex]) -> Vec<String> {
    indices
        .iter()
        .filter_map(|&i| graph.node_at(i))
        .map(|n| n.id().to_string())
        .collect()
}

/// Items in first-seen order with duplicates dropped.
pub fn unique<T: Eq + Hash + Clone>(items: &[T]) -> Vec<T> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .iter()
        .filter(|item| seen.insert(*item))
        .cloned()
        .collect()
}

/// Items of `a`, then items of `b` not already present.
pub fn union<T: Eq + Hash + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let mut seen = HashSet::with_capacity(a.len() + b.len());
    a.iter()
        .chain(b.iter())
        .filter(|item| seen.insert(*item))
        .cloned()
        .collect()
}

/// Items of `a` that also occur in `b`, in `a`'s order.
pub fn intersection<T: Eq + Hash + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let other: HashSet<&T> = b.iter().collect();
    let mut seen = HashSet::new();
    a.iter()
        .filter(|item| other.contains(item) && seen.insert(*item))
        .cloned()
        .collect()
}

/// Items of `a` that do not occur in `b`, in `a`'s order.
pub fn difference<T: Eq + Hash + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    let other: HashSet<&T> = b.iter().collect();
    let mut seen = HashSet::new();
    a.iter()
        .filter(|item| !other.contains(item) && seen.insert(*item))
        .cloned()
        .collect()
}

/// Induced subgraph over the `distance`-neighborhoods of the selected nodes.
///
/// The result is a fresh graph with the same settings and styles. Nodes keep
/// their attributes and positions, the root stays the root if it is picked
/// up, and every source edge with both endpoints inside is carried over.
pub fn subgraph(graph: &Graph, selection: &Selection<'_>, distance: usize) -> Graph {
    let seeds: Vec<NodeIndex> = match selection {
        Selection::Ids(ids) => ids.iter().filter_map(|id| graph.index_of(id)).collect(),
        Selection::Predicate(accept) => graph
            .nodes()
            .filter(|n| accept(n))
            .map(|n| n.index())
            .collect(),
    };
    induced(graph, seeds.into_iter().flat_map(|s| flatten_indices(graph, s, distance)))
}

fn induced(graph: &Graph, members: impl IntoIterator<Item = NodeIndex>) -> Graph {
    let mut g = graph.copy(true);
    let mut inside = vec![false; graph.slot_count()];
    let root = graph.root().map(|r| r.index());

    for idx in members {
        if inside[idx] {
            continue;
        }
        if let Some(n) = graph.node_at(idx) {
            inside[idx] = true;
            g.import_node(n, root == Some(idx));
        }
    }
    for e in graph.edges() {
        if inside[e.node1()] && inside[e.node2()] {
            g.import_edge(e);
        }
    }
    g
}

/// One clique containing `id`, built greedily.
///
/// Walks the nodes in insertion order and keeps every node adjacent to all
/// members so far. The result is maximal but not necessarily maximum.
pub fn clique(graph: &Graph, id: &str) -> Vec<String> {
    let start = match graph.index_of(id) {
        Some(start) => start,
        None => return Vec::new(),
    };

    let mut members = vec![start];
    for n in graph.nodes() {
        if n.index() == start || n.degree() < members.len() {
            continue;
        }
        if members
            .iter()
            .all(|&m| n.links().iter().any(|l| l.neighbor == m))
        {
            members.push(n.index());
        }
    }
    ids_of(graph, &members)
}

/// Greedy cliques of at least `threshold` members, one per distinct member
/// set, in the order their first seed node was inserted.
pub fn cliques(graph: &Graph, threshold: usize) -> Vec<Vec<String>> {
    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut found = Vec::new();
    for n in graph.nodes() {
        let members = clique(graph, n.id());
        if members.len() < threshold {
            continue;
        }
        let mut key = members.clone();
        key.sort();
        if seen.insert(key) {
            found.push(members);
        }
    }
    found
}

/// True if every pair of nodes is connected.
pub fn is_clique(graph: &Graph) -> bool {
    graph.density() >= 1.0
}

/// Connected components as induced subgraphs, largest first.
///
/// Each node's one-hop neighborhood is a candidate; candidates sharing any
/// node merge until no two overlap. Equal-sized components keep the order
/// of their earliest node.
pub fn partition(graph: &Graph) -> Vec<Graph> {
    let mut groups: Vec<BTreeSet<NodeIndex>> = Vec::new();

    for n in graph.nodes() {
        let mut candidate: BTreeSet<NodeIndex> =
            flatten_indices(graph, n.index(), 1).into_iter().collect();

        // Absorb every group the candidate touches; the merged group takes
        // the slot of the first one so component order stays stable.
        let mut slot = None;
        let mut i = 0;
        while i < groups.len() {
            if groups[i].is_disjoint(&candidate) {
                i += 1;
                continue;
            }
            let group = groups.remove(i);
            candidate.extend(group);
            slot.get_or_insert(i);
        }
        groups.insert(slot.unwrap_or(groups.len()), candidate);
    }

    groups.sort_by(|a, b| b.len().cmp(&a.len()));
    tracing::debug!(
        components = groups.len(),
        nodes = graph.node_count(),
        "graph partitioned"
    );
    groups
        .into_iter()
        .map(|members| induced(graph, members))
        .collect()
}

impl Graph {
    /// Induced subgraph over the `distance`-neighborhoods of a selection.
    pub fn subgraph(&self, selection: &Selection<'_>, distance: usize) -> Graph {
        subgraph(self, selection, distance)
    }

    /// Leaves and everything within `depth - 1` hops of them.
    pub fn fringe(&self, depth: usize) -> Vec<String> {
        let reach = depth.saturating_sub(1);
        let all: Vec<String> = self
            .leaves()
            .iter()
            .flat_map(|leaf| flatten(self, leaf.id(), reach))
            .collect();
        unique(&all)
    }

    /// Both graphs merged into a copy of `self`. Nodes and edges already
    /// present in `self` keep their attributes.
    pub fn join(&self, other: &Graph) -> Graph {
        let mut g = self.copy(false);
        let other_root = other.root().map(|r| r.index());
        for n in other.nodes() {
            let root = g.root().is_none() && other_root == Some(n.index());
            g.import_node(n, root);
        }
        for e in other.edges() {
            g.import_edge(e);
        }
        g
    }

    /// Nodes present in both graphs, with every edge the joined graph has
    /// between them.
    pub fn intersect(&self, other: &Graph) -> Graph {
        let ids = intersection(&self.node_ids(), &other.node_ids());
        self.join(other).subgraph(&Selection::from(ids.as_slice()), 0)
    }

    /// Nodes of `self` absent from `other`, with every edge the joined
    /// graph has between them.
    pub fn subtract(&self, other: &Graph) -> Graph {
        let ids = difference(&self.node_ids(), &other.node_ids());
        self.join(other).subgraph(&Selection::from(ids.as_slice()), 0)
    }

    /// Ids in both nodes' `distance`-neighborhoods.
    pub fn node_and(&self, id1: &str, id2: &str, distance: usize) -> Vec<String> {
        intersection(&flatten(self, id1, distance), &flatten(self, id2, distance))
    }

    /// Ids in either node's `distance`-neighborhood.
    pub fn node_or(&self, id1: &str, id2: &str, distance: usize) -> Vec<String> {
        union(&flatten(self, id1, distance), &flatten(self, id2, distance))
    }

    /// Ids in the first node's `distance`-neighborhood but not the second's.
    pub fn node_sub(&self, id1: &str, id2: &str, distance: usize) -> Vec<String> {
        difference(&flatten(self, id1, distance), &flatten(self, id2, distance))
    }

    pub fn is_clique(&self) -> bool {
        is_clique(self)
    }

    /// Subgraph around the greedy clique containing `id`.
    pub fn clique_graph(&self, id: &str, distance: usize) -> Graph {
        let members = clique(self, id);
        self.subgraph(&Selection::from(members.as_slice()), distance)
    }

    /// Subgraphs around every distinct clique of at least `threshold` nodes.
    pub fn clique_graphs(&self, threshold: usize, distance: usize) -> Vec<Graph> {
        cliques(self, threshold)
            .iter()
            .map(|members| self.subgraph(&Selection::from(members.as_slice()), distance))
            .collect()
    }

    /// Connected components, largest first.
    pub fn split(&self) -> Vec<Graph> {
        partition(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeAttrs, NodeAttrs};

    fn make_graph(edges: &[(&str, &str)]) -> Graph {
        let mut g = Graph::new();
        for (a, b) in edges {
            g.add_edge(a, b, EdgeAttrs::default());
        }
        g
    }

    fn make_chain(n: usize) -> Graph {
        let mut g = Graph::new();
        for i in 0..n - 1 {
            g.add_edge(&i.to_string(), &(i + 1).to_string(), EdgeAttrs::default());
        }
        g
    }

    fn two_triangles() -> Graph {
        make_graph(&[
            ("a", "b"),
            ("b", "c"),
            ("c", "a"),
            ("x", "y"),
            ("y", "z"),
            ("z", "x"),
        ])
    }

    // --- Flatten ---

    #[test]
    fn test_flatten_depths() {
        let g = make_chain(5);
        assert_eq!(flatten(&g, "2", 0), vec!["2"]);
        assert_eq!(flatten(&g, "2", 1), vec!["2", "1", "3"]);
        assert_eq!(flatten(&g, "2", 2), vec!["2", "1", "3", "0", "4"]);
        assert_eq!(flatten(&g, "2", 10).len(), 5);
    }

    #[test]
    fn test_flatten_cycle_deduplicates() {
        let g = make_graph(&[("a", "b"), ("b", "c"), ("c", "a")]);
        assert_eq!(flatten(&g, "a", 3), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_flatten_unknown_id() {
        let g = make_chain(3);
        assert!(flatten(&g, "missing", 2).is_empty());
    }

    // --- Set operations ---

    #[test]
    fn test_set_operations() {
        let a = vec!["1", "2", "3", "2"];
        let b = vec!["3", "4", "1"];
        assert_eq!(unique(&a), vec!["1", "2", "3"]);
        assert_eq!(union(&a, &b), vec!["1", "2", "3", "4"]);
        assert_eq!(intersection(&a, &b), vec!["1", "3"]);
        assert_eq!(difference(&a, &b), vec!["2"]);
        assert!(intersection(&a, &[]).is_empty());
    }

    #[test]
    fn test_node_neighborhood_algebra() {
        let g = make_chain(5);
        assert_eq!(g.node_and("1", "3", 1), vec!["2"]);
        assert_eq!(g.node_or("0", "4", 1), vec!["0", "1", "4", "3"]);
        assert_eq!(g.node_sub("1", "3", 1), vec!["1", "0"]);
    }

    // --- Subgraph ---

    #[test]
    fn test_subgraph_by_ids() {
        let g = make_chain(6);
        let sub = g.subgraph(&Selection::Ids(vec!["2"]), 1);
        assert_eq!(sub.node_ids(), vec!["2", "1", "3"]);
        assert_eq!(sub.edge_count(), 2);
        assert!(sub.adjacent("1", "2"));
        assert!(!sub.contains("0"));
    }

    #[test]
    fn test_subgraph_by_predicate() {
        let mut g = make_chain(6);
        g.node_mut("0").unwrap().category = "end".into();
        g.node_mut("5").unwrap().category = "end".into();
        let is_end = |n: &Node| n.category == "end";
        let sub = g.subgraph(&Selection::Predicate(&is_end), 0);
        assert_eq!(sub.node_ids(), vec!["0", "5"]);
        assert_eq!(sub.edge_count(), 0);
        assert_eq!(sub.node("0").unwrap().category, "end");
    }

    #[test]
    fn test_subgraph_keeps_root_and_edge_attrs() {
        let mut g = Graph::new();
        g.add_node(
            "r",
            NodeAttrs {
                root: true,
                ..NodeAttrs::default()
            },
        );
        g.add_edge(
            "r",
            "s",
            EdgeAttrs {
                weight: 0.4,
                length: 2.0,
                label: "rs".into(),
            },
        );
        let sub = g.subgraph(&Selection::Ids(vec!["s"]), 1);
        assert_eq!(sub.root().unwrap().id(), "r");
        let e = sub.edge("s", "r").unwrap();
        assert_eq!(e.weight(), 0.4);
        assert_eq!(e.length(), 2.0);
        assert_eq!(e.source(), "r");
    }

    #[test]
    fn test_subgraph_unknown_ids_skipped() {
        let g = make_chain(3);
        let sub = g.subgraph(&Selection::Ids(vec!["nope", "0"]), 0);
        assert_eq!(sub.node_ids(), vec!["0"]);
    }

    // --- Cliques ---

    #[test]
    fn test_clique_greedy() {
        // a-b-c triangle plus a pendant d on a.
        let g = make_graph(&[("a", "b"), ("b", "c"), ("c", "a"), ("a", "d")]);
        assert_eq!(clique(&g, "a"), vec!["a", "b", "c"]);
        assert_eq!(clique(&g, "d"), vec!["d", "a"]);
        assert!(clique(&g, "missing").is_empty());
    }

    #[test]
    fn test_cliques_deduplicated() {
        let g = make_graph(&[("a", "b"), ("b", "c"), ("c", "a"), ("a", "d")]);
        let found = cliques(&g, 3);
        assert_eq!(found, vec![vec!["a", "b", "c"]]);
        assert_eq!(cliques(&g, 2).len(), 2);
    }

    #[test]
    fn test_clique_graphs() {
        let g = two_triangles();
        let graphs = g.clique_graphs(3, 0);
        assert_eq!(graphs.len(), 2);
        assert!(graphs.iter().all(|c| c.is_clique()));
        let around = g.clique_graph("a", 0);
        assert_eq!(around.node_count(), 3);
        assert_eq!(around.edge_count(), 3);
    }

    #[test]
    fn test_is_clique() {
        assert!(make_graph(&[("a", "b"), ("b", "c"), ("c", "a")]).is_clique());
        assert!(!make_chain(3).is_clique());
    }

    // --- Partition ---

    #[test]
    fn test_partition_two_triangles() {
        let parts = two_triangles().split();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].node_ids(), vec!["a", "b", "c"]);
        assert_eq!(parts[1].node_ids(), vec!["x", "y", "z"]);
        assert!(parts.iter().all(|p| p.edge_count() == 3));
    }

    #[test]
    fn test_partition_largest_first() {
        let mut g = make_graph(&[("p", "q")]);
        for (a, b) in [("a", "b"), ("b", "c"), ("c", "d")] {
            g.add_edge(a, b, EdgeAttrs::default());
        }
        g.add_node("solo", NodeAttrs::default());
        let sizes: Vec<usize> = partition(&g).iter().map(|p| p.node_count()).collect();
        assert_eq!(sizes, vec![4, 2, 1]);
    }

    #[test]
    fn test_partition_merges_late_bridge() {
        // The bridge node is inserted last and joins two earlier groups.
        let mut g = make_graph(&[("a", "b"), ("c", "d")]);
        g.add_edge("bridge", "b", EdgeAttrs::default());
        g.add_edge("bridge", "c", EdgeAttrs::default());
        let parts = partition(&g);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].node_count(), 5);
    }

    #[test]
    fn test_partition_empty() {
        assert!(partition(&Graph::new()).is_empty());
    }

    // --- Graph algebra ---

    #[test]
    fn test_join_intersect_subtract() {
        let left = make_graph(&[("a", "b"), ("b", "c")]);
        let right = make_graph(&[("b", "c"), ("c", "d")]);

        let joined = left.join(&right);
        assert_eq!(joined.node_ids(), vec!["a", "b", "c", "d"]);
        assert_eq!(joined.edge_count(), 3);

        let both = left.intersect(&right);
        assert_eq!(both.node_ids(), vec!["b", "c"]);
        assert_eq!(both.edge_count(), 1);

        let only_left = left.subtract(&right);
        assert_eq!(only_left.node_ids(), vec!["a"]);
        assert_eq!(only_left.edge_count(), 0);
    }

    #[test]
    fn test_join_takes_other_root_when_missing() {
        let left = make_graph(&[("a", "b")]);
        let mut right = make_graph(&[("c", "d")]);
        right.set_root("d");
        assert_eq!(left.join(&right).root().unwrap().id(), "d");
    }

    #[test]
    fn test_fringe() {
        let g = make_chain(5);
        assert_eq!(g.fringe(1), vec!["0", "4"]);
        assert_eq!(g.fringe(2), vec!["0", "1", "4", "3"]);
    }
}
