//! Betweenness and eigenvector centrality over the traversal cost map.
//!
//! Both algorithms cache their scores on the nodes they were computed for.
//! Any structural mutation clears those caches, and the lazy accessors on
//! [`Graph`] recompute on demand.

use std::collections::{BinaryHeap, HashMap};
use std::time::Instant;

use rand::Rng;

use crate::graph::{Graph, NodeIndex};
use crate::path::{adjacency, AdjacencyOptions, QueueItem};

/// Brandes betweenness from every node as source.
///
/// Distances come from the cost map, so strong edges are shorter. With
/// `normalized`, scores are divided by the largest one (by 1 if every score
/// is zero). Scores are cached on the nodes.
pub fn brandes_betweenness_centrality(
    graph: &mut Graph,
    normalized: bool,
    directed: bool,
) -> HashMap<String, f64> {
    let started = Instant::now();
    let costs = adjacency(
        graph,
        &AdjacencyOptions {
            directed,
            ..AdjacencyOptions::default()
        },
    );

    let slots = graph.slot_count();
    let live: Vec<NodeIndex> = graph.nodes().map(|n| n.index()).collect();
    let mut betweenness = vec![0.0f64; slots];

    // Per-source scratch, reset between sources.
    let mut order: Vec<NodeIndex> = Vec::with_capacity(live.len());
    let mut preds: Vec<Vec<NodeIndex>> = vec![Vec::new(); slots];
    let mut sigma = vec![0.0f64; slots];
    let mut delta = vec![0.0f64; slots];
    let mut seen = vec![f64::INFINITY; slots];
    let mut done = vec![false; slots];
    let mut heap = BinaryHeap::new();

    for &s in &live {
        order.clear();
        for &v in &live {
            preds[v].clear();
            sigma[v] = 0.0;
            delta[v] = 0.0;
            seen[v] = f64::INFINITY;
            done[v] = false;
        }

        let mut seq = 0u64;
        sigma[s] = 1.0;
        seen[s] = 0.0;
        heap.push(QueueItem {
            cost: 0.0,
            seq,
            node: s,
            pred: s,
        });

        while let Some(QueueItem {
            cost, node: v, pred, ..
        }) = heap.pop()
        {
            if done[v] {
                continue;
            }
            if v != pred {
                sigma[v] += sigma[pred];
            }
            done[v] = true;
            order.push(v);

            for &(w, step) in costs.row_at(v) {
                let dist = cost + step;
                if !done[w] && dist < seen[w] {
                    seen[w] = dist;
                    seq += 1;
                    heap.push(QueueItem {
                        cost: dist,
                        seq,
                        node: w,
                        pred: v,
                    });
                    sigma[w] = 0.0;
                    preds[w].clear();
                    preds[w].push(v);
                } else if dist == seen[w] {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        // Dependencies accumulate in reverse finishing order.
        while let Some(w) = order.pop() {
            let coefficient = (1.0 + delta[w]) / sigma[w];
            for &v in &preds[w] {
                delta[v] += sigma[v] * coefficient;
            }
            if w != s {
                betweenness[w] += delta[w];
            }
        }
    }

    if normalized {
        let max = live
            .iter()
            .map(|&v| betweenness[v])
            .fold(0.0f64, f64::max);
        let m = if max == 0.0 { 1.0 } else { max };
        for &v in &live {
            betweenness[v] /= m;
        }
    }

    tracing::trace!(
        nodes = live.len(),
        normalized,
        directed,
        elapsed_us = started.elapsed().as_micros() as u64,
        "betweenness computed"
    );

    let scores = store_scores(graph, &live, &betweenness, Graph::store_betweenness);
    graph.cached.betweenness = Some((normalized, directed));
    scores
}

/// Options for [`eigenvector_centrality`].
#[derive(Debug, Clone, Copy)]
pub struct EigenvectorOptions<'a> {
    /// Rescale converged scores so the largest is 1.
    pub normalized: bool,
    /// Score nodes by incoming rather than outgoing edges.
    pub reversed: bool,
    /// Per-node multiplier; absent ids rate 1.
    pub rating: Option<&'a HashMap<String, f64>>,
    /// Initial vector; absent ids start at 0. Random when `None`.
    pub start: Option<&'a HashMap<String, f64>>,
    pub iterations: usize,
    pub tolerance: f64,
}

impl Default for EigenvectorOptions<'_> {
    fn default() -> Self {
        Self {
            normalized: true,
            reversed: true,
            rating: None,
            start: None,
            iterations: 100,
            tolerance: 1e-4,
        }
    }
}

impl EigenvectorOptions<'_> {
    fn is_default(&self) -> bool {
        let default = EigenvectorOptions::default();
        self.normalized == default.normalized
            && self.reversed == default.reversed
            && self.rating.is_none()
            && self.start.is_none()
            && self.iterations == default.iterations
            && self.tolerance == default.tolerance
    }
}

/// Result of a power iteration run.
#[derive(Debug, Clone, PartialEq)]
pub struct Eigenvector {
    pub scores: HashMap<String, f64>,
    /// False when the iteration budget ran out; every score is then 0.
    pub converged: bool,
    /// Iterations actually performed.
    pub iterations: usize,
}

/// Eigenvector centrality by power iteration on the directed cost map.
///
/// Every iterate is `x[n] = Σ (0.01 + x0[nbr] * W[n][nbr] * rating(n))` over
/// the cost-map row of `n`, normalized to sum 1. The run converges once the
/// L1 change drops below `node_count * tolerance`.
pub fn eigenvector_centrality(graph: &mut Graph, options: &EigenvectorOptions<'_>) -> Eigenvector {
    let live: Vec<NodeIndex> = graph.nodes().map(|n| n.index()).collect();
    if live.is_empty() {
        return Eigenvector {
            scores: HashMap::new(),
            converged: true,
            iterations: 0,
        };
    }

    let costs = adjacency(
        graph,
        &AdjacencyOptions {
            directed: true,
            reversed: options.reversed,
            ..AdjacencyOptions::default()
        },
    );

    let slots = graph.slot_count();
    let mut rating = vec![1.0f64; slots];
    if let Some(table) = options.rating {
        for &n in &live {
            if let Some(r) = graph.node_at(n).and_then(|node| table.get(node.id())) {
                rating[n] = *r;
            }
        }
    }

    let mut x = vec![0.0f64; slots];
    match options.start {
        Some(start) => {
            for &n in &live {
                if let Some(v) = graph.node_at(n).and_then(|node| start.get(node.id())) {
                    x[n] = *v;
                }
            }
        }
        None => {
            for &n in &live {
                x[n] = graph.rng.gen_range(f64::EPSILON..1.0);
            }
        }
    }
    normalize_sum(&mut x, &live);

    let threshold = live.len() as f64 * options.tolerance;
    let mut next = vec![0.0f64; slots];

    for i in 0..options.iterations {
        for &n in &live {
            next[n] = costs
                .row_at(n)
                .iter()
                .fold(0.0, |acc, &(nbr, w)| acc + 0.01 + x[nbr] * w * rating[n]);
        }
        normalize_sum(&mut next, &live);

        let change = live.iter().fold(0.0, |acc, &n| acc + (next[n] - x[n]).abs());
        std::mem::swap(&mut x, &mut next);

        if change < threshold {
            if options.normalized {
                let max = live.iter().map(|&n| x[n]).fold(0.0f64, f64::max);
                let m = if max == 0.0 { 1.0 } else { max };
                for &n in &live {
                    x[n] /= m;
                }
            }
            let scores = store_scores(graph, &live, &x, Graph::store_eigenvalue);
            graph.cached.default_eigenvalue = options.is_default();
            return Eigenvector {
                scores,
                converged: true,
                iterations: i + 1,
            };
        }
    }

    tracing::warn!(
        iterations = options.iterations,
        tolerance = options.tolerance,
        nodes = live.len(),
        "eigenvector centrality did not converge, scores set to 0"
    );
    let zeros = vec![0.0f64; slots];
    let scores = store_scores(graph, &live, &zeros, Graph::store_eigenvalue);
    graph.cached.default_eigenvalue = options.is_default();
    Eigenvector {
        scores,
        converged: false,
        iterations: options.iterations,
    }
}

fn normalize_sum(x: &mut [f64], live: &[NodeIndex]) {
    let sum = live.iter().fold(0.0, |acc, &n| acc + x[n]);
    if sum != 0.0 {
        for &n in live {
            x[n] /= sum;
        }
    }
}

fn store_scores(
    graph: &mut Graph,
    live: &[NodeIndex],
    scores: &[f64],
    store: fn(&mut Graph, NodeIndex, f64),
) -> HashMap<String, f64> {
    let mut out = HashMap::with_capacity(live.len());
    for &n in live {
        store(graph, n, scores[n]);
        if let Some(node) = graph.node_at(n) {
            out.insert(node.id().to_string(), scores[n]);
        }
    }
    out
}

impl Graph {
    /// Run Brandes betweenness and cache the scores on the nodes.
    pub fn betweenness_centrality(&mut self, normalized: bool, directed: bool) -> HashMap<String, f64> {
        brandes_betweenness_centrality(self, normalized, directed)
    }

    /// Run eigenvector centrality and cache the scores on the nodes.
    pub fn eigenvector_centrality(&mut self, options: &EigenvectorOptions<'_>) -> Eigenvector {
        eigenvector_centrality(self, options)
    }

    /// Normalized undirected betweenness of one node. Recomputed unless the
    /// cached scores are of that kind.
    pub fn betweenness(&mut self, id: &str) -> Option<f64> {
        let cached = self.node(id)?.cached_betweenness();
        match cached {
            Some(score) if self.cached.betweenness == Some((true, false)) => Some(score),
            _ => self.betweenness_centrality(true, false).get(id).copied(),
        }
    }

    /// Eigenvector score of one node with default options. Recomputed unless
    /// the cached scores came from default options.
    pub fn eigenvalue(&mut self, id: &str) -> Option<f64> {
        let cached = self.node(id)?.cached_eigenvalue();
        match cached {
            Some(score) if self.cached.default_eigenvalue => Some(score),
            _ => self
                .eigenvector_centrality(&EigenvectorOptions::default())
                .scores
                .get(id)
                .copied(),
        }
    }

    /// Ids of nodes whose betweenness exceeds `threshold`, highest first.
    /// Ties keep insertion order. Pass a negative threshold for every node.
    pub fn nodes_by_betweenness(&mut self, threshold: f64) -> Vec<String> {
        if self.cached.betweenness != Some((true, false))
            || self.nodes().any(|n| n.cached_betweenness().is_none())
        {
            self.betweenness_centrality(true, false);
        }
        rank(self.nodes().map(|n| (n.id(), n.cached_betweenness())), threshold)
    }

    /// Ids of nodes whose eigenvector score exceeds `threshold`, highest
    /// first. Ties keep insertion order.
    pub fn nodes_by_eigenvalue(&mut self, threshold: f64) -> Vec<String> {
        if !self.cached.default_eigenvalue
            || self.nodes().any(|n| n.cached_eigenvalue().is_none())
        {
            self.eigenvector_centrality(&EigenvectorOptions::default());
        }
        rank(self.nodes().map(|n| (n.id(), n.cached_eigenvalue())), threshold)
    }
}

fn rank<'a>(scores: impl Iterator<Item = (&'a str, Option<f64>)>, threshold: f64) -> Vec<String> {
    let mut ranked: Vec<(&str, f64)> = scores
        .map(|(id, score)| (id, score.unwrap_or(0.0)))
        .filter(|&(_, score)| score > threshold)
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.into_iter().map(|(id, _)| id.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;
    use crate::graph::{EdgeAttrs, NodeAttrs};

    fn make_path(ids: &[&str]) -> Graph {
        let mut g = Graph::new();
        for pair in ids.windows(2) {
            g.add_edge(pair[0], pair[1], EdgeAttrs::default());
        }
        g
    }

    /// Edges run leaf → hub, so incoming scoring favors the hub.
    fn make_star(leaves: usize) -> Graph {
        let mut g = Graph::with_config(GraphConfig {
            seed: Some(17),
            ..GraphConfig::default()
        })
        .unwrap();
        for i in 0..leaves {
            g.add_edge(&format!("leaf{}", i), "hub", EdgeAttrs::default());
        }
        g
    }

    // --- Betweenness ---

    #[test]
    fn test_betweenness_path() {
        let mut g = make_path(&["a", "b", "c", "d"]);
        let bc = g.betweenness_centrality(true, false);
        assert_eq!(bc["b"], 1.0);
        assert_eq!(bc["c"], 1.0);
        assert_eq!(bc["a"], 0.0);
        assert_eq!(bc["d"], 0.0);
        assert_eq!(g.node("b").unwrap().cached_betweenness(), Some(1.0));
    }

    #[test]
    fn test_betweenness_unnormalized_counts_ordered_pairs() {
        let mut g = make_path(&["a", "b", "c"]);
        let bc = g.betweenness_centrality(false, false);
        assert_eq!(bc["b"], 2.0);
        assert_eq!(bc["a"], 0.0);
    }

    #[test]
    fn test_betweenness_splits_equal_paths() {
        // s-x-t and s-y-t are equally short.
        let mut g = make_path(&["s", "x", "t"]);
        g.add_edge("s", "y", EdgeAttrs::default());
        g.add_edge("y", "t", EdgeAttrs::default());
        let bc = g.betweenness_centrality(false, false);
        assert!((bc["x"] - bc["y"]).abs() < 1e-12);
        assert!((bc["x"] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_betweenness_directed() {
        let mut g = make_path(&["a", "b", "c"]);
        let bc = g.betweenness_centrality(false, true);
        assert_eq!(bc["b"], 1.0);
    }

    #[test]
    fn test_betweenness_no_paths_is_zero() {
        let mut g = Graph::new();
        g.add_node("a", NodeAttrs::default());
        g.add_node("b", NodeAttrs::default());
        let bc = g.betweenness_centrality(true, false);
        assert!(bc.values().all(|&v| v == 0.0));
        assert!(g.betweenness_centrality(true, false).len() == 2);
        assert!(Graph::new().betweenness_centrality(true, false).is_empty());
    }

    #[test]
    fn test_lazy_betweenness_recomputes_after_mutation() {
        let mut g = make_path(&["a", "b", "c"]);
        assert_eq!(g.betweenness("b"), Some(1.0));
        g.add_edge("a", "c", EdgeAttrs::default());
        assert!(g.node("b").unwrap().cached_betweenness().is_none());
        assert_eq!(g.betweenness("b"), Some(0.0));
        assert_eq!(g.betweenness("missing"), None);
    }

    #[test]
    fn test_lazy_betweenness_ignores_other_variants() {
        let mut g = make_path(&["a", "b", "c", "d"]);
        let directed = g.betweenness_centrality(false, true);
        assert_eq!(directed["b"], 2.0);
        assert_eq!(g.betweenness("b"), Some(1.0));
        assert_eq!(g.cached.betweenness, Some((true, false)));
        assert_eq!(g.node("b").unwrap().cached_betweenness(), Some(1.0));
    }

    #[test]
    fn test_nodes_by_betweenness_recomputes_unnormalized_cache() {
        let mut g = make_path(&["a", "b", "c", "d", "e"]);
        g.betweenness_centrality(false, false);
        assert_eq!(g.nodes_by_betweenness(0.9), vec!["c"]);
    }

    #[test]
    fn test_nodes_by_betweenness_order() {
        let mut g = make_path(&["a", "b", "c", "d", "e"]);
        let ranked = g.nodes_by_betweenness(-1.0);
        assert_eq!(ranked, vec!["c", "b", "d", "a", "e"]);
        assert_eq!(g.nodes_by_betweenness(0.0), vec!["c", "b", "d"]);
    }

    // --- Eigenvector ---

    #[test]
    fn test_eigenvector_star_ranks_hub_first() {
        let mut g = make_star(8);
        let ev = g.eigenvector_centrality(&EigenvectorOptions::default());
        assert!(ev.converged);
        let hub = ev.scores["hub"];
        assert_eq!(hub, 1.0);
        for i in 0..8 {
            assert!(hub > ev.scores[&format!("leaf{}", i)]);
        }
        assert_eq!(g.nodes_by_eigenvalue(0.5), vec!["hub"]);
    }

    #[test]
    fn test_eigenvector_fixed_start_is_reproducible() {
        let start: HashMap<String, f64> = ["hub", "leaf0", "leaf1", "leaf2"]
            .iter()
            .enumerate()
            .map(|(i, id)| (id.to_string(), (i + 1) as f64))
            .collect();
        let options = EigenvectorOptions {
            start: Some(&start),
            ..EigenvectorOptions::default()
        };
        let first = make_star(3).eigenvector_centrality(&options);
        let second = make_star(3).eigenvector_centrality(&options);
        assert_eq!(first, second);
    }

    #[test]
    fn test_eigenvector_seeded_random_start_is_reproducible() {
        let first = make_star(4).eigenvector_centrality(&EigenvectorOptions::default());
        let second = make_star(4).eigenvector_centrality(&EigenvectorOptions::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_eigenvector_non_convergence_yields_zeros() {
        let mut g = make_star(8);
        let mut start: HashMap<String, f64> = HashMap::new();
        start.insert("hub".into(), 0.0);
        for i in 0..8 {
            start.insert(format!("leaf{}", i), 1.0);
        }
        let ev = g.eigenvector_centrality(&EigenvectorOptions {
            start: Some(&start),
            iterations: 1,
            ..EigenvectorOptions::default()
        });
        assert!(!ev.converged);
        assert_eq!(ev.iterations, 1);
        assert_eq!(ev.scores.len(), 9);
        assert!(ev.scores.values().all(|&v| v == 0.0));
        assert_eq!(g.node("hub").unwrap().cached_eigenvalue(), Some(0.0));
    }

    #[test]
    fn test_eigenvector_rating_scales_node() {
        let mut g = make_star(2);
        let mut rating = HashMap::new();
        rating.insert("hub".to_string(), 0.0);
        let ev = g.eigenvector_centrality(&EigenvectorOptions {
            rating: Some(&rating),
            normalized: false,
            ..EigenvectorOptions::default()
        });
        // Only the constant term survives for the hub; leaves have no rows.
        assert!(ev.converged);
        assert!((ev.scores["hub"] - 1.0).abs() < 1e-12);
        assert_eq!(ev.scores["leaf0"], 0.0);
    }

    #[test]
    fn test_eigenvector_empty_graph() {
        let ev = Graph::new().eigenvector_centrality(&EigenvectorOptions::default());
        assert!(ev.converged);
        assert!(ev.scores.is_empty());
    }

    #[test]
    fn test_eigenvector_empty_row_scores_positive_zero() {
        // Edges run hub -> leaf, so the hub has no incoming row.
        let mut g = Graph::with_config(GraphConfig {
            seed: Some(5),
            ..GraphConfig::default()
        })
        .unwrap();
        for i in 0..4 {
            g.add_edge("hub", &format!("leaf{}", i), EdgeAttrs::default());
        }
        let ev = g.eigenvector_centrality(&EigenvectorOptions::default());
        assert!(ev.converged);
        assert_eq!(ev.scores["hub"], 0.0);
        assert!(ev.scores["hub"].is_sign_positive());
        assert_eq!(ev.scores["leaf0"], 1.0);
    }

    #[test]
    fn test_lazy_eigenvalue_ignores_custom_options() {
        let mut g = make_path(&["a", "b", "c"]);
        let raw = g.eigenvector_centrality(&EigenvectorOptions {
            normalized: false,
            ..EigenvectorOptions::default()
        });
        assert!(raw.converged);
        assert!(raw.scores["c"] < 1.0);
        assert!(!g.cached.default_eigenvalue);
        assert_eq!(g.eigenvalue("c"), Some(1.0));
        assert!(g.cached.default_eigenvalue);
        assert_eq!(g.nodes_by_eigenvalue(0.99), vec!["c"]);
    }

    #[test]
    fn test_lazy_eigenvalue() {
        let mut g = make_star(3);
        assert_eq!(g.eigenvalue("hub"), Some(1.0));
        assert_eq!(g.node("hub").unwrap().cached_eigenvalue(), Some(1.0));
        assert_eq!(g.eigenvalue("nope"), None);
    }
}
