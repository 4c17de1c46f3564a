use std::collections::{BTreeSet, HashMap};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::GraphConfig;
use crate::error::Result;
use crate::layout::LayoutProgress;

/// Arena slot of a node. Slots are never reused within one graph.
pub type NodeIndex = usize;

/// Arena slot of an edge. Slots are never reused within one graph.
pub type EdgeIndex = usize;

/// Default node radius; also the unit the layout scale is derived from.
pub const NODE_RADIUS: f64 = 8.0;

/// A 2D point or force in layout space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One adjacency entry: the neighbor and the edge that connects to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub neighbor: NodeIndex,
    pub edge: EdgeIndex,
}

/// Attributes for a node created by [`Graph::add_node`].
#[derive(Debug, Clone, PartialEq)]
pub struct NodeAttrs {
    pub radius: f64,
    pub style: String,
    pub category: String,
    /// Display label. `None` uses the node id.
    pub label: Option<String>,
    /// Make the new node the graph's root.
    pub root: bool,
}

impl Default for NodeAttrs {
    fn default() -> Self {
        Self {
            radius: NODE_RADIUS,
            style: StyleTable::DEFAULT.to_string(),
            category: String::new(),
            label: None,
            root: false,
        }
    }
}

/// Attributes for an edge created by [`Graph::add_edge`].
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeAttrs {
    /// Importance of the connection, clamped into [0, 1]. Not a traversal cost.
    pub weight: f64,
    /// Spring rest-length multiplier, at least 1.
    pub length: f64,
    pub label: String,
}

impl Default for EdgeAttrs {
    fn default() -> Self {
        Self {
            weight: 0.0,
            length: 1.0,
            label: String::new(),
        }
    }
}

/// A node owned by a [`Graph`].
#[derive(Debug, Clone)]
pub struct Node {
    id: String,
    index: NodeIndex,
    pub radius: f64,
    pub style: String,
    pub category: String,
    pub label: String,
    /// Position in layout space.
    pub position: Vector,
    /// Force accumulated during the current layout step.
    pub force: Vector,
    betweenness: Option<f64>,
    eigenvalue: Option<f64>,
    links: Vec<Link>,
}

impl Node {
    fn new(id: &str, index: NodeIndex, attrs: NodeAttrs) -> Self {
        Self {
            id: id.to_string(),
            index,
            radius: attrs.radius,
            style: attrs.style,
            category: attrs.category,
            label: attrs.label.unwrap_or_else(|| id.to_string()),
            position: Vector::ZERO,
            force: Vector::ZERO,
            betweenness: None,
            eigenvalue: None,
            links: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn index(&self) -> NodeIndex {
        self.index
    }

    /// Adjacency entries in insertion order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn degree(&self) -> usize {
        self.links.len()
    }

    /// True if the node has exactly one connection.
    pub fn is_leaf(&self) -> bool {
        self.links.len() == 1
    }

    /// Cached betweenness score, `None` until computed or after a mutation.
    pub fn cached_betweenness(&self) -> Option<f64> {
        self.betweenness
    }

    /// Cached eigenvector score, `None` until computed or after a mutation.
    pub fn cached_eigenvalue(&self) -> Option<f64> {
        self.eigenvalue
    }

    fn link_to(&self, neighbor: NodeIndex) -> Option<&Link> {
        self.links.iter().find(|l| l.neighbor == neighbor)
    }
}

/// An undirected connection that remembers its insertion orientation.
///
/// `node1` is the endpoint passed first to [`Graph::add_edge`]; directed
/// traversal and directed cost maps treat it as the source.
#[derive(Debug, Clone)]
pub struct Edge {
    node1: NodeIndex,
    node2: NodeIndex,
    id1: String,
    id2: String,
    weight: f64,
    length: f64,
    pub label: String,
}

impl Edge {
    pub fn node1(&self) -> NodeIndex {
        self.node1
    }

    pub fn node2(&self) -> NodeIndex {
        self.node2
    }

    /// Id of the first endpoint.
    pub fn source(&self) -> &str {
        &self.id1
    }

    /// Id of the second endpoint.
    pub fn target(&self) -> &str {
        &self.id2
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// The endpoint opposite `node`, if `node` is an endpoint.
    pub fn other(&self, node: NodeIndex) -> Option<NodeIndex> {
        if node == self.node1 {
            Some(self.node2)
        } else if node == self.node2 {
            Some(self.node1)
        } else {
            None
        }
    }
}

/// Registry of style tags nodes may refer to. Rendering is external; the
/// graph only carries the names so copies keep the same vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleTable {
    names: BTreeSet<String>,
}

impl StyleTable {
    pub const DEFAULT: &'static str = "default";

    /// Register a style name. Returns false if it was already present.
    pub fn register(&mut self, name: &str) -> bool {
        self.names.insert(name.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|s| s.as_str())
    }
}

impl Default for StyleTable {
    fn default() -> Self {
        let mut names = BTreeSet::new();
        names.insert(Self::DEFAULT.to_string());
        Self { names }
    }
}

/// In-memory undirected graph: node/edge arenas, id index, layout state.
///
/// Nodes and edges live in slot vectors addressed by [`NodeIndex`] /
/// [`EdgeIndex`]. Removed slots become `None` and are not reused, so walking
/// the live slots yields insertion order. At most one edge exists per
/// unordered pair of endpoints.
pub struct Graph {
    nodes: Vec<Option<Node>>,
    edges: Vec<Option<Edge>>,
    index: HashMap<String, NodeIndex>,
    root: Option<NodeIndex>,
    node_count: usize,
    edge_count: usize,
    styles: StyleTable,
    pub(crate) config: GraphConfig,
    pub(crate) progress: LayoutProgress,
    pub(crate) rng: StdRng,
    pub(crate) cached: CentralityCache,
}

/// Which run produced the scores currently cached on the nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CentralityCache {
    /// `(normalized, directed)` of the cached betweenness.
    pub(crate) betweenness: Option<(bool, bool)>,
    /// Cached eigenvector scores came from default options.
    pub(crate) default_eigenvalue: bool,
}

impl Graph {
    pub fn new() -> Self {
        Self::from_config(GraphConfig::default())
    }

    /// Create an empty graph with validated settings.
    pub fn with_config(config: GraphConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: GraphConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            index: HashMap::new(),
            root: None,
            node_count: 0,
            edge_count: 0,
            styles: StyleTable::default(),
            progress: LayoutProgress::new(config.iterations),
            cached: CentralityCache::default(),
            config,
            rng,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    pub fn styles_mut(&mut self) -> &mut StyleTable {
        &mut self.styles
    }

    /// Add a node, or return the existing node with this id unchanged.
    pub fn add_node(&mut self, id: &str, attrs: NodeAttrs) -> &Node {
        match self.index.get(id).copied() {
            Some(idx) => self.nodes[idx].get_or_insert_with(|| Node::new(id, idx, attrs)),
            None => self.insert_node(id, attrs),
        }
    }

    fn insert_node(&mut self, id: &str, attrs: NodeAttrs) -> &mut Node {
        let idx = self.nodes.len();
        self.index.insert(id.to_string(), idx);
        self.node_count += 1;
        if attrs.root {
            self.root = Some(idx);
        }
        self.invalidate_centrality();
        self.nodes.push(None);
        self.nodes[idx].insert(Node::new(id, idx, attrs))
    }

    fn ensure_node(&mut self, id: &str) -> NodeIndex {
        match self.index.get(id) {
            Some(&idx) => idx,
            None => self.insert_node(id, NodeAttrs::default()).index,
        }
    }

    /// Add an edge between two ids, creating missing endpoints.
    ///
    /// Returns `None` for a self-loop. If the pair is already connected (in
    /// either orientation) the existing edge is returned untouched.
    pub fn add_edge(&mut self, id1: &str, id2: &str, attrs: EdgeAttrs) -> Option<&Edge> {
        if id1 == id2 {
            return None;
        }
        let n1 = self.ensure_node(id1);
        let n2 = self.ensure_node(id2);

        let idx = match self.find_edge(n1, n2) {
            Some(existing) => existing,
            None => {
                let idx = self.edges.len();
                self.edges.push(Some(Edge {
                    node1: n1,
                    node2: n2,
                    id1: id1.to_string(),
                    id2: id2.to_string(),
                    weight: clamp_weight(attrs.weight),
                    length: clamp_length(attrs.length),
                    label: attrs.label,
                }));
                self.edge_count += 1;
                self.push_link(n1, Link { neighbor: n2, edge: idx });
                self.push_link(n2, Link { neighbor: n1, edge: idx });
                self.invalidate_centrality();
                idx
            }
        };
        self.edges[idx].as_ref()
    }

    fn push_link(&mut self, node: NodeIndex, link: Link) {
        if let Some(Some(n)) = self.nodes.get_mut(node) {
            n.links.push(link);
        }
    }

    fn find_edge(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.node_at(a)?.link_to(b).map(|l| l.edge)
    }

    /// Remove a node and every edge touching it. Returns false if absent.
    pub fn remove_node(&mut self, id: &str) -> bool {
        let idx = match self.index.remove(id) {
            Some(idx) => idx,
            None => return false,
        };
        let node = match self.nodes[idx].take() {
            Some(node) => node,
            None => return false,
        };

        for link in &node.links {
            if self.edges[link.edge].take().is_some() {
                self.edge_count -= 1;
            }
            if let Some(Some(neighbor)) = self.nodes.get_mut(link.neighbor) {
                neighbor.links.retain(|l| l.neighbor != idx);
            }
        }

        self.node_count -= 1;
        if self.root == Some(idx) {
            self.root = None;
        }
        self.invalidate_centrality();
        true
    }

    /// Remove the edge between two ids, in either orientation.
    pub fn remove_edge(&mut self, id1: &str, id2: &str) -> bool {
        let (a, b) = match (self.index_of(id1), self.index_of(id2)) {
            (Some(a), Some(b)) => (a, b),
            _ => return false,
        };
        let edge = match self.find_edge(a, b) {
            Some(edge) => edge,
            None => return false,
        };

        self.edges[edge] = None;
        self.edge_count -= 1;
        for (from, to) in [(a, b), (b, a)] {
            if let Some(Some(n)) = self.nodes.get_mut(from) {
                n.links.retain(|l| l.neighbor != to);
            }
        }
        self.invalidate_centrality();
        true
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index_of(id).and_then(|idx| self.node_at(idx))
    }

    /// Mutable access for attribute and position edits. Topology is only
    /// changed through the add/remove operations.
    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        let idx = self.index_of(id)?;
        self.nodes.get_mut(idx).and_then(|slot| slot.as_mut())
    }

    pub fn node_at(&self, idx: NodeIndex) -> Option<&Node> {
        self.nodes.get(idx).and_then(|slot| slot.as_ref())
    }

    pub(crate) fn node_at_mut(&mut self, idx: NodeIndex) -> Option<&mut Node> {
        self.nodes.get_mut(idx).and_then(|slot| slot.as_mut())
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// True if an edge connects the two ids in either orientation.
    pub fn adjacent(&self, id1: &str, id2: &str) -> bool {
        self.edge(id1, id2).is_some()
    }

    /// The edge between two ids, whichever endpoint it was created from.
    pub fn edge(&self, id1: &str, id2: &str) -> Option<&Edge> {
        let a = self.index_of(id1)?;
        let b = self.index_of(id2)?;
        self.find_edge(a, b).and_then(|e| self.edge_at(e))
    }

    pub fn edge_at(&self, idx: EdgeIndex) -> Option<&Edge> {
        self.edges.get(idx).and_then(|slot| slot.as_ref())
    }

    /// Live nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().flatten()
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut().flatten()
    }

    /// Live edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().flatten()
    }

    /// Live node ids in insertion order.
    pub fn node_ids(&self) -> Vec<String> {
        self.nodes().map(|n| n.id.clone()).collect()
    }

    /// Neighbors of a node in adjacency order.
    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.node_at(idx)
            .map(|n| n.links.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|l| l.neighbor)
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn is_empty(&self) -> bool {
        self.node_count == 0
    }

    /// Upper bound (exclusive) on node slots, for per-call bitsets.
    pub(crate) fn slot_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.and_then(|idx| self.node_at(idx))
    }

    /// Make an existing node the root. Returns false if the id is unknown.
    pub fn set_root(&mut self, id: &str) -> bool {
        match self.index_of(id) {
            Some(idx) => {
                self.root = Some(idx);
                true
            }
            None => false,
        }
    }

    /// Structurally independent copy. With `empty`, only settings and the
    /// style table are carried over; layout progress starts fresh either way.
    pub fn copy(&self, empty: bool) -> Graph {
        let mut g = Graph::from_config(self.config);
        g.styles = self.styles.clone();
        if empty {
            return g;
        }

        for n in self.nodes() {
            g.import_node(n, self.root == Some(n.index));
        }
        for e in self.edges() {
            g.import_edge(e);
        }
        g
    }

    /// Add a node carrying another graph's node attributes and position.
    /// An existing node with the same id is left untouched.
    pub(crate) fn import_node(&mut self, node: &Node, root: bool) {
        if self.contains(&node.id) {
            return;
        }
        let copied = self.insert_node(
            &node.id,
            NodeAttrs {
                radius: node.radius,
                style: node.style.clone(),
                category: node.category.clone(),
                label: Some(node.label.clone()),
                root,
            },
        );
        copied.position = node.position;
    }

    /// Add an edge carrying another graph's edge attributes.
    pub(crate) fn import_edge(&mut self, edge: &Edge) {
        self.add_edge(
            &edge.id1,
            &edge.id2,
            EdgeAttrs {
                weight: edge.weight,
                length: edge.length,
                label: edge.label.clone(),
            },
        );
    }

    /// Remove all nodes and edges and reset layout progress.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.index.clear();
        self.root = None;
        self.node_count = 0;
        self.edge_count = 0;
        self.progress = LayoutProgress::new(self.config.iterations);
        self.cached = CentralityCache::default();
        tracing::debug!("graph cleared");
    }

    pub(crate) fn invalidate_centrality(&mut self) {
        for n in self.nodes.iter_mut().flatten() {
            n.betweenness = None;
            n.eigenvalue = None;
        }
        self.cached = CentralityCache::default();
    }

    pub(crate) fn store_betweenness(&mut self, idx: NodeIndex, score: f64) {
        if let Some(n) = self.node_at_mut(idx) {
            n.betweenness = Some(score);
        }
    }

    pub(crate) fn store_eigenvalue(&mut self, idx: NodeIndex, score: f64) {
        if let Some(n) = self.node_at_mut(idx) {
            n.eigenvalue = Some(score);
        }
    }

    /// Nodes with exactly one connection.
    pub fn leaves(&self) -> Vec<&Node> {
        self.nodes().filter(|n| n.is_leaf()).collect()
    }

    pub fn nodes_by_category(&self, category: &str) -> Vec<&Node> {
        self.nodes().filter(|n| n.category == category).collect()
    }

    /// Remove every node with `depth` or fewer connections.
    ///
    /// Degrees are sampled before removal, so one call peels a single layer.
    pub fn prune(&mut self, depth: usize) -> usize {
        let doomed: Vec<String> = self
            .nodes()
            .filter(|n| n.degree() <= depth)
            .map(|n| n.id.clone())
            .collect();
        for id in &doomed {
            self.remove_node(id);
        }
        doomed.len()
    }

    /// Edge count relative to the number of possible edges.
    pub fn density(&self) -> f64 {
        let n = self.node_count as f64;
        if self.node_count < 2 {
            return 0.0;
        }
        2.0 * self.edge_count as f64 / (n * (n - 1.0))
    }

    pub fn is_complete(&self) -> bool {
        self.node_count >= 2 && self.edge_count * 2 == self.node_count * (self.node_count - 1)
    }

    pub fn is_dense(&self) -> bool {
        self.density() > 0.65
    }

    pub fn is_sparse(&self) -> bool {
        self.density() < 0.35
    }

    /// Layout-to-drawing scale factor.
    pub fn scale(&self) -> f64 {
        NODE_RADIUS * 2.5 * self.config.distance
    }

    pub fn distance(&self) -> f64 {
        self.config.distance
    }

    /// Change node spacing. Non-positive or non-finite values are ignored.
    pub fn set_distance(&mut self, distance: f64) {
        if distance.is_finite() && distance > 0.0 {
            self.config.distance = distance;
        }
    }

    /// Node position in drawing units, relative to the layout origin.
    pub fn screen_position(&self, id: &str) -> Option<Vector> {
        let scale = self.scale();
        self.node(id)
            .map(|n| Vector::new(n.position.x * scale, n.position.y * scale))
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_weight(weight: f64) -> f64 {
    if weight.is_nan() {
        0.0
    } else {
        weight.clamp(0.0, 1.0)
    }
}

fn clamp_length(length: f64) -> f64 {
    if length.is_nan() {
        1.0
    } else {
        length.max(1.0)
    }
}
