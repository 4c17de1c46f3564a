//! graph-layout-core: In-memory graph analysis and incremental 2D layout.
//!
//! A pure Rust library that keeps an undirected graph in slot arenas and
//! provides reachability search, weighted shortest paths, betweenness and
//! eigenvector centrality, neighborhood set algebra, and frame-sliced
//! spring and circle layouts. Drawing and styling live outside this crate;
//! it exposes coordinates, scores, and topology only.

mod centrality;
mod cluster;
mod config;
mod error;
mod graph;
mod layout;
mod path;
mod traversal;

pub use centrality::{
    brandes_betweenness_centrality, eigenvector_centrality, Eigenvector, EigenvectorOptions,
};
pub use cluster::{
    clique, cliques, difference, flatten, intersection, is_clique, partition, subgraph, union,
    unique, Selection,
};
pub use config::{
    CircleConfig, GraphConfig, LayoutConfig, SpringConfig, MAX_ITERATIONS, MIN_ITERATIONS,
};
pub use error::{Error, Result};
pub use graph::{
    Edge, EdgeAttrs, EdgeIndex, Graph, Link, Node, NodeAttrs, NodeIndex, StyleTable, Vector,
    NODE_RADIUS,
};
pub use layout::{Bounds, CircleLayout, LayoutProgress, LayoutStrategy, SpringLayout};
pub use path::{adjacency, dijkstra_shortest_path, AdjacencyOptions, CostMap, Heuristic};
pub use traversal::{can_reach, depth_first_search, TraversalDirection};
