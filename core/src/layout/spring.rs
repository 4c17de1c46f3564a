use rand::Rng;

use crate::config::SpringConfig;
use crate::graph::{Graph, NodeIndex, Vector};

use super::LayoutStrategy;

/// Squared separation below which a node pair is treated as coincident.
const COINCIDENT_D2: f64 = 0.01;

/// Force-directed layout: nodes repel like charges, edges pull like springs.
#[derive(Debug, Clone, Copy)]
pub struct SpringLayout {
    config: SpringConfig,
}

/// Vector from one node to another and its length.
struct Separation {
    dx: f64,
    dy: f64,
    d: f64,
}

impl SpringLayout {
    pub fn new(config: SpringConfig) -> Self {
        Self { config }
    }

    /// Separation from `a` to `b`. Coincident pairs get a small random
    /// offset so the force terms never divide by zero.
    fn separation(graph: &mut Graph, a: NodeIndex, b: NodeIndex) -> Separation {
        let pa = position(graph, a);
        let pb = position(graph, b);
        let mut dx = pb.x - pa.x;
        let mut dy = pb.y - pa.y;
        let mut d2 = dx * dx + dy * dy;

        if d2 < COINCIDENT_D2 {
            dx = graph.rng.gen::<f64>() * 0.1 + 0.1;
            dy = graph.rng.gen::<f64>() * 0.1 + 0.1;
            d2 = dx * dx + dy * dy;
        }

        Separation {
            dx,
            dy,
            d: d2.sqrt(),
        }
    }

    fn repulse(&self, graph: &mut Graph, a: NodeIndex, b: NodeIndex) {
        let s = Self::separation(graph, a, b);
        if s.d < self.config.repulsion {
            let f = self.config.k.powi(2) / s.d.powi(2);
            add_force(graph, b, f * s.dx, f * s.dy);
            add_force(graph, a, -f * s.dx, -f * s.dy);
        }
    }

    /// `weight` is the edge's weight times the layout weight multiplier;
    /// `length` is the reciprocal of the edge's rest-length multiplier.
    fn attract(&self, graph: &mut Graph, a: NodeIndex, b: NodeIndex, weight: f64, length: f64) {
        let s = Self::separation(graph, a, b);
        let d = s.d.min(self.config.repulsion);
        let k = self.config.k;

        let mut f = (d.powi(2) - k.powi(2)) / k * length;
        f = f * weight * 0.5 + 1.0;
        f /= d;

        add_force(graph, b, -f * s.dx, -f * s.dy);
        add_force(graph, a, f * s.dx, f * s.dy);
    }
}

impl LayoutStrategy for SpringLayout {
    fn name(&self) -> &'static str {
        "spring"
    }

    fn step(&self, graph: &mut Graph) {
        let live: Vec<NodeIndex> = graph.nodes().map(|n| n.index()).collect();
        for (i, &a) in live.iter().enumerate() {
            for &b in &live[i + 1..] {
                self.repulse(graph, a, b);
            }
        }

        let springs: Vec<(NodeIndex, NodeIndex, f64, f64)> = graph
            .edges()
            .map(|e| {
                (
                    e.node1(),
                    e.node2(),
                    self.config.weight * e.weight(),
                    1.0 / e.length(),
                )
            })
            .collect();
        for (a, b, weight, length) in springs {
            self.attract(graph, a, b, weight, length);
        }

        let max = self.config.max_displacement;
        let scale = self.config.force;
        for n in graph.nodes_mut() {
            n.position.x += (scale * n.force.x).clamp(-max, max);
            n.position.y += (scale * n.force.y).clamp(-max, max);
            n.force = Vector::ZERO;
        }
    }
}

fn position(graph: &Graph, idx: NodeIndex) -> Vector {
    graph.node_at(idx).map(|n| n.position).unwrap_or_default()
}

fn add_force(graph: &mut Graph, idx: NodeIndex, fx: f64, fy: f64) {
    if let Some(n) = graph.node_at_mut(idx) {
        n.force.x += fx;
        n.force.y += fy;
    }
}
