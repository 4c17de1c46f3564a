use std::f64::consts::{FRAC_PI_2, TAU};

use crate::config::CircleConfig;
use crate::graph::{Graph, NodeIndex, NODE_RADIUS};

use super::LayoutStrategy;

/// Concentric rings ordered by betweenness: high-traffic nodes sit on the
/// inner rings, and each outer ring holds more nodes than the one inside it.
#[derive(Debug, Clone, Copy)]
pub struct CircleLayout {
    config: CircleConfig,
}

impl CircleLayout {
    pub fn new(config: CircleConfig) -> Self {
        Self { config }
    }

    /// Split the ranked nodes into rings. Ring `r` (1-based) ends at the
    /// cumulative share `1 / (orbits - r + 1)^2`; the last ring takes the rest.
    fn rings<'a>(&self, ranked: &'a [NodeIndex]) -> Vec<&'a [NodeIndex]> {
        let count = ranked.len();
        let orbits = self.config.orbits;
        let mut rings = Vec::with_capacity(orbits);
        let mut start = 0;

        for ring in 1..=orbits {
            if start >= count {
                break;
            }
            let share = 1.0 / ((orbits - ring + 1) as f64).powi(2);
            let end = if ring == orbits {
                count
            } else {
                ((share * count as f64).floor() as usize).clamp(start + 1, count)
            };
            rings.push(&ranked[start..end]);
            start = end;
        }
        rings
    }
}

impl LayoutStrategy for CircleLayout {
    fn name(&self) -> &'static str {
        "circle"
    }

    fn step(&self, graph: &mut Graph) {
        if graph.is_empty() {
            return;
        }

        let ranked: Vec<NodeIndex> = graph
            .nodes_by_betweenness(-1.0)
            .iter()
            .filter_map(|id| graph.index_of(id))
            .collect();
        let rings = self.rings(&ranked);

        // Radii open up over the run and reach full size on the last step.
        let progress = graph.progress();
        let t = ((progress.step + 1) as f64 / progress.steps.max(1) as f64).min(1.0);
        let opening = (FRAC_PI_2 * t).sin();
        let scale = graph.scale();

        let placements: Vec<(NodeIndex, f64, f64)> = rings
            .iter()
            .enumerate()
            .flat_map(|(i, ring)| {
                let share = (i + 1) as f64 / rings.len() as f64;
                let r = self.config.radius * opening * share;

                // How many node diameters fit on this ring's circumference.
                let circumference = self.config.radius * scale * TAU * share;
                let s = NODE_RADIUS * 2.0 / circumference * 2.0;
                let step = (TAU * s).min(TAU / ring.len() as f64);

                ring.iter().enumerate().map(move |(j, &idx)| {
                    let a = self.config.angle + step * j as f64;
                    (idx, r * a.cos(), r * a.sin())
                })
            })
            .collect();

        for (idx, x, y) in placements {
            if let Some(n) = graph.node_at_mut(idx) {
                n.position.x = x;
                n.position.y = y;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GraphConfig, LayoutConfig};
    use crate::graph::EdgeAttrs;

    fn circle_graph(iterations: usize, orbits: usize) -> Graph {
        Graph::with_config(GraphConfig {
            iterations,
            seed: Some(3),
            layout: LayoutConfig::Circle(CircleConfig {
                orbits,
                ..CircleConfig::default()
            }),
            ..GraphConfig::default()
        })
        .unwrap()
    }

    fn radius_of(g: &Graph, id: &str) -> f64 {
        let p = g.node(id).unwrap().position;
        (p.x * p.x + p.y * p.y).sqrt()
    }

    fn make_star(g: &mut Graph, leaves: usize) {
        for i in 0..leaves {
            g.add_edge("hub", &format!("leaf{}", i), EdgeAttrs::default());
        }
    }

    #[test]
    fn test_rings_shrink_inward() {
        let layout = CircleLayout::new(CircleConfig {
            orbits: 3,
            ..CircleConfig::default()
        });
        let ranked: Vec<NodeIndex> = (0..36).collect();
        let rings = layout.rings(&ranked);
        let sizes: Vec<usize> = rings.iter().map(|r| r.len()).collect();
        assert_eq!(sizes, vec![4, 5, 27]);
        assert_eq!(rings[0], &ranked[..4]);
    }

    #[test]
    fn test_rings_tiny_graph() {
        let layout = CircleLayout::new(CircleConfig {
            orbits: 3,
            ..CircleConfig::default()
        });
        let ranked: Vec<NodeIndex> = vec![0, 1];
        let sizes: Vec<usize> = layout.rings(&ranked).iter().map(|r| r.len()).collect();
        assert_eq!(sizes, vec![1, 1]);
    }

    #[test]
    fn test_hub_on_inner_ring() {
        let mut g = circle_graph(10, 2);
        make_star(&mut g, 8);
        g.prepare();
        g.solve();
        let hub = radius_of(&g, "hub");
        for i in 0..8 {
            assert!(hub <= radius_of(&g, &format!("leaf{}", i)) + 1e-12);
        }
        assert!(hub < radius_of(&g, "leaf7"));
    }

    #[test]
    fn test_outer_radius_reaches_max_when_done() {
        let mut g = circle_graph(10, 2);
        make_star(&mut g, 8);
        g.prepare();
        g.solve();
        let r = radius_of(&g, "leaf7");
        assert!((r - CircleConfig::default().radius).abs() < 1e-9);
    }

    #[test]
    fn test_radius_grows_with_steps() {
        let mut g = circle_graph(10, 1);
        make_star(&mut g, 5);
        g.prepare();
        let mut last = 0.0;
        while !g.iterate() {
            let r = radius_of(&g, "leaf0");
            assert!(r >= last);
            last = r;
        }
    }

    #[test]
    fn test_first_node_at_start_angle() {
        let mut g = circle_graph(1, 1);
        g.add_node("solo", Default::default());
        g.prepare();
        g.iterate();
        let p = g.node("solo").unwrap().position;
        assert!(p.x.abs() < 1e-9);
        assert!((p.y - CircleConfig::default().radius).abs() < 1e-9);
    }

    /// Angle of each node on a single ring, counter-clockwise from the
    /// first, against the step the layout should use.
    fn ring_spacing(count: usize) -> (Vec<f64>, f64) {
        let mut g = circle_graph(1, 1);
        for i in 0..count {
            g.add_node(&format!("n{}", i), Default::default());
        }
        g.prepare();
        g.iterate();

        let config = CircleConfig::default();
        let circumference = config.radius * g.scale() * TAU;
        let s = NODE_RADIUS * 2.0 / circumference * 2.0;
        let expected = (TAU * s).min(TAU / count as f64);

        let angles: Vec<f64> = (0..count)
            .map(|i| {
                let p = g.node(&format!("n{}", i)).unwrap().position;
                p.y.atan2(p.x)
            })
            .collect();
        let gaps = angles
            .windows(2)
            .map(|w| (w[1] - w[0]).rem_euclid(TAU))
            .collect();
        (gaps, expected)
    }

    #[test]
    fn test_ring_spacing_sized_to_circumference() {
        let (gaps, step) = ring_spacing(4);
        assert!(step < TAU / 4.0);
        assert_eq!(gaps.len(), 3);
        for gap in gaps {
            assert!((gap - step).abs() < 1e-9);
        }
    }

    #[test]
    fn test_crowded_ring_spreads_evenly() {
        let (gaps, step) = ring_spacing(60);
        assert!((step - TAU / 60.0).abs() < 1e-12);
        for gap in gaps {
            assert!((gap - step).abs() < 1e-9);
        }
    }
}
