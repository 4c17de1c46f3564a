use graph_layout_core::{
    flatten, EdgeAttrs, EigenvectorOptions, Graph, GraphConfig, LayoutConfig, NodeAttrs,
    SpringConfig,
};
use std::collections::VecDeque;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mode = args.get(1).map(|s| s.as_str()).unwrap_or("all");
    let node_count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(2_000);

    if mode == "help" || mode == "--help" {
        println!("Usage: graph-layout-bench [mode] [node_count]");
        println!();
        println!("Modes:");
        println!("  all         Run all generators and benchmark each (default)");
        println!("  lsystem     Fractal branching tree (deep paths)");
        println!("  scalefree   Preferential attachment via edge sampling (hub-and-spoke)");
        println!("  smallworld  Watts-Strogatz ring lattice + shortcuts");
        println!("  random      Erdos-Renyi uniform random edges");
        println!("  barbell     Two dense clusters connected by a thin bridge");
        println!("  dla         Diffusion-limited aggregation (organic branching)");
        println!();
        println!("Default node_count: 2000");
        println!("Set RUST_LOG=debug to see layout and partition events.");
        return;
    }

    println!("graph-layout-bench");
    println!("==================");
    println!();

    let generators: Vec<(&str, fn(u64) -> Graph)> = match mode {
        "lsystem" => vec![("L-system tree", gen_lsystem)],
        "scalefree" => vec![("Scale-free (edge sampling)", gen_scale_free)],
        "smallworld" => vec![("Small-world (Watts-Strogatz)", gen_small_world)],
        "random" => vec![("Erdos-Renyi random", gen_random)],
        "barbell" => vec![("Barbell (cluster-bridge-cluster)", gen_barbell)],
        "dla" => vec![("DLA (organic branching)", gen_dla)],
        "all" => vec![
            ("L-system tree", gen_lsystem as fn(u64) -> Graph),
            ("Scale-free (edge sampling)", gen_scale_free),
            ("Small-world (Watts-Strogatz)", gen_small_world),
            ("Erdos-Renyi random", gen_random),
            ("Barbell (cluster-bridge-cluster)", gen_barbell),
            ("DLA (organic branching)", gen_dla),
        ],
        _ => {
            eprintln!("Unknown mode: {}. Use --help for options.", mode);
            return;
        }
    };

    for (name, generator) in generators {
        run_benchmark(name, generator, node_count);
    }
}

fn ms(t: Instant) -> f64 {
    t.elapsed().as_secs_f64() * 1000.0
}

fn run_benchmark(name: &str, generator: fn(u64) -> Graph, node_count: u64) {
    println!("--- {} ---", name);
    println!("Target: {} nodes", node_count);

    let t = Instant::now();
    let mut graph = generator(node_count);
    println!(
        "Generated in {:.1}ms: {} nodes, {} edges, density {:.4}",
        ms(t),
        graph.node_count(),
        graph.edge_count(),
        graph.density()
    );

    // Neighborhoods around the first node (typically a hub or root)
    let origin = node_id(0);
    println!();
    println!("{:>8} {:>12} {:>10}", "depth", "found", "time");
    println!("{:->8} {:->12} {:->10}", "", "", "");

    for depth in [1, 2, 3, 5, 10, 20, 50] {
        let t = Instant::now();
        let found = flatten(&graph, &origin, depth);
        println!("{:>8} {:>12} {:>8.1}ms", depth, found.len(), ms(t));
        if found.len() >= graph.node_count() {
            println!("{:>8} (entire graph reached)", "");
            break;
        }
    }

    // Shortest path: first node to last node
    println!();
    let far_node = graph.node_ids().pop().unwrap_or_else(|| origin.clone());
    let t = Instant::now();
    match graph.shortest_path(&origin, &far_node, None, false) {
        Some(p) => println!(
            "Shortest path {} → {}: {} hops in {:.1}ms",
            origin,
            far_node,
            p.len() - 1,
            ms(t)
        ),
        None => println!("Shortest path {} → {}: no path ({:.1}ms)", origin, far_node, ms(t)),
    }

    let t = Instant::now();
    graph.betweenness_centrality(true, false);
    let elapsed = ms(t);
    let top = graph.nodes_by_betweenness(0.0).into_iter().next();
    println!(
        "Betweenness: {:.1}ms, top node {}",
        elapsed,
        top.as_deref().unwrap_or("-")
    );

    let t = Instant::now();
    let ev = graph.eigenvector_centrality(&EigenvectorOptions::default());
    let elapsed = ms(t);
    let top = graph.nodes_by_eigenvalue(0.0).into_iter().next();
    println!(
        "Eigenvector: {:.1}ms, {} after {} iterations, top node {}",
        elapsed,
        if ev.converged { "converged" } else { "not converged" },
        ev.iterations,
        top.as_deref().unwrap_or("-")
    );

    let t = Instant::now();
    let parts = graph.split();
    println!(
        "Partition: {} components (largest {}) in {:.1}ms",
        parts.len(),
        parts.first().map(|p| p.node_count()).unwrap_or(0),
        ms(t)
    );

    let steps = 20;
    let t = Instant::now();
    graph.prepare();
    for _ in 0..steps {
        graph.iterate();
    }
    let secs = t.elapsed().as_secs_f64();
    println!(
        "Spring layout: {} steps in {:.1}ms ({:.1} steps/s)",
        steps,
        secs * 1000.0,
        steps as f64 / secs.max(f64::EPSILON)
    );
    if let Some(b) = graph.bounds() {
        println!("Layout bounds: {:.2} x {:.2}", b.width(), b.height());
    }
    println!();
}

// ---------------------------------------------------------------------------
// Generators: all O(n) or O(n + edges), single-threaded, deterministic
// ---------------------------------------------------------------------------

/// Simple LCG for deterministic, fast pseudo-random numbers.
struct FastRng(u64);

impl FastRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next(&mut self, max: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 33) % max
    }
    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

fn node_id(i: u64) -> String {
    format!("c_{}", i)
}

fn bench_graph() -> Graph {
    Graph::with_config(GraphConfig {
        seed: Some(7),
        layout: LayoutConfig::Spring(SpringConfig::default()),
        ..GraphConfig::default()
    })
    .unwrap_or_default()
}

fn add(graph: &mut Graph, i: u64, category: &str) {
    graph.add_node(
        &node_id(i),
        NodeAttrs {
            category: category.to_string(),
            ..NodeAttrs::default()
        },
    );
}

/// Connect two nodes with a random importance weight.
fn link(graph: &mut Graph, rng: &mut FastRng, a: u64, b: u64) {
    graph.add_edge(
        &node_id(a),
        &node_id(b),
        EdgeAttrs {
            weight: rng.next_f64(),
            ..EdgeAttrs::default()
        },
    );
}

/// L-system fractal tree: deep branching with self-similar structure.
///
/// Each node spawns `branching` children. Produces deep paths (log depth)
/// with exponential width.
fn gen_lsystem(node_count: u64) -> Graph {
    let mut graph = bench_graph();
    let mut rng = FastRng::new(42);

    let branching = 3u64;
    add(&mut graph, 0, "Root");
    graph.set_root(&node_id(0));

    let mut next_id: u64 = 1;
    let mut frontier: Vec<u64> = vec![0];

    while next_id < node_count && !frontier.is_empty() {
        let mut next_frontier = Vec::with_capacity(frontier.len() * branching as usize);
        for &parent in &frontier {
            for _ in 0..branching {
                if next_id >= node_count {
                    break;
                }
                let child = next_id;
                next_id += 1;
                add(&mut graph, child, "Concept");
                link(&mut graph, &mut rng, parent, child);
                next_frontier.push(child);
            }
        }
        frontier = next_frontier;
    }

    graph
}

/// Scale-free via edge-list sampling.
///
/// Preferential attachment by picking a random existing edge endpoint, so
/// nodes with more edges are more likely to be picked.
fn gen_scale_free(node_count: u64) -> Graph {
    let edges_per_node = 10u64;
    let mut graph = bench_graph();
    let mut rng = FastRng::new(12345);

    let mut edge_endpoints: Vec<u64> = Vec::with_capacity((node_count * edges_per_node * 2) as usize);

    // Seed: small clique
    let seed = 5u64;
    for i in 0..seed {
        add(&mut graph, i, "Concept");
    }
    for i in 0..seed {
        for j in (i + 1)..seed {
            link(&mut graph, &mut rng, i, j);
            edge_endpoints.push(i);
            edge_endpoints.push(j);
        }
    }

    for new_node in seed..node_count {
        add(&mut graph, new_node, "Concept");

        let attach = edges_per_node.min(new_node);
        for _ in 0..attach {
            let idx = rng.next(edge_endpoints.len() as u64) as usize;
            let target = edge_endpoints[idx];
            if target != new_node {
                link(&mut graph, &mut rng, new_node, target);
                edge_endpoints.push(new_node);
                edge_endpoints.push(target);
            }
        }
    }

    graph
}

/// Small-world (Watts-Strogatz): ring lattice + random rewiring.
fn gen_small_world(node_count: u64) -> Graph {
    let k = 10u64; // neighbors on each side
    let p = 0.05f64; // rewire probability
    let mut graph = bench_graph();
    let mut rng = FastRng::new(67890);

    for i in 0..node_count {
        add(&mut graph, i, "Concept");
    }

    for i in 0..node_count {
        for j in 1..=k {
            let neighbor = (i + j) % node_count;
            let target = if rng.next_f64() < p {
                rng.next(node_count)
            } else {
                neighbor
            };
            // Self-loops are rejected by the graph.
            link(&mut graph, &mut rng, i, target);
        }
    }

    graph
}

/// Erdos-Renyi: uniform random edges, ~10 per node on average.
fn gen_random(node_count: u64) -> Graph {
    let target_edges = node_count * 10;
    let mut graph = bench_graph();
    let mut rng = FastRng::new(54321);

    for i in 0..node_count {
        add(&mut graph, i, "Concept");
    }

    for _ in 0..target_edges {
        let from = rng.next(node_count);
        let to = rng.next(node_count);
        link(&mut graph, &mut rng, from, to);
    }

    graph
}

/// Barbell: two dense clusters connected by a single thin bridge.
///
/// Every shortest path between the clusters crosses the bridge, so bridge
/// nodes should top the betweenness ranking.
fn gen_barbell(node_count: u64) -> Graph {
    let bridge_len = 10u64;
    let cluster_size = node_count.saturating_sub(bridge_len).max(4) / 2;
    let mut graph = bench_graph();
    let mut rng = FastRng::new(99999);

    for i in 0..cluster_size {
        add(&mut graph, i, "ClusterA");
    }
    for i in 0..cluster_size {
        for _ in 0..20u64.min(cluster_size - 1) {
            let target = rng.next(cluster_size);
            link(&mut graph, &mut rng, i, target);
        }
    }

    let bridge_start = cluster_size;
    for i in 0..bridge_len {
        let id = bridge_start + i;
        add(&mut graph, id, "Bridge");
        let prev = if i == 0 { cluster_size - 1 } else { id - 1 };
        link(&mut graph, &mut rng, prev, id);
    }

    let b_start = bridge_start + bridge_len;
    for i in 0..cluster_size {
        add(&mut graph, b_start + i, "ClusterB");
    }
    link(&mut graph, &mut rng, b_start - 1, b_start);

    for i in 0..cluster_size {
        for _ in 0..20u64.min(cluster_size - 1) {
            let target = rng.next(cluster_size);
            link(&mut graph, &mut rng, b_start + i, b_start + target);
        }
    }

    graph
}

/// DLA (Diffusion-Limited Aggregation): organic branching growth.
///
/// Each new node attaches to a recent "surface" node, with occasional
/// long-range jumps that create loops.
fn gen_dla(node_count: u64) -> Graph {
    let mut graph = bench_graph();
    let mut rng = FastRng::new(77777);

    add(&mut graph, 0, "Seed");

    let surface_max = 1000usize;
    let mut surface: VecDeque<u64> = VecDeque::with_capacity(surface_max + 1);
    surface.push_back(0);

    for new_node in 1..node_count {
        add(&mut graph, new_node, "Concept");

        let attach_to = surface[rng.next(surface.len() as u64) as usize];
        link(&mut graph, &mut rng, new_node, attach_to);

        // 10% chance of a second connection (creates loops / shortcuts)
        if rng.next(10) == 0 && new_node > 1 {
            let other = rng.next(new_node);
            if other != attach_to {
                link(&mut graph, &mut rng, new_node, other);
            }
        }

        surface.push_back(new_node);
        if surface.len() > surface_max {
            surface.pop_front();
        }
    }

    graph
}
