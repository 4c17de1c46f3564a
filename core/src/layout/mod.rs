//! Incremental 2D layout.
//!
//! A layout advances one bounded step per [`Graph::iterate`] call so an
//! interactive caller can spread the work over animation frames. Stopping is
//! simply not calling `iterate` again.

mod circle;
mod spring;

pub use circle::CircleLayout;
pub use spring::SpringLayout;

use crate::config::{LayoutConfig, MAX_ITERATIONS, MIN_ITERATIONS};
use crate::error::{Error, Result};
use crate::graph::{Graph, Vector};

/// Fade-in added to `alpha` on every [`Graph::update`] tick.
const FADE_IN: f64 = 0.05;

/// One layout strategy. Implementations read and write node positions and
/// forces; step counting is done by the graph.
pub trait LayoutStrategy {
    fn name(&self) -> &'static str;

    /// Advance the layout by exactly one step.
    fn step(&self, graph: &mut Graph);
}

/// Step counters carried by every graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutProgress {
    /// Steps taken so far.
    pub step: usize,
    /// Target step count.
    pub steps: usize,
    /// Fade-in accumulator in [0, 1].
    pub alpha: f64,
}

impl LayoutProgress {
    pub fn new(steps: usize) -> Self {
        Self {
            step: 0,
            steps,
            alpha: 0.0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.step >= self.steps
    }
}

/// Axis-aligned envelope of all node positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vector,
    pub max: Vector,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vector {
        Vector::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }
}

impl Graph {
    pub fn progress(&self) -> &LayoutProgress {
        &self.progress
    }

    /// Switch layout strategy. Progress restarts from step 0.
    pub fn set_layout(&mut self, layout: LayoutConfig) -> Result<()> {
        layout.validate()?;
        self.config.layout = layout;
        self.progress.step = 0;
        Ok(())
    }

    /// Change the target step count without touching the current step.
    pub fn set_iterations(&mut self, steps: usize) -> Result<()> {
        if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&steps) {
            return Err(Error::InvalidConfig(format!(
                "iterations must be in {}..={}, got {}",
                MIN_ITERATIONS, MAX_ITERATIONS, steps
            )));
        }
        self.config.iterations = steps;
        self.progress.steps = steps;
        Ok(())
    }

    /// Move every node to the layout origin and clear its force.
    /// Call once before the first [`Graph::iterate`].
    pub fn prepare(&mut self) {
        for n in self.nodes_mut() {
            n.position = Vector::ZERO;
            n.force = Vector::ZERO;
        }
        tracing::debug!(
            layout = self.config.layout.name(),
            nodes = self.node_count(),
            "layout prepared"
        );
    }

    /// Advance the layout one step. Returns true once the target step count
    /// has been reached; further calls are no-ops.
    pub fn iterate(&mut self) -> bool {
        if self.progress.is_done() {
            return true;
        }

        match self.config.layout {
            LayoutConfig::Spring(config) => SpringLayout::new(config).step(self),
            LayoutConfig::Circle(config) => CircleLayout::new(config).step(self),
        }
        self.progress.step += 1;
        tracing::trace!(
            step = self.progress.step,
            steps = self.progress.steps,
            "layout step"
        );

        let done = self.progress.is_done();
        if done {
            tracing::debug!(
                layout = self.config.layout.name(),
                steps = self.progress.steps,
                "layout finished"
            );
        }
        done
    }

    /// Iterate until done and show the graph fully faded in.
    pub fn solve(&mut self) {
        while !self.iterate() {}
        self.progress.alpha = 1.0;
    }

    pub fn is_done(&self) -> bool {
        self.progress.is_done()
    }

    /// Envelope of node positions, `None` for an empty graph.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut nodes = self.nodes();
        let first = nodes.next()?.position;
        let mut bounds = Bounds {
            min: first,
            max: first,
        };
        for n in nodes {
            bounds.min.x = bounds.min.x.min(n.position.x);
            bounds.min.y = bounds.min.y.min(n.position.y);
            bounds.max.x = bounds.max.x.max(n.position.x);
            bounds.max.y = bounds.max.y.max(n.position.y);
        }
        Some(bounds)
    }

    /// One animation-frame tick.
    ///
    /// Fades the graph in, prepares on the first tick, then runs more steps
    /// per tick as the layout progresses (at most `max_iterations`).
    /// Returns true while the layout is still running.
    pub fn update(&mut self, max_iterations: usize) -> bool {
        self.progress.alpha = (self.progress.alpha + FADE_IN).min(1.0);

        if self.progress.step == 0 {
            self.prepare();
            self.iterate();
        } else {
            let batch = max_iterations.min(self.progress.step / 10 + 1).max(1);
            for _ in 0..batch {
                if self.iterate() {
                    break;
                }
            }
        }
        !self.is_done()
    }

    /// Restart from step 0; the next [`Graph::update`] prepares again.
    pub fn reset(&mut self) {
        self.progress.step = 0;
    }

    /// Rewind to the halfway point so the tail of the layout replays from
    /// the current positions. Never rewinds past step 1, so the next
    /// [`Graph::update`] does not prepare again.
    pub fn refresh(&mut self) {
        self.progress.step = (self.progress.steps / 2).max(1);
    }
}
