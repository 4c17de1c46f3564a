//! Typed settings for graphs and their layouts.
//!
//! Every setting has a default and an allowed range. Values can be built in
//! code or parsed from JSON, where missing fields take their defaults.

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const MIN_ITERATIONS: usize = 1;
pub const MAX_ITERATIONS: usize = 1_000_000;

/// Graph-wide settings: layout step budget, node spacing and randomness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Target number of layout steps.
    pub iterations: usize,
    /// Spacing multiplier between layout space and drawing space.
    pub distance: f64,
    pub layout: LayoutConfig,
    /// Seed for the graph's RNG. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            distance: 1.0,
            layout: LayoutConfig::default(),
            seed: None,
        }
    }
}

impl GraphConfig {
    /// Parse from JSON and validate.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: GraphConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&self.iterations) {
            return Err(Error::InvalidConfig(format!(
                "iterations must be in {}..={}, got {}",
                MIN_ITERATIONS, MAX_ITERATIONS, self.iterations
            )));
        }
        check_positive("distance", self.distance)?;
        self.layout.validate()
    }
}

/// Which layout strategy a graph uses, with its tuning constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayoutConfig {
    Spring(SpringConfig),
    Circle(CircleConfig),
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig::Spring(SpringConfig::default())
    }
}

impl LayoutConfig {
    pub fn name(&self) -> &'static str {
        match self {
            LayoutConfig::Spring(_) => "spring",
            LayoutConfig::Circle(_) => "circle",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            LayoutConfig::Spring(c) => c.validate(),
            LayoutConfig::Circle(c) => c.validate(),
        }
    }
}

/// Force-directed layout constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    /// Force strength; also the ideal spring length.
    pub k: f64,
    /// Multiplier converting summed force into displacement.
    pub force: f64,
    /// Edge weight multiplier.
    pub weight: f64,
    /// Maximum displacement per axis per step.
    pub max_displacement: f64,
    /// Radius beyond which nodes do not repel each other.
    pub repulsion: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            k: 2.0,
            force: 0.01,
            weight: 15.0,
            max_displacement: 0.5,
            repulsion: 15.0,
        }
    }
}

impl SpringConfig {
    pub fn validate(&self) -> Result<()> {
        check_positive("spring.k", self.k)?;
        check_positive("spring.force", self.force)?;
        check_positive("spring.weight", self.weight)?;
        check_positive("spring.max_displacement", self.max_displacement)?;
        check_positive("spring.repulsion", self.repulsion)
    }
}

/// Concentric-rings layout constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleConfig {
    /// Outer ring radius in layout units.
    pub radius: f64,
    /// Number of rings.
    pub orbits: usize,
    /// Starting angle in radians.
    pub angle: f64,
}

impl Default for CircleConfig {
    fn default() -> Self {
        Self {
            radius: 8.0,
            orbits: 2,
            angle: FRAC_PI_2,
        }
    }
}

impl CircleConfig {
    pub fn validate(&self) -> Result<()> {
        check_positive("circle.radius", self.radius)?;
        if self.orbits == 0 {
            return Err(Error::InvalidConfig("circle.orbits must be at least 1".into()));
        }
        if !self.angle.is_finite() {
            return Err(Error::InvalidConfig("circle.angle must be finite".into()));
        }
        Ok(())
    }
}

fn check_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{} must be finite and positive, got {}",
            name, value
        )))
    }
}
