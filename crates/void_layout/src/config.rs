//! Engine configuration loaded from TOML.
//!
//! Every section is optional; omitted fields keep their defaults.
//!
//! ```toml
//! visibility_interval_ms = 100
//!
//! [thresholds]
//! instancing = 100
//! frustum_culling = 200
//! worker_layout = 300
//!
//! [octree]
//! leaf_capacity = 8
//!
//! [layout.force]
//! iterations = 150
//!
//! [[lod]]
//! max_distance = 80.0
//! geometry = "high"
//! features = { labels = true, preview = true, glow = true, connections = true }
//!
//! [[lod]]
//! max_distance = inf
//! geometry = "minimal"
//! features = {}
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{FRAME_WINDOW, VISIBILITY_INTERVAL_MS};
use crate::error::{ConfigError, LayoutError};
use crate::layout::{LayoutMode, LayoutParams, PlacementParams};
use crate::lod::LodTable;
use crate::render::{AppearanceParams, RenderThresholds};
use crate::spatial::OctreeSettings;
use crate::visibility::VisibilityConfig;

/// Root engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  pub octree: OctreeSettings,
  pub thresholds: RenderThresholds,
  /// Minimum time between visibility recomputes.
  pub visibility_interval_ms: u64,
  pub lod: LodTable,
  pub layout: LayoutParams,
  pub placement: PlacementParams,
  pub appearance: AppearanceParams,
  /// Frame deltas kept by the performance monitor (at most 60).
  pub frame_window: usize,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      octree: OctreeSettings::DEFAULT,
      thresholds: RenderThresholds::DEFAULT,
      visibility_interval_ms: VISIBILITY_INTERVAL_MS,
      lod: LodTable::default(),
      layout: LayoutParams::default(),
      placement: PlacementParams::DEFAULT,
      appearance: AppearanceParams::DEFAULT,
      frame_window: FRAME_WINDOW,
    }
  }
}

impl EngineConfig {
  /// Parse and validate a TOML document.
  pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
    let config: Self = toml::from_str(source)?;
    config.validate()?;
    Ok(config)
  }

  /// Load and validate a TOML file.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let source = std::fs::read_to_string(path)?;
    let config = Self::from_toml_str(&source)?;
    tracing::debug!(path = %path.display(), "engine config loaded");
    Ok(config)
  }

  /// Reject values the engine cannot run with.
  pub fn validate(&self) -> Result<(), ConfigError> {
    let invalid = |message: String| Err(ConfigError::Invalid(message));

    if self.octree.leaf_capacity == 0 {
      return invalid("octree.leaf_capacity must be at least 1".into());
    }
    if !(self.octree.padding >= 0.0) || !self.octree.padding.is_finite() {
      return invalid(format!("octree.padding must be finite and >= 0, got {}", self.octree.padding));
    }

    let lengths = [
      ("layout.force.ideal_length", self.layout.force.ideal_length),
      ("layout.grid.spacing", self.layout.grid.spacing),
      ("layout.radial.shell_spacing", self.layout.radial.shell_spacing),
      ("layout.radial.shell_density", self.layout.radial.shell_density),
      ("layout.cluster.cluster_spacing", self.layout.cluster.cluster_spacing),
      ("layout.cluster.node_spacing", self.layout.cluster.node_spacing),
    ];
    for (name, value) in lengths {
      if !(value > 0.0) || !value.is_finite() {
        return invalid(format!("{} must be finite and > 0, got {}", name, value));
      }
    }
    if !(0.0..=1.0).contains(&self.layout.force.damping) {
      return invalid(format!("layout.force.damping must be in [0, 1], got {}", self.layout.force.damping));
    }

    let placement = &self.placement;
    if !(placement.min_distance >= 0.0) || !(placement.max_distance >= placement.min_distance) {
      return invalid(format!(
        "placement distances must satisfy 0 <= min <= max, got {}..{}",
        placement.min_distance, placement.max_distance
      ));
    }

    if !(1..=FRAME_WINDOW).contains(&self.frame_window) {
      return invalid(format!("frame_window must be in 1..={}, got {}", FRAME_WINDOW, self.frame_window));
    }

    // Round-trip through the validating constructor for tables built in code.
    LodTable::new(self.lod.levels().to_vec())?;
    Ok(())
  }

  /// Culler settings; the cull threshold comes from `thresholds`.
  pub fn visibility(&self) -> VisibilityConfig {
    VisibilityConfig {
      cull_threshold: self.thresholds.frustum_culling,
      recompute_interval_ms: self.visibility_interval_ms,
    }
  }

  /// Layout mode for a display-setting name using the configured parameters.
  pub fn layout_mode(&self, name: &str, iterations: Option<usize>) -> Result<LayoutMode, LayoutError> {
    self.layout.mode(name, iterations)
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
