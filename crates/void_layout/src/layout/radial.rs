//! Radial-shell layout.
//!
//! Nodes are ranked by degree, most connected first, and poured into
//! concentric spherical shells from the inside out. Shell `s` has radius
//! `s · shell_spacing` and holds `⌈density · s²⌉` nodes, so population tracks
//! surface area. The single best-connected node sits at the origin.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::sphere::fibonacci_sphere;
use super::{LayoutAlgorithm, ProgressReporter};
use crate::constants::{SHELL_DENSITY, SHELL_SPACING};
use crate::types::{GraphInput, PositionMap};

/// Radial-shell layout parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadialParams {
  /// Radius step between shells.
  pub shell_spacing: f64,
  /// Shell population per unit² of shell index.
  pub shell_density: f64,
}

impl RadialParams {
  pub const DEFAULT: Self = Self {
    shell_spacing: SHELL_SPACING,
    shell_density: SHELL_DENSITY,
  };

  /// Number of nodes shell `shell` can hold.
  #[inline]
  pub fn shell_capacity(&self, shell: usize) -> usize {
    if shell == 0 {
      return 1;
    }
    let s = shell as f64;
    ((self.shell_density.max(f64::EPSILON) * s * s).ceil() as usize).max(1)
  }
}

impl Default for RadialParams {
  fn default() -> Self {
    Self::DEFAULT
  }
}

impl LayoutAlgorithm for RadialParams {
  fn compute(&self, graph: &GraphInput, progress: &mut dyn FnMut(f64)) -> PositionMap {
    let count = graph.node_count();
    let mut reporter = ProgressReporter::new(progress, count);

    let degrees = graph.degrees();
    let mut order: Vec<usize> = (0..count).collect();
    order.sort_by(|&a, &b| {
      degrees[b]
        .cmp(&degrees[a])
        .then_with(|| graph.nodes[a].id.cmp(&graph.nodes[b].id))
    });

    let mut positions = PositionMap::with_capacity(count);
    let mut placed = 0;
    let mut shell = 0;
    while placed < count {
      let members = self.shell_capacity(shell).min(count - placed);
      let radius = shell as f64 * self.shell_spacing;
      for slot in 0..members {
        let node = &graph.nodes[order[placed + slot]];
        let position = if shell == 0 {
          DVec3::ZERO
        } else {
          fibonacci_sphere(slot, members) * radius
        };
        positions.insert(node.id, position);
      }
      placed += members;
      shell += 1;
      reporter.advance(placed);
    }

    reporter.finish();
    positions
  }
}

#[cfg(test)]
#[path = "radial_test.rs"]
mod radial_test;
