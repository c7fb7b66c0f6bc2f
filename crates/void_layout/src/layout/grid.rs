//! Grid layout: deterministic placement on a cube-root lattice.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::{LayoutAlgorithm, ProgressReporter};
use crate::constants::GRID_SPACING;
use crate::types::{GraphInput, PositionMap};

/// Grid layout parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
  /// Distance between neighboring lattice points.
  pub spacing: f64,
}

impl GridParams {
  pub const DEFAULT: Self = Self {
    spacing: GRID_SPACING,
  };
}

impl Default for GridParams {
  fn default() -> Self {
    Self::DEFAULT
  }
}

/// Smallest lattice side `s` with `s³ >= count`.
pub fn lattice_side(count: usize) -> usize {
  let mut side = (count as f64).cbrt().ceil() as usize;
  // cbrt rounding can land one below or above on perfect cubes
  while side > 1 && (side - 1).pow(3) >= count {
    side -= 1;
  }
  while side.pow(3) < count {
    side += 1;
  }
  side.max(1)
}

impl LayoutAlgorithm for GridParams {
  fn compute(&self, graph: &GraphInput, progress: &mut dyn FnMut(f64)) -> PositionMap {
    let count = graph.node_count();
    let mut reporter = ProgressReporter::new(progress, count);

    // Slots are assigned in id order so input ordering never matters.
    let mut order: Vec<usize> = (0..count).collect();
    order.sort_by_key(|&i| graph.nodes[i].id);

    let side = lattice_side(count);
    let offset = (side - 1) as f64 / 2.0;

    let mut positions = PositionMap::with_capacity(count);
    for (slot, &i) in order.iter().enumerate() {
      let cell = DVec3::new(
        (slot % side) as f64,
        ((slot / side) % side) as f64,
        (slot / (side * side)) as f64,
      );
      positions.insert(graph.nodes[i].id, (cell - DVec3::splat(offset)) * self.spacing);
      reporter.advance(slot + 1);
    }

    reporter.finish();
    positions
  }
}

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;
