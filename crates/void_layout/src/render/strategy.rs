//! Node-count driven choice of draw path, culling and layout context.

use serde::{Deserialize, Serialize};

use crate::constants::{CULLING_THRESHOLD, INSTANCING_THRESHOLD, WORKER_LAYOUT_THRESHOLD};

/// Independent node-count thresholds. Each switch turns on at `count >= threshold`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderThresholds {
  pub instancing: usize,
  pub frustum_culling: usize,
  pub worker_layout: usize,
}

impl RenderThresholds {
  pub const DEFAULT: Self = Self {
    instancing: INSTANCING_THRESHOLD,
    frustum_culling: CULLING_THRESHOLD,
    worker_layout: WORKER_LAYOUT_THRESHOLD,
  };

  /// Plan for a graph of `node_count` nodes.
  #[inline]
  pub fn plan(&self, node_count: usize) -> RenderPlan {
    RenderPlan {
      draw_path: if node_count >= self.instancing {
        DrawPath::Instanced
      } else {
        DrawPath::PerObject
      },
      frustum_culling: node_count >= self.frustum_culling,
      worker_layout: node_count >= self.worker_layout,
    }
  }
}

impl Default for RenderThresholds {
  fn default() -> Self {
    Self::DEFAULT
  }
}

/// How nodes and edges reach the GPU.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawPath {
  /// One draw call per node and per edge.
  PerObject,
  /// Shared geometry with per-instance transform and color buffers.
  Instanced,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderPlan {
  pub draw_path: DrawPath,
  pub frustum_culling: bool,
  pub worker_layout: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_small_graph_uses_simple_paths() {
    let plan = RenderThresholds::DEFAULT.plan(10);
    assert_eq!(plan.draw_path, DrawPath::PerObject);
    assert!(!plan.frustum_culling);
    assert!(!plan.worker_layout);
  }

  #[test]
  fn test_thresholds_are_inclusive_and_independent() {
    let thresholds = RenderThresholds {
      instancing: 50,
      frustum_culling: 400,
      worker_layout: 100,
    };
    assert_eq!(thresholds.plan(49).draw_path, DrawPath::PerObject);
    assert_eq!(thresholds.plan(50).draw_path, DrawPath::Instanced);

    let plan = thresholds.plan(100);
    assert!(plan.worker_layout);
    assert!(!plan.frustum_culling);

    let plan = thresholds.plan(400);
    assert!(plan.worker_layout && plan.frustum_culling);
  }

  #[test]
  fn test_plan_is_monotonic_in_node_count() {
    let thresholds = RenderThresholds::DEFAULT;
    let mut previous = thresholds.plan(0);
    for count in 1..1000 {
      let plan = thresholds.plan(count);
      assert!(plan.frustum_culling >= previous.frustum_culling);
      assert!(plan.worker_layout >= previous.worker_layout);
      if previous.draw_path == DrawPath::Instanced {
        assert_eq!(plan.draw_path, DrawPath::Instanced);
      }
      previous = plan;
    }
  }
}
