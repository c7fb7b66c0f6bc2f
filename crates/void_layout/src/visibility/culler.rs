//! Rate-limited visibility culling.
//!
//! ```text
//! update(now, camera)
//!   │
//!   ├─ last run < interval ago ──► cached VisibleSet
//!   │
//!   ├─ nodes < cull_threshold ───► every node, every edge
//!   │
//!   └─ otherwise: frustum = camera.projection * camera.view
//!        ├─ index present ──► SpatialIndex::query_frustum
//!        └─ no index ───────► linear contains_point over positions
//!      edges visible iff either endpoint is visible
//! ```
//!
//! Between recomputes the cached set may lag the camera by up to one interval.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use web_time::Instant;

use super::Camera;
use crate::constants::{CULLING_THRESHOLD, VISIBILITY_INTERVAL_MS};
use crate::spatial::{Frustum, SpatialIndex};
use crate::types::{Edge, NodeId, PositionMap};

/// Culling configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
  /// Node count at which frustum culling starts.
  pub cull_threshold: usize,
  /// Minimum time between recomputes, in milliseconds.
  pub recompute_interval_ms: u64,
}

impl VisibilityConfig {
  pub const DEFAULT: Self = Self {
    cull_threshold: CULLING_THRESHOLD,
    recompute_interval_ms: VISIBILITY_INTERVAL_MS,
  };

  #[inline]
  pub fn recompute_interval(&self) -> Duration {
    Duration::from_millis(self.recompute_interval_ms)
  }
}

impl Default for VisibilityConfig {
  fn default() -> Self {
    Self::DEFAULT
  }
}

/// Visible nodes and the edges touching them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisibleSet {
  pub nodes: HashSet<NodeId>,
  pub edges: Vec<Edge>,
  /// False when the graph was below the culling threshold and everything
  /// passed through.
  pub culled: bool,
}

impl VisibleSet {
  /// Everything in `positions` and every edge.
  pub fn everything(positions: &PositionMap, edges: &[Edge]) -> Self {
    Self {
      nodes: positions.iter().map(|(id, _)| id).collect(),
      edges: edges.to_vec(),
      culled: false,
    }
  }

  #[inline]
  pub fn contains(&self, id: NodeId) -> bool {
    self.nodes.contains(&id)
  }
}

/// Per-frame culler holding the last computed [`VisibleSet`].
#[derive(Debug, Default)]
pub struct VisibilityCuller {
  config: VisibilityConfig,
  last_run: Option<Instant>,
  current: VisibleSet,
}

impl VisibilityCuller {
  pub fn new(config: VisibilityConfig) -> Self {
    Self {
      config,
      last_run: None,
      current: VisibleSet::default(),
    }
  }

  pub fn config(&self) -> &VisibilityConfig {
    &self.config
  }

  /// Force the next [`update`](Self::update) to recompute, e.g. after the
  /// positions changed.
  pub fn invalidate(&mut self) {
    self.last_run = None;
  }

  /// Last computed set.
  pub fn current(&self) -> &VisibleSet {
    &self.current
  }

  /// Recompute if the interval has elapsed, otherwise return the cached set.
  pub fn update(
    &mut self,
    now: Instant,
    camera: &Camera,
    positions: &PositionMap,
    edges: &[Edge],
    index: Option<&SpatialIndex>,
  ) -> &VisibleSet {
    let due = match self.last_run {
      Some(last) => now.saturating_duration_since(last) >= self.config.recompute_interval(),
      None => true,
    };
    if due {
      self.current = self.compute(camera, positions, edges, index);
      self.last_run = Some(now);
    }
    &self.current
  }

  /// Compute the visible set immediately, ignoring the rate limit.
  #[cfg_attr(feature = "trace_spans", tracing::instrument(skip_all, name = "visibility::compute"))]
  pub fn compute(
    &self,
    camera: &Camera,
    positions: &PositionMap,
    edges: &[Edge],
    index: Option<&SpatialIndex>,
  ) -> VisibleSet {
    if positions.len() < self.config.cull_threshold {
      return VisibleSet::everything(positions, edges);
    }

    let frustum = camera.frustum();
    let nodes: HashSet<NodeId> = match index {
      Some(index) => index.query_frustum(&frustum).into_iter().collect(),
      None => linear_cull(&frustum, positions),
    };
    let edges: Vec<Edge> = edges
      .iter()
      .filter(|e| nodes.contains(&e.source_id) || nodes.contains(&e.target_id))
      .copied()
      .collect();

    tracing::trace!(
      visible_nodes = nodes.len(),
      total_nodes = positions.len(),
      visible_edges = edges.len(),
      indexed = index.is_some(),
      "visibility recomputed"
    );

    VisibleSet {
      nodes,
      edges,
      culled: true,
    }
  }
}

fn linear_cull(frustum: &Frustum, positions: &PositionMap) -> HashSet<NodeId> {
  positions
    .iter()
    .filter(|(_, p)| frustum.contains_point(*p))
    .map(|(id, _)| id)
    .collect()
}

#[cfg(test)]
#[path = "culler_test.rs"]
mod culler_test;
