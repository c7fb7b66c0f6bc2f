//! Layout engine: computes a position for every node.
//!
//! Each mode is a variant of [`LayoutMode`] carrying its own parameters, and
//! each parameter type implements [`LayoutAlgorithm`]. Dispatch is a single
//! exhaustive match in [`LayoutMode::algorithm`].
//!
//! ```text
//! GraphInput ──► LayoutMode::algorithm() ──► LayoutAlgorithm::compute() ──► PositionMap
//!                     │
//!                     ├─ Identity       stored positions, unchanged
//!                     ├─ Force          spring-electrical simulation
//!                     ├─ Grid           cube-root lattice
//!                     ├─ RadialShell    degree-sorted Fibonacci shells
//!                     └─ DomainCluster  per-domain Fibonacci clusters
//! ```
//!
//! No mode fails. Malformed input lands in fallback buckets, and the output
//! always covers every input node id exactly once.

pub mod cluster;
pub mod force;
pub mod grid;
pub mod identity;
pub mod placement;
pub mod radial;
pub mod sphere;

pub use cluster::{second_level_domain, Cluster, ClusterParams};
pub use force::ForceParams;
pub use grid::GridParams;
pub use identity::IdentityLayout;
pub use placement::{spawn_near, PlacementParams};
pub use radial::RadialParams;

use std::sync::atomic::AtomicBool;

use serde::{Deserialize, Serialize};

use crate::constants::PROGRESS_STEP_PERCENT;
use crate::error::LayoutError;
use crate::types::{GraphInput, PositionMap};

/// One layout algorithm.
pub trait LayoutAlgorithm: Send + Sync {
  /// Compute positions for every node in `graph`.
  ///
  /// `progress` receives non-decreasing values in `[0, 1]`.
  fn compute(&self, graph: &GraphInput, progress: &mut dyn FnMut(f64)) -> PositionMap;

  /// Like [`compute`](Self::compute), but stops early once `cancel` is set.
  ///
  /// A stopped run still covers every node; it never reports 1.0 progress.
  /// Closed-form modes finish in one pass and ignore the flag.
  fn compute_cancellable(
    &self,
    graph: &GraphInput,
    progress: &mut dyn FnMut(f64),
    cancel: &AtomicBool,
  ) -> PositionMap {
    let _ = cancel;
    self.compute(graph, progress)
  }
}

/// Layout mode selection with per-mode parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LayoutMode {
  /// Stored positions, unchanged.
  Identity,
  Force(ForceParams),
  Grid(GridParams),
  RadialShell(RadialParams),
  DomainCluster(ClusterParams),
}

impl LayoutMode {
  /// Parse a display-setting mode name with default parameters.
  ///
  /// `iterations` overrides the force iteration budget and is ignored by the
  /// other modes.
  pub fn from_name(name: &str, iterations: Option<usize>) -> Result<Self, LayoutError> {
    LayoutParams::default().mode(name, iterations)
  }

  /// Canonical mode name.
  pub fn name(&self) -> &'static str {
    match self {
      Self::Identity => "identity",
      Self::Force(_) => "force",
      Self::Grid(_) => "grid",
      Self::RadialShell(_) => "radial",
      Self::DomainCluster(_) => "cluster",
    }
  }

  /// Implementation for this mode.
  pub fn algorithm(&self) -> &dyn LayoutAlgorithm {
    match self {
      Self::Identity => &IdentityLayout,
      Self::Force(params) => params,
      Self::Grid(params) => params,
      Self::RadialShell(params) => params,
      Self::DomainCluster(params) => params,
    }
  }
}

impl Default for LayoutMode {
  fn default() -> Self {
    Self::Identity
  }
}

/// Parameters for every mode, used to turn a mode name into a [`LayoutMode`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
  pub force: ForceParams,
  pub grid: GridParams,
  pub radial: RadialParams,
  pub cluster: ClusterParams,
}

impl LayoutParams {
  /// Mode for a display-setting name.
  ///
  /// Accepts `none`/`identity`, `force`, `grid`, `radial`/`shells` and
  /// `cluster`/`domain`, case-insensitively.
  pub fn mode(&self, name: &str, iterations: Option<usize>) -> Result<LayoutMode, LayoutError> {
    match name.trim().to_ascii_lowercase().as_str() {
      "none" | "identity" => Ok(LayoutMode::Identity),
      "force" | "force-directed" | "force_directed" => {
        let mut params = self.force.clone();
        if let Some(iterations) = iterations {
          params.iterations = iterations;
        }
        Ok(LayoutMode::Force(params))
      }
      "grid" => Ok(LayoutMode::Grid(self.grid.clone())),
      "radial" | "shells" | "radial-shell" | "radial_shell" => Ok(LayoutMode::RadialShell(self.radial.clone())),
      "cluster" | "domain" | "domain-cluster" | "domain_cluster" => {
        Ok(LayoutMode::DomainCluster(self.cluster.clone()))
      }
      _ => Err(LayoutError::UnsupportedMode(name.to_string())),
    }
  }
}

/// Run `mode` over `graph`.
pub fn compute_layout(
  graph: &GraphInput,
  mode: &LayoutMode,
  progress: &mut dyn FnMut(f64),
) -> PositionMap {
  compute_layout_cancellable(graph, mode, progress, &AtomicBool::new(false))
}

/// Run `mode` over `graph`, giving up early once `cancel` is set.
#[cfg_attr(feature = "trace_spans", tracing::instrument(skip_all, name = "layout::compute", fields(mode = mode.name())))]
pub fn compute_layout_cancellable(
  graph: &GraphInput,
  mode: &LayoutMode,
  progress: &mut dyn FnMut(f64),
  cancel: &AtomicBool,
) -> PositionMap {
  let start = web_time::Instant::now();
  let positions = mode.algorithm().compute_cancellable(graph, progress, cancel);
  debug_assert!(positions.covers_exactly(&graph.nodes));
  tracing::debug!(
    mode = mode.name(),
    nodes = graph.node_count(),
    edges = graph.edges.len(),
    elapsed_us = start.elapsed().as_micros() as u64,
    "layout computed"
  );
  positions
}

/// Throttles progress callbacks to roughly every 10% of the work.
///
/// Values are clamped to `[0, 1]`, never decrease, and stop after 1.0.
pub struct ProgressReporter<'a> {
  sink: &'a mut dyn FnMut(f64),
  total: usize,
  step: usize,
  next_emit: usize,
  last: f64,
}

impl<'a> ProgressReporter<'a> {
  pub fn new(sink: &'a mut dyn FnMut(f64), total: usize) -> Self {
    let step = (total * PROGRESS_STEP_PERCENT / 100).max(1);
    Self {
      sink,
      total,
      step,
      next_emit: step,
      last: 0.0,
    }
  }

  /// Report that `done` of `total` units have finished.
  pub fn advance(&mut self, done: usize) {
    if self.total == 0 || done < self.next_emit {
      return;
    }
    self.next_emit = (done / self.step + 1) * self.step;
    self.emit(done as f64 / self.total as f64);
  }

  /// Report completion.
  pub fn finish(&mut self) {
    self.emit(1.0);
  }

  fn emit(&mut self, value: f64) {
    let value = value.clamp(0.0, 1.0);
    if value < self.last || self.last >= 1.0 {
      return;
    }
    self.last = value;
    (self.sink)(value);
  }
}
