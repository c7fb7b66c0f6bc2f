//! Per-graph orchestration of layout, indexing, culling, LOD and batching.
//!
//! ```text
//! set_graph / set_display_settings
//!        │
//!        ▼
//! update_layout ──┬─ below worker threshold ─► compute_layout ─► apply
//!                 └─ at/above ───────────────► AsyncComputeHost::submit
//!                                                   │
//! poll_layout ◄─────────── latest handle only ──────┘ ─► apply
//!
//! apply: Arc<PositionMap> swap + SpatialIndex rebuild-then-swap
//!
//! frame(now, camera)
//!   ├─ VisibilityCuller::update   (rate-limited)
//!   ├─ LodTable::select           (per visible node)
//!   ├─ RenderThresholds::plan
//!   ├─ DrawList::build            (PerObject | Instanced)
//!   └─ PerformanceMonitor         (observational)
//! ```
//!
//! Until a layout lands, nodes sit at their stored positions.

use std::collections::HashMap;
use std::sync::Arc;

use glam::DVec3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::compute::{AsyncComputeHost, ComputeRequest, LayoutHandle, RequestToken};
use crate::config::EngineConfig;
use crate::error::{ComputeError, LayoutError};
use crate::layout::{compute_layout, spawn_near};
use crate::lod::LodSelection;
use crate::metrics::{FrameCounts, PerformanceMonitor, PerformanceSnapshot};
use crate::render::{AppearanceParams, DrawList, EdgeSegment, Highlight, NodeAppearance, RenderPlan};
use crate::spatial::{index_positions, SpatialIndex};
use crate::types::{Edge, GraphInput, Node, NodeId, PositionMap};
use crate::visibility::{Camera, VisibilityCuller, VisibleSet};

/// User-facing display options.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
  /// Layout mode name, see [`crate::layout::LayoutParams::mode`].
  pub layout_mode: String,
  /// Force iteration override.
  pub iterations: Option<usize>,
  /// Node size multiplier.
  pub node_scale: f32,
  pub show_labels: bool,
  pub show_previews: bool,
  pub show_glow: bool,
  pub show_connections: bool,
  /// Animate live nodes.
  pub pulse: bool,
}

impl Default for DisplaySettings {
  fn default() -> Self {
    Self {
      layout_mode: "force".to_string(),
      iterations: None,
      node_scale: 1.0,
      show_labels: true,
      show_previews: true,
      show_glow: true,
      show_connections: true,
      pulse: true,
    }
  }
}

/// What [`GraphScene::update_layout`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutUpdate {
  /// Mode and node count match the last layout.
  Unchanged,
  /// Computed synchronously and applied.
  Applied,
  /// Submitted to the background context.
  Pending(RequestToken),
}

/// Everything the renderer needs for one frame.
#[derive(Clone, Debug)]
pub struct FrameOutput {
  pub visible: VisibleSet,
  /// LOD per visible node.
  pub lods: HashMap<NodeId, LodSelection>,
  pub plan: RenderPlan,
  pub draw: DrawList,
  /// Progress of an in-flight background layout.
  pub layout_progress: Option<f64>,
  pub performance: PerformanceSnapshot,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct LayoutKey {
  mode: String,
  iterations: Option<usize>,
  node_count: usize,
}

/// One graph and the state derived from it.
pub struct GraphScene {
  config: EngineConfig,
  settings: DisplaySettings,
  graph: GraphInput,
  node_slots: HashMap<NodeId, usize>,
  positions: Arc<PositionMap>,
  index: Arc<SpatialIndex>,
  last_layout: Option<LayoutKey>,
  culler: VisibilityCuller,
  host: AsyncComputeHost,
  pending: Option<LayoutHandle>,
  monitor: PerformanceMonitor,
  highlight: Highlight,
  epoch: Option<Instant>,
}

impl GraphScene {
  pub fn new(config: EngineConfig) -> Self {
    let positions = PositionMap::new();
    let index = index_positions(&positions, config.octree);
    Self {
      culler: VisibilityCuller::new(config.visibility()),
      monitor: PerformanceMonitor::new(config.frame_window),
      settings: DisplaySettings::default(),
      graph: GraphInput::default(),
      node_slots: HashMap::new(),
      positions: Arc::new(positions),
      index: Arc::new(index),
      last_layout: None,
      host: AsyncComputeHost::new(),
      pending: None,
      highlight: Highlight::default(),
      epoch: None,
      config,
    }
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  pub fn settings(&self) -> &DisplaySettings {
    &self.settings
  }

  pub fn graph(&self) -> &GraphInput {
    &self.graph
  }

  /// Current positions, shared with any reader holding the `Arc`.
  pub fn positions(&self) -> Arc<PositionMap> {
    Arc::clone(&self.positions)
  }

  pub fn spatial_index(&self) -> Arc<SpatialIndex> {
    Arc::clone(&self.index)
  }

  /// Replace the graph snapshot.
  ///
  /// Nodes that survive keep their current position; new nodes start at
  /// their stored position.
  pub fn set_graph(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) {
    self.graph = GraphInput::new(nodes, edges);
    self.node_slots = self.graph.index_of();
    let positions: PositionMap = self
      .graph
      .nodes
      .iter()
      .map(|node| {
        let position = self.positions.get(node.id).unwrap_or_else(|| node.stored_position());
        (node.id, position)
      })
      .collect();
    self.install(positions);
  }

  pub fn set_display_settings(&mut self, settings: DisplaySettings) {
    self.settings = settings;
  }

  pub fn set_highlight(&mut self, highlight: Highlight) {
    self.highlight = highlight;
  }

  /// Force the next [`update_layout`](Self::update_layout) to recompute.
  pub fn invalidate_layout(&mut self) {
    self.last_layout = None;
  }

  /// Run a layout if the mode or node count changed since the last one.
  pub fn update_layout(&mut self) -> Result<LayoutUpdate, LayoutError> {
    let key = LayoutKey {
      mode: self.settings.layout_mode.trim().to_ascii_lowercase(),
      iterations: self.settings.iterations,
      node_count: self.graph.node_count(),
    };
    if self.last_layout.as_ref() == Some(&key) {
      return Ok(LayoutUpdate::Unchanged);
    }

    let mode = self.config.layout_mode(&key.mode, key.iterations)?;
    let plan = self.config.thresholds.plan(key.node_count);
    self.last_layout = Some(key);

    if plan.worker_layout {
      let request = ComputeRequest {
        nodes: self.graph.nodes.clone(),
        edges: self.graph.edges.clone(),
        mode: self.settings.layout_mode.clone(),
        iterations: self.settings.iterations,
        params: self.config.layout.clone(),
      };
      match self.host.submit(request) {
        Ok(handle) => {
          let token = handle.token();
          // Replacing the handle drops any older request's channel.
          self.pending = Some(handle);
          return Ok(LayoutUpdate::Pending(token));
        }
        Err(err) => {
          tracing::warn!(%err, "background layout unavailable, computing on the caller");
        }
      }
    }

    self.pending = None;
    let positions = compute_layout(&self.graph, &mode, &mut |_| {});
    self.install(positions);
    Ok(LayoutUpdate::Applied)
  }

  /// Apply a finished background layout.
  ///
  /// Returns `None` while nothing has finished, `Some(Ok(true))` when new
  /// positions were applied, `Some(Ok(false))` when a result was discarded as
  /// stale, and `Some(Err(_))` when the request failed. Failures leave the
  /// current positions in place.
  pub fn poll_layout(&mut self) -> Option<Result<bool, ComputeError>> {
    let handle = self.pending.as_mut()?;
    let token = handle.token();
    let result = handle.poll()?;
    self.pending = None;

    match result {
      Ok(positions) => {
        if !self.host.is_current(token) || !positions.covers_exactly(&self.graph.nodes) {
          tracing::debug!(token, "discarding stale background layout");
          return Some(Ok(false));
        }
        self.install(positions);
        Some(Ok(true))
      }
      Err(err) => {
        tracing::warn!(token, %err, "background layout failed, keeping previous positions");
        Some(Err(err))
      }
    }
  }

  pub fn is_layout_pending(&self) -> bool {
    self.pending.is_some()
  }

  pub fn layout_progress(&self) -> Option<f64> {
    self.pending.as_ref().map(LayoutHandle::progress)
  }

  /// Position to draw `id` at: the laid-out position, or the stored one.
  pub fn display_position(&self, id: NodeId) -> Option<DVec3> {
    self.positions.get(id).or_else(|| self.node(id).map(Node::stored_position))
  }

  pub fn node(&self, id: NodeId) -> Option<&Node> {
    self.node_slots.get(&id).map(|&slot| &self.graph.nodes[slot])
  }

  /// Stored position for a page discovered from `source`.
  pub fn place_near<R: Rng + ?Sized>(&self, source: NodeId, rng: &mut R) -> Option<DVec3> {
    let origin = self.display_position(source)?;
    Some(spawn_near(origin, &self.config.placement, rng))
  }

  /// Build the frame for `camera` at `now`.
  #[cfg_attr(feature = "trace_spans", tracing::instrument(skip_all, name = "scene::frame"))]
  pub fn frame(&mut self, now: Instant, camera: &Camera) -> FrameOutput {
    self.monitor.record_frame(now);
    let epoch = *self.epoch.get_or_insert(now);
    let time_secs = now.saturating_duration_since(epoch).as_secs_f32();

    let node_count = self.graph.node_count();
    let plan = self.config.thresholds.plan(node_count);
    let visible = self
      .culler
      .update(now, camera, &self.positions, &self.graph.edges, Some(&*self.index))
      .clone();

    let lods: HashMap<NodeId, LodSelection> = visible
      .nodes
      .iter()
      .filter_map(|&id| {
        let position = self.positions.get(id)?;
        let mut lod = self.config.lod.select(camera.distance_to(position));
        self.mask_features(&mut lod);
        Some((id, lod))
      })
      .collect();

    let appearance = AppearanceParams {
      node_scale: self.config.appearance.node_scale * self.settings.node_scale,
      pulse_amplitude: if self.settings.pulse {
        self.config.appearance.pulse_amplitude
      } else {
        0.0
      },
      ..self.config.appearance
    };
    let appearances: Vec<NodeAppearance> = self
      .graph
      .nodes
      .iter()
      .filter_map(|node| {
        let lod = lods.get(&node.id)?;
        let position = self.positions.get(node.id)?;
        Some(NodeAppearance::resolve(node, position, lod.geometry, &self.highlight, time_secs, &appearance))
      })
      .collect();

    let segments: Vec<EdgeSegment> = visible
      .edges
      .iter()
      .filter(|edge| {
        lods
          .get(&edge.source_id)
          .or_else(|| lods.get(&edge.target_id))
          .is_some_and(|lod| lod.features.connections)
      })
      .filter_map(|edge| {
        let start = self.positions.get(edge.source_id)?;
        let end = self.positions.get(edge.target_id)?;
        Some(EdgeSegment::resolve(edge, start, end, &self.highlight))
      })
      .collect();

    let draw = DrawList::build(plan.draw_path, &appearances, &segments);
    let stats = draw.stats();
    self.monitor.record_counts(FrameCounts {
      draw_calls: stats.draw_calls,
      triangles: stats.triangles,
      visible_nodes: visible.nodes.len(),
      total_nodes: node_count,
      visible_edges: visible.edges.len(),
      total_edges: self.graph.edges.len(),
    });

    FrameOutput {
      visible,
      lods,
      plan,
      draw,
      layout_progress: self.layout_progress(),
      performance: self.monitor.snapshot(),
    }
  }

  /// Release the background context. Pending results are dropped.
  pub fn shutdown(&mut self) {
    self.pending = None;
    self.host.dispose();
  }

  fn mask_features(&self, lod: &mut LodSelection) {
    let features = &mut lod.features;
    features.labels &= self.settings.show_labels;
    features.preview &= self.settings.show_previews;
    features.glow &= self.settings.show_glow;
    features.connections &= self.settings.show_connections;
  }

  /// Swap in new positions and a freshly built index.
  fn install(&mut self, positions: PositionMap) {
    let index = index_positions(&positions, self.config.octree);
    tracing::debug!(nodes = positions.len(), cells = index.cell_count(), "scene positions installed");
    self.positions = Arc::new(positions);
    self.index = Arc::new(index);
    self.culler.invalidate();
  }
}

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;
