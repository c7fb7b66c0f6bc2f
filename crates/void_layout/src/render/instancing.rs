//! Per-node appearance and the two draw paths built from it.
//!
//! ```text
//! Node + position + LOD + Highlight + time
//!            │
//!            ▼
//!     NodeAppearance::resolve          (single source of truth)
//!            │
//!    ┌───────┴─────────┐
//!    ▼                 ▼
//! ObjectDraw[]     InstanceBatch[] { transforms[], colors[] }
//! (PerObject)      (Instanced, one batch per GeometryDetail)
//! ```
//!
//! Both paths carry the same transform, color and tessellation for every
//! node, and [`DrawList::pick`] runs the same ray test over either.

use std::collections::BTreeMap;

use glam::{DMat4, DVec2, DVec3, Mat4, Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use super::DrawPath;
use crate::constants::GOLDEN_ANGLE;
use crate::lod::GeometryDetail;
use crate::types::{Edge, Node, NodeId};
use crate::visibility::Camera;

const ALIVE_COLOR: Vec4 = Vec4::new(0.35, 0.8, 1.0, 1.0);
const DEAD_COLOR: Vec4 = Vec4::new(0.45, 0.45, 0.5, 0.6);
const SELECTED_COLOR: Vec4 = Vec4::new(1.0, 0.8, 0.25, 1.0);
const EDGE_COLOR: Vec4 = Vec4::new(0.5, 0.6, 0.8, 0.35);
const EDGE_HIGHLIGHT_COLOR: Vec4 = Vec4::new(0.9, 0.9, 1.0, 0.9);

/// Fraction of white mixed into a hovered node's color.
const HOVER_MIX: f32 = 0.5;

/// Hover and selection state from the input layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Highlight {
  pub hovered: Option<NodeId>,
  pub selected: Option<NodeId>,
}

impl Highlight {
  #[inline]
  fn touches(&self, id: NodeId) -> bool {
    self.hovered == Some(id) || self.selected == Some(id)
  }
}

/// Size and animation parameters shared by both draw paths.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceParams {
  /// Sphere radius at scale 1.
  pub base_radius: f32,
  /// User size multiplier.
  pub node_scale: f32,
  /// Relative radius swing of the pulse.
  pub pulse_amplitude: f32,
  /// Pulse angular speed in radians per second.
  pub pulse_speed: f32,
}

impl AppearanceParams {
  pub const DEFAULT: Self = Self {
    base_radius: 1.0,
    node_scale: 1.0,
    pulse_amplitude: 0.08,
    pulse_speed: 2.0,
  };
}

impl Default for AppearanceParams {
  fn default() -> Self {
    Self::DEFAULT
  }
}

/// Resolved look of one node for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeAppearance {
  pub id: NodeId,
  pub position: Vec3,
  pub radius: f32,
  pub color: Vec4,
  pub detail: GeometryDetail,
}

impl NodeAppearance {
  pub fn resolve(
    node: &Node,
    position: DVec3,
    detail: GeometryDetail,
    highlight: &Highlight,
    time_secs: f32,
    params: &AppearanceParams,
  ) -> Self {
    // Dead pages stay still.
    let pulse = if node.is_alive {
      1.0 + params.pulse_amplitude * (time_secs * params.pulse_speed + pulse_phase(node.id)).sin()
    } else {
      1.0
    };

    let mut color = if node.is_alive { ALIVE_COLOR } else { DEAD_COLOR };
    if highlight.selected == Some(node.id) {
      color = SELECTED_COLOR;
    }
    if highlight.hovered == Some(node.id) {
      color = color.truncate().lerp(Vec3::ONE, HOVER_MIX).extend(color.w.max(0.9));
    }

    Self {
      id: node.id,
      position: position.as_vec3(),
      radius: params.base_radius * params.node_scale * pulse,
      color,
      detail,
    }
  }

  /// Uniform scale by radius, then translation.
  #[inline]
  pub fn transform(&self) -> Mat4 {
    Mat4::from_scale_rotation_translation(Vec3::splat(self.radius), Quat::IDENTITY, self.position)
  }
}

/// Per-node phase offset so neighbours do not pulse in lockstep.
#[inline]
fn pulse_phase(id: NodeId) -> f32 {
  ((id as f64 * GOLDEN_ANGLE) % std::f64::consts::TAU) as f32
}

/// One node drawn on its own.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectDraw {
  pub id: NodeId,
  pub transform: Mat4,
  pub color: Vec4,
  pub detail: GeometryDetail,
}

/// Shared sphere geometry at one tessellation plus per-instance buffers,
/// uploaded as one draw.
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceBatch {
  pub ids: Vec<NodeId>,
  pub transforms: Vec<Mat4>,
  pub colors: Vec<Vec4>,
  /// Tessellation of the shared mesh.
  pub detail: GeometryDetail,
}

impl InstanceBatch {
  pub fn new(detail: GeometryDetail) -> Self {
    Self {
      ids: Vec::new(),
      transforms: Vec::new(),
      colors: Vec::new(),
      detail,
    }
  }

  /// One batch per geometry tier, finest first. Instances keep their input
  /// order within a batch.
  pub fn by_detail(appearances: &[NodeAppearance]) -> Vec<Self> {
    let mut batches: BTreeMap<GeometryDetail, Self> = BTreeMap::new();
    for appearance in appearances {
      batches
        .entry(appearance.detail)
        .or_insert_with(|| Self::new(appearance.detail))
        .push(appearance);
    }
    batches.into_values().collect()
  }

  fn push(&mut self, appearance: &NodeAppearance) {
    self.ids.push(appearance.id);
    self.transforms.push(appearance.transform());
    self.colors.push(appearance.color);
  }

  pub fn len(&self) -> usize {
    self.ids.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ids.is_empty()
  }

  /// Nearest instance hit by `ray`.
  pub fn pick(&self, ray: &Ray) -> Option<NodeId> {
    nearest_hit(ray, self.instances())
  }

  fn instances(&self) -> impl Iterator<Item = (NodeId, &Mat4)> + '_ {
    self.ids.iter().copied().zip(self.transforms.iter())
  }
}

/// Line segment for one edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeSegment {
  pub source_id: NodeId,
  pub target_id: NodeId,
  pub start: Vec3,
  pub end: Vec3,
  pub color: Vec4,
}

impl EdgeSegment {
  pub fn resolve(edge: &Edge, start: DVec3, end: DVec3, highlight: &Highlight) -> Self {
    let color = if highlight.touches(edge.source_id) || highlight.touches(edge.target_id) {
      EDGE_HIGHLIGHT_COLOR
    } else {
      EDGE_COLOR
    };
    Self {
      source_id: edge.source_id,
      target_id: edge.target_id,
      start: start.as_vec3(),
      end: end.as_vec3(),
      color,
    }
  }
}

/// Line-list vertex buffer, two vertices per edge.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeBatch {
  pub positions: Vec<Vec3>,
  pub colors: Vec<Vec4>,
}

impl EdgeBatch {
  pub fn from_segments(segments: &[EdgeSegment]) -> Self {
    let mut batch = Self {
      positions: Vec::with_capacity(segments.len() * 2),
      colors: Vec::with_capacity(segments.len() * 2),
    };
    for segment in segments {
      batch.positions.extend([segment.start, segment.end]);
      batch.colors.extend([segment.color, segment.color]);
    }
    batch
  }

  pub fn segment_count(&self) -> usize {
    self.positions.len() / 2
  }
}

/// Draw and triangle counts for the performance monitor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawStats {
  pub draw_calls: u32,
  pub triangles: u64,
}

/// Everything the renderer submits for one frame.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawList {
  PerObject {
    nodes: Vec<ObjectDraw>,
    edges: Vec<EdgeSegment>,
  },
  Instanced {
    nodes: Vec<InstanceBatch>,
    edges: EdgeBatch,
  },
}

impl DrawList {
  pub fn build(path: DrawPath, nodes: &[NodeAppearance], edges: &[EdgeSegment]) -> Self {
    match path {
      DrawPath::PerObject => Self::PerObject {
        nodes: nodes
          .iter()
          .map(|a| ObjectDraw {
            id: a.id,
            transform: a.transform(),
            color: a.color,
            detail: a.detail,
          })
          .collect(),
        edges: edges.to_vec(),
      },
      DrawPath::Instanced => Self::Instanced {
        nodes: InstanceBatch::by_detail(nodes),
        edges: EdgeBatch::from_segments(edges),
      },
    }
  }

  pub fn path(&self) -> DrawPath {
    match self {
      Self::PerObject { .. } => DrawPath::PerObject,
      Self::Instanced { .. } => DrawPath::Instanced,
    }
  }

  pub fn node_count(&self) -> usize {
    match self {
      Self::PerObject { nodes, .. } => nodes.len(),
      Self::Instanced { nodes, .. } => nodes.iter().map(InstanceBatch::len).sum(),
    }
  }

  /// `(id, transform, color)` per node, in submission order: input order for
  /// per-object draws, batch by batch for instanced draws.
  pub fn node_instances(&self) -> Vec<(NodeId, Mat4, Vec4)> {
    match self {
      Self::PerObject { nodes, .. } => nodes.iter().map(|d| (d.id, d.transform, d.color)).collect(),
      Self::Instanced { nodes, .. } => nodes
        .iter()
        .flat_map(|batch| batch.ids.iter().zip(&batch.transforms).zip(&batch.colors))
        .map(|((id, transform), color)| (*id, *transform, *color))
        .collect(),
    }
  }

  /// Nearest node hit by `ray`, identical for both paths.
  pub fn pick(&self, ray: &Ray) -> Option<NodeId> {
    match self {
      Self::PerObject { nodes, .. } => nearest_hit(ray, nodes.iter().map(|d| (d.id, &d.transform))),
      Self::Instanced { nodes, .. } => nearest_hit(ray, nodes.iter().flat_map(InstanceBatch::instances)),
    }
  }

  pub fn stats(&self) -> DrawStats {
    match self {
      Self::PerObject { nodes, edges } => DrawStats {
        draw_calls: (nodes.len() + edges.len()) as u32,
        triangles: nodes.iter().map(|d| sphere_triangles(d.detail)).sum(),
      },
      Self::Instanced { nodes, edges } => DrawStats {
        draw_calls: nodes.iter().filter(|batch| !batch.is_empty()).count() as u32
          + u32::from(edges.segment_count() > 0),
        triangles: nodes
          .iter()
          .map(|batch| batch.len() as u64 * sphere_triangles(batch.detail))
          .sum(),
      },
    }
  }
}

/// UV sphere with `s` segments around and `s / 2` rings: `s²` triangles.
#[inline]
fn sphere_triangles(detail: GeometryDetail) -> u64 {
  let segments = detail.segments() as u64;
  segments * segments
}

fn nearest_hit<'a>(ray: &Ray, nodes: impl Iterator<Item = (NodeId, &'a Mat4)>) -> Option<NodeId> {
  nodes
    .filter_map(|(id, transform)| {
      let center = transform.w_axis.truncate();
      let radius = transform.x_axis.truncate().length();
      ray.sphere_hit(center, radius).map(|t| (id, t))
    })
    .min_by(|a, b| a.1.total_cmp(&b.1))
    .map(|(id, _)| id)
}

/// Picking ray in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
  pub origin: Vec3,
  /// Unit length.
  pub direction: Vec3,
}

impl Ray {
  /// Returns `None` for a zero or non-finite direction.
  pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
    let direction = direction.try_normalize()?;
    Some(Self { origin, direction })
  }

  /// Ray through normalized device coordinates `ndc` (both in `[-1, 1]`).
  pub fn from_camera(camera: &Camera, ndc: DVec2) -> Option<Self> {
    let inverse: DMat4 = (camera.projection * camera.view()).inverse();
    let near = inverse.project_point3(ndc.extend(0.0));
    let far = inverse.project_point3(ndc.extend(1.0));
    if !near.is_finite() || !far.is_finite() {
      return None;
    }
    Self::new(near.as_vec3(), (far - near).as_vec3())
  }

  /// Distance along the ray to the first intersection with the sphere, if
  /// the sphere is not entirely behind the origin.
  pub fn sphere_hit(&self, center: Vec3, radius: f32) -> Option<f32> {
    let offset = self.origin - center;
    let b = offset.dot(self.direction);
    let c = offset.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
      return None;
    }
    let root = discriminant.sqrt();
    let t = if -b - root >= 0.0 { -b - root } else { -b + root };
    (t >= 0.0).then_some(t)
  }
}

#[cfg(test)]
#[path = "instancing_test.rs"]
mod instancing_test;
