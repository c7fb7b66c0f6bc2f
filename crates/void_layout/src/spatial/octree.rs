//! Point octree stored as an arena of cells addressed by index.
//!
//! ```text
//!   cells[0]  root ── Branch([1..=8])
//!   cells[1]  ├─ Leaf [(id, pos), ...]
//!   cells[2]  ├─ Branch([9..=16])
//!   ...       └─ ...
//! ```
//!
//! A cell is either a leaf holding `(item, position)` pairs or a branch
//! holding exactly 8 child handles, never both. Every inserted item lives in
//! exactly one leaf, and splitting a leaf moves its items into the new
//! children without losing any. Traversal is iterative, so pathological
//! inputs cannot overflow the stack.
//!
//! The tree is never mutated while it is being read: callers rebuild a new
//! tree and swap it in whole.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{Aabb, Frustum};
use crate::constants::{OCTREE_LEAF_CAPACITY, OCTREE_MAX_DEPTH, OCTREE_PADDING};

/// Index of a cell in the arena.
pub type CellHandle = u32;

const ROOT: CellHandle = 0;

/// Octree construction settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeSettings {
  /// Margin added around the item bounds when sizing the root.
  pub padding: f64,
  /// Items a leaf holds before splitting.
  pub leaf_capacity: usize,
  /// Deepest level a leaf may reach (root = 0).
  pub max_depth: u32,
}

impl OctreeSettings {
  pub const DEFAULT: Self = Self {
    padding: OCTREE_PADDING,
    leaf_capacity: OCTREE_LEAF_CAPACITY,
    max_depth: OCTREE_MAX_DEPTH,
  };
}

impl Default for OctreeSettings {
  fn default() -> Self {
    Self::DEFAULT
  }
}

type LeafItems<T> = SmallVec<[(T, DVec3); OCTREE_LEAF_CAPACITY]>;

#[derive(Clone, Debug)]
enum Slot<T> {
  Leaf(LeafItems<T>),
  Branch([CellHandle; 8]),
}

#[derive(Clone, Debug)]
struct Cell<T> {
  bounds: Aabb,
  depth: u32,
  slot: Slot<T>,
}

/// Point octree over items of type `T`.
#[derive(Clone, Debug)]
pub struct Octree<T> {
  cells: Vec<Cell<T>>,
  settings: OctreeSettings,
  len: usize,
}

impl<T: Copy> Octree<T> {
  /// Empty tree covering `bounds`.
  pub fn new(bounds: Aabb, settings: OctreeSettings) -> Self {
    Self {
      cells: vec![Cell {
        bounds,
        depth: 0,
        slot: Slot::Leaf(SmallVec::new()),
      }],
      settings,
      len: 0,
    }
  }

  /// Build a tree whose root covers every item plus the configured padding.
  #[cfg_attr(feature = "trace_spans", tracing::instrument(skip_all, name = "octree::build"))]
  pub fn build(items: impl IntoIterator<Item = (T, DVec3)>, settings: OctreeSettings) -> Self {
    let items: Vec<(T, DVec3)> = items.into_iter().collect();
    let bounds = Aabb::from_points(items.iter().map(|(_, p)| *p))
      .unwrap_or(Aabb::new(DVec3::ZERO, DVec3::ZERO))
      .padded(settings.padding.max(0.0));

    let mut tree = Self::new(bounds, settings);
    for (item, position) in items {
      tree.insert(item, position);
    }
    tracing::debug!(
      items = tree.len,
      cells = tree.cells.len(),
      "octree built"
    );
    tree
  }

  /// Insert `item` at `position`.
  ///
  /// Returns false, without storing anything, when `position` is outside the
  /// root bounds or not finite.
  pub fn insert(&mut self, item: T, position: DVec3) -> bool {
    if !position.is_finite() || !self.bounds().contains_point(position) {
      return false;
    }

    let mut handle = ROOT;
    while let Slot::Branch(children) = &self.cells[handle as usize].slot {
      let octant = self.cells[handle as usize].bounds.octant_of(position);
      handle = children[octant as usize];
    }

    if let Slot::Leaf(items) = &mut self.cells[handle as usize].slot {
      items.push((item, position));
    }
    self.len += 1;
    self.split_overfull(handle);
    true
  }

  /// Split `start` and any resulting overfull children until every leaf is
  /// within capacity or at max depth.
  fn split_overfull(&mut self, start: CellHandle) {
    let mut pending = vec![start];
    while let Some(handle) = pending.pop() {
      let cell = &mut self.cells[handle as usize];
      if cell.depth >= self.settings.max_depth {
        continue;
      }
      let Slot::Leaf(items) = &mut cell.slot else {
        continue;
      };
      if items.len() <= self.settings.leaf_capacity {
        continue;
      }

      let items = std::mem::take(items);
      let bounds = cell.bounds;
      let depth = cell.depth + 1;

      let first = self.cells.len() as CellHandle;
      let children: [CellHandle; 8] = std::array::from_fn(|o| first + o as CellHandle);
      for octant in 0..8u8 {
        self.cells.push(Cell {
          bounds: bounds.octant(octant),
          depth,
          slot: Slot::Leaf(SmallVec::new()),
        });
      }
      for (item, position) in items {
        let child = children[bounds.octant_of(position) as usize];
        if let Slot::Leaf(list) = &mut self.cells[child as usize].slot {
          list.push((item, position));
        }
      }

      self.cells[handle as usize].slot = Slot::Branch(children);
      pending.extend(children);
    }
  }

  /// Items whose position lies within `radius` of `center`.
  pub fn query_radius(&self, center: DVec3, radius: f64) -> Vec<T> {
    let mut out = Vec::new();
    if self.len == 0 || !(radius >= 0.0) || !center.is_finite() {
      return out;
    }
    let radius_sq = radius * radius;
    self.visit(
      |bounds| bounds.intersects_sphere(center, radius),
      |position| position.distance_squared(center) <= radius_sq,
      &mut out,
    );
    out
  }

  /// Items whose position lies inside `frustum`.
  pub fn query_frustum(&self, frustum: &Frustum) -> Vec<T> {
    let mut out = Vec::new();
    if self.len == 0 {
      return out;
    }
    self.visit(
      |bounds| frustum.intersects_aabb(bounds),
      |position| frustum.contains_point(position),
      &mut out,
    );
    out
  }

  /// Depth-first walk pruning cells rejected by `enter`, collecting leaf
  /// items accepted by `accept`.
  fn visit(
    &self,
    enter: impl Fn(&Aabb) -> bool,
    accept: impl Fn(DVec3) -> bool,
    out: &mut Vec<T>,
  ) {
    let mut stack: SmallVec<[CellHandle; 64]> = SmallVec::new();
    stack.push(ROOT);
    while let Some(handle) = stack.pop() {
      let cell = &self.cells[handle as usize];
      if !enter(&cell.bounds) {
        continue;
      }
      match &cell.slot {
        Slot::Leaf(items) => {
          out.extend(items.iter().filter(|(_, p)| accept(*p)).map(|(item, _)| *item));
        }
        Slot::Branch(children) => stack.extend(children.iter().copied()),
      }
    }
  }

  /// Root bounds.
  #[inline]
  pub fn bounds(&self) -> Aabb {
    self.cells[ROOT as usize].bounds
  }

  /// Number of stored items.
  #[inline]
  pub fn len(&self) -> usize {
    self.len
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn settings(&self) -> &OctreeSettings {
    &self.settings
  }

  /// Total cells in the arena (leaves and branches).
  pub fn cell_count(&self) -> usize {
    self.cells.len()
  }

  /// Leaves with their bounds, depth and items.
  pub fn leaves(&self) -> impl Iterator<Item = (Aabb, u32, &[(T, DVec3)])> + '_ {
    self.cells.iter().filter_map(|cell| match &cell.slot {
      Slot::Leaf(items) => Some((cell.bounds, cell.depth, items.as_slice())),
      Slot::Branch(_) => None,
    })
  }
}

#[cfg(test)]
#[path = "octree_test.rs"]
mod octree_test;
