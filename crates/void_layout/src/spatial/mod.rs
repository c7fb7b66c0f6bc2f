//! Spatial indexing for proximity and frustum queries.
//!
//! - [`bounds`]: `Aabb` - double-precision box math
//! - [`frustum`]: `Frustum` - six-plane view volume
//! - [`octree`]: `Octree` - arena-backed point octree

pub mod bounds;
pub mod frustum;
pub mod octree;

pub use bounds::Aabb;
pub use frustum::{Frustum, Plane};
pub use octree::{CellHandle, Octree, OctreeSettings};

use crate::types::{NodeId, PositionMap};

/// Octree over node ids, as consumed by visibility culling.
pub type SpatialIndex = Octree<NodeId>;

/// Build a node index whose root covers every position in `positions`.
pub fn index_positions(positions: &PositionMap, settings: OctreeSettings) -> SpatialIndex {
  Octree::build(positions.iter(), settings)
}
