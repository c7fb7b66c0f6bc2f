//! Frustum culling of nodes and their edges.

pub mod camera;
pub mod culler;

pub use camera::Camera;
pub use culler::{VisibilityConfig, VisibilityCuller, VisibleSet};
