//! void_layout - 3D layout and visibility engine for crawled web graphs
//!
//! Turns a set of pages and links into positions, then decides every frame
//! which nodes are visible, how much detail each one gets and how the batch
//! reaches the GPU. Rendering, crawling and persistence live elsewhere; this
//! crate only sees the node/edge lists handed to it.
//!
//! # Features
//!
//! - **Layout modes**: identity, force-directed, grid, radial shells and
//!   per-domain clusters, each a variant of [`LayoutMode`]
//! - **Octree index**: arena-backed point octree for radius and frustum queries
//! - **Visibility**: rate-limited frustum culling with derived edge visibility
//! - **LOD**: distance thresholds toggling labels, previews, glow and edges
//! - **Draw paths**: per-object or instanced batches from one appearance source
//! - **Background layout**: serialized requests on a rayon pool, with
//!   progress, request tokens and cancellation
//!
//! # Example
//!
//! ```ignore
//! use void_layout::{Camera, EngineConfig, GraphScene};
//!
//! let mut scene = GraphScene::new(EngineConfig::default());
//! scene.set_graph(nodes, edges);
//! scene.update_layout()?;
//!
//! // Each frame
//! scene.poll_layout();
//! let frame = scene.frame(Instant::now(), &camera);
//! renderer.submit(&frame.draw);
//! ```

pub mod constants;
pub mod error;
pub mod types;

pub use error::{ComputeError, ConfigError, LayoutError, LodTableError};
pub use types::{Edge, GraphInput, Node, NodeId, PositionMap};

// Layout algorithms
pub mod layout;
pub use layout::{compute_layout, compute_layout_cancellable, LayoutAlgorithm, LayoutMode, LayoutParams};

// Spatial index
pub mod spatial;
pub use spatial::{Aabb, Frustum, Octree, OctreeSettings, SpatialIndex};

// Level of detail
pub mod lod;
pub use lod::{GeometryDetail, LodFeatures, LodLevel, LodSelection, LodTable};

// Visibility culling
pub mod visibility;
pub use visibility::{Camera, VisibilityConfig, VisibilityCuller, VisibleSet};

// Draw path selection and batching
pub mod render;
pub use render::{DrawList, DrawPath, RenderPlan, RenderThresholds};

// Background layout
pub mod compute;
pub use compute::{AsyncComputeHost, ComputeEvent, ComputeRequest, LayoutHandle, RequestToken};

pub mod metrics;
pub use metrics::{PerformanceMonitor, PerformanceSnapshot};

pub mod config;
pub use config::EngineConfig;

pub mod scene;
pub use scene::{DisplaySettings, FrameOutput, GraphScene, LayoutUpdate};
