//! Tuning constants for the layout, indexing and visibility stages.
//!
//! Config structs take their defaults from here, so a single place documents
//! the engine's out-of-the-box behavior.

use std::f64::consts::PI;

// =============================================================================
// Layout
// =============================================================================

/// Golden angle in radians, `π·(3 − √5)` (≈137.5°).
pub const GOLDEN_ANGLE: f64 = PI * 0.763_932_022_500_210_3;

/// Ideal edge length `k` for force-directed layout.
pub const FORCE_IDEAL_LENGTH: f64 = 30.0;

/// Default iteration budget for force-directed layout.
pub const FORCE_ITERATIONS: usize = 120;

/// Gravity coefficient pulling nodes toward the origin.
pub const FORCE_GRAVITY: f64 = 0.01;

/// Fraction of the raw force applied per iteration before clamping.
pub const FORCE_DAMPING: f64 = 0.1;

/// Distance floor for coincident nodes and zero-length edges.
pub const MIN_DISTANCE: f64 = 0.01;

/// Amplitude of the seeded jitter applied to starting positions.
pub const FORCE_JITTER: f64 = 0.5;

/// Grid lattice spacing.
pub const GRID_SPACING: f64 = 20.0;

/// Distance between consecutive radial shells.
pub const SHELL_SPACING: f64 = 40.0;

/// Nodes per unit² of shell index, so shell `s` holds `SHELL_DENSITY · s²`.
pub const SHELL_DENSITY: f64 = 6.0;

/// Scale of the cluster-center spiral (multiplied by √cluster_count).
pub const CLUSTER_SPACING: f64 = 120.0;

/// Scale of the in-cluster spiral (multiplied by ∛cluster_size).
pub const CLUSTER_NODE_SPACING: f64 = 12.0;

/// Bucket for nodes whose URL has no usable host.
pub const OTHER_DOMAIN: &str = "other";

/// Progress is reported every this many percent of the iteration budget.
pub const PROGRESS_STEP_PERCENT: usize = 10;

// =============================================================================
// Spatial index
// =============================================================================

/// Margin added around the node bounds when building the octree root.
pub const OCTREE_PADDING: f64 = 10.0;

/// Items a leaf holds before it splits.
pub const OCTREE_LEAF_CAPACITY: usize = 8;

/// Maximum subdivision depth (root = 0).
pub const OCTREE_MAX_DEPTH: u32 = 8;

// =============================================================================
// Visibility / rendering
// =============================================================================

/// Node count at which frustum culling starts.
pub const CULLING_THRESHOLD: usize = 200;

/// Node count at which rendering switches to instanced batches.
pub const INSTANCING_THRESHOLD: usize = 100;

/// Node count at which layout moves to the background context.
pub const WORKER_LAYOUT_THRESHOLD: usize = 300;

/// Minimum time between visibility recomputes, in milliseconds.
pub const VISIBILITY_INTERVAL_MS: u64 = 100;

/// Frame samples kept by the performance monitor.
pub const FRAME_WINDOW: usize = 60;

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
