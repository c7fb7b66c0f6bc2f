//! Identity layout: stored positions pass through unchanged.

use super::LayoutAlgorithm;
use crate::types::{GraphInput, PositionMap};

/// Layout for the "none" display mode.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityLayout;

impl LayoutAlgorithm for IdentityLayout {
  fn compute(&self, graph: &GraphInput, progress: &mut dyn FnMut(f64)) -> PositionMap {
    let positions = PositionMap::from_stored(&graph.nodes);
    progress(1.0);
    positions
  }
}
