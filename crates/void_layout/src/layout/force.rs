//! Force-directed layout (spring-electrical model).
//!
//! Per iteration:
//! - every node pair repels with magnitude `k² / d`
//! - every edge attracts its endpoints with magnitude `d² / k`
//! - every node is pulled toward the origin by `gravity · |p|`
//!
//! The summed force is damped, then clamped to a max-move bound that cools
//! linearly from `initial_max_move` to zero over the iteration budget.
//! Two connected nodes therefore settle at distance ≈ `k`.

use std::sync::atomic::{AtomicBool, Ordering};

use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::sphere::fibonacci_sphere;
use super::{LayoutAlgorithm, ProgressReporter};
use crate::constants::{
  FORCE_DAMPING, FORCE_GRAVITY, FORCE_IDEAL_LENGTH, FORCE_ITERATIONS, FORCE_JITTER, MIN_DISTANCE,
};
use crate::types::{GraphInput, PositionMap};

/// Force-directed layout parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceParams {
  /// Ideal edge length `k`.
  pub ideal_length: f64,
  /// Iteration budget.
  pub iterations: usize,
  /// Pull toward the origin, proportional to position magnitude.
  pub gravity: f64,
  /// Fraction of the raw force applied per iteration.
  pub damping: f64,
  /// Max displacement in the first iteration. Cools linearly to zero.
  pub initial_max_move: f64,
  /// Amplitude of the seeded jitter added to starting positions.
  pub jitter: f64,
  /// Jitter seed. Same seed and input give the same layout.
  pub seed: u64,
}

impl ForceParams {
  pub const DEFAULT: Self = Self {
    ideal_length: FORCE_IDEAL_LENGTH,
    iterations: FORCE_ITERATIONS,
    gravity: FORCE_GRAVITY,
    damping: FORCE_DAMPING,
    initial_max_move: FORCE_IDEAL_LENGTH,
    jitter: FORCE_JITTER,
    seed: 0x5eed,
  };

  /// Max displacement allowed in iteration `iteration`.
  #[inline]
  pub fn max_move(&self, iteration: usize) -> f64 {
    if self.iterations == 0 {
      return 0.0;
    }
    let remaining = 1.0 - iteration as f64 / self.iterations as f64;
    self.initial_max_move * remaining.max(0.0)
  }
}

impl Default for ForceParams {
  fn default() -> Self {
    Self::DEFAULT
  }
}

impl LayoutAlgorithm for ForceParams {
  fn compute(&self, graph: &GraphInput, progress: &mut dyn FnMut(f64)) -> PositionMap {
    self.compute_cancellable(graph, progress, &AtomicBool::new(false))
  }

  #[cfg_attr(feature = "trace_spans", tracing::instrument(skip_all, name = "layout::force"))]
  fn compute_cancellable(
    &self,
    graph: &GraphInput,
    progress: &mut dyn FnMut(f64),
    cancel: &AtomicBool,
  ) -> PositionMap {
    let mut reporter = ProgressReporter::new(progress, self.iterations);
    if graph.nodes.is_empty() {
      reporter.finish();
      return PositionMap::new();
    }

    let mut rng = StdRng::seed_from_u64(self.seed);
    let mut positions: Vec<DVec3> = graph
      .nodes
      .iter()
      .map(|node| start_position(node.stored_position()) + jitter(&mut rng, self.jitter))
      .collect();

    let index = graph.index_of();
    let springs: Vec<(usize, usize)> = graph
      .edges
      .iter()
      .filter_map(|edge| {
        let a = *index.get(&edge.source_id)?;
        let b = *index.get(&edge.target_id)?;
        // Self-loops exert no force.
        (a != b).then_some((a, b))
      })
      .collect();

    let k = self.ideal_length.max(MIN_DISTANCE);
    let k_sq = k * k;

    let mut cancelled = false;
    for iteration in 0..self.iterations {
      if cancel.load(Ordering::Relaxed) {
        cancelled = true;
        break;
      }
      let max_move = self.max_move(iteration);
      let mut forces = repulsion(&positions, k_sq);

      for &(a, b) in &springs {
        let delta = positions[a] - positions[b];
        let dist = delta.length().max(MIN_DISTANCE);
        // |pull| = d² / k along the edge.
        let pull = delta * (dist / k);
        forces[a] -= pull;
        forces[b] += pull;
      }

      for (position, force) in positions.iter_mut().zip(forces) {
        let force = force - *position * self.gravity;
        *position += clamp_length(force * self.damping, max_move);
      }

      reporter.advance(iteration + 1);
    }

    if cancelled {
      tracing::debug!(nodes = positions.len(), "force layout cancelled");
    } else {
      reporter.finish();
    }
    graph
      .nodes
      .iter()
      .zip(positions)
      .map(|(node, position)| (node.id, position))
      .collect()
  }
}

/// Pairwise repulsion for every node, `k² / d` away from each other node.
fn repulsion(positions: &[DVec3], k_sq: f64) -> Vec<DVec3> {
  positions
    .par_iter()
    .enumerate()
    .map(|(i, &p)| {
      let mut force = DVec3::ZERO;
      for (j, &q) in positions.iter().enumerate() {
        if i == j {
          continue;
        }
        let delta = p - q;
        let dist = delta.length();
        let direction = if dist < MIN_DISTANCE {
          separation_direction(i, j)
        } else {
          delta / dist
        };
        force += direction * (k_sq / dist.max(MIN_DISTANCE));
      }
      force
    })
    .collect()
}

/// Stored position, or the origin when it is not finite.
///
/// One NaN coordinate would otherwise leak into every node through repulsion.
fn start_position(stored: DVec3) -> DVec3 {
  if stored.is_finite() {
    stored
  } else {
    DVec3::ZERO
  }
}

/// Deterministic push direction for coincident nodes `i` and `j`.
///
/// Antisymmetric, so the pair pushes apart instead of drifting together.
fn separation_direction(i: usize, j: usize) -> DVec3 {
  let (lo, hi, sign) = if i < j { (i, j, 1.0) } else { (j, i, -1.0) };
  fibonacci_sphere((lo * 31 + hi) % 64, 64) * sign
}

fn jitter(rng: &mut StdRng, amplitude: f64) -> DVec3 {
  if amplitude <= 0.0 {
    return DVec3::ZERO;
  }
  DVec3::new(
    rng.random_range(-amplitude..amplitude),
    rng.random_range(-amplitude..amplitude),
    rng.random_range(-amplitude..amplitude),
  )
}

#[inline]
fn clamp_length(v: DVec3, max: f64) -> DVec3 {
  let len = v.length();
  if len > max && len > 0.0 {
    v * (max / len)
  } else {
    v
  }
}

#[cfg(test)]
#[path = "force_test.rs"]
mod force_test;
