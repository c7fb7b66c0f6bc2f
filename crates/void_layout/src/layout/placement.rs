//! Placement of newly discovered nodes next to the page that linked them.

use std::f64::consts::{FRAC_PI_4, TAU};

use glam::DVec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Ranges for [`spawn_near`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementParams {
  /// Minimum distance from the source (inclusive).
  pub min_distance: f64,
  /// Maximum distance from the source (exclusive).
  pub max_distance: f64,
  /// Maximum elevation above or below the source's horizontal plane, radians.
  pub max_elevation: f64,
}

impl PlacementParams {
  pub const DEFAULT: Self = Self {
    min_distance: 8.0,
    max_distance: 20.0,
    max_elevation: FRAC_PI_4,
  };
}

impl Default for PlacementParams {
  fn default() -> Self {
    Self::DEFAULT
  }
}

/// Random stored position for a node discovered from `source`.
///
/// Distance, azimuth and elevation are drawn independently, so new pages
/// fan out around their parent instead of stacking on it.
pub fn spawn_near<R: Rng + ?Sized>(source: DVec3, params: &PlacementParams, rng: &mut R) -> DVec3 {
  let distance = if params.max_distance > params.min_distance {
    rng.random_range(params.min_distance..params.max_distance)
  } else {
    params.min_distance
  };
  let theta = rng.random_range(0.0..TAU);
  let elevation = params.max_elevation.abs();
  let phi = rng.random_range(-elevation..=elevation);

  source
    + DVec3::new(
      distance * theta.cos() * phi.cos(),
      distance * phi.sin(),
      distance * theta.sin() * phi.cos(),
    )
}
