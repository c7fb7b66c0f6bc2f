//! Distance-based level-of-detail selection.
//!
//! A [`LodTable`] is an ascending list of distance thresholds ending in an
//! unbounded catch-all. Selection returns the first level whose threshold is
//! at or beyond the camera distance, so the tier index never decreases as the
//! distance grows.
//!
//! ```text
//! distance:  0 ──── 60 ──── 180 ──── 450 ──────────── ∞
//! tier:        0       1        2           3
//!            full    labels   points     dots only
//! ```

use serde::{Deserialize, Serialize};

use crate::error::LodTableError;

/// Per-node render features toggled by LOD.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodFeatures {
  /// Title/URL label.
  pub labels: bool,
  /// Screenshot or favicon preview.
  pub preview: bool,
  /// Bloom/glow halo.
  pub glow: bool,
  /// Outgoing edges.
  pub connections: bool,
}

impl LodFeatures {
  pub const ALL: Self = Self {
    labels: true,
    preview: true,
    glow: true,
    connections: true,
  };

  pub const NONE: Self = Self {
    labels: false,
    preview: false,
    glow: false,
    connections: false,
  };
}

/// Geometry tessellation tier, finest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryDetail {
  High,
  Medium,
  Low,
  Minimal,
}

impl GeometryDetail {
  /// Sphere segment count for this tier.
  #[inline]
  pub fn segments(self) -> u32 {
    match self {
      Self::High => 32,
      Self::Medium => 16,
      Self::Low => 8,
      Self::Minimal => 4,
    }
  }
}

/// One row of the LOD table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LodLevel {
  /// Largest camera distance served by this level. `f64::INFINITY` for the
  /// catch-all.
  pub max_distance: f64,
  pub features: LodFeatures,
  pub geometry: GeometryDetail,
}

/// Result of a LOD lookup.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodSelection {
  /// Index into the table; larger means coarser.
  pub tier: usize,
  pub features: LodFeatures,
  pub geometry: GeometryDetail,
}

/// Validated LOD table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LodLevel>", into = "Vec<LodLevel>")]
pub struct LodTable {
  levels: Vec<LodLevel>,
}

impl LodTable {
  /// Validate `levels`: non-empty, ascending, ending in an unbounded level.
  pub fn new(levels: Vec<LodLevel>) -> Result<Self, LodTableError> {
    let last = levels.last().ok_or(LodTableError::Empty)?;
    for index in 1..levels.len() {
      if !(levels[index].max_distance >= levels[index - 1].max_distance) {
        return Err(LodTableError::Unsorted { index });
      }
    }
    if last.max_distance != f64::INFINITY {
      return Err(LodTableError::MissingCatchAll);
    }
    Ok(Self { levels })
  }

  pub fn levels(&self) -> &[LodLevel] {
    &self.levels
  }

  /// Tier index for a camera distance.
  ///
  /// NaN distances map to the coarsest tier.
  #[inline]
  pub fn tier(&self, distance: f64) -> usize {
    let last = self.levels.len() - 1;
    if distance.is_nan() {
      return last;
    }
    self
      .levels
      .partition_point(|level| level.max_distance < distance)
      .min(last)
  }

  /// Level for a camera distance.
  #[inline]
  pub fn select(&self, distance: f64) -> LodSelection {
    let tier = self.tier(distance);
    let level = &self.levels[tier];
    LodSelection {
      tier,
      features: level.features,
      geometry: level.geometry,
    }
  }

  /// Coarsest level, used when no distance is available.
  pub fn lowest(&self) -> LodSelection {
    self.select(f64::INFINITY)
  }
}

impl Default for LodTable {
  fn default() -> Self {
    Self {
      levels: vec![
        LodLevel {
          max_distance: 60.0,
          features: LodFeatures::ALL,
          geometry: GeometryDetail::High,
        },
        LodLevel {
          max_distance: 180.0,
          features: LodFeatures {
            labels: true,
            preview: false,
            glow: true,
            connections: true,
          },
          geometry: GeometryDetail::Medium,
        },
        LodLevel {
          max_distance: 450.0,
          features: LodFeatures {
            connections: true,
            ..LodFeatures::NONE
          },
          geometry: GeometryDetail::Low,
        },
        LodLevel {
          max_distance: f64::INFINITY,
          features: LodFeatures::NONE,
          geometry: GeometryDetail::Minimal,
        },
      ],
    }
  }
}

impl TryFrom<Vec<LodLevel>> for LodTable {
  type Error = LodTableError;

  fn try_from(levels: Vec<LodLevel>) -> Result<Self, Self::Error> {
    Self::new(levels)
  }
}

impl From<LodTable> for Vec<LodLevel> {
  fn from(table: LodTable) -> Self {
    table.levels
  }
}

#[cfg(test)]
#[path = "lod_test.rs"]
mod lod_test;
