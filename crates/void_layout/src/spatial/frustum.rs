//! View frustum as six inward-facing planes.

use glam::{DMat4, DVec3, DVec4};

use super::Aabb;

/// Plane `normal · p + d = 0`; points with a non-negative value are inside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
  pub normal: DVec3,
  pub d: f64,
}

impl Plane {
  /// Plane that accepts every point.
  pub const ALWAYS: Self = Self {
    normal: DVec3::ZERO,
    d: 1.0,
  };

  /// Normalized plane from `(a, b, c, d)` coefficients.
  ///
  /// Degenerate coefficients (e.g. the far plane of an infinite projection)
  /// give [`Plane::ALWAYS`].
  pub fn from_coefficients(v: DVec4) -> Self {
    let normal = v.truncate();
    let len = normal.length();
    if len < 1e-12 || !len.is_finite() {
      return Self::ALWAYS;
    }
    Self {
      normal: normal / len,
      d: v.w / len,
    }
  }

  #[inline]
  pub fn signed_distance(&self, point: DVec3) -> f64 {
    self.normal.dot(point) + self.d
  }
}

/// Convex volume bounded by six planes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
  pub planes: [Plane; 6],
}

impl Frustum {
  /// Extract planes from a view-projection matrix.
  ///
  /// Expects `[0, 1]` clip depth, as produced by `DMat4::perspective_rh` and
  /// `DMat4::orthographic_rh`.
  pub fn from_view_projection(m: DMat4) -> Self {
    let (r0, r1, r2, r3) = (m.row(0), m.row(1), m.row(2), m.row(3));
    Self {
      planes: [
        Plane::from_coefficients(r3 + r0), // left
        Plane::from_coefficients(r3 - r0), // right
        Plane::from_coefficients(r3 + r1), // bottom
        Plane::from_coefficients(r3 - r1), // top
        Plane::from_coefficients(r2),      // near
        Plane::from_coefficients(r3 - r2), // far
      ],
    }
  }

  /// Box-shaped frustum matching `bounds` exactly.
  pub fn from_aabb(bounds: &Aabb) -> Self {
    let face = |normal: DVec3, d: f64| Plane { normal, d };
    Self {
      planes: [
        face(DVec3::X, -bounds.min.x),
        face(DVec3::NEG_X, bounds.max.x),
        face(DVec3::Y, -bounds.min.y),
        face(DVec3::NEG_Y, bounds.max.y),
        face(DVec3::Z, -bounds.min.z),
        face(DVec3::NEG_Z, bounds.max.z),
      ],
    }
  }

  /// True when `point` is inside or on every plane.
  #[inline]
  pub fn contains_point(&self, point: DVec3) -> bool {
    self.planes.iter().all(|p| p.signed_distance(point) >= 0.0)
  }

  /// Conservative box test: false only when the box is fully outside a plane.
  #[inline]
  pub fn intersects_aabb(&self, bounds: &Aabb) -> bool {
    self.planes.iter().all(|plane| {
      // Corner furthest along the plane normal.
      let positive = DVec3::select(plane.normal.cmpge(DVec3::ZERO), bounds.max, bounds.min);
      plane.signed_distance(positive) >= 0.0
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn looking_down_neg_z() -> Frustum {
    let proj = DMat4::perspective_rh(60f64.to_radians(), 1.0, 0.1, 100.0);
    let view = DMat4::look_at_rh(DVec3::ZERO, DVec3::NEG_Z, DVec3::Y);
    Frustum::from_view_projection(proj * view)
  }

  #[test]
  fn test_perspective_contains_points_in_front() {
    let frustum = looking_down_neg_z();
    assert!(frustum.contains_point(DVec3::new(0.0, 0.0, -10.0)));
    assert!(frustum.contains_point(DVec3::new(2.0, -2.0, -10.0)));
  }

  #[test]
  fn test_perspective_rejects_behind_and_beyond() {
    let frustum = looking_down_neg_z();
    assert!(!frustum.contains_point(DVec3::new(0.0, 0.0, 10.0)));
    assert!(!frustum.contains_point(DVec3::new(0.0, 0.0, -150.0)));
    assert!(!frustum.contains_point(DVec3::new(50.0, 0.0, -10.0)));
    // closer than the near plane
    assert!(!frustum.contains_point(DVec3::new(0.0, 0.0, -0.01)));
  }

  #[test]
  fn test_infinite_far_plane_is_ignored() {
    let proj = DMat4::perspective_infinite_rh(60f64.to_radians(), 1.0, 0.1);
    let frustum = Frustum::from_view_projection(proj);
    assert!(frustum.contains_point(DVec3::new(0.0, 0.0, -1.0e6)));
  }

  #[test]
  fn test_from_aabb_is_inclusive() {
    let bounds = Aabb::new(DVec3::splat(-1.0), DVec3::splat(1.0));
    let frustum = Frustum::from_aabb(&bounds);
    assert!(frustum.contains_point(DVec3::splat(1.0)));
    assert!(frustum.contains_point(DVec3::ZERO));
    assert!(!frustum.contains_point(DVec3::new(1.01, 0.0, 0.0)));
  }

  #[test]
  fn test_intersects_aabb() {
    let frustum = looking_down_neg_z();
    let ahead = Aabb::new(DVec3::new(-1.0, -1.0, -21.0), DVec3::new(1.0, 1.0, -19.0));
    let behind = Aabb::new(DVec3::new(-1.0, -1.0, 19.0), DVec3::new(1.0, 1.0, 21.0));
    let straddling = Aabb::new(DVec3::splat(-5.0), DVec3::splat(5.0));
    assert!(frustum.intersects_aabb(&ahead));
    assert!(!frustum.intersects_aabb(&behind));
    assert!(frustum.intersects_aabb(&straddling));
  }
}
