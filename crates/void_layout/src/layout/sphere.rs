//! Golden-angle point distributions.

use glam::DVec3;

use crate::constants::GOLDEN_ANGLE;

/// Point `index` of `count` on the unit Fibonacci sphere.
///
/// Consecutive indices advance by the golden angle in azimuth while the
/// height steps evenly from +1 to −1, giving even angular spacing.
#[inline]
pub fn fibonacci_sphere(index: usize, count: usize) -> DVec3 {
  let count = count.max(1) as f64;
  let y = 1.0 - 2.0 * (index as f64 + 0.5) / count;
  let ring = (1.0 - y * y).max(0.0).sqrt();
  let theta = index as f64 * GOLDEN_ANGLE;
  DVec3::new(theta.cos() * ring, y, theta.sin() * ring)
}

/// Point `index` of `count` spread through a ball of the given radius.
///
/// Directions come from [`fibonacci_sphere`]; the radius grows with the cube
/// root of the index so the volume fills evenly.
#[inline]
pub fn golden_ball(index: usize, count: usize, radius: f64) -> DVec3 {
  let count = count.max(1);
  let r = radius * ((index as f64 + 1.0) / count as f64).cbrt();
  fibonacci_sphere(index, count) * r
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_fibonacci_points_are_unit() {
    for i in 0..50 {
      let p = fibonacci_sphere(i, 50);
      assert!((p.length() - 1.0).abs() < 1e-9);
    }
  }

  #[test]
  fn test_fibonacci_points_are_distinct() {
    let points: Vec<_> = (0..64).map(|i| fibonacci_sphere(i, 64)).collect();
    for (i, a) in points.iter().enumerate() {
      for b in &points[i + 1..] {
        assert!(a.distance(*b) > 1e-3);
      }
    }
  }

  #[test]
  fn test_golden_ball_within_radius() {
    for i in 0..30 {
      assert!(golden_ball(i, 30, 10.0).length() <= 10.0 + 1e-9);
    }
  }

  #[test]
  fn test_zero_count_does_not_divide_by_zero() {
    let p = fibonacci_sphere(0, 0);
    assert!(p.is_finite());
  }
}
