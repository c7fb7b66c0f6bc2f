//! Axis-aligned bounding box in double precision.

use glam::DVec3;

/// Double-precision axis-aligned bounding box.
///
/// Bounds are inclusive on both corners, so a point on a face belongs to the
/// box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
	/// Minimum corner (inclusive).
	pub min: DVec3,
	/// Maximum corner (inclusive).
	pub max: DVec3,
}

impl Aabb {
	/// Create a new AABB from min and max corners.
	///
	/// # Panics
	/// Debug-asserts that min <= max on all axes.
	pub fn new(min: DVec3, max: DVec3) -> Self {
		debug_assert!(
			min.x <= max.x && min.y <= max.y && min.z <= max.z,
			"AABB min must be <= max on all axes"
		);
		Self { min, max }
	}

	/// Tightest box around `points`, or `None` when there are no finite points.
	pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Option<Self> {
		let mut bounds: Option<Self> = None;
		for p in points.into_iter().filter(|p| p.is_finite()) {
			bounds = Some(match bounds {
				Some(b) => Self {
					min: b.min.min(p),
					max: b.max.max(p),
				},
				None => Self { min: p, max: p },
			});
		}
		bounds
	}

	/// Grow every face outward by `margin`.
	#[inline]
	pub fn padded(&self, margin: f64) -> Self {
		Self {
			min: self.min - DVec3::splat(margin),
			max: self.max + DVec3::splat(margin),
		}
	}

	/// Check if this AABB contains a point.
	#[inline]
	pub fn contains_point(&self, point: DVec3) -> bool {
		point.x >= self.min.x
			&& point.x <= self.max.x
			&& point.y >= self.min.y
			&& point.y <= self.max.y
			&& point.z >= self.min.z
			&& point.z <= self.max.z
	}

	/// Check if the sphere at `center` with `radius` touches this box.
	#[inline]
	pub fn intersects_sphere(&self, center: DVec3, radius: f64) -> bool {
		let closest = center.clamp(self.min, self.max);
		closest.distance_squared(center) <= radius * radius
	}

	/// Get the center of the AABB.
	#[inline]
	pub fn center(&self) -> DVec3 {
		(self.min + self.max) * 0.5
	}

	/// Octant box `octant` of this box.
	///
	/// Bits select the upper half per axis: bit 0 = +X, bit 1 = +Y, bit 2 = +Z.
	#[inline]
	pub fn octant(&self, octant: u8) -> Self {
		let center = self.center();
		let pick = |bit: u8, lo: f64, mid: f64, hi: f64| {
			if octant & bit != 0 {
				(mid, hi)
			} else {
				(lo, mid)
			}
		};
		let (x0, x1) = pick(1, self.min.x, center.x, self.max.x);
		let (y0, y1) = pick(2, self.min.y, center.y, self.max.y);
		let (z0, z1) = pick(4, self.min.z, center.z, self.max.z);
		Self {
			min: DVec3::new(x0, y0, z0),
			max: DVec3::new(x1, y1, z1),
		}
	}

	/// Octant of this box that owns `point`.
	///
	/// Points on a splitting plane go to the upper half, so every point maps
	/// to exactly one octant.
	#[inline]
	pub fn octant_of(&self, point: DVec3) -> u8 {
		let center = self.center();
		(point.x >= center.x) as u8 | ((point.y >= center.y) as u8) << 1 | ((point.z >= center.z) as u8) << 2
	}
}
