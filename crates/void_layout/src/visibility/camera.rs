//! Camera state as handed over by the renderer each frame.

use glam::{DMat4, DVec3};

use crate::spatial::Frustum;

/// Projection plus camera-to-world transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
  /// Clip-space projection with `[0, 1]` depth.
  pub projection: DMat4,
  /// Camera-to-world transform.
  pub world: DMat4,
}

impl Camera {
  pub fn new(projection: DMat4, world: DMat4) -> Self {
    Self { projection, world }
  }

  /// Perspective camera at `eye` looking at `target`.
  pub fn look_at(eye: DVec3, target: DVec3, fov_y_radians: f64, aspect: f64, near: f64, far: f64) -> Self {
    let view = DMat4::look_at_rh(eye, target, DVec3::Y);
    Self {
      projection: DMat4::perspective_rh(fov_y_radians, aspect, near, far),
      world: view.inverse(),
    }
  }

  /// World-space camera position.
  #[inline]
  pub fn position(&self) -> DVec3 {
    self.world.w_axis.truncate()
  }

  #[inline]
  pub fn view(&self) -> DMat4 {
    self.world.inverse()
  }

  pub fn frustum(&self) -> Frustum {
    Frustum::from_view_projection(self.projection * self.view())
  }

  /// Distance from the camera to `point`.
  #[inline]
  pub fn distance_to(&self, point: DVec3) -> f64 {
    self.position().distance(point)
  }
}
