//! Geometric test kernel: frustum intersection and LOD accumulation tests.
//!
//! Pure functions over world-space box corners and camera matrices. No
//! allocation, no failure modes.
//!
//! # Frustum test
//!
//! ```text
//!   corners ──clip──► homogeneous ──÷w──► NDC
//!
//!   1. any corner with |x|,|y|,|z| < 1          → visible
//!   2. all corners beyond the same clip plane   → culled
//!   3. corners disagree in sign on x and on y   → visible (box surrounds
//!                                                 or straddles the frustum)
//!   4. otherwise                                → culled
//! ```

use glam::{Mat4, Vec3};

use crate::tree::{DAabb3, IndexTransform};

/// Camera transform split into its three factors.
///
/// Tree world space is the model's object space: clip = P * V * M.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraMatrices {
  pub model: Mat4,
  pub view: Mat4,
  pub projection: Mat4,
}

impl CameraMatrices {
  pub fn new(model: Mat4, view: Mat4, projection: Mat4) -> Self {
    Self {
      model,
      view,
      projection,
    }
  }

  /// Camera whose clip matrix is all zeros: frustum culling becomes a no-op.
  pub const DISABLED: Self = Self {
    model: Mat4::ZERO,
    view: Mat4::ZERO,
    projection: Mat4::ZERO,
  };

  /// Combined object-to-clip matrix.
  #[inline]
  pub fn clip(&self) -> Mat4 {
    self.projection * self.view * self.model
  }

  /// Combined object-to-view matrix used by the accumulation test.
  #[inline]
  pub fn model_view(&self) -> Mat4 {
    self.view * self.model
  }
}

/// World-space geometry of one node, derived once per visit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeGeometry {
  /// Box corners in the [`DAabb3::corners`] order.
  pub corners: [Vec3; 8],
  pub center: Vec3,
  /// Length of the box diagonal.
  pub size: f32,
}

impl NodeGeometry {
  /// Transform an index-space extent into world space.
  pub fn from_index_bounds(bounds: &DAabb3, transform: &IndexTransform) -> Self {
    let index_corners = bounds.corners();
    let corners = index_corners.map(|c| transform.index_to_world(c).as_vec3());
    let center = transform.index_to_world(bounds.center()).as_vec3();
    let size = transform
      .index_to_world(bounds.max)
      .distance(transform.index_to_world(bounds.min)) as f32;
    Self {
      corners,
      center,
      size,
    }
  }
}

/// Test whether a box, given by its 8 world-space corners, touches the view
/// frustum of `clip`.
///
/// An all-zero `clip` means no culling was requested and always passes.
pub fn frustum_intersects(corners: &[Vec3; 8], clip: &Mat4) -> bool {
  if *clip == Mat4::ZERO {
    return true;
  }

  let ndc = corners.map(|c| clip.project_point3(c));

  if ndc.iter().any(|c| c.abs().cmplt(Vec3::ONE).all()) {
    return true;
  }

  if beyond_single_plane(&ndc) {
    return false;
  }

  let mut x_agree = true;
  let mut y_agree = true;
  for pair in ndc.windows(2) {
    if !(pair[1].x * pair[0].x > 0.0) {
      x_agree = false;
    }
    if !(pair[1].y * pair[0].y > 0.0) {
      y_agree = false;
    }
    if !x_agree && !y_agree {
      return true;
    }
  }

  !(x_agree && y_agree)
}

/// True when every corner lies past the same one of the six clip planes.
fn beyond_single_plane(ndc: &[Vec3; 8]) -> bool {
  (0..3).any(|axis| {
    ndc.iter().all(|c| c[axis] > 1.0) || ndc.iter().all(|c| c[axis] < -1.0)
  })
}

/// Test whether a node is small enough on screen to collapse into one point.
///
/// Projects `center` into view space and compares `size / -z` against
/// `threshold`. Nodes at or behind the eye plane never collapse.
pub fn test_accumulation(center: Vec3, size: f32, view: &Mat4, threshold: f32) -> bool {
  let view_pos = view.project_point3(center);
  let distance = -view_pos.z;
  if !(distance > 0.0) {
    return false;
  }
  size / distance < threshold
}

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;
