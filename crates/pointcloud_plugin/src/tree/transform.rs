//! IndexTransform - maps continuous index space to world space.

use glam::{DAffine3, DVec3};

/// Affine index-to-world transform stored alongside a tree.
///
/// Voxel `v` has its center at `index_to_world(v)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IndexTransform {
  index_to_world: DAffine3,
  world_to_index: DAffine3,
}

impl IndexTransform {
  /// Uniform scale by `voxel_size`, no translation.
  pub fn linear(voxel_size: f64) -> Self {
    debug_assert!(voxel_size.is_finite() && voxel_size > 0.0);
    Self::from_affine(DAffine3::from_scale(DVec3::splat(voxel_size)))
  }

  /// Uniform scale by `voxel_size`, then translate index origin to `origin`.
  pub fn linear_with_origin(voxel_size: f64, origin: DVec3) -> Self {
    debug_assert!(voxel_size.is_finite() && voxel_size > 0.0);
    Self::from_affine(DAffine3::from_scale_rotation_translation(
      DVec3::splat(voxel_size),
      glam::DQuat::IDENTITY,
      origin,
    ))
  }

  /// Arbitrary invertible affine map.
  pub fn from_affine(index_to_world: DAffine3) -> Self {
    Self {
      index_to_world,
      world_to_index: index_to_world.inverse(),
    }
  }

  #[inline]
  pub fn index_to_world(&self, index: DVec3) -> DVec3 {
    self.index_to_world.transform_point3(index)
  }

  #[inline]
  pub fn world_to_index(&self, world: DVec3) -> DVec3 {
    self.world_to_index.transform_point3(world)
  }

  /// World length of one voxel edge along index x.
  pub fn voxel_size(&self) -> f64 {
    self.index_to_world.matrix3.x_axis.length()
  }
}

impl Default for IndexTransform {
  fn default() -> Self {
    Self::linear(1.0)
  }
}
