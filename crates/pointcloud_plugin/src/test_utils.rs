//! Shared fixtures for unit tests.

use glam::{Mat4, Vec3};

use crate::geometry::CameraMatrices;
use crate::tree::{BuildConfig, SpatialTree, TreeBuilder};

/// One leaf, two points: (0,0,0) red and (2,0,0) green, voxel size 1.
pub fn two_point_tree() -> SpatialTree {
  build(
    &[Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)],
    &[0xFF0000, 0x00FF00],
  )
}

/// Positions of [`multi_level_tree`], in builder output order.
pub const MULTI_LEVEL_POSITIONS: [[f32; 3]; 9] = [
  // Level-1 A, Level-2 A0
  [0.0, 0.0, 0.0],
  [1.0, 0.0, 0.0],
  [8.0, 0.0, 0.0],
  // Level-1 A, Level-2 A1
  [130.0, 0.0, 0.0],
  [131.0, 0.0, 0.0],
  [132.0, 1.0, 0.0],
  // Level-1 B, Level-2 B0
  [5000.0, 0.0, 0.0],
  [5001.0, 0.0, 0.0],
  [5000.0, 9.0, 0.0],
];

/// Two Level-1 nodes, three Level-2 nodes, five leaves, nine points.
///
/// ```text
/// A ─┬─ A0 ─┬─ leaf (0,0,0)    2 points
///    │      └─ leaf (8,0,0)    1 point
///    └─ A1 ─── leaf (128,0,0)  3 points
/// B ─── B0 ─┬─ leaf (5000,0,0) 2 points
///           └─ leaf (5000,8,0) 1 point
/// ```
pub fn multi_level_tree() -> SpatialTree {
  // Fed in reverse so the builder's ordering is exercised.
  let positions: Vec<Vec3> = MULTI_LEVEL_POSITIONS
    .iter()
    .rev()
    .map(|p| Vec3::from_array(*p))
    .collect();
  let colors: Vec<u32> = (0..positions.len() as u32).rev().map(|i| i * 0x10).collect();
  build(&positions, &colors)
}

/// Deterministic pseudo-random cloud inside `[0, extent)³`.
pub fn scattered_cloud(count: usize, extent: f32, seed: u32) -> (Vec<Vec3>, Vec<u32>) {
  let mut state = seed.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
  let mut next = move || {
    state ^= state << 13;
    state ^= state >> 17;
    state ^= state << 5;
    state
  };
  let positions = (0..count)
    .map(|_| {
      Vec3::new(
        (next() % 10_000) as f32 / 10_000.0 * extent,
        (next() % 10_000) as f32 / 10_000.0 * extent,
        (next() % 10_000) as f32 / 10_000.0 * extent,
      )
    })
    .collect();
  let colors = (0..count).map(|_| next() & 0x00FF_FFFF).collect();
  (positions, colors)
}

/// Tree over [`scattered_cloud`] with voxel size 1.
pub fn scattered_tree(count: usize, extent: f32, seed: u32) -> SpatialTree {
  let (positions, colors) = scattered_cloud(count, extent, seed);
  build(&positions, &colors)
}

/// Camera at `eye` looking at `target`, 90° vertical fov, square aspect.
pub fn look_at_camera(eye: Vec3, target: Vec3) -> CameraMatrices {
  CameraMatrices::new(
    Mat4::IDENTITY,
    Mat4::look_at_rh(eye, target, Vec3::Y),
    Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100_000.0),
  )
}

fn build(positions: &[Vec3], colors: &[u32]) -> SpatialTree {
  TreeBuilder::new(BuildConfig::default().with_voxel_size(1.0))
    .build(positions, Some(colors))
    .expect("fixture tree should build")
}
