//! TreeBuilder - buckets raw world-space points into a `SpatialTree`.
//!
//! # Ordering
//!
//! Points are sorted by (Level-1 origin, Level-2 origin, leaf origin, voxel),
//! each compared lexicographically on (x, y, z). The sort is stable, so points
//! sharing a voxel keep their input order. One sweep over the sorted points
//! then opens a new node whenever an origin changes, which yields pre-ordered
//! arrays with contiguous child ranges.

use glam::{DVec3, IVec3, Vec3};

use super::{IndexTransform, InternalNode, LeafNode, NodeLevel, SpatialTree, TreeLayout};
use crate::constants::{DEFAULT_PACKED_COLOR, DEFAULT_POINTS_PER_VOXEL};
use crate::error::{PointCloudError, Result};

/// Configuration for tree construction.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildConfig {
  /// World size of one voxel. Derived from point density when `None`.
  pub voxel_size: Option<f64>,
  /// Target points per voxel when deriving the voxel size.
  pub points_per_voxel: u32,
  /// Branching factors per level.
  pub layout: TreeLayout,
}

impl Default for BuildConfig {
  fn default() -> Self {
    Self {
      voxel_size: None,
      points_per_voxel: DEFAULT_POINTS_PER_VOXEL,
      layout: TreeLayout::default(),
    }
  }
}

impl BuildConfig {
  pub fn with_voxel_size(mut self, voxel_size: f64) -> Self {
    self.voxel_size = Some(voxel_size);
    self
  }

  pub fn with_layout(mut self, layout: TreeLayout) -> Self {
    self.layout = layout;
    self
  }
}

/// Derive a voxel size that puts roughly `points_per_voxel` points in each
/// occupied voxel of the positions' bounding box.
///
/// Flat inputs use only their non-zero extents (area or length instead of
/// volume). A single repeated position yields 1.0.
pub fn compute_voxel_size(positions: &[Vec3], points_per_voxel: u32) -> f64 {
  if positions.is_empty() {
    return 1.0;
  }

  let (min, max) = positions.iter().fold(
    (DVec3::splat(f64::INFINITY), DVec3::splat(f64::NEG_INFINITY)),
    |(min, max), p| (min.min(p.as_dvec3()), max.max(p.as_dvec3())),
  );
  let extent = max - min;

  let voxel_count = (positions.len() as f64 / points_per_voxel.max(1) as f64).max(1.0);
  let (measure, dims) = extent
    .to_array()
    .iter()
    .filter(|e| **e > 0.0)
    .fold((1.0, 0), |(m, d), e| (m * e, d + 1));

  if dims == 0 {
    return 1.0;
  }
  let size = (measure / voxel_count).powf(1.0 / dims as f64);
  if size.is_finite() && size > 0.0 {
    size
  } else {
    1.0
  }
}

/// Builds immutable trees from raw points.
#[derive(Clone, Debug, Default)]
pub struct TreeBuilder {
  config: BuildConfig,
}

impl TreeBuilder {
  pub fn new(config: BuildConfig) -> Self {
    Self { config }
  }

  pub fn config(&self) -> &BuildConfig {
    &self.config
  }

  /// Bucket `positions` (world space) and their optional packed colors into
  /// a tree. Points without colors are white.
  #[tracing::instrument(level = "debug", skip_all, fields(points = positions.len()))]
  pub fn build(&self, positions: &[Vec3], colors: Option<&[u32]>) -> Result<SpatialTree> {
    if positions.is_empty() {
      return Err(PointCloudError::EmptyPointSet);
    }
    if let Some(colors) = colors {
      if colors.len() != positions.len() {
        return Err(PointCloudError::ColorCountMismatch {
          positions: positions.len(),
          colors: colors.len(),
        });
      }
    }
    if let Some(index) = positions.iter().position(|p| !p.is_finite()) {
      return Err(PointCloudError::NonFiniteCoordinate { index });
    }

    let layout = self.config.layout;
    if !layout.is_valid() {
      return Err(PointCloudError::InvalidLayout(layout));
    }

    let voxel_size = self
      .config
      .voxel_size
      .unwrap_or_else(|| compute_voxel_size(positions, self.config.points_per_voxel));
    if !(voxel_size.is_finite() && voxel_size > 0.0) {
      return Err(PointCloudError::InvalidVoxelSize(voxel_size));
    }
    let transform = IndexTransform::linear(voxel_size);

    // Quantize to voxels. Keep one outer node span of headroom so origins
    // and extents stay representable.
    let limit = (i32::MAX - layout.span(NodeLevel::Level1)) as f64;
    let mut voxels = Vec::with_capacity(positions.len());
    let mut local_positions = Vec::with_capacity(positions.len());
    for (index, p) in positions.iter().enumerate() {
      let index_pos = transform.world_to_index(p.as_dvec3());
      let voxel = index_pos.round();
      if voxel.abs().max_element() > limit {
        return Err(PointCloudError::CoordinateOverflow { index });
      }
      voxels.push(voxel.as_ivec3());
      local_positions.push((index_pos - voxel).as_vec3());
    }

    let sort_key = |v: IVec3| {
      (
        layout.origin(NodeLevel::Level1, v).to_array(),
        layout.origin(NodeLevel::Level2, v).to_array(),
        layout.origin(NodeLevel::Leaf, v).to_array(),
        v.to_array(),
      )
    };
    let mut order: Vec<usize> = (0..positions.len()).collect();
    order.sort_by_key(|&i| sort_key(voxels[i]));

    let mut level1: Vec<InternalNode> = Vec::new();
    let mut level2: Vec<InternalNode> = Vec::new();
    let mut leaves: Vec<LeafNode> = Vec::new();
    let mut sorted_voxels = Vec::with_capacity(order.len());
    let mut sorted_locals = Vec::with_capacity(order.len());
    let mut sorted_colors = Vec::with_capacity(order.len());

    for (slot, &i) in order.iter().enumerate() {
      let voxel = voxels[i];
      let o1 = layout.origin(NodeLevel::Level1, voxel);
      let o2 = layout.origin(NodeLevel::Level2, voxel);
      let ol = layout.origin(NodeLevel::Leaf, voxel);

      let new_level1 = level1.last().map_or(true, |n| n.origin != o1);
      let new_level2 = new_level1 || level2.last().map_or(true, |n| n.origin != o2);
      let new_leaf = new_level2 || leaves.last().map_or(true, |n| n.origin != ol);

      if new_level1 {
        let at = level2.len();
        level1.push(InternalNode {
          origin: o1,
          children: at..at,
        });
      }
      if new_level2 {
        let at = leaves.len();
        level2.push(InternalNode {
          origin: o2,
          children: at..at,
        });
        if let Some(parent) = level1.last_mut() {
          parent.children.end += 1;
        }
      }
      if new_leaf {
        leaves.push(LeafNode {
          origin: ol,
          points: slot..slot,
        });
        if let Some(parent) = level2.last_mut() {
          parent.children.end += 1;
        }
      }
      if let Some(leaf) = leaves.last_mut() {
        leaf.points.end += 1;
      }

      sorted_voxels.push(voxel);
      sorted_locals.push(local_positions[i]);
      sorted_colors.push(colors.map_or(DEFAULT_PACKED_COLOR, |c| c[i]));
    }

    tracing::debug!(
      voxel_size,
      level1 = level1.len(),
      level2 = level2.len(),
      leaves = leaves.len(),
      "built point tree"
    );

    Ok(SpatialTree::from_parts(
      layout,
      transform,
      level1,
      level2,
      leaves,
      sorted_voxels,
      sorted_locals,
      sorted_colors,
    ))
  }
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod builder_test;
