//! SpatialTree - immutable three-level arena with leaf-contiguous points.

use std::ops::Range;

use glam::{DVec3, IVec3, Vec3};

use super::{DAabb3, IndexTransform, InternalNode, LeafNode, NodeLevel, NodeRef, TreeLayout};
use crate::geometry::NodeGeometry;
use crate::types::Point;

/// Node counts per level, used to size mask and offset buffers.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeShape {
  pub level1: u32,
  pub level2: u32,
  pub leaves: u32,
}

impl TreeShape {
  /// Count at `level`.
  pub fn count(&self, level: NodeLevel) -> usize {
    match level {
      NodeLevel::Level1 => self.level1 as usize,
      NodeLevel::Level2 => self.level2 as usize,
      NodeLevel::Leaf => self.leaves as usize,
    }
  }

  /// Level-1 + Level-2 + leaf count.
  pub fn total(&self) -> usize {
    self.level1 as usize + self.level2 as usize + self.leaves as usize
  }
}

/// Sparse three-level point tree.
///
/// Immutable once built: all passes take `&SpatialTree` and may run
/// concurrently. Nodes at each level are stored in pre-order, so a node's
/// array index is also its mask and offset slot.
#[derive(Clone, Debug)]
pub struct SpatialTree {
  layout: TreeLayout,
  transform: IndexTransform,
  level1: Vec<InternalNode>,
  level2: Vec<InternalNode>,
  leaves: Vec<LeafNode>,
  /// Voxel coordinate of each point.
  voxels: Vec<IVec3>,
  /// Position of each point relative to its voxel center, in [-0.5, 0.5].
  local_positions: Vec<Vec3>,
  /// Packed `0xRRGGBB` color of each point.
  colors: Vec<u32>,
}

impl SpatialTree {
  /// Assemble a tree from pre-ordered node arrays.
  ///
  /// Callers uphold the arena invariants: child ranges tile the next level
  /// in order with no gaps, and no range is empty.
  #[allow(clippy::too_many_arguments)]
  pub(crate) fn from_parts(
    layout: TreeLayout,
    transform: IndexTransform,
    level1: Vec<InternalNode>,
    level2: Vec<InternalNode>,
    leaves: Vec<LeafNode>,
    voxels: Vec<IVec3>,
    local_positions: Vec<Vec3>,
    colors: Vec<u32>,
  ) -> Self {
    let tree = Self {
      layout,
      transform,
      level1,
      level2,
      leaves,
      voxels,
      local_positions,
      colors,
    };
    debug_assert!(tree.ranges_tile(), "child ranges must tile each level");
    tree
  }

  fn ranges_tile(&self) -> bool {
    fn tiles(ranges: impl Iterator<Item = Range<usize>>, len: usize) -> bool {
      let mut end = 0;
      for r in ranges {
        if r.start != end || r.is_empty() {
          return false;
        }
        end = r.end;
      }
      end == len
    }
    tiles(self.level1.iter().map(|n| n.children.clone()), self.level2.len())
      && tiles(self.level2.iter().map(|n| n.children.clone()), self.leaves.len())
      && tiles(self.leaves.iter().map(|n| n.points.clone()), self.voxels.len())
      && self.voxels.len() == self.local_positions.len()
      && self.voxels.len() == self.colors.len()
  }

  pub fn layout(&self) -> &TreeLayout {
    &self.layout
  }

  pub fn transform(&self) -> &IndexTransform {
    &self.transform
  }

  pub fn level1(&self) -> &[InternalNode] {
    &self.level1
  }

  pub fn level2(&self) -> &[InternalNode] {
    &self.level2
  }

  pub fn leaves(&self) -> &[LeafNode] {
    &self.leaves
  }

  /// Total number of points.
  #[inline]
  pub fn point_count(&self) -> usize {
    self.voxels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.voxels.is_empty()
  }

  pub fn shape(&self) -> TreeShape {
    TreeShape {
      level1: self.level1.len() as u32,
      level2: self.level2.len() as u32,
      leaves: self.leaves.len() as u32,
    }
  }

  /// Number of nodes at `level`.
  pub fn node_count(&self, level: NodeLevel) -> usize {
    match level {
      NodeLevel::Level1 => self.level1.len(),
      NodeLevel::Level2 => self.level2.len(),
      NodeLevel::Leaf => self.leaves.len(),
    }
  }

  /// Children of an internal node, or points of a leaf, as an index range.
  #[inline]
  pub fn children(&self, node: NodeRef) -> Range<usize> {
    match node.level {
      NodeLevel::Level1 => self.level1[node.index].children.clone(),
      NodeLevel::Level2 => self.level2[node.index].children.clone(),
      NodeLevel::Leaf => self.leaves[node.index].points.clone(),
    }
  }

  /// Live children of an internal node, or points of a leaf.
  #[inline]
  pub fn child_count(&self, node: NodeRef) -> usize {
    self.children(node).len()
  }

  pub fn origin(&self, node: NodeRef) -> IVec3 {
    match node.level {
      NodeLevel::Level1 => self.level1[node.index].origin,
      NodeLevel::Level2 => self.level2[node.index].origin,
      NodeLevel::Leaf => self.leaves[node.index].origin,
    }
  }

  /// Structural extent of a node in index space.
  pub fn index_bounds(&self, node: NodeRef) -> DAabb3 {
    DAabb3::from_voxel_span(self.origin(node), self.layout.span(node.level))
  }

  /// The 8 index-space corners of a node's extent.
  pub fn bounding_box_corners(&self, node: NodeRef) -> [DVec3; 8] {
    self.index_bounds(node).corners()
  }

  /// World-space corners, center and diagonal of a node.
  pub fn node_geometry(&self, node: NodeRef) -> NodeGeometry {
    NodeGeometry::from_index_bounds(&self.index_bounds(node), &self.transform)
  }

  #[inline]
  pub fn index_to_world(&self, index: DVec3) -> DVec3 {
    self.transform.index_to_world(index)
  }

  /// Index-space positions of the points in leaf `leaf`.
  pub fn leaf_positions(&self, leaf: usize) -> impl ExactSizeIterator<Item = DVec3> + '_ {
    let range = self.leaves[leaf].points.clone();
    self.voxels[range.clone()]
      .iter()
      .zip(&self.local_positions[range])
      .map(|(voxel, local)| voxel.as_dvec3() + local.as_dvec3())
  }

  /// Packed colors of the points in leaf `leaf`.
  pub fn leaf_colors(&self, leaf: usize) -> &[u32] {
    &self.colors[self.leaves[leaf].points.clone()]
  }

  /// World position of point `index` (tree-wide numbering).
  #[inline]
  pub fn world_position(&self, index: usize) -> Vec3 {
    let index_pos = self.voxels[index].as_dvec3() + self.local_positions[index].as_dvec3();
    self.transform.index_to_world(index_pos).as_vec3()
  }

  /// Renderer point for point `index` (tree-wide numbering).
  #[inline]
  pub fn point(&self, index: usize) -> Point {
    Point::from_packed(self.world_position(index), self.colors[index])
  }
}

#[cfg(test)]
#[path = "arena_test.rs"]
mod arena_test;
