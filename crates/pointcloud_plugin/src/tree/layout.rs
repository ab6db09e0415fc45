//! TreeLayout - branching factors and origin math for the three levels.

use glam::IVec3;

use super::NodeLevel;
use crate::constants::{LEAF_LOG2DIM, LEVEL1_LOG2DIM, LEVEL2_LOG2DIM};

/// Per-level branching factors, as log2 of the slots per axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeLayout {
  /// Level-2 slots per axis of a Level-1 node (log2).
  pub level1_log2dim: u32,
  /// Leaf slots per axis of a Level-2 node (log2).
  pub level2_log2dim: u32,
  /// Voxels per axis of a leaf (log2).
  pub leaf_log2dim: u32,
}

impl TreeLayout {
  /// Largest total log2 span that keeps node origins inside i32.
  pub const MAX_TOTAL_LOG2DIM: u32 = 30;

  /// Edge length in voxels of a node at `level`.
  #[inline]
  pub fn span(&self, level: NodeLevel) -> i32 {
    1 << self.total_log2dim(level)
  }

  /// log2 of the voxel span of a node at `level`. Saturates on overflow.
  #[inline]
  pub fn total_log2dim(&self, level: NodeLevel) -> u32 {
    match level {
      NodeLevel::Leaf => self.leaf_log2dim,
      NodeLevel::Level2 => self.leaf_log2dim.saturating_add(self.level2_log2dim),
      NodeLevel::Level1 => self
        .leaf_log2dim
        .saturating_add(self.level2_log2dim)
        .saturating_add(self.level1_log2dim),
    }
  }

  /// Origin of the node at `level` that contains `voxel`.
  ///
  /// Spans are powers of two, so masking the low bits floors toward negative
  /// infinity for negative coordinates too.
  #[inline]
  pub fn origin(&self, level: NodeLevel, voxel: IVec3) -> IVec3 {
    voxel & IVec3::splat(!(self.span(level) - 1))
  }

  /// Check that every level branches and the outermost span fits in i32.
  pub fn is_valid(&self) -> bool {
    self.level1_log2dim > 0
      && self.level2_log2dim > 0
      && self.leaf_log2dim > 0
      && self.total_log2dim(NodeLevel::Level1) <= Self::MAX_TOTAL_LOG2DIM
  }
}

impl Default for TreeLayout {
  fn default() -> Self {
    Self {
      level1_log2dim: LEVEL1_LOG2DIM,
      level2_log2dim: LEVEL2_LOG2DIM,
      leaf_log2dim: LEAF_LOG2DIM,
    }
  }
}

#[cfg(test)]
#[path = "layout_test.rs"]
mod layout_test;
