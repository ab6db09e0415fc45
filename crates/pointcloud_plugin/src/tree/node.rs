//! Node records stored in the tree arena.

use std::ops::Range;

use glam::IVec3;

use crate::constants::TREE_DEPTH;

/// Depth of a masked node below the root.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum NodeLevel {
  /// Children of the root; own Level-2 nodes.
  Level1,
  /// Own leaves.
  Level2,
  /// Own points.
  Leaf,
}

impl NodeLevel {
  /// All levels, outer to inner.
  pub const ALL: [Self; TREE_DEPTH] = [Self::Level1, Self::Level2, Self::Leaf];

  /// Position of this level in per-level tables (0 = Level-1).
  #[inline]
  pub fn index(self) -> usize {
    match self {
      Self::Level1 => 0,
      Self::Level2 => 1,
      Self::Leaf => 2,
    }
  }

  /// The level holding this level's children. None for leaves.
  #[inline]
  pub fn child(self) -> Option<Self> {
    match self {
      Self::Level1 => Some(Self::Level2),
      Self::Level2 => Some(Self::Leaf),
      Self::Leaf => None,
    }
  }
}

/// Handle to a node: its level and its pre-order index at that level.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeRef {
  pub level: NodeLevel,
  pub index: usize,
}

impl NodeRef {
  pub fn new(level: NodeLevel, index: usize) -> Self {
    Self { level, index }
  }

  pub fn level1(index: usize) -> Self {
    Self::new(NodeLevel::Level1, index)
  }

  pub fn level2(index: usize) -> Self {
    Self::new(NodeLevel::Level2, index)
  }

  pub fn leaf(index: usize) -> Self {
    Self::new(NodeLevel::Leaf, index)
  }
}

/// Level-1 or Level-2 node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InternalNode {
  /// Minimum voxel coordinate covered by this node.
  pub origin: IVec3,
  /// Children in the next level's array. Never empty.
  pub children: Range<usize>,
}

/// Leaf node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeafNode {
  /// Minimum voxel coordinate covered by this leaf.
  pub origin: IVec3,
  /// Points in the tree-wide point arrays. Never empty.
  pub points: Range<usize>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_level_order() {
    assert_eq!(NodeLevel::ALL.len(), TREE_DEPTH);
    assert_eq!(NodeLevel::ALL.map(NodeLevel::index), [0, 1, 2]);
    assert_eq!(NodeLevel::Level1.child(), Some(NodeLevel::Level2));
    assert_eq!(NodeLevel::Level2.child(), Some(NodeLevel::Leaf));
    assert_eq!(NodeLevel::Leaf.child(), None);
  }

  #[test]
  fn test_node_ref_constructors() {
    assert_eq!(NodeRef::level2(4), NodeRef::new(NodeLevel::Level2, 4));
    assert_ne!(NodeRef::leaf(4), NodeRef::level1(4));
  }
}
