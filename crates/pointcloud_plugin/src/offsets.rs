//! Cumulative offset tables (CSR prefix sums) per level.
//!
//! Entry `i` of a table is the running total of children (or points) of
//! nodes `0..=i` at that level, so node `i` owns the half-open range
//! `[table[i - 1], table[i])` of the next level, with `table[-1] = 0`.
//!
//! ```text
//! children:  2   1   3
//! offsets:   2   3   6
//! ranges:  [0,2)[2,3)[3,6)
//! ```
//!
//! Offsets depend only on topology. Compute once per loaded tree.

use std::ops::Range;

use crate::error::{PointCloudError, Result};
use crate::tree::{NodeLevel, NodeRef, SpatialTree};

/// Owned offset tables.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeOffsets {
  /// Cumulative Level-2 child counts of Level-1 nodes.
  pub level1: Vec<u32>,
  /// Cumulative leaf child counts of Level-2 nodes.
  pub level2: Vec<u32>,
  /// Cumulative point counts of leaves.
  pub leaves: Vec<u32>,
}

impl TreeOffsets {
  pub fn level(&self, level: NodeLevel) -> &[u32] {
    match level {
      NodeLevel::Level1 => &self.level1,
      NodeLevel::Level2 => &self.level2,
      NodeLevel::Leaf => &self.leaves,
    }
  }

  /// Slice of the next level (or of the points) owned by `node`.
  pub fn range(&self, node: NodeRef) -> Range<usize> {
    let table = self.level(node.level);
    let start = match node.index {
      0 => 0,
      i => table[i - 1] as usize,
    };
    start..table[node.index] as usize
  }

  /// Final entry of `level`'s table: the node count of the next level, or
  /// the point count for leaves.
  pub fn total(&self, level: NodeLevel) -> usize {
    self.level(level).last().map_or(0, |v| *v as usize)
  }
}

/// Compute all three offset tables.
pub fn compute_offsets(tree: &SpatialTree) -> TreeOffsets {
  let shape = tree.shape();
  let mut offsets = TreeOffsets {
    level1: vec![0; shape.level1 as usize],
    level2: vec![0; shape.level2 as usize],
    leaves: vec![0; shape.leaves as usize],
  };
  fill(tree, &mut offsets.level1, &mut offsets.level2, &mut offsets.leaves);
  offsets
}

/// Compute offsets into caller-provided buffers sized from
/// [`SpatialTree::shape`].
pub fn compute_offsets_into(
  tree: &SpatialTree,
  level1: &mut [u32],
  level2: &mut [u32],
  leaves: &mut [u32],
) -> Result<()> {
  let shape = tree.shape();
  PointCloudError::check_len("level-1 offsets", shape.level1 as usize, level1.len())?;
  PointCloudError::check_len("level-2 offsets", shape.level2 as usize, level2.len())?;
  PointCloudError::check_len("leaf offsets", shape.leaves as usize, leaves.len())?;
  fill(tree, level1, level2, leaves);
  Ok(())
}

fn fill(tree: &SpatialTree, level1: &mut [u32], level2: &mut [u32], leaves: &mut [u32]) {
  let _span = tracing::debug_span!("compute_offsets", nodes = tree.shape().total()).entered();

  let (mut total1, mut total2, mut total_points) = (0u32, 0u32, 0u32);
  for i1 in 0..tree.level1().len() {
    let node1 = NodeRef::level1(i1);
    total1 += tree.child_count(node1) as u32;
    level1[i1] = total1;

    for i2 in tree.children(node1) {
      let node2 = NodeRef::level2(i2);
      total2 += tree.child_count(node2) as u32;
      level2[i2] = total2;

      for leaf in tree.children(node2) {
        total_points += tree.child_count(NodeRef::leaf(leaf)) as u32;
        leaves[leaf] = total_points;
      }
    }
  }

  debug_assert_eq!(total1 as usize, tree.level2().len());
  debug_assert_eq!(total2 as usize, tree.leaves().len());
  debug_assert_eq!(total_points as usize, tree.point_count());
}
