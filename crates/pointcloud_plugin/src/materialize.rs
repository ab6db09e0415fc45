//! Point materialization: renderer-ready point buffers from a tree.
//!
//! # Buffers
//!
//! - **Full**: every point, leaf by leaf, in tree order. Length
//!   `point_count()`.
//! - **Accumulated**: one averaged point per node, laid out as
//!   `[Level-1][Level-2][Leaf]`. Leaves average their points; internal nodes
//!   average their children's averages.
//! - **Visible**: the mix a mask selects. Rendered leaves contribute their
//!   points, accumulated nodes their average, culled subtrees nothing.
//!
//! Full and accumulated buffers are filled in parallel with rayon; each
//! output slot depends only on the immutable tree (and, for internal
//! averages, on the finished level below).

use std::ops::Range;

use glam::Vec3;
use rayon::prelude::*;

use crate::classify::{NodeMask, TreeMask};
use crate::error::{PointCloudError, Result};
use crate::tree::{NodeLevel, NodeRef, SpatialTree, TreeShape};
use crate::types::Point;

/// Where each level's averages live in an accumulated buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccumulatedLayout {
  shape: TreeShape,
}

impl AccumulatedLayout {
  pub fn new(shape: TreeShape) -> Self {
    Self { shape }
  }

  /// First slot of `level`.
  pub fn start(&self, level: NodeLevel) -> usize {
    match level {
      NodeLevel::Level1 => 0,
      NodeLevel::Level2 => self.shape.level1 as usize,
      NodeLevel::Leaf => self.shape.level1 as usize + self.shape.level2 as usize,
    }
  }

  /// Slots of `level`.
  pub fn range(&self, level: NodeLevel) -> Range<usize> {
    let start = self.start(level);
    start..start + self.shape.count(level)
  }

  /// Slot of `node`.
  #[inline]
  pub fn index(&self, node: NodeRef) -> usize {
    self.start(node.level) + node.index
  }

  /// Buffer length: one slot per node.
  pub fn len(&self) -> usize {
    self.shape.total()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Arithmetic mean of position and color, alpha held at 1.
///
/// Nothing to average yields [`Point::EMPTY`].
pub(crate) fn average_points(points: impl IntoIterator<Item = Point>) -> Point {
  let mut position = Vec3::ZERO;
  let mut color = Vec3::ZERO;
  let mut count = 0u32;
  for p in points {
    position += p.position();
    color += p.color().truncate();
    count += 1;
  }
  if count == 0 {
    return Point::EMPTY;
  }
  let n = count as f32;
  Point::new(position / n, (color / n).extend(1.0))
}

// =============================================================================
// Full points
// =============================================================================

/// Write every point into `out[..point_count()]`.
///
/// Returns the number of points written.
pub fn populate_full_points(tree: &SpatialTree, out: &mut [Point]) -> Result<usize> {
  let count = tree.point_count();
  PointCloudError::check_len("points", count, out.len())?;

  let _span = tracing::debug_span!("populate_full_points", points = count).entered();
  out[..count]
    .par_iter_mut()
    .enumerate()
    .for_each(|(i, slot)| *slot = tree.point(i));
  Ok(count)
}

/// Every point in tree order.
pub fn full_points(tree: &SpatialTree) -> Vec<Point> {
  (0..tree.point_count())
    .into_par_iter()
    .map(|i| tree.point(i))
    .collect()
}

// =============================================================================
// Accumulated points
// =============================================================================

/// Write one averaged point per node into `out`, laid out per
/// [`AccumulatedLayout`].
///
/// Returns the number of points written (the total node count).
pub fn populate_accumulated_points(tree: &SpatialTree, out: &mut [Point]) -> Result<usize> {
  let layout = AccumulatedLayout::new(tree.shape());
  PointCloudError::check_len("accumulated points", layout.len(), out.len())?;

  fill_accumulated(tree, &layout, &mut out[..layout.len()]);
  Ok(layout.len())
}

/// Owned accumulated buffer.
pub fn accumulated_points(tree: &SpatialTree) -> Vec<Point> {
  let layout = AccumulatedLayout::new(tree.shape());
  let mut out = vec![Point::EMPTY; layout.len()];
  fill_accumulated(tree, &layout, &mut out);
  out
}

/// Leaves first, then each internal level from the finished level below.
/// `out` is exactly `layout.len()` long.
fn fill_accumulated(tree: &SpatialTree, layout: &AccumulatedLayout, out: &mut [Point]) {
  let _span = tracing::debug_span!("populate_accumulated_points", nodes = layout.len()).entered();

  let (level1_out, rest) = out.split_at_mut(layout.start(NodeLevel::Level2));
  let (level2_out, leaf_out) = rest.split_at_mut(tree.level2().len());

  leaf_out.par_iter_mut().enumerate().for_each(|(leaf, slot)| {
    *slot = average_points(tree.children(NodeRef::leaf(leaf)).map(|i| tree.point(i)));
  });

  let leaf_out = &*leaf_out;
  level2_out.par_iter_mut().enumerate().for_each(|(i2, slot)| {
    *slot = average_points(tree.children(NodeRef::level2(i2)).map(|leaf| leaf_out[leaf]));
  });

  let level2_out = &*level2_out;
  level1_out.par_iter_mut().enumerate().for_each(|(i1, slot)| {
    *slot = average_points(tree.children(NodeRef::level1(i1)).map(|i2| level2_out[i2]));
  });
}

// =============================================================================
// Visible points
// =============================================================================

/// Write the points `mask` selects into `out`, in pre-order.
///
/// `accumulated` is the buffer from [`populate_accumulated_points`]. `out`
/// must hold `point_count()` points; at most that many are written since
/// every node has at least one point beneath it. Returns the number written.
pub fn populate_visible_points(
  tree: &SpatialTree,
  mask: &TreeMask,
  accumulated: &[Point],
  out: &mut [Point],
) -> Result<usize> {
  let layout = AccumulatedLayout::new(tree.shape());
  PointCloudError::check_len("accumulated points", layout.len(), accumulated.len())?;
  PointCloudError::check_len("points", tree.point_count(), out.len())?;

  let _span = tracing::debug_span!("populate_visible_points").entered();
  let mut written = 0;
  let mut emit = |p: Point| {
    out[written] = p;
    written += 1;
  };

  for i1 in 0..tree.level1().len() {
    let node1 = NodeRef::level1(i1);
    match mask.get(node1) {
      NodeMask::Cull => continue,
      NodeMask::Accumulate => {
        emit(accumulated[layout.index(node1)]);
        continue;
      }
      NodeMask::Render => {}
    }

    for i2 in tree.children(node1) {
      let node2 = NodeRef::level2(i2);
      match mask.get(node2) {
        NodeMask::Cull => continue,
        NodeMask::Accumulate => {
          emit(accumulated[layout.index(node2)]);
          continue;
        }
        NodeMask::Render => {}
      }

      for leaf in tree.children(node2) {
        let node = NodeRef::leaf(leaf);
        match mask.get(node) {
          NodeMask::Cull => {}
          NodeMask::Accumulate => emit(accumulated[layout.index(node)]),
          NodeMask::Render => tree.children(node).for_each(|i| emit(tree.point(i))),
        }
      }
    }
  }

  tracing::debug!(written, of = tree.point_count(), "populated visible points");
  Ok(written)
}

#[cfg(test)]
#[path = "materialize_test.rs"]
mod materialize_test;
