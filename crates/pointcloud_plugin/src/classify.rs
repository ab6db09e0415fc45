//! Visibility / LOD classification of the three-level tree.
//!
//! Walks Level-1 nodes, then the children of every rendered node, and writes
//! one [`NodeMask`] per visited node into per-level buffers indexed by
//! pre-order position:
//!
//! ```text
//!   node ─► frustum_intersects? ──no──► Cull        (subtree skipped)
//!                  │yes
//!                  ▼
//!           test_accumulation?  ──yes─► Accumulate  (subtree skipped)
//!                  │no
//!                  ▼
//!               Render ─► visit children
//! ```
//!
//! Slots of skipped subtrees are left untouched. Culling is checked first, so
//! a node that is both off-screen and small is culled.

use glam::Mat4;

use crate::constants::{ACCUMULATION_THRESHOLD, TREE_DEPTH};
use crate::error::{PointCloudError, Result};
use crate::geometry::{frustum_intersects, test_accumulation, CameraMatrices};
use crate::tree::{NodeLevel, NodeRef, SpatialTree, TreeShape};

/// Per-node classification.
///
/// Values are the integers stored in mask buffers.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeMask {
  /// Outside the frustum. Nothing beneath it is drawn.
  Cull = -1,
  /// Small on screen. Drawn as one averaged point.
  Accumulate = 0,
  /// Drawn at full resolution (leaves) or refined further (internal nodes).
  Render = 1,
}

impl NodeMask {
  #[inline]
  pub const fn as_i32(self) -> i32 {
    self as i32
  }
}

impl From<NodeMask> for i32 {
  fn from(mask: NodeMask) -> Self {
    mask.as_i32()
  }
}

impl TryFrom<i32> for NodeMask {
  type Error = i32;

  fn try_from(value: i32) -> std::result::Result<Self, Self::Error> {
    match value {
      -1 => Ok(Self::Cull),
      0 => Ok(Self::Accumulate),
      1 => Ok(Self::Render),
      other => Err(other),
    }
  }
}

/// Toggles for one classification pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassifyOptions {
  /// Run the frustum test.
  pub frustum_culling: bool,
  /// Run the accumulation test.
  pub lod: bool,
  /// Screen-size ratio below which a node accumulates.
  pub accumulation_threshold: f32,
}

impl Default for ClassifyOptions {
  fn default() -> Self {
    Self {
      frustum_culling: true,
      lod: true,
      accumulation_threshold: ACCUMULATION_THRESHOLD,
    }
  }
}

impl ClassifyOptions {
  /// Both tests disabled: every node renders.
  pub fn everything() -> Self {
    Self {
      frustum_culling: false,
      lod: false,
      ..Default::default()
    }
  }

  pub fn with_frustum_culling(mut self, enabled: bool) -> Self {
    self.frustum_culling = enabled;
    self
  }

  pub fn with_lod(mut self, enabled: bool) -> Self {
    self.lod = enabled;
    self
  }

  pub fn with_threshold(mut self, threshold: f32) -> Self {
    self.accumulation_threshold = threshold;
    self
  }
}

/// Visited-node counts of one pass, per level (index = [`NodeLevel::index`]).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MaskStats {
  pub culled: [u32; TREE_DEPTH],
  pub accumulated: [u32; TREE_DEPTH],
  pub rendered: [u32; TREE_DEPTH],
}

impl MaskStats {
  #[inline]
  fn record(&mut self, level: NodeLevel, mask: NodeMask) {
    let counts = match mask {
      NodeMask::Cull => &mut self.culled,
      NodeMask::Accumulate => &mut self.accumulated,
      NodeMask::Render => &mut self.rendered,
    };
    counts[level.index()] += 1;
  }

  /// Nodes written at `level`.
  pub fn visited(&self, level: NodeLevel) -> u32 {
    let i = level.index();
    self.culled[i] + self.accumulated[i] + self.rendered[i]
  }

  /// Nodes written across all levels.
  pub fn total_visited(&self) -> u32 {
    NodeLevel::ALL.iter().map(|l| self.visited(*l)).sum()
  }
}

/// Owned per-level mask buffers.
///
/// Slots not reached by the walk hold [`NodeMask::Cull`].
#[derive(Clone, Debug, PartialEq)]
pub struct TreeMask {
  pub level1: Vec<i32>,
  pub level2: Vec<i32>,
  pub leaves: Vec<i32>,
  pub stats: MaskStats,
}

impl TreeMask {
  /// All-culled mask sized for `shape`.
  pub fn new_culled(shape: TreeShape) -> Self {
    let cull = NodeMask::Cull.as_i32();
    Self {
      level1: vec![cull; shape.level1 as usize],
      level2: vec![cull; shape.level2 as usize],
      leaves: vec![cull; shape.leaves as usize],
      stats: MaskStats::default(),
    }
  }

  /// Raw buffer for `level`.
  pub fn level(&self, level: NodeLevel) -> &[i32] {
    match level {
      NodeLevel::Level1 => &self.level1,
      NodeLevel::Level2 => &self.level2,
      NodeLevel::Leaf => &self.leaves,
    }
  }

  /// Mask of `node`. Out-of-range values read as culled.
  pub fn get(&self, node: NodeRef) -> NodeMask {
    self
      .level(node.level)
      .get(node.index)
      .and_then(|v| NodeMask::try_from(*v).ok())
      .unwrap_or(NodeMask::Cull)
  }
}

/// Classify every reachable node into a freshly allocated mask.
pub fn classify(tree: &SpatialTree, camera: &CameraMatrices, options: ClassifyOptions) -> TreeMask {
  let mut mask = TreeMask::new_culled(tree.shape());
  let stats = Classifier::new(tree, camera, options).walk(
    &mut mask.level1,
    &mut mask.level2,
    &mut mask.leaves,
  );
  mask.stats = stats;
  mask
}

/// Classify into caller-provided buffers, one `i32` per node at each level.
///
/// Only visited slots are written. Fails without writing if any buffer is
/// shorter than its level's node count.
pub fn classify_into(
  tree: &SpatialTree,
  camera: &CameraMatrices,
  options: ClassifyOptions,
  level1: &mut [i32],
  level2: &mut [i32],
  leaves: &mut [i32],
) -> Result<MaskStats> {
  let shape = tree.shape();
  PointCloudError::check_len("level-1 mask", shape.level1 as usize, level1.len())?;
  PointCloudError::check_len("level-2 mask", shape.level2 as usize, level2.len())?;
  PointCloudError::check_len("leaf mask", shape.leaves as usize, leaves.len())?;
  Ok(Classifier::new(tree, camera, options).walk(level1, level2, leaves))
}

struct Classifier<'a> {
  tree: &'a SpatialTree,
  clip: Mat4,
  model_view: Mat4,
  options: ClassifyOptions,
}

impl<'a> Classifier<'a> {
  fn new(tree: &'a SpatialTree, camera: &CameraMatrices, options: ClassifyOptions) -> Self {
    Self {
      tree,
      clip: camera.clip(),
      model_view: camera.model_view(),
      options,
    }
  }

  fn decide(&self, node: NodeRef) -> NodeMask {
    let geometry = self.tree.node_geometry(node);
    if self.options.frustum_culling && !frustum_intersects(&geometry.corners, &self.clip) {
      NodeMask::Cull
    } else if self.options.lod
      && test_accumulation(
        geometry.center,
        geometry.size,
        &self.model_view,
        self.options.accumulation_threshold,
      )
    {
      NodeMask::Accumulate
    } else {
      NodeMask::Render
    }
  }

  fn walk(&self, level1: &mut [i32], level2: &mut [i32], leaves: &mut [i32]) -> MaskStats {
    let _span = tracing::debug_span!("classify", nodes = self.tree.shape().total()).entered();
    let mut stats = MaskStats::default();

    for i1 in 0..self.tree.level1().len() {
      let node1 = NodeRef::level1(i1);
      let mask1 = self.decide(node1);
      level1[i1] = mask1.as_i32();
      stats.record(NodeLevel::Level1, mask1);
      if mask1 != NodeMask::Render {
        continue;
      }

      for i2 in self.tree.children(node1) {
        let node2 = NodeRef::level2(i2);
        let mask2 = self.decide(node2);
        level2[i2] = mask2.as_i32();
        stats.record(NodeLevel::Level2, mask2);
        if mask2 != NodeMask::Render {
          continue;
        }

        for leaf in self.tree.children(node2) {
          let mask = self.decide(NodeRef::leaf(leaf));
          leaves[leaf] = mask.as_i32();
          stats.record(NodeLevel::Leaf, mask);
        }
      }
    }

    tracing::debug!(
      culled = ?stats.culled,
      accumulated = ?stats.accumulated,
      rendered = ?stats.rendered,
      "classified tree"
    );
    stats
  }
}

#[cfg(test)]
#[path = "classify_test.rs"]
mod classify_test;
