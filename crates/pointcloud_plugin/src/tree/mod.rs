//! Sparse three-level point tree in arena form.
//!
//! The tree partitions index space into Level-1 nodes, each holding Level-2
//! nodes, each holding leaves, each holding points. Only populated nodes
//! exist. Nodes live in one flat array per level, ordered depth first, and
//! reference their children by half-open index range into the next array.
//!
//! ```text
//! level1: [ A            | B      ]
//!            │              │
//! level2: [ A0    | A1   | B0     ]     children of A = level2[0..2]
//!            │       │      │
//! leaves: [ a | b | c    | d | e  ]     children of A1 = leaves[2..3]
//!           │
//! points: [ ....| ...| ......| ..| ]    points of a = points[0..4]
//! ```
//!
//! Because every child range is contiguous, the pre-order position of a node
//! at its level is simply its array index.
//!
//! # Module Structure
//!
//! - [`node`]: `NodeLevel`, `NodeRef`, `InternalNode`, `LeafNode`
//! - [`layout`]: `TreeLayout` - per-level branching factors and origin math
//! - [`bounds`]: `DAabb3` - index-space node extents and their corners
//! - [`transform`]: `IndexTransform` - index space to world space
//! - [`arena`]: `SpatialTree` - the immutable arena and its query surface
//! - [`builder`]: `TreeBuilder` - buckets raw points into a tree

pub mod arena;
pub mod bounds;
pub mod builder;
pub mod layout;
pub mod node;
pub mod transform;

// Re-exports
pub use arena::{SpatialTree, TreeShape};
pub use bounds::DAabb3;
pub use builder::{compute_voxel_size, BuildConfig, TreeBuilder};
pub use layout::TreeLayout;
pub use node::{InternalNode, LeafNode, NodeLevel, NodeRef};
pub use transform::IndexTransform;
