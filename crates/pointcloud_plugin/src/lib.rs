//! pointcloud_plugin - Framework/engine independent point cloud LOD
//!
//! This crate decides, once per camera change, which parts of a sparse
//! three-level spatial tree are drawn at full resolution, which collapse into
//! a single averaged point, and which are culled entirely. The results are
//! flat buffers (masks, cumulative offsets, colored points) that a host
//! renderer can upload without walking the tree itself.
//!
//! # Passes
//!
//! - **Classification** ([`classify`]): frustum and screen-size tests per node,
//!   producing a three-tier [`TreeMask`]
//! - **Offsets** ([`offsets`]): CSR-style prefix sums locating each node's
//!   slice of a flattened buffer; camera independent
//! - **Materialization** ([`materialize`]): full-resolution points, per-node
//!   averaged points, or the mix selected by a mask
//!
//! # Example
//!
//! ```ignore
//! use pointcloud_plugin::{CameraMatrices, ClassifyOptions, PointCloudData};
//!
//! let data = PointCloudData::from_points(&positions, Some(&colors), Default::default())?;
//! let camera = CameraMatrices::new(model, view, projection);
//!
//! let mask = data.classify(&camera, ClassifyOptions::default());
//! let mut points = vec![Default::default(); data.point_count()];
//! let written = data.populate_visible_points(&mask, &mut points)?;
//! ```

pub mod constants;
pub mod error;
pub mod types;

pub use constants::{ACCUMULATION_THRESHOLD, TREE_DEPTH};
pub use error::{PointCloudError, Result};
pub use types::{pack_rgb, unpack_rgb, Point, Rgba8};

// Sparse three-level tree (arena form)
pub mod tree;
pub use tree::{BuildConfig, IndexTransform, SpatialTree, TreeBuilder, TreeLayout, TreeShape};

// Geometric test kernel
pub mod geometry;
pub use geometry::{frustum_intersects, test_accumulation, CameraMatrices};

// Visibility / LOD classification
pub mod classify;
pub use classify::{classify, classify_into, ClassifyOptions, MaskStats, NodeMask, TreeMask};

// Cumulative offset tables
pub mod offsets;
pub use offsets::{compute_offsets, compute_offsets_into, TreeOffsets};

// Point buffers for the renderer
pub mod materialize;
pub use materialize::{
  accumulated_points, full_points, populate_accumulated_points, populate_full_points,
  populate_visible_points, AccumulatedLayout,
};

// Diagnostic side channel
pub mod diagnostics;
pub use diagnostics::{CollectingSink, DiagnosticSink, NullSink, TracingSink};

// Loaded cloud container
pub mod session;
pub use session::{classify_and_offsets, CloudId, PointCloudData};

pub mod metrics;

#[cfg(test)]
pub mod test_utils;
