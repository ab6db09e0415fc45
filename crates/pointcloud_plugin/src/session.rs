//! PointCloudData - container for one loaded point cloud.
//!
//! Owns the immutable tree behind an `Arc`, the camera-independent caches
//! derived from it, the diagnostic sink and (with the `metrics` feature)
//! per-cloud metrics. Multiple clouds can be loaded independently.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use glam::Vec3;
use web_time::Instant;

use crate::classify::{self, ClassifyOptions, MaskStats, TreeMask};
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::{PointCloudError, Result};
use crate::geometry::CameraMatrices;
use crate::materialize;
#[cfg(feature = "metrics")]
use crate::metrics::CloudMetrics;
use crate::metrics::MetricsSnapshot;
use crate::offsets::{self, TreeOffsets};
use crate::tree::{BuildConfig, SpatialTree, TreeBuilder, TreeShape};
use crate::types::Point;

// =============================================================================
// CloudId - unique identifier
// =============================================================================

/// Atomic counter for generating unique CloudIds.
static CLOUD_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Opaque cloud identifier.
///
/// Generated atomically - guaranteed unique within process lifetime.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct CloudId(u64);

impl CloudId {
    pub fn new() -> Self {
        Self(CLOUD_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for CloudId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// PointCloudData - per-cloud state container
// =============================================================================

/// One loaded cloud and its derived buffers.
///
/// Offsets are computed when a tree is installed. Accumulated points are
/// computed on first use and kept until the tree is replaced.
pub struct PointCloudData {
    id: CloudId,
    tree: Arc<SpatialTree>,
    /// Bumped by every `replace_tree`.
    version: u64,
    offsets: TreeOffsets,
    accumulated: OnceLock<Vec<Point>>,
    sink: Arc<dyn DiagnosticSink>,
    #[cfg(feature = "metrics")]
    metrics: std::sync::Mutex<CloudMetrics>,
}

impl PointCloudData {
    /// Wrap an already built tree. Diagnostics go to `tracing`.
    pub fn from_tree(tree: impl Into<Arc<SpatialTree>>) -> Self {
        let tree = tree.into();
        let offsets = offsets::compute_offsets(&tree);
        Self {
            id: CloudId::new(),
            tree,
            version: 0,
            offsets,
            accumulated: OnceLock::new(),
            sink: Arc::new(TracingSink),
            #[cfg(feature = "metrics")]
            metrics: std::sync::Mutex::new(CloudMetrics::new()),
        }
    }

    /// Build a tree from raw world-space points. Diagnostics go to `tracing`.
    pub fn from_points(positions: &[Vec3], colors: Option<&[u32]>, config: BuildConfig) -> Result<Self> {
        Self::from_points_with_sink(positions, colors, config, Arc::new(TracingSink))
    }

    /// Build a tree from raw points, reporting progress and failure to `sink`.
    pub fn from_points_with_sink(
        positions: &[Vec3],
        colors: Option<&[u32]>,
        config: BuildConfig,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Result<Self> {
        sink.message(&format!("Building point tree from {} points", positions.len()));
        let tree = match TreeBuilder::new(config).build(positions, colors) {
            Ok(tree) => tree,
            Err(err) => {
                sink.message(&format!("Failed to build point tree: {err}"));
                return Err(err);
            }
        };
        let data = Self::from_tree(tree).with_sink(sink);
        let shape = data.shape();
        data.report(&format!(
            "Loaded {} points into {} level-1, {} level-2 and {} leaf nodes",
            data.point_count(),
            shape.level1,
            shape.level2,
            shape.leaves
        ));
        Ok(data)
    }

    /// Replace the diagnostic sink.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn id(&self) -> CloudId {
        self.id
    }

    /// Number of times the tree has been replaced.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn tree(&self) -> &Arc<SpatialTree> {
        &self.tree
    }

    /// Install a new tree. Offsets are recomputed, cached averages dropped.
    pub fn replace_tree(&mut self, tree: impl Into<Arc<SpatialTree>>) {
        self.tree = tree.into();
        self.version += 1;
        self.offsets = offsets::compute_offsets(&self.tree);
        self.accumulated = OnceLock::new();
        tracing::debug!(id = self.id.raw(), version = self.version, "replaced tree");
    }

    /// Send a message to the diagnostic sink.
    pub fn report(&self, message: &str) {
        self.sink.message(message);
    }

    pub fn point_count(&self) -> usize {
        self.tree.point_count()
    }

    pub fn shape(&self) -> TreeShape {
        self.tree.shape()
    }

    pub fn offsets(&self) -> &TreeOffsets {
        &self.offsets
    }

    /// Copy the cached offset tables into caller buffers.
    pub fn populate_offsets(&self, level1: &mut [u32], level2: &mut [u32], leaves: &mut [u32]) -> Result<()> {
        let result = copy_into("level-1 offsets", &self.offsets.level1, level1)
            .and_then(|_| copy_into("level-2 offsets", &self.offsets.level2, level2))
            .and_then(|_| copy_into("leaf offsets", &self.offsets.leaves, leaves));
        self.reported(result)
    }

    // =========================================================================
    // Classification
    // =========================================================================

    pub fn classify(&self, camera: &CameraMatrices, options: ClassifyOptions) -> TreeMask {
        let start = Instant::now();
        let mask = classify::classify(&self.tree, camera, options);
        self.record_classify(start, &mask.stats);
        mask
    }

    pub fn classify_into(
        &self,
        camera: &CameraMatrices,
        options: ClassifyOptions,
        level1: &mut [i32],
        level2: &mut [i32],
        leaves: &mut [i32],
    ) -> Result<MaskStats> {
        let start = Instant::now();
        let stats = self.reported(classify::classify_into(
            &self.tree, camera, options, level1, level2, leaves,
        ))?;
        self.record_classify(start, &stats);
        Ok(stats)
    }

    // =========================================================================
    // Materialization
    // =========================================================================

    /// Every point, in tree order.
    pub fn populate_points(&self, out: &mut [Point]) -> Result<usize> {
        let start = Instant::now();
        let written = self.reported(materialize::populate_full_points(&self.tree, out))?;
        self.record_materialize(start, written);
        Ok(written)
    }

    /// Per-node averages, computed once per tree.
    pub fn accumulated_points(&self) -> &[Point] {
        self.accumulated
            .get_or_init(|| materialize::accumulated_points(&self.tree))
    }

    pub fn populate_accumulated_points(&self, out: &mut [Point]) -> Result<usize> {
        let start = Instant::now();
        let accumulated = self.accumulated_points();
        self.reported(copy_into("accumulated points", accumulated, out))?;
        self.record_materialize(start, accumulated.len());
        Ok(accumulated.len())
    }

    /// Points selected by `mask`.
    pub fn populate_visible_points(&self, mask: &TreeMask, out: &mut [Point]) -> Result<usize> {
        let start = Instant::now();
        let written = self.reported(materialize::populate_visible_points(
            &self.tree,
            mask,
            self.accumulated_points(),
            out,
        ))?;
        self.record_materialize(start, written);
        Ok(written)
    }

    // =========================================================================
    // Metrics
    // =========================================================================

    /// Current metrics, or `None` without the `metrics` feature.
    pub fn metrics_snapshot(&self) -> Option<MetricsSnapshot> {
        #[cfg(feature = "metrics")]
        {
            self.metrics.lock().ok().map(|m| m.snapshot())
        }
        #[cfg(not(feature = "metrics"))]
        {
            None
        }
    }

    fn record_classify(&self, start: Instant, stats: &MaskStats) {
        let elapsed_us = start.elapsed().as_micros() as u64;
        #[cfg(feature = "metrics")]
        if let Ok(mut metrics) = self.metrics.lock() {
            metrics.record_classify(elapsed_us, stats);
        }
        tracing::debug!(id = self.id.raw(), elapsed_us, visited = stats.total_visited(), "classify");
    }

    fn record_materialize(&self, start: Instant, points: usize) {
        let elapsed_us = start.elapsed().as_micros() as u64;
        #[cfg(feature = "metrics")]
        if let Ok(mut metrics) = self.metrics.lock() {
            metrics.record_materialize(elapsed_us, points);
        }
        tracing::debug!(id = self.id.raw(), elapsed_us, points, "materialize");
    }

    /// Forward a failure to the sink and the log, then return it unchanged.
    fn reported<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            tracing::warn!(id = self.id.raw(), %err, "point cloud operation failed");
            self.sink.message(&err.to_string());
        }
        result
    }
}

impl std::fmt::Debug for PointCloudData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointCloudData")
            .field("id", &self.id)
            .field("version", &self.version)
            .field("shape", &self.shape())
            .field("point_count", &self.point_count())
            .finish_non_exhaustive()
    }
}

fn copy_into<T: Copy>(buffer: &'static str, src: &[T], dst: &mut [T]) -> Result<()> {
    PointCloudError::check_len(buffer, src.len(), dst.len())?;
    dst[..src.len()].copy_from_slice(src);
    Ok(())
}

/// Classify and compile offsets for one tree on two threads.
///
/// Both passes only read the tree.
pub fn classify_and_offsets(
    tree: &SpatialTree,
    camera: &CameraMatrices,
    options: ClassifyOptions,
) -> (TreeMask, TreeOffsets) {
    rayon::join(
        || classify::classify(tree, camera, options),
        || offsets::compute_offsets(tree),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingSink;
    use crate::test_utils::{look_at_camera, multi_level_tree, scattered_cloud, two_point_tree};

    fn data() -> PointCloudData {
        PointCloudData::from_tree(multi_level_tree())
    }

    #[test]
    fn cloud_id_is_unique() {
        let id1 = CloudId::new();
        let id2 = CloudId::new();
        assert_ne!(id1, id2);
        assert_ne!(data().id(), data().id());
    }

    #[test]
    fn offsets_are_cached_on_load() {
        let data = data();
        assert_eq!(data.offsets().leaves, vec![2, 3, 6, 8, 9]);

        let mut l1 = [0u32; 2];
        let mut l2 = [0u32; 3];
        let mut leaves = [0u32; 5];
        data.populate_offsets(&mut l1, &mut l2, &mut leaves).unwrap();
        assert_eq!(l2, [2, 3, 5]);
    }

    #[test]
    fn build_from_points_reports_progress() {
        let sink = Arc::new(CollectingSink::new());
        let (positions, colors) = scattered_cloud(500, 100.0, 1);
        let data = PointCloudData::from_points_with_sink(
            &positions,
            Some(&colors),
            BuildConfig::default(),
            sink.clone(),
        )
        .unwrap();

        assert_eq!(data.point_count(), 500);
        let messages = sink.messages();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].starts_with("Loaded 500 points"));
    }

    #[test]
    fn build_failure_is_reported() {
        let sink = Arc::new(CollectingSink::new());
        let result = PointCloudData::from_points_with_sink(&[], None, BuildConfig::default(), sink.clone());

        assert_eq!(result.unwrap_err(), PointCloudError::EmptyPointSet);
        assert_eq!(sink.messages().last().map(String::as_str), Some("Failed to build point tree: point set is empty"));
    }

    #[test]
    fn buffer_errors_are_reported() {
        let sink = Arc::new(CollectingSink::new());
        let data = data().with_sink(sink.clone());
        let mut out = vec![Point::EMPTY; 2];

        assert!(data.populate_points(&mut out).is_err());
        assert_eq!(sink.messages(), vec!["points buffer too small: needed 9, got 2"]);
    }

    #[test]
    fn replace_tree_invalidates_caches() {
        let mut data = data();
        assert_eq!(data.accumulated_points().len(), 10);

        data.replace_tree(two_point_tree());
        assert_eq!(data.version(), 1);
        assert_eq!(data.accumulated_points().len(), 3);
        assert_eq!(data.offsets().leaves, vec![2]);
    }

    #[test]
    fn visible_points_through_session() {
        let data = data();
        let camera = look_at_camera(Vec3::new(-3000.0, 2048.0, 5000.0), Vec3::new(-3000.0, 2048.0, 0.0));
        let mask = data.classify(&camera, ClassifyOptions::default());
        let mut out = vec![Point::EMPTY; data.point_count()];

        // Two accumulated Level-2 nodes under the visible Level-1 node.
        assert_eq!(data.populate_visible_points(&mask, &mut out), Ok(2));
    }

    #[test]
    fn accumulated_copy() {
        let data = data();
        let mut out = vec![Point::EMPTY; 12];
        assert_eq!(data.populate_accumulated_points(&mut out), Ok(10));
        assert_eq!(&out[..10], data.accumulated_points());
    }

    #[test]
    fn parallel_passes_match_sequential() {
        let tree = multi_level_tree();
        let camera = look_at_camera(Vec3::new(2048.0, 2048.0, 10_000.0), Vec3::new(2048.0, 2048.0, 0.0));
        let options = ClassifyOptions::default();

        let (mask, offsets) = classify_and_offsets(&tree, &camera, options);

        assert_eq!(mask, classify::classify(&tree, &camera, options));
        assert_eq!(offsets, offsets::compute_offsets(&tree));
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn metrics_track_passes() {
        let data = data();
        data.classify(&CameraMatrices::DISABLED, ClassifyOptions::default());
        let mut out = vec![Point::EMPTY; data.point_count()];
        data.populate_points(&mut out).unwrap();

        let snapshot = data.metrics_snapshot().unwrap();
        assert_eq!(snapshot.total_classify_calls, 1);
        assert_eq!(snapshot.total_points_emitted, 9);
        assert_eq!(snapshot.last_mask.rendered, [2, 3, 5]);
    }
}
