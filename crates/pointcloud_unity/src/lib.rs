//! Unity FFI bridge for pointcloud_plugin.
//!
//! Rust owns the loaded trees; C# sizes buffers from the tree shape, passes
//! camera matrices once per camera change and uploads the returned buffers.
//! Key features:
//! - Integer handles for independently loaded clouds
//! - Caller-allocated mask, offset and point buffers (no Rust allocations
//!   cross the boundary)
//! - Host logging callback as the diagnostic sink
//! - Engine-agnostic metrics collection via `metrics` feature
//!
//! # Architecture
//!
//! ```text
//! C# (Unity)                              Rust (pointcloud_unity)
//! ┌──────────────────────┐                ┌──────────────────────────┐
//! │ NativePointCloud     │  pointcloud_   │ CLOUDS[id]               │
//! │                      │  create()      │  PointCloudData          │
//! │ Load(): positions ───┼──────────────► │   - Arc<SpatialTree>     │
//! │         colors       │                │   - cached offsets       │
//! │                      │  tree_shape()  │   - cached averages      │
//! │ Allocate buffers ◄───┼────────────────│                          │
//! │                      │                │                          │
//! │ OnCameraChanged():   │  populate_     │ classify ─► mask         │
//! │   M, V, P ───────────┼──mask/points──►│ materialize ─► points    │
//! │   upload buffers ◄───┼────────────────│                          │
//! └──────────────────────┘                └──────────────────────────┘
//! ```
//!
//! # Status codes
//!
//! Every function returning `i32` uses the same codes:
//! - `0` success (or a positive handle from `pointcloud_create`)
//! - `-1` null pointer argument
//! - `-2` failed to acquire the registry lock
//! - `-3` unknown cloud handle
//! - `-4` metrics feature not enabled (compile-time)
//! - `-5` caller buffer too small
//! - `-6` tree build failed
//!
//! Failures are also reported through the logging callback when one is
//! installed. The callback must not call back into this library.

use std::collections::HashMap;
use std::ffi::CString;
use std::os::raw::c_char;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

use glam::{Mat4, Vec3};

use pointcloud_plugin::{
    BuildConfig, CameraMatrices, ClassifyOptions, DiagnosticSink, Point, PointCloudData,
    PointCloudError, TracingSink, TreeShape,
};

// =============================================================================
// FFI Types
// =============================================================================

/// Tree construction settings. Matches C# FfiBuildConfig exactly.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct FfiBuildConfig {
    /// World size of one voxel. Zero or negative derives it from density.
    pub voxel_size: f64,
    /// Target points per voxel when deriving the voxel size (0 = default).
    pub points_per_voxel: u32,
    pub _pad: u32,
}

impl From<&FfiBuildConfig> for BuildConfig {
    fn from(cfg: &FfiBuildConfig) -> Self {
        let mut config = BuildConfig::default();
        if cfg.voxel_size > 0.0 {
            config.voxel_size = Some(cfg.voxel_size);
        }
        if cfg.points_per_voxel > 0 {
            config.points_per_voxel = cfg.points_per_voxel;
        }
        config
    }
}

/// Camera matrices, each 16 floats in column-major order (Unity's
/// `Matrix4x4` memory layout). All zeros disables culling.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct FfiCamera {
    pub model: [f32; 16],
    pub view: [f32; 16],
    pub projection: [f32; 16],
}

impl From<&FfiCamera> for CameraMatrices {
    fn from(camera: &FfiCamera) -> Self {
        CameraMatrices::new(
            Mat4::from_cols_array(&camera.model),
            Mat4::from_cols_array(&camera.view),
            Mat4::from_cols_array(&camera.projection),
        )
    }
}

/// Node and point counts used to size every other buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FfiTreeShape {
    pub level1_count: u32,
    pub level2_count: u32,
    pub leaf_count: u32,
    pub point_count: u32,
}

impl FfiTreeShape {
    fn new(shape: TreeShape, point_count: usize) -> Self {
        Self {
            level1_count: shape.level1,
            level2_count: shape.level2,
            leaf_count: shape.leaves,
            point_count: point_count as u32,
        }
    }
}

/// Caller-allocated per-level mask buffers (one i32 per node).
#[repr(C)]
pub struct FfiMaskBuffers {
    pub level1: *mut i32,
    pub level1_len: u32,
    pub level2: *mut i32,
    pub level2_len: u32,
    pub leaves: *mut i32,
    pub leaves_len: u32,
}

/// Caller-allocated per-level offset buffers (one u32 per node).
#[repr(C)]
pub struct FfiOffsetBuffers {
    pub level1: *mut u32,
    pub level1_len: u32,
    pub level2: *mut u32,
    pub level2_len: u32,
    pub leaves: *mut u32,
    pub leaves_len: u32,
}

/// Host logging callback receiving a NUL-terminated UTF-8 message.
///
/// The pointer is only valid for the duration of the call.
pub type LoggingCallback = Option<unsafe extern "C" fn(message: *const c_char)>;

// =============================================================================
// FFI Metrics Types
// =============================================================================

/// Timing histogram stats (from RollingWindow).
///
/// Each timing category provides these computed statistics from a 128-sample
/// rolling window.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct FfiTimingStats {
    /// Most recent sample in microseconds.
    pub last_us: u64,
    /// Mean of window in microseconds.
    pub avg_us: u64,
    /// Minimum in window in microseconds.
    pub min_us: u64,
    /// Maximum in window in microseconds.
    pub max_us: u64,
    /// Number of samples in window (up to 128).
    pub sample_count: u32,
    /// Padding for alignment.
    pub _pad: u32,
}

impl From<pointcloud_plugin::metrics::TimingStats> for FfiTimingStats {
    fn from(stats: pointcloud_plugin::metrics::TimingStats) -> Self {
        Self {
            last_us: stats.last_us,
            avg_us: stats.avg_us,
            min_us: stats.min_us,
            max_us: stats.max_us,
            sample_count: stats.sample_count,
            _pad: 0,
        }
    }
}

/// Rust-side metrics snapshot for FFI export.
///
/// Access via `pointcloud_get_metrics()`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct FfiMetricsSnapshot {
    /// Classification timing stats.
    pub classify: FfiTimingStats,
    /// Point materialization timing stats.
    pub materialize: FfiTimingStats,

    // Operation counts (cumulative)
    /// Total classification passes.
    pub total_classify_calls: u64,
    /// Total points written to caller buffers.
    pub total_points_emitted: u64,

    // Last classification, per level (Level-1, Level-2, Leaf)
    pub last_culled: [u32; 3],
    pub last_accumulated: [u32; 3],
    pub last_rendered: [u32; 3],
    pub _pad: u32,
}

// =============================================================================
// Diagnostics
// =============================================================================

/// Forwards diagnostics to the host callback.
struct CallbackSink(unsafe extern "C" fn(*const c_char));

impl DiagnosticSink for CallbackSink {
    fn message(&self, message: &str) {
        let Ok(text) = CString::new(message.replace('\0', " ")) else {
            return;
        };
        // SAFETY: the host promised a callable function pointer in
        // pointcloud_initialize; `text` outlives the call.
        unsafe { (self.0)(text.as_ptr()) }
    }
}

/// Callback installed by `pointcloud_initialize`, picked up by new clouds.
static LOGGER: Mutex<LoggingCallback> = Mutex::new(None);

fn current_sink() -> Arc<dyn DiagnosticSink> {
    match LOGGER.lock().ok().and_then(|guard| *guard) {
        Some(callback) => Arc::new(CallbackSink(callback)),
        None => Arc::new(TracingSink),
    }
}

// =============================================================================
// Global Cloud Storage
// =============================================================================

/// Global cloud storage with thread-safe access.
static CLOUDS: Mutex<Option<HashMap<i32, PointCloudData>>> = Mutex::new(None);
static NEXT_CLOUD_ID: AtomicI32 = AtomicI32::new(1);

/// Run `f` on a loaded cloud, translating registry failures to status codes.
fn with_cloud(cloud_id: i32, f: impl FnOnce(&PointCloudData) -> i32) -> i32 {
    let Ok(guard) = CLOUDS.lock() else {
        return -2;
    };

    let Some(ref clouds) = *guard else {
        return -3;
    };

    let Some(cloud) = clouds.get(&cloud_id) else {
        return -3;
    };

    f(cloud)
}

fn error_status(err: &PointCloudError) -> i32 {
    match err {
        PointCloudError::BufferTooSmall { .. } => -5,
        _ => -6,
    }
}

/// Borrow a caller buffer. None when `ptr` is null and `len` is not zero.
///
/// # Safety
/// A non-null `ptr` must be valid for `len` writes for the returned lifetime.
unsafe fn buffer_mut<'a, T>(ptr: *mut T, len: u32) -> Option<&'a mut [T]> {
    if ptr.is_null() {
        let empty: &mut [T] = &mut [];
        (len == 0).then_some(empty)
    } else {
        Some(std::slice::from_raw_parts_mut(ptr, len as usize))
    }
}

/// Store `count` in an optional out-pointer.
unsafe fn write_count(written: *mut u32, count: usize) {
    if !written.is_null() {
        *written = count as u32;
    }
}

fn classify_options(frustum_culling: i32, lod: i32) -> ClassifyOptions {
    ClassifyOptions::default()
        .with_frustum_culling(frustum_culling != 0)
        .with_lod(lod != 0)
}

// =============================================================================
// FFI Functions
// =============================================================================

/// Returns the library version as a packed u32: 0xMMmmpp (major.minor.patch).
#[no_mangle]
pub extern "C" fn pointcloud_version() -> u32 {
    0x000100 // v0.1.0
}

/// Install (or with null, remove) the logging callback used by clouds created
/// afterwards.
///
/// # Returns
/// - 0 on success
/// - -2 if failed to acquire lock
#[no_mangle]
pub extern "C" fn pointcloud_initialize(callback: LoggingCallback) -> i32 {
    let Ok(mut guard) = LOGGER.lock() else {
        return -2;
    };
    *guard = callback;
    drop(guard);

    current_sink().message(&format!("pointcloud_unity v{} initialized", env!("CARGO_PKG_VERSION")));
    0
}

/// Build a tree from raw points and register it.
///
/// # Safety
/// - `positions` must point to `count * 3` floats (x, y, z per point).
/// - `colors` must be null or point to `count` packed `0xRRGGBB` colors.
/// - `config` must be null (defaults) or point to a valid FfiBuildConfig.
///
/// # Returns
/// - Positive cloud_id on success
/// - -1 if positions is null
/// - -2 if failed to acquire lock
/// - -6 if the tree could not be built (empty input, NaN, ...)
#[no_mangle]
pub unsafe extern "C" fn pointcloud_create(
    positions: *const f32,
    colors: *const u32,
    count: u32,
    config: *const FfiBuildConfig,
) -> i32 {
    if positions.is_null() {
        return -1;
    }

    let raw = std::slice::from_raw_parts(positions, count as usize * 3);
    let points: Vec<Vec3> = raw
        .chunks_exact(3)
        .map(|p| Vec3::new(p[0], p[1], p[2]))
        .collect();
    let colors = if colors.is_null() {
        None
    } else {
        Some(std::slice::from_raw_parts(colors, count as usize))
    };
    let config = if config.is_null() {
        BuildConfig::default()
    } else {
        BuildConfig::from(&*config)
    };

    let data = match PointCloudData::from_points_with_sink(&points, colors, config, current_sink()) {
        Ok(data) => data,
        Err(err) => return error_status(&err),
    };

    let Ok(mut guard) = CLOUDS.lock() else {
        return -2;
    };

    let clouds = guard.get_or_insert_with(HashMap::new);
    let cloud_id = NEXT_CLOUD_ID.fetch_add(1, Ordering::SeqCst);
    clouds.insert(cloud_id, data);

    cloud_id
}

/// Destroy a cloud and free its resources.
///
/// # Returns
/// - 0 on success
/// - -2 if failed to acquire lock
/// - -3 if cloud_id not found
#[no_mangle]
pub extern "C" fn pointcloud_destroy(cloud_id: i32) -> i32 {
    let Ok(mut guard) = CLOUDS.lock() else {
        return -2;
    };

    let Some(ref mut clouds) = *guard else {
        return -3;
    };

    if clouds.remove(&cloud_id).is_some() {
        0
    } else {
        -3
    }
}

/// Node counts per level and the total point count.
///
/// # Safety
/// - `out` must point to a valid FfiTreeShape struct.
///
/// # Returns
/// - 0 on success, -1 if out is null, -2 lock failure, -3 unknown cloud
#[no_mangle]
pub unsafe extern "C" fn pointcloud_tree_shape(cloud_id: i32, out: *mut FfiTreeShape) -> i32 {
    if out.is_null() {
        return -1;
    }

    with_cloud(cloud_id, |cloud| {
        *out = FfiTreeShape::new(cloud.shape(), cloud.point_count());
        0
    })
}

/// Total point count (the required length of full and visible point buffers).
///
/// # Safety
/// - `out` must point to a valid u64.
///
/// # Returns
/// - 0 on success, -1 if out is null, -2 lock failure, -3 unknown cloud
#[no_mangle]
pub unsafe extern "C" fn pointcloud_point_count(cloud_id: i32, out: *mut u64) -> i32 {
    if out.is_null() {
        return -1;
    }

    with_cloud(cloud_id, |cloud| {
        *out = cloud.point_count() as u64;
        0
    })
}

/// Copy the cumulative offset tables into caller buffers.
///
/// # Safety
/// - `buffers` must point to a valid FfiOffsetBuffers whose pointers are
///   valid for their stated lengths.
///
/// # Returns
/// - 0 on success, -1 null pointer, -2 lock failure, -3 unknown cloud,
///   -5 buffer too small
#[no_mangle]
pub unsafe extern "C" fn pointcloud_populate_offsets(
    cloud_id: i32,
    buffers: *const FfiOffsetBuffers,
) -> i32 {
    if buffers.is_null() {
        return -1;
    }
    let b = &*buffers;
    let (Some(level1), Some(level2), Some(leaves)) = (
        buffer_mut(b.level1, b.level1_len),
        buffer_mut(b.level2, b.level2_len),
        buffer_mut(b.leaves, b.leaves_len),
    ) else {
        return -1;
    };

    with_cloud(cloud_id, |cloud| match cloud.populate_offsets(level1, level2, leaves) {
        Ok(()) => 0,
        Err(err) => error_status(&err),
    })
}

/// Classify the tree for a camera into caller mask buffers.
///
/// Only slots of visited nodes are written; descendants of culled or
/// accumulated nodes keep their previous contents.
///
/// # Safety
/// - `camera` must point to a valid FfiCamera.
/// - `buffers` must point to a valid FfiMaskBuffers whose pointers are valid
///   for their stated lengths.
///
/// # Returns
/// - 0 on success, -1 null pointer, -2 lock failure, -3 unknown cloud,
///   -5 buffer too small
#[no_mangle]
pub unsafe extern "C" fn pointcloud_populate_mask(
    cloud_id: i32,
    camera: *const FfiCamera,
    frustum_culling: i32,
    lod: i32,
    buffers: *const FfiMaskBuffers,
) -> i32 {
    if camera.is_null() || buffers.is_null() {
        return -1;
    }
    let camera = CameraMatrices::from(&*camera);
    let b = &*buffers;
    let (Some(level1), Some(level2), Some(leaves)) = (
        buffer_mut(b.level1, b.level1_len),
        buffer_mut(b.level2, b.level2_len),
        buffer_mut(b.leaves, b.leaves_len),
    ) else {
        return -1;
    };

    with_cloud(cloud_id, |cloud| {
        match cloud.classify_into(&camera, classify_options(frustum_culling, lod), level1, level2, leaves) {
            Ok(_) => 0,
            Err(err) => error_status(&err),
        }
    })
}

/// Write every point, unculled, into a caller buffer.
///
/// # Safety
/// - `out` must be valid for `capacity` Points.
/// - `written` must be null or point to a valid u32.
///
/// # Returns
/// - 0 on success, -1 if out is null, -2 lock failure, -3 unknown cloud,
///   -5 buffer too small
#[no_mangle]
pub unsafe extern "C" fn pointcloud_populate_points(
    cloud_id: i32,
    out: *mut Point,
    capacity: u32,
    written: *mut u32,
) -> i32 {
    let Some(out) = buffer_mut(out, capacity) else {
        return -1;
    };

    with_cloud(cloud_id, |cloud| match cloud.populate_points(out) {
        Ok(count) => {
            write_count(written, count);
            0
        }
        Err(err) => error_status(&err),
    })
}

/// Write one averaged point per node, laid out `[Level-1][Level-2][Leaf]`.
///
/// # Safety
/// - `out` must be valid for `capacity` Points.
/// - `written` must be null or point to a valid u32.
///
/// # Returns
/// - 0 on success, -1 if out is null, -2 lock failure, -3 unknown cloud,
///   -5 buffer too small
#[no_mangle]
pub unsafe extern "C" fn pointcloud_populate_accumulated_points(
    cloud_id: i32,
    out: *mut Point,
    capacity: u32,
    written: *mut u32,
) -> i32 {
    let Some(out) = buffer_mut(out, capacity) else {
        return -1;
    };

    with_cloud(cloud_id, |cloud| match cloud.populate_accumulated_points(out) {
        Ok(count) => {
            write_count(written, count);
            0
        }
        Err(err) => error_status(&err),
    })
}

/// Classify for a camera and write the resulting visible points: full points
/// of rendered leaves, averaged points of accumulated nodes.
///
/// # Safety
/// - `camera` must point to a valid FfiCamera.
/// - `out` must be valid for `capacity` Points; capacity must be at least
///   the point count.
/// - `written` must be null or point to a valid u32.
///
/// # Returns
/// - 0 on success, -1 null pointer, -2 lock failure, -3 unknown cloud,
///   -5 buffer too small
#[no_mangle]
pub unsafe extern "C" fn pointcloud_populate_visible_points(
    cloud_id: i32,
    camera: *const FfiCamera,
    frustum_culling: i32,
    lod: i32,
    out: *mut Point,
    capacity: u32,
    written: *mut u32,
) -> i32 {
    if camera.is_null() {
        return -1;
    }
    let camera = CameraMatrices::from(&*camera);
    let Some(out) = buffer_mut(out, capacity) else {
        return -1;
    };

    with_cloud(cloud_id, |cloud| {
        let mask = cloud.classify(&camera, classify_options(frustum_culling, lod));
        match cloud.populate_visible_points(&mask, out) {
            Ok(count) => {
                write_count(written, count);
                0
            }
            Err(err) => error_status(&err),
        }
    })
}

/// Get current metrics snapshot for a cloud.
///
/// Stats are computed from a 128-sample rolling window.
///
/// # Safety
/// - `out` must point to a valid FfiMetricsSnapshot struct.
///
/// # Returns
/// - 0 on success
/// - -1 if out is null
/// - -2 if failed to acquire lock
/// - -3 if cloud_id not found
/// - -4 if metrics feature not enabled (compile-time)
#[no_mangle]
pub unsafe extern "C" fn pointcloud_get_metrics(
    cloud_id: i32,
    out: *mut FfiMetricsSnapshot,
) -> i32 {
    #[cfg(not(feature = "metrics"))]
    {
        let _ = (cloud_id, out);
        return -4; // Metrics not enabled
    }

    #[cfg(feature = "metrics")]
    {
        if out.is_null() {
            return -1;
        }

        with_cloud(cloud_id, |cloud| {
            let Some(snapshot) = cloud.metrics_snapshot() else {
                return -4;
            };

            *out = FfiMetricsSnapshot {
                classify: snapshot.classify.into(),
                materialize: snapshot.materialize.into(),
                total_classify_calls: snapshot.total_classify_calls,
                total_points_emitted: snapshot.total_points_emitted,
                last_culled: snapshot.last_mask.culled,
                last_accumulated: snapshot.last_mask.accumulated,
                last_rendered: snapshot.last_mask.rendered,
                _pad: 0,
            };
            0
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
