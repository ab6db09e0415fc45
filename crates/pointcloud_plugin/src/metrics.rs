//! Engine-agnostic metrics for point cloud passes.
//!
//! Feature-gated and runtime-toggled to ensure zero overhead when disabled.
//!
//! # Usage
//!
//! ```ignore
//! use pointcloud_plugin::metrics::{CloudMetrics, COLLECT_METRICS};
//!
//! // Compile with --features metrics
//! // Runtime toggle:
//! COLLECT_METRICS.store(false, Ordering::Relaxed);
//!
//! metrics.record_classify(timing_us, &stats);
//! metrics.record_materialize(timing_us, points_written);
//! let snapshot = metrics.snapshot();
//! ```

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;

use crate::classify::MaskStats;

/// Runtime toggle for metrics collection.
/// Set to false to disable metrics gathering at runtime.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

/// Samples kept per timing window.
pub const TIMING_WINDOW: usize = 128;

/// Check if metrics collection is enabled (both compile-time and runtime).
#[inline]
pub fn is_enabled() -> bool {
    #[cfg(feature = "metrics")]
    {
        COLLECT_METRICS.load(Ordering::Relaxed)
    }
    #[cfg(not(feature = "metrics"))]
    {
        false
    }
}

/// Rolling window for storing recent values (e.g., timing history).
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    buffer: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingWindow<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a new value, evicting the oldest if at capacity.
    pub fn push(&mut self, value: T) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Iterate over values (oldest to newest).
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }

    pub fn last(&self) -> Option<&T> {
        self.buffer.back()
    }
}

impl RollingWindow<u64> {
    pub fn sum(&self) -> u64 {
        self.buffer.iter().sum()
    }

    pub fn average(&self) -> f64 {
        if self.buffer.is_empty() {
            0.0
        } else {
            self.sum() as f64 / self.buffer.len() as f64
        }
    }

    pub fn min_max(&self) -> Option<(u64, u64)> {
        let min = *self.buffer.iter().min()?;
        let max = *self.buffer.iter().max()?;
        Some((min, max))
    }

    /// Summary statistics of the window.
    pub fn stats(&self) -> TimingStats {
        let (min_us, max_us) = self.min_max().unwrap_or_default();
        TimingStats {
            last_us: self.last().copied().unwrap_or(0),
            avg_us: self.average().round() as u64,
            min_us,
            max_us,
            sample_count: self.buffer.len() as u32,
        }
    }
}

impl Default for RollingWindow<u64> {
    fn default() -> Self {
        Self::new(TIMING_WINDOW)
    }
}

/// Computed statistics of one timing window, in microseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimingStats {
    pub last_us: u64,
    pub avg_us: u64,
    pub min_us: u64,
    pub max_us: u64,
    pub sample_count: u32,
}

/// Plain copy of [`CloudMetrics`] for export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub classify: TimingStats,
    pub materialize: TimingStats,
    pub total_classify_calls: u64,
    pub total_points_emitted: u64,
    /// Mask counts of the most recent classification.
    pub last_mask: MaskStats,
}

/// Per-cloud statistics updated by each pass.
#[derive(Debug, Clone, Default)]
pub struct CloudMetrics {
    /// Rolling window of classification times in microseconds.
    pub classify_timings: RollingWindow<u64>,
    /// Rolling window of point materialization times in microseconds.
    pub materialize_timings: RollingWindow<u64>,
    pub last_mask: MaskStats,
    pub total_classify_calls: u64,
    pub total_points_emitted: u64,
}

impl CloudMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear windows and last-pass stats. Totals are cumulative and kept.
    pub fn reset(&mut self) {
        self.classify_timings.clear();
        self.materialize_timings.clear();
        self.last_mask = MaskStats::default();
    }

    pub fn record_classify(&mut self, timing_us: u64, stats: &MaskStats) {
        if !is_enabled() {
            return;
        }
        self.classify_timings.push(timing_us);
        self.last_mask = *stats;
        self.total_classify_calls += 1;
    }

    pub fn record_materialize(&mut self, timing_us: u64, points: usize) {
        if !is_enabled() {
            return;
        }
        self.materialize_timings.push(timing_us);
        self.total_points_emitted += points as u64;
    }

    pub fn avg_classify_timing_us(&self) -> f64 {
        self.classify_timings.average()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            classify: self.classify_timings.stats(),
            materialize: self.materialize_timings.stats(),
            total_classify_calls: self.total_classify_calls,
            total_points_emitted: self.total_points_emitted,
            last_mask: self.last_mask,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_window() {
        let mut window = RollingWindow::new(3);
        assert!(window.is_empty());

        window.push(10u64);
        window.push(20);
        window.push(30);
        assert_eq!(window.len(), 3);
        assert_eq!(window.sum(), 60);
        assert_eq!(window.average(), 20.0);

        // Push one more, oldest should be evicted
        window.push(40);
        assert_eq!(window.len(), 3);
        assert_eq!(window.iter().copied().collect::<Vec<_>>(), vec![20, 30, 40]);
        assert_eq!(window.min_max(), Some((20, 40)));
    }

    #[test]
    fn test_window_stats() {
        let mut window = RollingWindow::default();
        assert_eq!(window.stats(), TimingStats::default());

        window.push(100);
        window.push(300);
        let stats = window.stats();
        assert_eq!(stats.last_us, 300);
        assert_eq!(stats.avg_us, 200);
        assert_eq!((stats.min_us, stats.max_us), (100, 300));
        assert_eq!(stats.sample_count, 2);
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn test_recording() {
        let mut metrics = CloudMetrics::new();
        let stats = MaskStats {
            culled: [1, 0, 0],
            accumulated: [0, 2, 0],
            rendered: [1, 0, 0],
        };

        metrics.record_classify(1000, &stats);
        metrics.record_classify(3000, &stats);
        metrics.record_materialize(500, 42);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_classify_calls, 2);
        assert_eq!(snapshot.classify.avg_us, 2000);
        assert_eq!(snapshot.total_points_emitted, 42);
        assert_eq!(snapshot.last_mask, stats);

        metrics.reset();
        assert_eq!(metrics.snapshot().classify.sample_count, 0);
        assert_eq!(metrics.snapshot().total_classify_calls, 2);
    }

    #[cfg(not(feature = "metrics"))]
    #[test]
    fn test_recording_disabled() {
        let mut metrics = CloudMetrics::new();
        metrics.record_classify(1000, &MaskStats::default());
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }
}
