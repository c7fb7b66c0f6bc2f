//! Frame timing and draw statistics.
//!
//! Purely observational: nothing in the engine reads these numbers back.
//! Collection is feature-gated and runtime-toggled.
//!
//! # Usage
//!
//! ```ignore
//! use void_layout::metrics::{PerformanceMonitor, COLLECT_METRICS};
//!
//! // Runtime toggle:
//! COLLECT_METRICS.store(false, Ordering::Relaxed);
//!
//! // Each frame:
//! monitor.record_frame(Instant::now());
//! monitor.record_counts(FrameCounts { draw_calls, triangles, .. });
//! let snapshot = monitor.snapshot();
//! ```

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;

use web_time::Instant;

use crate::constants::FRAME_WINDOW;

/// Runtime toggle for metrics collection.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

/// True when metrics are compiled in and enabled at runtime.
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

/// Fixed-capacity window of recent samples.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    buffer: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingWindow<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Push a value, evicting the oldest at capacity.
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

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Oldest to newest.
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
        let first = *self.buffer.front()?;
        Some(
            self.buffer
                .iter()
                .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
        )
    }
}

/// Counts supplied by the renderer once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameCounts {
    pub draw_calls: u32,
    pub triangles: u64,
    pub visible_nodes: usize,
    pub total_nodes: usize,
    pub visible_edges: usize,
    pub total_edges: usize,
}

/// Point-in-time view for an overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerformanceSnapshot {
    pub avg_frame_ms: f64,
    pub fps: f64,
    pub min_frame_ms: f64,
    pub max_frame_ms: f64,
    /// Frame deltas in the window.
    pub samples: usize,
    pub counts: FrameCounts,
}

/// Rolling frame-time monitor.
#[derive(Debug, Clone)]
pub struct PerformanceMonitor {
    /// Inter-frame deltas in microseconds.
    frame_times_us: RollingWindow<u64>,
    last_frame: Option<Instant>,
    counts: FrameCounts,
    /// Frames seen this session; not cleared by `reset`.
    total_frames: u64,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(FRAME_WINDOW)
    }
}

impl PerformanceMonitor {
    pub fn new(window: usize) -> Self {
        Self {
            frame_times_us: RollingWindow::new(window),
            last_frame: None,
            counts: FrameCounts::default(),
            total_frames: 0,
        }
    }

    /// Mark the start of a frame at `now`.
    pub fn record_frame(&mut self, now: Instant) {
        if !is_enabled() {
            return;
        }
        if let Some(last) = self.last_frame {
            let delta = now.saturating_duration_since(last);
            self.frame_times_us.push(delta.as_micros() as u64);
        }
        self.last_frame = Some(now);
        self.total_frames += 1;
    }

    /// Replace the current frame's draw and visibility counts.
    pub fn record_counts(&mut self, counts: FrameCounts) {
        if is_enabled() {
            self.counts = counts;
        }
    }

    pub fn frame_times_us(&self) -> &RollingWindow<u64> {
        &self.frame_times_us
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn snapshot(&self) -> PerformanceSnapshot {
        let avg_frame_ms = self.frame_times_us.average() / 1000.0;
        let (min, max) = self.frame_times_us.min_max().unwrap_or((0, 0));
        PerformanceSnapshot {
            avg_frame_ms,
            fps: if avg_frame_ms > 0.0 { 1000.0 / avg_frame_ms } else { 0.0 },
            min_frame_ms: min as f64 / 1000.0,
            max_frame_ms: max as f64 / 1000.0,
            samples: self.frame_times_us.len(),
            counts: self.counts,
        }
    }

    /// Clear the window and counts.
    pub fn reset(&mut self) {
        self.frame_times_us.clear();
        self.last_frame = None;
        self.counts = FrameCounts::default();
    }
}
