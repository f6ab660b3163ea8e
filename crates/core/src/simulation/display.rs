//! Best-effort grid snapshots for display consumers
//!
//! The driver publishes a [`GridSnapshot`] after each generation into a bounded
//! channel. When the consumer falls behind, the oldest queued frame is evicted so
//! the newest always lands and the relaxation loop never blocks on the display.

use crate::grid::{BufferSide, Grid};
use crossbeam_channel::{bounded, Receiver, RecvError, Sender, TryRecvError, TrySendError};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Copy of one buffer taken at a generation boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSnapshot {
    /// Generation that wrote this buffer (1 for the first)
    pub generation: u64,
    /// Grid width
    pub width: usize,
    /// Grid height
    pub height: usize,
    /// Row-major temperatures
    pub temperatures: Vec<f64>,
    /// Row-major heat-source flags
    pub heat_sources: Vec<bool>,
}

impl GridSnapshot {
    /// Capture one side of the grid.
    #[must_use]
    pub fn capture(grid: &Grid, side: BufferSide, generation: u64) -> Self {
        let cells = grid.buffer(side);
        Self {
            generation,
            width: grid.width(),
            height: grid.height(),
            temperatures: cells.iter().map(|c| c.temperature).collect(),
            heat_sources: cells.iter().map(|c| c.is_heat_source).collect(),
        }
    }

    /// Temperature at `(x, y)`, `None` outside the grid
    #[must_use]
    pub fn temperature_at(&self, x: usize, y: usize) -> Option<f64> {
        (x < self.width && y < self.height).then(|| self.temperatures[y * self.width + x])
    }

    /// Whether `(x, y)` is a heat source, `false` outside the grid
    #[must_use]
    pub fn is_heat_source(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.heat_sources[y * self.width + x]
    }

    /// Lowest temperature
    #[must_use]
    pub fn min(&self) -> f64 {
        self.temperatures.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Highest temperature
    #[must_use]
    pub fn max(&self) -> f64 {
        self.temperatures
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Mean temperature, zero for an empty snapshot
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.temperatures.is_empty() {
            return 0.0;
        }
        self.temperatures.iter().sum::<f64>() / self.temperatures.len() as f64
    }
}

/// Result of one [`SnapshotPublisher::publish`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStatus {
    /// Queued without displacing anything
    Delivered,
    /// Queued after evicting the oldest frame
    Replaced,
    /// The receiver has gone away
    Closed,
}

/// Create a display channel holding at most `capacity` frames (minimum 1).
#[must_use]
pub fn display_channel(capacity: usize) -> (SnapshotPublisher, SnapshotReceiver) {
    let (tx, rx) = bounded(capacity.max(1));
    let alive = Arc::new(AtomicBool::new(true));
    let publisher = SnapshotPublisher {
        tx,
        evict: rx.clone(),
        alive: Arc::clone(&alive),
        dropped: AtomicU64::new(0),
    };
    (publisher, SnapshotReceiver { rx, alive })
}

/// Sending half, owned by the driver
#[derive(Debug)]
pub struct SnapshotPublisher {
    tx: Sender<GridSnapshot>,
    // Receiver clone used only to evict the oldest frame when full
    evict: Receiver<GridSnapshot>,
    alive: Arc<AtomicBool>,
    dropped: AtomicU64,
}

impl SnapshotPublisher {
    /// True while the consumer holds its receiver
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Frames evicted so far because the consumer fell behind
    #[must_use]
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Queue a snapshot without blocking, evicting the oldest frame if full.
    pub fn publish(&self, snapshot: GridSnapshot) -> PublishStatus {
        if !self.is_connected() {
            return PublishStatus::Closed;
        }

        let mut pending = snapshot;
        let mut replaced = false;
        loop {
            match self.tx.try_send(pending) {
                Ok(()) => {
                    return if replaced {
                        PublishStatus::Replaced
                    } else {
                        PublishStatus::Delivered
                    };
                }
                Err(TrySendError::Full(back)) => {
                    pending = back;
                    if self.evict.try_recv().is_ok() {
                        self.dropped.fetch_add(1, Ordering::Relaxed);
                        replaced = true;
                    }
                }
                Err(TrySendError::Disconnected(_)) => {
                    debug!("Display channel disconnected");
                    return PublishStatus::Closed;
                }
            }
        }
    }
}

/// Receiving half, owned by the display consumer
#[derive(Debug)]
pub struct SnapshotReceiver {
    rx: Receiver<GridSnapshot>,
    alive: Arc<AtomicBool>,
}

impl SnapshotReceiver {
    /// Block until the next snapshot; errors once the publisher is dropped and drained.
    ///
    /// # Errors
    ///
    /// Returns [`RecvError`] when no more snapshots can arrive
    pub fn recv(&self) -> Result<GridSnapshot, RecvError> {
        self.rx.recv()
    }

    /// Take a queued snapshot if there is one.
    ///
    /// # Errors
    ///
    /// Returns [`TryRecvError`] when the queue is empty or disconnected
    pub fn try_recv(&self) -> Result<GridSnapshot, TryRecvError> {
        self.rx.try_recv()
    }

    /// Drain the queue and keep only the newest snapshot
    #[must_use]
    pub fn latest(&self) -> Option<GridSnapshot> {
        self.rx.try_iter().last()
    }
}

impl Drop for SnapshotReceiver {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(generation: u64) -> GridSnapshot {
        GridSnapshot {
            generation,
            width: 2,
            height: 2,
            temperatures: vec![1.0, 2.0, 3.0, 6.0],
            heat_sources: vec![true, false, false, false],
        }
    }

    #[test]
    fn test_snapshot_statistics() {
        let snap = frame(1);
        assert_eq!(snap.min(), 1.0);
        assert_eq!(snap.max(), 6.0);
        assert_eq!(snap.mean(), 3.0);
        assert_eq!(snap.temperature_at(1, 1), Some(6.0));
        assert_eq!(snap.temperature_at(2, 0), None);
        assert!(snap.is_heat_source(0, 0));
        assert!(!snap.is_heat_source(1, 0));
        assert!(!snap.is_heat_source(5, 5));
    }

    #[test]
    fn test_capture_copies_requested_buffer() {
        let mut grid = Grid::uniform(3, 2, 0.5);
        grid.set_heat_source(2, 1, 7.0);
        let snap = GridSnapshot::capture(&grid, BufferSide::B, 4);
        assert_eq!(snap.generation, 4);
        assert_eq!((snap.width, snap.height), (3, 2));
        assert_eq!(snap.temperature_at(2, 1), Some(7.0));
        assert!(snap.is_heat_source(2, 1));
        assert_eq!(snap.heat_sources.iter().filter(|&&h| h).count(), 1);
    }

    #[test]
    fn test_full_channel_keeps_newest() {
        let (publisher, receiver) = display_channel(2);
        assert_eq!(publisher.publish(frame(1)), PublishStatus::Delivered);
        assert_eq!(publisher.publish(frame(2)), PublishStatus::Delivered);
        assert_eq!(publisher.publish(frame(3)), PublishStatus::Replaced);
        assert_eq!(publisher.dropped_frames(), 1);

        assert_eq!(receiver.try_recv().map(|s| s.generation), Ok(2));
        assert_eq!(receiver.latest().map(|s| s.generation), Some(3));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let (publisher, receiver) = display_channel(0);
        assert_eq!(publisher.publish(frame(1)), PublishStatus::Delivered);
        assert_eq!(publisher.publish(frame(2)), PublishStatus::Replaced);
        assert_eq!(receiver.recv().map(|s| s.generation), Ok(2));
    }

    #[test]
    fn test_dropped_receiver_closes_channel() {
        let (publisher, receiver) = display_channel(1);
        assert!(publisher.is_connected());
        drop(receiver);
        assert!(!publisher.is_connected());
        assert_eq!(publisher.publish(frame(1)), PublishStatus::Closed);
    }
}
