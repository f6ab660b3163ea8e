/// Timing helpers for relaxation generations.
///
/// Provides an RAII scope that traces its lifetime and a running per-generation timer.
use std::time::{Duration, Instant};
use tracing::trace;

/// A profiling scope that measures elapsed time using RAII.
///
/// The elapsed time is emitted at `trace` level when dropped.
pub struct ProfilerScope {
    start: Instant,
    name: &'static str,
}

impl ProfilerScope {
    /// Creates a new profiling scope.
    pub fn new(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
        }
    }

    /// Time since the scope opened.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Gets elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for ProfilerScope {
    fn drop(&mut self) {
        trace!(scope = self.name, elapsed_ms = self.elapsed_ms(), "Scope closed");
    }
}

/// Running wall-clock statistics over completed generations.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationTimer {
    last_ms: f64,
    total_ms: f64,
    generations: u64,
}

impl GenerationTimer {
    /// Creates an empty timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one generation's duration.
    pub fn record(&mut self, elapsed: Duration) {
        let ms = elapsed.as_secs_f64() * 1000.0;
        self.last_ms = ms;
        self.total_ms += ms;
        self.generations += 1;
    }

    /// Duration of the most recent generation.
    pub fn last_ms(&self) -> f64 {
        self.last_ms
    }

    /// Summed duration of every recorded generation.
    pub fn total_ms(&self) -> f64 {
        self.total_ms
    }

    /// Mean generation duration, zero before the first record.
    pub fn mean_ms(&self) -> f64 {
        if self.generations == 0 {
            0.0
        } else {
            self.total_ms / self.generations as f64
        }
    }

    /// Number of recorded generations.
    pub fn generations(&self) -> u64 {
        self.generations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::thread;

    #[test]
    fn test_profiler_scope_measures_time() {
        let scope = ProfilerScope::new("test");
        thread::sleep(Duration::from_millis(10));
        let elapsed = scope.elapsed_ms();
        assert!(elapsed >= 10.0, "Expected at least 10ms, got {elapsed}");
    }

    #[test]
    fn test_generation_timer() {
        let mut timer = GenerationTimer::new();
        assert_eq!(timer.mean_ms(), 0.0);
        assert_eq!(timer.generations(), 0);

        timer.record(Duration::from_millis(4));
        timer.record(Duration::from_millis(8));
        assert_eq!(timer.generations(), 2);
        assert_relative_eq!(timer.last_ms(), 8.0, epsilon = 1e-9);
        assert_relative_eq!(timer.total_ms(), 12.0, epsilon = 1e-9);
        assert_relative_eq!(timer.mean_ms(), 6.0, epsilon = 1e-9);
    }
}
