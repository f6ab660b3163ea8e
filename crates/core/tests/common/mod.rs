//! Shared helpers for integration tests
#![allow(dead_code)]

use alloy_heat_core::{BufferSide, Grid, HeatSource, SimulationConfig};
use ctor::ctor;
use tracing_subscriber::EnvFilter;

/// Install a test-friendly subscriber once per test binary (`RUST_LOG` controls output).
#[ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// The 10x10 reference plate: 1000 at (0,0), 400 at (9,9), cells at 0.005.
pub fn reference_plate() -> SimulationConfig {
    SimulationConfig::corner_sources(10, 10).with_leaf_threshold(25)
}

/// Heat-source cells of one buffer, as `(x, y, temperature)`.
pub fn sources_in(grid: &Grid, side: BufferSide) -> Vec<(usize, usize, f64)> {
    grid.heat_sources(side)
        .into_iter()
        .map(|(x, y)| (x, y, grid.cell(side, x, y).temperature))
        .collect()
}

/// Configured heat sources in row-major order, as `(x, y, temperature)`.
pub fn expected_sources(config: &SimulationConfig) -> Vec<(usize, usize, f64)> {
    let mut sources: Vec<&HeatSource> = config.heat_sources.iter().collect();
    sources.sort_by_key(|s| (s.y, s.x));
    sources.iter().map(|s| (s.x, s.y, s.temperature)).collect()
}
