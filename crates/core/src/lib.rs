//! Alloy Heat Relaxation Core Library
//!
//! Simulates heat spreading through a rectangular alloy plate heated at fixed
//! heat-source cells. Every generation replaces each cell's temperature with a
//! per-metal weighted average of its neighbors (a Jacobi stencil) until every cell
//! reaches a convergence threshold.
//!
//! ## Parallel relaxation
//!
//! - Double-buffered grid with the buffer parity owned by the driver
//! - Static divide-and-conquer task tree, built once and re-armed each generation
//! - Fork/join execution on a fixed rayon worker pool
//! - Best-effort snapshot stream for display consumers
//!
//! ```rust,ignore
//! use alloy_heat_core::{Simulation, SimulationConfig};
//!
//! let config = SimulationConfig::corner_sources(10, 10);
//! let mut sim = Simulation::new(config)?;
//! let outcome = sim.run();
//! ```

pub mod config;
pub mod error;
pub mod grid;
pub mod simulation;
pub mod solver;

// Re-export configuration types
pub use config::{Alloy, HeatSource, KernelPolicy, Metal, SimulationConfig, TemperatureTarget};
pub use error::{ConfigError, Result, SimulationError};

// Re-export grid types
pub use grid::{Bounds, BufferSide, Cell, Grid};

// Re-export driver types
pub use simulation::{
    display_channel, DriverState, GridSnapshot, Outcome, PublishStatus, Simulation,
    SnapshotPublisher, SnapshotReceiver,
};
pub use solver::{GenerationTimer, StencilKernel, TaskTree};
