//! Error types for simulation setup
//!
//! Every recoverable failure is a configuration problem detected before the task
//! tree is built. Broken tree or topology invariants are programming errors and
//! panic instead of surfacing here.

use thiserror::Error;

/// Result type for simulation construction.
pub type Result<T> = std::result::Result<T, SimulationError>;

/// A configuration value rejected by [`SimulationConfig::validate`](crate::SimulationConfig::validate).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Grid axis too short for the corner/edge neighbor stencil.
    #[error("grid {axis} must be at least {min} cells, got {value}")]
    GridTooSmall {
        /// `"width"` or `"height"`
        axis: &'static str,
        /// Rejected value
        value: usize,
        /// Smallest accepted value
        min: usize,
    },

    /// A count that must be strictly positive was zero.
    #[error("{name} must be positive, got 0")]
    ZeroParameter {
        /// Parameter name
        name: &'static str,
    },

    /// No heat source was configured.
    #[error("at least one heat source is required")]
    NoHeatSources,

    /// Heat source coordinates outside the grid.
    #[error("heat source at ({x}, {y}) lies outside the {width}x{height} grid")]
    HeatSourceOutOfBounds {
        /// Column
        x: usize,
        /// Row
        y: usize,
        /// Grid width
        width: usize,
        /// Grid height
        height: usize,
    },

    /// Two heat sources share a cell.
    #[error("duplicate heat source at ({x}, {y})")]
    DuplicateHeatSource {
        /// Column
        x: usize,
        /// Row
        y: usize,
    },

    /// NaN or infinite value.
    #[error("{name} must be finite, got {value}")]
    NonFinite {
        /// Parameter name
        name: &'static str,
        /// Rejected value
        value: f64,
    },

    /// Value that must be strictly positive.
    #[error("{name} must be positive, got {value}")]
    NonPositive {
        /// Parameter name
        name: &'static str,
        /// Rejected value
        value: f64,
    },

    /// Value that must not be negative.
    #[error("{name} must not be negative, got {value}")]
    Negative {
        /// Parameter name
        name: &'static str,
        /// Rejected value
        value: f64,
    },

    /// The resolved threshold lies above the resolved ceiling, so the grid-wide
    /// minimum can never reach it.
    #[error("threshold {threshold} is above the ceiling {ceiling} and can never be reached")]
    ThresholdAboveCeiling {
        /// Resolved convergence threshold
        threshold: f64,
        /// Resolved ceiling
        ceiling: f64,
    },
}

/// Errors returned while setting up a [`Simulation`](crate::Simulation).
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Invalid configuration, reported before any tree is built.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The worker pool could not be started.
    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_value() {
        let err = ConfigError::GridTooSmall {
            axis: "width",
            value: 1,
            min: 2,
        };
        assert_eq!(err.to_string(), "grid width must be at least 2 cells, got 1");

        let err = ConfigError::HeatSourceOutOfBounds {
            x: 12,
            y: 3,
            width: 10,
            height: 10,
        };
        assert_eq!(
            err.to_string(),
            "heat source at (12, 3) lies outside the 10x10 grid"
        );
    }

    #[test]
    fn test_config_error_converts_into_simulation_error() {
        let err: SimulationError = ConfigError::NoHeatSources.into();
        assert!(matches!(err, SimulationError::Config(ConfigError::NoHeatSources)));
        assert_eq!(
            err.to_string(),
            "invalid configuration: at least one heat source is required"
        );
    }

    #[test]
    fn test_unreachable_threshold_message() {
        let err = ConfigError::ThresholdAboveCeiling {
            threshold: 990.0,
            ceiling: 500.0,
        };
        assert_eq!(
            err.to_string(),
            "threshold 990 is above the ceiling 500 and can never be reached"
        );
    }
}
