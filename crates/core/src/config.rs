//! Simulation configuration
//!
//! A single immutable [`SimulationConfig`] value describes a run: grid size, heat
//! sources, alloy composition and the policies that govern the stencil kernel and
//! convergence. Every component receives what it needs from this value at
//! construction; nothing reads ambient state.

use crate::error::ConfigError;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Smallest grid axis for which every cell has a corner, edge or interior stencil.
pub const MIN_GRID_DIMENSION: usize = 2;

/// Starting temperature of every non-source cell in the corner-source preset.
pub const DEFAULT_INITIAL_TEMPERATURE: f64 = 0.005;

/// Temperature of the hot corner in the corner-source preset.
pub const HOT_CORNER_TEMPERATURE: f64 = 1000.0;

/// Temperature of the cool corner in the corner-source preset.
pub const COOL_CORNER_TEMPERATURE: f64 = 400.0;

/// Default safety bound on the number of generations.
pub const DEFAULT_MAX_GENERATIONS: u64 = 100_000;

/// One metal of the alloy: its share of every cell and its thermal constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metal {
    /// Fraction of the cell made of this metal
    pub ratio: f64,
    /// Thermal constant scaling this metal's contribution
    pub constant: f64,
}

impl Metal {
    /// Create a metal entry
    #[must_use]
    pub const fn new(ratio: f64, constant: f64) -> Self {
        Self { ratio, constant }
    }
}

/// Three-metal alloy shared by every cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Alloy {
    /// The three metals
    pub metals: [Metal; 3],
}

impl Alloy {
    /// Create an alloy from three metals
    #[must_use]
    pub const fn new(metals: [Metal; 3]) -> Self {
        Self { metals }
    }

    /// 33% / 30% / 37% with thermal constants 0.75 / 1.0 / 1.25.
    #[must_use]
    pub const fn standard() -> Self {
        Self::new([
            Metal::new(0.33, 0.75),
            Metal::new(0.30, 1.0),
            Metal::new(0.37, 1.25),
        ])
    }

    /// 33% / 33% / 34% with thermal constants 0.75 / 1.0 / 1.25.
    #[must_use]
    pub const fn balanced() -> Self {
        Self::new([
            Metal::new(0.33, 0.75),
            Metal::new(0.33, 1.0),
            Metal::new(0.34, 1.25),
        ])
    }

    /// Sum of the three ratios (should be close to 1.0)
    #[must_use]
    pub fn ratio_sum(&self) -> f64 {
        self.metals.iter().map(|m| m.ratio).sum()
    }

    /// Factor applied to the neighbor mean by the unclamped kernel.
    ///
    /// Values above 1.0 let a cell overshoot its neighbors, which is what the
    /// clamped kernel policy guards against.
    #[must_use]
    pub fn gain(&self) -> f64 {
        self.metals.iter().map(|m| m.ratio * m.constant).sum()
    }
}

impl Default for Alloy {
    fn default() -> Self {
        Self::standard()
    }
}

/// How the stencil kernel treats a result hotter than every neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelPolicy {
    /// Never exceed the hottest neighbor
    #[default]
    Clamped,
    /// Return the raw weighted average
    Unclamped,
}

/// A temperature derived from the configured heat sources.
///
/// Used both for the convergence ceiling (cells at or above it stop updating) and
/// for the convergence threshold (the global minimum that ends the run).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureTarget {
    /// Fraction of the hottest heat source
    FractionOfHottest(f64),
    /// Arithmetic mean of all heat sources
    MeanOfSources,
    /// The given red-hot temperature, capped at the hottest heat source
    CappedAtHottest(f64),
    /// An absolute temperature
    Fixed(f64),
}

impl TemperatureTarget {
    /// Resolve the target against the heat sources of a run.
    ///
    /// # Arguments
    ///
    /// * `sources` - Heat sources of the run (non-empty for a validated config)
    ///
    /// # Returns
    ///
    /// The absolute temperature this target denotes
    #[must_use]
    pub fn resolve(&self, sources: &[HeatSource]) -> f64 {
        let hottest = sources
            .iter()
            .map(|s| s.temperature)
            .fold(f64::NEG_INFINITY, f64::max);

        match *self {
            Self::FractionOfHottest(fraction) => hottest * fraction,
            Self::MeanOfSources => {
                sources.iter().map(|s| s.temperature).sum::<f64>() / sources.len() as f64
            }
            Self::CappedAtHottest(red_hot) => red_hot.min(hottest),
            Self::Fixed(temperature) => temperature,
        }
    }

    fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        let value = match *self {
            Self::MeanOfSources => return Ok(()),
            Self::FractionOfHottest(v) | Self::CappedAtHottest(v) | Self::Fixed(v) => v,
        };
        if !value.is_finite() {
            return Err(ConfigError::NonFinite { name, value });
        }
        if value <= 0.0 {
            return Err(ConfigError::NonPositive { name, value });
        }
        Ok(())
    }
}

/// A cell pinned at a fixed temperature for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatSource {
    /// Column
    pub x: usize,
    /// Row
    pub y: usize,
    /// Fixed temperature
    pub temperature: f64,
}

impl HeatSource {
    /// Create a heat source
    #[must_use]
    pub const fn new(x: usize, y: usize, temperature: f64) -> Self {
        Self { x, y, temperature }
    }
}

/// Complete description of a relaxation run.
///
/// When deserialized without `heat_sources`, the corner sources are placed on
/// the deserialized grid rather than the default 192x108 one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConfigFile")]
pub struct SimulationConfig {
    /// Grid width in cells (columns)
    pub width: usize,
    /// Grid height in cells (rows)
    pub height: usize,
    /// Fixed-temperature cells
    pub heat_sources: Vec<HeatSource>,
    /// Starting temperature of every other cell
    pub initial_temperature: f64,
    /// Alloy shared by every cell
    pub alloy: Alloy,
    /// Stencil kernel policy
    pub kernel: KernelPolicy,
    /// Temperature at which a cell stops being recomputed
    pub ceiling: TemperatureTarget,
    /// Global minimum that ends the run
    pub threshold: TemperatureTarget,
    /// Worker threads; `None` uses every available hardware thread
    pub parallelism: Option<usize>,
    /// Largest leaf area; `None` derives one leaf per worker thread
    pub leaf_threshold: Option<usize>,
    /// Safety bound on generations; `None` runs until convergence
    pub max_generations: Option<u64>,
}

impl SimulationConfig {
    /// Hot source in the top-left corner, cool source in the bottom-right corner.
    ///
    /// Ceiling and threshold both sit at 99% of the hot corner.
    ///
    /// # Arguments
    ///
    /// * `width` - Grid width in cells
    /// * `height` - Grid height in cells
    #[must_use]
    pub fn corner_sources(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            heat_sources: vec![
                HeatSource::new(0, 0, HOT_CORNER_TEMPERATURE),
                HeatSource::new(
                    width.saturating_sub(1),
                    height.saturating_sub(1),
                    COOL_CORNER_TEMPERATURE,
                ),
            ],
            initial_temperature: DEFAULT_INITIAL_TEMPERATURE,
            alloy: Alloy::standard(),
            kernel: KernelPolicy::Clamped,
            ceiling: TemperatureTarget::FractionOfHottest(0.99),
            threshold: TemperatureTarget::FractionOfHottest(0.99),
            parallelism: None,
            leaf_threshold: None,
            max_generations: Some(DEFAULT_MAX_GENERATIONS),
        }
    }

    /// Replace the heat sources
    pub fn with_heat_sources(mut self, heat_sources: Vec<HeatSource>) -> Self {
        self.heat_sources = heat_sources;
        self
    }

    /// Set the starting temperature of non-source cells
    pub fn with_initial_temperature(mut self, temperature: f64) -> Self {
        self.initial_temperature = temperature;
        self
    }

    /// Set the alloy
    pub fn with_alloy(mut self, alloy: Alloy) -> Self {
        self.alloy = alloy;
        self
    }

    /// Set the kernel policy
    pub fn with_kernel(mut self, kernel: KernelPolicy) -> Self {
        self.kernel = kernel;
        self
    }

    /// Set the convergence ceiling
    pub fn with_ceiling(mut self, ceiling: TemperatureTarget) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Set the convergence threshold
    pub fn with_threshold(mut self, threshold: TemperatureTarget) -> Self {
        self.threshold = threshold;
        self
    }

    /// Fix the number of worker threads
    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }

    /// Fix the largest leaf area
    pub fn with_leaf_threshold(mut self, leaf_threshold: usize) -> Self {
        self.leaf_threshold = Some(leaf_threshold);
        self
    }

    /// Set or remove the generation bound
    pub fn with_max_generations(mut self, max_generations: Option<u64>) -> Self {
        self.max_generations = max_generations;
        self
    }

    /// Check the configuration before anything is allocated.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (axis, value) in [("width", self.width), ("height", self.height)] {
            if value < MIN_GRID_DIMENSION {
                return Err(ConfigError::GridTooSmall {
                    axis,
                    value,
                    min: MIN_GRID_DIMENSION,
                });
            }
        }

        if self.parallelism == Some(0) {
            return Err(ConfigError::ZeroParameter {
                name: "parallelism",
            });
        }
        if self.leaf_threshold == Some(0) {
            return Err(ConfigError::ZeroParameter {
                name: "leaf_threshold",
            });
        }
        if self.max_generations == Some(0) {
            return Err(ConfigError::ZeroParameter {
                name: "max_generations",
            });
        }

        if self.heat_sources.is_empty() {
            return Err(ConfigError::NoHeatSources);
        }
        let mut occupied = FxHashSet::default();
        for source in &self.heat_sources {
            if source.x >= self.width || source.y >= self.height {
                return Err(ConfigError::HeatSourceOutOfBounds {
                    x: source.x,
                    y: source.y,
                    width: self.width,
                    height: self.height,
                });
            }
            if !occupied.insert((source.x, source.y)) {
                return Err(ConfigError::DuplicateHeatSource {
                    x: source.x,
                    y: source.y,
                });
            }
            check_finite("heat source temperature", source.temperature)?;
        }

        check_finite("initial_temperature", self.initial_temperature)?;

        for metal in &self.alloy.metals {
            check_finite("metal ratio", metal.ratio)?;
            check_finite("metal constant", metal.constant)?;
            if metal.ratio < 0.0 {
                return Err(ConfigError::Negative {
                    name: "metal ratio",
                    value: metal.ratio,
                });
            }
        }

        self.ceiling.validate("ceiling")?;
        self.threshold.validate("threshold")?;

        // The minimum is seeded at the ceiling and never rises above it
        let (ceiling, threshold) = (self.ceiling_temperature(), self.threshold_temperature());
        if threshold > ceiling {
            return Err(ConfigError::ThresholdAboveCeiling { threshold, ceiling });
        }
        Ok(())
    }

    /// Worker thread count for this run
    #[must_use]
    pub fn parallel_units(&self) -> usize {
        self.parallelism.unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
        })
    }

    /// Leaf area used by the task tree builder
    #[must_use]
    pub fn effective_leaf_threshold(&self) -> usize {
        self.leaf_threshold.unwrap_or_else(|| {
            crate::solver::leaf_threshold_for(self.width, self.height, self.parallel_units())
        })
    }

    /// Resolved convergence ceiling
    #[must_use]
    pub fn ceiling_temperature(&self) -> f64 {
        self.ceiling.resolve(&self.heat_sources)
    }

    /// Resolved convergence threshold
    #[must_use]
    pub fn threshold_temperature(&self) -> f64 {
        self.threshold.resolve(&self.heat_sources)
    }
}

impl Default for SimulationConfig {
    /// A 192x108 grid, one cell per 10x10 pixel block of a 1920x1080 display.
    fn default() -> Self {
        Self::corner_sources(192, 108)
    }
}

/// On-disk form of [`SimulationConfig`]; every field is optional.
#[derive(Deserialize)]
#[serde(default)]
struct ConfigFile {
    width: usize,
    height: usize,
    heat_sources: Option<Vec<HeatSource>>,
    initial_temperature: f64,
    alloy: Alloy,
    kernel: KernelPolicy,
    ceiling: TemperatureTarget,
    threshold: TemperatureTarget,
    parallelism: Option<usize>,
    leaf_threshold: Option<usize>,
    max_generations: Option<u64>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        let defaults = SimulationConfig::default();
        Self {
            width: defaults.width,
            height: defaults.height,
            heat_sources: None,
            initial_temperature: defaults.initial_temperature,
            alloy: defaults.alloy,
            kernel: defaults.kernel,
            ceiling: defaults.ceiling,
            threshold: defaults.threshold,
            parallelism: defaults.parallelism,
            leaf_threshold: defaults.leaf_threshold,
            max_generations: defaults.max_generations,
        }
    }
}

impl From<ConfigFile> for SimulationConfig {
    fn from(file: ConfigFile) -> Self {
        let mut config = Self::corner_sources(file.width, file.height);
        if let Some(heat_sources) = file.heat_sources {
            config.heat_sources = heat_sources;
        }
        Self {
            initial_temperature: file.initial_temperature,
            alloy: file.alloy,
            kernel: file.kernel,
            ceiling: file.ceiling,
            threshold: file.threshold,
            parallelism: file.parallelism,
            leaf_threshold: file.leaf_threshold,
            max_generations: file.max_generations,
            ..config
        }
    }
}

fn check_finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { name, value })
    }
}
