//! Stencil kernel
//!
//! The next temperature of a cell is a per-metal weighted mean of its neighbors:
//!
//! ```text
//! T' = Σ_m constant_m · (Σ_n T_n · ratio_m) / N
//! ```
//!
//! With [`KernelPolicy::Clamped`] the result is additionally capped at the hottest
//! neighbor, since an alloy gain above 1.0 would otherwise let a cell grow hotter
//! than everything around it.

use crate::config::{Alloy, KernelPolicy, SimulationConfig};

/// Pure function from neighbor temperatures to a cell's next temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StencilKernel {
    alloy: Alloy,
    policy: KernelPolicy,
}

impl StencilKernel {
    /// Create a kernel for an alloy and policy
    #[must_use]
    pub const fn new(alloy: Alloy, policy: KernelPolicy) -> Self {
        Self { alloy, policy }
    }

    /// Kernel described by a configuration
    #[must_use]
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.alloy, config.kernel)
    }

    /// Alloy this kernel averages with
    #[must_use]
    pub fn alloy(&self) -> &Alloy {
        &self.alloy
    }

    /// Clamp policy
    #[must_use]
    pub fn policy(&self) -> KernelPolicy {
        self.policy
    }

    /// Compute the next temperature from neighbor temperatures in stencil order.
    ///
    /// # Arguments
    ///
    /// * `neighbor_temps` - 3, 5 or 8 temperatures as produced by the topology
    ///
    /// # Returns
    ///
    /// The new temperature of the cell
    #[must_use]
    pub fn next_temperature(&self, neighbor_temps: &[f64]) -> f64 {
        debug_assert!(!neighbor_temps.is_empty(), "cell without neighbors");
        let count = neighbor_temps.len() as f64;

        let raw: f64 = self
            .alloy
            .metals
            .iter()
            .map(|metal| {
                let weighted: f64 = neighbor_temps.iter().map(|t| t * metal.ratio).sum();
                metal.constant * weighted / count
            })
            .sum();

        match self.policy {
            KernelPolicy::Unclamped => raw,
            KernelPolicy::Clamped => {
                let hottest = neighbor_temps
                    .iter()
                    .copied()
                    .fold(f64::NEG_INFINITY, f64::max);
                raw.min(hottest)
            }
        }
    }
}
