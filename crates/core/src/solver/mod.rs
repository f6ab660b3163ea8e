//! Parallel relaxation solver
//!
//! One generation of the Jacobi relaxation is computed by walking a static
//! divide-and-conquer [`TaskTree`] on a fixed rayon pool owned by the
//! [`Scheduler`]. Leaves apply the [`StencilKernel`] to every cell they own and
//! report the lowest temperature they wrote; the minima are folded up the tree so
//! the root holds the grid-wide minimum once the generation joins.
//!
//! # Example
//!
//! ```rust,ignore
//! use alloy_heat_core::solver::{build_task_tree, Scheduler, StencilKernel};
//! use alloy_heat_core::{Grid, SimulationConfig, BufferSide};
//!
//! let config = SimulationConfig::corner_sources(10, 10);
//! let mut grid = Grid::new(&config);
//! let mut tree = build_task_tree(&config);
//! let scheduler = Scheduler::new(config.parallel_units())?;
//! let kernel = StencilKernel::from_config(&config);
//! let min = scheduler.run_generation(&mut tree, &mut grid, BufferSide::A, &kernel, 990.0);
//! ```

mod kernel;
mod leaf;
pub mod profiler;
mod scheduler;
mod task_tree;

// Re-exports
pub use kernel::StencilKernel;
pub use leaf::{relax_leaf, LeafContext};
pub use profiler::{GenerationTimer, ProfilerScope};
pub use scheduler::Scheduler;
pub use task_tree::{leaf_threshold_for, NodeId, TaskNode, TaskTree};

use crate::config::SimulationConfig;
use tracing::info;

/// Partition the configured grid into a task tree.
///
/// The leaf threshold is taken from the configuration, or derived from the
/// number of worker threads when unset.
///
/// # Arguments
///
/// * `config` - Validated simulation configuration
///
/// # Returns
///
/// A task tree whose leaves cover the grid exactly once
///
/// # Panics
///
/// In debug builds, panics if the leaves overlap or leave a gap
pub fn build_task_tree(config: &SimulationConfig) -> TaskTree {
    let threshold = config.effective_leaf_threshold();
    let tree = TaskTree::build(config.width, config.height, threshold);
    if cfg!(debug_assertions) {
        tree.verify_partition();
    }
    info!(
        "Partitioned {}x{} grid into {} leaves ({} nodes, leaf threshold {})",
        config.width,
        config.height,
        tree.leaf_count(),
        tree.len(),
        threshold
    );
    tree
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_built_trees_cover_configured_grid() {
        for (width, height, threads) in [(10, 10, 4), (192, 108, 8), (3, 7, 16), (2, 2, 1)] {
            let config = SimulationConfig::corner_sources(width, height).with_parallelism(threads);
            let tree = build_task_tree(&config);
            assert_eq!(tree.dimensions(), (width, height));
            assert_eq!(tree.leaf_threshold(), config.effective_leaf_threshold());
            assert_eq!(
                tree.leaves().map(crate::grid::Bounds::area).sum::<usize>(),
                width * height
            );
        }
    }
}
