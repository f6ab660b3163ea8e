//! Fork/join execution of the task tree on a fixed worker pool
//!
//! Each generation walks the tree from the root. A 2-way split runs its children
//! with `rayon::join`; a 4-way split spawns three quadrants into a scope and
//! relaxes the first inline. Every child receives its own slice of the node
//! arena and its own [`RegionMut`], so no two tasks can touch the same node or
//! the same write cell. A parent reads its children's minima only after all of
//! them have joined.

use super::kernel::StencilKernel;
use super::leaf::{relax_leaf, LeafContext};
use super::task_tree::{NodeId, TaskNode, TaskTree};
use crate::error::Result;
use crate::grid::{Bounds, BufferSide, Grid, RegionMut};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

/// Worker pool sized once at startup.
#[derive(Debug)]
pub struct Scheduler {
    pool: ThreadPool,
    threads: usize,
}

impl Scheduler {
    /// Build a pool with `threads` workers.
    ///
    /// # Errors
    ///
    /// Returns an error if the operating system refuses to spawn the workers
    pub fn new(threads: usize) -> Result<Self> {
        let threads = threads.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("relax-worker-{i}"))
            .build()?;
        debug!(threads, "Relaxation worker pool ready");
        Ok(Self { pool, threads })
    }

    /// Number of worker threads
    #[must_use]
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run one generation: read `read`, write the other buffer.
    ///
    /// The tree is re-armed with `ceiling` first, so a node's `local_min` afterwards
    /// is the minimum written inside its bounds this generation.
    ///
    /// # Returns
    ///
    /// The root's minimum, i.e. the lowest temperature anywhere on the grid
    pub fn run_generation(
        &self,
        tree: &mut TaskTree,
        grid: &mut Grid,
        read: BufferSide,
        kernel: &StencilKernel,
        ceiling: f64,
    ) -> f64 {
        tree.rearm(ceiling);
        let (width, height) = (grid.width(), grid.height());
        let (src, region) = grid.split_region(read);
        let ctx = LeafContext {
            read: src,
            width,
            height,
            kernel,
            ceiling,
        };

        let nodes = tree.nodes_mut();
        self.pool.install(|| execute(nodes, region, &ctx, 0))
    }
}

/// Relax the subtree rooted at `nodes[0]`, whose absolute id is `id`.
fn execute(
    nodes: &mut [TaskNode],
    mut region: RegionMut<'_>,
    ctx: &LeafContext<'_>,
    id: NodeId,
) -> f64 {
    let (node, descendants) = match nodes.split_first_mut() {
        Some(parts) => parts,
        None => return ctx.ceiling,
    };
    debug_assert_eq!(node.bounds(), region.bounds(), "region does not match node {id}");

    let lowest = match node {
        TaskNode::Leaf { .. } => relax_leaf(&mut region, ctx),
        TaskNode::Split2 { children, .. } => {
            let [a, b] = *children;
            let (first, second) = descendants.split_at_mut(b - id - 1);
            let (first_region, second_region) = split_pair(region, first[0].bounds());

            let (min_a, min_b) = rayon::join(
                || execute(first, first_region, ctx, a),
                || execute(second, second_region, ctx, b),
            );
            min_a.min(min_b)
        }
        TaskNode::Split4 { children, .. } => {
            let [q1, q2, q3, q4] = *children;
            let (sub1, rest) = descendants.split_at_mut(q2 - id - 1);
            let (sub2, rest) = rest.split_at_mut(q3 - q2);
            let (sub3, sub4) = rest.split_at_mut(q4 - q3);

            let q1_bounds = sub1[0].bounds().clone();
            let (top, bottom) = region.split_rows(q1_bounds.rows.end);
            let (r1, r2) = top.split_cols(q1_bounds.cols.end);
            let (r3, r4) = bottom.split_cols(q1_bounds.cols.end);

            let mut m1 = ctx.ceiling;
            rayon::scope(|s| {
                s.spawn(|_| {
                    execute(sub4, r4, ctx, q4);
                });
                s.spawn(|_| {
                    execute(sub3, r3, ctx, q3);
                });
                s.spawn(|_| {
                    execute(sub2, r2, ctx, q2);
                });
                m1 = execute(sub1, r1, ctx, q1);
            });

            // Children stored their minima before the scope joined
            let child_min = |child: NodeId| descendants[child - id - 1].local_min();
            m1.min(child_min(q2)).min(child_min(q3)).min(child_min(q4))
        }
    };

    node.set_local_min(lowest);
    lowest
}

/// Split a region the way a 2-way node split its bounds.
fn split_pair<'a>(region: RegionMut<'a>, first: &Bounds) -> (RegionMut<'a>, RegionMut<'a>) {
    if first.rows == region.bounds().rows {
        region.split_cols(first.cols.end)
    } else {
        region.split_rows(first.rows.end)
    }
}
