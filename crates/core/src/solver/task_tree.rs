//! Static divide-and-conquer task tree
//!
//! The grid's bounding box is split recursively into leaves of at most
//! `leaf_threshold` cells. Nodes live in a flat arena in pre-order, so every
//! subtree occupies a contiguous run of the arena that starts with its root. The
//! scheduler relies on this to hand disjoint `&mut` arena slices to children
//! running in parallel.
//!
//! The shape is fixed at construction; only `local_min` changes between
//! generations.

use crate::grid::Bounds;
use std::ops::Range;

/// Index of a node in the arena
pub type NodeId = usize;

/// One node of the task tree
#[derive(Debug, Clone, PartialEq)]
pub enum TaskNode {
    /// Relaxes every cell of its bounds sequentially
    Leaf {
        /// Cells owned by this leaf
        bounds: Bounds,
        /// Lowest temperature written in the last generation
        local_min: f64,
    },
    /// Two halves of a rectangle split along its longer axis
    Split2 {
        /// Union of the children's bounds
        bounds: Bounds,
        /// First and second half
        children: [NodeId; 2],
        /// Minimum of the children's `local_min`
        local_min: f64,
    },
    /// Four quadrants: top-left, top-right, bottom-left, bottom-right
    Split4 {
        /// Union of the children's bounds
        bounds: Bounds,
        /// Quadrants in fixed order
        children: [NodeId; 4],
        /// Minimum of the children's `local_min`
        local_min: f64,
    },
}

impl TaskNode {
    /// Rectangle covered by this node
    #[must_use]
    pub fn bounds(&self) -> &Bounds {
        match self {
            Self::Leaf { bounds, .. } | Self::Split2 { bounds, .. } | Self::Split4 { bounds, .. } => {
                bounds
            }
        }
    }

    /// Lowest temperature aggregated by this node in the last generation
    #[must_use]
    pub fn local_min(&self) -> f64 {
        match self {
            Self::Leaf { local_min, .. }
            | Self::Split2 { local_min, .. }
            | Self::Split4 { local_min, .. } => *local_min,
        }
    }

    /// Child node ids (empty for a leaf)
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        match self {
            Self::Leaf { .. } => &[],
            Self::Split2 { children, .. } => children.as_slice(),
            Self::Split4 { children, .. } => children.as_slice(),
        }
    }

    /// True for a leaf
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }

    pub(crate) fn set_local_min(&mut self, value: f64) {
        match self {
            Self::Leaf { local_min, .. }
            | Self::Split2 { local_min, .. }
            | Self::Split4 { local_min, .. } => *local_min = value,
        }
    }
}

/// Leaf area that yields roughly one leaf per worker thread.
///
/// # Arguments
///
/// * `width` - Grid width in cells
/// * `height` - Grid height in cells
/// * `parallel_units` - Worker threads (zero is treated as one)
///
/// # Returns
///
/// Positive leaf threshold
#[must_use]
pub fn leaf_threshold_for(width: usize, height: usize, parallel_units: usize) -> usize {
    ((width * height) / parallel_units.max(1)).max(1)
}

/// Task tree stored as a pre-order arena
#[derive(Debug, Clone, PartialEq)]
pub struct TaskTree {
    nodes: Vec<TaskNode>,
    width: usize,
    height: usize,
    leaf_threshold: usize,
    leaf_count: usize,
}

impl TaskTree {
    /// Partition a `width` x `height` grid into a task tree.
    ///
    /// A rectangle becomes a leaf when its area is at most `leaf_threshold`, a
    /// 4-way split when a quadrant would still hold at least `leaf_threshold`
    /// cells, and otherwise a 2-way split along its longer axis (columns on ties).
    ///
    /// # Panics
    ///
    /// Panics if `leaf_threshold` is zero
    #[must_use]
    pub fn build(width: usize, height: usize, leaf_threshold: usize) -> Self {
        assert!(leaf_threshold > 0, "leaf threshold must be positive");
        let mut nodes = Vec::new();
        build_node(&mut nodes, 0..height, 0..width, leaf_threshold);
        let leaf_count = nodes.iter().filter(|n| n.is_leaf()).count();
        Self {
            nodes,
            width,
            height,
            leaf_threshold,
            leaf_count,
        }
    }

    /// Root node
    #[must_use]
    pub fn root(&self) -> &TaskNode {
        &self.nodes[0]
    }

    /// Node by id
    #[must_use]
    pub fn node(&self, id: NodeId) -> &TaskNode {
        &self.nodes[id]
    }

    /// All nodes in pre-order
    #[must_use]
    pub fn nodes(&self) -> &[TaskNode] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [TaskNode] {
        &mut self.nodes
    }

    /// Number of nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Never true: a tree always has a root
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of leaves
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Largest leaf area this tree was built with
    #[must_use]
    pub fn leaf_threshold(&self) -> usize {
        self.leaf_threshold
    }

    /// Grid dimensions as `(width, height)`
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Leaf bounds in pre-order
    pub fn leaves(&self) -> impl Iterator<Item = &Bounds> + '_ {
        self.nodes
            .iter()
            .filter(|n| n.is_leaf())
            .map(TaskNode::bounds)
    }

    /// Global minimum of the last generation
    #[must_use]
    pub fn root_local_min(&self) -> f64 {
        self.root().local_min()
    }

    /// Reset every node before the next generation.
    pub fn rearm(&mut self, ceiling: f64) {
        for node in &mut self.nodes {
            node.set_local_min(ceiling);
        }
    }

    /// Assert that the leaves partition the grid and children nest in parents.
    ///
    /// # Panics
    ///
    /// Panics on a leaf outside the grid, a gap, an overlap, or a child that
    /// escapes its parent
    pub fn verify_partition(&self) {
        let full = Bounds::full(self.width, self.height);
        assert_eq!(
            self.root().bounds(),
            &full,
            "root does not cover the whole grid"
        );

        for (id, node) in self.nodes.iter().enumerate() {
            for &child in node.children() {
                assert!(
                    child > id && child < self.nodes.len(),
                    "node {id} has out-of-order child {child}"
                );
                assert!(
                    node.bounds().encloses(self.nodes[child].bounds()),
                    "child {child} escapes parent {id}"
                );
            }
        }

        let mut coverage = vec![0_u8; self.width * self.height];
        for bounds in self.leaves() {
            assert!(
                full.encloses(bounds),
                "leaf {bounds:?} outside {}x{} grid",
                self.width,
                self.height
            );
            for y in bounds.rows.clone() {
                for x in bounds.cols.clone() {
                    let count = &mut coverage[y * self.width + x];
                    *count += 1;
                    assert!(*count == 1, "leaf bounds overlap at ({x}, {y})");
                }
            }
        }
        if let Some(idx) = coverage.iter().position(|&c| c == 0) {
            panic!(
                "leaf bounds leave a gap at ({}, {})",
                idx % self.width,
                idx / self.width
            );
        }
    }
}

fn build_node(
    nodes: &mut Vec<TaskNode>,
    rows: Range<usize>,
    cols: Range<usize>,
    leaf_threshold: usize,
) -> NodeId {
    let id = nodes.len();
    let bounds = Bounds::new(rows.clone(), cols.clone());
    let local_min = f64::NEG_INFINITY;

    if bounds.area() <= leaf_threshold {
        nodes.push(TaskNode::Leaf { bounds, local_min });
        return id;
    }

    let mid_row = usize::midpoint(rows.start, rows.end);
    let mid_col = usize::midpoint(cols.start, cols.end);
    let quadrant_area = (mid_row - rows.start) * (mid_col - cols.start);

    // Reserve the slot so the node precedes its subtree
    nodes.push(TaskNode::Leaf {
        bounds: bounds.clone(),
        local_min,
    });

    nodes[id] = if quadrant_area >= leaf_threshold {
        let children = [
            build_node(nodes, rows.start..mid_row, cols.start..mid_col, leaf_threshold),
            build_node(nodes, rows.start..mid_row, mid_col..cols.end, leaf_threshold),
            build_node(nodes, mid_row..rows.end, cols.start..mid_col, leaf_threshold),
            build_node(nodes, mid_row..rows.end, mid_col..cols.end, leaf_threshold),
        ];
        TaskNode::Split4 {
            bounds,
            children,
            local_min,
        }
    } else if cols.len() >= rows.len() {
        let children = [
            build_node(nodes, rows.clone(), cols.start..mid_col, leaf_threshold),
            build_node(nodes, rows, mid_col..cols.end, leaf_threshold),
        ];
        TaskNode::Split2 {
            bounds,
            children,
            local_min,
        }
    } else {
        let children = [
            build_node(nodes, rows.start..mid_row, cols.clone(), leaf_threshold),
            build_node(nodes, mid_row..rows.end, cols, leaf_threshold),
        ];
        TaskNode::Split2 {
            bounds,
            children,
            local_min,
        }
    };
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_derivation() {
        assert_eq!(leaf_threshold_for(10, 10, 4), 25);
        assert_eq!(leaf_threshold_for(10, 10, 0), 100);
        assert_eq!(leaf_threshold_for(3, 3, 64), 1);
        assert_eq!(leaf_threshold_for(192, 108, 8), 2592);
    }

    #[test]
    fn test_small_grid_is_single_leaf() {
        let tree = TaskTree::build(4, 3, 12);
        assert_eq!(tree.len(), 1);
        assert!(tree.root().is_leaf());
        assert_eq!(tree.root().bounds(), &Bounds::full(4, 3));
        tree.verify_partition();
    }

    #[test]
    fn test_four_way_split_quadrant_order() {
        let tree = TaskTree::build(10, 10, 25);
        assert!(matches!(tree.root(), TaskNode::Split4 { .. }));
        assert_eq!(tree.root().children(), &[1, 2, 3, 4]);
        assert_eq!(tree.leaf_count(), 4);

        let leaves: Vec<&Bounds> = tree.leaves().collect();
        assert_eq!(leaves[0], &Bounds::new(0..5, 0..5));
        assert_eq!(leaves[1], &Bounds::new(0..5, 5..10));
        assert_eq!(leaves[2], &Bounds::new(5..10, 0..5));
        assert_eq!(leaves[3], &Bounds::new(5..10, 5..10));
        tree.verify_partition();
    }

    #[test]
    fn test_two_way_split_prefers_longer_axis() {
        // 10 columns x 4 rows: quadrants of 2x5 are too small, split columns
        let wide = TaskTree::build(10, 4, 25);
        assert!(matches!(wide.root(), TaskNode::Split2 { .. }));
        let leaves: Vec<&Bounds> = wide.leaves().collect();
        assert_eq!(leaves, vec![&Bounds::new(0..4, 0..5), &Bounds::new(0..4, 5..10)]);

        // 4 columns x 10 rows: split rows
        let tall = TaskTree::build(4, 10, 25);
        let leaves: Vec<&Bounds> = tall.leaves().collect();
        assert_eq!(leaves, vec![&Bounds::new(0..5, 0..4), &Bounds::new(5..10, 0..4)]);
    }

    #[test]
    fn test_subtrees_are_contiguous() {
        let tree = TaskTree::build(37, 23, 7);
        tree.verify_partition();
        for (id, node) in tree.nodes().iter().enumerate() {
            if let Some(&first) = node.children().first() {
                assert_eq!(first, id + 1, "first child must follow its parent");
            }
        }
    }

    #[test]
    fn test_rearm_resets_every_node() {
        let mut tree = TaskTree::build(8, 8, 4);
        assert!(tree.nodes().iter().all(|n| n.local_min() == f64::NEG_INFINITY));
        tree.rearm(42.0);
        assert!(tree.nodes().iter().all(|n| n.local_min() == 42.0));
        assert_eq!(tree.root_local_min(), 42.0);
    }

    #[test]
    fn test_rebuild_is_identical() {
        assert_eq!(TaskTree::build(31, 17, 9), TaskTree::build(31, 17, 9));
    }

    #[test]
    #[should_panic(expected = "overlap")]
    fn test_overlapping_leaves_rejected() {
        let tree = TaskTree {
            nodes: vec![
                TaskNode::Split2 {
                    bounds: Bounds::full(4, 4),
                    children: [1, 2],
                    local_min: 0.0,
                },
                TaskNode::Leaf {
                    bounds: Bounds::new(0..4, 0..3),
                    local_min: 0.0,
                },
                TaskNode::Leaf {
                    bounds: Bounds::new(0..4, 2..4),
                    local_min: 0.0,
                },
            ],
            width: 4,
            height: 4,
            leaf_threshold: 12,
            leaf_count: 2,
        };
        tree.verify_partition();
    }

    #[test]
    #[should_panic(expected = "gap")]
    fn test_gap_rejected() {
        let tree = TaskTree {
            nodes: vec![
                TaskNode::Split2 {
                    bounds: Bounds::full(4, 4),
                    children: [1, 2],
                    local_min: 0.0,
                },
                TaskNode::Leaf {
                    bounds: Bounds::new(0..4, 0..1),
                    local_min: 0.0,
                },
                TaskNode::Leaf {
                    bounds: Bounds::new(0..4, 2..4),
                    local_min: 0.0,
                },
            ],
            width: 4,
            height: 4,
            leaf_threshold: 8,
            leaf_count: 2,
        };
        tree.verify_partition();
    }
}
