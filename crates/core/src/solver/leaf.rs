//! Sequential relaxation of one leaf rectangle

use super::kernel::StencilKernel;
use crate::grid::{neighbors, Cell, RegionMut};

/// Read-only state shared by every leaf of a generation
#[derive(Debug, Clone, Copy)]
pub struct LeafContext<'a> {
    /// Buffer written by the previous generation
    pub read: &'a [Cell],
    /// Grid width
    pub width: usize,
    /// Grid height
    pub height: usize,
    /// Stencil kernel
    pub kernel: &'a StencilKernel,
    /// Cells at or above this temperature are frozen
    pub ceiling: f64,
}

impl LeafContext<'_> {
    fn read_cell(&self, x: usize, y: usize) -> Cell {
        self.read[y * self.width + x]
    }
}

/// Relax every cell of `region` into the write buffer.
///
/// Heat sources and cells already at the ceiling are copied forward unchanged.
/// Every other cell gets the kernel applied to its neighbors' temperatures from
/// the read buffer.
///
/// # Returns
///
/// The lowest recomputed temperature, seeded at the ceiling so a leaf whose cells
/// are all sources or frozen reports the ceiling
pub fn relax_leaf(region: &mut RegionMut<'_>, ctx: &LeafContext<'_>) -> f64 {
    let cols = region.bounds().cols.clone();
    let mut lowest = ctx.ceiling;
    let mut temps = [0.0_f64; 8];

    for (y, row) in region.rows_mut() {
        for (x, out) in cols.clone().zip(row.iter_mut()) {
            let current = ctx.read_cell(x, y);

            if current.is_heat_source || current.temperature >= ctx.ceiling {
                *out = current;
                continue;
            }

            let around = neighbors(x, y, ctx.width, ctx.height);
            for (slot, &(nx, ny)) in temps.iter_mut().zip(&around) {
                *slot = ctx.read_cell(nx, ny).temperature;
            }
            let next = ctx.kernel.next_temperature(&temps[..around.len()]);
            *out = Cell::new(next);
            lowest = lowest.min(next);
        }
    }

    lowest
}
