//! Rectangular bounds and disjoint mutable views of a write buffer
//!
//! A [`RegionMut`] borrows exactly the cells of one rectangle as a set of row
//! slices. Splitting a region consumes it and yields two regions that cannot
//! overlap, so parallel leaves can only ever write inside their own bounds.

use super::relaxation_grid::Cell;
use std::ops::Range;

/// Half-open rectangle of grid rows and columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bounds {
    /// Row (y) range
    pub rows: Range<usize>,
    /// Column (x) range
    pub cols: Range<usize>,
}

impl Bounds {
    /// Create bounds from row and column ranges
    #[must_use]
    pub fn new(rows: Range<usize>, cols: Range<usize>) -> Self {
        Self { rows, cols }
    }

    /// The whole `width` x `height` grid
    #[must_use]
    pub fn full(width: usize, height: usize) -> Self {
        Self::new(0..height, 0..width)
    }

    /// Number of rows
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    #[must_use]
    pub fn col_count(&self) -> usize {
        self.cols.len()
    }

    /// Number of cells
    #[must_use]
    pub fn area(&self) -> usize {
        self.row_count() * self.col_count()
    }

    /// True when the rectangle holds no cells
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    /// True when `(x, y)` lies inside
    #[must_use]
    pub fn contains(&self, x: usize, y: usize) -> bool {
        self.cols.contains(&x) && self.rows.contains(&y)
    }

    /// True when `other` lies entirely inside `self`
    #[must_use]
    pub fn encloses(&self, other: &Bounds) -> bool {
        other.is_empty()
            || (self.rows.start <= other.rows.start
                && other.rows.end <= self.rows.end
                && self.cols.start <= other.cols.start
                && other.cols.end <= self.cols.end)
    }

    /// True when the two rectangles share at least one cell
    #[must_use]
    pub fn overlaps(&self, other: &Bounds) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.rows.start < other.rows.end
            && other.rows.start < self.rows.end
            && self.cols.start < other.cols.end
            && other.cols.start < self.cols.end
    }
}

/// Exclusive view of one rectangle of a row-major cell buffer.
#[derive(Debug)]
pub struct RegionMut<'a> {
    rows: Vec<&'a mut [Cell]>,
    bounds: Bounds,
}

impl<'a> RegionMut<'a> {
    /// View a whole buffer of rows `width` cells wide.
    ///
    /// # Panics
    ///
    /// Panics if `width` is zero or does not divide the buffer length
    #[must_use]
    pub fn whole(buffer: &'a mut [Cell], width: usize) -> Self {
        assert!(
            width > 0 && buffer.len().is_multiple_of(width),
            "buffer of {} cells is not a whole number of {width}-wide rows",
            buffer.len()
        );
        let height = buffer.len() / width;
        Self {
            rows: buffer.chunks_mut(width).collect(),
            bounds: Bounds::full(width, height),
        }
    }

    /// Rectangle covered by this region
    #[must_use]
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Split into the rows above `row` and the rows from `row` down.
    ///
    /// # Panics
    ///
    /// Panics if `row` lies outside the region's row range
    #[must_use]
    pub fn split_rows(self, row: usize) -> (Self, Self) {
        let Bounds { rows, cols } = self.bounds;
        assert!(
            rows.start <= row && row <= rows.end,
            "row split {row} outside region rows {rows:?}"
        );
        let mut top = self.rows;
        let bottom = top.split_off(row - rows.start);
        (
            Self {
                rows: top,
                bounds: Bounds::new(rows.start..row, cols.clone()),
            },
            Self {
                rows: bottom,
                bounds: Bounds::new(row..rows.end, cols),
            },
        )
    }

    /// Split into the columns left of `col` and the columns from `col` rightwards.
    ///
    /// # Panics
    ///
    /// Panics if `col` lies outside the region's column range
    #[must_use]
    pub fn split_cols(self, col: usize) -> (Self, Self) {
        let Bounds { rows, cols } = self.bounds;
        assert!(
            cols.start <= col && col <= cols.end,
            "column split {col} outside region columns {cols:?}"
        );
        let at = col - cols.start;
        let (left, right): (Vec<_>, Vec<_>) =
            self.rows.into_iter().map(|row| row.split_at_mut(at)).unzip();
        (
            Self {
                rows: left,
                bounds: Bounds::new(rows.clone(), cols.start..col),
            },
            Self {
                rows: right,
                bounds: Bounds::new(rows, col..cols.end),
            },
        )
    }

    /// Rows of the region paired with their absolute row index
    pub fn rows_mut(&mut self) -> impl Iterator<Item = (usize, &mut [Cell])> + use<'_, 'a> {
        let first = self.bounds.rows.start;
        self.rows
            .iter_mut()
            .enumerate()
            .map(move |(offset, row)| (first + offset, &mut **row))
    }

    /// Write the cell at absolute coordinates `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the region
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        assert!(
            self.bounds.contains(x, y),
            "write at ({x}, {y}) outside region {:?}",
            self.bounds
        );
        self.rows[y - self.bounds.rows.start][x - self.bounds.cols.start] = cell;
    }
}
