//! Double-buffered cell grid
//!
//! The grid holds two same-shaped buffers. In every generation one buffer is read
//! and the other written; the [`BufferSide`] naming the read buffer is owned by the
//! driver and flipped once per generation. Heat-source cells are seeded into both
//! buffers and copied forward by every leaf, so swapping roles never loses them.

use super::region::RegionMut;
use crate::config::SimulationConfig;
use serde::{Deserialize, Serialize};

/// One grid cell
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cell {
    /// Current temperature
    pub temperature: f64,
    /// Fixed-temperature boundary condition
    pub is_heat_source: bool,
}

impl Cell {
    /// Ordinary cell at the given temperature
    #[must_use]
    pub const fn new(temperature: f64) -> Self {
        Self {
            temperature,
            is_heat_source: false,
        }
    }

    /// Heat-source cell pinned at the given temperature
    #[must_use]
    pub const fn heat_source(temperature: f64) -> Self {
        Self {
            temperature,
            is_heat_source: true,
        }
    }
}

/// Names one of the two grid buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferSide {
    /// `buffer_a`
    #[default]
    A,
    /// `buffer_b`
    B,
}

impl BufferSide {
    /// The other buffer
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// Read buffer of a zero-based generation: A on even generations, B on odd ones.
    #[must_use]
    pub const fn for_generation(generation: u64) -> Self {
        if generation.is_multiple_of(2) {
            Self::A
        } else {
            Self::B
        }
    }
}

/// Two equally sized row-major cell buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    width: usize,
    height: usize,
    buffer_a: Vec<Cell>,
    buffer_b: Vec<Cell>,
}

impl Grid {
    /// Grid with every cell at `temperature` and no heat sources.
    ///
    /// # Arguments
    ///
    /// * `width` - Columns
    /// * `height` - Rows
    /// * `temperature` - Initial temperature of every cell
    #[must_use]
    pub fn uniform(width: usize, height: usize, temperature: f64) -> Self {
        let buffer = vec![Cell::new(temperature); width * height];
        Self {
            width,
            height,
            buffer_a: buffer.clone(),
            buffer_b: buffer,
        }
    }

    /// Grid seeded from a validated configuration, heat sources in both buffers.
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        let mut grid = Self::uniform(config.width, config.height, config.initial_temperature);
        for source in &config.heat_sources {
            grid.set_heat_source(source.x, source.y, source.temperature);
        }
        grid
    }

    /// Columns
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rows
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Cells per buffer
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer_a.len()
    }

    /// True for a zero-area grid
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer_a.is_empty()
    }

    /// Row-major index of `(x, y)`
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the grid
    #[must_use]
    pub fn index(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.width && y < self.height,
            "Coordinates ({x}, {y}) out of bounds for {}x{} grid",
            self.width,
            self.height
        );
        y * self.width + x
    }

    /// Borrow one buffer
    #[must_use]
    pub fn buffer(&self, side: BufferSide) -> &[Cell] {
        match side {
            BufferSide::A => &self.buffer_a,
            BufferSide::B => &self.buffer_b,
        }
    }

    /// Cell at `(x, y)` in the given buffer
    #[must_use]
    pub fn cell(&self, side: BufferSide, x: usize, y: usize) -> Cell {
        self.buffer(side)[self.index(x, y)]
    }

    /// Split into the read buffer and the write buffer for one generation.
    pub fn split(&mut self, read: BufferSide) -> (&[Cell], &mut [Cell]) {
        match read {
            BufferSide::A => (self.buffer_a.as_slice(), self.buffer_b.as_mut_slice()),
            BufferSide::B => (self.buffer_b.as_slice(), self.buffer_a.as_mut_slice()),
        }
    }

    /// Read buffer plus the whole write buffer as a splittable region.
    pub fn split_region(&mut self, read: BufferSide) -> (&[Cell], RegionMut<'_>) {
        let width = self.width;
        let (src, dst) = self.split(read);
        (src, RegionMut::whole(dst, width))
    }

    /// Pin `(x, y)` at `temperature` in both buffers.
    pub fn set_heat_source(&mut self, x: usize, y: usize, temperature: f64) {
        let idx = self.index(x, y);
        self.buffer_a[idx] = Cell::heat_source(temperature);
        self.buffer_b[idx] = Cell::heat_source(temperature);
    }

    /// Coordinates of every heat-source cell in the given buffer, row-major.
    #[must_use]
    pub fn heat_sources(&self, side: BufferSide) -> Vec<(usize, usize)> {
        self.buffer(side)
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_heat_source)
            .map(|(idx, _)| (idx % self.width, idx / self.width))
            .collect()
    }

    /// True when every heat source appears identically in both buffers.
    #[must_use]
    pub fn heat_sources_consistent(&self) -> bool {
        self.buffer_a
            .iter()
            .zip(&self.buffer_b)
            .filter(|(a, b)| a.is_heat_source || b.is_heat_source)
            .all(|(a, b)| a == b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeatSource;

    #[test]
    fn test_buffer_side_alternates() {
        assert_eq!(BufferSide::A.flipped(), BufferSide::B);
        assert_eq!(BufferSide::B.flipped(), BufferSide::A);
        assert_eq!(BufferSide::for_generation(0), BufferSide::A);
        assert_eq!(BufferSide::for_generation(1), BufferSide::B);
        assert_eq!(BufferSide::for_generation(10), BufferSide::A);
    }

    #[test]
    fn test_new_seeds_sources_into_both_buffers() {
        let config = SimulationConfig::corner_sources(6, 4);
        let grid = Grid::new(&config);

        assert_eq!(grid.len(), 24);
        for side in [BufferSide::A, BufferSide::B] {
            assert_eq!(grid.cell(side, 0, 0), Cell::heat_source(1000.0));
            assert_eq!(grid.cell(side, 5, 3), Cell::heat_source(400.0));
            assert_eq!(grid.cell(side, 2, 2), Cell::new(0.005));
            assert_eq!(grid.heat_sources(side), vec![(0, 0), (5, 3)]);
        }
        assert!(grid.heat_sources_consistent());
    }

    #[test]
    fn test_row_major_indexing() {
        let config = SimulationConfig::corner_sources(5, 3)
            .with_heat_sources(vec![HeatSource::new(3, 1, 7.0)]);
        let grid = Grid::new(&config);
        assert_eq!(grid.index(3, 1), 8);
        assert!(grid.buffer(BufferSide::A)[8].is_heat_source);
    }

    #[test]
    fn test_split_assigns_roles() {
        let mut grid = Grid::uniform(3, 3, 1.0);
        {
            let (read, write) = grid.split(BufferSide::A);
            assert_eq!(read[0].temperature, 1.0);
            write[0].temperature = 2.0;
        }
        assert_eq!(grid.cell(BufferSide::A, 0, 0).temperature, 1.0);
        assert_eq!(grid.cell(BufferSide::B, 0, 0).temperature, 2.0);

        {
            let (read, write) = grid.split(BufferSide::B);
            assert_eq!(read[0].temperature, 2.0);
            write[0].temperature = 3.0;
        }
        assert_eq!(grid.cell(BufferSide::A, 0, 0).temperature, 3.0);
    }

    #[test]
    fn test_inconsistent_heat_source_detected() {
        let mut grid = Grid::uniform(3, 3, 0.0);
        grid.set_heat_source(1, 1, 50.0);
        assert!(grid.heat_sources_consistent());

        let (_, write) = grid.split(BufferSide::A);
        write[4] = Cell::new(0.0);
        assert!(!grid.heat_sources_consistent());
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_index_bounds_check() {
        let grid = Grid::uniform(4, 4, 0.0);
        let _ = grid.index(4, 0);
    }
}
