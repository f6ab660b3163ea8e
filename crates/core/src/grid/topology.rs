//! Neighbor topology
//!
//! Every cell is classified as a corner (3 neighbors), an edge (5 neighbors) or an
//! interior cell (8 neighbors). Neighbors come back in a fixed order so that the
//! floating-point sums in the stencil kernel are reproducible:
//!
//! - corners list the two axis-adjacent cells, then the diagonal toward the interior
//! - edges list the cell behind along the boundary, the three cells one step
//!   inward, then the cell ahead along the boundary
//! - interior cells walk the Moore neighborhood starting at `(x-1, y+1)`
//!
//! Grids must be at least 2x2.

/// Where a cell sits on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    /// On two boundaries
    Corner,
    /// On exactly one boundary
    Edge,
    /// On no boundary
    Interior,
}

impl Placement {
    /// Number of neighbors a cell with this placement has
    #[must_use]
    pub const fn neighbor_count(self) -> usize {
        match self {
            Self::Corner => 3,
            Self::Edge => 5,
            Self::Interior => 8,
        }
    }
}

/// Classify `(x, y)` on a `width` x `height` grid
#[must_use]
pub fn classify(x: usize, y: usize, width: usize, height: usize) -> Placement {
    let on_x_boundary = x == 0 || x == width - 1;
    let on_y_boundary = y == 0 || y == height - 1;
    match (on_x_boundary, on_y_boundary) {
        (true, true) => Placement::Corner,
        (true, false) | (false, true) => Placement::Edge,
        (false, false) => Placement::Interior,
    }
}

/// Up to eight neighbor coordinates, stored inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbors {
    coords: [(usize, usize); 8],
    len: usize,
}

impl Neighbors {
    fn from_slice(coords: &[(usize, usize)]) -> Self {
        let mut out = Self {
            coords: [(0, 0); 8],
            len: coords.len(),
        };
        out.coords[..coords.len()].copy_from_slice(coords);
        out
    }

    /// Neighbor coordinates in stencil order
    #[must_use]
    pub fn as_slice(&self) -> &[(usize, usize)] {
        &self.coords[..self.len]
    }

    /// Number of neighbors
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Never true for a grid of at least 2x2
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate neighbor coordinates in stencil order
    pub fn iter(&self) -> std::slice::Iter<'_, (usize, usize)> {
        self.as_slice().iter()
    }
}

impl<'a> IntoIterator for &'a Neighbors {
    type Item = &'a (usize, usize);
    type IntoIter = std::slice::Iter<'a, (usize, usize)>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Neighbors of `(x, y)` on a `width` x `height` grid, in stencil order.
#[must_use]
pub fn neighbors(x: usize, y: usize, width: usize, height: usize) -> Neighbors {
    debug_assert!(width >= 2 && height >= 2, "grid must be at least 2x2");
    debug_assert!(x < width && y < height, "({x}, {y}) outside grid");

    let max_x = width - 1;
    let max_y = height - 1;

    match classify(x, y, width, height) {
        Placement::Corner => match (x == 0, y == 0) {
            (true, true) => Neighbors::from_slice(&[(0, 1), (1, 0), (1, 1)]),
            (true, false) => {
                Neighbors::from_slice(&[(0, max_y - 1), (1, max_y), (1, max_y - 1)])
            }
            (false, true) => {
                Neighbors::from_slice(&[(max_x, 1), (max_x - 1, 0), (max_x - 1, 1)])
            }
            (false, false) => Neighbors::from_slice(&[
                (max_x, max_y - 1),
                (max_x - 1, max_y),
                (max_x - 1, max_y - 1),
            ]),
        },
        Placement::Edge => {
            if x == 0 {
                Neighbors::from_slice(&[(0, y - 1), (1, y - 1), (1, y), (1, y + 1), (0, y + 1)])
            } else if x == max_x {
                Neighbors::from_slice(&[
                    (max_x, y + 1),
                    (max_x - 1, y + 1),
                    (max_x - 1, y),
                    (max_x - 1, y - 1),
                    (max_x, y - 1),
                ])
            } else if y == 0 {
                Neighbors::from_slice(&[(x - 1, 0), (x - 1, 1), (x, 1), (x + 1, 1), (x + 1, 0)])
            } else {
                Neighbors::from_slice(&[
                    (x + 1, max_y),
                    (x + 1, max_y - 1),
                    (x, max_y - 1),
                    (x - 1, max_y - 1),
                    (x - 1, max_y),
                ])
            }
        }
        Placement::Interior => Neighbors::from_slice(&[
            (x - 1, y + 1),
            (x - 1, y),
            (x - 1, y - 1),
            (x, y - 1),
            (x + 1, y - 1),
            (x + 1, y),
            (x + 1, y + 1),
            (x, y + 1),
        ]),
    }
}
