//! Grid storage, write regions and neighbor topology

pub mod region;
pub mod relaxation_grid;
pub mod topology;

// Re-export main types
pub use region::{Bounds, RegionMut};
pub use relaxation_grid::{BufferSide, Cell, Grid};
pub use topology::{classify, neighbors, Neighbors, Placement};
