// Mapping module: grid indexing, occupancy classification, frontier
// tracking and scan integration

pub mod grid_index;
pub mod frontier;
pub mod landmarks;
pub mod occupancy_map;
pub mod scan;

pub use grid_index::*;
pub use frontier::*;
pub use landmarks::*;
pub use occupancy_map::*;
pub use scan::*;
