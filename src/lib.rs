//! rover_nav - incremental terrain mapping and navigation planning
//!
//! This crate turns classified ranging hits and detections into a sparse
//! occupancy map, tracks the exploration frontier, plans grid routes with
//! A* and feeds waypoints to an external motion controller.

// Core modules
pub mod common;
pub mod config;

// Algorithm modules
pub mod mapping;
pub mod path_planning;
pub mod path_tracking;
pub mod navigation;
pub mod io;

// Re-export common types for convenience
pub use common::{CellCoord, Path3D, Point3D};
pub use common::{PathPlanner, PathTracker, TerrainSampler};
pub use common::{NavError, NavResult};
pub use config::NavConfig;
pub use io::MapSnapshot;
pub use mapping::{Classification, HitKind, OccupancyMap};
pub use navigation::{NavigationGoal, NavigationSession, Sensing};
pub use path_planning::{AStarPlanner, PlanOutcome};
pub use path_tracking::PathFollower;
