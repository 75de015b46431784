//! Common traits at the seams between mapping, planning and the
//! collaborators that feed or consume them

use crate::common::types::*;

/// Trait for path planning algorithms.
///
/// An empty path is a normal outcome meaning "no route currently known".
pub trait PathPlanner {
    /// Plan a path from start to goal
    fn plan(&self, start: Point3D, goal: Point3D) -> Path3D;
}

/// Trait for path tracking/following algorithms
pub trait PathTracker {
    /// Next point to steer toward from `position`, or `None` when the
    /// path is exhausted
    fn next_waypoint(&mut self, position: Point3D) -> Option<Point3D>;

    /// Replace the tracked path
    fn set_path(&mut self, path: Path3D);
}

/// Ground-height queries supplied by the terrain layer.
///
/// Used by the scan step to learn flat traversable surface around the
/// agent even without any ranging hit nearby.
pub trait TerrainSampler {
    /// Surface height at horizontal position `(x, z)`, or `None` when the
    /// position lies outside the terrain.
    fn ground_height(&self, x: f64, z: f64) -> Option<f64>;
}

impl<F> TerrainSampler for F
where
    F: Fn(f64, f64) -> Option<f64>,
{
    fn ground_height(&self, x: f64, z: f64) -> Option<f64> {
        self(x, z)
    }
}
