//! Common types used throughout rover_nav

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// 3D world-space point. `y` is the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0 }
    }

    pub fn distance(&self, other: &Point3D) -> f64 {
        (self.to_vector() - other.to_vector()).norm()
    }

    pub fn distance_squared(&self, other: &Point3D) -> f64 {
        (self.to_vector() - other.to_vector()).norm_squared()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }
}

impl From<(f64, f64, f64)> for Point3D {
    fn from(tuple: (f64, f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1, z: tuple.2 }
    }
}

impl From<Vector3<f64>> for Point3D {
    fn from(v: Vector3<f64>) -> Self {
        Self { x: v[0], y: v[1], z: v[2] }
    }
}

/// Integer key of one cubic map cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CellCoord {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Shifted coordinate, or `None` if any axis leaves the i32 range.
    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Option<Self> {
        Some(Self::new(
            self.x.checked_add(dx)?,
            self.y.checked_add(dy)?,
            self.z.checked_add(dz)?,
        ))
    }

    /// The neighbours on the horizontal (x/z) plane in +x, +z, -x, -z
    /// order. Neighbours past the edge of the coordinate range are skipped.
    pub fn planar_neighbors(&self) -> impl Iterator<Item = CellCoord> + '_ {
        [(1, 0), (0, 1), (-1, 0), (0, -1)]
            .into_iter()
            .filter_map(move |(dx, dz)| self.offset(dx, 0, dz))
    }

    /// Squared distance in cell units, saturating at `i64::MAX` for cells
    /// near opposite ends of the coordinate range.
    pub fn distance_squared(&self, other: &CellCoord) -> i64 {
        let (dx, dy, dz) = self.deltas(other);
        dx.saturating_mul(dx)
            .saturating_add(dy.saturating_mul(dy))
            .saturating_add(dz.saturating_mul(dz))
    }

    /// Euclidean distance in cell units.
    pub fn distance(&self, other: &CellCoord) -> f64 {
        let (dx, dy, dz) = self.deltas(other);
        (dx as f64).hypot(dy as f64).hypot(dz as f64)
    }

    /// Chebyshev distance in cell units.
    pub fn chebyshev(&self, other: &CellCoord) -> i64 {
        let (dx, dy, dz) = self.deltas(other);
        dx.abs().max(dy.abs()).max(dz.abs())
    }

    fn deltas(&self, other: &CellCoord) -> (i64, i64, i64) {
        (
            self.x as i64 - other.x as i64,
            self.y as i64 - other.y as i64,
            self.z as i64 - other.z as i64,
        )
    }
}

/// Path represented as a sequence of 3D waypoints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path3D {
    pub points: Vec<Point3D>,
}

impl Path3D {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn from_points(points: Vec<Point3D>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Point3D> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Point3D> {
        self.points.last()
    }

    pub fn total_length(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        self.points.windows(2)
            .map(|w| w[0].distance(&w[1]))
            .sum()
    }
}

impl IntoIterator for Path3D {
    type Item = Point3D;
    type IntoIter = std::vec::IntoIter<Point3D>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}
