//! Grid indexing: continuous world position to discrete cell coordinate

use serde::{Deserialize, Serialize};

use crate::common::{CellCoord, NavError, NavResult, Point3D};

/// Grid resolution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Cell edge length in meters
    pub granularity: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { granularity: 1.0 }
    }
}

/// Maps world positions to cubic cells of side `granularity` by per-axis
/// floor division.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridIndex {
    granularity: f64,
}

impl GridIndex {
    /// Fails on a non-positive or non-finite granularity, which would
    /// corrupt every later coordinate computation.
    pub fn new(granularity: f64) -> NavResult<Self> {
        if !granularity.is_finite() || granularity <= 0.0 {
            return Err(NavError::InvalidParameter(format!(
                "granularity must be positive and finite, got {}",
                granularity
            )));
        }
        Ok(Self { granularity })
    }

    pub fn from_config(config: &GridConfig) -> NavResult<Self> {
        Self::new(config.granularity)
    }

    pub fn granularity(&self) -> f64 {
        self.granularity
    }

    /// Cell containing `position`, or `None` when the position is
    /// non-finite or lies outside the representable cell range.
    pub fn cell_of(&self, position: Point3D) -> Option<CellCoord> {
        Some(CellCoord::new(
            self.axis_index(position.x)?,
            self.axis_index(position.y)?,
            self.axis_index(position.z)?,
        ))
    }

    /// World-space center of `cell`.
    pub fn cell_center(&self, cell: CellCoord) -> Point3D {
        Point3D::new(
            self.axis_center(cell.x),
            self.axis_center(cell.y),
            self.axis_center(cell.z),
        )
    }

    fn axis_index(&self, value: f64) -> Option<i32> {
        let floored = (value / self.granularity).floor();
        if floored.is_finite() && floored >= i32::MIN as f64 && floored <= i32::MAX as f64 {
            Some(floored as i32)
        } else {
            None
        }
    }

    fn axis_center(&self, index: i32) -> f64 {
        (index as f64 + 0.5) * self.granularity
    }
}
