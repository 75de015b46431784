//! Waypoint follower for planned cell-center paths
//!
//! Leading waypoints are dropped once the agent comes within `proximity`
//! of them, so a passed waypoint is never returned again. A new plan
//! replaces the whole sequence at once.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::common::{NavError, NavResult, Path3D, PathTracker, Point3D};

/// Configuration for the path follower
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowerConfig {
    /// Distance [m] under which a waypoint counts as reached
    pub proximity: f64,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self { proximity: 1.0 }
    }
}

impl FollowerConfig {
    pub fn validate(&self) -> NavResult<()> {
        if !self.proximity.is_finite() || self.proximity <= 0.0 {
            return Err(NavError::InvalidParameter(format!(
                "follower proximity must be positive and finite, got {}",
                self.proximity
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PathFollower {
    waypoints: VecDeque<Point3D>,
    proximity: f64,
}

impl PathFollower {
    pub fn new(config: &FollowerConfig) -> NavResult<Self> {
        config.validate()?;
        Ok(Self {
            waypoints: VecDeque::new(),
            proximity: config.proximity,
        })
    }

    /// Drop every leading waypoint within reach of `position` and return
    /// the next one to steer toward, or `None` once the path is used up.
    pub fn advance(&mut self, position: Point3D) -> Option<Point3D> {
        while let Some(front) = self.waypoints.front() {
            if front.distance(&position) < self.proximity {
                self.waypoints.pop_front();
            } else {
                break;
            }
        }
        self.current()
    }

    /// Replace the remaining waypoints with `path`.
    pub fn replace(&mut self, path: Path3D) {
        self.waypoints = path.points.into();
    }

    pub fn clear(&mut self) {
        self.waypoints.clear();
    }

    /// Waypoint currently being steered toward
    pub fn current(&self) -> Option<Point3D> {
        self.waypoints.front().copied()
    }

    pub fn remaining(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn proximity(&self) -> f64 {
        self.proximity
    }

    /// Snapshot of the remaining path
    pub fn path(&self) -> Path3D {
        Path3D::from_points(self.waypoints.iter().copied().collect())
    }
}

impl PathTracker for PathFollower {
    fn next_waypoint(&mut self, position: Point3D) -> Option<Point3D> {
        self.advance(position)
    }

    fn set_path(&mut self, path: Path3D) {
        self.replace(path);
    }
}
