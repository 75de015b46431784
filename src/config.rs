//! Configuration for a navigation session.
//!
//! Every section has defaults suited to a rover on metre-scale cells; a
//! JSON file only needs to name the fields it overrides.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::{NavError, NavResult};
use crate::mapping::{GridConfig, ScanConfig};
use crate::path_planning::AStarConfig;
use crate::path_tracking::FollowerConfig;

/// How often scanning and replanning run.
///
/// The two cadences are independent: scans are cheap and run every few
/// simulation steps, planning runs on a wall-time interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    /// Scan every N simulation steps
    pub scan_interval_steps: u32,
    /// Replan every this many seconds
    pub replan_interval: f64,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            scan_interval_steps: 5,
            replan_interval: 0.2,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub grid: GridConfig,
    pub a_star: AStarConfig,
    pub follower: FollowerConfig,
    pub scan: ScanConfig,
    pub cadence: CadenceConfig,
}

impl NavConfig {
    pub fn from_json_str(json: &str) -> NavResult<Self> {
        let config: NavConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> NavResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Reject settings that would silently break coordinate math or the
    /// control loop.
    pub fn validate(&self) -> NavResult<()> {
        let g = self.grid.granularity;
        if !g.is_finite() || g <= 0.0 {
            return Err(NavError::InvalidParameter(format!(
                "grid.granularity must be positive and finite, got {}",
                g
            )));
        }
        self.follower.validate()?;
        if self.a_star.max_snap_radius < 0 {
            return Err(NavError::InvalidParameter(format!(
                "a_star.max_snap_radius must be >= 0, got {}",
                self.a_star.max_snap_radius
            )));
        }
        let w = self.a_star.heuristic_weight;
        if !w.is_finite() || w < 0.0 {
            return Err(NavError::InvalidParameter(format!(
                "a_star.heuristic_weight must be finite and >= 0, got {}",
                w
            )));
        }
        if self.scan.ground_sample_radius < 0 {
            return Err(NavError::InvalidParameter(format!(
                "scan.ground_sample_radius must be >= 0, got {}",
                self.scan.ground_sample_radius
            )));
        }
        if self.cadence.scan_interval_steps == 0 {
            return Err(NavError::InvalidParameter(
                "cadence.scan_interval_steps must be >= 1".to_string(),
            ));
        }
        let r = self.cadence.replan_interval;
        if !r.is_finite() || r <= 0.0 {
            return Err(NavError::InvalidParameter(format!(
                "cadence.replan_interval must be positive and finite, got {}",
                r
            )));
        }
        Ok(())
    }
}
