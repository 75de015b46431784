//! Map snapshot export for offline inspection
//!
//! The JSON document has stable camelCase field names:
//!
//! ```text
//! { origin, trajectory, obstacles, safeGround, landmarks, keyLocations, score }
//! ```
//!
//! Every vec3 is written as `{ "x": .., "y": .., "z": .. }` and cell sets
//! are expanded to world-space cell centers.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::common::{NavResult, Point3D};
use crate::mapping::{Classification, OccupancyMap};

/// Read-only copy of a mapping session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSnapshot {
    pub origin: Point3D,
    #[serde(default)]
    pub trajectory: Vec<Point3D>,
    #[serde(default)]
    pub obstacles: Vec<Point3D>,
    #[serde(default)]
    pub safe_ground: Vec<Point3D>,
    #[serde(default)]
    pub landmarks: Vec<Point3D>,
    #[serde(default)]
    pub key_locations: Vec<Point3D>,
    #[serde(default)]
    pub score: f64,
}

impl MapSnapshot {
    /// Copy the current state of `map` together with a caller-supplied score.
    pub fn capture(map: &OccupancyMap, score: f64) -> Self {
        Self {
            origin: map.origin(),
            trajectory: map.trajectory().to_vec(),
            obstacles: map.cell_centers(Classification::Obstacle),
            safe_ground: map.cell_centers(Classification::Ground),
            landmarks: map.cell_centers(Classification::Landmark),
            key_locations: map.key_locations().to_vec(),
            score,
        }
    }

    pub fn to_json_pretty(&self) -> NavResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> NavResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the snapshot as pretty-printed JSON.
    pub fn save_json(&self, path: &Path) -> NavResult<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        info!(
            "Saved map snapshot to {} ({} ground, {} obstacle, {} landmark cells)",
            path.display(),
            self.safe_ground.len(),
            self.obstacles.len(),
            self.landmarks.len()
        );
        Ok(())
    }

    pub fn load_json(path: &Path) -> NavResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

impl OccupancyMap {
    /// Snapshot of the map for persistence; does not mutate the map.
    pub fn export(&self, score: f64) -> MapSnapshot {
        MapSnapshot::capture(self, score)
    }
}
