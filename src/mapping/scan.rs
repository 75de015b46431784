//! Scan integration: feeds one sensing step into the occupancy map
//!
//! Order inside a step: detections first (so a landmark pre-empts plain
//! hits on the same cell), then ranging hits, then Ground hits synthesised
//! from terrain height queries around the agent.

use itertools::iproduct;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::common::{Point3D, TerrainSampler};
use crate::mapping::occupancy_map::{HitKind, OccupancyMap};

/// One ranging hit, tagged by the sensing layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeHit {
    pub point: Point3D,
    pub kind: HitKind,
}

impl RangeHit {
    pub fn new(point: Point3D, kind: HitKind) -> Self {
        Self { point, kind }
    }
}

/// All ranging hits of one scan
#[derive(Debug, Clone, Default)]
pub struct RangeScan {
    pub hits: Vec<RangeHit>,
}

impl RangeScan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_hits(hits: Vec<RangeHit>) -> Self {
        Self { hits }
    }

    pub fn push_obstacle(&mut self, point: Point3D) {
        self.hits.push(RangeHit::new(point, HitKind::Obstacle));
    }

    pub fn push_ground(&mut self, point: Point3D) {
        self.hits.push(RangeHit::new(point, HitKind::Ground));
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// A classified detection from the perception pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub point: Point3D,
    pub label: String,
}

impl Detection {
    pub fn new(point: Point3D, label: impl Into<String>) -> Self {
        Self { point, label: label.into() }
    }
}

/// Scan step settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Half-width, in cells, of the square of terrain samples taken around
    /// the agent (0 samples only directly beneath it)
    pub ground_sample_radius: i32,
    /// Vertical offset added to sampled terrain heights before indexing
    pub ground_sample_offset: f64,
    /// Append the agent position to the trajectory on every scan
    pub record_trajectory: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ground_sample_radius: 1,
            ground_sample_offset: 0.0,
            record_trajectory: true,
        }
    }
}

/// Counts of what one scan step changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub new_obstacles: usize,
    pub new_ground: usize,
    pub new_landmarks: usize,
    /// Hits that landed on an already classified cell
    pub unchanged: usize,
}

/// Applies sensing results to an [`OccupancyMap`]
#[derive(Debug, Clone, Default)]
pub struct ScanIntegrator {
    config: ScanConfig,
}

impl ScanIntegrator {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Integrate one scan taken at `agent`.
    pub fn integrate(
        &self,
        map: &mut OccupancyMap,
        agent: Point3D,
        scan: &RangeScan,
        detections: &[Detection],
        terrain: Option<&dyn TerrainSampler>,
    ) -> ScanSummary {
        let mut summary = ScanSummary::default();

        for detection in detections {
            if map.register_landmark(detection.point, detection.label.as_str()) {
                summary.new_landmarks += 1;
            } else {
                summary.unchanged += 1;
            }
        }

        for hit in &scan.hits {
            Self::apply_hit(map, hit.point, hit.kind, &mut summary);
        }

        if let Some(terrain) = terrain {
            let step = map.grid_index().granularity();
            let r = self.config.ground_sample_radius.max(0);
            for (dx, dz) in iproduct!(-r..=r, -r..=r) {
                let x = agent.x + dx as f64 * step;
                let z = agent.z + dz as f64 * step;
                if let Some(height) = terrain.ground_height(x, z) {
                    let point = Point3D::new(x, height + self.config.ground_sample_offset, z);
                    Self::apply_hit(map, point, HitKind::Ground, &mut summary);
                }
            }
        }

        if self.config.record_trajectory {
            map.record_trajectory(agent);
        }

        trace!("[Scan] {:?}", summary);
        summary
    }

    fn apply_hit(map: &mut OccupancyMap, point: Point3D, kind: HitKind, summary: &mut ScanSummary) {
        if !map.register_cell(point, kind) {
            summary.unchanged += 1;
            return;
        }
        match kind {
            HitKind::Obstacle => summary.new_obstacles += 1,
            HitKind::Ground => summary.new_ground += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::CellCoord;
    use crate::mapping::occupancy_map::Classification;

    fn flat(_x: f64, _z: f64) -> Option<f64> {
        Some(0.0)
    }

    #[test]
    fn test_detection_preempts_hit_in_same_scan() {
        let mut map = OccupancyMap::with_granularity(1.0, Point3D::origin()).unwrap();
        let mut scan = RangeScan::new();
        scan.push_obstacle(Point3D::new(2.5, 0.5, 0.5));
        let detections = vec![Detection::new(Point3D::new(2.1, 0.1, 0.1), "rock")];

        let summary = ScanIntegrator::default().integrate(
            &mut map,
            Point3D::origin(),
            &scan,
            &detections,
            None,
        );

        assert_eq!(summary.new_landmarks, 1);
        assert_eq!(summary.new_obstacles, 0);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(map.classification(CellCoord::new(2, 0, 0)), Some(Classification::Landmark));
    }

    #[test]
    fn test_terrain_synthesises_ground_square() {
        let mut map = OccupancyMap::with_granularity(1.0, Point3D::origin()).unwrap();
        let integrator = ScanIntegrator::new(ScanConfig {
            ground_sample_radius: 2,
            ..Default::default()
        });

        let summary = integrator.integrate(
            &mut map,
            Point3D::new(0.5, 0.0, 0.5),
            &RangeScan::new(),
            &[],
            Some(&flat),
        );

        assert_eq!(summary.new_ground, 25);
        assert!(map.is_traversable(CellCoord::new(-2, 0, 2)));
        assert_eq!(map.trajectory(), &[Point3D::new(0.5, 0.0, 0.5)]);
    }

    #[test]
    fn test_terrain_outside_bounds_skipped() {
        let mut map = OccupancyMap::with_granularity(1.0, Point3D::origin()).unwrap();
        let half_plane = |x: f64, _z: f64| if x >= 0.0 { Some(0.0) } else { None };
        let summary = ScanIntegrator::default().integrate(
            &mut map,
            Point3D::new(0.5, 0.0, 0.5),
            &RangeScan::new(),
            &[],
            Some(&half_plane),
        );
        assert_eq!(summary.new_ground, 6);
    }

    #[test]
    fn test_repeated_scan_changes_nothing() {
        let mut map = OccupancyMap::with_granularity(1.0, Point3D::origin()).unwrap();
        let mut scan = RangeScan::new();
        scan.push_ground(Point3D::new(1.0, 0.0, 0.0));
        scan.push_obstacle(Point3D::new(3.0, 0.0, 0.0));
        let integrator = ScanIntegrator::new(ScanConfig {
            record_trajectory: false,
            ..Default::default()
        });

        integrator.integrate(&mut map, Point3D::origin(), &scan, &[], None);
        let second = integrator.integrate(&mut map, Point3D::origin(), &scan, &[], None);

        assert_eq!(second, ScanSummary { unchanged: 2, ..Default::default() });
        assert!(map.trajectory().is_empty());
    }
}
