//! Sparse binary occupancy map with three exclusive cell classes
//!
//! Cells are keyed by [`CellCoord`] and belong to at most one of
//! Obstacle, Ground or Landmark:
//! - Landmark always wins. Registering a landmark evicts a previous
//!   Ground/Obstacle classification, and a landmark cell is never
//!   reclassified afterwards.
//! - Between Ground and Obstacle the first registration wins.
//!
//! New Ground cells feed the frontier tracker.

use std::collections::HashSet;

use itertools::iproduct;
use log::{debug, trace, warn};

use crate::common::{CellCoord, NavError, NavResult, Point3D};
use crate::mapping::frontier::FrontierTracker;
use crate::mapping::grid_index::GridIndex;
use crate::mapping::landmarks::LandmarkRegistry;

/// Class a ranging hit was tagged with by the sensing layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitKind {
    Obstacle,
    Ground,
}

/// Classification of a map cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Obstacle,
    Ground,
    Landmark,
}

impl From<HitKind> for Classification {
    fn from(kind: HitKind) -> Self {
        match kind {
            HitKind::Obstacle => Classification::Obstacle,
            HitKind::Ground => Classification::Ground,
        }
    }
}

/// Summary statistics of the map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapStats {
    pub obstacle_cells: usize,
    pub ground_cells: usize,
    pub landmark_cells: usize,
    /// Distance of the frontier cell from the origin (0 when no Ground)
    pub frontier_distance: f64,
}

/// Occupancy map for one mapping session
#[derive(Debug, Clone)]
pub struct OccupancyMap {
    index: GridIndex,
    origin: Point3D,
    obstacles: HashSet<CellCoord>,
    ground: HashSet<CellCoord>,
    landmarks: LandmarkRegistry,
    frontier: FrontierTracker,
    trajectory: Vec<Point3D>,
    key_locations: Vec<Point3D>,
}

impl OccupancyMap {
    /// Create an empty map anchored at `origin`.
    pub fn new(index: GridIndex, origin: Point3D) -> NavResult<Self> {
        validate_origin(origin)?;
        Ok(Self {
            index,
            origin,
            obstacles: HashSet::new(),
            ground: HashSet::new(),
            landmarks: LandmarkRegistry::new(),
            frontier: FrontierTracker::new(),
            trajectory: Vec::new(),
            key_locations: Vec::new(),
        })
    }

    /// Create from a raw granularity value
    pub fn with_granularity(granularity: f64, origin: Point3D) -> NavResult<Self> {
        Self::new(GridIndex::new(granularity)?, origin)
    }

    /// Clear all cells, trajectory, key locations and frontier state and
    /// start a new session at `origin`.
    pub fn reset(&mut self, origin: Point3D) -> NavResult<()> {
        validate_origin(origin)?;
        self.origin = origin;
        self.obstacles.clear();
        self.ground.clear();
        self.landmarks.clear();
        self.frontier.clear();
        self.trajectory.clear();
        self.key_locations.clear();
        debug!(
            "[OccupancyMap] reset at ({:.2},{:.2},{:.2})",
            origin.x, origin.y, origin.z
        );
        Ok(())
    }

    /// Register a ranging hit. Returns true if the cell was newly
    /// classified; a cell that is already classified is left untouched.
    pub fn register_cell(&mut self, position: Point3D, kind: HitKind) -> bool {
        let cell = match self.index.cell_of(position) {
            Some(cell) => cell,
            None => {
                warn!("[OccupancyMap] ignoring {:?} hit outside the grid {:?}", kind, position);
                return false;
            }
        };
        if self.classification(cell).is_some() {
            return false;
        }

        match kind {
            HitKind::Obstacle => {
                self.obstacles.insert(cell);
            }
            HitKind::Ground => {
                self.ground.insert(cell);
                let distance_sq = self.distance_sq_from_origin(cell);
                if self.frontier.observe(cell, distance_sq) {
                    trace!(
                        "[OccupancyMap] frontier -> ({},{},{}) d={:.2}",
                        cell.x,
                        cell.y,
                        cell.z,
                        distance_sq.sqrt()
                    );
                }
            }
        }
        true
    }

    /// Register a classified detection. Evicts any Ground or Obstacle
    /// classification of the same cell. Returns false if the cell was
    /// already a landmark.
    pub fn register_landmark(&mut self, position: Point3D, label: impl Into<String>) -> bool {
        let cell = match self.index.cell_of(position) {
            Some(cell) => cell,
            None => {
                warn!("[OccupancyMap] ignoring landmark outside the grid {:?}", position);
                return false;
            }
        };
        if self.landmarks.contains(&cell) {
            return false;
        }

        self.obstacles.remove(&cell);
        if self.ground.remove(&cell) && self.frontier.cell() == Some(cell) {
            self.rebuild_frontier();
        }
        let label = label.into();
        debug!(
            "[OccupancyMap] landmark '{}' at ({},{},{})",
            label, cell.x, cell.y, cell.z
        );
        self.landmarks.insert(cell, label)
    }

    /// Append the agent position to the session trajectory.
    pub fn record_trajectory(&mut self, position: Point3D) {
        self.trajectory.push(position);
    }

    /// Record a waypoint of significance, such as a reached checkpoint.
    pub fn add_key_location(&mut self, position: Point3D) {
        self.key_locations.push(position);
    }

    pub fn classification(&self, cell: CellCoord) -> Option<Classification> {
        if self.landmarks.contains(&cell) {
            Some(Classification::Landmark)
        } else if self.ground.contains(&cell) {
            Some(Classification::Ground)
        } else if self.obstacles.contains(&cell) {
            Some(Classification::Obstacle)
        } else {
            None
        }
    }

    /// A cell can be driven over only if it is known Ground.
    pub fn is_traversable(&self, cell: CellCoord) -> bool {
        self.ground.contains(&cell)
            && !self.obstacles.contains(&cell)
            && !self.landmarks.contains(&cell)
    }

    /// Cells of one class. Order is unspecified except for landmarks,
    /// which come in registration order.
    pub fn cells(&self, class: Classification) -> Box<dyn Iterator<Item = CellCoord> + '_> {
        match class {
            Classification::Obstacle => Box::new(self.obstacles.iter().copied()),
            Classification::Ground => Box::new(self.ground.iter().copied()),
            Classification::Landmark => Box::new(self.landmarks.cells()),
        }
    }

    /// World-space cell centers of one class, sorted by coordinate
    /// (landmarks keep registration order).
    pub fn cell_centers(&self, class: Classification) -> Vec<Point3D> {
        let mut cells: Vec<CellCoord> = self.cells(class).collect();
        if class != Classification::Landmark {
            cells.sort_unstable();
        }
        cells.into_iter().map(|c| self.index.cell_center(c)).collect()
    }

    /// Nearest traversable cell to `cell`, searching cubic shells of
    /// radius 1..=`max_radius`. Within the first shell that contains any
    /// candidate the closest one wins; ties keep the first in x, y, z order.
    pub fn nearest_traversable(&self, cell: CellCoord, max_radius: i32) -> Option<CellCoord> {
        if self.is_traversable(cell) {
            return Some(cell);
        }
        for radius in 1..=max_radius.max(0) {
            let mut best: Option<(i64, CellCoord)> = None;
            for (dx, dy, dz) in iproduct!(-radius..=radius, -radius..=radius, -radius..=radius) {
                let candidate = match cell.offset(dx, dy, dz) {
                    Some(candidate) => candidate,
                    None => continue,
                };
                if candidate.chebyshev(&cell) != radius as i64 || !self.is_traversable(candidate) {
                    continue;
                }
                let d = candidate.distance_squared(&cell);
                if best.map_or(true, |(best_d, _)| d < best_d) {
                    best = Some((d, candidate));
                }
            }
            if let Some((_, found)) = best {
                return Some(found);
            }
        }
        None
    }

    /// Cell containing `position`; `None` outside the representable grid.
    pub fn cell_of(&self, position: Point3D) -> Option<CellCoord> {
        self.index.cell_of(position)
    }

    pub fn cell_center(&self, cell: CellCoord) -> Point3D {
        self.index.cell_center(cell)
    }

    pub fn grid_index(&self) -> &GridIndex {
        &self.index
    }

    pub fn origin(&self) -> Point3D {
        self.origin
    }

    /// Frontier cell: the Ground cell furthest from the origin.
    pub fn frontier(&self) -> Option<CellCoord> {
        self.frontier.cell()
    }

    /// World-space center of the frontier cell.
    pub fn frontier_position(&self) -> Option<Point3D> {
        self.frontier.cell().map(|c| self.index.cell_center(c))
    }

    pub fn frontier_distance_sq(&self) -> f64 {
        self.frontier.distance_sq()
    }

    pub fn trajectory(&self) -> &[Point3D] {
        &self.trajectory
    }

    pub fn key_locations(&self) -> &[Point3D] {
        &self.key_locations
    }

    pub fn landmarks(&self) -> &LandmarkRegistry {
        &self.landmarks
    }

    pub fn stats(&self) -> MapStats {
        MapStats {
            obstacle_cells: self.obstacles.len(),
            ground_cells: self.ground.len(),
            landmark_cells: self.landmarks.len(),
            frontier_distance: self.frontier.distance_sq().sqrt(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty() && self.ground.is_empty() && self.landmarks.is_empty()
    }

    fn distance_sq_from_origin(&self, cell: CellCoord) -> f64 {
        self.index.cell_center(cell).distance_squared(&self.origin)
    }

    fn rebuild_frontier(&mut self) {
        let index = self.index;
        let origin = self.origin;
        self.frontier.rebuild(
            self.ground
                .iter()
                .map(|&c| (c, index.cell_center(c).distance_squared(&origin))),
        );
        debug!("[OccupancyMap] frontier rebuilt after eviction: {:?}", self.frontier.cell());
    }
}

fn validate_origin(origin: Point3D) -> NavResult<()> {
    if !origin.is_finite() {
        return Err(NavError::InvalidOrigin(format!(
            "origin must be finite, got {:?}",
            origin
        )));
    }
    Ok(())
}
