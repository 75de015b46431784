//! A* path planning over the occupancy map
//!
//! Searches 4-connected neighbours on the horizontal (x/z) plane with unit
//! edge cost; vertical adjacency is never expanded. The heuristic is the
//! Euclidean distance between cell centers in cell units, used as a
//! practical estimate rather than a proven-admissible one.
//!
//! Endpoints that are not known Ground are snapped to the nearest Ground
//! cell within a small cubic radius. Every failure, including running out
//! of the expansion budget, yields an empty path.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};

use log::{debug, trace};
use ordered_float::NotNan;
use serde::{Deserialize, Serialize};

use crate::common::{CellCoord, Path3D, PathPlanner, Point3D};
use crate::mapping::OccupancyMap;

/// Configuration for the A* planner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AStarConfig {
    /// Maximum number of node expansions before giving up
    pub max_iterations: usize,
    /// Largest cubic radius, in cells, searched when snapping an endpoint
    pub max_snap_radius: i32,
    /// Heuristic weight (1.0 = plain A*, >1.0 = greedier)
    pub heuristic_weight: f64,
}

impl Default for AStarConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            max_snap_radius: 3,
            heuristic_weight: 1.0,
        }
    }
}

/// Why a planning call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanOutcome {
    /// A path was found
    Found,
    /// Start and target resolve to the same cell
    AlreadyThere,
    /// No Ground cell near the start
    StartUnresolved,
    /// No Ground cell near the target
    GoalUnresolved,
    /// Open set exhausted without reaching the target
    NoPath,
    /// Expansion budget exceeded
    BudgetExhausted,
}

/// Result of a planning call
#[derive(Debug, Clone)]
pub struct PlanResult {
    /// Cell-center waypoints, empty unless `outcome` is `Found`
    pub path: Path3D,
    pub outcome: PlanOutcome,
    /// Number of nodes expanded
    pub expansions: usize,
}

impl PlanResult {
    fn failed(outcome: PlanOutcome, expansions: usize) -> Self {
        Self {
            path: Path3D::new(),
            outcome,
            expansions,
        }
    }

    pub fn is_found(&self) -> bool {
        self.outcome == PlanOutcome::Found
    }
}

/// Open-set entry. Ordered by f-score, then insertion sequence, both
/// reversed so `BinaryHeap` pops the smallest f and the oldest entry.
#[derive(Debug, PartialEq, Eq)]
struct NodeWithPriority {
    priority: Reverse<NotNan<f64>>,
    sequence: Reverse<u64>,
    coord: CellCoord,
}

impl Ord for NodeWithPriority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for NodeWithPriority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* planner borrowing a map for the duration of one or more queries
pub struct AStarPlanner<'a> {
    map: &'a OccupancyMap,
    config: AStarConfig,
}

impl<'a> AStarPlanner<'a> {
    pub fn new(map: &'a OccupancyMap, config: AStarConfig) -> Self {
        Self { map, config }
    }

    pub fn with_defaults(map: &'a OccupancyMap) -> Self {
        Self::new(map, AStarConfig::default())
    }

    /// Find a path between two world positions.
    pub fn find_path(&self, start: Point3D, goal: Point3D) -> PlanResult {
        let start_cell = match self.resolve(start) {
            Some(cell) => cell,
            None => {
                debug!("[AStar] start {:?} has no Ground cell nearby", start);
                return PlanResult::failed(PlanOutcome::StartUnresolved, 0);
            }
        };
        let goal_cell = match self.resolve(goal) {
            Some(cell) => cell,
            None => {
                debug!("[AStar] goal {:?} has no Ground cell nearby", goal);
                return PlanResult::failed(PlanOutcome::GoalUnresolved, 0);
            }
        };
        self.find_path_cells(start_cell, goal_cell)
    }

    /// Find a path between two cells, both assumed traversable.
    pub fn find_path_cells(&self, start: CellCoord, goal: CellCoord) -> PlanResult {
        trace!(
            "[AStar] find_path: start=({},{},{}) goal=({},{},{})",
            start.x, start.y, start.z, goal.x, goal.y, goal.z
        );
        if start == goal {
            return PlanResult::failed(PlanOutcome::AlreadyThere, 0);
        }

        let mut open_set = BinaryHeap::new();
        let mut closed_set: HashSet<CellCoord> = HashSet::new();
        let mut came_from: HashMap<CellCoord, CellCoord> = HashMap::new();
        let mut g_scores: HashMap<CellCoord, f64> = HashMap::new();
        let mut sequence: u64 = 0;

        g_scores.insert(start, 0.0);
        self.push(&mut open_set, &mut sequence, start, self.calc_heuristic(start, goal));

        let mut expansions = 0;
        while let Some(current) = open_set.pop() {
            let current = current.coord;

            if current == goal {
                debug!("[AStar] found goal after {} expansions", expansions);
                return PlanResult {
                    path: self.calc_final_path(&came_from, goal),
                    outcome: PlanOutcome::Found,
                    expansions,
                };
            }

            // Stale entry for an already expanded cell
            if !closed_set.insert(current) {
                continue;
            }

            expansions += 1;
            if expansions > self.config.max_iterations {
                debug!("[AStar] budget of {} expansions exhausted", self.config.max_iterations);
                return PlanResult::failed(PlanOutcome::BudgetExhausted, expansions);
            }

            let current_g = g_scores.get(&current).copied().unwrap_or(f64::INFINITY);
            for neighbor in current.planar_neighbors() {
                if closed_set.contains(&neighbor) || !self.map.is_traversable(neighbor) {
                    continue;
                }

                let tentative_g = current_g + 1.0;
                let known_g = g_scores.get(&neighbor).copied().unwrap_or(f64::INFINITY);
                if tentative_g < known_g {
                    came_from.insert(neighbor, current);
                    g_scores.insert(neighbor, tentative_g);
                    let f = tentative_g + self.calc_heuristic(neighbor, goal);
                    self.push(&mut open_set, &mut sequence, neighbor, f);
                }
            }
        }

        debug!("[AStar] open set empty after {} expansions", expansions);
        PlanResult::failed(PlanOutcome::NoPath, expansions)
    }

    /// Cell for a world position, snapped to nearby Ground if needed.
    fn resolve(&self, position: Point3D) -> Option<CellCoord> {
        let cell = self.map.cell_of(position)?;
        let resolved = self.map.nearest_traversable(cell, self.config.max_snap_radius)?;
        if resolved != cell {
            trace!("[AStar] snapped {:?} -> {:?}", cell, resolved);
        }
        Some(resolved)
    }

    fn push(
        &self,
        open_set: &mut BinaryHeap<NodeWithPriority>,
        sequence: &mut u64,
        coord: CellCoord,
        f: f64,
    ) {
        if let Ok(priority) = NotNan::new(f) {
            open_set.push(NodeWithPriority {
                priority: Reverse(priority),
                sequence: Reverse(*sequence),
                coord,
            });
            *sequence += 1;
        }
    }

    fn calc_final_path(&self, came_from: &HashMap<CellCoord, CellCoord>, goal: CellCoord) -> Path3D {
        let mut cells = vec![goal];
        let mut current = goal;
        while let Some(&prev) = came_from.get(&current) {
            cells.push(prev);
            current = prev;
        }
        cells.reverse();
        Path3D::from_points(cells.into_iter().map(|c| self.map.cell_center(c)).collect())
    }

    fn calc_heuristic(&self, n1: CellCoord, n2: CellCoord) -> f64 {
        self.config.heuristic_weight * n1.distance(&n2)
    }
}

impl PathPlanner for AStarPlanner<'_> {
    fn plan(&self, start: Point3D, goal: Point3D) -> Path3D {
        self.find_path(start, goal).path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::HitKind;

    fn p(x: f64, y: f64, z: f64) -> Point3D {
        Point3D::new(x, y, z)
    }

    fn line_map(len: i32) -> OccupancyMap {
        let mut map = OccupancyMap::with_granularity(1.0, Point3D::origin()).unwrap();
        for i in 0..len {
            map.register_cell(p(i as f64, 0.0, 0.0), HitKind::Ground);
        }
        map
    }

    fn assert_valid_path(map: &OccupancyMap, path: &Path3D) {
        for point in &path.points {
            assert!(map.is_traversable(map.cell_of(*point).unwrap()));
        }
        for w in path.points.windows(2) {
            let a = map.cell_of(w[0]).unwrap();
            let b = map.cell_of(w[1]).unwrap();
            assert_eq!(a.distance_squared(&b), 1);
            assert_eq!(a.y, b.y);
        }
    }

    #[test]
    fn test_disconnected_cells_give_empty_path() {
        let mut map = OccupancyMap::with_granularity(1.0, Point3D::origin()).unwrap();
        map.register_cell(p(0.0, 0.0, 0.0), HitKind::Ground);
        map.register_cell(p(5.0, 0.0, 0.0), HitKind::Ground);

        let result = AStarPlanner::with_defaults(&map).find_path(p(0.0, 0.0, 0.0), p(5.0, 0.0, 0.0));
        assert!(result.path.is_empty());
        assert_eq!(result.outcome, PlanOutcome::NoPath);
    }

    #[test]
    fn test_straight_line_path() {
        let map = line_map(6);
        let result = AStarPlanner::with_defaults(&map).find_path(p(0.0, 0.0, 0.0), p(5.0, 0.0, 0.0));

        assert!(result.is_found());
        let expected: Vec<Point3D> = (0..6).map(|i| p(i as f64 + 0.5, 0.5, 0.5)).collect();
        assert_eq!(result.path.points, expected);
        assert_valid_path(&map, &result.path);
    }

    #[test]
    fn test_obstacle_cell_cuts_single_row() {
        let mut map = OccupancyMap::with_granularity(1.0, Point3D::origin()).unwrap();
        map.register_cell(p(3.0, 0.0, 0.0), HitKind::Obstacle);
        for i in 0..6 {
            map.register_cell(p(i as f64, 0.0, 0.0), HitKind::Ground);
        }
        let result = AStarPlanner::with_defaults(&map).find_path(p(0.0, 0.0, 0.0), p(5.0, 0.0, 0.0));
        assert!(result.path.is_empty());
        assert_eq!(result.outcome, PlanOutcome::NoPath);
    }

    #[test]
    fn test_landmark_blocks_existing_ground() {
        let mut map = line_map(6);
        map.register_landmark(p(3.0, 0.0, 0.0), "rock");
        let planner = AStarPlanner::with_defaults(&map);
        assert!(planner.plan(p(0.0, 0.0, 0.0), p(5.0, 0.0, 0.0)).is_empty());
    }

    #[test]
    fn test_detour_around_obstacle() {
        let mut map = OccupancyMap::with_granularity(1.0, Point3D::origin()).unwrap();
        map.register_cell(p(2.0, 0.0, 0.0), HitKind::Obstacle);
        for x in 0..5 {
            for z in 0..3 {
                map.register_cell(p(x as f64, 0.0, z as f64), HitKind::Ground);
            }
        }

        let result = AStarPlanner::with_defaults(&map).find_path(p(0.0, 0.0, 0.0), p(4.0, 0.0, 0.0));
        assert!(result.is_found());
        // 4 steps along x plus one step out and one back
        assert_eq!(result.path.len(), 7);
        assert_valid_path(&map, &result.path);
        assert!(result
            .path
            .points
            .iter()
            .all(|q| map.cell_of(*q) != Some(CellCoord::new(2, 0, 0))));
    }

    #[test]
    fn test_vertical_neighbours_not_searched() {
        let mut map = OccupancyMap::with_granularity(1.0, Point3D::origin()).unwrap();
        map.register_cell(p(0.0, 0.0, 0.0), HitKind::Ground);
        map.register_cell(p(0.0, 1.0, 0.0), HitKind::Ground);
        let result = AStarPlanner::new(
            &map,
            AStarConfig { max_snap_radius: 0, ..Default::default() },
        )
        .find_path(p(0.0, 0.0, 0.0), p(0.0, 1.0, 0.0));
        assert_eq!(result.outcome, PlanOutcome::NoPath);
    }

    #[test]
    fn test_same_cell_is_already_there() {
        let map = line_map(3);
        let result = AStarPlanner::with_defaults(&map).find_path(p(1.1, 0.2, 0.3), p(1.9, 0.8, 0.7));
        assert_eq!(result.outcome, PlanOutcome::AlreadyThere);
        assert!(result.path.is_empty());
    }

    #[test]
    fn test_endpoints_snap_to_ground() {
        let map = line_map(6);
        // start hovers one cell above the line, goal is just past its end
        let result = AStarPlanner::with_defaults(&map).find_path(p(0.5, 1.5, 0.5), p(7.5, 0.5, 0.5));
        assert!(result.is_found());
        assert_eq!(result.path.first(), Some(&p(0.5, 0.5, 0.5)));
        assert_eq!(result.path.last(), Some(&p(5.5, 0.5, 0.5)));
    }

    #[test]
    fn test_snapping_failure() {
        let map = line_map(3);
        let planner = AStarPlanner::with_defaults(&map);
        assert_eq!(
            planner.find_path(p(0.0, 0.0, 20.0), p(2.0, 0.0, 0.0)).outcome,
            PlanOutcome::StartUnresolved
        );
        assert_eq!(
            planner.find_path(p(0.0, 0.0, 0.0), p(2.0, 0.0, 20.0)).outcome,
            PlanOutcome::GoalUnresolved
        );
    }

    #[test]
    fn test_far_target_is_unresolved() {
        let map = line_map(3);
        let planner = AStarPlanner::with_defaults(&map);
        for goal in [p(1e10, 0.0, 0.0), p(0.0, -1e10, 0.0), p(2.5e9, 0.0, 2.5e9)] {
            let result = planner.find_path(p(0.0, 0.0, 0.0), goal);
            assert!(result.path.is_empty());
            assert_eq!(result.outcome, PlanOutcome::GoalUnresolved);
        }
        let result = planner.find_path(p(-1e10, 0.0, 0.0), p(2.0, 0.0, 0.0));
        assert_eq!(result.outcome, PlanOutcome::StartUnresolved);
    }

    #[test]
    fn test_plan_along_edge_of_range() {
        let mut map = OccupancyMap::with_granularity(1.0, Point3D::origin()).unwrap();
        let top = i32::MAX as f64;
        map.register_cell(p(top - 0.5, 0.0, 0.5), HitKind::Ground);
        map.register_cell(p(top - 1.5, 0.0, 0.5), HitKind::Ground);

        // start cell sits on the last coordinate and snaps inward
        let result = AStarPlanner::with_defaults(&map)
            .find_path(p(top + 0.5, 0.0, 0.5), p(top - 1.5, 0.0, 0.5));
        assert_eq!(result.outcome, PlanOutcome::Found);
        assert_eq!(result.path.len(), 2);
        assert_valid_path(&map, &result.path);

        // expanding the last cell skips the neighbour past the range
        map.register_cell(p(top + 0.5, 0.0, 0.5), HitKind::Ground);
        map.register_cell(p(top + 0.5, 0.0, 10.5), HitKind::Ground);
        let result = AStarPlanner::with_defaults(&map)
            .find_path(p(top - 1.5, 0.0, 0.5), p(top + 0.5, 0.0, 10.5));
        assert_eq!(result.outcome, PlanOutcome::NoPath);
        assert_eq!(result.expansions, 3);
    }

    #[test]
    fn test_budget_exhaustion() {
        let map = line_map(50);
        let config = AStarConfig { max_iterations: 10, ..Default::default() };
        let result = AStarPlanner::new(&map, config).find_path(p(0.0, 0.0, 0.0), p(49.0, 0.0, 0.0));
        assert_eq!(result.outcome, PlanOutcome::BudgetExhausted);
        assert!(result.path.is_empty());
        assert_eq!(result.expansions, 11);
    }

    #[test]
    fn test_open_set_breaks_ties_by_insertion_order() {
        let mut heap = BinaryHeap::new();
        let f = NotNan::new(3.0).unwrap();
        for (i, x) in [7, 2, 9].iter().enumerate() {
            heap.push(NodeWithPriority {
                priority: Reverse(f),
                sequence: Reverse(i as u64),
                coord: CellCoord::new(*x, 0, 0),
            });
        }
        heap.push(NodeWithPriority {
            priority: Reverse(NotNan::new(1.0).unwrap()),
            sequence: Reverse(3),
            coord: CellCoord::new(0, 0, 0),
        });
        let order: Vec<i32> = std::iter::from_fn(|| heap.pop()).map(|n| n.coord.x).collect();
        assert_eq!(order, vec![0, 7, 2, 9]);
    }
}
