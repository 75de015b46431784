//! Navigation session: owns the map and the follower for one agent
//!
//! The owning controller calls [`NavigationSession::step`] once per
//! simulation step. Scanning and replanning run on their own cadences;
//! the follower is advanced every step.

use log::{debug, info};

use crate::common::{NavResult, Path3D, Point3D, TerrainSampler};
use crate::config::NavConfig;
use crate::io::MapSnapshot;
use crate::mapping::{Detection, GridIndex, OccupancyMap, RangeScan, ScanIntegrator, ScanSummary};
use crate::navigation::cadence::{IntervalCadence, StepCadence};
use crate::path_planning::{AStarPlanner, PlanOutcome, PlanResult};
use crate::path_tracking::PathFollower;

/// Where the planner should head
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavigationGoal {
    /// The Ground cell furthest from the origin
    Frontier,
    /// Back to the session origin
    Origin,
    /// An externally supplied position
    Target(Point3D),
}

/// Sensing results available for one step
#[derive(Clone, Copy, Default)]
pub struct Sensing<'a> {
    pub scan: Option<&'a RangeScan>,
    pub detections: &'a [Detection],
    pub terrain: Option<&'a dyn TerrainSampler>,
}

pub struct NavigationSession {
    config: NavConfig,
    map: OccupancyMap,
    follower: PathFollower,
    integrator: ScanIntegrator,
    scan_cadence: StepCadence,
    replan_cadence: IntervalCadence,
    goal: NavigationGoal,
    last_plan: Option<PlanOutcome>,
}

impl NavigationSession {
    /// Start a session at `origin`. Fails on invalid configuration or a
    /// non-finite origin.
    pub fn new(config: NavConfig, origin: Point3D) -> NavResult<Self> {
        config.validate()?;
        let map = OccupancyMap::new(GridIndex::from_config(&config.grid)?, origin)?;
        let follower = PathFollower::new(&config.follower)?;
        info!(
            "[Session] started at ({:.2},{:.2},{:.2}), granularity {}",
            origin.x, origin.y, origin.z, config.grid.granularity
        );
        Ok(Self {
            integrator: ScanIntegrator::new(config.scan.clone()),
            scan_cadence: StepCadence::new(config.cadence.scan_interval_steps),
            replan_cadence: IntervalCadence::new(config.cadence.replan_interval),
            config,
            map,
            follower,
            goal: NavigationGoal::Frontier,
            last_plan: None,
        })
    }

    /// Run one control step and return the waypoint to steer toward.
    pub fn step(&mut self, dt: f64, position: Point3D, sensing: Sensing<'_>) -> Option<Point3D> {
        if self.scan_cadence.tick() {
            self.scan(position, sensing);
        }
        if self.replan_cadence.tick(dt) {
            self.replan(position);
        }
        self.follower.advance(position)
    }

    /// Integrate sensing results immediately, outside the scan cadence.
    pub fn scan(&mut self, position: Point3D, sensing: Sensing<'_>) -> ScanSummary {
        let empty = RangeScan::new();
        let scan = sensing.scan.unwrap_or(&empty);
        self.integrator
            .integrate(&mut self.map, position, scan, sensing.detections, sensing.terrain)
    }

    /// Plan toward the current goal from `position` and hand the result to
    /// the follower. An empty result clears the follower; the next replan
    /// tick tries again with whatever the map has learned since.
    pub fn replan(&mut self, position: Point3D) -> PlanOutcome {
        let result = match self.goal_position() {
            Some(target) => {
                AStarPlanner::new(&self.map, self.config.a_star.clone()).find_path(position, target)
            }
            None => PlanResult {
                path: Path3D::new(),
                outcome: PlanOutcome::GoalUnresolved,
                expansions: 0,
            },
        };
        if self.last_plan != Some(result.outcome) {
            debug!(
                "[Session] plan toward {:?}: {:?} ({} waypoints, {:.2} m, {} expansions)",
                self.goal,
                result.outcome,
                result.path.len(),
                result.path.total_length(),
                result.expansions
            );
        }
        self.last_plan = Some(result.outcome);
        self.follower.replace(result.path);
        result.outcome
    }

    /// Change the goal; the next step replans regardless of the cadence.
    pub fn set_goal(&mut self, goal: NavigationGoal) {
        if self.goal != goal {
            info!("[Session] goal -> {:?}", goal);
        }
        self.goal = goal;
        self.replan_cadence.trigger();
    }

    /// World position the planner currently aims for.
    pub fn goal_position(&self) -> Option<Point3D> {
        match self.goal {
            NavigationGoal::Frontier => self.map.frontier_position(),
            NavigationGoal::Origin => Some(self.map.origin()),
            NavigationGoal::Target(p) => Some(p),
        }
    }

    /// Record a waypoint of significance, e.g. a reached checkpoint.
    pub fn mark_key_location(&mut self, position: Point3D) {
        self.map.add_key_location(position);
    }

    /// Drop all map state and the current path and start over at `origin`.
    pub fn reset(&mut self, origin: Point3D) -> NavResult<()> {
        self.map.reset(origin)?;
        self.follower.clear();
        self.scan_cadence.reset();
        self.replan_cadence.reset();
        self.goal = NavigationGoal::Frontier;
        self.last_plan = None;
        info!("[Session] reset at ({:.2},{:.2},{:.2})", origin.x, origin.y, origin.z);
        Ok(())
    }

    pub fn export(&self, score: f64) -> MapSnapshot {
        self.map.export(score)
    }

    pub fn map(&self) -> &OccupancyMap {
        &self.map
    }

    pub fn follower(&self) -> &PathFollower {
        &self.follower
    }

    /// Remaining waypoints of the most recent plan
    pub fn current_path(&self) -> Path3D {
        self.follower.path()
    }

    pub fn goal(&self) -> NavigationGoal {
        self.goal
    }

    pub fn last_plan(&self) -> Option<PlanOutcome> {
        self.last_plan
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::CellCoord;

    fn flat(x: f64, z: f64) -> Option<f64> {
        if (-10.0..20.0).contains(&x) && (-10.0..10.0).contains(&z) {
            Some(0.0)
        } else {
            None
        }
    }

    // one cell wide strip heading along +x
    fn corridor(x: f64, z: f64) -> Option<f64> {
        if (0.0..20.0).contains(&x) && (0.0..1.0).contains(&z) {
            Some(0.0)
        } else {
            None
        }
    }

    fn session() -> NavigationSession {
        NavigationSession::new(NavConfig::default(), Point3D::new(0.5, 0.0, 0.5)).unwrap()
    }

    fn sensing_with_terrain<'a>(terrain: &'a dyn TerrainSampler) -> Sensing<'a> {
        Sensing {
            terrain: Some(terrain),
            ..Default::default()
        }
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let mut config = NavConfig::default();
        config.grid.granularity = -1.0;
        assert!(NavigationSession::new(config, Point3D::origin()).is_err());
        assert!(NavigationSession::new(NavConfig::default(), Point3D::new(f64::NAN, 0.0, 0.0)).is_err());
    }

    #[test]
    fn test_first_step_scans_and_plans() {
        let mut s = session();
        let waypoint = s.step(0.02, Point3D::new(0.5, 0.0, 0.5), sensing_with_terrain(&flat));
        assert_eq!(s.map().stats().ground_cells, 9);
        assert_eq!(s.last_plan(), Some(PlanOutcome::Found));
        assert!(waypoint.is_some());
    }

    #[test]
    fn test_agent_reaches_frontier_by_following_waypoints() {
        let mut config = NavConfig::default();
        config.scan.ground_sample_radius = 2;
        let mut s = NavigationSession::new(config, Point3D::new(0.5, 0.0, 0.5)).unwrap();
        // body center rides half a cell above the ground
        let mut position = Point3D::new(0.5, 0.5, 0.5);
        s.scan(position, sensing_with_terrain(&corridor));
        let start_frontier = s.map().frontier_distance_sq();

        for _ in 0..400 {
            if let Some(w) = s.step(0.02, position, sensing_with_terrain(&corridor)) {
                // move 0.25 m per step toward the waypoint
                let d = w.distance(&position);
                let t = if d > 0.25 { 0.25 / d } else { 1.0 };
                position = Point3D::new(
                    position.x + (w.x - position.x) * t,
                    position.y,
                    position.z + (w.z - position.z) * t,
                );
            }
        }

        assert!(s.map().frontier_distance_sq() > start_frontier);
        assert!(position.x > 5.0, "agent only reached x = {}", position.x);
        assert!(!s.map().trajectory().is_empty());
    }

    #[test]
    fn test_return_to_origin_goal() {
        let mut s = session();
        for x in 0..6 {
            s.scan(Point3D::new(x as f64 + 0.5, 0.0, 0.5), sensing_with_terrain(&flat));
        }
        s.set_goal(NavigationGoal::Origin);
        s.step(0.0, Point3D::new(5.5, 0.0, 0.5), Sensing::default());
        let path = s.current_path();
        assert!(!path.is_empty());
        assert_eq!(s.map().cell_of(*path.last().unwrap()), Some(CellCoord::new(0, 0, 0)));
    }

    #[test]
    fn test_far_target_does_not_panic() {
        let mut s = session();
        s.scan(Point3D::new(0.5, 0.0, 0.5), sensing_with_terrain(&flat));
        s.set_goal(NavigationGoal::Target(Point3D::new(1e10, 0.0, 0.0)));
        assert_eq!(s.step(0.0, Point3D::new(0.5, 0.0, 0.5), Sensing::default()), None);
        assert_eq!(s.last_plan(), Some(PlanOutcome::GoalUnresolved));
    }

    #[test]
    fn test_unreachable_target_clears_path() {
        let mut s = session();
        s.scan(Point3D::new(0.5, 0.0, 0.5), sensing_with_terrain(&flat));
        s.set_goal(NavigationGoal::Target(Point3D::new(100.0, 0.0, 100.0)));
        let waypoint = s.step(0.0, Point3D::new(0.5, 0.0, 0.5), Sensing::default());
        assert_eq!(waypoint, None);
        assert_eq!(s.last_plan(), Some(PlanOutcome::GoalUnresolved));
        assert!(s.current_path().is_empty());
    }

    #[test]
    fn test_replan_waits_for_interval() {
        let mut s = session();
        let here = Point3D::new(0.5, 0.0, 0.5);
        s.step(0.05, here, sensing_with_terrain(&flat));
        assert_eq!(s.last_plan(), Some(PlanOutcome::Found));

        // goal changes without trigger only take effect at the next interval
        s.goal = NavigationGoal::Target(Point3D::new(100.0, 0.0, 100.0));
        s.step(0.05, here, Sensing::default());
        assert_eq!(s.last_plan(), Some(PlanOutcome::Found));
        s.step(0.2, here, Sensing::default());
        assert_eq!(s.last_plan(), Some(PlanOutcome::GoalUnresolved));
    }

    #[test]
    fn test_reset_clears_session() {
        let mut s = session();
        s.step(0.02, Point3D::new(0.5, 0.0, 0.5), sensing_with_terrain(&flat));
        s.mark_key_location(Point3D::new(1.0, 0.0, 1.0));
        s.set_goal(NavigationGoal::Origin);

        s.reset(Point3D::new(3.5, 0.0, 0.5)).unwrap();
        let snapshot = s.export(0.0);
        assert!(snapshot.safe_ground.is_empty());
        assert!(snapshot.trajectory.is_empty());
        assert!(snapshot.key_locations.is_empty());
        assert!(s.current_path().is_empty());
        assert_eq!(s.map().frontier_distance_sq(), 0.0);
        assert_eq!(s.goal(), NavigationGoal::Frontier);
        assert_eq!(snapshot.origin, Point3D::new(3.5, 0.0, 0.5));
    }
}
