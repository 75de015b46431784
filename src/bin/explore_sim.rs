// Frontier exploration on a procedural boulder field
//
// Drives a point agent with a ring range sensor over flat terrain scattered
// with boulders, some of which the perception layer reports as rocks. The
// agent explores toward the frontier, then returns to the origin, and the
// final map is written as a JSON snapshot.
//
// usage: explore_sim [snapshot.json] [config.json]

use std::f64::consts::PI;
use std::path::PathBuf;

use log::{error, info};
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, Uniform};

use rover_nav::mapping::{Detection, RangeScan};
use rover_nav::{NavConfig, NavResult, NavigationGoal, NavigationSession, Point3D, Sensing};

// Simulation parameters
const FIELD_HALF_SIZE: f64 = 20.0; // [m]
const BOULDER_COUNT: usize = 30;
const ROCK_RATIO: f64 = 0.3;
const SENSOR_RANGE: f64 = 6.0; // [m]
const SENSOR_RAYS: usize = 36;
const DETECTION_RANGE: f64 = 5.0; // [m]
const SPEED: f64 = 2.0; // [m/s]
const DT: f64 = 0.02; // [s]
const EXPLORE_STEPS: usize = 3000;
const RETURN_STEPS: usize = 2000;
const BODY_HEIGHT: f64 = 0.5; // [m]

struct Boulder {
    x: f64,
    z: f64,
    radius: f64,
    is_rock: bool,
}

struct BoulderField {
    boulders: Vec<Boulder>,
}

impl BoulderField {
    fn generate(rng: &mut StdRng) -> Self {
        let position = Uniform::new(-FIELD_HALF_SIZE, FIELD_HALF_SIZE);
        let radius = Uniform::new(0.4, 1.2);
        let kind = Uniform::new(0.0, 1.0);
        let boulders = (0..BOULDER_COUNT)
            .map(|_| Boulder {
                x: position.sample(rng),
                z: position.sample(rng),
                radius: radius.sample(rng),
                is_rock: kind.sample(rng) < ROCK_RATIO,
            })
            // keep the start area clear
            .filter(|b| b.x.hypot(b.z) > b.radius + 2.0)
            .collect();
        Self { boulders }
    }

    fn blocked(&self, x: f64, z: f64) -> bool {
        self.boulders
            .iter()
            .any(|b| (x - b.x).hypot(z - b.z) <= b.radius)
    }

    fn ground_height(&self, x: f64, z: f64) -> Option<f64> {
        if x.abs() > FIELD_HALF_SIZE || z.abs() > FIELD_HALF_SIZE || self.blocked(x, z) {
            return None;
        }
        // gentle undulation, kept within one cell of height
        Some(0.2 + 0.1 * (0.3 * x).sin() * (0.3 * z).cos())
    }

    fn range_scan(&self, agent: Point3D, noise: &Normal<f64>, rng: &mut StdRng) -> RangeScan {
        let mut scan = RangeScan::new();
        let step = 0.25;
        for i in 0..SENSOR_RAYS {
            let angle = 2.0 * PI * i as f64 / SENSOR_RAYS as f64;
            let (dz, dx) = angle.sin_cos();
            let mut r = step;
            while r <= SENSOR_RANGE {
                let x = agent.x + r * dx;
                let z = agent.z + r * dz;
                if x.abs() > FIELD_HALF_SIZE || z.abs() > FIELD_HALF_SIZE {
                    break;
                }
                if self.blocked(x, z) {
                    let measured = (r + noise.sample(rng)).max(step);
                    scan.push_obstacle(Point3D::new(
                        agent.x + measured * dx,
                        0.2,
                        agent.z + measured * dz,
                    ));
                    break;
                }
                if let Some(h) = self.ground_height(x, z) {
                    scan.push_ground(Point3D::new(x, h, z));
                }
                r += step;
            }
        }
        scan
    }

    fn detections(&self, agent: Point3D) -> Vec<Detection> {
        self.boulders
            .iter()
            .filter(|b| b.is_rock && (b.x - agent.x).hypot(b.z - agent.z) <= DETECTION_RANGE)
            .map(|b| Detection::new(Point3D::new(b.x, 0.2, b.z), "rock"))
            .collect()
    }
}

// planar move; the body keeps its height
fn move_toward(position: Point3D, target: Point3D, max_step: f64) -> Point3D {
    let delta = Vector3::new(target.x - position.x, 0.0, target.z - position.z);
    let step = if delta.norm() <= max_step {
        delta
    } else {
        delta.normalize() * max_step
    };
    Point3D::from(position.to_vector() + step)
}

fn run(output: PathBuf, config: NavConfig) -> NavResult<()> {
    let mut rng = StdRng::seed_from_u64(7);
    let field = BoulderField::generate(&mut rng);
    let noise = Normal::new(0.0, 0.05).map_err(|e| {
        rover_nav::NavError::InvalidParameter(format!("sensor noise: {}", e))
    })?;
    info!("Generated {} boulders", field.boulders.len());

    let origin = Point3D::new(0.0, BODY_HEIGHT, 0.0);
    let mut session = NavigationSession::new(config, origin)?;
    let terrain = |x: f64, z: f64| field.ground_height(x, z);
    let mut position = origin;

    for step in 0..(EXPLORE_STEPS + RETURN_STEPS) {
        if step == EXPLORE_STEPS {
            info!("Exploration budget spent, returning to origin");
            session.mark_key_location(position);
            session.set_goal(NavigationGoal::Origin);
        }

        let scan = field.range_scan(position, &noise, &mut rng);
        let detections = field.detections(position);
        let sensing = Sensing {
            scan: Some(&scan),
            detections: &detections,
            terrain: Some(&terrain),
        };

        if let Some(waypoint) = session.step(DT, position, sensing) {
            position = move_toward(position, waypoint, SPEED * DT);
        }

        if step % 500 == 0 {
            let stats = session.map().stats();
            info!(
                "step {:5}: pos ({:6.2},{:6.2}) ground {:4} obstacle {:4} rocks {:3} frontier {:5.2} m",
                step,
                position.x,
                position.z,
                stats.ground_cells,
                stats.obstacle_cells,
                stats.landmark_cells,
                stats.frontier_distance
            );
        }
    }

    let distance_home = position.distance(&origin);
    info!("Finished {:.2} m from origin", distance_home);
    if distance_home < session.config().follower.proximity * 2.0 {
        session.mark_key_location(position);
    }

    let score = session.map().landmarks().count_label("rock") as f64;
    session.export(score).save_json(&output)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let output = PathBuf::from(args.next().unwrap_or_else(|| "map_snapshot.json".to_string()));
    let config = match args.next() {
        Some(path) => match NavConfig::from_json_file(&PathBuf::from(path)) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load config: {}", e);
                std::process::exit(1);
            }
        },
        None => NavConfig::default(),
    };

    if let Err(e) = run(output, config) {
        error!("Exploration failed: {}", e);
        std::process::exit(1);
    }
}
