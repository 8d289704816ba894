// Tick rate (host fixed timestep: 50 Hz)
pub const TICK_RATE: u32 = 50;
pub const DT: f32 = 1.0 / TICK_RATE as f32;

// Thrust
pub const THRUST: f32 = 100_000.0;
pub const BOOST_MULTIPLIER: f32 = 2.0;

// Control law (degrees per second at full smoothed input)
pub const PITCH_SPEED: f32 = 100.0;
pub const YAW_SPEED: f32 = 100.0;
pub const ROLL_SPEED: f32 = 100.0;
pub const MAX_PITCH_ANGLE: f32 = 45.0;
pub const MAX_ROLL_ANGLE: f32 = 45.0;
pub const SMOOTHING_RATE: f32 = 2.0; // control units per second

// Body
pub const BODY_MASS: f32 = 5_000.0;
pub const LINEAR_DRAG: f32 = 1.0;
pub const ANGULAR_DRAG: f32 = 0.05;

// Checkpoint progression
pub const CHECKPOINT_RADIUS: f32 = 2.0;
pub const GATE_RADIUS: f32 = 10.0;
pub const STEP_TIMEOUT: u32 = 1000;
pub const TRAINING_MAX_STEPS: u32 = 10_000;

// Rewards
pub const CHECKPOINT_REWARD: f32 = 0.5;
pub const COURSE_COMPLETE_REWARD: f32 = 1.0;
pub const TIMEOUT_PENALTY: f32 = -0.5;
pub const COLLISION_PENALTY: f32 = -1.0;

// Spawning
pub const SPAWN_SPREAD_MIN: f32 = 9.0;
pub const SPAWN_SPREAD_MAX: f32 = 10.0;

// World
pub const FLOOR_ALTITUDE: f32 = 0.0;
pub const COURSE_ALTITUDE: f32 = 100.0;
pub const COURSE_RADIUS: f32 = 200.0;
pub const COURSE_WAYPOINTS: usize = 8;

// Episode runner
pub const EVAL_MAX_TICKS: u32 = TICK_RATE * 300; // hard cap when no max step applies
pub const FRAME_INTERVAL: u32 = 5; // record every 5th tick = 10fps

// Observation / action
pub const OBS_SIZE: usize = 9;
pub const ACTION_BRANCHES: usize = 3;
