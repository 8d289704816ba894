use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Control input
// ---------------------------------------------------------------------------

/// One three-valued control axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Deflection {
    Negative,
    #[default]
    Neutral,
    Positive,
}

impl Deflection {
    /// Decode a discrete branch value the way the training host indexes it:
    /// `0 -> 0`, `1 -> +1`, `2 -> -1`.
    pub fn from_discrete(value: u8) -> Option<Self> {
        match value {
            0 => Some(Deflection::Neutral),
            1 => Some(Deflection::Positive),
            2 => Some(Deflection::Negative),
            _ => None,
        }
    }

    pub fn to_discrete(self) -> u8 {
        match self {
            Deflection::Neutral => 0,
            Deflection::Positive => 1,
            Deflection::Negative => 2,
        }
    }

    pub fn from_sign(value: f32) -> Self {
        if value > 0.0 {
            Deflection::Positive
        } else if value < 0.0 {
            Deflection::Negative
        } else {
            Deflection::Neutral
        }
    }

    pub fn value(self) -> f32 {
        match self {
            Deflection::Negative => -1.0,
            Deflection::Neutral => 0.0,
            Deflection::Positive => 1.0,
        }
    }

    pub fn is_neutral(self) -> bool {
        self == Deflection::Neutral
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("invalid value {value} for action branch {branch}")]
    InvalidDiscreteAction { branch: usize, value: u8 },
}

/// Discrete per-tick action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlInput {
    pub pitch: Deflection,
    pub yaw: Deflection,
    pub boost: bool,
}

impl ControlInput {
    pub fn none() -> Self {
        Self::default()
    }

    /// Decode `[pitch, yaw, boost]` discrete branches.
    pub fn from_discrete(raw: [u8; crate::ACTION_BRANCHES]) -> Result<Self, InputError> {
        let pitch = Deflection::from_discrete(raw[0])
            .ok_or(InputError::InvalidDiscreteAction { branch: 0, value: raw[0] })?;
        let yaw = Deflection::from_discrete(raw[1])
            .ok_or(InputError::InvalidDiscreteAction { branch: 1, value: raw[1] })?;
        let boost = match raw[2] {
            0 => false,
            1 => true,
            value => return Err(InputError::InvalidDiscreteAction { branch: 2, value }),
        };
        Ok(Self { pitch, yaw, boost })
    }

    pub fn to_discrete(&self) -> [u8; crate::ACTION_BRANCHES] {
        [
            self.pitch.to_discrete(),
            self.yaw.to_discrete(),
            u8::from(self.boost),
        ]
    }
}

// ---------------------------------------------------------------------------
// Course
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckpointKind {
    Gate,
    Finish,
}

/// A waypoint pose the agent has to pass, in race order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub position: Vec3,
    pub orientation: Quat,
    pub kind: CheckpointKind,
}

impl Checkpoint {
    pub fn is_finish(&self) -> bool {
        self.kind == CheckpointKind::Finish
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::Z
    }
}

/// Trigger volume an agent entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    Checkpoint(usize),
    Untagged,
}

// ---------------------------------------------------------------------------
// Episode flow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeEnd {
    CourseComplete,
    TimedOut,
    Collided,
    /// Max-step truncation.
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlightPhase {
    Flying,
    Terminal(EpisodeEnd),
}

impl FlightPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlightPhase::Terminal(_))
    }
}

/// What one call into the flight controller produced.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TickResult {
    pub reward: f32,
    /// Index of the last checkpoint passed. A tick can pass several; the
    /// controller keeps the full list.
    pub checkpoint: Option<usize>,
    pub end: Option<EpisodeEnd>,
}

impl TickResult {
    pub fn is_terminal(&self) -> bool {
        self.end.is_some()
    }

    /// Fold a later result of the same tick into this one.
    pub fn merge(&mut self, other: TickResult) {
        self.reward += other.reward;
        if other.checkpoint.is_some() {
            self.checkpoint = other.checkpoint;
        }
        if self.end.is_none() {
            self.end = other.end;
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoostMode {
    /// Thrust is always multiplied by the boost multiplier; the boost flag is ignored.
    #[default]
    Always,
    /// The multiplier only applies while the boost flag is set.
    OnDemand,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FlightConfig {
    pub training_mode: bool,
    pub randomize_spawn: bool,
    pub thrust: f32,
    pub boost_multiplier: f32,
    pub boost_mode: BoostMode,
    pub pitch_speed: f32,
    pub yaw_speed: f32,
    pub roll_speed: f32,
    pub max_pitch_angle: f32,
    pub max_roll_angle: f32,
    pub smoothing_rate: f32,
    pub checkpoint_radius: f32,
    pub step_timeout: u32,
    /// Zero disables both truncation and the per-tick time penalty.
    pub max_steps: u32,
}

impl FlightConfig {
    pub fn training() -> Self {
        Self {
            training_mode: true,
            randomize_spawn: true,
            max_steps: crate::TRAINING_MAX_STEPS,
            ..Self::default()
        }
    }

    pub fn evaluation() -> Self {
        Self::default()
    }
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            training_mode: false,
            randomize_spawn: false,
            thrust: crate::THRUST,
            boost_multiplier: crate::BOOST_MULTIPLIER,
            boost_mode: BoostMode::Always,
            pitch_speed: crate::PITCH_SPEED,
            yaw_speed: crate::YAW_SPEED,
            roll_speed: crate::ROLL_SPEED,
            max_pitch_angle: crate::MAX_PITCH_ANGLE,
            max_roll_angle: crate::MAX_ROLL_ANGLE,
            smoothing_rate: crate::SMOOTHING_RATE,
            checkpoint_radius: crate::CHECKPOINT_RADIUS,
            step_timeout: crate::STEP_TIMEOUT,
            max_steps: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BodyConfig {
    pub mass: f32,
    pub linear_drag: f32,
    pub angular_drag: f32,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            mass: crate::BODY_MASS,
            linear_drag: crate::LINEAR_DRAG,
            angular_drag: crate::ANGULAR_DRAG,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Flying below this altitude counts as a collision.
    pub floor_altitude: Option<f32>,
    /// Radius of each checkpoint's trigger volume; zero disables triggers.
    pub gate_radius: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            floor_altitude: Some(crate::FLOOR_ALTITUDE),
            gate_radius: crate::GATE_RADIUS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeConfig {
    pub seed: u64,
    pub pilot: String,
    pub agent_index: usize,
    pub agent_count: usize,
    pub max_ticks: u32,
    /// Ticks between policy decisions.
    pub decision_period: u32,
    pub flight: FlightConfig,
    pub body: BodyConfig,
    pub world: WorldConfig,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            pilot: "pilot".into(),
            agent_index: 0,
            agent_count: 1,
            max_ticks: crate::EVAL_MAX_TICKS,
            decision_period: 1,
            flight: FlightConfig::default(),
            body: BodyConfig::default(),
            world: WorldConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// State snapshots and replays
// ---------------------------------------------------------------------------

/// Snapshot of one agent, angles in degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AgentState {
    pub position: Vec3,
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub next_checkpoint: usize,
    pub timeout_deadline: u32,
    pub training_mode: bool,
    pub cumulative_reward: f32,
    pub tick: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub tick: u32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub speed: f32,
    pub next_checkpoint: usize,
}

impl From<&AgentState> for FrameSnapshot {
    fn from(s: &AgentState) -> Self {
        Self {
            tick: s.tick,
            x: s.position.x,
            y: s.position.y,
            z: s.position.z,
            pitch: s.pitch,
            yaw: s.yaw,
            roll: s.roll,
            speed: s.linear_velocity.length(),
            next_checkpoint: s.next_checkpoint,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeResult {
    /// `None` when the runner's tick cap stopped the episode first.
    pub end: Option<EpisodeEnd>,
    pub final_tick: u32,
    pub cumulative_reward: f32,
    pub checkpoints_reached: u32,
    pub laps: u32,
    /// Tick at which each checkpoint was passed, in order.
    pub splits: Vec<(usize, u32)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub config: EpisodeConfig,
    pub frames: Vec<FrameSnapshot>,
    pub result: EpisodeResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub data: [f32; crate::OBS_SIZE],
}

impl Observation {
    pub fn local_velocity(&self) -> Vec3 {
        Vec3::new(self.data[0], self.data[1], self.data[2])
    }

    pub fn local_target(&self) -> Vec3 {
        Vec3::new(self.data[3], self.data[4], self.data[5])
    }

    pub fn local_target_forward(&self) -> Vec3 {
        Vec3::new(self.data[6], self.data[7], self.data[8])
    }
}
