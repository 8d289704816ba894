use glam::{EulerRot, Quat, Vec3};
use rand::Rng;
use skyrace_shared::*;
use tracing::{debug, info, trace, warn};

use crate::body::FlightBody;
use crate::course::{CheckpointCourse, SpawnPose};

/// Low-pass filtered control signal, carried across ticks for one episode.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SmoothedControlState {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

/// `(pitch, yaw, roll)` in degrees, applied roll first, then pitch, then yaw.
pub fn euler_degrees(orientation: Quat) -> (f32, f32, f32) {
    let (yaw, pitch, roll) = orientation.to_euler(EulerRot::YXZ);
    (pitch.to_degrees(), yaw.to_degrees(), roll.to_degrees())
}

pub fn orientation_from_degrees(pitch: f32, yaw: f32, roll: f32) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        yaw.to_radians(),
        pitch.to_radians(),
        roll.to_radians(),
    )
}

/// Per-agent control law and checkpoint progression.
///
/// Borrows the course it races on; the course never refers back to agents.
/// Every entry point returns a [`TickResult`] with the reward it produced and,
/// at most once per episode, the terminal transition.
#[derive(Debug)]
pub struct FlightController<'c> {
    course: &'c CheckpointCourse,
    config: FlightConfig,
    smooth: SmoothedControlState,
    phase: FlightPhase,
    next_checkpoint: usize,
    timeout_deadline: u32,
    tick: u32,
    cumulative_reward: f32,
    checkpoints_reached: u32,
    laps: u32,
    splits: Vec<(usize, u32)>,
}

impl<'c> FlightController<'c> {
    pub fn new(course: &'c CheckpointCourse, config: FlightConfig) -> Self {
        Self {
            course,
            config,
            smooth: SmoothedControlState::default(),
            phase: FlightPhase::Flying,
            next_checkpoint: 1 % course.len(),
            timeout_deadline: 0,
            tick: 0,
            cumulative_reward: 0.0,
            checkpoints_reached: 0,
            laps: 0,
            splits: Vec::new(),
        }
    }

    /// Start a new episode: stop the body and put it behind its first target.
    pub fn reset<B: FlightBody, R: Rng>(
        &mut self,
        body: &mut B,
        rng: &mut R,
        agent_index: usize,
        agent_count: usize,
    ) -> SpawnPose {
        body.stop();
        let spawn = self.course.spawn_pose(
            agent_index,
            agent_count,
            self.config.randomize_spawn,
            rng,
        );
        body.set_pose(spawn.position, spawn.orientation);

        self.smooth = SmoothedControlState::default();
        self.phase = FlightPhase::Flying;
        self.next_checkpoint = spawn.next_checkpoint;
        self.tick = 0;
        self.cumulative_reward = 0.0;
        self.checkpoints_reached = 0;
        self.laps = 0;
        self.splits.clear();
        if self.config.training_mode {
            self.timeout_deadline = self.tick.saturating_add(self.config.step_timeout);
        }

        debug!(
            agent = agent_index,
            next_checkpoint = spawn.next_checkpoint,
            "episode reset"
        );
        spawn
    }

    /// Advance one tick: fly, charge the time penalty, check the deadline and
    /// the distance to the next checkpoint.
    ///
    /// A negative or non-finite `dt` flies a zero-length tick.
    pub fn step<B: FlightBody>(
        &mut self,
        body: &mut B,
        input: ControlInput,
        dt: f32,
    ) -> TickResult {
        let mut result = TickResult::default();
        if self.phase.is_terminal() {
            trace!(tick = self.tick, "step after episode end ignored");
            return result;
        }
        let dt = if dt.is_finite() && dt >= 0.0 {
            dt
        } else {
            warn!(tick = self.tick, dt, "invalid tick length, flying zero dt");
            0.0
        };

        self.tick += 1;
        self.fly(body, input, dt);

        if self.config.training_mode {
            if self.config.max_steps > 0 {
                self.reward(&mut result, -1.0 / self.config.max_steps as f32);
            }
            if self.tick > self.timeout_deadline {
                self.reward(&mut result, TIMEOUT_PENALTY);
                result.end = Some(self.finish(EpisodeEnd::TimedOut));
                return result;
            }
        }

        if self.vector_distance(body).length() < self.config.checkpoint_radius {
            result.merge(self.reach_checkpoint());
        }

        if !self.phase.is_terminal()
            && self.config.max_steps > 0
            && self.tick >= self.config.max_steps
        {
            result.end = Some(self.finish(EpisodeEnd::Interrupted));
        }

        result
    }

    /// The agent entered a trigger volume.
    pub fn on_trigger(&mut self, region: Region) -> TickResult {
        if self.phase.is_terminal() {
            warn!(tick = self.tick, ?region, "trigger after episode end ignored");
            return TickResult::default();
        }
        match region {
            Region::Checkpoint(index) if index == self.next_checkpoint => self.reach_checkpoint(),
            _ => TickResult::default(),
        }
    }

    /// The agent hit solid geometry.
    pub fn on_collision(&mut self) -> TickResult {
        let mut result = TickResult::default();
        if self.phase.is_terminal() {
            warn!(tick = self.tick, "collision after episode end ignored");
            return result;
        }
        if self.config.training_mode {
            self.reward(&mut result, COLLISION_PENALTY);
        }
        result.end = Some(self.finish(EpisodeEnd::Collided));
        result
    }

    /// Displacement to the next checkpoint in the body's local frame.
    pub fn vector_distance<B: FlightBody>(&self, body: &B) -> Vec3 {
        let target = self.course.checkpoint(self.next_checkpoint).position;
        body.orientation().inverse() * (target - body.position())
    }

    pub fn state<B: FlightBody>(&self, body: &B) -> AgentState {
        let (pitch, yaw, roll) = euler_degrees(body.orientation());
        AgentState {
            position: body.position(),
            pitch,
            yaw,
            roll,
            linear_velocity: body.velocity(),
            angular_velocity: body.angular_velocity(),
            next_checkpoint: self.next_checkpoint,
            timeout_deadline: self.timeout_deadline,
            training_mode: self.config.training_mode,
            cumulative_reward: self.cumulative_reward,
            tick: self.tick,
        }
    }

    pub fn course(&self) -> &'c CheckpointCourse {
        self.course
    }

    pub fn config(&self) -> &FlightConfig {
        &self.config
    }

    pub fn phase(&self) -> FlightPhase {
        self.phase
    }

    pub fn smoothed(&self) -> SmoothedControlState {
        self.smooth
    }

    pub fn next_checkpoint(&self) -> usize {
        self.next_checkpoint
    }

    pub fn timeout_deadline(&self) -> u32 {
        self.timeout_deadline
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn cumulative_reward(&self) -> f32 {
        self.cumulative_reward
    }

    pub fn checkpoints_reached(&self) -> u32 {
        self.checkpoints_reached
    }

    pub fn laps(&self) -> u32 {
        self.laps
    }

    /// Every checkpoint passed this episode with the tick it was passed on.
    pub fn splits(&self) -> &[(usize, u32)] {
        &self.splits
    }

    fn fly<B: FlightBody>(&mut self, body: &mut B, input: ControlInput, dt: f32) {
        let c = self.config;

        let boost = match c.boost_mode {
            BoostMode::Always => c.boost_multiplier,
            BoostMode::OnDemand if input.boost => c.boost_multiplier,
            BoostMode::OnDemand => 1.0,
        };
        let thrust = body.forward() * c.thrust * boost;
        body.apply_force(thrust);

        let (pitch, yaw, roll) = euler_degrees(body.orientation());

        // Level out when not turning, bank into the turn otherwise.
        let roll_target = if input.yaw.is_neutral() {
            -normalize_angle(roll) / c.max_roll_angle
        } else {
            -input.yaw.value()
        };

        let max_delta = c.smoothing_rate * dt;
        self.smooth.pitch = move_towards(self.smooth.pitch, input.pitch.value(), max_delta);
        self.smooth.yaw = move_towards(self.smooth.yaw, input.yaw.value(), max_delta);
        self.smooth.roll = move_towards(self.smooth.roll, roll_target, max_delta);

        let pitch = normalize_angle(pitch + self.smooth.pitch * dt * c.pitch_speed)
            .clamp(-c.max_pitch_angle, c.max_pitch_angle);
        let yaw = yaw + self.smooth.yaw * dt * c.yaw_speed;
        let roll = normalize_angle(roll + self.smooth.roll * dt * c.roll_speed)
            .clamp(-c.max_roll_angle, c.max_roll_angle);

        body.set_orientation(orientation_from_degrees(pitch, yaw, roll));
    }

    fn reach_checkpoint(&mut self) -> TickResult {
        let mut result = TickResult {
            checkpoint: Some(self.next_checkpoint),
            ..TickResult::default()
        };

        self.checkpoints_reached += 1;
        self.splits.push((self.next_checkpoint, self.tick));
        self.next_checkpoint = self.course.next_index(self.next_checkpoint);
        let lap_complete = self.next_checkpoint == 0;
        if lap_complete {
            self.laps += 1;
        }
        debug!(
            tick = self.tick,
            passed = ?result.checkpoint,
            next = self.next_checkpoint,
            "checkpoint reached"
        );

        if self.config.training_mode {
            if lap_complete {
                self.reward(&mut result, COURSE_COMPLETE_REWARD);
                result.end = Some(self.finish(EpisodeEnd::CourseComplete));
            } else {
                self.reward(&mut result, CHECKPOINT_REWARD);
                self.timeout_deadline = self.tick.saturating_add(self.config.step_timeout);
            }
        }

        result
    }

    fn reward(&mut self, result: &mut TickResult, delta: f32) {
        result.reward += delta;
        self.cumulative_reward += delta;
    }

    fn finish(&mut self, end: EpisodeEnd) -> EpisodeEnd {
        self.phase = FlightPhase::Terminal(end);
        info!(
            tick = self.tick,
            ?end,
            reward = self.cumulative_reward,
            checkpoints = self.checkpoints_reached,
            "episode ended"
        );
        end
    }
}
