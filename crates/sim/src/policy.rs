use glam::Quat;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use skyrace_shared::{
    move_towards, ControlInput, Deflection, Observation, ACTION_BRANCHES, DT, MAX_ROLL_ANGLE,
    ROLL_SPEED, SMOOTHING_RATE,
};

/// Source of one control input per decision, scripted or learned.
pub trait Policy: Send {
    fn name(&self) -> &str;
    fn act(&mut self, obs: &Observation) -> ControlInput;
}

/// Policy that does nothing - flies straight ahead.
pub struct DoNothingPolicy;

impl Policy for DoNothingPolicy {
    fn name(&self) -> &str {
        "do_nothing"
    }

    fn act(&mut self, _obs: &Observation) -> ControlInput {
        ControlInput::none()
    }
}

/// Bang-bang pursuit of the next checkpoint.
///
/// Yaws toward the target while it is off to the side and pitches toward it
/// while it is above or below, with a dead band so it stops correcting once
/// roughly lined up. Boosts on long straights.
///
/// Yawing banks the airframe, which rotates the observed target around the
/// forward axis. The policy tracks the bank it has commanded by replaying the
/// stock roll law, and steers in the unbanked frame. The estimate assumes one
/// decision per tick at [`DT`] with the stock rates.
pub struct PursuitPolicy {
    /// Tolerated off-axis angle, as a tangent.
    pub dead_band: f32,
    pub boost_distance: f32,
    roll_rate: f32,
    roll: f32,
}

impl PursuitPolicy {
    pub fn new() -> Self {
        Self {
            dead_band: 0.05,
            boost_distance: 80.0,
            roll_rate: 0.0,
            roll: 0.0,
        }
    }

    /// Estimated bank angle in degrees.
    pub fn roll_estimate(&self) -> f32 {
        self.roll
    }

    fn track_roll(&mut self, yaw: Deflection) {
        let target = if yaw.is_neutral() {
            -self.roll / MAX_ROLL_ANGLE
        } else {
            -yaw.value()
        };
        self.roll_rate = move_towards(self.roll_rate, target, SMOOTHING_RATE * DT);
        self.roll = (self.roll + self.roll_rate * DT * ROLL_SPEED)
            .clamp(-MAX_ROLL_ANGLE, MAX_ROLL_ANGLE);
    }
}

impl Default for PursuitPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl Policy for PursuitPolicy {
    fn name(&self) -> &str {
        "pursuit"
    }

    fn act(&mut self, obs: &Observation) -> ControlInput {
        let target = Quat::from_rotation_z(self.roll.to_radians()) * obs.local_target();
        let ahead = target.z.max(1.0);

        let yaw = if (target.x / ahead).abs() > self.dead_band || target.z < 0.0 {
            Deflection::from_sign(target.x)
        } else {
            Deflection::Neutral
        };

        // Positive pitch noses down.
        let pitch = if (target.y / ahead).abs() > self.dead_band {
            Deflection::from_sign(-target.y)
        } else {
            Deflection::Neutral
        };

        let boost = yaw.is_neutral() && target.length() > self.boost_distance;
        self.track_roll(yaw);

        ControlInput { pitch, yaw, boost }
    }
}

/// Uniform random discrete actions, decoded with the host's branch encoding.
pub struct RandomPolicy {
    rng: Pcg64,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn name(&self) -> &str {
        "random"
    }

    fn act(&mut self, _obs: &Observation) -> ControlInput {
        let raw: [u8; ACTION_BRANCHES] = [
            self.rng.gen_range(0..3),
            self.rng.gen_range(0..3),
            self.rng.gen_range(0..2),
        ];
        ControlInput::from_discrete(raw).unwrap_or_default()
    }
}

pub const POLICY_NAMES: &[&str] = &["do_nothing", "pursuit", "random"];

/// Resolve a policy name; `seed` only matters for stochastic policies.
pub fn resolve_policy(name: &str, seed: u64) -> Option<Box<dyn Policy>> {
    match name {
        "do_nothing" => Some(Box::new(DoNothingPolicy)),
        "pursuit" => Some(Box::new(PursuitPolicy::new())),
        "random" => Some(Box::new(RandomPolicy::new(seed))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyrace_shared::OBS_SIZE;

    fn obs_with_target(x: f32, y: f32, z: f32) -> Observation {
        let mut data = [0.0; OBS_SIZE];
        data[3] = x;
        data[4] = y;
        data[5] = z;
        Observation { data }
    }

    #[test]
    fn test_pursuit_turns_toward_target() {
        let mut p = PursuitPolicy::new();
        let right = p.act(&obs_with_target(50.0, 0.0, 100.0));
        assert_eq!(right.yaw, Deflection::Positive);
        let left = p.act(&obs_with_target(-50.0, 0.0, 100.0));
        assert_eq!(left.yaw, Deflection::Negative);
    }

    #[test]
    fn test_pursuit_climbs_toward_higher_target() {
        let mut p = PursuitPolicy::new();
        let up = p.act(&obs_with_target(0.0, 40.0, 100.0));
        assert_eq!(up.pitch, Deflection::Negative);
        let down = p.act(&obs_with_target(0.0, -40.0, 100.0));
        assert_eq!(down.pitch, Deflection::Positive);
    }

    #[test]
    fn test_pursuit_holds_course_when_aligned() {
        let mut p = PursuitPolicy::new();
        let a = p.act(&obs_with_target(1.0, -1.0, 200.0));
        assert_eq!(a.yaw, Deflection::Neutral);
        assert_eq!(a.pitch, Deflection::Neutral);
        assert!(a.boost);
    }

    #[test]
    fn test_pursuit_turns_around_for_target_behind() {
        let mut p = PursuitPolicy::new();
        let a = p.act(&obs_with_target(0.5, 0.0, -100.0));
        assert_eq!(a.yaw, Deflection::Positive);
    }

    #[test]
    fn test_pursuit_tracks_bank_while_turning() {
        let mut p = PursuitPolicy::new();
        for _ in 0..100 {
            p.act(&obs_with_target(0.0, 0.0, -100.0));
        }
        // Turning right banks right, which is negative roll.
        assert_eq!(p.roll_estimate(), -MAX_ROLL_ANGLE);
        for _ in 0..500 {
            p.act(&obs_with_target(0.0, 0.0, 100.0));
        }
        assert!(p.roll_estimate().abs() < 1.0, "got {}", p.roll_estimate());
    }

    #[test]
    fn test_pursuit_unbanks_target_before_steering() {
        let mut p = PursuitPolicy::new();
        for _ in 0..100 {
            p.act(&obs_with_target(0.0, 0.0, -100.0));
        }
        // Banked 45 degrees right, a target below the unbanked nose shows up
        // down and to the right in the body frame.
        let d = 40.0 * std::f32::consts::FRAC_1_SQRT_2;
        let a = p.act(&obs_with_target(d, -d, 100.0));
        assert_eq!(a.yaw, Deflection::Neutral);
        assert_eq!(a.pitch, Deflection::Positive);
    }

    #[test]
    fn test_random_policy_is_seeded() {
        let obs = obs_with_target(0.0, 0.0, 0.0);
        let mut a = RandomPolicy::new(11);
        let mut b = RandomPolicy::new(11);
        let seq_a: Vec<_> = (0..32).map(|_| a.act(&obs)).collect();
        let seq_b: Vec<_> = (0..32).map(|_| b.act(&obs)).collect();
        assert_eq!(seq_a, seq_b);
        assert!(seq_a.iter().any(|c| c.yaw == Deflection::Negative));
    }

    #[test]
    fn test_resolve_policy_names() {
        for name in POLICY_NAMES {
            let p = resolve_policy(name, 0).expect("known policy");
            assert_eq!(p.name(), *name);
        }
        assert!(resolve_policy("ace", 0).is_none());
    }
}
