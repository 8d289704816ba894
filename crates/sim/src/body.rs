use glam::{Quat, Vec3};
use skyrace_shared::BodyConfig;

/// Rigid body the flight controller steers.
///
/// The controller only writes orientation and forces; integrating them is
/// left to whoever owns the body.
///
/// Body axes follow the game-engine convention: +Z forward, +Y up and +X
/// right. That frame is left-handed, so with glam's right-handed rotations
/// a body facing world +X has its local right along world -Z.
pub trait FlightBody {
    fn position(&self) -> Vec3;
    fn orientation(&self) -> Quat;
    fn velocity(&self) -> Vec3;
    fn angular_velocity(&self) -> Vec3;

    fn set_pose(&mut self, position: Vec3, orientation: Quat);
    fn set_orientation(&mut self, orientation: Quat);
    /// Accumulate a world-space force for the next `advance`.
    fn apply_force(&mut self, force: Vec3);
    /// Zero linear and angular velocity.
    fn stop(&mut self);
    fn advance(&mut self, dt: f32);

    fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::Z
    }
}

/// Point mass with linear drag. Orientation is set directly by the controller,
/// angular velocity is derived from successive orientations.
#[derive(Debug, Clone)]
pub struct PointMassBody {
    config: BodyConfig,
    position: Vec3,
    orientation: Quat,
    velocity: Vec3,
    angular_velocity: Vec3,
    force: Vec3,
    prev_orientation: Quat,
}

impl PointMassBody {
    pub fn new(config: BodyConfig) -> Self {
        Self {
            config,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            force: Vec3::ZERO,
            prev_orientation: Quat::IDENTITY,
        }
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    pub fn pending_force(&self) -> Vec3 {
        self.force
    }
}

impl Default for PointMassBody {
    fn default() -> Self {
        Self::new(BodyConfig::default())
    }
}

impl FlightBody for PointMassBody {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn orientation(&self) -> Quat {
        self.orientation
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    fn set_pose(&mut self, position: Vec3, orientation: Quat) {
        self.position = position;
        self.orientation = orientation;
        self.prev_orientation = orientation;
    }

    fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation;
    }

    fn apply_force(&mut self, force: Vec3) {
        self.force += force;
    }

    fn stop(&mut self) {
        self.velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
        self.force = Vec3::ZERO;
    }

    fn advance(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }

        let accel = self.force / self.config.mass;
        self.velocity += accel * dt;
        self.velocity *= (1.0 - self.config.linear_drag * dt).clamp(0.0, 1.0);
        self.position += self.velocity * dt;
        self.force = Vec3::ZERO;

        let delta = self.orientation * self.prev_orientation.inverse();
        let (axis, mut angle) = delta.to_axis_angle();
        if angle > std::f32::consts::PI {
            angle -= std::f32::consts::TAU;
        }
        self.angular_velocity = axis * (angle / dt);
        self.angular_velocity *= (1.0 - self.config.angular_drag * dt).clamp(0.0, 1.0);
        self.prev_orientation = self.orientation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_accelerates_along_forward() {
        let mut body = PointMassBody::default();
        body.set_pose(Vec3::new(0.0, 100.0, 0.0), Quat::IDENTITY);
        for _ in 0..50 {
            let f = body.forward() * 100_000.0;
            body.apply_force(f);
            body.advance(0.02);
        }
        assert!(body.velocity().z > 0.0);
        assert!(body.velocity().x.abs() < 1e-4);
        assert!(body.position().z > 0.0);
        assert_eq!(body.position().y, 100.0);
    }

    #[test]
    fn test_drag_bounds_speed() {
        let config = BodyConfig::default();
        let terminal = 200_000.0 / (config.mass * config.linear_drag);
        let mut body = PointMassBody::new(config);
        for _ in 0..5000 {
            body.apply_force(Vec3::Z * 200_000.0);
            body.advance(0.02);
        }
        assert!(
            body.velocity().length() <= terminal,
            "speed {} exceeds terminal {}",
            body.velocity().length(),
            terminal
        );
    }

    #[test]
    fn test_force_is_consumed_by_advance() {
        let mut body = PointMassBody::default();
        body.apply_force(Vec3::X);
        assert_eq!(body.pending_force(), Vec3::X);
        body.advance(0.02);
        assert_eq!(body.pending_force(), Vec3::ZERO);
    }

    #[test]
    fn test_stop_clears_motion() {
        let mut body = PointMassBody::default();
        body.set_velocity(Vec3::new(1.0, 2.0, 3.0));
        body.set_orientation(Quat::from_rotation_y(0.1));
        body.advance(0.02);
        assert!(body.angular_velocity().length() > 0.0);
        body.stop();
        assert_eq!(body.velocity(), Vec3::ZERO);
        assert_eq!(body.angular_velocity(), Vec3::ZERO);
    }

    #[test]
    fn test_angular_velocity_tracks_yaw_rate() {
        let mut body = PointMassBody::new(BodyConfig {
            angular_drag: 0.0,
            ..BodyConfig::default()
        });
        body.set_orientation(Quat::from_rotation_y(0.02));
        body.advance(0.02);
        let w = body.angular_velocity();
        assert!((w.y - 1.0).abs() < 1e-2, "got {w:?}");
    }
}
