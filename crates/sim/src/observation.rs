use skyrace_shared::*;

use crate::body::FlightBody;
use crate::flight::FlightController;

impl FlightController<'_> {
    /// Observation vector (9 floats), all in the agent's local frame:
    /// velocity, displacement to the next checkpoint, and that checkpoint's
    /// forward axis.
    pub fn observe<B: FlightBody>(&self, body: &B) -> Observation {
        let mut data = [0.0f32; OBS_SIZE];
        let to_local = body.orientation().inverse();

        let velocity = to_local * body.velocity();
        let target = self.vector_distance(body);
        let target_forward = to_local * self.course().checkpoint(self.next_checkpoint()).forward();

        data[0..3].copy_from_slice(&velocity.to_array());
        data[3..6].copy_from_slice(&target.to_array());
        data[6..9].copy_from_slice(&target_forward.to_array());

        Observation { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::PointMassBody;
    use crate::course::CheckpointCourse;
    use crate::path::WaypointLoop;
    use glam::Vec3;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    #[test]
    fn test_observation_at_spawn() {
        let path = WaypointLoop::new(vec![
            Vec3::new(0.0, 100.0, 0.0),
            Vec3::new(0.0, 100.0, 200.0),
            Vec3::new(200.0, 100.0, 200.0),
            Vec3::new(200.0, 100.0, 0.0),
        ])
        .unwrap();
        let course = CheckpointCourse::from_path(path).unwrap();
        let mut ctrl = FlightController::new(&course, FlightConfig::evaluation());
        let mut body = PointMassBody::default();
        ctrl.reset(&mut body, &mut Pcg64::seed_from_u64(0), 0, 1);

        let obs = ctrl.observe(&body);

        assert_eq!(obs.local_velocity(), Vec3::ZERO);
        // Checkpoint 1 is 200 ahead, the agent spawned half a lane to the left.
        let target = obs.local_target();
        assert!((target.z - 200.0).abs() < 1e-3, "got {target:?}");
        assert!((4.5..=5.0 + 1e-3).contains(&target.x), "got {target:?}");
        assert!(target.y.abs() < 1e-3);
        // Checkpoint 1 faces the next leg (+X world), which is local right.
        let fwd = obs.local_target_forward();
        assert!((fwd - Vec3::X).length() < 1e-4, "got {fwd:?}");
    }
}
