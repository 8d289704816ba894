use std::path::Path;

use glam::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use skyrace_shared::*;

use crate::error::CourseError;
use crate::path::{SplinePath, WaypointLoop};

/// Where and facing what an agent starts an episode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPose {
    pub next_checkpoint: usize,
    pub position: Vec3,
    pub orientation: Quat,
}

/// Ordered loop of checkpoints; index 0 is the start/finish gate.
///
/// Read-only once built, so any number of agents may borrow one course.
#[derive(Debug)]
pub struct CheckpointCourse {
    checkpoints: Vec<Checkpoint>,
    path: Box<dyn SplinePath>,
}

impl CheckpointCourse {
    /// One checkpoint per unit of the path, plus the finish.
    pub fn from_path(path: impl SplinePath + 'static) -> Result<Self, CourseError> {
        let count = path.max_units();
        Self::build(path, count)
    }

    /// Sample `checkpoint_count + 1` checkpoints; the last one is the finish.
    pub fn build(
        path: impl SplinePath + 'static,
        checkpoint_count: usize,
    ) -> Result<Self, CourseError> {
        if checkpoint_count < 2 {
            return Err(CourseError::DegenerateCourse(checkpoint_count));
        }
        if checkpoint_count > path.max_units() {
            return Err(CourseError::CountExceedsPath {
                count: checkpoint_count,
                max_units: path.max_units(),
            });
        }

        let checkpoints = (0..=checkpoint_count)
            .map(|i| Checkpoint {
                position: path.position_at(path.to_native(i)),
                orientation: path.orientation_at_unit(i),
                kind: if i == checkpoint_count {
                    CheckpointKind::Finish
                } else {
                    CheckpointKind::Gate
                },
            })
            .collect();

        Ok(Self {
            checkpoints,
            path: Box::new(path),
        })
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    pub fn get(&self, index: usize) -> Option<&Checkpoint> {
        self.checkpoints.get(index)
    }

    /// Panics on an out-of-range index; progression keeps indices in range.
    pub fn checkpoint(&self, index: usize) -> &Checkpoint {
        &self.checkpoints[index]
    }

    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.checkpoints.len()
    }

    /// Checkpoint the agent starts behind when heading for `target`.
    /// The start gate counts as lying one before the finish.
    pub fn previous_index(&self, target: usize) -> usize {
        if target == 0 {
            self.checkpoints.len() - 2
        } else {
            target - 1
        }
    }

    pub fn path(&self) -> &dyn SplinePath {
        self.path.as_ref()
    }

    /// Pick the agent's first target and place it on the path just behind it,
    /// fanned out sideways from the other agents.
    pub fn spawn_pose<R: Rng>(
        &self,
        agent_index: usize,
        agent_count: usize,
        randomize: bool,
        rng: &mut R,
    ) -> SpawnPose {
        let next_checkpoint = if randomize {
            rng.gen_range(0..self.checkpoints.len() - 1)
        } else {
            1
        };

        let previous = self.previous_index(next_checkpoint);
        let native = self.path.to_native(previous);
        let base = self.path.position_at(native);
        let orientation = self.path.orientation_at(native);

        let lane = agent_index as f32 - agent_count as f32 / 2.0;
        let spread = rng.gen_range(SPAWN_SPREAD_MIN..=SPAWN_SPREAD_MAX);
        let offset = Vec3::X * lane * spread;

        SpawnPose {
            next_checkpoint,
            position: base + orientation * offset,
            orientation,
        }
    }
}

/// Course description on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseFile {
    pub waypoints: Vec<[f32; 3]>,
    /// Defaults to one checkpoint per waypoint.
    #[serde(default)]
    pub checkpoint_count: Option<usize>,
}

impl CourseFile {
    pub fn load(path: &Path) -> Result<Self, CourseError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn into_course(self) -> Result<CheckpointCourse, CourseError> {
        let path = WaypointLoop::new(self.waypoints.into_iter().map(Vec3::from).collect())?;
        match self.checkpoint_count {
            Some(count) => CheckpointCourse::build(path, count),
            None => CheckpointCourse::from_path(path),
        }
    }
}

/// The built-in circuit: a level circle at course altitude.
pub fn default_course() -> Result<CheckpointCourse, CourseError> {
    let path = WaypointLoop::circle(
        Vec3::new(0.0, COURSE_ALTITUDE, 0.0),
        COURSE_RADIUS,
        COURSE_WAYPOINTS,
    )?;
    CheckpointCourse::from_path(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn loop_of(n: usize) -> WaypointLoop {
        WaypointLoop::circle(Vec3::new(0.0, 100.0, 0.0), 100.0, n).unwrap()
    }

    #[test]
    fn test_build_produces_count_plus_one() {
        for n in 2..12 {
            let course = CheckpointCourse::from_path(loop_of(n)).unwrap();
            assert_eq!(course.len(), n + 1, "loop of {n}");
            assert!(course.checkpoint(n).is_finish());
            assert!(course.checkpoints()[..n].iter().all(|c| !c.is_finish()));
        }
    }

    #[test]
    fn test_finish_coincides_with_start_on_a_loop() {
        let course = CheckpointCourse::from_path(loop_of(6)).unwrap();
        let start = course.checkpoint(0).position;
        let finish = course.checkpoint(6).position;
        assert!((start - finish).length() < 1e-3);
    }

    #[test]
    fn test_build_rejects_degenerate_course() {
        let err = CheckpointCourse::build(loop_of(4), 1).unwrap_err();
        assert!(matches!(err, CourseError::DegenerateCourse(1)));
        let err = CheckpointCourse::build(loop_of(4), 0).unwrap_err();
        assert!(matches!(err, CourseError::DegenerateCourse(0)));
    }

    #[test]
    fn test_build_rejects_count_beyond_path() {
        let err = CheckpointCourse::build(loop_of(4), 5).unwrap_err();
        assert!(matches!(
            err,
            CourseError::CountExceedsPath { count: 5, max_units: 4 }
        ));
    }

    #[test]
    fn test_progression_is_cyclic() {
        let course = CheckpointCourse::from_path(loop_of(5)).unwrap();
        let mut index = 0;
        for _ in 0..course.len() {
            index = course.next_index(index);
        }
        assert_eq!(index, 0);
    }

    #[test]
    fn test_previous_of_start_is_before_finish() {
        let course = CheckpointCourse::from_path(loop_of(5)).unwrap();
        assert_eq!(course.previous_index(0), course.len() - 2);
        assert_eq!(course.previous_index(1), 0);
        assert_eq!(course.previous_index(4), 3);
    }

    #[test]
    fn test_fixed_spawn_is_deterministic_apart_from_spread() {
        let course = CheckpointCourse::from_path(loop_of(8)).unwrap();
        let mut rng_a = Pcg64::seed_from_u64(1);
        let mut rng_b = Pcg64::seed_from_u64(99);

        let a = course.spawn_pose(0, 1, false, &mut rng_a);
        let b = course.spawn_pose(0, 1, false, &mut rng_b);

        assert_eq!(a.next_checkpoint, 1);
        assert_eq!(b.next_checkpoint, 1);
        assert_eq!(a.orientation, b.orientation);
        assert_eq!(a.orientation, course.path().orientation_at(0.0));

        // Single agent sits half a lane to the left of checkpoint 0.
        let base = course.checkpoint(0).position;
        let right = a.orientation * Vec3::X;
        for pose in [a, b] {
            let lateral = (pose.position - base).dot(right);
            assert!(
                (-5.001..=-4.499).contains(&lateral),
                "lateral offset {lateral} outside spread"
            );
            let along = (pose.position - base) - right * lateral;
            assert!(along.length() < 1e-3);
        }
    }

    #[test]
    fn test_agents_fan_out_side_by_side() {
        let course = CheckpointCourse::from_path(loop_of(8)).unwrap();
        let mut rng = Pcg64::seed_from_u64(7);
        let base = course.checkpoint(0).position;

        let offsets: Vec<f32> = (0..4)
            .map(|i| {
                let pose = course.spawn_pose(i, 4, false, &mut rng);
                (pose.position - base).dot(pose.orientation * Vec3::X)
            })
            .collect();

        for w in offsets.windows(2) {
            assert!(w[1] - w[0] >= 7.9, "agents too close: {offsets:?}");
        }
        assert!(offsets[2].abs() < 1e-3, "middle agent on the line: {offsets:?}");
    }

    #[test]
    fn test_random_spawn_targets_stay_before_finish() {
        let course = CheckpointCourse::from_path(loop_of(6)).unwrap();
        let mut rng = Pcg64::seed_from_u64(3);
        let mut seen_start = false;
        for _ in 0..500 {
            let pose = course.spawn_pose(0, 1, true, &mut rng);
            assert!(pose.next_checkpoint < course.len() - 1);
            if pose.next_checkpoint == 0 {
                seen_start = true;
                let expected = course.path().position_at(course.path().to_native(5));
                assert!((pose.position - expected).length() <= 5.0 + 1e-3);
            }
        }
        assert!(seen_start);
    }

    #[test]
    fn test_course_file_round_trip() {
        let file: CourseFile = serde_json::from_str(
            r#"{ "waypoints": [[0,50,0],[0,50,100],[100,50,100],[100,50,0]] }"#,
        )
        .unwrap();
        let course = file.clone().into_course().unwrap();
        assert_eq!(course.len(), 5);

        let limited = CourseFile {
            checkpoint_count: Some(2),
            ..file
        };
        assert_eq!(limited.into_course().unwrap().len(), 3);
    }

    #[test]
    fn test_default_course_builds() {
        let course = default_course().unwrap();
        assert_eq!(course.len(), COURSE_WAYPOINTS + 1);
        assert!(course.checkpoints().iter().all(|c| c.position.y == COURSE_ALTITUDE));
    }
}
