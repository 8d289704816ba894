use std::f32::consts::TAU;
use std::fmt;

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::CourseError;

/// Path description the course samples checkpoints from.
///
/// Units are whole positions along the path (one per waypoint); native
/// coordinates are whatever the provider evaluates positions in.
pub trait SplinePath: fmt::Debug + Send + Sync {
    /// Number of addressable unit positions.
    fn max_units(&self) -> usize;
    fn to_native(&self, unit: usize) -> f32;
    fn position_at(&self, native: f32) -> Vec3;
    fn orientation_at(&self, native: f32) -> Quat;

    fn orientation_at_unit(&self, unit: usize) -> Quat {
        self.orientation_at(self.to_native(unit))
    }
}

/// Orientation whose forward (+Z) axis points along `dir`, with no roll.
pub fn look_rotation(dir: Vec3) -> Quat {
    let d = dir.normalize_or_zero();
    if d == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let yaw = d.x.atan2(d.z);
    let pitch = -d.y.clamp(-1.0, 1.0).asin();
    Quat::from_euler(EulerRot::YXZ, yaw, pitch, 0.0)
}

/// Closed loop through straight segments between waypoints.
///
/// Unit `i` sits on waypoint `i`; unit `len` wraps back onto waypoint 0.
/// Orientation is constant along a segment and faces the next waypoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaypointLoop {
    waypoints: Vec<Vec3>,
}

impl WaypointLoop {
    pub fn new(waypoints: Vec<Vec3>) -> Result<Self, CourseError> {
        if waypoints.len() < 2 {
            return Err(CourseError::TooFewWaypoints(waypoints.len()));
        }
        Ok(Self { waypoints })
    }

    /// Evenly spaced waypoints on a horizontal circle, counter-clockwise seen from above.
    pub fn circle(center: Vec3, radius: f32, count: usize) -> Result<Self, CourseError> {
        let waypoints = (0..count)
            .map(|i| {
                let theta = TAU * i as f32 / count as f32;
                center + Vec3::new(radius * theta.sin(), 0.0, radius * theta.cos())
            })
            .collect();
        Self::new(waypoints)
    }

    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    fn segment(&self, native: f32) -> (usize, f32) {
        let n = self.waypoints.len();
        let t = native.rem_euclid(n as f32);
        let i = (t.floor() as usize).min(n - 1);
        (i, t - i as f32)
    }
}

impl SplinePath for WaypointLoop {
    fn max_units(&self) -> usize {
        self.waypoints.len()
    }

    fn to_native(&self, unit: usize) -> f32 {
        unit as f32
    }

    fn position_at(&self, native: f32) -> Vec3 {
        let (i, frac) = self.segment(native);
        let a = self.waypoints[i];
        let b = self.waypoints[(i + 1) % self.waypoints.len()];
        a.lerp(b, frac)
    }

    fn orientation_at(&self, native: f32) -> Quat {
        let (i, _) = self.segment(native);
        let a = self.waypoints[i];
        let b = self.waypoints[(i + 1) % self.waypoints.len()];
        look_rotation(b - a)
    }
}
