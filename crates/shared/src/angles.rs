/// Wrap an angle in degrees into [-180, 180].
pub fn normalize_angle(a: f32) -> f32 {
    if (-180.0..=180.0).contains(&a) || !a.is_finite() {
        return a;
    }
    (a + 180.0).rem_euclid(360.0) - 180.0
}

/// Move `current` toward `target` by at most `max_delta`.
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let diff = target - current;
    if diff.abs() <= max_delta {
        target
    } else {
        current + diff.signum() * max_delta
    }
}
