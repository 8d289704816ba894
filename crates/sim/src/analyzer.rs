use skyrace_shared::*;

/// Flight metrics summarizing one recorded episode.
#[derive(Debug, Clone)]
pub struct LapMetrics {
    /// Path length flown between recorded frames.
    pub distance_flown: f32,
    pub mean_speed: f32,
    pub peak_speed: f32,
    /// Largest absolute bank angle seen, in degrees.
    pub peak_bank: f32,
    /// Largest absolute pitch angle seen, in degrees.
    pub peak_pitch: f32,
    /// Seconds between consecutive checkpoint passes.
    pub split_times: Vec<f32>,
    /// Seconds from spawn to course completion, if the course was completed.
    pub completion_time: Option<f32>,
}

/// Analyze a recorded episode.
pub fn analyze(record: &EpisodeRecord) -> LapMetrics {
    let frames = &record.frames;

    let mut distance_flown = 0.0f32;
    for pair in frames.windows(2) {
        let dx = pair[1].x - pair[0].x;
        let dy = pair[1].y - pair[0].y;
        let dz = pair[1].z - pair[0].z;
        distance_flown += (dx * dx + dy * dy + dz * dz).sqrt();
    }

    let mut speed_sum = 0.0f32;
    let mut peak_speed = 0.0f32;
    let mut peak_bank = 0.0f32;
    let mut peak_pitch = 0.0f32;
    for f in frames {
        speed_sum += f.speed;
        peak_speed = peak_speed.max(f.speed);
        peak_bank = peak_bank.max(f.roll.abs());
        peak_pitch = peak_pitch.max(f.pitch.abs());
    }
    let mean_speed = if frames.is_empty() {
        0.0
    } else {
        speed_sum / frames.len() as f32
    };

    let mut split_times = Vec::with_capacity(record.result.splits.len());
    let mut last_tick = 0u32;
    for &(_, tick) in &record.result.splits {
        split_times.push(tick.saturating_sub(last_tick) as f32 * DT);
        last_tick = tick;
    }

    let completion_time = match record.result.end {
        Some(EpisodeEnd::CourseComplete) => Some(record.result.final_tick as f32 * DT),
        _ => None,
    };

    LapMetrics {
        distance_flown,
        mean_speed,
        peak_speed,
        peak_bank,
        peak_pitch,
        split_times,
        completion_time,
    }
}
