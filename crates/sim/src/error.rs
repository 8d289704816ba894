use thiserror::Error;

#[derive(Debug, Error)]
pub enum CourseError {
    #[error("course needs at least 2 checkpoints, got {0}")]
    DegenerateCourse(usize),
    #[error("checkpoint count {count} exceeds the {max_units} units of the path")]
    CountExceedsPath { count: usize, max_units: usize },
    #[error("waypoint loop needs at least 2 waypoints, got {0}")]
    TooFewWaypoints(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid course file: {0}")]
    Json(#[from] serde_json::Error),
}
