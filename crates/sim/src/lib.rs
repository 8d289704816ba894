pub mod analyzer;
pub mod body;
pub mod course;
pub mod episode_loop;
pub mod error;
pub mod flight;
pub mod observation;
pub mod path;
pub mod policy;

pub use body::*;
pub use course::*;
pub use episode_loop::*;
pub use error::CourseError;
pub use flight::*;
pub use path::*;
pub use policy::*;
