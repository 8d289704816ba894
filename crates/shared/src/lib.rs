mod angles;
mod constants;
mod types;

pub use angles::*;
pub use constants::*;
pub use types::*;
