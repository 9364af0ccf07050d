pub mod driver;
pub mod score;

pub use driver::{Driver, DriverError, ModLane, PitchSource};
pub use score::{Score, ScoreBuilder, ScoreError};
