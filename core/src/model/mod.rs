pub mod detector;
pub mod encounter;
pub mod point;

pub use detector::{DetectorPose, FieldOfView, SphericalMeasurement};
pub use encounter::{Block, Encounter};
pub use point::{seconds_between, Annotations, Point, Velocity};
