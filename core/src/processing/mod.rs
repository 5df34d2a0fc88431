pub mod blocking;
pub mod corroboration;
pub mod fov;
pub mod time_to_detect;

pub use blocking::{block_by_source, block_by_time, distinct_sources, ensure_single_source};
pub use corroboration::{compute_corroboration, corroboration_rate, CorroborationTest};
pub use fov::{compute_fov_test, FovOptions, FovResult, FovTest};
pub use time_to_detect::{compute_time_to_detect, LatencySummary, TimeToDetect, TimeToDetectReport};
