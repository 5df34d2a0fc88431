pub mod geo;
pub mod matrix;
pub mod stats;

pub use geo::{
    geodetic_to_ecef, geodetic_to_local_enu, great_circle_distance, great_circle_distance_km,
    local_enu_to_geodetic, target_bearing, target_position, GeoPosition, LocalEnu,
};
pub use matrix::MatrixHelper;
pub use stats::StatsHelper;
