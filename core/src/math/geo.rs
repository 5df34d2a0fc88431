//! Closed-form geodesy on a spherical Earth.
//!
//! Two radii are in play and they are not interchangeable: the haversine
//! distance uses the 6373 km figure, while destination points and ENU
//! projection use the IUGG mean radius of 6 371 009 m.

use serde::{Deserialize, Serialize};

/// Sphere radius used by [`great_circle_distance_km`].
pub const HAVERSINE_RADIUS_KM: f64 = 6373.0;

/// Mean Earth radius used for destination points and ENU projection.
pub const MEAN_EARTH_RADIUS_M: f64 = 6.371009e6;

/// Geodetic position in degrees/degrees/meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl GeoPosition {
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }
}

/// East/North/Up offsets in meters from a local origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LocalEnu {
    pub east: f64,
    pub north: f64,
    pub up: f64,
}

impl LocalEnu {
    pub fn to_array(self) -> [f64; 3] {
        [self.east, self.north, self.up]
    }
}

/// Haversine distance in kilometers.
///
/// Identical coordinate pairs return exactly zero instead of going through
/// `atan2(0, 1)` arithmetic.
pub fn great_circle_distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    if lat1 == lat2 && lon1 == lon2 {
        return 0.0;
    }
    let (lat1, lon1) = (lat1.to_radians(), lon1.to_radians());
    let (lat2, lon2) = (lat2.to_radians(), lon2.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    HAVERSINE_RADIUS_KM * c
}

/// Haversine distance in meters.
pub fn great_circle_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    great_circle_distance_km(lat1, lon1, lat2, lon2) * 1000.0
}

/// Turns a detector-relative azimuth into a compass bearing.
///
/// Non-positive azimuths map to `-azimuth`, positive ones to
/// `360 - azimuth`; the detector heading is then added. The result is not
/// wrapped into `[0, 360)`.
pub fn target_bearing(azimuth_deg: f64, heading_deg: f64) -> f64 {
    let relative = if azimuth_deg <= 0.0 {
        -azimuth_deg
    } else {
        360.0 - azimuth_deg
    };
    relative + heading_deg
}

/// Geodetic position of a target measured at `range_m`/`azimuth_deg`/
/// `elevation_deg` from a receiver at `receiver` looking along `heading_deg`.
pub fn target_position(
    range_m: f64,
    azimuth_deg: f64,
    elevation_deg: f64,
    receiver: GeoPosition,
    heading_deg: f64,
) -> GeoPosition {
    let horizontal = range_m * elevation_deg.to_radians().cos();
    let vertical = range_m * elevation_deg.to_radians().sin();
    let bearing = target_bearing(azimuth_deg, heading_deg).to_radians();

    let radius = MEAN_EARTH_RADIUS_M + receiver.altitude;
    let angular = horizontal / radius;
    let lat1 = receiver.latitude.to_radians();
    let lon1 = receiver.longitude.to_radians();

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * angular.sin() * lat1.cos())
            .atan2(angular.cos() - lat1.sin() * lat2.sin());

    GeoPosition {
        latitude: lat2.to_degrees(),
        longitude: lon2.to_degrees(),
        altitude: receiver.altitude + vertical,
    }
}

/// Earth-centred Cartesian coordinates on the mean sphere.
pub fn geodetic_to_ecef(position: GeoPosition) -> [f64; 3] {
    let lat = position.latitude.to_radians();
    let lon = position.longitude.to_radians();
    let r = MEAN_EARTH_RADIUS_M + position.altitude;
    [
        r * lat.cos() * lon.cos(),
        r * lat.cos() * lon.sin(),
        r * lat.sin(),
    ]
}

/// Projects `position` into the ENU tangent frame anchored at `origin`.
pub fn geodetic_to_local_enu(position: GeoPosition, origin: GeoPosition) -> LocalEnu {
    let [x, y, z] = geodetic_to_ecef(position);
    let [x0, y0, z0] = geodetic_to_ecef(origin);
    let (dx, dy, dz) = (x - x0, y - y0, z - z0);

    let lat0 = origin.latitude.to_radians();
    let lon0 = origin.longitude.to_radians();
    let (sin_lat, cos_lat) = lat0.sin_cos();
    let (sin_lon, cos_lon) = lon0.sin_cos();

    LocalEnu {
        east: -sin_lon * dx + cos_lon * dy,
        north: -sin_lat * cos_lon * dx - sin_lat * sin_lon * dy + cos_lat * dz,
        up: cos_lat * cos_lon * dx + cos_lat * sin_lon * dy + sin_lat * dz,
    }
}

/// Inverse of [`geodetic_to_local_enu`] on the same sphere.
pub fn local_enu_to_geodetic(enu: LocalEnu, origin: GeoPosition) -> GeoPosition {
    let [x0, y0, z0] = geodetic_to_ecef(origin);
    let lat0 = origin.latitude.to_radians();
    let lon0 = origin.longitude.to_radians();
    let (sin_lat, cos_lat) = lat0.sin_cos();
    let (sin_lon, cos_lon) = lon0.sin_cos();

    let x = x0 - sin_lon * enu.east - sin_lat * cos_lon * enu.north + cos_lat * cos_lon * enu.up;
    let y = y0 + cos_lon * enu.east - sin_lat * sin_lon * enu.north + cos_lat * sin_lon * enu.up;
    let z = z0 + cos_lat * enu.north + sin_lat * enu.up;

    let r = (x * x + y * y + z * z).sqrt();
    GeoPosition {
        latitude: (z / r).asin().to_degrees(),
        longitude: y.atan2(x).to_degrees(),
        altitude: r - MEAN_EARTH_RADIUS_M,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn distance_to_self_is_exactly_zero() {
        for &(lat, lon) in &[(0.0, 0.0), (65.12624067, -147.47648183), (-89.9, 179.9)] {
            assert_eq!(great_circle_distance_km(lat, lon, lat, lon), 0.0);
            assert_eq!(great_circle_distance(lat, lon, lat, lon), 0.0);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let a = (65.12624067, -147.47648183);
        let b = (65.1283760368824, -147.47867703437805);
        let ab = great_circle_distance(a.0, a.1, b.0, b.1);
        let ba = great_circle_distance(b.0, b.1, a.0, a.1);
        assert!(approx_eq(ab, ba, 1e-9));
        assert!(ab > 0.0);
    }

    #[test]
    fn one_degree_of_latitude_on_the_haversine_sphere() {
        let d = great_circle_distance_km(0.0, 0.0, 1.0, 0.0);
        assert!(approx_eq(d, HAVERSINE_RADIUS_KM * 1f64.to_radians(), 1e-9));
    }

    #[test]
    fn bearing_mapping_is_asymmetric() {
        assert_eq!(target_bearing(0.0, 0.0), 0.0);
        assert_eq!(target_bearing(-30.0, 0.0), 30.0);
        assert_eq!(target_bearing(30.0, 0.0), 330.0);
        assert_eq!(target_bearing(30.0, 90.0), 420.0);
    }

    #[test]
    fn zero_range_returns_receiver_position() {
        let receiver = GeoPosition::new(65.12624067, -147.47648183, 211.8);
        for &(az, el) in &[(0.0, 0.0), (45.0, 10.0), (-120.0, -5.0)] {
            let target = target_position(0.0, az, el, receiver, 37.0);
            assert!(approx_eq(target.latitude, receiver.latitude, 1e-12));
            assert!(approx_eq(target.longitude, receiver.longitude, 1e-12));
            assert!(approx_eq(target.altitude, receiver.altitude, 1e-12));
        }
    }

    #[test]
    fn boresight_target_lies_along_heading() {
        let receiver = GeoPosition::new(45.0, 10.0, 0.0);
        // Heading due north, azimuth zero: latitude grows, longitude stays.
        let target = target_position(1000.0, 0.0, 0.0, receiver, 0.0);
        assert!(target.latitude > receiver.latitude);
        assert!(approx_eq(target.longitude, receiver.longitude, 1e-9));
        let horizontal = great_circle_distance(
            receiver.latitude,
            receiver.longitude,
            target.latitude,
            target.longitude,
        );
        // The two radii differ by about 0.03%.
        assert!(approx_eq(horizontal, 1000.0, 1.0));
    }

    #[test]
    fn elevation_splits_range_into_height() {
        let receiver = GeoPosition::new(45.0, 10.0, 100.0);
        let target = target_position(200.0, 0.0, 30.0, receiver, 0.0);
        assert!(approx_eq(target.altitude, 200.0, 1e-9));
    }

    #[test]
    fn enu_of_origin_is_zero() {
        let origin = GeoPosition::new(65.12624067, -147.47648183, 211.8);
        let enu = geodetic_to_local_enu(origin, origin);
        assert!(approx_eq(enu.east, 0.0, 1e-6));
        assert!(approx_eq(enu.north, 0.0, 1e-6));
        assert!(approx_eq(enu.up, 0.0, 1e-6));
    }

    #[test]
    fn enu_projection_inverts() {
        let origin = GeoPosition::new(65.12624067, -147.47648183, 211.8);
        let enu = LocalEnu {
            east: 812.5,
            north: -240.0,
            up: 95.25,
        };
        let position = local_enu_to_geodetic(enu, origin);
        let back = geodetic_to_local_enu(position, origin);
        assert!(approx_eq(back.east, enu.east, 1e-6));
        assert!(approx_eq(back.north, enu.north, 1e-6));
        assert!(approx_eq(back.up, enu.up, 1e-6));
    }

    #[test]
    fn enu_axes_point_the_right_way() {
        let origin = GeoPosition::new(10.0, 20.0, 0.0);
        let north = geodetic_to_local_enu(GeoPosition::new(10.01, 20.0, 0.0), origin);
        assert!(north.north > 1000.0 && north.east.abs() < 1e-6);
        let east = geodetic_to_local_enu(GeoPosition::new(10.0, 20.01, 0.0), origin);
        assert!(east.east > 1000.0 && east.north.abs() < 1.0);
        let up = geodetic_to_local_enu(GeoPosition::new(10.0, 20.0, 50.0), origin);
        assert!(approx_eq(up.up, 50.0, 1e-6));
    }
}
