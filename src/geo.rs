use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// A geographic coordinate in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self { longitude, latitude }
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((longitude, latitude): (f64, f64)) -> Self {
        Self { longitude, latitude }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}°{}, {:.1}°{}",
            self.latitude.abs(),
            if self.latitude >= 0.0 { "N" } else { "S" },
            self.longitude.abs(),
            if self.longitude >= 0.0 { "E" } else { "W" }
        )
    }
}

/// Convert lon/lat (degrees) to a unit sphere vector.
/// x points at (0°, 0°), y at (90°E, 0°), z at the north pole.
#[inline(always)]
pub fn to_unit_vector(p: GeoPoint) -> DVec3 {
    let lon_rad = p.longitude.to_radians();
    let lat_rad = p.latitude.to_radians();
    DVec3::new(
        lat_rad.cos() * lon_rad.cos(),
        lat_rad.cos() * lon_rad.sin(),
        lat_rad.sin(),
    )
}

/// Inverse of [`to_unit_vector`]. The input does not need to be normalized.
#[inline(always)]
pub fn from_unit_vector(v: DVec3) -> GeoPoint {
    let v = v.normalize_or_zero();
    GeoPoint {
        longitude: v.y.atan2(v.x).to_degrees(),
        latitude: v.z.clamp(-1.0, 1.0).asin().to_degrees(),
    }
}

/// Great-circle distance in radians (haversine).
pub fn angular_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let dlat = lat_b - lat_a;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt())
}

/// Interpolate along a great circle arc and call a visitor for each subdivision point.
/// Subdivides into ~2° segments, the start point itself is not emitted.
#[inline]
pub fn walk_great_circle(from: GeoPoint, to: GeoPoint, mut visitor: impl FnMut(GeoPoint)) {
    let a = to_unit_vector(from);
    let b = to_unit_vector(to);

    let angle = a.dot(b).clamp(-1.0, 1.0).acos();
    let steps = ((angle.to_degrees() / 2.0).ceil() as usize).max(1);

    let sin_angle = angle.sin();
    if steps == 1 || sin_angle.abs() < 1e-10 {
        // Short, identical or antipodal: no unique arc to follow
        visitor(to);
        return;
    }

    for i in 1..steps {
        let t = i as f64 / steps as f64;
        let sa = ((1.0 - t) * angle).sin() / sin_angle;
        let sb = (t * angle).sin() / sin_angle;
        visitor(from_unit_vector(a * sa + b * sb));
    }
    visitor(to);
}
