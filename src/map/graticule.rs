use crate::geo::GeoPoint;

/// Spacing between vertices along a graticule line, degrees
const PRECISION: f64 = 2.5;

/// Latitude/longitude grid lines every `step` degrees.
/// Meridians stop at ±80° except the ones on multiples of 90°, which run pole
/// to pole, so the poles don't turn into a solid blot.
pub fn graticule_lines(step: f64) -> Vec<Vec<GeoPoint>> {
    let mut lines = Vec::new();
    let count = (360.0 / step).round() as i32;

    for i in 0..count {
        let lon = -180.0 + i as f64 * step;
        let extent = if lon.rem_euclid(90.0) == 0.0 { 90.0 } else { 80.0 };
        lines.push(sample(-extent, extent, |lat| GeoPoint::new(lon, lat)));
    }

    let rows = (80.0 / step).floor() as i32;
    for j in -rows..=rows {
        let lat = j as f64 * step;
        lines.push(sample(-180.0, 180.0, |lon| GeoPoint::new(lon, lat)));
    }

    lines
}

fn sample(from: f64, to: f64, at: impl Fn(f64) -> GeoPoint) -> Vec<GeoPoint> {
    let steps = ((to - from) / PRECISION).ceil().max(1.0) as usize;
    (0..=steps)
        .map(|i| at(from + (to - from) * i as f64 / steps as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_degree_graticule() {
        let lines = graticule_lines(10.0);
        // 36 meridians + 17 parallels (-80..=80)
        assert_eq!(lines.len(), 36 + 17);

        let prime = &lines[18];
        assert_eq!(prime[0], GeoPoint::new(0.0, -90.0));
        assert_eq!(prime.last(), Some(&GeoPoint::new(0.0, 90.0)));

        let minor = &lines[19];
        assert_eq!(minor[0].latitude, -80.0);

        let equator = &lines[36 + 8];
        assert!(equator.iter().all(|p| p.latitude == 0.0));
        assert_eq!(equator.len(), 145);
    }
}
