use glam::{DMat3, DVec3};
use std::f64::consts::FRAC_PI_2;

use crate::geo::{angular_distance, from_unit_vector, to_unit_vector, walk_great_circle, GeoPoint};

/// Slack on the horizon test so points exactly 90° away stay visible.
const HORIZON_EPSILON: f64 = 1e-12;

/// Screen point in surface pixels.
pub type ScreenPoint = (f64, f64);

/// Orthographic projection of a rotating sphere.
///
/// Rotation follows the `[λ, φ]` convention: a point is first spun by λ
/// around the polar axis, then tilted by φ around the horizontal screen axis.
/// The view centre is therefore `(-λ, -φ)` on the globe.
#[derive(Clone, Debug)]
pub struct ProjectionState {
    /// Rotation around the polar axis, degrees. Unbounded.
    lambda: f64,
    /// Tilt around the horizontal axis, degrees. Unbounded.
    phi: f64,
    /// Sphere radius in surface pixels
    scale: f64,
    initial_scale: f64,
    min_zoom: f64,
    max_zoom: f64,
    /// Screen position of the sphere centre
    translate: ScreenPoint,
    /// Cached rotation matrix, rebuilt on every `rotate`
    rotation: DMat3,
}

impl ProjectionState {
    /// Build a projection for a `width` x `height` surface. The sphere starts
    /// centred, filling 90% of the shorter side.
    pub fn new(width: f64, height: f64, min_zoom: f64, max_zoom: f64) -> Self {
        let initial_scale = (width.min(height) / 2.0 * 0.9).max(1.0);
        Self::with_scale(initial_scale, (width / 2.0, height / 2.0), min_zoom, max_zoom)
    }

    pub fn with_scale(initial_scale: f64, translate: ScreenPoint, min_zoom: f64, max_zoom: f64) -> Self {
        let mut state = Self {
            lambda: 0.0,
            phi: 0.0,
            scale: initial_scale,
            initial_scale,
            min_zoom,
            max_zoom,
            translate,
            rotation: DMat3::IDENTITY,
        };
        state.scale = state.clamp_scale(initial_scale);
        state
    }

    fn rebuild_rotation(&mut self) {
        self.rotation = DMat3::from_rotation_y(-self.phi.to_radians())
            * DMat3::from_rotation_z(self.lambda.to_radians());
    }

    /// Rotate a globe point into view space: x toward the viewer, y right, z up.
    #[inline(always)]
    fn to_view(&self, p: GeoPoint) -> DVec3 {
        self.rotation * to_unit_vector(p)
    }

    #[inline(always)]
    fn view_to_screen(&self, v: DVec3) -> ScreenPoint {
        (self.translate.0 + v.y * self.scale, self.translate.1 - v.z * self.scale)
    }

    /// Project a geographic point to screen pixels.
    /// Back-hemisphere points still project; `None` only for degenerate input.
    pub fn project(&self, p: GeoPoint) -> Option<ScreenPoint> {
        let (x, y) = self.view_to_screen(self.to_view(p));
        (x.is_finite() && y.is_finite()).then_some((x, y))
    }

    /// Unproject screen pixels back to lon/lat.
    /// Returns `None` if the point is outside the sphere disk.
    pub fn invert(&self, (px, py): ScreenPoint) -> Option<GeoPoint> {
        let sy = (px - self.translate.0) / self.scale;
        let sz = -(py - self.translate.1) / self.scale;

        let r2 = sy * sy + sz * sz;
        if !r2.is_finite() || r2 > 1.0 {
            return None;
        }

        let view = DVec3::new((1.0 - r2).sqrt(), sy, sz);
        Some(from_unit_vector(self.rotation.transpose() * view))
    }

    pub fn rotate(&mut self, delta_lambda: f64, delta_phi: f64) {
        self.lambda += delta_lambda;
        self.phi += delta_phi;
        self.rebuild_rotation();
    }

    /// Current `(λ, φ)` in degrees.
    pub fn rotation(&self) -> (f64, f64) {
        (self.lambda, self.phi)
    }

    pub fn clamp_scale(&self, scale: f64) -> f64 {
        scale.clamp(self.min_zoom * self.initial_scale, self.max_zoom * self.initial_scale)
    }

    /// Set the absolute scale, clamped to the zoom range. Returns the applied scale.
    pub fn set_scale(&mut self, scale: f64) -> f64 {
        self.scale = self.clamp_scale(scale);
        self.scale
    }

    /// Set the scale as a multiple of the initial scale, clamped to
    /// `[min_zoom, max_zoom]`. Returns the applied multiple.
    pub fn zoom_to(&mut self, k: f64) -> f64 {
        self.set_scale(k * self.initial_scale);
        self.zoom_factor()
    }

    pub fn current_scale(&self) -> f64 {
        self.scale
    }

    pub fn initial_scale(&self) -> f64 {
        self.initial_scale
    }

    pub fn zoom_factor(&self) -> f64 {
        self.scale / self.initial_scale
    }

    pub fn translate(&self) -> ScreenPoint {
        self.translate
    }

    /// Move the sphere centre to the middle of a resized surface.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.translate = (width / 2.0, height / 2.0);
    }

    /// The point the camera faces: the inverse projection of the viewport centre.
    pub fn visibility_center(&self) -> GeoPoint {
        from_unit_vector(self.rotation.transpose() * DVec3::X)
    }

    /// Near-hemisphere test, inclusive at exactly 90° from the view centre.
    pub fn is_visible(&self, p: GeoPoint) -> bool {
        angular_distance(p, self.visibility_center()) <= FRAC_PI_2 + HORIZON_EPSILON
    }

    /// Project a polyline onto the screen, following great circles between
    /// vertices and cutting it at the horizon. Each returned run is a
    /// continuous visible stretch.
    pub fn project_line(&self, coords: &[GeoPoint], closed: bool) -> Vec<Vec<ScreenPoint>> {
        let mut runs = Vec::new();
        let Some(&first) = coords.first() else {
            return runs;
        };

        let mut current: Vec<ScreenPoint> = Vec::new();
        let mut prev = self.to_view(first);
        if prev.x >= 0.0 {
            current.push(self.view_to_screen(prev));
        }

        let tail = coords.iter().skip(1).copied();
        let closing = if closed && coords.len() > 2 { Some(first) } else { None };

        let mut from = first;
        for to in tail.chain(closing) {
            walk_great_circle(from, to, |p| {
                let next = self.to_view(p);
                match (prev.x >= 0.0, next.x >= 0.0) {
                    (true, true) => current.push(self.view_to_screen(next)),
                    (true, false) => {
                        current.push(self.view_to_screen(horizon_crossing(prev, next)));
                        if current.len() > 1 {
                            runs.push(std::mem::take(&mut current));
                        } else {
                            current.clear();
                        }
                    }
                    (false, true) => {
                        current.push(self.view_to_screen(horizon_crossing(prev, next)));
                        current.push(self.view_to_screen(next));
                    }
                    (false, false) => {}
                }
                prev = next;
            });
            from = to;
        }

        if current.len() > 1 {
            runs.push(current);
        }
        runs
    }
}

/// Point where the chord between two view-space points crosses the horizon
/// plane (x = 0), pushed back onto the unit sphere.
fn horizon_crossing(a: DVec3, b: DVec3) -> DVec3 {
    let t = a.x / (a.x - b.x);
    let p = a + (b - a) * t;
    DVec3::new(0.0, p.y, p.z).normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projection() -> ProjectionState {
        ProjectionState::with_scale(300.0, (480.0, 250.0), 1.0, 8.0)
    }

    #[test]
    fn test_project_center() {
        let p = projection();
        let (x, y) = p.project(GeoPoint::new(0.0, 0.0)).unwrap();
        assert!((x - 480.0).abs() < 1e-9);
        assert!((y - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_project_north_is_up_east_is_right() {
        let p = projection();
        let (_, y) = p.project(GeoPoint::new(0.0, 30.0)).unwrap();
        assert!(y < 250.0);
        let (x, _) = p.project(GeoPoint::new(30.0, 0.0)).unwrap();
        assert!(x > 480.0);
    }

    #[test]
    fn test_rotation_moves_view_center() {
        let mut p = projection();
        p.rotate(-40.0, -20.0);
        let c = p.visibility_center();
        assert!((c.longitude - 40.0).abs() < 1e-9);
        assert!((c.latitude - 20.0).abs() < 1e-9);
        let (x, y) = p.project(GeoPoint::new(40.0, 20.0)).unwrap();
        assert!((x - 480.0).abs() < 1e-6 && (y - 250.0).abs() < 1e-6);
    }

    #[test]
    fn test_invert_inverse_of_project() {
        let mut p = projection();
        p.rotate(15.0, -10.0);
        let start = GeoPoint::new(-5.0, 12.0);
        let screen = p.project(start).unwrap();
        let back = p.invert(screen).unwrap();
        assert!((back.longitude - start.longitude).abs() < 1e-6);
        assert!((back.latitude - start.latitude).abs() < 1e-6);
    }

    #[test]
    fn test_invert_outside_disk() {
        let p = projection();
        assert!(p.invert((480.0 + 301.0, 250.0)).is_none());
    }

    #[test]
    fn test_zoom_scenarios() {
        let mut p = projection();
        assert_eq!(p.zoom_to(0.5), 1.0);
        assert_eq!(p.current_scale(), 300.0);
        assert_eq!(p.zoom_to(10.0), 8.0);
        assert_eq!(p.current_scale(), 2400.0);
    }

    #[test]
    fn test_clamp_in_range_and_idempotent() {
        let p = projection();
        for s in [-100.0, 0.0, 150.0, 300.0, 1234.5, 2400.0, 1e9] {
            let c = p.clamp_scale(s);
            assert!((300.0..=2400.0).contains(&c));
            assert_eq!(p.clamp_scale(c), c);
        }
    }

    #[test]
    fn test_rotation_is_additive() {
        let mut p = projection();
        let deltas = [(10.0, 5.0), (-3.5, 2.25), (400.0, -90.0), (0.125, 0.0)];
        for (dl, dp) in deltas {
            p.rotate(dl, dp);
        }
        let (l, f) = p.rotation();
        assert!((l - 406.625).abs() < 1e-9);
        assert!((f - (-82.75)).abs() < 1e-9);
    }

    #[test]
    fn test_visibility_scenarios() {
        let p = projection();
        assert!(p.is_visible(GeoPoint::new(0.0, 0.0)));
        assert!(p.is_visible(GeoPoint::new(10.0, 10.0)));
        assert!(p.is_visible(GeoPoint::new(90.0, 0.0)));
        assert!(!p.is_visible(GeoPoint::new(179.0, 0.0)));
    }

    #[test]
    fn test_project_line_clips_at_horizon() {
        let p = projection();
        // Equator from the centre to the far side
        let line = [GeoPoint::new(0.0, 0.0), GeoPoint::new(170.0, 0.0)];
        let runs = p.project_line(&line, false);
        assert_eq!(runs.len(), 1);
        let (x, _) = *runs[0].last().unwrap();
        // Ends on the limb, never beyond it
        assert!((x - 780.0).abs() < 1e-6);
    }

    #[test]
    fn test_project_line_fully_hidden() {
        let p = projection();
        let line = [GeoPoint::new(150.0, 0.0), GeoPoint::new(170.0, 10.0)];
        assert!(p.project_line(&line, false).is_empty());
    }
}
