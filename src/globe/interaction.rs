use super::Globe;
use crate::tooltip::Tooltip;

/// Wheel zoom exponent per notch
const WHEEL_STEP: f64 = 0.2;

impl<T: Tooltip> Globe<T> {
    /// Rotate by a pointer drag of `(dx, dy)` pixels. The same drag turns the
    /// globe less the further it is zoomed in.
    pub fn drag(&mut self, dx: f64, dy: f64) {
        let k = self.sensitivity / self.projection.current_scale();
        self.projection.rotate(dx * k, -dy * k);
        self.redraw();
    }

    /// Zoom to `k` times the initial scale, clamped to the configured range.
    /// Always redraws; returns whether the scale actually changed.
    pub fn zoom(&mut self, k: f64) -> bool {
        let before = self.projection.current_scale();
        self.projection.zoom_to(k);
        let changed = self.projection.current_scale() != before;
        self.redraw();
        changed
    }

    /// Wheel zoom by `notches` (positive zooms in).
    pub fn zoom_step(&mut self, notches: f64) -> bool {
        let k = self.projection.zoom_factor() * 2f64.powf(WHEEL_STEP * notches);
        self.zoom(k)
    }
}
