use super::Globe;
use crate::data::{Marker, MarkerKind, Metadata};
use crate::map::{HitTarget, Layer};
use crate::tooltip::Tooltip;

impl<T: Tooltip> Globe<T> {
    /// Pointer moved to `(x, y)` surface pixels. Entering an element shows
    /// its details; leaving every element hides them.
    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        let hit = self.engine.hit_test((x, y));

        if hit != self.hovered {
            self.engine.set_hovered(hit, self.hovered);
            self.hovered = hit;
            match hit.map(|target| self.describe(target)) {
                Some(lines) => self.with_tooltip(|t| {
                    t.set_content(lines);
                    t.show();
                }),
                None => self.with_tooltip(|t| t.hide()),
            }
        }

        if self.hovered.is_some() {
            self.with_tooltip(|t| t.set_position(x, y));
        }
    }

    /// Pointer left the surface.
    pub fn pointer_left(&mut self) {
        self.clear_hover();
    }

    /// Tooltip lines for a hovered element
    fn describe(&self, target: HitTarget) -> Vec<String> {
        match target.layer {
            Layer::Takeoffs => marker_lines(MarkerKind::Takeoff, self.scene.takeoffs.get(target.index)),
            Layer::Targets => marker_lines(MarkerKind::Target, self.scene.targets.get(target.index)),
            Layer::Paths => match self.scene.paths.get(target.index) {
                Some(path) => {
                    let mut lines = vec![
                        "Flight path".to_string(),
                        format!("from {}", path.takeoff),
                        format!("to {}", path.target),
                    ];
                    push_meta(&mut lines, &path.meta);
                    lines
                }
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }
}

fn marker_lines(kind: MarkerKind, marker: Option<&Marker>) -> Vec<String> {
    let Some(marker) = marker else {
        return Vec::new();
    };
    let mut lines = vec![kind.label().to_string(), marker.position.to_string()];
    push_meta(&mut lines, &marker.meta);
    lines
}

fn push_meta(lines: &mut Vec<String>, meta: &Metadata) {
    lines.extend(meta.iter().map(|(key, value)| format!("{key}: {value}")));
}
