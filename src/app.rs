use std::time::Duration;

use thor_globe::config::GlobeConfig;
use thor_globe::data::SceneLoader;
use thor_globe::globe::Globe;
use thor_globe::tooltip::TerminalTooltip;

/// Rotation applied per arrow/hjkl press, as a drag distance in dots
const KEY_STEP: f64 = 8.0;

/// Application state
pub struct App {
    pub globe: Globe<TerminalTooltip>,
    pub config: GlobeConfig,
    loader: SceneLoader,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Message from the last failed load
    pub load_error: Option<String>,
    /// Map area in cells, inside the border
    map_cells: (u16, u16),
    /// A hover transition was still running after the last tick
    animating: bool,
}

impl App {
    pub fn new(config: GlobeConfig, width: u16, height: u16) -> Self {
        let map_cells = map_cells(&config, width, height);
        let (px, py) = surface_size(map_cells);
        let globe = Globe::new(&config, px, py, Some(TerminalTooltip::default()));

        Self {
            globe,
            config,
            loader: SceneLoader::new(),
            should_quit: false,
            last_mouse: None,
            load_error: None,
            map_cells,
            animating: false,
        }
    }

    /// Terminal resized
    pub fn resize(&mut self, width: u16, height: u16) {
        self.map_cells = map_cells(&self.config, width, height);
        let (px, py) = surface_size(self.map_cells);
        self.globe.resize(px, py);
    }

    pub fn map_cells(&self) -> (u16, u16) {
        self.map_cells
    }

    /// Start (or restart) loading the scene in the background.
    pub fn reload(&mut self) {
        match self.config.sources() {
            Ok(sources) => {
                self.loader.request(sources);
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot load scene");
                self.load_error = Some(e.to_string());
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    /// Per-frame housekeeping: install finished loads and step hover
    /// animations. Returns true when something changed.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let mut changed = false;
        match self.loader.poll() {
            Some(Ok(scene)) => {
                self.globe.install_scene(scene);
                self.load_error = None;
                changed = true;
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "scene load failed");
                self.load_error = Some(e.to_string());
                changed = true;
            }
            None => {}
        }
        // The step that settles a transition still needs painting
        let moving = self.globe.advance(dt);
        changed |= moving || self.animating;
        self.animating = moving;
        changed
    }

    /// Rotate as if dragged by `(dx, dy)` key steps.
    pub fn rotate(&mut self, dx: f64, dy: f64) {
        self.globe.drag(dx * KEY_STEP, dy * KEY_STEP);
    }

    pub fn zoom_in(&mut self) {
        self.globe.zoom_step(1.0);
    }

    pub fn zoom_out(&mut self) {
        self.globe.zoom_step(-1.0);
    }

    /// Handle mouse drag
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_col, last_row)) = self.last_mouse {
            let dx = (col as f64 - last_col as f64) * 2.0;
            let dy = (row as f64 - last_row as f64) * 4.0;
            if dx != 0.0 || dy != 0.0 {
                self.globe.drag(dx, dy);
            }
        }
        self.last_mouse = Some((col, row));
    }

    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    /// Mouse moved to a terminal cell
    pub fn pointer(&mut self, col: u16, row: u16) {
        match self.to_surface(col, row) {
            Some((x, y)) => self.globe.pointer_moved(x, y),
            None => self.globe.pointer_left(),
        }
    }

    /// Convert a terminal cell to surface dots (cell centre), accounting for
    /// the 1-cell border. `None` outside the map area.
    pub fn to_surface(&self, col: u16, row: u16) -> Option<(f64, f64)> {
        let (cols, rows) = self.map_cells;
        let (c, r) = (col.checked_sub(1)?, row.checked_sub(1)?);
        if c >= cols || r >= rows {
            return None;
        }
        Some((c as f64 * 2.0 + 1.0, r as f64 * 4.0 + 2.0))
    }

    pub fn toggle_paths(&mut self) {
        let show = !self.globe.toggles().show_paths;
        self.globe.set_show_paths(show);
    }

    pub fn toggle_takeoffs(&mut self) {
        let show = !self.globe.toggles().show_takeoffs;
        self.globe.set_show_takeoffs(show);
    }

    pub fn toggle_targets(&mut self) {
        let show = !self.globe.toggles().show_targets;
        self.globe.set_show_targets(show);
    }

    pub fn toggle_graticule(&mut self) {
        let show = !self.globe.toggles().show_graticule;
        self.globe.set_show_graticule(show);
    }

    /// Remove every marker and path
    pub fn clear_markers(&mut self) {
        self.globe.update_markers(Vec::new(), Vec::new(), Vec::new());
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.globe.projection().zoom_factor())
    }

    /// Get current view centre as a string
    pub fn center_coords(&self) -> String {
        self.globe.projection().visibility_center().to_string()
    }

    /// Marker and path counts for the status bar
    pub fn counts(&self) -> String {
        let scene = self.globe.scene();
        format!(
            "{} bases {} targets {} paths",
            scene.takeoffs.len(),
            scene.targets.len(),
            scene.paths.len()
        )
    }
}

/// Map area in cells: the terminal minus border and status bar, capped by the
/// configured size.
fn map_cells(config: &GlobeConfig, width: u16, height: u16) -> (u16, u16) {
    let cols = width.saturating_sub(2);
    let rows = height.saturating_sub(3);
    (
        config.width.map_or(cols, |w| w.min(cols)),
        config.height.map_or(rows, |h| h.min(rows)),
    )
}

/// Braille gives 2x4 dots per cell
fn surface_size((cols, rows): (u16, u16)) -> (f64, f64) {
    (cols as f64 * 2.0, rows as f64 * 4.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use std::time::Instant;

    const WORLD: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"name": "France"},
         "geometry": {"type": "Polygon", "coordinates": [[[0, 45], [5, 45], [5, 50], [0, 50], [0, 45]]]}}
    ]}"#;

    fn config(json: &str) -> GlobeConfig {
        GlobeConfig::from_json(json).unwrap()
    }

    fn app() -> App {
        let config = config(r#"{"map_url": "w.json", "marker_file": "m.json"}"#);
        App::new(config, 102, 53)
    }

    fn write_scene(dir: &Path) -> GlobeConfig {
        fs::write(dir.join("world.json"), WORLD).unwrap();
        fs::write(dir.join("takeoffs.json"), r#"[{"longitude": 0, "latitude": 0}]"#).unwrap();
        fs::write(dir.join("targets.json"), r#"[{"longitude": 10, "latitude": 10, "name": "Ploesti"}]"#).unwrap();
        let mut config = config(
            r#"{"map_url": "world.json", "takeoff_locals": "takeoffs.json", "target_locals": "targets.json"}"#,
        );
        config.resolve_paths(dir);
        config
    }

    fn wait_for_load(app: &mut App) {
        let start = Instant::now();
        while app.is_loading() && start.elapsed() < Duration::from_secs(5) {
            app.tick(Duration::ZERO);
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_map_area_capped_by_config() {
        assert_eq!(app().map_cells(), (100, 50));

        let config = config(r#"{"map_url": "w.json", "marker_file": "m.json", "width": 40, "height": 200}"#);
        let app = App::new(config, 102, 53);
        assert_eq!(app.map_cells(), (40, 50));
        assert_eq!(app.globe.projection().translate(), (40.0, 100.0));
    }

    #[test]
    fn test_to_surface() {
        let app = app();
        assert_eq!(app.to_surface(1, 1), Some((1.0, 2.0)));
        assert_eq!(app.to_surface(0, 5), None);
        assert_eq!(app.to_surface(101, 5), None);
        assert_eq!(app.to_surface(100, 50), Some((199.0, 198.0)));
    }

    #[test]
    fn test_mouse_drag_rotates() {
        let mut app = app();
        app.last_mouse = Some((10, 10));
        app.handle_drag(14, 10);
        let (lambda, phi) = app.globe.projection().rotation();
        assert!(lambda > 0.0);
        assert_eq!(phi, 0.0);

        app.end_drag();
        app.handle_drag(30, 30);
        assert_eq!(app.globe.projection().rotation().0, lambda);
    }

    #[test]
    fn test_keyboard_zoom_and_toggles() {
        let mut app = app();
        app.zoom_in();
        assert!(app.globe.projection().zoom_factor() > 1.0);
        app.zoom_out();
        app.zoom_out();
        assert_eq!(app.zoom_level(), "1.0x");

        app.toggle_paths();
        assert!(!app.globe.toggles().show_paths);
        app.toggle_graticule();
        assert!(app.globe.toggles().show_graticule);
        assert!(!app.globe.engine().graticule().is_empty());
    }

    #[test]
    fn test_tick_reports_hover_animation_until_settled() {
        let mut app = app();
        app.globe.update_markers(vec![thor_globe::data::Marker::new(0.0, 0.0)], Vec::new(), Vec::new());
        assert!(!app.tick(Duration::from_millis(16)));

        // Cell (50, 25) covers the view centre
        app.pointer(50, 25);
        assert!(app.globe.hovered().is_some());
        assert!(app.tick(Duration::from_millis(100)));
        assert!(app.tick(Duration::from_millis(150)));
        assert!(!app.tick(Duration::from_millis(16)));
    }

    #[test]
    fn test_reload_installs_scene() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(write_scene(dir.path()), 102, 53);
        app.reload();
        wait_for_load(&mut app);

        assert_eq!(app.counts(), "1 bases 1 targets 1 paths");
        assert_eq!(app.globe.engine().countries().len(), 1);
        assert_eq!(app.load_error, None);

        app.clear_markers();
        assert_eq!(app.counts(), "0 bases 0 targets 0 paths");
        assert!(app.globe.engine().targets().is_empty());
    }

    #[test]
    fn test_failed_reload_keeps_scene() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(write_scene(dir.path()), 102, 53);
        app.reload();
        wait_for_load(&mut app);

        fs::write(dir.path().join("targets.json"), "not json").unwrap();
        app.reload();
        wait_for_load(&mut app);

        assert!(app.load_error.is_some());
        assert_eq!(app.counts(), "1 bases 1 targets 1 paths");
    }
}
