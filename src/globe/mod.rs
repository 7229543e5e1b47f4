//! The globe component: projection, scene collections, visibility toggles and
//! the redraw engine, owned together and mutated only through the methods
//! below.

mod hover;
mod interaction;

use std::time::Duration;

use crate::config::GlobeConfig;
use crate::data::{FlightPath, Marker, SceneData};
use crate::map::{Collections, HitTarget, Layer, MarkerStyle, ProjectionState, RedrawEngine, Toggles};
use crate::tooltip::{TerminalTooltip, Tooltip};

pub struct Globe<T: Tooltip = TerminalTooltip> {
    projection: ProjectionState,
    scene: SceneData,
    toggles: Toggles,
    style: MarkerStyle,
    /// Drag-to-rotation sensitivity
    sensitivity: f64,
    engine: RedrawEngine,
    hovered: Option<HitTarget>,
    tooltip: Option<T>,
    redraws: u64,
}

impl<T: Tooltip> Globe<T> {
    /// Build an empty globe for a `width` x `height` surface (in pixels).
    pub fn new(config: &GlobeConfig, width: f64, height: f64, tooltip: Option<T>) -> Self {
        let projection = ProjectionState::new(width, height, config.min_zoom, config.max_zoom);
        Self::with_projection(config, projection, tooltip)
    }

    pub fn with_projection(config: &GlobeConfig, projection: ProjectionState, tooltip: Option<T>) -> Self {
        let mut globe = Self {
            projection,
            scene: SceneData::default(),
            toggles: Toggles {
                show_graticule: config.draw_graticule,
                ..Toggles::default()
            },
            style: MarkerStyle {
                base_radius: config.marker_radius,
                max_radius: config.marker_max_radius,
            },
            sensitivity: config.scroll_sens,
            engine: RedrawEngine::new(),
            hovered: None,
            tooltip,
            redraws: 0,
        };
        globe.redraw();
        globe
    }

    /// Rebuild the view model from the current state.
    pub fn redraw(&mut self) {
        let data = Collections {
            countries: &self.scene.countries,
            takeoffs: &self.scene.takeoffs,
            targets: &self.scene.targets,
            paths: &self.scene.paths,
        };
        self.engine.redraw(&self.projection, data, self.toggles, self.style);
        self.redraws += 1;
        self.drop_stale_hover();
    }

    /// Install a freshly loaded scene, replacing everything including countries.
    pub fn install_scene(&mut self, scene: SceneData) {
        self.forget_hover();
        self.scene = scene;
        self.redraw();
    }

    /// Replace all three marker collections at once and redraw.
    pub fn update_markers(&mut self, takeoffs: Vec<Marker>, targets: Vec<Marker>, paths: Vec<FlightPath>) {
        self.forget_hover();
        self.scene.takeoffs = takeoffs;
        self.scene.targets = targets;
        self.scene.paths = paths;
        self.redraw();
    }

    pub fn set_show_paths(&mut self, show: bool) {
        self.toggles.show_paths = show;
        self.apply_toggle(Layer::Paths, show);
    }

    pub fn set_show_takeoffs(&mut self, show: bool) {
        self.toggles.show_takeoffs = show;
        self.apply_toggle(Layer::Takeoffs, show);
    }

    pub fn set_show_targets(&mut self, show: bool) {
        self.toggles.show_targets = show;
        self.apply_toggle(Layer::Targets, show);
    }

    pub fn set_show_graticule(&mut self, show: bool) {
        self.toggles.show_graticule = show;
        self.apply_toggle(Layer::Graticule, show);
    }

    /// Hiding removes the layer's elements now; showing rebuilds them from
    /// the current collections.
    fn apply_toggle(&mut self, layer: Layer, show: bool) {
        if show {
            self.redraw();
        } else {
            self.engine.clear(layer);
            self.drop_stale_hover();
        }
    }

    /// Surface resized: recentre the sphere.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.projection.resize(width, height);
        self.redraw();
    }

    /// Step hover transitions. Returns true while any is still animating.
    pub fn advance(&mut self, dt: Duration) -> bool {
        self.engine.advance(dt)
    }

    pub fn projection(&self) -> &ProjectionState {
        &self.projection
    }

    pub fn engine(&self) -> &RedrawEngine {
        &self.engine
    }

    pub fn scene(&self) -> &SceneData {
        &self.scene
    }

    pub fn toggles(&self) -> Toggles {
        self.toggles
    }

    pub fn hovered(&self) -> Option<HitTarget> {
        self.hovered
    }

    pub fn tooltip(&self) -> Option<&T> {
        self.tooltip.as_ref()
    }

    /// Number of redraws performed so far
    pub fn redraw_count(&self) -> u64 {
        self.redraws
    }

    fn with_tooltip(&mut self, f: impl FnOnce(&mut T)) {
        if let Some(tooltip) = self.tooltip.as_mut() {
            f(tooltip);
        }
    }

    /// Un-hover the current element and hide the tooltip.
    fn clear_hover(&mut self) {
        if let Some(previous) = self.hovered.take() {
            self.engine.set_hovered(None, Some(previous));
            self.with_tooltip(|t| t.hide());
        }
    }

    /// Collections are about to be replaced: no element keeps any hover state.
    fn forget_hover(&mut self) {
        self.clear_hover();
        self.engine.reset_hover();
    }

    /// Drop a hover whose element is gone or can no longer be seen.
    fn drop_stale_hover(&mut self) {
        let Some(target) = self.hovered else {
            return;
        };
        let live = match target.layer {
            Layer::Paths => self.engine.paths().get(target.index).is_some_and(|b| !b.element.runs.is_empty()),
            Layer::Takeoffs => self.engine.takeoffs().get(target.index).is_some_and(|b| b.element.is_painted()),
            Layer::Targets => self.engine.targets().get(target.index).is_some_and(|b| b.element.is_painted()),
            _ => false,
        };
        if !live {
            self.clear_hover();
        }
    }
}
