use std::time::Duration;

use crate::braille::BrailleCanvas;
use crate::data::{Allegiance, CountryPolygon, FlightPath, Marker};
use crate::geo::GeoPoint;
use crate::map::geometry::{distance_to_segment, draw_circle, draw_polyline, draw_ring, round};
use crate::map::graticule::graticule_lines;
use crate::map::projection::{ProjectionState, ScreenPoint};
use crate::map::reconcile::{ElementList, IdAllocator};

/// Graticule spacing, degrees
const GRATICULE_STEP: f64 = 10.0;
/// Hover transition length
const HOVER_TRANSITION: Duration = Duration::from_millis(200);
/// Fraction a fully hovered marker grows by
const HOVER_GROWTH: f64 = 0.5;
/// How close (in dots) the pointer must be to a path to hover it
const PATH_HIT_TOLERANCE: f64 = 1.5;
/// Samples used to stroke the sphere outline
const SPHERE_SEGMENTS: usize = 180;

/// Draw groups, back to front.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    Background,
    Graticule,
    Countries,
    Paths,
    Takeoffs,
    Targets,
}

/// Explicit paint order. Layers later in the list are painted over earlier ones.
#[derive(Clone, Debug, PartialEq)]
pub struct PaintOrder(Vec<Layer>);

impl PaintOrder {
    /// Move `layer` to the front (end of the list).
    pub fn raise(&mut self, layer: Layer) {
        self.0.retain(|&l| l != layer);
        self.0.push(layer);
    }

    pub fn layers(&self) -> &[Layer] {
        &self.0
    }
}

impl Default for PaintOrder {
    fn default() -> Self {
        Self(vec![
            Layer::Background,
            Layer::Graticule,
            Layer::Countries,
            Layer::Paths,
            Layer::Takeoffs,
            Layer::Targets,
        ])
    }
}

/// Which optional layers are drawn
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Toggles {
    pub show_paths: bool,
    pub show_takeoffs: bool,
    pub show_targets: bool,
    pub show_graticule: bool,
}

impl Default for Toggles {
    fn default() -> Self {
        Self {
            show_paths: true,
            show_takeoffs: true,
            show_targets: true,
            show_graticule: false,
        }
    }
}

/// Marker sizing: grows with zoom, capped at `max_radius`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerStyle {
    pub base_radius: f64,
    pub max_radius: f64,
}

impl MarkerStyle {
    pub fn radius(&self, scale: f64, initial_scale: f64) -> f64 {
        (self.base_radius * scale / initial_scale).min(self.max_radius)
    }
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            base_radius: 2.0,
            max_radius: 6.0,
        }
    }
}

/// Hover animation state shared by markers and paths.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Hover {
    pub hovered: bool,
    /// 0 = at rest, 1 = fully highlighted
    pub highlight: f64,
}

impl Hover {
    /// Step toward the target state. Returns true while still moving.
    fn advance(&mut self, dt: Duration) -> bool {
        let step = dt.as_secs_f64() / HOVER_TRANSITION.as_secs_f64();
        let target = if self.hovered { 1.0 } else { 0.0 };
        if self.highlight < target {
            self.highlight = (self.highlight + step).min(target);
        } else if self.highlight > target {
            self.highlight = (self.highlight - step).max(target);
        }
        self.highlight != target
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MarkerElement {
    /// Screen position, `None` when the point could not be projected
    pub center: Option<ScreenPoint>,
    /// On the near hemisphere; far-side markers are kept but not painted
    pub visible: bool,
    pub radius: f64,
    pub hover: Hover,
}

impl MarkerElement {
    pub fn is_painted(&self) -> bool {
        self.visible && self.center.is_some()
    }

    /// Radius including hover growth
    pub fn display_radius(&self) -> f64 {
        self.radius * (1.0 + HOVER_GROWTH * self.hover.highlight)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PathElement {
    /// Visible stretches of the arc
    pub runs: Vec<Vec<ScreenPoint>>,
    pub hover: Hover,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CountryElement {
    pub allegiance: Allegiance,
    pub runs: Vec<Vec<ScreenPoint>>,
}

/// Backing collections a redraw reads from.
#[derive(Clone, Copy)]
pub struct Collections<'a> {
    pub countries: &'a [CountryPolygon],
    pub takeoffs: &'a [Marker],
    pub targets: &'a [Marker],
    pub paths: &'a [FlightPath],
}

/// Element under the pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HitTarget {
    pub layer: Layer,
    pub index: usize,
}

/// Colour class of a rasterized canvas
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stroke {
    Sphere,
    Graticule,
    Country(Allegiance),
    Path,
    Takeoff,
    Target,
    Highlight,
}

/// Rasterized canvases in paint order, back to front.
pub struct MapLayers {
    pub layers: Vec<(Stroke, BrailleCanvas)>,
}

/// Keeps the on-screen view model in step with the projection and the data.
pub struct RedrawEngine {
    ids: IdAllocator,
    graticule_geo: Vec<Vec<GeoPoint>>,
    sphere: (ScreenPoint, f64),
    graticule: Vec<Vec<ScreenPoint>>,
    countries: Vec<CountryElement>,
    paths: ElementList<PathElement>,
    takeoffs: ElementList<MarkerElement>,
    targets: ElementList<MarkerElement>,
    order: PaintOrder,
}

impl RedrawEngine {
    pub fn new() -> Self {
        Self {
            ids: IdAllocator::default(),
            graticule_geo: graticule_lines(GRATICULE_STEP),
            sphere: ((0.0, 0.0), 0.0),
            graticule: Vec::new(),
            countries: Vec::new(),
            paths: ElementList::new(),
            takeoffs: ElementList::new(),
            targets: ElementList::new(),
            order: PaintOrder::default(),
        }
    }

    /// Recompute every element from the projection and collections.
    /// Calling it twice with unchanged inputs yields the same view model.
    pub fn redraw(
        &mut self,
        projection: &ProjectionState,
        data: Collections<'_>,
        toggles: Toggles,
        style: MarkerStyle,
    ) {
        self.sphere = (projection.translate(), projection.current_scale());

        self.graticule = if toggles.show_graticule {
            self.graticule_geo
                .iter()
                .flat_map(|line| projection.project_line(line, false))
                .collect()
        } else {
            Vec::new()
        };

        self.countries = data
            .countries
            .iter()
            .map(|country| CountryElement {
                allegiance: country.allegiance,
                runs: country
                    .rings
                    .iter()
                    .flat_map(|ring| projection.project_line(ring, true))
                    .collect(),
            })
            .collect();

        if toggles.show_paths {
            let plan = self.paths.sync(
                data.paths,
                &mut self.ids,
                |_, path| PathElement {
                    runs: project_path(projection, path),
                    hover: Hover::default(),
                },
                |element, _, path| element.runs = project_path(projection, path),
            );
            if !plan.is_noop() {
                tracing::debug!(?plan, "reconciled flight paths");
            }
        }

        let radius = style.radius(projection.current_scale(), projection.initial_scale());
        if toggles.show_takeoffs {
            sync_markers(&mut self.takeoffs, &mut self.ids, data.takeoffs, projection, radius);
        }
        if toggles.show_targets {
            sync_markers(&mut self.targets, &mut self.ids, data.targets, projection, radius);
        }

        self.order.raise(Layer::Paths);
        self.order.raise(Layer::Takeoffs);
        self.order.raise(Layer::Targets);
    }

    /// Drop every element of a layer.
    pub fn clear(&mut self, layer: Layer) {
        match layer {
            Layer::Paths => self.paths.clear(),
            Layer::Takeoffs => self.takeoffs.clear(),
            Layer::Targets => self.targets.clear(),
            Layer::Countries => self.countries.clear(),
            Layer::Graticule => self.graticule.clear(),
            Layer::Background => {}
        }
    }

    pub fn paths(&self) -> &ElementList<PathElement> {
        &self.paths
    }

    pub fn takeoffs(&self) -> &ElementList<MarkerElement> {
        &self.takeoffs
    }

    pub fn targets(&self) -> &ElementList<MarkerElement> {
        &self.targets
    }

    pub fn countries(&self) -> &[CountryElement] {
        &self.countries
    }

    pub fn graticule(&self) -> &[Vec<ScreenPoint>] {
        &self.graticule
    }

    pub fn paint_order(&self) -> &PaintOrder {
        &self.order
    }

    fn markers(&self, layer: Layer) -> Option<&ElementList<MarkerElement>> {
        match layer {
            Layer::Takeoffs => Some(&self.takeoffs),
            Layer::Targets => Some(&self.targets),
            _ => None,
        }
    }

    fn hover_mut(&mut self, target: HitTarget) -> Option<&mut Hover> {
        match target.layer {
            Layer::Paths => self.paths.get_mut(target.index).map(|b| &mut b.element.hover),
            Layer::Takeoffs => self.takeoffs.get_mut(target.index).map(|b| &mut b.element.hover),
            Layer::Targets => self.targets.get_mut(target.index).map(|b| &mut b.element.hover),
            _ => None,
        }
    }

    /// Mark one element as hovered (or none). Highlights animate via `advance`.
    pub fn set_hovered(&mut self, target: Option<HitTarget>, previous: Option<HitTarget>) {
        if let Some(hover) = previous.and_then(|t| self.hover_mut(t)) {
            hover.hovered = false;
        }
        if let Some(hover) = target.and_then(|t| self.hover_mut(t)) {
            hover.hovered = true;
        }
    }

    /// Drop every hover highlight at once, without a transition.
    pub fn reset_hover(&mut self) {
        for bound in self.paths.iter_mut() {
            bound.element.hover = Hover::default();
        }
        for bound in self.takeoffs.iter_mut().chain(self.targets.iter_mut()) {
            bound.element.hover = Hover::default();
        }
    }

    /// Advance hover transitions. Returns true while any is still running.
    pub fn advance(&mut self, dt: Duration) -> bool {
        let mut moving = false;
        for bound in self.paths.iter_mut() {
            moving |= bound.element.hover.advance(dt);
        }
        for bound in self.takeoffs.iter_mut().chain(self.targets.iter_mut()) {
            moving |= bound.element.hover.advance(dt);
        }
        moving
    }

    /// Topmost painted marker or path under the pointer.
    pub fn hit_test(&self, point: ScreenPoint) -> Option<HitTarget> {
        for &layer in self.order.layers().iter().rev() {
            if let Some(list) = self.markers(layer) {
                let hit = list.iter().enumerate().rev().find(|(_, b)| {
                    let m = &b.element;
                    match m.center {
                        Some((x, y)) if m.visible => {
                            let d = ((point.0 - x).powi(2) + (point.1 - y).powi(2)).sqrt();
                            d <= m.display_radius() + 1.0
                        }
                        _ => false,
                    }
                });
                if let Some((index, _)) = hit {
                    return Some(HitTarget { layer, index });
                }
            } else if layer == Layer::Paths {
                let hit = self.paths.iter().enumerate().rev().find(|(_, b)| {
                    b.element.runs.iter().any(|run| {
                        run.windows(2)
                            .any(|s| distance_to_segment(point, s[0], s[1]) <= PATH_HIT_TOLERANCE)
                    })
                });
                if let Some((index, _)) = hit {
                    return Some(HitTarget { layer, index });
                }
            }
        }
        None
    }

    /// Paint the view model into one Braille canvas per stroke, in paint order.
    pub fn rasterize(&self, cols: usize, rows: usize) -> MapLayers {
        let mut layers = Vec::new();
        let blank = || BrailleCanvas::new(cols, rows);

        for &layer in self.order.layers() {
            match layer {
                Layer::Background => {
                    let mut canvas = blank();
                    let ((cx, cy), r) = self.sphere;
                    let outline: Vec<ScreenPoint> = (0..=SPHERE_SEGMENTS)
                        .map(|i| {
                            let a = i as f64 / SPHERE_SEGMENTS as f64 * std::f64::consts::TAU;
                            (cx + r * a.cos(), cy + r * a.sin())
                        })
                        .collect();
                    draw_polyline(&mut canvas, &outline);
                    layers.push((Stroke::Sphere, canvas));
                }
                Layer::Graticule => {
                    let mut canvas = blank();
                    for run in &self.graticule {
                        draw_polyline(&mut canvas, run);
                    }
                    layers.push((Stroke::Graticule, canvas));
                }
                Layer::Countries => {
                    for allegiance in [Allegiance::Neutral, Allegiance::Axis, Allegiance::Allied] {
                        let mut canvas = blank();
                        for country in self.countries.iter().filter(|c| c.allegiance == allegiance) {
                            for run in &country.runs {
                                draw_polyline(&mut canvas, run);
                            }
                        }
                        layers.push((Stroke::Country(allegiance), canvas));
                    }
                }
                Layer::Paths => {
                    let mut canvas = blank();
                    let mut highlight = blank();
                    for bound in self.paths.iter() {
                        let path = &bound.element;
                        let target = if path.hover.highlight >= 0.5 { &mut highlight } else { &mut canvas };
                        for run in &path.runs {
                            draw_polyline(target, run);
                        }
                    }
                    layers.push((Stroke::Path, canvas));
                    layers.push((Stroke::Highlight, highlight));
                }
                Layer::Takeoffs | Layer::Targets => {
                    let stroke = if layer == Layer::Takeoffs { Stroke::Takeoff } else { Stroke::Target };
                    let mut canvas = blank();
                    let mut outline = blank();
                    for marker in self.markers(layer).into_iter().flat_map(|l| l.iter()) {
                        let m = &marker.element;
                        let Some(center) = m.center.filter(|_| m.visible) else {
                            continue;
                        };
                        let (x, y) = round(center);
                        let r = m.display_radius().round() as i32;
                        draw_circle(&mut canvas, x, y, r);
                        if m.hover.highlight >= 0.5 {
                            draw_ring(&mut outline, x, y, r + 1);
                        }
                    }
                    layers.push((stroke, canvas));
                    layers.push((Stroke::Highlight, outline));
                }
            }
        }

        MapLayers { layers }
    }
}

impl Default for RedrawEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn project_path(projection: &ProjectionState, path: &FlightPath) -> Vec<Vec<ScreenPoint>> {
    projection.project_line(&[path.takeoff, path.target], false)
}

fn place_marker(element: &mut MarkerElement, marker: &Marker, projection: &ProjectionState, radius: f64) {
    element.center = projection.project(marker.position);
    element.visible = projection.is_visible(marker.position);
    element.radius = radius;
}

fn sync_markers(
    list: &mut ElementList<MarkerElement>,
    ids: &mut IdAllocator,
    markers: &[Marker],
    projection: &ProjectionState,
    radius: f64,
) {
    let plan = list.sync(
        markers,
        ids,
        |_, marker| {
            let mut element = MarkerElement {
                center: None,
                visible: false,
                radius,
                hover: Hover::default(),
            };
            place_marker(&mut element, marker, projection, radius);
            element
        },
        |element, _, marker| place_marker(element, marker, projection, radius),
    );
    if !plan.is_noop() {
        tracing::debug!(?plan, "reconciled markers");
    }
}
