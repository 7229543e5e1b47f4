mod geometry;
mod graticule;
mod projection;
mod reconcile;
mod renderer;

pub use projection::{ProjectionState, ScreenPoint};
pub use reconcile::{reconcile, Bound, ElementId, ElementList, Reconciliation};
pub use renderer::{
    Collections, CountryElement, HitTarget, Hover, Layer, MapLayers, MarkerElement, MarkerStyle, PaintOrder,
    PathElement, RedrawEngine, Stroke, Toggles,
};
