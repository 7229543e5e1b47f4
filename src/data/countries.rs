use geojson::{Feature, GeoJson, Geometry, Value};
use serde::Deserialize;
use std::collections::HashSet;

use crate::geo::GeoPoint;

/// Which side a country fought on, used only for its colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Allegiance {
    Allied,
    Axis,
    #[default]
    Neutral,
}

/// A country outline: one exterior ring per polygon part.
#[derive(Clone, Debug, PartialEq)]
pub struct CountryPolygon {
    pub name: String,
    pub rings: Vec<Vec<GeoPoint>>,
    pub allegiance: Allegiance,
}

/// `{ "territories": [...] }` as stored in the allegiance files
#[derive(Deserialize)]
pub struct TerritoryList {
    pub territories: Vec<String>,
}

/// Name sets used to classify countries.
#[derive(Clone, Debug, Default)]
pub struct AllegianceSets {
    pub allied: HashSet<String>,
    pub axis: HashSet<String>,
}

impl AllegianceSets {
    pub fn classify(&self, name: &str) -> Allegiance {
        if self.allied.contains(name) {
            Allegiance::Allied
        } else if self.axis.contains(name) {
            Allegiance::Axis
        } else {
            Allegiance::Neutral
        }
    }

    pub fn apply(&self, countries: &mut [CountryPolygon]) {
        for country in countries {
            country.allegiance = self.classify(&country.name);
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CountryError {
    #[error(transparent)]
    GeoJson(#[from] geojson::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("expected features, found a bare geometry")]
    BareGeometry,
}

/// Property keys checked, in order, for a country's name
const NAME_KEYS: [&str; 4] = ["name", "NAME", "ADMIN", "admin"];

/// Extract country polygons from GeoJSON text: a FeatureCollection, a single
/// Feature, or a bare array of already-resolved features.
pub fn parse_countries(text: &str) -> Result<Vec<CountryPolygon>, CountryError> {
    let features: Vec<Feature> = if text.trim_start().starts_with('[') {
        serde_json::from_str(text)?
    } else {
        match text.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(fc) => fc.features,
            GeoJson::Feature(f) => vec![f],
            GeoJson::Geometry(_) => return Err(CountryError::BareGeometry),
        }
    };

    Ok(features.iter().filter_map(country_from_feature).collect())
}

fn country_from_feature(feature: &Feature) -> Option<CountryPolygon> {
    let name = NAME_KEYS
        .iter()
        .find_map(|key| feature.property(key).and_then(|v| v.as_str()))
        .unwrap_or_default()
        .to_string();

    let mut rings = Vec::new();
    if let Some(ref geometry) = feature.geometry {
        collect_rings(geometry, &mut rings);
    }

    if rings.is_empty() {
        return None;
    }

    Some(CountryPolygon {
        name,
        rings,
        allegiance: Allegiance::Neutral,
    })
}

fn collect_rings(geometry: &Geometry, rings: &mut Vec<Vec<GeoPoint>>) {
    let to_ring = |coords: &Vec<Vec<f64>>| -> Vec<GeoPoint> {
        coords
            .iter()
            .filter(|c| c.len() >= 2)
            .map(|c| GeoPoint::new(c[0], c[1]))
            .collect()
    };

    match &geometry.value {
        Value::Polygon(polygon) => {
            if let Some(exterior) = polygon.first() {
                rings.push(to_ring(exterior));
            }
        }
        Value::MultiPolygon(polygons) => {
            for polygon in polygons {
                if let Some(exterior) = polygon.first() {
                    rings.push(to_ring(exterior));
                }
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_rings(g, rings);
            }
        }
        _ => {}
    }
}
