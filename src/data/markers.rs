use serde::Deserialize;
use serde_json::{Map, Value};

use crate::geo::GeoPoint;

/// Free-form display fields, kept for tooltip text only.
pub type Metadata = Vec<(String, String)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Takeoff,
    Target,
}

impl MarkerKind {
    pub fn label(self) -> &'static str {
        match self {
            MarkerKind::Takeoff => "Takeoff base",
            MarkerKind::Target => "Target",
        }
    }
}

/// A takeoff base or target. Identity is its index in the owning collection.
#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub position: GeoPoint,
    pub meta: Metadata,
}

impl Marker {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            position: GeoPoint::new(longitude, latitude),
            meta: Vec::new(),
        }
    }

    pub fn with_meta(mut self, key: &str, value: &str) -> Self {
        self.meta.push((key.to_string(), value.to_string()));
        self
    }
}

/// Line from a takeoff base to its target, with mission details.
#[derive(Clone, Debug, PartialEq)]
pub struct FlightPath {
    pub takeoff: GeoPoint,
    pub target: GeoPoint,
    pub meta: Metadata,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("cannot pair {takeoffs} takeoff locations with {targets} target locations")]
    LengthMismatch { takeoffs: usize, targets: usize },
}

/// Pair takeoffs and targets index-for-index into flight paths.
/// Both arrays must be the same length and in the same mission order.
pub fn build_flight_paths(takeoffs: &[Marker], targets: &[Marker]) -> Result<Vec<FlightPath>, SceneError> {
    if takeoffs.len() != targets.len() {
        return Err(SceneError::LengthMismatch {
            takeoffs: takeoffs.len(),
            targets: targets.len(),
        });
    }

    Ok(takeoffs
        .iter()
        .zip(targets)
        .map(|(from, to)| FlightPath {
            takeoff: from.position,
            target: to.position,
            meta: to.meta.clone(),
        })
        .collect())
}

/// One row of a marker array as it appears on disk.
#[derive(Deserialize)]
struct MarkerRecord {
    longitude: f64,
    latitude: f64,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

impl From<MarkerRecord> for Marker {
    fn from(record: MarkerRecord) -> Self {
        let meta = record
            .rest
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| {
                let text = match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, text)
            })
            .collect();

        Self {
            position: GeoPoint::new(record.longitude, record.latitude),
            meta,
        }
    }
}

impl Marker {
    /// Longitude within ±180°, latitude within ±90°, both finite.
    pub fn in_range(&self) -> bool {
        let GeoPoint { longitude, latitude } = self.position;
        longitude.is_finite() && latitude.is_finite() && longitude.abs() <= 180.0 && latitude.abs() <= 90.0
    }
}

/// Parse a JSON marker array. The buffer is used as simd-json scratch space.
pub fn parse_markers(bytes: &mut [u8]) -> Result<Vec<Marker>, simd_json::Error> {
    let records: Vec<MarkerRecord> = simd_json::serde::from_slice(bytes)?;
    Ok(records.into_iter().map(Marker::from).collect())
}
