mod countries;
mod loader;
mod markers;

pub use countries::{parse_countries, Allegiance, AllegianceSets, CountryError, CountryPolygon, TerritoryList};
pub use loader::SceneLoader;
pub use markers::{build_flight_paths, parse_markers, FlightPath, Marker, MarkerKind, Metadata, SceneError};

use std::fs;
use std::path::{Path, PathBuf};

/// Where marker arrays come from.
#[derive(Clone, Debug, PartialEq)]
pub enum MarkerSources {
    /// Takeoff and target arrays, paired index-for-index into flight paths
    Paired { takeoffs: PathBuf, targets: PathBuf },
    /// A single array, shown as targets with no paths
    Targets(PathBuf),
}

/// Every resource a scene is built from.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneSources {
    pub map: PathBuf,
    pub markers: MarkerSources,
    pub allied: Option<PathBuf>,
    pub axis: Option<PathBuf>,
}

/// Everything the globe draws besides the sphere and graticule.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneData {
    pub countries: Vec<CountryPolygon>,
    pub takeoffs: Vec<Marker>,
    pub targets: Vec<Marker>,
    pub paths: Vec<FlightPath>,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("invalid country data in {}: {source}", path.display())]
    Countries {
        path: PathBuf,
        #[source]
        source: CountryError,
    },
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Read and parse every resource in parallel. Any failure fails the whole
/// load; nothing partial is returned.
pub fn load(sources: &SceneSources) -> Result<SceneData, LoadError> {
    let ((countries, allegiance), (takeoffs, targets)) = rayon::join(
        || {
            rayon::join(
                || read_countries(&sources.map),
                || read_allegiance(sources.allied.as_deref(), sources.axis.as_deref()),
            )
        },
        || match &sources.markers {
            MarkerSources::Paired { takeoffs, targets } => {
                let (t, g) = rayon::join(|| read_markers(takeoffs), || read_markers(targets));
                (t.map(Some), g)
            }
            MarkerSources::Targets(path) => (Ok(None), read_markers(path)),
        },
    );

    let mut countries = countries?;
    allegiance?.apply(&mut countries);

    let targets = targets?;
    let (takeoffs, paths) = match takeoffs? {
        Some(takeoffs) => {
            let paths = build_flight_paths(&takeoffs, &targets)?;
            (takeoffs, paths)
        }
        None => (Vec::new(), Vec::new()),
    };

    tracing::info!(
        countries = countries.len(),
        takeoffs = takeoffs.len(),
        targets = targets.len(),
        paths = paths.len(),
        "scene loaded"
    );

    Ok(SceneData {
        countries,
        takeoffs,
        targets,
        paths,
    })
}

fn read(path: &Path) -> Result<Vec<u8>, LoadError> {
    fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_error(path: &Path, message: impl ToString) -> LoadError {
    LoadError::Parse {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

fn read_countries(path: &Path) -> Result<Vec<CountryPolygon>, LoadError> {
    let bytes = read(path)?;
    let text = String::from_utf8(bytes).map_err(|e| parse_error(path, e))?;
    parse_countries(&text).map_err(|source| LoadError::Countries {
        path: path.to_path_buf(),
        source,
    })
}

fn read_markers(path: &Path) -> Result<Vec<Marker>, LoadError> {
    let mut bytes = read(path)?;
    let markers = parse_markers(&mut bytes).map_err(|e| parse_error(path, e))?;

    // Kept so takeoffs and targets stay paired by index
    let out_of_range = markers.iter().filter(|m| !m.in_range()).count();
    if out_of_range > 0 {
        tracing::warn!(path = %path.display(), out_of_range, "markers with impossible coordinates");
    }
    Ok(markers)
}

fn read_territories(path: &Path) -> Result<Vec<String>, LoadError> {
    let mut bytes = read(path)?;
    let list: TerritoryList = simd_json::serde::from_slice(&mut bytes).map_err(|e| parse_error(path, e))?;
    Ok(list.territories)
}

fn read_allegiance(allied: Option<&Path>, axis: Option<&Path>) -> Result<AllegianceSets, LoadError> {
    let mut sets = AllegianceSets::default();
    if let Some(path) = allied {
        sets.allied = read_territories(path)?.into_iter().collect();
    }
    if let Some(path) = axis {
        sets.axis = read_territories(path)?.into_iter().collect();
    }
    Ok(sets)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use std::io::Write;
    use tempfile::TempDir;

    pub(crate) const WORLD: &str = r#"{"type": "FeatureCollection", "features": [
        {"type": "Feature", "properties": {"name": "France"},
         "geometry": {"type": "Polygon", "coordinates": [[[0,40],[5,40],[5,45],[0,45],[0,40]]]}},
        {"type": "Feature", "properties": {"name": "Germany"},
         "geometry": {"type": "Polygon", "coordinates": [[[6,47],[14,47],[14,54],[6,54],[6,47]]]}}
    ]}"#;

    pub(crate) fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    /// A complete paired scene on disk
    pub(crate) fn fixture(dir: &TempDir) -> SceneSources {
        SceneSources {
            map: write(dir, "world.json", WORLD),
            markers: MarkerSources::Paired {
                takeoffs: write(
                    dir,
                    "takeoff.json",
                    r#"[{"longitude": 0, "latitude": 52, "base": "Bassingbourn"},
                        {"longitude": -1, "latitude": 51}]"#,
                ),
                targets: write(
                    dir,
                    "target.json",
                    r#"[{"longitude": 8, "latitude": 50, "tons": 120},
                        {"longitude": 10, "latitude": 53}]"#,
                ),
            },
            allied: Some(write(dir, "allied.json", r#"{"territories": ["France"]}"#)),
            axis: Some(write(dir, "axis.json", r#"{"territories": ["Germany"]}"#)),
        }
    }

    #[test]
    fn test_load_paired_scene() {
        let dir = TempDir::new().unwrap();
        let scene = load(&fixture(&dir)).unwrap();

        assert_eq!(scene.countries.len(), 2);
        assert_eq!(scene.countries[0].allegiance, Allegiance::Allied);
        assert_eq!(scene.countries[1].allegiance, Allegiance::Axis);
        assert_eq!(scene.takeoffs.len(), 2);
        assert_eq!(scene.targets.len(), 2);
        assert_eq!(scene.paths.len(), 2);
        assert_eq!(scene.paths[0].meta, vec![("tons".to_string(), "120".to_string())]);
    }

    #[test]
    fn test_load_single_marker_file() {
        let dir = TempDir::new().unwrap();
        let sources = SceneSources {
            map: write(&dir, "world.json", WORLD),
            markers: MarkerSources::Targets(write(&dir, "m.json", r#"[{"longitude": 1, "latitude": 2}]"#)),
            allied: None,
            axis: None,
        };
        let scene = load(&sources).unwrap();
        assert!(scene.takeoffs.is_empty());
        assert!(scene.paths.is_empty());
        assert_eq!(scene.targets.len(), 1);
        assert!(scene.countries.iter().all(|c| c.allegiance == Allegiance::Neutral));
    }

    #[test]
    fn test_load_fails_atomically_on_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut sources = fixture(&dir);
        sources.axis = Some(dir.path().join("missing.json"));
        assert!(matches!(load(&sources), Err(LoadError::Read { .. })));
    }

    #[test]
    fn test_load_fails_on_bad_marker_json() {
        let dir = TempDir::new().unwrap();
        let mut sources = fixture(&dir);
        sources.markers = MarkerSources::Targets(write(&dir, "bad.json", "[{"));
        assert!(matches!(load(&sources), Err(LoadError::Parse { .. })));
    }

    #[test]
    fn test_out_of_range_markers_keep_pairing() {
        let dir = TempDir::new().unwrap();
        let mut sources = fixture(&dir);
        sources.markers = MarkerSources::Paired {
            takeoffs: write(&dir, "t.json", r#"[{"longitude": 0, "latitude": 4120}, {"longitude": 1, "latitude": 2}]"#),
            targets: write(&dir, "g.json", r#"[{"longitude": 5, "latitude": 5}, {"longitude": 6, "latitude": 6}]"#),
        };
        let scene = load(&sources).unwrap();
        assert_eq!(scene.takeoffs.len(), 2);
        assert!(!scene.takeoffs[0].in_range());
        assert_eq!(scene.paths[1].takeoff, GeoPoint::new(1.0, 2.0));
        assert_eq!(scene.paths[1].target, GeoPoint::new(6.0, 6.0));
    }

    #[test]
    fn test_load_fails_on_topology_map() {
        let dir = TempDir::new().unwrap();
        let mut sources = fixture(&dir);
        sources.map = write(&dir, "topo.json", r#"{"type": "Topology", "objects": {}, "arcs": []}"#);
        assert!(matches!(load(&sources), Err(LoadError::Countries { .. })));
    }

    #[test]
    fn test_load_fails_on_mismatched_lengths() {
        let dir = TempDir::new().unwrap();
        let mut sources = fixture(&dir);
        sources.markers = MarkerSources::Paired {
            takeoffs: write(&dir, "t.json", r#"[{"longitude": 0, "latitude": 0}]"#),
            targets: write(&dir, "g.json", "[]"),
        };
        let err = load(&sources).unwrap_err();
        assert!(matches!(err, LoadError::Scene(SceneError::LengthMismatch { takeoffs: 1, targets: 0 })));
    }
}
