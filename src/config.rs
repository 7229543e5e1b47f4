use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::data::{MarkerSources, SceneSources};

fn default_scroll_sens() -> f64 {
    75.0
}

fn default_min_zoom() -> f64 {
    1.0
}

fn default_max_zoom() -> f64 {
    8.0
}

fn default_marker_radius() -> f64 {
    2.0
}

fn default_marker_max_radius() -> f64 {
    6.0
}

/// Globe configuration as read from JSON.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GlobeConfig {
    /// Map area width in terminal cells; the whole terminal when absent
    #[serde(default)]
    pub width: Option<u16>,
    /// Map area height in terminal cells; the whole terminal when absent
    #[serde(default)]
    pub height: Option<u16>,
    pub map_url: PathBuf,
    #[serde(default)]
    pub target_locals: Option<PathBuf>,
    #[serde(default)]
    pub takeoff_locals: Option<PathBuf>,
    #[serde(default)]
    pub marker_file: Option<PathBuf>,
    #[serde(default)]
    pub allied_file: Option<PathBuf>,
    #[serde(default)]
    pub axis_file: Option<PathBuf>,
    /// Drag-to-rotation sensitivity
    #[serde(default = "default_scroll_sens")]
    pub scroll_sens: f64,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f64,
    #[serde(default)]
    pub draw_graticule: bool,
    /// Marker radius at the initial scale, in dots
    #[serde(default = "default_marker_radius")]
    pub marker_radius: f64,
    /// Upper bound on marker radius however far the globe is zoomed
    #[serde(default = "default_marker_max_radius")]
    pub marker_max_radius: f64,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("map_url must not be empty")]
    MissingMap,
    #[error("no marker source: set marker_file or target_locals")]
    MissingMarkers,
    #[error("marker_file cannot be combined with target_locals or takeoff_locals")]
    AmbiguousMarkers,
    #[error("takeoff_locals requires target_locals")]
    UnpairedTakeoffs,
    #[error("zoom range must satisfy 0 < min_zoom <= max_zoom (got {min}..{max})")]
    ZoomRange { min: f64, max: f64 },
    #[error("scroll_sens must be a positive number (got {0})")]
    Sensitivity(f64),
    #[error("marker radii must satisfy 0 < marker_radius <= marker_max_radius (got {base}, {max})")]
    MarkerRadius { base: f64, max: f64 },
    #[error("width and height must be non-zero")]
    EmptyViewport,
}

impl GlobeConfig {
    /// Read, parse and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.map_url.as_os_str().is_empty() {
            return Err(ConfigError::MissingMap);
        }

        match (&self.marker_file, &self.target_locals, &self.takeoff_locals) {
            (Some(_), None, None) | (None, Some(_), _) => {}
            (Some(_), _, _) => return Err(ConfigError::AmbiguousMarkers),
            (None, None, Some(_)) => return Err(ConfigError::UnpairedTakeoffs),
            (None, None, None) => return Err(ConfigError::MissingMarkers),
        }

        let (min, max) = (self.min_zoom, self.max_zoom);
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
            return Err(ConfigError::ZoomRange { min, max });
        }

        if !(self.scroll_sens.is_finite() && self.scroll_sens > 0.0) {
            return Err(ConfigError::Sensitivity(self.scroll_sens));
        }

        let (base, max) = (self.marker_radius, self.marker_max_radius);
        if !(base.is_finite() && max.is_finite() && base > 0.0 && base <= max) {
            return Err(ConfigError::MarkerRadius { base, max });
        }

        if self.width == Some(0) || self.height == Some(0) {
            return Err(ConfigError::EmptyViewport);
        }

        Ok(())
    }

    /// Resolve relative resource paths against `base` (the config's directory).
    pub fn resolve_paths(&mut self, base: &Path) {
        let fix = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        fix(&mut self.map_url);
        for p in [
            &mut self.target_locals,
            &mut self.takeoff_locals,
            &mut self.marker_file,
            &mut self.allied_file,
            &mut self.axis_file,
        ]
        .into_iter()
        .flatten()
        {
            fix(p);
        }
    }

    /// The resources a scene load needs. Assumes a validated config.
    pub fn sources(&self) -> Result<SceneSources, ConfigError> {
        let markers = match (&self.marker_file, &self.target_locals, &self.takeoff_locals) {
            (Some(file), None, None) => MarkerSources::Targets(file.clone()),
            (None, Some(targets), Some(takeoffs)) => MarkerSources::Paired {
                takeoffs: takeoffs.clone(),
                targets: targets.clone(),
            },
            (None, Some(targets), None) => MarkerSources::Targets(targets.clone()),
            (Some(_), _, _) => return Err(ConfigError::AmbiguousMarkers),
            (None, None, Some(_)) => return Err(ConfigError::UnpairedTakeoffs),
            (None, None, None) => return Err(ConfigError::MissingMarkers),
        };

        Ok(SceneSources {
            map: self.map_url.clone(),
            markers,
            allied: self.allied_file.clone(),
            axis: self.axis_file.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GlobeConfig::from_json(r#"{"map_url": "world.json", "marker_file": "m.json"}"#).unwrap();
        assert_eq!(config.scroll_sens, 75.0);
        assert_eq!(config.min_zoom, 1.0);
        assert_eq!(config.max_zoom, 8.0);
        assert!(!config.draw_graticule);
        assert_eq!(config.width, None);
        assert_eq!(
            config.sources().unwrap().markers,
            MarkerSources::Targets(PathBuf::from("m.json"))
        );
    }

    #[test]
    fn test_paired_sources() {
        let config = GlobeConfig::from_json(
            r#"{"map_url": "w.json", "target_locals": "t.json", "takeoff_locals": "o.json",
                "draw_graticule": true, "max_zoom": 4}"#,
        )
        .unwrap();
        assert!(config.draw_graticule);
        assert_eq!(
            config.sources().unwrap().markers,
            MarkerSources::Paired {
                takeoffs: PathBuf::from("o.json"),
                targets: PathBuf::from("t.json"),
            }
        );
    }

    #[test]
    fn test_missing_map_url_fails() {
        assert!(matches!(
            GlobeConfig::from_json(r#"{"marker_file": "m.json"}"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            GlobeConfig::from_json(r#"{"map_url": "", "marker_file": "m.json"}"#),
            Err(ConfigError::MissingMap)
        ));
    }

    #[test]
    fn test_marker_source_rules() {
        assert!(matches!(
            GlobeConfig::from_json(r#"{"map_url": "w"}"#),
            Err(ConfigError::MissingMarkers)
        ));
        assert!(matches!(
            GlobeConfig::from_json(r#"{"map_url": "w", "marker_file": "m", "target_locals": "t"}"#),
            Err(ConfigError::AmbiguousMarkers)
        ));
        assert!(matches!(
            GlobeConfig::from_json(r#"{"map_url": "w", "takeoff_locals": "o"}"#),
            Err(ConfigError::UnpairedTakeoffs)
        ));
    }

    #[test]
    fn test_numeric_validation() {
        assert!(matches!(
            GlobeConfig::from_json(r#"{"map_url": "w", "marker_file": "m", "min_zoom": 5, "max_zoom": 2}"#),
            Err(ConfigError::ZoomRange { .. })
        ));
        assert!(matches!(
            GlobeConfig::from_json(r#"{"map_url": "w", "marker_file": "m", "scroll_sens": 0}"#),
            Err(ConfigError::Sensitivity(_))
        ));
        assert!(matches!(
            GlobeConfig::from_json(r#"{"map_url": "w", "marker_file": "m", "marker_radius": 9}"#),
            Err(ConfigError::MarkerRadius { .. })
        ));
        assert!(matches!(
            GlobeConfig::from_json(r#"{"map_url": "w", "marker_file": "m", "width": 0}"#),
            Err(ConfigError::EmptyViewport)
        ));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(GlobeConfig::from_json(r#"{"map_url": "w", "marker_file": "m", "zoom": 3}"#).is_err());
    }

    #[test]
    fn test_resolve_paths() {
        let mut config = GlobeConfig::from_json(r#"{"map_url": "w.json", "marker_file": "/abs/m.json"}"#).unwrap();
        config.resolve_paths(Path::new("/data"));
        assert_eq!(config.map_url, PathBuf::from("/data/w.json"));
        assert_eq!(config.marker_file, Some(PathBuf::from("/abs/m.json")));
    }
}
