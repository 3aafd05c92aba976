use crate::error::Result;
use crate::latency::LatencyRanges;
use log::{debug, warn};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub globe: GlobeSettings,
    pub filters: FilterSettings,
    pub generator: GeneratorSettings,
    pub ai: AiSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GlobeSettings {
    pub auto_rotate: bool,
    pub rotate_step: f32,       // radians per frame
    pub camera_distance: f32,
    pub coastline: Option<PathBuf>, // JSON outline replacing the built-in one
    pub analysis_hours: f64,
}

impl Default for GlobeSettings {
    fn default() -> Self {
        Self {
            auto_rotate: true,
            rotate_step: 0.002,
            camera_distance: 15.0,
            coastline: None,
            analysis_hours: 7.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub exchanges: Vec<String>,
    pub providers: Vec<String>,
    pub max_latency_ms: f64,
    pub show_connections: bool,
    pub show_regions: bool,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            exchanges: Vec::new(),
            providers: Vec::new(),
            max_latency_ms: 300.0,
            show_connections: true,
            show_regions: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    pub refresh_secs: f64,
    pub same_provider_ms: [f64; 2],
    pub cross_provider_ms: [f64; 2],
    pub seed: Option<u64>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            refresh_secs: 5.0,
            same_provider_ms: [30.0, 50.0],
            cross_provider_ms: [50.0, 250.0],
            seed: None,
        }
    }
}

impl GeneratorSettings {
    pub fn ranges(&self) -> Result<LatencyRanges> {
        LatencyRanges::from_bounds(self.same_provider_ms, self.cross_provider_ms)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
}

impl Settings {
    /// Load from the default path. Problems are logged and yield defaults.
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            debug!("no settings at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("ignoring settings file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("geoquantica")
            .join("config.toml")
    }
}
