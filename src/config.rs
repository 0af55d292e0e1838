use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::geo::LatLng;
use crate::ports::PositionOptions;

/// Which mapping library the host page loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MapProvider {
    #[default]
    Leaflet,
    GoogleMaps,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub log_level: String,
    pub map: MapConfig,
    pub toast: ToastConfig,
    pub notifications: NotificationConfig,
    pub search: SearchConfig,
    pub geolocation: GeolocationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub provider: MapProvider,
    pub container_id: String,
    pub material_filter_id: String,
    pub fallback_center: LatLng,
    pub fallback_zoom: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToastConfig {
    pub container_id: String,
    pub duration_ms: u64,
    pub hide_animation_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub poll_interval_ms: u64,
    pub removal_animation_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub min_chars: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    pub timeout_ms: u64,
    pub maximum_age_ms: u64,
    pub high_accuracy: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/".to_string(),
            log_level: "info".to_string(),
            map: MapConfig::default(),
            toast: ToastConfig::default(),
            notifications: NotificationConfig::default(),
            search: SearchConfig::default(),
            geolocation: GeolocationConfig::default(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            provider: MapProvider::Leaflet,
            container_id: "center-map".to_string(),
            material_filter_id: "material-filter".to_string(),
            fallback_center: LatLng::new(40.7128, -74.0060),
            fallback_zoom: 11,
        }
    }
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            container_id: "toast-container".to_string(),
            duration_ms: 5000,
            hide_animation_ms: 150,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 30_000,
            removal_animation_ms: 300,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            min_chars: 2,
        }
    }
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            maximum_age_ms: 300_000,
            high_accuracy: true,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url cannot be empty".to_string()));
        }
        if self.map.container_id.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "map.container_id cannot be empty".to_string(),
            ));
        }
        if self.map.fallback_zoom > 22 {
            return Err(ConfigError::Invalid(format!(
                "map.fallback_zoom {} is above the maximum of 22",
                self.map.fallback_zoom
            )));
        }
        if self.notifications.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "notifications.poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.search.debounce_ms == 0 {
            return Err(ConfigError::Invalid(
                "search.debounce_ms must be greater than 0".to_string(),
            ));
        }
        if self.search.min_chars == 0 {
            return Err(ConfigError::Invalid(
                "search.min_chars must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl ToastConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn hide_animation(&self) -> Duration {
        Duration::from_millis(self.hide_animation_ms)
    }
}

impl NotificationConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn removal_animation(&self) -> Duration {
        Duration::from_millis(self.removal_animation_ms)
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl GeolocationConfig {
    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            enable_high_accuracy: self.high_accuracy,
            timeout: Duration::from_millis(self.timeout_ms),
            maximum_age: Duration::from_millis(self.maximum_age_ms),
        }
    }
}
