//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Feed endpoints and poll intervals
    #[serde(default)]
    pub api: ApiConfig,

    /// Camera and overlay behaviour
    #[serde(default)]
    pub map: MapConfig,

    /// Static reference data and icon locations
    #[serde(default)]
    pub assets: AssetConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Notification sound settings
    #[serde(default)]
    pub sound: SoundConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(AppError::validation("api.base_url is empty"));
        }
        if self.api.tsunami_url.trim().is_empty() {
            return Err(AppError::validation("api.tsunami_url is empty"));
        }
        if self.api.interval == 0 {
            return Err(AppError::validation("api.interval must be > 0"));
        }
        if self.api.tsunami_interval == 0 {
            return Err(AppError::validation("api.tsunami_interval must be > 0"));
        }
        if self.map.default_bounds.len() < 2 {
            return Err(AppError::validation(
                "map.default_bounds needs at least two corners",
            ));
        }
        if self.map.flash_visible_ms == 0 || self.map.flash_hidden_ms == 0 {
            return Err(AppError::validation("map flash phases must be > 0"));
        }
        for (name, value) in [
            ("assets.station_ref_url", &self.assets.station_ref_url),
            ("assets.prefecture_ref_url", &self.assets.prefecture_ref_url),
            ("assets.tsunami_areas_url", &self.assets.tsunami_areas_url),
            ("assets.epicenter_ref_url", &self.assets.epicenter_ref_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| AppError::validation(format!("{name} is not a URL: {e}")))?;
        }
        if !(0.0..=1.0).contains(&self.sound.volume) {
            return Err(AppError::validation("sound.volume must be within 0..=1"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        Ok(())
    }
}

/// Feed endpoints and poll intervals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Main (551/556) feed URL
    #[serde(default = "defaults::base_url", alias = "baseUrl")]
    pub base_url: String,

    /// Main feed poll interval in milliseconds
    #[serde(default = "defaults::interval")]
    pub interval: u64,

    /// Tsunami feed URL
    #[serde(default = "defaults::tsunami_url", alias = "tsunamiUrl")]
    pub tsunami_url: String,

    /// Tsunami feed poll interval in milliseconds
    #[serde(default = "defaults::tsunami_interval", alias = "tsunamiInterval")]
    pub tsunami_interval: u64,
}

impl ApiConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval)
    }

    pub fn tsunami_interval(&self) -> Duration {
        Duration::from_millis(self.tsunami_interval)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            interval: defaults::interval(),
            tsunami_url: defaults::tsunami_url(),
            tsunami_interval: defaults::tsunami_interval(),
        }
    }
}

/// Camera and overlay behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Regional box as `[lng, lat]` corners, used to frame DE/FO reports
    #[serde(default = "defaults::default_bounds", alias = "defaultBounds")]
    pub default_bounds: Vec<[f64; 2]>,

    /// Padding around fitted bounds in pixels
    #[serde(default = "defaults::bound_padding", alias = "boundPadding")]
    pub bound_padding: u32,

    /// Camera animation duration in milliseconds
    #[serde(default = "defaults::bound_duration", alias = "boundDuration")]
    pub bound_duration: u64,

    /// How long tsunami lines stay visible per flash cycle
    #[serde(default = "defaults::flash_visible")]
    pub flash_visible_ms: u64,

    /// How long tsunami lines stay hidden per flash cycle
    #[serde(default = "defaults::flash_hidden")]
    pub flash_hidden_ms: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_bounds: defaults::default_bounds(),
            bound_padding: defaults::bound_padding(),
            bound_duration: defaults::bound_duration(),
            flash_visible_ms: defaults::flash_visible(),
            flash_hidden_ms: defaults::flash_hidden(),
        }
    }
}

/// Static reference data and icon locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Station CSV (`name,_,_,lat,long`)
    #[serde(default = "defaults::station_ref_url")]
    pub station_ref_url: String,

    /// Prefecture CSV (`code,name,fullname,code2,lat,long`)
    #[serde(default = "defaults::prefecture_ref_url")]
    pub prefecture_ref_url: String,

    /// Tsunami forecast area GeoJSON
    #[serde(default = "defaults::tsunami_areas_url")]
    pub tsunami_areas_url: String,

    /// Epicenter name translations (`[{"jp": .., "en": ..}]`). Optional at
    /// runtime: names fall back to the feed text when it cannot be loaded.
    #[serde(default = "defaults::epicenter_ref_url")]
    pub epicenter_ref_url: String,

    /// Base path for marker icons
    #[serde(default = "defaults::icon_base_url")]
    pub icon_base_url: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            station_ref_url: defaults::station_ref_url(),
            prefecture_ref_url: defaults::prefecture_ref_url(),
            tsunami_areas_url: defaults::tsunami_areas_url(),
            epicenter_ref_url: defaults::epicenter_ref_url(),
            icon_base_url: defaults::icon_base_url(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Notification sound settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoundConfig {
    #[serde(default = "defaults::volume")]
    pub volume: f32,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            volume: defaults::volume(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    // API defaults (p2pquake allows 60 req/min on history, 10 req/min on jma)
    pub fn base_url() -> String {
        "https://api.p2pquake.net/v2/history?codes=551&codes=556&limit=1".into()
    }
    pub fn interval() -> u64 {
        5000
    }
    pub fn tsunami_url() -> String {
        "https://api.p2pquake.net/v2/jma/tsunami?limit=1".into()
    }
    pub fn tsunami_interval() -> u64 {
        10000
    }

    // Map defaults
    pub fn default_bounds() -> Vec<[f64; 2]> {
        vec![
            [122.778834, 23.927012],
            [149.367464, 23.927012],
            [149.367464, 45.606257],
            [122.778834, 45.606257],
            [122.778834, 23.927012],
        ]
    }
    pub fn bound_padding() -> u32 {
        100
    }
    pub fn bound_duration() -> u64 {
        500
    }
    pub fn flash_visible() -> u64 {
        1000
    }
    pub fn flash_hidden() -> u64 {
        500
    }

    // Asset defaults
    pub fn station_ref_url() -> String {
        "http://localhost:5173/assets/comparision/stationRef.csv".into()
    }
    pub fn prefecture_ref_url() -> String {
        "http://localhost:5173/assets/comparision/prefectureRef.csv".into()
    }
    pub fn tsunami_areas_url() -> String {
        "http://localhost:5173/assets/comparision/tsunami_areas.geojson".into()
    }
    pub fn epicenter_ref_url() -> String {
        "http://localhost:5173/assets/special/epicenterRef.json".into()
    }
    pub fn icon_base_url() -> String {
        "/assets/basemap/icons".into()
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; quakemap/0.1)".into()
    }
    pub fn timeout() -> u64 {
        10
    }

    pub fn volume() -> f32 {
        0.5
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
