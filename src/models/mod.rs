// src/models/mod.rs

//! Domain models for the map client.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
pub mod geo;
mod intensity;
mod reference;
mod report;
mod snapshot;
mod tsunami;

// Re-export all public types
pub use config::{ApiConfig, AssetConfig, Config, HttpConfig, LoggingConfig, MapConfig, SoundConfig};
pub use geo::{Bounds, LatLng, haversine_km};
pub use intensity::IntensityClass;
pub use reference::{
    AreaGeometry, EpicenterNames, Locate, PrefectureMap, ReferenceEntry, ReferenceTable,
    StationMap, TsunamiAreaMap,
};
pub use report::{
    Comments, Earthquake, ForecastArea, Hypocenter, Issue, ObservationPoint, ReportEnvelope,
    UNKNOWN_VALUE,
};
pub use snapshot::FeedSnapshot;
pub use tsunami::{FirstHeight, Grade, MaxHeight, TsunamiArea, TsunamiEnvelope};
