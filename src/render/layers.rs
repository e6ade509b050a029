//! Well-known layer names and icon naming.
//!
//! Every render routine draws into these fixed names so that the next
//! pass can always find and remove what the previous one left behind.

use crate::models::{Grade, IntensityClass};
use crate::render::Icon;

pub const EPICENTER: &str = "epicenterIcon";
pub const STATIONS: &str = "stationsLayer";
pub const PREFECTURES: &str = "prefsLayer";
pub const EEW_AREAS: &str = "eewAreasLayer";

/// Layers owned by the 551 / 556 family, cleared before every such render.
pub const QUAKE_LAYERS: [&str; 4] = [PREFECTURES, EPICENTER, STATIONS, EEW_AREAS];

pub const TSUNAMI_MAJOR_WARNING: &str = "tsunamiMajorWarning";
pub const TSUNAMI_WARNING: &str = "tsunamiWarning";
pub const TSUNAMI_WATCH: &str = "tsunamiWatch";
pub const TSUNAMI_UNKNOWN: &str = "tsunamiUnknown";

/// Tsunami layers, independent of the quake layers.
pub const TSUNAMI_LAYERS: [&str; 4] = [
    TSUNAMI_UNKNOWN,
    TSUNAMI_WATCH,
    TSUNAMI_WARNING,
    TSUNAMI_MAJOR_WARNING,
];

pub fn tsunami_layer(grade: Grade) -> &'static str {
    match grade {
        Grade::MajorWarning => TSUNAMI_MAJOR_WARNING,
        Grade::Warning => TSUNAMI_WARNING,
        Grade::Watch => TSUNAMI_WATCH,
        Grade::Unknown => TSUNAMI_UNKNOWN,
    }
}

/// Resolves icon URLs under a base path.
#[derive(Debug, Clone)]
pub struct IconSet {
    base: String,
}

impl IconSet {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Confirmed epicenter.
    pub fn epicenter(&self) -> Icon {
        Icon {
            url: format!("{}/epicenter.png", self.base),
            size: [31, 31],
            anchor: [15, 15],
        }
    }

    /// Estimated epicenter of an early warning.
    pub fn potential_epicenter(&self) -> Icon {
        Icon {
            url: format!("{}/eewEpicenter.png", self.base),
            size: [30, 30],
            anchor: [15, 15],
        }
    }

    /// Observed station intensity.
    pub fn intensity(&self, scale: i64) -> Icon {
        self.scaled("intensities", scale)
    }

    /// Regional / forecast intensity.
    pub fn scale(&self, scale: i64) -> Icon {
        self.scaled("scales", scale)
    }

    fn scaled(&self, dir: &str, scale: i64) -> Icon {
        let file = if IntensityClass::from_scale(scale).is_valid() {
            scale.to_string()
        } else {
            "invalid".to_string()
        };
        Icon {
            url: format!("{}/{dir}/{file}.png", self.base),
            size: [20, 20],
            anchor: [10, 10],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_urls() {
        let icons = IconSet::new("/assets/basemap/icons/");
        assert_eq!(icons.intensity(50).url, "/assets/basemap/icons/intensities/50.png");
        assert_eq!(icons.scale(45).url, "/assets/basemap/icons/scales/45.png");
        assert_eq!(icons.epicenter().url, "/assets/basemap/icons/epicenter.png");
        assert_ne!(icons.epicenter().url, icons.potential_epicenter().url);
    }

    #[test]
    fn test_unknown_scale_uses_invalid_icon() {
        let icons = IconSet::new("/icons");
        assert_eq!(icons.intensity(46).url, "/icons/intensities/invalid.png");
        assert_eq!(icons.scale(-1).url, "/icons/scales/invalid.png");
    }

    #[test]
    fn test_layer_namespaces_are_disjoint() {
        for layer in QUAKE_LAYERS {
            assert!(!TSUNAMI_LAYERS.contains(&layer));
        }
    }
}
