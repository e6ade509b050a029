//! Seismic intensity classes (JMA shindo) as reported by the feed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discretized shaking severity. Variants are declared from most to least
/// severe so the derived ordering matches display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IntensityClass {
    Seven,
    SixUpper,
    SixLower,
    FiveUpper,
    FiveLower,
    Four,
    Three,
    Two,
    One,
    Invalid,
}

impl IntensityClass {
    /// Every class in display order, most severe first.
    pub const ORDER: [IntensityClass; 10] = [
        IntensityClass::Seven,
        IntensityClass::SixUpper,
        IntensityClass::SixLower,
        IntensityClass::FiveUpper,
        IntensityClass::FiveLower,
        IntensityClass::Four,
        IntensityClass::Three,
        IntensityClass::Two,
        IntensityClass::One,
        IntensityClass::Invalid,
    ];

    /// Map a feed scale code (10..70) to its class.
    pub fn from_scale(scale: i64) -> Self {
        match scale {
            10 => Self::One,
            20 => Self::Two,
            30 => Self::Three,
            40 => Self::Four,
            45 => Self::FiveLower,
            50 => Self::FiveUpper,
            55 => Self::SixLower,
            60 => Self::SixUpper,
            70 => Self::Seven,
            _ => Self::Invalid,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Seven => "7",
            Self::SixUpper => "6+",
            Self::SixLower => "6-",
            Self::FiveUpper => "5+",
            Self::FiveLower => "5-",
            Self::Four => "4",
            Self::Three => "3",
            Self::Two => "2",
            Self::One => "1",
            Self::Invalid => "--",
        }
    }

    /// Heading used for the bucket in ranked lists.
    pub fn heading(&self) -> &'static str {
        match self {
            Self::Invalid => "Invalid Intensity",
            other => other.label(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

impl fmt::Display for IntensityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
