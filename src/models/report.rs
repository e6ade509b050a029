//! Decoded items from the main (551 / 556) feed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::geo::LatLng;

/// Sentinel used by the feed for an unknown magnitude or depth.
pub const UNKNOWN_VALUE: f64 = -1.0;

/// One report from the main feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEnvelope {
    /// Feed code driving classification (551, 556, ...)
    pub code: i64,

    /// Issue metadata; only hypocenter reports carry a type
    #[serde(default)]
    pub issue: Option<Issue>,

    #[serde(default)]
    pub earthquake: Option<Earthquake>,

    /// Observed points (stations for DetailScale, regions for ScalePrompt)
    #[serde(default)]
    pub points: Option<Vec<ObservationPoint>>,

    /// Forecast areas (EEW only)
    #[serde(default)]
    pub areas: Vec<ForecastArea>,

    #[serde(default)]
    pub comments: Option<Comments>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type", default)]
    pub issue_type: Option<String>,

    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Earthquake {
    /// Occurrence time (hypocenter reports)
    #[serde(default)]
    pub time: Option<String>,

    /// Origin time (EEW)
    #[serde(default)]
    pub origin_time: Option<String>,

    #[serde(default)]
    pub max_scale: Option<i64>,

    #[serde(default)]
    pub hypocenter: Option<Hypocenter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypocenter {
    #[serde(default)]
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default = "unknown")]
    pub depth: f64,
    #[serde(default = "unknown")]
    pub magnitude: f64,
}

fn unknown() -> f64 {
    UNKNOWN_VALUE
}

impl Hypocenter {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    /// The feed reports -200 when the position is not yet determined.
    pub fn has_position(&self) -> bool {
        self.position().in_range()
    }
}

/// An observed intensity at a station or region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationPoint {
    pub addr: String,
    pub scale: i64,
    #[serde(default)]
    pub pref: String,
    #[serde(default)]
    pub is_area: bool,
}

/// A forecast area of an early warning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastArea {
    pub name: String,
    #[serde(default)]
    pub pref: String,
    #[serde(default)]
    pub scale_from: Option<i64>,
    #[serde(default = "unknown_scale")]
    pub scale_to: i64,
}

fn unknown_scale() -> i64 {
    -1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Comments {
    #[serde(default)]
    pub free_form_comment: String,
}

impl ReportEnvelope {
    /// Decode one feed item, mapping shape errors to `MalformedPayload`.
    pub fn decode(item: &Value) -> Result<Self> {
        Self::deserialize(item).map_err(|e| AppError::malformed(format!("report item: {e}")))
    }

    pub fn issue_type(&self) -> Option<&str> {
        self.issue.as_ref()?.issue_type.as_deref()
    }

    /// The hypocenter object, whether or not its position is known yet.
    pub fn hypocenter(&self) -> Result<&Hypocenter> {
        self.earthquake
            .as_ref()
            .and_then(|eq| eq.hypocenter.as_ref())
            .ok_or_else(|| AppError::malformed(format!("code {} without hypocenter", self.code)))
    }

    /// The hypocenter, required for every kind that places an epicenter.
    pub fn require_hypocenter(&self) -> Result<&Hypocenter> {
        let hypocenter = self.hypocenter()?;
        if !hypocenter.has_position() {
            return Err(AppError::malformed(format!(
                "hypocenter '{}' has no position ({}, {})",
                hypocenter.name, hypocenter.latitude, hypocenter.longitude
            )));
        }
        Ok(hypocenter)
    }

    pub fn require_points(&self) -> Result<&[ObservationPoint]> {
        self.points
            .as_deref()
            .ok_or_else(|| AppError::malformed(format!("code {} without points", self.code)))
    }

    /// Event time: occurrence time for reports, origin time for EEW.
    pub fn time(&self) -> &str {
        self.earthquake
            .as_ref()
            .and_then(|eq| eq.time.as_deref().or(eq.origin_time.as_deref()))
            .unwrap_or("")
    }

    pub fn max_scale(&self) -> Option<i64> {
        self.earthquake.as_ref()?.max_scale
    }

    pub fn free_form_comment(&self) -> &str {
        self.comments
            .as_ref()
            .map(|c| c.free_form_comment.as_str())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decode_detail_scale() {
        let item = json!({
            "code": 551,
            "issue": {"type": "DetailScale", "time": "2024/01/01 16:12:00"},
            "earthquake": {
                "time": "2024/01/01 16:10:00",
                "maxScale": 70,
                "hypocenter": {"name": "石川県能登地方", "latitude": 37.5, "longitude": 137.3, "depth": 10, "magnitude": 7.6}
            },
            "points": [{"pref": "石川県", "addr": "志賀町香能", "isArea": false, "scale": 70}],
            "comments": {"freeFormComment": ""}
        });

        let report = ReportEnvelope::decode(&item).unwrap();
        assert_eq!(report.issue_type(), Some("DetailScale"));
        assert_eq!(report.max_scale(), Some(70));
        assert_eq!(report.time(), "2024/01/01 16:10:00");
        assert_eq!(report.require_points().unwrap().len(), 1);
        assert_eq!(report.require_hypocenter().unwrap().magnitude, 7.6);
    }

    #[test]
    fn test_decode_eew_uses_origin_time() {
        let item = json!({
            "code": 556,
            "earthquake": {
                "originTime": "2024/01/01 16:10:09",
                "hypocenter": {"name": "能登半島沖", "latitude": 37.6, "longitude": 137.2, "depth": 10, "magnitude": 7.4}
            },
            "areas": [{"pref": "石川", "name": "石川県能登", "scaleFrom": 60, "scaleTo": 70}]
        });

        let report = ReportEnvelope::decode(&item).unwrap();
        assert_eq!(report.issue_type(), None);
        assert_eq!(report.time(), "2024/01/01 16:10:09");
        assert_eq!(report.areas[0].scale_to, 70);
    }

    #[test]
    fn test_missing_code_is_malformed() {
        let err = ReportEnvelope::decode(&json!({"issue": {"type": "Foreign"}})).unwrap_err();
        assert!(matches!(err, AppError::MalformedPayload(_)));
    }

    #[test]
    fn test_unknown_hypocenter_position_is_malformed() {
        let item = json!({
            "code": 551,
            "issue": {"type": "ScalePrompt"},
            "earthquake": {"hypocenter": {"name": "", "latitude": -200, "longitude": -200, "depth": -1, "magnitude": -1}}
        });
        let report = ReportEnvelope::decode(&item).unwrap();
        assert!(report.require_hypocenter().is_err());
        assert!(report.require_points().is_err());
    }
}
