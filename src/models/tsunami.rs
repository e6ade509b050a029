//! Decoded payloads from the tsunami feed.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};

/// Severity tier of a tsunami advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Grade {
    Unknown,
    Watch,
    Warning,
    MajorWarning,
}

impl Grade {
    /// Grades that get a sidebar list, most severe first.
    pub const LISTED: [Grade; 3] = [Grade::MajorWarning, Grade::Warning, Grade::Watch];

    pub fn color(&self) -> &'static str {
        match self {
            Grade::MajorWarning => "#ff00ff",
            Grade::Warning => "#ff0000",
            Grade::Watch => "#ffff00",
            Grade::Unknown => "#707070",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Grade::MajorWarning => "Major Warning",
            Grade::Warning => "Warning",
            Grade::Watch => "Watch",
            Grade::Unknown => "Unknown",
        }
    }
}

impl From<String> for Grade {
    fn from(value: String) -> Self {
        match value.as_str() {
            "MajorWarning" => Grade::MajorWarning,
            "Warning" => Grade::Warning,
            "Watch" => Grade::Watch,
            _ => Grade::Unknown,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// One tsunami forecast bulletin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TsunamiEnvelope {
    #[serde(default)]
    pub cancelled: bool,

    #[serde(default)]
    pub areas: Vec<TsunamiArea>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TsunamiArea {
    pub name: String,
    #[serde(default = "unknown_grade")]
    pub grade: Grade,
    #[serde(default)]
    pub immediate: bool,
    #[serde(default)]
    pub first_height: Option<FirstHeight>,
    #[serde(default)]
    pub max_height: Option<MaxHeight>,
}

fn unknown_grade() -> Grade {
    Grade::Unknown
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FirstHeight {
    #[serde(default)]
    pub arrival_time: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MaxHeight {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
}

impl TsunamiEnvelope {
    /// Decode a tsunami feed payload.
    ///
    /// The feed normally returns an array whose first item is the latest
    /// bulletin; an empty array means nothing is issued. A bare object is
    /// accepted as the bulletin itself.
    pub fn decode(raw: &Value) -> Result<Self> {
        let item = match raw {
            Value::Array(items) => match items.first() {
                Some(first) => first,
                None => return Ok(Self::default()),
            },
            Value::Object(_) => raw,
            Value::Null => return Ok(Self::default()),
            other => {
                return Err(AppError::malformed(format!(
                    "tsunami payload is neither array nor object: {other}"
                )));
            }
        };
        Self::deserialize(item).map_err(|e| AppError::malformed(format!("tsunami item: {e}")))
    }

    /// True when no advisory is active.
    pub fn is_inactive(&self) -> bool {
        self.cancelled || self.areas.is_empty()
    }
}

impl TsunamiArea {
    /// Human readable arrival / condition line for the sidebar.
    pub fn condition_text(&self) -> String {
        let first = self.first_height.as_ref();
        if let Some(arrival) = first.and_then(|f| f.arrival_time.as_deref()) {
            return format!("First wave is expected to arrive at {arrival} JST");
        }
        match first.and_then(|f| f.condition.as_deref()) {
            Some("第１波の到達を確認") => "First wave confirmed".to_string(),
            Some("津波到達中と推測") => "Wave is expected to be reached".to_string(),
            Some("ただちに津波来襲と予測") => "Immediate tsunami expected".to_string(),
            Some(other) => other.to_string(),
            None => "Unknown".to_string(),
        }
    }

    pub fn max_height_text(&self) -> String {
        match self.max_height.as_ref().and_then(|h| h.value) {
            Some(value) => format!("{value:.1}m"),
            None => "N/A".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decode_array_takes_first() {
        let raw = json!([{
            "cancelled": false,
            "areas": [{
                "name": "石川県能登",
                "grade": "MajorWarning",
                "immediate": true,
                "firstHeight": {"condition": "ただちに津波来襲と予測"},
                "maxHeight": {"description": "５ｍ", "value": 5}
            }]
        }]);

        let env = TsunamiEnvelope::decode(&raw).unwrap();
        assert!(!env.is_inactive());
        let area = &env.areas[0];
        assert_eq!(area.grade, Grade::MajorWarning);
        assert_eq!(area.condition_text(), "Immediate tsunami expected");
        assert_eq!(area.max_height_text(), "5.0m");
    }

    #[test]
    fn test_empty_and_cancelled_are_inactive() {
        assert!(TsunamiEnvelope::decode(&json!([])).unwrap().is_inactive());
        assert!(TsunamiEnvelope::decode(&json!({"cancelled": true})).unwrap().is_inactive());
    }

    #[test]
    fn test_unknown_grade_and_arrival_time() {
        let raw = json!({"areas": [{
            "name": "北海道太平洋沿岸東部",
            "grade": "Forecast",
            "firstHeight": {"arrivalTime": "2024/01/01 16:40:00"}
        }]});
        let env = TsunamiEnvelope::decode(&raw).unwrap();
        assert_eq!(env.areas[0].grade, Grade::Unknown);
        assert_eq!(
            env.areas[0].condition_text(),
            "First wave is expected to arrive at 2024/01/01 16:40:00 JST"
        );
        assert_eq!(env.areas[0].max_height_text(), "N/A");
    }

    #[test]
    fn test_grade_ordering() {
        assert!(Grade::Watch < Grade::Warning);
        assert!(Grade::Warning < Grade::MajorWarning);
    }

    #[test]
    fn test_scalar_payload_is_malformed() {
        assert!(TsunamiEnvelope::decode(&json!("[]")).is_err());
    }
}
