//! Feed code classification.
//!
//! First level maps the numeric feed code to a report family; hypocenter
//! reports are split further on their issue type.

use std::fmt;

use serde::Serialize;

use crate::models::ReportEnvelope;

pub const CODE_HYPOCENTER_REPORT: i64 = 551;
pub const CODE_EARLY_WARNING: i64 = 556;

/// Report family derived from the feed code alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedCode {
    HypocenterReport,
    EarlyWarning,
    Unsupported,
}

/// Fully resolved report kind used to pick a render routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReportKind {
    HypocenterDetail,
    HypocenterPrompt,
    HypocenterDestination,
    HypocenterForeign,
    EarlyWarning,
    Unsupported,
}

impl ReportKind {
    /// Short tag used in log lines (DS, SP, DE, FO, EEW).
    pub fn tag(&self) -> &'static str {
        match self {
            Self::HypocenterDetail => "DS",
            Self::HypocenterPrompt => "SP",
            Self::HypocenterDestination => "DE",
            Self::HypocenterForeign => "FO",
            Self::EarlyWarning => "EEW",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

pub fn classify(code: i64) -> FeedCode {
    match code {
        CODE_HYPOCENTER_REPORT => FeedCode::HypocenterReport,
        CODE_EARLY_WARNING => FeedCode::EarlyWarning,
        _ => FeedCode::Unsupported,
    }
}

/// Classify a code plus, for hypocenter reports, its issue type.
pub fn classify_report(code: i64, issue_type: Option<&str>) -> ReportKind {
    match classify(code) {
        FeedCode::EarlyWarning => ReportKind::EarlyWarning,
        FeedCode::Unsupported => ReportKind::Unsupported,
        FeedCode::HypocenterReport => match issue_type {
            Some("DetailScale") => ReportKind::HypocenterDetail,
            Some("ScalePrompt") => ReportKind::HypocenterPrompt,
            Some("Destination") => ReportKind::HypocenterDestination,
            Some("Foreign") => ReportKind::HypocenterForeign,
            _ => ReportKind::Unsupported,
        },
    }
}

impl ReportEnvelope {
    pub fn kind(&self) -> ReportKind {
        classify_report(self.code, self.issue_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_codes() {
        assert_eq!(classify(551), FeedCode::HypocenterReport);
        assert_eq!(classify(556), FeedCode::EarlyWarning);
        assert_eq!(classify(552), FeedCode::Unsupported);
        assert_eq!(classify(999), FeedCode::Unsupported);
    }

    #[test]
    fn test_classify_issue_types() {
        assert_eq!(classify_report(551, Some("DetailScale")), ReportKind::HypocenterDetail);
        assert_eq!(classify_report(551, Some("ScalePrompt")), ReportKind::HypocenterPrompt);
        assert_eq!(classify_report(551, Some("Destination")), ReportKind::HypocenterDestination);
        assert_eq!(classify_report(551, Some("Foreign")), ReportKind::HypocenterForeign);
        assert_eq!(classify_report(551, Some("Foo")), ReportKind::Unsupported);
        assert_eq!(classify_report(551, None), ReportKind::Unsupported);
    }

    #[test]
    fn test_issue_type_ignored_outside_551() {
        assert_eq!(classify_report(556, None), ReportKind::EarlyWarning);
        assert_eq!(classify_report(556, Some("DetailScale")), ReportKind::EarlyWarning);
        assert_eq!(classify_report(999, Some("DetailScale")), ReportKind::Unsupported);
    }

    #[test]
    fn test_classification_is_repeatable() {
        for _ in 0..3 {
            assert_eq!(classify_report(551, Some("Foreign")), ReportKind::HypocenterForeign);
        }
    }
}
