//! Change detection between consecutive feed payloads.
//!
//! A poll tick only dispatches when the new payload differs structurally
//! from the previous one. The baseline is an owned deep copy, so later
//! mutation of a live payload cannot disturb the comparison.

use serde_json::Value;

use crate::models::FeedSnapshot;

/// Outcome of comparing a fresh payload with the stored baseline.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotChange {
    /// First payload ever seen on this feed
    Initial,
    /// Payload differs from the previous one
    Changed,
    /// Payload is structurally equal to the previous one
    Unchanged,
}

impl SnapshotChange {
    pub fn has_changes(&self) -> bool {
        !matches!(self, SnapshotChange::Unchanged)
    }
}

/// Tracks the last payload seen on a feed.
#[derive(Debug, Clone, Default)]
pub struct SnapshotTracker {
    previous: Option<FeedSnapshot>,
}

impl SnapshotTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `current` with the baseline and adopt it when it differs.
    pub fn observe(&mut self, current: &Value) -> SnapshotChange {
        match &self.previous {
            Some(prev) if prev.raw == *current => SnapshotChange::Unchanged,
            Some(_) => {
                self.previous = Some(FeedSnapshot::new(current.clone()));
                SnapshotChange::Changed
            }
            None => {
                self.previous = Some(FeedSnapshot::new(current.clone()));
                SnapshotChange::Initial
            }
        }
    }

    pub fn previous(&self) -> Option<&FeedSnapshot> {
        self.previous.as_ref()
    }
}
