//! Grouped, distance-ranked listing of observed intensities.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{IntensityClass, LatLng, Locate, haversine_km};

/// A place in the list, resolved against reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityEntry {
    pub name: String,
    pub position: LatLng,
    /// Great-circle distance to the epicenter, if one is known.
    pub distance_km: Option<f64>,
}

impl IntensityEntry {
    pub fn distance_label(&self) -> Option<String> {
        self.distance_km.map(|d| format!("{d:.0} km"))
    }
}

/// All places sharing one intensity class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityBucket {
    pub class: IntensityClass,
    pub entries: Vec<IntensityEntry>,
}

impl IntensityBucket {
    /// Entries shown before the "show more" toggle.
    pub const VISIBLE: usize = 4;

    pub fn heading(&self) -> &'static str {
        self.class.heading()
    }

    pub fn visible(&self) -> &[IntensityEntry] {
        &self.entries[..self.entries.len().min(Self::VISIBLE)]
    }

    pub fn hidden_count(&self) -> usize {
        self.entries.len().saturating_sub(Self::VISIBLE)
    }
}

/// Buckets in display order, most severe first. Empty buckets are omitted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IntensityList {
    pub buckets: Vec<IntensityBucket>,
}

impl IntensityList {
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.entries.len()).sum()
    }

    pub fn bucket(&self, class: IntensityClass) -> Option<&IntensityBucket> {
        self.buckets.iter().find(|b| b.class == class)
    }
}

/// Group `(name, scale)` points by intensity class.
///
/// Places `reference` cannot resolve are left out. With an epicenter each
/// bucket is ordered nearest first; ties and the no-epicenter case keep
/// feed order.
pub fn build_intensity_list<'a, L>(
    points: impl IntoIterator<Item = (&'a str, i64)>,
    reference: &L,
    epicenter: Option<LatLng>,
) -> IntensityList
where
    L: Locate + ?Sized,
{
    let mut grouped: BTreeMap<IntensityClass, Vec<IntensityEntry>> = BTreeMap::new();
    let mut missing = 0usize;

    for (name, scale) in points {
        let Some(position) = reference.locate(name) else {
            missing += 1;
            continue;
        };
        grouped
            .entry(IntensityClass::from_scale(scale))
            .or_default()
            .push(IntensityEntry {
                name: name.to_string(),
                position,
                distance_km: epicenter.map(|e| haversine_km(e, position)),
            });
    }

    if missing > 0 {
        log::debug!("{missing} places left out of the intensity list");
    }

    let buckets = grouped
        .into_iter()
        .map(|(class, mut entries)| {
            if epicenter.is_some() {
                entries.sort_by(|a, b| {
                    let a = a.distance_km.unwrap_or(f64::INFINITY);
                    let b = b.distance_km.unwrap_or(f64::INFINITY);
                    a.total_cmp(&b)
                });
            }
            IntensityBucket { class, entries }
        })
        .collect();

    IntensityList { buckets }
}
