//! Static reference tables: station / prefecture positions and tsunami
//! forecast area geometry.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::geo::{Bounds, LatLng};

/// Resolves a feed place name to a coordinate.
pub trait Locate {
    fn locate(&self, key: &str) -> Option<LatLng>;
}

impl<F> Locate for F
where
    F: Fn(&str) -> Option<LatLng>,
{
    fn locate(&self, key: &str) -> Option<LatLng> {
        self(key)
    }
}

/// A station or prefecture record, keyed by the exact feed name.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceEntry {
    pub key: String,
    pub position: LatLng,
    pub display_name: String,
}

/// Name → position lookup table loaded from a reference CSV.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    entries: HashMap<String, ReferenceEntry>,
}

pub type StationMap = ReferenceTable;
pub type PrefectureMap = ReferenceTable;

/// Prefecture CSV row, matched by header name.
#[derive(Deserialize)]
struct PrefectureRow {
    name: String,
    fullname: String,
    lat: f64,
    long: f64,
}

impl ReferenceTable {
    /// Parse the station CSV (`name,_,_,lat,long`, no header).
    pub fn parse_stations(text: &str) -> Result<Self> {
        const RESOURCE: &str = "stationRef.csv";
        let mut reader = csv_reader(text, false);
        let rows = reader.records().map(|record| {
            let record = record.ok()?;
            let name = record.get(0)?;
            let lat = record.get(3)?.parse().ok()?;
            let lng = record.get(4)?.parse().ok()?;
            Some(ReferenceEntry {
                key: name.to_string(),
                position: LatLng::new(lat, lng),
                display_name: name.to_string(),
            })
        });
        Self::collect_rows(RESOURCE, rows)
    }

    /// Parse the prefecture CSV (`code,name,fullname,code2,lat,long`, one header line).
    pub fn parse_prefectures(text: &str) -> Result<Self> {
        const RESOURCE: &str = "prefectureRef.csv";
        let mut reader = csv_reader(text, true);
        let rows = reader.deserialize::<PrefectureRow>().map(|row| {
            let row = row.ok()?;
            Some(ReferenceEntry {
                key: row.name,
                position: LatLng::new(row.lat, row.long),
                display_name: row.fullname,
            })
        });
        Self::collect_rows(RESOURCE, rows)
    }

    /// Keep rows with a name and an in-range position; warn about the rest.
    fn collect_rows(
        resource: &str,
        rows: impl Iterator<Item = Option<ReferenceEntry>>,
    ) -> Result<Self> {
        let mut entries = HashMap::new();
        let mut skipped = 0usize;

        for row in rows {
            match row {
                Some(entry) if !entry.key.is_empty() && entry.position.in_range() => {
                    entries.insert(entry.key.clone(), entry);
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            log::warn!("{resource}: skipped {skipped} malformed rows");
        }
        if entries.is_empty() {
            return Err(AppError::reference(resource, "no usable rows"));
        }
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&ReferenceEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Locate for ReferenceTable {
    fn locate(&self, key: &str) -> Option<LatLng> {
        self.entries.get(key).map(|e| e.position)
    }
}

impl FromIterator<ReferenceEntry> for ReferenceTable {
    fn from_iter<I: IntoIterator<Item = ReferenceEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|e| (e.key.clone(), e)).collect(),
        }
    }
}

/// Japanese → English epicenter names, loaded from a JSON array of
/// `{"jp": .., "en": ..}` records.
#[derive(Debug, Clone, Default)]
pub struct EpicenterNames {
    names: HashMap<String, String>,
}

#[derive(Deserialize)]
struct EpicenterRow {
    jp: String,
    en: String,
}

impl EpicenterNames {
    const RESOURCE: &'static str = "epicenterRef.json";

    pub fn parse_json(text: &str) -> Result<Self> {
        let rows: Vec<EpicenterRow> =
            serde_json::from_str(text).map_err(|e| AppError::reference(Self::RESOURCE, e))?;
        Ok(rows.into_iter().map(|row| (row.jp, row.en)).collect())
    }

    /// English name for `name`, or `name` itself when there is none.
    pub fn translate<'a>(&'a self, name: &'a str) -> &'a str {
        self.names.get(name).map_or(name, String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(String, String)> for EpicenterNames {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut names = HashMap::new();
        for (jp, en) in iter {
            // First record wins, as with a linear search.
            names.entry(jp).or_insert(en);
        }
        Self { names }
    }
}

/// Coastline geometry of one tsunami forecast area.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaGeometry {
    pub name: String,
    pub name_en: Option<String>,
    pub lines: Vec<Vec<LatLng>>,
}

impl AreaGeometry {
    pub fn bounds(&self) -> Bounds {
        Bounds::from_points(self.lines.iter().flatten().copied())
    }

    pub fn display_name(&self) -> &str {
        self.name_en.as_deref().unwrap_or(&self.name)
    }
}

/// Area name → geometry lookup loaded from the tsunami GeoJSON.
#[derive(Debug, Clone, Default)]
pub struct TsunamiAreaMap {
    areas: HashMap<String, AreaGeometry>,
}

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Properties,
    #[serde(default)]
    geometry: Option<RawGeometry>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Properties {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    name_en: Option<String>,
}

#[derive(Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

impl TsunamiAreaMap {
    const RESOURCE: &'static str = "tsunami_areas.geojson";

    /// Parse a GeoJSON FeatureCollection keyed by the `name` property.
    /// Only `LineString` and `MultiLineString` geometries are kept.
    pub fn parse_geojson(text: &str) -> Result<Self> {
        let collection: FeatureCollection =
            serde_json::from_str(text).map_err(|e| AppError::reference(Self::RESOURCE, e))?;

        let mut areas = HashMap::new();
        for feature in collection.features {
            let Some(name) = feature.properties.name else {
                continue;
            };
            let lines = match feature.geometry.as_ref() {
                Some(g) if g.kind == "LineString" => vec![parse_line(&g.coordinates)],
                Some(g) if g.kind == "MultiLineString" => match &g.coordinates {
                    Value::Array(lines) => lines.iter().map(parse_line).collect(),
                    _ => Vec::new(),
                },
                Some(g) => {
                    log::debug!("{}: ignoring {} geometry for {name}", Self::RESOURCE, g.kind);
                    continue;
                }
                None => continue,
            };
            let lines: Vec<Vec<LatLng>> = lines.into_iter().filter(|l| !l.is_empty()).collect();
            if lines.is_empty() {
                continue;
            }
            areas.insert(
                name.clone(),
                AreaGeometry {
                    name,
                    name_en: feature.properties.name_en,
                    lines,
                },
            );
        }

        Ok(Self { areas })
    }

    pub fn get(&self, name: &str) -> Option<&AreaGeometry> {
        self.areas.get(name)
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

impl FromIterator<AreaGeometry> for TsunamiAreaMap {
    fn from_iter<I: IntoIterator<Item = AreaGeometry>>(iter: I) -> Self {
        Self {
            areas: iter.into_iter().map(|a| (a.name.clone(), a)).collect(),
        }
    }
}

fn csv_reader(text: &str, has_headers: bool) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes())
}

/// `[[lng, lat, ...], ...]` → coordinates; invalid positions are dropped.
fn parse_line(coords: &Value) -> Vec<LatLng> {
    let Value::Array(points) = coords else {
        return Vec::new();
    };
    points
        .iter()
        .filter_map(|p| {
            let lng = p.get(0)?.as_f64()?;
            let lat = p.get(1)?.as_f64()?;
            Some(LatLng::new(lat, lng))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stations() {
        let csv = "東京千代田区大手町,x,y,35.69,139.76\n横浜中区山手町,x,y,35.43,139.65\n";
        let table = ReferenceTable::parse_stations(csv).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.locate("東京千代田区大手町"), Some(LatLng::new(35.69, 139.76)));
        assert_eq!(table.locate("大阪"), None);
    }

    #[test]
    fn test_parse_prefectures_skips_header_and_bad_rows() {
        let csv = "code,name,fullname,code2,lat,long\r\n\
                   13,東京都,Tokyo Metropolis,130,35.68,139.69\r\n\
                   27,大阪府,Osaka Prefecture,270,oops,135.52\r\n";
        let table = ReferenceTable::parse_prefectures(csv).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("東京都").unwrap().display_name, "Tokyo Metropolis");
    }

    #[test]
    fn test_quoted_prefecture_name_keeps_columns() {
        let csv = "code,name,fullname,code2,lat,long\n\
                   13,東京都,\"Tokyo, Metropolis\",130,35.68,139.69\n";
        let table = ReferenceTable::parse_prefectures(csv).unwrap();
        let tokyo = table.get("東京都").unwrap();
        assert_eq!(tokyo.position, LatLng::new(35.68, 139.69));
        assert_eq!(tokyo.display_name, "Tokyo, Metropolis");
    }

    #[test]
    fn test_out_of_range_rows_are_skipped() {
        let csv = "東京千代田区大手町,x,y,35.69,139.76\n\
                   誤入力,x,y,139.76,35.69\n\
                   short,x\n";
        let table = ReferenceTable::parse_stations(csv).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.locate("誤入力"), None);
    }

    #[test]
    fn test_empty_csv_is_unavailable() {
        let err = ReferenceTable::parse_stations("").unwrap_err();
        assert!(matches!(err, AppError::ReferenceDataUnavailable { .. }));
    }

    #[test]
    fn test_translate_epicenter_names() {
        let names = EpicenterNames::parse_json(
            r#"[{"jp": "石川県能登地方", "en": "Noto, Ishikawa Prefecture"},
                {"jp": "石川県能登地方", "en": "duplicate"},
                {"jp": "東京湾", "en": "Tokyo Bay"}]"#,
        )
        .unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names.translate("石川県能登地方"), "Noto, Ishikawa Prefecture");
        assert_eq!(names.translate("未知の震源"), "未知の震源");
    }

    #[test]
    fn test_invalid_epicenter_json_is_unavailable() {
        let err = EpicenterNames::parse_json(r#"{"jp": "x"}"#).unwrap_err();
        assert!(matches!(err, AppError::ReferenceDataUnavailable { .. }));
    }

    #[test]
    fn test_parse_geojson() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "石川県能登", "nameEn": "Noto, Ishikawa"},
                 "geometry": {"type": "LineString", "coordinates": [[136.7, 37.0], [137.3, 37.5]]}},
                {"type": "Feature", "properties": {"name": "佐渡"},
                 "geometry": {"type": "MultiLineString", "coordinates": [[[138.2, 37.8], [138.5, 38.3]], [[138.3, 38.0, 0.0]]]}},
                {"type": "Feature", "properties": {"name": "陸地"},
                 "geometry": {"type": "Polygon", "coordinates": []}}
            ]
        }"#;

        let map = TsunamiAreaMap::parse_geojson(text).unwrap();
        assert_eq!(map.len(), 2);

        let noto = map.get("石川県能登").unwrap();
        assert_eq!(noto.display_name(), "Noto, Ishikawa");
        let bounds = noto.bounds();
        assert_eq!(bounds.south_west(), Some(LatLng::new(37.0, 136.7)));
        assert_eq!(bounds.north_east(), Some(LatLng::new(37.5, 137.3)));

        let sado = map.get("佐渡").unwrap();
        assert_eq!(sado.lines.len(), 2);
        assert_eq!(sado.display_name(), "佐渡");
    }

    #[test]
    fn test_invalid_geojson_is_unavailable() {
        let err = TsunamiAreaMap::parse_geojson("<html>").unwrap_err();
        assert!(matches!(err, AppError::ReferenceDataUnavailable { .. }));
    }
}
