// src/services/reference.rs

//! Reference data provider.
//!
//! Station and prefecture tables, tsunami area geometry and epicenter name
//! translations are fetched at most once per process. Concurrent first calls wait on the same
//! in-flight load; a failed load is not cached, so the next render
//! retries it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::error::{AppError, Result};
use crate::models::{
    AssetConfig, EpicenterNames, PrefectureMap, ReferenceTable, StationMap, TsunamiAreaMap,
};
use crate::utils::http::fetch_text;

/// The static assets backing the lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceAsset {
    Stations,
    Prefectures,
    TsunamiAreas,
    Epicenters,
}

impl ReferenceAsset {
    pub fn resource_name(&self) -> &'static str {
        match self {
            Self::Stations => "stationRef.csv",
            Self::Prefectures => "prefectureRef.csv",
            Self::TsunamiAreas => "tsunami_areas.geojson",
            Self::Epicenters => "epicenterRef.json",
        }
    }
}

impl fmt::Display for ReferenceAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_name())
    }
}

/// Raw access to the reference assets.
#[async_trait]
pub trait AssetSource: Send + Sync {
    async fn fetch_text(&self, asset: ReferenceAsset) -> Result<String>;
}

/// Lookup tables used by the render routines.
#[async_trait]
pub trait ReferenceDataProvider: Send + Sync {
    async fn station_map(&self) -> Result<Arc<StationMap>>;
    async fn prefecture_map(&self) -> Result<Arc<PrefectureMap>>;
    async fn tsunami_area_geometry(&self) -> Result<Arc<TsunamiAreaMap>>;
    async fn epicenter_names(&self) -> Result<Arc<EpicenterNames>>;
}

/// Assets served over HTTP from the configured URLs.
pub struct HttpAssetSource {
    client: reqwest::Client,
    config: AssetConfig,
}

impl HttpAssetSource {
    pub fn new(client: reqwest::Client, config: AssetConfig) -> Self {
        Self { client, config }
    }

    fn url(&self, asset: ReferenceAsset) -> &str {
        match asset {
            ReferenceAsset::Stations => &self.config.station_ref_url,
            ReferenceAsset::Prefectures => &self.config.prefecture_ref_url,
            ReferenceAsset::TsunamiAreas => &self.config.tsunami_areas_url,
            ReferenceAsset::Epicenters => &self.config.epicenter_ref_url,
        }
    }
}

#[async_trait]
impl AssetSource for HttpAssetSource {
    async fn fetch_text(&self, asset: ReferenceAsset) -> Result<String> {
        let url = self.url(asset);
        log::debug!("Fetching {asset} from {url}");
        fetch_text(&self.client, url).await
    }
}

/// Assets held in memory. Counts fetches and can simulate latency or
/// missing resources.
#[derive(Default)]
pub struct StaticAssetSource {
    texts: HashMap<ReferenceAsset, String>,
    delay: Option<Duration>,
    fetches: AtomicUsize,
}

impl StaticAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, asset: ReferenceAsset, text: impl Into<String>) -> Self {
        self.texts.insert(asset, text.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of fetches served so far, including failed ones.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetSource for StaticAssetSource {
    async fn fetch_text(&self, asset: ReferenceAsset) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.texts
            .get(&asset)
            .cloned()
            .ok_or_else(|| AppError::reference(asset.resource_name(), "404 Not Found"))
    }
}

/// Memoizing provider over any [`AssetSource`].
pub struct CachedReferenceData<S> {
    source: S,
    stations: OnceCell<Arc<StationMap>>,
    prefectures: OnceCell<Arc<PrefectureMap>>,
    tsunami_areas: OnceCell<Arc<TsunamiAreaMap>>,
    epicenters: OnceCell<Arc<EpicenterNames>>,
}

impl<S: AssetSource> CachedReferenceData<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            stations: OnceCell::new(),
            prefectures: OnceCell::new(),
            tsunami_areas: OnceCell::new(),
            epicenters: OnceCell::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Warm the required caches concurrently. Epicenter names are optional
    /// and only logged when they fail.
    pub async fn preload(&self) -> Result<()> {
        let (required, epicenters) = futures::join!(
            async {
                futures::try_join!(
                    self.station_map(),
                    self.prefecture_map(),
                    self.tsunami_area_geometry()
                )
            },
            self.epicenter_names()
        );
        if let Err(e) = epicenters {
            log::warn!("Epicenter names unavailable, showing feed names: {e}");
        }
        required?;
        Ok(())
    }

    async fn load<T: Send + Sync>(
        &self,
        cell: &OnceCell<Arc<T>>,
        asset: ReferenceAsset,
        parse: fn(&str) -> Result<T>,
    ) -> Result<Arc<T>> {
        cell.get_or_try_init(|| async move {
            let text = self
                .source
                .fetch_text(asset)
                .await
                .map_err(|e| as_unavailable(asset, e))?;
            let parsed = parse(&text).map_err(|e| as_unavailable(asset, e))?;
            log::info!("Loaded reference data {asset}");
            Ok(Arc::new(parsed))
        })
        .await
        .cloned()
    }
}

fn as_unavailable(asset: ReferenceAsset, error: AppError) -> AppError {
    match error {
        AppError::ReferenceDataUnavailable { .. } => error,
        other => AppError::reference(asset.resource_name(), other),
    }
}

#[async_trait]
impl<S: AssetSource> ReferenceDataProvider for CachedReferenceData<S> {
    async fn station_map(&self) -> Result<Arc<StationMap>> {
        self.load(&self.stations, ReferenceAsset::Stations, ReferenceTable::parse_stations)
            .await
    }

    async fn prefecture_map(&self) -> Result<Arc<PrefectureMap>> {
        self.load(
            &self.prefectures,
            ReferenceAsset::Prefectures,
            ReferenceTable::parse_prefectures,
        )
        .await
    }

    async fn tsunami_area_geometry(&self) -> Result<Arc<TsunamiAreaMap>> {
        self.load(
            &self.tsunami_areas,
            ReferenceAsset::TsunamiAreas,
            TsunamiAreaMap::parse_geojson,
        )
        .await
    }

    async fn epicenter_names(&self) -> Result<Arc<EpicenterNames>> {
        self.load(
            &self.epicenters,
            ReferenceAsset::Epicenters,
            EpicenterNames::parse_json,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LatLng, Locate};

    const STATIONS: &str = "東京千代田区大手町,x,y,35.69,139.76\n";
    const PREFECTURES: &str = "code,name,fullname,code2,lat,long\n13,東京都,Tokyo,13,35.68,139.69\n";

    #[tokio::test]
    async fn test_station_map_is_memoized() {
        let data = CachedReferenceData::new(
            StaticAssetSource::new().with(ReferenceAsset::Stations, STATIONS),
        );

        let first = data.station_map().await.unwrap();
        let second = data.station_map().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(data.source().fetch_count(), 1);
        assert_eq!(first.locate("東京千代田区大手町"), Some(LatLng::new(35.69, 139.76)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_first_calls_share_one_fetch() {
        let data = CachedReferenceData::new(
            StaticAssetSource::new()
                .with(ReferenceAsset::Stations, STATIONS)
                .with_delay(Duration::from_millis(200)),
        );

        let (a, b, c) = tokio::join!(data.station_map(), data.station_map(), data.station_map());
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(data.source().fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_asset_is_unavailable_and_not_cached() {
        let data = CachedReferenceData::new(StaticAssetSource::new());

        let err = data.prefecture_map().await.unwrap_err();
        assert!(matches!(err, AppError::ReferenceDataUnavailable { .. }));
        assert!(data.prefecture_map().await.is_err());
        assert_eq!(data.source().fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_unparseable_asset_is_unavailable() {
        let data = CachedReferenceData::new(
            StaticAssetSource::new().with(ReferenceAsset::TsunamiAreas, "not json"),
        );
        let err = data.tsunami_area_geometry().await.unwrap_err();
        assert!(err.to_string().contains("tsunami_areas.geojson"));
    }

    #[tokio::test]
    async fn test_preload_fails_when_any_asset_missing() {
        let data = CachedReferenceData::new(
            StaticAssetSource::new().with(ReferenceAsset::Stations, STATIONS),
        );
        assert!(data.preload().await.is_err());
    }

    #[tokio::test]
    async fn test_preload_tolerates_missing_epicenter_names() {
        let data = CachedReferenceData::new(
            StaticAssetSource::new()
                .with(ReferenceAsset::Stations, STATIONS)
                .with(ReferenceAsset::Prefectures, PREFECTURES)
                .with(ReferenceAsset::TsunamiAreas, r#"{"features": []}"#),
        );
        assert!(data.preload().await.is_ok());
        assert!(data.epicenter_names().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_epicenter_names_share_one_fetch() {
        let data = CachedReferenceData::new(
            StaticAssetSource::new()
                .with(ReferenceAsset::Epicenters, r#"[{"jp": "東京湾", "en": "Tokyo Bay"}]"#)
                .with_delay(Duration::from_millis(50)),
        );

        let (a, b) = tokio::join!(data.epicenter_names(), data.epicenter_names());
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(data.source().fetch_count(), 1);
        assert_eq!(data.epicenter_names().await.unwrap().translate("東京湾"), "Tokyo Bay");
    }
}
