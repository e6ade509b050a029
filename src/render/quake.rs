//! Rendering of hypocenter reports (551) and early warnings (556).
//!
//! A pass is split in two. [`QuakeRouter::prepare`] validates the payload
//! and resolves every coordinate against reference data without touching
//! the map; only when that succeeds does [`QuakeRouter::apply`] clear the
//! 551 layers and draw. A failure while drawing clears again, so the map
//! never keeps a half-drawn report.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tokio::sync::watch;

use crate::error::{AppError, Result};
use crate::models::{
    Bounds, Hypocenter, IntensityClass, LatLng, Locate, ReportEnvelope, UNKNOWN_VALUE,
};
use crate::pipeline::ReportKind;
use crate::render::intensity_list::{IntensityList, build_intensity_list};
use crate::render::{Icon, InfoPanel, Marker, RenderContext, SoundCue, layers};

/// Shown in place of the epicenter name while it is not yet determined.
const EVALUATING_EPICENTER: &str = "Evaluating Epicenter";

/// What the 551 layers currently show.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MapRenderState {
    pub kind: Option<ReportKind>,
    pub epicenter: Option<LatLng>,
    /// Markers placed per layer
    pub markers: BTreeMap<&'static str, usize>,
    /// Bounds the camera was last fitted to
    pub camera: Option<Bounds>,
}

impl MapRenderState {
    pub fn marker_count(&self, layer: &str) -> usize {
        self.markers.get(layer).copied().unwrap_or(0)
    }

    pub fn is_clear(&self) -> bool {
        self.kind.is_none() && self.epicenter.is_none() && self.markers.is_empty()
    }
}

/// Everything one pass will draw, computed up front.
#[derive(Debug, Clone)]
pub struct RenderPlan {
    pub kind: ReportKind,
    pub cue: SoundCue,
    pub info: InfoPanel,
    pub epicenter: Option<(LatLng, Icon)>,
    pub markers: Vec<(&'static str, Marker)>,
    pub bounds: Bounds,
    /// `Some` arms and fills the list, `None` disarms it
    pub intensity_list: Option<IntensityList>,
    /// Places without a reference coordinate
    pub skipped: usize,
}

pub struct QuakeRouter {
    ctx: RenderContext,
    state: MapRenderState,
    tsunami_bounds: watch::Receiver<Option<Bounds>>,
}

impl QuakeRouter {
    pub fn new(ctx: RenderContext, tsunami_bounds: watch::Receiver<Option<Bounds>>) -> Self {
        Self {
            ctx,
            state: MapRenderState::default(),
            tsunami_bounds,
        }
    }

    pub fn state(&self) -> &MapRenderState {
        &self.state
    }

    /// Render one decoded report item.
    ///
    /// Unsupported kinds are logged and ignored. Returns the kind that was
    /// handled.
    pub async fn dispatch(&mut self, report: &ReportEnvelope) -> Result<ReportKind> {
        let kind = report.kind();
        if kind == ReportKind::Unsupported {
            log::warn!(
                "Unsupported report code {} (issue type {:?}), skipping",
                report.code,
                report.issue_type()
            );
            return Ok(kind);
        }

        let plan = self.prepare(kind, report).await?;
        self.apply(plan).await?;
        Ok(kind)
    }

    /// Remove every 551 layer and reset the tracked state.
    pub async fn clear_551(&mut self) -> Result<()> {
        for layer in layers::QUAKE_LAYERS {
            self.ctx.surface.remove_named_layer(layer).await?;
        }
        self.state = MapRenderState::default();
        Ok(())
    }

    /// Validate `report` and resolve its coordinates. Does not touch the map.
    pub async fn prepare(&self, kind: ReportKind, report: &ReportEnvelope) -> Result<RenderPlan> {
        match kind {
            ReportKind::HypocenterDetail => self.prepare_detail(report).await,
            ReportKind::HypocenterPrompt => self.prepare_prompt(report).await,
            ReportKind::HypocenterDestination => {
                self.prepare_epicenter_only(
                    kind,
                    report,
                    SoundCue::Destination,
                    "Epicenter Confirmation",
                )
                .await
            }
            ReportKind::HypocenterForeign => {
                self.prepare_epicenter_only(
                    kind,
                    report,
                    SoundCue::Foreign,
                    "Foreign Earthquake Report",
                )
                .await
            }
            ReportKind::EarlyWarning => self.prepare_early_warning(report).await,
            ReportKind::Unsupported => Err(AppError::malformed(format!(
                "no renderer for code {}",
                report.code
            ))),
        }
    }

    /// Draw a prepared plan. On failure the 551 layers are cleared again.
    pub async fn apply(&mut self, plan: RenderPlan) -> Result<()> {
        let kind = plan.kind;
        match self.draw(plan).await {
            Ok(()) => Ok(()),
            Err(e) => {
                log::error!("{kind} render failed, clearing map: {e}");
                if let Err(clear) = self.clear_551().await {
                    log::error!("Clearing after failed {kind} render also failed: {clear}");
                }
                Err(e)
            }
        }
    }

    async fn draw(&mut self, plan: RenderPlan) -> Result<()> {
        let surface = self.ctx.surface.clone();

        self.ctx.notifier.stop();
        self.clear_551().await?;
        self.ctx.play(plan.cue);
        self.ctx.presenter.update_info(plan.info);
        self.ctx
            .presenter
            .set_intensity_list_armed(plan.intensity_list.is_some());
        self.state.kind = Some(plan.kind);

        if let Some((position, icon)) = plan.epicenter {
            surface
                .place_icon_marker(layers::EPICENTER, position, icon)
                .await?;
            self.state.epicenter = Some(position);
        }

        let placed = plan.markers.len();
        for (layer, marker) in plan.markers {
            surface.place_marker(layer, marker).await?;
            *self.state.markers.entry(layer).or_default() += 1;
        }

        let mut bounds = plan.bounds;
        let tsunami_bounds = *self.tsunami_bounds.borrow();
        if let Some(tsunami) = tsunami_bounds {
            bounds.merge(&tsunami);
        }
        if self.ctx.fit_camera(&bounds).await? {
            self.state.camera = Some(bounds);
        }

        if let Some(list) = plan.intensity_list {
            self.ctx.presenter.show_intensity_list(list);
        }

        log::info!(
            "Rendered {}: {placed} markers placed, {} without reference position",
            plan.kind,
            plan.skipped
        );
        Ok(())
    }

    /// English epicenter name, or the feed name when there is no
    /// translation or the table cannot be loaded.
    async fn epicenter_name(&self, name: &str) -> String {
        match self.ctx.reference.epicenter_names().await {
            Ok(names) => names.translate(name).to_string(),
            Err(e) => {
                log::warn!("Epicenter names unavailable, showing '{name}' untranslated: {e}");
                name.to_string()
            }
        }
    }

    async fn prepare_detail(&self, report: &ReportEnvelope) -> Result<RenderPlan> {
        let hypocenter = report.require_hypocenter()?;
        let points = report.require_points()?;
        let stations = self.ctx.reference.station_map().await?;
        let icons = self.ctx.icons();
        let epicenter = hypocenter.position();

        let mut markers = Vec::with_capacity(points.len());
        let mut skipped = 0;
        for point in points {
            match stations.locate(&point.addr) {
                Some(position) => markers.push((
                    layers::STATIONS,
                    Marker {
                        position,
                        icon: icons.intensity(point.scale),
                        label: point.addr.clone(),
                        intensity: IntensityClass::from_scale(point.scale),
                    },
                )),
                None => {
                    log::warn!("Station not found in reference data: {}", point.addr);
                    skipped += 1;
                }
            }
        }

        let mut bounds = Bounds::from_points(markers.iter().map(|(_, m)| m.position));
        bounds.extend(epicenter);

        let list = build_intensity_list(
            points.iter().map(|p| (p.addr.as_str(), p.scale)),
            &*stations,
            Some(epicenter),
        );

        Ok(RenderPlan {
            kind: ReportKind::HypocenterDetail,
            cue: SoundCue::DetailScale,
            info: hypocenter_panel(
                "Detailed Epicenter Information",
                report,
                hypocenter,
                self.epicenter_name(&hypocenter.name).await,
            ),
            epicenter: Some((epicenter, icons.epicenter())),
            markers,
            bounds,
            intensity_list: Some(list),
            skipped,
        })
    }

    async fn prepare_prompt(&self, report: &ReportEnvelope) -> Result<RenderPlan> {
        let points = report.require_points()?;
        let prefectures = self.ctx.reference.prefecture_map().await?;
        let icons = self.ctx.icons();

        let mut markers = Vec::with_capacity(points.len());
        let mut skipped = 0;
        for point in points {
            match prefectures.locate(&point.addr) {
                Some(position) => markers.push((
                    layers::PREFECTURES,
                    Marker {
                        position,
                        icon: icons.scale(point.scale),
                        label: point.addr.clone(),
                        intensity: IntensityClass::from_scale(point.scale),
                    },
                )),
                None => {
                    log::warn!("Region not found in reference data: {}", point.addr);
                    skipped += 1;
                }
            }
        }

        let bounds = Bounds::from_points(markers.iter().map(|(_, m)| m.position));
        let list = build_intensity_list(
            points.iter().map(|p| (p.addr.as_str(), p.scale)),
            &*prefectures,
            None,
        );

        Ok(RenderPlan {
            kind: ReportKind::HypocenterPrompt,
            cue: SoundCue::ScalePrompt,
            info: InfoPanel {
                title: "Flash Report".to_string(),
                location: EVALUATING_EPICENTER.to_string(),
                magnitude: format_magnitude(UNKNOWN_VALUE),
                depth: format_depth(UNKNOWN_VALUE),
                time: report.time().to_string(),
                comment: report.free_form_comment().to_string(),
                max_intensity: max_intensity(report),
            },
            epicenter: None,
            markers,
            bounds,
            intensity_list: Some(list),
            skipped,
        })
    }

    async fn prepare_epicenter_only(
        &self,
        kind: ReportKind,
        report: &ReportEnvelope,
        cue: SoundCue,
        title: &str,
    ) -> Result<RenderPlan> {
        let hypocenter = report.require_hypocenter()?;
        let epicenter = hypocenter.position();

        let mut bounds = Bounds::from_points(
            self.ctx
                .config
                .map
                .default_bounds
                .iter()
                .map(|pair| LatLng::from_lng_lat(*pair)),
        );
        bounds.extend(epicenter);

        Ok(RenderPlan {
            kind,
            cue,
            info: hypocenter_panel(
                title,
                report,
                hypocenter,
                self.epicenter_name(&hypocenter.name).await,
            ),
            epicenter: Some((epicenter, self.ctx.icons().epicenter())),
            markers: Vec::new(),
            bounds,
            intensity_list: None,
            skipped: 0,
        })
    }

    /// Early warnings may arrive before the epicenter is determined
    /// (position -200, -200). The forecast areas are still drawn.
    async fn prepare_early_warning(&self, report: &ReportEnvelope) -> Result<RenderPlan> {
        let hypocenter = report.hypocenter()?;
        let prefectures = self.ctx.reference.prefecture_map().await?;
        let icons = self.ctx.icons();
        let epicenter = hypocenter.has_position().then(|| hypocenter.position());

        let fallback: HashMap<&str, &str> = report
            .areas
            .iter()
            .map(|a| (a.name.as_str(), a.pref.as_str()))
            .collect();
        let locate = |name: &str| {
            prefectures.locate(name).or_else(|| {
                fallback
                    .get(name)
                    .and_then(|pref| prefectures.locate(pref))
            })
        };

        let mut markers = Vec::with_capacity(report.areas.len());
        let mut skipped = 0;
        for area in &report.areas {
            match locate(area.name.as_str()) {
                Some(position) => markers.push((
                    layers::EEW_AREAS,
                    Marker {
                        position,
                        icon: icons.scale(area.scale_to),
                        label: area.name.clone(),
                        intensity: IntensityClass::from_scale(area.scale_to),
                    },
                )),
                None => {
                    log::warn!("Forecast area not found in reference data: {}", area.name);
                    skipped += 1;
                }
            }
        }

        let mut bounds = Bounds::from_points(markers.iter().map(|(_, m)| m.position));
        if let Some(epicenter) = epicenter {
            bounds.extend(epicenter);
        }

        let list = build_intensity_list(
            report.areas.iter().map(|a| (a.name.as_str(), a.scale_to)),
            &locate,
            epicenter,
        );

        let location = match epicenter {
            Some(_) => self.epicenter_name(&hypocenter.name).await,
            None => EVALUATING_EPICENTER.to_string(),
        };
        let mut info = hypocenter_panel("Earthquake Early Warning", report, hypocenter, location);
        info.max_intensity = IntensityClass::Invalid.label().to_string();

        Ok(RenderPlan {
            kind: ReportKind::EarlyWarning,
            cue: SoundCue::EarlyWarning,
            info,
            epicenter: epicenter.map(|position| (position, icons.potential_epicenter())),
            markers,
            bounds,
            intensity_list: Some(list),
            skipped,
        })
    }
}

fn hypocenter_panel(
    title: &str,
    report: &ReportEnvelope,
    hypocenter: &Hypocenter,
    location: String,
) -> InfoPanel {
    InfoPanel {
        title: title.to_string(),
        location,
        magnitude: format_magnitude(hypocenter.magnitude),
        depth: format_depth(hypocenter.depth),
        time: report.time().to_string(),
        comment: report.free_form_comment().to_string(),
        max_intensity: max_intensity(report),
    }
}

fn max_intensity(report: &ReportEnvelope) -> String {
    report
        .max_scale()
        .map(IntensityClass::from_scale)
        .unwrap_or(IntensityClass::Invalid)
        .label()
        .to_string()
}

/// `-1` (unknown) renders as "--".
pub fn format_magnitude(magnitude: f64) -> String {
    if magnitude < 0.0 {
        "--".to_string()
    } else {
        format!("{magnitude}")
    }
}

pub fn format_depth(depth: f64) -> String {
    if depth < 0.0 {
        "Unknown".to_string()
    } else if depth == 0.0 {
        "Shallow".to_string()
    } else {
        format!("{depth} km")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::models::Config;
    use crate::render::memory::{MemoryNotifier, MemoryPresenter, MemorySurface};
    use crate::services::{CachedReferenceData, ReferenceAsset, StaticAssetSource};

    const STATIONS: &str = "東京都千代田区,x,x,35.0,139.0\n横浜市中区,x,x,35.4,139.6\n";
    const PREFECTURES: &str = "code,name,fullname,code2,lat,long\n\
        13,東京都,Tokyo,13,35.68,139.69\n\
        14,神奈川県,Kanagawa,14,35.44,139.64\n\
        12,千葉県,Chiba,12,35.60,140.12\n";

    struct Fixture {
        surface: Arc<MemorySurface>,
        presenter: Arc<MemoryPresenter>,
        notifier: Arc<MemoryNotifier>,
        bounds_tx: watch::Sender<Option<Bounds>>,
        router: QuakeRouter,
    }

    fn fixture(source: StaticAssetSource) -> Fixture {
        let surface = Arc::new(MemorySurface::new());
        let presenter = Arc::new(MemoryPresenter::new());
        let notifier = Arc::new(MemoryNotifier::new());
        let ctx = RenderContext {
            surface: surface.clone(),
            presenter: presenter.clone(),
            notifier: notifier.clone(),
            reference: Arc::new(CachedReferenceData::new(source)),
            config: Arc::new(Config::default()),
        };
        let (bounds_tx, bounds_rx) = watch::channel(None);
        Fixture {
            surface,
            presenter,
            notifier,
            bounds_tx,
            router: QuakeRouter::new(ctx, bounds_rx),
        }
    }

    fn full_source() -> StaticAssetSource {
        StaticAssetSource::new()
            .with(ReferenceAsset::Stations, STATIONS)
            .with(ReferenceAsset::Prefectures, PREFECTURES)
    }

    fn detail_report() -> ReportEnvelope {
        ReportEnvelope::decode(&json!({
            "code": 551,
            "issue": {"type": "DetailScale"},
            "earthquake": {
                "time": "2024/01/01 16:10:00",
                "maxScale": 50,
                "hypocenter": {"name": "東京湾", "latitude": 35.5, "longitude": 139.8, "depth": 10, "magnitude": 5.0}
            },
            "points": [
                {"addr": "東京都千代田区", "scale": 50, "pref": "東京都", "isArea": false},
                {"addr": "存在しない", "scale": 30, "pref": "東京都", "isArea": false}
            ],
            "comments": {"freeFormComment": ""}
        }))
        .unwrap()
    }

    fn early_warning_report() -> ReportEnvelope {
        ReportEnvelope::decode(&json!({
            "code": 556,
            "earthquake": {
                "originTime": "2024/01/01 16:09:50",
                "hypocenter": {"name": "千葉県北西部", "latitude": 35.7, "longitude": 140.0, "depth": 0, "magnitude": 6.1}
            },
            "areas": [
                {"name": "千葉県", "pref": "千葉県", "scaleFrom": 50, "scaleTo": 55},
                {"name": "東京都２３区", "pref": "東京都", "scaleFrom": 40, "scaleTo": 45}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_format_magnitude_and_depth() {
        assert_eq!(format_magnitude(-1.0), "--");
        assert_eq!(format_magnitude(5.0), "5");
        assert_eq!(format_magnitude(6.1), "6.1");
        assert_eq!(format_depth(-1.0), "Unknown");
        assert_eq!(format_depth(0.0), "Shallow");
        assert_eq!(format_depth(10.0), "10 km");
    }

    #[tokio::test]
    async fn test_detail_render() {
        let mut f = fixture(full_source());
        let kind = f.router.dispatch(&detail_report()).await.unwrap();

        assert_eq!(kind, ReportKind::HypocenterDetail);
        assert_eq!(f.surface.marker_count(layers::STATIONS), 1);
        assert!(f.surface.icon(layers::EPICENTER).is_some());
        assert_eq!(f.router.state().marker_count(layers::STATIONS), 1);

        let shown = f.presenter.snapshot();
        let info = shown.info.unwrap();
        assert_eq!(info.title, "Detailed Epicenter Information");
        assert_eq!(info.magnitude, "5");
        assert_eq!(info.depth, "10 km");
        assert_eq!(info.max_intensity, "5+");
        assert!(shown.list_armed);
        let list = shown.intensity_list.unwrap();
        assert_eq!(list.buckets.len(), 1);
        assert_eq!(list.buckets[0].class, IntensityClass::FiveUpper);

        assert_eq!(f.notifier.played(), vec![SoundCue::DetailScale]);
        assert_eq!(f.notifier.stop_count(), 1);
        assert!(f.surface.camera().is_some());
    }

    #[tokio::test]
    async fn test_prompt_render_disables_epicenter() {
        let mut f = fixture(full_source());
        let report = ReportEnvelope::decode(&json!({
            "code": 551,
            "issue": {"type": "ScalePrompt"},
            "earthquake": {"time": "2024/01/01 16:10:00", "maxScale": 45,
                "hypocenter": {"name": "", "latitude": -200, "longitude": -200, "depth": -1, "magnitude": -1}},
            "points": [
                {"addr": "東京都", "scale": 45, "pref": "東京都", "isArea": true},
                {"addr": "神奈川県", "scale": 30, "pref": "神奈川県", "isArea": true}
            ]
        }))
        .unwrap();

        f.router.dispatch(&report).await.unwrap();

        assert_eq!(f.surface.marker_count(layers::PREFECTURES), 2);
        assert!(f.surface.icon(layers::EPICENTER).is_none());
        let info = f.presenter.snapshot().info.unwrap();
        assert_eq!(info.location, "Evaluating Epicenter");
        assert_eq!(info.magnitude, "--");
        assert_eq!(info.depth, "Unknown");
    }

    #[tokio::test]
    async fn test_destination_uses_default_bounds() {
        let mut f = fixture(StaticAssetSource::new());
        let report = ReportEnvelope::decode(&json!({
            "code": 551,
            "issue": {"type": "Destination"},
            "earthquake": {"time": "t", "maxScale": -1,
                "hypocenter": {"name": "石川県能登地方", "latitude": 37.5, "longitude": 137.2, "depth": 10, "magnitude": -1}}
        }))
        .unwrap();

        f.router.dispatch(&report).await.unwrap();

        let (bounds, _) = f.surface.camera().unwrap();
        assert!(bounds.contains(LatLng::new(37.5, 137.2)));
        assert!(bounds.contains(LatLng::new(44.0, 145.0)));
        assert!(!f.presenter.snapshot().list_armed);
        assert_eq!(f.presenter.snapshot().info.unwrap().magnitude, "--");
    }

    #[tokio::test]
    async fn test_early_warning_falls_back_to_pref() {
        let mut f = fixture(full_source());
        f.router.dispatch(&early_warning_report()).await.unwrap();

        assert_eq!(f.surface.marker_count(layers::EEW_AREAS), 2);
        let info = f.presenter.snapshot().info.unwrap();
        assert_eq!(info.title, "Earthquake Early Warning");
        assert_eq!(info.max_intensity, "--");
        assert_eq!(info.depth, "Shallow");
        assert_eq!(info.magnitude, "6.1");
        assert!(f.surface.icon(layers::EPICENTER).unwrap().url.ends_with("eewEpicenter.png"));
    }

    #[tokio::test]
    async fn test_early_warning_without_determined_epicenter() {
        let mut f = fixture(full_source());
        let report = ReportEnvelope::decode(&json!({
            "code": 556,
            "earthquake": {
                "originTime": "2024/01/01 16:09:50",
                "hypocenter": {"name": "", "latitude": -200, "longitude": -200, "depth": -1, "magnitude": -1}
            },
            "areas": [
                {"name": "東京都", "pref": "東京都", "scaleFrom": 40, "scaleTo": 45},
                {"name": "神奈川県", "pref": "神奈川県", "scaleFrom": 30, "scaleTo": 40}
            ]
        }))
        .unwrap();

        assert_eq!(f.router.dispatch(&report).await.unwrap(), ReportKind::EarlyWarning);

        assert_eq!(f.surface.marker_count(layers::EEW_AREAS), 2);
        assert!(f.surface.icon(layers::EPICENTER).is_none());
        assert_eq!(f.router.state().epicenter, None);

        let shown = f.presenter.snapshot();
        let info = shown.info.unwrap();
        assert_eq!(info.location, "Evaluating Epicenter");
        assert_eq!(info.magnitude, "--");
        assert!(shown.list_armed);
        let list = shown.intensity_list.unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.buckets.iter().flat_map(|b| &b.entries).all(|e| e.distance_km.is_none()));

        let (bounds, _) = f.surface.camera().unwrap();
        assert!(bounds.contains(LatLng::new(35.5, 139.65)));
        assert!(!bounds.contains(LatLng::new(35.7, 140.0)));
    }

    #[tokio::test]
    async fn test_early_warning_without_hypocenter_is_malformed() {
        let mut f = fixture(full_source());
        let report = ReportEnvelope::decode(&json!({
            "code": 556,
            "earthquake": {"originTime": "2024/01/01 16:09:50"},
            "areas": [{"name": "東京都", "pref": "東京都", "scaleFrom": 40, "scaleTo": 45}]
        }))
        .unwrap();

        let err = f.router.dispatch(&report).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedPayload(_)));
        assert!(f.surface.layer_names().is_empty());
    }

    #[tokio::test]
    async fn test_epicenter_name_is_translated() {
        let mut f = fixture(full_source().with(
            ReferenceAsset::Epicenters,
            r#"[{"jp": "東京湾", "en": "Tokyo Bay"}, {"jp": "千葉県北西部", "en": "Northwestern Chiba"}]"#,
        ));

        f.router.dispatch(&detail_report()).await.unwrap();
        assert_eq!(f.presenter.snapshot().info.unwrap().location, "Tokyo Bay");

        f.router.dispatch(&early_warning_report()).await.unwrap();
        assert_eq!(f.presenter.snapshot().info.unwrap().location, "Northwestern Chiba");
    }

    #[tokio::test]
    async fn test_epicenter_name_falls_back_to_feed_name() {
        // No translation for the name.
        let mut f = fixture(full_source().with(ReferenceAsset::Epicenters, "[]"));
        f.router.dispatch(&detail_report()).await.unwrap();
        assert_eq!(f.presenter.snapshot().info.unwrap().location, "東京湾");

        // Translation table missing entirely.
        let mut f = fixture(full_source());
        f.router.dispatch(&detail_report()).await.unwrap();
        assert_eq!(f.presenter.snapshot().info.unwrap().location, "東京湾");
        assert_eq!(f.surface.marker_count(layers::STATIONS), 1);

        // Unparseable table.
        let mut f = fixture(full_source().with(ReferenceAsset::Epicenters, "<html>"));
        f.router.dispatch(&early_warning_report()).await.unwrap();
        assert_eq!(f.presenter.snapshot().info.unwrap().location, "千葉県北西部");
    }

    #[tokio::test]
    async fn test_detail_after_early_warning_clears_eew_layer() {
        let mut f = fixture(full_source());
        f.router.dispatch(&early_warning_report()).await.unwrap();
        f.router.dispatch(&detail_report()).await.unwrap();

        assert_eq!(f.surface.marker_count(layers::EEW_AREAS), 0);
        assert!(!f.surface.has_layer(layers::EEW_AREAS));
        assert_eq!(f.router.state().marker_count(layers::EEW_AREAS), 0);
        assert_eq!(f.router.state().kind, Some(ReportKind::HypocenterDetail));
    }

    #[tokio::test]
    async fn test_reference_failure_draws_nothing() {
        let mut f = fixture(StaticAssetSource::new());
        let err = f.router.dispatch(&detail_report()).await.unwrap_err();

        assert!(matches!(err, AppError::ReferenceDataUnavailable { .. }));
        assert_eq!(f.surface.marker_count(layers::STATIONS), 0);
        assert!(f.surface.icon(layers::EPICENTER).is_none());
        assert!(f.notifier.played().is_empty());
    }

    #[tokio::test]
    async fn test_surface_failure_clears_to_baseline() {
        let mut f = fixture(full_source());
        f.surface.fail_on(layers::STATIONS);

        assert!(f.router.dispatch(&detail_report()).await.is_err());
        assert!(f.surface.layer_names().is_empty());
        assert!(f.router.state().is_clear());
    }

    #[tokio::test]
    async fn test_malformed_payload_rejected() {
        let mut f = fixture(full_source());
        let report = ReportEnvelope::decode(&json!({
            "code": 551,
            "issue": {"type": "DetailScale"},
            "earthquake": {"time": "t"},
            "points": []
        }))
        .unwrap();

        let err = f.router.dispatch(&report).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedPayload(_)));
        assert!(f.surface.layer_names().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_is_ignored() {
        let mut f = fixture(full_source());
        let report =
            ReportEnvelope::decode(&json!({"code": 551, "issue": {"type": "Other"}})).unwrap();

        assert_eq!(f.router.dispatch(&report).await.unwrap(), ReportKind::Unsupported);
        assert!(f.notifier.played().is_empty());
    }

    #[tokio::test]
    async fn test_camera_includes_tsunami_bounds() {
        let mut f = fixture(full_source());
        let far = LatLng::new(26.2, 127.7);
        f.bounds_tx.send_replace(Some(Bounds::from_points([far])));

        f.router.dispatch(&detail_report()).await.unwrap();

        let (bounds, _) = f.surface.camera().unwrap();
        assert!(bounds.contains(far));
        assert!(bounds.contains(LatLng::new(35.5, 139.8)));
    }
}
