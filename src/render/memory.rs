//! In-process adapters that record every call for later inspection.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{AreaGeometry, Bounds, LatLng};
use crate::render::{
    FitOptions, Icon, InfoPanel, InfoPresenter, IntensityList, LineStyle, MapSurface, Marker,
    Notifier, SoundCue, TsunamiPanel,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Contents of one named layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerContents {
    pub markers: Vec<Marker>,
    pub icon: Option<(LatLng, Icon)>,
    /// Drawn geometry names with their style
    pub lines: Vec<(String, LineStyle)>,
    pub visible: bool,
}

impl Default for LayerContents {
    fn default() -> Self {
        Self {
            markers: Vec::new(),
            icon: None,
            lines: Vec::new(),
            visible: true,
        }
    }
}

#[derive(Debug, Default, Serialize)]
struct SurfaceState {
    layers: BTreeMap<String, LayerContents>,
    camera: Option<(Bounds, FitOptions)>,
    #[serde(skip)]
    fail_on: Option<String>,
}

/// Map surface kept in memory.
#[derive(Debug, Default)]
pub struct MemorySurface {
    inner: Mutex<SurfaceState>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every drawing call on `layer` fail.
    pub fn fail_on(&self, layer: &str) {
        lock(&self.inner).fail_on = Some(layer.to_string());
    }

    pub fn layer_names(&self) -> Vec<String> {
        lock(&self.inner).layers.keys().cloned().collect()
    }

    pub fn has_layer(&self, layer: &str) -> bool {
        lock(&self.inner).layers.contains_key(layer)
    }

    pub fn layer(&self, layer: &str) -> Option<LayerContents> {
        lock(&self.inner).layers.get(layer).cloned()
    }

    pub fn marker_count(&self, layer: &str) -> usize {
        lock(&self.inner)
            .layers
            .get(layer)
            .map(|l| l.markers.len())
            .unwrap_or(0)
    }

    pub fn icon(&self, layer: &str) -> Option<Icon> {
        lock(&self.inner)
            .layers
            .get(layer)
            .and_then(|l| l.icon.as_ref())
            .map(|(_, icon)| icon.clone())
    }

    pub fn is_visible(&self, layer: &str) -> Option<bool> {
        lock(&self.inner).layers.get(layer).map(|l| l.visible)
    }

    pub fn camera(&self) -> Option<(Bounds, FitOptions)> {
        lock(&self.inner).camera
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(&*lock(&self.inner))?)
    }

    fn with_layer<R>(&self, layer: &str, f: impl FnOnce(&mut LayerContents) -> R) -> Result<R> {
        let mut state = lock(&self.inner);
        if state.fail_on.as_deref() == Some(layer) {
            return Err(AppError::surface(format!("layer {layer} rejected the update")));
        }
        Ok(f(state.layers.entry(layer.to_string()).or_default()))
    }
}

#[async_trait]
impl MapSurface for MemorySurface {
    async fn place_marker(&self, layer: &str, marker: Marker) -> Result<()> {
        self.with_layer(layer, |l| l.markers.push(marker))
    }

    async fn place_icon_marker(&self, layer: &str, position: LatLng, icon: Icon) -> Result<()> {
        self.with_layer(layer, |l| l.icon = Some((position, icon)))
    }

    async fn draw_line_geometry(
        &self,
        layer: &str,
        geometry: &AreaGeometry,
        style: &LineStyle,
    ) -> Result<()> {
        self.with_layer(layer, |l| {
            l.lines.push((geometry.name.clone(), style.clone()))
        })
    }

    async fn set_layer_visible(&self, layer: &str, visible: bool) -> Result<()> {
        if let Some(l) = lock(&self.inner).layers.get_mut(layer) {
            l.visible = visible;
        }
        Ok(())
    }

    async fn remove_named_layer(&self, layer: &str) -> Result<()> {
        lock(&self.inner).layers.remove(layer);
        Ok(())
    }

    async fn fit_bounds(&self, bounds: &Bounds, options: FitOptions) -> Result<()> {
        lock(&self.inner).camera = Some((*bounds, options));
        Ok(())
    }
}

/// Everything the presenter currently shows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PresenterState {
    pub info: Option<InfoPanel>,
    pub list_armed: bool,
    pub intensity_list: Option<IntensityList>,
    pub tsunami: Option<TsunamiPanel>,
    pub tsunami_visible: bool,
}

#[derive(Debug, Default)]
pub struct MemoryPresenter {
    inner: Mutex<PresenterState>,
}

impl MemoryPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> PresenterState {
        lock(&self.inner).clone()
    }
}

impl InfoPresenter for MemoryPresenter {
    fn update_info(&self, panel: InfoPanel) {
        lock(&self.inner).info = Some(panel);
    }

    fn set_intensity_list_armed(&self, armed: bool) {
        let mut state = lock(&self.inner);
        state.list_armed = armed;
        if !armed {
            state.intensity_list = None;
        }
    }

    fn show_intensity_list(&self, list: IntensityList) {
        lock(&self.inner).intensity_list = Some(list);
    }

    fn show_tsunami_panel(&self, panel: TsunamiPanel) {
        let mut state = lock(&self.inner);
        state.tsunami = Some(panel);
        state.tsunami_visible = true;
    }

    fn hide_tsunami_panel(&self) {
        lock(&self.inner).tsunami_visible = false;
    }
}

#[derive(Debug, Default)]
pub struct MemoryNotifier {
    played: Mutex<Vec<SoundCue>>,
    stops: AtomicUsize,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<SoundCue> {
        lock(&self.played).clone()
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::Relaxed)
    }
}

impl Notifier for MemoryNotifier {
    fn play(&self, cue: SoundCue, _volume: f32) {
        lock(&self.played).push(cue);
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::Relaxed);
    }
}
