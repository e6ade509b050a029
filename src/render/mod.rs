//! Render capabilities and routers.
//!
//! The routers only talk to the map, the info panel and the speaker
//! through the traits in this module:
//! - [`MapSurface`]: named layers, markers, line geometry and the camera
//! - [`InfoPresenter`]: info panel, intensity list and tsunami sidebar
//! - [`Notifier`]: notification sounds
//!
//! Adapters live in [`memory`] (in-process recording) and [`console`]
//! (log output).

pub mod console;
pub mod intensity_list;
pub mod layers;
pub mod memory;
pub mod quake;
pub mod tsunami;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{AreaGeometry, Bounds, Config, IntensityClass, LatLng};
use crate::services::ReferenceDataProvider;

pub use intensity_list::{IntensityBucket, IntensityEntry, IntensityList, build_intensity_list};
pub use layers::IconSet;
pub use quake::{MapRenderState, QuakeRouter};
pub use tsunami::{TsunamiList, TsunamiPanel, TsunamiRouter, TsunamiRow, TsunamiState};

/// A marker image and its placement geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Icon {
    pub url: String,
    pub size: [u32; 2],
    pub anchor: [u32; 2],
}

/// A point marker inside a layer group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub position: LatLng,
    pub icon: Icon,
    /// Feed name of the plotted place
    pub label: String,
    pub intensity: IntensityClass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: String,
    pub weight: u32,
    pub opacity: f32,
}

/// Camera fit parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
    pub padding: u32,
    pub duration: Duration,
}

/// Text shown in the main info panel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InfoPanel {
    pub title: String,
    pub location: String,
    pub magnitude: String,
    pub depth: String,
    pub time: String,
    pub comment: String,
    pub max_intensity: String,
}

/// Notification sounds, one per report kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    DetailScale,
    ScalePrompt,
    Destination,
    Foreign,
    EarlyWarning,
    Tsunami,
}

impl SoundCue {
    /// Audio asset name without extension.
    pub fn asset_name(&self) -> &'static str {
        match self {
            SoundCue::DetailScale | SoundCue::Destination | SoundCue::Foreign => "detailScale",
            SoundCue::ScalePrompt => "scalePrompt",
            SoundCue::EarlyWarning => "eew",
            SoundCue::Tsunami => "tsReport",
        }
    }
}

/// The map widget.
#[async_trait]
pub trait MapSurface: Send + Sync {
    /// Add a marker to the layer group `layer`, creating the group if needed.
    async fn place_marker(&self, layer: &str, marker: Marker) -> Result<()>;

    /// Replace the single-icon layer `layer` with an icon at `position`.
    async fn place_icon_marker(&self, layer: &str, position: LatLng, icon: Icon) -> Result<()>;

    /// Add a line geometry to `layer`.
    async fn draw_line_geometry(
        &self,
        layer: &str,
        geometry: &AreaGeometry,
        style: &LineStyle,
    ) -> Result<()>;

    async fn set_layer_visible(&self, layer: &str, visible: bool) -> Result<()>;

    /// Remove `layer` and everything in it. Removing a missing layer is a no-op.
    async fn remove_named_layer(&self, layer: &str) -> Result<()>;

    /// Move the camera; resolves when the animation has finished.
    async fn fit_bounds(&self, bounds: &Bounds, options: FitOptions) -> Result<()>;
}

/// The textual panels next to the map.
pub trait InfoPresenter: Send + Sync {
    fn update_info(&self, panel: InfoPanel);
    fn set_intensity_list_armed(&self, armed: bool);
    fn show_intensity_list(&self, list: IntensityList);
    fn show_tsunami_panel(&self, panel: TsunamiPanel);
    fn hide_tsunami_panel(&self);
}

pub trait Notifier: Send + Sync {
    fn play(&self, cue: SoundCue, volume: f32);
    fn stop(&self);
}

/// Everything a render pass needs, shared by both routers.
#[derive(Clone)]
pub struct RenderContext {
    pub surface: Arc<dyn MapSurface>,
    pub presenter: Arc<dyn InfoPresenter>,
    pub notifier: Arc<dyn Notifier>,
    pub reference: Arc<dyn ReferenceDataProvider>,
    pub config: Arc<Config>,
}

impl RenderContext {
    pub fn icons(&self) -> IconSet {
        IconSet::new(&self.config.assets.icon_base_url)
    }

    pub fn fit_options(&self) -> FitOptions {
        FitOptions {
            padding: self.config.map.bound_padding,
            duration: Duration::from_millis(self.config.map.bound_duration),
        }
    }

    /// Fit the camera to `bounds`. Returns false when there was nothing to frame.
    pub async fn fit_camera(&self, bounds: &Bounds) -> Result<bool> {
        if bounds.is_empty() {
            log::warn!("No coordinates to frame, camera left as is");
            return Ok(false);
        }
        self.surface.fit_bounds(bounds, self.fit_options()).await?;
        Ok(true)
    }

    pub fn play(&self, cue: SoundCue) {
        self.notifier.play(cue, self.config.sound.volume);
    }
}
