//! Adapters that only log, used by the command line runner.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AreaGeometry, Bounds, LatLng};
use crate::render::{
    FitOptions, Icon, InfoPanel, InfoPresenter, IntensityList, LineStyle, MapSurface, Marker,
    Notifier, SoundCue, TsunamiPanel,
};

#[derive(Debug, Default)]
pub struct ConsoleSurface;

#[async_trait]
impl MapSurface for ConsoleSurface {
    async fn place_marker(&self, layer: &str, marker: Marker) -> Result<()> {
        log::debug!(
            "[{layer}] {} {} at ({:.3}, {:.3})",
            marker.label,
            marker.intensity,
            marker.position.lat,
            marker.position.lng
        );
        Ok(())
    }

    async fn place_icon_marker(&self, layer: &str, position: LatLng, icon: Icon) -> Result<()> {
        log::info!(
            "[{layer}] {} at ({:.3}, {:.3})",
            icon.url,
            position.lat,
            position.lng
        );
        Ok(())
    }

    async fn draw_line_geometry(
        &self,
        layer: &str,
        geometry: &AreaGeometry,
        style: &LineStyle,
    ) -> Result<()> {
        log::debug!("[{layer}] {} in {}", geometry.display_name(), style.color);
        Ok(())
    }

    async fn set_layer_visible(&self, layer: &str, visible: bool) -> Result<()> {
        log::trace!("[{layer}] visible={visible}");
        Ok(())
    }

    async fn remove_named_layer(&self, layer: &str) -> Result<()> {
        log::trace!("[{layer}] removed");
        Ok(())
    }

    async fn fit_bounds(&self, bounds: &Bounds, _options: FitOptions) -> Result<()> {
        if let (Some(sw), Some(ne)) = (bounds.south_west(), bounds.north_east()) {
            log::info!(
                "Camera -> ({:.2}, {:.2}) .. ({:.2}, {:.2})",
                sw.lat,
                sw.lng,
                ne.lat,
                ne.lng
            );
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ConsolePresenter;

impl InfoPresenter for ConsolePresenter {
    fn update_info(&self, panel: InfoPanel) {
        log::info!(
            "{} | {} | M{} | depth {} | {} | max {}",
            panel.title,
            panel.location,
            panel.magnitude,
            panel.depth,
            panel.time,
            panel.max_intensity
        );
        if !panel.comment.is_empty() {
            log::info!("{}", panel.comment);
        }
    }

    fn set_intensity_list_armed(&self, _armed: bool) {}

    fn show_intensity_list(&self, list: IntensityList) {
        for bucket in &list.buckets {
            let names: Vec<_> = bucket.visible().iter().map(|e| e.name.as_str()).collect();
            let more = bucket.hidden_count();
            if more > 0 {
                log::info!("  {}: {} (+{more} more)", bucket.heading(), names.join(", "));
            } else {
                log::info!("  {}: {}", bucket.heading(), names.join(", "));
            }
        }
    }

    fn show_tsunami_panel(&self, panel: TsunamiPanel) {
        log::warn!("Tsunami {} in effect", panel.highest_grade);
        for list in &panel.lists {
            for row in &list.rows {
                log::info!(
                    "  {} | {} | {} | {}",
                    list.grade,
                    row.name,
                    row.condition,
                    row.max_height
                );
            }
        }
    }

    fn hide_tsunami_panel(&self) {
        log::debug!("Tsunami panel hidden");
    }
}

#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn play(&self, cue: SoundCue, volume: f32) {
        log::info!("Sound: {} (volume {volume:.2})", cue.asset_name());
    }

    fn stop(&self) {}
}
