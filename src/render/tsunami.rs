//! Tsunami advisory overlay: per-grade coastline layers, the flashing
//! effect and the sidebar panel.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::models::{AreaGeometry, Bounds, Grade, TsunamiEnvelope};
use crate::render::{LineStyle, MapSurface, RenderContext, SoundCue, layers};

/// One area row in the sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsunamiRow {
    pub name: String,
    pub condition: String,
    pub max_height: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsunamiList {
    pub grade: Grade,
    /// Empty lists render as "No area issued."
    pub rows: Vec<TsunamiRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TsunamiPanel {
    pub highest_grade: Grade,
    /// MajorWarning, Warning, Watch
    pub lists: Vec<TsunamiList>,
}

impl TsunamiPanel {
    pub fn list(&self, grade: Grade) -> Option<&TsunamiList> {
        self.lists.iter().find(|l| l.grade == grade)
    }
}

/// What the tsunami layers currently show.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TsunamiState {
    pub layers: Vec<&'static str>,
    pub areas: usize,
    pub highest: Option<Grade>,
    pub bounds: Option<Bounds>,
}

impl TsunamiState {
    pub fn is_active(&self) -> bool {
        !self.layers.is_empty()
    }
}

/// Background task alternating the visibility of the tsunami layers.
struct Flasher {
    handle: JoinHandle<()>,
}

impl Flasher {
    fn start(
        surface: Arc<dyn MapSurface>,
        layers: Vec<&'static str>,
        visible: Duration,
        hidden: Duration,
        token: Arc<()>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let _token = token;
            loop {
                tokio::time::sleep(visible).await;
                set_visible(surface.as_ref(), &layers, false).await;
                tokio::time::sleep(hidden).await;
                set_visible(surface.as_ref(), &layers, true).await;
            }
        });
        Self { handle }
    }

    /// Cancel the task and wait until it has actually stopped.
    async fn stop(mut self) {
        self.handle.abort();
        let _ = (&mut self.handle).await;
    }
}

impl Drop for Flasher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn set_visible(surface: &dyn MapSurface, layers: &[&'static str], visible: bool) {
    for layer in layers {
        if let Err(e) = surface.set_layer_visible(layer, visible).await {
            log::debug!("Flash toggle on {layer} failed: {e}");
        }
    }
}

pub struct TsunamiRouter {
    ctx: RenderContext,
    state: TsunamiState,
    flasher: Option<Flasher>,
    flash_token: Arc<()>,
    bounds_tx: watch::Sender<Option<Bounds>>,
}

impl TsunamiRouter {
    /// Create the router and the receiver the quake router reads the
    /// active advisory bounds from.
    pub fn new(ctx: RenderContext) -> (Self, watch::Receiver<Option<Bounds>>) {
        let (bounds_tx, bounds_rx) = watch::channel(None);
        let router = Self {
            ctx,
            state: TsunamiState::default(),
            flasher: None,
            flash_token: Arc::new(()),
            bounds_tx,
        };
        (router, bounds_rx)
    }

    pub fn state(&self) -> &TsunamiState {
        &self.state
    }

    /// Number of flasher tasks still alive.
    pub fn live_flashers(&self) -> usize {
        Arc::strong_count(&self.flash_token) - 1
    }

    /// Render one tsunami bulletin, replacing whatever was drawn before.
    pub async fn render(&mut self, envelope: &TsunamiEnvelope) -> Result<()> {
        if envelope.is_inactive() {
            log::info!("No active tsunami advisory");
            return self.clear_all().await;
        }

        let geometry = self.ctx.reference.tsunami_area_geometry().await?;

        let mut by_grade: BTreeMap<Grade, Vec<&AreaGeometry>> = BTreeMap::new();
        for area in &envelope.areas {
            match geometry.get(&area.name) {
                Some(found) => by_grade.entry(area.grade).or_default().push(found),
                None => log::warn!("Tsunami area not found in geometry: {}", area.name),
            }
        }

        if by_grade.is_empty() {
            log::warn!(
                "None of the {} advisory areas have geometry, clearing",
                envelope.areas.len()
            );
            return self.clear_all().await;
        }

        match self.draw(envelope, &by_grade).await {
            Ok(()) => Ok(()),
            Err(e) => {
                log::error!("Tsunami render failed, clearing overlay: {e}");
                if let Err(clear) = self.clear_all().await {
                    log::error!("Clearing tsunami overlay also failed: {clear}");
                }
                Err(e)
            }
        }
    }

    async fn draw(
        &mut self,
        envelope: &TsunamiEnvelope,
        by_grade: &BTreeMap<Grade, Vec<&AreaGeometry>>,
    ) -> Result<()> {
        let surface = self.ctx.surface.clone();

        self.ctx.play(SoundCue::Tsunami);
        self.clear_layers().await?;

        let mut bounds = Bounds::new();
        let mut drawn = Vec::with_capacity(by_grade.len());
        let mut areas = 0;
        // Ascending grade so the most severe coastline ends up on top.
        for (grade, geometries) in by_grade {
            let layer = layers::tsunami_layer(*grade);
            let style = LineStyle {
                color: grade.color().to_string(),
                weight: 4,
                opacity: 1.0,
            };
            for geometry in geometries {
                surface.draw_line_geometry(layer, geometry, &style).await?;
                bounds.merge(&geometry.bounds());
                areas += 1;
            }
            drawn.push(layer);
        }

        self.state.layers = drawn.clone();
        self.state.areas = areas;
        self.state.highest = by_grade.keys().next_back().copied();

        self.start_flasher(drawn);

        self.state.bounds = Some(bounds);
        self.bounds_tx.send_replace(Some(bounds));
        self.ctx.fit_camera(&bounds).await?;

        let panel = self.build_panel(envelope, by_grade);
        self.ctx.presenter.show_tsunami_panel(panel);

        log::info!(
            "Rendered tsunami advisory: {areas} areas across {} grades",
            self.state.layers.len()
        );
        Ok(())
    }

    fn start_flasher(&mut self, layers: Vec<&'static str>) {
        let map = &self.ctx.config.map;
        self.flasher = Some(Flasher::start(
            self.ctx.surface.clone(),
            layers,
            Duration::from_millis(map.flash_visible_ms),
            Duration::from_millis(map.flash_hidden_ms),
            self.flash_token.clone(),
        ));
    }

    fn build_panel(
        &self,
        envelope: &TsunamiEnvelope,
        by_grade: &BTreeMap<Grade, Vec<&AreaGeometry>>,
    ) -> TsunamiPanel {
        let lists = Grade::LISTED
            .iter()
            .map(|grade| TsunamiList {
                grade: *grade,
                rows: envelope
                    .areas
                    .iter()
                    .filter(|a| a.grade == *grade)
                    .map(|a| {
                        let name = by_grade
                            .get(grade)
                            .and_then(|gs| gs.iter().find(|g| g.name == a.name))
                            .map(|g| g.display_name().to_string())
                            .unwrap_or_else(|| a.name.clone());
                        TsunamiRow {
                            name,
                            condition: a.condition_text(),
                            max_height: a.max_height_text(),
                        }
                    })
                    .collect(),
            })
            .collect();

        TsunamiPanel {
            highest_grade: self.state.highest.unwrap_or(Grade::Unknown),
            lists,
        }
    }

    /// Stop the flasher and remove every tsunami layer.
    async fn clear_layers(&mut self) -> Result<()> {
        if let Some(flasher) = self.flasher.take() {
            flasher.stop().await;
        }
        for layer in layers::TSUNAMI_LAYERS {
            self.ctx.surface.remove_named_layer(layer).await?;
        }
        self.state = TsunamiState::default();
        Ok(())
    }

    /// Remove the overlay, hide the panel and withdraw the published bounds.
    pub async fn clear_all(&mut self) -> Result<()> {
        self.bounds_tx.send_replace(None);
        self.ctx.presenter.hide_tsunami_panel();
        self.clear_layers().await
    }
}
