//! Wiring of feeds, reference data, routers and adapters.

use std::sync::Arc;

use crate::models::Config;
use crate::pipeline::dispatch::{QuakeDispatcher, TsunamiDispatcher};
use crate::pipeline::scheduler::{FeedLoop, PollingScheduler, SchedulerHandle};
use crate::render::{InfoPresenter, MapSurface, Notifier, QuakeRouter, RenderContext, TsunamiRouter};
use crate::services::{CachedReferenceData, HttpAssetSource, HttpFeed, ReferenceDataProvider};

/// The output side of the client.
#[derive(Clone)]
pub struct Adapters {
    pub surface: Arc<dyn MapSurface>,
    pub presenter: Arc<dyn InfoPresenter>,
    pub notifier: Arc<dyn Notifier>,
}

pub type MainLoop = FeedLoop<HttpFeed, QuakeDispatcher>;
pub type TsunamiLoop = FeedLoop<HttpFeed, TsunamiDispatcher>;

/// Both dispatchers sharing one reference cache, with the tsunami bounds
/// channel already connected.
pub fn wire(
    config: Arc<Config>,
    reference: Arc<dyn ReferenceDataProvider>,
    adapters: Adapters,
) -> (QuakeDispatcher, TsunamiDispatcher) {
    let ctx = RenderContext {
        surface: adapters.surface,
        presenter: adapters.presenter,
        notifier: adapters.notifier,
        reference,
        config,
    };

    let (tsunami, tsunami_bounds) = TsunamiRouter::new(ctx.clone());
    let quake = QuakeRouter::new(ctx, tsunami_bounds);
    (QuakeDispatcher::new(quake), TsunamiDispatcher::new(tsunami))
}

/// Reference data served from the configured asset URLs.
pub fn http_reference(
    config: &Config,
    client: &reqwest::Client,
) -> Arc<CachedReferenceData<HttpAssetSource>> {
    Arc::new(CachedReferenceData::new(HttpAssetSource::new(
        client.clone(),
        config.assets.clone(),
    )))
}

/// Build the two HTTP poll loops from configuration.
pub fn build_loops(
    config: Arc<Config>,
    client: reqwest::Client,
    reference: Arc<dyn ReferenceDataProvider>,
    adapters: Adapters,
) -> (MainLoop, TsunamiLoop) {
    let (quake, tsunami) = wire(Arc::clone(&config), reference, adapters);

    let main_feed = HttpFeed::new("main", &config.api.base_url, client.clone());
    let tsunami_feed = HttpFeed::new("tsunami", &config.api.tsunami_url, client);

    (
        FeedLoop::new(main_feed, quake, config.api.interval()),
        FeedLoop::new(tsunami_feed, tsunami, config.api.tsunami_interval()),
    )
}

/// Warm the reference cache and start polling both feeds in the background.
pub async fn run_polling(
    config: Arc<Config>,
    client: reqwest::Client,
    adapters: Adapters,
) -> SchedulerHandle {
    let reference = http_reference(&config, &client);
    if let Err(e) = reference.preload().await {
        log::warn!("Reference data not ready, will retry on first render: {e}");
    }

    let (main, tsunami) = build_loops(config, client, reference, adapters);
    PollingScheduler::spawn(main, tsunami)
}

/// Poll each feed exactly once, tsunami first so the camera already sees
/// any active advisory.
pub async fn run_once(main: &mut MainLoop, tsunami: &mut TsunamiLoop) {
    let outcome = tsunami.tick().await;
    log::info!("Tsunami feed: {outcome:?}");
    let outcome = main.tick().await;
    log::info!("Main feed: {outcome:?}");
}
