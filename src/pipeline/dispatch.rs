//! Feed handlers that decode changed payloads and route them to the
//! renderers.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{FeedSnapshot, ReportEnvelope, TsunamiEnvelope};
use crate::pipeline::scheduler::FeedHandler;
use crate::render::{QuakeRouter, TsunamiRouter};

/// Handler for the main (551 / 556) feed.
pub struct QuakeDispatcher {
    router: QuakeRouter,
}

impl QuakeDispatcher {
    pub fn new(router: QuakeRouter) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &QuakeRouter {
        &self.router
    }
}

#[async_trait]
impl FeedHandler for QuakeDispatcher {
    async fn on_change(&mut self, snapshot: &FeedSnapshot) -> Result<()> {
        let report = ReportEnvelope::decode(snapshot.first_item()?)?;
        let kind = self.router.dispatch(&report).await?;
        log::debug!("Main feed item handled as {kind}");
        Ok(())
    }
}

/// Handler for the tsunami feed.
pub struct TsunamiDispatcher {
    router: TsunamiRouter,
}

impl TsunamiDispatcher {
    pub fn new(router: TsunamiRouter) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &TsunamiRouter {
        &self.router
    }
}

#[async_trait]
impl FeedHandler for TsunamiDispatcher {
    async fn on_change(&mut self, snapshot: &FeedSnapshot) -> Result<()> {
        let envelope = TsunamiEnvelope::decode(&snapshot.raw)?;
        self.router.render(&envelope).await
    }
}
