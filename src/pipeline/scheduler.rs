//! Poll loops for the main and tsunami feeds.
//!
//! Each loop fetches on a fixed interval, compares the payload against the
//! previous one and hands changed payloads to its [`FeedHandler`]. The
//! handler is awaited inside the tick, so a loop never runs two passes at
//! once; ticks missed while a pass is running are skipped.

use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::Result;
use crate::models::FeedSnapshot;
use crate::pipeline::diff::{SnapshotChange, SnapshotTracker};
use crate::services::FeedSource;

/// Consumer of changed feed payloads.
#[async_trait]
pub trait FeedHandler: Send {
    async fn on_change(&mut self, snapshot: &FeedSnapshot) -> Result<()>;
}

/// Result of a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    FetchFailed,
    Unchanged,
    Dispatched,
    DispatchFailed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub ticks: u64,
    pub unchanged: u64,
    pub dispatched: u64,
    pub fetch_failures: u64,
    /// Fetch failures that are not expected to clear on the next tick
    pub persistent_fetch_failures: u64,
    pub dispatch_failures: u64,
}

pub struct FeedLoop<F, H> {
    source: F,
    handler: H,
    tracker: SnapshotTracker,
    interval: Duration,
    stats: LoopStats,
}

impl<F, H> FeedLoop<F, H>
where
    F: FeedSource,
    H: FeedHandler,
{
    pub fn new(source: F, handler: H, interval: Duration) -> Self {
        Self {
            source,
            handler,
            tracker: SnapshotTracker::new(),
            interval,
            stats: LoopStats::default(),
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// Fetch once, compare and dispatch on change.
    ///
    /// Errors never leave the tick: a failed fetch counts as no change and
    /// a failed dispatch is logged. The tracker keeps the new payload even
    /// when dispatch fails, so it is not retried until it changes again.
    pub async fn tick(&mut self) -> TickOutcome {
        self.stats.ticks += 1;
        let feed = self.source.name().to_string();

        let raw = match self.source.fetch().await {
            Ok(raw) => raw,
            Err(e) => {
                self.stats.fetch_failures += 1;
                if e.is_transient() {
                    log::warn!("[{feed}] fetch failed, keeping previous state: {e}");
                } else {
                    log::error!("[{feed}] fetch failed and will likely fail again: {e}");
                    self.stats.persistent_fetch_failures += 1;
                }
                return TickOutcome::FetchFailed;
            }
        };

        let change = self.tracker.observe(&raw);
        if !change.has_changes() {
            log::trace!("[{feed}] unchanged");
            self.stats.unchanged += 1;
            return TickOutcome::Unchanged;
        }

        let snapshot = FeedSnapshot::new(raw);
        log::info!(
            "[{feed}] {} payload {}",
            if change == SnapshotChange::Initial { "initial" } else { "new" },
            snapshot.fingerprint()
        );

        match self.handler.on_change(&snapshot).await {
            Ok(()) => {
                self.stats.dispatched += 1;
                TickOutcome::Dispatched
            }
            Err(e) => {
                log::error!("[{feed}] dispatch failed: {e}");
                self.stats.dispatch_failures += 1;
                TickOutcome::DispatchFailed
            }
        }
    }

    /// Tick forever. The first tick happens immediately.
    pub async fn run(mut self) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        log::info!(
            "[{}] polling every {:?}",
            self.source.name(),
            self.interval
        );
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }
}

/// Runs the main and tsunami loops as independent tasks.
pub struct PollingScheduler;

impl PollingScheduler {
    pub fn spawn<F1, H1, F2, H2>(
        main: FeedLoop<F1, H1>,
        tsunami: FeedLoop<F2, H2>,
    ) -> SchedulerHandle
    where
        F1: FeedSource + 'static,
        H1: FeedHandler + 'static,
        F2: FeedSource + 'static,
        H2: FeedHandler + 'static,
    {
        SchedulerHandle {
            main: tokio::spawn(main.run()),
            tsunami: tokio::spawn(tsunami.run()),
        }
    }
}

pub struct SchedulerHandle {
    main: JoinHandle<()>,
    tsunami: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn is_running(&self) -> bool {
        !self.main.is_finished() && !self.tsunami.is_finished()
    }

    /// Stop both loops and wait for them to wind down.
    pub async fn shutdown(self) {
        self.main.abort();
        self.tsunami.abort();
        for (name, handle) in [("main", self.main), ("tsunami", self.tsunami)] {
            match handle.await {
                Err(e) if e.is_panic() => log::error!("{name} loop panicked: {e}"),
                _ => log::debug!("{name} loop stopped"),
            }
        }
    }
}
