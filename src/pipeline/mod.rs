//! Feed processing: classification, change detection, polling and
//! dispatch to the renderers.
//!
//! - `run_polling`: Poll both feeds until shut down
//! - `run_once`: Poll each feed a single time

pub mod classify;
pub mod diff;
pub mod dispatch;
pub mod run;
pub mod scheduler;

pub use classify::{FeedCode, ReportKind, classify, classify_report};
pub use diff::{SnapshotChange, SnapshotTracker};
pub use dispatch::{QuakeDispatcher, TsunamiDispatcher};
pub use run::{Adapters, build_loops, http_reference, run_once, run_polling, wire};
pub use scheduler::{
    FeedHandler, FeedLoop, LoopStats, PollingScheduler, SchedulerHandle, TickOutcome,
};
