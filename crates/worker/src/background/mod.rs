//! Background tasks and scheduled jobs.
//!
//! Each submodule provides a long-running loop intended to be spawned on
//! tokio. All loops accept a [`CancellationToken`](tokio_util::sync::CancellationToken)
//! for graceful shutdown.

pub mod open_play_scheduler;

pub use open_play_scheduler::{OpenPlayScheduler, OpenPlaySchedulerHandle, TickReport};
