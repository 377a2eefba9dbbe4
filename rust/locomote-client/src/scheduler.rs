//! Repeating timers for periodic refreshes.
//!
//! [`Scheduler::every`] starts a task that repeats on a fixed period and
//! returns an [`Interval`] that cancels it. Implementations:
//!
//! - [`TokioScheduler`] on native targets
//! - [`WindowScheduler`] (`window.setInterval`) in the browser
//! - [`ManualScheduler`] everywhere; it only runs tasks when told to

use std::time::Duration;

use locomote_common::{ConditionalSend, ConditionalSync};

use crate::ClientError;

mod manual;
pub use manual::*;

#[cfg(not(target_arch = "wasm32"))]
mod runtime;
#[cfg(not(target_arch = "wasm32"))]
pub use runtime::*;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
mod window;
#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
pub use window::*;

/// A running repeating task.
pub trait Interval: ConditionalSend + 'static {
    /// Stop the task. It will not run again.
    fn cancel(self);
}

/// Starts repeating tasks.
pub trait Scheduler: Clone + ConditionalSend + ConditionalSync + 'static {
    /// Handle to a running task
    type Interval: Interval;

    /// Run `task` every `period`, starting one period from now.
    fn every<F>(&self, period: Duration, task: F) -> Result<Self::Interval, ClientError>
    where
        F: FnMut() + ConditionalSend + 'static;
}

/// Convert a period in minutes to a [`Duration`].
pub fn minutes(minutes: u32) -> Duration {
    Duration::from_secs(u64::from(minutes) * 60)
}
