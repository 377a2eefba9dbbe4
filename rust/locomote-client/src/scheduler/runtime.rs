use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use locomote_common::ConditionalSend;

use super::{Interval, Scheduler};
use crate::ClientError;

/// Runs repeating tasks on the ambient tokio runtime.
///
/// [`Scheduler::every`] must be called from within a runtime with a non-zero
/// period; otherwise it fails with [`ClientError::Schedule`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    type Interval = TokioInterval;

    fn every<F>(&self, period: Duration, mut task: F) -> Result<TokioInterval, ClientError>
    where
        F: FnMut() + ConditionalSend + 'static,
    {
        if period.is_zero() {
            return Err(ClientError::Schedule("period must be non-zero".into()));
        }

        let handle =
            Handle::try_current().map_err(|error| ClientError::Schedule(error.to_string()))?;

        let task = handle.spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                task();
            }
        });

        Ok(TokioInterval(task))
    }
}

/// A task started by a [`TokioScheduler`]. Dropping it leaves the task
/// running; call [`Interval::cancel`] to stop it.
#[derive(Debug)]
pub struct TokioInterval(JoinHandle<()>);

impl Interval for TokioInterval {
    fn cancel(self) {
        self.0.abort();
    }
}
