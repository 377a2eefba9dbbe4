use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use locomote_common::{ConditionalSend, SharedCell};

use super::{Interval, Scheduler};
use crate::ClientError;

#[cfg(not(target_arch = "wasm32"))]
type Task = Box<dyn FnMut() + Send>;

#[cfg(target_arch = "wasm32")]
type Task = Box<dyn FnMut()>;

struct Scheduled {
    period: Duration,
    task: Task,
    cancelled: Arc<AtomicBool>,
}

impl Scheduled {
    fn is_active(&self) -> bool {
        !self.cancelled.load(Ordering::SeqCst)
    }
}

/// A scheduler whose clock only moves when [`ManualScheduler::tick`] is
/// called.
///
/// Clones share the same set of tasks.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    scheduled: Arc<SharedCell<Vec<Scheduled>>>,
}

impl ManualScheduler {
    /// Create a scheduler with no tasks
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every task that has not been cancelled once, in the order they
    /// were scheduled.
    pub fn tick(&self) {
        // Tasks run unlocked so they may schedule more tasks
        let mut scheduled = std::mem::take(&mut *self.scheduled.lock());

        for entry in scheduled.iter_mut().filter(|entry| entry.is_active()) {
            (entry.task)();
        }

        let mut current = self.scheduled.lock();
        let added = std::mem::replace(&mut *current, scheduled);
        current.extend(added);
        current.retain(Scheduled::is_active);
    }

    /// The periods of every task that has not been cancelled.
    pub fn periods(&self) -> Vec<Duration> {
        self.scheduled
            .lock()
            .iter()
            .filter(|entry| entry.is_active())
            .map(|entry| entry.period)
            .collect()
    }
}

impl std::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("periods", &self.periods())
            .finish()
    }
}

impl Scheduler for ManualScheduler {
    type Interval = ManualInterval;

    fn every<F>(&self, period: Duration, task: F) -> Result<ManualInterval, ClientError>
    where
        F: FnMut() + ConditionalSend + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.scheduled.lock().push(Scheduled {
            period,
            task: Box::new(task),
            cancelled: cancelled.clone(),
        });

        Ok(ManualInterval { cancelled })
    }
}

/// A task started by a [`ManualScheduler`].
#[derive(Debug)]
pub struct ManualInterval {
    cancelled: Arc<AtomicBool>,
}

impl Interval for ManualInterval {
    fn cancel(self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}
