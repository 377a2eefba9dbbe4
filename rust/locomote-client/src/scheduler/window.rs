use std::time::Duration;

use locomote_common::ConditionalSend;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use super::{Interval, Scheduler};
use crate::ClientError;

/// Runs repeating tasks with `window.setInterval`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WindowScheduler;

impl Scheduler for WindowScheduler {
    type Interval = WindowInterval;

    fn every<F>(&self, period: Duration, task: F) -> Result<WindowInterval, ClientError>
    where
        F: FnMut() + ConditionalSend + 'static,
    {
        let window =
            web_sys::window().ok_or_else(|| ClientError::Schedule("no window".to_string()))?;
        let millis = i32::try_from(period.as_millis())
            .map_err(|_| ClientError::Schedule(format!("period of {period:?} is too long")))?;

        let task = Closure::<dyn FnMut()>::new(task);
        let handle = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                task.as_ref().unchecked_ref(),
                millis,
            )
            .map_err(|error| ClientError::Schedule(format!("{error:?}")))?;

        Ok(WindowInterval { handle, task })
    }
}

/// A task started by a [`WindowScheduler`].
///
/// The callback lives as long as this value; dropping it while the timer is
/// still set makes the timer call into freed memory. Either [`cancel`] it or
/// hand it to JS with [`WindowInterval::forget`].
///
/// [`cancel`]: Interval::cancel
pub struct WindowInterval {
    handle: i32,
    task: Closure<dyn FnMut()>,
}

impl WindowInterval {
    /// Leak the callback so the timer runs for the lifetime of the page, and
    /// return the id `clearInterval` accepts.
    pub fn forget(self) -> i32 {
        self.task.forget();
        self.handle
    }
}

impl Interval for WindowInterval {
    fn cancel(self) {
        if let Some(window) = web_sys::window() {
            window.clear_interval_with_handle(self.handle);
        }
    }
}

impl std::fmt::Debug for WindowInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowInterval")
            .field("handle", &self.handle)
            .finish()
    }
}
