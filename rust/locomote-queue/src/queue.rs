use std::future::Future;

use locomote_common::{ConditionalSend, LOG_TARGET, SharedCell};
use tokio::sync::oneshot::channel;

use crate::{Dispatch, DispatchError};

#[cfg(not(target_arch = "wasm32"))]
type Continuation<T> = Box<dyn FnOnce(&T) + Send>;

#[cfg(target_arch = "wasm32")]
type Continuation<T> = Box<dyn FnOnce(&T)>;

struct State<T> {
    target: Option<T>,
    pending: Vec<Continuation<T>>,
    flushing: bool,
}

impl<T> Default for State<T> {
    fn default() -> Self {
        Self {
            target: None,
            pending: Vec::new(),
            flushing: false,
        }
    }
}

/// A FIFO of operations waiting for a target.
///
/// The target is usually a cheap, cloneable handle (such as a JS object
/// reference). It is set at most once: until then every submitted operation
/// is buffered, afterwards every submitted operation runs immediately on the
/// caller's stack.
///
/// Operations are always invoked outside of the queue's internal lock, so an
/// operation may itself submit more operations.
pub struct DeferredQueue<T> {
    state: SharedCell<State<T>>,
}

impl<T> DeferredQueue<T>
where
    T: Clone + ConditionalSend + 'static,
{
    /// Create an empty queue without a target.
    pub fn new() -> Self {
        Self {
            state: SharedCell::new(State::default()),
        }
    }

    /// Submit an operation.
    ///
    /// If the target is available the operation is invoked right away and
    /// the returned [`Dispatch`] is already resolved with its result.
    /// Otherwise the operation is buffered and the [`Dispatch`] resolves once
    /// [`DeferredQueue::set_target`] hands it the target.
    pub fn submit<F, R>(&self, operation: F) -> Dispatch<R>
    where
        F: FnOnce(&T) -> R + ConditionalSend + 'static,
        R: ConditionalSend + 'static,
    {
        let mut state = self.state.lock();

        if let Some(target) = state.target.clone() {
            // Left over from a flush that panicked
            let stragglers = !state.pending.is_empty();
            drop(state);
            if stragglers {
                Flush::new(&self.state, target.clone()).run();
            }
            return Dispatch::ready(operation(&target));
        }

        let (tx, rx) = channel();
        state.pending.push(Box::new(move |target: &T| {
            // The caller is free to stop waiting for the result
            let _ = tx.send(operation(target));
        }));

        Dispatch::pending(rx)
    }

    /// Submit an operation that produces a future, and wait for that future.
    ///
    /// The operation itself is submitted (and possibly invoked) before this
    /// method returns; only the wait is deferred to the returned future.
    pub fn submit_async<F, Fut>(
        &self,
        operation: F,
    ) -> impl Future<Output = Result<Fut::Output, DispatchError>> + ConditionalSend + use<T, F, Fut>
    where
        F: FnOnce(&T) -> Fut + ConditionalSend + 'static,
        Fut: Future + ConditionalSend + 'static,
    {
        let dispatch = self.submit(operation);
        async move { Ok::<_, DispatchError>(dispatch.await?.await) }
    }

    /// Supply the target and flush every buffered operation against it, in
    /// submission order.
    ///
    /// Returns `true` if the target was accepted. An absent target (`None`)
    /// is ignored and leaves buffered operations in place. Once a target has
    /// been accepted, further calls are ignored.
    ///
    /// A panicking operation still leaves the target published. The
    /// operations buffered after it run ahead of the next submission.
    pub fn set_target(&self, target: impl Into<Option<T>>) -> bool {
        let Some(target) = target.into() else {
            return false;
        };

        {
            let mut state = self.state.lock();
            if state.target.is_some() || state.flushing {
                tracing::debug!(target: LOG_TARGET, "Ignoring target, queue already has one");
                return false;
            }
            state.flushing = true;
        }

        Flush::new(&self.state, target).run();

        true
    }

    /// True once a target has been accepted and all buffered operations
    /// were flushed.
    pub fn is_ready(&self) -> bool {
        self.state.lock().target.is_some()
    }

    /// The number of buffered operations. Operations left behind by a flush
    /// that panicked count too, until the next submission runs them.
    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }
}

/// Drains the buffer against a target, then publishes the target.
///
/// Submissions made while draining land in `pending` and are drained by the
/// next round, so the target stays hidden until nothing is left. If an
/// operation panics, dropping the guard still publishes the target and puts
/// the rest of the batch back at the front of the buffer.
struct Flush<'a, T> {
    state: &'a SharedCell<State<T>>,
    target: Option<T>,
    batch: std::vec::IntoIter<Continuation<T>>,
}

impl<'a, T> Flush<'a, T> {
    fn new(state: &'a SharedCell<State<T>>, target: T) -> Self {
        Self {
            state,
            target: Some(target),
            batch: Vec::new().into_iter(),
        }
    }

    fn run(mut self) {
        loop {
            let Some(target) = self.target.as_ref() else {
                return;
            };
            for continuation in self.batch.by_ref() {
                continuation(target);
            }

            let mut state = self.state.lock();
            if state.pending.is_empty() {
                Self::publish(&mut state, self.target.take());
                return;
            }
            self.batch = std::mem::take(&mut state.pending).into_iter();
            drop(state);

            tracing::debug!(
                target: LOG_TARGET,
                count = self.batch.len(),
                "Dispatching queued operations"
            );
        }
    }

    fn publish(state: &mut State<T>, target: Option<T>) {
        if state.target.is_none() {
            state.target = target;
        }
        state.flushing = false;
    }
}

impl<T> Drop for Flush<'_, T> {
    fn drop(&mut self) {
        // A target is only left here when an operation panicked
        let Some(target) = self.target.take() else {
            return;
        };

        tracing::error!(target: LOG_TARGET, "Queued operation panicked during flush");

        let mut state = self.state.lock();
        let mut remaining: Vec<_> = self.batch.by_ref().collect();
        remaining.append(&mut state.pending);
        state.pending = remaining;
        Self::publish(&mut state, Some(target));
    }
}

impl<T> Default for DeferredQueue<T>
where
    T: Clone + ConditionalSend + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for DeferredQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DeferredQueue")
            .field("ready", &state.target.is_some())
            .field("pending", &state.pending.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[cfg(not(target_arch = "wasm32"))]
    use tokio::test as async_test;
    #[cfg(target_arch = "wasm32")]
    use wasm_bindgen_test::wasm_bindgen_test as async_test;

    #[derive(Clone, Debug, PartialEq)]
    struct Worker(&'static str);

    type Log = Arc<SharedCell<Vec<usize>>>;

    fn recorder(log: &Log, index: usize) -> impl FnOnce(&Worker) + ConditionalSend + 'static {
        let log = log.clone();
        move |_| log.lock().push(index)
    }

    #[async_test]
    async fn it_buffers_until_a_target_is_set() {
        let queue = DeferredQueue::<Worker>::new();
        let log = Log::default();

        queue.submit(recorder(&log, 1));
        queue.submit(recorder(&log, 2));
        queue.submit(recorder(&log, 3));

        assert!(log.lock().is_empty());
        assert_eq!(queue.pending(), 3);
        assert!(!queue.is_ready());

        assert!(queue.set_target(Worker("sw")));

        assert_eq!(*log.lock(), vec![1, 2, 3]);
        assert_eq!(queue.pending(), 0);
        assert!(queue.is_ready());
    }

    #[async_test]
    async fn it_runs_operations_immediately_once_ready() {
        let queue = DeferredQueue::<Worker>::new();
        let log = Log::default();
        queue.set_target(Worker("sw"));

        let dispatch = queue.submit(recorder(&log, 7));

        assert!(dispatch.is_immediate());
        assert_eq!(*log.lock(), vec![7]);
        assert_eq!(queue.pending(), 0);
    }

    #[async_test]
    async fn it_ignores_an_absent_target() {
        let queue = DeferredQueue::<Worker>::new();
        let log = Log::default();
        queue.submit(recorder(&log, 1));

        assert!(!queue.set_target(None));

        assert!(log.lock().is_empty());
        assert_eq!(queue.pending(), 1);
        assert!(!queue.is_ready());

        assert!(queue.set_target(Some(Worker("sw"))));
        assert_eq!(*log.lock(), vec![1]);
    }

    #[async_test]
    async fn it_keeps_the_first_target() {
        let queue = DeferredQueue::<Worker>::new();

        assert!(queue.set_target(Worker("first")));
        assert!(!queue.set_target(Worker("second")));

        let seen = queue.submit(|worker: &Worker| worker.clone()).await.unwrap();
        assert_eq!(seen, Worker("first"));
    }

    #[async_test]
    async fn it_resolves_buffered_results_with_the_target() {
        let queue = DeferredQueue::<Worker>::new();

        let first = queue.submit(|worker: &Worker| format!("{}:1", worker.0));
        let second = queue.submit(|worker: &Worker| format!("{}:2", worker.0));

        assert!(!first.is_immediate());
        queue.set_target(Worker("sw"));

        assert_eq!(first.await.unwrap(), "sw:1");
        assert_eq!(second.await.unwrap(), "sw:2");
    }

    #[async_test]
    async fn it_propagates_operation_failures_unchanged() {
        let queue = DeferredQueue::<Worker>::new();

        let failing = queue.submit(|_: &Worker| Err::<(), _>("postMessage failed"));
        queue.set_target(Worker("sw"));

        assert_eq!(failing.await.unwrap(), Err("postMessage failed"));
    }

    #[async_test]
    async fn it_flattens_asynchronous_operations() {
        let queue = DeferredQueue::<Worker>::new();

        let pending = queue.submit_async(|worker: &Worker| {
            let name = worker.0;
            async move { name.len() }
        });
        queue.set_target(Worker("worker"));

        assert_eq!(pending.await.unwrap(), 6);
    }

    #[async_test]
    async fn it_invokes_asynchronous_operations_at_submission() {
        let queue = DeferredQueue::<Worker>::new();
        let log = Log::default();
        queue.set_target(Worker("sw"));

        let recorded = log.clone();
        let pending = queue.submit_async(move |_: &Worker| {
            recorded.lock().push(1);
            async {}
        });

        assert_eq!(*log.lock(), vec![1]);
        pending.await.unwrap();
    }

    #[async_test]
    async fn it_flushes_submissions_made_during_a_flush_last() {
        let queue = Arc::new(DeferredQueue::<Worker>::new());
        let log = Log::default();

        let nested_queue = queue.clone();
        let nested_log = log.clone();
        queue.submit(move |_: &Worker| {
            nested_log.lock().push(1);
            nested_queue.submit(recorder(&nested_log, 3));
        });
        queue.submit(recorder(&log, 2));

        queue.set_target(Worker("sw"));

        assert_eq!(*log.lock(), vec![1, 2, 3]);
        assert_eq!(queue.pending(), 0);
    }

    #[async_test]
    async fn it_reports_abandoned_operations() {
        let queue = DeferredQueue::<Worker>::new();
        let pending = queue.submit(|_: &Worker| ());

        drop(queue);

        assert_eq!(pending.await, Err(DispatchError::Abandoned));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn it_publishes_the_target_when_an_operation_panics() {
        use futures_util::FutureExt;
        use std::panic::{AssertUnwindSafe, catch_unwind};

        let queue = DeferredQueue::<Worker>::new();
        let log = Log::default();

        queue.submit(recorder(&log, 1));
        queue.submit(|worker: &Worker| {
            if worker.0 == "sw" {
                panic!("operation failed");
            }
        });
        let after = queue.submit(recorder(&log, 2));

        let flushed = catch_unwind(AssertUnwindSafe(|| queue.set_target(Worker("sw"))));

        assert!(flushed.is_err());
        assert!(queue.is_ready());
        assert!(!queue.set_target(Worker("other")));
        assert_eq!(*log.lock(), vec![1]);
        assert_eq!(queue.pending(), 1);

        let later = queue.submit(recorder(&log, 3));

        assert!(later.is_immediate());
        assert_eq!(*log.lock(), vec![1, 2, 3]);
        assert_eq!(queue.pending(), 0);
        assert_eq!(after.now_or_never(), Some(Ok(())));
    }
}
