use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use thiserror::Error;
use tokio::sync::oneshot::Receiver;

/// Errors observed while waiting on a [`Dispatch`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// The queue was dropped before a target was ever supplied, so the
    /// operation will never run.
    #[error("Deferred operation was abandoned before a target became available")]
    Abandoned,
}

/// The result of submitting an operation to a
/// [`DeferredQueue`](crate::DeferredQueue).
///
/// A dispatch is either already resolved (the operation ran synchronously
/// against an available target) or pending until the target is set. Dropping
/// a dispatch does not cancel the operation.
pub struct Dispatch<R>(Inner<R>);

enum Inner<R> {
    Ready(Option<R>),
    Pending(Receiver<R>),
}

impl<R> Dispatch<R> {
    pub(crate) fn ready(value: R) -> Self {
        Self(Inner::Ready(Some(value)))
    }

    pub(crate) fn pending(receiver: Receiver<R>) -> Self {
        Self(Inner::Pending(receiver))
    }

    /// True if the operation already ran when it was submitted.
    pub fn is_immediate(&self) -> bool {
        matches!(self.0, Inner::Ready(_))
    }
}

// The value is never pinned in place; it is moved out on completion.
impl<R> Unpin for Dispatch<R> {}

impl<R> Future for Dispatch<R> {
    type Output = Result<R, DispatchError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().0 {
            Inner::Ready(value) => Poll::Ready(Ok(value
                .take()
                .expect("Dispatch polled after completion"))),
            Inner::Pending(receiver) => Pin::new(receiver)
                .poll(cx)
                .map_err(|_| DispatchError::Abandoned),
        }
    }
}

impl<R> std::fmt::Debug for Dispatch<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatch")
            .field("immediate", &self.is_immediate())
            .finish()
    }
}
