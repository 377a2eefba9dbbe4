#![warn(missing_docs)]

//! A deferred-dispatch queue.
//!
//! [`DeferredQueue`] holds operations that need a target (for example the
//! active service worker of a page) which does not exist yet. Operations
//! submitted before the target arrives are buffered in submission order and
//! each of them is handed the target exactly once when
//! [`DeferredQueue::set_target`] is called. From then on operations run
//! immediately.
//!
//! ```
//! # use locomote_queue::DeferredQueue;
//! # futures_util::FutureExt::now_or_never(async {
//! let queue = DeferredQueue::<String>::new();
//!
//! let greeting = queue.submit(|name: &String| format!("hello {name}"));
//! assert_eq!(queue.pending(), 1);
//!
//! queue.set_target("worker".to_string());
//! assert_eq!(greeting.await?, "hello worker");
//! # Ok::<_, locomote_queue::DispatchError>(())
//! # }).unwrap().unwrap();
//! ```

mod dispatch;
pub use dispatch::*;

mod queue;
pub use queue::*;
