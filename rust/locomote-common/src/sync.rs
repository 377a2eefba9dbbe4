//! Cross-target bound compatability traits
//!
//! On `wasm32-unknown-unknown` targets the traits represent no bound at all.
//! On other targets they stand for `Send` or `Send + Sync`, so types built on
//! them can be handed to a multi-threaded runtime.

#[allow(missing_docs)]
#[cfg(not(target_arch = "wasm32"))]
pub trait ConditionalSend: Send {}

#[cfg(not(target_arch = "wasm32"))]
impl<S> ConditionalSend for S where S: Send {}

#[allow(missing_docs)]
#[cfg(not(target_arch = "wasm32"))]
pub trait ConditionalSync: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<S> ConditionalSync for S where S: Send + Sync {}

#[allow(missing_docs)]
#[cfg(target_arch = "wasm32")]
pub trait ConditionalSend {}

#[cfg(target_arch = "wasm32")]
impl<S> ConditionalSend for S {}

#[allow(missing_docs)]
#[cfg(target_arch = "wasm32")]
pub trait ConditionalSync {}

#[cfg(target_arch = "wasm32")]
impl<S> ConditionalSync for S {}

/// Platform-appropriate shared interior mutability cell.
///
/// - Native: `std::sync::Mutex`
/// - WASM: `std::cell::RefCell`
///
/// A mutex rather than a read-write lock, so that the cell is `Sync` as long
/// as its contents are `Send`. Boxed `FnOnce` continuations are `Send` but
/// never `Sync`.
///
/// # Example
/// ```
/// use locomote_common::SharedCell;
///
/// let cell = SharedCell::new(vec![1]);
/// cell.lock().push(2);
///
/// assert_eq!(*cell.lock(), vec![1, 2]);
/// ```
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct SharedCell<T>(std::sync::Mutex<T>);

#[cfg(not(target_arch = "wasm32"))]
impl<T> SharedCell<T> {
    /// Creates a new SharedCell with the given value
    pub fn new(value: T) -> Self {
        Self(std::sync::Mutex::new(value))
    }

    /// Acquires the lock, blocking until it can be acquired
    pub fn lock(&self) -> std::sync::MutexGuard<'_, T> {
        self.0.lock().expect("lock poisoned")
    }
}

#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default)]
pub struct SharedCell<T>(std::cell::RefCell<T>);

#[cfg(target_arch = "wasm32")]
impl<T> SharedCell<T> {
    /// Creates a new SharedCell with the given value
    pub fn new(value: T) -> Self {
        Self(std::cell::RefCell::new(value))
    }

    /// Borrows the value mutably
    ///
    /// # Panics
    /// Panics if the value is currently borrowed
    pub fn lock(&self) -> std::cell::RefMut<'_, T> {
        self.0.borrow_mut()
    }
}
