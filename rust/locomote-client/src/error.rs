use locomote_queue::DispatchError;
use thiserror::Error;

/// Errors produced by the locomote client.
///
/// Registration problems are also reported through
/// [`Startup`](crate::Startup); everything else surfaces from the operation
/// that failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The environment cannot register service workers
    #[error("Service workers are not supported in this environment")]
    Unsupported,

    /// The platform rejected the worker registration
    #[error("Failed to register service worker at {url}: {reason}")]
    Registration {
        /// The worker script URL
        url: String,
        /// What the platform reported
        reason: String,
    },

    /// Posting a message to the active worker failed
    #[error("Failed to post message to service worker: {0}")]
    Message(String),

    /// The message could not be converted to or from its wire form
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Querying the current registrations failed
    #[error("Failed to query service worker registrations: {0}")]
    Registrations(String),

    /// Unregistering a worker failed
    #[error("Failed to unregister service worker at {scope}: {reason}")]
    Unregister {
        /// Scope of the registration
        scope: String,
        /// What the platform reported
        reason: String,
    },

    /// A repeating refresh could not be scheduled
    #[error("Failed to schedule refresh: {0}")]
    Schedule(String),

    /// Settings could not be parsed
    #[error("Invalid settings: {0}")]
    Settings(String),

    /// The operation exists in the public surface but has no implementation
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    /// The client was dropped before the operation could run
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
impl From<ClientError> for wasm_bindgen::JsValue {
    fn from(error: ClientError) -> Self {
        js_sys::Error::new(&error.to_string()).into()
    }
}
