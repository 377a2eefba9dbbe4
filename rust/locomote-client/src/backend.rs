//! Platform seams of the client.
//!
//! The browser's service-worker API is modelled by three traits:
//!
//! - [`Container`]: registers workers and enumerates registrations
//!   (`navigator.serviceWorker`)
//! - [`Registration`]: a registered worker and its scope
//! - [`Worker`]: the active worker that messages are posted to
//!
//! [`Environment`] adds what the page itself knows: whether registration is
//! possible at all, and which worker script the page declares.
//!
//! The [`web`] implementations wrap `web-sys` on `wasm32-unknown-unknown`.
//! The [`memory`] implementations work everywhere and back the tests.

use async_trait::async_trait;
use locomote_common::{ConditionalSend, ConditionalSync};

use crate::{ClientError, Message, Settings};

pub mod memory;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
pub mod web;

/// A worker that can receive messages.
pub trait Worker: Clone + ConditionalSend + ConditionalSync + 'static {
    /// Post a message to the worker. Delivery is fire-and-forget; an error
    /// means the message could not be handed over at all.
    fn post_message(&self, message: &Message) -> Result<(), ClientError>;
}

/// A service worker registration.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait Registration: ConditionalSend + ConditionalSync + 'static {
    /// The worker type of this registration
    type Worker: Worker;

    /// The URL prefix the registered worker is responsible for
    fn scope(&self) -> String;

    /// The active worker, if the registration has one yet
    fn active(&self) -> Option<Self::Worker>;

    /// Unregister. Resolves to whether a registration was actually removed.
    async fn unregister(&self) -> Result<bool, ClientError>;
}

/// The platform's service worker registry.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait Container: Clone + ConditionalSend + ConditionalSync + 'static {
    /// The worker type handed out by registrations
    type Worker: Worker;
    /// The registration record type
    type Registration: Registration<Worker = Self::Worker>;

    /// Register the worker script at `script_url`
    async fn register(&self, script_url: &str) -> Result<Self::Registration, ClientError>;

    /// All current registrations visible to the page
    async fn registrations(&self) -> Result<Vec<Self::Registration>, ClientError>;
}

/// The page the client runs in.
pub trait Environment {
    /// The registry type available in this environment
    type Container: Container;

    /// The service worker registry, or `None` if the environment has no
    /// service worker support.
    fn service_workers(&self) -> Option<Self::Container>;

    /// The worker script URL declared by the page.
    ///
    /// A `<link>` whose `rel` contains [`Settings::link_relation`] wins over a
    /// `<meta>` named [`Settings::meta_name`].
    fn declared_worker_url(&self, settings: &Settings) -> Option<String>;
}
