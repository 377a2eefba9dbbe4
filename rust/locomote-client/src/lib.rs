//! Browser client for the Locomote service worker.
//!
//! `locomote-client` registers the service worker a page declares, queues
//! outbound operations until that worker is active, and offers a handful of
//! helpers on top: refreshing content origins, listing registrations and
//! unregistering them.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Page                                                      │
//! │                                                           │
//! │  refresh / post / list / unregister                       │
//! │        │                                                  │
//! │        ▼                                                  │
//! │  DeferredQueue ──(buffered until start() finds an         │
//! │        │          active worker, then flushed in order)   │
//! │        ▼                                                  │
//! │  Worker.postMessage / Container.getRegistrations          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The browser API is reached through the traits in [`backend`], so the same
//! [`Client`] runs against `web-sys` in the browser and against the
//! in-memory registry in [`backend::memory`] everywhere else.
//!
//! # Modules
//!
//! - **[`client`]**: the [`Client`] and its operations
//! - **[`backend`]**: container, registration and worker seams
//! - **[`scheduler`]**: repeating timers for periodic refreshes
//! - **[`message`]**: the `{ name, args }` messages sent to the worker
//! - **[`settings`]**: client configuration
//! - **[`logging`]**: log output for native hosts and the browser console
//!
//! On `wasm32-unknown-unknown` the crate also exports the `Locomote` class to
//! JS. The class does not start itself; a page that wants the drop-in
//! behaviour creates it once and starts it on load:
//!
//! ```js
//! import init, { Locomote } from "./locomote_client.js";
//!
//! await init();
//! window.locomote = new Locomote(JSON.stringify({ defaultOrigin: "*" }));
//!
//! if (document.readyState === "complete") {
//!     window.locomote.start();
//! } else {
//!     window.addEventListener("load", () => window.locomote.start());
//! }
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod client;
pub mod logging;
pub mod message;
pub mod scheduler;
pub mod settings;

mod error;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
mod bindings;

pub use client::*;
pub use error::*;
pub use message::*;
pub use settings::*;

#[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
pub use bindings::Locomote;
