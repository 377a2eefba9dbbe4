#![warn(missing_docs)]

//! Light weight helpers shared by the locomote crates. They let the same code
//! compile for `wasm32-unknown-unknown`, where everything lives on a single
//! thread, and for native targets, where values may cross threads.

mod sync;
pub use sync::*;

/// The `tracing` target every locomote crate logs under.
pub const LOG_TARGET: &str = "locomote";
