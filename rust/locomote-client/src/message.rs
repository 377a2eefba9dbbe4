//! Messages posted to the service worker.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ClientError;

/// A message posted to the service worker.
///
/// On the wire this is `{ name: string, args?: any }`; `args` is left out
/// entirely when there are none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// What the worker is asked to do
    pub name: String,
    /// Operation arguments, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
}

impl Message {
    /// Asks the worker to refresh a content origin (or `*` for all of them)
    pub const REFRESH: &'static str = "refresh";
    /// Asks the worker to refresh its statically cached content
    pub const REFRESH_STATICS: &'static str = "refresh-statics";

    /// A message without arguments
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: None,
        }
    }

    /// Attach arguments, replacing any already present
    pub fn with_args(mut self, args: impl Into<Value>) -> Self {
        self.args = Some(args.into());
        self
    }

    /// `{ name: "refresh", args: origin }`
    pub fn refresh(origin: impl Into<String>) -> Self {
        Self::new(Self::REFRESH).with_args(origin.into())
    }

    /// `{ name: "refresh-statics" }`
    pub fn refresh_statics() -> Self {
        Self::new(Self::REFRESH_STATICS)
    }

    /// Encode as JSON
    pub fn to_json(&self) -> Result<String, ClientError> {
        serde_json::to_string(self).map_err(|error| ClientError::InvalidMessage(error.to_string()))
    }

    /// Decode from JSON. `args` may be missing.
    pub fn from_json(json: &str) -> Result<Self, ClientError> {
        serde_json::from_str(json).map_err(|error| ClientError::InvalidMessage(error.to_string()))
    }
}
