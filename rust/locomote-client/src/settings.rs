//! Client configuration.

use serde::{Deserialize, Serialize};

use crate::ClientError;

/// Client configuration.
///
/// Every field has a default, so a partial JSON object is enough:
///
/// ```
/// # use locomote_client::Settings;
/// let settings = Settings::from_json(r#"{ "refreshOnStart": false }"#).unwrap();
///
/// assert!(!settings.refresh_on_start);
/// assert_eq!(settings.link_relation, "locomote-service-worker");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// `rel` token of the `<link>` declaring the worker script URL
    pub link_relation: String,
    /// `name` of the `<meta>` declaring the worker script URL, consulted when
    /// no link is present
    pub meta_name: String,
    /// Origin refreshed on start and when callers don't name one
    pub default_origin: String,
    /// Whether starting the client requests an initial refresh
    pub refresh_on_start: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            link_relation: "locomote-service-worker".into(),
            meta_name: "locomote-service-worker-url".into(),
            default_origin: "*".into(),
            refresh_on_start: true,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON object, defaulting missing fields.
    pub fn from_json(json: &str) -> Result<Self, ClientError> {
        serde_json::from_str(json).map_err(|error| ClientError::Settings(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_arch = "wasm32")]
    use wasm_bindgen_test::wasm_bindgen_test;

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), test)]
    fn it_defaults_an_empty_object() {
        assert_eq!(Settings::from_json("{}"), Ok(Settings::default()));
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), test)]
    fn it_rejects_malformed_settings() {
        assert!(matches!(
            Settings::from_json(r#"{ "defaultOrigin": 5 }"#),
            Err(ClientError::Settings(_))
        ));
    }
}
