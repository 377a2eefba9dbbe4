//! Browser implementations backed by `web-sys`.
//!
//! The only raw `js_sys` reflection is the capability probe for
//! `navigator.serviceWorker`, which `web-sys` exposes unconditionally.

use async_trait::async_trait;
use js_sys::{Array, JSON, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    HtmlLinkElement, ServiceWorker, ServiceWorkerContainer, ServiceWorkerRegistration, Window,
};

use super::{Container, Environment, Registration, Worker};
use crate::{ClientError, Message, Settings};

fn describe(error: JsValue) -> String {
    format!("{error:?}")
}

impl Message {
    /// Convert to the plain JS object posted to the worker.
    pub fn to_js(&self) -> Result<JsValue, ClientError> {
        JSON::parse(&self.to_json()?).map_err(|error| ClientError::InvalidMessage(describe(error)))
    }

    /// Read a message from a plain JS object.
    pub fn from_js(value: &JsValue) -> Result<Self, ClientError> {
        let json: String = JSON::stringify(value)
            .map_err(|error| ClientError::InvalidMessage(describe(error)))?
            .into();
        Self::from_json(&json)
    }
}

/// An active `ServiceWorker`.
#[derive(Clone, Debug)]
pub struct WebWorker(ServiceWorker);

impl Worker for WebWorker {
    fn post_message(&self, message: &Message) -> Result<(), ClientError> {
        self.0
            .post_message(&message.to_js()?)
            .map_err(|error| ClientError::Message(describe(error)))
    }
}

/// A `ServiceWorkerRegistration`.
#[derive(Clone, Debug)]
pub struct WebRegistration(ServiceWorkerRegistration);

impl WebRegistration {
    /// The underlying registration object
    pub fn as_js(&self) -> &ServiceWorkerRegistration {
        &self.0
    }
}

#[async_trait(?Send)]
impl Registration for WebRegistration {
    type Worker = WebWorker;

    fn scope(&self) -> String {
        self.0.scope()
    }

    fn active(&self) -> Option<WebWorker> {
        self.0.active().map(WebWorker)
    }

    async fn unregister(&self) -> Result<bool, ClientError> {
        let failed = |error| ClientError::Unregister {
            scope: self.scope(),
            reason: describe(error),
        };

        let promise = self.0.unregister().map_err(failed)?;
        let removed = JsFuture::from(promise).await.map_err(failed)?;

        Ok(removed.as_bool().unwrap_or(false))
    }
}

/// `navigator.serviceWorker`.
#[derive(Clone, Debug)]
pub struct WebContainer(ServiceWorkerContainer);

#[async_trait(?Send)]
impl Container for WebContainer {
    type Worker = WebWorker;
    type Registration = WebRegistration;

    async fn register(&self, script_url: &str) -> Result<WebRegistration, ClientError> {
        let registration = JsFuture::from(self.0.register(script_url))
            .await
            .map_err(|error| ClientError::Registration {
                url: script_url.to_string(),
                reason: describe(error),
            })?;

        Ok(WebRegistration(registration.unchecked_into()))
    }

    async fn registrations(&self) -> Result<Vec<WebRegistration>, ClientError> {
        let registrations = JsFuture::from(self.0.get_registrations())
            .await
            .map_err(|error| ClientError::Registrations(describe(error)))?;
        let registrations: Array = registrations.unchecked_into();

        Ok(registrations
            .iter()
            .map(|registration| WebRegistration(registration.unchecked_into()))
            .collect())
    }
}

/// The current browser page.
#[derive(Clone, Debug)]
pub struct Page {
    window: Window,
}

impl Page {
    /// The page of the current window, if there is one.
    pub fn current() -> Option<Self> {
        web_sys::window().map(|window| Self { window })
    }

    fn declared_link(&self, relation: &str) -> Option<String> {
        let document = self.window.document()?;
        let link = document
            .query_selector(&format!("head link[rel~=\"{relation}\"]"))
            .ok()??
            .dyn_into::<HtmlLinkElement>()
            .ok()?;

        // `href` is already resolved against the document URL
        Some(link.href()).filter(|href| !href.is_empty())
    }

    fn declared_meta(&self, name: &str) -> Option<String> {
        let document = self.window.document()?;
        document
            .query_selector(&format!("head meta[name=\"{name}\"]"))
            .ok()??
            .get_attribute("content")
            .filter(|content| !content.is_empty())
    }
}

impl Environment for Page {
    type Container = WebContainer;

    fn service_workers(&self) -> Option<WebContainer> {
        let navigator = self.window.navigator();
        let supported =
            Reflect::has(&navigator, &JsValue::from_str("serviceWorker")).unwrap_or(false);

        supported.then(|| WebContainer(navigator.service_worker()))
    }

    fn declared_worker_url(&self, settings: &Settings) -> Option<String> {
        self.declared_link(&settings.link_relation)
            .or_else(|| self.declared_meta(&settings.meta_name))
    }
}
