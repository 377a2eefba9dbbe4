//! The JS surface of the client.
//!
//! ```js
//! import init, { Locomote } from "./locomote_client.js";
//!
//! await init();
//! const locomote = new Locomote();
//! window.addEventListener("load", () => locomote.start());
//!
//! locomote.refresh("/content", 15);
//! const scopes = await locomote.list();
//! ```

use js_sys::{Array, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::backend::web::{Page, WebContainer};
use crate::scheduler::WindowScheduler;
use crate::{Client, ClientError, ListInfo, Listing, Message, Refresh, Settings, logging};

type WebClient = Client<WebContainer, WindowScheduler>;

/// Page-facing handle to the Locomote service worker.
#[wasm_bindgen]
pub struct Locomote {
    page: Option<Page>,
    client: Option<WebClient>,
}

#[wasm_bindgen]
impl Locomote {
    /// Create the client. `settings` is an optional JSON object; see
    /// [`Settings`] for the recognised fields.
    #[wasm_bindgen(constructor)]
    pub fn new(settings: Option<String>) -> Result<Locomote, JsValue> {
        console_error_panic_hook::set_once();
        logging::init();

        let settings = match settings {
            Some(json) => Settings::from_json(&json)?,
            None => Settings::default(),
        };

        let page = Page::current();
        let client = page
            .as_ref()
            .and_then(|page| Client::connect(page, WindowScheduler, settings).ok());

        Ok(Self { page, client })
    }

    /// Register the declared worker. Resolves to the start-up outcome:
    /// `"unsupported"`, `"undeclared"`, `"registered"`, `"installing"` or
    /// `"failed"`.
    pub fn start(&self) -> Promise {
        let (Some(page), Some(client)) = (self.page.clone(), self.client.clone()) else {
            tracing::info!(target: locomote_common::LOG_TARGET, "Service workers not supported");
            return Promise::resolve(&JsValue::from_str("unsupported"));
        };

        future_to_promise(async move {
            let startup = client.start(&page).await;
            Ok(JsValue::from_str(startup.as_str()))
        })
    }

    /// List registrations: scope URLs for `"scopes"` (the default), the
    /// `ServiceWorkerRegistration` objects for anything else.
    pub fn list(&self, info: Option<String>) -> Result<Promise, JsValue> {
        let info = info.as_deref().map(ListInfo::from).unwrap_or_default();
        let listing = self.client()?.list(info);

        Ok(future_to_promise(async move {
            let entries: Array = match listing.await? {
                Listing::Scopes(scopes) => scopes.into_iter().map(JsValue::from).collect(),
                Listing::Registrations(registrations) => registrations
                    .iter()
                    .map(|registration| JsValue::from(registration.as_js().clone()))
                    .collect(),
            };
            Ok(entries.into())
        }))
    }

    /// Always rejects; installation status is not tracked.
    #[wasm_bindgen(js_name = isInstalled)]
    pub fn is_installed(&self) -> Result<bool, JsValue> {
        Ok(self.client()?.is_installed()?)
    }

    /// Refresh `origin` (default `"*"`). With a positive `interval` in
    /// minutes, returns the id of the repeating timer instead.
    pub fn refresh(
        &self,
        origin: Option<String>,
        interval: Option<u32>,
    ) -> Result<JsValue, JsValue> {
        let client = self.client()?;
        let origin = origin.unwrap_or_else(|| client.settings().default_origin.clone());

        Ok(match client.refresh(origin, interval.unwrap_or(0))? {
            Refresh::Posted(posted) => future_to_promise(async move {
                posted.await?;
                Ok(JsValue::UNDEFINED)
            })
            .into(),
            Refresh::Scheduled(interval) => JsValue::from(interval.forget()),
        })
    }

    /// Refresh the worker's statically cached content.
    #[wasm_bindgen(js_name = refreshStatics)]
    pub fn refresh_statics(&self) -> Result<Promise, JsValue> {
        let posted = self.client()?.refresh_statics();
        Ok(future_to_promise(async move {
            posted.await?;
            Ok(JsValue::UNDEFINED)
        }))
    }

    /// Post a `{ name, args }` message to the worker.
    pub fn post(&self, message: JsValue) -> Result<Promise, JsValue> {
        let message = Message::from_js(&message)?;
        let posted = self.client()?.post(message);
        Ok(future_to_promise(async move {
            posted.await?;
            Ok(JsValue::UNDEFINED)
        }))
    }

    /// Unregister the workers whose scope is listed in `scopes`, or all of
    /// them when `scopes` is missing or empty. Resolves to the number
    /// unregistered.
    pub fn unregister(&self, scopes: Option<Vec<String>>) -> Result<Promise, JsValue> {
        let unregistered = self.client()?.unregister(scopes.unwrap_or_default());
        Ok(future_to_promise(async move {
            let count = unregistered.await?;
            Ok(JsValue::from(count as u32))
        }))
    }
}

impl Locomote {
    fn client(&self) -> Result<&WebClient, ClientError> {
        self.client.as_ref().ok_or(ClientError::Unsupported)
    }
}
