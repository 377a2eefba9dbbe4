//! In-memory service worker registry for testing and native hosts

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use locomote_common::SharedCell;

use super::{Container, Environment, Registration, Worker};
use crate::{ClientError, Message, Settings};

#[derive(Default)]
struct RegistryState {
    registrations: Vec<MemoryRegistration>,
    registration_failure: Option<String>,
    query_failure: Option<String>,
    activate: bool,
}

/// In-memory service worker registry.
///
/// Clones share the same registry, so a test can keep one handle to inspect
/// what a client did with another.
///
/// # Examples
///
/// ```
/// use locomote_client::backend::{Container, Worker, memory::MemoryContainer};
/// use locomote_client::Message;
///
/// # async fn example() -> Result<(), locomote_client::ClientError> {
/// let container = MemoryContainer::new();
/// let worker = container.install("/app/");
///
/// worker.post_message(&Message::refresh_statics())?;
///
/// assert_eq!(container.registrations().await?.len(), 1);
/// assert_eq!(worker.messages(), vec![Message::refresh_statics()]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MemoryContainer {
    state: Arc<SharedCell<RegistryState>>,
}

impl MemoryContainer {
    /// Create an empty registry whose registrations activate immediately
    pub fn new() -> Self {
        Self {
            state: Arc::new(SharedCell::new(RegistryState {
                activate: true,
                ..Default::default()
            })),
        }
    }

    /// Add an active registration for `scope` without going through
    /// [`Container::register`], returning its worker
    pub fn install(&self, scope: &str) -> MemoryWorker {
        let worker = MemoryWorker::new(format!("{scope}sw.js"));
        self.insert(MemoryRegistration {
            scope: scope.to_string(),
            active: Some(worker.clone()),
            registry: Arc::downgrade(&self.state),
        });
        worker
    }

    /// Leave future registrations without an active worker
    pub fn defer_activation(&self) {
        self.state.lock().activate = false;
    }

    /// Make every future [`Container::register`] call fail with `reason`
    pub fn fail_registrations(&self, reason: impl Into<String>) {
        self.state.lock().registration_failure = Some(reason.into());
    }

    /// Make every future [`Container::registrations`] call fail with `reason`
    pub fn fail_queries(&self, reason: impl Into<String>) {
        self.state.lock().query_failure = Some(reason.into());
    }

    /// The scopes currently registered, in registration order
    pub fn scopes(&self) -> Vec<String> {
        self.state
            .lock()
            .registrations
            .iter()
            .map(|registration| registration.scope.clone())
            .collect()
    }

    fn insert(&self, registration: MemoryRegistration) {
        let mut state = self.state.lock();
        state
            .registrations
            .retain(|existing| existing.scope != registration.scope);
        state.registrations.push(registration);
    }

    fn remove(&self, scope: &str) -> bool {
        let mut state = self.state.lock();
        let before = state.registrations.len();
        state
            .registrations
            .retain(|registration| registration.scope != scope);
        state.registrations.len() != before
    }
}

impl Default for MemoryContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryContainer")
            .field("scopes", &self.scopes())
            .finish()
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl Container for MemoryContainer {
    type Worker = MemoryWorker;
    type Registration = MemoryRegistration;

    async fn register(&self, script_url: &str) -> Result<MemoryRegistration, ClientError> {
        let activate = {
            let state = self.state.lock();
            if let Some(reason) = &state.registration_failure {
                return Err(ClientError::Registration {
                    url: script_url.to_string(),
                    reason: reason.clone(),
                });
            }
            state.activate
        };

        // A worker controls the directory its script is served from
        let scope = match script_url.rfind('/') {
            Some(index) => script_url[..=index].to_string(),
            None => "/".to_string(),
        };

        let registration = MemoryRegistration {
            scope,
            active: activate.then(|| MemoryWorker::new(script_url)),
            registry: Arc::downgrade(&self.state),
        };
        self.insert(registration.clone());

        Ok(registration)
    }

    async fn registrations(&self) -> Result<Vec<MemoryRegistration>, ClientError> {
        let state = self.state.lock();
        match &state.query_failure {
            Some(reason) => Err(ClientError::Registrations(reason.clone())),
            None => Ok(state.registrations.clone()),
        }
    }
}

/// A registration held by a [`MemoryContainer`].
#[derive(Clone)]
pub struct MemoryRegistration {
    scope: String,
    active: Option<MemoryWorker>,
    registry: Weak<SharedCell<RegistryState>>,
}

impl PartialEq for MemoryRegistration {
    fn eq(&self, other: &Self) -> bool {
        self.scope == other.scope && self.active == other.active
    }
}

impl std::fmt::Debug for MemoryRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRegistration")
            .field("scope", &self.scope)
            .field("active", &self.active)
            .finish()
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl Registration for MemoryRegistration {
    type Worker = MemoryWorker;

    fn scope(&self) -> String {
        self.scope.clone()
    }

    fn active(&self) -> Option<MemoryWorker> {
        self.active.clone()
    }

    async fn unregister(&self) -> Result<bool, ClientError> {
        Ok(match self.registry.upgrade() {
            Some(state) => MemoryContainer { state }.remove(&self.scope),
            None => false,
        })
    }
}

#[derive(Default)]
struct Inbox {
    messages: Vec<Message>,
    failure: Option<String>,
}

/// A worker that records the messages posted to it.
#[derive(Clone)]
pub struct MemoryWorker {
    script_url: String,
    inbox: Arc<SharedCell<Inbox>>,
}

impl MemoryWorker {
    /// Create a worker for the given script
    pub fn new(script_url: impl Into<String>) -> Self {
        Self {
            script_url: script_url.into(),
            inbox: Arc::default(),
        }
    }

    /// The script this worker runs
    pub fn script_url(&self) -> &str {
        &self.script_url
    }

    /// Every message posted so far, oldest first
    pub fn messages(&self) -> Vec<Message> {
        self.inbox.lock().messages.clone()
    }

    /// Make every future post fail with `reason`
    pub fn fail_messages(&self, reason: impl Into<String>) {
        self.inbox.lock().failure = Some(reason.into());
    }
}

impl PartialEq for MemoryWorker {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inbox, &other.inbox)
    }
}

impl std::fmt::Debug for MemoryWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryWorker")
            .field("script_url", &self.script_url)
            .finish()
    }
}

impl Worker for MemoryWorker {
    fn post_message(&self, message: &Message) -> Result<(), ClientError> {
        let mut inbox = self.inbox.lock();
        if let Some(reason) = &inbox.failure {
            return Err(ClientError::Message(reason.clone()));
        }
        inbox.messages.push(message.clone());
        Ok(())
    }
}

/// A page description for driving the client's start-up outside a browser.
#[derive(Clone, Debug, Default)]
pub struct MemoryPage {
    container: Option<MemoryContainer>,
    links: Vec<(String, String)>,
    metas: Vec<(String, String)>,
}

impl MemoryPage {
    /// A page with service worker support backed by `container`
    pub fn new(container: MemoryContainer) -> Self {
        Self {
            container: Some(container),
            ..Default::default()
        }
    }

    /// A page without service worker support
    pub fn unsupported() -> Self {
        Self::default()
    }

    /// Declare `<link rel="{rel}" href="{href}">`
    pub fn with_link(mut self, rel: impl Into<String>, href: impl Into<String>) -> Self {
        self.links.push((rel.into(), href.into()));
        self
    }

    /// Declare `<meta name="{name}" content="{content}">`
    pub fn with_meta(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.metas.push((name.into(), content.into()));
        self
    }
}

impl Environment for MemoryPage {
    type Container = MemoryContainer;

    fn service_workers(&self) -> Option<MemoryContainer> {
        self.container.clone()
    }

    fn declared_worker_url(&self, settings: &Settings) -> Option<String> {
        let link = self
            .links
            .iter()
            .find(|(rel, _)| {
                rel.split_whitespace()
                    .any(|token| token == settings.link_relation)
            })
            .map(|(_, href)| href);

        let meta = || {
            self.metas
                .iter()
                .find(|(name, _)| *name == settings.meta_name)
                .map(|(_, content)| content)
        };

        link.or_else(meta)
            .filter(|url| !url.is_empty())
            .cloned()
    }
}
