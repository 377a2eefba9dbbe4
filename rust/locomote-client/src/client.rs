//! The client and the outcomes of its operations.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use locomote_common::{ConditionalSend, LOG_TARGET};
use locomote_queue::{DeferredQueue, Dispatch};

use crate::backend::{Container, Environment, Registration, Worker};
use crate::scheduler::{Scheduler, minutes};
use crate::{ClientError, Message, Settings};

/// Talks to the Locomote service worker of a page.
///
/// Every operation goes through a deferred-dispatch queue: until
/// [`Client::start`] finds an active worker, operations are buffered in call
/// order, and they run the moment the worker arrives. Clones share the same
/// queue.
pub struct Client<C, S>
where
    C: Container,
{
    container: C,
    scheduler: S,
    settings: Arc<Settings>,
    queue: Arc<DeferredQueue<C::Worker>>,
}

impl<C, S> Clone for Client<C, S>
where
    C: Container,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            container: self.container.clone(),
            scheduler: self.scheduler.clone(),
            settings: self.settings.clone(),
            queue: self.queue.clone(),
        }
    }
}

impl<C, S> std::fmt::Debug for Client<C, S>
where
    C: Container,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("settings", &self.settings)
            .field("queue", &self.queue)
            .finish()
    }
}

/// How [`Client::start`] went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Startup {
    /// The environment cannot register service workers
    Unsupported,
    /// The page does not declare a worker script
    Undeclared,
    /// The worker was registered. If it was not `active` yet, operations
    /// stay queued.
    Registered {
        /// Whether the registration had an active worker
        active: bool,
    },
    /// Registration failed; operations stay queued
    Failed(ClientError),
}

impl Startup {
    /// The outcome as reported to JS
    pub fn as_str(&self) -> &'static str {
        match self {
            Startup::Unsupported => "unsupported",
            Startup::Undeclared => "undeclared",
            Startup::Registered { active: true } => "registered",
            Startup::Registered { active: false } => "installing",
            Startup::Failed(_) => "failed",
        }
    }
}

/// What [`Client::list`] reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListInfo {
    /// Only the scope URLs
    #[default]
    Scopes,
    /// The registration records themselves
    All,
}

impl From<&str> for ListInfo {
    fn from(info: &str) -> Self {
        match info {
            "scopes" => ListInfo::Scopes,
            _ => ListInfo::All,
        }
    }
}

/// The registrations reported by [`Client::list`].
#[derive(Debug, Clone, PartialEq)]
pub enum Listing<R> {
    /// Scope URLs, in registration order
    Scopes(Vec<String>),
    /// The registration records
    Registrations(Vec<R>),
}

/// The outcome of [`Client::refresh`].
#[derive(Debug)]
pub enum Refresh<I> {
    /// A refresh message was submitted
    Posted(Posted),
    /// A repeating refresh was scheduled; nothing was submitted yet
    Scheduled(I),
}

/// A message submitted by [`Client::post`]. Resolves once the message was
/// handed to the worker.
///
/// The message is submitted whether or not this future is polled.
#[derive(Debug)]
pub struct Posted(Dispatch<Result<(), ClientError>>);

impl Future for Posted {
    type Output = Result<(), ClientError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.get_mut().0).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(error)) => Poll::Ready(Err(error.into())),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<C, S> Client<C, S>
where
    C: Container,
    S: Scheduler,
{
    /// Build a client on an existing container. Nothing is registered until
    /// [`Client::start`].
    pub fn new(container: C, scheduler: S, settings: Settings) -> Self {
        Self {
            container,
            scheduler,
            settings: Arc::new(settings),
            queue: Arc::new(DeferredQueue::new()),
        }
    }

    /// Build a client for the service workers of `environment`.
    pub fn connect<E>(
        environment: &E,
        scheduler: S,
        settings: Settings,
    ) -> Result<Self, ClientError>
    where
        E: Environment<Container = C>,
    {
        let container = environment
            .service_workers()
            .ok_or(ClientError::Unsupported)?;
        Ok(Self::new(container, scheduler, settings))
    }

    /// The settings the client was built with
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// True once an active worker receives operations directly.
    pub fn is_ready(&self) -> bool {
        self.queue.is_ready()
    }

    /// Register the worker declared by `environment` and, once it is active,
    /// flush every queued operation to it.
    ///
    /// Nothing here is fatal: problems are logged and reported through the
    /// returned [`Startup`]. The initial refresh (see
    /// [`Settings::refresh_on_start`]) is queued before registration is
    /// awaited, so it is delivered as soon as a worker becomes active.
    pub async fn start<E>(&self, environment: &E) -> Startup
    where
        E: Environment<Container = C>,
    {
        if environment.service_workers().is_none() {
            tracing::info!(target: LOG_TARGET, "Service workers not supported");
            return Startup::Unsupported;
        }

        let Some(url) = environment.declared_worker_url(&self.settings) else {
            tracing::debug!(target: LOG_TARGET, "Service worker link not found");
            return Startup::Undeclared;
        };

        tracing::debug!(target: LOG_TARGET, %url, "Registering service worker");
        let registration = self.container.register(&url);

        if self.settings.refresh_on_start {
            let _ = self.refresh_once(self.settings.default_origin.clone());
        }

        match registration.await {
            Ok(registration) => match registration.active() {
                Some(worker) => {
                    tracing::info!(
                        target: LOG_TARGET,
                        scope = %registration.scope(),
                        "Service worker registered"
                    );
                    self.queue.set_target(worker);
                    Startup::Registered { active: true }
                }
                None => {
                    tracing::debug!(
                        target: LOG_TARGET,
                        scope = %registration.scope(),
                        "Service worker registered but not active yet"
                    );
                    Startup::Registered { active: false }
                }
            },
            Err(error) => {
                tracing::error!(target: LOG_TARGET, %error, "Failed to register service worker");
                Startup::Failed(error)
            }
        }
    }

    /// Ask the worker to refresh a content origin, or every origin it knows
    /// with `*`.
    ///
    /// With `interval_minutes` of zero a single refresh message is posted.
    /// Otherwise nothing is posted now; instead a refresh is posted every
    /// `interval_minutes` until the returned interval is cancelled.
    pub fn refresh(
        &self,
        origin: impl Into<String>,
        interval_minutes: u32,
    ) -> Result<Refresh<S::Interval>, ClientError> {
        let origin = origin.into();

        if interval_minutes == 0 {
            return Ok(Refresh::Posted(self.refresh_once(origin)));
        }

        tracing::debug!(
            target: LOG_TARGET,
            %origin,
            interval_minutes,
            "Scheduling repeating refresh"
        );

        let client = self.clone();
        let interval = self.scheduler.every(minutes(interval_minutes), move || {
            let _ = client.refresh_once(origin.clone());
        })?;

        Ok(Refresh::Scheduled(interval))
    }

    /// Ask the worker to refresh its statically cached content.
    pub fn refresh_statics(&self) -> Posted {
        self.post(Message::refresh_statics())
    }

    /// Post a message to the active worker, or queue it until there is one.
    pub fn post(&self, message: Message) -> Posted {
        tracing::debug!(target: LOG_TARGET, name = %message.name, "Posting message");
        Posted(
            self.queue
                .submit(move |worker: &C::Worker| worker.post_message(&message)),
        )
    }

    /// List the current service worker registrations.
    pub fn list(
        &self,
        info: ListInfo,
    ) -> impl Future<Output = Result<Listing<C::Registration>, ClientError>> + ConditionalSend + use<C, S>
    {
        let container = self.container.clone();
        let registrations = self
            .queue
            .submit_async(move |_: &C::Worker| async move { container.registrations().await });

        async move {
            let registrations = registrations.await??;
            Ok::<_, ClientError>(match info {
                ListInfo::Scopes => Listing::Scopes(
                    registrations
                        .iter()
                        .map(|registration| registration.scope())
                        .collect(),
                ),
                ListInfo::All => Listing::Registrations(registrations),
            })
        }
    }

    /// Unregister every registration whose scope is one of `scopes`, or every
    /// registration if `scopes` is empty. Resolves to the number of
    /// registrations removed.
    pub fn unregister(
        &self,
        scopes: Vec<String>,
    ) -> impl Future<Output = Result<usize, ClientError>> + ConditionalSend + use<C, S> {
        let container = self.container.clone();
        let unregistered = self.queue.submit_async(move |_: &C::Worker| async move {
            let mut count: usize = 0;
            for registration in container.registrations().await? {
                let scope = registration.scope();
                if !scopes.is_empty() && !scopes.contains(&scope) {
                    continue;
                }
                if registration.unregister().await? {
                    count += 1;
                }
            }
            tracing::info!(
                target: LOG_TARGET,
                "Unregistered {count} service worker{}",
                if count == 1 { "" } else { "s" }
            );
            Ok::<_, ClientError>(count)
        });

        async move { unregistered.await? }
    }

    /// Whether the worker has finished installing its content. Not
    /// implemented; always an error.
    pub fn is_installed(&self) -> Result<bool, ClientError> {
        Err(ClientError::NotImplemented("is_installed"))
    }

    /// Post a refresh. Nobody awaits the initial or periodic refreshes, so
    /// their failures are logged here.
    fn refresh_once(&self, origin: String) -> Posted {
        tracing::debug!(target: LOG_TARGET, %origin, "Posting refresh");
        let message = Message::refresh(origin);
        Posted(self.queue.submit(move |worker: &C::Worker| {
            let posted = worker.post_message(&message);
            if let Err(error) = &posted {
                tracing::error!(target: LOG_TARGET, %error, "Failed to post refresh");
            }
            posted
        }))
    }
}
