//! Per-application environment shared by every hook.
//!
//! One [`Env`] is built per application and passed around behind an `Arc`;
//! nothing here is process-global.

use std::fmt;
use std::sync::Arc;

use trellis_core::providers::{
    AuthProvider, DataProvider, DefaultTranslator, LiveProvider, NoopNotifications,
    NotificationProvider, RouterProvider, TranslationProvider,
};
use trellis_core::{AppOptions, Clock, Notifier, SystemClock};

use crate::cache::QueryCache;
use crate::live::Live;
use crate::memory::MemoryRouter;
use crate::undo::UndoRegistry;

/// Providers, cache and options of one application.
pub struct Env {
    /// Backend access.
    pub data: Arc<dyn DataProvider>,
    /// Session management; `None` means every check passes.
    pub auth: Option<Arc<dyn AuthProvider>>,
    /// Live subscriptions and publishing.
    pub live: Live,
    /// Navigation.
    pub router: Arc<dyn RouterProvider>,
    /// Shared query cache.
    pub cache: QueryCache,
    /// User-facing notifications.
    pub notifier: Notifier,
    /// Message lookup.
    pub translator: Arc<dyn TranslationProvider>,
    /// Application options.
    pub options: AppOptions,
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Undo windows of undoable mutations.
    pub undo: UndoRegistry,
}

impl Env {
    /// Start building an environment around a data provider.
    pub fn builder(data: Arc<dyn DataProvider>) -> EnvBuilder {
        EnvBuilder::new(data)
    }

    /// Translate `key` with named parameters, falling back to `default`.
    pub fn translate(&self, key: &str, params: &[(&str, &str)], default: &str) -> String {
        let params = params
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        self.translator.translate(key, &params, Some(default))
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("auth", &self.auth.is_some())
            .field("live", &self.live)
            .field("cache", &self.cache)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Env`].
pub struct EnvBuilder {
    data: Arc<dyn DataProvider>,
    auth: Option<Arc<dyn AuthProvider>>,
    live: Option<Arc<dyn LiveProvider>>,
    router: Option<Arc<dyn RouterProvider>>,
    notifications: Option<Arc<dyn NotificationProvider>>,
    translator: Option<Arc<dyn TranslationProvider>>,
    options: AppOptions,
    clock: Option<Arc<dyn Clock>>,
}

impl EnvBuilder {
    /// Builder with defaults for everything but the data provider.
    pub fn new(data: Arc<dyn DataProvider>) -> Self {
        Self {
            data,
            auth: None,
            live: None,
            router: None,
            notifications: None,
            translator: None,
            options: AppOptions::default(),
            clock: None,
        }
    }

    /// Set the auth provider.
    pub fn auth_provider(mut self, provider: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(provider);
        self
    }

    /// Set the live provider.
    pub fn live_provider(mut self, provider: Arc<dyn LiveProvider>) -> Self {
        self.live = Some(provider);
        self
    }

    /// Set the router; a [`MemoryRouter`] is used otherwise.
    pub fn router_provider(mut self, provider: Arc<dyn RouterProvider>) -> Self {
        self.router = Some(provider);
        self
    }

    /// Set the notification provider; notifications are dropped otherwise.
    pub fn notification_provider(mut self, provider: Arc<dyn NotificationProvider>) -> Self {
        self.notifications = Some(provider);
        self
    }

    /// Set the translation provider.
    pub fn translation_provider(mut self, provider: Arc<dyn TranslationProvider>) -> Self {
        self.translator = Some(provider);
        self
    }

    /// Set the application options.
    pub fn options(mut self, options: AppOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the clock; [`SystemClock`] otherwise.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Assemble the environment.
    pub fn build(self) -> Arc<Env> {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let cache = QueryCache::new(self.options.query.stale_time(), Arc::clone(&clock));
        let live = Live::new(self.live, cache.clone(), self.options.live_mode);
        let notifications = self
            .notifications
            .unwrap_or_else(|| Arc::new(NoopNotifications));

        Arc::new(Env {
            data: self.data,
            auth: self.auth,
            live,
            router: self.router.unwrap_or_else(|| Arc::new(MemoryRouter::new())),
            cache,
            notifier: Notifier::new(notifications),
            translator: self
                .translator
                .unwrap_or_else(|| Arc::new(DefaultTranslator)),
            options: self.options,
            undo: UndoRegistry::new(Arc::clone(&clock)),
            clock,
        })
    }
}

impl fmt::Debug for EnvBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvBuilder")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
