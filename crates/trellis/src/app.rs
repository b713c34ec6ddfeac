//! Application composition.
//!
//! [`Trellis::builder`] collects providers, resources, pages and options;
//! [`TrellisBuilder::build`] composes them once into an [`App`]. Nothing is
//! global: two apps built in one process share no state.

use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use trellis_core::providers::{
    AccessControlProvider, AllowAll, AuthProvider, CanParams, DataProvider, LiveProvider,
    Location, NotificationProvider, RouterProvider, TranslationProvider,
};
use trellis_core::menu::DASHBOARD_KEY;
use trellis_core::{
    AccessGuard, AppOptions, Clock, CustomRoute, Error, Fallbacks, MenuItem, PageRef,
    ResourceRegistry, ResourceSpec, Result, RouteTable, View, derive_menu_items,
    derive_selected_key,
};
use trellis_query::{AuthHooks, DataHooks, Env, UndoRegistry};

/// Entry point for composing an application.
#[derive(Debug, Clone, Copy)]
pub struct Trellis;

impl Trellis {
    /// Start a builder.
    pub fn builder() -> TrellisBuilder {
        TrellisBuilder::default()
    }
}

/// Collects everything an [`App`] is made of.
#[derive(Default)]
pub struct TrellisBuilder {
    data: Option<Arc<dyn DataProvider>>,
    auth: Option<Arc<dyn AuthProvider>>,
    live: Option<Arc<dyn LiveProvider>>,
    access: Option<Arc<dyn AccessControlProvider>>,
    translator: Option<Arc<dyn TranslationProvider>>,
    notifications: Option<Arc<dyn NotificationProvider>>,
    router: Option<Arc<dyn RouterProvider>>,
    clock: Option<Arc<dyn Clock>>,
    resources: Vec<ResourceSpec>,
    dashboard: Option<PageRef>,
    login_page: Option<PageRef>,
    ready_page: Option<PageRef>,
    fallbacks: Fallbacks,
    custom_routes: Vec<CustomRoute>,
    options: AppOptions,
}

impl TrellisBuilder {
    /// Backend access. Required.
    pub fn data_provider(mut self, provider: Arc<dyn DataProvider>) -> Self {
        self.data = Some(provider);
        self
    }

    /// Session management; without one every session is authenticated.
    pub fn auth_provider(mut self, provider: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(provider);
        self
    }

    /// Realtime transport.
    pub fn live_provider(mut self, provider: Arc<dyn LiveProvider>) -> Self {
        self.live = Some(provider);
        self
    }

    /// Route and menu authorisation; everything is allowed otherwise.
    pub fn access_control_provider(mut self, provider: Arc<dyn AccessControlProvider>) -> Self {
        self.access = Some(provider);
        self
    }

    /// Message lookup.
    pub fn translation_provider(mut self, provider: Arc<dyn TranslationProvider>) -> Self {
        self.translator = Some(provider);
        self
    }

    /// User-facing notifications.
    pub fn notification_provider(mut self, provider: Arc<dyn NotificationProvider>) -> Self {
        self.notifications = Some(provider);
        self
    }

    /// Navigation; an in-memory router otherwise.
    pub fn router_provider(mut self, provider: Arc<dyn RouterProvider>) -> Self {
        self.router = Some(provider);
        self
    }

    /// Time source for undo windows, cache ages and live event dates.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Register a resource. Registration order is menu and route order.
    pub fn resource(mut self, spec: ResourceSpec) -> Self {
        self.resources.push(spec);
        self
    }

    /// Register several resources.
    pub fn resources(mut self, specs: impl IntoIterator<Item = ResourceSpec>) -> Self {
        self.resources.extend(specs);
        self
    }

    /// Page rendered at `/`.
    pub fn dashboard(mut self, page: impl Into<PageRef>) -> Self {
        self.dashboard = Some(page.into());
        self
    }

    /// Page rendered at `/` and `/login` for unauthenticated sessions.
    pub fn login_page(mut self, page: impl Into<PageRef>) -> Self {
        self.login_page = Some(page.into());
        self
    }

    /// Page rendered when no resources are registered.
    pub fn ready_page(mut self, page: impl Into<PageRef>) -> Self {
        self.ready_page = Some(page.into());
        self
    }

    /// Page rendered for denied or unmatched routes.
    pub fn error_page(mut self, page: impl Into<PageRef>) -> Self {
        self.fallbacks.error_page = Some(page.into());
        self
    }

    /// Page rendered instead of the error page when set.
    pub fn catch_all(mut self, page: impl Into<PageRef>) -> Self {
        self.fallbacks.catch_all = Some(page.into());
        self
    }

    /// Add a user-declared route, matched before generated ones.
    pub fn custom_route(mut self, route: CustomRoute) -> Self {
        self.custom_routes.push(route);
        self
    }

    /// Add several user-declared routes.
    pub fn custom_routes(mut self, routes: impl IntoIterator<Item = CustomRoute>) -> Self {
        self.custom_routes.extend(routes);
        self
    }

    /// Application options.
    pub fn options(mut self, options: AppOptions) -> Self {
        self.options = options;
        self
    }

    /// Compose the application.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no data provider was given or the
    /// resources do not compose (empty or duplicate names, shared routes).
    pub fn build(self) -> Result<App> {
        let data = self
            .data
            .ok_or_else(|| Error::config("A data provider is required"))?;
        let registry = ResourceRegistry::compose(self.resources)?;

        let mut env = Env::builder(data).options(self.options);
        if let Some(auth) = self.auth {
            env = env.auth_provider(auth);
        }
        if let Some(live) = self.live {
            env = env.live_provider(live);
        }
        if let Some(translator) = self.translator {
            env = env.translation_provider(translator);
        }
        if let Some(notifications) = self.notifications {
            env = env.notification_provider(notifications);
        }
        if let Some(router) = self.router {
            env = env.router_provider(router);
        }
        if let Some(clock) = self.clock {
            env = env.clock(clock);
        }
        let env = env.build();

        let access = self.access.unwrap_or_else(|| Arc::new(AllowAll));
        let routes = RouteTable::build(&self.custom_routes, &registry, self.dashboard.as_ref());
        let login_routes =
            RouteTable::unauthenticated(&self.custom_routes, self.login_page.as_ref());

        tracing::info!(
            resources = registry.len(),
            routes = routes.len(),
            dashboard = self.dashboard.is_some(),
            "application composed"
        );

        Ok(App {
            inner: Arc::new(AppInner {
                data: DataHooks::new(Arc::clone(&env)),
                auth: AuthHooks::new(Arc::clone(&env)),
                guard: AccessGuard::new(Arc::clone(&access)),
                access,
                env,
                registry,
                routes,
                login_routes,
                dashboard: self.dashboard,
                ready_page: self.ready_page,
                fallbacks: self.fallbacks,
            }),
        })
    }
}

impl fmt::Debug for TrellisBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrellisBuilder")
            .field("resources", &self.resources)
            .field("dashboard", &self.dashboard)
            .field("custom_routes", &self.custom_routes)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Menu entries and the one the current location selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Menu {
    /// Key of the selected entry, `/` or [`NOT_FOUND_KEY`](trellis_core::NOT_FOUND_KEY).
    pub selected_key: String,
    /// Entries in display order.
    pub items: Vec<MenuItem>,
}

struct AppInner {
    env: Arc<Env>,
    registry: ResourceRegistry,
    routes: RouteTable,
    login_routes: RouteTable,
    dashboard: Option<PageRef>,
    ready_page: Option<PageRef>,
    fallbacks: Fallbacks,
    access: Arc<dyn AccessControlProvider>,
    guard: AccessGuard,
    data: DataHooks,
    auth: AuthHooks,
}

/// A composed application. Immutable; clones share everything.
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

impl App {
    /// Registered resources.
    pub fn registry(&self) -> &ResourceRegistry {
        &self.inner.registry
    }

    /// Application options.
    pub fn options(&self) -> &AppOptions {
        &self.inner.env.options
    }

    /// Providers, cache and options shared by the hooks.
    pub fn env(&self) -> &Arc<Env> {
        &self.inner.env
    }

    /// Read and write hooks.
    pub fn data(&self) -> &DataHooks {
        &self.inner.data
    }

    /// Login, logout and session checks.
    pub fn auth(&self) -> &AuthHooks {
        &self.inner.auth
    }

    /// Undo windows of undoable mutations.
    pub fn undo(&self) -> &UndoRegistry {
        &self.inner.env.undo
    }

    /// Route table for authenticated sessions.
    pub fn routes(&self) -> &RouteTable {
        &self.inner.routes
    }

    /// Route table for sessions that are not logged in.
    pub fn unauthenticated_routes(&self) -> &RouteTable {
        &self.inner.login_routes
    }

    /// Menu for `location`: the dashboard entry when one is configured, then
    /// one entry per resource.
    pub fn menu(&self, location: &Location) -> Menu {
        let env = &self.inner.env;
        let resources = self.inner.registry.as_slice();
        Menu {
            selected_key: derive_selected_key(resources, location, &env.router.params()),
            items: derive_menu_items(
                resources,
                self.inner.dashboard.is_some(),
                &env.options.dashboard_menu,
                env.translator.as_ref(),
            ),
        }
    }

    /// Like [`menu`](Self::menu), keeping only entries whose list action the
    /// access-control provider allows.
    pub async fn accessible_menu(&self, location: &Location) -> Menu {
        let mut menu = self.menu(location);
        let checks = menu.items.iter().map(|item| {
            let resource = if item.key == DASHBOARD_KEY {
                "dashboard".to_string()
            } else {
                item.name.clone()
            };
            self.inner.access.can(CanParams {
                resource,
                action: "list".to_string(),
                params: Value::Null,
            })
        });
        let allowed: Vec<bool> = join_all(checks)
            .await
            .into_iter()
            .map(|response| response.can)
            .collect();
        let mut allowed = allowed.into_iter();
        menu.items.retain(|_| allowed.next().unwrap_or(false));
        menu
    }

    /// Menu for the router's current location.
    pub fn current_menu(&self) -> Menu {
        self.menu(&self.inner.env.router.location())
    }

    /// View `location` renders to.
    ///
    /// With no resources registered this is the ready page. Unauthenticated
    /// sessions resolve against the login table; authenticated ones against
    /// the full table, with resource and dashboard routes access-guarded.
    pub async fn render(&self, location: &Location) -> View {
        let inner = &self.inner;
        if inner.registry.is_empty() {
            return View::Ready {
                page: inner.ready_page.clone(),
            };
        }

        let table = if inner.auth.is_authenticated().await {
            &inner.routes
        } else {
            tracing::debug!(path = %location.pathname, "unauthenticated session");
            &inner.login_routes
        };

        match table.resolve(location) {
            Some(matched) => inner.guard.render(&matched, &inner.fallbacks).await,
            None => inner.fallbacks.view(),
        }
    }

    /// View the router's current location renders to.
    pub async fn render_current(&self) -> View {
        let location = self.inner.env.router.location();
        self.render(&location).await
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("resources", &self.inner.registry.len())
            .field("routes", &self.inner.routes.len())
            .field("env", &self.inner.env)
            .finish_non_exhaustive()
    }
}
