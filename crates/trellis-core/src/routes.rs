//! Route table generation, path matching and access guarding.
//!
//! Resource routes are generated fresh from the registry. The authorised
//! table is ordered: custom routes, the dashboard (or a redirect to the first
//! resource), generated resource routes, then a catch-all. Matching walks the
//! table in order and the first hit wins.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::naming::percent_encode;
use crate::providers::{AccessControlProvider, AllowAll, CanParams, Location};
use crate::resource::{PageRef, ResourceDescriptor, ResourceRegistry};

/// Page action a resource route serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteAction {
    /// `/:resource/create`
    Create,
    /// `/:resource/clone/:id`
    Clone,
    /// `/:resource/edit/:id`
    Edit,
    /// `/:resource/show/:id`
    Show,
    /// `/:resource`
    List,
}

impl RouteAction {
    /// Name as it appears in the URL.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Clone => "clone",
            Self::Edit => "edit",
            Self::Show => "show",
            Self::List => "list",
        }
    }

    /// Action name checked with the access-control provider. Cloning is
    /// creating.
    pub fn access_action(self) -> &'static str {
        match self {
            Self::Clone => "create",
            other => other.as_str(),
        }
    }

    fn takes_id(self) -> bool {
        matches!(self, Self::Clone | Self::Edit | Self::Show)
    }
}

impl fmt::Display for RouteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Properties handed to a resource page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageProps {
    /// Resource name.
    pub name: String,
    /// Resource declares a create page.
    pub can_create: bool,
    /// Resource declares an edit page.
    pub can_edit: bool,
    /// Resource declares a show page.
    pub can_show: bool,
    /// Resource allows deletion.
    pub can_delete: bool,
    /// Record id from the path, for clone/edit/show.
    pub id: Option<String>,
}

impl From<&ResourceDescriptor> for PageProps {
    fn from(resource: &ResourceDescriptor) -> Self {
        Self {
            name: resource.name.clone(),
            can_create: resource.can_create,
            can_edit: resource.can_edit,
            can_show: resource.can_show,
            can_delete: resource.can_delete,
            id: None,
        }
    }
}

/// One generated resource route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// Only whole-path matches count.
    pub exact: bool,
    /// Path pattern, e.g. `/:resource(posts)/:action(edit)/:id`.
    pub path: String,
    /// Resource name.
    pub resource: String,
    /// Resource route segment.
    pub route: String,
    /// Action served.
    pub action: RouteAction,
    /// Page rendered.
    pub page: PageRef,
    /// Properties for the page.
    pub props: PageProps,
}

impl RouteEntry {
    fn new(resource: &ResourceDescriptor, action: RouteAction, page: &PageRef) -> Self {
        let mut path = format!("/:resource({})", resource.route);
        if action != RouteAction::List {
            path.push_str(&format!("/:action({action})"));
        }
        if action.takes_id() {
            path.push_str("/:id");
        }
        Self {
            exact: true,
            path,
            resource: resource.name.clone(),
            route: resource.route.clone(),
            action,
            page: page.clone(),
            props: PageProps::from(resource),
        }
    }
}

/// Generate the resource routes, per resource in registry order:
/// create, clone, edit, show, list. Only declared pages get routes.
pub fn derive_route_table(resources: &[ResourceDescriptor]) -> Vec<RouteEntry> {
    let mut entries = Vec::new();
    for resource in resources {
        if let Some(page) = &resource.create {
            entries.push(RouteEntry::new(resource, RouteAction::Create, page));
            entries.push(RouteEntry::new(resource, RouteAction::Clone, page));
        }
        if let Some(page) = &resource.edit {
            entries.push(RouteEntry::new(resource, RouteAction::Edit, page));
        }
        if let Some(page) = &resource.show {
            entries.push(RouteEntry::new(resource, RouteAction::Show, page));
        }
        if let Some(page) = &resource.list {
            entries.push(RouteEntry::new(resource, RouteAction::List, page));
        }
    }
    entries
}

fn default_exact() -> bool {
    true
}

/// User-declared route, matched before anything generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRoute {
    /// Path pattern.
    pub path: String,
    /// Page rendered.
    pub page: PageRef,
    /// Only whole-path matches count.
    #[serde(default = "default_exact")]
    pub exact: bool,
}

impl CustomRoute {
    /// Exact custom route.
    pub fn new(path: impl Into<String>, page: impl Into<PageRef>) -> Self {
        Self {
            path: path.into(),
            page: page.into(),
            exact: true,
        }
    }

    /// Also match paths below this one.
    pub fn prefix(mut self) -> Self {
        self.exact = false;
        self
    }
}

/// Entry of a [`RouteTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// User-declared route.
    Custom(CustomRoute),
    /// `/` renders the dashboard, guarded as (`dashboard`, `list`).
    Dashboard(PageRef),
    /// Exact `from` redirects to `to`.
    Redirect {
        /// Matched path.
        from: String,
        /// Target.
        to: String,
    },
    /// Generated resource route.
    Resource(RouteEntry),
    /// Matches everything; renders the fallback.
    CatchAll,
    /// `/` and `/login` render the login page, if one is configured.
    Login(Option<PageRef>),
    /// Matches everything; redirects to `/login?to=<path>`.
    LoginRedirect,
}

impl Route {
    /// Pattern shown in listings.
    pub fn path(&self) -> String {
        match self {
            Self::Custom(route) => route.path.clone(),
            Self::Dashboard(_) => "/".to_string(),
            Self::Redirect { from, .. } => from.clone(),
            Self::Resource(entry) => entry.path.clone(),
            Self::CatchAll | Self::LoginRedirect => "*".to_string(),
            Self::Login(_) => "/, /login".to_string(),
        }
    }

    /// Short description of what the route renders.
    pub fn describe(&self) -> String {
        match self {
            Self::Custom(route) => format!("custom page {}", route.page),
            Self::Dashboard(page) => format!("dashboard {page}"),
            Self::Redirect { to, .. } => format!("redirect to {to}"),
            Self::Resource(entry) => {
                format!("{} {} page {}", entry.resource, entry.action, entry.page)
            }
            Self::CatchAll => "catch-all".to_string(),
            Self::Login(Some(page)) => format!("login page {page}"),
            Self::Login(None) => "login (no page)".to_string(),
            Self::LoginRedirect => "redirect to /login?to=<path>".to_string(),
        }
    }

    fn matches(&self, pathname: &str) -> Option<BTreeMap<String, String>> {
        match self {
            Self::Custom(route) => match_path(&route.path, pathname, route.exact),
            Self::Dashboard(_) => match_path("/", pathname, true),
            Self::Redirect { from, .. } => match_path(from, pathname, true),
            Self::Resource(entry) => match_path(&entry.path, pathname, entry.exact),
            Self::Login(_) => {
                match_path("/", pathname, true).or_else(|| match_path("/login", pathname, true))
            }
            Self::CatchAll | Self::LoginRedirect => Some(BTreeMap::new()),
        }
    }
}

/// Result of resolving a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// The route that matched.
    pub route: Route,
    /// Captured path parameters.
    pub params: BTreeMap<String, String>,
    /// The resolved location.
    pub location: Location,
}

impl RouteMatch {
    /// Captured `:id`, if any.
    pub fn id(&self) -> Option<&str> {
        self.params.get("id").map(String::as_str)
    }
}

/// Ordered routes; first match wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Table for an authenticated session.
    pub fn build(
        custom_routes: &[CustomRoute],
        registry: &ResourceRegistry,
        dashboard: Option<&PageRef>,
    ) -> Self {
        let mut routes: Vec<Route> = custom_routes.iter().cloned().map(Route::Custom).collect();

        match (dashboard, registry.first()) {
            (Some(page), _) => routes.push(Route::Dashboard(page.clone())),
            (None, Some(first)) => routes.push(Route::Redirect {
                from: "/".to_string(),
                to: format!("/{}", first.route),
            }),
            (None, None) => {}
        }

        routes.extend(
            derive_route_table(registry.as_slice())
                .into_iter()
                .map(Route::Resource),
        );
        routes.push(Route::CatchAll);

        tracing::debug!(routes = routes.len(), "route table built");
        Self { routes }
    }

    /// Table for a session that is not logged in.
    pub fn unauthenticated(custom_routes: &[CustomRoute], login: Option<&PageRef>) -> Self {
        let mut routes = vec![Route::Login(login.cloned())];
        routes.extend(custom_routes.iter().cloned().map(Route::Custom));
        routes.push(Route::LoginRedirect);
        Self { routes }
    }

    /// First route matching the location's path.
    pub fn resolve(&self, location: &Location) -> Option<RouteMatch> {
        self.routes.iter().find_map(|route| {
            route.matches(&location.pathname).map(|params| RouteMatch {
                route: route.clone(),
                params,
                location: location.clone(),
            })
        })
    }

    /// Routes in match order.
    pub fn iter(&self) -> std::slice::Iter<'_, Route> {
        self.routes.iter()
    }

    /// Generated resource routes only.
    pub fn resource_entries(&self) -> impl Iterator<Item = &RouteEntry> {
        self.routes.iter().filter_map(|route| match route {
            Route::Resource(entry) => Some(entry),
            _ => None,
        })
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a Route;
    type IntoIter = std::slice::Iter<'a, Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}

/// What the UI layer draws.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    /// A resource or dashboard page inside the layout.
    Page {
        /// Page handle.
        page: PageRef,
        /// Page properties.
        props: PageProps,
    },
    /// Navigate elsewhere.
    Redirect {
        /// Target path.
        to: String,
    },
    /// The configured catch-all page.
    CatchAll {
        /// Page handle.
        page: PageRef,
    },
    /// The error page inside the layout; the built-in one when `None`.
    ErrorPage {
        /// Configured error page.
        page: Option<PageRef>,
    },
    /// The login page.
    Login {
        /// Page handle.
        page: PageRef,
    },
    /// Shown when no resources are registered.
    Ready {
        /// Configured ready page; the built-in one when `None`.
        page: Option<PageRef>,
    },
    /// A user-declared route.
    Custom {
        /// Page handle.
        page: PageRef,
        /// Captured path parameters.
        params: BTreeMap<String, String>,
    },
    /// Nothing.
    Empty,
}

/// Pages substituted when access is denied or nothing matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fallbacks {
    /// Rendered instead of the error page when set.
    pub catch_all: Option<PageRef>,
    /// Custom error page.
    pub error_page: Option<PageRef>,
}

impl Fallbacks {
    /// Catch-all page if configured, else the error page.
    pub fn view(&self) -> View {
        match &self.catch_all {
            Some(page) => View::CatchAll { page: page.clone() },
            None => View::ErrorPage {
                page: self.error_page.clone(),
            },
        }
    }
}

/// Turns route matches into views, consulting access control for guarded
/// routes.
#[derive(Clone)]
pub struct AccessGuard {
    provider: Arc<dyn AccessControlProvider>,
}

impl AccessGuard {
    /// Guard backed by `provider`.
    pub fn new(provider: Arc<dyn AccessControlProvider>) -> Self {
        Self { provider }
    }

    /// Guard that allows everything.
    pub fn allow_all() -> Self {
        Self::new(Arc::new(AllowAll))
    }

    /// View for a match.
    pub async fn render(&self, matched: &RouteMatch, fallbacks: &Fallbacks) -> View {
        match &matched.route {
            Route::Custom(route) => View::Custom {
                page: route.page.clone(),
                params: matched.params.clone(),
            },
            Route::Dashboard(page) => {
                let props = PageProps {
                    name: "dashboard".to_string(),
                    ..PageProps::default()
                };
                self.guarded("dashboard", "list", Value::Null, page, props, fallbacks)
                    .await
            }
            Route::Redirect { to, .. } => View::Redirect { to: to.clone() },
            Route::Resource(entry) => {
                let id = matched.id().map(str::to_string);
                let params = match &id {
                    Some(id) => json!({ "id": id }),
                    None => Value::Null,
                };
                let props = PageProps {
                    id,
                    ..entry.props.clone()
                };
                self.guarded(
                    &entry.resource,
                    entry.action.access_action(),
                    params,
                    &entry.page,
                    props,
                    fallbacks,
                )
                .await
            }
            Route::CatchAll => fallbacks.view(),
            Route::Login(Some(page)) => View::Login { page: page.clone() },
            Route::Login(None) => View::Empty,
            Route::LoginRedirect => View::Redirect {
                to: format!("/login?to={}", percent_encode(&matched.location.href())),
            },
        }
    }

    async fn guarded(
        &self,
        resource: &str,
        action: &str,
        params: Value,
        page: &PageRef,
        props: PageProps,
        fallbacks: &Fallbacks,
    ) -> View {
        let response = self
            .provider
            .can(CanParams {
                resource: resource.to_string(),
                action: action.to_string(),
                params,
            })
            .await;
        if response.can {
            View::Page {
                page: page.clone(),
                props,
            }
        } else {
            tracing::debug!(
                resource,
                action,
                reason = response.reason.as_deref().unwrap_or(""),
                "access denied"
            );
            fallbacks.view()
        }
    }
}

impl fmt::Debug for AccessGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGuard").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param {
        name: String,
        constraint: Option<Vec<String>>,
        optional: bool,
    },
}

/// Split a pattern on `/`, keeping slashes inside `( )` constraints.
fn parse_pattern(pattern: &str) -> Vec<Segment> {
    let mut raw = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for c in pattern.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            '/' if depth == 0 => {
                if !current.is_empty() {
                    raw.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        raw.push(current);
    }

    raw.into_iter()
        .map(|segment| match segment.strip_prefix(':') {
            None => Segment::Literal(segment),
            Some(rest) => {
                let (rest, optional) = match rest.strip_suffix('?') {
                    Some(stripped) => (stripped, true),
                    None => (rest, false),
                };
                match rest.split_once('(') {
                    Some((name, constraint)) => Segment::Param {
                        name: name.to_string(),
                        constraint: Some(
                            constraint
                                .trim_end_matches(')')
                                .split('/')
                                .filter(|s| !s.is_empty())
                                .map(str::to_string)
                                .collect(),
                        ),
                        optional,
                    },
                    None => Segment::Param {
                        name: rest.to_string(),
                        constraint: None,
                        optional,
                    },
                }
            }
        })
        .collect()
}

/// Match `pathname` against `pattern`, returning the captured parameters.
///
/// Non-exact patterns match any path they are a segment-wise prefix of.
pub(crate) fn match_path(
    pattern: &str,
    pathname: &str,
    exact: bool,
) -> Option<BTreeMap<String, String>> {
    let segments = parse_pattern(pattern);
    let parts: Vec<&str> = pathname.split('/').filter(|s| !s.is_empty()).collect();
    let mut params = BTreeMap::new();
    match_segments(&segments, &parts, exact, &mut params).then_some(params)
}

fn match_segments(
    segments: &[Segment],
    parts: &[&str],
    exact: bool,
    params: &mut BTreeMap<String, String>,
) -> bool {
    let Some((segment, rest)) = segments.split_first() else {
        return parts.is_empty() || !exact;
    };

    match segment {
        Segment::Literal(literal) => {
            parts.first() == Some(&literal.as_str())
                && match_segments(rest, &parts[1..], exact, params)
        }
        Segment::Param {
            name,
            constraint,
            optional,
        } => {
            let width = constraint.as_ref().map_or(1, Vec::len).max(1);
            let consumed = parts.len() >= width
                && constraint
                    .as_ref()
                    .is_none_or(|expected| expected.iter().zip(parts).all(|(e, p)| e == p));
            if consumed {
                let mut attempt = params.clone();
                attempt.insert(name.clone(), parts[..width].join("/"));
                if match_segments(rest, &parts[width..], exact, &mut attempt) {
                    *params = attempt;
                    return true;
                }
            }
            *optional && match_segments(rest, parts, exact, params)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::providers::CanResponse;
    use crate::resource::ResourceSpec;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    fn registry(specs: Vec<ResourceSpec>) -> ResourceRegistry {
        ResourceRegistry::compose(specs).unwrap()
    }

    fn full(name: &str) -> ResourceSpec {
        ResourceSpec::new(name)
            .with_list(format!("{name}-list").as_str())
            .with_create(format!("{name}-create").as_str())
            .with_edit(format!("{name}-edit").as_str())
            .with_show(format!("{name}-show").as_str())
    }

    #[test]
    fn test_list_only_resources() {
        let reg = registry(vec![
            ResourceSpec::new("posts").with_list("PostList"),
            ResourceSpec::new("users")
                .with_route("custom-users")
                .with_list("UserList"),
        ]);
        let table = derive_route_table(reg.as_slice());
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].action, RouteAction::List);
        assert!(table[0].path.contains("posts"));
        assert_eq!(table[1].action, RouteAction::List);
        assert!(table[1].path.contains("custom-users"));
        assert!(table.iter().all(|e| !matches!(
            e.action,
            RouteAction::Create | RouteAction::Edit | RouteAction::Show
        )));
    }

    #[test]
    fn test_resources_without_pages_generate_nothing() {
        let reg = registry(vec![
            ResourceSpec::new("posts"),
            ResourceSpec::new("users").with_route("custom-users"),
        ]);
        assert!(derive_route_table(reg.as_slice()).is_empty());
    }

    #[test]
    fn test_per_resource_ordering() {
        let reg = registry(vec![full("posts"), ResourceSpec::new("tags").with_show("TagShow")]);
        let actions: Vec<_> = derive_route_table(reg.as_slice())
            .into_iter()
            .map(|e| (e.resource, e.action))
            .collect();
        assert_eq!(
            actions,
            vec![
                ("posts".to_string(), RouteAction::Create),
                ("posts".to_string(), RouteAction::Clone),
                ("posts".to_string(), RouteAction::Edit),
                ("posts".to_string(), RouteAction::Show),
                ("posts".to_string(), RouteAction::List),
                ("tags".to_string(), RouteAction::Show),
            ]
        );
    }

    #[test]
    fn test_route_paths() {
        let reg = registry(vec![full("posts")]);
        let paths: Vec<_> = derive_route_table(reg.as_slice())
            .into_iter()
            .map(|e| e.path)
            .collect();
        assert_eq!(
            paths,
            vec![
                "/:resource(posts)/:action(create)",
                "/:resource(posts)/:action(clone)/:id",
                "/:resource(posts)/:action(edit)/:id",
                "/:resource(posts)/:action(show)/:id",
                "/:resource(posts)",
            ]
        );
    }

    #[test]
    fn test_every_entry_maps_to_one_resource() {
        let reg = registry(vec![full("posts"), full("users").with_route("people")]);
        for entry in derive_route_table(reg.as_slice()) {
            let owners = reg.iter().filter(|r| r.route == entry.route).count();
            assert_eq!(owners, 1);
        }
    }

    #[test]
    fn test_clone_checks_create() {
        assert_eq!(RouteAction::Clone.access_action(), "create");
        assert_eq!(RouteAction::Edit.access_action(), "edit");
    }

    #[test]
    fn test_match_path() {
        let m = match_path("/:resource(posts)/:action(edit)/:id", "/posts/edit/7", true).unwrap();
        assert_eq!(m.get("resource").unwrap(), "posts");
        assert_eq!(m.get("action").unwrap(), "edit");
        assert_eq!(m.get("id").unwrap(), "7");

        assert!(match_path("/:resource(posts)/:action(edit)/:id", "/posts/show/7", true).is_none());
        assert!(match_path("/:resource(posts)", "/posts/extra", true).is_none());
        assert!(match_path("/:resource(posts)", "/posts/extra", false).is_some());
        assert!(match_path("/:resource(posts)", "/posts/", true).is_some());
        assert!(match_path("/", "/", true).is_some());
        assert!(match_path("/", "/posts", true).is_none());
    }

    #[test]
    fn test_match_path_nested_route_and_optional() {
        let m = match_path("/:resource(admin/posts)/:action(show)/:id", "/admin/posts/show/1", true)
            .unwrap();
        assert_eq!(m.get("resource").unwrap(), "admin/posts");

        let m = match_path("/:resource?/:action?", "/anything", true).unwrap();
        assert_eq!(m.get("resource").unwrap(), "anything");
        assert!(!m.contains_key("action"));
    }

    fn table_with_dashboard() -> (RouteTable, ResourceRegistry) {
        let reg = registry(vec![full("posts"), ResourceSpec::new("users").with_list("UserList")]);
        let custom = vec![CustomRoute::new("/settings", "Settings")];
        let dashboard = PageRef::new("Dashboard");
        (RouteTable::build(&custom, &reg, Some(&dashboard)), reg)
    }

    #[test]
    fn test_top_level_ordering() {
        let (table, _) = table_with_dashboard();
        let routes: Vec<_> = table.iter().collect();
        assert!(matches!(routes[0], Route::Custom(_)));
        assert!(matches!(routes[1], Route::Dashboard(_)));
        assert!(matches!(routes.last().unwrap(), Route::CatchAll));
        assert_eq!(table.resource_entries().count(), 6);
    }

    #[test]
    fn test_redirect_to_first_resource_without_dashboard() {
        let reg = registry(vec![ResourceSpec::new("posts").with_route("articles").with_list("L")]);
        let table = RouteTable::build(&[], &reg, None);
        let m = table.resolve(&Location::parse("/")).unwrap();
        assert_eq!(
            m.route,
            Route::Redirect {
                from: "/".to_string(),
                to: "/articles".to_string()
            }
        );
    }

    #[test]
    fn test_resolve_first_match_wins() {
        let reg = registry(vec![full("posts")]);
        let custom = vec![CustomRoute::new("/posts/create", "MyCreate")];
        let table = RouteTable::build(&custom, &reg, None);
        let m = table.resolve(&Location::parse("/posts/create")).unwrap();
        assert!(matches!(m.route, Route::Custom(_)));

        let m = table.resolve(&Location::parse("/posts/edit/5")).unwrap();
        assert_eq!(m.id(), Some("5"));

        let m = table.resolve(&Location::parse("/unknown/path")).unwrap();
        assert_eq!(m.route, Route::CatchAll);
    }

    #[test]
    fn test_unauthenticated_table() {
        let login = PageRef::new("Login");
        let table =
            RouteTable::unauthenticated(&[CustomRoute::new("/register", "Register")], Some(&login));
        assert!(matches!(
            table.resolve(&Location::parse("/")).unwrap().route,
            Route::Login(Some(_))
        ));
        assert!(matches!(
            table.resolve(&Location::parse("/login")).unwrap().route,
            Route::Login(Some(_))
        ));
        assert!(matches!(
            table.resolve(&Location::parse("/register")).unwrap().route,
            Route::Custom(_)
        ));
        assert_eq!(
            table.resolve(&Location::parse("/posts?page=2")).unwrap().route,
            Route::LoginRedirect
        );
    }

    struct DenyResource {
        denied: &'static str,
        asked: Mutex<Vec<CanParams>>,
    }

    #[async_trait]
    impl AccessControlProvider for DenyResource {
        async fn can(&self, params: CanParams) -> CanResponse {
            let allowed = params.resource != self.denied;
            self.asked.lock().push(params);
            if allowed {
                CanResponse::allow()
            } else {
                CanResponse::deny("forbidden")
            }
        }
    }

    #[tokio::test]
    async fn test_guard_allows_page() {
        let (table, _) = table_with_dashboard();
        let guard = AccessGuard::allow_all();
        let m = table.resolve(&Location::parse("/posts/show/3")).unwrap();
        let view = guard.render(&m, &Fallbacks::default()).await;
        assert_eq!(
            view,
            View::Page {
                page: PageRef::new("posts-show"),
                props: PageProps {
                    name: "posts".to_string(),
                    can_create: true,
                    can_edit: true,
                    can_show: true,
                    can_delete: false,
                    id: Some("3".to_string()),
                },
            }
        );
    }

    #[tokio::test]
    async fn test_guard_denied_uses_fallbacks() {
        let (table, _) = table_with_dashboard();
        let provider = Arc::new(DenyResource {
            denied: "posts",
            asked: Mutex::new(Vec::new()),
        });
        let guard = AccessGuard::new(provider.clone());
        let m = table.resolve(&Location::parse("/posts/clone/3")).unwrap();

        let view = guard.render(&m, &Fallbacks::default()).await;
        assert_eq!(view, View::ErrorPage { page: None });

        let fallbacks = Fallbacks {
            catch_all: Some(PageRef::new("NotFound")),
            error_page: Some(PageRef::new("Oops")),
        };
        let view = guard.render(&m, &fallbacks).await;
        assert_eq!(
            view,
            View::CatchAll {
                page: PageRef::new("NotFound")
            }
        );

        let asked = provider.asked.lock();
        assert_eq!(asked[0].action, "create");
        assert_eq!(asked[0].params, json!({"id": "3"}));
    }

    #[tokio::test]
    async fn test_guard_dashboard_checked_as_list() {
        let (table, _) = table_with_dashboard();
        let provider = Arc::new(DenyResource {
            denied: "dashboard",
            asked: Mutex::new(Vec::new()),
        });
        let guard = AccessGuard::new(provider.clone());
        let m = table.resolve(&Location::parse("/")).unwrap();
        let fallbacks = Fallbacks {
            catch_all: None,
            error_page: Some(PageRef::new("Oops")),
        };
        assert_eq!(
            guard.render(&m, &fallbacks).await,
            View::ErrorPage {
                page: Some(PageRef::new("Oops"))
            }
        );
        assert_eq!(provider.asked.lock()[0].action, "list");
    }

    #[tokio::test]
    async fn test_login_redirect_encodes_target() {
        let table = RouteTable::unauthenticated(&[], None);
        let guard = AccessGuard::allow_all();
        let m = table.resolve(&Location::parse("/posts/edit/1?tab=a b")).unwrap();
        assert_eq!(
            guard.render(&m, &Fallbacks::default()).await,
            View::Redirect {
                to: "/login?to=%2Fposts%2Fedit%2F1%3Ftab%3Da%20b".to_string()
            }
        );

        let m = table.resolve(&Location::parse("/login")).unwrap();
        assert_eq!(guard.render(&m, &Fallbacks::default()).await, View::Empty);
    }
}
