//! Sidebar menu derivation.
//!
//! Both functions are pure: they read the registry and the current location
//! and never fail. A path that belongs to no resource selects
//! [`NOT_FOUND_KEY`].

use serde::{Deserialize, Serialize};

use crate::naming::{Plurality, user_friendly_resource_name};
use crate::providers::{Location, RouteParams, TranslateParams, TranslationProvider};
use crate::resource::ResourceDescriptor;

/// Selected key when the location matches no menu entry.
pub const NOT_FOUND_KEY: &str = "notfound";

/// Key of the synthetic dashboard entry.
pub const DASHBOARD_KEY: &str = "dashboard";

const DEFAULT_DASHBOARD_NAME: &str = "Dashboard";

/// Presentation of the dashboard menu entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardMenuOptions {
    /// Entry name; `"Dashboard"` when unset.
    pub name: Option<String>,
    /// Default label text, passed to the translator.
    pub label: Option<String>,
    /// Icon identifier.
    pub icon: Option<String>,
}

/// One sidebar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Resource name, or the dashboard name.
    pub name: String,
    /// Icon identifier.
    pub icon: Option<String>,
    /// Link target, always starting with `/`.
    pub route: String,
    /// Selection key.
    pub key: String,
    /// Display label.
    pub label: String,
}

/// Key of the menu entry the current location belongs to.
///
/// First resource (registry order) whose `/route` prefixes the path wins;
/// failing that, the first whose route prefixes the router's `resource`
/// parameter. `/` selects `/`; anything else selects [`NOT_FOUND_KEY`].
pub fn derive_selected_key(
    resources: &[ResourceDescriptor],
    location: &Location,
    params: &RouteParams,
) -> String {
    let by_path = resources
        .iter()
        .find(|r| location.pathname.starts_with(&format!("/{}", r.route)));

    let selected = by_path.or_else(|| {
        params
            .resource
            .as_deref()
            .and_then(|token| resources.iter().find(|r| token.starts_with(r.route.as_str())))
    });

    match selected {
        Some(resource) => format!("/{}", resource.route),
        None if location.pathname == "/" => "/".to_string(),
        None => NOT_FOUND_KEY.to_string(),
    }
}

/// Menu entries: the dashboard first when present, then one per resource.
pub fn derive_menu_items(
    resources: &[ResourceDescriptor],
    has_dashboard: bool,
    dashboard: &DashboardMenuOptions,
    translator: &dyn TranslationProvider,
) -> Vec<MenuItem> {
    let no_params = TranslateParams::new();
    let mut items = Vec::with_capacity(resources.len() + usize::from(has_dashboard));

    if has_dashboard {
        let name = dashboard
            .name
            .clone()
            .unwrap_or_else(|| DEFAULT_DASHBOARD_NAME.to_string());
        let default_label = dashboard.label.as_deref().unwrap_or(&name);
        items.push(MenuItem {
            label: translator.translate("dashboard.title", &no_params, Some(default_label)),
            name,
            icon: dashboard.icon.clone(),
            route: "/".to_string(),
            key: DASHBOARD_KEY.to_string(),
        });
    }

    for resource in resources {
        let route = format!("/{}", resource.route);
        let label = match &resource.label {
            Some(label) => label.clone(),
            None => {
                let fallback = user_friendly_resource_name(&resource.name, Plurality::Plural);
                translator.translate(
                    &format!("{0}.{0}", resource.name),
                    &no_params,
                    Some(&fallback),
                )
            }
        };
        items.push(MenuItem {
            name: resource.name.clone(),
            icon: resource.icon.clone(),
            key: route.clone(),
            route,
            label,
        });
    }

    items
}
