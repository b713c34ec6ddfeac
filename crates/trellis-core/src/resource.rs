//! Resource specifications and the ordered resource registry.
//!
//! A resource is a named, routable entity (`"posts"`) with up to four page
//! views. Applications declare [`ResourceSpec`]s; [`ResourceRegistry::compose`]
//! derives the immutable [`ResourceDescriptor`]s everything else reads.
//! Registry order is menu order and route order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::{Error, Result};

/// Opaque reference to a page the UI layer knows how to draw.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageRef(String);

impl PageRef {
    /// Reference a page by name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Page name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A resource as declared by the application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSpec {
    /// Unique resource name; also the data-provider resource.
    pub name: String,

    /// URL segment; defaults to `name`.
    pub route: Option<String>,

    /// Menu label; defaults to a translated friendly name.
    pub label: Option<String>,

    /// Menu icon name.
    pub icon: Option<String>,

    /// List page.
    pub list: Option<PageRef>,

    /// Create page (also serves clone).
    pub create: Option<PageRef>,

    /// Edit page.
    pub edit: Option<PageRef>,

    /// Show page.
    pub show: Option<PageRef>,

    /// Whether records may be deleted.
    pub can_delete: bool,
}

impl ResourceSpec {
    /// Declare a resource by name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Override the URL segment.
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Set the menu label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the menu icon.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Set the list page.
    pub fn with_list(mut self, page: impl Into<PageRef>) -> Self {
        self.list = Some(page.into());
        self
    }

    /// Set the create page.
    pub fn with_create(mut self, page: impl Into<PageRef>) -> Self {
        self.create = Some(page.into());
        self
    }

    /// Set the edit page.
    pub fn with_edit(mut self, page: impl Into<PageRef>) -> Self {
        self.edit = Some(page.into());
        self
    }

    /// Set the show page.
    pub fn with_show(mut self, page: impl Into<PageRef>) -> Self {
        self.show = Some(page.into());
        self
    }

    /// Allow deletion.
    pub fn with_delete(mut self) -> Self {
        self.can_delete = true;
        self
    }
}

/// A registered resource with derived fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceDescriptor {
    /// Unique resource name.
    pub name: String,
    /// URL segment.
    pub route: String,
    /// Menu label override.
    pub label: Option<String>,
    /// Menu icon.
    pub icon: Option<String>,
    /// A create page is declared.
    pub can_create: bool,
    /// An edit page is declared.
    pub can_edit: bool,
    /// A show page is declared.
    pub can_show: bool,
    /// Deletion is allowed.
    pub can_delete: bool,
    /// List page.
    pub list: Option<PageRef>,
    /// Create page.
    pub create: Option<PageRef>,
    /// Edit page.
    pub edit: Option<PageRef>,
    /// Show page.
    pub show: Option<PageRef>,
}

impl From<ResourceSpec> for ResourceDescriptor {
    fn from(spec: ResourceSpec) -> Self {
        Self {
            route: normalize_route(spec.route.as_deref().unwrap_or(&spec.name)),
            can_create: spec.create.is_some(),
            can_edit: spec.edit.is_some(),
            can_show: spec.show.is_some(),
            can_delete: spec.can_delete,
            name: spec.name,
            label: spec.label,
            icon: spec.icon,
            list: spec.list,
            create: spec.create,
            edit: spec.edit,
            show: spec.show,
        }
    }
}

/// Strip surrounding whitespace and slashes from a route segment.
fn normalize_route(route: &str) -> String {
    route.trim().trim_matches('/').trim().to_string()
}

impl ResourceDescriptor {
    /// Whether any page is declared.
    pub fn has_pages(&self) -> bool {
        self.list.is_some() || self.create.is_some() || self.edit.is_some() || self.show.is_some()
    }
}

/// Ordered, immutable set of registered resources.
///
/// Cloning is cheap; clones share the same descriptors.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    resources: Arc<[ResourceDescriptor]>,
}

impl ResourceRegistry {
    /// Derive descriptors from declared specs, preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a name is empty or declared twice, when
    /// a route is empty once slashes are stripped, or when two resources
    /// resolve to the same route.
    pub fn compose(specs: impl IntoIterator<Item = ResourceSpec>) -> Result<Self> {
        let mut resources: Vec<ResourceDescriptor> = Vec::new();
        for spec in specs {
            if spec.name.trim().is_empty() {
                return Err(Error::config("Resource name must not be empty"));
            }
            if resources.iter().any(|r| r.name == spec.name) {
                return Err(Error::config(format!(
                    "Resource '{}' is declared more than once",
                    spec.name
                )));
            }
            let descriptor = ResourceDescriptor::from(spec);
            if descriptor.route.is_empty() {
                return Err(Error::config(format!(
                    "Resource '{}' has an empty route",
                    descriptor.name
                )));
            }
            if let Some(other) = resources.iter().find(|r| r.route == descriptor.route) {
                return Err(Error::config(format!(
                    "Resources '{}' and '{}' share the route '{}'",
                    other.name, descriptor.name, descriptor.route
                )));
            }
            if !descriptor.has_pages() {
                tracing::warn!(
                    resource = %descriptor.name,
                    "resource declares no pages; it gets a menu entry but no routes"
                );
            }
            resources.push(descriptor);
        }
        tracing::debug!(count = resources.len(), "composed resource registry");
        Ok(Self {
            resources: resources.into(),
        })
    }

    /// Descriptors in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, ResourceDescriptor> {
        self.resources.iter()
    }

    /// Descriptors as a slice.
    pub fn as_slice(&self) -> &[ResourceDescriptor] {
        &self.resources
    }

    /// Look up by name.
    pub fn get(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Look up by route.
    pub fn by_route(&self, route: &str) -> Option<&ResourceDescriptor> {
        self.resources.iter().find(|r| r.route == route)
    }

    /// First registered resource.
    pub fn first(&self) -> Option<&ResourceDescriptor> {
        self.resources.first()
    }

    /// Number of resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether no resources are registered.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl<'a> IntoIterator for &'a ResourceRegistry {
    type Item = &'a ResourceDescriptor;
    type IntoIter = std::slice::Iter<'a, ResourceDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_route_defaults_to_name() {
        let d = ResourceDescriptor::from(ResourceSpec::new("posts"));
        assert_eq!(d.route, "posts");
    }

    #[test]
    fn test_descriptor_route_override() {
        let d = ResourceDescriptor::from(ResourceSpec::new("users").with_route("custom-users"));
        assert_eq!(d.name, "users");
        assert_eq!(d.route, "custom-users");
    }

    #[test]
    fn test_capabilities_follow_pages() {
        let d = ResourceDescriptor::from(
            ResourceSpec::new("posts")
                .with_list("PostList")
                .with_edit("PostEdit"),
        );
        assert!(!d.can_create);
        assert!(d.can_edit);
        assert!(!d.can_show);
        assert!(!d.can_delete);
    }

    #[test]
    fn test_can_delete_passes_through() {
        let d = ResourceDescriptor::from(ResourceSpec::new("posts").with_delete());
        assert!(d.can_delete);
        assert!(!d.has_pages());
    }

    #[test]
    fn test_compose_preserves_order() {
        let registry = ResourceRegistry::compose(vec![
            ResourceSpec::new("posts"),
            ResourceSpec::new("users"),
            ResourceSpec::new("categories"),
        ])
        .unwrap();

        let names: Vec<_> = registry.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["posts", "users", "categories"]);
        assert_eq!(registry.first().unwrap().name, "posts");
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_compose_rejects_duplicates() {
        let err =
            ResourceRegistry::compose(vec![ResourceSpec::new("posts"), ResourceSpec::new("posts")])
                .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_compose_rejects_shared_route() {
        let err = ResourceRegistry::compose(vec![
            ResourceSpec::new("posts"),
            ResourceSpec::new("articles").with_route("posts"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("share the route"));
    }

    #[test]
    fn test_compose_rejects_empty_name() {
        assert!(ResourceRegistry::compose(vec![ResourceSpec::new("  ")]).is_err());
    }

    #[test]
    fn test_descriptor_route_strips_slashes() {
        let d = ResourceDescriptor::from(ResourceSpec::new("users").with_route(" /people/ "));
        assert_eq!(d.route, "people");
    }

    #[test]
    fn test_compose_rejects_empty_route() {
        for route in ["", "   ", "/", "//"] {
            let err = ResourceRegistry::compose(vec![
                ResourceSpec::new("posts").with_route(route),
                ResourceSpec::new("users"),
            ])
            .unwrap_err();
            assert!(matches!(err, Error::Config(_)));
            assert!(err.to_string().contains("'posts' has an empty route"));
        }
    }

    #[test]
    fn test_compose_empty() {
        let registry = ResourceRegistry::compose(Vec::new()).unwrap();
        assert!(registry.is_empty());
        assert!(registry.first().is_none());
    }

    #[test]
    fn test_lookup() {
        let registry = ResourceRegistry::compose(vec![
            ResourceSpec::new("posts"),
            ResourceSpec::new("users").with_route("people"),
        ])
        .unwrap();
        assert_eq!(registry.get("users").unwrap().route, "people");
        assert_eq!(registry.by_route("people").unwrap().name, "users");
        assert!(registry.get("people").is_none());
    }

    #[test]
    fn test_clone_shares_descriptors() {
        let registry = ResourceRegistry::compose(vec![ResourceSpec::new("posts")]).unwrap();
        let clone = registry.clone();
        assert!(std::ptr::eq(registry.as_slice(), clone.as_slice()));
    }

    #[test]
    fn test_spec_from_toml_like_json() {
        let spec: ResourceSpec = serde_json::from_str(
            r#"{"name": "posts", "list": "PostList", "can_delete": true}"#,
        )
        .unwrap();
        assert_eq!(spec.list, Some(PageRef::new("PostList")));
        assert!(spec.can_delete);
        assert!(spec.route.is_none());
    }
}
