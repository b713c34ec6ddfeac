//! Cache keys.
//!
//! A key is `namespace/operation/resource` plus a normalised JSON encoding of
//! the query parameters. Normalisation sorts object members recursively and
//! drops members that are `null`, empty objects or empty arrays, so logically
//! equal parameters always render to the same key.

use serde::Serialize;
use serde_json::{Map, Value, json};
use std::fmt;
use std::hash::{Hash, Hasher};

use trellis_core::providers::{CustomParams, GetListParams, GetManyParams, GetOneParams};

/// Namespace of resource hooks.
pub const RESOURCE_NAMESPACE: &str = "resource";

/// Namespace of custom requests.
pub const CUSTOM_NAMESPACE: &str = "custom";

/// Identity of a cached query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryKey {
    namespace: String,
    operation: String,
    resource: String,
    params: Value,
    #[serde(skip)]
    rendered: String,
}

impl QueryKey {
    /// Build a key; `params` is normalised.
    pub fn new(
        namespace: impl Into<String>,
        operation: impl Into<String>,
        resource: impl Into<String>,
        params: Value,
    ) -> Self {
        let namespace = namespace.into();
        let operation = operation.into();
        let resource = resource.into();
        let params = normalize(params).unwrap_or(Value::Null);

        let mut rendered = format!("{namespace}/{operation}/{resource}");
        if !params.is_null() {
            rendered.push('?');
            rendered.push_str(&params.to_string());
        }

        Self {
            namespace,
            operation,
            resource,
            params,
            rendered,
        }
    }

    /// Key of a list query.
    pub fn list(params: &GetListParams) -> Self {
        Self::new(
            RESOURCE_NAMESPACE,
            "list",
            &params.resource,
            json!({
                "pagination": params.pagination,
                "sort": params.sort,
                "filters": params.filters,
                "meta": params.meta,
            }),
        )
    }

    /// Key of a get-many query.
    pub fn many(params: &GetManyParams) -> Self {
        Self::new(
            RESOURCE_NAMESPACE,
            "many",
            &params.resource,
            json!({ "ids": params.ids, "meta": params.meta }),
        )
    }

    /// Key of a get-one query.
    pub fn one(params: &GetOneParams) -> Self {
        Self::new(
            RESOURCE_NAMESPACE,
            "one",
            &params.resource,
            json!({ "id": params.id, "meta": params.meta }),
        )
    }

    /// Key of a custom request; the URL stands in for the resource.
    pub fn custom(params: &CustomParams) -> Self {
        Self::new(
            CUSTOM_NAMESPACE,
            params.method.as_str(),
            &params.url,
            json!({
                "sort": params.sort,
                "filters": params.filters,
                "query": params.query,
                "payload": params.payload,
                "headers": params.headers,
                "meta": params.meta,
            }),
        )
    }

    /// `resource` or `custom`.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// `list`, `many`, `one`, or the custom method.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Resource name (URL for custom keys).
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Normalised parameters; `Null` when there are none.
    pub fn params(&self) -> &Value {
        &self.params
    }

    /// Rendered form, used as the cache map key.
    pub fn as_str(&self) -> &str {
        &self.rendered
    }

    /// Whether this key belongs to a resource hook of `resource`.
    pub fn matches_resource(&self, resource: &str) -> bool {
        self.namespace == RESOURCE_NAMESPACE && self.resource == resource
    }
}

impl PartialEq for QueryKey {
    fn eq(&self, other: &Self) -> bool {
        self.rendered == other.rendered
    }
}

impl Eq for QueryKey {}

impl Hash for QueryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rendered.hash(state);
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

/// Canonical form of a parameter value; `None` when it carries nothing.
fn normalize(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => {
            let mut members: Vec<(String, Value)> = map
                .into_iter()
                .filter_map(|(k, v)| normalize(v).map(|v| (k, v)))
                .collect();
            if members.is_empty() {
                return None;
            }
            members.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (k, v) in members {
                sorted.insert(k, v);
            }
            Some(Value::Object(sorted))
        }
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) => Some(Value::Array(
            items
                .into_iter()
                .map(|v| normalize(v).unwrap_or(Value::Null))
                .collect(),
        )),
        other => Some(other),
    }
}
