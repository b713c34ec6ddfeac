//! Router provider abstraction.

use serde::{Deserialize, Serialize};

/// Current location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Path component, always starting with `/`.
    pub pathname: String,

    /// Query string including the leading `?`, or empty.
    pub search: String,
}

impl Location {
    /// Parse `"/posts?page=2"` into pathname and search.
    pub fn parse(url: &str) -> Self {
        let (pathname, search) = match url.find('?') {
            Some(idx) => (&url[..idx], &url[idx..]),
            None => (url, ""),
        };
        let pathname = if pathname.starts_with('/') {
            pathname.to_string()
        } else {
            format!("/{pathname}")
        };
        Self {
            pathname,
            search: search.to_string(),
        }
    }

    /// Pathname followed by search.
    pub fn href(&self) -> String {
        format!("{}{}", self.pathname, self.search)
    }

    /// Value of a query-string parameter, percent-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.search
            .trim_start_matches('?')
            .split('&')
            .filter_map(|pair| pair.split_once('=').or(Some((pair, ""))))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| crate::naming::percent_decode(value))
    }
}

/// Parameters extracted from the matched route pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteParams {
    /// `:resource` segment.
    pub resource: Option<String>,

    /// `:action` segment.
    pub action: Option<String>,

    /// `:id` segment.
    pub id: Option<String>,
}

/// Navigation primitives of the host routing library.
pub trait RouterProvider: Send + Sync {
    /// Navigate, adding a history entry.
    fn push(&self, path: &str);

    /// Navigate, replacing the current history entry.
    fn replace(&self, path: &str);

    /// Go back one history entry.
    fn go_back(&self);

    /// Current location.
    fn location(&self) -> Location;

    /// Route parameters of the current location.
    fn params(&self) -> RouteParams;

    /// Block navigation with a confirmation message; `None` unblocks.
    fn set_prompt(&self, message: Option<String>);
}
