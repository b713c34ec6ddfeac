//! History-stack router for headless use.

use parking_lot::Mutex;

use trellis_core::providers::{Location, RouteParams, RouterProvider};

/// Router that keeps its history in memory.
///
/// Route parameters are read positionally from the path:
/// `/:resource/:action/:id`.
#[derive(Debug)]
pub struct MemoryRouter {
    history: Mutex<Vec<Location>>,
    prompt: Mutex<Option<String>>,
}

impl Default for MemoryRouter {
    fn default() -> Self {
        Self::at("/")
    }
}

impl MemoryRouter {
    /// Router at `/`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Router starting at `url`.
    pub fn at(url: &str) -> Self {
        Self {
            history: Mutex::new(vec![Location::parse(url)]),
            prompt: Mutex::new(None),
        }
    }

    /// Every location visited, oldest first.
    pub fn history(&self) -> Vec<Location> {
        self.history.lock().clone()
    }

    /// Active navigation prompt.
    pub fn prompt(&self) -> Option<String> {
        self.prompt.lock().clone()
    }
}

impl RouterProvider for MemoryRouter {
    fn push(&self, path: &str) {
        tracing::debug!(path, "navigate");
        self.history.lock().push(Location::parse(path));
    }

    fn replace(&self, path: &str) {
        tracing::debug!(path, "navigate (replace)");
        let mut history = self.history.lock();
        history.pop();
        history.push(Location::parse(path));
    }

    fn go_back(&self) {
        let mut history = self.history.lock();
        if history.len() > 1 {
            history.pop();
        }
    }

    fn location(&self) -> Location {
        self.history.lock().last().cloned().unwrap_or_else(|| Location::parse("/"))
    }

    fn params(&self) -> RouteParams {
        let location = self.location();
        let mut segments = location
            .pathname
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        RouteParams {
            resource: segments.next(),
            action: segments.next(),
            id: segments.next(),
        }
    }

    fn set_prompt(&self, message: Option<String>) {
        *self.prompt.lock() = message;
    }
}
