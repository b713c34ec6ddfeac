//! In-memory providers for tests, demos and the CLI.

mod auth;
mod data;
mod notify;
mod router;

pub use auth::MemoryAuthProvider;
pub use data::MemoryDataProvider;
pub(crate) use data::merge;
pub use notify::RecordingNotifier;
pub use router::MemoryRouter;
