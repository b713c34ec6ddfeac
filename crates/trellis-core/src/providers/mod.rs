//! Provider traits for the services an application plugs in.
//!
//! Trellis never talks to a backend itself. Every external concern is a
//! trait implemented by the application (or by the in-memory providers in
//! `trellis-query`) and handed to the composition root:
//!
//! - [`DataProvider`]: CRUD and custom requests
//! - [`AuthProvider`]: login, logout, session checks, permissions
//! - [`LiveProvider`]: realtime subscribe / publish
//! - [`RouterProvider`]: navigation primitives and current location
//! - [`AccessControlProvider`]: per-resource, per-action authorisation
//! - [`TranslationProvider`]: message lookup
//! - [`NotificationProvider`]: toast-style user notifications

mod access;
mod auth;
mod data;
mod i18n;
mod live;
mod notify;
mod router;

pub use access::{AccessControlProvider, AllowAll, CanParams, CanResponse};
pub use auth::{AuthProvider, AuthResult};
pub use data::{
    CreateParams, CustomMethod, CustomParams, CustomResponse, DataProvider, DeleteOneParams,
    Filter, FilterOperator, GetListParams, GetListResponse, GetManyParams, GetManyResponse,
    GetOneParams, HttpResult, MetaData, Pagination, Record, RecordResponse, SortOrder, SortSpec,
    UpdateParams, record_id,
};
pub use i18n::{
    DefaultTranslator, StaticTranslator, TranslateParams, TranslationProvider, interpolate,
};
pub use live::{
    LiveCallback, LiveEvent, LiveEventPayload, LiveEventType, LiveProvider, SubscribeParams,
    SubscriptionId, WILDCARD,
};
pub use notify::{NoopNotifications, NotificationProvider};
pub use router::{Location, RouteParams, RouterProvider};
