//! End-to-end behaviour of a composed application.

#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use trellis::providers::{
    AccessControlProvider, CanParams, CanResponse, GetListParams, Location, RouterProvider,
    StaticTranslator,
};
use trellis::query::{
    MemoryAuthProvider, MemoryDataProvider, MemoryRouter, NotifyConfig, RecordingNotifier,
};
use trellis::{
    AppOptions, CustomRoute, Error, PageProps, PageRef, ResourceSpec, Trellis, View,
};

struct DenyResource(&'static str);

#[async_trait]
impl AccessControlProvider for DenyResource {
    async fn can(&self, params: CanParams) -> CanResponse {
        if params.resource == self.0 {
            CanResponse::deny("not allowed")
        } else {
            CanResponse::allow()
        }
    }
}

fn data() -> Arc<MemoryDataProvider> {
    Arc::new(
        MemoryDataProvider::new()
            .with_records("posts", vec![json!({"id": 1, "title": "Hello"})])
            .with_records("users", vec![json!({"id": 1, "name": "Ada"})]),
    )
}

fn posts() -> ResourceSpec {
    ResourceSpec::new("posts")
        .with_list("PostList")
        .with_create("PostCreate")
        .with_edit("PostEdit")
        .with_show("PostShow")
}

fn post_props(id: Option<&str>) -> PageProps {
    PageProps {
        name: "posts".to_string(),
        can_create: true,
        can_edit: true,
        can_show: true,
        can_delete: false,
        id: id.map(str::to_string),
    }
}

fn users() -> ResourceSpec {
    ResourceSpec::new("users")
        .with_route("custom-users")
        .with_list("UserList")
}

#[tokio::test]
async fn test_no_resources_renders_ready_page() {
    let app = Trellis::builder()
        .data_provider(data())
        .ready_page("Welcome")
        .build()
        .unwrap();
    assert_eq!(
        app.render(&Location::parse("/anything")).await,
        View::Ready {
            page: Some(PageRef::new("Welcome"))
        }
    );
}

#[test]
fn test_build_errors() {
    let missing = Trellis::builder().resource(posts()).build().unwrap_err();
    assert!(matches!(missing, Error::Config(_)));

    let duplicate = Trellis::builder()
        .data_provider(data())
        .resources([posts(), posts()])
        .build()
        .unwrap_err();
    assert!(matches!(duplicate, Error::Config(_)));
}

#[tokio::test]
async fn test_menu_and_routes_follow_registry_order() {
    let app = Trellis::builder()
        .data_provider(data())
        .resources([posts(), users()])
        .dashboard("Dashboard")
        .build()
        .unwrap();

    let menu = app.menu(&Location::parse("/posts/show/3"));
    assert_eq!(menu.selected_key, "/posts");
    let keys: Vec<&str> = menu.items.iter().map(|i| i.key.as_str()).collect();
    assert_eq!(keys, vec!["dashboard", "/posts", "/custom-users"]);
    assert_eq!(menu.items[1].route, "/posts");
    assert_eq!(menu.items[2].label, "Users");

    assert_eq!(app.menu(&Location::parse("/")).selected_key, "/");
    assert_eq!(app.menu(&Location::parse("/nowhere")).selected_key, "notfound");

    let paths: Vec<String> = app.routes().resource_entries().map(|e| e.path.clone()).collect();
    assert_eq!(paths.len(), 6);
    assert!(paths[5].contains("custom-users"));
}

#[tokio::test]
async fn test_render_resource_pages() {
    let app = Trellis::builder()
        .data_provider(data())
        .resources([posts(), users()])
        .build()
        .unwrap();

    assert_eq!(
        app.render(&Location::parse("/")).await,
        View::Redirect {
            to: "/posts".to_string()
        }
    );

    assert_eq!(
        app.render(&Location::parse("/posts/edit/7")).await,
        View::Page {
            page: PageRef::new("PostEdit"),
            props: post_props(Some("7")),
        }
    );

    assert_eq!(
        app.render(&Location::parse("/users")).await,
        View::ErrorPage { page: None }
    );
}

#[tokio::test]
async fn test_custom_routes_take_precedence() {
    let app = Trellis::builder()
        .data_provider(data())
        .resource(posts())
        .custom_route(CustomRoute::new("/posts/report", "Report"))
        .build()
        .unwrap();

    assert_eq!(
        app.render(&Location::parse("/posts/report")).await,
        View::Custom {
            page: PageRef::new("Report"),
            params: Default::default(),
        }
    );
}

#[tokio::test]
async fn test_access_denied_renders_fallback() {
    let app = Trellis::builder()
        .data_provider(data())
        .resources([posts(), users()])
        .access_control_provider(Arc::new(DenyResource("users")))
        .catch_all("NotFound")
        .build()
        .unwrap();

    assert_eq!(
        app.render(&Location::parse("/custom-users")).await,
        View::CatchAll {
            page: PageRef::new("NotFound")
        }
    );

    let menu = app.accessible_menu(&Location::parse("/posts")).await;
    let names: Vec<&str> = menu.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["posts"]);
}

#[tokio::test]
async fn test_unauthenticated_flow() {
    let router = Arc::new(MemoryRouter::new());
    let notes = Arc::new(RecordingNotifier::new());
    let app = Trellis::builder()
        .data_provider(data())
        .auth_provider(Arc::new(MemoryAuthProvider::new().with_user("admin", "secret")))
        .router_provider(router.clone())
        .notification_provider(notes.clone())
        .resource(posts())
        .login_page("Login")
        .build()
        .unwrap();

    assert_eq!(
        app.render(&Location::parse("/posts/edit/1?tab=seo")).await,
        View::Redirect {
            to: "/login?to=%2Fposts%2Fedit%2F1%3Ftab%3Dseo".to_string()
        }
    );
    assert_eq!(
        app.render(&Location::parse("/login")).await,
        View::Login {
            page: PageRef::new("Login")
        }
    );

    router.push("/login?to=%2Fposts%2Fedit%2F1");
    app.auth()
        .login(json!({"username": "admin", "password": "secret"}))
        .await
        .unwrap();
    assert_eq!(router.location().pathname, "/posts/edit/1");

    assert_eq!(
        app.render_current().await,
        View::Page {
            page: PageRef::new("PostEdit"),
            props: post_props(Some("1")),
        }
    );

    app.auth().logout(json!(null)).await.unwrap();
    assert_eq!(router.location().pathname, "/login");
    assert!(!app.auth().is_authenticated().await);
}

#[tokio::test]
async fn test_translated_labels_and_hooks_share_the_app_env() {
    let translator = StaticTranslator::new("de")
        .with_message("de", "posts.posts", "Beiträge")
        .with_message("de", "dashboard.title", "Übersicht");
    let app = Trellis::builder()
        .data_provider(data())
        .translation_provider(Arc::new(translator))
        .resource(posts())
        .dashboard("Dashboard")
        .options(AppOptions::default())
        .build()
        .unwrap();

    let labels: Vec<String> = app
        .menu(&Location::parse("/"))
        .items
        .into_iter()
        .map(|i| i.label)
        .collect();
    assert_eq!(labels, vec!["Übersicht".to_string(), "Beiträge".to_string()]);

    let page = app
        .data()
        .list(
            GetListParams {
                resource: "posts".to_string(),
                ..GetListParams::default()
            },
            &NotifyConfig::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(app.env().cache.len(), 1);
}

#[tokio::test]
async fn test_apps_do_not_share_state() {
    let build = || {
        Trellis::builder()
            .data_provider(data())
            .resource(posts())
            .build()
            .unwrap()
    };
    let first = build();
    let second = build();

    first
        .data()
        .list(
            GetListParams {
                resource: "posts".to_string(),
                ..GetListParams::default()
            },
            &NotifyConfig::default(),
        )
        .await
        .unwrap();
    assert_eq!(first.env().cache.len(), 1);
    assert!(second.env().cache.is_empty());
}
