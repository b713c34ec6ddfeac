//! Write hooks: create, update and delete, with the three mutation modes.

use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use trellis_core::naming::singularize;
use trellis_core::providers::{
    CreateParams, DeleteOneParams, HttpResult, LiveEvent, LiveEventPayload, LiveEventType,
    RecordResponse, UpdateParams, record_id,
};
use trellis_core::{Error, HttpError, MutationMode, NotificationArgs, NotificationOverride, Result};

use super::{DataHooks, MutationConfig, NotifyConfig};
use crate::cache::{CacheSnapshot, QueryCache};
use crate::key::QueryKey;
use crate::memory::merge;
use crate::undo::UndoOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteKind {
    Create,
    Edit,
    Delete,
}

impl WriteKind {
    fn event_type(self) -> LiveEventType {
        match self {
            Self::Create => LiveEventType::Created,
            Self::Edit => LiveEventType::Updated,
            Self::Delete => LiveEventType::Deleted,
        }
    }

    fn success_key(self) -> &'static str {
        match self {
            Self::Create => "notifications.createSuccess",
            Self::Edit => "notifications.editSuccess",
            Self::Delete => "notifications.deleteSuccess",
        }
    }

    fn success_default(self, singular: &str) -> String {
        match self {
            Self::Create => format!("Successfully created {singular}"),
            Self::Edit => format!("Successfully edited {singular}"),
            Self::Delete => format!("Successfully deleted a {singular}"),
        }
    }

    fn error_key(self) -> &'static str {
        match self {
            Self::Create => "notifications.createError",
            Self::Edit => "notifications.editError",
            Self::Delete => "notifications.deleteError",
        }
    }

    fn error_default(self, singular: &str, status: &str) -> String {
        match self {
            Self::Create => {
                format!("There was an error creating {singular} (status code: {status})")
            }
            Self::Edit => format!("Error when updating {singular} (status code: {status})"),
            Self::Delete => format!("Error (status code: {status})"),
        }
    }
}

impl DataHooks {
    /// Create a record. Always pessimistic.
    pub async fn create(
        &self,
        params: CreateParams,
        notify: &NotifyConfig,
    ) -> Result<RecordResponse> {
        let resource = params.resource.clone();
        match self.env.data.create(params).await {
            Ok(response) => {
                let ids = record_id(&response.data).map(|id| vec![id]);
                self.write_succeeded(WriteKind::Create, &resource, None, &notify.success, ids);
                Ok(response)
            }
            Err(error) => {
                let fallback = self.write_error(WriteKind::Create, &resource, None, &error);
                Err(self.fail(error, &notify.error, fallback).await)
            }
        }
    }

    /// Update a record in the effective mutation mode.
    pub async fn update(
        &self,
        params: UpdateParams,
        config: &MutationConfig,
    ) -> Result<RecordResponse> {
        let resource = params.resource.clone();
        let id = params.id.clone();
        let changes = params.variables.clone();
        let data = Arc::clone(&self.env.data);
        self.mutate(
            WriteKind::Edit,
            &resource,
            &id,
            config,
            |key, cached| patch_cached(key, cached, &id, &changes),
            move || async move { data.update(params).await },
        )
        .await
    }

    /// Delete a record in the effective mutation mode.
    pub async fn delete_one(
        &self,
        params: DeleteOneParams,
        config: &MutationConfig,
    ) -> Result<RecordResponse> {
        let resource = params.resource.clone();
        let id = params.id.clone();
        let data = Arc::clone(&self.env.data);
        self.mutate(
            WriteKind::Delete,
            &resource,
            &id,
            config,
            |key, cached| drop_cached(key, cached, &id),
            move || async move { data.delete_one(params).await },
        )
        .await
    }

    async fn mutate<F, Fut>(
        &self,
        kind: WriteKind,
        resource: &str,
        id: &str,
        config: &MutationConfig,
        optimistic: impl FnMut(&QueryKey, &mut Value),
        call: F,
    ) -> Result<RecordResponse>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = HttpResult<RecordResponse>>,
    {
        let mode = config
            .mutation_mode
            .unwrap_or(self.env.options.mutation_mode);
        tracing::debug!(resource, id, ?mode, ?kind, "mutation started");

        let mut rollback = RollbackGuard {
            cache: &self.env.cache,
            snapshot: match mode {
                MutationMode::Pessimistic => None,
                MutationMode::Optimistic | MutationMode::Undoable => Some(
                    self.env
                        .cache
                        .update_where(|key| key.matches_resource(resource), optimistic),
                ),
            },
        };

        if mode == MutationMode::Undoable {
            let timeout = config
                .undoable_timeout
                .unwrap_or_else(|| self.env.options.undoable_timeout());
            match self.env.undo.start(id, resource, timeout).wait().await {
                UndoOutcome::Commit => {}
                UndoOutcome::Cancel => {
                    rollback.restore();
                    tracing::info!(resource, id, "mutation undone");
                    return Err(cancelled(resource, id));
                }
                UndoOutcome::Superseded => {
                    rollback.disarm();
                    tracing::debug!(resource, id, "mutation superseded by a newer one");
                    return Err(cancelled(resource, id));
                }
            }
        }

        match call().await {
            Ok(response) => {
                rollback.disarm();
                let ids = Some(vec![id.to_string()]);
                self.write_succeeded(kind, resource, Some(id), &config.notify.success, ids);
                Ok(response)
            }
            Err(error) => {
                rollback.restore();
                let fallback = self.write_error(kind, resource, Some(id), &error);
                Err(self.fail(error, &config.notify.error, fallback).await)
            }
        }
    }

    /// Notify, invalidate the resource's cached queries, then publish.
    fn write_succeeded(
        &self,
        kind: WriteKind,
        resource: &str,
        id: Option<&str>,
        choice: &NotificationOverride,
        ids: Option<Vec<String>>,
    ) {
        let singular = self.singular(resource);
        let mut fallback = NotificationArgs::success(self.env.translate(
            "notifications.success",
            &[],
            "Success",
        ))
        .with_description(self.env.translate(
            kind.success_key(),
            &[("resource", singular.as_str())],
            &kind.success_default(&singularize(resource)),
        ));
        if let Some(id) = id {
            fallback = fallback.with_key(format!("{id}-{resource}-notification"));
        }
        self.env.notifier.open(choice, Some(fallback));

        self.env.cache.invalidate_resource(resource);

        self.env.live.publish(LiveEvent {
            channel: LiveEvent::resource_channel(resource),
            event_type: kind.event_type(),
            payload: LiveEventPayload {
                ids,
                data: Value::Null,
            },
            date: self.env.clock.now(),
        });
    }

    fn write_error(
        &self,
        kind: WriteKind,
        resource: &str,
        id: Option<&str>,
        error: &HttpError,
    ) -> NotificationArgs {
        let singular = self.singular(resource);
        let status = error.status_label();
        let mut args = NotificationArgs::error(self.env.translate(
            kind.error_key(),
            &[("resource", singular.as_str()), ("statusCode", status.as_str())],
            &kind.error_default(&singularize(resource), &status),
        ))
        .with_description(error.message.clone());
        if let Some(id) = id {
            args = args.with_key(format!("{id}-{resource}-notification"));
        }
        args
    }
}

/// Restores the optimistic snapshot on drop unless disarmed, so a mutation
/// abandoned mid-flight leaves the cache as it found it.
struct RollbackGuard<'a> {
    cache: &'a QueryCache,
    snapshot: Option<CacheSnapshot>,
}

impl RollbackGuard<'_> {
    fn restore(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.cache.restore(snapshot);
        }
    }

    fn disarm(&mut self) {
        self.snapshot = None;
    }
}

impl Drop for RollbackGuard<'_> {
    fn drop(&mut self) {
        if self.snapshot.is_some() {
            tracing::debug!("mutation abandoned, rolling back optimistic update");
            self.restore();
        }
    }
}

fn cancelled(resource: &str, id: &str) -> Error {
    Error::Cancelled {
        resource: resource.to_string(),
        id: id.to_string(),
    }
}

/// Merge `changes` into every cached copy of record `id`.
fn patch_cached(key: &QueryKey, cached: &mut Value, id: &str, changes: &Value) {
    match key.operation() {
        "list" | "many" => {
            if let Some(rows) = cached.get_mut("data").and_then(Value::as_array_mut) {
                for row in rows
                    .iter_mut()
                    .filter(|row| record_id(row).as_deref() == Some(id))
                {
                    merge(row, changes);
                }
            }
        }
        "one" => {
            if key.params().get("id").and_then(Value::as_str) == Some(id) {
                if let Some(record) = cached.get_mut("data") {
                    merge(record, changes);
                }
            }
        }
        _ => {}
    }
}

/// Remove record `id` from cached lists, adjusting list totals.
fn drop_cached(key: &QueryKey, cached: &mut Value, id: &str) {
    if !matches!(key.operation(), "list" | "many") {
        return;
    }
    let removed = match cached.get_mut("data").and_then(Value::as_array_mut) {
        Some(rows) => {
            let before = rows.len();
            rows.retain(|row| record_id(row).as_deref() != Some(id));
            before - rows.len()
        }
        None => 0,
    };
    if removed == 0 || key.operation() != "list" {
        return;
    }
    if let Some(object) = cached.as_object_mut() {
        let total = object.get("total").and_then(Value::as_u64).unwrap_or(0);
        object.insert(
            "total".to_string(),
            Value::from(total.saturating_sub(removed as u64)),
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    use trellis_core::providers::{
        GetListParams, GetListResponse, LiveCallback, LiveEvent, LiveProvider, RouterProvider,
        SubscribeParams, WILDCARD,
    };
    use trellis_core::{AppOptions, NotificationKey, NotificationKind};

    use super::*;
    use crate::hooks::fixtures::{Fixture, fixture};

    fn posts() -> GetListParams {
        GetListParams {
            resource: "posts".to_string(),
            ..GetListParams::default()
        }
    }

    fn rename_first(title: &str) -> UpdateParams {
        UpdateParams {
            resource: "posts".to_string(),
            id: "1".to_string(),
            variables: json!({"title": title}),
            ..UpdateParams::default()
        }
    }

    fn delete_first() -> DeleteOneParams {
        DeleteOneParams {
            resource: "posts".to_string(),
            id: "1".to_string(),
            ..DeleteOneParams::default()
        }
    }

    fn cached_list(f: &Fixture) -> GetListResponse {
        f.hooks
            .env()
            .cache
            .get_data(&QueryKey::list(&posts()))
            .unwrap()
            .unwrap()
    }

    fn record_events(f: &Fixture) -> Arc<Mutex<Vec<LiveEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let callback: LiveCallback = Arc::new(move |event: &LiveEvent| {
            sink.lock().push(event.clone());
        });
        f.live.subscribe(SubscribeParams {
            channel: LiveEvent::resource_channel("posts"),
            types: vec![WILDCARD.to_string()],
            params: Value::Null,
            callback,
        });
        events
    }

    #[tokio::test]
    async fn test_create_notifies_invalidates_and_publishes() {
        let f = fixture(AppOptions::default());
        let events = record_events(&f);
        f.hooks.list(posts(), &NotifyConfig::default()).await.unwrap();

        let created = f
            .hooks
            .create(
                CreateParams {
                    resource: "posts".to_string(),
                    variables: json!({"title": "New"}),
                    ..CreateParams::default()
                },
                &NotifyConfig::default(),
            )
            .await
            .unwrap();
        assert_eq!(created.data["id"], 3);

        let note = f.notes.last().unwrap();
        assert_eq!(note.kind, NotificationKind::Success);
        assert_eq!(note.message, "Success");
        assert_eq!(note.description.as_deref(), Some("Successfully created post"));

        let key = QueryKey::list(&posts());
        assert!(!f.hooks.env().cache.is_fresh(&key));

        let events = events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, LiveEventType::Created);
        assert_eq!(events[0].payload.ids, Some(vec!["3".to_string()]));
    }

    #[tokio::test]
    async fn test_create_error_message() {
        let f = fixture(AppOptions::default());
        f.data
            .fail_next(HttpError::new("title is required").with_status(422));
        let err = f
            .hooks
            .create(
                CreateParams {
                    resource: "posts".to_string(),
                    ..CreateParams::default()
                },
                &NotifyConfig::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(422));

        let note = f.notes.last().unwrap();
        assert_eq!(note.kind, NotificationKind::Error);
        assert_eq!(
            note.message,
            "There was an error creating post (status code: 422)"
        );
        assert_eq!(note.description.as_deref(), Some("title is required"));
        assert_eq!(f.router.location().pathname, "/posts");
    }

    #[tokio::test]
    async fn test_pessimistic_update_waits_for_server() {
        let f = fixture(AppOptions::default());
        f.hooks.list(posts(), &NotifyConfig::default()).await.unwrap();
        f.data.fail_next(HttpError::new("conflict").with_status(409));

        f.hooks
            .update(rename_first("Changed"), &MutationConfig::default())
            .await
            .unwrap_err();
        assert_eq!(cached_list(&f).data[0]["title"], "Hello");
        assert_eq!(
            f.notes.last().unwrap().message,
            "Error when updating post (status code: 409)"
        );
    }

    #[tokio::test]
    async fn test_optimistic_update_rolls_back_on_error() {
        let f = fixture(AppOptions::default().with_mutation_mode(MutationMode::Optimistic));
        f.hooks.list(posts(), &NotifyConfig::default()).await.unwrap();
        f.data.fail_next(HttpError::new("conflict").with_status(409));

        f.hooks
            .update(rename_first("Changed"), &MutationConfig::default())
            .await
            .unwrap_err();
        assert_eq!(cached_list(&f).data[0]["title"], "Hello");
        assert_eq!(f.data.records("posts")[0]["title"], "Hello");
    }

    #[tokio::test]
    async fn test_optimistic_update_success() {
        let f = fixture(AppOptions::default());
        f.hooks.list(posts(), &NotifyConfig::default()).await.unwrap();
        let config = MutationConfig::default().with_mode(MutationMode::Optimistic);

        f.hooks
            .update(rename_first("Changed"), &config)
            .await
            .unwrap();
        assert_eq!(cached_list(&f).data[0]["title"], "Changed");
        assert_eq!(f.data.records("posts")[0]["title"], "Changed");
        assert!(!f.hooks.env().cache.is_fresh(&QueryKey::list(&posts())));
        assert_eq!(
            f.notes.last().unwrap().description.as_deref(),
            Some("Successfully edited post")
        );
    }

    #[test]
    fn test_drop_cached_adjusts_total() {
        let key = QueryKey::list(&posts());
        let mut cached = json!({"data": [{"id": 1}, {"id": 2}], "total": 2});
        drop_cached(&key, &mut cached, "1");
        assert_eq!(cached, json!({"data": [{"id": 2}], "total": 1}));

        drop_cached(&key, &mut cached, "9");
        assert_eq!(cached, json!({"data": [{"id": 2}], "total": 1}));
    }

    #[test]
    fn test_patch_cached_one() {
        let key = QueryKey::one(&trellis_core::providers::GetOneParams {
            resource: "posts".to_string(),
            id: "1".to_string(),
            ..Default::default()
        });
        let mut cached = json!({"data": {"id": 1, "title": "Hello"}});
        patch_cached(&key, &mut cached, "2", &json!({"title": "Other"}));
        assert_eq!(cached["data"]["title"], "Hello");
        patch_cached(&key, &mut cached, "1", &json!({"title": "Changed"}));
        assert_eq!(cached["data"]["title"], "Changed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_undoable_delete_commits_after_window() {
        let f = fixture(
            AppOptions::default()
                .with_mutation_mode(MutationMode::Undoable)
                .with_undoable_timeout_ms(3000),
        );
        let events = record_events(&f);
        f.hooks.list(posts(), &NotifyConfig::default()).await.unwrap();

        let started = tokio::time::Instant::now();
        f.hooks
            .delete_one(delete_first(), &MutationConfig::default())
            .await
            .unwrap();
        assert_eq!(started.elapsed(), Duration::from_millis(3000));

        assert_eq!(f.data.records("posts").len(), 1);
        assert!(f.hooks.env().undo.pending().is_empty());
        assert_eq!(events.lock()[0].event_type, LiveEventType::Deleted);
        assert_eq!(
            f.notes.last().unwrap().description.as_deref(),
            Some("Successfully deleted a post")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_undoable_update_cancelled_rolls_back() {
        let f = fixture(AppOptions::default().with_mutation_mode(MutationMode::Undoable));
        f.hooks.list(posts(), &NotifyConfig::default()).await.unwrap();

        let hooks = f.hooks.clone();
        let task = tokio::spawn(async move {
            hooks
                .update(rename_first("Changed"), &MutationConfig::default())
                .await
        });
        while f.hooks.env().undo.pending().is_empty() {
            tokio::task::yield_now().await;
        }
        assert_eq!(cached_list(&f).data[0]["title"], "Changed");

        assert!(f.hooks.env().undo.cancel(&NotificationKey::new("1", "posts")));
        let err = task.await.unwrap().unwrap_err();
        assert!(err.is_cancelled());

        assert_eq!(cached_list(&f).data[0]["title"], "Hello");
        assert_eq!(f.data.calls(), vec!["get_list posts".to_string()]);
        assert!(f.hooks.env().undo.pending().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_undoable_commit_early() {
        let f = fixture(AppOptions::default());
        let config = MutationConfig::default()
            .with_mode(MutationMode::Undoable)
            .with_undoable_timeout(Duration::from_secs(30));

        let hooks = f.hooks.clone();
        let task = tokio::spawn(async move { hooks.delete_one(delete_first(), &config).await });
        while f.hooks.env().undo.pending().is_empty() {
            tokio::task::yield_now().await;
        }
        let started = tokio::time::Instant::now();
        assert!(f.hooks.env().undo.commit(&NotificationKey::new("1", "posts")));
        task.await.unwrap().unwrap();
        assert!(started.elapsed() < Duration::from_secs(30));
        assert_eq!(f.data.records("posts").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_undoable_update_restarted_keeps_latest_patch() {
        let f = fixture(AppOptions::default().with_mutation_mode(MutationMode::Undoable));
        f.hooks.list(posts(), &NotifyConfig::default()).await.unwrap();
        let key = NotificationKey::new("1", "posts");

        let hooks = f.hooks.clone();
        let first = tokio::spawn(async move {
            hooks
                .update(rename_first("First"), &MutationConfig::default())
                .await
        });
        while f.hooks.env().undo.pending().is_empty() {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let hooks = f.hooks.clone();
        let second = tokio::spawn(async move {
            hooks
                .update(rename_first("Second"), &MutationConfig::default())
                .await
        });
        let err = first.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::Cancelled { ref id, .. } if id == "1"));

        assert_eq!(f.hooks.env().undo.pending(), vec![key.clone()]);
        assert_eq!(cached_list(&f).data[0]["title"], "Second");

        assert!(f.hooks.env().undo.commit(&key));
        second.await.unwrap().unwrap();
        assert_eq!(
            f.data.calls(),
            vec!["get_list posts".to_string(), "update posts/1".to_string()]
        );
        assert_eq!(f.data.records("posts")[0]["title"], "Second");
        assert!(f.hooks.env().undo.pending().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_undoable_update_rolls_back() {
        let f = fixture(AppOptions::default().with_mutation_mode(MutationMode::Undoable));
        f.hooks.list(posts(), &NotifyConfig::default()).await.unwrap();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(1500),
            f.hooks
                .update(rename_first("Changed"), &MutationConfig::default()),
        )
        .await;
        assert!(abandoned.is_err());
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(cached_list(&f).data[0]["title"], "Hello");
        assert!(f.hooks.env().undo.pending().is_empty());
        assert_eq!(f.data.calls(), vec!["get_list posts".to_string()]);
        assert_eq!(f.data.records("posts")[0]["title"], "Hello");
    }
}
