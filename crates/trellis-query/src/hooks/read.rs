//! Read hooks: list, many, one and custom.

use std::sync::Arc;

use trellis_core::providers::{
    CustomParams, CustomResponse, GetListParams, GetListResponse, GetManyParams,
    GetManyResponse, GetOneParams, LiveCallback, RecordResponse,
};
use trellis_core::{Error, HttpError, LiveMode, NotificationArgs, Result};

use super::{DataHooks, NotifyConfig};
use crate::key::QueryKey;
use crate::live::LiveSubscription;

impl DataHooks {
    /// A page of records, served from the cache while fresh.
    pub async fn list(
        &self,
        params: GetListParams,
        notify: &NotifyConfig,
    ) -> Result<GetListResponse> {
        let key = QueryKey::list(&params);
        let notification_key = format!("{}-useList-notification", params.resource);
        let data = Arc::clone(&self.env.data);
        let result = self
            .env
            .cache
            .fetch(&key, move || async move { data.get_list(params).await })
            .await;
        self.settle_read(result, notify, notification_key).await
    }

    /// Records by id.
    pub async fn many(
        &self,
        params: GetManyParams,
        notify: &NotifyConfig,
    ) -> Result<GetManyResponse> {
        let key = QueryKey::many(&params);
        let first = params.ids.first().cloned().unwrap_or_default();
        let notification_key = format!("{first}-{}-getMany-notification", params.resource);
        let data = Arc::clone(&self.env.data);
        let result = self
            .env
            .cache
            .fetch(&key, move || async move { data.get_many(params).await })
            .await;
        self.settle_read(result, notify, notification_key).await
    }

    /// One record.
    pub async fn one(&self, params: GetOneParams, notify: &NotifyConfig) -> Result<RecordResponse> {
        let key = QueryKey::one(&params);
        let notification_key = format!("{}-{}-getOne-notification", params.id, params.resource);
        let data = Arc::clone(&self.env.data);
        let result = self
            .env
            .cache
            .fetch(&key, move || async move { data.get_one(params).await })
            .await;
        self.settle_read(result, notify, notification_key).await
    }

    /// A request outside the resource model.
    pub async fn custom(
        &self,
        params: CustomParams,
        notify: &NotifyConfig,
    ) -> Result<CustomResponse> {
        let key = QueryKey::custom(&params);
        let notification_key = format!("{}-notification", params.method.as_str());
        let data = Arc::clone(&self.env.data);
        let result = self
            .env
            .cache
            .fetch(&key, move || async move { data.custom(params).await })
            .await;
        self.settle_read(result, notify, notification_key).await
    }

    /// Subscribe to live events for the query behind `key`.
    ///
    /// The subscription carries the key's normalised parameters and ends when
    /// the returned guard is dropped.
    pub fn watch(
        &self,
        key: &QueryKey,
        mode: Option<LiveMode>,
        on_event: Option<LiveCallback>,
    ) -> Option<LiveSubscription> {
        self.env
            .live
            .subscribe_resource(key.resource(), key.params().clone(), mode, on_event)
    }

    async fn settle_read<T>(
        &self,
        result: Result<T>,
        notify: &NotifyConfig,
        notification_key: String,
    ) -> Result<T> {
        match result {
            Ok(value) => {
                self.env.notifier.open(&notify.success, None);
                Ok(value)
            }
            Err(Error::Http(error)) => {
                let fallback = self.read_error(&error, notification_key);
                Err(self.fail(error, &notify.error, fallback).await)
            }
            Err(other) => Err(other),
        }
    }

    fn read_error(&self, error: &HttpError, key: String) -> NotificationArgs {
        let status = error.status_label();
        NotificationArgs::error(self.env.translate(
            "notifications.error",
            &[("statusCode", status.as_str())],
            &format!("Error (status code: {status})"),
        ))
        .with_description(error.message.clone())
        .with_key(key)
    }
}
