//! Headless form controller: field state, the unsaved-changes prompt,
//! submission through the write hooks and the redirect afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use trellis_core::providers::{CreateParams, MetaData, RecordResponse, UpdateParams, record_id};
use trellis_core::{Error, ResourceDescriptor, Result};

use crate::hooks::{DataHooks, MutationConfig, NotifyConfig};

/// Translation key of the unsaved-changes prompt.
pub const UNSAVED_CHANGES_KEY: &str = "warnWhenUnsavedChanges";

const UNSAVED_CHANGES_DEFAULT: &str = "Are you sure you want to leave? You have unsaved changes.";

/// Where to go after a successful submit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectionType {
    /// The resource's list page.
    List,
    /// The record's edit page.
    #[default]
    Edit,
    /// The record's show page.
    Show,
    /// Stay on the form.
    Stay,
}

/// Path to navigate to after a submit, or `None` to stay.
///
/// Edit and show fall back to the list page when the resource has no such
/// page or the record id is unknown.
pub fn redirect_path(
    resource: &ResourceDescriptor,
    redirect: RedirectionType,
    id: Option<&str>,
) -> Option<String> {
    let route = &resource.route;
    match (redirect, id) {
        (RedirectionType::Stay, _) => None,
        (RedirectionType::Show, Some(id)) if resource.can_show => {
            Some(format!("/{route}/show/{id}"))
        }
        (RedirectionType::Edit, Some(id)) if resource.can_edit => {
            Some(format!("/{route}/edit/{id}"))
        }
        _ => Some(format!("/{route}")),
    }
}

/// What the form submits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    /// Create a new record (also used for clone).
    Create,
    /// Update the record with this id.
    Edit(String),
}

type SuccessCallback = Arc<dyn Fn(&RecordResponse, &Value) + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(&Error, &Value) + Send + Sync>;

/// Form state bound to one resource.
pub struct FormController {
    hooks: DataHooks,
    resource: ResourceDescriptor,
    action: FormAction,
    redirect: RedirectionType,
    warn_when_unsaved: bool,
    mutation: MutationConfig,
    meta: MetaData,
    on_success: Option<SuccessCallback>,
    on_error: Option<ErrorCallback>,
    values: Map<String, Value>,
    dirty: bool,
}

impl FormController {
    /// Form for `action` on `resource`. The unsaved-changes warning follows
    /// the application option until overridden.
    pub fn new(hooks: DataHooks, resource: ResourceDescriptor, action: FormAction) -> Self {
        let warn_when_unsaved = hooks.env().options.warn_when_unsaved_changes;
        Self {
            hooks,
            resource,
            action,
            redirect: RedirectionType::default(),
            warn_when_unsaved,
            mutation: MutationConfig::default(),
            meta: MetaData::new(),
            on_success: None,
            on_error: None,
            values: Map::new(),
            dirty: false,
        }
    }

    /// Start from existing field values (not dirty).
    pub fn with_values(mut self, values: Map<String, Value>) -> Self {
        self.values = values;
        self
    }

    /// Redirect after a successful submit.
    pub fn with_redirect(mut self, redirect: RedirectionType) -> Self {
        self.redirect = redirect;
        self
    }

    /// Override the unsaved-changes warning.
    pub fn warn_when_unsaved_changes(mut self, warn: bool) -> Self {
        self.warn_when_unsaved = warn;
        self
    }

    /// Notification overrides for the submit.
    pub fn with_notify(mut self, notify: NotifyConfig) -> Self {
        self.mutation.notify = notify;
        self
    }

    /// Mutation options for edits.
    pub fn with_mutation(mut self, mutation: MutationConfig) -> Self {
        self.mutation = mutation;
        self
    }

    /// Metadata passed to the data provider.
    pub fn with_meta(mut self, meta: MetaData) -> Self {
        self.meta = meta;
        self
    }

    /// Run `callback` after a successful submit instead of redirecting.
    pub fn on_success(
        mut self,
        callback: impl Fn(&RecordResponse, &Value) + Send + Sync + 'static,
    ) -> Self {
        self.on_success = Some(Arc::new(callback));
        self
    }

    /// Run `callback` after a failed submit.
    pub fn on_error(mut self, callback: impl Fn(&Error, &Value) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Current field values.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Whether a field changed since the last reset or submit.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Set one field, arming the unsaved-changes prompt when enabled.
    pub fn set_field(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(field.into(), value.into());
        self.dirty = true;
        if self.warn_when_unsaved {
            self.set_warn_when(true);
        }
    }

    /// Replace the field values and clear the dirty flag and prompt.
    pub fn reset(&mut self, values: Map<String, Value>) {
        self.values = values;
        self.dirty = false;
        self.set_warn_when(false);
    }

    /// Submit the current values through the create or update hook.
    ///
    /// On success the form is reset and the router follows the configured
    /// redirect, unless an `on_success` callback is set. Failures reach the
    /// `on_error` callback and are returned.
    pub async fn submit(&mut self) -> Result<RecordResponse> {
        self.set_warn_when(false);
        let values = Value::Object(self.values.clone());

        let result = match &self.action {
            FormAction::Create => {
                let params = CreateParams {
                    resource: self.resource.name.clone(),
                    variables: values.clone(),
                    meta: self.meta.clone(),
                };
                self.hooks.create(params, &self.mutation.notify).await
            }
            FormAction::Edit(id) => {
                let params = UpdateParams {
                    resource: self.resource.name.clone(),
                    id: id.clone(),
                    variables: values.clone(),
                    meta: self.meta.clone(),
                };
                self.hooks.update(params, &self.mutation).await
            }
        };

        match result {
            Ok(response) => {
                self.dirty = false;
                if let Some(callback) = &self.on_success {
                    callback(&response, &values);
                    return Ok(response);
                }
                let id = record_id(&response.data).or_else(|| match &self.action {
                    FormAction::Edit(id) => Some(id.clone()),
                    FormAction::Create => None,
                });
                if let Some(path) = redirect_path(&self.resource, self.redirect, id.as_deref()) {
                    tracing::debug!(
                        resource = %self.resource.name,
                        path = %path,
                        "redirect after submit"
                    );
                    self.hooks.env().router.push(&path);
                }
                Ok(response)
            }
            Err(err) => {
                if let Some(callback) = &self.on_error {
                    callback(&err, &values);
                }
                Err(err)
            }
        }
    }

    fn set_warn_when(&self, warn: bool) {
        let env = self.hooks.env();
        let prompt =
            warn.then(|| env.translate(UNSAVED_CHANGES_KEY, &[], UNSAVED_CHANGES_DEFAULT));
        env.router.set_prompt(prompt);
    }
}

impl fmt::Debug for FormController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormController")
            .field("resource", &self.resource.name)
            .field("action", &self.action)
            .field("redirect", &self.redirect)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}
