//! Data provider abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::HttpError;

/// A record as exchanged with data providers.
pub type Record = Value;

/// Free-form per-call metadata forwarded to the provider.
pub type MetaData = serde_json::Map<String, Value>;

/// Result type for data provider calls.
pub type HttpResult<T> = std::result::Result<T, HttpError>;

/// Page selection for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 1-based page index.
    pub current: u32,

    /// Records per page.
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current: 1,
            page_size: 10,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// One sort criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Field to sort by.
    pub field: String,

    /// Direction.
    pub order: SortOrder,
}

impl SortSpec {
    /// Ascending sort on `field`.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    /// Descending sort on `field`.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }
}

/// Filter comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Greater than.
    Gt,
    /// Less than or equal.
    Lte,
    /// Greater than or equal.
    Gte,
    /// Value is one of an array.
    In,
    /// Value is none of an array.
    Nin,
    /// String contains (case-insensitive).
    Contains,
    /// Field is null or absent.
    Null,
}

/// One filter criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Field to filter on.
    pub field: String,

    /// Comparison operator.
    pub operator: FilterOperator,

    /// Right-hand operand.
    pub value: Value,
}

impl Filter {
    /// Build a filter.
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Parameters for [`DataProvider::get_list`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetListParams {
    /// Resource name.
    pub resource: String,
    /// Page selection; `None` lets the provider decide.
    pub pagination: Option<Pagination>,
    /// Sort criteria in priority order.
    pub sort: Vec<SortSpec>,
    /// Filters, all of which must hold.
    pub filters: Vec<Filter>,
    /// Extra metadata.
    pub meta: MetaData,
}

/// Parameters for [`DataProvider::get_many`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetManyParams {
    /// Resource name.
    pub resource: String,
    /// Record ids.
    pub ids: Vec<String>,
    /// Extra metadata.
    pub meta: MetaData,
}

/// Parameters for [`DataProvider::get_one`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetOneParams {
    /// Resource name.
    pub resource: String,
    /// Record id.
    pub id: String,
    /// Extra metadata.
    pub meta: MetaData,
}

/// Parameters for [`DataProvider::create`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateParams {
    /// Resource name.
    pub resource: String,
    /// Field values of the new record.
    pub variables: Value,
    /// Extra metadata.
    pub meta: MetaData,
}

/// Parameters for [`DataProvider::update`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateParams {
    /// Resource name.
    pub resource: String,
    /// Record id.
    pub id: String,
    /// Changed field values.
    pub variables: Value,
    /// Extra metadata.
    pub meta: MetaData,
}

/// Parameters for [`DataProvider::delete_one`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteOneParams {
    /// Resource name.
    pub resource: String,
    /// Record id.
    pub id: String,
    /// Extra metadata.
    pub meta: MetaData,
}

/// HTTP method of a custom request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomMethod {
    /// GET
    #[default]
    Get,
    /// DELETE
    Delete,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
}

impl CustomMethod {
    /// Lowercase method name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Delete => "delete",
            Self::Head => "head",
            Self::Options => "options",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
        }
    }
}

/// Parameters for [`DataProvider::custom`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomParams {
    /// Target URL.
    pub url: String,
    /// HTTP method.
    pub method: CustomMethod,
    /// Sort criteria.
    pub sort: Vec<SortSpec>,
    /// Filters.
    pub filters: Vec<Filter>,
    /// Query-string values.
    pub query: Option<Value>,
    /// Request body.
    pub payload: Option<Value>,
    /// Extra headers.
    pub headers: BTreeMap<String, String>,
    /// Extra metadata.
    pub meta: MetaData,
}

/// Response of [`DataProvider::get_list`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetListResponse {
    /// Records of the requested page.
    pub data: Vec<Record>,
    /// Total number of matching records.
    pub total: u64,
}

/// Response of [`DataProvider::get_many`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetManyResponse {
    /// Records found, in provider order.
    pub data: Vec<Record>,
}

/// Response carrying a single record (get-one, create, update, delete).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordResponse {
    /// The record.
    pub data: Record,
}

/// Response of [`DataProvider::custom`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomResponse {
    /// Response body.
    pub data: Value,
}

/// Id of a record as a string, accepting numeric and string ids.
pub fn record_id(record: &Record) -> Option<String> {
    match record.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Backend access for resource records.
///
/// Implementations translate these calls into whatever protocol the backend
/// speaks. Errors are reported as [`HttpError`] so hooks can surface the
/// status code and hand the error to the auth provider's session check.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// List records with pagination, sorting and filtering.
    async fn get_list(&self, params: GetListParams) -> HttpResult<GetListResponse>;

    /// Fetch several records by id.
    ///
    /// The default implementation issues one `get_one` per id.
    async fn get_many(&self, params: GetManyParams) -> HttpResult<GetManyResponse> {
        let mut data = Vec::with_capacity(params.ids.len());
        for id in params.ids {
            let one = self
                .get_one(GetOneParams {
                    resource: params.resource.clone(),
                    id,
                    meta: params.meta.clone(),
                })
                .await?;
            data.push(one.data);
        }
        Ok(GetManyResponse { data })
    }

    /// Fetch one record.
    async fn get_one(&self, params: GetOneParams) -> HttpResult<RecordResponse>;

    /// Create a record.
    async fn create(&self, params: CreateParams) -> HttpResult<RecordResponse>;

    /// Update a record.
    async fn update(&self, params: UpdateParams) -> HttpResult<RecordResponse>;

    /// Delete a record.
    async fn delete_one(&self, params: DeleteOneParams) -> HttpResult<RecordResponse>;

    /// Issue a request outside the CRUD vocabulary.
    async fn custom(&self, params: CustomParams) -> HttpResult<CustomResponse> {
        Err(HttpError::new(format!(
            "custom {} {} is not supported by this data provider",
            params.method.as_str(),
            params.url
        ))
        .with_status(501))
    }

    /// Base URL of the backend, for display.
    fn api_url(&self) -> &str {
        ""
    }
}
