//! In-memory data provider.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, VecDeque};

use trellis_core::HttpError;
use trellis_core::providers::{
    CreateParams, DataProvider, DeleteOneParams, Filter, FilterOperator, GetListParams,
    GetListResponse, GetOneParams, HttpResult, Record, RecordResponse, SortOrder, SortSpec,
    UpdateParams, record_id,
};

/// Tables of JSON records keyed by resource name.
///
/// New records get the next numeric id of their table unless they carry
/// one. Failures can be queued with [`fail_next`](Self::fail_next) to
/// exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryDataProvider {
    tables: RwLock<BTreeMap<String, Vec<Record>>>,
    failures: Mutex<VecDeque<HttpError>>,
    calls: Mutex<Vec<String>>,
}

impl MemoryDataProvider {
    /// Empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table.
    pub fn with_records(self, resource: impl Into<String>, records: Vec<Record>) -> Self {
        self.tables.write().insert(resource.into(), records);
        self
    }

    /// Current contents of a table.
    pub fn records(&self, resource: &str) -> Vec<Record> {
        self.tables.read().get(resource).cloned().unwrap_or_default()
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: HttpError) {
        self.failures.lock().push_back(error);
    }

    /// Calls received so far, as `operation resource[/id]`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record_call(&self, call: String) -> HttpResult<()> {
        self.calls.lock().push(call);
        match self.failures.lock().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn not_found(resource: &str, id: &str) -> HttpError {
        HttpError::new(format!("Record {id} not found in {resource}")).with_status(404)
    }
}

#[async_trait]
impl DataProvider for MemoryDataProvider {
    async fn get_list(&self, params: GetListParams) -> HttpResult<GetListResponse> {
        self.record_call(format!("get_list {}", params.resource))?;

        let mut rows: Vec<Record> = self
            .records(&params.resource)
            .into_iter()
            .filter(|record| params.filters.iter().all(|f| matches_filter(record, f)))
            .collect();
        sort_records(&mut rows, &params.sort);

        let total = rows.len() as u64;
        let data = match params.pagination {
            Some(page) => {
                let size = page.page_size as usize;
                let start = (page.current.max(1) as usize - 1).saturating_mul(size);
                rows.into_iter().skip(start).take(size).collect()
            }
            None => rows,
        };
        Ok(GetListResponse { data, total })
    }

    async fn get_one(&self, params: GetOneParams) -> HttpResult<RecordResponse> {
        self.record_call(format!("get_one {}/{}", params.resource, params.id))?;
        self.records(&params.resource)
            .into_iter()
            .find(|r| record_id(r).as_deref() == Some(params.id.as_str()))
            .map(|data| RecordResponse { data })
            .ok_or_else(|| Self::not_found(&params.resource, &params.id))
    }

    async fn create(&self, params: CreateParams) -> HttpResult<RecordResponse> {
        self.record_call(format!("create {}", params.resource))?;
        let Value::Object(mut record) = params.variables else {
            return Err(HttpError::new("record must be a JSON object").with_status(400));
        };

        let mut tables = self.tables.write();
        let table = tables.entry(params.resource).or_default();
        if !record.contains_key("id") {
            let next = table
                .iter()
                .filter_map(|r| r.get("id").and_then(Value::as_u64))
                .max()
                .unwrap_or(0)
                + 1;
            record.insert("id".to_string(), Value::from(next));
        }
        let data = Value::Object(record);
        table.push(data.clone());
        Ok(RecordResponse { data })
    }

    async fn update(&self, params: UpdateParams) -> HttpResult<RecordResponse> {
        self.record_call(format!("update {}/{}", params.resource, params.id))?;
        let mut tables = self.tables.write();
        let record = tables
            .get_mut(&params.resource)
            .and_then(|t| {
                t.iter_mut()
                    .find(|r| record_id(r).as_deref() == Some(params.id.as_str()))
            })
            .ok_or_else(|| Self::not_found(&params.resource, &params.id))?;
        merge(record, &params.variables);
        Ok(RecordResponse {
            data: record.clone(),
        })
    }

    async fn delete_one(&self, params: DeleteOneParams) -> HttpResult<RecordResponse> {
        self.record_call(format!("delete_one {}/{}", params.resource, params.id))?;
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(&params.resource)
            .ok_or_else(|| Self::not_found(&params.resource, &params.id))?;
        let index = table
            .iter()
            .position(|r| record_id(r).as_deref() == Some(params.id.as_str()))
            .ok_or_else(|| Self::not_found(&params.resource, &params.id))?;
        Ok(RecordResponse {
            data: table.remove(index),
        })
    }

    fn api_url(&self) -> &str {
        "memory://"
    }
}

/// Shallow-merge the members of `patch` into `record`.
pub(crate) fn merge(record: &mut Value, patch: &Value) {
    if let (Value::Object(target), Value::Object(changes)) = (record, patch) {
        for (field, value) in changes {
            target.insert(field.clone(), value.clone());
        }
    }
}

fn matches_filter(record: &Record, filter: &Filter) -> bool {
    let field = record.get(&filter.field).unwrap_or(&Value::Null);
    let value = &filter.value;
    match filter.operator {
        FilterOperator::Eq => loosely_equal(field, value),
        FilterOperator::Ne => !loosely_equal(field, value),
        FilterOperator::Lt => compare(field, value) == Ordering::Less,
        FilterOperator::Gt => compare(field, value) == Ordering::Greater,
        FilterOperator::Lte => compare(field, value) != Ordering::Greater,
        FilterOperator::Gte => compare(field, value) != Ordering::Less,
        FilterOperator::In => value
            .as_array()
            .is_some_and(|options| options.iter().any(|o| loosely_equal(field, o))),
        FilterOperator::Nin => !value
            .as_array()
            .is_some_and(|options| options.iter().any(|o| loosely_equal(field, o))),
        FilterOperator::Contains => match (field, value) {
            (Value::String(haystack), Value::String(needle)) => haystack
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => false,
        },
        FilterOperator::Null => field.is_null() == value.as_bool().unwrap_or(true),
    }
}

/// Equality that treats `1` and `"1"` as the same id.
fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            n.to_string() == *s
        }
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn sort_records(rows: &mut [Record], sort: &[SortSpec]) {
    if sort.is_empty() {
        return;
    }
    let null = Value::Null;
    rows.sort_by(|a, b| {
        sort.iter()
            .map(|spec| {
                let ord = compare(
                    a.get(&spec.field).unwrap_or(&null),
                    b.get(&spec.field).unwrap_or(&null),
                );
                match spec.order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            })
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}
