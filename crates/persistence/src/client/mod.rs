//! The engine seam.
//!
//! [`EngineClient`] is the narrow set of engine calls the repository needs.
//! Bodies travel as JSON; the repository owns every decision about them.
//! A non-success status is reported as [`EngineError::Response`] except for
//! [`EngineClient::bulk`], whose status and per-item results are returned
//! as data so the caller can tell partial failures apart.

#[cfg(feature = "elasticsearch")]
mod elastic;

#[cfg(feature = "elasticsearch")]
pub use elastic::ElasticsearchClient;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{EngineError, EngineResult};

/// One action of a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkAction {
    /// Create or replace the document.
    Index { id: String, document: Value },
    /// Merge `document` into the stored document.
    Update { id: String, document: Value },
    Delete { id: String },
}

impl BulkAction {
    pub fn id(&self) -> &str {
        match self {
            BulkAction::Index { id, .. } | BulkAction::Update { id, .. } | BulkAction::Delete { id } => {
                id
            }
        }
    }

    /// NDJSON lines of the action (routed by its id).
    pub fn to_lines(&self, index: &str) -> Vec<Value> {
        match self {
            BulkAction::Index { id, document } => vec![
                serde_json::json!({ "index": { "_index": index, "_id": id, "routing": id } }),
                document.clone(),
            ],
            BulkAction::Update { id, document } => vec![
                serde_json::json!({ "update": { "_index": index, "_id": id, "routing": id } }),
                serde_json::json!({ "doc": document }),
            ],
            BulkAction::Delete { id } => vec![serde_json::json!({
                "delete": { "_index": index, "_id": id, "routing": id }
            })],
        }
    }
}

/// Outcome of one bulk item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemResult {
    pub id: String,
    pub status: u16,
    pub reason: Option<String>,
}

impl BulkItemResult {
    /// A 2xx item, or a 404 without an error object (delete of an absent
    /// document).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status) || self.is_absent()
    }

    /// The engine reported the document as already absent.
    pub fn is_absent(&self) -> bool {
        self.status == 404 && self.reason.is_none()
    }
}

/// Outcome of a whole bulk request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkResponse {
    /// HTTP status of the request.
    pub status: u16,
    pub items: Vec<BulkItemResult>,
    /// Engine reason for a non-success status.
    pub reason: Option<String>,
}

impl BulkResponse {
    /// A successful response acknowledging every id with `status`.
    pub fn acknowledged<'a>(ids: impl IntoIterator<Item = &'a str>, status: u16) -> Self {
        Self {
            status: 200,
            items: ids
                .into_iter()
                .map(|id| BulkItemResult {
                    id: id.to_string(),
                    status,
                    reason: None,
                })
                .collect(),
            reason: None,
        }
    }

    /// Items the engine rejected.
    pub fn failed_items(&self) -> impl Iterator<Item = &BulkItemResult> {
        self.items.iter().filter(|item| !item.is_success())
    }
}

/// Engine operations used by the repository.
#[async_trait]
pub trait EngineClient: Send + Sync + 'static {
    async fn exists(&self, index: &str, id: &str, routing: &str) -> EngineResult<bool>;

    /// Returns the raw hit (`_index`, `_version`, `_source`, ...) or `None`
    /// when the document does not exist.
    async fn get(&self, index: &str, id: &str, routing: &str) -> EngineResult<Option<Value>>;

    async fn count(&self, index: &str, body: Value) -> EngineResult<u64>;

    /// Returns the raw search response.
    async fn search(&self, index: &str, body: Value) -> EngineResult<Value>;

    async fn index(&self, index: &str, id: &str, routing: &str, document: Value)
    -> EngineResult<()>;

    /// Partial update: `partial` is merged into the stored document.
    async fn update(&self, index: &str, id: &str, routing: &str, partial: Value)
    -> EngineResult<()>;

    async fn delete(&self, index: &str, id: &str, routing: &str) -> EngineResult<()>;

    async fn bulk(&self, index: &str, actions: &[BulkAction]) -> EngineResult<BulkResponse>;

    async fn delete_by_query(&self, index: &str, query: Value) -> EngineResult<()>;

    async fn put_settings(&self, index: &str, settings: Value) -> EngineResult<()>;

    async fn index_exists(&self, index: &str) -> EngineResult<bool>;

    async fn create_index(&self, index: &str, body: Value) -> EngineResult<()>;

    async fn delete_index(&self, index: &str) -> EngineResult<()>;

    /// Names of the indices the alias points to (empty when unknown).
    async fn get_alias(&self, alias: &str) -> EngineResult<Vec<String>>;

    /// Removes the alias from every index.
    async fn delete_alias(&self, alias: &str) -> EngineResult<()>;

    /// Returns the raw `_stats` response.
    async fn index_stats(&self, index: &str) -> EngineResult<Value>;

    /// Returns the lifecycle policy, or `None` when it does not exist.
    async fn get_lifecycle(&self, policy: &str) -> EngineResult<Option<Value>>;

    async fn put_lifecycle(&self, policy: &str, body: Value) -> EngineResult<()>;

    async fn put_index_template(&self, name: &str, body: Value) -> EngineResult<()>;

    /// Returns the raw cluster health response, scoped to `index`.
    async fn cluster_health(&self, index: &str) -> EngineResult<Value>;
}

/// Parses a bulk response body.
pub fn parse_bulk_response(status: u16, body: &Value) -> BulkResponse {
    let items = body
        .get("items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_object()?.values().next())
                .map(|result| BulkItemResult {
                    id: result
                        .get("_id")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    status: result
                        .get("status")
                        .and_then(Value::as_u64)
                        .and_then(|s| u16::try_from(s).ok())
                        .unwrap_or(0),
                    reason: result.get("error").map(error_reason),
                })
                .collect()
        })
        .unwrap_or_default();

    let reason = if (200..300).contains(&status) {
        None
    } else {
        Some(body.get("error").map_or_else(|| body.to_string(), error_reason))
    };

    BulkResponse {
        status,
        items,
        reason,
    }
}

/// Extracts the engine's `error.reason` from a raw response body, falling
/// back to the body itself.
pub fn reason_from_body(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => match value.get("error") {
            Some(error) => error_reason(error),
            None => body.to_string(),
        },
        Err(_) => body.to_string(),
    }
}

fn error_reason(error: &Value) -> String {
    match error {
        Value::String(reason) => reason.clone(),
        other => other
            .get("reason")
            .and_then(Value::as_str)
            .map_or_else(|| other.to_string(), str::to_string),
    }
}

/// Builds a response error from a status and raw body.
pub fn response_error(status: u16, body: &str) -> EngineError {
    EngineError::Response {
        status,
        reason: reason_from_body(body),
    }
}
