//! In-memory engine recording every call.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use lumen_persistence::client::{BulkAction, BulkItemResult, BulkResponse, EngineClient};
use lumen_persistence::error::{EngineError, EngineResult};
use parking_lot::Mutex;
use serde_json::{Value, json};

/// One recorded engine call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Exists { index: String, id: String, routing: String },
    Get { index: String, id: String, routing: String },
    Count { index: String, body: Value },
    Search { index: String, body: Value },
    Index { index: String, id: String, routing: String },
    Update { index: String, id: String, routing: String, partial: Value },
    Delete { index: String, id: String, routing: String },
    Bulk { index: String, ids: Vec<String> },
    DeleteByQuery { index: String, query: Value },
    PutSettings { index: String, settings: Value },
    IndexExists { index: String },
    CreateIndex { index: String, body: Value },
    DeleteIndex { index: String },
    GetAlias { alias: String },
    DeleteAlias { alias: String },
    IndexStats { index: String },
    GetLifecycle { policy: String },
    PutLifecycle { policy: String, body: Value },
    PutIndexTemplate { name: String, body: Value },
    ClusterHealth { index: String },
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    documents: BTreeMap<String, Value>,
    indices: HashSet<String>,
    aliases: HashMap<String, Vec<String>>,
    lifecycles: HashMap<String, Value>,
    /// Errors returned by the next calls, whatever they are.
    scripted_errors: VecDeque<EngineError>,
    /// Error returned by every call once set.
    permanent_error: Option<EngineError>,
    /// Whole-request answers for the next bulk calls.
    bulk_statuses: VecDeque<(u16, String)>,
    /// Ids rejected by bulk with the number of rejections left.
    bulk_rejections: HashMap<String, u32>,
    search_response: Option<Value>,
    stats_response: Option<Value>,
    /// Refresh interval setting refused by `put_settings`.
    refused_refresh: Option<(String, EngineError)>,
}

/// Scriptable in-memory [`EngineClient`].
#[derive(Default)]
pub struct MockEngine {
    state: Mutex<State>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Number of recorded calls accepted by `predicate`.
    pub fn count_calls(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    /// Item ids of every bulk call, in call order.
    pub fn bulk_batches(&self) -> Vec<Vec<String>> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::Bulk { ids, .. } => Some(ids.clone()),
                _ => None,
            })
            .collect()
    }

    /// `refresh_interval` values set through `put_settings`, in call order.
    pub fn refresh_settings(&self) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                Call::PutSettings { settings, .. } => settings
                    .pointer("/index/refresh_interval")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .collect()
    }

    pub fn document(&self, id: &str) -> Option<Value> {
        self.state.lock().documents.get(id).cloned()
    }

    pub fn document_count(&self) -> usize {
        self.state.lock().documents.len()
    }

    pub fn put_document(&self, id: &str, document: Value) {
        self.state.lock().documents.insert(id.to_string(), document);
    }

    pub fn add_index(&self, index: &str) {
        self.state.lock().indices.insert(index.to_string());
    }

    pub fn has_index(&self, index: &str) -> bool {
        self.state.lock().indices.contains(index)
    }

    pub fn add_alias(&self, alias: &str, members: &[&str]) {
        let mut state = self.state.lock();
        for member in members {
            state.indices.insert(member.to_string());
        }
        state
            .aliases
            .insert(alias.to_string(), members.iter().map(|m| m.to_string()).collect());
    }

    pub fn add_lifecycle(&self, policy: &str) {
        self.state
            .lock()
            .lifecycles
            .insert(policy.to_string(), json!({ "policy": {} }));
    }

    /// The next `times` calls fail with `error`.
    pub fn fail_next(&self, times: usize, error: EngineError) {
        let mut state = self.state.lock();
        for _ in 0..times {
            state.scripted_errors.push_back(error.clone());
        }
    }

    /// Every call fails with `error`.
    pub fn fail_always(&self, error: EngineError) {
        self.state.lock().permanent_error = Some(error);
    }

    /// The next bulk call answers `status` with `reason` for the whole request.
    pub fn bulk_status_next(&self, status: u16, reason: &str) {
        self.state
            .lock()
            .bulk_statuses
            .push_back((status, reason.to_string()));
    }

    /// Bulk rejects `id` with a 429 the next `times` times it is sent.
    pub fn reject_item(&self, id: &str, times: u32) {
        self.state.lock().bulk_rejections.insert(id.to_string(), times);
    }

    /// Every attempt to set the refresh interval to `setting` fails with `error`.
    pub fn refuse_refresh(&self, setting: &str, error: EngineError) {
        self.state.lock().refused_refresh = Some((setting.to_string(), error));
    }

    pub fn set_search_response(&self, response: Value) {
        self.state.lock().search_response = Some(response);
    }

    pub fn set_stats_response(&self, response: Value) {
        self.state.lock().stats_response = Some(response);
    }

    /// Records `call`, then returns the scripted error if any.
    fn record(&self, call: Call) -> EngineResult<()> {
        let mut state = self.state.lock();
        state.calls.push(call);
        if let Some(error) = state.scripted_errors.pop_front() {
            return Err(error);
        }
        match &state.permanent_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn not_found(what: &str) -> EngineError {
    EngineError::Response {
        status: 404,
        reason: format!("{} not found", what),
    }
}

#[async_trait]
impl EngineClient for MockEngine {
    async fn exists(&self, index: &str, id: &str, routing: &str) -> EngineResult<bool> {
        self.record(Call::Exists {
            index: index.to_string(),
            id: id.to_string(),
            routing: routing.to_string(),
        })?;
        Ok(self.state.lock().documents.contains_key(id))
    }

    async fn get(&self, index: &str, id: &str, routing: &str) -> EngineResult<Option<Value>> {
        self.record(Call::Get {
            index: index.to_string(),
            id: id.to_string(),
            routing: routing.to_string(),
        })?;
        Ok(self.state.lock().documents.get(id).map(|source| {
            json!({ "_index": index, "_id": id, "_version": 1, "found": true, "_source": source })
        }))
    }

    async fn count(&self, index: &str, body: Value) -> EngineResult<u64> {
        self.record(Call::Count {
            index: index.to_string(),
            body,
        })?;
        Ok(self.state.lock().documents.len() as u64)
    }

    async fn search(&self, index: &str, body: Value) -> EngineResult<Value> {
        let size = body.get("size").and_then(Value::as_u64).unwrap_or(10) as usize;
        let from = body.get("from").and_then(Value::as_u64).unwrap_or(0) as usize;
        self.record(Call::Search {
            index: index.to_string(),
            body,
        })?;

        let state = self.state.lock();
        if let Some(response) = &state.search_response {
            return Ok(response.clone());
        }
        let hits: Vec<Value> = state
            .documents
            .iter()
            .skip(from)
            .take(size)
            .map(|(id, source)| {
                json!({ "_index": index, "_id": id, "_version": 1, "_source": source })
            })
            .collect();
        Ok(json!({
            "hits": {
                "total": { "value": state.documents.len(), "relation": "eq" },
                "hits": hits
            }
        }))
    }

    async fn index(
        &self,
        index: &str,
        id: &str,
        routing: &str,
        document: Value,
    ) -> EngineResult<()> {
        self.record(Call::Index {
            index: index.to_string(),
            id: id.to_string(),
            routing: routing.to_string(),
        })?;
        self.state.lock().documents.insert(id.to_string(), document);
        Ok(())
    }

    async fn update(
        &self,
        index: &str,
        id: &str,
        routing: &str,
        partial: Value,
    ) -> EngineResult<()> {
        self.record(Call::Update {
            index: index.to_string(),
            id: id.to_string(),
            routing: routing.to_string(),
            partial: partial.clone(),
        })?;
        let mut state = self.state.lock();
        let Some(Value::Object(stored)) = state.documents.get_mut(id) else {
            return Err(not_found("document"));
        };
        if let Value::Object(fields) = partial {
            stored.extend(fields);
        }
        Ok(())
    }

    async fn delete(&self, index: &str, id: &str, routing: &str) -> EngineResult<()> {
        self.record(Call::Delete {
            index: index.to_string(),
            id: id.to_string(),
            routing: routing.to_string(),
        })?;
        match self.state.lock().documents.remove(id) {
            Some(_) => Ok(()),
            None => Err(not_found("document")),
        }
    }

    async fn bulk(&self, index: &str, actions: &[BulkAction]) -> EngineResult<BulkResponse> {
        self.record(Call::Bulk {
            index: index.to_string(),
            ids: actions.iter().map(|a| a.id().to_string()).collect(),
        })?;

        let mut state = self.state.lock();
        if let Some((status, reason)) = state.bulk_statuses.pop_front() {
            return Ok(BulkResponse {
                status,
                items: Vec::new(),
                reason: Some(reason),
            });
        }

        let mut items = Vec::with_capacity(actions.len());
        for action in actions {
            let id = action.id().to_string();
            if let Some(left) = state.bulk_rejections.get_mut(&id) {
                if *left > 0 {
                    *left -= 1;
                    items.push(BulkItemResult {
                        id,
                        status: 429,
                        reason: Some("es_rejected_execution_exception".to_string()),
                    });
                    continue;
                }
            }

            let status = match action {
                BulkAction::Index { document, .. } => {
                    state.documents.insert(id.clone(), document.clone());
                    201
                }
                BulkAction::Update { document, .. } => {
                    state.documents.insert(id.clone(), document.clone());
                    200
                }
                BulkAction::Delete { .. } => match state.documents.remove(&id) {
                    Some(_) => 200,
                    None => 404,
                },
            };
            items.push(BulkItemResult {
                id,
                status,
                reason: None,
            });
        }

        Ok(BulkResponse {
            status: 200,
            items,
            reason: None,
        })
    }

    async fn delete_by_query(&self, index: &str, query: Value) -> EngineResult<()> {
        self.record(Call::DeleteByQuery {
            index: index.to_string(),
            query,
        })?;
        self.state.lock().documents.clear();
        Ok(())
    }

    async fn put_settings(&self, index: &str, settings: Value) -> EngineResult<()> {
        let refresh = settings["index"]["refresh_interval"].as_str().map(str::to_string);
        self.record(Call::PutSettings {
            index: index.to_string(),
            settings,
        })?;
        match &self.state.lock().refused_refresh {
            Some((setting, error)) if refresh.as_deref() == Some(setting.as_str()) => {
                Err(error.clone())
            }
            _ => Ok(()),
        }
    }

    async fn index_exists(&self, index: &str) -> EngineResult<bool> {
        self.record(Call::IndexExists {
            index: index.to_string(),
        })?;
        let state = self.state.lock();
        Ok(state.indices.contains(index) || state.aliases.contains_key(index))
    }

    async fn create_index(&self, index: &str, body: Value) -> EngineResult<()> {
        self.record(Call::CreateIndex {
            index: index.to_string(),
            body: body.clone(),
        })?;
        let mut state = self.state.lock();
        state.indices.insert(index.to_string());
        if let Some(aliases) = body.get("aliases").and_then(Value::as_object) {
            for alias in aliases.keys() {
                state
                    .aliases
                    .entry(alias.clone())
                    .or_default()
                    .push(index.to_string());
            }
        }
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> EngineResult<()> {
        self.record(Call::DeleteIndex {
            index: index.to_string(),
        })?;
        match self.state.lock().indices.remove(index) {
            true => Ok(()),
            false => Err(not_found("index")),
        }
    }

    async fn get_alias(&self, alias: &str) -> EngineResult<Vec<String>> {
        self.record(Call::GetAlias {
            alias: alias.to_string(),
        })?;
        Ok(self
            .state
            .lock()
            .aliases
            .get(alias)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_alias(&self, alias: &str) -> EngineResult<()> {
        self.record(Call::DeleteAlias {
            alias: alias.to_string(),
        })?;
        self.state.lock().aliases.remove(alias);
        Ok(())
    }

    async fn index_stats(&self, index: &str) -> EngineResult<Value> {
        self.record(Call::IndexStats {
            index: index.to_string(),
        })?;
        let state = self.state.lock();
        Ok(state.stats_response.clone().unwrap_or_else(|| {
            json!({
                "_all": { "primaries": {
                    "docs": { "count": state.documents.len(), "deleted": 0 },
                    "store": { "size_in_bytes": state.documents.len() * 100 }
                } }
            })
        }))
    }

    async fn get_lifecycle(&self, policy: &str) -> EngineResult<Option<Value>> {
        self.record(Call::GetLifecycle {
            policy: policy.to_string(),
        })?;
        Ok(self.state.lock().lifecycles.get(policy).cloned())
    }

    async fn put_lifecycle(&self, policy: &str, body: Value) -> EngineResult<()> {
        self.record(Call::PutLifecycle {
            policy: policy.to_string(),
            body: body.clone(),
        })?;
        self.state.lock().lifecycles.insert(policy.to_string(), body);
        Ok(())
    }

    async fn put_index_template(&self, name: &str, body: Value) -> EngineResult<()> {
        self.record(Call::PutIndexTemplate {
            name: name.to_string(),
            body,
        })
    }

    async fn cluster_health(&self, index: &str) -> EngineResult<Value> {
        self.record(Call::ClusterHealth {
            index: index.to_string(),
        })?;
        Ok(json!({
            "cluster_name": "mock",
            "status": "green",
            "timed_out": false,
            "number_of_nodes": 1,
            "number_of_data_nodes": 1,
            "active_primary_shards": 1,
            "active_shards": 1,
            "relocating_shards": 0,
            "initializing_shards": 0,
            "unassigned_shards": 0
        }))
    }
}
