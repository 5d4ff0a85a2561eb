//! [`EngineClient`] over the official `elasticsearch` crate.

use std::fmt::Debug;

use async_trait::async_trait;
use elasticsearch::auth::Credentials;
use elasticsearch::cluster::ClusterHealthParts;
use elasticsearch::http::Url;
use elasticsearch::http::request::JsonBody;
use elasticsearch::http::response::Response;
use elasticsearch::http::transport::{
    CloudConnectionPool, SingleNodeConnectionPool, Transport, TransportBuilder,
};
use elasticsearch::ilm::{IlmGetLifecycleParts, IlmPutLifecycleParts};
use elasticsearch::indices::{
    IndicesCreateParts, IndicesDeleteAliasParts, IndicesDeleteParts, IndicesExistsParts,
    IndicesGetAliasParts, IndicesPutIndexTemplateParts, IndicesPutSettingsParts,
    IndicesStatsParts,
};
use elasticsearch::{
    BulkParts, CountParts, DeleteByQueryParts, DeleteParts, Elasticsearch, ExistsParts, GetParts,
    IndexParts, SearchParts, UpdateParts,
};
use serde_json::{Value, json};
use tracing::debug;

use crate::config::ConnectionConfig;
use crate::error::{ConfigError, EngineError, EngineResult};

use super::{BulkAction, BulkResponse, EngineClient, parse_bulk_response, response_error};

/// Engine client backed by an HTTP transport.
#[derive(Clone)]
pub struct ElasticsearchClient {
    client: Elasticsearch,
}

impl Debug for ElasticsearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchClient").finish_non_exhaustive()
    }
}

impl ElasticsearchClient {
    /// Builds the client from connection settings.
    ///
    /// A cloud id takes precedence over the node URI.
    pub fn new(config: &ConnectionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let transport = build_transport(config)?;
        Ok(Self {
            client: Elasticsearch::new(transport),
        })
    }

    /// Wraps an already configured client.
    pub fn from_client(client: Elasticsearch) -> Self {
        Self { client }
    }
}

fn build_transport(config: &ConnectionConfig) -> Result<Transport, ConfigError> {
    let builder = match config.cloud_id.as_deref().filter(|id| !id.is_empty()) {
        Some(cloud_id) => {
            let pool = CloudConnectionPool::new(cloud_id).map_err(|e| ConfigError::InvalidValue {
                field: "cloud_id",
                message: e.to_string(),
            })?;
            TransportBuilder::new(pool)
        }
        None => {
            let url = Url::parse(&config.uri).map_err(|e| ConfigError::InvalidValue {
                field: "uri",
                message: format!("Invalid URL: {}", e),
            })?;
            TransportBuilder::new(SingleNodeConnectionPool::new(url))
        }
    };

    let mut builder = builder.timeout(config.request_timeout());
    if let Some((user, password)) = config.basic_credentials() {
        builder = builder.auth(Credentials::Basic(user.to_string(), password.to_string()));
    }

    builder.build().map_err(|e| ConfigError::InvalidValue {
        field: "uri",
        message: format!("Failed to build transport: {}", e),
    })
}

fn transport_error(e: elasticsearch::Error) -> EngineError {
    EngineError::Transport {
        message: e.to_string(),
    }
}

/// Passes successful responses through, turns the rest into response errors.
async fn ensure_success(response: Response) -> EngineResult<Response> {
    let status = response.status_code();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(response_error(status.as_u16(), &body))
}

async fn read_json(response: Response) -> EngineResult<Value> {
    response
        .json::<Value>()
        .await
        .map_err(|e| EngineError::UnexpectedResponse {
            message: e.to_string(),
        })
}

#[async_trait]
impl EngineClient for ElasticsearchClient {
    async fn exists(&self, index: &str, id: &str, routing: &str) -> EngineResult<bool> {
        let response = self
            .client
            .exists(ExistsParts::IndexId(index, id))
            .routing(routing)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status_code().as_u16() {
            404 => Ok(false),
            _ => ensure_success(response).await.map(|_| true),
        }
    }

    async fn get(&self, index: &str, id: &str, routing: &str) -> EngineResult<Option<Value>> {
        let response = self
            .client
            .get(GetParts::IndexId(index, id))
            .routing(routing)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status_code().as_u16() == 404 {
            return Ok(None);
        }
        let hit = read_json(ensure_success(response).await?).await?;
        Ok(Some(hit))
    }

    async fn count(&self, index: &str, body: Value) -> EngineResult<u64> {
        debug!(index = %index, body = %body, "Count request");
        let response = self
            .client
            .count(CountParts::Index(&[index]))
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        let body = read_json(ensure_success(response).await?).await?;
        body.get("count")
            .and_then(Value::as_u64)
            .ok_or_else(|| EngineError::UnexpectedResponse {
                message: "count response without a count".to_string(),
            })
    }

    async fn search(&self, index: &str, body: Value) -> EngineResult<Value> {
        debug!(index = %index, body = %body, "Search request");
        let response = self
            .client
            .search(SearchParts::Index(&[index]))
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        read_json(ensure_success(response).await?).await
    }

    async fn index(
        &self,
        index: &str,
        id: &str,
        routing: &str,
        document: Value,
    ) -> EngineResult<()> {
        let response = self
            .client
            .index(IndexParts::IndexId(index, id))
            .routing(routing)
            .body(document)
            .send()
            .await
            .map_err(transport_error)?;

        ensure_success(response).await.map(|_| ())
    }

    async fn update(
        &self,
        index: &str,
        id: &str,
        routing: &str,
        partial: Value,
    ) -> EngineResult<()> {
        let response = self
            .client
            .update(UpdateParts::IndexId(index, id))
            .routing(routing)
            .body(json!({ "doc": partial }))
            .send()
            .await
            .map_err(transport_error)?;

        ensure_success(response).await.map(|_| ())
    }

    async fn delete(&self, index: &str, id: &str, routing: &str) -> EngineResult<()> {
        let response = self
            .client
            .delete(DeleteParts::IndexId(index, id))
            .routing(routing)
            .send()
            .await
            .map_err(transport_error)?;

        ensure_success(response).await.map(|_| ())
    }

    async fn bulk(&self, index: &str, actions: &[BulkAction]) -> EngineResult<BulkResponse> {
        let body: Vec<JsonBody<Value>> = actions
            .iter()
            .flat_map(|action| action.to_lines(index))
            .map(JsonBody::new)
            .collect();

        debug!(index = %index, actions = actions.len(), "Bulk request");
        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status_code().as_u16();
        let text = response.text().await.map_err(transport_error)?;
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
        Ok(parse_bulk_response(status, &body))
    }

    async fn delete_by_query(&self, index: &str, query: Value) -> EngineResult<()> {
        let response = self
            .client
            .delete_by_query(DeleteByQueryParts::Index(&[index]))
            .body(json!({ "query": query }))
            .send()
            .await
            .map_err(transport_error)?;

        ensure_success(response).await.map(|_| ())
    }

    async fn put_settings(&self, index: &str, settings: Value) -> EngineResult<()> {
        let response = self
            .client
            .indices()
            .put_settings(IndicesPutSettingsParts::Index(&[index]))
            .body(settings)
            .send()
            .await
            .map_err(transport_error)?;

        ensure_success(response).await.map(|_| ())
    }

    async fn index_exists(&self, index: &str) -> EngineResult<bool> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(transport_error)?;

        match response.status_code().as_u16() {
            404 => Ok(false),
            _ => ensure_success(response).await.map(|_| true),
        }
    }

    async fn create_index(&self, index: &str, body: Value) -> EngineResult<()> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        ensure_success(response).await.map(|_| ())
    }

    async fn delete_index(&self, index: &str) -> EngineResult<()> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[index]))
            .send()
            .await
            .map_err(transport_error)?;

        ensure_success(response).await.map(|_| ())
    }

    async fn get_alias(&self, alias: &str) -> EngineResult<Vec<String>> {
        let response = self
            .client
            .indices()
            .get_alias(IndicesGetAliasParts::Name(&[alias]))
            .send()
            .await
            .map_err(transport_error)?;

        if response.status_code().as_u16() == 404 {
            return Ok(Vec::new());
        }
        let body = read_json(ensure_success(response).await?).await?;
        Ok(body
            .as_object()
            .map(|indices| indices.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_alias(&self, alias: &str) -> EngineResult<()> {
        let response = self
            .client
            .indices()
            .delete_alias(IndicesDeleteAliasParts::IndexName(&["_all"], &[alias]))
            .send()
            .await
            .map_err(transport_error)?;

        ensure_success(response).await.map(|_| ())
    }

    async fn index_stats(&self, index: &str) -> EngineResult<Value> {
        let response = self
            .client
            .indices()
            .stats(IndicesStatsParts::Index(&[index]))
            .send()
            .await
            .map_err(transport_error)?;

        read_json(ensure_success(response).await?).await
    }

    async fn get_lifecycle(&self, policy: &str) -> EngineResult<Option<Value>> {
        let response = self
            .client
            .ilm()
            .get_lifecycle(IlmGetLifecycleParts::Policy(policy))
            .send()
            .await
            .map_err(transport_error)?;

        if response.status_code().as_u16() == 404 {
            return Ok(None);
        }
        let body = read_json(ensure_success(response).await?).await?;
        Ok(body.get(policy).cloned())
    }

    async fn put_lifecycle(&self, policy: &str, body: Value) -> EngineResult<()> {
        let response = self
            .client
            .ilm()
            .put_lifecycle(IlmPutLifecycleParts::Policy(policy))
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        ensure_success(response).await.map(|_| ())
    }

    async fn put_index_template(&self, name: &str, body: Value) -> EngineResult<()> {
        let response = self
            .client
            .indices()
            .put_index_template(IndicesPutIndexTemplateParts::Name(name))
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        ensure_success(response).await.map(|_| ())
    }

    async fn cluster_health(&self, index: &str) -> EngineResult<Value> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::Index(&[index]))
            .send()
            .await
            .map_err(transport_error)?;

        read_json(ensure_success(response).await?).await
    }
}
