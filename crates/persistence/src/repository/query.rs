//! Read operations.

use futures::TryFutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::aggregation::decode_aggregations;
use crate::client::EngineClient;
use crate::error::{EngineError, RepositoryResult};
use crate::types::{AggregateResult, Document, Filters, Paging};

use super::Repository;

/// Window used by [`Repository::list_elements`].
pub const LIST_WINDOW: u32 = 10_000;

/// One search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<T> {
    pub id: String,
    /// Physical index holding the document (differs from the alias under rollover).
    pub index: String,
    pub version: Option<u64>,
    pub document: T,
}

/// One page of search hits.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult<T> {
    /// Total matching documents.
    pub total: u64,
    pub hits: Vec<SearchHit<T>>,
}

impl<T> SearchResult<T> {
    pub fn documents(self) -> Vec<T> {
        self.hits.into_iter().map(|hit| hit.document).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

impl<T: DeserializeOwned> SearchResult<T> {
    /// Decodes the `hits` section of a search response.
    pub fn from_response(response: &Value) -> RepositoryResult<Self> {
        let hits = response.get("hits").ok_or_else(|| EngineError::UnexpectedResponse {
            message: "search response without hits".to_string(),
        })?;

        let total = match hits.get("total") {
            Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
            Some(total) => total.get("value").and_then(Value::as_u64).unwrap_or(0),
            None => 0,
        };

        let hits = hits
            .get("hits")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|hit| -> RepositoryResult<SearchHit<T>> {
                let source = hit.get("_source").cloned().unwrap_or(Value::Null);
                Ok(SearchHit {
                    id: string_field(hit, "_id"),
                    index: string_field(hit, "_index"),
                    version: hit.get("_version").and_then(Value::as_u64),
                    document: serde_json::from_value(source)?,
                })
            })
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok(Self { total, hits })
    }
}

fn string_field(hit: &Value, field: &str) -> String {
    hit.get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

impl<D: Document, C: EngineClient> Repository<D, C> {
    /// Whether a document with `id` exists.
    pub async fn exists(&self, id: &D::Id) -> RepositoryResult<bool> {
        let id = id.to_string();
        let (client, index, id) = (self.client.as_ref(), self.index(), id.as_str());
        self.call("exists", move || client.exists(index, id, id).err_into())
            .await
    }

    /// Number of documents matching `filters`.
    pub async fn count<F: Filters + ?Sized>(&self, filters: &F) -> RepositoryResult<u64> {
        let body = self.requests.count_body(filters);
        let (client, index) = (self.client.as_ref(), self.index());
        self.call("count", move || client.count(index, body.clone()).err_into())
            .await
    }

    /// Whether any document matches `filters`.
    pub async fn any<F: Filters + ?Sized>(&self, filters: &F) -> RepositoryResult<bool> {
        Ok(self.count(filters).await? > 0)
    }

    /// One page of documents matching `filters`.
    pub async fn search<F: Filters + ?Sized>(
        &self,
        filters: &F,
        paging: &Paging,
    ) -> RepositoryResult<SearchResult<D>> {
        let body = self.requests.search_body(filters, paging);
        let response = self.raw_search("search", body).await?;
        SearchResult::from_response(&response)
    }

    /// Up to [`LIST_WINDOW`] matching documents, projected onto `T`.
    pub async fn list_elements<T, F>(&self, filters: &F) -> RepositoryResult<Vec<T>>
    where
        T: DeserializeOwned,
        F: Filters + ?Sized,
    {
        let body = self
            .requests
            .search_body(filters, &Paging::new(0, LIST_WINDOW));
        let response = self.raw_search("list_elements", body).await?;
        Ok(SearchResult::<T>::from_response(&response)?.documents())
    }

    /// The document with `id`, or `None` when absent.
    pub async fn get(&self, id: &D::Id) -> RepositoryResult<Option<D>> {
        let id = id.to_string();
        let (client, index, id) = (self.client.as_ref(), self.index(), id.as_str());
        let hit = self
            .call("get", move || client.get(index, id, id).err_into())
            .await?;

        match hit {
            Some(hit) if hit.get("found").and_then(Value::as_bool) != Some(false) => {
                let source = hit.get("_source").cloned().unwrap_or(Value::Null);
                Ok(Some(serde_json::from_value(source)?))
            }
            _ => Ok(None),
        }
    }

    /// Aggregations of the annotated properties over the documents matching
    /// `filters`.
    pub async fn aggregations<F: Filters + ?Sized>(
        &self,
        filters: &F,
    ) -> RepositoryResult<Vec<AggregateResult>> {
        let body = self.requests.aggregation_body(filters);
        let response = self.raw_search("aggregations", body).await?;
        Ok(response
            .get("aggregations")
            .map(decode_aggregations)
            .unwrap_or_default())
    }

    async fn raw_search(&self, operation: &'static str, body: Value) -> RepositoryResult<Value> {
        let (client, index) = (self.client.as_ref(), self.index());
        self.call(operation, move || client.search(index, body.clone()).err_into())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        name: String,
    }

    #[test]
    fn test_decode_search_response() {
        let response = json!({
            "hits": {
                "total": { "value": 42, "relation": "eq" },
                "hits": [
                    { "_index": "orders-000001", "_id": "a", "_version": 3, "_source": { "name": "x" } }
                ]
            }
        });
        let result = SearchResult::<Row>::from_response(&response).unwrap();
        assert_eq!(result.total, 42);
        assert_eq!(result.hits[0].id, "a");
        assert_eq!(result.hits[0].index, "orders-000001");
        assert_eq!(result.hits[0].version, Some(3));
        assert_eq!(result.documents(), vec![Row { name: "x".to_string() }]);
    }

    #[test]
    fn test_missing_hits_is_unexpected() {
        let err = SearchResult::<Row>::from_response(&json!({})).unwrap_err();
        assert!(err.to_string().contains("without hits"));
    }
}
