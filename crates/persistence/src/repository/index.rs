//! Index lifecycle: creation (optionally behind a rollover alias), deletion,
//! statistics and cluster health.

use futures::TryFutureExt;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::client::EngineClient;
use crate::config::DEFAULT_MAX_DOCUMENTS;
use crate::error::RepositoryResult;
use crate::types::Document;

use super::Repository;

/// Primary-shard statistics of an index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub document_count: u64,
    pub deleted_documents: u64,
    pub size_in_bytes: u64,
}

impl IndexStats {
    fn from_primaries(primaries: &Value) -> Self {
        let read = |section: &str, field: &str| {
            primaries
                .get(section)
                .and_then(|s| s.get(field))
                .and_then(Value::as_u64)
                .unwrap_or(0)
        };
        Self {
            document_count: read("docs", "count"),
            deleted_documents: read("docs", "deleted"),
            size_in_bytes: read("store", "size_in_bytes"),
        }
    }
}

/// Cluster health as reported for the repository index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClusterHealth {
    pub cluster_name: String,
    /// `green`, `yellow` or `red`.
    pub status: String,
    pub timed_out: bool,
    pub number_of_nodes: u32,
    pub number_of_data_nodes: u32,
    pub active_primary_shards: u32,
    pub active_shards: u32,
    pub relocating_shards: u32,
    pub initializing_shards: u32,
    pub unassigned_shards: u32,
}

impl ClusterHealth {
    pub fn is_green(&self) -> bool {
        self.status == "green"
    }
}

/// Suffix of the first physical index behind a rollover alias.
const FIRST_INDEX_SUFFIX: &str = "000001";

impl<D: Document, C: EngineClient> Repository<D, C> {
    /// Creates the index.
    ///
    /// With a rollover alias this installs a lifecycle policy named after
    /// the document type (unless one exists), an index template for
    /// `{pattern}-*` and the first physical index `{pattern}-000001` as the
    /// alias write index. Returns `false` when the target index already
    /// exists.
    pub async fn create_index(&self) -> RepositoryResult<bool> {
        if self.options.use_rollover_alias {
            return self.create_rollover_index().await;
        }

        let index = self.index();
        if self.index_exists(index).await? {
            info!(index = %index, "Index already exists");
            return Ok(false);
        }

        let body = json!({
            "settings": { "index": { "max_inner_result_window": self.options.max_inner_result_window } }
        });
        let client = self.client.as_ref();
        self.call("create_index", move || {
            client.create_index(index, body.clone()).err_into()
        })
        .await?;

        info!(index = %index, "Index created");
        Ok(true)
    }

    async fn create_rollover_index(&self) -> RepositoryResult<bool> {
        let client = self.client.as_ref();
        let alias = self.index();
        let pattern = self.options.pattern();

        if !self.index_exists(alias).await? {
            let policy = self.schema().type_name().to_lowercase();
            let policy = policy.as_str();

            let existing = self
                .call("get_lifecycle", move || client.get_lifecycle(policy).err_into())
                .await?;
            if existing.is_none() {
                let body = json!({
                    "policy": { "phases": { "hot": { "actions": { "rollover": {
                        "max_docs": self.options.max_documents.unwrap_or(DEFAULT_MAX_DOCUMENTS),
                        "max_size": format!("{}gb", self.options.max_size_gb),
                    } } } } }
                });
                self.call("put_lifecycle", move || {
                    client.put_lifecycle(policy, body.clone()).err_into()
                })
                .await?;
                info!(policy = %policy, "Lifecycle policy created");
            }

            let template = json!({
                "index_patterns": [format!("{}-*", pattern)],
                "template": {
                    "settings": {
                        "index.lifecycle.name": policy,
                        "index.lifecycle.rollover_alias": alias,
                    },
                    "mappings": {}
                }
            });
            self.call("put_index_template", move || {
                client.put_index_template(pattern, template.clone()).err_into()
            })
            .await?;
            info!(template = %pattern, "Index template created");
        }

        let first_index = format!("{}-{}", pattern, FIRST_INDEX_SUFFIX);
        if self.index_exists(&first_index).await? {
            info!(index = %first_index, alias = %alias, "Rollover index already exists");
            return Ok(false);
        }

        let body = json!({
            "settings": { "index": { "max_inner_result_window": self.options.max_inner_result_window } },
            "aliases": { alias: { "is_write_index": true } }
        });
        let first = first_index.as_str();
        self.call("create_index", move || {
            client.create_index(first, body.clone()).err_into()
        })
        .await?;

        info!(index = %first_index, alias = %alias, "Rollover index created");
        Ok(true)
    }

    /// Deletes the documents and the index.
    ///
    /// Behind an existing rollover alias every member index is emptied and
    /// deleted in parallel before the alias itself is removed. Failures of
    /// individual member indices are logged.
    pub async fn delete_index(&self) -> RepositoryResult<()> {
        let client = self.client.as_ref();
        let index = self.index();
        let match_everything = json!({ "query_string": { "query": "*" } });

        if self.options.use_rollover_alias && self.index_exists(index).await? {
            let members = self
                .call("get_alias", move || client.get_alias(index).err_into())
                .await?;

            let purges = members.iter().map(|member| {
                let query = match_everything.clone();
                self.call("delete_by_query", move || {
                    client.delete_by_query(member, query.clone()).err_into()
                })
            });
            log_failures("delete_by_query", &members, join_all(purges).await);

            let deletions = members.iter().map(|member| {
                self.call("delete_index", move || client.delete_index(member).err_into())
            });
            log_failures("delete_index", &members, join_all(deletions).await);

            self.call("delete_alias", move || client.delete_alias(index).err_into())
                .await?;
            info!(alias = %index, indices = members.len(), "Rollover alias deleted");
            return Ok(());
        }

        self.call("delete_by_query", move || {
            client
                .delete_by_query(index, match_everything.clone())
                .err_into()
        })
        .await?;
        self.call("delete_index", move || client.delete_index(index).err_into())
            .await?;

        info!(index = %index, "Index deleted");
        Ok(())
    }

    /// Whether the index (or alias) `name` exists.
    pub async fn index_exists(&self, name: &str) -> RepositoryResult<bool> {
        let client = self.client.as_ref();
        self.call("index_exists", move || client.index_exists(name).err_into())
            .await
    }

    /// Size of the primary shards in bytes.
    pub async fn index_size(&self) -> RepositoryResult<Option<u64>> {
        Ok(self
            .primaries()
            .await?
            .and_then(|p| p.pointer("/store/size_in_bytes").and_then(Value::as_u64)))
    }

    /// Primary-shard statistics.
    pub async fn index_stats(&self) -> RepositoryResult<Option<IndexStats>> {
        Ok(self
            .primaries()
            .await?
            .map(|p| IndexStats::from_primaries(&p)))
    }

    /// Cluster health scoped to the repository index.
    pub async fn health(&self) -> RepositoryResult<ClusterHealth> {
        let (client, index) = (self.client.as_ref(), self.index());
        let response = self
            .call("health", move || client.cluster_health(index).err_into())
            .await?;
        Ok(serde_json::from_value(response)?)
    }

    async fn primaries(&self) -> RepositoryResult<Option<Value>> {
        let (client, index) = (self.client.as_ref(), self.index());
        let response = self
            .call("index_stats", move || client.index_stats(index).err_into())
            .await?;
        Ok(response.pointer("/_all/primaries").cloned())
    }
}

fn log_failures(operation: &str, members: &[String], results: Vec<RepositoryResult<()>>) {
    for (member, result) in members.iter().zip(results) {
        if let Err(e) = result {
            warn!(operation, index = %member, error = %e, "Rollover member operation failed");
        }
    }
}
