//! Chunked bulk writes.
//!
//! Inserts and updates are split into `bulk_chunk_size` requests sent one
//! after the other. The index refresh is switched off for the duration of
//! the load and restored afterwards, whether or not every chunk succeeded.
//! Inside a chunk only the items the engine rejected are sent again on the
//! next attempt.

use std::collections::HashSet;
use std::time::Duration;

use futures::TryFutureExt;
use parking_lot::Mutex;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::client::{BulkAction, EngineClient};
use crate::error::{BulkError, EngineError, RepositoryError, RepositoryResult};
use crate::types::Document;

use super::Repository;

/// Index refresh setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshInterval {
    /// No periodic refresh (`-1`).
    Disabled,
    Every(Duration),
}

impl RefreshInterval {
    /// Value of the `index.refresh_interval` setting.
    pub fn setting(&self) -> String {
        match self {
            RefreshInterval::Disabled => "-1".to_string(),
            RefreshInterval::Every(interval) if interval.subsec_millis() == 0 => {
                format!("{}s", interval.as_secs())
            }
            RefreshInterval::Every(interval) => format!("{}ms", interval.as_millis()),
        }
    }
}

impl From<Duration> for RefreshInterval {
    fn from(interval: Duration) -> Self {
        RefreshInterval::Every(interval)
    }
}

/// Statuses for which a whole bulk request is reported but never retried.
const ACCEPTED_REQUEST_ERRORS: [u16; 2] = [400, 413];

impl<D: Document, C: EngineClient> Repository<D, C> {
    /// Indexes every entity, replacing previous versions.
    pub async fn bulk_insert(&self, entities: &[D]) -> RepositoryResult<()> {
        let actions = entities
            .iter()
            .map(|entity| {
                Ok(BulkAction::Index {
                    id: entity.document_id(),
                    document: serde_json::to_value(entity)?,
                })
            })
            .collect::<RepositoryResult<Vec<_>>>()?;
        self.bulk_write("bulk_insert", actions).await
    }

    /// Merges every entity into its stored document.
    pub async fn bulk_update(&self, entities: &[D]) -> RepositoryResult<()> {
        let actions = entities
            .iter()
            .map(|entity| {
                Ok(BulkAction::Update {
                    id: entity.document_id(),
                    document: serde_json::to_value(entity)?,
                })
            })
            .collect::<RepositoryResult<Vec<_>>>()?;
        self.bulk_write("bulk_update", actions).await
    }

    /// Deletes every id in a single bulk request.
    ///
    /// The request is retried when it cannot be sent; rejected items are
    /// reported, not retried.
    pub async fn bulk_delete(&self, ids: &[D::Id]) -> RepositoryResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let actions: Vec<BulkAction> = ids
            .iter()
            .map(|id| BulkAction::Delete { id: id.to_string() })
            .collect();
        let (client, index, actions) = (self.client.as_ref(), self.index(), actions.as_slice());
        let response = self
            .call("bulk_delete", move || client.bulk(index, actions).err_into())
            .await?;

        if !(200..300).contains(&response.status) {
            return Err(EngineError::Response {
                status: response.status,
                reason: response.reason.unwrap_or_default(),
            }
            .into());
        }

        let absent = response.items.iter().filter(|item| item.is_absent()).count();
        if absent > 0 {
            debug!(index = %index, absent, "Bulk delete skipped absent documents");
        }

        let failures: Vec<String> = response
            .failed_items()
            .map(|item| {
                format!(
                    "{}: {}",
                    item.id,
                    item.reason.as_deref().unwrap_or("rejected")
                )
            })
            .collect();
        if !failures.is_empty() {
            error!(index = %index, failed = failures.len(), "Bulk delete rejected items");
            return Err(BulkError::Aggregate { failures }.into());
        }

        debug!(index = %index, deleted = ids.len(), "Bulk delete completed");
        Ok(())
    }

    /// Sets the refresh interval of `index`.
    pub async fn edit_refresh_interval(
        &self,
        index: &str,
        interval: RefreshInterval,
    ) -> RepositoryResult<()> {
        let settings = json!({ "index": { "refresh_interval": interval.setting() } });
        let client = self.client.as_ref();
        self.call("edit_refresh_interval", move || {
            client.put_settings(index, settings.clone()).err_into()
        })
        .await
    }

    /// Switches off periodic refresh of `index`.
    pub async fn disable_refresh_interval(&self, index: &str) -> RepositoryResult<()> {
        self.edit_refresh_interval(index, RefreshInterval::Disabled)
            .await
    }

    /// Removal of duplicated documents. Not supported.
    pub async fn delete_duplicates(&self) -> RepositoryResult<()> {
        Err(RepositoryError::NotImplemented {
            operation: "delete_duplicates",
        })
    }

    async fn bulk_write(
        &self,
        operation: &'static str,
        actions: Vec<BulkAction>,
    ) -> RepositoryResult<()> {
        if actions.is_empty() {
            return Ok(());
        }

        let index = self.index();
        let chunk_size = self.options.bulk_chunk_size;
        info!(
            index = %index,
            operation,
            documents = actions.len(),
            chunks = actions.len().div_ceil(chunk_size),
            "Starting bulk load"
        );

        self.disable_refresh_interval(index).await?;

        let mut failures = Vec::new();
        for (chunk, items) in actions.chunks(chunk_size).enumerate() {
            if self.cancel.is_cancelled() {
                warn!(index = %index, chunk, "Bulk load cancelled, refresh interval not restored");
                return Err(RepositoryError::Cancelled);
            }

            match self.send_chunk(operation, chunk, items).await {
                Ok(None) => {}
                Ok(Some(reason)) => failures.push(format!("chunk {}: {}", chunk, reason)),
                Err(RepositoryError::Cancelled) => {
                    warn!(index = %index, chunk, "Bulk load cancelled, refresh interval not restored");
                    return Err(RepositoryError::Cancelled);
                }
                Err(e) => {
                    error!(index = %index, chunk, error = %e, "Bulk chunk failed after retries");
                    failures.push(e.to_string());
                }
            }
        }

        if let Err(e) = self
            .edit_refresh_interval(index, self.options.refresh_interval().into())
            .await
        {
            if failures.is_empty() {
                return Err(e);
            }
            error!(index = %index, error = %e, "Failed to restore refresh interval");
            failures.push(format!("refresh interval: {}", e));
        }

        if failures.is_empty() {
            info!(index = %index, operation, "Bulk load completed");
            Ok(())
        } else {
            Err(BulkError::Aggregate { failures }.into())
        }
    }

    /// Sends one chunk, resending only rejected items on retry.
    ///
    /// Returns the engine reason when the request was refused with a status
    /// that is reported without retrying.
    async fn send_chunk(
        &self,
        operation: &'static str,
        chunk: usize,
        items: &[BulkAction],
    ) -> RepositoryResult<Option<String>> {
        let pending = Mutex::new(items.to_vec());
        let (client, index, pending) = (self.client.as_ref(), self.index(), &pending);
        self.call(operation, move || attempt_chunk(client, index, chunk, pending))
            .await
    }
}

async fn attempt_chunk<C: EngineClient>(
    client: &C,
    index: &str,
    chunk: usize,
    pending: &Mutex<Vec<BulkAction>>,
) -> RepositoryResult<Option<String>> {
    let actions = pending.lock().clone();
    let response = client.bulk(index, &actions).await?;

    if ACCEPTED_REQUEST_ERRORS.contains(&response.status) {
        let reason = response.reason.unwrap_or_default();
        warn!(
            index = %index,
            chunk,
            status = response.status,
            reason = %reason,
            "Bulk request refused"
        );
        return Ok(Some(reason));
    }

    if response.status != 200 {
        return Err(BulkError::ChunkFailed {
            chunk,
            failed_ids: actions.iter().map(|a| a.id().to_string()).collect(),
            reason: response
                .reason
                .unwrap_or_else(|| format!("status {}", response.status)),
        }
        .into());
    }

    let failed: Vec<_> = response.failed_items().collect();
    let Some(first) = failed.first() else {
        return Ok(None);
    };
    let reason = first
        .reason
        .clone()
        .unwrap_or_else(|| format!("status {}", first.status));
    let failed_ids: HashSet<&str> = failed.iter().map(|item| item.id.as_str()).collect();

    pending
        .lock()
        .retain(|action| failed_ids.contains(action.id()));

    Err(BulkError::ChunkFailed {
        chunk,
        failed_ids: failed.iter().map(|item| item.id.clone()).collect(),
        reason,
    }
    .into())
}
