//! Single-document writes.

use futures::TryFutureExt;
use serde::Serialize;
use tracing::debug;

use crate::client::EngineClient;
use crate::error::RepositoryResult;
use crate::types::Document;

use super::Repository;

impl<D: Document, C: EngineClient> Repository<D, C> {
    /// Indexes `entity` under its own id, replacing any previous version.
    pub async fn insert(&self, entity: &D) -> RepositoryResult<()> {
        let document = serde_json::to_value(entity)?;
        let id = entity.document_id();
        let (client, index, id) = (self.client.as_ref(), self.index(), id.as_str());
        self.call("insert", move || {
            client.index(index, id, id, document.clone()).err_into()
        })
        .await
    }

    /// Merges `entity` into the stored document `id`.
    ///
    /// Under a rollover alias the physical index holding the document must
    /// be passed as `index_override` (see [`SearchHit::index`](super::SearchHit)).
    pub async fn update(
        &self,
        id: &D::Id,
        entity: &D,
        index_override: Option<&str>,
    ) -> RepositoryResult<()> {
        let document = serde_json::to_value(entity)?;
        let id = id.to_string();
        let index = index_override.unwrap_or(self.index());
        let (client, id) = (self.client.as_ref(), id.as_str());
        self.call("update", move || {
            client.update(index, id, id, document.clone()).err_into()
        })
        .await
    }

    /// Merges an arbitrary partial document into the stored document `id`.
    pub async fn update_partial<P>(&self, id: &D::Id, partial: &P) -> RepositoryResult<()>
    where
        P: Serialize + Sync + ?Sized,
    {
        let document = serde_json::to_value(partial)?;
        let id = id.to_string();
        let (client, index, id) = (self.client.as_ref(), self.index(), id.as_str());
        self.call("update_partial", move || {
            client.update(index, id, id, document.clone()).err_into()
        })
        .await
    }

    /// Deletes the document `id`; absent documents are left alone.
    pub async fn delete(&self, id: &D::Id) -> RepositoryResult<()> {
        if !self.exists(id).await? {
            debug!(index = %self.index(), id = %id, "Document absent, nothing to delete");
            return Ok(());
        }

        let id = id.to_string();
        let (client, index, id) = (self.client.as_ref(), self.index(), id.as_str());
        self.call("delete", move || client.delete(index, id, id).err_into())
            .await
    }
}
