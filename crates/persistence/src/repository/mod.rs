//! Typed repository over an engine index.
//!
//! A [`Repository`] binds one [`Document`] type to one index (or rollover
//! alias). Every engine call goes through the [`RetryPolicy`] configured by
//! `nb_retries_call`; a [`CancellationToken`] installed with
//! [`Repository::with_cancellation`] aborts in-flight calls, backoff sleeps
//! and bulk chunk loops.
//!
//! ```no_run
//! # use lumen_persistence::client::EngineClient;
//! # use lumen_persistence::config::RepositoryOptions;
//! # use lumen_persistence::repository::Repository;
//! # use lumen_persistence::types::{Document, FilterField, Paging};
//! # async fn example<D: Document, C: EngineClient>(client: C) -> lumen_persistence::error::RepositoryResult<()> {
//! let repository = Repository::<D, C>::new(RepositoryOptions::new("orders"), client)?;
//!
//! let filters = vec![FilterField::new("Status", "open")];
//! let open = repository.count(&filters).await?;
//! let page = repository.search(&filters, &Paging::default()).await?;
//! # let _ = (open, page);
//! # Ok(())
//! # }
//! ```

mod bulk;
mod crud;
mod index;
mod query;

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::client::EngineClient;
use crate::config::RepositoryOptions;
use crate::error::{RepositoryError, RepositoryResult};
use crate::query::RequestBuilder;
use crate::retry::RetryPolicy;
use crate::schema::DocumentSchema;
use crate::types::Document;

pub use bulk::RefreshInterval;
pub use index::{ClusterHealth, IndexStats};
pub use query::{LIST_WINDOW, SearchHit, SearchResult};

#[cfg(feature = "elasticsearch")]
use crate::client::ElasticsearchClient;
#[cfg(feature = "elasticsearch")]
use crate::config::ElasticOptions;

/// Repository over the Elasticsearch client.
#[cfg(feature = "elasticsearch")]
pub type ElasticRepository<D> = Repository<D, ElasticsearchClient>;

/// Typed data access for one document type.
///
/// Cloning is cheap and shares the client, options and descriptors.
pub struct Repository<D, C> {
    client: Arc<C>,
    options: Arc<RepositoryOptions>,
    requests: RequestBuilder,
    retry: RetryPolicy,
    cancel: CancellationToken,
    _document: PhantomData<fn() -> D>,
}

impl<D, C> Clone for Repository<D, C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            options: Arc::clone(&self.options),
            requests: self.requests.clone(),
            retry: self.retry,
            cancel: self.cancel.clone(),
            _document: PhantomData,
        }
    }
}

impl<D, C> fmt::Debug for Repository<D, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("index", &self.options.index)
            .field("document", &self.requests.compiler().schema().type_name())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl<D: Document, C: EngineClient> Repository<D, C> {
    /// Validates `options` and introspects the document schema.
    pub fn new(options: RepositoryOptions, client: C) -> RepositoryResult<Self> {
        Self::with_shared_client(options, Arc::new(client))
    }

    /// Like [`Repository::new`] with a client shared across repositories.
    pub fn with_shared_client(options: RepositoryOptions, client: Arc<C>) -> RepositoryResult<Self> {
        options.validate()?;
        let schema = DocumentSchema::build(&D::schema())?;

        debug!(
            index = %options.index,
            document = %schema.type_name(),
            properties = schema.descriptors().len(),
            "Repository initialized"
        );

        Ok(Self {
            requests: RequestBuilder::new(schema, options.max_inner_result_window),
            retry: RetryPolicy::new(options.nb_retries_call),
            client,
            options: Arc::new(options),
            cancel: CancellationToken::new(),
            _document: PhantomData,
        })
    }

    /// A copy of the repository whose calls are cancelled by `token`.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        let mut repository = self.clone();
        repository.cancel = token;
        repository
    }

    /// Replaces the retry policy (attempt count and delay unit).
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn options(&self) -> &RepositoryOptions {
        &self.options
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn schema(&self) -> &DocumentSchema {
        self.requests.compiler().schema()
    }

    pub fn requests(&self) -> &RequestBuilder {
        &self.requests
    }

    /// Index (or rollover alias) the repository reads and writes.
    pub fn index(&self) -> &str {
        &self.options.index
    }

    /// Runs one engine call under the retry policy and the cancellation token.
    async fn call<T, F, Fut>(&self, operation: &'static str, f: F) -> RepositoryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = RepositoryResult<T>>,
    {
        let transient_only = self.options.retry_transient_only;
        self.retry
            .execute(
                f,
                move |e: &RepositoryError| should_retry(e, transient_only),
                &self.cancel,
            )
            .await
            .map_err(|e| {
                let e = RepositoryError::from(e);
                debug!(operation, index = %self.options.index, error = %e, "Engine call failed");
                e
            })
    }
}

fn should_retry(error: &RepositoryError, transient_only: bool) -> bool {
    if transient_only {
        error.is_transient()
    } else {
        error.is_retryable()
    }
}

#[cfg(feature = "elasticsearch")]
impl<D: Document> Repository<D, ElasticsearchClient> {
    /// Builds an Elasticsearch client and a repository from one configuration.
    pub fn connect(options: &ElasticOptions) -> RepositoryResult<Self> {
        options.validate()?;
        let client = ElasticsearchClient::new(&options.connection)?;
        Self::new(options.repository.clone(), client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BulkError, EngineError};

    #[test]
    fn test_default_predicate_retries_engine_errors() {
        let bad_request: RepositoryError = EngineError::Response {
            status: 400,
            reason: "bad".to_string(),
        }
        .into();
        assert!(should_retry(&bad_request, false));
        assert!(!should_retry(&bad_request, true));

        let chunk: RepositoryError = BulkError::ChunkFailed {
            chunk: 0,
            failed_ids: vec!["1".to_string()],
            reason: "boom".to_string(),
        }
        .into();
        assert!(should_retry(&chunk, false));
    }

    #[test]
    fn test_transient_predicate() {
        let unavailable: RepositoryError = EngineError::Response {
            status: 503,
            reason: "unavailable".to_string(),
        }
        .into();
        assert!(should_retry(&unavailable, true));
        assert!(!should_retry(&RepositoryError::Cancelled, false));
    }
}
