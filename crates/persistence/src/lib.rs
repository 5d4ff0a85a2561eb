//! Lumen Persistence Layer
//!
//! This crate provides a typed, schema-driven repository over Elasticsearch.
//! An entity type declares its shape once; typed filter objects are then
//! compiled into engine queries and aggregation requests, and a resilient
//! repository executes CRUD, chunked bulk and index lifecycle operations
//! with retries.
//!
//! # Features
//!
//! - **Schema introspection**: entities declare a [`TypeSchema`](schema::TypeSchema),
//!   flattened once into property descriptors (camel-cased wire names,
//!   `.keyword` exact-match fields, nested paths, aggregation annotations)
//! - **Query compilation**: filter fields become `term`, `terms`, `range`,
//!   `query_string` and `nested` clauses
//! - **Aggregations**: annotated properties compile to terms, min/max or avg
//!   aggregations; responses decode into [`AggregateResult`](types::AggregateResult)s
//! - **Resilient repository**: linear-backoff retries, cancellation, chunked
//!   bulk loads with partial failure handling and refresh throttling
//! - **Rollover aliases**: lifecycle policy, index template and write index
//!   management
//!
//! # Cargo Features
//!
//! - `elasticsearch` (default) - engine client over the official crate
//! - `logging` - [`init_logging`] helper
//!
//! # Architecture
//!
//! - [`schema`] - entity schema declaration and property descriptors
//! - [`types`] - documents, filters, paging and aggregation results
//! - [`query`] - filter compilation and request bodies
//! - [`aggregation`] - aggregation compilation and response decoding
//! - [`client`] - the engine seam and its Elasticsearch implementation
//! - [`repository`] - typed data access
//! - [`retry`] - retry executor
//! - [`config`] - connection and repository options
//! - [`error`] - error types for all operations
//!
//! # Quick Start
//!
//! ```no_run
//! use lumen_persistence::config::ElasticOptions;
//! use lumen_persistence::repository::ElasticRepository;
//! use lumen_persistence::schema::{TypeSchema, ValueType};
//! use lumen_persistence::types::{Document, FilterField, Paging, RangeFilter};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! struct Order {
//!     id: u64,
//!     status: String,
//!     total: f64,
//! }
//!
//! impl Document for Order {
//!     type Id = u64;
//!
//!     fn id(&self) -> &u64 {
//!         &self.id
//!     }
//!
//!     fn schema() -> TypeSchema {
//!         TypeSchema::new("Order")
//!             .field("Id", ValueType::Long)
//!             .aggregated("Status", ValueType::String)
//!             .field("Total", ValueType::Double)
//!     }
//! }
//!
//! # async fn run() -> lumen_persistence::error::RepositoryResult<()> {
//! let repository = ElasticRepository::<Order>::connect(&ElasticOptions::from_env()?)?;
//! repository.create_index().await?;
//!
//! let filters = vec![
//!     FilterField::new("Status", "open"),
//!     FilterField::new("Total", RangeFilter::between(10.0, 100.0)),
//! ];
//! let page = repository.search(&filters, &Paging::default().sort_by("Total")).await?;
//! let facets = repository.aggregations(&filters).await?;
//! # let _ = (page, facets);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod aggregation;
pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod repository;
pub mod retry;
pub mod schema;
pub mod types;

// Re-export commonly used types at crate root
pub use client::{BulkAction, BulkResponse, EngineClient};
pub use config::{ConnectionConfig, ElasticOptions, RepositoryOptions};
pub use error::{RepositoryError, RepositoryResult};
pub use repository::{Repository, SearchResult};
pub use retry::RetryPolicy;
pub use schema::{DocumentSchema, TypeSchema, ValueType};
pub use types::{AggregateResult, Document, FilterField, FilterValue, Filters, Paging};

#[cfg(feature = "elasticsearch")]
pub use client::ElasticsearchClient;
#[cfg(feature = "elasticsearch")]
pub use repository::ElasticRepository;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup. `RUST_LOG` takes
/// precedence over `level`.
///
/// # Arguments
///
/// * `level` - The log level (error, warn, info, debug, trace)
#[cfg(feature = "logging")]
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lumen_persistence={},elasticsearch=warn", level)));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
