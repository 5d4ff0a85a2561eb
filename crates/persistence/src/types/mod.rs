//! Core types shared by the compilers and the repository.
//!
//! - [`Document`] - the entity contract (id + declared schema)
//! - [`Filters`], [`FilterField`], [`FilterValue`] - typed filter model
//! - [`Paging`] - offset paging and sort
//! - [`AggregateResult`] - decoded aggregation responses

mod aggregate;
mod document;
mod filter;
mod paging;

pub use aggregate::{AggregateOption, AggregateResult, BucketKey, GROUP_BY_KEY};
pub use document::Document;
pub use filter::{FieldValue, FilterField, FilterValue, Filters, RangeFilter};
pub use paging::{DEFAULT_PAGE_SIZE, Paging};
