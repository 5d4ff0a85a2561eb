//! Query compilation.
//!
//! A filter object compiles to a boolean query:
//!
//! - every mapped, non-empty filter field yields one leaf in the root `must`
//! - leaves of properties under a nested path are also grouped, per path,
//!   into one `nested` query (AND of the leaves in field order) carrying
//!   `inner_hits`; the nested queries are appended to the root `should`
//!
//! Leaf kinds by filter value:
//!
//! | Value | Query |
//! |-------|-------|
//! | range | `range` with `gt = min (or 0)`, `lt = max` |
//! | text | `query_string` `*text*` on the analyzed field |
//! | list | `terms` on the keyword-aware field |
//! | scalar | `term` on the keyword-aware field |

mod compiled;
mod compiler;
pub mod request;

pub use compiled::CompiledQuery;
pub use compiler::{CompiledFilters, QueryCompiler};
pub use request::RequestBuilder;
