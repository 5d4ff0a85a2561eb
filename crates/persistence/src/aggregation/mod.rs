//! Aggregation requests and responses.
//!
//! Properties annotated as aggregation targets compile to:
//!
//! | Property | Aggregations |
//! |----------|--------------|
//! | under a nested path | `<Name>`: nested container with terms `<camel.full.path>` |
//! | numeric | `<Name>Min`, `<Name>Max` |
//! | boolean | `<Name>Avg` |
//! | anything else | `<Name>`: terms |

mod compiler;
mod decode;
mod node;

pub use compiler::AggregationCompiler;
pub use decode::decode_aggregations;
pub use node::{AggregationNode, TERMS_SIZE, render};
