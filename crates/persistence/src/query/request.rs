//! Search, count and aggregation request bodies.

use serde_json::{Value, json};

use crate::aggregation::{self, AggregationCompiler};
use crate::schema::DocumentSchema;
use crate::types::{Filters, Paging};

use super::compiler::QueryCompiler;

/// Builds complete request bodies for one entity type.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    queries: QueryCompiler,
    aggregations: AggregationCompiler,
}

impl RequestBuilder {
    pub fn new(schema: DocumentSchema, inner_hits_size: u32) -> Self {
        Self {
            queries: QueryCompiler::new(schema.clone(), inner_hits_size),
            aggregations: AggregationCompiler::new(schema),
        }
    }

    pub fn compiler(&self) -> &QueryCompiler {
        &self.queries
    }

    /// The rendered root query of `filters`.
    pub fn query<F: Filters + ?Sized>(&self, filters: &F) -> Value {
        self.queries.compile(filters).to_json()
    }

    /// Body of a paged search returning sources and versions.
    pub fn search_body<F: Filters + ?Sized>(&self, filters: &F, paging: &Paging) -> Value {
        let mut body = json!({
            "query": self.query(filters),
            "size": paging.size,
            "from": paging.from,
            "_source": true,
            "version": true,
        });

        if let Some(sort) = self.sort(paging) {
            body["sort"] = sort;
        }

        body
    }

    /// Body of a count request.
    pub fn count_body<F: Filters + ?Sized>(&self, filters: &F) -> Value {
        json!({ "query": self.query(filters) })
    }

    /// Body of an aggregation-only search.
    pub fn aggregation_body<F: Filters + ?Sized>(&self, filters: &F) -> Value {
        let compiled = self.queries.compile_parts(filters);
        let nodes = self.aggregations.compile(&compiled);

        json!({
            "size": 0,
            "from": 0,
            "query": compiled.into_query().to_json(),
            "aggs": aggregation::render(&nodes),
        })
    }

    /// Sort clause for `paging`; `None` when unsorted or the path is unmapped.
    pub fn sort(&self, paging: &Paging) -> Option<Value> {
        let path = paging.sort_by.as_deref().filter(|p| !p.is_empty())?;
        let descriptor = self.queries.schema().resolve_sort(path)?;

        let mut options = json!({ "order": paging.order() });
        if let Some(nested) = descriptor.wire_nested_path() {
            options["nested"] = json!({ "path": nested });
        }

        let field = descriptor.exact_field();
        Some(json!([{ field: options }]))
    }
}
