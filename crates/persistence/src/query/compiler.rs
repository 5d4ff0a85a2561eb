//! Filter object to boolean query compilation.

use tracing::trace;

use crate::schema::{DocumentSchema, PropertyDescriptor};
use crate::types::{FilterValue, Filters};

use super::compiled::CompiledQuery;

/// Leaves and nested groups of one compiled filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledFilters {
    /// One leaf per compiled filter field, in field order.
    pub must: Vec<CompiledQuery>,
    /// One `Nested` node per distinct nested path, in first-seen order.
    pub nested: Vec<CompiledQuery>,
}

impl CompiledFilters {
    /// The nested node compiled for `path`, if any.
    pub fn nested_for(&self, path: &str) -> Option<&CompiledQuery> {
        self.nested.iter().find(|node| match node {
            CompiledQuery::Nested { path: p, .. } => p == path,
            _ => false,
        })
    }

    /// Root query: leaves in `must`, nested nodes in `should`.
    pub fn into_query(self) -> CompiledQuery {
        CompiledQuery::Bool {
            must: self.must,
            should: self.nested,
        }
    }
}

/// Compiles filter objects against one entity schema.
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    schema: DocumentSchema,
    inner_hits_size: u32,
}

impl QueryCompiler {
    /// `inner_hits_size` is rendered on every nested node.
    pub fn new(schema: DocumentSchema, inner_hits_size: u32) -> Self {
        Self {
            schema,
            inner_hits_size,
        }
    }

    pub fn schema(&self) -> &DocumentSchema {
        &self.schema
    }

    /// Compiles `filters` into the root boolean query.
    pub fn compile<F: Filters + ?Sized>(&self, filters: &F) -> CompiledQuery {
        self.compile_parts(filters).into_query()
    }

    /// Compiles `filters`, keeping root leaves and nested nodes apart.
    pub fn compile_parts<F: Filters + ?Sized>(&self, filters: &F) -> CompiledFilters {
        let mut compiled = CompiledFilters::default();

        for field in filters.fields() {
            if field.ignore {
                continue;
            }
            let Some(value) = field.value.as_ref() else {
                continue;
            };
            let Some(descriptor) = self.schema.resolve(field.lookup_name()) else {
                trace!(field = %field.name, "Filter field has no mapped property, skipping");
                continue;
            };

            let leaf = leaf(descriptor, value);
            compiled.must.push(leaf.clone());

            if let Some(path) = descriptor.wire_nested_path() {
                self.fold_nested(&mut compiled.nested, path, leaf);
            }
        }

        compiled
    }

    fn fold_nested(&self, nested: &mut Vec<CompiledQuery>, path: String, leaf: CompiledQuery) {
        let existing = nested.iter_mut().find_map(|node| match node {
            CompiledQuery::Nested { path: p, query, .. } if *p == path => Some(query),
            _ => None,
        });

        match existing {
            Some(query) => {
                let current = std::mem::replace(query.as_mut(), CompiledQuery::match_all());
                **query = current.and(leaf);
            }
            None => nested.push(CompiledQuery::Nested {
                path,
                query: Box::new(leaf),
                inner_hits_size: self.inner_hits_size,
            }),
        }
    }
}

fn leaf(descriptor: &PropertyDescriptor, value: &FilterValue) -> CompiledQuery {
    match value {
        FilterValue::Range(range) => CompiledQuery::Range {
            field: descriptor.exact_field(),
            gt: range.min.unwrap_or(0.0),
            lt: range.max,
        },
        FilterValue::Text(text) => CompiledQuery::TextMatch {
            field: descriptor.wire_name(),
            pattern: format!("*{}*", text),
        },
        FilterValue::StringList(values) => CompiledQuery::Terms {
            field: descriptor.exact_field(),
            values: values.iter().map(|v| v.as_str().into()).collect(),
        },
        FilterValue::List(values) => CompiledQuery::Terms {
            field: descriptor.exact_field(),
            values: values.iter().map(|v| v.to_json()).collect(),
        },
        FilterValue::Scalar(value) => CompiledQuery::Term {
            field: descriptor.exact_field(),
            value: value.to_json(),
        },
    }
}
