//! Property descriptors produced by the schema walk.

use super::naming::{camel_path, keyword_field};
use super::types::ValueType;

/// One property of an entity, flattened to its dotted path from the root.
///
/// Descriptors are built once per repository and shared read-only.
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    /// Name of the type that declares the property.
    pub declaring_type: String,
    /// Property name as declared.
    pub name: String,
    /// Dotted path from the root entity, declared casing.
    pub full_path: String,
    /// Declared type (possibly optional).
    pub value_type: ValueType,
    /// Path of the enclosing sub-object; `None` for root-level properties.
    pub nested_path: Option<String>,
    /// Whether the property carries an aggregation annotation.
    pub is_aggregate_target: bool,
    /// Camel-cased group-by path from the annotation.
    pub aggregate_group_by: Option<String>,
    /// Camel-cased terms order key from the annotation.
    pub aggregate_order: Option<String>,
}

impl PropertyDescriptor {
    /// Whether exact matching goes through the `.keyword` sub-field.
    pub fn is_keyword(&self) -> bool {
        self.value_type.is_keyword()
    }

    /// Camel-cased full path.
    pub fn wire_name(&self) -> String {
        camel_path(&self.full_path)
    }

    /// Field used for exact matching, sorting and terms aggregations.
    pub fn exact_field(&self) -> String {
        let wire = self.wire_name();
        if self.is_keyword() {
            keyword_field(&wire)
        } else {
            wire
        }
    }

    /// Camel-cased nested path, if any.
    pub fn wire_nested_path(&self) -> Option<String> {
        self.nested_path
            .as_deref()
            .map(camel_path)
            .filter(|path| !path.is_empty())
    }
}
