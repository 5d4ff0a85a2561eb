//! Field name conventions on the wire.
//!
//! Declared paths use the entity's own casing (`Lines.UnitPrice`); documents
//! are serialized camel-cased, so every dotted segment is camel-cased
//! before it reaches a query (`lines.unitPrice`).

/// Suffix of the exact-match sub-field of text fields.
pub const KEYWORD_SUFFIX: &str = "keyword";

/// Lower-cases the first character of `value`.
pub fn camel_case(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Camel-cases each segment of a dotted path, dropping blank segments.
pub fn camel_path(path: &str) -> String {
    path.split('.')
        .filter(|segment| !segment.trim().is_empty())
        .map(camel_case)
        .collect::<Vec<_>>()
        .join(".")
}

/// Appends the `.keyword` sub-field to a wire field name.
pub fn keyword_field(field: &str) -> String {
    format!("{}.{}", field, KEYWORD_SUFFIX)
}
