//! Typed filter model.
//!
//! A filter object lists its fields as [`FilterField`]s. Fields without a
//! value, fields flagged `ignore` and fields that do not map to an entity
//! property are skipped by the compilers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use uuid::Uuid;

/// A single scalar filter value, rendered to its native JSON type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Long(i64),
    Double(f64),
    Decimal(Decimal),
    Boolean(bool),
}

impl FieldValue {
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Long(n) => Value::Number((*n).into()),
            FieldValue::Double(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
            FieldValue::Decimal(d) => match d.to_i64() {
                Some(n) if d.fract().is_zero() => Value::Number(n.into()),
                _ => d
                    .to_f64()
                    .and_then(Number::from_f64)
                    .map_or_else(|| Value::String(d.to_string()), Value::Number),
            },
            FieldValue::Boolean(b) => Value::Bool(*b),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Long(value.into())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Long(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Long(value.into())
    }
}

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        FieldValue::Double(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Double(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Decimal(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::String(value.to_rfc3339())
    }
}

/// Numeric range with an exclusive lower and upper bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeFilter {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl RangeFilter {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self::new(Some(min), Some(max))
    }
}

/// The value carried by one filter field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterValue {
    /// Renders `gt`/`lt` on the field.
    Range(RangeFilter),
    /// Free-text containment (`*text*`).
    Text(String),
    /// Exact match against any of the strings.
    StringList(Vec<String>),
    /// Exact match against any of the values.
    List(Vec<FieldValue>),
    /// Exact match against one value.
    Scalar(FieldValue),
}

impl From<RangeFilter> for FilterValue {
    fn from(value: RangeFilter) -> Self {
        FilterValue::Range(value)
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        FilterValue::StringList(values)
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(values: Vec<&str>) -> Self {
        FilterValue::StringList(values.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<FieldValue>> for FilterValue {
    fn from(values: Vec<FieldValue>) -> Self {
        FilterValue::List(values)
    }
}

macro_rules! scalar_filter_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FilterValue {
                fn from(value: $ty) -> Self {
                    FilterValue::Scalar(value.into())
                }
            }

            impl From<Vec<$ty>> for FilterValue {
                fn from(values: Vec<$ty>) -> Self {
                    FilterValue::List(values.into_iter().map(FieldValue::from).collect())
                }
            }
        )*
    };
}

scalar_filter_value!(i32, i64, u32, f32, f64, Decimal, bool, Uuid, DateTime<Utc>);

/// One field of a filter object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterField {
    /// Field name, matched against descriptor paths then names.
    pub name: String,
    /// Property path overriding `name` during resolution.
    pub nested: Option<String>,
    /// Never compiled when set.
    pub ignore: bool,
    pub value: Option<FilterValue>,
}

impl FilterField {
    pub fn new(name: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::optional(name, Some(value))
    }

    /// A field whose value may be absent; absent values are skipped.
    pub fn optional<V: Into<FilterValue>>(name: impl Into<String>, value: Option<V>) -> Self {
        Self {
            name: name.into(),
            nested: None,
            ignore: false,
            value: value.map(Into::into),
        }
    }

    /// Resolves the field through `path` instead of its own name.
    pub fn nested(mut self, path: impl Into<String>) -> Self {
        self.nested = Some(path.into());
        self
    }

    /// Excludes the field from query compilation.
    pub fn ignore_on_build(mut self) -> Self {
        self.ignore = true;
        self
    }

    /// Name used to look up the descriptor.
    pub fn lookup_name(&self) -> &str {
        self.nested.as_deref().unwrap_or(&self.name)
    }
}

/// A filter object.
pub trait Filters: Send + Sync {
    /// Lists the filter's fields in declaration order.
    fn fields(&self) -> Vec<FilterField>;
}

/// The empty filter.
impl Filters for () {
    fn fields(&self) -> Vec<FilterField> {
        Vec::new()
    }
}

impl Filters for Vec<FilterField> {
    fn fields(&self) -> Vec<FilterField> {
        self.clone()
    }
}

impl Filters for [FilterField] {
    fn fields(&self) -> Vec<FilterField> {
        self.to_vec()
    }
}
