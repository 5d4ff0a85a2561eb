//! Decoded aggregation results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the filter container wrapping a scoped nested aggregation.
pub const GROUP_BY_KEY: &str = "group_by";

/// Key of one bucket, in the engine's native type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BucketKey {
    Boolean(bool),
    Long(i64),
    Double(f64),
    String(String),
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKey::Boolean(b) => write!(f, "{}", b),
            BucketKey::Long(n) => write!(f, "{}", n),
            BucketKey::Double(n) => write!(f, "{}", n),
            BucketKey::String(s) => f.write_str(s),
        }
    }
}

/// One bucket of a bucket aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateOption {
    pub key: BucketKey,
    pub count: u64,
}

/// One named aggregation of a response.
///
/// Bucket aggregations fill `options` (engine bucket order); metric
/// aggregations fill `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub key: String,
    pub value: Option<f64>,
    #[serde(default)]
    pub options: Vec<AggregateOption>,
}

impl AggregateResult {
    pub fn metric(key: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            key: key.into(),
            value,
            options: Vec::new(),
        }
    }

    pub fn buckets(key: impl Into<String>, options: Vec<AggregateOption>) -> Self {
        Self {
            key: key.into(),
            value: None,
            options,
        }
    }
}
