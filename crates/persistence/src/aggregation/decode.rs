//! Aggregation response decoding.

use serde_json::Value;
use tracing::trace;

use crate::types::{AggregateOption, AggregateResult, BucketKey};

/// Flattens the `aggregations` object of a search response.
///
/// Bucket aggregations become options in engine order, metric aggregations
/// become values, and single-bucket containers (`nested`, `filter`) are
/// unwrapped recursively into the same list.
pub fn decode_aggregations(aggregations: &Value) -> Vec<AggregateResult> {
    let mut results = Vec::new();
    decode_into(aggregations, &mut results);
    results
}

fn decode_into(aggregations: &Value, results: &mut Vec<AggregateResult>) {
    let Some(entries) = aggregations.as_object() else {
        return;
    };

    for (name, body) in entries {
        if let Some(buckets) = body.get("buckets").and_then(Value::as_array) {
            let options = buckets.iter().filter_map(decode_bucket).collect();
            results.push(AggregateResult::buckets(name.clone(), options));
        } else if let Some(value) = body.get("value") {
            results.push(AggregateResult::metric(name.clone(), value.as_f64()));
        } else if body.get("doc_count").is_some() {
            let children: serde_json::Map<String, Value> = body
                .as_object()
                .map(|fields| {
                    fields
                        .iter()
                        .filter(|(_, child)| child.is_object())
                        .filter(|(key, _)| key.as_str() != "meta")
                        .map(|(key, child)| (key.clone(), child.clone()))
                        .collect()
                })
                .unwrap_or_default();
            decode_into(&Value::Object(children), results);
        } else {
            trace!(aggregation = %name, "Unrecognized aggregation shape, skipping");
        }
    }
}

fn decode_bucket(bucket: &Value) -> Option<AggregateOption> {
    let count = bucket.get("doc_count").and_then(Value::as_u64).unwrap_or(0);
    let key = decode_key(bucket)?;
    Some(AggregateOption { key, count })
}

fn decode_key(bucket: &Value) -> Option<BucketKey> {
    let key = bucket.get("key")?;
    let as_string = bucket.get("key_as_string").and_then(Value::as_str);

    match key {
        Value::Number(_) if matches!(as_string, Some("true") | Some("false")) => {
            Some(BucketKey::Boolean(as_string == Some("true")))
        }
        Value::Number(n) => match n.as_i64() {
            Some(long) => Some(BucketKey::Long(long)),
            None => n.as_f64().map(BucketKey::Double),
        },
        Value::String(s) => Some(BucketKey::String(s.clone())),
        Value::Bool(b) => Some(BucketKey::Boolean(*b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_terms_and_metrics() {
        let response = json!({
            "Status": {
                "doc_count_error_upper_bound": 0,
                "sum_other_doc_count": 0,
                "buckets": [
                    { "key": "open", "doc_count": 4 },
                    { "key": "closed", "doc_count": 2 }
                ]
            },
            "TotalMin": { "value": 1.5 },
            "TotalMax": { "value": null }
        });

        let results = decode_aggregations(&response);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].key, "Status");
        assert_eq!(
            results[0].options,
            vec![
                AggregateOption {
                    key: BucketKey::String("open".to_string()),
                    count: 4
                },
                AggregateOption {
                    key: BucketKey::String("closed".to_string()),
                    count: 2
                },
            ]
        );
        assert_eq!(results[1], AggregateResult::metric("TotalMin", Some(1.5)));
        assert_eq!(results[2], AggregateResult::metric("TotalMax", None));
    }

    #[test]
    fn test_flattens_nested_and_filter_containers() {
        let response = json!({
            "Sku": {
                "doc_count": 12,
                "group_by": {
                    "doc_count": 3,
                    "lines.sku": {
                        "buckets": [ { "key": "A-1", "doc_count": 3 } ]
                    }
                }
            }
        });

        let results = decode_aggregations(&response);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].key, "lines.sku");
        assert_eq!(results[0].options[0].count, 3);
    }

    #[test]
    fn test_numeric_and_boolean_keys() {
        let response = json!({
            "Quantity": { "buckets": [ { "key": 3, "doc_count": 1 }, { "key": 2.5, "doc_count": 1 } ] },
            "Paid": { "buckets": [ { "key": 1, "key_as_string": "true", "doc_count": 7 } ] }
        });

        let results = decode_aggregations(&response);
        assert_eq!(results[0].options[0].key, BucketKey::Long(3));
        assert_eq!(results[0].options[1].key, BucketKey::Double(2.5));
        assert_eq!(results[1].options[0].key, BucketKey::Boolean(true));
    }
}
