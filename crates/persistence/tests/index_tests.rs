//! Index lifecycle: plain indices, rollover aliases, statistics and health.
//!
//! Run with: `cargo test -p lumen-persistence --test index_tests`

mod common;

use common::{Call, repository, repository_with, rollover_options};
use lumen_persistence::repository::IndexStats;
use serde_json::json;

// ============================================================================
// Plain index
// ============================================================================

#[tokio::test]
async fn test_create_plain_index() {
    let (repository, engine) = repository();

    assert!(repository.create_index().await.unwrap());
    assert!(engine.has_index("orders"));
    assert!(engine.calls().contains(&Call::CreateIndex {
        index: "orders".to_string(),
        body: json!({ "settings": { "index": { "max_inner_result_window": 1000 } } }),
    }));

    // second call finds the index
    assert!(!repository.create_index().await.unwrap());
    assert_eq!(engine.count_calls(|c| matches!(c, Call::CreateIndex { .. })), 1);
}

#[tokio::test]
async fn test_delete_plain_index() {
    let (repository, engine) = repository();
    repository.create_index().await.unwrap();

    repository.delete_index().await.unwrap();

    assert!(!engine.has_index("orders"));
    let calls = engine.calls();
    let purge = calls
        .iter()
        .position(|c| matches!(c, Call::DeleteByQuery { index, .. } if index == "orders"))
        .unwrap();
    let delete = calls
        .iter()
        .position(|c| matches!(c, Call::DeleteIndex { index } if index == "orders"))
        .unwrap();
    assert!(purge < delete);
}

// ============================================================================
// Rollover alias
// ============================================================================

#[tokio::test]
async fn test_create_rollover_index_installs_policy_template_and_write_index() {
    let (repository, engine) = repository_with(rollover_options());

    assert!(repository.create_index().await.unwrap());

    let calls = engine.calls();
    assert!(calls.contains(&Call::GetLifecycle {
        policy: "order".to_string(),
    }));
    assert!(calls.contains(&Call::PutLifecycle {
        policy: "order".to_string(),
        body: json!({
            "policy": { "phases": { "hot": { "actions": { "rollover": {
                "max_docs": 1_000_000,
                "max_size": "10gb"
            } } } } }
        }),
    }));

    let template = calls
        .iter()
        .find_map(|c| match c {
            Call::PutIndexTemplate { name, body } if name == "orders-data" => Some(body.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(template["index_patterns"], json!(["orders-data-*"]));
    assert_eq!(template["template"]["settings"]["index.lifecycle.name"], "order");
    assert_eq!(
        template["template"]["settings"]["index.lifecycle.rollover_alias"],
        "orders"
    );

    assert!(calls.contains(&Call::CreateIndex {
        index: "orders-data-000001".to_string(),
        body: json!({
            "settings": { "index": { "max_inner_result_window": 1000 } },
            "aliases": { "orders": { "is_write_index": true } }
        }),
    }));
}

#[tokio::test]
async fn test_existing_policy_is_kept() {
    let (repository, engine) = repository_with(rollover_options());
    engine.add_lifecycle("order");

    repository.create_index().await.unwrap();

    assert_eq!(engine.count_calls(|c| matches!(c, Call::PutLifecycle { .. })), 0);
    assert_eq!(engine.count_calls(|c| matches!(c, Call::PutIndexTemplate { .. })), 1);
}

#[tokio::test]
async fn test_existing_alias_skips_policy_and_template() {
    let (repository, engine) = repository_with(rollover_options());
    engine.add_alias("orders", &["orders-data-000001"]);

    assert!(!repository.create_index().await.unwrap());

    assert_eq!(engine.count_calls(|c| matches!(c, Call::GetLifecycle { .. })), 0);
    assert_eq!(engine.count_calls(|c| matches!(c, Call::PutIndexTemplate { .. })), 0);
    assert_eq!(engine.count_calls(|c| matches!(c, Call::CreateIndex { .. })), 0);
}

#[tokio::test]
async fn test_delete_rollover_index_fans_out_over_members() {
    let (repository, engine) = repository_with(rollover_options());
    engine.add_alias(
        "orders",
        &["orders-data-000001", "orders-data-000002", "orders-data-000003"],
    );

    repository.delete_index().await.unwrap();

    let calls = engine.calls();
    assert_eq!(engine.count_calls(|c| matches!(c, Call::DeleteByQuery { .. })), 3);
    assert_eq!(engine.count_calls(|c| matches!(c, Call::DeleteIndex { .. })), 3);

    let last_purge = calls
        .iter()
        .rposition(|c| matches!(c, Call::DeleteByQuery { .. }))
        .unwrap();
    let first_delete = calls
        .iter()
        .position(|c| matches!(c, Call::DeleteIndex { .. }))
        .unwrap();
    assert!(last_purge < first_delete);
    assert_eq!(
        calls.last(),
        Some(&Call::DeleteAlias {
            alias: "orders".to_string(),
        })
    );
    assert!(!engine.has_index("orders-data-000002"));
}

#[tokio::test(start_paused = true)]
async fn test_missing_alias_falls_back_to_single_index() {
    let (repository, engine) = repository_with(rollover_options());

    // nothing to delete: the purge goes through, the index deletion is refused
    let err = repository.delete_index().await.unwrap_err();

    assert!(err.to_string().contains("404"));
    assert_eq!(engine.count_calls(|c| matches!(c, Call::GetAlias { .. })), 0);
    assert_eq!(
        engine.count_calls(|c| matches!(c, Call::DeleteByQuery { index, .. } if index == "orders")),
        1
    );
    assert_eq!(
        engine.count_calls(|c| matches!(c, Call::DeleteIndex { index } if index == "orders")),
        5
    );
}

// ============================================================================
// Statistics and health
// ============================================================================

#[tokio::test]
async fn test_index_size_and_stats() {
    let (repository, engine) = repository();
    engine.set_stats_response(json!({
        "_all": { "primaries": {
            "docs": { "count": 12, "deleted": 1 },
            "store": { "size_in_bytes": 2048 }
        } }
    }));

    assert_eq!(repository.index_size().await.unwrap(), Some(2048));
    assert_eq!(
        repository.index_stats().await.unwrap(),
        Some(IndexStats {
            document_count: 12,
            deleted_documents: 1,
            size_in_bytes: 2048,
        })
    );
}

#[tokio::test]
async fn test_stats_without_primaries() {
    let (repository, engine) = repository();
    engine.set_stats_response(json!({ "_shards": { "total": 0 } }));

    assert_eq!(repository.index_size().await.unwrap(), None);
    assert_eq!(repository.index_stats().await.unwrap(), None);
}

#[tokio::test]
async fn test_health_is_scoped_to_index() {
    let (repository, engine) = repository();

    let health = repository.health().await.unwrap();

    assert!(health.is_green());
    assert_eq!(health.cluster_name, "mock");
    assert_eq!(health.number_of_nodes, 1);
    assert_eq!(
        engine.calls(),
        vec![Call::ClusterHealth {
            index: "orders".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_index_exists() {
    let (repository, engine) = repository();
    assert!(!repository.index_exists("orders").await.unwrap());
    engine.add_index("orders");
    assert!(repository.index_exists("orders").await.unwrap());
}
