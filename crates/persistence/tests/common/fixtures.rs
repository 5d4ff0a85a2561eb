//! Order domain fixtures.

use std::sync::Arc;

use lumen_persistence::config::RepositoryOptions;
use lumen_persistence::repository::Repository;
use lumen_persistence::schema::{TypeSchema, ValueType};
use lumen_persistence::types::Document;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::engine::MockEngine;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: u64,
    pub reference: String,
    pub status: String,
    pub total: Decimal,
    pub paid: bool,
    pub customer: Customer,
}

fn customer_schema() -> TypeSchema {
    TypeSchema::new("Customer")
        .aggregated("Name", ValueType::String)
        .field("City", ValueType::String)
}

impl Document for Order {
    type Id = u64;

    fn id(&self) -> &u64 {
        &self.id
    }

    fn schema() -> TypeSchema {
        TypeSchema::new("Order")
            .field("Id", ValueType::Long)
            .field("Reference", ValueType::String)
            .aggregated("Status", ValueType::String)
            .aggregated("Total", ValueType::Decimal)
            .aggregated("Paid", ValueType::Boolean)
            .field("Customer", ValueType::object(customer_schema))
    }
}

pub fn order(id: u64) -> Order {
    Order {
        id,
        reference: format!("REF-{:06}", id),
        status: if id % 2 == 0 { "open" } else { "closed" }.to_string(),
        total: Decimal::new(id as i64 * 150, 2),
        paid: id % 3 == 0,
        customer: Customer {
            name: format!("customer {}", id % 7),
            city: "Lyon".to_string(),
        },
    }
}

pub fn orders(count: u64) -> Vec<Order> {
    (1..=count).map(order).collect()
}

pub fn options() -> RepositoryOptions {
    RepositoryOptions::new("orders")
}

pub fn rollover_options() -> RepositoryOptions {
    RepositoryOptions {
        use_rollover_alias: true,
        pattern: Some("orders-data".to_string()),
        max_documents: Some(1_000_000),
        ..RepositoryOptions::new("orders")
    }
}

/// Repository over a fresh mock engine; the engine handle is kept for
/// assertions.
pub fn repository_with(options: RepositoryOptions) -> (Repository<Order, MockEngine>, Arc<MockEngine>) {
    let engine = Arc::new(MockEngine::new());
    let repository = Repository::with_shared_client(options, Arc::clone(&engine))
        .expect("valid repository options");
    (repository, engine)
}

pub fn repository() -> (Repository<Order, MockEngine>, Arc<MockEngine>) {
    repository_with(options())
}
