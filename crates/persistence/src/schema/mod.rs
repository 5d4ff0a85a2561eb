//! Entity schema declaration and property descriptors.
//!
//! Entities describe their shape statically with [`TypeSchema`]. The
//! [`SchemaIntrospector`] flattens a schema into [`PropertyDescriptor`]s once
//! per repository; the resulting [`DocumentSchema`] is shared read-only by
//! the query and aggregation compilers.
//!
//! ```
//! use lumen_persistence::schema::{DocumentSchema, TypeSchema, ValueType};
//!
//! fn customer() -> TypeSchema {
//!     TypeSchema::new("Customer").field("Name", ValueType::String)
//! }
//!
//! let schema = DocumentSchema::build(
//!     &TypeSchema::new("Order")
//!         .field("Total", ValueType::Decimal)
//!         .field("Customer", ValueType::object(customer)),
//! )
//! .unwrap();
//!
//! let name = schema.resolve("Name").unwrap();
//! assert_eq!(name.full_path, "Customer.Name");
//! assert_eq!(name.exact_field(), "customer.name.keyword");
//! ```

mod descriptor;
mod introspector;
pub mod naming;
mod types;

use std::sync::Arc;

pub use descriptor::PropertyDescriptor;
pub use introspector::SchemaIntrospector;
pub use types::{AggregateSpec, KEY_ORDER, PropertySchema, SchemaFn, TypeSchema, ValueType};

use crate::error::SchemaError;

/// Flattened, immutable descriptor set of one entity type.
///
/// Cloning is cheap: descriptors live behind an `Arc`.
#[derive(Debug, Clone)]
pub struct DocumentSchema {
    type_name: Arc<str>,
    descriptors: Arc<[PropertyDescriptor]>,
}

impl DocumentSchema {
    /// Introspects `root` and freezes the descriptors.
    pub fn build(root: &TypeSchema) -> Result<Self, SchemaError> {
        let descriptors = SchemaIntrospector::build(root)?;
        Ok(Self {
            type_name: Arc::from(root.name.as_str()),
            descriptors: descriptors.into(),
        })
    }

    /// Name of the root entity type.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn descriptors(&self) -> &[PropertyDescriptor] {
        &self.descriptors
    }

    /// Resolves a filter property: exact full path first, then bare name.
    pub fn resolve(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.full_path == name)
            .or_else(|| self.descriptors.iter().find(|d| d.name == name))
    }

    /// Resolves a sort path, ignoring case.
    pub fn resolve_sort(&self, path: &str) -> Option<&PropertyDescriptor> {
        self.descriptors
            .iter()
            .find(|d| d.full_path.eq_ignore_ascii_case(path))
    }

    /// Descriptors annotated as aggregation targets, in declaration order.
    pub fn aggregate_targets(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.descriptors.iter().filter(|d| d.is_aggregate_target)
    }
}
