//! The entity contract.

use std::fmt::Display;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::schema::TypeSchema;

/// An entity stored as one engine document.
///
/// Documents are serialized camel-cased (`#[serde(rename_all = "camelCase")]`)
/// so that the declared schema paths line up with the indexed field names.
///
/// ```
/// use lumen_persistence::schema::{TypeSchema, ValueType};
/// use lumen_persistence::types::Document;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// struct Ticket {
///     id: String,
///     status: String,
/// }
///
/// impl Document for Ticket {
///     type Id = String;
///
///     fn id(&self) -> &String {
///         &self.id
///     }
///
///     fn schema() -> TypeSchema {
///         TypeSchema::new("Ticket")
///             .field("Id", ValueType::String)
///             .aggregated("Status", ValueType::String)
///     }
/// }
/// ```
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Identifier type; its string form is the document id and routing key.
    type Id: Display + Send + Sync;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// Declares the entity shape.
    fn schema() -> TypeSchema;

    /// Document id as sent to the engine.
    fn document_id(&self) -> String {
        self.id().to_string()
    }
}
