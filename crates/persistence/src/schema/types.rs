//! Statically declared entity schemas.
//!
//! An entity describes its shape once with a [`TypeSchema`]; nested object
//! types are referenced through a schema function so that recursive types
//! can be declared without building an infinite value.

use std::fmt;

/// Function returning the schema of a nested object type.
pub type SchemaFn = fn() -> TypeSchema;

/// Declared type of a property.
#[derive(Clone)]
pub enum ValueType {
    String,
    Integer,
    Long,
    Decimal,
    Double,
    Boolean,
    DateTime,
    Uuid,
    /// Nullable wrapper; unwrapped before any decision is made.
    Optional(Box<ValueType>),
    /// Sequence of elements (list, set, any collection).
    List(Box<ValueType>),
    /// Structured sub-object.
    Object(SchemaFn),
}

impl ValueType {
    /// Wraps `inner` as nullable.
    pub fn optional(inner: ValueType) -> Self {
        ValueType::Optional(Box::new(inner))
    }

    /// Wraps `element` as a sequence.
    pub fn list(element: ValueType) -> Self {
        ValueType::List(Box::new(element))
    }

    /// References a nested object type by its schema function.
    pub fn object(schema: SchemaFn) -> Self {
        ValueType::Object(schema)
    }

    /// Strips every `Optional` layer.
    pub fn unwrapped(&self) -> &ValueType {
        match self {
            ValueType::Optional(inner) => inner.unwrapped(),
            other => other,
        }
    }

    /// Integer, long, decimal or floating point.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self.unwrapped(),
            ValueType::Integer | ValueType::Long | ValueType::Decimal | ValueType::Double
        )
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self.unwrapped(), ValueType::Boolean)
    }

    /// `string` or `list<string>`: fields that carry a `.keyword` sub-field.
    pub fn is_keyword(&self) -> bool {
        match self.unwrapped() {
            ValueType::String => true,
            ValueType::List(element) => matches!(element.as_ref(), ValueType::String),
            _ => false,
        }
    }

    /// Short type label used in logs and debug output.
    pub fn label(&self) -> String {
        match self {
            ValueType::String => "string".to_string(),
            ValueType::Integer => "integer".to_string(),
            ValueType::Long => "long".to_string(),
            ValueType::Decimal => "decimal".to_string(),
            ValueType::Double => "double".to_string(),
            ValueType::Boolean => "boolean".to_string(),
            ValueType::DateTime => "datetime".to_string(),
            ValueType::Uuid => "uuid".to_string(),
            ValueType::Optional(inner) => format!("{}?", inner.label()),
            ValueType::List(element) => format!("list<{}>", element.label()),
            ValueType::Object(schema) => schema().name,
        }
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Aggregation intent attached to a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSpec {
    /// Optional group-by path (dotted, declared casing).
    pub group_by: Option<String>,
    /// Terms order key (default `_key`: ascending by term).
    pub order: String,
}

/// Order key sorting terms buckets by the term itself.
pub const KEY_ORDER: &str = "_key";

impl Default for AggregateSpec {
    fn default() -> Self {
        Self {
            group_by: None,
            order: KEY_ORDER.to_string(),
        }
    }
}

impl AggregateSpec {
    pub fn group_by(group_by: impl Into<String>) -> Self {
        Self {
            group_by: Some(group_by.into()),
            ..Default::default()
        }
    }

    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = order.into();
        self
    }
}

/// One declared property.
#[derive(Debug, Clone)]
pub struct PropertySchema {
    pub name: String,
    pub value_type: ValueType,
    pub aggregate: Option<AggregateSpec>,
}

impl PropertySchema {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            aggregate: None,
        }
    }

    /// Marks the property as an aggregation target.
    pub fn aggregate(mut self, spec: AggregateSpec) -> Self {
        self.aggregate = Some(spec);
        self
    }
}

/// Declared shape of one entity (or nested object) type.
#[derive(Debug, Clone, Default)]
pub struct TypeSchema {
    pub name: String,
    pub properties: Vec<PropertySchema>,
}

impl TypeSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Adds a plain property.
    pub fn field(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.properties.push(PropertySchema::new(name, value_type));
        self
    }

    /// Adds a property with the default aggregation intent.
    pub fn aggregated(self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.property(PropertySchema::new(name, value_type).aggregate(AggregateSpec::default()))
    }

    /// Adds a fully configured property.
    pub fn property(mut self, property: PropertySchema) -> Self {
        self.properties.push(property);
        self
    }
}
