//! Builder API for ergonomic graph construction.
//!
//! # Example
//!
//! ```rust
//! use json_marshal::model::builder::{ArrayBuilder, ObjectBuilder};
//! use json_marshal::Value;
//!
//! let tags = ArrayBuilder::new().push("red").push("blue").build();
//!
//! let item = ObjectBuilder::new()
//!     .field("name", "Widget")
//!     .field("price", 9.5)
//!     .field("tags", tags.clone())
//!     .field("also_tags", tags)
//!     .build();
//!
//! let obj = item.as_object().unwrap();
//! assert!(obj.get("tags").unwrap().ptr_eq(&obj.get("also_tags").unwrap()));
//! ```

use crate::model::{ArrayRef, ObjectRef, Record, Value};

/// Builder for a record node.
#[derive(Debug, Clone, Default)]
pub struct ObjectBuilder {
    fields: Record,
}

impl ObjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a field.
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Adds an explicitly absent field.
    pub fn absent(mut self, key: impl Into<String>) -> Self {
        self.fields.insert(key.into(), Value::Undefined);
        self
    }

    /// Adds a nested record built by `f`.
    pub fn object(self, key: impl Into<String>, f: impl FnOnce(ObjectBuilder) -> ObjectBuilder) -> Self {
        let nested = f(ObjectBuilder::new()).build();
        self.field(key, nested)
    }

    /// Adds a nested array built by `f`.
    pub fn array(self, key: impl Into<String>, f: impl FnOnce(ArrayBuilder) -> ArrayBuilder) -> Self {
        let nested = f(ArrayBuilder::new()).build();
        self.field(key, nested)
    }

    pub fn build(self) -> Value {
        Value::Object(ObjectRef::new(self.fields))
    }
}

/// Builder for an array node.
#[derive(Debug, Clone, Default)]
pub struct ArrayBuilder {
    items: Vec<Value>,
}

impl ArrayBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn push(mut self, value: impl Into<Value>) -> Self {
        self.items.push(value.into());
        self
    }

    pub fn extend<V: Into<Value>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.items.extend(values.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Value {
        Value::Array(ArrayRef::new(self.items))
    }
}
