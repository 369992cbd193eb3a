//! JSON text encoding/decoding for value graphs.
//!
//! [`serialize`] and [`deserialize`] are the two entry points. Both validate
//! the adapter list first and use a fresh reference tracker per call.

pub mod dehydrate;
pub mod hydrate;
pub mod options;
pub mod primitives;
pub mod refs;

use serde::Deserialize;

use crate::error::{ConfigError, DecodeError, EncodeError};
use crate::model::Value;
use crate::validate::validate_adapters;

pub use dehydrate::dehydrate;
pub use hydrate::hydrate;
pub use options::Options;
pub use primitives::{Writer, check_nesting_depth, is_tag_literal};
pub use refs::{DecodeRefs, EncodeRefs, Slot};

/// Encodes a value graph as JSON text.
///
/// Shared composites are written once and referenced afterwards; cycles are
/// supported. Fails with [`EncodeError::RootOmitted`] if `value` itself is
/// not serializable.
pub fn serialize(value: &Value, options: &Options) -> Result<String, EncodeError> {
    validate_adapters(&options.adapters)?;
    let mut refs = EncodeRefs::new();
    dehydrate(value, &mut refs, options)?.ok_or(EncodeError::RootOmitted)
}

/// Decodes JSON text produced by [`serialize`] with the same adapters.
pub fn deserialize(text: &str, options: &Options) -> Result<Value, DecodeError> {
    validate_adapters(&options.adapters)?;
    check_nesting_depth(text, options.max_depth)?;

    let node = parse_json(text)?;
    let mut refs = DecodeRefs::new();
    hydrate(&node, &mut refs, options)
}

/// Parses JSON text whose nesting depth has already been checked.
fn parse_json(text: &str) -> Result<serde_json::Value, DecodeError> {
    let mut de = serde_json::Deserializer::from_str(text);
    de.disable_recursion_limit();
    let node = serde_json::Value::deserialize(&mut de)
        .map_err(|e| DecodeError::InvalidJson(e.to_string()))?;
    de.end().map_err(|e| DecodeError::InvalidJson(e.to_string()))?;
    Ok(node)
}

/// Options captured once and validated up front.
///
/// ```
/// use json_marshal::{Options, Serializer, Value};
///
/// let serializer = Serializer::new(Options::with_builtin_adapters().stable(true)).unwrap();
/// let text = serializer.serialize(&Value::array([Value::from(1)])).unwrap();
/// assert_eq!(text, "[6,[1]]");
/// let value = serializer.deserialize(&text).unwrap();
/// assert_eq!(value.as_array().unwrap().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Serializer {
    options: Options,
}

impl Serializer {
    /// Validates the adapter list and captures `options`.
    pub fn new(options: Options) -> Result<Self, ConfigError> {
        validate_adapters(&options.adapters)?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn serialize(&self, value: &Value) -> Result<String, EncodeError> {
        let mut refs = EncodeRefs::new();
        dehydrate(value, &mut refs, &self.options)?.ok_or(EncodeError::RootOmitted)
    }

    pub fn deserialize(&self, text: &str) -> Result<Value, DecodeError> {
        check_nesting_depth(text, self.options.max_depth)?;
        let node = parse_json(text)?;
        let mut refs = DecodeRefs::new();
        hydrate(&node, &mut refs, &self.options)
    }
}
