//! Error objects, encoded as `[101, [name, message]]` or
//! `[101, [name, message, cause]]`.
//!
//! The cause is an arbitrary value and may point back to the error itself,
//! so it is filled in during the hydrate phase.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;

use crate::adapter::{Adapter, Packed};
use crate::codec::Options;
use crate::error::{DecodeError, EncodeError};
use crate::model::tag::builtin;
use crate::model::{HostObject, Tag, Value};

/// An error with a name (e.g. `TypeError`), a message and an optional cause.
pub struct ErrorValue {
    name: String,
    message: String,
    cause: RefCell<Option<Value>>,
}

impl ErrorValue {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorValue {
            name: name.into(),
            message: message.into(),
            cause: RefCell::new(None),
        }
    }

    pub fn with_cause(self, cause: Value) -> Self {
        self.set_cause(Some(cause));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<Value> {
        self.cause.borrow().clone()
    }

    pub fn set_cause(&self, cause: Option<Value>) {
        *self.cause.borrow_mut() = cause;
    }
}

impl fmt::Debug for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorValue")
            .field("name", &self.name)
            .field("message", &self.message)
            .field("cause", &self.cause.borrow().is_some())
            .finish()
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}

impl HostObject for ErrorValue {
    fn type_name(&self) -> &str {
        "Error"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Adapter for [`ErrorValue`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorAdapter;

impl Adapter for ErrorAdapter {
    fn name(&self) -> &str {
        "error"
    }

    fn tags(&self) -> &[Tag] {
        &[builtin::ERROR]
    }

    fn detect(&self, value: &Value, _options: &Options) -> Option<Tag> {
        value.downcast_host::<ErrorValue>().map(|_| builtin::ERROR)
    }

    fn pack(&self, _tag: Tag, value: &Value, _options: &Options) -> Result<Packed, EncodeError> {
        let Some(error) = value.downcast_host::<ErrorValue>() else {
            return Ok(Packed::Unchanged);
        };
        let mut parts = vec![Value::from(error.name()), Value::from(error.message())];
        if let Some(cause) = error.cause() {
            parts.push(cause);
        }
        Ok(Packed::Payload(Value::from(parts)))
    }

    fn unpack(
        &self,
        _tag: Tag,
        payload: &serde_json::Value,
        _options: &Options,
    ) -> Result<Value, DecodeError> {
        let parts = payload.as_array().map(Vec::as_slice).unwrap_or_default();
        match parts {
            [serde_json::Value::String(name), serde_json::Value::String(message), ..]
                if parts.len() <= 3 =>
            {
                Ok(Value::host(ErrorValue::new(name.as_str(), message.as_str())))
            }
            _ => Err(DecodeError::invalid_payload(
                self.name(),
                "expected [name, message] or [name, message, cause]",
            )),
        }
    }

    fn hydrate(
        &self,
        _tag: Tag,
        shell: &Value,
        payload: Value,
        _options: &Options,
    ) -> Result<(), DecodeError> {
        let error = shell
            .downcast_host::<ErrorValue>()
            .ok_or_else(|| DecodeError::invalid_payload(self.name(), "shell is not an error"))?;
        if let Some(cause) = payload.as_array().and_then(|parts| parts.get(2)) {
            error.set_cause(Some(cause));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{deserialize, serialize};

    fn options() -> Options {
        Options::new().with_adapter(ErrorAdapter)
    }

    #[test]
    fn test_wire_form() {
        let value = Value::host(ErrorValue::new("TypeError", "aaa"));
        assert_eq!(
            serialize(&value, &options()).unwrap(),
            r#"[101,["TypeError","aaa"]]"#
        );

        let value = Value::host(ErrorValue::new("Error", "bbb").with_cause(Value::from(1)));
        assert_eq!(
            serialize(&value, &options()).unwrap(),
            r#"[101,["Error","bbb",1]]"#
        );
    }

    #[test]
    fn test_roundtrip() {
        let value = deserialize(r#"[101,["RangeError","out of range"]]"#, &options()).unwrap();
        let error = value.downcast_host::<ErrorValue>().unwrap();
        assert_eq!(error.name(), "RangeError");
        assert_eq!(error.message(), "out of range");
        assert!(error.cause().is_none());
        assert_eq!(error.to_string(), "RangeError: out of range");
    }

    #[test]
    fn test_cause_referencing_error() {
        let value = Value::host(ErrorValue::new("Error", "loop"));
        value.downcast_host::<ErrorValue>().unwrap().set_cause(Some(value.clone()));

        let text = serialize(&value, &options()).unwrap();
        assert_eq!(text, r#"[101,["Error","loop",[0,0]]]"#);
        value.downcast_host::<ErrorValue>().unwrap().set_cause(None);

        let decoded = deserialize(&text, &options()).unwrap();
        let error = decoded.downcast_host::<ErrorValue>().unwrap();
        assert!(error.cause().unwrap().ptr_eq(&decoded));
        error.set_cause(None);
    }

    #[test]
    fn test_omitted_cause_is_dropped() {
        let value = Value::host(ErrorValue::new("Error", "aaa").with_cause(Value::symbol(None)));
        assert_eq!(
            serialize(&value, &options()).unwrap(),
            r#"[101,["Error","aaa"]]"#
        );
    }

    #[test]
    fn test_invalid_payload() {
        for text in [r#"[101,"aaa"]"#, r#"[101,["aaa"]]"#, r#"[101,["a","b",1,2]]"#] {
            assert!(matches!(
                deserialize(text, &options()),
                Err(DecodeError::InvalidPayload { .. })
            ));
        }
    }
}
