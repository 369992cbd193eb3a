//! Regular expressions, encoded as `[102, [source, flags]]`.
//!
//! Patterns are carried as text; nothing is compiled or validated.

use std::any::Any;

use crate::adapter::{Adapter, Packed};
use crate::codec::Options;
use crate::error::{DecodeError, EncodeError};
use crate::model::tag::builtin;
use crate::model::{HostObject, Tag, Value};

/// A regular expression pattern and its flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegExp {
    pub source: String,
    pub flags: String,
}

impl RegExp {
    pub fn new(source: impl Into<String>, flags: impl Into<String>) -> Self {
        RegExp {
            source: source.into(),
            flags: flags.into(),
        }
    }
}

impl HostObject for RegExp {
    fn type_name(&self) -> &str {
        "RegExp"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Adapter for [`RegExp`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RegExpAdapter;

impl Adapter for RegExpAdapter {
    fn name(&self) -> &str {
        "regexp"
    }

    fn tags(&self) -> &[Tag] {
        &[builtin::REGEXP]
    }

    fn detect(&self, value: &Value, _options: &Options) -> Option<Tag> {
        value.downcast_host::<RegExp>().map(|_| builtin::REGEXP)
    }

    fn pack(&self, _tag: Tag, value: &Value, _options: &Options) -> Result<Packed, EncodeError> {
        Ok(match value.downcast_host::<RegExp>() {
            Some(re) => Packed::Payload(Value::array([
                Value::from(re.source.as_str()),
                Value::from(re.flags.as_str()),
            ])),
            None => Packed::Unchanged,
        })
    }

    fn unpack(
        &self,
        _tag: Tag,
        payload: &serde_json::Value,
        _options: &Options,
    ) -> Result<Value, DecodeError> {
        let parts = payload.as_array().map(Vec::as_slice);
        match parts {
            Some([serde_json::Value::String(source), serde_json::Value::String(flags)]) => {
                Ok(Value::host(RegExp::new(source.as_str(), flags.as_str())))
            }
            _ => Err(DecodeError::invalid_payload(
                self.name(),
                "expected [source, flags]",
            )),
        }
    }
}
