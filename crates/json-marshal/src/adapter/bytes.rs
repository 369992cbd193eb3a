//! Binary buffers, encoded as `[105, "<base64>"]` (standard alphabet, padded).

use std::any::Any;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::adapter::{Adapter, Packed};
use crate::codec::Options;
use crate::error::{DecodeError, EncodeError};
use crate::model::tag::builtin;
use crate::model::{HostObject, Tag, Value};

/// An immutable byte buffer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes(bytes)
    }
}

impl From<&[u8]> for Bytes {
    fn from(bytes: &[u8]) -> Self {
        Bytes(bytes.to_vec())
    }
}

impl HostObject for Bytes {
    fn type_name(&self) -> &str {
        "Bytes"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Adapter for [`Bytes`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesAdapter;

impl Adapter for BytesAdapter {
    fn name(&self) -> &str {
        "bytes"
    }

    fn tags(&self) -> &[Tag] {
        &[builtin::BYTES]
    }

    fn detect(&self, value: &Value, _options: &Options) -> Option<Tag> {
        value.downcast_host::<Bytes>().map(|_| builtin::BYTES)
    }

    fn pack(&self, _tag: Tag, value: &Value, _options: &Options) -> Result<Packed, EncodeError> {
        Ok(match value.downcast_host::<Bytes>() {
            Some(bytes) => Packed::Payload(Value::String(STANDARD.encode(bytes.as_slice()))),
            None => Packed::Unchanged,
        })
    }

    fn unpack(
        &self,
        _tag: Tag,
        payload: &serde_json::Value,
        _options: &Options,
    ) -> Result<Value, DecodeError> {
        let text = payload
            .as_str()
            .ok_or_else(|| DecodeError::invalid_payload(self.name(), "expected a base64 string"))?;
        let bytes = STANDARD
            .decode(text)
            .map_err(|e| DecodeError::invalid_payload(self.name(), e.to_string()))?;
        Ok(Value::host(Bytes(bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{deserialize, serialize};

    fn options() -> Options {
        Options::new().with_adapter(BytesAdapter)
    }

    #[test]
    fn test_wire_form() {
        let value = Value::host(Bytes::from(&b"hello"[..]));
        assert_eq!(serialize(&value, &options()).unwrap(), r#"[105,"aGVsbG8="]"#);
        assert_eq!(
            serialize(&Value::host(Bytes::default()), &options()).unwrap(),
            r#"[105,""]"#
        );
    }

    #[test]
    fn test_roundtrip() {
        let data: Vec<u8> = (0..=255).collect();
        let text = serialize(&Value::host(Bytes(data.clone())), &options()).unwrap();
        let value = deserialize(&text, &options()).unwrap();
        assert_eq!(value.downcast_host::<Bytes>().unwrap().as_slice(), &data[..]);
    }

    #[test]
    fn test_invalid_payload() {
        for text in [r#"[105,"***"]"#, "[105,1]", "[105]"] {
            assert!(matches!(
                deserialize(text, &options()),
                Err(DecodeError::InvalidPayload { .. })
            ));
        }
    }
}
