//! Value graph decoding.
//!
//! Walks parsed JSON and rebuilds the value graph. Slots are assigned in the
//! same order the encoder assigned them: every composite (record, array,
//! adapter shell) is registered before its children are read.

use num_bigint::BigInt;
use serde_json::{Map, Value as Json};
use tracing::{debug, trace};

use crate::adapter::find_by_tag;
use crate::codec::Options;
use crate::codec::refs::DecodeRefs;
use crate::error::DecodeError;
use crate::model::{ArrayRef, BuiltinTag, ObjectRef, Tag, Value};

/// Decodes a parsed JSON node, sharing `refs` with the caller.
pub fn hydrate(node: &Json, refs: &mut DecodeRefs, options: &Options) -> Result<Value, DecodeError> {
    let mut hydrator = Hydrator { options, refs };
    hydrator.read_value(node, 0)
}

struct Hydrator<'a> {
    options: &'a Options,
    refs: &'a mut DecodeRefs,
}

impl Hydrator<'_> {
    fn read_value(&mut self, node: &Json, depth: usize) -> Result<Value, DecodeError> {
        match node {
            Json::Null => Ok(Value::Null),
            Json::Bool(b) => Ok(Value::Bool(*b)),
            Json::Number(n) => Ok(Value::Number(n.as_f64().unwrap_or(f64::NAN))),
            Json::String(s) => Ok(Value::String(s.clone())),
            Json::Object(fields) => self.read_record(fields, self.enter(depth)?),
            Json::Array(items) => {
                let depth = self.enter(depth)?;
                match items.first().and_then(Json::as_u64) {
                    Some(tag) => self.read_tagged(tag, &items[1..], depth),
                    None => self.read_elements(items, depth),
                }
            }
        }
    }

    fn enter(&self, depth: usize) -> Result<usize, DecodeError> {
        let depth = depth + 1;
        if depth > self.options.max_depth {
            return Err(DecodeError::DepthLimitExceeded {
                max: self.options.max_depth,
            });
        }
        Ok(depth)
    }

    fn read_record(&mut self, fields: &Map<String, Json>, depth: usize) -> Result<Value, DecodeError> {
        let record = ObjectRef::default();
        self.refs.register(Value::Object(record.clone()));

        for (key, node) in fields {
            let value = self.read_value(node, depth)?;
            record.insert(key.clone(), value);
        }
        Ok(Value::Object(record))
    }

    fn read_elements(&mut self, items: &[Json], depth: usize) -> Result<Value, DecodeError> {
        let array = ArrayRef::new(Vec::with_capacity(items.len()));
        self.refs.register(Value::Array(array.clone()));

        for node in items {
            let value = self.read_value(node, depth)?;
            array.push(value);
        }
        Ok(Value::Array(array))
    }

    /// Reads `[tag, ...rest]`.
    fn read_tagged(&mut self, tag: u64, rest: &[Json], depth: usize) -> Result<Value, DecodeError> {
        if rest.len() > 1 {
            return Err(DecodeError::MalformedTaggedValue {
                tag,
                context: "more than one payload element",
            });
        }
        let payload = rest.first();

        let Some(builtin) = BuiltinTag::from_u64(tag) else {
            return self.read_adapted(tag, payload, depth);
        };

        match builtin {
            BuiltinTag::Reference => {
                let slot = payload
                    .and_then(Json::as_u64)
                    .ok_or(DecodeError::MalformedReference)?;
                usize::try_from(slot)
                    .ok()
                    .and_then(|slot| self.refs.resolve(slot))
                    .ok_or_else(|| {
                        debug!(slot, registered = self.refs.len(), "unresolved reference");
                        DecodeError::UnresolvedReference { slot }
                    })
            }
            BuiltinTag::Absent => Ok(Value::Undefined),
            BuiltinTag::NotANumber => Ok(Value::Number(f64::NAN)),
            BuiltinTag::PosInfinity => Ok(Value::Number(f64::INFINITY)),
            BuiltinTag::NegInfinity => Ok(Value::Number(f64::NEG_INFINITY)),
            BuiltinTag::BigInteger => {
                let text = payload
                    .and_then(Json::as_str)
                    .ok_or(DecodeError::MalformedTaggedValue {
                        tag,
                        context: "big integer payload is not a string",
                    })?;
                text.parse::<BigInt>()
                    .map(Value::BigInt)
                    .map_err(|_| DecodeError::InvalidBigInt {
                        text: text.to_string(),
                    })
            }
            BuiltinTag::HomogeneousArray => match payload {
                Some(Json::Array(items)) => self.read_elements(items, self.enter(depth)?),
                _ => Err(DecodeError::MalformedTaggedValue {
                    tag,
                    context: "homogeneous array payload is not an array",
                }),
            },
        }
    }

    fn read_adapted(&mut self, tag: u64, payload: Option<&Json>, depth: usize) -> Result<Value, DecodeError> {
        let options = self.options;
        let found = Tag::try_from(tag)
            .ok()
            .and_then(|t| find_by_tag(&options.adapters, t).map(|adapter| (t, adapter)));
        let Some((adapter_tag, adapter)) = found else {
            debug!(tag, "no adapter declares tag");
            return Err(DecodeError::UnknownTag { tag });
        };
        trace!(adapter = adapter.name(), tag, "unpacking tagged value");

        let null = Json::Null;
        let shell = adapter.unpack(adapter_tag, payload.unwrap_or(&null), options)?;
        self.refs.register(shell.clone());

        let hydrated = match payload {
            Some(node) => self.read_value(node, depth)?,
            None => Value::Undefined,
        };
        adapter.hydrate(adapter_tag, &shell, hydrated, options)?;
        Ok(shell)
    }
}
