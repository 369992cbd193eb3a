//! Value graph encoding.
//!
//! Walks a value graph depth-first and writes JSON text. Every composite is
//! registered with the reference tracker *before* its children are visited,
//! so later occurrences (including ones nested inside it) are written as
//! `[0, slot]`.
//!
//! Omission is not an error: [`write_value`](Dehydrator::write_value) returns
//! `false` and writes nothing, and the enclosing container decides what to do
//! (arrays keep a `null` placeholder, records drop the field).

use tracing::trace;

use crate::adapter::Packed;
use crate::codec::Options;
use crate::codec::primitives::{Writer, exceeds_nesting_depth, is_tag_literal};
use crate::codec::refs::EncodeRefs;
use crate::error::EncodeError;
use crate::model::{BuiltinTag, Value};

/// Encodes `value`, sharing `refs` with the caller.
///
/// Returns `None` if the value itself is omitted (a callable, a symbol, or a
/// value an adapter declined).
///
/// The depth limit applies to the value graph while it is walked and to the
/// bracket nesting of the finished text, which tagged values make deeper
/// than the graph. Output that passes here passes the decoder's check.
pub fn dehydrate(
    value: &Value,
    refs: &mut EncodeRefs,
    options: &Options,
) -> Result<Option<String>, EncodeError> {
    let mut dehydrator = Dehydrator {
        options,
        refs,
        out: Writer::with_capacity(64),
    };
    if !dehydrator.write_value(value, 0)? {
        return Ok(None);
    }
    if exceeds_nesting_depth(dehydrator.out.as_bytes(), options.max_depth) {
        return Err(EncodeError::DepthLimitExceeded {
            max: options.max_depth,
        });
    }
    Ok(Some(dehydrator.out.into_string()))
}

struct Dehydrator<'a> {
    options: &'a Options,
    refs: &'a mut EncodeRefs,
    out: Writer,
}

impl Dehydrator<'_> {
    /// Writes `value`. Returns false, having written nothing, if it is omitted.
    fn write_value(&mut self, value: &Value, depth: usize) -> Result<bool, EncodeError> {
        match value {
            Value::Null => self.out.write_raw("null"),
            Value::Undefined => self.out.write_marker(BuiltinTag::Absent.tag()),
            Value::String(s) => self.out.write_string(s),
            Value::Number(n) => self.write_number(*n),
            Value::Bool(b) => self.out.write_raw(if *b { "true" } else { "false" }),
            Value::BigInt(n) => {
                self.out.open_tagged(BuiltinTag::BigInteger.tag());
                self.out.write_string(&n.to_string());
                self.out.write_byte(b']');
            }
            Value::Boxed(inner) => return self.write_value(inner, depth),
            Value::Function(_) | Value::Symbol(_) => return Ok(false),
            Value::Array(_) | Value::Object(_) | Value::Host(_) => {
                return self.write_composite(value, depth);
            }
        }
        Ok(true)
    }

    fn write_number(&mut self, n: f64) {
        if n.is_nan() {
            self.out.write_marker(BuiltinTag::NotANumber.tag());
        } else if n == f64::INFINITY {
            self.out.write_marker(BuiltinTag::PosInfinity.tag());
        } else if n == f64::NEG_INFINITY {
            self.out.write_marker(BuiltinTag::NegInfinity.tag());
        } else {
            self.out.write_number(n);
        }
    }

    fn enter(&self, depth: usize) -> Result<usize, EncodeError> {
        let depth = depth + 1;
        if depth > self.options.max_depth {
            return Err(EncodeError::DepthLimitExceeded {
                max: self.options.max_depth,
            });
        }
        Ok(depth)
    }

    /// Takes back everything written since `start`. Returns false.
    fn discard(&mut self, start: usize, checkpoint: usize) -> bool {
        self.out.truncate(start);
        self.refs.rollback(checkpoint);
        false
    }

    fn write_composite(&mut self, value: &Value, depth: usize) -> Result<bool, EncodeError> {
        let depth = self.enter(depth)?;

        if let Value::Host(host) = value {
            if let Some(surrogate) = host.to_serializable() {
                return self.write_value(&surrogate, depth);
            }
        }

        if let Some(slot) = self.refs.lookup(value) {
            self.out.open_tagged(BuiltinTag::Reference.tag());
            self.out.write_raw(&slot.to_string());
            self.out.write_byte(b']');
            return Ok(true);
        }

        let checkpoint = self.refs.checkpoint();
        let start = self.out.len();
        self.refs.register(value);

        let written = match self.write_adapted(value, depth)? {
            Some(written) => written,
            None => {
                match value {
                    // Snapshots, so no borrow is held while children run hooks.
                    Value::Array(items) => self.write_array(&items.to_vec(), depth)?,
                    Value::Object(fields) => self.write_record(fields.entries(), depth)?,
                    _ => self.out.write_raw("{}"),
                }
                true
            }
        };

        if !written {
            // The decoder will never see this node or anything inside it.
            return Ok(self.discard(start, checkpoint));
        }
        Ok(true)
    }

    /// Offers `value` to the adapters.
    ///
    /// Returns `None` if no adapter took it, otherwise whether it was written.
    fn write_adapted(&mut self, value: &Value, depth: usize) -> Result<Option<bool>, EncodeError> {
        let options = self.options;
        for adapter in &options.adapters {
            let Some(tag) = adapter.detect(value, options) else {
                continue;
            };
            if !adapter.tags().contains(&tag) {
                return Err(EncodeError::UndeclaredTag {
                    adapter: adapter.name().to_string(),
                    tag,
                });
            }

            return match adapter.pack(tag, value, options)? {
                Packed::Payload(payload) => {
                    trace!(adapter = adapter.name(), tag, "packed value");
                    self.out.open_tagged(tag);
                    if !self.write_value(&payload, depth)? {
                        return Ok(Some(false));
                    }
                    self.out.write_byte(b']');
                    Ok(Some(true))
                }
                Packed::Items(mut items) => {
                    trace!(adapter = adapter.name(), tag, items = items.len(), "packed items");
                    if options.stable {
                        items = self.sort_by_encoding(items, |this, item| {
                            this.encode_aside(item, depth + 1)
                        })?;
                    }
                    self.out.open_tagged(tag);
                    self.write_collection(&items, depth, |this, item, depth| {
                        this.write_value(item, depth)
                    })?;
                    self.out.write_byte(b']');
                    Ok(Some(true))
                }
                Packed::Entries(mut entries) => {
                    trace!(adapter = adapter.name(), tag, entries = entries.len(), "packed entries");
                    if options.stable {
                        entries = self.sort_by_encoding(entries, |this, (key, value)| {
                            Ok((this.encode_aside(key, depth + 2)?, this.encode_aside(value, depth + 2)?))
                        })?;
                    }
                    self.out.open_tagged(tag);
                    self.write_collection(&entries, depth, |this, (key, value), depth| {
                        this.write_pair(key, value, depth)
                    })?;
                    self.out.write_byte(b']');
                    Ok(Some(true))
                }
                Packed::Unchanged => {
                    trace!(adapter = adapter.name(), tag, "adapter passed value through");
                    Ok(None)
                }
                Packed::Omit => {
                    trace!(adapter = adapter.name(), tag, "adapter omitted value");
                    Ok(Some(false))
                }
            };
        }
        Ok(None)
    }

    /// Writes the payload array of a collection.
    ///
    /// Unlike a plain array, omitted entries are dropped instead of leaving a
    /// `null`, so every entry the decoder sees is complete.
    fn write_collection<T>(
        &mut self,
        entries: &[T],
        depth: usize,
        mut write_entry: impl FnMut(&mut Self, &T, usize) -> Result<bool, EncodeError>,
    ) -> Result<(), EncodeError> {
        let depth = self.enter(depth)?;
        // The decoder registers the payload array when it reads it.
        self.refs.register(&Value::array([]));

        let open = self.out.len();
        self.out.write_byte(b'[');
        let mut written = 0usize;
        let mut tag_like = false;

        for entry in entries {
            let mark = self.out.len();
            if written > 0 {
                self.out.write_byte(b',');
            }
            let element = self.out.len();
            if write_entry(self, entry, depth)? {
                if written == 0 {
                    tag_like = is_tag_literal(&self.out.as_bytes()[element..]);
                }
                written += 1;
            } else {
                self.out.truncate(mark);
            }
        }

        self.out.write_byte(b']');
        if tag_like {
            self.out.insert_raw(open, "[6,");
            self.out.write_byte(b']');
        }
        Ok(())
    }

    /// Writes a `[key, value]` entry, or nothing if either side is omitted.
    fn write_pair(&mut self, key: &Value, value: &Value, depth: usize) -> Result<bool, EncodeError> {
        let depth = self.enter(depth)?;
        let checkpoint = self.refs.checkpoint();
        let start = self.out.len();
        self.refs.register(&Value::array([]));

        self.out.write_byte(b'[');
        if !self.write_value(key, depth)? {
            return Ok(self.discard(start, checkpoint));
        }
        let tag_like = is_tag_literal(&self.out.as_bytes()[start + 1..]);
        self.out.write_byte(b',');
        if !self.write_value(value, depth)? {
            return Ok(self.discard(start, checkpoint));
        }
        self.out.write_byte(b']');

        if tag_like {
            self.out.insert_raw(start, "[6,");
            self.out.write_byte(b']');
        }
        Ok(true)
    }

    /// Encodes `value` in place, then takes it back out.
    ///
    /// Ancestors and earlier nodes encode as references, so a collection
    /// that contains itself terminates. The text is only meaningful for
    /// ordering; `None` means the value would be omitted.
    fn encode_aside(&mut self, value: &Value, depth: usize) -> Result<Option<Vec<u8>>, EncodeError> {
        let start = self.out.len();
        let checkpoint = self.refs.checkpoint();
        let text = self
            .write_value(value, depth)?
            .then(|| self.out.as_bytes()[start..].to_vec());
        self.discard(start, checkpoint);
        Ok(text)
    }

    /// Orders `entries` by a key computed with [`encode_aside`](Self::encode_aside).
    ///
    /// Every key is computed from the same reference state, so the result
    /// does not depend on the input order. Ties keep their input order.
    fn sort_by_encoding<T, K: Ord>(
        &mut self,
        entries: Vec<T>,
        mut key: impl FnMut(&mut Self, &T) -> Result<K, EncodeError>,
    ) -> Result<Vec<T>, EncodeError> {
        let mut keyed = Vec::with_capacity(entries.len());
        for entry in entries {
            keyed.push((key(self, &entry)?, entry));
        }
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(keyed.into_iter().map(|(_, entry)| entry).collect())
    }

    fn write_array(&mut self, items: &[Value], depth: usize) -> Result<(), EncodeError> {
        let open = self.out.len();
        self.out.write_byte(b'[');

        // End of the last element that was not omitted; the tail is trimmed.
        let mut kept = self.out.len();
        let mut tag_like = false;

        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                self.out.write_byte(b',');
            }
            let element = self.out.len();
            if self.write_value(item, depth)? {
                if index == 0 {
                    tag_like = is_tag_literal(&self.out.as_bytes()[element..]);
                }
                kept = self.out.len();
            } else {
                self.out.write_raw("null");
            }
        }

        self.out.truncate(kept);
        self.out.write_byte(b']');

        if tag_like {
            self.out.insert_raw(open, "[6,");
            self.out.write_byte(b']');
        }
        Ok(())
    }

    fn write_record(&mut self, mut fields: Vec<(String, Value)>, depth: usize) -> Result<(), EncodeError> {
        if self.options.stable {
            fields.sort_by(|a, b| a.0.cmp(&b.0));
        }

        self.out.write_byte(b'{');
        let mut separated = false;

        for (key, value) in &fields {
            if value.is_undefined() && !self.options.preserve_absent {
                continue;
            }
            let field = self.out.len();
            if separated {
                self.out.write_byte(b',');
            }
            self.out.write_string(key);
            self.out.write_byte(b':');
            if self.write_value(value, depth)? {
                separated = true;
            } else {
                self.out.truncate(field);
            }
        }

        self.out.write_byte(b'}');
        Ok(())
    }
}
