//! Insertion-ordered maps with arbitrary keys, encoded as
//! `[104, [[key, value], ...]]`.
//!
//! Keys and values may be any value, including composites and the map
//! itself. Entries are inserted during the hydrate phase, once references
//! inside them resolve.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;

use crate::adapter::{Adapter, Packed};
use crate::codec::Options;
use crate::error::{DecodeError, EncodeError};
use crate::model::tag::builtin;
use crate::model::{HostObject, Tag, Value};

/// A map keyed by SameValueZero: composites by identity, primitives by
/// value, NaN equal to NaN.
///
/// Lookups are linear in the number of entries.
#[derive(Default)]
pub struct ValueMap {
    entries: RefCell<Vec<(Value, Value)>>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, key: &Value) -> Option<usize> {
        self.entries
            .borrow()
            .iter()
            .position(|(k, _)| k.same_value_zero(key))
    }

    /// Inserts or replaces an entry. A replaced entry keeps its position.
    pub fn set(&self, key: Value, value: Value) {
        match self.position(&key) {
            Some(index) => self.entries.borrow_mut()[index].1 = value,
            None => self.entries.borrow_mut().push((key, value)),
        }
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        let index = self.position(key)?;
        Some(self.entries.borrow()[index].1.clone())
    }

    pub fn has(&self, key: &Value) -> bool {
        self.position(key).is_some()
    }

    pub fn delete(&self, key: &Value) -> Option<Value> {
        let index = self.position(key)?;
        Some(self.entries.borrow_mut().remove(index).1)
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Returns a copy of the entries, in insertion order.
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.entries.borrow().clone()
    }
}

impl FromIterator<(Value, Value)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let map = ValueMap::new();
        for (key, value) in iter {
            map.set(key, value);
        }
        map
    }
}

// Entries may contain the map itself.
impl fmt::Debug for ValueMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueMap(len={})", self.len())
    }
}

impl HostObject for ValueMap {
    fn type_name(&self) -> &str {
        "Map"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Adapter for [`ValueMap`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MapAdapter;

impl Adapter for MapAdapter {
    fn name(&self) -> &str {
        "map"
    }

    fn tags(&self) -> &[Tag] {
        &[builtin::MAP]
    }

    fn detect(&self, value: &Value, _options: &Options) -> Option<Tag> {
        value.downcast_host::<ValueMap>().map(|_| builtin::MAP)
    }

    fn pack(&self, _tag: Tag, value: &Value, _options: &Options) -> Result<Packed, EncodeError> {
        let Some(map) = value.downcast_host::<ValueMap>() else {
            return Ok(Packed::Unchanged);
        };
        Ok(Packed::Entries(map.entries()))
    }

    fn unpack(
        &self,
        _tag: Tag,
        payload: &serde_json::Value,
        _options: &Options,
    ) -> Result<Value, DecodeError> {
        if !payload.is_array() {
            return Err(DecodeError::invalid_payload(self.name(), "expected an array of entries"));
        }
        Ok(Value::host(ValueMap::new()))
    }

    fn hydrate(
        &self,
        _tag: Tag,
        shell: &Value,
        payload: Value,
        _options: &Options,
    ) -> Result<(), DecodeError> {
        let map = shell
            .downcast_host::<ValueMap>()
            .ok_or_else(|| DecodeError::invalid_payload(self.name(), "shell is not a map"))?;
        let Some(pairs) = payload.as_array() else {
            return Err(DecodeError::invalid_payload(self.name(), "expected an array of entries"));
        };

        for pair in pairs.to_vec() {
            let entry = pair.as_array().map(|p| p.to_vec()).unwrap_or_default();
            match <[Value; 2]>::try_from(entry) {
                Ok([key, value]) => map.set(key, value),
                Err(_) => {
                    return Err(DecodeError::invalid_payload(self.name(), "entry is not a [key, value] pair"));
                }
            }
        }
        Ok(())
    }
}
