//! Insertion-ordered sets of arbitrary values, encoded as `[103, [item, ...]]`.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;

use crate::adapter::{Adapter, Packed};
use crate::codec::Options;
use crate::error::{DecodeError, EncodeError};
use crate::model::tag::builtin;
use crate::model::{HostObject, Tag, Value};

/// A set with SameValueZero membership.
///
/// Membership tests are linear in the number of items.
#[derive(Default)]
pub struct ValueSet {
    items: RefCell<Vec<Value>>,
}

impl ValueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `item`. Returns false if an equal item was already present.
    pub fn add(&self, item: Value) -> bool {
        if self.has(&item) {
            return false;
        }
        self.items.borrow_mut().push(item);
        true
    }

    pub fn has(&self, item: &Value) -> bool {
        self.items.borrow().iter().any(|v| v.same_value_zero(item))
    }

    pub fn delete(&self, item: &Value) -> bool {
        let mut items = self.items.borrow_mut();
        match items.iter().position(|v| v.same_value_zero(item)) {
            Some(index) => {
                items.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        self.items.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Returns a copy of the items, in insertion order.
    pub fn values(&self) -> Vec<Value> {
        self.items.borrow().clone()
    }
}

impl FromIterator<Value> for ValueSet {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let set = ValueSet::new();
        for item in iter {
            set.add(item);
        }
        set
    }
}

impl fmt::Debug for ValueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueSet(len={})", self.len())
    }
}

impl HostObject for ValueSet {
    fn type_name(&self) -> &str {
        "Set"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Adapter for [`ValueSet`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SetAdapter;

impl Adapter for SetAdapter {
    fn name(&self) -> &str {
        "set"
    }

    fn tags(&self) -> &[Tag] {
        &[builtin::SET]
    }

    fn detect(&self, value: &Value, _options: &Options) -> Option<Tag> {
        value.downcast_host::<ValueSet>().map(|_| builtin::SET)
    }

    fn pack(&self, _tag: Tag, value: &Value, _options: &Options) -> Result<Packed, EncodeError> {
        match value.downcast_host::<ValueSet>() {
            Some(set) => Ok(Packed::Items(set.values())),
            None => Ok(Packed::Unchanged),
        }
    }

    fn unpack(
        &self,
        _tag: Tag,
        payload: &serde_json::Value,
        _options: &Options,
    ) -> Result<Value, DecodeError> {
        if !payload.is_array() {
            return Err(DecodeError::invalid_payload(self.name(), "expected an array of items"));
        }
        Ok(Value::host(ValueSet::new()))
    }

    fn hydrate(
        &self,
        _tag: Tag,
        shell: &Value,
        payload: Value,
        _options: &Options,
    ) -> Result<(), DecodeError> {
        let set = shell
            .downcast_host::<ValueSet>()
            .ok_or_else(|| DecodeError::invalid_payload(self.name(), "shell is not a set"))?;
        let Some(items) = payload.as_array() else {
            return Err(DecodeError::invalid_payload(self.name(), "expected an array of items"));
        };
        for item in items.to_vec() {
            set.add(item);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{deserialize, serialize};

    fn options() -> Options {
        Options::new().with_adapter(SetAdapter)
    }

    fn set_of(items: impl IntoIterator<Item = Value>) -> Value {
        Value::host(items.into_iter().collect::<ValueSet>())
    }

    #[test]
    fn test_membership() {
        let set = ValueSet::new();
        assert!(set.add(Value::from("aaa")));
        assert!(!set.add(Value::from("aaa")));
        assert!(set.add(Value::from(f64::NAN)));
        assert!(!set.add(Value::from(f64::NAN)));
        assert!(set.has(&Value::from("aaa")));
        assert!(set.delete(&Value::from("aaa")));
        assert!(!set.delete(&Value::from("aaa")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_wire_form() {
        assert_eq!(serialize(&set_of([]), &options()).unwrap(), "[103,[]]");
        assert_eq!(
            serialize(&set_of([Value::from("aaa"), Value::symbol(None), Value::from("111")]), &options()).unwrap(),
            r#"[103,["aaa","111"]]"#
        );
        // Leading integer items go through the collision guard.
        assert_eq!(
            serialize(&set_of([Value::from(1), Value::from(2)]), &options()).unwrap(),
            "[103,[6,[1,2]]]"
        );
    }

    #[test]
    fn test_stable_order() {
        let value = set_of([Value::from("bbb"), Value::from("aaa")]);
        assert_eq!(serialize(&value, &options()).unwrap(), r#"[103,["bbb","aaa"]]"#);
        assert_eq!(
            serialize(&value, &options().stable(true)).unwrap(),
            r#"[103,["aaa","bbb"]]"#
        );

        let value = set_of([Value::from("bbb"), Value::function(|_| Value::Null), Value::from("111")]);
        assert_eq!(
            serialize(&value, &options().stable(true)).unwrap(),
            r#"[103,["111","bbb"]]"#
        );
    }

    #[test]
    fn test_roundtrip() {
        let value = deserialize("[103,[6,[1,2]]]", &options()).unwrap();
        let set = value.downcast_host::<ValueSet>().unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.has(&Value::from(1)));
        assert!(set.has(&Value::from(2)));
    }

    #[test]
    fn test_set_containing_itself() {
        let value = set_of([]);
        value.downcast_host::<ValueSet>().unwrap().add(value.clone());

        let text = serialize(&value, &options()).unwrap();
        assert_eq!(text, "[103,[[0,0]]]");
        value.downcast_host::<ValueSet>().unwrap().clear();

        let decoded = deserialize(&text, &options()).unwrap();
        let set = decoded.downcast_host::<ValueSet>().unwrap();
        assert!(set.has(&decoded));
        set.clear();
    }

    #[test]
    fn test_stable_set_containing_itself() {
        let value = set_of([Value::from("aaa")]);
        value.downcast_host::<ValueSet>().unwrap().add(value.clone());

        let text = serialize(&value, &options().stable(true)).unwrap();
        assert_eq!(text, r#"[103,["aaa",[0,0]]]"#);
        value.downcast_host::<ValueSet>().unwrap().clear();

        let decoded = deserialize(&text, &options()).unwrap();
        let set = decoded.downcast_host::<ValueSet>().unwrap();
        assert!(set.has(&decoded));
        assert!(set.has(&Value::from("aaa")));
        set.clear();
    }

    /// Serializes as a symbol, so it never reaches the output.
    struct Hidden;

    impl HostObject for Hidden {
        fn type_name(&self) -> &str {
            "Hidden"
        }

        fn to_serializable(&self) -> Option<Value> {
            Some(Value::symbol(Some("hidden")))
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_indirectly_omitted_items_are_dropped() {
        let value = set_of([
            Value::boxed(Value::function(|_| Value::Null)),
            Value::host(Hidden),
            Value::from(1),
        ]);
        for options in [options(), options().stable(true)] {
            let text = serialize(&value, &options).unwrap();
            assert_eq!(text, "[103,[6,[1]]]");

            let decoded = deserialize(&text, &options).unwrap();
            let set = decoded.downcast_host::<ValueSet>().unwrap();
            assert_eq!(set.len(), 1);
            assert!(set.has(&Value::from(1)));
        }
    }

    #[test]
    fn test_invalid_payload() {
        assert!(matches!(
            deserialize(r#"[103,"aaa"]"#, &options()),
            Err(DecodeError::InvalidPayload { .. })
        ));
    }
}
