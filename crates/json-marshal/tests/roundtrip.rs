//! Round trips through the public API: shared references, cycles, stable
//! output and generated graphs.

use std::collections::BTreeMap;

use json_marshal::{
    Date, DecodeError, EncodeError, ErrorValue, ObjectBuilder, Options, RegExp, Value, ValueMap,
    ValueSet, deserialize, serialize,
};
use num_bigint::BigInt;
use proptest::prelude::*;

/// Structural equality for acyclic graphs; primitives by SameValueZero.
fn same(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(x), Value::Array(y)) => {
            let (x, y) = (x.to_vec(), y.to_vec());
            x.len() == y.len() && x.iter().zip(&y).all(|(a, b)| same(a, b))
        }
        (Value::Object(x), Value::Object(y)) => {
            let (x, y) = (x.entries(), y.entries());
            x.len() == y.len()
                && x.iter()
                    .zip(&y)
                    .all(|((ka, va), (kb, vb))| ka == kb && same(va, vb))
        }
        (Value::Host(_), Value::Host(_)) => {
            if let (Some(x), Some(y)) = (a.downcast_host::<ValueSet>(), b.downcast_host::<ValueSet>()) {
                let (x, y) = (x.values(), y.values());
                return x.len() == y.len() && x.iter().zip(&y).all(|(a, b)| same(a, b));
            }
            if let (Some(x), Some(y)) = (a.downcast_host::<ValueMap>(), b.downcast_host::<ValueMap>()) {
                let (x, y) = (x.entries(), y.entries());
                return x.len() == y.len()
                    && x.iter()
                        .zip(&y)
                        .all(|((ka, va), (kb, vb))| same(ka, kb) && same(va, vb));
            }
            a.ptr_eq(b)
        }
        _ => a.same_value_zero(b),
    }
}

fn empty_record() -> Value {
    Value::object(Vec::<(String, Value)>::new())
}

#[test]
fn test_self_referencing_record() {
    let value = empty_record();
    value.as_object().unwrap().insert("bbb", value.clone());

    let text = serialize(&value, &Options::new()).unwrap();
    assert_eq!(text, r#"{"bbb":[0,0]}"#);
    value.as_object().unwrap().remove("bbb");

    let decoded = deserialize(&text, &Options::new()).unwrap();
    let record = decoded.as_object().unwrap();
    assert!(record.get("bbb").unwrap().ptr_eq(&decoded));
    record.remove("bbb");
}

#[test]
fn test_fields_sharing_an_empty_record() {
    let shared = empty_record();
    let value = Value::object([("aaa", shared.clone()), ("bbb", shared)]);

    let text = serialize(&value, &Options::new()).unwrap();
    assert_eq!(text, r#"{"aaa":{},"bbb":[0,1]}"#);

    let decoded = deserialize(&text, &Options::new()).unwrap();
    let record = decoded.as_object().unwrap();
    assert!(record.get("aaa").unwrap().ptr_eq(&record.get("bbb").unwrap()));
}

#[test]
fn test_cycle_through_nested_array() {
    let root = Value::array([]);
    let child = Value::object([("parent", root.clone())]);
    root.as_array().unwrap().push(child.clone());
    root.as_array().unwrap().push(child);

    let text = serialize(&root, &Options::new()).unwrap();
    assert_eq!(text, r#"[{"parent":[0,0]},[0,1]]"#);
    root.as_array().unwrap().borrow_mut().clear();

    let decoded = deserialize(&text, &Options::new()).unwrap();
    let array = decoded.as_array().unwrap();
    let first = array.get(0).unwrap();
    assert!(first.ptr_eq(&array.get(1).unwrap()));
    assert!(first.as_object().unwrap().get("parent").unwrap().ptr_eq(&decoded));
    array.borrow_mut().clear();
}

#[test]
fn test_special_primitives() {
    let value = Value::array([
        Value::from(f64::NAN),
        Value::from(f64::INFINITY),
        Value::from(f64::NEG_INFINITY),
        Value::Undefined,
        Value::from(BigInt::from(2).pow(100)),
        Value::boxed(Value::from("boxed")),
    ]);
    let text = serialize(&value, &Options::new()).unwrap();
    assert_eq!(
        text,
        r#"[[2],[3],[4],[1],[5,"1267650600228229401496703205376"],"boxed"]"#
    );

    let decoded = deserialize(&text, &Options::new()).unwrap();
    let expected = Value::array([
        Value::from(f64::NAN),
        Value::from(f64::INFINITY),
        Value::from(f64::NEG_INFINITY),
        Value::Undefined,
        Value::from(BigInt::from(2).pow(100)),
        Value::from("boxed"),
    ]);
    assert!(same(&decoded, &expected));
}

#[test]
fn test_integer_leading_arrays() {
    let value = Value::array([
        Value::array([Value::from(0)]),
        Value::array([Value::from(0), Value::from(1)]),
        Value::array([Value::from(100), Value::from("x")]),
    ]);
    let text = serialize(&value, &Options::new()).unwrap();
    assert_eq!(text, r#"[[6,[0]],[6,[0,1]],[6,[100,"x"]]]"#);

    let decoded = deserialize(&text, &Options::with_builtin_adapters()).unwrap();
    assert!(same(&decoded, &value));
}

#[test]
fn test_absent_fields() {
    let value = ObjectBuilder::new().absent("aaa").field("bbb", 222).build();

    let decoded = deserialize(&serialize(&value, &Options::new()).unwrap(), &Options::new()).unwrap();
    assert!(!decoded.as_object().unwrap().contains_key("aaa"));

    let options = Options::new().preserve_absent(true);
    let decoded = deserialize(&serialize(&value, &options).unwrap(), &options).unwrap();
    assert!(decoded.as_object().unwrap().get("aaa").unwrap().is_undefined());
}

#[test]
fn test_builtin_adapters_nested() {
    let options = Options::with_builtin_adapters();

    let date = Value::host(Date::from_millis(86_400_000.0));
    let map = ValueMap::new();
    map.set(Value::from("when"), date.clone());
    map.set(date.clone(), Value::host(RegExp::new("a+", "g")));
    let set: ValueSet = [Value::from(1), Value::host(ErrorValue::new("Error", "boom"))]
        .into_iter()
        .collect();
    let root = Value::object([("map", Value::host(map)), ("set", Value::host(set))]);

    let text = serialize(&root, &options).unwrap();
    assert_eq!(
        text,
        r#"{"map":[104,[["when",[100,86400000]],[[0,4],[102,["a+","g"]]]]],"set":[103,[6,[1,[101,["Error","boom"]]]]]}"#
    );

    let decoded = deserialize(&text, &options).unwrap();
    let record = decoded.as_object().unwrap();
    let map = record.get("map").unwrap();
    let map = map.downcast_host::<ValueMap>().unwrap();
    let date = map.get(&Value::from("when")).unwrap();
    assert_eq!(date.downcast_host::<Date>().unwrap().millis(), 86_400_000.0);
    let re = map.get(&date).unwrap();
    assert_eq!(re.downcast_host::<RegExp>().unwrap().source, "a+");

    let set = record.get("set").unwrap();
    let set = set.downcast_host::<ValueSet>().unwrap();
    let items = set.values();
    assert_eq!(items[0].as_number(), Some(1.0));
    assert_eq!(items[1].downcast_host::<ErrorValue>().unwrap().message(), "boom");
}

#[test]
fn test_stable_output_ignores_insertion_order() {
    let options = Options::with_builtin_adapters().stable(true);

    let build = |reverse: bool| {
        let mut fields = vec![("bbb", Value::from(1)), ("aaa", Value::from(2))];
        let mut items = vec![Value::from("y"), Value::from("x")];
        let mut entries = vec![
            (Value::from(2), Value::from("two")),
            (Value::from(1), Value::from("one")),
        ];
        if reverse {
            fields.reverse();
            items.reverse();
            entries.reverse();
        }
        Value::object([
            ("record", Value::object(fields)),
            ("set", Value::host(items.into_iter().collect::<ValueSet>())),
            ("map", Value::host(entries.into_iter().collect::<ValueMap>())),
        ])
    };

    let a = serialize(&build(false), &options).unwrap();
    let b = serialize(&build(true), &options).unwrap();
    assert_eq!(a, b);
    assert_eq!(
        a,
        r#"{"map":[104,[[6,[1,"one"]],[6,[2,"two"]]]],"record":{"aaa":2,"bbb":1},"set":[103,["x","y"]]}"#
    );
}

#[test]
fn test_output_within_depth_limit_decodes() {
    let options = Options::new().max_depth(4);
    let nested = |levels: usize| (0..levels).fold(Value::from(f64::NAN), |v, _| Value::array([v]));

    let text = serialize(&nested(3), &options).unwrap();
    assert_eq!(text, "[[[[2]]]]");
    assert!(deserialize(&text, &options).is_ok());

    assert_eq!(
        serialize(&nested(4), &options),
        Err(EncodeError::DepthLimitExceeded { max: 4 })
    );
    assert!(matches!(
        deserialize("[[[[[2]]]]]", &options),
        Err(DecodeError::DepthLimitExceeded { max: 4 })
    ));
}

#[test]
fn test_stable_cycle_through_collections() {
    let options = Options::with_builtin_adapters().stable(true);
    let root = empty_record();
    let set: ValueSet = [root.clone(), Value::from("aaa")].into_iter().collect();
    let map = ValueMap::new();
    map.set(root.clone(), Value::from(1));
    root.as_object().unwrap().insert("set", Value::host(set));
    root.as_object().unwrap().insert("map", Value::host(map));

    let text = serialize(&root, &options).unwrap();
    assert_eq!(
        text,
        r#"{"map":[104,[[[0,0],1]]],"set":[103,["aaa",[0,0]]]}"#
    );
    root.as_object().unwrap().remove("set");
    root.as_object().unwrap().remove("map");

    let decoded = deserialize(&text, &options).unwrap();
    let record = decoded.as_object().unwrap();
    let set = record.get("set").unwrap();
    assert!(set.downcast_host::<ValueSet>().unwrap().has(&decoded));
    let map = record.get("map").unwrap();
    let count = map.downcast_host::<ValueMap>().unwrap().get(&decoded).unwrap();
    assert_eq!(count.as_number(), Some(1.0));
    record.remove("set");
    record.remove("map");
}

#[test]
fn test_collections_drop_entries_that_encode_to_nothing() {
    let options = Options::with_builtin_adapters();
    let hidden = Value::boxed(Value::symbol(Some("hidden")));

    let map = ValueMap::new();
    map.set(Value::from("aaa"), hidden.clone());
    map.set(hidden.clone(), Value::from("bbb"));
    map.set(Value::from("ccc"), Value::from(1));
    let set: ValueSet = [hidden, Value::from("ddd")].into_iter().collect();
    let root = Value::array([Value::host(map), Value::host(set)]);

    let text = serialize(&root, &options).unwrap();
    assert_eq!(text, r#"[[104,[["ccc",1]]],[103,["ddd"]]]"#);

    let decoded = deserialize(&text, &options).unwrap();
    let items = decoded.as_array().unwrap();
    let map = items.get(0).unwrap();
    assert_eq!(map.downcast_host::<ValueMap>().unwrap().len(), 1);
    let set = items.get(1).unwrap();
    assert_eq!(set.downcast_host::<ValueSet>().unwrap().len(), 1);
}

// =============================================================================
// Generated graphs
// =============================================================================

/// Plain description of an acyclic graph, built into a fresh `Value` on demand.
#[derive(Debug, Clone)]
enum Node {
    Null,
    Absent,
    Bool(bool),
    Number(f64),
    Text(String),
    Big(i128),
    List(Vec<Node>),
    Record(BTreeMap<String, Node>),
    Set(Vec<Node>),
    Map(BTreeMap<String, Node>),
}

impl Node {
    /// Builds the graph; `reverse` inserts record fields, set items and map
    /// entries in reverse order.
    fn build(&self, reverse: bool) -> Value {
        match self {
            Node::Null => Value::Null,
            Node::Absent => Value::Undefined,
            Node::Bool(b) => Value::from(*b),
            Node::Number(n) => Value::from(*n),
            Node::Text(s) => Value::from(s.as_str()),
            Node::Big(n) => Value::from(BigInt::from(*n)),
            Node::List(items) => Value::array(items.iter().map(|n| n.build(reverse))),
            Node::Record(fields) => {
                let mut entries: Vec<(String, Value)> =
                    fields.iter().map(|(k, n)| (k.clone(), n.build(reverse))).collect();
                if reverse {
                    entries.reverse();
                }
                Value::object(entries)
            }
            Node::Set(items) => {
                // Deduplicate in one order so both builds hold the same members.
                let set: ValueSet = items.iter().map(|n| n.build(reverse)).collect();
                let mut members = set.values();
                if reverse {
                    members.reverse();
                }
                Value::host(members.into_iter().collect::<ValueSet>())
            }
            Node::Map(entries) => {
                let mut entries: Vec<(Value, Value)> = entries
                    .iter()
                    .map(|(k, n)| (Value::from(k.as_str()), n.build(reverse)))
                    .collect();
                if reverse {
                    entries.reverse();
                }
                Value::host(entries.into_iter().collect::<ValueMap>())
            }
        }
    }
}

fn arb_node() -> impl Strategy<Value = Node> {
    let leaf = prop_oneof![
        Just(Node::Null),
        Just(Node::Absent),
        any::<bool>().prop_map(Node::Bool),
        any::<f64>().prop_map(Node::Number),
        (0i64..200).prop_map(|n| Node::Number(n as f64)),
        "[a-z0-9 \"\\\\]{0,8}".prop_map(Node::Text),
        any::<i128>().prop_map(Node::Big),
    ];
    leaf.prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Node::List),
            prop::collection::btree_map("[a-z]{1,4}", inner.clone(), 0..6).prop_map(Node::Record),
            prop::collection::vec(inner.clone(), 0..6).prop_map(Node::Set),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..6).prop_map(Node::Map),
        ]
    })
}

proptest! {
    #[test]
    fn prop_roundtrip_preserves_structure(node in arb_node()) {
        let options = Options::with_builtin_adapters().preserve_absent(true);
        let value = node.build(false);

        let text = serialize(&value, &options).unwrap();
        let decoded = deserialize(&text, &options).unwrap();
        prop_assert!(same(&value, &decoded), "text: {}", text);
    }

    #[test]
    fn prop_stable_output_is_deterministic(node in arb_node()) {
        let options = Options::with_builtin_adapters().stable(true);
        let a = serialize(&node.build(false), &options).unwrap();
        let b = serialize(&node.build(true), &options).unwrap();
        prop_assert_eq!(&a, &b);

        // Decoding and re-encoding reproduces the same text.
        let decoded = deserialize(&a, &options).unwrap();
        prop_assert_eq!(serialize(&decoded, &options).unwrap(), a);
    }

    #[test]
    fn prop_shared_subtree_keeps_identity(items in prop::collection::vec(arb_node(), 0..4)) {
        let shared = Node::List(items).build(false);
        let root = Value::array([shared.clone(), Value::from("between"), shared]);

        let options = Options::with_builtin_adapters();
        let decoded = deserialize(&serialize(&root, &options).unwrap(), &options).unwrap();
        let array = decoded.as_array().unwrap();
        prop_assert!(array.get(0).unwrap().ptr_eq(&array.get(2).unwrap()));
    }
}
