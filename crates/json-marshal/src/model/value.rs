//! In-memory value graph.
//!
//! Composite values are reference-counted handles: cloning a [`Value`] clones
//! the handle, so two clones of the same array or record are the *same*
//! node of the graph. Identity (not equality) is what the reference tracker
//! keys on, which is how shared and cyclic structures survive a round trip.
//!
//! Graphs containing cycles are not freed automatically when the last outside
//! handle is dropped; break the cycle (e.g. by clearing a container) first.

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use num_bigint::BigInt;

/// Field storage of a record, in insertion order.
pub type Record = IndexMap<String, Value>;

/// A node of a value graph.
#[derive(Clone, Default)]
pub enum Value {
    /// JSON `null`.
    Null,
    /// Absent value; encoded as a tag, dropped from records by default.
    #[default]
    Undefined,
    Bool(bool),
    /// IEEE 754 double, including NaN and the infinities.
    Number(f64),
    String(String),
    /// Arbitrary-precision integer.
    BigInt(BigInt),
    /// Identity-bearing wrapper around a primitive. Unwrapped on encode.
    Boxed(Rc<Value>),
    Array(ArrayRef),
    Object(ObjectRef),
    /// Rich value of a type the engine knows nothing about.
    Host(HostRef),
    /// Never serialized.
    Function(Callable),
    /// Never serialized.
    Symbol(Symbol),
}

impl Value {
    /// Creates a new array node.
    pub fn array(items: impl IntoIterator<Item = Value>) -> Value {
        Value::Array(ArrayRef::new(items.into_iter().collect()))
    }

    /// Creates a new record node.
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Value {
        Value::Object(ObjectRef::new(
            fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Wraps a host object.
    pub fn host<T: HostObject>(object: T) -> Value {
        Value::Host(HostRef::new(object))
    }

    /// Wraps a callable.
    pub fn function(f: impl Fn(&[Value]) -> Value + 'static) -> Value {
        Value::Function(Callable::new(f))
    }

    /// Creates a new unique symbol.
    pub fn symbol(description: Option<&str>) -> Value {
        Value::Symbol(Symbol::new(description))
    }

    /// Boxes a primitive.
    pub fn boxed(value: Value) -> Value {
        Value::Boxed(Rc::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns true for values that are always omitted from output.
    pub fn is_omitted(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Symbol(_))
    }

    /// Returns true for nodes that are assigned a reference slot.
    pub fn is_composite(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_) | Value::Host(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bigint(&self) -> Option<&BigInt> {
        match self {
            Value::BigInt(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_host(&self) -> Option<&HostRef> {
        match self {
            Value::Host(h) => Some(h),
            _ => None,
        }
    }

    /// Returns the host object as `T`, if this is a host value of that type.
    pub fn downcast_host<T: HostObject>(&self) -> Option<&T> {
        self.as_host().and_then(|h| h.downcast_ref::<T>())
    }

    /// Returns true if both values are the same graph node.
    ///
    /// Always false for unboxed primitives, which have no identity.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// SameValueZero: identity for nodes, value equality for primitives,
    /// NaN equal to itself and `+0` equal to `-0`.
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Undefined, Value::Undefined) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            _ => self.ptr_eq(other),
        }
    }

    /// Address of the shared allocation, for nodes that have one.
    pub(crate) fn identity(&self) -> Option<usize> {
        match self {
            Value::Boxed(b) => Some(Rc::as_ptr(b) as *const () as usize),
            Value::Array(a) => Some(a.addr()),
            Value::Object(o) => Some(o.addr()),
            Value::Host(h) => Some(h.addr()),
            Value::Function(f) => Some(Rc::as_ptr(&f.0) as *const () as usize),
            Value::Symbol(s) => Some(Rc::as_ptr(&s.0) as *const () as usize),
            _ => None,
        }
    }
}

// Debug never descends into composites: graphs may be cyclic.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Undefined => f.write_str("Undefined"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::BigInt(n) => write!(f, "BigInt({n})"),
            Value::Boxed(inner) => write!(f, "Boxed({inner:?})"),
            Value::Array(a) => write!(f, "Array(len={})", a.len()),
            Value::Object(o) => write!(f, "Object(keys={:?})", o.keys()),
            Value::Host(h) => write!(f, "Host({})", h.type_name()),
            Value::Function(_) => f.write_str("Function"),
            Value::Symbol(s) => write!(f, "Symbol({:?})", s.description()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

macro_rules! impl_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Number(v as f64)
                }
            }
        )*
    };
}

// 64-bit integers above 2^53 lose precision; use `BigInt` for those.
impl_from_number!(f64, f32, i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<BigInt> for Value {
    fn from(v: BigInt) -> Self {
        Value::BigInt(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(ArrayRef::new(v))
    }
}

impl From<ArrayRef> for Value {
    fn from(v: ArrayRef) -> Self {
        Value::Array(v)
    }
}

impl From<ObjectRef> for Value {
    fn from(v: ObjectRef) -> Self {
        Value::Object(v)
    }
}

impl From<HostRef> for Value {
    fn from(v: HostRef) -> Self {
        Value::Host(v)
    }
}

/// Imports plain JSON data. Tagged arrays are *not* interpreted.
impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::array(items.iter().map(Value::from)),
            serde_json::Value::Object(fields) => {
                Value::object(fields.iter().map(|(k, v)| (k.clone(), Value::from(v))))
            }
        }
    }
}

// =============================================================================
// COMPOSITE HANDLES
// =============================================================================

/// Shared handle to an ordered list.
#[derive(Clone, Default)]
pub struct ArrayRef(Rc<RefCell<Vec<Value>>>);

impl ArrayRef {
    pub fn new(items: Vec<Value>) -> Self {
        ArrayRef(Rc::new(RefCell::new(items)))
    }

    pub fn borrow(&self) -> Ref<'_, Vec<Value>> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Vec<Value>> {
        self.0.borrow_mut()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Returns a handle to the element at `index`.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned()
    }

    pub fn push(&self, value: Value) {
        self.0.borrow_mut().push(value);
    }

    /// Returns a copy of the element handles.
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &ArrayRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

/// Shared handle to a keyed record.
#[derive(Clone, Default)]
pub struct ObjectRef(Rc<RefCell<Record>>);

impl ObjectRef {
    pub fn new(fields: Record) -> Self {
        ObjectRef(Rc::new(RefCell::new(fields)))
    }

    pub fn borrow(&self) -> Ref<'_, Record> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Record> {
        self.0.borrow_mut()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Returns a handle to the field value.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    /// Sets a field, keeping its position if it already exists.
    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    /// Returns the keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    /// Returns a copy of the fields, in insertion order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

// =============================================================================
// HOST OBJECTS
// =============================================================================

/// A rich value whose representation only its adapter understands.
///
/// Types that need to be filled in after construction (containers that may
/// hold themselves) use interior mutability, because the decoder registers
/// the object before its contents are decoded.
pub trait HostObject: Any {
    /// Human-readable type name, used in diagnostics.
    fn type_name(&self) -> &str;

    /// Serializable stand-in used when no adapter claims the value.
    fn to_serializable(&self) -> Option<Value> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a host object.
#[derive(Clone)]
pub struct HostRef(Rc<dyn HostObject>);

impl HostRef {
    pub fn new<T: HostObject>(object: T) -> Self {
        HostRef(Rc::new(object))
    }

    pub fn type_name(&self) -> &str {
        self.0.type_name()
    }

    pub fn to_serializable(&self) -> Option<Value> {
        self.0.to_serializable()
    }

    pub fn downcast_ref<T: HostObject>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub fn is<T: HostObject>(&self) -> bool {
        self.0.as_any().is::<T>()
    }

    pub fn ptr_eq(&self, other: &HostRef) -> bool {
        self.addr() == other.addr()
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

// =============================================================================
// NON-SERIALIZABLE VALUES
// =============================================================================

/// A callable value.
#[derive(Clone)]
pub struct Callable(Rc<dyn Fn(&[Value]) -> Value>);

impl Callable {
    pub fn new(f: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Callable(Rc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.0)(args)
    }
}

/// A unique runtime handle. Two symbols are never equal unless they are
/// clones of each other.
#[derive(Clone)]
pub struct Symbol(Rc<Option<String>>);

impl Symbol {
    pub fn new(description: Option<&str>) -> Self {
        Symbol(Rc::new(description.map(str::to_string)))
    }

    pub fn description(&self) -> Option<&str> {
        self.0.as_deref()
    }
}
