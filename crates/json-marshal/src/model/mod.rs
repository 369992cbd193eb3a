//! Data model types.
//!
//! - Values (the in-memory graph, with shared handles for composites)
//! - Tags (the integer namespace of tagged wire values)
//! - Builders (ergonomic construction)

pub mod builder;
pub mod tag;
pub mod value;

pub use builder::{ArrayBuilder, ObjectBuilder};
pub use tag::{is_reserved, BuiltinTag, Tag, FIRST_ADAPTER_TAG};
pub use value::{ArrayRef, Callable, HostObject, HostRef, ObjectRef, Record, Symbol, Value};
