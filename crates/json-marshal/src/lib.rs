//! json-marshal: JSON text codec for value graphs.
//!
//! Serializes in-memory value graphs into JSON-compatible text and back,
//! preserving what plain JSON cannot represent:
//! - **Shared references and cycles**: a composite reached twice is written
//!   once and referenced afterwards
//! - **Non-JSON primitives**: absent values, NaN, the infinities, big integers
//! - **Rich types**: dates, maps, sets and anything else an [`Adapter`]
//!   teaches the engine
//!
//! # Quick Start
//!
//! ```rust
//! use json_marshal::{deserialize, serialize, Options, Value};
//!
//! let shared = Value::array([Value::from("x")]);
//! let root = Value::object([("a", shared.clone()), ("b", shared)]);
//!
//! let options = Options::with_builtin_adapters();
//! let text = serialize(&root, &options).unwrap();
//! assert_eq!(text, r#"{"a":["x"],"b":[0,1]}"#);
//!
//! let decoded = deserialize(&text, &options).unwrap();
//! let record = decoded.as_object().unwrap();
//! assert!(record.get("a").unwrap().ptr_eq(&record.get("b").unwrap()));
//! ```
//!
//! # Modules
//!
//! - [`model`]: The value graph, tag space and builders
//! - [`codec`]: Encoding/decoding engines and per-call options
//! - [`adapter`]: The adapter protocol and the bundled adapters
//! - [`validate`]: Adapter configuration checks
//! - [`error`]: Error types
//! - [`limits`]: Depth limits and the reserved tag range
//!
//! # Wire Format
//!
//! Output is plain JSON. Anything that is not a JSON literal, array or
//! record is written as a *tagged value*: an array whose first element is a
//! non-negative integer tag, optionally followed by one payload element.
//! Tags below 100 are reserved; see [`BuiltinTag`].
//!
//! Both sides of a round trip must use the same adapters.

pub mod adapter;
pub mod codec;
pub mod error;
pub mod limits;
pub mod model;
pub mod util;
pub mod validate;

// Re-export commonly used types at crate root
pub use adapter::{
    Adapter, Bytes, BytesAdapter, Date, DateAdapter, ErrorAdapter, ErrorValue, MapAdapter, Packed,
    RegExp, RegExpAdapter, SetAdapter, ValueMap, ValueSet, builtin_adapters,
};
pub use codec::{Options, Serializer, deserialize, serialize};
pub use error::{ConfigError, DecodeError, EncodeError};
pub use model::{
    ArrayBuilder, ArrayRef, BuiltinTag, Callable, HostObject, HostRef, ObjectBuilder, ObjectRef,
    Record, Symbol, Tag, Value,
};
pub use validate::validate_adapters;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
