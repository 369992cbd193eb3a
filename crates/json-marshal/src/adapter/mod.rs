//! Adapter protocol for rich types.
//!
//! An adapter teaches the engine one or more types it does not know about.
//! Encoding asks each adapter in order to [`detect`](Adapter::detect) the
//! value; the first match [`pack`](Adapter::pack)s it into a payload that is
//! itself dehydrated, so payloads may contain nested composites and
//! references. Collections pack as [`Packed::Items`] or [`Packed::Entries`]
//! and leave ordering and omission of their members to the engine. Decoding
//! is split in two phases:
//!
//! 1. [`unpack`](Adapter::unpack) builds a *shell* from the raw payload. The
//!    engine registers it right away, so references inside the payload
//!    (including ones back to the value itself) can resolve to it.
//! 2. [`hydrate`](Adapter::hydrate) receives the fully decoded payload and
//!    fills the shell in.
//!
//! Bundled adapters live in the submodules; none of them is special-cased by
//! the engine.

pub mod bytes;
pub mod date;
pub mod error;
pub mod map;
pub mod regexp;
pub mod set;

use std::sync::Arc;

use crate::codec::Options;
use crate::error::{DecodeError, EncodeError};
use crate::model::{Tag, Value};

pub use bytes::{Bytes, BytesAdapter};
pub use date::{Date, DateAdapter};
pub use error::{ErrorAdapter, ErrorValue};
pub use map::{MapAdapter, ValueMap};
pub use regexp::{RegExp, RegExpAdapter};
pub use set::{SetAdapter, ValueSet};

/// Result of [`Adapter::pack`].
#[derive(Debug, Clone)]
pub enum Packed {
    /// Encode as `[tag, payload]`.
    Payload(Value),
    /// Encode as `[tag, [item, ...]]`, dropping items that would be omitted.
    ///
    /// In stable mode the items are ordered by their encoded text.
    Items(Vec<Value>),
    /// Encode as `[tag, [[key, value], ...]]`, dropping every entry whose key
    /// or value would be omitted.
    ///
    /// In stable mode entries are ordered by the encoded text of the key,
    /// then of the value.
    Entries(Vec<(Value, Value)>),
    /// Encode the value as if no adapter had matched.
    Unchanged,
    /// Leave the value out of the output.
    Omit,
}

/// Serialization plugin for one family of rich types.
///
/// Adapters are stateless and shared across calls and threads.
pub trait Adapter: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// Every tag this adapter may return from [`detect`](Adapter::detect).
    ///
    /// Tags must be at least 100 and unique among the adapters used together.
    fn tags(&self) -> &[Tag];

    /// Returns the tag to encode `value` with, or `None` if not applicable.
    fn detect(&self, value: &Value, options: &Options) -> Option<Tag>;

    /// Produces the payload for a detected value.
    fn pack(&self, tag: Tag, value: &Value, options: &Options) -> Result<Packed, EncodeError>;

    /// Builds the shell of a value from its raw payload.
    ///
    /// References inside `payload` are not resolved yet. A tagged value
    /// without a payload element passes JSON `null`.
    fn unpack(
        &self,
        tag: Tag,
        payload: &serde_json::Value,
        options: &Options,
    ) -> Result<Value, DecodeError>;

    /// Fills in the shell once the payload has been decoded.
    fn hydrate(
        &self,
        _tag: Tag,
        _shell: &Value,
        _payload: Value,
        _options: &Options,
    ) -> Result<(), DecodeError> {
        Ok(())
    }
}

/// Returns fresh instances of every bundled adapter.
pub fn builtin_adapters() -> Vec<Arc<dyn Adapter>> {
    vec![
        Arc::new(BytesAdapter),
        Arc::new(DateAdapter),
        Arc::new(ErrorAdapter),
        Arc::new(MapAdapter),
        Arc::new(RegExpAdapter),
        Arc::new(SetAdapter),
    ]
}

/// Returns the first adapter that declares `tag`.
pub fn find_by_tag(adapters: &[Arc<dyn Adapter>], tag: Tag) -> Option<&Arc<dyn Adapter>> {
    adapters.iter().find(|a| a.tags().contains(&tag))
}
