//! Per-call serialization options.

use std::fmt;
use std::sync::Arc;

use crate::adapter::{self, Adapter};
use crate::limits::DEFAULT_MAX_DEPTH;

/// Options shared by both sides of a round trip.
///
/// The same adapter list must be used to decode as was used to encode.
#[derive(Clone)]
pub struct Options {
    /// Adapters consulted in order; the first whose `detect` matches wins.
    pub adapters: Vec<Arc<dyn Adapter>>,

    /// Sort record keys, set items and map entries so that equal graphs
    /// always produce identical text.
    pub stable: bool,

    /// Keep record fields whose value is [`Value::Undefined`](crate::Value::Undefined).
    pub preserve_absent: bool,

    /// Maximum nesting depth accepted by either engine.
    pub max_depth: usize,
}

impl Options {
    /// Creates options with no adapters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options with fresh instances of every bundled adapter.
    pub fn with_builtin_adapters() -> Self {
        Self::new().with_adapters(adapter::builtin_adapters())
    }

    /// Appends an adapter.
    pub fn with_adapter(mut self, adapter: impl Adapter + 'static) -> Self {
        self.adapters.push(Arc::new(adapter));
        self
    }

    /// Appends shared adapters.
    pub fn with_adapters(mut self, adapters: impl IntoIterator<Item = Arc<dyn Adapter>>) -> Self {
        self.adapters.extend(adapters);
        self
    }

    pub fn stable(mut self, stable: bool) -> Self {
        self.stable = stable;
        self
    }

    pub fn preserve_absent(mut self, preserve: bool) -> Self {
        self.preserve_absent = preserve;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            adapters: Vec::new(),
            stable: false,
            preserve_absent: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.adapters.iter().map(|a| a.name()).collect();
        f.debug_struct("Options")
            .field("adapters", &names)
            .field("stable", &self.stable)
            .field("preserve_absent", &self.preserve_absent)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}
