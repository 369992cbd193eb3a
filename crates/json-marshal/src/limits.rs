//! Limits applied while encoding and decoding.
//!
//! Recursion in both engines is bounded so that deeply nested input fails
//! with an error instead of exhausting the stack.

/// Default maximum nesting depth, for values on encode and JSON text on decode.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Tags below this value are reserved for built-in markers.
pub const RESERVED_TAG_LIMIT: u32 = 100;
