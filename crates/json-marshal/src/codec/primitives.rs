//! Primitive text encoding for the JSON wire format.
//!
//! Implements literal writing (numbers, strings, tagged markers) and the
//! nesting-depth pre-scan run before parsing.

use crate::error::DecodeError;
use crate::model::Tag;

/// Largest integer magnitude written without a fraction or exponent.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

// =============================================================================
// ENCODING
// =============================================================================

/// Writer for JSON text.
#[derive(Debug, Clone, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// Creates a new writer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Creates a new writer with capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Returns the written text.
    pub fn into_string(self) -> String {
        // Only UTF-8 is ever written.
        String::from_utf8(self.buf)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
    }

    /// Returns the written bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the number of bytes written.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Discards everything written after `len`.
    pub fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
    }

    /// Inserts pre-encoded JSON text at byte offset `at`.
    pub fn insert_raw(&mut self, at: usize, text: &str) {
        self.buf.splice(at..at, text.bytes());
    }

    /// Writes a single ASCII byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    /// Writes pre-encoded JSON text.
    #[inline]
    pub fn write_raw(&mut self, text: &str) {
        self.buf.extend_from_slice(text.as_bytes());
    }

    /// Writes a quoted, escaped JSON string.
    pub fn write_string(&mut self, s: &str) {
        // Writing a str into a Vec cannot fail.
        let _ = serde_json::to_writer(&mut self.buf, s);
    }

    /// Writes a finite number.
    ///
    /// Integral values within the safe integer range are written without a
    /// fraction (`-0` becomes `0`); everything else uses the shortest
    /// representation that parses back to the same double.
    pub fn write_number(&mut self, n: f64) {
        if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER {
            self.write_raw(&(n as i64).to_string());
        } else if let Some(num) = serde_json::Number::from_f64(n) {
            self.write_raw(&num.to_string());
        } else {
            self.write_raw("null");
        }
    }

    /// Writes a payload-less tagged value, e.g. `[2]`.
    pub fn write_marker(&mut self, tag: Tag) {
        self.write_byte(b'[');
        self.write_raw(&tag.to_string());
        self.write_byte(b']');
    }

    /// Writes `[tag,` ahead of a payload; close with `]`.
    pub fn open_tagged(&mut self, tag: Tag) {
        self.write_byte(b'[');
        self.write_raw(&tag.to_string());
        self.write_byte(b',');
    }
}

/// Returns true if `literal` is encoded text the decoder would read as a tag.
pub fn is_tag_literal(literal: &[u8]) -> bool {
    !literal.is_empty() && literal.iter().all(u8::is_ascii_digit)
}

// =============================================================================
// DECODING
// =============================================================================

/// Fails if arrays/objects in `text` nest deeper than `max_depth`.
///
/// Brackets inside string literals are ignored. Malformed text is left for
/// the parser to reject.
pub fn check_nesting_depth(text: &str, max_depth: usize) -> Result<(), DecodeError> {
    if exceeds_nesting_depth(text.as_bytes(), max_depth) {
        return Err(DecodeError::DepthLimitExceeded { max: max_depth });
    }
    Ok(())
}

/// Returns true if brackets in `text` nest deeper than `max_depth`.
///
/// The encoder runs this over its own output, so anything it produces
/// passes [`check_nesting_depth`] with the same limit.
pub fn exceeds_nesting_depth(text: &[u8], max_depth: usize) -> bool {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for &byte in text {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                if depth > max_depth {
                    return true;
                }
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    false
}
