//! Tag space for tagged wire values.
//!
//! A tagged value is a JSON array whose first element is a non-negative
//! integer tag, optionally followed by a single payload element. Tags below
//! [`RESERVED_TAG_LIMIT`] are reserved for the engine; adapters use the
//! open range starting at [`FIRST_ADAPTER_TAG`].

use crate::limits::RESERVED_TAG_LIMIT;

/// Integer tag of a wire value.
pub type Tag = u32;

/// First tag available to adapters.
pub const FIRST_ADAPTER_TAG: Tag = RESERVED_TAG_LIMIT;

/// Built-in markers with fixed wire numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BuiltinTag {
    /// `[0, slot]`: points to an already visited composite.
    Reference = 0,
    /// `[1]`: absent value.
    Absent = 1,
    /// `[2]`
    NotANumber = 2,
    /// `[3]`
    PosInfinity = 3,
    /// `[4]`
    NegInfinity = 4,
    /// `[5, "digits"]`
    BigInteger = 5,
    /// `[6, [...]]`: array whose first element would read as a tag.
    HomogeneousArray = 6,
}

impl BuiltinTag {
    /// Creates a BuiltinTag from its wire representation.
    pub fn from_u64(v: u64) -> Option<BuiltinTag> {
        match v {
            0 => Some(BuiltinTag::Reference),
            1 => Some(BuiltinTag::Absent),
            2 => Some(BuiltinTag::NotANumber),
            3 => Some(BuiltinTag::PosInfinity),
            4 => Some(BuiltinTag::NegInfinity),
            5 => Some(BuiltinTag::BigInteger),
            6 => Some(BuiltinTag::HomogeneousArray),
            _ => None,
        }
    }

    /// Returns the wire tag.
    pub fn tag(self) -> Tag {
        self as Tag
    }
}

/// Returns true if `tag` belongs to the reserved range.
#[inline]
pub fn is_reserved(tag: Tag) -> bool {
    tag < RESERVED_TAG_LIMIT
}

/// Tags of the bundled adapters.
pub mod builtin {
    use super::Tag;

    pub const DATE: Tag = 100;
    pub const ERROR: Tag = 101;
    pub const REGEXP: Tag = 102;
    pub const SET: Tag = 103;
    pub const MAP: Tag = 104;
    pub const BYTES: Tag = 105;
}
