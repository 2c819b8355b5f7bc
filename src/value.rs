//! Compact-string value representation (spec §3, §9 "Compact-string union").
//!
//! The reference source overloads a machine-word-wide union between a
//! pointer and inline NUL-padded bytes with an adjacent tag bit. That union
//! is re-architected here as a tagged enum with two payload variants —
//! `Inline` bytes and an owned `Heap` allocation — selected by an explicit
//! discriminant instead of a bit trick. A value's length decides the
//! variant in constant time: strings shorter than a machine word (including
//! their terminator) stay inline, everything else goes to the heap.

use std::fmt;
use std::ops::Deref;

/// Values shorter than this (in bytes, not counting a terminator — Pickle
/// strings are plain byte strings here, not NUL-terminated C strings) are
/// stored inline. One pointer-width, matching the reference design's "fits
/// in a machine word including terminator".
pub const INLINE_CAPACITY: usize = std::mem::size_of::<usize>() - 1;

#[derive(Clone)]
enum Repr {
    Inline { buf: [u8; INLINE_CAPACITY], len: u8 },
    Heap(Box<str>),
}

/// A Pickle value: every value is a byte string. Small values live inline;
/// everything else is heap-allocated. Used for variable names, variable
/// values, and the interpreter's `result`.
#[derive(Clone)]
pub struct PString(Repr);

impl PString {
    pub fn new(s: &str) -> Self {
        if s.len() <= INLINE_CAPACITY {
            let mut buf = [0u8; INLINE_CAPACITY];
            buf[..s.len()].copy_from_slice(s.as_bytes());
            PString(Repr::Inline { buf, len: s.len() as u8 })
        } else {
            PString(Repr::Heap(s.into()))
        }
    }

    pub fn empty() -> Self {
        PString::new("")
    }

    pub fn as_str(&self) -> &str {
        match &self.0 {
            Repr::Inline { buf, len } => {
                std::str::from_utf8(&buf[..*len as usize]).unwrap_or("")
            }
            Repr::Heap(s) => s,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self.0, Repr::Inline { .. })
    }

    pub fn len(&self) -> usize {
        self.as_str().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Deref for PString {
    type Target = str;
    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Debug for PString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for PString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl PartialEq for PString {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}
impl Eq for PString {}

impl From<&str> for PString {
    fn from(s: &str) -> Self {
        PString::new(s)
    }
}
impl From<String> for PString {
    fn from(s: String) -> Self {
        PString::new(&s)
    }
}
impl From<&String> for PString {
    fn from(s: &String) -> Self {
        PString::new(s)
    }
}

/// Result-ownership tri-state (spec §9 "Result ownership tri-state").
///
/// The reference interpreter's `result` field is either a pointer into a
/// small inline buffer, a static empty/OOM sentinel, or a heap allocation.
/// `PString` already collapses the first two into its `Inline` variant (the
/// empty string is just an inline string of length zero), so the
/// interpreter simply stores one `PString` as `result`: the sink
/// (`result-set`, [`crate::interp::Interp::set_result`]) is total because
/// `PString::new` never fails for any caller-supplied string, and the
/// source (`result-get`) hands out a borrowed `&str` view via `as_str`.
pub type ResultValue = PString;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_strings_are_inline() {
        let s = PString::new("hi");
        assert!(s.is_inline());
        assert_eq!(s.as_str(), "hi");
    }

    #[test]
    fn long_strings_go_to_heap() {
        let long = "x".repeat(INLINE_CAPACITY + 1);
        let s = PString::new(&long);
        assert!(!s.is_inline());
        assert_eq!(s.as_str(), long);
    }

    #[test]
    fn empty_is_inline_and_empty() {
        let s = PString::empty();
        assert!(s.is_inline());
        assert!(s.is_empty());
    }

    #[test]
    fn boundary_length_stays_inline() {
        let s = PString::new(&"a".repeat(INLINE_CAPACITY));
        assert!(s.is_inline());
        assert_eq!(s.len(), INLINE_CAPACITY);
    }
}
