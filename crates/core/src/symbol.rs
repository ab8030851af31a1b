//! Symbol types the codecs can work over.
//!
//! Codecs only need symbols to be ordered and hashable while building and
//! applying a code. Persisting metadata additionally needs an 8-bit ordinal
//! per symbol, which is what this trait provides.

use std::fmt::Debug;
use std::hash::Hash;

/// A unit of the input alphabet.
pub trait Symbol: Copy + Ord + Hash + Debug {
    /// The 8-bit ordinal written into metadata, or `None` if the symbol
    /// does not fit.
    fn to_ordinal(self) -> Option<u8>;

    /// Inverse of `to_ordinal`.
    fn from_ordinal(ordinal: u8) -> Self;
}

impl Symbol for u8 {
    fn to_ordinal(self) -> Option<u8> {
        Some(self)
    }

    fn from_ordinal(ordinal: u8) -> Self {
        ordinal
    }
}

/// Characters in the Latin-1 range (scalar value <= 255).
impl Symbol for char {
    fn to_ordinal(self) -> Option<u8> {
        u8::try_from(u32::from(self)).ok()
    }

    fn from_ordinal(ordinal: u8) -> Self {
        char::from(ordinal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_ordinals() {
        assert_eq!('a'.to_ordinal(), Some(97));
        assert_eq!('é'.to_ordinal(), Some(0xE9));
        assert_eq!('€'.to_ordinal(), None);
        assert_eq!(char::from_ordinal(0xE9), 'é');
    }
}
