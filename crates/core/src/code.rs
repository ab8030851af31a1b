//! Codewords.
//!
//! A `Code` is the ordered bit sequence assigned to one symbol. Huffman codes
//! can be longer than 64 bits on pathological distributions, so bits are kept
//! in a vector rather than a machine word.

use std::fmt;

/// An ordered sequence of bits, first bit written first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Code {
    bits: Vec<bool>,
}

impl Code {
    pub fn new() -> Self {
        Self { bits: Vec::new() }
    }

    /// The lowest `width` bits of `value`, left-zero-padded, MSB first.
    pub fn from_value(value: u64, width: usize) -> Self {
        let bits = (0..width)
            .rev()
            .map(|i| i < 64 && (value >> i) & 1 == 1)
            .collect();
        Self { bits }
    }

    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    /// True if `self` is a prefix of `other` (every code is a prefix of itself).
    pub fn is_prefix_of(&self, other: &Code) -> bool {
        other.bits.starts_with(&self.bits)
    }

    /// Numeric value of the code, if it fits in 64 bits.
    pub fn value(&self) -> Option<u64> {
        if self.bits.len() > 64 {
            return None;
        }
        Some(self.bits.iter().fold(0u64, |acc, &b| (acc << 1) | b as u64))
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.bits {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromIterator<bool> for Code {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_value_pads_left() {
        let code = Code::from_value(0b101, 5);
        assert_eq!(code.to_string(), "00101");
        assert_eq!(code.value(), Some(0b101));
        assert_eq!(code.len(), 5);
    }

    #[test]
    fn test_prefix() {
        let short: Code = [false, true].into_iter().collect();
        let long: Code = [false, true, true].into_iter().collect();
        assert!(short.is_prefix_of(&long));
        assert!(!long.is_prefix_of(&short));
        assert!(short.is_prefix_of(&short));
    }

    #[test]
    fn test_long_code_has_no_value() {
        let code: Code = std::iter::repeat(true).take(65).collect();
        assert_eq!(code.value(), None);
    }
}
