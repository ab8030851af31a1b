//! Bit-level I/O for payloads and metadata.
//!
//! `BitWriter` appends bits MSB-first and, on `finish`, pads the final byte
//! with zero bits and records how many it added. `BitReader` consumes bits
//! in append order through a forward cursor, stopping at the end of the
//! real bits: the pad length is not stored inside the bytes and must be
//! supplied by the caller.
//!
//! # Padding Rules
//! - A stream of `k` bits serializes to `ceil(k / 8)` bytes
//! - The recorded pad length is `(8 - k mod 8) mod 8`
//! - An empty stream serializes to zero bytes with pad length 0
//!
//! # Example
//! ```
//! use textpack_core::bitio::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bits(0b101, 3).unwrap();
//! writer.write_bits(0b11, 2).unwrap();
//!
//! let packed = writer.finish();
//! assert_eq!(packed.bytes(), &[0b1011_1000]);
//! assert_eq!(packed.padding(), 3);
//!
//! let mut reader = BitReader::from_packed(&packed);
//! assert_eq!(reader.read_bits(3).unwrap(), 0b101);
//! assert_eq!(reader.read_bits(2).unwrap(), 0b11);
//! assert!(reader.is_empty());
//! ```

use crate::code::Code;
use crate::error::{BitIoError, Result};

/// Byte-aligned bits plus the number of filler bits at the end.
///
/// # Invariants
/// - `padding` is in `0..=7`
/// - `padding` is 0 when `bytes` is empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackedBits {
    bytes: Vec<u8>,
    padding: u8,
}

impl PackedBits {
    /// Rebuild packed bits from stored bytes and a separately stored pad length.
    pub fn from_parts(bytes: Vec<u8>, padding: u8) -> Result<Self> {
        if padding > 7 || (bytes.is_empty() && padding != 0) {
            return Err(BitIoError::InvalidPadding {
                padding,
                bytes: bytes.len(),
            }
            .into());
        }
        Ok(Self { bytes, padding })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn padding(&self) -> u8 {
        self.padding
    }

    /// Number of real (non-filler) bits.
    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8 - self.padding as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Writes bits MSB-first into a byte buffer.
///
/// # Invariants
/// - `bit_count` is always < 8
#[derive(Debug, Clone)]
pub struct BitWriter {
    /// Completed bytes
    bytes: Vec<u8>,
    /// Accumulator for the current partial byte (MSB-aligned)
    bit_buffer: u8,
    /// Number of bits in bit_buffer (0-7)
    bit_count: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            bit_buffer: 0,
            bit_count: 0,
        }
    }

    /// Create a writer with room for roughly `bits` bits.
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bits.div_ceil(8)),
            bit_buffer: 0,
            bit_count: 0,
        }
    }

    /// Append a single bit.
    pub fn write_bit(&mut self, bit: bool) {
        if bit {
            self.bit_buffer |= 0x80 >> self.bit_count;
        }
        self.bit_count += 1;
        if self.bit_count == 8 {
            self.bytes.push(self.bit_buffer);
            self.bit_buffer = 0;
            self.bit_count = 0;
        }
    }

    /// Write the lowest `count` bits of `value`, most significant first.
    ///
    /// # Errors
    /// Returns `BitIoError::InvalidBitCount` if count > 64.
    pub fn write_bits(&mut self, value: u64, count: usize) -> Result<()> {
        if count > 64 {
            return Err(BitIoError::InvalidBitCount(count).into());
        }

        let mut remaining = count;
        let mut val = if count == 64 {
            value
        } else {
            value & ((1u64 << count) - 1)
        };

        while remaining > 0 {
            let bits_to_write = remaining.min(8 - self.bit_count as usize);

            // Top bits_to_write bits of what is left
            let shift = remaining - bits_to_write;
            let bits = ((val >> shift) & ((1 << bits_to_write) - 1)) as u8;

            self.bit_buffer |= bits << (8 - self.bit_count as usize - bits_to_write);
            self.bit_count += bits_to_write as u8;

            if self.bit_count == 8 {
                self.bytes.push(self.bit_buffer);
                self.bit_buffer = 0;
                self.bit_count = 0;
            }

            val &= (1u64 << shift) - 1;
            remaining -= bits_to_write;
        }

        Ok(())
    }

    /// Append every bit of a code in order.
    pub fn write_code(&mut self, code: &Code) {
        for bit in code.iter() {
            self.write_bit(bit);
        }
    }

    /// Pad to a byte boundary with zero bits and return the packed result.
    pub fn finish(mut self) -> PackedBits {
        let padding = if self.bit_count > 0 {
            self.bytes.push(self.bit_buffer);
            8 - self.bit_count
        } else {
            0
        };
        PackedBits {
            bytes: self.bytes,
            padding,
        }
    }

    /// Total number of bits written (including the partial byte).
    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8 + self.bit_count as usize
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads bits MSB-first with a forward cursor.
///
/// # Invariants
/// - `bit_position <= total_bits <= data.len() * 8`
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Number of readable bits (padding excluded)
    total_bits: usize,
    /// Current bit position (0 = MSB of first byte)
    bit_position: usize,
}

impl<'a> BitReader<'a> {
    /// Reader over the real bits of `packed`; filler bits are never returned.
    pub fn from_packed(packed: &'a PackedBits) -> Self {
        Self {
            data: &packed.bytes,
            total_bits: packed.bit_len(),
            bit_position: 0,
        }
    }

    /// Read a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        if self.bit_position >= self.total_bits {
            return Err(BitIoError::UnexpectedEof.into());
        }
        let byte = self.data[self.bit_position / 8];
        let bit = byte & (0x80 >> (self.bit_position % 8)) != 0;
        self.bit_position += 1;
        Ok(bit)
    }

    /// Read up to 64 bits, most significant first.
    ///
    /// # Errors
    /// - `BitIoError::InvalidBitCount` if count > 64
    /// - `BitIoError::UnexpectedEof` if not enough bits remain
    pub fn read_bits(&mut self, count: usize) -> Result<u64> {
        if count > 64 {
            return Err(BitIoError::InvalidBitCount(count).into());
        }

        if count > self.bits_remaining() {
            return Err(BitIoError::UnexpectedEof.into());
        }

        let mut result = 0u64;
        let mut remaining = count;

        while remaining > 0 {
            let byte_idx = self.bit_position / 8;
            let bit_offset = self.bit_position % 8;

            let bits_in_byte = 8 - bit_offset;
            let bits_to_read = remaining.min(bits_in_byte);

            let byte = self.data[byte_idx];
            let mask = ((1u16 << bits_to_read) - 1) as u8;
            let bits = (byte >> (bits_in_byte - bits_to_read)) & mask;

            result = (result << bits_to_read) | bits as u64;

            self.bit_position += bits_to_read;
            remaining -= bits_to_read;
        }

        Ok(result)
    }

    /// Bits left before the padding.
    pub fn bits_remaining(&self) -> usize {
        self.total_bits - self.bit_position
    }

    /// Current bit position.
    pub fn position(&self) -> usize {
        self.bit_position
    }

    /// Readable bits in total (padding excluded).
    pub fn total_bits(&self) -> usize {
        self.total_bits
    }

    pub fn is_empty(&self) -> bool {
        self.bit_position >= self.total_bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_single_byte() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b10110011, 8).unwrap();

        let packed = writer.finish();
        assert_eq!(packed.bytes(), &[0b10110011]);
        assert_eq!(packed.padding(), 0);

        let mut reader = BitReader::from_packed(&packed);
        assert_eq!(reader.read_bits(8).unwrap(), 0b10110011);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_padding_recorded() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b101, 3).unwrap();
        writer.write_bits(0b11, 2).unwrap();

        let packed = writer.finish();
        assert_eq!(packed.bytes(), &[0b10111000]);
        assert_eq!(packed.padding(), 3);
        assert_eq!(packed.bit_len(), 5);
    }

    #[test]
    fn test_padding_accounting_for_every_remainder() {
        for k in 0..=40usize {
            let mut writer = BitWriter::new();
            for i in 0..k {
                writer.write_bit(i % 3 == 0);
            }
            let packed = writer.finish();
            assert_eq!(packed.bytes().len(), k.div_ceil(8), "k = {k}");
            assert_eq!(packed.padding() as usize, (8 - k % 8) % 8, "k = {k}");
            assert_eq!(packed.bit_len(), k);
        }
    }

    #[test]
    fn test_empty_stream() {
        let packed = BitWriter::new().finish();
        assert!(packed.is_empty());
        assert_eq!(packed.padding(), 0);

        let mut reader = BitReader::from_packed(&packed);
        assert!(reader.is_empty());
        assert!(reader.read_bit().is_err());
    }

    #[test]
    fn test_reader_stops_at_padding() {
        let packed = PackedBits::from_parts(vec![0b1100_0000], 6).unwrap();
        let mut reader = BitReader::from_packed(&packed);
        assert_eq!(reader.total_bits(), 2);
        assert!(reader.read_bit().unwrap());
        assert!(reader.read_bit().unwrap());
        assert!(matches!(
            reader.read_bit(),
            Err(crate::Error::BitIo(BitIoError::UnexpectedEof))
        ));
    }

    #[test]
    fn test_invalid_padding_rejected() {
        assert!(PackedBits::from_parts(vec![], 3).is_err());
        assert!(PackedBits::from_parts(vec![0], 9).is_err());
        assert!(PackedBits::from_parts(vec![0], 7).is_ok());
    }

    #[test]
    fn test_multi_byte() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b1010101111110000, 16).unwrap();

        let packed = writer.finish();
        assert_eq!(packed.bytes(), &[0b10101011, 0b11110000]);

        let mut reader = BitReader::from_packed(&packed);
        assert_eq!(reader.read_bits(16).unwrap(), 0b1010101111110000);
    }

    #[test]
    fn test_high_bits_ignored() {
        let mut writer = BitWriter::new();
        writer.write_bits(0xFF, 2).unwrap();
        let packed = writer.finish();
        assert_eq!(packed.bytes(), &[0b1100_0000]);
    }

    #[test]
    fn test_64_bit_values() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        let val = 0x123456789ABCDEF0u64;
        writer.write_bits(val, 64).unwrap();

        let packed = writer.finish();
        let mut reader = BitReader::from_packed(&packed);
        assert!(reader.read_bit().unwrap());
        assert_eq!(reader.read_bits(64).unwrap(), val);
        assert!(reader.read_bits(65).is_err());
    }

    #[test]
    fn test_write_code() {
        let mut writer = BitWriter::new();
        writer.write_code(&Code::from_value(0b011, 3));
        writer.write_code(&Code::from_value(0b1, 1));
        assert_eq!(writer.bit_len(), 4);
        assert_eq!(writer.finish().bytes(), &[0b0111_0000]);
    }

    #[test]
    fn test_bits_remaining() {
        let packed = PackedBits::from_parts(vec![0xFF, 0xFF], 0).unwrap();
        let mut reader = BitReader::from_packed(&packed);

        assert_eq!(reader.bits_remaining(), 16);
        reader.read_bits(5).unwrap();
        assert_eq!(reader.bits_remaining(), 11);
        assert_eq!(reader.position(), 5);
        reader.read_bits(11).unwrap();
        assert_eq!(reader.bits_remaining(), 0);
        assert!(reader.is_empty());
    }
}
