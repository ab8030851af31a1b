//! Fixed-length (equal-width) symbol codec.
//!
//! Every symbol gets a code of `w = ceil(log2(n))` bits for an alphabet of
//! `n` symbols, with `w = 1` when `n == 1` so a one-symbol stream still has
//! a recoverable length. Codes are numbered `0..n` in frequency-table order.
//!
//! # Metadata Format
//!
//! ```text
//! +-----------+----------------+---------+----------------+---------+--
//! | width (8) | ordinal #0 (8) | code #0 | ordinal #1 (8) | code #1 | ...
//! +-----------+----------------+---------+----------------+---------+--
//!                                (w bits)                   (w bits)
//! ```
//!
//! The blob is byte-aligned; its pad length travels next to it. The record
//! area must be an exact multiple of `8 + w` bits.

use std::collections::{BTreeMap, HashMap};

use crate::bitio::{BitReader, BitWriter, PackedBits};
use crate::code::Code;
use crate::codec::{CancelToken, CodecKind, DecodeMonitor, SymbolCodec};
use crate::error::{DataError, MetadataError, Result};
use crate::profile::FrequencyTable;
use crate::symbol::Symbol;

/// Widest code an 8-bit ordinal alphabet can need (256 symbols).
const MAX_WIDTH: u8 = 8;

/// Code width for an alphabet of `alphabet_size` symbols.
pub fn code_width(alphabet_size: usize) -> u8 {
    if alphabet_size <= 1 {
        1
    } else {
        (usize::BITS - (alphabet_size - 1).leading_zeros()) as u8
    }
}

/// Equal-width code table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedLengthCodec<S: Symbol> {
    width: u8,
    /// Symbol -> code value, in table order
    table: Vec<(S, u64)>,
    encode_map: HashMap<S, u64>,
    decode_map: HashMap<u64, S>,
}

impl<S: Symbol> FixedLengthCodec<S> {
    fn from_table(width: u8, table: Vec<(S, u64)>) -> Self {
        let encode_map = table.iter().copied().collect();
        let decode_map = table.iter().map(|&(s, c)| (c, s)).collect();
        Self {
            width,
            table,
            encode_map,
            decode_map,
        }
    }

    /// Bits per code.
    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn alphabet_size(&self) -> usize {
        self.table.len()
    }

    /// Code assigned to `symbol`.
    pub fn code(&self, symbol: S) -> Option<Code> {
        self.encode_map
            .get(&symbol)
            .map(|&value| Code::from_value(value, self.width as usize))
    }
}

impl<S: Symbol> SymbolCodec<S> for FixedLengthCodec<S> {
    const KIND: CodecKind = CodecKind::FixedLength;

    fn build(table: &FrequencyTable<S>) -> Result<Self> {
        let width = code_width(table.alphabet_size());
        let entries = table
            .symbols()
            .enumerate()
            .map(|(i, symbol)| (symbol, i as u64))
            .collect();

        tracing::debug!(
            width,
            alphabet = table.alphabet_size(),
            "built fixed-length table"
        );
        Ok(Self::from_table(width, entries))
    }

    fn encode(&self, symbols: &[S], writer: &mut BitWriter) -> Result<()> {
        let width = self.width as usize;
        for symbol in symbols {
            let value = self
                .encode_map
                .get(symbol)
                .ok_or_else(|| DataError::UnknownSymbol(format!("{symbol:?}")))?;
            writer.write_bits(*value, width)?;
        }
        Ok(())
    }

    fn decode(&self, reader: &mut BitReader<'_>, cancel: Option<&CancelToken>) -> Result<Vec<S>> {
        let width = self.width as usize;
        let mut monitor = DecodeMonitor::new(reader.total_bits(), cancel);
        let mut symbols = Vec::with_capacity(reader.bits_remaining() / width);

        while !reader.is_empty() {
            let position = reader.position();
            if reader.bits_remaining() < width {
                return Err(DataError::TruncatedCode {
                    position,
                    remaining: reader.bits_remaining(),
                }
                .into());
            }

            let value = reader.read_bits(width)?;
            let symbol = self.decode_map.get(&value).ok_or_else(|| DataError::UnknownCode {
                code: Code::from_value(value, width).to_string(),
                position,
            })?;
            symbols.push(*symbol);
            monitor.checkpoint(reader.position())?;
        }

        Ok(symbols)
    }

    fn to_metadata(&self) -> Result<PackedBits> {
        let width = self.width as usize;
        let mut writer = BitWriter::with_capacity(8 + self.table.len() * (8 + width));
        writer.write_bits(self.width as u64, 8)?;
        for &(symbol, value) in &self.table {
            let ordinal = symbol
                .to_ordinal()
                .ok_or_else(|| MetadataError::UnsupportedSymbol(format!("{symbol:?}")))?;
            writer.write_bits(ordinal as u64, 8)?;
            writer.write_bits(value, width)?;
        }
        Ok(writer.finish())
    }

    fn from_metadata(metadata: &PackedBits) -> Result<Self> {
        let mut reader = BitReader::from_packed(metadata);
        if reader.bits_remaining() < 8 {
            return Err(MetadataError::Truncated {
                required: 1,
                actual: metadata.bytes().len(),
            }
            .into());
        }

        let width = reader.read_bits(8)? as u8;
        if width == 0 || width > MAX_WIDTH {
            return Err(MetadataError::InvalidWidth(width).into());
        }

        let stride = 8 + width as usize;
        let bits = reader.bits_remaining();
        if bits % stride != 0 {
            return Err(MetadataError::RecordMisaligned { bits, stride }.into());
        }
        if bits == 0 {
            return Err(MetadataError::NoRecords.into());
        }

        let mut table = Vec::with_capacity(bits / stride);
        let mut seen_symbols = [false; 256];
        let mut seen_codes = HashMap::new();
        while !reader.is_empty() {
            let ordinal = reader.read_bits(8)? as u8;
            let value = reader.read_bits(width as usize)?;

            if std::mem::replace(&mut seen_symbols[ordinal as usize], true) {
                return Err(MetadataError::DuplicateSymbol(ordinal).into());
            }
            if seen_codes.insert(value, ordinal).is_some() {
                return Err(MetadataError::DuplicateCode(
                    Code::from_value(value, width as usize).to_string(),
                )
                .into());
            }
            table.push((S::from_ordinal(ordinal), value));
        }

        tracing::debug!(width, alphabet = table.len(), "loaded fixed-length table");
        Ok(Self::from_table(width, table))
    }

    fn codebook(&self) -> BTreeMap<S, Code> {
        let width = self.width as usize;
        self.table
            .iter()
            .map(|&(symbol, value)| (symbol, Code::from_value(value, width)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn build(input: &[u8]) -> FixedLengthCodec<u8> {
        let table = FrequencyTable::from_symbols(input).unwrap();
        FixedLengthCodec::build(&table).unwrap()
    }

    #[test]
    fn test_code_width() {
        assert_eq!(code_width(1), 1);
        assert_eq!(code_width(2), 1);
        assert_eq!(code_width(3), 2);
        assert_eq!(code_width(4), 2);
        assert_eq!(code_width(5), 3);
        assert_eq!(code_width(27), 5);
        assert_eq!(code_width(128), 7);
        assert_eq!(code_width(129), 8);
        assert_eq!(code_width(256), 8);
    }

    #[test]
    fn test_codes_follow_frequency_order() {
        let codec = build(b"abracadabra");
        assert_eq!(codec.width(), 3);
        assert_eq!(codec.code(b'a').unwrap().to_string(), "000");
        assert_eq!(codec.code(b'b').unwrap().to_string(), "001");
        assert_eq!(codec.code(b'r').unwrap().to_string(), "010");
        assert_eq!(codec.code(b'c').unwrap().to_string(), "011");
        assert_eq!(codec.code(b'd').unwrap().to_string(), "100");
        assert!(codec.codebook().values().all(|c| c.len() == 3));
    }

    #[test]
    fn test_round_trip() {
        let input = b"the quick brown fox jumps over the lazy dog";
        let codec = build(input);
        let payload = codec.encode_all(input).unwrap();
        assert_eq!(payload.bit_len(), input.len() * codec.width() as usize);
        assert_eq!(codec.decode_all(&payload, None).unwrap(), input);
    }

    #[test]
    fn test_single_symbol_alphabet() {
        let input = b"zzzzzzz";
        let codec = build(input);
        assert_eq!(codec.width(), 1);

        let payload = codec.encode_all(input).unwrap();
        assert_eq!(payload.bit_len(), 7);
        assert_eq!(payload.padding(), 1);
        assert_eq!(codec.decode_all(&payload, None).unwrap(), input);
    }

    #[test]
    fn test_padding_is_not_decoded() {
        // 3 symbols * 2 bits = 6 bits, 2 filler bits that would decode as 'a'
        let codec = build(b"aabc");
        let payload = codec.encode_all(b"abc").unwrap();
        assert_eq!(payload.padding(), 2);
        assert_eq!(codec.decode_all(&payload, None).unwrap(), b"abc");
    }

    #[test]
    fn test_metadata_layout() {
        let codec = build(b"aab");
        let meta = codec.to_metadata().unwrap();
        // width=1 | 'a' 0 | 'b' 1  -> 8 + 9 + 9 = 26 bits
        assert_eq!(meta.bit_len(), 26);
        assert_eq!(meta.bytes()[0], 1);
        assert_eq!(meta.bytes()[1], b'a');
    }

    #[test]
    fn test_metadata_round_trip() {
        let codec = build(b"mississippi river");
        let meta = codec.to_metadata().unwrap();
        let restored = FixedLengthCodec::<u8>::from_metadata(&meta).unwrap();
        assert_eq!(restored.width(), codec.width());
        assert_eq!(restored.codebook(), codec.codebook());
    }

    #[test]
    fn test_metadata_invalid_width() {
        let meta = PackedBits::from_parts(vec![0, b'a', 0], 7).unwrap();
        assert!(matches!(
            FixedLengthCodec::<u8>::from_metadata(&meta),
            Err(Error::CorruptMetadata(MetadataError::InvalidWidth(0)))
        ));

        let meta = PackedBits::from_parts(vec![9, 0, 0, 0], 0).unwrap();
        assert!(matches!(
            FixedLengthCodec::<u8>::from_metadata(&meta),
            Err(Error::CorruptMetadata(MetadataError::InvalidWidth(9)))
        ));
    }

    #[test]
    fn test_metadata_truncated_record() {
        let codec = build(b"abcde");
        let meta = codec.to_metadata().unwrap();
        let mut bytes = meta.bytes().to_vec();
        bytes.pop();
        let truncated = PackedBits::from_parts(bytes, 0).unwrap();
        assert!(matches!(
            FixedLengthCodec::<u8>::from_metadata(&truncated),
            Err(Error::CorruptMetadata(MetadataError::RecordMisaligned { .. }))
        ));
    }

    #[test]
    fn test_metadata_without_records() {
        let meta = PackedBits::from_parts(vec![2], 0).unwrap();
        assert!(matches!(
            FixedLengthCodec::<u8>::from_metadata(&meta),
            Err(Error::CorruptMetadata(MetadataError::NoRecords))
        ));

        let empty = PackedBits::default();
        assert!(matches!(
            FixedLengthCodec::<u8>::from_metadata(&empty),
            Err(Error::CorruptMetadata(MetadataError::Truncated { .. }))
        ));
    }

    #[test]
    fn test_metadata_duplicates() {
        // width 8, two records for 'a'
        let meta = PackedBits::from_parts(vec![8, b'a', 0, b'a', 1], 0).unwrap();
        assert!(matches!(
            FixedLengthCodec::<u8>::from_metadata(&meta),
            Err(Error::CorruptMetadata(MetadataError::DuplicateSymbol(b'a')))
        ));

        let meta = PackedBits::from_parts(vec![8, b'a', 0, b'b', 0], 0).unwrap();
        assert!(matches!(
            FixedLengthCodec::<u8>::from_metadata(&meta),
            Err(Error::CorruptMetadata(MetadataError::DuplicateCode(_)))
        ));
    }

    #[test]
    fn test_unknown_code_detected() {
        // 3 symbols at width 2 leave code 11 unassigned
        let codec = build(b"aabc");
        let payload = PackedBits::from_parts(vec![0b0011_0000], 4).unwrap();
        let err = codec.decode_all(&payload, None).unwrap_err();
        assert!(matches!(
            err,
            Error::CorruptData(DataError::UnknownCode { position: 2, .. })
        ));
    }

    #[test]
    fn test_truncated_group_detected() {
        let codec = build(b"abcde"); // width 3
        let payload = PackedBits::from_parts(vec![0b0000_0100], 3).unwrap(); // 5 bits
        assert!(matches!(
            codec.decode_all(&payload, None),
            Err(Error::CorruptData(DataError::TruncatedCode {
                position: 3,
                remaining: 2
            }))
        ));
    }

    #[test]
    fn test_unknown_symbol_on_encode() {
        let codec = build(b"ab");
        assert!(matches!(
            codec.encode_all(b"abc"),
            Err(Error::CorruptData(DataError::UnknownSymbol(_)))
        ));
    }

    #[test]
    fn test_char_symbols() {
        let input: Vec<char> = "héllo wörld".chars().collect();
        let table = FrequencyTable::from_symbols(&input).unwrap();
        let codec = FixedLengthCodec::build(&table).unwrap();
        let meta = codec.to_metadata().unwrap();
        let restored = FixedLengthCodec::<char>::from_metadata(&meta).unwrap();
        let payload = codec.encode_all(&input).unwrap();
        assert_eq!(restored.decode_all(&payload, None).unwrap(), input);

        let wide: Vec<char> = "€uro".chars().collect();
        let table = FrequencyTable::from_symbols(&wide).unwrap();
        let codec = FixedLengthCodec::build(&table).unwrap();
        assert!(matches!(
            codec.to_metadata(),
            Err(Error::CorruptMetadata(MetadataError::UnsupportedSymbol(_)))
        ));
    }
}
