//! The seam shared by both codecs.
//!
//! A codec is built once from a frequency table (or rebuilt from its
//! serialized metadata) and is immutable afterwards. Encoding appends codes
//! to a `BitWriter`; decoding consumes a `BitReader` until its bit supply is
//! exhausted.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::bitio::{BitReader, BitWriter, PackedBits};
use crate::code::Code;
use crate::error::{Error, MetadataError, Result};
use crate::profile::FrequencyTable;
use crate::symbol::Symbol;

/// Which codec produced an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecKind {
    FixedLength,
    Huffman,
}

impl CodecKind {
    /// One-byte tag stored in the metadata header.
    pub fn tag(self) -> u8 {
        match self {
            CodecKind::FixedLength => 0,
            CodecKind::Huffman => 1,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(CodecKind::FixedLength),
            1 => Ok(CodecKind::Huffman),
            other => Err(MetadataError::UnknownCodec(other).into()),
        }
    }
}

impl fmt::Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecKind::FixedLength => f.write_str("fixed-length"),
            CodecKind::Huffman => f.write_str("huffman"),
        }
    }
}

/// Shared flag used to interrupt a running decode.
///
/// Clones observe the same flag, so one clone can be handed to whatever
/// decides to cancel (a signal handler, a watchdog, a UI) while the other
/// is passed to the decode.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Cancellation and progress bookkeeping for one decode.
///
/// Logs progress at every 5% of the bit supply and turns a cancelled token
/// into `Error::Interrupted` carrying the number of bits consumed.
pub(crate) struct DecodeMonitor<'a> {
    cancel: Option<&'a CancelToken>,
    total_bits: usize,
    next_percent: usize,
}

impl<'a> DecodeMonitor<'a> {
    const STEP_PERCENT: usize = 5;

    pub(crate) fn new(total_bits: usize, cancel: Option<&'a CancelToken>) -> Self {
        Self {
            cancel,
            total_bits,
            next_percent: Self::STEP_PERCENT,
        }
    }

    /// Called once per decoded symbol with the reader position after it.
    pub(crate) fn checkpoint(&mut self, position: usize) -> Result<()> {
        if self.cancel.is_some_and(CancelToken::is_cancelled) {
            tracing::warn!(
                consumed_bits = position,
                total_bits = self.total_bits,
                "decode interrupted"
            );
            return Err(Error::Interrupted {
                consumed_bits: position,
                total_bits: self.total_bits,
            });
        }

        if self.total_bits > 0 {
            let percent = position * 100 / self.total_bits;
            if percent >= self.next_percent {
                tracing::debug!(percent, "decoding");
                self.next_percent = (percent / Self::STEP_PERCENT + 1) * Self::STEP_PERCENT;
            }
        }
        Ok(())
    }
}

/// A static symbol code that can be persisted and rebuilt.
pub trait SymbolCodec<S: Symbol>: Sized {
    /// Tag written into the artifact header.
    const KIND: CodecKind;

    /// Derive the code from a frequency table.
    fn build(table: &FrequencyTable<S>) -> Result<Self>;

    /// Append the code of every symbol, in input order.
    fn encode(&self, symbols: &[S], writer: &mut BitWriter) -> Result<()>;

    /// Decode until the reader's bit supply is exhausted.
    fn decode(&self, reader: &mut BitReader<'_>, cancel: Option<&CancelToken>) -> Result<Vec<S>>;

    /// Serialize the code table / tree.
    fn to_metadata(&self) -> Result<PackedBits>;

    /// Rebuild from serialized metadata.
    fn from_metadata(metadata: &PackedBits) -> Result<Self>;

    /// Every symbol with its code.
    fn codebook(&self) -> BTreeMap<S, Code>;

    /// Encode a whole stream into packed bits.
    fn encode_all(&self, symbols: &[S]) -> Result<PackedBits> {
        let mut writer = BitWriter::with_capacity(symbols.len() * 8);
        self.encode(symbols, &mut writer)?;
        Ok(writer.finish())
    }

    /// Decode a whole payload.
    fn decode_all(&self, payload: &PackedBits, cancel: Option<&CancelToken>) -> Result<Vec<S>> {
        let mut reader = BitReader::from_packed(payload);
        self.decode(&mut reader, cancel)
    }

    /// Frequency-weighted mean code length in bits per symbol.
    fn mean_code_length(&self, table: &FrequencyTable<S>) -> f64 {
        let codebook = self.codebook();
        let weighted: f64 = table
            .iter()
            .map(|(symbol, count)| {
                let len = codebook.get(&symbol).map_or(0, Code::len);
                len as f64 * count as f64
            })
            .sum();
        weighted / table.total() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        for kind in [CodecKind::FixedLength, CodecKind::Huffman] {
            assert_eq!(CodecKind::from_tag(kind.tag()).unwrap(), kind);
        }
        assert!(matches!(
            CodecKind::from_tag(9),
            Err(Error::CorruptMetadata(MetadataError::UnknownCodec(9)))
        ));
    }

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_monitor_interrupts() {
        let token = CancelToken::new();
        let mut monitor = DecodeMonitor::new(100, Some(&token));
        monitor.checkpoint(10).unwrap();
        token.cancel();
        let err = monitor.checkpoint(40).unwrap_err();
        assert!(matches!(
            err,
            Error::Interrupted {
                consumed_bits: 40,
                total_bits: 100
            }
        ));
    }
}
