//! Error types for the textpack codecs.
//!
//! Every operation returns a structured error rather than panicking. The
//! driver reports each failure per phase and exits non-zero, so nothing is
//! swallowed between the codec and the user.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::codec::CodecKind;

/// Top-level error type for all operations in the crate.
///
/// Each variant corresponds to a failure domain:
/// - Source: the input file or stream could not be used
/// - State: an operation was invoked out of order
/// - Metadata: the code table or tree failed structural validation
/// - Data: the payload does not decode against the metadata
/// - Interrupted: a decode was cancelled before finishing
/// - Bit I/O and file I/O
#[derive(Debug, Error)]
pub enum Error {
    /// Input file does not exist
    #[error("source not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// Nothing to build a code for
    #[error("empty input: no symbols to build a code for")]
    EmptyInput,

    /// Operation invoked before the state it needs was created or loaded
    #[error("cannot {operation} while {state}")]
    UninitializedState {
        operation: &'static str,
        state: CodecState,
    },

    /// Code table or tree failed validation
    #[error("corrupt metadata: {0}")]
    CorruptMetadata(#[from] MetadataError),

    /// Payload has no valid decoding under the metadata
    #[error("corrupt data: {0}")]
    CorruptData(#[from] DataError),

    /// Decode cancelled before the payload was exhausted
    #[error(
        "decode interrupted after {consumed_bits} of {total_bits} bits ({:.1}%)",
        percent(*consumed_bits, *total_bits)
    )]
    Interrupted {
        consumed_bits: usize,
        total_bits: usize,
    },

    /// Bit I/O operation failed
    #[error("bit I/O error: {0}")]
    BitIo(#[from] BitIoError),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A length does not fit its field in the metadata header
    #[error("{what} of {len} bytes exceeds the 4 GiB format limit")]
    TooLarge { what: &'static str, len: usize },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

fn percent(consumed: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        consumed as f64 * 100.0 / total as f64
    }
}

/// Lifecycle of a single compressor instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecState {
    /// Nothing created or loaded yet
    Empty,
    /// A code model exists (built from input or loaded from metadata)
    Loaded,
    /// Input has been encoded into a payload
    Encoded,
    /// A loaded payload has been decoded
    Decoded,
}

impl fmt::Display for CodecState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CodecState::Empty => "empty",
            CodecState::Loaded => "loaded",
            CodecState::Encoded => "encoded",
            CodecState::Decoded => "decoded",
        };
        f.write_str(s)
    }
}

/// Bit-level I/O errors.
#[derive(Debug, Error)]
pub enum BitIoError {
    /// Attempted to read past the end of the bit supply
    #[error("unexpected end of bit stream")]
    UnexpectedEof,

    /// Invalid bit count (more than 64 bits in one call)
    #[error("invalid bit count: {0}")]
    InvalidBitCount(usize),

    /// Pad length outside 0-7, or padding on an empty buffer
    #[error("invalid padding {padding} for {bytes} byte(s)")]
    InvalidPadding { padding: u8, bytes: usize },
}

/// Metadata validation errors.
///
/// Raised while parsing the metadata file or the code table / tree it
/// carries, always before any payload bit is consumed.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("invalid magic number: expected {expected:?}, got {actual:?}")]
    BadMagic { expected: [u8; 4], actual: [u8; 4] },

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),

    #[error("unknown codec tag {0}")]
    UnknownCodec(u8),

    #[error("metadata was written by the {found} codec, not {expected}")]
    CodecMismatch { expected: CodecKind, found: CodecKind },

    #[error("metadata truncated: need at least {required} bytes, got {actual}")]
    Truncated { required: usize, actual: usize },

    #[error("table length mismatch: header says {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("CRC mismatch: expected {expected:#010x}, got {actual:#010x}")]
    Crc { expected: u32, actual: u32 },

    #[error("invalid code width {0}")]
    InvalidWidth(u8),

    #[error("record area of {bits} bits is not a multiple of the {stride}-bit record")]
    RecordMisaligned { bits: usize, stride: usize },

    #[error("table has no records")]
    NoRecords,

    #[error("symbol ordinal {0} appears twice")]
    DuplicateSymbol(u8),

    #[error("code {0} assigned twice")]
    DuplicateCode(String),

    #[error("tree has more than {max} leaves")]
    TooManyLeaves { max: usize },

    #[error("tree deeper than {max} levels")]
    TooDeep { max: usize },

    #[error("tree ended with {0} unexpected trailing bits")]
    TrailingBits(usize),

    #[error("symbol {0} has no 8-bit ordinal")]
    UnsupportedSymbol(String),
}

/// Payload decoding errors.
#[derive(Debug, Error)]
pub enum DataError {
    /// Fixed-length group with no table entry
    #[error("unknown code {code} at bit position {position}")]
    UnknownCode { code: String, position: usize },

    /// Bit supply ended inside a fixed-width group
    #[error("truncated code: {remaining} leftover bits at position {position}")]
    TruncatedCode { position: usize, remaining: usize },

    /// Bit supply ended mid-traversal of the tree
    #[error("bit stream ended mid-code at bit position {position}")]
    IncompleteCode { position: usize },

    /// Input symbol not present in the code model
    #[error("symbol {0} is not in the code model")]
    UnknownSymbol(String),

    /// Payload file does not have the length recorded in the metadata
    #[error("payload length mismatch: metadata says {expected} bytes, got {actual}")]
    PayloadLength { expected: usize, actual: usize },

    /// Payload bytes do not match the checksum recorded in the metadata
    #[error("payload CRC mismatch: expected {expected:#010x}, got {actual:#010x}")]
    PayloadCrc { expected: u32, actual: u32 },

    /// Decoded symbol count does not match the recorded count
    #[error("decoded length mismatch: expected {expected} symbols, got {actual}")]
    LengthMismatch { expected: u64, actual: u64 },
}

/// Type alias for Result with our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupted_reports_percentage() {
        let err = Error::Interrupted {
            consumed_bits: 250,
            total_bits: 1000,
        };
        assert_eq!(
            err.to_string(),
            "decode interrupted after 250 of 1000 bits (25.0%)"
        );
    }

    #[test]
    fn test_uninitialized_message() {
        let err = Error::UninitializedState {
            operation: "encode",
            state: CodecState::Empty,
        };
        assert_eq!(err.to_string(), "cannot encode while empty");
    }

    #[test]
    fn test_nested_conversion() {
        let err: Error = DataError::IncompleteCode { position: 7 }.into();
        assert!(matches!(
            err,
            Error::CorruptData(DataError::IncompleteCode { position: 7 })
        ));
    }
}
