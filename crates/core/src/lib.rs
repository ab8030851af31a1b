//! textpack-core: fixed-length and Huffman text codecs
//!
//! This library turns a symbol stream into a bit-packed payload plus the
//! metadata needed to rebuild it, and back, bit-exactly:
//! - Profiles symbol frequencies in one pass
//! - Codes symbols with an equal-width table or a Huffman prefix code
//! - Packs bits with explicit padding accounting
//! - Persists payload and metadata as two files, and decodes them without
//!   ever seeing the original input
//!
//! # Architecture
//!
//! - `bitio`: bit writer/reader with padding accounting
//! - `code`: codewords
//! - `symbol`: what can be a symbol
//! - `profile`: frequency tables and entropy
//! - `codec`: the trait both codecs implement, cancellation
//! - `fixed`: fixed-length codec
//! - `huffman`: Huffman codec and efficiency
//! - `artifact`: two-file persisted format
//! - `compressor`: create/encode/save and load/decode state machine
//! - `metrics`: per-run report
//!
//! # Design Principles
//!
//! - **No panics**: All errors are structured and recoverable
//! - **Deterministic**: Symbol order and tree tie-breaks are fixed, so the
//!   same input always produces the same bytes
//! - **Self-checking**: Metadata is validated before any payload bit is read

pub mod artifact;
pub mod bitio;
pub mod code;
pub mod codec;
pub mod compressor;
pub mod error;
pub mod fixed;
pub mod huffman;
pub mod metrics;
pub mod profile;
pub mod symbol;

// Re-export commonly used types
pub use artifact::{Artifact, ArtifactPaths};
pub use codec::{CancelToken, CodecKind, SymbolCodec};
pub use compressor::{Compressor, FixedLengthCompressor, HuffmanCompressor, RoundTrip};
pub use error::{CodecState, Error, Result};
pub use fixed::FixedLengthCodec;
pub use huffman::{Efficiency, HuffmanCodec};
pub use profile::FrequencyTable;
