//! Persisted artifact: a payload file and a framed metadata file.
//!
//! The payload file holds the packed payload bytes and nothing else. Its pad
//! length, the symbol count and the codec's table or tree live in the
//! metadata file, so the payload alone is not decodable.
//!
//! # Metadata Frame Format
//!
//! ```text
//! +--------------------+
//! | Magic (4 bytes)    |  0x54 0x58 0x50 0x4B ("TXPK")
//! +--------------------+
//! | version (1)        |  FORMAT_VERSION
//! +--------------------+
//! | codec (1)          |  0 = fixed-length, 1 = huffman
//! +--------------------+
//! | payload_pad (1)    |  filler bits at the end of the payload (0-7)
//! +--------------------+
//! | table_pad (1)      |  filler bits at the end of the table (0-7)
//! +--------------------+
//! | symbol_count (8)   |  u64 little-endian, symbols in the original stream
//! +--------------------+
//! | payload_len (4)    |  u32 little-endian, payload file size in bytes
//! +--------------------+
//! | table_len (4)      |  u32 little-endian
//! +--------------------+
//! | payload_crc32 (4)  |  u32 over the payload file bytes
//! +--------------------+
//! | crc32 (4)          |  u32 over every field above except magic, plus
//! |                    |  the table
//! +--------------------+
//! | table              |  code table or tree (table_len bytes)
//! +--------------------+
//! ```
//!
//! The metadata CRC is checked first, then the payload length and the payload
//! CRC, so a damaged or foreign payload is rejected before any bit of it is
//! decoded.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::bitio::PackedBits;
use crate::codec::CodecKind;
use crate::error::{DataError, Error, MetadataError, Result};

/// Magic number for metadata files: "TXPK"
const MAGIC: [u8; 4] = [0x54, 0x58, 0x50, 0x4B];

const FORMAT_VERSION: u8 = 1;

/// Size of the metadata header in bytes
const HEADER_SIZE: usize = 32;

/// Default payload file name.
pub const DEFAULT_PAYLOAD_FILE: &str = "compressed_file.bin";

/// Default metadata file name.
pub const DEFAULT_METADATA_FILE: &str = "alphabet.bin";

/// Where the two files of one artifact live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub payload: PathBuf,
    pub metadata: PathBuf,
}

impl ArtifactPaths {
    pub fn new(payload: impl Into<PathBuf>, metadata: impl Into<PathBuf>) -> Self {
        Self {
            payload: payload.into(),
            metadata: metadata.into(),
        }
    }

    /// Default file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(DEFAULT_PAYLOAD_FILE), dir.join(DEFAULT_METADATA_FILE))
    }

    /// Default file names inside `dir`, prefixed with `prefix` and a dash.
    pub fn with_prefix(dir: impl AsRef<Path>, prefix: &str) -> Self {
        let dir = dir.as_ref();
        Self::new(
            dir.join(format!("{prefix}-{DEFAULT_PAYLOAD_FILE}")),
            dir.join(format!("{prefix}-{DEFAULT_METADATA_FILE}")),
        )
    }
}

/// Everything needed to decode, plus the payload it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub codec: CodecKind,
    /// Number of symbols in the original stream
    pub symbol_count: u64,
    pub payload: PackedBits,
    /// Serialized code table or tree
    pub table: PackedBits,
}

impl Artifact {
    /// Serialize the metadata frame.
    ///
    /// Fails with `Error::TooLarge` when the payload or table length does not
    /// fit its 32-bit header field.
    pub fn metadata_bytes(&self) -> Result<Vec<u8>> {
        let payload = self.payload.bytes();
        let payload_len = field_len("payload", payload.len())?;
        let table = self.table.bytes();
        let table_len = field_len("table", table.len())?;

        let mut frame = Vec::with_capacity(HEADER_SIZE + table.len());
        frame.extend_from_slice(&MAGIC);
        frame.push(FORMAT_VERSION);
        frame.push(self.codec.tag());
        frame.push(self.payload.padding());
        frame.push(self.table.padding());
        frame.extend_from_slice(&self.symbol_count.to_le_bytes());
        frame.extend_from_slice(&payload_len.to_le_bytes());
        frame.extend_from_slice(&table_len.to_le_bytes());
        frame.extend_from_slice(&crc32fast::hash(payload).to_le_bytes());

        let crc32 = compute_crc(&frame[4..], table);
        frame.extend_from_slice(&crc32.to_le_bytes());
        frame.extend_from_slice(table);
        Ok(frame)
    }

    /// Rebuild an artifact from the two stored byte blobs.
    ///
    /// The metadata frame is validated completely before the payload is
    /// looked at.
    pub fn from_parts(metadata: &[u8], payload: Vec<u8>) -> Result<Self> {
        let header = parse_header(metadata)?;

        if payload.len() != header.payload_len {
            return Err(DataError::PayloadLength {
                expected: header.payload_len,
                actual: payload.len(),
            }
            .into());
        }

        let payload_crc = crc32fast::hash(&payload);
        if payload_crc != header.payload_crc {
            return Err(DataError::PayloadCrc {
                expected: header.payload_crc,
                actual: payload_crc,
            }
            .into());
        }

        let table = PackedBits::from_parts(metadata[HEADER_SIZE..].to_vec(), header.table_pad)?;
        let payload = PackedBits::from_parts(payload, header.payload_pad)?;

        Ok(Self {
            codec: header.codec,
            symbol_count: header.symbol_count,
            payload,
            table,
        })
    }

    /// Write both files. Any I/O failure is returned.
    pub fn save(&self, paths: &ArtifactPaths) -> Result<()> {
        let metadata = self.metadata_bytes()?;
        std::fs::write(&paths.payload, self.payload.bytes())?;
        std::fs::write(&paths.metadata, metadata)?;
        tracing::info!(
            payload = %paths.payload.display(),
            metadata = %paths.metadata.display(),
            payload_bytes = self.payload.bytes().len(),
            payload_padding = self.payload.padding(),
            table_padding = self.table.padding(),
            "artifact saved"
        );
        Ok(())
    }

    /// Read and validate both files.
    pub fn load(paths: &ArtifactPaths) -> Result<Self> {
        let metadata = read_file(&paths.metadata)?;
        let payload = read_file(&paths.payload)?;
        let artifact = Self::from_parts(&metadata, payload)?;
        tracing::info!(
            codec = %artifact.codec,
            symbols = artifact.symbol_count,
            payload_bits = artifact.payload.bit_len(),
            "artifact loaded"
        );
        Ok(artifact)
    }
}

/// Read a whole file, reporting a missing file as `SourceNotFound`.
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => Error::SourceNotFound {
            path: path.to_path_buf(),
        },
        _ => Error::Io(err),
    })
}

struct Header {
    codec: CodecKind,
    payload_pad: u8,
    table_pad: u8,
    symbol_count: u64,
    payload_len: usize,
    payload_crc: u32,
}

fn parse_header(bytes: &[u8]) -> Result<Header> {
    if bytes.len() < HEADER_SIZE {
        return Err(MetadataError::Truncated {
            required: HEADER_SIZE,
            actual: bytes.len(),
        }
        .into());
    }

    let magic = [bytes[0], bytes[1], bytes[2], bytes[3]];
    if magic != MAGIC {
        return Err(MetadataError::BadMagic {
            expected: MAGIC,
            actual: magic,
        }
        .into());
    }

    let table = &bytes[HEADER_SIZE..];
    let table_len = le_u32(bytes, 20) as usize;
    if table.len() != table_len {
        return Err(MetadataError::LengthMismatch {
            expected: table_len,
            actual: table.len(),
        }
        .into());
    }

    let crc32 = le_u32(bytes, 28);
    let computed = compute_crc(&bytes[4..28], table);
    if computed != crc32 {
        return Err(MetadataError::Crc {
            expected: crc32,
            actual: computed,
        }
        .into());
    }

    let version = bytes[4];
    if version != FORMAT_VERSION {
        return Err(MetadataError::UnsupportedVersion(version).into());
    }

    Ok(Header {
        codec: CodecKind::from_tag(bytes[5])?,
        payload_pad: bytes[6],
        table_pad: bytes[7],
        symbol_count: u64::from_le_bytes([
            bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15],
        ]),
        payload_len: le_u32(bytes, 16) as usize,
        payload_crc: le_u32(bytes, 24),
    })
}

/// Length of a blob as its 32-bit header field.
fn field_len(what: &'static str, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::TooLarge { what, len })
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// CRC32 over the header fields and the table.
fn compute_crc(header_fields: &[u8], table: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(header_fields);
    hasher.update(table);
    hasher.finalize()
}
