//! Create/encode/save and load/decode cycles for one codec instance.
//!
//! A `Compressor` owns its frequency table, codec and buffers exclusively.
//! Every operation checks the instance's `CodecState` first and fails with
//! `Error::UninitializedState` when called out of order.
//!
//! # Lifecycle
//!
//! ```text
//! Empty --create--> Loaded --encode--> Encoded --save--> (files)
//! (files) --load--> Loaded --decode--> Decoded
//! ```
//!
//! # Logging
//!
//! Each instance carries its own `tracing::Span`. All events of an instance
//! are emitted inside it, and failures are logged once, at this boundary,
//! before being returned to the caller.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::Span;

use crate::artifact::{read_file, Artifact, ArtifactPaths};
use crate::code::Code;
use crate::codec::{CancelToken, SymbolCodec};
use crate::error::{CodecState, DataError, Error, MetadataError, Result};
use crate::fixed::FixedLengthCodec;
use crate::huffman::{Efficiency, HuffmanCodec};
use crate::profile::FrequencyTable;

pub type FixedLengthCompressor = Compressor<FixedLengthCodec<u8>>;
pub type HuffmanCompressor = Compressor<HuffmanCodec<u8>>;

/// Outcome of comparing a reconstructed stream with the original.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundTrip {
    pub matched: bool,
    /// First byte offset at which the streams differ
    pub first_mismatch: Option<usize>,
    pub expected_len: usize,
    pub actual_len: usize,
}

impl RoundTrip {
    pub fn compare(expected: &[u8], actual: &[u8]) -> Self {
        let first_mismatch = expected
            .iter()
            .zip(actual)
            .position(|(a, b)| a != b)
            .or_else(|| {
                (expected.len() != actual.len()).then_some(expected.len().min(actual.len()))
            });
        Self {
            matched: first_mismatch.is_none(),
            first_mismatch,
            expected_len: expected.len(),
            actual_len: actual.len(),
        }
    }
}

/// One codec instance and the data flowing through it.
pub struct Compressor<C> {
    span: Span,
    state: CodecState,
    /// Created input, or the output of a successful decode
    data: Option<Vec<u8>>,
    /// Only present when the model was built from input
    table: Option<FrequencyTable<u8>>,
    codec: Option<C>,
    /// Encoded or loaded artifact
    artifact: Option<Artifact>,
}

impl<C: SymbolCodec<u8>> Compressor<C> {
    pub fn new() -> Self {
        let kind = C::KIND;
        Self::with_span(tracing::info_span!("compressor", codec = %kind))
    }

    /// Use a caller-provided span for every event of this instance.
    pub fn with_span(span: Span) -> Self {
        Self {
            span,
            state: CodecState::Empty,
            data: None,
            table: None,
            codec: None,
            artifact: None,
        }
    }

    pub fn state(&self) -> CodecState {
        self.state
    }

    /// Read `path` fully and build the code model from it.
    pub fn create(&mut self, path: &Path) -> Result<()> {
        let span = self.span.clone();
        let _guard = span.enter();

        let data = read_file(path).inspect_err(|err| tracing::error!(%err, "create failed"))?;
        tracing::info!(path = %path.display(), bytes = data.len(), "file loaded");
        self.create_model(data)
    }

    /// Build the code model from in-memory data.
    pub fn create_from_bytes(&mut self, data: Vec<u8>) -> Result<()> {
        let span = self.span.clone();
        let _guard = span.enter();
        self.create_model(data)
    }

    fn create_model(&mut self, data: Vec<u8>) -> Result<()> {
        let build = || -> Result<(FrequencyTable<u8>, C)> {
            let table = FrequencyTable::from_symbols(&data)?;
            let codec = C::build(&table)?;
            Ok((table, codec))
        };
        let (table, codec) = build().inspect_err(|err| tracing::error!(%err, "create failed"))?;

        tracing::info!(
            symbols = table.total(),
            alphabet = table.alphabet_size(),
            entropy = table.entropy(),
            "code model built"
        );
        for (symbol, code) in codec.codebook() {
            tracing::trace!(symbol, code = %code, "code assigned");
        }

        self.data = Some(data);
        self.table = Some(table);
        self.codec = Some(codec);
        self.artifact = None;
        self.state = CodecState::Loaded;
        Ok(())
    }

    /// Encode the created input into a payload.
    pub fn encode(&mut self) -> Result<()> {
        let span = self.span.clone();
        let _guard = span.enter();

        let (data, codec) = match (self.state, &self.data, &self.codec) {
            (CodecState::Loaded, Some(data), Some(codec)) => (data, codec),
            _ => return Err(self.uninitialized("encode")),
        };

        let result = codec
            .encode_all(data)
            .and_then(|payload| Ok((payload, codec.to_metadata()?)));
        let (payload, table) = result.inspect_err(|err| tracing::error!(%err, "encode failed"))?;

        tracing::info!(
            bits = payload.bit_len(),
            padding = payload.padding(),
            "input encoded"
        );
        self.artifact = Some(Artifact {
            codec: C::KIND,
            symbol_count: data.len() as u64,
            payload,
            table,
        });
        self.state = CodecState::Encoded;
        Ok(())
    }

    /// Write the encoded artifact to disk.
    pub fn save(&self, paths: &ArtifactPaths) -> Result<()> {
        let _guard = self.span.enter();

        match (self.state, &self.artifact) {
            (CodecState::Encoded, Some(artifact)) => artifact
                .save(paths)
                .inspect_err(|err| tracing::error!(%err, "save failed")),
            _ => Err(self.uninitialized("save")),
        }
    }

    /// Read an artifact and rebuild the code model from its metadata.
    ///
    /// Nothing of the previous state is kept; on failure the instance is
    /// left as it was.
    pub fn load(&mut self, paths: &ArtifactPaths) -> Result<()> {
        let span = self.span.clone();
        let _guard = span.enter();

        let load = || -> Result<(Artifact, C)> {
            let artifact = Artifact::load(paths)?;
            if artifact.codec != C::KIND {
                return Err(MetadataError::CodecMismatch {
                    expected: C::KIND,
                    found: artifact.codec,
                }
                .into());
            }
            let codec = C::from_metadata(&artifact.table)?;
            Ok((artifact, codec))
        };
        let (artifact, codec) = load().inspect_err(|err| tracing::error!(%err, "load failed"))?;

        self.data = None;
        self.table = None;
        self.codec = Some(codec);
        self.artifact = Some(artifact);
        self.state = CodecState::Loaded;
        Ok(())
    }

    /// Decode the loaded (or just encoded) payload.
    pub fn decode(&mut self) -> Result<()> {
        self.decode_inner(None)
    }

    /// Decode, giving up with `Error::Interrupted` once `cancel` is set.
    pub fn decode_with(&mut self, cancel: &CancelToken) -> Result<()> {
        self.decode_inner(Some(cancel))
    }

    fn decode_inner(&mut self, cancel: Option<&CancelToken>) -> Result<()> {
        let span = self.span.clone();
        let _guard = span.enter();

        let (artifact, codec) = match (self.state, &self.artifact, &self.codec) {
            (CodecState::Loaded | CodecState::Encoded, Some(artifact), Some(codec)) => {
                (artifact, codec)
            }
            _ => return Err(self.uninitialized("decode")),
        };

        tracing::info!(bits = artifact.payload.bit_len(), "decoding");
        let decoded = codec
            .decode_all(&artifact.payload, cancel)
            .and_then(|symbols| {
                let actual = symbols.len() as u64;
                if actual != artifact.symbol_count {
                    return Err(DataError::LengthMismatch {
                        expected: artifact.symbol_count,
                        actual,
                    }
                    .into());
                }
                Ok(symbols)
            })
            .inspect_err(|err| match err {
                Error::Interrupted { .. } => tracing::warn!(%err, "decode abandoned"),
                _ => tracing::error!(%err, "decode failed"),
            })?;

        tracing::info!(symbols = decoded.len(), "decoded");
        self.data = Some(decoded);
        self.state = CodecState::Decoded;
        Ok(())
    }

    /// The created input or the decoded output.
    pub fn data(&self) -> Result<&[u8]> {
        match &self.data {
            Some(data) => Ok(data),
            None => Err(self.uninitialized("read data")),
        }
    }

    /// Compare this instance's data with `expected`, byte for byte.
    pub fn verify(&self, expected: &[u8]) -> Result<RoundTrip> {
        let _guard = self.span.enter();

        let outcome = RoundTrip::compare(expected, self.data()?);
        match outcome.first_mismatch {
            None => tracing::info!(bytes = outcome.actual_len, "round trip verified"),
            Some(offset) => tracing::error!(
                offset,
                expected_len = outcome.expected_len,
                actual_len = outcome.actual_len,
                "round trip mismatch"
            ),
        }
        Ok(outcome)
    }

    /// Entropy against mean code length for the created input.
    pub fn efficiency(&self) -> Result<Efficiency> {
        match (&self.table, &self.codec) {
            (Some(table), Some(codec)) => {
                Ok(Efficiency::measure(table, codec.mean_code_length(table)))
            }
            _ => Err(self.uninitialized("measure efficiency")),
        }
    }

    /// Symbol -> code mapping of the current model.
    pub fn codebook(&self) -> Result<BTreeMap<u8, Code>> {
        match &self.codec {
            Some(codec) => Ok(codec.codebook()),
            None => Err(self.uninitialized("read codebook")),
        }
    }

    pub fn codec(&self) -> Option<&C> {
        self.codec.as_ref()
    }

    pub fn frequency_table(&self) -> Option<&FrequencyTable<u8>> {
        self.table.as_ref()
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    fn uninitialized(&self, operation: &'static str) -> Error {
        let err = Error::UninitializedState {
            operation,
            state: self.state,
        };
        tracing::error!(%err, "operation rejected");
        err
    }
}

impl<C: SymbolCodec<u8>> Default for Compressor<C> {
    fn default() -> Self {
        Self::new()
    }
}
