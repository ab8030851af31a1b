//! Huffman codec: greedy prefix-code tree, traversal decoding.
//!
//! # Tree Construction
//!
//! One leaf per distinct symbol is seeded in frequency-table order and
//! numbered by creation sequence. While more than one node remains, the two
//! lowest-weight nodes are removed; among equal weights the most recently
//! created node goes first. The first removed node becomes the left child
//! (bit 0), the second the right child (bit 1), and their parent takes the
//! next sequence number. The tie-break fixes the tree shape, and so the
//! codes, for a given input.
//!
//! A one-symbol alphabet produces a bare leaf root. Its symbol is coded as
//! a single `0` bit so that the stream length survives the round trip.
//!
//! # Metadata Format
//!
//! Pre-order traversal:
//! - leaf: bit `1`, then the symbol's 8-bit ordinal
//! - internal node: bit `0`, then the left subtree, then the right subtree
//!
//! Weights are not persisted; a tree read back from metadata has weight 0
//! on every node.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, HashMap};

use crate::bitio::{BitReader, BitWriter, PackedBits};
use crate::code::Code;
use crate::codec::{CancelToken, CodecKind, DecodeMonitor, SymbolCodec};
use crate::error::{BitIoError, DataError, Error, MetadataError, Result};
use crate::fixed::code_width;
use crate::profile::FrequencyTable;
use crate::symbol::Symbol;

/// Most distinct symbols an 8-bit ordinal can name.
const MAX_LEAVES: usize = 256;

/// Deepest tree `MAX_LEAVES` leaves can form.
const MAX_DEPTH: usize = MAX_LEAVES - 1;

/// A node of the code tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<S> {
    Leaf {
        symbol: S,
        weight: u64,
    },
    Internal {
        weight: u64,
        left: Box<Node<S>>,
        right: Box<Node<S>>,
    },
}

impl<S: Symbol> Node<S> {
    /// Sum of the leaf weights below (and including) this node.
    pub fn weight(&self) -> u64 {
        match self {
            Node::Leaf { weight, .. } | Node::Internal { weight, .. } => *weight,
        }
    }

    /// Longest root-to-leaf path, in edges.
    pub fn height(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Internal { left, right, .. } => 1 + left.height().max(right.height()),
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Internal { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }

    fn collect_codes(&self, prefix: &mut Code, codes: &mut Vec<(S, Code)>) {
        match self {
            Node::Leaf { symbol, .. } => codes.push((*symbol, prefix.clone())),
            Node::Internal { left, right, .. } => {
                let mut left_prefix = prefix.clone();
                left_prefix.push(false);
                left.collect_codes(&mut left_prefix, codes);
                prefix.push(true);
                right.collect_codes(prefix, codes);
            }
        }
    }

    fn write_preorder(&self, writer: &mut BitWriter) -> Result<()> {
        match self {
            Node::Leaf { symbol, .. } => {
                let ordinal = symbol
                    .to_ordinal()
                    .ok_or_else(|| MetadataError::UnsupportedSymbol(format!("{symbol:?}")))?;
                writer.write_bit(true);
                writer.write_bits(ordinal as u64, 8)?;
            }
            Node::Internal { left, right, .. } => {
                writer.write_bit(false);
                left.write_preorder(writer)?;
                right.write_preorder(writer)?;
            }
        }
        Ok(())
    }
}

/// Parses a pre-order tree, enforcing leaf, depth and duplicate limits.
struct TreeParser<'r, 'a> {
    reader: &'r mut BitReader<'a>,
    leaves: usize,
    seen: [bool; MAX_LEAVES],
}

impl<'r, 'a> TreeParser<'r, 'a> {
    fn parse<S: Symbol>(&mut self, depth: usize) -> Result<Node<S>> {
        if depth > MAX_DEPTH {
            return Err(MetadataError::TooDeep { max: MAX_DEPTH }.into());
        }

        if self.read_bit()? {
            let ordinal = self.read_bits(8)? as u8;
            self.leaves += 1;
            if self.leaves > MAX_LEAVES {
                return Err(MetadataError::TooManyLeaves { max: MAX_LEAVES }.into());
            }
            if std::mem::replace(&mut self.seen[ordinal as usize], true) {
                return Err(MetadataError::DuplicateSymbol(ordinal).into());
            }
            Ok(Node::Leaf {
                symbol: S::from_ordinal(ordinal),
                weight: 0,
            })
        } else {
            let left = self.parse(depth + 1)?;
            let right = self.parse(depth + 1)?;
            Ok(Node::Internal {
                weight: 0,
                left: Box::new(left),
                right: Box::new(right),
            })
        }
    }

    fn read_bit(&mut self) -> Result<bool> {
        self.reader.read_bit().map_err(truncated_tree)
    }

    fn read_bits(&mut self, count: usize) -> Result<u64> {
        self.reader.read_bits(count).map_err(truncated_tree)
    }
}

/// Running out of bits inside the tree is a metadata problem, not a bit I/O one.
fn truncated_tree(err: Error) -> Error {
    match err {
        Error::BitIo(BitIoError::UnexpectedEof) => MetadataError::Truncated {
            required: 1,
            actual: 0,
        }
        .into(),
        other => other,
    }
}

/// Work-set entry: the heap pops the lowest weight first, and among equal
/// weights the highest creation sequence first.
struct Pending<S> {
    seq: usize,
    node: Node<S>,
}

impl<S: Symbol> PartialEq for Pending<S> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<S: Symbol> Eq for Pending<S> {}

impl<S: Symbol> PartialOrd for Pending<S> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S: Symbol> Ord for Pending<S> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .node
            .weight()
            .cmp(&self.node.weight())
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Build the code tree for a frequency table.
pub fn build_tree<S: Symbol>(table: &FrequencyTable<S>) -> Result<Node<S>> {
    let mut heap: BinaryHeap<Pending<S>> = table
        .iter()
        .enumerate()
        .map(|(seq, (symbol, weight))| Pending {
            seq,
            node: Node::Leaf { symbol, weight },
        })
        .collect();
    let mut next_seq = heap.len();

    while heap.len() > 1 {
        if let (Some(first), Some(second)) = (heap.pop(), heap.pop()) {
            let weight = first.node.weight() + second.node.weight();
            heap.push(Pending {
                seq: next_seq,
                node: Node::Internal {
                    weight,
                    left: Box::new(first.node),
                    right: Box::new(second.node),
                },
            });
            next_seq += 1;
        }
    }

    heap.pop().map(|root| root.node).ok_or(Error::EmptyInput)
}

/// Prefix-free code derived from a tree.
#[derive(Debug, Clone)]
pub struct HuffmanCodec<S: Symbol> {
    root: Node<S>,
    codes: HashMap<S, Code>,
}

impl<S: Symbol> HuffmanCodec<S> {
    /// Wrap an existing tree.
    pub fn from_tree(root: Node<S>) -> Self {
        let mut codes = Vec::new();
        match &root {
            // A bare leaf has an empty path; give it one bit
            Node::Leaf { symbol, .. } => codes.push((*symbol, Code::from_value(0, 1))),
            Node::Internal { .. } => root.collect_codes(&mut Code::new(), &mut codes),
        }
        Self {
            root,
            codes: codes.into_iter().collect(),
        }
    }

    pub fn tree(&self) -> &Node<S> {
        &self.root
    }

    /// Code assigned to `symbol`.
    pub fn code(&self, symbol: S) -> Option<&Code> {
        self.codes.get(&symbol)
    }

    /// Coding efficiency of this code against the table it was built from.
    pub fn efficiency(&self, table: &FrequencyTable<S>) -> Efficiency {
        Efficiency::measure(table, self.mean_code_length(table))
    }

    fn decode_single(
        &self,
        symbol: S,
        reader: &mut BitReader<'_>,
        monitor: &mut DecodeMonitor<'_>,
    ) -> Result<Vec<S>> {
        let mut symbols = Vec::with_capacity(reader.bits_remaining());
        while !reader.is_empty() {
            let position = reader.position();
            if reader.read_bit()? {
                return Err(DataError::UnknownCode {
                    code: "1".to_string(),
                    position,
                }
                .into());
            }
            symbols.push(symbol);
            monitor.checkpoint(reader.position())?;
        }
        Ok(symbols)
    }
}

impl<S: Symbol> SymbolCodec<S> for HuffmanCodec<S> {
    const KIND: CodecKind = CodecKind::Huffman;

    fn build(table: &FrequencyTable<S>) -> Result<Self> {
        let codec = Self::from_tree(build_tree(table)?);
        tracing::debug!(
            alphabet = table.alphabet_size(),
            height = codec.root.height(),
            weight = codec.root.weight(),
            "built huffman tree"
        );
        Ok(codec)
    }

    fn encode(&self, symbols: &[S], writer: &mut BitWriter) -> Result<()> {
        for symbol in symbols {
            let code = self
                .codes
                .get(symbol)
                .ok_or_else(|| DataError::UnknownSymbol(format!("{symbol:?}")))?;
            writer.write_code(code);
        }
        Ok(())
    }

    fn decode(&self, reader: &mut BitReader<'_>, cancel: Option<&CancelToken>) -> Result<Vec<S>> {
        let mut monitor = DecodeMonitor::new(reader.total_bits(), cancel);

        if let Node::Leaf { symbol, .. } = &self.root {
            return self.decode_single(*symbol, reader, &mut monitor);
        }

        let mut symbols = Vec::new();
        let mut node = &self.root;
        let mut code_start = reader.position();

        // The cursor only rests on internal nodes: reaching a leaf resets it
        while !reader.is_empty() {
            if let Node::Internal { left, right, .. } = node {
                node = if reader.read_bit()? { right } else { left };
            }

            if let Node::Leaf { symbol, .. } = node {
                symbols.push(*symbol);
                node = &self.root;
                code_start = reader.position();
                monitor.checkpoint(code_start)?;
            }
        }

        if !std::ptr::eq(node, &self.root) {
            return Err(DataError::IncompleteCode {
                position: code_start,
            }
            .into());
        }

        Ok(symbols)
    }

    fn to_metadata(&self) -> Result<PackedBits> {
        let mut writer = BitWriter::new();
        self.root.write_preorder(&mut writer)?;
        Ok(writer.finish())
    }

    fn from_metadata(metadata: &PackedBits) -> Result<Self> {
        let mut reader = BitReader::from_packed(metadata);
        if reader.is_empty() {
            return Err(MetadataError::Truncated {
                required: 2,
                actual: metadata.bytes().len(),
            }
            .into());
        }

        let mut parser = TreeParser {
            reader: &mut reader,
            leaves: 0,
            seen: [false; MAX_LEAVES],
        };
        let root = parser.parse::<S>(0)?;

        if !reader.is_empty() {
            return Err(MetadataError::TrailingBits(reader.bits_remaining()).into());
        }

        tracing::debug!(
            leaves = root.leaf_count(),
            height = root.height(),
            "loaded huffman tree"
        );
        Ok(Self::from_tree(root))
    }

    fn codebook(&self) -> BTreeMap<S, Code> {
        self.codes
            .iter()
            .map(|(symbol, code)| (*symbol, code.clone()))
            .collect()
    }
}

/// Entropy against achieved mean code length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Efficiency {
    /// Empirical entropy, bits per symbol
    pub entropy: f64,
    /// Frequency-weighted mean code length, bits per symbol
    pub mean_code_length: f64,
    /// Width a fixed-length code would need for the same alphabet
    pub fixed_width: u8,
    /// `entropy / mean_code_length`
    pub coding: f64,
    /// `entropy / fixed_width`
    pub fixed_baseline: f64,
}

impl Efficiency {
    pub fn measure<S: Symbol>(table: &FrequencyTable<S>, mean_code_length: f64) -> Self {
        let entropy = table.entropy();
        let fixed_width = code_width(table.alphabet_size());
        let coding = if mean_code_length > 0.0 {
            entropy / mean_code_length
        } else {
            0.0
        };
        Self {
            entropy,
            mean_code_length,
            fixed_width,
            coding,
            fixed_baseline: entropy / fixed_width as f64,
        }
    }
}
