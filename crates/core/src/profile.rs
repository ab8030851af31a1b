//! Symbol frequency profiling.
//!
//! A `FrequencyTable` is built once per input and never mutated. Iteration
//! is deterministic: descending count, ties broken by the symbol's natural
//! order. Both codecs enumerate symbols in this order, which keeps their
//! output reproducible across runs.

use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};
use crate::symbol::Symbol;

/// Occurrence counts for the distinct symbols of one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable<S> {
    /// (symbol, count) in iteration order; every count is non-zero
    entries: Vec<(S, u64)>,
    total: u64,
}

impl<S: Symbol> FrequencyTable<S> {
    /// Count every symbol of `symbols`.
    ///
    /// # Errors
    /// `Error::EmptyInput` if the sequence is empty.
    pub fn from_symbols(symbols: &[S]) -> Result<Self> {
        let mut counts: HashMap<S, u64> = HashMap::new();
        for &symbol in symbols {
            *counts.entry(symbol).or_insert(0) += 1;
        }
        Self::from_counts(counts)
    }

    /// Build from an upstream count mapping. Zero counts are dropped.
    ///
    /// # Errors
    /// `Error::EmptyInput` if no symbol has a non-zero count.
    pub fn from_counts<I>(counts: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u64)>,
    {
        // Merge duplicates first so callers may pass any iterator of pairs
        let mut merged: BTreeMap<S, u64> = BTreeMap::new();
        for (symbol, count) in counts {
            if count > 0 {
                *merged.entry(symbol).or_insert(0) += count;
            }
        }
        if merged.is_empty() {
            return Err(Error::EmptyInput);
        }

        let mut entries: Vec<(S, u64)> = merged.into_iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let total = entries.iter().map(|&(_, c)| c).sum();

        Ok(Self { entries, total })
    }

    /// Occurrences of `symbol` (0 if absent).
    pub fn count(&self, symbol: S) -> u64 {
        self.entries
            .iter()
            .find(|(s, _)| *s == symbol)
            .map_or(0, |&(_, c)| c)
    }

    /// Total number of symbols counted.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct symbols.
    pub fn alphabet_size(&self) -> usize {
        self.entries.len()
    }

    /// (symbol, count) pairs in descending-count order.
    pub fn iter(&self) -> impl Iterator<Item = (S, u64)> + '_ {
        self.entries.iter().copied()
    }

    /// Symbols in iteration order.
    pub fn symbols(&self) -> impl Iterator<Item = S> + '_ {
        self.entries.iter().map(|&(s, _)| s)
    }

    /// Empirical probability of `symbol`.
    pub fn probability(&self, symbol: S) -> f64 {
        self.count(symbol) as f64 / self.total as f64
    }

    /// Empirical entropy in bits per symbol: `sum(-p * log2 p)`.
    pub fn entropy(&self) -> f64 {
        let total = self.total as f64;
        self.entries
            .iter()
            .map(|&(_, c)| {
                let p = c as f64 / total;
                -p * p.log2()
            })
            .sum()
    }
}
