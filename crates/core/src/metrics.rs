//! Per-run report for one codec: sizes, timing, entropy and efficiency.
//!
//! A `Report` is filled in by the driver as a run moves through its phases
//! and printed at the end. It is a plain struct updated explicitly at each
//! step, the same way the codecs themselves are single-threaded.

use std::time::{Duration, Instant};

use crate::codec::CodecKind;
use crate::compressor::RoundTrip;
use crate::huffman::Efficiency;

/// Observations from one create -> save -> load -> decode run.
#[derive(Debug, Clone)]
pub struct Report {
    pub codec: CodecKind,

    // === Timing ===
    pub start_time: Instant,
    pub end_time: Option<Instant>,

    // === Sizes ===
    /// Bytes (symbols) in the original input
    pub input_bytes: u64,
    /// Distinct symbols in the input
    pub alphabet_size: usize,
    /// Real payload bits (padding excluded)
    pub payload_bits: u64,
    /// Payload file size
    pub payload_bytes: u64,
    /// Metadata file size
    pub metadata_bytes: u64,

    // === Quality ===
    pub efficiency: Option<Efficiency>,
    pub round_trip: Option<RoundTrip>,
}

impl Report {
    pub fn new(codec: CodecKind) -> Self {
        Self {
            codec,
            start_time: Instant::now(),
            end_time: None,
            input_bytes: 0,
            alphabet_size: 0,
            payload_bits: 0,
            payload_bytes: 0,
            metadata_bytes: 0,
            efficiency: None,
            round_trip: None,
        }
    }

    /// Mark the run as complete.
    pub fn complete(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Total duration (or elapsed so far if not complete).
    pub fn duration(&self) -> Duration {
        match self.end_time {
            Some(end) => end.duration_since(self.start_time),
            None => self.start_time.elapsed(),
        }
    }

    /// (payload + metadata) / input. 0.0 when there was no input.
    pub fn compression_ratio(&self) -> f64 {
        if self.input_bytes == 0 {
            0.0
        } else {
            (self.payload_bytes + self.metadata_bytes) as f64 / self.input_bytes as f64
        }
    }

    /// Payload bits per input symbol.
    pub fn bits_per_symbol(&self) -> f64 {
        if self.input_bytes == 0 {
            0.0
        } else {
            self.payload_bits as f64 / self.input_bytes as f64
        }
    }

    pub fn passed(&self) -> bool {
        self.round_trip.is_some_and(|rt| rt.matched)
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n=== {} ===", self.codec);
        println!("Duration: {} ms", self.duration().as_millis());
        println!();
        println!("Input:     {} bytes, {} distinct symbols", self.input_bytes, self.alphabet_size);
        println!(
            "Payload:   {} bytes ({} bits, {:.3} bits/symbol)",
            self.payload_bytes,
            self.payload_bits,
            self.bits_per_symbol()
        );
        println!("Metadata:  {} bytes", self.metadata_bytes);
        println!("Ratio:     {:.1}%", self.compression_ratio() * 100.0);

        if let Some(eff) = &self.efficiency {
            println!();
            println!("Entropy:           {:.4} bits/symbol", eff.entropy);
            println!("Mean code length:  {:.4} bits/symbol", eff.mean_code_length);
            println!("{} (eff): {:.2}%", self.codec, eff.coding * 100.0);
            println!("fixed-length (eff): {:.2}%", eff.fixed_baseline * 100.0);
        }
        println!();
    }

    /// Print just the final result.
    pub fn print_result(&self) {
        match &self.round_trip {
            Some(rt) if rt.matched => println!("Result: OK! ({} bytes)", rt.actual_len),
            Some(rt) => println!(
                "Result: Error! first difference at byte {} ({} vs {} bytes)",
                rt.first_mismatch.unwrap_or(0),
                rt.expected_len,
                rt.actual_len
            ),
            None => println!("Result: Error! nothing decoded"),
        }
    }

    /// Export as `key=value` lines (for parsing/testing).
    pub fn export_text(&self) -> String {
        let mut out = format!(
            "codec={}\n\
             duration_ms={}\n\
             input_bytes={}\n\
             alphabet_size={}\n\
             payload_bits={}\n\
             payload_bytes={}\n\
             metadata_bytes={}\n\
             compression_ratio={:.4}\n\
             passed={}\n",
            self.codec,
            self.duration().as_millis(),
            self.input_bytes,
            self.alphabet_size,
            self.payload_bits,
            self.payload_bytes,
            self.metadata_bytes,
            self.compression_ratio(),
            self.passed(),
        );
        if let Some(eff) = &self.efficiency {
            out.push_str(&format!(
                "entropy={:.4}\nmean_code_length={:.4}\nefficiency={:.4}\nfixed_efficiency={:.4}\n",
                eff.entropy, eff.mean_code_length, eff.coding, eff.fixed_baseline
            ));
        }
        out
    }
}
