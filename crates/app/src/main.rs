//! textpack: round-trip a text file through the fixed-length and Huffman
//! codecs.
//!
//! For each selected codec the driver runs two independent instances:
//!
//! ```text
//! input --create--> encode --save--> (payload, metadata)
//!                                          |
//!                         load <-----------+
//!                           |
//!                        decode --> compare with input
//! ```
//!
//! The second instance sees only the two files, never the input. Ctrl-C
//! during a decode abandons it and reports how much of the payload was
//! consumed. Exit code is 1 if any phase fails or the output differs from
//! the input.

mod config;
mod input_gen;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use textpack_core::metrics::Report;
use textpack_core::{
    ArtifactPaths, CancelToken, CodecKind, Compressor, FixedLengthCodec, HuffmanCodec, Result,
    SymbolCodec,
};
use tracing_subscriber::EnvFilter;

use config::Config;

/// Generated sample file name inside the output directory.
const SAMPLE_FILE: &str = "sample.txt";

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!("Run with --help for usage");
            return ExitCode::FAILURE;
        }
    };

    if config.print_config {
        config.print();
    }

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(err) = ctrlc::set_handler(move || handler_token.cancel()) {
        tracing::warn!(%err, "could not install Ctrl-C handler");
    }

    match run(&config, &cancel) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!(%err, "run failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr, filtered by `TEXTPACK_LOG` (default `info`).
fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("TEXTPACK_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Run every selected codec. Returns whether all of them round-tripped.
fn run(config: &Config, cancel: &CancelToken) -> Result<bool> {
    std::fs::create_dir_all(&config.out_dir)?;
    let input = resolve_input(config)?;

    let mut passed = true;
    for &kind in config.codecs.kinds() {
        let report = match kind {
            CodecKind::FixedLength => run_codec::<FixedLengthCodec<u8>>(&input, config, cancel),
            CodecKind::Huffman => run_codec::<HuffmanCodec<u8>>(&input, config, cancel),
        };

        if config.print_metrics {
            report.print_summary();
        }
        report.print_result();

        let report_path = config.out_dir.join(format!("{}-report.txt", file_prefix(kind)));
        std::fs::write(&report_path, report.export_text())?;
        tracing::debug!(path = %report_path.display(), "report written");

        passed &= report.passed();
        if cancel.is_cancelled() {
            break;
        }
    }
    Ok(passed)
}

/// The input file, generating a sample first if none was given.
fn resolve_input(config: &Config) -> Result<PathBuf> {
    if let Some(path) = &config.input_file {
        return Ok(path.clone());
    }

    let path = config.out_dir.join(SAMPLE_FILE);
    input_gen::write_sample_file(&path, config.seed, config.sample_bytes)?;
    tracing::info!(
        path = %path.display(),
        seed = config.seed,
        bytes = config.sample_bytes,
        "generated sample input"
    );
    Ok(path)
}

fn file_prefix(kind: CodecKind) -> &'static str {
    match kind {
        CodecKind::FixedLength => "fixed",
        CodecKind::Huffman => "huffman",
    }
}

/// Print the outcome of one phase and say whether it succeeded.
fn phase(kind: CodecKind, name: &str, result: Result<()>) -> bool {
    match result {
        Ok(()) => {
            println!("[{kind}] {name}: OK");
            true
        }
        Err(err) => {
            println!("[{kind}] {name}: FAILED ({err})");
            false
        }
    }
}

/// Full create -> save -> load -> decode cycle for one codec.
fn run_codec<C: SymbolCodec<u8>>(
    input: &Path,
    config: &Config,
    cancel: &CancelToken,
) -> Report {
    let kind = C::KIND;
    let mut report = Report::new(kind);
    let paths = ArtifactPaths::with_prefix(&config.out_dir, file_prefix(kind));

    let mut writer = Compressor::<C>::new();
    let saved = phase(kind, "create", writer.create(input))
        && phase(kind, "encode", writer.encode())
        && phase(kind, "save", writer.save(&paths));

    if let Some(table) = writer.frequency_table() {
        report.input_bytes = table.total();
        report.alphabet_size = table.alphabet_size();
    }
    if let Some(artifact) = writer.artifact() {
        report.payload_bits = artifact.payload.bit_len() as u64;
        report.payload_bytes = artifact.payload.bytes().len() as u64;
        report.metadata_bytes = artifact.metadata_bytes().map_or(0, |m| m.len() as u64);
    }
    if kind == CodecKind::Huffman {
        report.efficiency = writer.efficiency().ok();
    }
    if !saved {
        report.complete();
        return report;
    }

    let mut reader = Compressor::<C>::new();
    let decoded = phase(kind, "load", reader.load(&paths))
        && phase(kind, "decode", reader.decode_with(cancel));

    if decoded {
        if let Ok(original) = writer.data() {
            report.round_trip = reader.verify(original).ok();
        }
        let verified = report.passed();
        println!("[{kind}] verify: {}", if verified { "OK" } else { "FAILED" });
    }

    report.complete();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecChoice;

    fn config_for(dir: &Path, input_file: Option<PathBuf>) -> Config {
        Config {
            input_file,
            out_dir: dir.to_path_buf(),
            codecs: CodecChoice::Both,
            seed: 7,
            sample_bytes: 4096,
            print_config: false,
            print_metrics: false,
        }
    }

    #[test]
    fn test_run_codec_passes() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input.txt");
        std::fs::write(&input, b"she sells sea shells by the sea shore\n").unwrap();
        let config = config_for(dir.path(), Some(input.clone()));

        let report = run_codec::<HuffmanCodec<u8>>(&input, &config, &CancelToken::new());
        assert!(report.passed());
        assert!(report.efficiency.is_some());
        assert!(dir.path().join("huffman-alphabet.bin").exists());

        let report = run_codec::<FixedLengthCodec<u8>>(&input, &config, &CancelToken::new());
        assert!(report.passed());
        assert!(report.efficiency.is_none());
    }

    #[test]
    fn test_run_with_generated_sample() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path(), None);
        assert!(run(&config, &CancelToken::new()).unwrap());
        assert!(dir.path().join(SAMPLE_FILE).exists());
        let report = std::fs::read_to_string(dir.path().join("fixed-report.txt")).unwrap();
        assert!(report.contains("passed=true"));
    }

    #[test]
    fn test_missing_input_fails_run() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let config = config_for(dir.path(), Some(missing.clone()));

        let report = run_codec::<HuffmanCodec<u8>>(&missing, &config, &CancelToken::new());
        assert!(!report.passed());
        assert!(report.round_trip.is_none());
        assert!(!run(&config, &CancelToken::new()).unwrap());
    }

    #[test]
    fn test_cancelled_decode_fails_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path(), None);
        let cancel = CancelToken::new();
        cancel.cancel();

        assert!(!run(&config, &cancel).unwrap());
        // Stops after the first codec
        assert!(dir.path().join("fixed-report.txt").exists());
        assert!(!dir.path().join("huffman-report.txt").exists());
    }
}
