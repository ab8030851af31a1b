//! Configuration for the textpack driver.
//!
//! Handles parsing command-line arguments and filling in defaults. The
//! sample seed is random unless given, and always printed, so any run can be
//! repeated exactly.
//!
//! # Philosophy
//!
//! The tool should work with ZERO arguments: with no input file it generates
//! a sample text and round-trips it through both codecs.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use textpack_core::{CodecKind, Error, Result};

/// Which codecs a run exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecChoice {
    Fixed,
    Huffman,
    Both,
}

impl CodecChoice {
    /// Codecs to run, in order.
    pub fn kinds(self) -> &'static [CodecKind] {
        match self {
            CodecChoice::Fixed => &[CodecKind::FixedLength],
            CodecChoice::Huffman => &[CodecKind::Huffman],
            CodecChoice::Both => &[CodecKind::FixedLength, CodecKind::Huffman],
        }
    }
}

impl FromStr for CodecChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fixed" => Ok(CodecChoice::Fixed),
            "huffman" => Ok(CodecChoice::Huffman),
            "both" => Ok(CodecChoice::Both),
            other => Err(Error::Config(format!(
                "invalid codec '{other}' (expected fixed, huffman or both)"
            ))),
        }
    }
}

impl fmt::Display for CodecChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CodecChoice::Fixed => "fixed",
            CodecChoice::Huffman => "huffman",
            CodecChoice::Both => "both",
        };
        f.write_str(name)
    }
}

/// Complete configuration for a driver run.
#[derive(Debug, Clone)]
pub struct Config {
    // === Files ===
    /// Input file path (None = generate sample)
    pub input_file: Option<PathBuf>,

    /// Directory receiving artifacts, the generated sample and reports
    pub out_dir: PathBuf,

    // === Codecs ===
    pub codecs: CodecChoice,

    // === Sample ===
    /// Seed for the generated sample
    pub seed: u64,

    /// Generated sample size in bytes
    pub sample_bytes: usize,

    // === Behavior ===
    /// Whether to print detailed config
    pub print_config: bool,

    /// Whether to print detailed metrics summary
    pub print_metrics: bool,
}

impl Config {
    /// Parse configuration from command-line arguments.
    ///
    /// If --seed is not provided, a time-based seed is used.
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut input_file: Option<PathBuf> = None;
        let mut out_dir: Option<PathBuf> = None;
        let mut codecs = CodecChoice::Both;
        let mut seed: Option<u64> = None;
        let mut sample_bytes: usize = 65536;
        let mut print_config = false;
        let mut print_metrics = true;

        let mut args = args.iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--in" => {
                    input_file = Some(PathBuf::from(value(&mut args, "--in", "a path")?));
                }
                "--out-dir" => {
                    out_dir = Some(PathBuf::from(value(&mut args, "--out-dir", "a path")?));
                }
                "--codec" => {
                    codecs = value(&mut args, "--codec", "a codec name")?.parse()?;
                }
                "--seed" => {
                    seed = Some(
                        value(&mut args, "--seed", "a number")?
                            .parse()
                            .map_err(|_| Error::Config("invalid seed".to_string()))?,
                    );
                }
                "--sample-bytes" => {
                    sample_bytes = value(&mut args, "--sample-bytes", "a number")?
                        .parse()
                        .map_err(|_| Error::Config("invalid sample-bytes".to_string()))?;
                    if sample_bytes == 0 {
                        return Err(Error::Config("--sample-bytes must be positive".to_string()));
                    }
                }
                "--print-config" => {
                    print_config = true;
                }
                "--no-metrics" => {
                    print_metrics = false;
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                other => {
                    return Err(Error::Config(format!("unknown argument: {other}")));
                }
            }
        }

        // Determine seed (explicit or time-based)
        let seed = seed.unwrap_or_else(|| {
            use std::time::{SystemTime, UNIX_EPOCH};
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |t| t.as_millis() as u64)
        });

        Ok(Config {
            input_file,
            out_dir: out_dir.unwrap_or_else(|| PathBuf::from("./textpack-out")),
            codecs,
            seed,
            sample_bytes,
            print_config,
            print_metrics,
        })
    }

    /// Print the configuration in human-readable form.
    pub fn print(&self) {
        println!("=== Configuration ===");
        match &self.input_file {
            Some(path) => println!("Input file:  {}", path.display()),
            None => println!("Input file:  (generate sample)"),
        }
        println!("Output dir:  {}", self.out_dir.display());
        println!("Codecs:      {}", self.codecs);
        println!();
        if self.input_file.is_none() {
            println!("=== Sample ===");
            println!("Seed: {}", self.seed);
            println!("Size: {} bytes ({} KiB)", self.sample_bytes, self.sample_bytes / 1024);
            println!();
        }
    }
}

fn value<'a>(
    args: &mut impl Iterator<Item = &'a String>,
    flag: &str,
    what: &str,
) -> Result<&'a str> {
    args.next()
        .map(String::as_str)
        .ok_or_else(|| Error::Config(format!("{flag} requires {what}")))
}

fn print_help() {
    println!("textpack: fixed-length and Huffman text compression round trips");
    println!();
    println!("USAGE:");
    println!("    textpack [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --in <PATH>             Input file (default: generate sample)");
    println!("    --out-dir <DIR>         Artifact directory (default: ./textpack-out)");
    println!("    --codec <NAME>          fixed, huffman or both (default: both)");
    println!();
    println!("    --seed <N>              Seed for the generated sample");
    println!("    --sample-bytes <N>      Generated sample size (default: 65536)");
    println!();
    println!("    --print-config          Print resolved configuration");
    println!("    --no-metrics            Don't print metrics summary");
    println!("    --help, -h              Print this help");
    println!();
    println!("ENVIRONMENT:");
    println!("    TEXTPACK_LOG            Log filter (default: info)");
    println!();
    println!("EXAMPLES:");
    println!("    textpack                                  # Round-trip a random sample");
    println!("    textpack --seed 42                        # Deterministic sample");
    println!("    textpack --in book.txt --codec huffman    # Compress a specific file");
    println!();
}
