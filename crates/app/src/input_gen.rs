//! Sample text generation for runs without an input file.
//!
//! The generated text looks like prose: words drawn from an English-like
//! letter distribution, separated by spaces, with occasional punctuation,
//! capitals and line breaks. The skewed distribution makes the gap between
//! fixed-length and Huffman coding visible in the metrics.

use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Letters with approximate English frequencies (per mille).
const LETTERS: &[(u8, u32)] = &[
    (b'e', 127),
    (b't', 91),
    (b'a', 82),
    (b'o', 75),
    (b'i', 70),
    (b'n', 67),
    (b's', 63),
    (b'h', 61),
    (b'r', 60),
    (b'd', 43),
    (b'l', 40),
    (b'c', 28),
    (b'u', 28),
    (b'm', 24),
    (b'w', 24),
    (b'f', 22),
    (b'g', 20),
    (b'y', 20),
    (b'p', 19),
    (b'b', 15),
    (b'v', 10),
    (b'k', 8),
    (b'j', 2),
    (b'x', 2),
    (b'q', 1),
    (b'z', 1),
];

const PUNCTUATION: &[u8] = b",.;!?";

/// Generate `size_bytes` of sample text, reproducible from `seed`.
pub fn generate_sample_text(seed: u64, size_bytes: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(size_bytes + 16);

    let letters = match WeightedIndex::new(LETTERS.iter().map(|(_, weight)| *weight)) {
        Ok(dist) => dist,
        Err(_) => return data,
    };

    let mut sentence_start = true;
    while data.len() < size_bytes {
        let word_len = rng.gen_range(1..=9);
        for i in 0..word_len {
            let letter = LETTERS[letters.sample(&mut rng)].0;
            if i == 0 && sentence_start {
                data.push(letter.to_ascii_uppercase());
            } else {
                data.push(letter);
            }
        }
        sentence_start = false;

        if rng.gen_bool(0.12) {
            let mark = PUNCTUATION[rng.gen_range(0..PUNCTUATION.len())];
            data.push(mark);
            sentence_start = matches!(mark, b'.' | b'!' | b'?');
        }
        data.push(if rng.gen_bool(0.03) { b'\n' } else { b' ' });
    }

    data.truncate(size_bytes);
    data
}

/// Write generated text to a file.
pub fn write_sample_file(
    path: &std::path::Path,
    seed: u64,
    size_bytes: usize,
) -> std::io::Result<()> {
    std::fs::write(path, generate_sample_text(seed, size_bytes))
}
