//! Property tests over arbitrary byte streams.

use proptest::prelude::*;

use textpack_core::{
    bitio::{BitReader, BitWriter},
    fixed::code_width,
    huffman::build_tree,
    FixedLengthCodec, FrequencyTable, HuffmanCodec, SymbolCodec,
};

fn input() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 1..2000),
        // Small skewed alphabets exercise deep trees and narrow widths
        prop::collection::vec(prop::sample::select(b"aaaaaaabbbcd \n".to_vec()), 1..2000),
    ]
}

proptest! {
    #[test]
    fn huffman_round_trip(data in input()) {
        let table = FrequencyTable::from_symbols(&data).unwrap();
        let codec = HuffmanCodec::build(&table).unwrap();
        let payload = codec.encode_all(&data).unwrap();
        prop_assert_eq!(codec.decode_all(&payload, None).unwrap(), data);
    }

    #[test]
    fn fixed_length_round_trip(data in input()) {
        let table = FrequencyTable::from_symbols(&data).unwrap();
        let codec = FixedLengthCodec::build(&table).unwrap();
        let payload = codec.encode_all(&data).unwrap();
        prop_assert_eq!(payload.bit_len(), data.len() * codec.width() as usize);
        prop_assert_eq!(codec.decode_all(&payload, None).unwrap(), data);
    }

    #[test]
    fn fixed_width_is_minimal(data in input()) {
        let table = FrequencyTable::from_symbols(&data).unwrap();
        let n = table.alphabet_size();
        let width = code_width(n) as u32;
        prop_assert!(1usize << width >= n);
        if n > 1 {
            prop_assert!(1usize << (width - 1) < n);
        }
    }

    #[test]
    fn huffman_codes_are_prefix_free(data in input()) {
        let table = FrequencyTable::from_symbols(&data).unwrap();
        let codebook = HuffmanCodec::build(&table).unwrap().codebook();
        prop_assert_eq!(codebook.len(), table.alphabet_size());
        for (a, code_a) in &codebook {
            prop_assert!(!code_a.is_empty());
            for (b, code_b) in &codebook {
                if a != b {
                    prop_assert!(!code_a.is_prefix_of(code_b), "{} prefixes {}", code_a, code_b);
                }
            }
        }
    }

    #[test]
    fn tree_weight_is_conserved(data in input()) {
        let table = FrequencyTable::from_symbols(&data).unwrap();
        let root = build_tree(&table).unwrap();
        prop_assert_eq!(root.weight(), data.len() as u64);
        prop_assert_eq!(root.leaf_count(), table.alphabet_size());
    }

    #[test]
    fn huffman_beats_fixed_width(data in input()) {
        let table = FrequencyTable::from_symbols(&data).unwrap();
        let huffman = HuffmanCodec::build(&table).unwrap();
        let fixed = FixedLengthCodec::build(&table).unwrap();
        let huffman_mean = huffman.mean_code_length(&table);
        prop_assert!(huffman_mean <= fixed.mean_code_length(&table) + 1e-9);
        prop_assert!(huffman_mean + 1e-9 >= table.entropy());
    }

    #[test]
    fn metadata_rebuilds_same_code(data in input()) {
        let table = FrequencyTable::from_symbols(&data).unwrap();

        let huffman = HuffmanCodec::build(&table).unwrap();
        let rebuilt = HuffmanCodec::<u8>::from_metadata(&huffman.to_metadata().unwrap()).unwrap();
        prop_assert_eq!(rebuilt.codebook(), huffman.codebook());

        let fixed = FixedLengthCodec::build(&table).unwrap();
        let rebuilt = FixedLengthCodec::<u8>::from_metadata(&fixed.to_metadata().unwrap()).unwrap();
        prop_assert_eq!(rebuilt.codebook(), fixed.codebook());
    }

    #[test]
    fn padding_accounts_for_every_bit(bits in prop::collection::vec(any::<bool>(), 0..200)) {
        let mut writer = BitWriter::new();
        for &bit in &bits {
            writer.write_bit(bit);
        }
        let packed = writer.finish();
        prop_assert_eq!(packed.bytes().len(), bits.len().div_ceil(8));
        prop_assert_eq!(packed.padding() as usize, (8 - bits.len() % 8) % 8);

        let mut reader = BitReader::from_packed(&packed);
        let mut read = Vec::new();
        while !reader.is_empty() {
            read.push(reader.read_bit().unwrap());
        }
        prop_assert_eq!(read, bits);
    }
}
