//! Property-based tests for the run-length codec.

use proptest::prelude::*;
use terralite_core::{Tile, CHUNK_AREA};
use terralite_world::{rle_decode, rle_encode};

fn tile_strategy() -> impl Strategy<Value = Tile> {
    prop::sample::select(Tile::ALL.to_vec())
}

/// Layers built from runs, which is what real chunks look like.
fn layer_strategy() -> impl Strategy<Value = Vec<Tile>> {
    prop::collection::vec((tile_strategy(), 1usize..300), 1..40).prop_map(|runs| {
        let mut layer: Vec<Tile> = runs
            .into_iter()
            .flat_map(|(tile, len)| std::iter::repeat(tile).take(len))
            .take(CHUNK_AREA)
            .collect();
        layer.resize(CHUNK_AREA, Tile::Stone);
        layer
    })
}

proptest! {
    #[test]
    fn run_layers_roundtrip(layer in layer_strategy()) {
        let encoded = rle_encode(&layer);
        prop_assert_eq!(encoded.len() % 2, 0);
        prop_assert_eq!(rle_decode(&encoded), Ok(layer));
    }

    #[test]
    fn noisy_layers_roundtrip(layer in prop::collection::vec(tile_strategy(), CHUNK_AREA)) {
        prop_assert_eq!(rle_decode(&rle_encode(&layer)), Ok(layer));
    }

    #[test]
    fn encoding_has_no_empty_or_split_runs(layer in layer_strategy()) {
        let encoded = rle_encode(&layer);
        for pair in encoded.chunks_exact(2) {
            prop_assert!(pair[1] > 0);
        }
        for window in encoded.chunks_exact(2).collect::<Vec<_>>().windows(2) {
            prop_assert_ne!(window[0][0], window[1][0]);
        }
    }

    #[test]
    fn decode_never_panics(data in prop::collection::vec(any::<u16>(), 0..64)) {
        let _ = rle_decode(&data);
    }
}
