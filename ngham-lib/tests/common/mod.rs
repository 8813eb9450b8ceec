use std::path::PathBuf;

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Offset of the protected region in a two-level packet; preamble, sync word and size tag.
pub const TWO_LEVEL_HEADER_OFFSET: usize = 4 + 4 + 3;

pub fn fixture_path(name: &str) -> PathBuf {
    let mut path =
        PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));
    path.push("tests/fixtures");
    path.push(name);
    path
}

pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

pub fn random_payload(rng: &mut StdRng, len: usize) -> Vec<u8> {
    (0..len).map(|_| rng.gen()).collect()
}
