use rand::SeedableRng;

// Seeded rng for replicable tests.
pub fn seeded_rng() -> (impl rand::CryptoRng + rand::RngCore) {
    const TEST_RNG_SEED: [u8; 32] = *b"NEVER USE THIS FOR ANYTHING REAL";
    rand::rngs::StdRng::from_seed(TEST_RNG_SEED)
}

// A second, independent seeded rng, for tests that need two parties.
pub fn other_seeded_rng() -> (impl rand::CryptoRng + rand::RngCore) {
    const OTHER_RNG_SEED: [u8; 32] = *b"A SECOND SEED, NOT FOR REAL USE!";
    rand::rngs::StdRng::from_seed(OTHER_RNG_SEED)
}
