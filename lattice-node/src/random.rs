//! Seeded random stream source
//!
//! Built once from the server-issued seeds and shared read-only with every
//! job. Consumers ask for named sub-streams; the same name always yields the
//! same sequence for a given seed set, and different names are independent.

use anyhow::{Result, bail};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

#[derive(Debug)]
pub struct RandomStreamSource {
    seeds: Vec<u64>,
    /// blake3 digest of the ordered seeds, used as the key for sub-streams
    root: [u8; 32],
}

impl RandomStreamSource {
    pub fn from_seeds(seeds: &[u64]) -> Result<Self> {
        if seeds.is_empty() {
            bail!("cannot build a random stream source from an empty seed set");
        }

        let mut hasher = blake3::Hasher::new();
        for seed in seeds {
            hasher.update(&seed.to_le_bytes());
        }

        Ok(Self {
            seeds: seeds.to_vec(),
            root: hasher.finalize().into(),
        })
    }

    pub fn seeds(&self) -> &[u64] {
        &self.seeds
    }

    /// Returns a fresh generator for the named sub-stream
    pub fn stream(&self, name: &str) -> ChaCha20Rng {
        let mut hasher = blake3::Hasher::new_keyed(&self.root);
        hasher.update(name.as_bytes());
        ChaCha20Rng::from_seed(hasher.finalize().into())
    }
}
