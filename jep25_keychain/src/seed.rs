//! Random seed a key chain is derived from.

use core::fmt;

use base64::{Engine, engine::general_purpose::STANDARD};
use rand::{CryptoRng, RngCore};

/// Seed length in bytes.
pub const SEED_LEN: usize = 32;

/// The client-chosen starting point of a key chain.
///
/// The seed itself is never disclosed; only keys hashed from it are.
#[derive(Clone, PartialEq, Eq)]
pub struct Seed([u8; SEED_LEN]);

impl Seed {
    /// Draw a fresh seed from a cryptographically secure RNG.
    #[must_use]
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; SEED_LEN];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create a seed from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SEED_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes of the seed.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.0
    }

    /// The text form `K(0)` that the first chain step hashes.
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(..)")
    }
}
