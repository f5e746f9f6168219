//! Key chains and the generator that produces them.

use core::{fmt, iter};

use rand::{CryptoRng, RngCore, SeedableRng, rngs::StdRng};

use crate::{MIN_CHAIN_LEN, error::KeyChainError, key::Key, seed::Seed};

/// An ordered chain of one-time keys.
///
/// `keys()[0]` is closest to the seed and `keys()[len - 1]` is the most
/// hashed. Keys are disclosed from the top down, each at most once.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyChain {
    keys: Vec<Key>,
    remaining: usize,
}

impl KeyChain {
    /// Derive a chain of `len` keys from `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyChainError::TooShort`] if `len` is below
    /// [`MIN_CHAIN_LEN`].
    pub fn from_seed(seed: &Seed, len: usize) -> Result<Self, KeyChainError> {
        if len < MIN_CHAIN_LEN {
            return Err(KeyChainError::TooShort { len });
        }

        let keys: Vec<Key> =
            iter::successors(Some(Key::derive(&seed.to_base64())), |k| Some(k.hash_forward()))
                .take(len)
                .collect();

        Ok(Self {
            remaining: keys.len(),
            keys,
        })
    }

    /// Disclose the next key, moving the cursor down by one.
    pub fn next_key(&mut self) -> Option<Key> {
        let index = self.cursor()?;
        let key = self.keys.get(index).cloned()?;
        self.remaining = index;
        Some(key)
    }

    /// Index of the next key to disclose, if any are left.
    #[must_use]
    pub const fn cursor(&self) -> Option<usize> {
        self.remaining.checked_sub(1)
    }

    /// Number of keys not yet disclosed.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.remaining
    }

    /// Whether only the seed-nearest key is left.
    ///
    /// That key must be disclosed together with the top of a fresh chain.
    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.remaining == 1
    }

    /// Whether every key has been disclosed.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Total number of keys in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always `false`; chains are never built empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// All keys in generation order.
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }
}

impl fmt::Debug for KeyChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyChain")
            .field("len", &self.keys.len())
            .field("remaining", &self.remaining)
            .finish_non_exhaustive()
    }
}

/// Produces fresh key chains from an owned random source.
///
/// Each polling connection owns its generator, so there is no process-wide
/// RNG and tests can inject a seeded one.
pub struct KeyChainGenerator<R = StdRng> {
    rng: R,
}

impl KeyChainGenerator<StdRng> {
    /// A generator seeded from operating system entropy.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: RngCore + CryptoRng> KeyChainGenerator<R> {
    /// Wrap an RNG.
    #[must_use]
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Draw a new seed and derive a chain of `len` keys from it.
    ///
    /// # Errors
    ///
    /// Returns [`KeyChainError::TooShort`] if `len` is below
    /// [`MIN_CHAIN_LEN`].
    pub fn generate(&mut self, len: usize) -> Result<KeyChain, KeyChainError> {
        let seed = Seed::random(&mut self.rng);
        KeyChain::from_seed(&seed, len)
    }
}

impl<R> fmt::Debug for KeyChainGenerator<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyChainGenerator").finish_non_exhaustive()
    }
}
