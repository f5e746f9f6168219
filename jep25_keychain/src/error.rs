//! Error types for key chains.

use thiserror::Error;

/// Problem while building or consuming a key chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KeyChainError {
    /// The requested chain cannot be linked to a successor.
    #[error("key chain of {len} keys is too short (need at least {min})", min = crate::MIN_CHAIN_LEN)]
    TooShort {
        /// The requested length.
        len: usize,
    },

    /// Every key of the chain has already been disclosed.
    #[error("key chain exhausted")]
    Exhausted,
}

/// A disclosed key sequence was rejected by a [`KeyVerifier`](crate::KeyVerifier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyError {
    /// No key was disclosed.
    #[error("no key disclosed")]
    Empty,

    /// More keys were disclosed than the protocol allows in one request.
    #[error("{0} keys disclosed in one request")]
    TooMany(usize),

    /// The key does not hash forward to the last accepted key.
    #[error("key out of sequence")]
    OutOfSequence,
}
