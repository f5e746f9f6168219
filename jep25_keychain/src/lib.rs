//! One-time key chains for JEP-0025 HTTP polling.
//!
//! A polling client proves continuity of its session by disclosing one key
//! per request from a hash chain:
//!
//! ```text
//! K(0)   = Base64(seed)
//! K(n)   = Base64(SHA1(K(n - 1)))          for n > 0
//!
//! generate:  seed ──► k[0] ──► k[1] ──► … ──► k[N-1]
//! disclose:  k[N-1], k[N-2], …, k[0]       (reverse order)
//! ```
//!
//! Because each disclosed key hashes forward to the key disclosed before it,
//! the server can verify a new key against the last one it accepted, while
//! an observer who has seen past keys cannot compute future ones.
//!
//! # Crate Organization
//!
//! - [`seed`]: The random starting point of a chain
//! - [`key`]: A single disclosed key and the chain step function
//! - [`chain`]: [`KeyChain`] and the per-instance [`KeyChainGenerator`]
//! - [`verifier`]: Relying-party check of a disclosure sequence
//! - [`error`]: Error types

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    clippy::dbg_macro,
    clippy::expect_used,
    clippy::missing_const_for_fn,
    clippy::panic,
    clippy::todo,
    clippy::unwrap_used,
    future_incompatible,
    let_underscore,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style
)]
#![deny(
    clippy::all,
    clippy::pedantic,
    rust_2018_idioms,
    unreachable_pub,
    unused_extern_crates
)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod error;
pub mod key;
pub mod seed;
pub mod verifier;

pub use chain::{KeyChain, KeyChainGenerator};
pub use error::{KeyChainError, VerifyError};
pub use key::Key;
pub use seed::Seed;
pub use verifier::KeyVerifier;

/// Default number of keys per chain.
pub const DEFAULT_CHAIN_LEN: usize = 512;

/// Shortest chain that can still be linked to its successor.
///
/// The last key of a chain is disclosed together with the first key of the
/// next one, so a chain needs at least one other key to be useful.
pub const MIN_CHAIN_LEN: usize = 2;
