//! Relying-party verification of disclosed keys.
//!
//! The polling client never runs this; it only discloses keys in the right
//! order. Servers (and test servers) use [`KeyVerifier`] to check that order.

use crate::{error::VerifyError, key::Key};

/// Tracks the last accepted key of one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyVerifier {
    accepted: Option<Key>,
}

impl KeyVerifier {
    /// A verifier that has not seen any key yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { accepted: None }
    }

    /// The last key accepted, if any.
    #[must_use]
    pub const fn accepted(&self) -> Option<&Key> {
        self.accepted.as_ref()
    }

    /// Check the keys disclosed by one request.
    ///
    /// A request carries either a single key, or the last key of the old
    /// chain followed by the first key of a new one. The first key of a
    /// session is accepted as is.
    ///
    /// # Errors
    ///
    /// Returns a [`VerifyError`] if the disclosure is malformed or the
    /// first key does not hash forward to the last accepted key. The
    /// verifier state is unchanged on error.
    pub fn accept(&mut self, disclosed: &[Key]) -> Result<(), VerifyError> {
        let (first, rest) = match disclosed {
            [] => return Err(VerifyError::Empty),
            [first] => (first, None),
            [first, next] => (first, Some(next)),
            more => return Err(VerifyError::TooMany(more.len())),
        };

        if let Some(accepted) = &self.accepted
            && !first.verifies(accepted)
        {
            return Err(VerifyError::OutOfSequence);
        }

        self.accepted = Some(rest.unwrap_or(first).clone());
        Ok(())
    }
}
