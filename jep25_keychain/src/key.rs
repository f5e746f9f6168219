//! A single key of a chain.

use core::fmt;

use base64::{Engine, engine::general_purpose::STANDARD};
use sha1::{Digest, Sha1};

/// Length of a SHA-1 digest in bytes.
const DIGEST_LEN: usize = 20;

/// One disclosed key: the Base64 text of a SHA-1 digest.
///
/// Keys are pure US-ASCII, so they can be written verbatim into the
/// `;`-separated request header.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Key(String);

impl Key {
    /// One chain step: `Base64(SHA1(ascii(previous)))`.
    #[must_use]
    pub fn derive(previous: &str) -> Self {
        let digest = Sha1::digest(previous.as_bytes());
        Self(STANDARD.encode(digest))
    }

    /// Apply one more chain step to this key.
    #[must_use]
    pub fn hash_forward(&self) -> Self {
        Self::derive(&self.0)
    }

    /// Whether this key is the predecessor of `accepted` in its chain.
    ///
    /// Keys are disclosed in reverse generation order, so a newly disclosed
    /// key is valid iff hashing it once yields the key accepted before it.
    #[must_use]
    pub fn verifies(&self, accepted: &Self) -> bool {
        self.hash_forward() == *accepted
    }

    /// Parse a key received on the wire.
    ///
    /// Returns `None` unless the text is Base64 of exactly one SHA-1 digest.
    #[must_use]
    pub fn from_wire(text: &str) -> Option<Self> {
        let bytes = STANDARD.decode(text).ok()?;
        (bytes.len() == DIGEST_LEN).then(|| Self(text.to_owned()))
    }

    /// The key's text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.0)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
