//! Authentication header carried at the start of every request body.
//!
//! ```text
//! <sessionIdOrZero>;<key>[;<key>],<payload…>
//! ```
//!
//! The second key only appears when a chain runs out: the old chain's last
//! key is disclosed together with the top of the fresh chain, so the server
//! can keep verifying across the boundary.

use core::fmt;

use jep25_keychain::{Key, KeyChain, KeyChainError, KeyChainGenerator};
use rand::{CryptoRng, RngCore};
use thiserror::Error;

use crate::session::{NO_SESSION, SessionId};

const FIELD_SEPARATOR: u8 = b';';
const HEADER_TERMINATOR: u8 = b',';

/// A parsed or about-to-be-sent request header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeader {
    session: Option<SessionId>,
    keys: Vec<Key>,
}

impl AuthHeader {
    /// Build a header for `session` disclosing `keys`.
    #[must_use]
    pub const fn new(session: Option<SessionId>, keys: Vec<Key>) -> Self {
        Self { session, keys }
    }

    /// The session this request belongs to; `None` before one is assigned.
    #[must_use]
    pub const fn session(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    /// The disclosed keys, in disclosure order.
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Start a request body: the header followed by its terminator.
    #[must_use]
    pub fn to_body_prefix(&self) -> Vec<u8> {
        let mut body = self.to_string().into_bytes();
        body.push(HEADER_TERMINATOR);
        body
    }

    /// Split a request body into its header and payload.
    ///
    /// # Errors
    ///
    /// Returns a [`HeaderParseError`] if the body has no terminator, the
    /// header is not ASCII, or any field is malformed.
    pub fn parse(body: &[u8]) -> Result<(Self, &[u8]), HeaderParseError> {
        let end = body
            .iter()
            .position(|b| *b == HEADER_TERMINATOR)
            .ok_or(HeaderParseError::Unterminated)?;
        let (head, rest) = body.split_at(end);
        let payload = rest.get(1..).unwrap_or_default();

        let head = core::str::from_utf8(head)
            .ok()
            .filter(|h| h.is_ascii())
            .ok_or(HeaderParseError::NotAscii)?;

        let mut fields = head.split(char::from(FIELD_SEPARATOR));
        let session = match fields.next() {
            Some(NO_SESSION) => None,
            Some(value) => Some(SessionId::from_cookie(value).ok_or(HeaderParseError::Session)?),
            None => return Err(HeaderParseError::Session),
        };

        let keys = fields
            .map(|field| Key::from_wire(field).ok_or(HeaderParseError::Key))
            .collect::<Result<Vec<_>, _>>()?;

        if keys.is_empty() || keys.len() > 2 {
            return Err(HeaderParseError::KeyCount(keys.len()));
        }

        Ok((Self { session, keys }, payload))
    }
}

impl fmt::Display for AuthHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.session.as_ref().map_or(NO_SESSION, SessionId::as_str))?;
        for key in &self.keys {
            write!(f, ";{key}")?;
        }
        Ok(())
    }
}

/// A request body did not start with a well-formed header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeaderParseError {
    /// No `,` after the header.
    #[error("header is not terminated")]
    Unterminated,

    /// The header contains non-ASCII bytes.
    #[error("header is not ASCII")]
    NotAscii,

    /// The session field is malformed.
    #[error("malformed session field")]
    Session,

    /// A key field is not a Base64 SHA-1 digest.
    #[error("malformed key field")]
    Key,

    /// A header must disclose one or two keys.
    #[error("header discloses {0} keys")]
    KeyCount(usize),
}

/// Chooses which keys each request discloses.
///
/// Owns the current chain and regenerates it when the session starts and
/// whenever only its last key is left.
pub struct Authenticator<R> {
    generator: KeyChainGenerator<R>,
    chain_len: usize,
    chain: Option<KeyChain>,
}

impl<R: RngCore + CryptoRng> Authenticator<R> {
    /// Disclose keys from chains of `chain_len` keys.
    #[must_use]
    pub const fn new(generator: KeyChainGenerator<R>, chain_len: usize) -> Self {
        Self {
            generator,
            chain_len,
            chain: None,
        }
    }

    /// Build the header of the next request.
    ///
    /// # Errors
    ///
    /// Returns a [`KeyChainError`] if a fresh chain cannot be generated.
    pub fn next_header(&mut self, session: Option<&SessionId>) -> Result<AuthHeader, KeyChainError> {
        let Some(session) = session else {
            let chain = self.chain.insert(self.generator.generate(self.chain_len)?);
            let key = chain.next_key().ok_or(KeyChainError::Exhausted)?;
            return Ok(AuthHeader::new(None, vec![key]));
        };

        let keys = match self.chain.take() {
            Some(mut chain) if chain.remaining() > 1 => {
                let key = chain.next_key().ok_or(KeyChainError::Exhausted)?;
                self.chain = Some(chain);
                vec![key]
            }
            old => {
                let old_last = old.and_then(|mut chain| chain.next_key());
                let fresh = self.chain.insert(self.generator.generate(self.chain_len)?);
                let fresh_top = fresh.next_key().ok_or(KeyChainError::Exhausted)?;
                tracing::debug!(chain_len = self.chain_len, "key chain regenerated");
                old_last.into_iter().chain([fresh_top]).collect()
            }
        };

        Ok(AuthHeader::new(Some(session.clone()), keys))
    }
}

impl<R> fmt::Debug for Authenticator<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("chain_len", &self.chain_len)
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use jep25_keychain::KeyVerifier;
    use rand::{SeedableRng, rngs::StdRng};
    use testresult::TestResult;

    use super::*;

    fn authenticator(chain_len: usize) -> Authenticator<StdRng> {
        Authenticator::new(KeyChainGenerator::new(StdRng::seed_from_u64(25)), chain_len)
    }

    fn sid(value: &str) -> Result<SessionId, &'static str> {
        SessionId::from_cookie(value).ok_or("bad session id")
    }

    #[test]
    fn first_request_uses_zero_session() -> TestResult {
        let header = authenticator(4).next_header(None)?;
        let text = header.to_string();

        assert!(text.starts_with("0;"));
        assert_eq!(header.keys().len(), 1);
        assert_eq!(header.to_body_prefix().last(), Some(&b','));
        Ok(())
    }

    #[test]
    fn later_requests_carry_the_session() -> TestResult {
        let mut auth = authenticator(4);
        let session = sid("abc123")?;
        let _ = auth.next_header(None)?;

        let header = auth.next_header(Some(&session))?;
        assert!(header.to_string().starts_with("abc123;"));
        assert_eq!(header.keys().len(), 1);
        Ok(())
    }

    #[test]
    fn chain_boundary_links_old_and_new() -> TestResult {
        let mut auth = authenticator(3);
        let session = sid("s")?;

        let first = auth.next_header(None)?; // k[2]
        let second = auth.next_header(Some(&session))?; // k[1]
        let third = auth.next_header(Some(&session))?; // k[0] ; k'[2]
        let fourth = auth.next_header(Some(&session))?; // k'[1]

        assert_eq!(first.keys().len(), 1);
        assert_eq!(second.keys().len(), 1);
        assert_eq!(third.keys().len(), 2);
        assert_eq!(fourth.keys().len(), 1);

        let mut verifier = KeyVerifier::new();
        for header in [&first, &second, &third, &fourth] {
            verifier.accept(header.keys())?;
        }
        Ok(())
    }

    #[test]
    fn no_key_is_disclosed_twice() -> TestResult {
        let mut auth = authenticator(2);
        let session = sid("s")?;
        let mut seen = std::collections::HashSet::new();
        let mut verifier = KeyVerifier::new();

        let first = auth.next_header(None)?;
        verifier.accept(first.keys())?;
        seen.extend(first.keys().iter().cloned());

        for _ in 0..50 {
            let header = auth.next_header(Some(&session))?;
            verifier.accept(header.keys())?;
            for key in header.keys() {
                assert!(seen.insert(key.clone()), "key disclosed twice: {key}");
            }
        }
        Ok(())
    }

    #[test]
    fn unlinkable_chain_length_is_an_error() {
        let mut auth = authenticator(1);
        assert_eq!(
            auth.next_header(None),
            Err(KeyChainError::TooShort { len: 1 })
        );
    }

    #[test]
    fn parse_splits_header_and_payload() -> TestResult {
        let header = authenticator(4).next_header(None)?;
        let mut body = header.to_body_prefix();
        body.extend_from_slice(b"AB,C");

        let (parsed, payload) = AuthHeader::parse(&body)?;
        assert_eq!(parsed, header);
        assert_eq!(payload, b"AB,C");
        Ok(())
    }

    #[test]
    fn parse_reads_linking_header() -> TestResult {
        let a = Key::derive("a");
        let b = Key::derive("b");
        let body = format!("sid;{a};{b},");

        let (parsed, payload) = AuthHeader::parse(body.as_bytes())?;
        assert_eq!(parsed.session().map(SessionId::as_str), Some("sid"));
        assert_eq!(parsed.keys(), &[a, b]);
        assert!(payload.is_empty());
        Ok(())
    }

    #[test]
    fn parse_rejects_malformed_bodies() {
        let key = Key::derive("k");
        assert_eq!(AuthHeader::parse(b"0;abc"), Err(HeaderParseError::Unterminated));
        assert_eq!(AuthHeader::parse(b"0;nope,"), Err(HeaderParseError::Key));
        assert_eq!(AuthHeader::parse(b"0,"), Err(HeaderParseError::KeyCount(0)));
        assert_eq!(
            AuthHeader::parse(format!("-2:0;{key},").as_bytes()),
            Err(HeaderParseError::Session)
        );
        assert_eq!(
            AuthHeader::parse(format!("0;{key};{key};{key},").as_bytes()),
            Err(HeaderParseError::KeyCount(3))
        );
    }
}
