//! Session tracking for HTTP polling connections.
//!
//! The server assigns a session through the `ID` cookie of its first
//! response and must echo the same value on every later response. A small
//! set of reserved values ending in `:0` report errors instead.

use core::fmt;

use thiserror::Error;

use crate::error::PollError;

/// Suffix shared by all error sentinels (a zero sequence number).
const SENTINEL_SUFFIX: &str = ":0";

/// Session placeholder sent before the server has assigned one.
pub const NO_SESSION: &str = "0";

/// An opaque, server-assigned session identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Interpret an `ID` cookie value as a session identifier.
    ///
    /// Returns `None` for empty values and error sentinels.
    #[must_use]
    pub fn from_cookie(value: &str) -> Option<Self> {
        (!value.is_empty() && !is_error_sentinel(value)).then(|| Self(value.to_owned()))
    }

    /// The identifier's text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether an `ID` value signals an error rather than a session.
#[must_use]
pub fn is_error_sentinel(value: &str) -> bool {
    value.ends_with(SENTINEL_SUFFIX)
}

/// Error conditions reported through reserved `ID` cookie values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ServerFault {
    /// `0:0`
    #[error("unknown polling error")]
    Unknown,

    /// `-1:0`
    #[error("server error")]
    Internal,

    /// `-2:0`
    #[error("bad request")]
    BadRequest,

    /// `-3:0`
    #[error("key sequence error")]
    KeySequence,
}

impl ServerFault {
    /// Map a wire value onto a fault, if it is one of the sentinels.
    #[must_use]
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "0:0" => Some(Self::Unknown),
            "-1:0" => Some(Self::Internal),
            "-2:0" => Some(Self::BadRequest),
            "-3:0" => Some(Self::KeySequence),
            _ => None,
        }
    }

    /// The sentinel as it appears in the `ID` cookie.
    #[must_use]
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Unknown => "0:0",
            Self::Internal => "-1:0",
            Self::BadRequest => "-2:0",
            Self::KeySequence => "-3:0",
        }
    }
}

/// Session state of one poll loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    id: Option<SessionId>,
}

impl Session {
    /// A session the server has not assigned yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { id: None }
    }

    /// The established session ID.
    #[must_use]
    pub const fn id(&self) -> Option<&SessionId> {
        self.id.as_ref()
    }

    /// Check the `ID` cookie of a response against the session.
    ///
    /// The first non-sentinel value is adopted. Returns `true` when this
    /// call adopted it.
    ///
    /// # Errors
    ///
    /// Any value that differs from the established session is fatal:
    /// sentinels map to [`PollError::Server`], anything else to
    /// [`PollError::SessionChanged`].
    pub fn observe(&mut self, cookie: &str) -> Result<bool, PollError> {
        let adopted = self.id.is_none()
            && match SessionId::from_cookie(cookie) {
                Some(id) => {
                    self.id = Some(id);
                    true
                }
                None => false,
            };

        match &self.id {
            Some(id) if id.as_str() == cookie => Ok(adopted),
            established => Err(ServerFault::from_wire(cookie).map_or_else(
                || PollError::SessionChanged {
                    expected: established.clone(),
                    received: cookie.to_owned(),
                },
                PollError::Server,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn sentinels_roundtrip_through_wire_values() {
        for fault in [
            ServerFault::Unknown,
            ServerFault::Internal,
            ServerFault::BadRequest,
            ServerFault::KeySequence,
        ] {
            assert_eq!(ServerFault::from_wire(fault.as_wire()), Some(fault));
            assert!(is_error_sentinel(fault.as_wire()));
        }
    }

    #[test]
    fn ordinary_ids_are_not_sentinels() {
        assert_eq!(ServerFault::from_wire("abc123"), None);
        assert!(!is_error_sentinel("abc123"));
        assert!(!is_error_sentinel("12:1"));
    }

    #[test]
    fn from_cookie_rejects_empty_and_sentinels() {
        assert!(SessionId::from_cookie("").is_none());
        assert!(SessionId::from_cookie("-2:0").is_none());
        assert!(SessionId::from_cookie("7:0").is_none());
        assert_eq!(
            SessionId::from_cookie("abc123").map(|id| id.to_string()),
            Some("abc123".to_owned())
        );
    }

    #[test]
    fn first_cookie_is_adopted_once() -> TestResult {
        let mut session = Session::new();
        assert!(session.observe("abc123")?);
        assert!(!session.observe("abc123")?);
        assert_eq!(session.id().map(SessionId::as_str), Some("abc123"));
        Ok(())
    }

    #[test]
    fn sentinel_before_session_is_a_server_fault() {
        let mut session = Session::new();
        let err = session.observe("-1:0").err();
        assert_eq!(
            err.and_then(|e| e.server_fault()),
            Some(ServerFault::Internal)
        );
        assert!(session.id().is_none());
    }

    #[test]
    fn sentinel_after_session_is_a_server_fault() -> TestResult {
        let mut session = Session::new();
        session.observe("abc123")?;
        let err = session.observe("-3:0").err();
        assert_eq!(
            err.and_then(|e| e.server_fault()),
            Some(ServerFault::KeySequence)
        );
        Ok(())
    }

    #[test]
    fn different_id_is_a_session_change() -> TestResult {
        let mut session = Session::new();
        session.observe("abc123")?;

        match session.observe("other") {
            Err(PollError::SessionChanged { expected, received }) => {
                assert_eq!(expected, SessionId::from_cookie("abc123"));
                assert_eq!(received, "other");
            }
            other => return Err(format!("unexpected result: {other:?}").into()),
        }

        // the established session is kept
        assert_eq!(session.id().map(SessionId::as_str), Some("abc123"));
        Ok(())
    }

    #[test]
    fn unknown_sentinel_before_session_is_a_session_change() {
        let mut session = Session::new();
        assert!(matches!(
            session.observe("-9:0"),
            Err(PollError::SessionChanged { expected: None, .. })
        ));
    }
}
