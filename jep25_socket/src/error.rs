//! Error types for the HTTP polling transport.

use core::time::Duration;

use jep25_keychain::KeyChainError;
use thiserror::Error;

use crate::{
    session::{ServerFault, SessionId},
    socket::UnsupportedOperation,
};

/// Invalid or incomplete transport configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No polling URL was configured before connecting.
    #[error("no polling URL configured")]
    MissingUrl,

    /// The minimum poll interval is larger than the maximum.
    #[error("minimum poll interval {min:?} exceeds maximum {max:?}")]
    InvertedPollBounds {
        /// Configured minimum.
        min: Duration,
        /// Configured maximum.
        max: Duration,
    },

    /// A zero minimum poll interval would poll back to back.
    #[error("minimum poll interval must be non-zero")]
    ZeroPollInterval,

    /// Key chains this short cannot be linked to their successor.
    #[error("key chain length {0} is too short (need at least {min})", min = jep25_keychain::MIN_CHAIN_LEN)]
    TooFewKeys(usize),

    /// The proxy URL was rejected by the HTTP backend.
    #[error("invalid proxy: {0}")]
    Proxy(String),

    /// The HTTP backend could not be built.
    #[error("HTTP client error: {0}")]
    Client(String),

    /// No tokio runtime is available to run the poll loop on.
    #[error("no tokio runtime available")]
    NoRuntime,
}

/// Problem with a socket operation requested by the caller.
///
/// These are returned synchronously and never reach the listener.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SocketError {
    /// The configuration does not allow the operation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The socket is not connected.
    #[error("socket is not connected; call connect() first")]
    NotConnected,

    /// A poll loop from the previous connection is still running.
    #[error("a poll loop is still running; close and join it first")]
    AlreadyConnected,

    /// The polling transport does not support this operation.
    #[error("{0} is not supported by the HTTP polling transport")]
    Unsupported(UnsupportedOperation),
}

/// Fatal problem during a polling exchange.
///
/// Delivered exactly once through
/// [`SocketEventListener::on_error`](crate::socket::SocketEventListener::on_error);
/// the poll loop stops afterwards.
#[derive(Debug, Error)]
pub enum PollError {
    /// The HTTP request failed for a reason other than a keep-alive reset.
    #[error("HTTP request error: {0}")]
    Transport(#[source] Box<dyn core::error::Error + Send + Sync>),

    /// The server answered with a status other than 200.
    #[error("invalid HTTP status: {0}")]
    UnexpectedStatus(u16),

    /// The response had no usable `ID` cookie.
    #[error("no ID cookie returned")]
    MissingSessionCookie,

    /// The server reported an error through a sentinel `ID` value.
    #[error("server reported {0}")]
    Server(ServerFault),

    /// The `ID` cookie no longer matches the established session.
    #[error("ID cookie changed: expected {}, received {received}", .expected.as_ref().map_or("no session", SessionId::as_str))]
    SessionChanged {
        /// The session ID established earlier, if any.
        expected: Option<SessionId>,
        /// The value the server sent instead.
        received: String,
    },

    /// A fresh key chain could not be built.
    #[error("key chain error: {0}")]
    KeyChain(#[from] KeyChainError),
}

impl PollError {
    /// The sentinel fault, if the server reported one.
    #[must_use]
    pub const fn server_fault(&self) -> Option<ServerFault> {
        match self {
            Self::Server(fault) => Some(*fault),
            _ => None,
        }
    }
}
