//! The generic socket contract shared by all client transports.
//!
//! The stanza layer above talks to a [`Socket`] and receives events through
//! a [`SocketEventListener`]; it does not care whether bytes travel over raw
//! TCP, TLS or HTTP polling.

use core::fmt;

use crate::error::{PollError, SocketError};

/// Host and port a socket is asked to connect to.
///
/// Transports that address their peer some other way (such as the polling
/// URL) only use this for logging.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    host: String,
    port: u16,
}

impl Address {
    /// Create an address.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The host name.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Operations some transports cannot perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnsupportedOperation {
    /// Listening for inbound connections.
    Accept,

    /// Waiting for the next inbound connection.
    RequestAccept,

    /// Upgrading the connection to TLS in place.
    StartTls,
}

impl fmt::Display for UnsupportedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Accept => "Accept",
            Self::RequestAccept => "RequestAccept",
            Self::StartTls => "StartTLS",
        })
    }
}

/// Receives socket events.
///
/// Callbacks run on the transport's worker, one at a time.
pub trait SocketEventListener: Send + Sync + 'static {
    /// The socket is connected and ready for writes.
    fn on_connect(&self);

    /// Bytes arrived from the peer.
    ///
    /// Return `false` to reject them; the socket closes.
    fn on_read(&self, data: &[u8]) -> bool;

    /// Bytes previously written were sent to the peer.
    fn on_write(&self, data: &[u8]);

    /// The socket was closed.
    fn on_close(&self);

    /// The connection failed and will not deliver further events.
    fn on_error(&self, error: &PollError);
}

/// A client byte-stream socket.
pub trait Socket {
    /// Open the connection.
    ///
    /// # Errors
    ///
    /// Returns a [`SocketError`] if the socket is misconfigured or busy.
    fn connect(&self, address: &Address) -> Result<(), SocketError>;

    /// Queue bytes for the peer. Never blocks on network I/O.
    ///
    /// # Errors
    ///
    /// Returns a [`SocketError`] if the socket is not connected.
    fn write(&self, data: &[u8]) -> Result<(), SocketError>;

    /// Close the connection.
    fn close(&self);

    /// Ask for the next inbound data.
    ///
    /// # Errors
    ///
    /// Returns a [`SocketError`] if the socket is not connected.
    fn request_read(&self) -> Result<(), SocketError>;

    /// Listen for inbound connections on `address`.
    ///
    /// # Errors
    ///
    /// Returns a [`SocketError`] if the transport cannot listen.
    fn accept(&self, address: &Address, backlog: usize) -> Result<(), SocketError>;

    /// Wait for the next inbound connection.
    ///
    /// # Errors
    ///
    /// Returns a [`SocketError`] if the transport cannot listen.
    fn request_accept(&self) -> Result<(), SocketError>;

    /// Upgrade the connection to TLS.
    ///
    /// # Errors
    ///
    /// Returns a [`SocketError`] if the transport cannot upgrade.
    fn start_tls(&self) -> Result<(), SocketError>;
}
