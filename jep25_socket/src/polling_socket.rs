//! A [`Socket`] that tunnels its byte stream through HTTP polling.
//!
//! ```text
//! connect ──► on_connect
//! write   ──► queue ──► (first write) spawn poll loop
//!                            │
//!                            ├─► POST <header>,<payload>  ──► on_write
//!                            ├─► 200 + body               ──► on_read
//!                            ├─► 200, empty body          ──► back off
//!                            └─► fatal                    ──► on_error, exit
//! close   ──► on_close, poll loop exits
//! ```
//!
//! Callers never block on the network: [`Socket::write`] only appends to the
//! queue. All HTTP traffic and listener callbacks happen on one tokio task
//! per connection.

use std::sync::Arc;

use async_lock::Mutex;
use jep25_keychain::KeyChainGenerator;
use rand::{CryptoRng, RngCore, SeedableRng, rngs::StdRng};
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::{
    error::{ConfigError, SocketError},
    header::Authenticator,
    http_client::HttpClient,
    options::PollOptions,
    poll_loop::PollLoop,
    queue::WriteQueue,
    session::SessionId,
    socket::{Address, Socket, SocketEventListener, UnsupportedOperation},
};

/// An HTTP polling socket.
///
/// `H` performs the HTTP exchanges, `L` receives the socket events and `R`
/// seeds the key chains.
pub struct PollingSocket<H, L, R = StdRng> {
    options: PollOptions,
    http: H,
    listener: Arc<L>,
    queue: Arc<WriteQueue>,
    runtime: Handle,
    rng: Mutex<R>,
}

impl<H: HttpClient, L: SocketEventListener> PollingSocket<H, L, StdRng> {
    /// Create a socket that runs its poll loop on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoRuntime`] when called outside a tokio
    /// runtime.
    pub fn new(options: PollOptions, http: H, listener: Arc<L>) -> Result<Self, ConfigError> {
        let runtime = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;
        Ok(Self::with_runtime(
            options,
            http,
            listener,
            runtime,
            StdRng::from_entropy(),
        ))
    }
}

#[cfg(feature = "reqwest")]
impl<L: SocketEventListener> PollingSocket<crate::http_client::reqwest_client::ReqwestHttpClient, L> {
    /// Create a socket backed by [`reqwest`], honouring the proxy and
    /// request timeout in `options`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the HTTP client cannot be built or no
    /// tokio runtime is running.
    pub fn reqwest(options: PollOptions, listener: Arc<L>) -> Result<Self, ConfigError> {
        let http = crate::http_client::reqwest_client::ReqwestHttpClient::from_options(&options)?;
        Self::new(options, http, listener)
    }
}

impl<H, L, R> PollingSocket<H, L, R>
where
    H: HttpClient,
    L: SocketEventListener,
    R: RngCore + CryptoRng + SeedableRng + Send + 'static,
{
    /// Create a socket with an explicit runtime and key-chain RNG.
    #[must_use]
    pub fn with_runtime(
        options: PollOptions,
        http: H,
        listener: Arc<L>,
        runtime: Handle,
        rng: R,
    ) -> Self {
        Self {
            options,
            http,
            listener,
            queue: Arc::new(WriteQueue::new()),
            runtime,
            rng: Mutex::new(rng),
        }
    }

    /// The socket's options.
    #[must_use]
    pub const fn options(&self) -> &PollOptions {
        &self.options
    }

    /// The event listener.
    #[must_use]
    pub const fn listener(&self) -> &Arc<L> {
        &self.listener
    }

    /// The session assigned by the server, once the first response arrived.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.queue.session_id()
    }

    /// Whether the socket accepts writes.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.queue.is_connected()
    }

    /// Wait for the current poll loop to exit.
    ///
    /// Returns immediately if no poll loop was started.
    pub async fn join(&self) {
        if let Some(done) = self.queue.done_signal() {
            while done.recv().await.is_ok() {}
        }
    }

    /// A generator for the next connection, seeded from the socket's RNG.
    fn fork_rng(&self) -> R {
        let mut seed = R::Seed::default();
        self.rng.lock_blocking().fill_bytes(seed.as_mut());
        R::from_seed(seed)
    }
}

impl<H, L, R> Socket for PollingSocket<H, L, R>
where
    H: HttpClient,
    L: SocketEventListener,
    R: RngCore + CryptoRng + SeedableRng + Send + 'static,
{
    fn connect(&self, address: &Address) -> Result<(), SocketError> {
        let url = self.options.validate()?;
        self.queue.connect()?;
        info!(%address, %url, "polling socket connected");
        self.listener.on_connect();
        Ok(())
    }

    fn write(&self, data: &[u8]) -> Result<(), SocketError> {
        let url = self.options.validate()?.clone();
        let Some(done) = self.queue.enqueue(data.to_vec())? else {
            return Ok(());
        };

        let authenticator = Authenticator::new(
            KeyChainGenerator::new(self.fork_rng()),
            self.options.num_keys,
        );
        let poll_loop = PollLoop::new(
            self.http.clone(),
            url,
            self.listener.clone(),
            self.queue.clone(),
            authenticator,
            self.options.interval(),
        );

        debug!("spawning poll loop");
        drop(self.runtime.spawn(poll_loop.run(done)));
        Ok(())
    }

    fn close(&self) {
        if self.queue.close() {
            info!("polling socket closed");
            self.listener.on_close();
        }
    }

    fn request_read(&self) -> Result<(), SocketError> {
        // Reads arrive with every poll response; there is nothing to request.
        if self.queue.is_connected() {
            Ok(())
        } else {
            Err(SocketError::NotConnected)
        }
    }

    fn accept(&self, _address: &Address, _backlog: usize) -> Result<(), SocketError> {
        Err(SocketError::Unsupported(UnsupportedOperation::Accept))
    }

    fn request_accept(&self) -> Result<(), SocketError> {
        Err(SocketError::Unsupported(UnsupportedOperation::RequestAccept))
    }

    fn start_tls(&self) -> Result<(), SocketError> {
        Err(SocketError::Unsupported(UnsupportedOperation::StartTls))
    }
}

impl<H, L, R> Drop for PollingSocket<H, L, R> {
    fn drop(&mut self) {
        if self.queue.close() {
            debug!("polling socket dropped while connected, stopping poll loop");
        }
    }
}

impl<H, L, R> core::fmt::Debug for PollingSocket<H, L, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PollingSocket")
            .field("options", &self.options)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}
