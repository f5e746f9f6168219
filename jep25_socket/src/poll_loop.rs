//! Background task driving one polling connection.
//!
//! Each cycle sends everything written since the previous cycle (possibly
//! nothing) under a fresh authentication header, checks the `ID` cookie,
//! and hands the response body to the listener. The loop stops on the first
//! fatal error, when the listener rejects data, or when the socket closes.

use std::sync::Arc;

use rand::{CryptoRng, RngCore};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::{
    CONTENT_TYPE, SESSION_COOKIE,
    error::PollError,
    header::Authenticator,
    http_client::{HttpClient, HttpResponse, TransportError},
    interval::PollInterval,
    queue::WriteQueue,
    session::Session,
    socket::SocketEventListener,
};

/// What the loop does after a successful cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// State owned by the poll loop task.
pub(crate) struct PollLoop<H, L, R> {
    http: H,
    url: Url,
    listener: Arc<L>,
    queue: Arc<WriteQueue>,
    authenticator: Authenticator<R>,
    interval: PollInterval,
    session: Session,
}

impl<H, L, R> PollLoop<H, L, R>
where
    H: HttpClient,
    L: SocketEventListener,
    R: RngCore + CryptoRng,
{
    pub(crate) fn new(
        http: H,
        url: Url,
        listener: Arc<L>,
        queue: Arc<WriteQueue>,
        authenticator: Authenticator<R>,
        interval: PollInterval,
    ) -> Self {
        Self {
            http,
            url,
            listener,
            queue,
            authenticator,
            interval,
            session: Session::new(),
        }
    }

    /// Run until the connection ends.
    ///
    /// `done` is dropped on exit, which closes the channel
    /// [`PollingSocket::join`](crate::PollingSocket::join) waits on.
    pub(crate) async fn run(mut self, done: async_channel::Sender<()>) {
        info!(url = %self.url, "starting poll loop");

        while self.queue.wait(self.interval.current()).await {
            match self.cycle().await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop) => break,
                Err(e) => {
                    error!(error = %e, "poll loop failed");
                    self.listener.on_error(&e);
                    break;
                }
            }
        }

        self.queue.terminate().await;
        drop(done);
        info!(
            session_id = ?self.session.id().map(ToString::to_string),
            "poll loop exited"
        );
    }

    async fn cycle(&mut self) -> Result<Flow, PollError> {
        let header = self.authenticator.next_header(self.session.id())?;
        let payload = self.queue.drain_all().await.concat();

        let mut body = header.to_body_prefix();
        body.extend_from_slice(&payload);
        trace!(%header, payload_len = payload.len(), "sending poll request");

        let bytes_out = body.len();
        let response = exchange(&self.http, &self.url, body).await?;
        if response.status != 200 {
            return Err(PollError::UnexpectedStatus(response.status));
        }
        debug!(
            session_id = ?self.session.id().map(ToString::to_string),
            bytes_out,
            bytes_in = response.body.len(),
            "poll exchange complete"
        );

        let cookie = response
            .cookie(SESSION_COOKIE)
            .filter(|value| !value.is_empty())
            .ok_or(PollError::MissingSessionCookie)?;

        if self.session.observe(cookie)?
            && let Some(id) = self.session.id()
        {
            info!(session_id = %id, "session established");
            self.queue.adopt_session(id.clone()).await;
        }

        if !payload.is_empty() {
            self.listener.on_write(&payload);
        }

        if response.body.is_empty() {
            let next = self.interval.back_off();
            debug!(?next, "empty response, backing off");
            return Ok(Flow::Continue);
        }

        if self.listener.on_read(&response.body) {
            self.interval.reset();
            Ok(Flow::Continue)
        } else {
            info!("listener rejected inbound data, closing");
            if self.queue.close() {
                self.listener.on_close();
            }
            Ok(Flow::Stop)
        }
    }
}

/// POST `body`, resending it for as long as the failure is a dropped
/// keep-alive connection.
async fn exchange<H: HttpClient>(
    http: &H,
    url: &Url,
    body: Vec<u8>,
) -> Result<HttpResponse, PollError> {
    let headers = [("Content-Type", CONTENT_TYPE)];
    loop {
        match http.post(url.as_str(), &headers, body.clone()).await {
            Ok(response) => return Ok(response),
            Err(e) if e.is_keep_alive_failure() => {
                warn!(error = %e, "keep-alive connection dropped, resending");
            }
            Err(e) => return Err(PollError::Transport(Box::new(e))),
        }
    }
}

impl<H, L, R> core::fmt::Debug for PollLoop<H, L, R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PollLoop")
            .field("url", &self.url.as_str())
            .field("interval", &self.interval)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
