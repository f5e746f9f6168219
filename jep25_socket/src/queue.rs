//! Outbound write queue shared between callers and the poll loop.
//!
//! One lock guards the pending writes together with the connection
//! lifecycle, so a write can never slip in between "no worker yet" and
//! "start a worker":
//!
//! ```text
//! enqueue() ──lock──► connected? ──► pending.push_back ──► worker NotStarted? ──► Running (spawn)
//!                                                 └──► wake.notify_waiters()
//!
//! poll loop ──lock──► closing? / pending empty? ──► wait(interval) or proceed
//!           ──lock──► drain pending (snapshot)
//! ```
//!
//! Nothing holds the lock across I/O.

use core::time::Duration;
use std::collections::VecDeque;

use async_lock::Mutex;
use tokio::sync::Notify;

use crate::{error::SocketError, session::SessionId};

/// Lifecycle of the poll loop of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Connected, but nothing has been written yet.
    NotStarted,

    /// The poll loop is running.
    Running,

    /// The poll loop has exited.
    Terminated,
}

#[derive(Debug)]
struct QueueState {
    pending: VecDeque<Vec<u8>>,
    connected: bool,
    closing: bool,
    worker: WorkerState,
    session_id: Option<SessionId>,
    done: Option<async_channel::Receiver<()>>,
}

/// Thread-safe FIFO of pending writes, plus the lifecycle flags the poll
/// loop checks between exchanges.
#[derive(Debug)]
pub struct WriteQueue {
    state: Mutex<QueueState>,
    wake: Notify,
}

impl WriteQueue {
    /// An empty, unconnected queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                pending: VecDeque::new(),
                connected: false,
                closing: false,
                worker: WorkerState::NotStarted,
                session_id: None,
                done: None,
            }),
            wake: Notify::new(),
        }
    }

    /// Take every pending write, in enqueue order.
    ///
    /// Writes enqueued after the snapshot is taken stay queued for the next
    /// call.
    pub async fn drain_all(&self) -> Vec<Vec<u8>> {
        self.state.lock().await.pending.drain(..).collect()
    }

    /// Number of writes waiting to be sent.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock_blocking().pending.len()
    }

    /// Whether no writes are waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The current worker state.
    #[must_use]
    pub fn worker_state(&self) -> WorkerState {
        self.state.lock_blocking().worker
    }

    /// The session ID adopted by the current poll loop.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.state.lock_blocking().session_id.clone()
    }

    /// Whether the socket accepts writes.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.lock_blocking().connected
    }

    /// Reset the queue for a new connection.
    pub(crate) fn connect(&self) -> Result<(), SocketError> {
        let mut state = self.state.lock_blocking();
        if state.worker == WorkerState::Running {
            return Err(SocketError::AlreadyConnected);
        }

        state.pending.clear();
        state.connected = true;
        state.closing = false;
        state.worker = WorkerState::NotStarted;
        state.session_id = None;
        state.done = None;
        Ok(())
    }

    /// Append a caller's write and wake the poll loop.
    ///
    /// Returns the completion sender when the caller must start the poll
    /// loop; the loop holds it until it exits.
    pub(crate) fn enqueue(
        &self,
        data: Vec<u8>,
    ) -> Result<Option<async_channel::Sender<()>>, SocketError> {
        let start = {
            let mut state = self.state.lock_blocking();
            if !state.connected {
                return Err(SocketError::NotConnected);
            }

            state.pending.push_back(data);

            (state.worker == WorkerState::NotStarted).then(|| {
                let (done_tx, done_rx) = async_channel::bounded(1);
                state.worker = WorkerState::Running;
                state.done = Some(done_rx);
                done_tx
            })
        };

        self.wake.notify_waiters();
        Ok(start)
    }

    /// Stop accepting writes and tell the poll loop to exit.
    ///
    /// Returns `true` if the connection was open.
    pub(crate) fn close(&self) -> bool {
        let was_open = {
            let mut state = self.state.lock_blocking();
            let was_open = state.connected;
            state.connected = false;
            state.closing = true;
            was_open
        };

        self.wake.notify_waiters();
        was_open
    }

    /// Wait until there is something to send, `timeout` elapses, or the
    /// socket closes.
    ///
    /// Returns `false` if the poll loop should exit.
    pub(crate) async fn wait(&self, timeout: Duration) -> bool {
        // Registered before the check, so a write landing in between still
        // wakes us.
        let notified = self.wake.notified();

        {
            let state = self.state.lock().await;
            if state.closing {
                return false;
            }
            if !state.pending.is_empty() {
                return true;
            }
        }

        if tokio::time::timeout(timeout, notified).await.is_err() {
            tracing::trace!(?timeout, "poll interval elapsed");
        }

        !self.state.lock().await.closing
    }

    pub(crate) async fn adopt_session(&self, id: SessionId) {
        self.state.lock().await.session_id = Some(id);
    }

    /// Mark the poll loop as exited.
    pub(crate) async fn terminate(&self) {
        let mut state = self.state.lock().await;
        state.worker = WorkerState::Terminated;
        state.connected = false;
        state.pending.clear();
    }

    /// A receiver that closes when the current poll loop exits.
    pub(crate) fn done_signal(&self) -> Option<async_channel::Receiver<()>> {
        self.state.lock_blocking().done.clone()
    }
}

impl Default for WriteQueue {
    fn default() -> Self {
        Self::new()
    }
}
