//! Shared fixtures: a scripted HTTP backend and a recording listener.

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex, OnceLock,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use futures::{FutureExt, future::BoxFuture};
use jep25_socket::{
    PollError, PollOptions, PollingSocket, SocketEventListener,
    http_client::{HttpClient, HttpResponse, TransportError},
    session::ServerFault,
};
use rand::{SeedableRng, rngs::StdRng};
use tokio::time::Instant;
use url::Url;

pub fn init_tracing() {
    static ONCE: OnceLock<()> = OnceLock::new();
    ONCE.get_or_init(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

// ─── Scripted HTTP backend ───────────────────────────────────────────────────

/// Transport failure injected by a script.
#[derive(Debug, Clone, thiserror::Error)]
#[error("scripted transport failure (keep-alive: {keep_alive})")]
pub struct FakeError {
    pub keep_alive: bool,
}

impl TransportError for FakeError {
    fn is_keep_alive_failure(&self) -> bool {
        self.keep_alive
    }
}

/// A request the socket sent.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub at: Instant,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    /// Everything after the authentication header.
    pub fn payload(&self) -> &[u8] {
        let start = self
            .body
            .iter()
            .position(|b| *b == b',')
            .map_or(self.body.len(), |i| i + 1);
        &self.body[start..]
    }

    pub fn body_str(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug)]
struct Script {
    responses: VecDeque<Result<HttpResponse, FakeError>>,
    idle: HttpResponse,
    requests: Vec<Recorded>,
}

/// Answers requests from a queue of canned responses, then with an empty
/// `200` carrying the idle session cookie.
#[derive(Debug, Clone)]
pub struct ScriptedHttp {
    script: Arc<Mutex<Script>>,
}

pub fn ok(session: &str, body: &[u8]) -> HttpResponse {
    HttpResponse {
        status: 200,
        body: body.to_vec(),
        headers: vec![("set-cookie".into(), format!("ID={session}; Path=/"))],
    }
}

impl ScriptedHttp {
    pub fn new(idle_session: &str) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                responses: VecDeque::new(),
                idle: ok(idle_session, b""),
                requests: Vec::new(),
            })),
        }
    }

    pub fn respond(&self, response: HttpResponse) -> &Self {
        self.script.lock().unwrap().responses.push_back(Ok(response));
        self
    }

    pub fn respond_ok(&self, session: &str, body: &[u8]) -> &Self {
        self.respond(ok(session, body))
    }

    pub fn fail(&self, keep_alive: bool) -> &Self {
        self.script
            .lock()
            .unwrap()
            .responses
            .push_back(Err(FakeError { keep_alive }));
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.script.lock().unwrap().requests.clone()
    }
}

impl HttpClient for ScriptedHttp {
    type Error = FakeError;

    fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: Vec<u8>,
    ) -> BoxFuture<'_, Result<HttpResponse, Self::Error>> {
        let mut script = self.script.lock().unwrap();
        script.requests.push(Recorded {
            at: Instant::now(),
            url: url.to_owned(),
            headers: headers
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            body,
        });
        let result = script
            .responses
            .pop_front()
            .unwrap_or_else(|| Ok(script.idle.clone()));
        futures::future::ready(result).boxed()
    }
}

// ─── Recording listener ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connect,
    Read(Vec<u8>),
    Write(Vec<u8>),
    Close,
    Error {
        fault: Option<ServerFault>,
        message: String,
    },
}

#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<Event>>,
    reject: AtomicBool,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rejecting() -> Arc<Self> {
        let listener = Self::default();
        listener.reject.store(true, Ordering::SeqCst);
        Arc::new(listener)
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<(Option<ServerFault>, String)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Error { fault, message } => Some((fault, message)),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl SocketEventListener for RecordingListener {
    fn on_connect(&self) {
        self.push(Event::Connect);
    }

    fn on_read(&self, data: &[u8]) -> bool {
        self.push(Event::Read(data.to_vec()));
        !self.reject.load(Ordering::SeqCst)
    }

    fn on_write(&self, data: &[u8]) {
        self.push(Event::Write(data.to_vec()));
    }

    fn on_close(&self) {
        self.push(Event::Close);
    }

    fn on_error(&self, error: &PollError) {
        self.push(Event::Error {
            fault: error.server_fault(),
            message: error.to_string(),
        });
    }
}

/// Poll `listener` until `pred` holds.
pub async fn wait_for(listener: &RecordingListener, pred: impl Fn(&[Event]) -> bool) -> Vec<Event> {
    for _ in 0..10_000 {
        let events = listener.events();
        if pred(&events) {
            return events;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition never held; events: {:?}", listener.events());
}

// ─── Socket construction ─────────────────────────────────────────────────────

pub const POLL_URL: &str = "http://jabber.example.com/http-poll/";

pub fn options(num_keys: usize) -> PollOptions {
    PollOptions::new(Url::parse(POLL_URL).unwrap()).with_num_keys(num_keys)
}

pub type TestSocket = PollingSocket<ScriptedHttp, RecordingListener, StdRng>;

pub fn socket(options: PollOptions, http: &ScriptedHttp, listener: &Arc<RecordingListener>) -> TestSocket {
    init_tracing();
    PollingSocket::with_runtime(
        options,
        http.clone(),
        listener.clone(),
        tokio::runtime::Handle::current(),
        StdRng::seed_from_u64(25),
    )
}
