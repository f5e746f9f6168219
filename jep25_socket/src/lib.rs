//! # JEP-0025 HTTP Polling Socket
//!
//! A byte-stream socket emulated on top of repeated HTTP POST exchanges,
//! for clients stuck behind proxies or firewalls that only let HTTP out.
//!
//! # Protocol
//!
//! Every request carries an authentication header, a comma, and whatever
//! bytes the application wrote since the previous request. The server
//! answers with an `ID` cookie and whatever bytes it has for the client:
//!
//! ```text
//! ┌──────────┐                                   ┌──────────┐
//! │  Client   │                                   │  Server   │
//! └────┬─────┘                                   └────┬─────┘
//!      │  POST  0;<k[N-1]>,<payload>                  │
//!      │ ───────────────────────────────────────────► │
//!      │  200   Set-Cookie: ID=<sid>   <payload>      │
//!      │ ◄─────────────────────────────────────────── │
//!      │                                              │
//!      │  POST  <sid>;<k[N-2]>,<payload>              │
//!      │ ───────────────────────────────────────────► │
//!      │  200   Set-Cookie: ID=<sid>                  │
//!      │ ◄─────────────────────────────────────────── │
//!      │              ...                             │
//!      │  POST  <sid>;<k[0]>;<k'[N-1]>,<payload>      │  new chain
//!      │ ───────────────────────────────────────────► │
//!      │  200   Set-Cookie: ID=-3:0                   │  key sequence error
//!      │ ◄─────────────────────────────────────────── │
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     PollingSocket                         │
//! │                                                          │
//! │  write(bytes) ──► WriteQueue ──(wake)──► poll loop task  │
//! │                                          │               │
//! │                     Authenticator ◄──────┤ header        │
//! │                     HttpClient    ◄──────┤ POST          │
//! │                     Session       ◄──────┤ ID cookie     │
//! │                     PollInterval  ◄──────┘ backoff       │
//! │                                                          │
//! │  listener.on_read / on_write / on_error ◄── poll loop    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - `reqwest`: [`ReqwestHttpClient`](http_client::reqwest_client::ReqwestHttpClient),
//!   the default HTTP backend (enabled by default)

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    clippy::dbg_macro,
    clippy::expect_used,
    clippy::missing_const_for_fn,
    clippy::panic,
    clippy::todo,
    clippy::unwrap_used,
    future_incompatible,
    let_underscore,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style
)]
#![deny(
    clippy::all,
    clippy::pedantic,
    rust_2018_idioms,
    unreachable_pub,
    unused_extern_crates
)]
#![forbid(unsafe_code)]

pub mod error;
pub mod header;
pub mod http_client;
pub mod interval;
pub mod options;
pub mod polling_socket;
pub mod queue;
pub mod session;
pub mod socket;

mod poll_loop;

pub use error::{ConfigError, PollError, SocketError};
pub use options::PollOptions;
pub use polling_socket::PollingSocket;
pub use socket::{Address, Socket, SocketEventListener};

/// Content type of every polling request.
pub const CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Name of the cookie carrying the session ID.
pub const SESSION_COOKIE: &str = "ID";

/// Default minimum time between polls, in seconds.
pub const DEFAULT_MIN_POLL_SECS: u64 = 1;

/// Default maximum time between polls, in seconds.
pub const DEFAULT_MAX_POLL_SECS: u64 = 30;

/// Default number of keys generated per chain.
pub const DEFAULT_NUM_KEYS: usize = jep25_keychain::DEFAULT_CHAIN_LEN;
