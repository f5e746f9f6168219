//! Generic HTTP client trait for the polling transport.
//!
//! The poll loop only ever issues POST requests and reads the status, the
//! body, and the `ID` cookie of the response, so that is all this trait
//! exposes. Connection pooling, TLS, proxies and timeouts are the backend's
//! business.

use futures::future::BoxFuture;

#[cfg(feature = "reqwest")]
pub mod reqwest_client;

/// Errors an [`HttpClient`] can report.
pub trait TransportError: core::error::Error + Send + Sync + 'static {
    /// Whether the failure is a dropped keep-alive connection.
    ///
    /// Such requests never reached the server, so the poll loop resends the
    /// same body instead of giving up.
    fn is_keep_alive_failure(&self) -> bool;
}

/// A minimal async HTTP client for POST requests.
pub trait HttpClient: Clone + Send + Sync + 'static {
    /// The error type for HTTP operations.
    type Error: TransportError;

    /// Send an HTTP POST request and return the response.
    fn post(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: Vec<u8>,
    ) -> BoxFuture<'_, Result<HttpResponse, Self::Error>>;
}

/// A minimal HTTP response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub status: u16,

    /// The response body bytes.
    pub body: Vec<u8>,

    /// Response headers (lowercase keys), in the order received.
    pub headers: Vec<(String, String)>,
}

impl HttpResponse {
    /// The value of cookie `name` set by this response.
    ///
    /// When several `Set-Cookie` headers name the same cookie the last one
    /// wins, as it would in a cookie jar.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .filter(|(k, _)| k == "set-cookie")
            .find_map(|(_, v)| {
                let pair = v.split(';').next()?;
                let (cookie, value) = pair.split_once('=')?;
                (cookie.trim() == name).then(|| value.trim().trim_matches('"'))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(headers: &[(&str, &str)]) -> HttpResponse {
        HttpResponse {
            status: 200,
            body: Vec::new(),
            headers: headers
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        }
    }

    #[test]
    fn cookie_ignores_attributes() {
        let resp = response(&[("set-cookie", "ID=abc123; Path=/; HttpOnly")]);
        assert_eq!(resp.cookie("ID"), Some("abc123"));
    }

    #[test]
    fn cookie_picks_the_named_cookie() {
        let resp = response(&[
            ("set-cookie", "lang=en"),
            ("set-cookie", "ID=-3:0"),
        ]);
        assert_eq!(resp.cookie("ID"), Some("-3:0"));
        assert_eq!(resp.cookie("lang"), Some("en"));
        assert_eq!(resp.cookie("IDX"), None);
    }

    #[test]
    fn last_cookie_wins() {
        let resp = response(&[("set-cookie", "ID=old"), ("set-cookie", "ID=\"new\"")]);
        assert_eq!(resp.cookie("ID"), Some("new"));
    }

    #[test]
    fn empty_cookie_value_is_reported_as_empty() {
        let resp = response(&[("set-cookie", "ID=; Max-Age=0")]);
        assert_eq!(resp.cookie("ID"), Some(""));
    }
}
