//! Connection persistence rules.
//!
//! Whether a connection may carry another exchange after the current one
//! depends only on the message head: the version, the request method and
//! the `connection` header.

use http::header::CONNECTION;
use http::{HeaderMap, Method, Version};

/// Decides if the exchange described by the given head leaves the connection reusable.
///
/// - `CONNECT` never does, the connection becomes a tunnel.
/// - HTTP/1.1 is persistent unless a `connection: close` token is present.
/// - Older versions are persistent only with an explicit `connection: keep-alive`.
///
/// Token matching is case-insensitive and looks at every comma separated
/// value of every `connection` header.
pub fn is_persistent(version: Version, method: &Method, headers: &HeaderMap) -> bool {
    if method == Method::CONNECT {
        return false;
    }

    match version {
        Version::HTTP_11 => !has_connection_token(headers, "close"),
        _ => has_connection_token(headers, "keep-alive"),
    }
}

/// Returns true if any `connection` header value lists `token`.
pub fn has_connection_token(headers: &HeaderMap, token: &str) -> bool {
    headers
        .get_all(CONNECTION)
        .iter()
        .flat_map(|value| value.as_bytes().split(|b| *b == b','))
        .any(|item| item.trim_ascii().eq_ignore_ascii_case(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    fn connection(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn http11_defaults_to_persistent() {
        assert!(is_persistent(Version::HTTP_11, &Method::GET, &HeaderMap::new()));
        assert!(is_persistent(Version::HTTP_11, &Method::GET, &connection("keep-alive")));
        assert!(!is_persistent(Version::HTTP_11, &Method::GET, &connection("close")));
        assert!(!is_persistent(Version::HTTP_11, &Method::GET, &connection("Close")));
        assert!(!is_persistent(Version::HTTP_11, &Method::GET, &connection("upgrade, close")));
    }

    #[test]
    fn http10_requires_keep_alive() {
        assert!(!is_persistent(Version::HTTP_10, &Method::GET, &HeaderMap::new()));
        assert!(is_persistent(Version::HTTP_10, &Method::GET, &connection("keep-alive")));
        assert!(is_persistent(Version::HTTP_10, &Method::GET, &connection("Keep-Alive")));
        assert!(!is_persistent(Version::HTTP_10, &Method::GET, &connection("close")));
    }

    #[test]
    fn connect_is_never_persistent() {
        assert!(!is_persistent(Version::HTTP_11, &Method::CONNECT, &HeaderMap::new()));
        assert!(!is_persistent(Version::HTTP_10, &Method::CONNECT, &connection("keep-alive")));
    }

    #[test]
    fn token_is_not_a_substring_match() {
        assert!(is_persistent(Version::HTTP_11, &Method::GET, &connection("closed")));
    }
}
