//! Message body framing.
//!
//! Determines how the body of a received message is delimited, following
//! [RFC 9112 Section 6.3](https://www.rfc-editor.org/rfc/rfc9112#section-6.3).
//! The framing fields are removed from the headers once they are consumed,
//! callers only ever see the decoded body.

use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderValue, Method, StatusCode};

use crate::ensure;
use crate::protocol::{ParseError, PayloadSize};

/// Framing of a request body.
///
/// `CONNECT` turns the connection into a tunnel. Otherwise a request without
/// a declared length has no body.
pub fn request_payload(method: &Method, headers: &mut HeaderMap) -> Result<PayloadSize, ParseError> {
    if method == Method::CONNECT {
        return Ok(PayloadSize::Remainder);
    }

    parse_payload(headers, false)
}

/// Framing of a response body, which also depends on the request method.
pub fn response_payload(method: &Method, status: StatusCode, headers: &mut HeaderMap) -> Result<PayloadSize, ParseError> {
    if method == Method::HEAD
        || status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED
    {
        return Ok(PayloadSize::Empty);
    }

    if method == Method::CONNECT && status.is_success() {
        return Ok(PayloadSize::Remainder);
    }

    parse_payload(headers, true)
}

/// Framing from the headers alone.
///
/// `remainder` decides what happens without `transfer-encoding` or
/// `content-length`: read until the stream closes (responses) or no body (requests).
///
/// # Errors
///
/// Returns `ParseError::BadRequest` if:
/// - Both Content-Length and Transfer-Encoding headers are present
/// - A Content-Length value is not a plain decimal number
/// - Several Content-Length values disagree
pub fn parse_payload(headers: &mut HeaderMap, remainder: bool) -> Result<PayloadSize, ParseError> {
    // refer: https://www.rfc-editor.org/rfc/rfc9112.html#name-transfer-encoding
    let te_present = headers.contains_key(TRANSFER_ENCODING);
    let cl_present = headers.contains_key(CONTENT_LENGTH);

    match (te_present, cl_present) {
        (true, true) => Err(ParseError::bad_request("transfer-encoding and content-length both present in headers")),

        (true, false) => {
            let chunked = is_chunked(headers.get_all(TRANSFER_ENCODING).iter());
            headers.remove(TRANSFER_ENCODING);

            if chunked {
                Ok(PayloadSize::Chunked)
            } else {
                // unknown codings can only be delimited by closing the connection
                Ok(PayloadSize::Remainder)
            }
        }

        (false, true) => {
            let length = content_length(headers)?;
            headers.remove(CONTENT_LENGTH);

            if length == 0 {
                Ok(PayloadSize::Empty)
            } else {
                Ok(PayloadSize::Length(length))
            }
        }

        (false, false) if remainder => Ok(PayloadSize::Remainder),
        (false, false) => Ok(PayloadSize::Empty),
    }
}

/// Parses every `content-length` value, all of which must be equal.
fn content_length(headers: &HeaderMap) -> Result<u64, ParseError> {
    let mut length = None;

    for value in headers.get_all(CONTENT_LENGTH) {
        for item in value.as_bytes().split(|b| *b == b',') {
            let parsed = parse_length(item.trim_ascii())?;
            ensure!(
                length.is_none_or(|length| length == parsed),
                ParseError::bad_request("conflicting content-length values")
            );
            length = Some(parsed);
        }
    }

    length.ok_or_else(|| ParseError::bad_request("empty content-length"))
}

/// Only `1*DIGIT` is accepted, no sign, no whitespace, no radix prefix.
fn parse_length(bytes: &[u8]) -> Result<u64, ParseError> {
    let invalid = || ParseError::bad_request(format!("invalid content-length: {:?}", String::from_utf8_lossy(bytes)));

    ensure!(!bytes.is_empty() && bytes.iter().all(u8::is_ascii_digit), invalid());

    bytes
        .iter()
        .try_fold(0u64, |length, digit| length.checked_mul(10)?.checked_add(u64::from(digit - b'0')))
        .ok_or_else(invalid)
}

/// Checks if the Transfer-Encoding values indicate chunked encoding.
///
/// According to RFC 9112, chunked must be the last encoding if present,
/// so only the final item of the final field is inspected.
fn is_chunked<'a>(mut values: impl DoubleEndedIterator<Item = &'a HeaderValue>) -> bool {
    const CHUNKED: &[u8] = b"chunked";
    if let Some(value) = values.next_back() {
        if let Some(bytes) = value.as_bytes().rsplit(|b| *b == b',').next() {
            return bytes.trim_ascii().eq_ignore_ascii_case(CHUNKED);
        }
    }
    false
}
