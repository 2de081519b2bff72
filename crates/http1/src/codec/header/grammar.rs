//! Byte level grammar for HTTP/1 message heads.
//!
//! Implements the RFC 9110/9112 rules used on both sides of the connection:
//! tokens for methods and field names, field values, request targets and the
//! start lines. All checks are table driven.

use http::{HeaderName, HeaderValue, Method, StatusCode, Version};

use crate::ensure;
use crate::protocol::ParseError;

/// `tchar` from RFC 9110 section 5.6.2
static TOKEN_MAP: [bool; 256] = build_token_map();

/// Field value bytes: HTAB, visible ASCII, SP and obs-text. NUL, CR, LF and DEL are excluded.
static FIELD_VALUE_MAP: [bool; 256] = build_field_value_map();

const fn build_token_map() -> [bool; 256] {
    let mut map = [false; 256];
    let mut i = 0;
    while i < 256 {
        let b = i as u8;
        map[i] = matches!(b,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
            | b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z');
        i += 1;
    }
    map
}

const fn build_field_value_map() -> [bool; 256] {
    let mut map = [false; 256];
    let mut i = 0;
    while i < 256 {
        let b = i as u8;
        map[i] = b == b'\t' || (b >= 0x20 && b != 0x7f);
        i += 1;
    }
    map
}

#[inline]
pub fn is_token(bytes: &[u8]) -> bool {
    !bytes.is_empty() && bytes.iter().all(|b| TOKEN_MAP[*b as usize])
}

#[inline]
pub fn is_field_value(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| FIELD_VALUE_MAP[*b as usize])
}

/// Request targets are a single run of visible ASCII.
#[inline]
pub fn is_request_target(bytes: &[u8]) -> bool {
    !bytes.is_empty() && bytes.iter().all(|b| (0x21..0x7f).contains(b))
}

#[inline]
fn is_ows(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

fn trim_ows(mut bytes: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if !is_ows(*first) {
            break;
        }
        bytes = rest;
    }
    while let [rest @ .., last] = bytes {
        if !is_ows(*last) {
            break;
        }
        bytes = rest;
    }
    bytes
}

/// Parses `field-name ":" OWS field-value OWS`.
///
/// The name is lowercased by [`HeaderName`]. Obsolete line folding,
/// whitespace before the colon and control bytes in the value are rejected.
pub fn parse_header_line(line: &[u8]) -> Result<(HeaderName, HeaderValue), ParseError> {
    ensure!(
        !line.first().copied().is_some_and(is_ows),
        ParseError::bad_header("obsolete line folding is not supported")
    );

    let colon = line
        .iter()
        .position(|b| *b == b':')
        .ok_or_else(|| ParseError::bad_header(format!("could not parse header: {:?}", String::from_utf8_lossy(line))))?;

    let (name, rest) = line.split_at(colon);
    ensure!(is_token(name), ParseError::bad_header(format!("invalid header name: {:?}", String::from_utf8_lossy(name))));

    let value = trim_ows(&rest[1..]);
    ensure!(is_field_value(value), ParseError::bad_header(format!("invalid value for header {:?}", String::from_utf8_lossy(name))));

    let name = HeaderName::from_bytes(name).map_err(ParseError::bad_header)?;
    let value = HeaderValue::from_bytes(value).map_err(ParseError::bad_header)?;
    Ok((name, value))
}

/// Parses `method SP request-target SP HTTP-version`.
pub fn parse_request_line(line: &[u8]) -> Result<(Method, String, Version), ParseError> {
    let invalid = || ParseError::invalid_request(String::from_utf8_lossy(line));

    let mut parts = line.split(|b| *b == b' ');
    let (Some(method), Some(target), Some(version), None) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };

    ensure!(is_token(method), ParseError::invalid_method(method));
    ensure!(is_request_target(target), invalid());
    let version = parse_version(version).ok_or_else(invalid)?;

    let method = Method::from_bytes(method).map_err(|_| ParseError::invalid_method(method))?;
    let target = String::from_utf8(target.to_vec()).map_err(|_| invalid())?;
    Ok((method, target, version))
}

/// Parses `HTTP-version SP status-code [SP reason-phrase]`.
pub fn parse_status_line(line: &[u8]) -> Result<(Version, StatusCode, String), ParseError> {
    let invalid = || ParseError::bad_response(format!("invalid status line: {:?}", String::from_utf8_lossy(line)));

    let mut parts = line.splitn(3, |b| *b == b' ');
    let version = parts.next().and_then(parse_version).ok_or_else(invalid)?;

    let status = parts.next().ok_or_else(invalid)?;
    ensure!(status.len() == 3 && status.iter().all(u8::is_ascii_digit), invalid());
    let status = StatusCode::from_bytes(status).map_err(|_| invalid())?;

    let reason = parts.next().unwrap_or_default();
    ensure!(is_field_value(reason), invalid());

    Ok((version, status, String::from_utf8_lossy(reason).into_owned()))
}

/// Maps `HTTP/<major>.<minor>` to the versions this codec speaks.
pub fn parse_version(bytes: &[u8]) -> Option<Version> {
    match bytes {
        b"HTTP/1.1" => Some(Version::HTTP_11),
        b"HTTP/1.0" => Some(Version::HTTP_10),
        b"HTTP/0.9" => Some(Version::HTTP_09),
        _ => None,
    }
}
