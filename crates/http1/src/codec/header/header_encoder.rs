//! Serialization of start lines and header fields.
//!
//! Every name and value is validated before a single byte lands in the
//! destination buffer, so a rejected field never reaches the peer.

use std::io;
use std::io::Write;

use bytes::{BufMut, BytesMut};
use http::{Method, StatusCode, Version};
use tracing::error;

use crate::codec::header::grammar::{is_field_value, is_request_target, is_token};
use crate::ensure;
use crate::protocol::{PayloadSize, SendError};

/// Initial buffer size reserved for a message head
const INIT_HEADER_SIZE: usize = 1024;

/// Returns the on-wire name of a version this codec can send.
pub fn version_str(version: Version) -> Result<&'static str, SendError> {
    match version {
        Version::HTTP_11 => Ok("HTTP/1.1"),
        Version::HTTP_10 => Ok("HTTP/1.0"),
        v => {
            error!(http_version = ?v, "unsupported http version");
            Err(SendError::invalid_request(format!("unsupported http version {v:?}")))
        }
    }
}

/// Writes `METHOD SP target SP version CRLF`.
pub fn write_request_line(method: &Method, target: &str, version: Version, dst: &mut BytesMut) -> Result<(), SendError> {
    ensure!(is_token(method.as_str().as_bytes()), SendError::invalid_request(format!("invalid method {method}")));
    ensure!(is_request_target(target.as_bytes()), SendError::invalid_request(format!("invalid request target {target:?}")));
    let version = version_str(version)?;

    dst.reserve(INIT_HEADER_SIZE);
    write!(FastWrite(dst), "{method} {target} {version}\r\n")?;
    Ok(())
}

/// Writes `version SP status SP reason CRLF`, the reason defaulting to the canonical one.
pub fn write_status_line(version: Version, status: StatusCode, reason: Option<&str>, dst: &mut BytesMut) -> Result<(), SendError> {
    let version = version_str(version)?;
    let reason = reason.or(status.canonical_reason()).unwrap_or_default();
    ensure!(is_field_value(reason.as_bytes()), SendError::bad_header(format!("invalid reason phrase {reason:?}")));

    dst.reserve(INIT_HEADER_SIZE);
    write!(FastWrite(dst), "{version} {} {reason}\r\n", status.as_str())?;
    Ok(())
}

/// Writes a single `name: value CRLF` field.
pub fn write_header(name: &[u8], value: &[u8], dst: &mut BytesMut) -> Result<(), SendError> {
    ensure!(is_token(name), SendError::bad_header(format!("invalid header name {:?}", String::from_utf8_lossy(name))));
    ensure!(
        is_field_value(value),
        SendError::bad_header(format!("invalid value for header {:?}", String::from_utf8_lossy(name)))
    );

    dst.reserve(name.len() + value.len() + 4);
    dst.put_slice(name);
    dst.put_slice(b": ");
    dst.put_slice(value);
    dst.put_slice(b"\r\n");
    Ok(())
}

/// Writes every field in iteration order.
///
/// Accepts anything that yields name/value pairs, including `&HeaderMap`
/// and slices of string tuples.
pub fn write_headers<I, K, V>(headers: I, dst: &mut BytesMut) -> Result<(), SendError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<[u8]>,
    V: AsRef<[u8]>,
{
    for (name, value) in headers {
        write_header(name.as_ref(), value.as_ref(), dst)?;
    }
    Ok(())
}

/// Writes the framing field that matches the payload size.
///
/// Remainder payloads are delimited by closing the stream and carry no field.
pub fn write_payload_size(payload_size: PayloadSize, dst: &mut BytesMut) {
    match payload_size {
        PayloadSize::Length(n) => {
            // writing into BytesMut can't fail
            let _ = write!(FastWrite(dst), "content-length: {n}\r\n");
        }
        PayloadSize::Chunked => dst.put_slice(b"transfer-encoding: chunked\r\n"),
        PayloadSize::Empty => dst.put_slice(b"content-length: 0\r\n"),
        PayloadSize::Remainder => {}
    }
}

/// Fast writer implementation for writing to BytesMut.
///
/// This is an optimization to avoid unnecessary bounds checking when writing
/// to the bytes buffer, since we've already reserved enough space.
pub(crate) struct FastWrite<'a>(pub(crate) &'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
