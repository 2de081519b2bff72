use std::error::Error;
use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use http::header::HOST;
use http::{HeaderMap, Method, StatusCode, Version};
use http_body::Body as HttpBody;
use http_body_util::BodyExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace, warn};

use crate::codec::body::{framing, PayloadDecoder, PayloadEncoder};
use crate::codec::header::grammar::{parse_request_line, parse_status_line};
use crate::codec::header::{header_encoder, HeaderDecoder};
use crate::codec::LineDecoder;
use crate::connection::stream::Stream;
use crate::connection::State;
use crate::protocol::body::Body;
use crate::protocol::{
    is_persistent, HttpError, ParseError, PayloadItem, PayloadSize, Request, RequestHead, Response, ResponseHead, SendError,
};
use crate::upgrade::RawStream;
use crate::{ensure, Config};

/// An HTTP/1 connection over a bidirectional byte stream.
///
/// `HttpConnection` is symmetric: a server calls [`read_request`](Self::read_request)
/// then [`write_response`](Self::write_response) and [`write_body`](Self::write_body),
/// a client calls [`write_request`](Self::write_request), [`write_body`](Self::write_body)
/// then [`read_response`](Self::read_response). The connection tracks where the
/// exchange is (see [`State`]) and rejects operations that don't fit.
///
/// Bodies read from the connection borrow it mutably, so the next message can't
/// be read before the current body is finished, closed or dropped. Dropping an
/// unfinished body closes the read side and makes the connection non-persistent.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use http::{Method, StatusCode, Version};
/// use http_body_util::Full;
/// use micro_http1::connection::HttpConnection;
/// use tokio::io::AsyncWriteExt;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), micro_http1::protocol::HttpError> {
/// let (mut client, server) = tokio::io::duplex(1024);
/// client.write_all(b"GET /hello HTTP/1.1\r\nHost: localhost\r\n\r\n").await.unwrap();
///
/// let mut connection = HttpConnection::new(server);
/// let request = connection.read_request().await?.unwrap();
/// assert_eq!(request.target(), "/hello");
/// assert_eq!(request.authority(), Some("localhost"));
/// drop(request);
///
/// connection.write_response(Version::HTTP_11, StatusCode::OK, [("content-type", "text/plain")], None)?;
/// connection.write_body(Version::HTTP_11, Some(Full::new(Bytes::from("Hello World"))), false, None).await?;
/// assert!(connection.is_idle());
/// # Ok(())
/// # }
/// ```
pub struct HttpConnection<T> {
    stream: Option<Stream<T>>,
    config: Config,
    state: State,
    persistent: bool,
    upgraded: bool,
    hijacked: bool,
    // the response being written must not carry a body (1xx, 204, 304)
    bodyless: bool,
    count: usize,
}

impl<T> HttpConnection<T> {
    pub fn new(io: T) -> Self {
        Self::with_config(io, Config::default())
    }

    pub fn with_config(io: T, config: Config) -> Self {
        Self {
            stream: Some(Stream::new(io, config.get_block_size())),
            config,
            state: State::Idle,
            persistent: config.is_persistent(),
            upgraded: false,
            hijacked: false,
            bodyless: false,
            count: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    pub fn is_open(&self) -> bool {
        self.state == State::Open
    }

    pub fn is_half_closed_local(&self) -> bool {
        self.state == State::HalfClosedLocal
    }

    pub fn is_half_closed_remote(&self) -> bool {
        self.state == State::HalfClosedRemote
    }

    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    /// Whether the connection may carry another exchange after the current one.
    ///
    /// Starts from [`Config::persistent`] and only ever narrows while reading
    /// and writing messages.
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn set_persistent(&mut self, persistent: bool) {
        self.persistent = persistent;
    }

    /// Number of completed exchanges
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_hijacked(&self) -> bool {
        self.hijacked
    }

    /// Closes the read side: nothing more is decoded, the connection becomes
    /// non-persistent and the remote end of the exchange is considered finished.
    ///
    /// Input already read ahead stays buffered for [`hijack`](Self::hijack).
    pub fn close_read(&mut self) -> Result<(), HttpError> {
        self.persistent = false;
        if let Some(stream) = self.stream.as_mut() {
            stream.close_read();
        }
        self.receive_end_stream()
    }

    pub(crate) fn stream_mut(&mut self, operation: &'static str) -> Result<&mut Stream<T>, HttpError> {
        ensure!(!self.hijacked, HttpError::Hijacked { operation });
        match self.stream.as_mut() {
            Some(stream) => Ok(stream),
            None => Err(HttpError::protocol_state(self.state, operation)),
        }
    }

    fn ensure_state(&self, operation: &'static str, allowed: &[State]) -> Result<(), HttpError> {
        ensure!(!self.hijacked, HttpError::Hijacked { operation });
        ensure!(allowed.contains(&self.state), HttpError::protocol_state(self.state, operation));
        Ok(())
    }

    fn open(&mut self, operation: &'static str) -> Result<(), HttpError> {
        self.ensure_state(operation, &[State::Idle])?;
        self.state = State::Open;
        Ok(())
    }

    /// The local endpoint finished sending its message.
    pub(crate) fn send_end_stream(&mut self) -> Result<(), HttpError> {
        match self.state {
            State::Open => self.state = State::HalfClosedLocal,
            State::HalfClosedRemote => self.idle(),
            state => return Err(HttpError::protocol_state(state, "send end of stream")),
        }
        Ok(())
    }

    /// The peer finished sending its message.
    pub(crate) fn receive_end_stream(&mut self) -> Result<(), HttpError> {
        match self.state {
            State::Open => self.state = State::HalfClosedRemote,
            State::HalfClosedLocal => self.idle(),
            state => return Err(HttpError::protocol_state(state, "receive end of stream")),
        }
        Ok(())
    }

    /// Both directions are done, the exchange is complete.
    fn idle(&mut self) {
        self.count += 1;
        if self.persistent {
            trace!(count = self.count, "exchange complete, connection is idle");
            self.state = State::Idle;
        } else {
            debug!(count = self.count, "exchange complete, connection is not persistent");
            self.closed();
        }
    }

    fn closed(&mut self) {
        self.persistent = false;
        self.state = State::Closed;
        // an upgraded stream stays around so it can be hijacked
        if !self.upgraded && self.stream.take().is_some() {
            trace!("released stream");
        }
    }

    /// Buffers head bytes, discarding everything written by `f` if it fails.
    fn encode_head<F>(&mut self, operation: &'static str, f: F) -> Result<(), HttpError>
    where
        F: FnOnce(&mut BytesMut) -> Result<(), SendError>,
    {
        let buf = self.stream_mut(operation)?.write_buf();
        let mark = buf.len();
        if let Err(e) = f(buf) {
            buf.truncate(mark);
            return Err(e.into());
        }
        Ok(())
    }
}

impl<T> HttpConnection<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Reads one CRLF terminated line, `None` at a clean end of stream.
    pub async fn read_line(&mut self) -> Result<Option<Bytes>, HttpError> {
        let mut decoder = LineDecoder::new(self.config.get_max_line_length());
        let stream = self.stream_mut("read line")?;
        Ok(stream.decode(&mut decoder).await?)
    }

    /// Reads the request line of the next exchange, which opens the exchange.
    ///
    /// Together with [`read_headers`](Self::read_headers) and
    /// [`read_request_body`](Self::read_request_body) this lets a server act
    /// between the head and the body, for example to send `100 Continue`.
    pub async fn read_request_line(&mut self) -> Result<Option<(Method, String, Version)>, HttpError> {
        self.ensure_state("read request line", &[State::Idle])?;
        let Some(line) = self.read_line().await? else {
            return Ok(None);
        };

        let request_line = parse_request_line(&line)?;
        self.open("read request line")?;
        Ok(Some(request_line))
    }

    pub async fn read_response_line(&mut self) -> Result<Option<(Version, StatusCode, String)>, HttpError> {
        match self.read_line().await? {
            Some(line) => Ok(Some(parse_status_line(&line)?)),
            None => Ok(None),
        }
    }

    /// Reads a header block up to and including the empty line.
    pub async fn read_headers(&mut self) -> Result<HeaderMap, HttpError> {
        let mut decoder = HeaderDecoder::new(self.config.get_max_line_length(), self.config.get_max_headers());
        let stream = self.stream_mut("read headers")?;
        match stream.decode(&mut decoder).await? {
            Some(headers) => Ok(headers),
            None => Err(ParseError::unexpected_eof(None).into()),
        }
    }

    /// Reads the next request.
    ///
    /// Returns `None` if the peer closed the connection before sending a request
    /// line, the connection is closed in that case. The `host` header and the
    /// framing headers are removed from the returned headers.
    pub async fn read_request(&mut self) -> Result<Option<Request<'_, T>>, HttpError> {
        let Some((method, target, version)) = self.read_request_line().await? else {
            debug!("peer closed the connection before sending a request");
            self.closed();
            return Ok(None);
        };

        let mut headers = self.read_headers().await?;
        let authority = take_authority(&mut headers)?;

        self.persistent &= is_persistent(version, &method, &headers);
        let payload_size = framing::request_payload(&method, &mut headers)?;
        trace!(%method, request_target = %target, ?version, ?payload_size, persistent = self.persistent, "read request head");

        let head = RequestHead { authority, method, target, version, headers };
        let body = self.start_body(payload_size)?;
        Ok(Some(Request::new(head, body)))
    }

    /// Reads the next request and hands it to `f`.
    ///
    /// The request, and its body, only live as long as the callback runs.
    pub async fn read_request_with<F, R>(&mut self, f: F) -> Result<Option<R>, HttpError>
    where
        F: for<'c> AsyncFnOnce(Request<'c, T>) -> Result<R, HttpError>,
    {
        match self.read_request().await? {
            Some(request) => f(request).await.map(Some),
            None => Ok(None),
        }
    }

    /// Reads a response to a request made with `method`.
    ///
    /// Interim (1xx) responses other than `101 Switching Protocols` are returned
    /// without a body and leave the state untouched, call again to read the final response.
    pub async fn read_response(&mut self, method: &Method) -> Result<Response<'_, T>, HttpError> {
        self.ensure_state("read response", &[State::Open, State::HalfClosedLocal])?;

        let Some((version, status, reason)) = self.read_response_line().await? else {
            return Err(ParseError::unexpected_eof(None).into());
        };
        let mut headers = self.read_headers().await?;

        if status.is_informational() && status != StatusCode::SWITCHING_PROTOCOLS {
            trace!(status = status.as_u16(), "read interim response");
            return Ok(Response::new(ResponseHead { version, status, reason, headers }, None));
        }

        self.persistent &= is_persistent(version, method, &headers);
        if status == StatusCode::SWITCHING_PROTOCOLS || (method == Method::CONNECT && status.is_success()) {
            self.mark_upgraded();
        }

        let payload_size = framing::response_payload(method, status, &mut headers)?;
        trace!(status = status.as_u16(), ?version, ?payload_size, persistent = self.persistent, "read response head");

        let head = ResponseHead { version, status, reason, headers };
        let body = self.start_body(payload_size)?;
        Ok(Response::new(head, body))
    }

    /// Reads a body framed by `headers`, removing the framing fields.
    ///
    /// Without `transfer-encoding` or `content-length` the body runs until the
    /// end of the stream if `remainder` is set, otherwise there is no body.
    pub fn read_body(&mut self, headers: &mut HeaderMap, remainder: bool) -> Result<Option<Body<'_, T>>, HttpError> {
        let payload_size = framing::parse_payload(headers, remainder)?;
        self.start_body(payload_size)
    }

    /// Reads the body of a request whose head was read with the lower level
    /// [`read_request_line`](Self::read_request_line) and [`read_headers`](Self::read_headers).
    pub fn read_request_body(&mut self, method: &Method, headers: &mut HeaderMap) -> Result<Option<Body<'_, T>>, HttpError> {
        let payload_size = framing::request_payload(method, headers)?;
        self.start_body(payload_size)
    }

    /// Reads the body of a response to a request made with `method`.
    pub fn read_response_body(&mut self, method: &Method, status: StatusCode, headers: &mut HeaderMap) -> Result<Option<Body<'_, T>>, HttpError> {
        let payload_size = framing::response_payload(method, status, headers)?;
        self.start_body(payload_size)
    }

    fn start_body(&mut self, payload_size: PayloadSize) -> Result<Option<Body<'_, T>>, HttpError> {
        if payload_size.is_empty() {
            self.receive_end_stream()?;
            return Ok(None);
        }
        if payload_size.is_remainder() {
            self.persistent = false;
        }

        let decoder = PayloadDecoder::new(payload_size, &self.config);
        Ok(Some(Body::new(self, decoder)))
    }

    /// Starts a request: the request line, a `host` field and `headers`.
    ///
    /// The head is completed by one of the body writers.
    pub fn write_request<I, K, V>(&mut self, authority: &str, method: &Method, target: &str, version: Version, headers: I) -> Result<(), HttpError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.ensure_state("write request", &[State::Idle])?;
        self.encode_head("write request", |buf| {
            header_encoder::write_request_line(method, target, version, buf)?;
            header_encoder::write_header(HOST.as_str().as_bytes(), authority.as_bytes(), buf)?;
            header_encoder::write_headers(headers, buf)
        })?;
        self.bodyless = false;
        self.open("write request")
    }

    /// Starts a response: the status line and `headers`, the reason defaulting
    /// to the canonical one. The head is completed by one of the body writers.
    pub fn write_response<I, K, V>(&mut self, version: Version, status: StatusCode, headers: I, reason: Option<&str>) -> Result<(), HttpError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.ensure_state("write response", &[State::Open, State::HalfClosedRemote])?;
        self.encode_head("write response", |buf| {
            header_encoder::write_status_line(version, status, reason, buf)?;
            header_encoder::write_headers(headers, buf)
        })?;
        self.bodyless = status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED;
        Ok(())
    }

    /// Writes and flushes a complete 1xx response, such as `100 Continue`.
    pub async fn write_interim_response<I, K, V>(&mut self, version: Version, status: StatusCode, headers: I, reason: Option<&str>) -> Result<(), HttpError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        ensure!(status.is_informational(), SendError::invalid_status(status));
        self.ensure_state("write interim response", &[State::Open, State::HalfClosedRemote])?;
        self.encode_head("write interim response", |buf| {
            header_encoder::write_status_line(version, status, reason, buf)?;
            header_encoder::write_headers(headers, buf)?;
            buf.put_slice(b"\r\n");
            Ok(())
        })?;
        self.flush().await
    }

    /// Adds fields to a head started with `write_request` or `write_response`.
    pub fn write_headers<I, K, V>(&mut self, headers: I) -> Result<(), HttpError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        self.encode_head("write headers", |buf| header_encoder::write_headers(headers, buf))
    }

    pub async fn flush(&mut self) -> Result<(), HttpError> {
        self.stream_mut("flush")?.flush().await.map_err(SendError::io)?;
        Ok(())
    }

    /// Completes the head and writes `body`, choosing the framing:
    ///
    /// - a `1xx`, `204` or `304` response: no framing field and no body
    /// - no body: `content-length: 0`
    /// - a body of known length and no trailers: `content-length`
    /// - an exhausted body: `content-length: 0`
    /// - HTTP/1.1: chunked, carrying `trailers` and any trailer frames of the body
    /// - otherwise the body is delimited by closing the connection
    ///
    /// With `head` set the framing fields are written but the body itself is not.
    /// HTTP/1.0 can't carry trailers, they are dropped.
    pub async fn write_body<B>(&mut self, version: Version, body: Option<B>, head: bool, trailers: Option<HeaderMap>) -> Result<(), HttpError>
    where
        B: HttpBody + Unpin,
        B::Error: Into<Box<dyn Error + Send + Sync>>,
    {
        self.ensure_writing("write body")?;
        let trailers = if version == Version::HTTP_10 { None } else { trailers };

        if self.bodyless {
            if body.is_some() {
                trace!("response status forbids a body, dropping it");
            }
            self.write_connection_header(version)?;
            return self.write_empty_body().await;
        }

        let Some(body) = body else {
            self.write_connection_header(version)?;
            return self.write_empty_body().await;
        };

        if let (Some(length), None) = (body.size_hint().exact(), &trailers) {
            self.write_connection_header(version)?;
            self.write_fixed_length_body(body, length, head).await
        } else if body.is_end_stream() {
            self.write_connection_header(version)?;
            self.write_empty_body().await
        } else if version == Version::HTTP_11 {
            self.write_connection_header(version)?;
            self.write_chunked_body(body, head, trailers).await
        } else {
            self.persistent = false;
            self.write_connection_header(version)?;
            self.write_body_and_close(body, head).await
        }
    }

    /// Completes the head with `content-length: 0` and ends the local stream.
    ///
    /// A response whose status forbids a body gets no `content-length` at all.
    pub async fn write_empty_body(&mut self) -> Result<(), HttpError> {
        self.ensure_writing("write empty body")?;
        let bodyless = self.bodyless;
        self.encode_head("write empty body", |buf| {
            if !bodyless {
                header_encoder::write_payload_size(PayloadSize::Empty, buf);
            }
            buf.put_slice(b"\r\n");
            Ok(())
        })?;
        self.flush().await?;
        self.send_end_stream()
    }

    /// Writes `body` after a `content-length: length` field.
    ///
    /// Fails with a content-length error if the body produces more or fewer bytes.
    pub async fn write_fixed_length_body<B>(&mut self, body: B, length: u64, head: bool) -> Result<(), HttpError>
    where
        B: HttpBody + Unpin,
        B::Error: Into<Box<dyn Error + Send + Sync>>,
    {
        self.ensure_writing("write fixed length body")?;
        self.encode_head("write fixed length body", |buf| {
            header_encoder::write_payload_size(PayloadSize::Length(length), buf);
            buf.put_slice(b"\r\n");
            Ok(())
        })?;

        if !head {
            self.write_frames(body, &mut PayloadEncoder::fix_length(length)).await?;
        }
        self.flush().await?;
        self.send_end_stream()
    }

    /// Writes `body` with chunked transfer coding, followed by the trailers.
    pub async fn write_chunked_body<B>(&mut self, body: B, head: bool, trailers: Option<HeaderMap>) -> Result<(), HttpError>
    where
        B: HttpBody + Unpin,
        B::Error: Into<Box<dyn Error + Send + Sync>>,
    {
        self.ensure_writing("write chunked body")?;
        self.encode_head("write chunked body", |buf| {
            header_encoder::write_payload_size(PayloadSize::Chunked, buf);
            buf.put_slice(b"\r\n");
            Ok(())
        })?;

        if !head {
            let mut encoder = PayloadEncoder::chunked();
            if let Some(trailers) = trailers {
                encoder.add_trailers(trailers);
            }
            self.write_frames(body, &mut encoder).await?;
        }
        self.flush().await?;
        self.send_end_stream()
    }

    /// Writes `body` unframed and closes the write side to delimit it.
    pub async fn write_body_and_close<B>(&mut self, body: B, head: bool) -> Result<(), HttpError>
    where
        B: HttpBody + Unpin,
        B::Error: Into<Box<dyn Error + Send + Sync>>,
    {
        self.ensure_writing("write body and close")?;
        self.persistent = false;
        self.encode_head("write body and close", |buf| {
            buf.put_slice(b"\r\n");
            Ok(())
        })?;

        if !head {
            self.write_frames(body, &mut PayloadEncoder::raw()).await?;
        }
        self.close_write().await?;
        self.send_end_stream()
    }

    /// Completes the head with `connection: upgrade` and `upgrade: protocol`.
    ///
    /// The connection stops speaking HTTP afterwards. If a body is given it is
    /// written raw and the write side is closed, otherwise use [`hijack`](Self::hijack)
    /// to take over the stream.
    pub async fn write_upgrade_body<B>(&mut self, protocol: &str, body: Option<B>) -> Result<(), HttpError>
    where
        B: HttpBody + Unpin,
        B::Error: Into<Box<dyn Error + Send + Sync>>,
    {
        self.ensure_writing("write upgrade body")?;
        self.mark_upgraded();
        self.encode_head("write upgrade body", |buf| {
            header_encoder::write_header(b"connection", b"upgrade", buf)?;
            header_encoder::write_header(b"upgrade", protocol.as_bytes(), buf)?;
            buf.put_slice(b"\r\n");
            Ok(())
        })?;
        self.flush().await?;

        if let Some(body) = body {
            self.write_frames(body, &mut PayloadEncoder::raw()).await?;
            self.close_write().await?;
        }
        self.send_end_stream()
    }

    /// Completes the head of a tunnel (for example the response to `CONNECT`).
    ///
    /// Like [`write_upgrade_body`](Self::write_upgrade_body), the stream carries
    /// raw bytes afterwards.
    pub async fn write_tunnel_body<B>(&mut self, version: Version, body: Option<B>) -> Result<(), HttpError>
    where
        B: HttpBody + Unpin,
        B::Error: Into<Box<dyn Error + Send + Sync>>,
    {
        self.ensure_writing("write tunnel body")?;
        self.mark_upgraded();
        self.write_connection_header(version)?;
        self.encode_head("write tunnel body", |buf| {
            buf.put_slice(b"\r\n");
            Ok(())
        })?;
        self.flush().await?;

        if let Some(body) = body {
            self.write_frames(body, &mut PayloadEncoder::raw()).await?;
            self.close_write().await?;
        }
        self.send_end_stream()
    }

    /// Shuts down the stream and moves to [`State::Closed`].
    pub async fn close(&mut self) -> Result<(), HttpError> {
        self.persistent = false;
        self.state = State::Closed;
        if let Some(mut stream) = self.stream.take() {
            debug!("closing connection");
            stream.close_write().await.map_err(SendError::io)?;
        }
        Ok(())
    }

    /// Like [`close`](Self::close), recording the error that caused it.
    pub async fn close_with_error(&mut self, error: &(dyn Error + Send + Sync)) -> Result<(), HttpError> {
        warn!(cause = %error, "closing connection after error");
        self.close().await
    }

    /// Takes over the underlying stream.
    ///
    /// Pending output is flushed first. Bytes already read from the transport
    /// but not consumed are replayed by the returned [`RawStream`]. The
    /// connection can't be used for HTTP anymore.
    pub async fn hijack(&mut self) -> Result<RawStream<T>, HttpError> {
        self.stream_mut("hijack")?.flush().await.map_err(SendError::io)?;

        let Some(stream) = self.stream.take() else {
            return Err(HttpError::protocol_state(self.state, "hijack"));
        };
        self.persistent = false;
        self.hijacked = true;

        let read_closed = stream.is_read_closed();
        let (io, buffered) = stream.into_parts();
        debug!(buffered = buffered.len(), read_closed, "connection hijacked");
        Ok(RawStream::new(io, buffered))
    }

    fn ensure_writing(&self, operation: &'static str) -> Result<(), HttpError> {
        self.ensure_state(operation, &[State::Open, State::HalfClosedRemote])
    }

    fn mark_upgraded(&mut self) {
        self.persistent = false;
        self.upgraded = true;
    }

    /// HTTP/1.0 needs `keep-alive` to stay open, HTTP/1.1 needs `close` to not.
    fn write_connection_header(&mut self, version: Version) -> Result<(), HttpError> {
        let value: &[u8] = match (version, self.persistent) {
            (Version::HTTP_10, true) => b"keep-alive",
            (Version::HTTP_10, false) => return Ok(()),
            (_, false) => b"close",
            (_, true) => return Ok(()),
        };
        self.encode_head("write connection header", |buf| header_encoder::write_header(b"connection", value, buf))
    }

    async fn close_write(&mut self) -> Result<(), HttpError> {
        self.stream_mut("close write")?.close_write().await.map_err(SendError::io)?;
        Ok(())
    }

    /// Encodes every data frame of `body`, flushing as it goes.
    ///
    /// Once bytes of the body reached the peer a failure leaves the message
    /// truncated, so the connection is made non-persistent.
    async fn write_frames<B>(&mut self, mut body: B, encoder: &mut PayloadEncoder) -> Result<(), HttpError>
    where
        B: HttpBody + Unpin,
        B::Error: Into<Box<dyn Error + Send + Sync>>,
    {
        let result = self.do_write_frames(&mut body, encoder).await;
        if result.is_err() {
            self.persistent = false;
        }
        result
    }

    async fn do_write_frames<B>(&mut self, body: &mut B, encoder: &mut PayloadEncoder) -> Result<(), HttpError>
    where
        B: HttpBody + Unpin,
        B::Error: Into<Box<dyn Error + Send + Sync>>,
    {
        while let Some(frame) = body.frame().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    let cause: Box<dyn Error + Send + Sync> = e.into();
                    return Err(SendError::invalid_body(format!("resolve body error: {cause}")).into());
                }
            };

            match frame.into_data() {
                Ok(data) => {
                    self.stream_mut("write body")?.encode(encoder, PayloadItem::Chunk(data))?;
                    self.flush().await?;
                }
                Err(frame) => {
                    if let Ok(trailers) = frame.into_trailers() {
                        if !encoder.add_trailers(trailers) {
                            trace!("body framing can't carry trailers, dropping them");
                        }
                    }
                }
            }
        }

        self.stream_mut("write body")?.encode(encoder, PayloadItem::<B::Data>::Eof)?;
        Ok(())
    }
}

impl<T> fmt::Debug for HttpConnection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConnection")
            .field("state", &self.state)
            .field("persistent", &self.persistent)
            .field("upgraded", &self.upgraded)
            .field("hijacked", &self.hijacked)
            .field("count", &self.count)
            .finish()
    }
}

/// Removes the `host` field, which becomes the request authority.
fn take_authority(headers: &mut HeaderMap) -> Result<Option<String>, HttpError> {
    ensure!(headers.get_all(HOST).iter().count() <= 1, ParseError::bad_request("multiple host headers"));

    match headers.remove(HOST) {
        Some(value) => {
            let authority = String::from_utf8(value.as_bytes().to_vec()).map_err(|_| ParseError::bad_header("host is not valid utf-8"))?;
            Ok(Some(authority))
        }
        None => Ok(None),
    }
}
