//! An asynchronous HTTP/1.0 and HTTP/1.1 connection codec
//!
//! This crate reads and writes HTTP/1 messages over any bidirectional byte
//! stream, built on top of tokio. It is transport agnostic and symmetric: the
//! same [`connection::HttpConnection`] serves as the client or the server end
//! of a connection. It does not route requests, pool connections or speak TLS.
//!
//! # Features
//!
//! - HTTP/1.0 and HTTP/1.1 request and response heads
//! - Streaming bodies framed by content-length, chunked transfer coding or
//!   the end of the stream
//! - Chunked trailers on both sides
//! - Persistent connections, with the exchange state tracked per connection
//! - Interim (1xx) responses
//! - Protocol upgrades, `CONNECT` tunnels and hijacking the raw stream
//! - Strict header validation on read and on write
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use http::{StatusCode, Version};
//! use http_body_util::Full;
//! use micro_http1::connection::HttpConnection;
//! use micro_http1::protocol::HttpError;
//! use tokio::net::{TcpListener, TcpStream};
//! use tracing::{error, info, warn, Level};
//! use tracing_subscriber::FmtSubscriber;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Initialize logging
//!     let subscriber = FmtSubscriber::builder()
//!         .with_max_level(Level::INFO)
//!         .finish();
//!     tracing::subscriber::set_global_default(subscriber)
//!         .expect("setting default subscriber failed");
//!
//!     info!(port = 8080, "start listening");
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         tokio::spawn(async move {
//!             match serve(tcp_stream).await {
//!                 Ok(count) => info!(count, "finished process, connection shutdown"),
//!                 Err(e) => error!("service has error, cause {}, connection shutdown", e),
//!             }
//!         });
//!     }
//! }
//!
//! async fn serve(tcp_stream: TcpStream) -> Result<usize, HttpError> {
//!     let mut connection = HttpConnection::new(tcp_stream);
//!
//!     while connection.is_idle() {
//!         let Some(mut request) = connection.read_request().await? else {
//!             break;
//!         };
//!         info!(path = request.target(), "receiving request");
//!
//!         let version = request.version();
//!         let body = request.join().await?;
//!         info!(len = body.len(), "received request body");
//!         drop(request);
//!
//!         let response_body = Full::new(Bytes::from_static(b"Hello World!\r\n"));
//!         connection.write_response(version, StatusCode::OK, [("content-type", "text/plain")], None)?;
//!         connection.write_body(version, Some(response_body), false, None).await?;
//!     }
//!
//!     Ok(connection.count())
//! }
//! ```
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`connection`]: the connection state machine and message operations
//! - [`protocol`]: message types, persistence rules and errors
//! - [`codec`]: pure encoders and decoders for lines, heads and bodies
//! - [`upgrade`]: raw stream access after an upgrade or tunnel
//!
//! # Connection lifecycle
//!
//! Each connection moves through [`connection::State`]: `Idle` until a request
//! is read or written, `Open` while both directions are in progress, half
//! closed once one side finished its message and back to `Idle` when the
//! exchange completes, or `Closed` if the connection isn't persistent.
//!
//! # Error Handling
//!
//! - [`protocol::HttpError`]: Top-level error type
//! - [`protocol::ParseError`]: errors in what the peer sent
//! - [`protocol::SendError`]: messages this side refuses or fails to send
//!
//! # Limitations
//!
//! - HTTP/1.x only, no HTTP/2 or HTTP/3
//! - No TLS, pass an already secured stream
//! - Line length and header count are bounded, see [`Config`]

pub mod codec;
pub mod connection;
pub mod protocol;
pub mod upgrade;

mod config;
pub use config::Config;
pub use config::{DEFAULT_BLOCK_SIZE, DEFAULT_MAX_HEADERS, DEFAULT_MAX_LINE_LENGTH};

mod utils;
pub(crate) use utils::ensure;
