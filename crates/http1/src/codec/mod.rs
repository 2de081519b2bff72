//! HTTP/1 codec module for encoding and decoding message parts
//!
//! This module provides streaming [`Decoder`](tokio_util::codec::Decoder) and
//! [`Encoder`](tokio_util::codec::Encoder) implementations for the pieces an
//! HTTP/1 exchange is made of. They are pure: they only touch the
//! [`BytesMut`](bytes::BytesMut) buffers they are given, the
//! [`connection`](crate::connection) layer drives them over a transport.
//!
//! # Architecture
//!
//! - [`LineDecoder`]: CRLF terminated lines with a length limit
//! - [`header`]: start lines and header blocks
//! - [`body`]: payload decoders and encoders, plus the framing rules
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use micro_http1::codec::header::HeaderDecoder;
//! use micro_http1::codec::LineDecoder;
//! use tokio_util::codec::Decoder;
//!
//! let mut buffer = BytesMut::from(&b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n"[..]);
//!
//! let line = LineDecoder::new(8192).decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(line, "GET / HTTP/1.1");
//!
//! let headers = HeaderDecoder::new(8192, 64).decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(headers["host"], "localhost");
//! ```

pub mod body;
pub mod header;
mod line_decoder;

pub use line_decoder::LineDecoder;
