//! HTTP/1 connection handling module
//!
//! This module drives the [`codec`](crate::codec) over an asynchronous byte
//! stream and enforces the order of operations of an exchange.
//!
//! # Components
//!
//! - [`HttpConnection`]: the connection itself, used by clients and servers:
//!   - Reads and writes message heads
//!   - Chooses body framing on both sides
//!   - Tracks persistence and the exchange [`State`]
//!   - Supports upgrades, tunnels and hijacking the raw stream
//! - [`State`]: where the connection is in the current exchange

mod http_connection;
mod state;
mod stream;

pub use http_connection::HttpConnection;
pub use state::State;
