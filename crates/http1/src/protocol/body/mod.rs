//! Message bodies read from a connection.
//!
//! A [`Body`] borrows its [`HttpConnection`](crate::connection::HttpConnection)
//! for as long as it lives. Reading it to the end finishes the remote side of
//! the exchange. Closing or dropping it early closes the read side, the
//! connection can't be reused afterwards since the framing is lost.

mod message_body;

pub use message_body::Body;
