//! Core HTTP/1 protocol types.
//!
//! - **Messages**: payload items and payload framing
//!   - [`PayloadItem`]: a chunk of payload or the end of it
//!   - [`PayloadSize`]: how a payload is delimited on the wire
//!
//! - **Requests and responses**: parsed heads with
//!   a streaming [`body::Body`]
//!
//! - **Persistence** ([`is_persistent`]): whether a connection survives an exchange
//!
//! - **Errors**:
//!   - [`HttpError`]: Top-level error type
//!   - [`ParseError`]: errors reading from the peer
//!   - [`SendError`]: errors writing to the peer

mod message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod request;
pub use request::Request;
pub use request::RequestHead;

mod response;
pub use response::Response;
pub use response::ResponseHead;

mod persistence;
pub use persistence::has_connection_token;
pub use persistence::is_persistent;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;

pub mod body;
