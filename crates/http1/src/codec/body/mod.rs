//! HTTP body handling module for processing request and response payloads
//!
//! This module provides functionality for encoding and decoding HTTP message bodies
//! using different transfer strategies.
//!
//! # Components
//!
//! ## Decoders
//! - [`ChunkedDecoder`]: Handles chunked transfer encoded payloads and their trailers
//! - [`LengthDecoder`]: Processes fixed-length payloads
//! - [`RemainderDecoder`]: Reads until the peer closes the stream
//! - [`PayloadDecoder`]: Main decoder that coordinates different decoding strategies
//!
//! ## Encoders
//! - [`ChunkedEncoder`]: Implements chunked transfer encoding
//! - [`LengthEncoder`]: Handles fixed-length payload encoding
//! - [`PayloadEncoder`]: Main encoder that manages different encoding strategies
//!
//! ## Framing
//! - [`framing`]: Decides which decoder a received message needs

mod chunked_decoder;
mod chunked_encoder;
pub mod framing;
mod length_decoder;
mod length_encoder;
mod payload_decoder;
mod payload_encoder;
mod remainder_decoder;

pub use chunked_decoder::ChunkedDecoder;
pub use chunked_encoder::ChunkedEncoder;
pub use length_decoder::LengthDecoder;
pub use length_encoder::LengthEncoder;
pub use payload_decoder::PayloadDecoder;
pub use payload_encoder::PayloadEncoder;
pub use remainder_decoder::RemainderDecoder;
