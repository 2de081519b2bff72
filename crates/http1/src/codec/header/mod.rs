//! HTTP header processing module for encoding and decoding message heads
//!
//! # Components
//!
//! - [`grammar`]: Token, field value and start line rules
//! - [`HeaderDecoder`]: Decodes a block of header (or trailer) fields
//! - [`header_encoder`]: Writes start lines and fields, refusing anything that
//!   would not parse back

pub mod grammar;
mod header_decoder;
pub mod header_encoder;

pub use header_decoder::HeaderDecoder;
