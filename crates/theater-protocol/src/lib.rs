//! theater-protocol
//!
//! Wire-level encoding/decoding for the theater session.
//!
//! This crate turns raw frames into an action code plus
//! `theater_core::Parameter`s and back again.
//!
//! - [`wire_types`]  : header layout and action codes
//! - [`frame_codec`] : frame decode / encode, log rendering

pub mod wire_types;
pub mod frame_codec;

pub use frame_codec::{
    ProtocolError,
    Frame,
    decode,
    decode_body,
    encode,
    encode_body,
    encode_raw,
    frame_length,
    to_printable,
};
pub use wire_types::HEADER_SIZE;
