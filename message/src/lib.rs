//! Framing and typed decoding for the Z-Wave serial API.
//!
//! Bytes read from the controller are fed one at a time into a [`PacketParser`], which yields
//! validated [`Packet`]s. The [`api`] module reinterprets a packet's body as one of the known
//! request/response messages.

pub mod api;
pub mod checksum;
mod error;
mod kind;
pub mod packet;
pub mod parser;

pub use error::{
    Error,
    InvalidFrame,
    Partial,
};
pub use kind::MessageKind;
pub use packet::{
    Fields,
    Packet,
    PacketType,
    Preamble,
};
pub use parser::{
    PacketParser,
    ParserConfig,
    UnknownKindPolicy,
};

pub type Result<T, E = Error> = std::result::Result<T, E>;
