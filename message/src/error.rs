use std::fmt::{
    Display,
    Formatter,
};

use crate::{
    MessageKind,
    PacketType,
    Preamble,
};

/// Whatever part of a structured frame had been read when parsing failed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Partial {
    pub length:      Option<u8>,
    pub packet_type: Option<PacketType>,
    pub kind:        Option<MessageKind>,
    pub body:        Vec<u8>,
}

impl Partial {
    /// The frame bytes consumed so far, starting with the SOF preamble.
    pub fn bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.body.len());

        out.push(Preamble::Sof.into());
        out.extend(self.length);
        out.extend(self.packet_type.map(u8::from));
        out.extend(self.kind.map(u8::from));
        out.extend_from_slice(&self.body);

        out
    }
}

impl Display for Partial {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.bytes()))
    }
}

/// Reasons a [`Packet`](crate::Packet) cannot be built from the given fields.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum InvalidFrame {
    #[error("unknown preamble 0x{0:02x}")]
    UnknownPreamble(u8),

    #[error("{0:?} must be a single byte frame")]
    ControlWithFields(Preamble),

    #[error("structured frame is missing its length")]
    MissingLength,

    #[error("length 0x{declared:02x} does not match body (expected {expected})")]
    LengthMismatch { declared: u8, expected: usize },

    #[error("structured frame is missing its packet type")]
    MissingPacketType,

    #[error("unknown packet type 0x{0:02x}")]
    UnknownPacketType(u8),

    #[error("structured frame is missing its message kind")]
    MissingMessageKind,

    #[error("unknown message kind 0x{0:02x}")]
    UnknownMessageKind(u8),

    #[error("checksum 0x{stored:02x} does not validate (computed 0x{computed:02x})")]
    ChecksumMismatch { stored: u8, computed: u8 },

    #[error("body of {0} bytes does not fit in a frame")]
    BodyTooLong(usize),
}

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum Error {
    #[error("unknown packet preamble 0x{0:02x}")]
    UnknownPreamble(u8),

    #[error("bad packet length 0x{length:02x}")]
    BadLength { length: u8, partial: Partial },

    #[error("unknown packet type 0x{packet_type:02x} (frame {partial})")]
    UnknownPacketType { packet_type: u8, partial: Partial },

    #[error("unknown message type 0x{kind:02x} (frame {partial})")]
    UnknownMessageType { kind: u8, partial: Partial },

    #[error("bad packet checksum 0x{received:02x}, expected 0x{expected:02x} (frame {partial})")]
    BadChecksum {
        expected: u8,
        received: u8,
        partial:  Partial,
    },

    #[error("invalid frame: {0}")]
    InvalidFrame(#[from] InvalidFrame),

    #[error(
        "packet does not match a {expected} shape (kind {kind:?}, type {packet_type:?}, length {length:?})"
    )]
    InvalidMessageShape {
        expected:    MessageKind,
        kind:        Option<MessageKind>,
        packet_type: Option<PacketType>,
        length:      Option<u8>,
    },

    #[error("bitmap is {actual} bytes long, expected {expected}")]
    InvalidBitmapLength { expected: usize, actual: usize },

    #[error("unpacking message body: {0}")]
    Unpack(packed_struct::PackingError),
}

impl Error {
    /// The partially-read frame discarded by a parser failure, if any.
    pub fn partial(&self) -> Option<&Partial> {
        match self {
            Error::BadLength {
                partial, ..
            }
            | Error::UnknownPacketType {
                partial, ..
            }
            | Error::UnknownMessageType {
                partial, ..
            }
            | Error::BadChecksum {
                partial, ..
            } => Some(partial),
            _ => None,
        }
    }

    /// Whether this error was raised by the byte-level parser.
    #[inline]
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            Error::UnknownPreamble(_)
                | Error::BadLength { .. }
                | Error::UnknownPacketType { .. }
                | Error::UnknownMessageType { .. }
                | Error::BadChecksum { .. }
        )
    }
}
