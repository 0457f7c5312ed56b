//! The serial API frame checksum: a running XOR seeded with `0xff`.

use crate::{
    MessageKind,
    PacketType,
};

pub const SEED: u8 = 0xff;

/// Checksum over raw frame bytes, excluding the preamble and the checksum byte itself.
#[inline]
pub fn over(bytes: &[u8]) -> u8 {
    bytes.iter().fold(SEED, |acc, b| acc ^ b)
}

/// Checksum of a structured frame from its fields.
#[inline]
pub fn compute(length: u8, packet_type: PacketType, kind: MessageKind, body: &[u8]) -> u8 {
    let header = SEED ^ length ^ u8::from(packet_type) ^ u8::from(kind);
    body.iter().fold(header, |acc, b| acc ^ b)
}
