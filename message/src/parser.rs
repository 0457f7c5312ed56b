//! Incremental frame parser.
//!
//! The parser is a state machine fed one byte at a time. It never holds more than the frame
//! currently being read, and every failure discards that frame and returns to [`State::Idle`], so
//! the next byte is treated as a fresh preamble.

use packed_struct::PrimitiveEnum;

use crate::{
    checksum,
    packet::MIN_LENGTH,
    Error,
    MessageKind,
    Packet,
    PacketType,
    Partial,
    Preamble,
    Result,
};

/// What to do with a message kind byte outside the known catalogue.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum UnknownKindPolicy {
    /// Fail the frame with [`Error::UnknownMessageType`].
    #[default]
    Reject,

    /// Log the byte and keep reading the frame as [`MessageKind::Unknown`].
    Accept,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ParserConfig {
    pub unknown_kind: UnknownKindPolicy,
}

/// A structured frame whose header has been read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InFlight {
    pub length:      u8,
    pub packet_type: PacketType,
    pub kind:        MessageKind,
    pub body:        Vec<u8>,
}

impl InFlight {
    #[inline]
    fn body_len(&self) -> usize {
        usize::from(self.length - MIN_LENGTH)
    }

    fn into_partial(self) -> Partial {
        Partial {
            length:      Some(self.length),
            packet_type: Some(self.packet_type),
            kind:        Some(self.kind),
            body:        self.body,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum State {
    #[default]
    Idle,
    AwaitingLength,
    AwaitingPacketType {
        length: u8,
    },
    AwaitingMessageType {
        length:      u8,
        packet_type: PacketType,
    },
    AwaitingBody(InFlight),
    AwaitingChecksum(InFlight),
}

pub type Outcome = Result<Option<Packet>>;

impl State {
    /// Consume one byte, producing the next state and the outcome of this byte.
    ///
    /// Any `Some` packet or error is paired with [`State::Idle`].
    pub fn step(self, byte: u8, policy: UnknownKindPolicy) -> (State, Outcome) {
        match self {
            State::Idle => match Preamble::from_primitive(byte) {
                None => (State::Idle, Err(Error::UnknownPreamble(byte))),
                Some(Preamble::Sof) => (State::AwaitingLength, Ok(None)),
                Some(control) => (State::Idle, Ok(Some(Packet::control(control)))),
            },

            State::AwaitingLength if byte < MIN_LENGTH => {
                (State::Idle, Err(Error::BadLength {
                    length:  byte,
                    partial: Partial {
                        length: Some(byte),
                        ..Default::default()
                    },
                }))
            },

            State::AwaitingLength => {
                (State::AwaitingPacketType {
                    length: byte,
                }, Ok(None))
            },

            State::AwaitingPacketType {
                length,
            } => match PacketType::from_primitive(byte) {
                None => (State::Idle, Err(Error::UnknownPacketType {
                    packet_type: byte,
                    partial:     Partial {
                        length: Some(length),
                        ..Default::default()
                    },
                })),
                Some(packet_type) => (
                    State::AwaitingMessageType {
                        length,
                        packet_type,
                    },
                    Ok(None),
                ),
            },

            State::AwaitingMessageType {
                length,
                packet_type,
            } => {
                let kind = MessageKind::from(byte);

                if !kind.is_known() {
                    match policy {
                        UnknownKindPolicy::Reject => {
                            return (State::Idle, Err(Error::UnknownMessageType {
                                kind:    byte,
                                partial: Partial {
                                    length: Some(length),
                                    packet_type: Some(packet_type),
                                    ..Default::default()
                                },
                            }));
                        },
                        UnknownKindPolicy::Accept => {
                            tracing::warn!(kind = byte, "accepting frame with unknown message kind");
                        },
                    }
                }

                let in_flight = InFlight {
                    length,
                    packet_type,
                    kind,
                    body: Vec::with_capacity(usize::from(length - MIN_LENGTH)),
                };

                if length == MIN_LENGTH {
                    (State::AwaitingChecksum(in_flight), Ok(None))
                } else {
                    (State::AwaitingBody(in_flight), Ok(None))
                }
            },

            State::AwaitingBody(mut in_flight) => {
                in_flight.body.push(byte);

                if in_flight.body.len() == in_flight.body_len() {
                    (State::AwaitingChecksum(in_flight), Ok(None))
                } else {
                    (State::AwaitingBody(in_flight), Ok(None))
                }
            },

            State::AwaitingChecksum(in_flight) => {
                let expected = checksum::compute(
                    in_flight.length,
                    in_flight.packet_type,
                    in_flight.kind,
                    &in_flight.body,
                );

                if byte != expected {
                    return (State::Idle, Err(Error::BadChecksum {
                        expected,
                        received: byte,
                        partial: in_flight.into_partial(),
                    }));
                }

                let InFlight {
                    length,
                    packet_type,
                    kind,
                    body,
                } = in_flight;

                (State::Idle, Ok(Some(Packet::structured(length, packet_type, kind, body, Some(byte)))))
            },
        }
    }
}

/// Turns a byte stream into [`Packet`]s, one byte per [`update`](PacketParser::update) call.
///
/// Each connection needs its own parser; it is not synchronized.
#[derive(Clone, Debug, Default)]
pub struct PacketParser {
    state:  State,
    config: ParserConfig,
}

impl PacketParser {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            state: State::Idle,
            config,
        }
    }

    #[inline]
    pub fn state(&self) -> &State {
        &self.state
    }

    #[inline]
    pub fn config(&self) -> ParserConfig {
        self.config
    }

    /// Drop any in-flight frame.
    #[inline]
    pub fn reset(&mut self) {
        self.state = State::Idle;
    }

    /// Feed one byte. Returns `Ok(Some(_))` when it completes a frame.
    ///
    /// On error the in-flight frame is discarded and the parser is ready for a new preamble.
    pub fn update(&mut self, byte: u8) -> Outcome {
        let state = std::mem::take(&mut self.state);
        let (next, outcome) = state.step(byte, self.config.unknown_kind);
        self.state = next;

        match outcome {
            Err(Error::BadChecksum {
                expected,
                received,
                ref partial,
            }) => {
                tracing::error!(
                    expected = %hex::encode([expected]),
                    received = %hex::encode([received]),
                    frame = %partial,
                    "frame with invalid checksum"
                );
            },
            Err(ref e) => tracing::debug!(error = %e, "discarding in-flight frame"),
            Ok(_) => {},
        }

        outcome
    }
}
