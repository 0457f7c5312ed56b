//! Typed views over the serial API calls this crate understands.
//!
//! Each decoder wraps a validated [`Packet`] and accepts exactly two header shapes for its
//! [`MessageKind`]: the request it sends, and the response the controller replies with. Decoded
//! fields only carry information on the response shape.

use std::fmt::{
    Display,
    Formatter,
};

use crate::{
    Error,
    MessageKind,
    Packet,
    PacketType,
    Preamble,
    Result,
};

pub mod bitmap;
mod capabilities;
mod controller_capabilities;
mod init_data;
mod send_data;

pub use bitmap::NodeId;
pub use capabilities::SerialApiGetCapabilities;
pub use controller_capabilities::ZwGetControllerCapabilities;
pub use init_data::SerialApiGetInitData;
pub use send_data::{
    transmit_options,
    ZwSendData,
    BASIC_SET,
    COMMAND_CLASS_BASIC,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Length {
    Exact(u8),
    AtLeast(u8),
}

/// Header values a structured frame must carry to be read as a given message.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Shape {
    pub packet_type: PacketType,
    pub length:      Length,
}

impl Shape {
    #[inline]
    pub const fn request(length: u8) -> Self {
        Self {
            packet_type: PacketType::Request,
            length:      Length::Exact(length),
        }
    }

    #[inline]
    pub const fn response(length: u8) -> Self {
        Self {
            packet_type: PacketType::Response,
            length:      Length::Exact(length),
        }
    }

    pub fn matches(&self, packet: &Packet, kind: MessageKind) -> bool {
        let length_ok = match (self.length, packet.length()) {
            (Length::Exact(n), Some(len)) => len == n,
            (Length::AtLeast(n), Some(len)) => len >= n,
            (_, None) => false,
        };

        packet.preamble() == Preamble::Sof
            && packet.packet_type() == Some(self.packet_type)
            && packet.kind() == Some(kind)
            && length_ok
    }
}

/// Which of a message's two shapes a packet matched.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Form {
    Request,
    Response,
}

pub trait Message: Sized {
    const KIND: MessageKind;
    const REQUEST_SHAPE: Shape;
    const RESPONSE_SHAPE: Shape;

    /// Build the decoder once the packet's shape is known.
    fn from_form(packet: Packet, form: Form) -> Result<Self>;

    fn packet(&self) -> &Packet;

    fn form(packet: &Packet) -> Result<Form> {
        if Self::REQUEST_SHAPE.matches(packet, Self::KIND) {
            return Ok(Form::Request);
        }

        if Self::RESPONSE_SHAPE.matches(packet, Self::KIND) {
            return Ok(Form::Response);
        }

        Err(Error::InvalidMessageShape {
            expected:    Self::KIND,
            kind:        packet.kind(),
            packet_type: packet.packet_type(),
            length:      packet.length(),
        })
    }

    #[inline]
    fn decode(packet: Packet) -> Result<Self> {
        let form = Self::form(&packet)?;
        Self::from_form(packet, form)
    }

    #[inline]
    fn is_response(&self) -> bool {
        self.packet().is_response()
    }
}

/// Calls whose request carries no body.
pub trait Discovery: Message {
    #[inline]
    fn create_request() -> Packet {
        Packet::command(PacketType::Request, Self::KIND)
    }
}

/// A packet dispatched to its decoder by message kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decoded {
    InitData(SerialApiGetInitData),
    Capabilities(SerialApiGetCapabilities),
    ControllerCapabilities(ZwGetControllerCapabilities),
    SendData(ZwSendData),
    Other(Packet),
}

impl Decoded {
    pub fn from_packet(packet: Packet) -> Result<Self> {
        let decoded = match packet.kind() {
            Some(MessageKind::SerialApiGetInitData) => {
                Decoded::InitData(SerialApiGetInitData::decode(packet)?)
            },
            Some(MessageKind::SerialApiGetCapabilities) => {
                Decoded::Capabilities(SerialApiGetCapabilities::decode(packet)?)
            },
            Some(MessageKind::ZwGetControllerCapabilities) => {
                Decoded::ControllerCapabilities(ZwGetControllerCapabilities::decode(packet)?)
            },
            Some(MessageKind::ZwSendData) => Decoded::SendData(ZwSendData::decode(packet)?),
            _ => Decoded::Other(packet),
        };

        Ok(decoded)
    }

    pub fn packet(&self) -> &Packet {
        match self {
            Decoded::InitData(m) => m.packet(),
            Decoded::Capabilities(m) => m.packet(),
            Decoded::ControllerCapabilities(m) => m.packet(),
            Decoded::SendData(m) => m.packet(),
            Decoded::Other(p) => p,
        }
    }
}

impl Display for Decoded {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Decoded::InitData(m) => write!(f, "{m}"),
            Decoded::Capabilities(m) => write!(f, "{m}"),
            Decoded::ControllerCapabilities(m) => write!(f, "{m}"),
            Decoded::SendData(m) => write!(f, "{m}"),
            Decoded::Other(p) => write!(f, "{p}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn shape_matching() {
        let request = Packet::command(PacketType::Request, MessageKind::SerialApiGetInitData);

        assert!(Shape::request(3).matches(&request, MessageKind::SerialApiGetInitData));
        assert!(!Shape::request(4).matches(&request, MessageKind::SerialApiGetInitData));
        assert!(!Shape::response(3).matches(&request, MessageKind::SerialApiGetInitData));
        assert!(!Shape::request(3).matches(&request, MessageKind::ZwSendData));
        assert!(!Shape::request(3).matches(&Packet::ack(), MessageKind::SerialApiGetInitData));

        let at_least = Shape {
            packet_type: PacketType::Request,
            length:      Length::AtLeast(3),
        };
        assert!(at_least.matches(&request, MessageKind::SerialApiGetInitData));
    }

    #[test]
    fn dispatch() {
        let request = SerialApiGetCapabilities::create_request();
        assert!(matches!(Decoded::from_packet(request), Ok(Decoded::Capabilities(_))));

        let ack = Decoded::from_packet(Packet::ack()).unwrap();
        assert_eq!(Decoded::Other(Packet::ack()), ack);
        assert_eq!(&Packet::ack(), ack.packet());

        let wrong = Packet::response(MessageKind::SerialApiGetCapabilities, &[0x00]).unwrap();
        assert!(matches!(Decoded::from_packet(wrong), Err(Error::InvalidMessageShape { .. })));
    }
}
