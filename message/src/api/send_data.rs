use std::fmt::{
    Display,
    Formatter,
};

use crate::{
    api::{
        Form,
        Length,
        Message,
        NodeId,
        Shape,
    },
    checksum,
    packet::MIN_LENGTH,
    InvalidFrame,
    MessageKind,
    Packet,
    PacketType,
    Result,
};

/// Transmit option bits for [`ZwSendData`] requests.
pub mod transmit_options {
    pub const ACK: u8 = 0x01;
    pub const LOW_POWER: u8 = 0x02;
    pub const AUTO_ROUTE: u8 = 0x04;
    pub const NO_ROUTE: u8 = 0x10;
    pub const EXPLORE: u8 = 0x20;

    pub const DEFAULT: u8 = ACK | AUTO_ROUTE | EXPLORE;
}

pub const COMMAND_CLASS_BASIC: u8 = 0x20;
pub const BASIC_SET: u8 = 0x01;

/// `ZW_SEND_DATA`: deliver a command class payload to a node.
///
/// The response only says whether the controller queued the frame. Delivery is reported later by a
/// callback request carrying the same callback id.
///
/// That callback is also a request of kind `ZW_SEND_DATA`, and once it carries round-trip ticks it
/// is long enough to match the request shape. Request-form values are only meaningful for frames
/// this host built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZwSendData {
    packet:       Packet,
    return_value: u8,
}

impl ZwSendData {
    pub fn create_request(
        node_id: NodeId,
        command_class: u8,
        payload: &[u8],
        transmit_options: u8,
        callback_id: Option<u8>,
    ) -> Result<Packet, InvalidFrame> {
        let data_len = u8::try_from(payload.len() + 1)
            .map_err(|_| InvalidFrame::BodyTooLong(payload.len() + 4))?;

        let mut body = Vec::with_capacity(payload.len() + 5);
        body.push(node_id);
        body.push(data_len);
        body.push(command_class);
        body.extend_from_slice(payload);
        body.push(transmit_options);
        body.extend(callback_id);

        Packet::request(Self::KIND, &body)
    }

    /// Switch a node on or off with `BASIC_SET`.
    pub fn basic_set(node_id: NodeId, on: bool, callback_id: Option<u8>) -> Packet {
        let value = if on { 0xff } else { 0x00 };

        let mut body = vec![node_id, 3, COMMAND_CLASS_BASIC, BASIC_SET, value];
        body.push(transmit_options::DEFAULT);
        body.extend(callback_id);

        let length = MIN_LENGTH + body.len() as u8;
        let checksum = checksum::compute(length, PacketType::Request, Self::KIND, &body);

        Packet::structured(length, PacketType::Request, Self::KIND, body, Some(checksum))
    }

    #[inline]
    pub fn return_value(&self) -> u8 {
        self.return_value
    }

    /// Whether the controller took the frame for transmission.
    #[inline]
    pub fn accepted(&self) -> bool {
        self.return_value != 0
    }
}

impl Message for ZwSendData {
    const KIND: MessageKind = MessageKind::ZwSendData;
    const REQUEST_SHAPE: Shape = Shape {
        packet_type: PacketType::Request,
        length:      Length::AtLeast(0x07),
    };
    const RESPONSE_SHAPE: Shape = Shape::response(0x04);

    fn from_form(packet: Packet, form: Form) -> Result<Self> {
        let return_value = match form {
            Form::Request => 0,
            Form::Response => packet.body().first().copied().unwrap_or_default(),
        };

        Ok(Self {
            packet,
            return_value,
        })
    }

    #[inline]
    fn packet(&self) -> &Packet {
        &self.packet
    }
}

impl Display for ZwSendData {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if !self.is_response() {
            if let Some((node, data)) = self.packet.body().split_first() {
                return write!(f, "send data to node {node}: 0x{}", hex::encode(data));
            }

            return write!(f, "send data request");
        }

        if self.accepted() {
            write!(f, "send data accepted")
        } else {
            write!(f, "send data refused")
        }
    }
}
