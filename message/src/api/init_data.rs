use std::fmt::{
    Display,
    Formatter,
};

use packed_struct::{
    prelude::*,
    PackedStructSlice,
};

use crate::{
    api::{
        bitmap::{
            self,
            NodeId,
            NODE_BITMAP_LEN,
        },
        Discovery,
        Form,
        Message,
        Shape,
    },
    Error,
    MessageKind,
    Packet,
    Result,
};

pub mod capabilities {
    pub const SLAVE_API: u8 = 0x01;
    pub const TIMER_FUNCTIONS: u8 = 0x02;
    pub const SECONDARY_CONTROLLER: u8 = 0x04;
    pub const SIS: u8 = 0x08;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PackedStruct)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "34")]
struct Body {
    version:      u8,
    capabilities: u8,
    bitmap_len:   u8,
    #[packed_field(element_size_bytes = "1")]
    node_bitmap:  [u8; 29],
    chip_type:    u8,
    chip_version: u8,
}

/// `SERIAL_API_GET_INIT_DATA`: serial API version, controller role and the nodes in the network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerialApiGetInitData {
    packet:       Packet,
    version:      u8,
    capabilities: u8,
    node_ids:     Vec<NodeId>,
    chip_type:    u8,
    chip_version: u8,
}

impl SerialApiGetInitData {
    #[inline]
    pub fn version(&self) -> u8 {
        self.version
    }

    #[inline]
    pub fn capabilities(&self) -> u8 {
        self.capabilities
    }

    #[inline]
    pub fn is_slave_api(&self) -> bool {
        self.capabilities & capabilities::SLAVE_API != 0
    }

    #[inline]
    pub fn has_timer_functions(&self) -> bool {
        self.capabilities & capabilities::TIMER_FUNCTIONS != 0
    }

    #[inline]
    pub fn is_secondary_controller(&self) -> bool {
        self.capabilities & capabilities::SECONDARY_CONTROLLER != 0
    }

    #[inline]
    pub fn is_sis(&self) -> bool {
        self.capabilities & capabilities::SIS != 0
    }

    /// Nodes present in the network, ascending.
    #[inline]
    pub fn node_ids(&self) -> &[NodeId] {
        &self.node_ids
    }

    #[inline]
    pub fn chip_type(&self) -> u8 {
        self.chip_type
    }

    #[inline]
    pub fn chip_version(&self) -> u8 {
        self.chip_version
    }
}

impl Message for SerialApiGetInitData {
    const KIND: MessageKind = MessageKind::SerialApiGetInitData;
    const REQUEST_SHAPE: Shape = Shape::request(0x03);
    const RESPONSE_SHAPE: Shape = Shape::response(0x25);

    fn from_form(packet: Packet, form: Form) -> Result<Self> {
        if form == Form::Request {
            return Ok(Self {
                packet,
                version: 0,
                capabilities: 0,
                node_ids: vec![],
                chip_type: 0,
                chip_version: 0,
            });
        }

        let body = Body::unpack_from_slice(packet.body()).map_err(Error::Unpack)?;
        bitmap::check_len(NODE_BITMAP_LEN, usize::from(body.bitmap_len))?;

        Ok(Self {
            version: body.version,
            capabilities: body.capabilities,
            node_ids: bitmap::node_ids(&body.node_bitmap)?,
            chip_type: body.chip_type,
            chip_version: body.chip_version,
            packet,
        })
    }

    #[inline]
    fn packet(&self) -> &Packet {
        &self.packet
    }
}

impl Discovery for SerialApiGetInitData {}

impl Display for SerialApiGetInitData {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if !self.is_response() {
            return write!(f, "init data request");
        }

        let role = if self.is_secondary_controller() {
            "secondary"
        } else {
            "primary"
        };

        write!(
            f,
            "init data: version {}, {role} controller{}{}, chip {}.{}, nodes {:?}",
            self.version,
            self.is_sis().then_some(" (SIS)").unwrap_or(""),
            self.is_slave_api().then_some(", slave api").unwrap_or(""),
            self.chip_type,
            self.chip_version,
            self.node_ids,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn response_body(bitmap: [u8; NODE_BITMAP_LEN]) -> Vec<u8> {
        let mut body = vec![0x05, 0x08, NODE_BITMAP_LEN as u8];
        body.extend_from_slice(&bitmap);
        body.extend_from_slice(&[0x05, 0x00]);
        body
    }

    #[test]
    fn body_layout() {
        let mut raw = [0u8; 34];
        raw[..3].copy_from_slice(&[0x05, 0x08, 0x1d]);
        raw[3] = 0x01;
        raw[31] = 0x80;
        raw[32..].copy_from_slice(&[0x07, 0x02]);

        let body = Body::unpack_from_slice(&raw).unwrap();

        assert_eq!(0x05, body.version);
        assert_eq!(0x08, body.capabilities);
        assert_eq!(0x1d, body.bitmap_len);
        assert_eq!(0x01, body.node_bitmap[0]);
        assert_eq!(0x80, body.node_bitmap[NODE_BITMAP_LEN - 1]);
        assert_eq!(0x07, body.chip_type);
        assert_eq!(0x02, body.chip_version);

        assert!(Body::unpack_from_slice(&raw[..33]).is_err());
    }

    #[test]
    fn create_request() {
        let request = SerialApiGetInitData::create_request();
        assert_eq!(vec![0x01, 0x03, 0x00, 0x02, 0xfe], request.bytes());

        let decoded = SerialApiGetInitData::decode(request).unwrap();
        assert!(!decoded.is_response());
        assert_eq!(0, decoded.version());
        assert!(decoded.node_ids().is_empty());
        assert!(!decoded.is_slave_api());
        assert!(!decoded.has_timer_functions());
        assert!(!decoded.is_secondary_controller());
        assert!(!decoded.is_sis());
    }

    #[test]
    fn node_bitmap() {
        let mut bitmap = [0u8; NODE_BITMAP_LEN];
        bitmap[0] = 0x07;
        bitmap[1] = 0x02;
        bitmap[12] = 0xa7;
        bitmap[28] = 0x81;

        let packet =
            Packet::response(MessageKind::SerialApiGetInitData, &response_body(bitmap)).unwrap();
        assert_eq!(Some(0x25), packet.length());

        let decoded = SerialApiGetInitData::decode(packet).unwrap();

        assert!(decoded.is_response());
        assert_eq!(&[1, 2, 3, 10, 97, 98, 99, 102, 104, 225, 232], decoded.node_ids());
        assert_eq!(0x05, decoded.version());
        assert_eq!(0x05, decoded.chip_type());
        assert_eq!(0x00, decoded.chip_version());

        assert!(decoded.is_sis());
        assert!(!decoded.is_slave_api());
        assert!(!decoded.has_timer_functions());
        assert!(!decoded.is_secondary_controller());
    }

    #[test]
    fn captured_response() {
        let mut body = vec![0x05, 0x00, 0x1d, 0x07];
        body.extend_from_slice(&[0; 23]);
        body.extend_from_slice(&[0x11, 0x00, 0x27, 0x00, 0x14, 0x05, 0x00]);

        let packet = Packet::response(MessageKind::SerialApiGetInitData, &body).unwrap();
        assert_eq!(Some(0xe1), packet.checksum());

        let decoded = SerialApiGetInitData::decode(packet).unwrap();
        assert_eq!(
            &[1, 2, 3, 193, 197, 209, 210, 211, 214, 227, 229],
            decoded.node_ids()
        );
    }

    #[test]
    fn bitmap_length_mismatch() {
        let mut body = response_body([0; NODE_BITMAP_LEN]);
        body[2] = 0x1c;

        let packet = Packet::response(MessageKind::SerialApiGetInitData, &body).unwrap();

        assert_eq!(
            Err(Error::InvalidBitmapLength {
                expected: 29,
                actual:   28,
            }),
            SerialApiGetInitData::decode(packet)
        );
    }

    #[test]
    fn wrong_shape() {
        let short = Packet::response(MessageKind::SerialApiGetInitData, &[0x05]).unwrap();
        assert!(matches!(
            SerialApiGetInitData::decode(short),
            Err(Error::InvalidMessageShape {
                expected: MessageKind::SerialApiGetInitData,
                length: Some(4),
                ..
            })
        ));

        let other_kind = Packet::command(crate::PacketType::Request, MessageKind::ZwSendData);
        assert!(SerialApiGetInitData::decode(other_kind).is_err());

        assert!(SerialApiGetInitData::decode(Packet::ack()).is_err());
    }
}
