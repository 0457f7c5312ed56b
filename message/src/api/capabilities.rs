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
            FUNCTION_BITMAP_LEN,
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

#[derive(Copy, Clone, Debug, PartialEq, Eq, PackedStruct)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "40", endian = "msb")]
struct Body {
    #[packed_field(size_bytes = "1")]
    application_version:  u8,
    #[packed_field(size_bytes = "1")]
    application_revision: u8,
    #[packed_field(size_bytes = "2")]
    manufacturer_id:      u16,
    #[packed_field(size_bytes = "2")]
    product_type:         u16,
    #[packed_field(size_bytes = "2")]
    product_id:           u16,
    #[packed_field(element_size_bytes = "1")]
    function_bitmap:      [u8; 32],
}

/// `SERIAL_API_GET_CAPABILITIES`: firmware identification and the set of supported API functions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerialApiGetCapabilities {
    packet:               Packet,
    application_version:  u8,
    application_revision: u8,
    manufacturer_id:      u16,
    product_type:         u16,
    product_id:           u16,
    supported:            Vec<MessageKind>,
}

impl SerialApiGetCapabilities {
    /// The first two body bytes read as a little-endian word.
    #[inline]
    pub fn version(&self) -> u16 {
        u16::from_le_bytes([self.application_version, self.application_revision])
    }

    #[inline]
    pub fn application_version(&self) -> u8 {
        self.application_version
    }

    #[inline]
    pub fn application_revision(&self) -> u8 {
        self.application_revision
    }

    #[inline]
    pub fn manufacturer_id(&self) -> u16 {
        self.manufacturer_id
    }

    #[inline]
    pub fn product_type(&self) -> u16 {
        self.product_type
    }

    #[inline]
    pub fn product_id(&self) -> u16 {
        self.product_id
    }

    /// Every function the controller advertises, including ones this crate has no name for.
    #[inline]
    pub fn supported(&self) -> &[MessageKind] {
        &self.supported
    }

    pub fn supports(&self, kind: MessageKind) -> bool {
        self.supported.contains(&kind)
    }
}

impl Message for SerialApiGetCapabilities {
    const KIND: MessageKind = MessageKind::SerialApiGetCapabilities;
    const REQUEST_SHAPE: Shape = Shape::request(0x03);
    const RESPONSE_SHAPE: Shape = Shape::response(0x2b);

    fn from_form(packet: Packet, form: Form) -> Result<Self> {
        if form == Form::Request {
            return Ok(Self {
                packet,
                application_version: 0,
                application_revision: 0,
                manufacturer_id: 0,
                product_type: 0,
                product_id: 0,
                supported: vec![],
            });
        }

        let body = Body::unpack_from_slice(packet.body()).map_err(Error::Unpack)?;

        let supported = bitmap::ids(&body.function_bitmap)
            .filter_map(|id| u8::try_from(id).ok())
            .map(MessageKind::from)
            .collect();

        Ok(Self {
            application_version: body.application_version,
            application_revision: body.application_revision,
            manufacturer_id: body.manufacturer_id,
            product_type: body.product_type,
            product_id: body.product_id,
            supported,
            packet,
        })
    }

    #[inline]
    fn packet(&self) -> &Packet {
        &self.packet
    }
}

impl Discovery for SerialApiGetCapabilities {}

impl Display for SerialApiGetCapabilities {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if !self.is_response() {
            return write!(f, "capabilities request");
        }

        write!(
            f,
            "capabilities: application {}.{}, manufacturer 0x{:04x}, product 0x{:04x}/0x{:04x}, {} functions",
            self.application_version,
            self.application_revision,
            self.manufacturer_id,
            self.product_type,
            self.product_id,
            self.supported.len(),
        )
    }
}
