use std::fmt::{
    Display,
    Formatter,
};

use bytes::{
    BufMut,
    BytesMut,
};
use packed_struct::prelude::*;
use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    checksum,
    InvalidFrame,
    MessageKind,
    UnknownKindPolicy,
};

/// Length byte of a structured frame with an empty body: packet type, message kind, checksum.
pub const MIN_LENGTH: u8 = 3;

/// Longest body a single length byte can describe.
pub const MAX_BODY_LEN: usize = (u8::MAX - MIN_LENGTH) as usize;

/// First byte of every frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PrimitiveEnum_u8)]
#[repr(u8)]
pub enum Preamble {
    Sof = 0x01,
    Ack = 0x06,
    Nak = 0x15,
    Can = 0x18,
}

impl Preamble {
    /// ACK, NAK and CAN are complete single-byte frames.
    #[inline]
    pub fn is_control(self) -> bool {
        self != Preamble::Sof
    }
}

impl From<Preamble> for u8 {
    #[inline]
    fn from(p: Preamble) -> Self {
        p.to_primitive()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PrimitiveEnum_u8)]
#[repr(u8)]
pub enum PacketType {
    Request  = 0x00,
    Response = 0x01,
}

impl From<PacketType> for u8 {
    #[inline]
    fn from(t: PacketType) -> Self {
        t.to_primitive()
    }
}

/// Unvalidated frame fields, as they would appear on the wire.
///
/// `body: None` and `body: Some(vec![])` differ for control frames: a control frame may not carry
/// a body at all, not even an empty one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fields {
    pub preamble:    u8,
    pub length:      Option<u8>,
    pub packet_type: Option<u8>,
    pub kind:        Option<u8>,
    #[serde(default)]
    pub body:        Option<Vec<u8>>,
    pub checksum:    Option<u8>,
}

impl Fields {
    #[inline]
    pub fn new(preamble: impl Into<u8>) -> Self {
        Self {
            preamble: preamble.into(),
            ..Default::default()
        }
    }
}

/// One validated frame.
///
/// Control frames (ACK/NAK/CAN) carry nothing but their preamble. Structured frames always carry a
/// length consistent with the body, a packet type and a message kind; the checksum, when present,
/// is known to be correct.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Fields", into = "Fields")]
pub struct Packet {
    preamble:    Preamble,
    length:      Option<u8>,
    packet_type: Option<PacketType>,
    kind:        Option<MessageKind>,
    body:        Vec<u8>,
    checksum:    Option<u8>,
}

impl Packet {
    /// Validate `fields` into a packet, rejecting unknown message kinds.
    #[inline]
    pub fn new(fields: Fields) -> Result<Self, InvalidFrame> {
        Self::validate(fields, UnknownKindPolicy::Reject)
    }

    pub fn validate(fields: Fields, policy: UnknownKindPolicy) -> Result<Self, InvalidFrame> {
        let Fields {
            preamble,
            length,
            packet_type,
            kind,
            body,
            checksum,
        } = fields;

        let preamble =
            Preamble::from_primitive(preamble).ok_or(InvalidFrame::UnknownPreamble(preamble))?;

        if preamble.is_control() {
            if length.is_some()
                || packet_type.is_some()
                || kind.is_some()
                || body.is_some()
                || checksum.is_some()
            {
                return Err(InvalidFrame::ControlWithFields(preamble));
            }

            return Ok(Self::control(preamble));
        }

        let body = body.unwrap_or_default();
        let length = length.ok_or(InvalidFrame::MissingLength)?;

        let expected = usize::from(MIN_LENGTH) + body.len();
        if usize::from(length) != expected {
            return Err(InvalidFrame::LengthMismatch {
                declared: length,
                expected,
            });
        }

        let packet_type = packet_type.ok_or(InvalidFrame::MissingPacketType)?;
        let packet_type = PacketType::from_primitive(packet_type)
            .ok_or(InvalidFrame::UnknownPacketType(packet_type))?;

        let kind = MessageKind::from(kind.ok_or(InvalidFrame::MissingMessageKind)?);
        if !kind.is_known() && policy == UnknownKindPolicy::Reject {
            return Err(InvalidFrame::UnknownMessageKind(kind.into()));
        }

        let computed = checksum::compute(length, packet_type, kind, &body);
        match checksum {
            Some(stored) if stored != computed => {
                Err(InvalidFrame::ChecksumMismatch {
                    stored,
                    computed,
                })
            },
            _ => Ok(Self::structured(length, packet_type, kind, body, checksum)),
        }
    }

    /// Build a frame, filling in the length and checksum from the supplied fields.
    ///
    /// Only the fields that are present count towards the length. A structured frame with
    /// nothing to checksum has no length and is rejected.
    pub fn create(
        preamble: Preamble,
        packet_type: Option<PacketType>,
        kind: Option<MessageKind>,
        body: &[u8],
    ) -> Result<Self, InvalidFrame> {
        let computed_length =
            usize::from(packet_type.is_some()) + usize::from(kind.is_some()) + body.len();

        let (length, checksum) = if computed_length > 0 {
            let length =
                u8::try_from(computed_length + 1).map_err(|_| InvalidFrame::BodyTooLong(body.len()))?;

            let mut raw = Vec::with_capacity(computed_length);
            raw.push(length);
            raw.extend(packet_type.map(u8::from));
            raw.extend(kind.map(u8::from));
            raw.extend_from_slice(body);

            (Some(length), Some(checksum::over(&raw)))
        } else {
            (None, None)
        };

        Self::new(Fields {
            preamble: preamble.into(),
            length,
            packet_type: packet_type.map(u8::from),
            kind: kind.map(u8::from),
            body: (!body.is_empty()).then(|| body.to_vec()),
            checksum,
        })
    }

    #[inline]
    pub fn request(kind: MessageKind, body: &[u8]) -> Result<Self, InvalidFrame> {
        Self::create(Preamble::Sof, Some(PacketType::Request), Some(kind), body)
    }

    #[inline]
    pub fn response(kind: MessageKind, body: &[u8]) -> Result<Self, InvalidFrame> {
        Self::create(Preamble::Sof, Some(PacketType::Response), Some(kind), body)
    }

    /// A checksummed frame with no body.
    pub fn command(packet_type: PacketType, kind: MessageKind) -> Self {
        let checksum = checksum::compute(MIN_LENGTH, packet_type, kind, &[]);
        Self::structured(MIN_LENGTH, packet_type, kind, vec![], Some(checksum))
    }

    #[inline]
    pub fn ack() -> Self {
        Self::control(Preamble::Ack)
    }

    #[inline]
    pub fn nak() -> Self {
        Self::control(Preamble::Nak)
    }

    #[inline]
    pub fn can() -> Self {
        Self::control(Preamble::Can)
    }

    #[inline]
    pub(crate) fn control(preamble: Preamble) -> Self {
        debug_assert!(preamble.is_control());

        Self {
            preamble,
            length: None,
            packet_type: None,
            kind: None,
            body: vec![],
            checksum: None,
        }
    }

    #[inline]
    pub(crate) fn structured(
        length: u8,
        packet_type: PacketType,
        kind: MessageKind,
        body: Vec<u8>,
        checksum: Option<u8>,
    ) -> Self {
        debug_assert_eq!(usize::from(length), usize::from(MIN_LENGTH) + body.len());

        Self {
            preamble: Preamble::Sof,
            length: Some(length),
            packet_type: Some(packet_type),
            kind: Some(kind),
            body,
            checksum,
        }
    }

    #[inline]
    pub fn preamble(&self) -> Preamble {
        self.preamble
    }

    #[inline]
    pub fn length(&self) -> Option<u8> {
        self.length
    }

    #[inline]
    pub fn packet_type(&self) -> Option<PacketType> {
        self.packet_type
    }

    #[inline]
    pub fn kind(&self) -> Option<MessageKind> {
        self.kind
    }

    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    #[inline]
    pub fn checksum(&self) -> Option<u8> {
        self.checksum
    }

    #[inline]
    pub fn is_special(&self) -> bool {
        self.preamble.is_control()
    }

    #[inline]
    pub fn is_request(&self) -> bool {
        self.packet_type == Some(PacketType::Request)
    }

    #[inline]
    pub fn is_response(&self) -> bool {
        self.packet_type == Some(PacketType::Response)
    }

    /// Control frames always validate. A structured frame without a checksum never does.
    pub fn validate_checksum(&self) -> bool {
        match self.checksum {
            None => self.is_special(),
            Some(stored) => {
                let bytes = self.bytes();
                checksum::over(&bytes[1..bytes.len() - 1]) == stored
            },
        }
    }

    #[inline]
    pub fn wire_len(&self) -> usize {
        1 + usize::from(self.length.is_some())
            + usize::from(self.packet_type.is_some())
            + usize::from(self.kind.is_some())
            + self.body.len()
            + usize::from(self.checksum.is_some())
    }

    /// The frame as sent on the wire.
    pub fn bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.wire_len());

        out.push(self.preamble.into());
        out.extend(self.length);
        out.extend(self.packet_type.map(u8::from));
        out.extend(self.kind.map(u8::from));
        out.extend_from_slice(&self.body);
        out.extend(self.checksum);

        out
    }

    pub fn write_to(&self, dst: &mut BytesMut) {
        dst.reserve(self.wire_len());
        dst.put_slice(&self.bytes());
    }
}

impl TryFrom<Fields> for Packet {
    type Error = InvalidFrame;

    #[inline]
    fn try_from(fields: Fields) -> Result<Self, Self::Error> {
        Self::new(fields)
    }
}

impl From<Packet> for Fields {
    fn from(p: Packet) -> Self {
        let special = p.is_special();

        Fields {
            preamble:    p.preamble.into(),
            length:      p.length,
            packet_type: p.packet_type.map(u8::from),
            kind:        p.kind.map(u8::from),
            body:        (!special).then_some(p.body),
            checksum:    p.checksum,
        }
    }
}

impl Display for Packet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_special() {
            return write!(f, "{:?}", self.preamble);
        }

        let packet_type = match self.packet_type {
            Some(t) => format!("{t:?}"),
            None => "-".to_owned(),
        };

        let kind = match self.kind {
            Some(k) => k.to_string(),
            None => "-".to_owned(),
        };

        let checksum = match self.checksum {
            Some(c) => format!("0x{c:02x}"),
            None => "none".to_owned(),
        };

        write!(
            f,
            "{packet_type} {kind} [len {}] body: 0x{} (checksum: {checksum})",
            self.length.unwrap_or_default(),
            hex::encode(&self.body)
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sof(length: Option<u8>, packet_type: Option<u8>, kind: Option<u8>) -> Fields {
        Fields {
            preamble: Preamble::Sof.into(),
            length,
            packet_type,
            kind,
            ..Default::default()
        }
    }

    #[test]
    fn control_frames() {
        for (packet, preamble, byte) in [
            (Packet::ack(), Preamble::Ack, 0x06),
            (Packet::nak(), Preamble::Nak, 0x15),
            (Packet::can(), Preamble::Can, 0x18),
        ] {
            assert_eq!(preamble, packet.preamble());
            assert_eq!(None, packet.length());
            assert_eq!(None, packet.packet_type());
            assert_eq!(None, packet.kind());
            assert!(packet.body().is_empty());
            assert_eq!(None, packet.checksum());

            assert!(packet.validate_checksum());
            assert_eq!(vec![byte], packet.bytes());

            assert!(packet.is_special());
            assert!(!packet.is_request());
            assert!(!packet.is_response());

            assert_eq!(Ok(packet), Packet::new(Fields::new(byte)));
        }
    }

    #[test]
    fn control_frames_reject_fields() {
        for p in [Preamble::Ack, Preamble::Nak, Preamble::Can] {
            let expected = Err(InvalidFrame::ControlWithFields(p));

            let with = |f: fn(&mut Fields)| {
                let mut fields = Fields::new(p);
                f(&mut fields);
                Packet::new(fields)
            };

            assert_eq!(expected, with(|f| f.length = Some(1)));
            assert_eq!(expected, with(|f| f.packet_type = Some(PacketType::Request.into())));
            assert_eq!(expected, with(|f| f.kind = Some(MessageKind::ZwSendData.into())));
            assert_eq!(expected, with(|f| f.body = Some(vec![])));
            assert_eq!(expected, with(|f| f.checksum = Some(0x23)));
        }
    }

    #[test]
    fn structured_frame_errors() {
        let init_data = Some(MessageKind::SerialApiGetInitData.into());
        let request = Some(PacketType::Request.into());

        let unknown_preamble = Fields {
            preamble: 0x23,
            checksum: Some(0xfe),
            ..sof(Some(0x03), request, init_data)
        };
        assert_eq!(Err(InvalidFrame::UnknownPreamble(0x23)), Packet::new(unknown_preamble));

        let ack_with_fields = Fields {
            preamble: Preamble::Ack.into(),
            checksum: Some(0xfe),
            ..sof(Some(0x03), request, init_data)
        };
        assert_eq!(
            Err(InvalidFrame::ControlWithFields(Preamble::Ack)),
            Packet::new(ack_with_fields)
        );

        assert_eq!(Err(InvalidFrame::MissingLength), Packet::new(sof(None, request, init_data)));

        assert!(matches!(
            Packet::new(sof(Some(0x04), request, init_data)),
            Err(InvalidFrame::LengthMismatch {
                declared: 0x04,
                expected: 3,
            })
        ));

        let long_body = Fields {
            body: Some(vec![0x67]),
            checksum: Some(0x9f),
            ..sof(Some(0x05), request, init_data)
        };
        assert!(matches!(Packet::new(long_body), Err(InvalidFrame::LengthMismatch { .. })));

        assert_eq!(
            Err(InvalidFrame::MissingPacketType),
            Packet::new(sof(Some(0x03), None, init_data))
        );
        assert_eq!(
            Err(InvalidFrame::UnknownPacketType(0x03)),
            Packet::new(sof(Some(0x03), Some(0x03), init_data))
        );
        assert_eq!(
            Err(InvalidFrame::MissingMessageKind),
            Packet::new(sof(Some(0x03), request, None))
        );
        assert_eq!(
            Err(InvalidFrame::UnknownMessageKind(0xff)),
            Packet::new(sof(Some(0x03), request, Some(0xff)))
        );

        let bad_checksum = Fields {
            checksum: Some(0xfd),
            ..sof(Some(0x03), request, init_data)
        };
        assert_eq!(
            Err(InvalidFrame::ChecksumMismatch {
                stored:   0xfd,
                computed: 0xfe,
            }),
            Packet::new(bad_checksum)
        );
    }

    #[test]
    fn unknown_kind_accepted_by_policy() {
        let fields = Fields {
            checksum: Some(0xff ^ 0x03 ^ 0x00 ^ 0x03),
            ..sof(Some(0x03), Some(0x00), Some(0x03))
        };

        let packet = Packet::validate(fields, UnknownKindPolicy::Accept).unwrap();
        assert_eq!(Some(MessageKind::Unknown(0x03)), packet.kind());
        assert!(packet.validate_checksum());
    }

    #[test]
    fn missing_checksum_is_allowed_but_invalid() {
        let packet = Packet::new(sof(
            Some(0x03),
            Some(PacketType::Request.into()),
            Some(MessageKind::SerialApiGetInitData.into()),
        ))
        .unwrap();

        assert!(!packet.validate_checksum());
        assert_eq!(vec![0x01, 0x03, 0x00, 0x02], packet.bytes());
    }

    #[test]
    fn create_no_body() {
        let packet = Packet::create(
            Preamble::Sof,
            Some(PacketType::Request),
            Some(MessageKind::SerialApiGetInitData),
            &[],
        )
        .unwrap();

        assert_eq!(Preamble::Sof, packet.preamble());
        assert_eq!(Some(0x03), packet.length());
        assert_eq!(Some(PacketType::Request), packet.packet_type());
        assert_eq!(Some(MessageKind::SerialApiGetInitData), packet.kind());
        assert!(packet.body().is_empty());
        assert_eq!(Some(0xfe), packet.checksum());

        assert_eq!(vec![0x01, 0x03, 0x00, 0x02, 0xfe], packet.bytes());

        assert!(!packet.is_special());
        assert!(packet.is_request());
        assert!(!packet.is_response());
        assert!(packet.validate_checksum());

        assert_eq!(packet, Packet::command(PacketType::Request, MessageKind::SerialApiGetInitData));
    }

    #[test]
    fn create_with_body() {
        let packet = Packet::response(MessageKind::SerialApiGetInitData, &[0x45, 0x78]).unwrap();

        assert_eq!(Some(0x05), packet.length());
        assert_eq!(&[0x45, 0x78], packet.body());
        assert_eq!(Some(0xc4), packet.checksum());
        assert_eq!(vec![0x01, 0x05, 0x01, 0x02, 0x45, 0x78, 0xc4], packet.bytes());

        assert!(packet.is_response());
        assert!(packet.validate_checksum());
    }

    #[test]
    fn create_control() {
        assert_eq!(Ok(Packet::ack()), Packet::create(Preamble::Ack, None, None, &[]));
        assert_eq!(
            Err(InvalidFrame::ControlWithFields(Preamble::Nak)),
            Packet::create(Preamble::Nak, None, None, &[0x01])
        );
    }

    #[test]
    fn create_bare_sof_is_rejected() {
        assert_eq!(Err(InvalidFrame::MissingLength), Packet::create(Preamble::Sof, None, None, &[]));
    }

    #[test]
    fn create_oversized_body() {
        let body = vec![0u8; MAX_BODY_LEN + 1];

        assert_eq!(
            Err(InvalidFrame::BodyTooLong(body.len())),
            Packet::request(MessageKind::ZwSendData, &body)
        );
        assert!(Packet::request(MessageKind::ZwSendData, &body[1..]).is_ok());
    }

    #[test]
    fn write_to_appends() {
        let packet = Packet::command(PacketType::Request, MessageKind::ZwGetControllerCapabilities);

        let mut dst = BytesMut::from(&[0x06][..]);
        packet.write_to(&mut dst);

        assert_eq!(&[0x06, 0x01, 0x03, 0x00, 0x05, 0xf9], dst.as_ref());
    }

    #[test]
    fn test_serde() {
        let packet = Packet::request(MessageKind::ZwSendData, &[0x02, 0x01]).unwrap();

        let json = serde_json::to_string(&packet).unwrap();
        let back: Packet = serde_json::from_str(&json).unwrap();
        assert_eq!(packet, back);

        let ack: Packet = serde_json::from_str(r#"{"preamble":6}"#).unwrap();
        assert_eq!(Packet::ack(), ack);

        let bad = r#"{"preamble":1,"length":3,"packet_type":0,"kind":2,"checksum":0}"#;
        assert!(serde_json::from_str::<Packet>(bad).is_err());
    }

    #[test]
    fn display() {
        assert_eq!("Ack", Packet::ack().to_string());

        let packet = Packet::response(MessageKind::ZwSendData, &[0x01]).unwrap();
        assert_eq!(
            format!("Response ZwSendData [len 4] body: 0x01 (checksum: 0x{:02x})", 0xff ^ 0x04 ^ 0x01 ^ 0x13 ^ 0x01),
            packet.to_string()
        );
    }
}
