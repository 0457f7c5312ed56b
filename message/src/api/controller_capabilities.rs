use std::fmt::{
    Display,
    Formatter,
};

use crate::{
    api::{
        Discovery,
        Form,
        Message,
        Shape,
    },
    MessageKind,
    Packet,
    Result,
};

pub mod flags {
    pub const SECONDARY: u8 = 0x01;
    pub const ON_OTHER_NETWORK: u8 = 0x02;
    pub const SIS_PRESENT: u8 = 0x04;
    pub const REAL_PRIMARY: u8 = 0x08;
    pub const SUC: u8 = 0x10;
}

/// `ZW_GET_CONTROLLER_CAPABILITIES`: this controller's role in its network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZwGetControllerCapabilities {
    packet:       Packet,
    capabilities: u8,
}

impl ZwGetControllerCapabilities {
    #[inline]
    pub fn capabilities(&self) -> u8 {
        self.capabilities
    }

    #[inline]
    fn has(&self, flag: u8) -> bool {
        self.capabilities & flag != 0
    }

    #[inline]
    pub fn is_secondary(&self) -> bool {
        self.has(flags::SECONDARY)
    }

    #[inline]
    pub fn is_on_other_network(&self) -> bool {
        self.has(flags::ON_OTHER_NETWORK)
    }

    #[inline]
    pub fn is_sis_present(&self) -> bool {
        self.has(flags::SIS_PRESENT)
    }

    #[inline]
    pub fn is_real_primary(&self) -> bool {
        self.has(flags::REAL_PRIMARY)
    }

    #[inline]
    pub fn is_suc(&self) -> bool {
        self.has(flags::SUC)
    }
}

impl Message for ZwGetControllerCapabilities {
    const KIND: MessageKind = MessageKind::ZwGetControllerCapabilities;
    const REQUEST_SHAPE: Shape = Shape::request(0x03);
    const RESPONSE_SHAPE: Shape = Shape::response(0x04);

    fn from_form(packet: Packet, form: Form) -> Result<Self> {
        let capabilities = match form {
            Form::Request => 0,
            Form::Response => packet.body().first().copied().unwrap_or_default(),
        };

        Ok(Self {
            packet,
            capabilities,
        })
    }

    #[inline]
    fn packet(&self) -> &Packet {
        &self.packet
    }
}

impl Discovery for ZwGetControllerCapabilities {}

impl Display for ZwGetControllerCapabilities {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if !self.is_response() {
            return write!(f, "controller capabilities request");
        }

        let names = [
            (flags::SECONDARY, "secondary"),
            (flags::ON_OTHER_NETWORK, "on other network"),
            (flags::SIS_PRESENT, "sis present"),
            (flags::REAL_PRIMARY, "real primary"),
            (flags::SUC, "suc"),
        ]
        .into_iter()
        .filter(|&(flag, _)| self.has(flag))
        .map(|(_, name)| name)
        .collect::<Vec<_>>();

        write!(f, "controller capabilities 0x{:02x} [{}]", self.capabilities, names.join(", "))
    }
}
