use std::fmt::{
    Display,
    Formatter,
};

macro_rules! message_kinds {
    ($( $(#[$meta:meta])* $name:ident = $value:literal ),* $(,)?) => {
        /// Serial API function identifier carried in the fourth byte of a structured frame.
        ///
        /// `Unknown` only ever holds bytes outside the catalogue when produced by
        /// [`MessageKind::from`].
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum MessageKind {
            $( $(#[$meta])* $name, )*
            Unknown(u8),
        }

        impl MessageKind {
            pub const KNOWN: &'static [MessageKind] = &[$( MessageKind::$name ),*];

            #[inline]
            pub const fn from_byte(b: u8) -> Self {
                match b {
                    $( $value => MessageKind::$name, )*
                    other => MessageKind::Unknown(other),
                }
            }

            #[inline]
            pub const fn to_byte(self) -> u8 {
                match self {
                    $( MessageKind::$name => $value, )*
                    MessageKind::Unknown(b) => b,
                }
            }
        }
    };
}

message_kinds! {
    None = 0x00,
    SerialApiGetInitData = 0x02,
    ApplicationCommandHandler = 0x04,
    ZwGetControllerCapabilities = 0x05,
    SerialApiGetCapabilities = 0x07,
    ZwSendData = 0x13,
    ZwApplicationUpdate = 0x49,
}

impl MessageKind {
    #[inline]
    pub const fn is_known(self) -> bool {
        !matches!(self, MessageKind::Unknown(_))
    }
}

impl From<u8> for MessageKind {
    #[inline]
    fn from(b: u8) -> Self {
        Self::from_byte(b)
    }
}

impl From<MessageKind> for u8 {
    #[inline]
    fn from(kind: MessageKind) -> Self {
        kind.to_byte()
    }
}

impl Display for MessageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::Unknown(b) => write!(f, "Unknown(0x{b:02x})"),
            known => write!(f, "{known:?}"),
        }
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn catalogue() {
        let bytes = MessageKind::KNOWN.iter().map(|&k| u8::from(k)).collect::<Vec<_>>();
        assert_eq!(bytes, vec![0x00, 0x02, 0x04, 0x05, 0x07, 0x13, 0x49]);
        assert!(MessageKind::KNOWN.iter().all(|k| k.is_known()));
    }

    #[test]
    fn unknown_is_not_known() {
        assert_eq!(MessageKind::Unknown(0xff), MessageKind::from(0xff));
        assert!(!MessageKind::from(0x03).is_known());
        assert_eq!("Unknown(0x03)", MessageKind::from(0x03).to_string());
    }

    proptest! {
        #[test]
        fn byte_conversion_is_total(b in any::<u8>()) {
            prop_assert_eq!(b, u8::from(MessageKind::from(b)));
        }
    }
}
