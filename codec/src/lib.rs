//! [`tokio_util::codec`] adapter over [`PacketParser`].

pub use ::tokio_util::codec as tokio_codec;

use bytes::{
    Buf,
    BytesMut,
};
use tokio_util::codec::{
    Decoder,
    Encoder,
};
use message::{
    parser::State,
    Packet,
    PacketParser,
    ParserConfig,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One decoded item: a packet, or the framing error that discarded a frame.
///
/// Framing errors don't end the stream; the parser resynchronizes on the following byte.
pub type Frame = Result<Packet, message::Error>;

#[derive(Debug, Clone, Default)]
pub struct PacketCodec {
    parser: PacketParser,
}

impl PacketCodec {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            parser: PacketParser::with_config(config),
        }
    }

    #[inline]
    pub fn parser(&self) -> &PacketParser {
        &self.parser
    }
}

impl Decoder for PacketCodec {
    type Error = Error;
    type Item = Frame;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while src.has_remaining() {
            let byte = src.get_u8();

            match self.parser.update(byte) {
                Ok(None) => continue,
                Ok(Some(packet)) => return Ok(Some(Ok(packet))),
                Err(e) => return Ok(Some(Err(e))),
            }
        }

        Ok(None)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let result @ Some(_) = self.decode(buf)? {
            return Ok(result);
        }

        if !matches!(self.parser.state(), State::Idle) {
            tracing::debug!(state = ?self.parser.state(), "stream ended mid-frame");
            self.parser.reset();
        }

        Ok(None)
    }
}

impl Encoder<&Packet> for PacketCodec {
    type Error = Error;

    fn encode(&mut self, item: &Packet, dst: &mut BytesMut) -> Result<(), Self::Error> {
        tracing::trace!(bytes = %hex::encode(item.bytes()), "encoding packet");

        dst.reserve(item.wire_len());
        item.write_to(dst);

        Ok(())
    }
}

impl Encoder<Packet> for PacketCodec {
    type Error = Error;

    #[inline]
    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.encode(&item, dst)
    }
}
