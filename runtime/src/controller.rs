use futures::{
    SinkExt,
    StreamExt,
};
use tokio::io::{
    AsyncRead,
    AsyncWrite,
};

use codec::{
    tokio_codec::{
        FramedRead,
        FramedWrite,
    },
    PacketCodec,
};
use message::{
    api::Message,
    MessageKind,
    Packet,
    Preamble,
};

use crate::{
    Config,
    Error,
    Result,
};

/// Host side of a serial API session.
///
/// Owns one codec per direction. Not meant to be shared: drive it from a single task.
pub struct Controller<R, W> {
    read:   FramedRead<R, PacketCodec>,
    write:  FramedWrite<W, PacketCodec>,
    config: Config,
}

impl<R, W> Controller<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(read: R, write: W, config: Config) -> Self {
        Self {
            read: FramedRead::new(read, PacketCodec::with_config(config.parser)),
            write: FramedWrite::new(write, PacketCodec::new()),
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[tracing::instrument(skip(self, packet), fields(%packet), level = "debug", err)]
    pub async fn send(&mut self, packet: &Packet) -> Result<()> {
        self.write.send(packet).await?;
        Ok(())
    }

    /// Next packet from the controller.
    ///
    /// Structured frames are ACKed before being returned when `auto_ack` is set. A malformed frame
    /// is reported as [`Error::Frame`]; the stream is still usable afterwards.
    pub async fn recv(&mut self) -> Result<Packet> {
        let frame = self.read.next().await.ok_or(Error::Closed)??;

        let packet = match frame {
            Ok(packet) => packet,
            Err(e) => {
                tracing::warn!(error = %e, "discarding malformed frame");
                return Err(Error::Frame(e));
            },
        };

        tracing::trace!(%packet, "received");

        if self.config.auto_ack && !packet.is_special() {
            self.send(&Packet::ack()).await?;
        }

        Ok(packet)
    }

    /// Send `request`, wait for the controller to ACK it, then wait for the matching response.
    ///
    /// Unrelated frames arriving in between are logged and dropped. There are no retries.
    #[tracing::instrument(skip(self, request), fields(%request, kind = %M::KIND), err(Display))]
    pub async fn request<M>(&mut self, request: &Packet) -> Result<M>
    where
        M: Message,
    {
        self.send(request).await?;

        let ack_timeout = self.config.ack_timeout;
        tokio::time::timeout(ack_timeout, self.await_ack())
            .await
            .map_err(|_| Error::Timeout("ack"))??;

        tracing::debug!("request acknowledged, awaiting response");

        let response_timeout = self.config.response_timeout;
        let response = tokio::time::timeout(response_timeout, self.await_response(M::KIND))
            .await
            .map_err(|_| Error::Timeout("response"))??;

        Ok(M::decode(response)?)
    }

    async fn await_ack(&mut self) -> Result<()> {
        loop {
            let packet = match self.recv().await {
                Ok(packet) => packet,
                Err(Error::Frame(_)) => continue,
                Err(e) => return Err(e),
            };

            match packet.preamble() {
                Preamble::Ack => return Ok(()),
                pre @ (Preamble::Nak | Preamble::Can) => return Err(Error::Rejected(pre)),
                Preamble::Sof => tracing::debug!(%packet, "skipping frame while awaiting ack"),
            }
        }
    }

    async fn await_response(&mut self, kind: MessageKind) -> Result<Packet> {
        loop {
            let packet = match self.recv().await {
                Ok(packet) => packet,
                Err(Error::Frame(_)) => continue,
                Err(e) => return Err(e),
            };

            if packet.is_response() && packet.kind() == Some(kind) {
                return Ok(packet);
            }

            tracing::debug!(%packet, "skipping frame while awaiting response");
        }
    }
}
