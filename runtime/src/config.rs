use std::time::Duration;

use message::ParserConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// How long to wait for the controller to ACK a frame we sent.
    pub ack_timeout: Duration,

    /// How long to wait for the response to a request once it has been ACKed.
    pub response_timeout: Duration,

    /// Reply with ACK to every structured frame received.
    pub auto_ack: bool,

    pub parser: ParserConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ack_timeout:      Duration::from_millis(1600),
            response_timeout: Duration::from_secs(10),
            auto_ack:         true,
            parser:           ParserConfig::default(),
        }
    }
}
