use message::Preamble;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed frame: {0}")]
    Frame(#[source] message::Error),

    #[error("decoding message: {0}")]
    Message(#[from] message::Error),

    #[error("controller rejected the frame ({0:?})")]
    Rejected(Preamble),

    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("connection closed")]
    Closed,

    #[error(transparent)]
    Serial(#[from] tokio_serial::Error),
}

impl From<codec::Error> for Error {
    fn from(e: codec::Error) -> Self {
        match e {
            codec::Error::Io(e) => Error::Io(e),
        }
    }
}
