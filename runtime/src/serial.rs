use tokio::io::{
    ReadHalf,
    WriteHalf,
};
use tokio_serial::{
    DataBits,
    FlowControl,
    Parity,
    SerialStream,
    StopBits,
};

use crate::{
    Config,
    Controller,
    Result,
};

pub const DEFAULT_BAUD: u32 = 115_200;

pub type SerialController = Controller<ReadHalf<SerialStream>, WriteHalf<SerialStream>>;

/// Open `path` at 8N1 and wrap it in a [`Controller`].
#[tracing::instrument(skip(config), level = "debug", err)]
pub async fn connect(
    path: &str,
    baud: u32,
    flow_control: bool,
    config: Config,
) -> Result<SerialController> {
    let flow_control = if flow_control {
        FlowControl::Hardware
    } else {
        FlowControl::None
    };

    let builder = tokio_serial::new(path, baud)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(flow_control);

    let stream = SerialStream::open(&builder)?;
    tracing::info!("connected to serial port");

    let (read, write) = tokio::io::split(stream);
    Ok(Controller::new(read, write, config))
}
