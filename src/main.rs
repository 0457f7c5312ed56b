use eyre::Result;
use structopt::StructOpt as _;
use tokio::io::{
    AsyncRead,
    AsyncWrite,
};

use message::{
    api::{
        Decoded,
        Discovery,
        Message,
        SerialApiGetCapabilities,
        SerialApiGetInitData,
        ZwGetControllerCapabilities,
        ZwSendData,
    },
    ParserConfig,
    UnknownKindPolicy,
};
use runtime::{
    Controller,
    Error,
};
use util::build;

pub use crate::options::{
    Command,
    Options,
};

mod options;
mod trace;

#[tokio::main]
async fn main() -> Result<()> {
    util::bootstrap!(
        "starting {} {} (built at {} with rustc {} {})",
        build::PACKAGE,
        build::VERSION,
        build::BUILD_TIMESTAMP,
        build::RUSTC_SEMVER,
        build::RUSTC_COMMIT_HASH,
    );

    let options: Options = Options::from_args();

    trace::init(options.pretty)?;

    tracing::info!(
        application = build::PACKAGE,
        version = build::VERSION,
        built_at = build::BUILD_TIMESTAMP,
        using_rustc = build::RUSTC_SEMVER,
        "tracing subsystem initialized"
    );

    let unknown_kind = if options.lenient {
        UnknownKindPolicy::Accept
    } else {
        UnknownKindPolicy::Reject
    };

    let config = runtime::Config {
        parser: ParserConfig {
            unknown_kind,
        },
        ..Default::default()
    };

    let mut controller = runtime::connect(
        &options.serial_port,
        options.baud,
        !options.no_flow_control,
        config,
    )
    .await?;

    match options.command {
        Command::Info => info(&mut controller).await,
        Command::BasicSet {
            node,
            on,
            off: _,
            callback_id,
        } => basic_set(&mut controller, node, on, callback_id).await,
        Command::Monitor => monitor(&mut controller).await,
    }
}

async fn info<R, W>(controller: &mut Controller<R, W>) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let init = controller
        .request::<SerialApiGetInitData>(&SerialApiGetInitData::create_request())
        .await?;
    println!("{init}");

    let capabilities = controller
        .request::<SerialApiGetCapabilities>(&SerialApiGetCapabilities::create_request())
        .await?;
    println!("{capabilities}");

    let unsupported = [
        message::MessageKind::ZwSendData,
        message::MessageKind::ZwGetControllerCapabilities,
    ]
    .into_iter()
    .filter(|&kind| !capabilities.supports(kind))
    .collect::<Vec<_>>();

    if !unsupported.is_empty() {
        tracing::warn!(?unsupported, "controller does not advertise every function this tool uses");
    }

    let controller_caps = controller
        .request::<ZwGetControllerCapabilities>(&ZwGetControllerCapabilities::create_request())
        .await?;
    println!("{controller_caps}");

    Ok(())
}

#[tracing::instrument(skip(controller))]
async fn basic_set<R, W>(
    controller: &mut Controller<R, W>,
    node: u8,
    on: bool,
    callback_id: Option<u8>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let request = ZwSendData::basic_set(node, on, callback_id);
    let response = controller.request::<ZwSendData>(&request).await?;

    println!("{response}");

    if !response.accepted() {
        eyre::bail!("controller refused to queue the frame");
    }

    Ok(())
}

async fn monitor<R, W>(controller: &mut Controller<R, W>) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let packet = tokio::select! {
            result = controller.recv() => result,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                return Ok(());
            },
        };

        let packet = match packet {
            Ok(packet) => packet,
            Err(Error::Frame(e)) => {
                println!("! {e}");
                continue;
            },
            Err(Error::Closed) => {
                tracing::info!("serial port closed");
                return Ok(());
            },
            Err(e) => return Err(e.into()),
        };

        println!("< {packet}");

        let decoded = Decoded::from_packet(packet);
        util::trace_catch!(decoded, "decoding monitored packet");

        if let Some(line) = decoded.ok().as_ref().and_then(annotation) {
            println!("  {line}");
        }
    }
}

/// Decoded view of a frame received from the controller, if worth printing.
///
/// Inbound `ZW_SEND_DATA` requests are delivery callbacks, not sends, so they get no annotation.
fn annotation(decoded: &Decoded) -> Option<String> {
    match decoded {
        Decoded::Other(_) => None,
        Decoded::SendData(send) if !send.is_response() => None,
        decoded => Some(decoded.to_string()),
    }
}
