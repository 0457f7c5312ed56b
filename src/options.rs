use structopt::StructOpt;

#[derive(Debug, Clone, PartialEq, Eq, StructOpt)]
#[structopt(about = "Talk to a Z-Wave controller over its serial API")]
pub struct Options {
    #[structopt(long = "serial_port")]
    pub serial_port: String,

    #[structopt(long, default_value = "115200")]
    pub baud: u32,

    /// Disable RTS/CTS flow control.
    #[structopt(long)]
    pub no_flow_control: bool,

    /// Accept frames with message kinds this tool doesn't know.
    #[structopt(long)]
    pub lenient: bool,

    /// Multi-line log output.
    #[structopt(long)]
    pub pretty: bool,

    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, StructOpt)]
pub enum Command {
    /// Query init data, capabilities and controller capabilities.
    Info,

    /// Switch a node on or off.
    BasicSet {
        #[structopt(long)]
        node: u8,

        #[structopt(long, conflicts_with = "off", required_unless = "off")]
        on: bool,

        #[structopt(long)]
        off: bool,

        #[structopt(long)]
        callback_id: Option<u8>,
    },

    /// Print every frame received until the port closes or ctrl-c.
    Monitor,
}
