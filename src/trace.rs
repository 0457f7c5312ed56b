use std::str::FromStr;

use tracing_subscriber::{
    fmt::format::FmtSpan,
    prelude::*,
    EnvFilter,
};

use util::bootstrap;

pub fn init(pretty: bool) -> eyre::Result<()> {
    let level_filter = mk_level_filter()?;
    bootstrap!("enabling tracing with filter directive: {}", level_filter);

    let stderr_layer =
        tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false);

    let registry = tracing_subscriber::registry();

    if pretty {
        registry.with(stderr_layer.pretty().with_filter(level_filter)).try_init()?;
    } else {
        registry
            .with(
                stderr_layer
                    .with_line_number(false)
                    .with_span_events(FmtSpan::NONE)
                    .with_filter(level_filter),
            )
            .try_init()?;
    }

    Ok(())
}

fn mk_level_filter() -> eyre::Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let default_str = {
        cfg_if::cfg_if! {
            if #[cfg(not(debug_assertions))] {
                "warn,zwlink=info,zwlink_runtime=info,zwlink_codec=info,zwlink_message=info"
            } else {
                "info,zwlink=debug,zwlink_runtime=debug,zwlink_codec=debug,zwlink_message=debug"
            }
        }
    };

    Ok(EnvFilter::from_str(default_str)?)
}
