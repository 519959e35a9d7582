use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const ENV_LOG: &str = "AIRULES_LOG";

/// Filter used when `AIRULES_LOG` is unset: `warn`, or `debug` with `-v`.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "warn" }
}

/// Installs a stderr subscriber so log lines never mix with command output.
///
/// `AIRULES_LOG` takes `EnvFilter` syntax and wins over the default.
pub fn init(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact();

    let filter_layer = EnvFilter::try_from_env(ENV_LOG)
        .or_else(|_| EnvFilter::try_new(default_directive(verbose)))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
