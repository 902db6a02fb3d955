use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Default filter when `RUST_LOG` is not set
const DEFAULT_FILTER: &str = "shardstore=debug,tower_http=debug";

/// Initialize console tracing with a compact format.
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing() -> Result<(), anyhow::Error> {
    let console_fmt = tracing_subscriber::fmt::layer().event_format(
        Format::default()
            .compact()
            .with_target(false)
            .without_time(),
    );

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(console_fmt)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
