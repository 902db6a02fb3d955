use anyhow::Context;
use clap::Parser;
use shardstore_core::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shardstore-api", version, about = "Sharded object storage server")]
struct Args {
    /// Load environment variables from this file before reading configuration
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    if let Some(path) = &args.env_file {
        dotenvy::from_path(path)
            .with_context(|| format!("Failed to load env file {}", path.display()))?;
    }

    shardstore_api::telemetry::init_tracing()?;

    let config = Config::from_env()?;

    let (state, router) = shardstore_api::setup::initialize_app(config).await?;

    shardstore_api::setup::server::start_server(state, router).await?;

    Ok(())
}
