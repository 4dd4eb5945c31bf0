use anyhow::{Context, Result};
use clap::Parser;
use genmedia_server::models::Config;
use genmedia_server::pipeline::Pipeline;
use genmedia_server::server;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "genmedia-server")]
#[command(about = "Serve text and image generation endpoints")]
struct CliArgs {
    /// Host address to bind, overriding HOST.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, overriding PORT.
    #[arg(long)]
    port: Option<u16>,
}

fn bind_address(config: &Config, args: &CliArgs) -> String {
    format!(
        "{}:{}",
        args.host.as_deref().unwrap_or(&config.host),
        args.port.unwrap_or(config.port)
    )
}

async fn serve(args: CliArgs) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let pipeline = Pipeline::from_config(&config).context("Failed to build pipeline")?;

    let app = server::router(Arc::new(pipeline));

    let address = bind_address(&config, &args);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "genmedia_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting genmedia-server");

    let args = CliArgs::parse();

    if let Err(e) = serve(args).await {
        error!("Server failed: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
