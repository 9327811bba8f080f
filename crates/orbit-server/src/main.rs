//! orbit-server - household assistant HTTP server

mod auth;
mod budget;
mod config;
mod prompt;
mod routes;
mod services;
mod state;
mod tools;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use orbit_agent::{OpenAiTransport, Responder, ResponderConfig};
use orbit_ai::{ChatClient, ModelConfig};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::state::AppState;

/// orbit-server - household assistant backend
#[derive(Parser, Debug)]
#[command(name = "orbit-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path (default: ~/.config/orbit/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Print an example config file and exit
    #[arg(long)]
    example_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    if args.example_config {
        print!("{}", config::example_config());
        return Ok(());
    }

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = Config::load(args.config);

    let api_key = config
        .openai_api_key()
        .context("no OpenAI API key: set OPENAI_API_KEY or [openai].api_key in the config")?;
    let mut model = ModelConfig::new(&config.openai.model);
    if let Some(base_url) = &config.openai.base_url {
        model.base_url = base_url.clone();
    }
    model.temperature = Some(config.openai.temperature);

    let registry = Arc::new(tools::build_registry(&config));
    let transport = Arc::new(OpenAiTransport::new(ChatClient::new(api_key), model));
    let responder = Responder::new(
        transport,
        registry,
        ResponderConfig::new(prompt::SYSTEM_PROMPT),
    );

    let app = routes::router(Arc::new(AppState { responder }));

    let host = args.host.unwrap_or(config.server.host);
    let port = args.port.unwrap_or(config.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, model = %config.openai.model, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
