//! CLI binary for the population dashboard.
//!
//! # Usage
//!
//! ```bash
//! popdash
//! popdash --port 8080 --no-browser
//! popdash --api-url http://127.0.0.1:8000
//! POPDASH_PORT=9000 popdash --bind 127.0.0.1
//! ```

use std::net::IpAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use population_dashboard::dashboard::{server, HttpPopulationApi, DEFAULT_API_URL};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "popdash")]
#[command(about = "Analytics dashboard for the world population API")]
#[command(version)]
struct Args {
    /// Base URL of the population REST API
    #[arg(long, env = "POPDASH_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Port for web server
    #[arg(short, long, env = "POPDASH_PORT", default_value = "8501")]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Don't open browser automatically
    #[arg(long)]
    no_browser: bool,

    /// Seconds of inactivity before a session is dropped
    #[arg(long, env = "POPDASH_SESSION_IDLE_SECS", default_value = "1800")]
    session_idle_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG takes precedence, fallback to info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!(
        api_url = %args.api_url,
        bind = %args.bind,
        port = args.port,
        open_browser = !args.no_browser,
        session_idle_secs = args.session_idle_secs,
        "Starting population dashboard"
    );

    let api = HttpPopulationApi::new(&args.api_url)
        .with_context(|| format!("invalid --api-url {}", args.api_url))?;

    let config = server::ServerConfig {
        bind: args.bind,
        port: args.port,
        open_browser: !args.no_browser,
        session_idle_timeout: Duration::from_secs(args.session_idle_secs),
    };

    server::run_server(api, config).await
}
