//! Development gateway for the IoT management console.
//!
//! Forwards API prefixes to their backend services and serves the built
//! browser client for everything else.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use iot_console::config::{load_or_default, ConfigError};
use iot_console::lifecycle::{signals, Shutdown};
use iot_console::observability::{logging, metrics};
use iot_console::GatewayServer;

#[derive(Parser)]
#[command(name = "iot-console")]
#[command(about = "Development gateway for the IoT management console", long_about = None)]
struct Args {
    /// Gateway configuration file (TOML). Built-in defaults when omitted.
    #[arg(short, long, env = "CONSOLE_CONFIG")]
    config: Option<PathBuf>,

    /// Dispatch profile, overriding `proxy.profile`.
    #[arg(short, long, env = "CONSOLE_PROFILE")]
    profile: Option<String>,

    /// Bind address, overriding `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match load_or_default(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Err(e.into());
        }
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind.to_string();
    }

    logging::init_logging(&config.observability);
    tracing::info!("iot-console v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config = ?args.config,
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        request_timeout_secs = config.timeouts.request_secs,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = match GatewayServer::new(config, args.profile.as_deref()) {
        Ok(server) => server,
        Err(e @ ConfigError::UnknownProfile { .. }) | Err(e @ ConfigError::Rule { .. }) => {
            tracing::error!(error = %e, "Cannot build dispatch table");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(&shutdown);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
