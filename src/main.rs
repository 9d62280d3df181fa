//! Pluggable server-side-rendering host.
//!
//! Owns the lifecycle of an HTTP server that renders a client application
//! on the server, with a live-reloading development mode backed by an
//! incremental bundler and a typed hook system for plugins.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use ssr_host::config::loader::load_options;
use ssr_host::config::ServerOptions;
use ssr_host::plugin::StoreHydrationPlugin;
use ssr_host::Server;

#[derive(Parser)]
#[command(name = "ssr-host")]
#[command(about = "Pluggable server-side-rendering host", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "ssr-host.toml")]
    config: PathBuf,

    /// Override the configured bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the configured bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut options = if cli.config.exists() {
        load_options(&cli.config)?
    } else {
        ServerOptions::default()
    };
    if let Some(host) = cli.host {
        options.http.host = host;
    }
    if let Some(port) = cli.port {
        options.http.port = port;
    }

    let server = Server::new(options)?;
    server.add_plugin(Arc::new(StoreHydrationPlugin::new()), serde_json::Value::Null);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        dev = server.options().dev.is_some(),
        "ssr-host starting"
    );

    server.start().await?;
    server.wait_shutdown().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
