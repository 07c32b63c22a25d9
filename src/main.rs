//! Trademark proxy
//!
//! ```text
//!   client ──GET /path──▶ ┌──────────────────────────────────────────┐
//!                         │ net::listener   (accept, backpressure)   │
//!                         │ http::request   (line reads, GET path)   │
//!                         │ upstream        (GET origin + path)      │──▶ https://habr.com
//!                         │ rewrite         (™ words, link rewrite)  │
//!   client ◀──body─────── │ http::response  (header block + body)    │
//!                         └──────────────────────────────────────────┘
//! ```

use clap::Parser;

use trademark_proxy::config::validate_config;
use trademark_proxy::net::Listener;
use trademark_proxy::observability::logging;
use trademark_proxy::{ProxyConfig, ProxyServer, Shutdown};

#[derive(Parser)]
#[command(name = "trademark-proxy")]
#[command(about = "Proxy that marks six-letter words with a trademark sign", long_about = None)]
struct Cli {
    /// Port to listen on (all IPv4 interfaces)
    port: u16,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init()?;

    tracing::info!("trademark-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let config = ProxyConfig::with_port(cli.port);
    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            tracing::error!(%error, "Invalid configuration");
        }
        return Err(format!("{} configuration error(s)", errors.len()).into());
    }

    tracing::info!(
        bind_address = %config.listener.socket_addr(),
        upstream = %config.upstream.origin,
        request_line_timeout_secs = config.timeouts.request_line_secs,
        fetch_timeout_secs = config.timeouts.fetch_secs,
        "Configuration loaded"
    );

    let listener = Listener::bind(&config.listener)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(shutdown.trigger_on_signal());

    let server = ProxyServer::new(config);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
