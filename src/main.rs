/// MCP Server Entry Point
///
/// Reads the environment once to choose a transport, then runs the protocol
/// runtime until interrupted.
///
/// Environment Variables:
/// - MCP_HTTP: any non-empty value selects the HTTP transport (default: STDIO)
/// - PORT: HTTP listen port (default: 8080); only used in HTTP mode
/// - WORKER_THREADS: HTTP worker count override (default: CPU count, max 16)
/// - RUST_LOG: log filter (default: info)

use seatgeek_mcp::core::config::Transport;
use seatgeek_mcp::core::server::{self, ServerInfo};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Log to stderr: in STDIO mode stdout carries the JSON-RPC stream
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let info = ServerInfo::default();

    // One-time transport decision; an invalid PORT aborts startup
    let transport = match Transport::from_env() {
        Ok(t) => t,
        Err(e) => {
            error!("configuration error: {e}");
            std::process::exit(1);
        }
    };

    match transport {
        Transport::Stdio => server::run_server_stdio(info).await?,
        Transport::Http { host, port } => server::run_server_http(info, host, port).await?,
    }

    info!("graceful shutdown");
    Ok(())
}
