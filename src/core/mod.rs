/// Core Server Framework Module
///
/// This module contains the core server implementation including:
/// - config.rs: transport selection from environment variables
/// - server.rs: MCP server with HTTP and STDIO transport

pub mod config;
pub mod server;
