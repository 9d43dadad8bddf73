//! SeatGeek MCP server.
//!
//! Exposes a single `ping` health-check tool over the Model Context Protocol
//! (JSON-RPC 2.0), speaking over either STDIO or HTTP depending on the
//! `MCP_HTTP` environment flag resolved once at startup.

pub mod core;
pub mod tools;
