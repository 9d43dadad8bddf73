/// MCP Server Implementation
///
/// This module contains the core MCP server implementation including:
/// - JSON-RPC 2.0 request/response structures
/// - Tool registry for managing available tools
/// - HTTP server setup with Actix Web
/// - STDIO server implementation for line-based communication
/// - Request handlers for MCP protocol methods

use actix_web::{
    web, App, HttpResponse, HttpServer, Result,
    middleware::{Compress, DefaultHeaders, Logger},
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{info, warn};

use crate::tools;

/// MCP protocol version reported in initialize responses.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server identity reported in MCP initialize responses.
#[derive(Clone)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "seatgeek".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// JSON-RPC 2.0 request structure for MCP protocol.
///
/// The jsonrpc field must be "2.0", id is optional (None for notifications),
/// method specifies the MCP method to call, and params contains
/// method-specific parameters.
#[derive(Deserialize, Debug)]
pub struct MCPRequest {
    pub jsonrpc: String,
    /// Request ID for correlating responses. None indicates a notification.
    pub id: Option<serde_json::Value>,
    /// MCP method name (e.g., "initialize", "tools/list", "tools/call")
    pub method: String,
    /// Method-specific parameters as JSON value
    pub params: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response structure for MCP protocol.
#[derive(Serialize, Debug)]
pub struct MCPResponse {
    pub jsonrpc: String,
    pub id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<MCPError>,
}

impl MCPResponse {
    fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Option<serde_json::Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(MCPError {
                code,
                message,
                data: None,
            }),
        }
    }
}

/// JSON-RPC 2.0 error structure.
#[derive(Serialize, Debug)]
pub struct MCPError {
    /// JSON-RPC error code (e.g., -32601 for method not found)
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// MCP tool definition structure.
///
/// Each tool must have a unique name, description, and JSON schema defining
/// its input parameters. This structure is serialized when listing tools.
#[derive(Serialize, Debug, Clone)]
pub struct MCPTool {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Boxed future returned by tool handlers.
pub type ToolFuture =
    Pin<Box<dyn Future<Output = std::result::Result<serde_json::Value, String>> + Send>>;

/// Tool handler function type definition.
///
/// Tool handlers are boxed closures that take JSON arguments and return a
/// future resolving to either a JSON result or an error string. The handler
/// must be Send + Sync to work across worker threads in the HTTP server.
pub type ToolHandler = Box<dyn Fn(serde_json::Value) -> ToolFuture + Send + Sync>;

/// Registry of available MCP tools.
///
/// The registry maintains a list of tool definitions for discovery and a
/// HashMap of tool names to their handler functions for execution. It is
/// populated once at startup and never mutated afterwards.
pub struct ToolRegistry {
    /// List of all registered tools (for tools/list method)
    pub tools: Vec<MCPTool>,
    /// Map of tool names to their handler functions (for tools/call method)
    handlers: HashMap<String, ToolHandler>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    /// Register a tool definition together with its handler function.
    pub fn register(&mut self, tool: MCPTool, handler: ToolHandler) {
        let name = tool.name.clone();
        self.tools.push(tool);
        self.handlers.insert(name, handler);
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialize and register all tools.
///
/// Called once during server startup. Add new tool registrations here
/// following the `tools::your_tool::register(&mut registry)` pattern.
pub fn initialize_tools() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    tools::ping::register(&mut registry);
    Arc::new(registry)
}

/// Route a JSON-RPC request to the appropriate MCP method handler.
///
/// Shared by both transports; the HTTP handler and the STDIO loop only differ
/// in how they move bytes.
pub async fn dispatch(info: &ServerInfo, registry: &ToolRegistry, req: &MCPRequest) -> MCPResponse {
    match req.method.as_str() {
        "initialize" => handle_initialize(info, req.id.clone()),
        "tools/list" => handle_tools_list(registry, req.id.clone()),
        "tools/call" => handle_tools_call(registry, req.id.clone(), req.params.clone()).await,
        _ => MCPResponse::failure(
            req.id.clone(),
            -32601,
            format!("Method not found: {}", req.method),
        ),
    }
}

/// Handle MCP initialize method.
///
/// The first method called by MCP clients to establish a connection. Returns
/// the protocol version, server capabilities, and server information.
fn handle_initialize(info: &ServerInfo, id: Option<serde_json::Value>) -> MCPResponse {
    MCPResponse::success(
        id,
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": info.name,
                "version": info.version
            }
        }),
    )
}

/// Handle MCP tools/list method.
///
/// Serializes tools with inputSchema in camelCase per the MCP specification.
fn handle_tools_list(registry: &ToolRegistry, id: Option<serde_json::Value>) -> MCPResponse {
    let tools_json: Vec<serde_json::Value> = registry
        .tools
        .iter()
        .map(|tool| {
            serde_json::json!({
                "name": tool.name,
                "description": tool.description,
                "inputSchema": tool.input_schema
            })
        })
        .collect();

    MCPResponse::success(id, serde_json::json!({ "tools": tools_json }))
}

/// Handle MCP tools/call method.
///
/// Looks up the named tool in the registry, awaits its handler, and formats
/// the result as MCP text content. A string result is rendered verbatim;
/// anything else is serialized to JSON.
async fn handle_tools_call(
    registry: &ToolRegistry,
    id: Option<serde_json::Value>,
    params: Option<serde_json::Value>,
) -> MCPResponse {
    let tool_params = match params {
        Some(p) => p,
        None => return MCPResponse::failure(id, -32602, "Invalid params".to_string()),
    };

    let tool_name = tool_params
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or("");

    // Tool arguments default to an empty object when not provided
    let arguments = tool_params
        .get("arguments")
        .cloned()
        .unwrap_or(serde_json::json!({}));

    let Some(handler) = registry.handlers.get(tool_name) else {
        return MCPResponse::failure(id, -32601, format!("Unknown tool: {tool_name}"));
    };

    match handler(arguments).await {
        Ok(result) => {
            let text = match result {
                serde_json::Value::String(s) => s,
                other => serde_json::to_string(&other).unwrap_or_default(),
            };
            MCPResponse::success(
                id,
                serde_json::json!({
                    "content": [
                        {
                            "type": "text",
                            "text": text
                        }
                    ],
                    "isError": false
                }),
            )
        }
        Err(e) => MCPResponse::success(
            id,
            serde_json::json!({
                "content": [
                    {
                        "type": "text",
                        "text": format!("Error: {e}")
                    }
                ],
                "isError": true
            }),
        ),
    }
}

/// Health check endpoint handler.
///
/// Returns a simple JSON response indicating the server is running. Used by
/// load balancers and monitoring systems to verify server availability.
pub async fn health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "seatgeek-mcp"
    })))
}

/// MCP JSON-RPC request handler for HTTP mode.
pub async fn mcp_handler(
    info: web::Data<ServerInfo>,
    registry: web::Data<Arc<ToolRegistry>>,
    req: web::Json<MCPRequest>,
) -> Result<HttpResponse> {
    let response = dispatch(&info, &registry, &req).await;
    Ok(HttpResponse::Ok().json(response))
}

/// Server-Sent Events endpoint for tools discovery.
///
/// Streams the registered tools in SSE format so clients can subscribe for
/// tool information without speaking JSON-RPC.
pub async fn sse_tools_discovery(registry: web::Data<Arc<ToolRegistry>>) -> Result<HttpResponse> {
    use actix_web::http::header;

    let tools_json: Vec<serde_json::Value> = registry
        .tools
        .iter()
        .map(|tool| {
            serde_json::json!({
                "name": tool.name,
                "description": tool.description,
                "inputSchema": tool.input_schema
            })
        })
        .collect();

    let tools_data = serde_json::json!({
        "tools": tools_json,
        "count": tools_json.len()
    });

    // SSE framing: "data: {json}\n\n"
    let sse_data = format!(
        "data: {}\n\n",
        serde_json::to_string(&tools_data).unwrap_or_else(|_| "{}".to_string())
    );
    let body = futures_util::stream::once(async move {
        Ok::<Bytes, actix_web::Error>(Bytes::from(sse_data))
    });

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        // Disable caching so clients always get fresh data
        .insert_header(header::CacheControl(vec![
            header::CacheDirective::NoCache,
            header::CacheDirective::NoStore,
            header::CacheDirective::MustRevalidate,
        ]))
        // Disable nginx buffering for real-time streaming
        .insert_header(("x-accel-buffering", "no"))
        .streaming(body))
}

/// Run the MCP server in HTTP mode.
///
/// Configures and starts an Actix Web HTTP server handling MCP protocol
/// requests over HTTP/JSON-RPC 2.0, with streaming enabled via the SSE route.
/// Actix installs its own signal handler, so an interrupt drains connections
/// and returns from `run` normally.
pub async fn run_server_http(info: ServerInfo, host: String, port: u16) -> std::io::Result<()> {
    use std::time::Duration;

    let bind_addr = format!("{host}:{port}");

    let app_state = web::Data::new(info);
    let tool_registry = web::Data::new(initialize_tools());

    // Worker count defaults to CPU count, capped at 16 to avoid excessive
    // context switching. Override via WORKER_THREADS.
    let workers = std::env::var("WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or_else(|| num_cpus::get().clamp(1, 16));

    info!(workers, "serving over HTTP on {bind_addr}");

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(tool_registry.clone())
            // Compression for JSON responses (gzip/brotli)
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block")),
            )
            // %r = request line, %s = status, %Dms = duration in milliseconds
            .wrap(Logger::new("%r %s %Dms"))
            .route("/health", web::get().to(health))
            .route("/sse", web::get().to(sse_tools_discovery))
            .route("/mcp", web::post().to(mcp_handler))
            .route("/", web::post().to(mcp_handler))
            .route("/", web::get().to(health))
    })
    .workers(workers)
    .max_connections(10000)
    .max_connection_rate(1000)
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_secs(30))
    .client_disconnect_timeout(Duration::from_secs(2))
    .shutdown_timeout(10)
    .bind(&bind_addr)?
    .run()
    .await
}

/// Process one line of STDIO input.
///
/// Returns the serialized JSON response line to write back, or None when the
/// line warrants no reply: blank input, notifications (requests without an
/// id), and malformed JSON from which no id can be salvaged.
pub async fn handle_line(info: &ServerInfo, registry: &ToolRegistry, line: &str) -> Option<String> {
    if line.trim().is_empty() {
        return None;
    }

    let response = match serde_json::from_str::<MCPRequest>(line) {
        Ok(req) => {
            // Notifications (no id) are one-way and get no response
            req.id.as_ref()?;
            dispatch(info, registry, &req).await
        }
        Err(e) => {
            warn!("parse error: {e}");
            // Answer with a JSON-RPC parse error when an id can be salvaged
            // from the malformed input
            let partial = serde_json::from_str::<serde_json::Value>(line).ok()?;
            let id = partial.get("id")?;
            MCPResponse::failure(Some(id.clone()), -32700, format!("Parse error: {e}"))
        }
    };

    match serde_json::to_string(&response) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!("failed to serialize response: {e}");
            None
        }
    }
}

/// Run the MCP server in STDIO mode.
///
/// Reads JSON-RPC requests line-by-line from stdin and writes responses to
/// stdout. All logging goes to stderr to keep the protocol stream clean.
/// An interrupt signal breaks out of the read loop so the process can exit
/// cleanly; end-of-input does the same.
pub async fn run_server_stdio(info: ServerInfo) -> std::io::Result<()> {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

    info!("serving over STDIO");

    let registry = initialize_tools();

    // 8KB buffers balance memory usage with I/O efficiency
    let stdin = tokio::io::stdin();
    let mut stdin = BufReader::with_capacity(8192, stdin).lines();
    let stdout = tokio::io::stdout();
    let mut stdout = BufWriter::with_capacity(8192, stdout);

    loop {
        let line = tokio::select! {
            line = stdin.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received");
                break;
            }
        };
        // EOF: client closed our stdin
        let Some(line) = line else { break };

        if let Some(response_json) = handle_line(&info, &registry, &line).await {
            stdout.write_all(response_json.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            // Flush after each response for low latency
            stdout.flush().await?;
        }
    }

    Ok(())
}
