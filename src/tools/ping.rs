/// Ping Tool Implementation
///
/// Health-check tool: takes no parameters, returns the literal string "pong",
/// and has no side effects. Its only purpose is to let clients verify the
/// server is alive and dispatching tool calls.

use crate::core::server::{MCPTool, ToolFuture, ToolHandler, ToolRegistry};
use serde_json::Value;

/// Register the ping tool with the tool registry.
pub fn register(registry: &mut ToolRegistry) {
    let tool = MCPTool {
        name: "ping".to_string(),
        description: "Health check tool - returns 'pong'.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {}
        }),
    };

    // The handler ignores its arguments and completes immediately; it keeps
    // the async shape so it plugs into the same registry as real tools.
    let handler: ToolHandler = Box::new(|_args: Value| -> ToolFuture {
        Box::pin(async { Ok(Value::String("pong".to_string())) })
    });

    registry.register(tool, handler);
}
