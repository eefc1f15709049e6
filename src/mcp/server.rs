/// MCP server implementation that handles JSON-RPC communication
///
/// This module implements the actual MCP server that:
/// 1. Reads JSON-RPC requests from stdin, one per line
/// 2. Dispatches tool calls to the habit tools
/// 3. Writes JSON-RPC responses to stdout

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::engine::EngineError;
use crate::mcp::protocol::*;
use crate::tools::{self, ToolContext};
use crate::{HabitTrackerServer, ServerError, SystemClock};
use crate::storage::SqliteStorage;

/// MCP server that handles communication with the client
pub struct McpServer {
    habit_tracker: HabitTrackerServer,
    initialized: bool,
}

impl McpServer {
    pub fn new(habit_tracker: HabitTrackerServer) -> Self {
        Self {
            habit_tracker,
            initialized: false,
        }
    }

    /// Run the MCP server over stdin/stdout
    pub async fn run(&mut self) -> Result<(), ServerError> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve newline-delimited JSON-RPC until the reader is exhausted
    pub async fn serve<R, W>(&mut self, mut reader: R, mut writer: W) -> Result<(), ServerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Starting MCP server, waiting for JSON-RPC requests...");
        let mut line = String::new();

        loop {
            line.clear();

            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("MCP server shutting down (stdin closed)");
                    break;
                }
                Ok(_) => {
                    if let Some(response) = self.process_line(&line).await {
                        let response_str = serde_json::to_string(&response)?;

                        writer.write_all(response_str.as_bytes()).await?;
                        writer.write_all(b"\n").await?;
                        writer.flush().await?;

                        debug!("Sent response: {}", response_str);
                    }
                }
                Err(e) => {
                    error!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Process a single line of JSON-RPC input
    ///
    /// Returns `None` for blank lines and notifications.
    pub async fn process_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        debug!("Processing request: {}", line);

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Invalid JSON: {}", e),
                    None,
                ));
            }
        };

        match request.id.clone() {
            Some(id) => Some(self.handle_request(id, request).await),
            None => {
                self.handle_notification(&request);
                None
            }
        }
    }

    fn handle_notification(&mut self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "initialized" | "notifications/initialized" => {
                self.initialized = true;
                info!("MCP client initialized");
            }
            other => debug!("Ignoring notification '{}'", other),
        }
    }

    async fn handle_request(&mut self, id: Value, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "initialized" => {
                self.initialized = true;
                JsonRpcResponse::success(id, json!({}))
            }
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => JsonRpcResponse::success(id, json!({ "tools": tool_definitions() })),
            "tools/call" => self.handle_tools_call(id, request.params),
            _ => JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method '{}' not found", request.method),
                None,
            ),
        }
    }

    fn handle_initialize(&mut self, id: Value) -> JsonRpcResponse {
        info!("MCP client connected");

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: ServerInfo {
                name: "Habit Progress Engine".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        to_response(id, &result)
    }

    fn handle_tools_call(&mut self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        if !self.initialized {
            debug!("tools/call received before the client sent initialized");
        }
        let tool_params: ToolCallParams = match params {
            Some(params) => match serde_json::from_value(params) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        error_codes::INVALID_PARAMS,
                        format!("Invalid parameters: {}", e),
                        None,
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_REQUEST,
                    "Missing parameters".to_string(),
                    None,
                );
            }
        };

        let result = self.call_tool(&tool_params.name, tool_params.arguments);
        to_response(id, &result)
    }

    fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> ToolCallResult {
        let ctx: ToolContext<'_, SqliteStorage, SystemClock> = self.habit_tracker.tool_context();

        match name {
            "habit_create" => run_tool(arguments, |p| tools::create_habit(&ctx, p), |r: tools::CreateHabitResponse| {
                format!("{}\nHabit ID: {}", r.message, r.habit_id)
            }),
            "habit_list" => run_tool(arguments, |p| tools::list_habits(&ctx, p), |r: tools::ListHabitsResponse| r.message),
            "habit_update" => run_tool(arguments, |p| tools::update_habit(&ctx, p), |r: tools::UpdateHabitResponse| r.message),
            "habit_delete" => run_tool(arguments, |p| tools::delete_habit(&ctx, p), |r: tools::DeleteHabitResponse| r.message),
            "habit_complete" => run_tool(arguments, |p| tools::complete_habit(&ctx, p), |r: tools::ProgressResponse| r.message),
            "habit_undo" => run_tool(arguments, |p| tools::undo_completion(&ctx, p), |r: tools::ProgressResponse| r.message),
            "habit_increment" => run_tool(arguments, |p| tools::increment_quantity(&ctx, p), |r: tools::ProgressResponse| r.message),
            "habit_set_quantity" => run_tool(arguments, |p| tools::set_quantity(&ctx, p), |r: tools::ProgressResponse| r.message),
            "habit_status" => run_tool(arguments, |p| tools::get_habit_status(&ctx, p), |r: tools::StatusResponse| r.message),
            _ => ToolCallResult::error(format!("Unknown tool: {}", name)),
        }
    }
}

/// Deserialize the arguments, run the tool and render its response
fn run_tool<P, R, F, M>(arguments: Map<String, Value>, call: F, render: M) -> ToolCallResult
where
    P: DeserializeOwned,
    F: FnOnce(P) -> Result<R, EngineError>,
    M: FnOnce(R) -> String,
{
    let params: P = match serde_json::from_value(Value::Object(arguments)) {
        Ok(params) => params,
        Err(e) => return ToolCallResult::error(format!("Invalid arguments: {}", e)),
    };

    match call(params) {
        Ok(response) => ToolCallResult::success(render(response)),
        Err(e) => {
            warn!("Tool call failed: {}", e);
            ToolCallResult::engine_error(&e)
        }
    }
}

fn to_response<T: serde::Serialize>(id: Value, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(
            id,
            error_codes::INTERNAL_ERROR,
            format!("Failed to encode result: {}", e),
            None,
        ),
    }
}

/// Every tool this server exposes
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::for_params::<tools::CreateHabitParams>(
            "habit_create",
            "Create a new habit. Give a target_quantity to track an amount per day instead of a simple done/not done",
        ),
        ToolDefinition::for_params::<tools::ListHabitsParams>(
            "habit_list",
            "List all habits with today's streaks, completion rate and progress",
        ),
        ToolDefinition::for_params::<tools::UpdateHabitParams>(
            "habit_update",
            "Rename a habit or change its frequency, timezone or target. Frequency changes apply to the whole history",
        ),
        ToolDefinition::for_params::<tools::DeleteHabitParams>(
            "habit_delete",
            "Permanently delete a habit and its history",
        ),
        ToolDefinition::for_params::<tools::CompleteHabitParams>(
            "habit_complete",
            "Mark a done/not-done habit complete for today or a past day",
        ),
        ToolDefinition::for_params::<tools::CompleteHabitParams>(
            "habit_undo",
            "Undo a completion on a done/not-done habit",
        ),
        ToolDefinition::for_params::<tools::IncrementParams>(
            "habit_increment",
            "Add to (or subtract from) a quantity habit's total for the day",
        ),
        ToolDefinition::for_params::<tools::SetQuantityParams>(
            "habit_set_quantity",
            "Set a quantity habit's total for the day",
        ),
        ToolDefinition::for_params::<tools::StatusParams>(
            "habit_status",
            "Check streaks and progress for one habit or all of them",
        ),
    ]
}
