/// MCP request handling end to end
use habit_progress_engine::mcp::protocol::{error_codes, JsonRpcResponse};
use habit_progress_engine::mcp::McpServer;
use habit_progress_engine::{EngineConfig, HabitTrackerServer, SqliteStorage};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

fn server() -> McpServer {
    let storage = SqliteStorage::in_memory().expect("in-memory database");
    McpServer::new(HabitTrackerServer::with_storage(storage, EngineConfig::default()))
}

async fn call(server: &mut McpServer, id: u64, tool: &str, arguments: Value) -> Value {
    let request = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": tool, "arguments": arguments }
    });
    let response = server
        .process_line(&request.to_string())
        .await
        .expect("requests with an id get a response");
    assert!(response.error.is_none(), "unexpected protocol error: {:?}", response.error);
    response.result.expect("result")
}

fn text(result: &Value) -> &str {
    result["content"][0]["text"].as_str().unwrap_or_default()
}

fn habit_id_from(result: &Value) -> String {
    text(result)
        .lines()
        .find_map(|line| line.strip_prefix("Habit ID: "))
        .expect("create output names the habit ID")
        .to_string()
}

#[tokio::test]
async fn test_initialize_and_list_tools() {
    let mut server = server();

    let init = server
        .process_line(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
        .await
        .unwrap();
    let result = init.result.unwrap();
    assert_eq!(result["protocolVersion"], "2024-11-05");
    assert_eq!(result["serverInfo"]["name"], "Habit Progress Engine");

    let notification = server
        .process_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .await;
    assert!(notification.is_none());

    let list = server
        .process_line(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#)
        .await
        .unwrap();
    let tools = list.result.unwrap()["tools"].as_array().unwrap().clone();
    let names: Vec<&str> = tools.iter().filter_map(|t| t["name"].as_str()).collect();
    assert_eq!(
        names,
        vec![
            "habit_create",
            "habit_list",
            "habit_update",
            "habit_delete",
            "habit_complete",
            "habit_undo",
            "habit_increment",
            "habit_set_quantity",
            "habit_status"
        ]
    );
    assert!(tools.iter().all(|t| t["inputSchema"]["type"] == "object"));
}

#[tokio::test]
async fn test_quantity_habit_through_tools() {
    let mut server = server();

    let created = call(
        &mut server,
        1,
        "habit_create",
        json!({ "name": "Water", "target_quantity": 8, "unit": "glasses" }),
    )
    .await;
    assert_eq!(created["isError"], false);
    let habit_id = habit_id_from(&created);

    let partial = call(&mut server, 2, "habit_increment", json!({ "habit_id": habit_id, "amount": 4 })).await;
    assert!(text(&partial).contains("4 / 8 (50%)"));

    let met = call(&mut server, 3, "habit_increment", json!({ "habit_id": habit_id, "amount": 5 })).await;
    assert!(text(&met).contains("Target reached"));

    let status = call(&mut server, 4, "habit_status", json!({ "habit_id": habit_id })).await;
    assert!(text(&status).contains("Quantity: 9 / 8"));

    let wrong_kind = call(&mut server, 5, "habit_complete", json!({ "habit_id": habit_id })).await;
    assert_eq!(wrong_kind["isError"], true);
    assert!(text(&wrong_kind).contains("invalid_habit_kind"));
}

#[tokio::test]
async fn test_tool_errors_are_results_not_protocol_errors() {
    let mut server = server();

    let missing = call(&mut server, 1, "habit_status", json!({ "habit_id": uuid::Uuid::new_v4().to_string() })).await;
    assert_eq!(missing["isError"], true);
    assert!(text(&missing).contains("habit_not_found"));

    let bad_args = call(&mut server, 2, "habit_increment", json!({ "habit_id": "x" })).await;
    assert_eq!(bad_args["isError"], true);
    assert!(text(&bad_args).contains("Invalid arguments"));

    let unknown = call(&mut server, 3, "habit_insights", json!({})).await;
    assert!(text(&unknown).contains("Unknown tool"));
}

#[tokio::test]
async fn test_protocol_errors() {
    let mut server = server();

    let parse: JsonRpcResponse = server.process_line("{not json").await.unwrap();
    assert_eq!(parse.error.unwrap().code, error_codes::PARSE_ERROR);

    let method = server
        .process_line(r#"{"jsonrpc":"2.0","id":9,"method":"resources/list"}"#)
        .await
        .unwrap();
    assert_eq!(method.error.unwrap().code, error_codes::METHOD_NOT_FOUND);

    assert!(server.process_line("   ").await.is_none());
}

#[test]
fn test_serve_over_stream() {
    tokio_test::block_on(async {
        let mut server = server();
        let (client, server_end) = tokio::io::duplex(64 * 1024);
        let (server_read, server_write) = tokio::io::split(server_end);
        let (client_read, mut client_write) = tokio::io::split(client);

        client_write
            .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n\n{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/call\",\"params\":{\"name\":\"habit_list\",\"arguments\":{}}}\n")
            .await
            .unwrap();
        client_write.shutdown().await.unwrap();
        drop(client_write);

        server.serve(BufReader::new(server_read), server_write).await.unwrap();

        let mut lines = BufReader::new(client_read).lines();
        let first: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        let second: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(first["id"], 1);
        assert_eq!(second["id"], 2);
        assert!(second["result"]["content"][0]["text"].as_str().unwrap().contains("No habits found"));
    });
}
