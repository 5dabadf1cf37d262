use std::sync::Arc;

use serde_json::json;

use crate::corpus::CaseMetadata;
use crate::embeddings::{Embedder, EmbeddingRole};
use crate::index::FlatIndex;
use crate::mcp::protocol::{
    CallToolParams, JsonRpcRequest, RequestId, ToolContent,
};
use crate::mcp::server::McpServer;
use crate::mcp::tools::SearchCasesHandler;
use crate::retrieval::RetrievalService;

/// Maps any text containing "treaty" onto one axis and everything else onto
/// the other, enough to exercise ranking through the tool layer.
struct StubEmbedder;

impl Embedder for StubEmbedder {
    fn embed(&self, texts: &[String], _role: EmbeddingRole) -> crate::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                if text.contains("treaty") {
                    vec![1.0, 0.0]
                } else {
                    vec![0.0, 1.0]
                }
            })
            .collect())
    }
}

fn ready_service() -> Arc<RetrievalService<StubEmbedder>> {
    let mut index = FlatIndex::new(2);
    index.add(vec![1.0, 0.0]).expect("should add vector");
    index.add(vec![0.0, 1.0]).expect("should add vector");

    let metadata = vec![
        CaseMetadata {
            case_id: "c-1".to_string(),
            case_name: "Treaty Case".to_string(),
            summary: "treaty interpretation".to_string(),
            original_text: "text".to_string(),
        },
        CaseMetadata {
            case_id: "c-2".to_string(),
            case_name: "Contract Case".to_string(),
            summary: "contract breach".to_string(),
            original_text: "text".to_string(),
        },
    ];

    Arc::new(
        RetrievalService::from_parts(StubEmbedder, index, metadata, 3)
            .expect("should construct service"),
    )
}

fn test_server() -> Arc<McpServer> {
    let mut server = McpServer::new("caselaw-mcp".to_string(), "0.1.0".to_string());
    server.register_tool(
        SearchCasesHandler::<StubEmbedder>::tool_definition(),
        SearchCasesHandler::new(ready_service()),
    );
    Arc::new(server)
}

fn request(method: &str, params: serde_json::Value) -> String {
    serde_json::to_string(&json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1
    }))
    .expect("should serialize request")
}

#[tokio::test]
async fn initialize_reports_server_info_and_capabilities() {
    let server = test_server();

    let response = server
        .handle_message(&request("initialize", json!({})))
        .await
        .expect("should respond");
    let parsed: serde_json::Value = serde_json::from_str(&response).expect("should parse");

    assert_eq!(parsed["result"]["serverInfo"]["name"], "caselaw-mcp");
    assert!(parsed["result"]["protocolVersion"].is_string());
    assert!(parsed["result"]["capabilities"]["tools"].is_object());
}

#[tokio::test]
async fn tools_list_includes_search_cases() {
    let server = test_server();

    let response = server
        .handle_message(&request("tools/list", json!({})))
        .await
        .expect("should respond");
    let parsed: serde_json::Value = serde_json::from_str(&response).expect("should parse");

    let tools = parsed["result"]["tools"]
        .as_array()
        .expect("tools should be an array");
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["name"], "search_cases");
    assert_eq!(
        tools[0]["inputSchema"]["required"],
        json!(["legal_query"])
    );
}

#[tokio::test]
async fn unknown_method_is_rejected() {
    let server = test_server();

    let response = server
        .handle_message(&request("does/not/exist", json!({})))
        .await
        .expect("should respond");
    let parsed: serde_json::Value = serde_json::from_str(&response).expect("should parse");

    assert_eq!(parsed["error"]["code"], -32601);
}

#[tokio::test]
async fn unparseable_message_yields_parse_error() {
    let server = test_server();

    let response = server
        .handle_message("this is not json")
        .await
        .expect("should respond");
    let parsed: serde_json::Value = serde_json::from_str(&response).expect("should parse");

    assert_eq!(parsed["error"]["code"], -32700);
}

#[tokio::test]
async fn notifications_get_no_response() {
    let server = test_server();

    let notification = serde_json::to_string(&json!({
        "jsonrpc": "2.0",
        "method": "notifications/initialized"
    }))
    .expect("should serialize");

    assert!(server.handle_message(&notification).await.is_none());
}

#[tokio::test]
async fn search_cases_returns_ranked_text() {
    let server = test_server();

    let response = server
        .handle_message(&request(
            "tools/call",
            json!({"name": "search_cases", "arguments": {"legal_query": "treaty dispute", "k": 1}}),
        ))
        .await
        .expect("should respond");
    let parsed: serde_json::Value = serde_json::from_str(&response).expect("should parse");

    assert_eq!(parsed["result"]["isError"], json!(false));
    let text = parsed["result"]["content"][0]["text"]
        .as_str()
        .expect("content should be text");
    assert!(text.contains("Treaty Case"));
    assert!(!text.contains("Contract Case"));
}

#[tokio::test]
async fn missing_query_parameter_is_a_tool_error() {
    let server = test_server();

    let response = server
        .handle_message(&request(
            "tools/call",
            json!({"name": "search_cases", "arguments": {}}),
        ))
        .await
        .expect("should respond");
    let parsed: serde_json::Value = serde_json::from_str(&response).expect("should parse");

    assert_eq!(parsed["result"]["isError"], json!(true));
}

#[tokio::test]
async fn unknown_tool_is_rejected() {
    let server = test_server();

    let response = server
        .handle_message(&request(
            "tools/call",
            json!({"name": "no_such_tool", "arguments": {}}),
        ))
        .await
        .expect("should respond");
    let parsed: serde_json::Value = serde_json::from_str(&response).expect("should parse");

    assert_eq!(parsed["error"]["code"], -32601);
}

#[test]
fn request_id_accepts_strings_and_numbers() {
    let request: JsonRpcRequest = serde_json::from_str(
        r#"{"jsonrpc": "2.0", "method": "ping", "params": null, "id": "abc"}"#,
    )
    .expect("should parse");
    assert_eq!(request.id, RequestId::String("abc".to_string()));

    let request: JsonRpcRequest =
        serde_json::from_str(r#"{"jsonrpc": "2.0", "method": "ping", "params": null, "id": 7}"#)
            .expect("should parse");
    assert_eq!(request.id, RequestId::Number(7));
}

#[test]
fn tool_content_serializes_with_type_tag() {
    let content = ToolContent::Text {
        text: "hello".to_string(),
    };
    let value = serde_json::to_value(&content).expect("should serialize");
    assert_eq!(value, json!({"type": "text", "text": "hello"}));
}

#[test]
fn call_tool_params_tolerate_missing_arguments() {
    let params: CallToolParams =
        serde_json::from_str(r#"{"name": "search_cases"}"#).expect("should parse");
    assert_eq!(params.name, "search_cases");
    assert!(params.arguments.is_none());
}
