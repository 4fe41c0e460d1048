//! MCP server over stdio: one JSON-RPC 2.0 message per line in, one
//! response per line out. Notifications get no response.

use crate::tools::{self, SchemaTool};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufRead, Write};
use std::path::Path;

const JSONRPC_VERSION: &str = "2.0";
const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

// ---------------------------------------------------------------------------
// Protocol types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

fn result_response(id: Option<Value>, result: Value) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: JSONRPC_VERSION,
        id,
        result: Some(result),
        error: None,
    }
}

fn error_response(id: Option<Value>, code: i32, message: impl Into<String>) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: JSONRPC_VERSION,
        id,
        result: None,
        error: Some(JsonRpcError {
            code,
            message: message.into(),
        }),
    }
}

fn write_response(out: &mut impl Write, response: &JsonRpcResponse) -> std::io::Result<()> {
    serde_json::to_writer(&mut *out, response)?;
    writeln!(out)?;
    out.flush()
}

// ---------------------------------------------------------------------------
// Server loop
// ---------------------------------------------------------------------------

pub fn run(root: &Path) -> anyhow::Result<()> {
    let tools = tools::all_tools();
    tracing::info!(root = %root.display(), tools = tools.len(), "mcp server listening on stdio");

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if let Some(response) = handle_line(&line, &tools, root) {
            write_response(&mut stdout.lock(), &response)?;
        }
    }

    tracing::info!("stdin closed, mcp server exiting");
    Ok(())
}

/// Parse one line and produce its response, or `None` for a notification.
fn handle_line(line: &str, tools: &[Box<dyn SchemaTool>], root: &Path) -> Option<JsonRpcResponse> {
    let raw: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return Some(error_response(None, PARSE_ERROR, format!("parse error: {e}"))),
    };
    if raw.get("id").is_none() {
        tracing::debug!(method = raw["method"].as_str().unwrap_or("-"), "notification ignored");
        return None;
    }
    let id = raw.get("id").cloned();
    match serde_json::from_value::<JsonRpcRequest>(raw) {
        Ok(request) => Some(handle_request(&request, tools, root)),
        Err(e) => Some(error_response(id, INVALID_REQUEST, format!("invalid request: {e}"))),
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn handle_request(
    req: &JsonRpcRequest,
    tools: &[Box<dyn SchemaTool>],
    root: &Path,
) -> JsonRpcResponse {
    let id = req.id.clone();
    if req.jsonrpc != JSONRPC_VERSION {
        return error_response(
            id,
            INVALID_REQUEST,
            format!("unsupported jsonrpc version: {}", req.jsonrpc),
        );
    }

    match req.method.as_str() {
        "initialize" => result_response(
            id,
            serde_json::json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": "schemagen",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        ),
        "tools/list" => {
            let listed: Vec<Value> = tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "name": t.name(),
                        "description": t.description(),
                        "inputSchema": t.schema()
                    })
                })
                .collect();
            result_response(id, serde_json::json!({ "tools": listed }))
        }
        "tools/call" => match call_tool(req.params.as_ref(), tools, root) {
            Ok(result) => result_response(id, result),
            Err((code, message)) => error_response(id, code, message),
        },
        other => error_response(id, METHOD_NOT_FOUND, format!("method not found: {other}")),
    }
}

/// Run the tool named in `params`. Protocol problems (missing params, unknown
/// tool) are JSON-RPC errors; tool failures come back as an `isError` result.
fn call_tool(
    params: Option<&Value>,
    tools: &[Box<dyn SchemaTool>],
    root: &Path,
) -> Result<Value, (i32, String)> {
    let params = params.ok_or((INVALID_PARAMS, "missing params".to_string()))?;
    let name = params["name"]
        .as_str()
        .ok_or((INVALID_PARAMS, "missing tool name in params".to_string()))?;
    let tool = tools
        .iter()
        .find(|t| t.name() == name)
        .ok_or_else(|| (METHOD_NOT_FOUND, format!("tool not found: {name}")))?;

    let args = params.get("arguments").cloned().unwrap_or(Value::Null);
    let reply = tools::invoke(tool.as_ref(), args, root);
    Ok(reply.into_call_result())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_req(id: i64, method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id: Some(Value::Number(id.into())),
            method: method.to_string(),
            params,
        }
    }

    fn call_text(resp: &JsonRpcResponse) -> Value {
        let result = resp.result.as_ref().unwrap();
        serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap()
    }

    #[test]
    fn initialize_returns_capabilities() {
        let dir = TempDir::new().unwrap();
        let tools = tools::all_tools();
        let req = make_req(
            1,
            "initialize",
            Some(serde_json::json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "test", "version": "0.0.1"}
            })),
        );

        let resp = handle_request(&req, &tools, dir.path());
        assert!(resp.error.is_none());
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert!(result["capabilities"]["tools"].is_object());
        assert_eq!(result["serverInfo"]["name"], "schemagen");
    }

    #[test]
    fn tools_list_returns_all_four() {
        let dir = TempDir::new().unwrap();
        let tools = tools::all_tools();
        let req = make_req(2, "tools/list", Some(serde_json::json!({})));

        let resp = handle_request(&req, &tools, dir.path());
        let result = resp.result.unwrap();
        let names: Vec<&str> = result["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            [
                "generate_schemas",
                "get_schema_info",
                "check_schema_freshness",
                "auto_update_check"
            ]
        );
        assert!(result["tools"][0]["inputSchema"].is_object());
    }

    #[test]
    fn tools_call_unknown_tool_returns_error() {
        let dir = TempDir::new().unwrap();
        let tools = tools::all_tools();
        let req = make_req(
            3,
            "tools/call",
            Some(serde_json::json!({"name": "nonexistent_tool", "arguments": {}})),
        );

        let resp = handle_request(&req, &tools, dir.path());
        assert!(resp.result.is_none());
        assert_eq!(resp.error.unwrap().code, -32601);
    }

    #[test]
    fn tools_call_freshness_success() {
        let dir = TempDir::new().unwrap();
        let tools = tools::all_tools();
        let req = make_req(
            4,
            "tools/call",
            Some(serde_json::json!({
                "name": "check_schema_freshness",
                "arguments": {"max_age_minutes": 60}
            })),
        );

        let resp = handle_request(&req, &tools, dir.path());
        assert!(resp.error.is_none());
        assert_eq!(resp.result.as_ref().unwrap()["isError"], false);
        let payload = call_text(&resp);
        assert_eq!(payload["success"], true);
        assert_eq!(payload["reason"], "No schemas exist");
    }

    #[test]
    fn tool_failure_is_wrapped_as_data() {
        let dir = TempDir::new().unwrap();
        let tools = tools::all_tools();
        let req = make_req(
            5,
            "tools/call",
            Some(serde_json::json!({
                "name": "generate_schemas",
                "arguments": {"framework": "cobol"}
            })),
        );

        let resp = handle_request(&req, &tools, dir.path());
        assert!(resp.error.is_none());
        assert_eq!(resp.result.as_ref().unwrap()["isError"], true);
        let payload = call_text(&resp);
        assert_eq!(payload["success"], false);
        assert!(payload["error"].as_str().unwrap().contains("cobol"));
    }

    #[test]
    fn unknown_method_returns_method_not_found() {
        let dir = TempDir::new().unwrap();
        let tools = tools::all_tools();
        let req = make_req(6, "unknown/method", None);

        let resp = handle_request(&req, &tools, dir.path());
        assert!(resp.result.is_none());
        let err = resp.error.unwrap();
        assert_eq!(err.code, -32601);
        assert!(err.message.contains("method not found"));
    }

    #[test]
    fn tools_call_missing_params_returns_error() {
        let dir = TempDir::new().unwrap();
        let tools = tools::all_tools();
        let req = make_req(7, "tools/call", None);

        let resp = handle_request(&req, &tools, dir.path());
        assert!(resp.result.is_none());
        assert_eq!(resp.error.unwrap().code, -32602);
    }

    #[test]
    fn wrong_jsonrpc_version_is_rejected() {
        let dir = TempDir::new().unwrap();
        let tools = tools::all_tools();
        let mut req = make_req(8, "initialize", None);
        req.jsonrpc = "1.0".into();

        let resp = handle_request(&req, &tools, dir.path());
        assert!(resp.result.is_none());
        assert_eq!(resp.error.unwrap().code, INVALID_REQUEST);
    }

    #[test]
    fn lines_map_to_responses() {
        let dir = TempDir::new().unwrap();
        let tools = tools::all_tools();

        let parse = handle_line("{not json", &tools, dir.path()).unwrap();
        assert_eq!(parse.error.unwrap().code, PARSE_ERROR);

        assert!(handle_line(
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            &tools,
            dir.path()
        )
        .is_none());

        let invalid = handle_line(r#"{"jsonrpc":"2.0","id":9}"#, &tools, dir.path()).unwrap();
        assert_eq!(invalid.id, Some(Value::from(9)));
        assert_eq!(invalid.error.unwrap().code, INVALID_REQUEST);

        let ok = handle_line(
            r#"{"jsonrpc":"2.0","id":10,"method":"tools/list"}"#,
            &tools,
            dir.path(),
        )
        .unwrap();
        assert!(ok.error.is_none());
    }

    #[test]
    fn responses_are_written_one_per_line() {
        let mut out = Vec::new();
        write_response(&mut out, &error_response(None, PARSE_ERROR, "bad")).unwrap();
        write_response(&mut out, &result_response(Some(Value::from(1)), Value::Bool(true))).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            serde_json::from_str::<Value>(lines[1]).unwrap(),
            serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": true})
        );
    }
}
