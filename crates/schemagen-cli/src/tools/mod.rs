use serde::Serialize;
use serde_json::Value;
use std::path::Path;

pub mod auto_update_check;
pub mod check_schema_freshness;
pub mod generate_schemas;
pub mod get_schema_info;

pub trait SchemaTool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn schema(&self) -> Value;
    fn call(&self, args: Value, root: &Path) -> Result<Value, String>;
}

pub fn all_tools() -> Vec<Box<dyn SchemaTool>> {
    vec![
        Box::new(generate_schemas::GenerateSchemasTool),
        Box::new(get_schema_info::GetSchemaInfoTool),
        Box::new(check_schema_freshness::CheckSchemaFreshnessTool),
        Box::new(auto_update_check::AutoUpdateCheckTool),
    ]
}

/// What a tool call sends back to the client: the JSON payload and whether
/// it reports a failure.
#[derive(Debug)]
pub struct ToolReply {
    pub payload: Value,
    pub is_error: bool,
}

impl ToolReply {
    /// MCP `tools/call` result: the payload as pretty JSON text content.
    pub fn into_call_result(self) -> Value {
        let text = serde_json::to_string_pretty(&self.payload)
            .unwrap_or_else(|e| format!("serialization error: {e}"));
        serde_json::json!({
            "content": [{ "type": "text", "text": text }],
            "isError": self.is_error,
        })
    }
}

/// Call `tool`. A failure becomes `{success: false, error}` flagged as an
/// error rather than a protocol fault.
pub fn invoke(tool: &dyn SchemaTool, args: Value, root: &Path) -> ToolReply {
    match tool.call(args, root) {
        Ok(payload) => ToolReply {
            payload,
            is_error: false,
        },
        Err(error) => {
            tracing::warn!(tool = tool.name(), %error, "tool call failed");
            ToolReply {
                payload: serde_json::json!({ "success": false, "error": error }),
                is_error: true,
            }
        }
    }
}

/// Serialize `value` and mark the payload `success: true`. Objects get the
/// flag merged in; anything else is wrapped under `result`.
pub(crate) fn success<T: Serialize>(value: &T) -> Result<Value, String> {
    let mut payload = serde_json::to_value(value).map_err(|e| e.to_string())?;
    match payload.as_object_mut() {
        Some(object) => {
            object.insert("success".to_string(), Value::Bool(true));
            Ok(payload)
        }
        None => Ok(serde_json::json!({ "success": true, "result": payload })),
    }
}

/// Optional string argument; present but non-string is an error.
pub(crate) fn opt_str<'a>(args: &'a Value, key: &str) -> Result<Option<&'a str>, String> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(format!("argument '{key}' must be a string")),
    }
}

pub(crate) fn opt_bool(args: &Value, key: &str) -> Result<Option<bool>, String> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(format!("argument '{key}' must be a boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn tool_names_are_unique() {
        let tools = all_tools();
        let mut names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), tools.len());
    }

    #[test]
    fn invoke_wraps_failures_as_data() {
        let dir = TempDir::new().unwrap();
        let reply = invoke(
            &get_schema_info::GetSchemaInfoTool,
            serde_json::json!({"schema": 7}),
            dir.path(),
        );
        assert!(reply.is_error);
        assert_eq!(reply.payload["success"], false);
        assert_eq!(reply.payload["error"], "argument 'schema' must be a string");

        let result = reply.into_call_result();
        assert_eq!(result["isError"], true);
        let text: Value =
            serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(text["success"], false);
    }

    #[test]
    fn invoke_passes_payload_through() {
        let dir = TempDir::new().unwrap();
        let reply = invoke(
            &check_schema_freshness::CheckSchemaFreshnessTool,
            serde_json::json!({}),
            dir.path(),
        );
        assert!(!reply.is_error);
        assert_eq!(reply.payload["success"], true);
        assert_eq!(reply.into_call_result()["content"][0]["type"], "text");
    }

    #[test]
    fn success_merges_flag_or_wraps() {
        let merged = success(&serde_json::json!({"a": 1})).unwrap();
        assert_eq!(merged, serde_json::json!({"a": 1, "success": true}));
        let wrapped = success(&vec![1, 2]).unwrap();
        assert_eq!(wrapped, serde_json::json!({"success": true, "result": [1, 2]}));
    }
}
