use super::{opt_str, SchemaTool};
use schemagen_core::{config::Config, schema::SchemaKind, store::SchemaStore};
use std::path::Path;

pub struct GetSchemaInfoTool;

impl SchemaTool for GetSchemaInfoTool {
    fn name(&self) -> &str {
        "get_schema_info"
    }

    fn description(&self) -> &str {
        "Describe the stored schemas: generation metadata, available documents and versions. Pass `schema` to include one current document"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "schema": {
                    "type": "string",
                    "enum": ["database", "api", "businessLogic", "componentArchitecture"],
                    "description": "Include this current schema document in the response"
                }
            }
        })
    }

    fn call(&self, args: serde_json::Value, root: &Path) -> Result<serde_json::Value, String> {
        let kind = opt_str(&args, "schema")?
            .map(str::parse::<SchemaKind>)
            .transpose()
            .map_err(|e| e.to_string())?;

        let config = Config::load(root).map_err(|e| e.to_string())?;
        let store = SchemaStore::for_project(root, &config);
        let info = store.load().map_err(|e| e.to_string())?;
        let mut payload = serde_json::to_value(&info).map_err(|e| e.to_string())?;

        if let Some(kind) = kind.filter(|_| info.success) {
            let document = store.load_document(kind).map_err(|e| e.to_string())?;
            payload["schema"] = serde_json::json!({
                "kind": kind,
                "document": document,
            });
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::generate_schemas::GenerateSchemasTool;
    use tempfile::TempDir;

    #[test]
    fn no_schemas_is_reported_as_data() {
        let dir = TempDir::new().unwrap();
        let result = GetSchemaInfoTool
            .call(serde_json::json!({}), dir.path())
            .unwrap();
        assert_eq!(result["success"], false);
        assert!(result["metadata"].is_null());
    }

    #[test]
    fn lists_schemas_and_returns_requested_document() {
        let dir = TempDir::new().unwrap();
        GenerateSchemasTool
            .call(serde_json::json!({"framework": "express"}), dir.path())
            .unwrap();

        let result = GetSchemaInfoTool
            .call(serde_json::json!({"schema": "business_logic"}), dir.path())
            .unwrap();
        assert_eq!(result["success"], true);
        assert_eq!(result["availableSchemas"].as_array().unwrap().len(), 4);
        assert_eq!(result["versions"].as_array().unwrap().len(), 1);
        assert_eq!(result["metadata"]["framework"]["type"], "express");
        assert_eq!(result["schema"]["kind"], "businessLogic");
        assert_eq!(result["schema"]["document"]["note"], "pending");
    }

    #[test]
    fn unknown_schema_errors() {
        let dir = TempDir::new().unwrap();
        let err = GetSchemaInfoTool
            .call(serde_json::json!({"schema": "views"}), dir.path())
            .unwrap_err();
        assert!(err.contains("unknown schema"));
    }
}
