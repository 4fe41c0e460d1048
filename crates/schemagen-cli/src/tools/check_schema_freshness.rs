use super::{success, SchemaTool};
use schemagen_core::{advisor::check_freshness, config::Config, store::SchemaStore};
use std::path::Path;

pub struct CheckSchemaFreshnessTool;

impl SchemaTool for CheckSchemaFreshnessTool {
    fn name(&self) -> &str {
        "check_schema_freshness"
    }

    fn description(&self) -> &str {
        "Check whether the stored schemas are younger than the freshness window"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "max_age_minutes": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Freshness window in minutes (default from .schemagen.yaml, 60)"
                }
            }
        })
    }

    fn call(&self, args: serde_json::Value, root: &Path) -> Result<serde_json::Value, String> {
        let config = Config::load(root).map_err(|e| e.to_string())?;
        let max_age = match args.get("max_age_minutes") {
            None | Some(serde_json::Value::Null) => config.max_age_minutes,
            Some(v) => v
                .as_i64()
                .filter(|n| *n >= 0)
                .ok_or_else(|| "argument 'max_age_minutes' must be a non-negative integer".to_string())?,
        };

        let store = SchemaStore::for_project(root, &config);
        success(&check_freshness(&store, max_age))
    }
}
