use super::{opt_bool, opt_str, success, SchemaTool};
use schemagen_core::{
    config::Config,
    framework::Framework,
    refresh::{refresh, RefreshOptions},
};
use std::path::Path;

pub struct GenerateSchemasTool;

impl SchemaTool for GenerateSchemasTool {
    fn name(&self) -> &str {
        "generate_schemas"
    }

    fn description(&self) -> &str {
        "Generate database, API, business-logic and component-architecture schemas for the project, skipping when the stored schemas are still fresh"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "framework": {
                    "type": "string",
                    "enum": ["laravel", "rails", "django", "express", "unknown"],
                    "description": "Skip detection and generate for this framework"
                },
                "force": {
                    "type": "boolean",
                    "description": "Regenerate even if schemas are fresh"
                },
                "message": {
                    "type": "string",
                    "description": "Change log entry recorded in the history ledger"
                }
            }
        })
    }

    fn call(&self, args: serde_json::Value, root: &Path) -> Result<serde_json::Value, String> {
        let framework = opt_str(&args, "framework")?
            .map(str::parse::<Framework>)
            .transpose()
            .map_err(|e| e.to_string())?;
        let options = RefreshOptions {
            framework,
            force: opt_bool(&args, "force")?.unwrap_or(false),
            change_log: opt_str(&args, "message")?.map(str::to_string),
        };

        let config = Config::load(root).map_err(|e| e.to_string())?;
        let outcome = refresh(root, &config, &options).map_err(|e| e.to_string())?;
        success(&outcome)
    }
}
