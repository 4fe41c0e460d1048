use super::{opt_bool, opt_str, SchemaTool};
use schemagen_core::{
    advisor::should_auto_update,
    config::Config,
    refresh::apply_recommendation,
};
use std::path::Path;

pub struct AutoUpdateCheckTool;

impl SchemaTool for AutoUpdateCheckTool {
    fn name(&self) -> &str {
        "auto_update_check"
    }

    fn description(&self) -> &str {
        "Decide from a task type and changed files whether schemas need regenerating, and regenerate when required"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "task_type": {
                    "type": "string",
                    "description": "Task category, e.g. migration, model, route, controller, feature, bugfix, test"
                },
                "changed_files": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Project-relative paths touched by the task"
                },
                "apply": {
                    "type": "boolean",
                    "description": "Regenerate when an update is required (default true)"
                }
            }
        })
    }

    fn call(&self, args: serde_json::Value, root: &Path) -> Result<serde_json::Value, String> {
        let task_type = opt_str(&args, "task_type")?;
        let changed_files: Vec<String> = match args.get("changed_files") {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(v) => serde_json::from_value(v.clone())
                .map_err(|_| "argument 'changed_files' must be an array of strings".to_string())?,
        };
        let apply = opt_bool(&args, "apply")?.unwrap_or(true);

        let recommendation = should_auto_update(task_type, &changed_files);
        let outcome = if apply {
            let config = Config::load(root).map_err(|e| e.to_string())?;
            apply_recommendation(root, &config, &recommendation).map_err(|e| e.to_string())?
        } else {
            None
        };

        Ok(serde_json::json!({
            "success": true,
            "recommendation": recommendation,
            "updated": outcome.as_ref().is_some_and(|o| o.generated()),
            "outcome": outcome,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn migration_change_regenerates() {
        let dir = TempDir::new().unwrap();
        let result = AutoUpdateCheckTool
            .call(
                serde_json::json!({
                    "task_type": "other",
                    "changed_files": ["database/migrations/2024_01_01_create_x.php"]
                }),
                dir.path(),
            )
            .unwrap();
        assert_eq!(result["success"], true);
        assert_eq!(result["recommendation"]["required"], true);
        assert_eq!(result["recommendation"]["confidence"], 0.95);
        assert_eq!(
            result["recommendation"]["affectedSchemas"],
            serde_json::json!(["database"])
        );
        assert_eq!(result["updated"], true);
        assert!(dir.path().join(".schemas/history/changes.yaml").exists());
    }

    #[test]
    fn low_confidence_task_does_nothing() {
        let dir = TempDir::new().unwrap();
        let result = AutoUpdateCheckTool
            .call(serde_json::json!({"task_type": "test"}), dir.path())
            .unwrap();
        assert_eq!(result["recommendation"]["required"], false);
        assert_eq!(result["updated"], false);
        assert!(result["outcome"].is_null());
        assert!(!dir.path().join(".schemas").exists());
    }

    #[test]
    fn apply_false_only_advises() {
        let dir = TempDir::new().unwrap();
        let result = AutoUpdateCheckTool
            .call(
                serde_json::json!({"task_type": "migration", "apply": false}),
                dir.path(),
            )
            .unwrap();
        assert_eq!(result["recommendation"]["required"], true);
        assert_eq!(result["updated"], false);
        assert!(!dir.path().join(".schemas").exists());
    }

    #[test]
    fn bad_changed_files_errors() {
        let dir = TempDir::new().unwrap();
        let err = AutoUpdateCheckTool
            .call(serde_json::json!({"changed_files": "routes/api.php"}), dir.path())
            .unwrap_err();
        assert!(err.contains("changed_files"));
    }
}
