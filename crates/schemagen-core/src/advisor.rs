//! Staleness and auto-update decisions.
//!
//! Two independent sources of evidence feed a recommendation: the task type
//! and the list of changed files. Whichever yields the higher confidence
//! wins outright; the two are never blended.

use crate::error::Result;
use crate::schema::{GenerationMetadata, SchemaKind};
use crate::store::SchemaStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use SchemaKind::{Api, BusinessLogic, ComponentArchitecture, Database};

// ---------------------------------------------------------------------------
// Freshness
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreshnessReport {
    pub is_fresh: bool,
    pub reason: String,
    pub last_generated: Option<DateTime<Utc>>,
    pub age_minutes: Option<i64>,
}

pub fn check_freshness(store: &SchemaStore, max_age_minutes: i64) -> FreshnessReport {
    freshness_at(store.read_metadata(), max_age_minutes, Utc::now())
}

/// Freshness of `metadata` as seen at `now`. Fresh means strictly younger
/// than `max_age_minutes`.
pub fn freshness_at(
    metadata: Result<Option<GenerationMetadata>>,
    max_age_minutes: i64,
    now: DateTime<Utc>,
) -> FreshnessReport {
    let metadata = match metadata {
        Ok(Some(metadata)) => metadata,
        Ok(None) => {
            return FreshnessReport {
                is_fresh: false,
                reason: "No schemas exist".to_string(),
                last_generated: None,
                age_minutes: None,
            }
        }
        Err(e) => {
            return FreshnessReport {
                is_fresh: false,
                reason: format!("Error reading metadata: {e}"),
                last_generated: None,
                age_minutes: None,
            }
        }
    };

    let generated = metadata.generated_at;
    let age = (now - generated).num_minutes();
    let is_fresh = age < max_age_minutes;
    let reason = if is_fresh {
        format!("Schemas are {age} minutes old (max age {max_age_minutes})")
    } else {
        format!("Schemas are {age} minutes old, exceeding max age of {max_age_minutes}")
    };
    FreshnessReport {
        is_fresh,
        reason,
        last_generated: Some(generated),
        age_minutes: Some(age),
    }
}

// ---------------------------------------------------------------------------
// Recommendation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecommendation {
    pub required: bool,
    pub reason: String,
    pub confidence: f64,
    pub affected_schemas: BTreeSet<SchemaKind>,
}

impl Default for UpdateRecommendation {
    fn default() -> Self {
        Self {
            required: false,
            reason: "No schema-relevant changes detected".to_string(),
            confidence: 0.0,
            affected_schemas: BTreeSet::new(),
        }
    }
}

/// Confidence above which an update is required.
pub const REQUIRED_THRESHOLD: f64 = 0.5;

struct TaskRule {
    task_type: &'static str,
    confidence: f64,
    schemas: &'static [SchemaKind],
}

const TASK_RULES: &[TaskRule] = &[
    TaskRule { task_type: "migration", confidence: 0.95, schemas: &[Database] },
    TaskRule { task_type: "model", confidence: 0.9, schemas: &[Database, BusinessLogic] },
    TaskRule { task_type: "route", confidence: 0.9, schemas: &[Api] },
    TaskRule { task_type: "api", confidence: 0.85, schemas: &[Api] },
    TaskRule { task_type: "controller", confidence: 0.8, schemas: &[Api, BusinessLogic] },
    TaskRule { task_type: "middleware", confidence: 0.7, schemas: &[Api, BusinessLogic] },
    TaskRule { task_type: "service", confidence: 0.7, schemas: &[BusinessLogic] },
    TaskRule {
        task_type: "feature",
        confidence: 0.75,
        schemas: &[Database, Api, BusinessLogic, ComponentArchitecture],
    },
    TaskRule { task_type: "refactor", confidence: 0.6, schemas: &[BusinessLogic, ComponentArchitecture] },
    TaskRule { task_type: "dependency", confidence: 0.8, schemas: &[ComponentArchitecture] },
    TaskRule { task_type: "config", confidence: 0.6, schemas: &[ComponentArchitecture] },
    TaskRule { task_type: "bugfix", confidence: 0.3, schemas: &[] },
    TaskRule { task_type: "test", confidence: 0.1, schemas: &[] },
    TaskRule { task_type: "documentation", confidence: 0.05, schemas: &[] },
];

/// A path rule; the first rule whose `matches` accepts a file wins for that file.
struct PathRule {
    matches: fn(&str) -> bool,
    confidence: f64,
    schemas: &'static [SchemaKind],
}

const PATH_RULES: &[PathRule] = &[
    PathRule {
        matches: |p| p.contains("database/migrations/"),
        confidence: 0.95,
        schemas: &[Database],
    },
    PathRule {
        matches: |p| p.contains("app/Models/"),
        confidence: 0.85,
        schemas: &[Database, BusinessLogic],
    },
    PathRule {
        matches: |p| segment_after(p, "routes/").is_some_and(|rest| rest.ends_with(".php")),
        confidence: 0.9,
        schemas: &[Api],
    },
    PathRule {
        matches: |p| p.contains("app/Http/Controllers/"),
        confidence: 0.8,
        schemas: &[Api],
    },
    PathRule {
        matches: |p| p.contains("app/Http/Middleware/") || p.ends_with("Http/Kernel.php"),
        confidence: 0.7,
        schemas: &[Api, BusinessLogic],
    },
    PathRule {
        matches: |p| {
            [
                "app/Policies/",
                "app/Services/",
                "app/Events/",
                "app/Jobs/",
                "app/Rules/",
                "app/Console/Commands/",
            ]
            .iter()
            .any(|dir| p.contains(dir))
        },
        confidence: 0.7,
        schemas: &[BusinessLogic],
    },
    PathRule {
        matches: |p| p == "composer.json" || p.ends_with("/composer.json"),
        confidence: 0.8,
        schemas: &[ComponentArchitecture],
    },
    PathRule {
        matches: |p| segment_after(p, "config/").is_some(),
        confidence: 0.6,
        schemas: &[ComponentArchitecture],
    },
    PathRule {
        matches: |p| p.contains("resources/views/") || p.contains("app/View/Components/"),
        confidence: 0.5,
        schemas: &[ComponentArchitecture],
    },
    PathRule {
        matches: |p| p.contains("app/Providers/"),
        confidence: 0.6,
        schemas: &[ComponentArchitecture],
    },
];

/// The remainder of `path` after a directory segment `dir` (e.g. `"config/"`)
/// that starts the path or follows a `/`.
fn segment_after<'a>(path: &'a str, dir: &str) -> Option<&'a str> {
    if let Some(rest) = path.strip_prefix(dir) {
        return Some(rest);
    }
    let needle = format!("/{dir}");
    path.find(&needle).map(|at| &path[at + needle.len()..])
}

fn schema_list(schemas: &BTreeSet<SchemaKind>) -> String {
    let names: Vec<&str> = schemas.iter().map(|k| k.as_str()).collect();
    format!("[{}]", names.join(", "))
}

fn from_task(task_type: &str) -> Option<UpdateRecommendation> {
    let rule = TASK_RULES
        .iter()
        .find(|rule| rule.task_type.eq_ignore_ascii_case(task_type.trim()))?;
    let affected: BTreeSet<SchemaKind> = rule.schemas.iter().copied().collect();
    Some(UpdateRecommendation {
        required: rule.confidence > REQUIRED_THRESHOLD,
        reason: format!(
            "Task type '{}' affects {}",
            rule.task_type,
            schema_list(&affected)
        ),
        confidence: rule.confidence,
        affected_schemas: affected,
    })
}

fn from_files<S: AsRef<str>>(changed_files: &[S]) -> Option<UpdateRecommendation> {
    let mut confidence: f64 = 0.0;
    let mut affected = BTreeSet::new();
    let mut matched = Vec::new();

    for file in changed_files {
        let path = file.as_ref().replace('\\', "/");
        let Some(rule) = PATH_RULES.iter().find(|rule| (rule.matches)(&path)) else {
            continue;
        };
        let schemas: BTreeSet<SchemaKind> = rule.schemas.iter().copied().collect();
        confidence = confidence.max(rule.confidence);
        matched.push(format!("{} -> {}", file.as_ref(), schema_list(&schemas)));
        affected.extend(schemas);
    }

    if matched.is_empty() {
        return None;
    }
    Some(UpdateRecommendation {
        required: confidence > REQUIRED_THRESHOLD,
        reason: format!("Changed files affect schemas: {}", matched.join("; ")),
        confidence,
        affected_schemas: affected,
    })
}

/// Decide whether schemas should be regenerated for a task.
///
/// The file-derived result replaces the task-derived one only when its
/// confidence is strictly higher.
pub fn should_auto_update<S: AsRef<str>>(
    task_type: Option<&str>,
    changed_files: &[S],
) -> UpdateRecommendation {
    let by_task = task_type.and_then(from_task);
    let by_files = from_files(changed_files);

    let recommendation = match (by_task, by_files) {
        (Some(task), Some(files)) if files.confidence > task.confidence => files,
        (Some(task), _) => task,
        (None, Some(files)) => files,
        (None, None) => UpdateRecommendation::default(),
    };
    tracing::debug!(
        required = recommendation.required,
        confidence = recommendation.confidence,
        "auto-update recommendation"
    );
    recommendation
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
