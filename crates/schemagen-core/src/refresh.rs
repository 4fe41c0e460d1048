//! The refresh workflow: consult freshness, regenerate, persist.

use crate::advisor::{self, FreshnessReport, UpdateRecommendation};
use crate::config::Config;
use crate::error::Result;
use crate::framework::{Framework, FrameworkInfo};
use crate::generator;
use crate::schema::SchemaKind;
use crate::store::{SaveReceipt, SchemaStore};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct RefreshOptions {
    /// Skip detection and generate for this framework.
    pub framework: Option<Framework>,
    /// Regenerate even when the stored schemas are fresh.
    pub force: bool,
    pub change_log: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaFailure {
    pub schema: SchemaKind,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RefreshOutcome {
    /// Stored schemas were fresh; nothing was written.
    Skipped { freshness: FreshnessReport },
    Generated {
        receipt: SaveReceipt,
        framework: FrameworkInfo,
        /// Documents that were saved with an embedded error.
        errors: Vec<SchemaFailure>,
    },
}

impl RefreshOutcome {
    pub fn generated(&self) -> bool {
        matches!(self, RefreshOutcome::Generated { .. })
    }
}

/// Regenerate and save the schemas for `project_root` unless they are fresh.
///
/// Extraction failures are embedded in the saved documents; only
/// persistence failures are returned as errors.
pub fn refresh(project_root: &Path, config: &Config, options: &RefreshOptions) -> Result<RefreshOutcome> {
    let store = SchemaStore::for_project(project_root, config);

    if !options.force {
        let freshness = advisor::check_freshness(&store, config.max_age_minutes);
        if freshness.is_fresh {
            tracing::info!(reason = %freshness.reason, "schemas are fresh, skipping generation");
            return Ok(RefreshOutcome::Skipped { freshness });
        }
        tracing::debug!(reason = %freshness.reason, "schemas are stale");
    }

    let set = generator::generate(project_root, options.framework, config);
    let change_log = options.change_log.clone().unwrap_or_else(|| {
        if options.force {
            "Forced regeneration".to_string()
        } else {
            "Schema generation".to_string()
        }
    });
    let receipt = store.save(&set, &change_log)?;

    let errors = set
        .errors()
        .into_iter()
        .map(|(schema, error)| SchemaFailure {
            schema,
            error: error.to_string(),
        })
        .collect();

    Ok(RefreshOutcome::Generated {
        receipt,
        framework: set.metadata.framework,
        errors,
    })
}

/// Regenerate when `recommendation` says an update is required. Returns
/// `None` when it does not.
pub fn apply_recommendation(
    project_root: &Path,
    config: &Config,
    recommendation: &UpdateRecommendation,
) -> Result<Option<RefreshOutcome>> {
    if !recommendation.required {
        return Ok(None);
    }
    let options = RefreshOptions {
        framework: None,
        force: true,
        change_log: Some(format!("Auto-update: {}", recommendation.reason)),
    };
    refresh(project_root, config, &options).map(Some)
}
