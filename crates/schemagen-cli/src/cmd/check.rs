use crate::output::{join_names, print_json};
use anyhow::Context;
use schemagen_core::{
    advisor::should_auto_update,
    config::Config,
    refresh::{apply_recommendation, RefreshOutcome},
};
use std::path::Path;

pub fn run(
    root: &Path,
    task_type: Option<&str>,
    files: &[String],
    apply: bool,
    json: bool,
) -> anyhow::Result<()> {
    let recommendation = should_auto_update(task_type, files);

    let outcome = if apply {
        let config = Config::load(root).context("failed to load config")?;
        apply_recommendation(root, &config, &recommendation)
            .context("failed to regenerate schemas")?
    } else {
        None
    };

    if json {
        return print_json(&serde_json::json!({
            "recommendation": recommendation,
            "outcome": outcome,
        }));
    }

    let verdict = if recommendation.required {
        "update required"
    } else {
        "no update needed"
    };
    println!("{verdict} (confidence {:.2})", recommendation.confidence);
    println!("  Reason:   {}", recommendation.reason);
    println!(
        "  Affected: {}",
        join_names(&recommendation.affected_schemas)
    );
    match outcome {
        Some(RefreshOutcome::Generated { receipt, .. }) => {
            println!("Regenerated schemas as {}.", receipt.version)
        }
        Some(RefreshOutcome::Skipped { .. }) | None => {}
    }
    Ok(())
}
