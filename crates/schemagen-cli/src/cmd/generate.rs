use crate::output::{join_names, print_json};
use anyhow::Context;
use schemagen_core::{
    config::Config,
    framework::Framework,
    refresh::{refresh, RefreshOptions, RefreshOutcome},
};
use std::path::Path;

pub fn run(
    root: &Path,
    framework: Option<&str>,
    force: bool,
    message: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let framework = framework.map(str::parse::<Framework>).transpose()?;
    let config = Config::load(root).context("failed to load config")?;
    let options = RefreshOptions {
        framework,
        force,
        change_log: message.map(str::to_string),
    };

    let outcome = refresh(root, &config, &options)
        .with_context(|| format!("failed to save schemas for {}", root.display()))?;

    if json {
        return print_json(&outcome);
    }

    match outcome {
        RefreshOutcome::Skipped { freshness } => {
            println!("Schemas are fresh: {}.", freshness.reason);
            println!("Use --force to regenerate.");
        }
        RefreshOutcome::Generated {
            receipt,
            framework,
            errors,
        } => {
            match &framework.version {
                Some(version) => println!("Generated schemas for {} ({version}).", framework.framework),
                None => println!("Generated schemas for {}.", framework.framework),
            }
            println!("  Version:  {}", receipt.version);
            println!("  Current:  {}", receipt.current_dir.display());
            println!("  History:  {} entries", receipt.history_len);
            if !errors.is_empty() {
                println!(
                    "  Errors in: {}",
                    join_names(errors.iter().map(|e| e.schema))
                );
                for failure in &errors {
                    eprintln!("warning: {}: {}", failure.schema, failure.error);
                }
            }
        }
    }
    Ok(())
}
