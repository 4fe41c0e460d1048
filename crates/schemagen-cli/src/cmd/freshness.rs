use crate::output::print_json;
use anyhow::Context;
use schemagen_core::{advisor::check_freshness, config::Config, store::SchemaStore};
use std::path::Path;

pub fn run(root: &Path, max_age: Option<i64>, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let max_age = max_age.unwrap_or(config.max_age_minutes);
    if max_age < 0 {
        anyhow::bail!("--max-age must not be negative");
    }

    let store = SchemaStore::for_project(root, &config);
    let report = check_freshness(&store, max_age);

    if json {
        return print_json(&report);
    }
    let label = if report.is_fresh { "fresh" } else { "stale" };
    println!("{label}: {}", report.reason);
    if let Some(at) = report.last_generated {
        println!("Last generated: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    Ok(())
}
