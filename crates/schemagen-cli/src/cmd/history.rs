use crate::output::{print_json, print_table};
use anyhow::Context;
use schemagen_core::{config::Config, store::SchemaStore};
use std::path::Path;

pub fn run(root: &Path, limit: usize, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let store = SchemaStore::for_project(root, &config);
    let entries: Vec<_> = store.history().into_iter().take(limit).collect();

    if json {
        return print_json(&entries);
    }

    if entries.is_empty() {
        println!("No history.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            vec![
                e.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                e.version.clone(),
                e.framework.to_string(),
                e.change_log.clone(),
            ]
        })
        .collect();
    print_table(&["TIMESTAMP", "VERSION", "FRAMEWORK", "CHANGE"], rows);
    Ok(())
}
