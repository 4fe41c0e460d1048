use crate::output::{join_names, print_json};
use anyhow::Context;
use schemagen_core::{config::Config, schema::SchemaKind, store::SchemaStore};
use std::path::Path;

pub fn run(root: &Path, schema: Option<&str>, json: bool) -> anyhow::Result<()> {
    let kind = schema.map(str::parse::<SchemaKind>).transpose()?;
    let config = Config::load(root).context("failed to load config")?;
    let store = SchemaStore::for_project(root, &config);

    if let Some(kind) = kind {
        let document = store
            .load_document(kind)
            .with_context(|| format!("failed to read {kind} schema"))?
            .with_context(|| format!("no {kind} schema in {}", store.root().display()))?;
        if json {
            print_json(&document)?;
        } else {
            print!("{}", serde_yaml::to_string(&document)?);
        }
        return Ok(());
    }

    let info = store.load().context("failed to read schema metadata")?;
    if json {
        return print_json(&info);
    }

    let Some(metadata) = &info.metadata else {
        println!("No schemas found in {}.", store.root().display());
        println!("Run `schemagen generate` first.");
        return Ok(());
    };

    let framework = &metadata.framework;
    println!(
        "Framework:  {}{}",
        framework.framework,
        framework
            .version
            .as_deref()
            .map(|v| format!(" ({v})"))
            .unwrap_or_default()
    );
    println!(
        "Generated:  {}",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("Format:     {}", metadata.schema_format_version);
    println!("Generator:  {}", metadata.generator);
    println!("Schemas:    {}", join_names(&info.available_schemas));
    println!("Versions:   {}", info.versions.len());
    if let Some(latest) = info.versions.first() {
        println!("Latest:     {latest}");
    }
    Ok(())
}
