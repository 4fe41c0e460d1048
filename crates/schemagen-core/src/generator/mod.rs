//! Schema assembly: resolve the framework, pick a generator, build all four
//! documents plus metadata.
//!
//! Each document is built independently. A failure while building one is
//! recorded in that document's `error` field and never stops the others, so
//! callers always receive a complete [`SchemaSet`].

mod laravel;
mod placeholder;

pub use laravel::{parse_route_list, LaravelGenerator};
pub use placeholder::PlaceholderGenerator;

use crate::config::Config;
use crate::framework::{self, Framework, FrameworkInfo};
use crate::schema::{
    ApiSchema, BusinessLogicSchema, ComponentArchitectureSchema, DatabaseSchema,
    GenerationMetadata, SchemaSet, SCHEMA_FORMAT_VERSION,
};
use chrono::Utc;
use std::path::Path;

/// Produces the four schema documents for one framework.
pub trait SchemaGenerator {
    fn framework(&self) -> Framework;
    fn database(&self, root: &Path) -> DatabaseSchema;
    fn api(&self, root: &Path) -> ApiSchema;
    fn business_logic(&self, root: &Path) -> BusinessLogicSchema;
    fn component_architecture(&self, root: &Path) -> ComponentArchitectureSchema;
}

/// Frameworks without a concrete generator get the placeholder.
pub fn generator_for(framework: Framework, config: &Config) -> Box<dyn SchemaGenerator> {
    match framework {
        Framework::Laravel => Box::new(LaravelGenerator::new(config.artisan.clone())),
        Framework::Rails | Framework::Django | Framework::Express | Framework::Unknown => {
            Box::new(PlaceholderGenerator::new(framework))
        }
    }
}

/// Build a [`SchemaSet`] for `root`. `framework_override` skips detection.
pub fn generate(root: &Path, framework_override: Option<Framework>, config: &Config) -> SchemaSet {
    let info = match framework_override {
        Some(fw) => FrameworkInfo::new(fw, None),
        None => framework::detect(root),
    };
    tracing::info!(
        root = %root.display(),
        framework = %info.framework,
        version = info.version.as_deref().unwrap_or("-"),
        "generating schemas"
    );

    let generator = generator_for(info.framework, config);
    tracing::debug!(generator = %generator.framework(), "selected generator");
    let set = SchemaSet {
        database: generator.database(root),
        api: generator.api(root),
        business_logic: generator.business_logic(root),
        component_architecture: generator.component_architecture(root),
        metadata: GenerationMetadata {
            framework: info,
            generated_at: Utc::now(),
            schema_format_version: SCHEMA_FORMAT_VERSION.to_string(),
            project_root: root.display().to_string(),
            generator: format!("schemagen {}", env!("CARGO_PKG_VERSION")),
        },
    };

    for (kind, error) in set.errors() {
        tracing::warn!(schema = %kind, error, "schema extraction reported errors");
    }
    set
}
