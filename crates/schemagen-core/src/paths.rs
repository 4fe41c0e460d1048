use crate::schema::SchemaKind;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const DEFAULT_SCHEMA_DIR: &str = ".schemas";
pub const CONFIG_FILE: &str = ".schemagen.yaml";

pub const CURRENT_DIR: &str = "current";
pub const VERSIONS_DIR: &str = "versions";
pub const HISTORY_DIR: &str = "history";

pub const METADATA_FILE: &str = "metadata.yaml";
pub const HISTORY_FILE: &str = "changes.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_FILE)
}

pub fn current_dir(schema_root: &Path) -> PathBuf {
    schema_root.join(CURRENT_DIR)
}

pub fn versions_dir(schema_root: &Path) -> PathBuf {
    schema_root.join(VERSIONS_DIR)
}

pub fn history_dir(schema_root: &Path) -> PathBuf {
    schema_root.join(HISTORY_DIR)
}

pub fn history_path(schema_root: &Path) -> PathBuf {
    history_dir(schema_root).join(HISTORY_FILE)
}

pub fn current_metadata(schema_root: &Path) -> PathBuf {
    current_dir(schema_root).join(METADATA_FILE)
}

/// `current/<kind>-schema.yaml`
pub fn current_document(schema_root: &Path, kind: SchemaKind) -> PathBuf {
    current_dir(schema_root).join(format!("{}-schema.yaml", kind.as_str()))
}

/// `versions/<version>/`
pub fn version_dir(schema_root: &Path, version: &str) -> PathBuf {
    versions_dir(schema_root).join(version)
}

/// `versions/<version>/<kind>.yaml`
pub fn version_document(schema_root: &Path, version: &str, kind: SchemaKind) -> PathBuf {
    version_dir(schema_root, version).join(format!("{}.yaml", kind.as_str()))
}
