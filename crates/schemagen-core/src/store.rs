//! On-disk schema storage.
//!
//! Layout under the schema root:
//!
//! ```text
//! current/<kind>-schema.yaml      latest documents, overwritten every save
//! current/metadata.yaml
//! versions/v<timestamp>/<kind>.yaml   one snapshot per save, never pruned
//! versions/v<timestamp>/metadata.yaml
//! history/changes.yaml            newest-first ledger, at most HISTORY_LIMIT entries
//! ```
//!
//! Saves are not coordinated across processes: two concurrent saves on the
//! same root race on `current/` and may produce near-identical version keys.

use crate::config::Config;
use crate::error::Result;
use crate::framework::Framework;
use crate::io;
use crate::paths;
use crate::schema::{GenerationMetadata, SchemaKind, SchemaSet};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const HISTORY_LIMIT: usize = 50;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub framework: Framework,
    pub schemas: Vec<SchemaKind>,
    pub change_log: String,
}

/// Where a save landed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReceipt {
    pub version: String,
    pub current_dir: PathBuf,
    pub version_dir: PathBuf,
    pub history_len: usize,
}

/// Summary of what is currently stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaInfo {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub metadata: Option<GenerationMetadata>,
    pub available_schemas: Vec<SchemaKind>,
    /// Version keys, newest first.
    pub versions: Vec<String>,
}

/// Version key for a save at `at`: `v` + RFC 3339 with `:` and `.` replaced by `-`.
pub fn version_key(at: DateTime<Utc>) -> String {
    let stamp = at.to_rfc3339_opts(SecondsFormat::Millis, true);
    format!("v{}", stamp.replace([':', '.'], "-"))
}

// ---------------------------------------------------------------------------
// HistoryLedger
// ---------------------------------------------------------------------------

/// The bounded change ledger for one schema root.
pub struct HistoryLedger {
    path: PathBuf,
}

impl HistoryLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Current entries, newest first. A missing or unparsable ledger reads as empty.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        match io::read_yaml::<Vec<HistoryEntry>>(&self.path) {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "history ledger unreadable, starting fresh");
                Vec::new()
            }
        }
    }

    /// Prepend `entry`, keep the newest [`HISTORY_LIMIT`], rewrite the file.
    /// Returns the ledger length after the write.
    pub fn append(&self, entry: HistoryEntry) -> Result<usize> {
        let mut entries = self.entries();
        entries.insert(0, entry);
        entries.truncate(HISTORY_LIMIT);
        io::write_yaml(&self.path, &entries)?;
        Ok(entries.len())
    }
}

// ---------------------------------------------------------------------------
// SchemaStore
// ---------------------------------------------------------------------------

pub struct SchemaStore {
    root: PathBuf,
}

impl SchemaStore {
    pub fn new(schema_root: impl Into<PathBuf>) -> Self {
        Self {
            root: schema_root.into(),
        }
    }

    pub fn for_project(project_root: &Path, config: &Config) -> Self {
        Self::new(config.schema_root(project_root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ledger(&self) -> HistoryLedger {
        HistoryLedger::new(paths::history_path(&self.root))
    }

    /// Create the schema root and its `current`, `versions` and `history`
    /// directories. Safe to call repeatedly.
    pub fn ensure_layout(&self) -> Result<()> {
        io::ensure_dir(&self.root)?;
        io::ensure_dir(&paths::current_dir(&self.root))?;
        io::ensure_dir(&paths::versions_dir(&self.root))?;
        io::ensure_dir(&paths::history_dir(&self.root))?;
        Ok(())
    }

    pub fn save(&self, set: &SchemaSet, change_log: &str) -> Result<SaveReceipt> {
        self.save_at(set, change_log, Utc::now())
    }

    /// Write `set` to `current/`, snapshot it under `versions/`, and record a
    /// ledger entry stamped `at`.
    pub fn save_at(
        &self,
        set: &SchemaSet,
        change_log: &str,
        at: DateTime<Utc>,
    ) -> Result<SaveReceipt> {
        self.ensure_layout()?;
        let version = self.free_version_key(at);

        for &kind in SchemaKind::all() {
            let yaml = set.to_yaml(kind)?;
            io::atomic_write(&paths::current_document(&self.root, kind), yaml.as_bytes())?;
            io::atomic_write(
                &paths::version_document(&self.root, &version, kind),
                yaml.as_bytes(),
            )?;
        }
        io::write_yaml(&paths::current_metadata(&self.root), &set.metadata)?;
        io::write_yaml(
            &paths::version_dir(&self.root, &version).join(paths::METADATA_FILE),
            &set.metadata,
        )?;

        let history_len = self.ledger().append(HistoryEntry {
            timestamp: at,
            version: version.clone(),
            framework: set.metadata.framework.framework,
            schemas: SchemaKind::all().to_vec(),
            change_log: change_log.to_string(),
        })?;

        tracing::info!(root = %self.root.display(), %version, "schemas saved");
        Ok(SaveReceipt {
            current_dir: paths::current_dir(&self.root),
            version_dir: paths::version_dir(&self.root, &version),
            version,
            history_len,
        })
    }

    /// The first version key at or after `at` with no snapshot on disk.
    /// Saves landing in the same millisecond step forward one millisecond
    /// at a time, keeping lexical order chronological.
    fn free_version_key(&self, at: DateTime<Utc>) -> String {
        let mut candidate = at;
        loop {
            let key = version_key(candidate);
            if !paths::version_dir(&self.root, &key).exists() {
                return key;
            }
            candidate += Duration::milliseconds(1);
        }
    }

    /// Metadata of the current generation, `None` if nothing was saved yet.
    pub fn read_metadata(&self) -> Result<Option<GenerationMetadata>> {
        io::read_yaml(&paths::current_metadata(&self.root))
    }

    /// Describe the stored state. "No schemas yet" is reported with
    /// `success: false`, not as an error.
    pub fn load(&self) -> Result<SchemaInfo> {
        let Some(metadata) = self.read_metadata()? else {
            return Ok(SchemaInfo {
                success: false,
                message: Some("No schemas found".to_string()),
                metadata: None,
                available_schemas: Vec::new(),
                versions: Vec::new(),
            });
        };

        let available_schemas = SchemaKind::all()
            .iter()
            .copied()
            .filter(|kind| paths::current_document(&self.root, *kind).exists())
            .collect();

        Ok(SchemaInfo {
            success: true,
            message: None,
            metadata: Some(metadata),
            available_schemas,
            versions: self.versions()?,
        })
    }

    /// One current document as a generic YAML value.
    pub fn load_document(&self, kind: SchemaKind) -> Result<Option<serde_yaml::Value>> {
        io::read_yaml(&paths::current_document(&self.root, kind))
    }

    /// Version keys, newest first.
    pub fn versions(&self) -> Result<Vec<String>> {
        let dir = paths::versions_dir(&self.root);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.path().is_dir() {
                versions.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        // Keys share a fixed-width timestamp format, so lexical order is chronological.
        versions.sort_unstable_by(|a, b| b.cmp(a));
        Ok(versions)
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.ledger().entries()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::FrameworkInfo;
    use crate::schema::{
        ApiSchema, BusinessLogicSchema, ComponentArchitectureSchema, DatabaseSchema,
        SchemaDocument, SCHEMA_FORMAT_VERSION,
    };
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn sample_set(at: DateTime<Utc>) -> SchemaSet {
        let fw = Framework::Laravel;
        SchemaSet {
            database: DatabaseSchema::new(fw),
            api: ApiSchema::new(fw),
            business_logic: BusinessLogicSchema::new(fw),
            component_architecture: ComponentArchitectureSchema::pending(fw),
            metadata: GenerationMetadata {
                framework: FrameworkInfo::new(fw, Some("^10.0".to_string())),
                generated_at: at,
                schema_format_version: SCHEMA_FORMAT_VERSION.to_string(),
                project_root: "/tmp/project".to_string(),
                generator: "schemagen test".to_string(),
            },
        }
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 15).unwrap()
    }

    #[test]
    fn version_key_replaces_separators() {
        let at = base_time() + Duration::milliseconds(42);
        assert_eq!(version_key(at), "v2024-05-01T12-30-15-042Z");
    }

    #[test]
    fn save_writes_current_versions_and_history() {
        let dir = TempDir::new().unwrap();
        let store = SchemaStore::new(dir.path().join(".schemas"));
        let at = base_time();
        let receipt = store.save_at(&sample_set(at), "initial", at).unwrap();

        assert_eq!(receipt.version, "v2024-05-01T12-30-15-000Z");
        assert_eq!(receipt.history_len, 1);
        let root = store.root();
        for name in [
            "database-schema.yaml",
            "api-schema.yaml",
            "businessLogic-schema.yaml",
            "componentArchitecture-schema.yaml",
            "metadata.yaml",
        ] {
            assert!(root.join("current").join(name).exists(), "missing {name}");
        }
        for name in [
            "database.yaml",
            "api.yaml",
            "businessLogic.yaml",
            "componentArchitecture.yaml",
            "metadata.yaml",
        ] {
            assert!(receipt.version_dir.join(name).exists(), "missing {name}");
        }
        assert!(root.join("history/changes.yaml").exists());

        let history = store.history();
        assert_eq!(history[0].change_log, "initial");
        assert_eq!(history[0].framework, Framework::Laravel);
        assert_eq!(history[0].schemas.len(), 4);
    }

    #[test]
    fn load_without_metadata_reports_not_found() {
        let dir = TempDir::new().unwrap();
        let store = SchemaStore::new(dir.path().join(".schemas"));
        let info = store.load().unwrap();
        assert!(!info.success);
        assert!(info.metadata.is_none());
        assert!(store.versions().unwrap().is_empty());
    }

    #[test]
    fn load_lists_schemas_and_versions_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = SchemaStore::new(dir.path().join(".schemas"));
        let first = base_time();
        let second = first + Duration::minutes(5);
        store.save_at(&sample_set(first), "one", first).unwrap();
        store.save_at(&sample_set(second), "two", second).unwrap();

        let info = store.load().unwrap();
        assert!(info.success);
        assert_eq!(info.available_schemas, SchemaKind::all().to_vec());
        assert_eq!(
            info.versions,
            [version_key(second), version_key(first)]
        );
        assert_eq!(info.metadata.unwrap().generated_at, second);
    }

    #[test]
    fn current_is_overwritten_and_documents_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = SchemaStore::new(dir.path().join(".schemas"));
        let at = base_time();
        let mut set = sample_set(at);
        store.save_at(&set, "first", at).unwrap();

        set.database.record_error("boom");
        store
            .save_at(&set, "second", at + Duration::seconds(1))
            .unwrap();

        let raw = std::fs::read_to_string(store.root().join("current/database-schema.yaml")).unwrap();
        let back: DatabaseSchema = serde_yaml::from_str(&raw).unwrap();
        assert_eq!(back, set.database);

        let doc = store.load_document(SchemaKind::Database).unwrap().unwrap();
        assert_eq!(doc["error"], "boom");
        let pending = store
            .load_document(SchemaKind::ComponentArchitecture)
            .unwrap()
            .unwrap();
        assert_eq!(pending["note"], "pending");
    }

    #[test]
    fn history_is_bounded_and_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = SchemaStore::new(dir.path().join(".schemas"));
        let start = base_time();
        let mut last = start;
        for i in 0..51 {
            last = start + Duration::seconds(i);
            store
                .save_at(&sample_set(last), &format!("run {i}"), last)
                .unwrap();
        }

        let history = store.history();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0].timestamp, last);
        assert_eq!(history[0].change_log, "run 50");
        assert_eq!(history[49].change_log, "run 1");
        // The versions archive is not pruned.
        assert_eq!(store.versions().unwrap().len(), 51);
    }

    #[test]
    fn saves_in_the_same_millisecond_keep_both_snapshots() {
        let dir = TempDir::new().unwrap();
        let store = SchemaStore::new(dir.path().join(".schemas"));
        let at = base_time();
        let mut set = sample_set(at);
        set.database.header.note = Some("first run".to_string());
        let first = store.save_at(&set, "one", at).unwrap();
        set.database.header.note = Some("second run".to_string());
        let second = store.save_at(&set, "two", at).unwrap();

        assert_ne!(first.version, second.version);
        assert_eq!(second.version, version_key(at + Duration::milliseconds(1)));
        assert_eq!(store.versions().unwrap(), [second.version.clone(), first.version.clone()]);

        let kept = std::fs::read_to_string(first.version_dir.join("database.yaml")).unwrap();
        assert!(kept.contains("first run"));

        let history = store.history();
        assert_eq!(history[0].version, second.version);
        assert_eq!(history[1].version, first.version);
        assert_eq!(history[0].timestamp, at);
    }

    #[test]
    fn corrupt_ledger_is_treated_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = SchemaStore::new(dir.path().join(".schemas"));
        store.ensure_layout().unwrap();
        std::fs::write(
            store.root().join("history/changes.yaml"),
            "{{{ not: [valid yaml",
        )
        .unwrap();

        let at = base_time();
        let receipt = store.save_at(&sample_set(at), "after corruption", at).unwrap();
        assert_eq!(receipt.history_len, 1);
        assert_eq!(store.history()[0].change_log, "after corruption");
    }

    #[test]
    fn ensure_layout_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = SchemaStore::new(dir.path().join("nested/.schemas"));
        store.ensure_layout().unwrap();
        store.ensure_layout().unwrap();
        assert!(store.root().join("current").is_dir());
        assert!(store.root().join("versions").is_dir());
        assert!(store.root().join("history").is_dir());
    }
}
