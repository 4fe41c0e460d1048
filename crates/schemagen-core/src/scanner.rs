//! Recursive directory scan producing truncated [`FileRecord`]s.

use crate::error::Result;
use crate::io::truncate_utf8;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Maximum number of content bytes kept per scanned file.
pub const CONTENT_CAP: usize = 5120;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Path relative to the project root, `/`-separated.
    pub path: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    /// First [`CONTENT_CAP`] bytes of the file.
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScanEntry {
    File(FileRecord),
    Failed { error: String },
    Dir(ScanTree),
}

pub type ScanTree = BTreeMap<String, ScanEntry>;

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

/// Scan `dir`, recording files whose name ends with `filter` (an empty filter
/// matches every file). Paths in the records are relative to `project_root`.
///
/// A missing `dir` yields an empty tree. Unreadable files and subdirectories
/// become [`ScanEntry::Failed`] entries; empty subdirectories are pruned.
pub fn scan(project_root: &Path, dir: &Path, filter: &str) -> Result<ScanTree> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ScanTree::new()),
        Err(e) => return Err(e.into()),
    };

    let mut paths = Vec::new();
    for entry in entries {
        paths.push(entry?.path());
    }
    paths.sort();

    let mut tree = ScanTree::new();
    for path in paths {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };

        if path.is_dir() {
            match scan(project_root, &path, filter) {
                Ok(sub) if sub.is_empty() => {}
                Ok(sub) => {
                    tree.insert(name, ScanEntry::Dir(sub));
                }
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "skipping unreadable directory");
                    tree.insert(name, ScanEntry::Failed { error: e.to_string() });
                }
            }
        } else if filter.is_empty() || name.ends_with(filter) {
            let entry = match read_record(project_root, &path) {
                Ok(record) => ScanEntry::File(record),
                Err(e) => ScanEntry::Failed { error: e.to_string() },
            };
            tree.insert(name, entry);
        }
    }

    Ok(tree)
}

/// Build a [`FileRecord`] for a single file. Only the first
/// [`CONTENT_CAP`] bytes are read; `size` comes from the metadata.
pub fn read_record(project_root: &Path, path: &Path) -> Result<FileRecord> {
    let meta = std::fs::metadata(path)?;
    let mut bytes = Vec::with_capacity(CONTENT_CAP);
    File::open(path)?
        .take(CONTENT_CAP as u64)
        .read_to_end(&mut bytes)?;
    // A character split by the cap decodes to U+FFFD, which truncate_utf8 drops again.
    let text = String::from_utf8_lossy(&bytes);
    let last_modified: DateTime<Utc> = meta.modified()?.into();
    Ok(FileRecord {
        path: relative_path(project_root, path),
        size: meta.len(),
        last_modified,
        content: truncate_utf8(&text, CONTENT_CAP).to_string(),
    })
}

/// Every file under `dir` whose name ends with `filter`, sorted, recursing
/// into subdirectories. A missing `dir` yields an empty list.
///
/// Extractors read these in full; only [`FileRecord::content`] is capped.
pub fn list_files(dir: &Path, filter: &str) -> Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut paths = Vec::new();
    for entry in entries {
        paths.push(entry?.path());
    }
    paths.sort();

    let mut out = Vec::new();
    for path in paths {
        if path.is_dir() {
            out.extend(list_files(&path, filter)?);
        } else if path
            .file_name()
            .is_some_and(|n| filter.is_empty() || n.to_string_lossy().ends_with(filter))
        {
            out.push(path);
        }
    }
    Ok(out)
}

/// `path` relative to `root`, `/`-separated; falls back to the full path.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Iterate every [`FileRecord`] in a tree, depth first, in key order.
pub fn files(tree: &ScanTree) -> Vec<&FileRecord> {
    let mut out = Vec::new();
    collect_files(tree, &mut out);
    out
}

fn collect_files<'a>(tree: &'a ScanTree, out: &mut Vec<&'a FileRecord>) {
    for entry in tree.values() {
        match entry {
            ScanEntry::File(record) => out.push(record),
            ScanEntry::Dir(sub) => collect_files(sub, out),
            ScanEntry::Failed { .. } => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, rel: &str, body: &str) {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    #[test]
    fn missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let tree = scan(dir.path(), &dir.path().join("nope"), ".php").unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn filters_by_extension_and_prunes_empty_dirs() {
        let dir = TempDir::new().unwrap();
        write(&dir, "app/Models/User.php", "<?php class User {}");
        write(&dir, "app/Models/README.md", "docs");
        write(&dir, "app/Models/Concerns/notes.txt", "nothing");
        write(&dir, "app/Models/Nested/Post.php", "<?php class Post {}");

        let tree = scan(dir.path(), &dir.path().join("app/Models"), ".php").unwrap();
        assert_eq!(tree.len(), 2);
        assert!(!tree.contains_key("README.md"));
        assert!(!tree.contains_key("Concerns"));

        let ScanEntry::File(user) = &tree["User.php"] else {
            panic!("expected file record");
        };
        assert_eq!(user.path, "app/Models/User.php");
        assert_eq!(user.size, 19);
        assert_eq!(user.content, "<?php class User {}");

        let ScanEntry::Dir(nested) = &tree["Nested"] else {
            panic!("expected nested tree");
        };
        assert!(nested.contains_key("Post.php"));
        assert_eq!(files(&tree).len(), 2);
    }

    #[test]
    fn empty_filter_matches_everything() {
        let dir = TempDir::new().unwrap();
        write(&dir, "config/app.php", "<?php");
        write(&dir, "config/notes.txt", "x");
        let tree = scan(dir.path(), &dir.path().join("config"), "").unwrap();
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn content_is_truncated_to_cap() {
        let dir = TempDir::new().unwrap();
        let big = "a".repeat(CONTENT_CAP * 2);
        write(&dir, "src/big.php", &big);
        write(&dir, "src/small.php", "<?php echo 1;");
        let tree = scan(dir.path(), &dir.path().join("src"), ".php").unwrap();

        let ScanEntry::File(record) = &tree["big.php"] else {
            panic!("expected file record");
        };
        assert_eq!(record.content.len(), CONTENT_CAP);
        assert_eq!(record.size, (CONTENT_CAP * 2) as u64);

        let ScanEntry::File(record) = &tree["small.php"] else {
            panic!("expected file record");
        };
        assert_eq!(record.content, "<?php echo 1;");
    }

    #[test]
    fn multibyte_character_at_cap_is_dropped_whole() {
        let dir = TempDir::new().unwrap();
        let body = format!("{}é tail", "a".repeat(CONTENT_CAP - 1));
        write(&dir, "src/wide.php", &body);
        let record = read_record(dir.path(), &dir.path().join("src/wide.php")).unwrap();
        assert_eq!(record.content, "a".repeat(CONTENT_CAP - 1));
        assert_eq!(record.size, body.len() as u64);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_fails_alone() {
        let dir = TempDir::new().unwrap();
        write(&dir, "m/User.php", "<?php class User {}");
        std::os::unix::fs::symlink(
            dir.path().join("m/missing-target.php"),
            dir.path().join("m/dangling.php"),
        )
        .unwrap();

        let tree = scan(dir.path(), &dir.path().join("m"), ".php").unwrap();
        assert!(matches!(tree["dangling.php"], ScanEntry::Failed { .. }));
        let ScanEntry::File(user) = &tree["User.php"] else {
            panic!("expected file record");
        };
        assert_eq!(user.path, "m/User.php");
        assert_eq!(files(&tree).len(), 1);
    }

    #[test]
    fn list_files_recurses_in_order() {
        let dir = TempDir::new().unwrap();
        write(&dir, "routes/web.php", "");
        write(&dir, "routes/api.php", "");
        write(&dir, "routes/admin/users.php", "");
        write(&dir, "routes/readme.md", "");
        let found: Vec<String> = list_files(&dir.path().join("routes"), ".php")
            .unwrap()
            .iter()
            .map(|p| relative_path(dir.path(), p))
            .collect();
        assert_eq!(
            found,
            ["routes/admin/users.php", "routes/api.php", "routes/web.php"]
        );
        assert!(list_files(&dir.path().join("missing"), ".php")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn tree_roundtrips_through_yaml() {
        let dir = TempDir::new().unwrap();
        write(&dir, "app/Jobs/SendMail.php", "<?php class SendMail {}");
        write(&dir, "app/Jobs/Batch/Import.php", "<?php class Import {}");
        let mut tree = scan(dir.path(), &dir.path().join("app/Jobs"), ".php").unwrap();
        tree.insert(
            "Broken.php".to_string(),
            ScanEntry::Failed {
                error: "permission denied".to_string(),
            },
        );

        let yaml = serde_yaml::to_string(&tree).unwrap();
        let back: ScanTree = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, tree);
    }
}
