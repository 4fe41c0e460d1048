use schemagen_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the project root.
///
/// Priority:
/// 1. `--project` flag / `SCHEMAGEN_PROJECT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.schemagen.yaml` or `.schemas/`
/// 3. Walk upward from `cwd` looking for `composer.json` or `.git/`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    resolve_from(&cwd)
}

fn resolve_from(start: &Path) -> PathBuf {
    let schemagen_marker = |dir: &Path| {
        dir.join(paths::CONFIG_FILE).is_file() || dir.join(paths::DEFAULT_SCHEMA_DIR).is_dir()
    };
    if let Some(dir) = find_upward(start, schemagen_marker) {
        return dir;
    }

    let project_marker =
        |dir: &Path| dir.join("composer.json").is_file() || dir.join(".git").is_dir();
    if let Some(dir) = find_upward(start, project_marker) {
        return dir;
    }

    start.to_path_buf()
}

fn find_upward(start: &Path, is_root: impl Fn(&Path) -> bool) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| is_root(dir))
        .map(Path::to_path_buf)
}
