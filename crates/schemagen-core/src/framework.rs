//! Framework detection from marker files in a project root.
//!
//! Detection is read-only and never fails: any I/O or parse problem degrades
//! to [`Framework::Unknown`] with the message recorded in `error`.

use crate::error::SchemaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// Framework
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    Laravel,
    Rails,
    Django,
    Express,
    Unknown,
}

impl Framework {
    pub fn all() -> &'static [Framework] {
        &[
            Framework::Laravel,
            Framework::Rails,
            Framework::Django,
            Framework::Express,
            Framework::Unknown,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Framework::Laravel => "laravel",
            Framework::Rails => "rails",
            Framework::Django => "django",
            Framework::Express => "express",
            Framework::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Framework {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "laravel" => Ok(Framework::Laravel),
            "rails" => Ok(Framework::Rails),
            "django" => Ok(Framework::Django),
            "express" => Ok(Framework::Express),
            "unknown" => Ok(Framework::Unknown),
            _ => Err(SchemaError::UnknownFramework(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// FrameworkInfo
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkInfo {
    #[serde(rename = "type")]
    pub framework: Framework,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FrameworkInfo {
    pub fn new(framework: Framework, version: Option<String>) -> Self {
        Self {
            framework,
            version,
            error: None,
        }
    }

    pub fn unknown() -> Self {
        Self::new(Framework::Unknown, None)
    }

    fn failed(message: String) -> Self {
        Self {
            framework: Framework::Unknown,
            version: None,
            error: Some(message),
        }
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

const LARAVEL_PACKAGE: &str = "laravel/framework";
const EXPRESS_PACKAGE: &str = "express";
// Rails and Django markers carry no parsed version.
const DETECTED: &str = "detected";

/// Inspect marker files under `root`. First match wins, in the order
/// Laravel, Rails, Django, Express.
pub fn detect(root: &Path) -> FrameworkInfo {
    match try_detect(root) {
        Ok(info) => info,
        Err(e) => {
            tracing::warn!(root = %root.display(), error = %e, "framework detection failed");
            FrameworkInfo::failed(e.to_string())
        }
    }
}

fn try_detect(root: &Path) -> crate::Result<FrameworkInfo> {
    let composer = root.join("composer.json");
    if root.join("artisan").exists() && composer.exists() {
        let raw = std::fs::read_to_string(&composer)?;
        if raw.contains(LARAVEL_PACKAGE) {
            return Ok(FrameworkInfo::new(
                Framework::Laravel,
                Some(laravel_version(&raw)),
            ));
        }
    }

    if root.join("Gemfile").exists() && root.join("config/application.rb").exists() {
        return Ok(FrameworkInfo::new(Framework::Rails, Some(DETECTED.into())));
    }

    if root.join("manage.py").exists() && root.join("requirements.txt").exists() {
        return Ok(FrameworkInfo::new(Framework::Django, Some(DETECTED.into())));
    }

    let package = root.join("package.json");
    if package.exists() {
        let raw = std::fs::read_to_string(&package)?;
        let manifest: serde_json::Value = serde_json::from_str(&raw)?;
        if let Some(version) = express_version(&manifest) {
            return Ok(FrameworkInfo::new(Framework::Express, Some(version)));
        }
    }

    Ok(FrameworkInfo::unknown())
}

/// `require["laravel/framework"]` from composer.json, or `"unknown"` when the
/// manifest is unparsable or the field is missing.
fn laravel_version(raw: &str) -> String {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|v| v["require"][LARAVEL_PACKAGE].as_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

fn express_version(manifest: &serde_json::Value) -> Option<String> {
    ["dependencies", "devDependencies"]
        .iter()
        .find_map(|section| manifest[section][EXPRESS_PACKAGE].as_str())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
