//! Schema document types.
//!
//! Every document carries a [`DocumentHeader`] (`type`, `framework`, and the
//! optional `note`/`error` strings). Empty collections are left out of the
//! serialized form, so a placeholder document is just its header.

use crate::error::{Result, SchemaError};
use crate::framework::{Framework, FrameworkInfo};
use crate::scanner::ScanTree;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const SCHEMA_FORMAT_VERSION: &str = "1.0";
pub const PENDING_NOTE: &str = "pending";

// ---------------------------------------------------------------------------
// SchemaKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SchemaKind {
    Database,
    Api,
    BusinessLogic,
    ComponentArchitecture,
}

impl SchemaKind {
    pub fn all() -> &'static [SchemaKind] {
        &[
            SchemaKind::Database,
            SchemaKind::Api,
            SchemaKind::BusinessLogic,
            SchemaKind::ComponentArchitecture,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SchemaKind::Database => "database",
            SchemaKind::Api => "api",
            SchemaKind::BusinessLogic => "businessLogic",
            SchemaKind::ComponentArchitecture => "componentArchitecture",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SchemaKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "database" => Ok(SchemaKind::Database),
            "api" => Ok(SchemaKind::Api),
            "businesslogic" => Ok(SchemaKind::BusinessLogic),
            "componentarchitecture" => Ok(SchemaKind::ComponentArchitecture),
            _ => Err(SchemaError::UnknownSchema(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// DocumentHeader / SchemaDocument
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentHeader {
    #[serde(rename = "type")]
    pub kind: SchemaKind,
    pub framework: Framework,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentHeader {
    pub fn new(kind: SchemaKind, framework: Framework) -> Self {
        Self {
            kind,
            framework,
            note: None,
            error: None,
        }
    }
}

/// Shared behaviour of the four schema documents.
pub trait SchemaDocument: Serialize + DeserializeOwned + Sized {
    const KIND: SchemaKind;

    fn from_header(header: DocumentHeader) -> Self;
    fn header(&self) -> &DocumentHeader;
    fn header_mut(&mut self) -> &mut DocumentHeader;

    fn new(framework: Framework) -> Self {
        Self::from_header(DocumentHeader::new(Self::KIND, framework))
    }

    /// Stub document for frameworks without a concrete generator.
    fn pending(framework: Framework) -> Self {
        let mut doc = Self::new(framework);
        doc.header_mut().note = Some(PENDING_NOTE.to_string());
        doc
    }

    /// Document carrying only an extraction failure.
    fn failed(framework: Framework, error: impl fmt::Display) -> Self {
        let mut doc = Self::new(framework);
        doc.record_error(error);
        doc
    }

    /// Append a failure message, keeping earlier ones.
    fn record_error(&mut self, error: impl fmt::Display) {
        let header = self.header_mut();
        header.error = Some(match header.error.take() {
            Some(prev) => format!("{prev}; {error}"),
            None => error.to_string(),
        });
    }

    fn error(&self) -> Option<&str> {
        self.header().error.as_deref()
    }
}

macro_rules! impl_document_header {
    ($ty:ty, $kind:expr, { $($field:ident),* $(,)? }) => {
        impl SchemaDocument for $ty {
            const KIND: SchemaKind = $kind;

            fn from_header(header: DocumentHeader) -> Self {
                Self {
                    header,
                    $($field: Default::default(),)*
                }
            }

            fn header(&self) -> &DocumentHeader {
                &self.header
            }

            fn header_mut(&mut self) -> &mut DocumentHeader {
                &mut self.header
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Database
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableOperation {
    Create,
    Modify,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub unique: bool,
    pub index: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReferentialAction {
    Cascade,
    Restrict,
    SetNull,
    NoAction,
    SetDefault,
}

impl std::str::FromStr for ReferentialAction {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "cascade" => Ok(ReferentialAction::Cascade),
            "restrict" => Ok(ReferentialAction::Restrict),
            "setnull" | "nullify" => Ok(ReferentialAction::SetNull),
            "noaction" => Ok(ReferentialAction::NoAction),
            "setdefault" => Ok(ReferentialAction::SetDefault),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyInfo {
    pub column: String,
    pub references: String,
    pub on: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ReferentialAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<ReferentialAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub operation: TableOperation,
    pub filename: String,
    #[serde(default)]
    pub columns: BTreeMap<String, ColumnInfo>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipKind {
    BelongsTo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub from_table: String,
    pub column: String,
    pub to_table: String,
    pub references: String,
    pub kind: RelationshipKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintKind {
    Unique,
    Foreign,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub table: String,
    pub column: String,
    pub kind: ConstraintKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub table: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSchema {
    #[serde(flatten)]
    pub header: DocumentHeader,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tables: BTreeMap<String, TableInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<IndexInfo>,
}

impl_document_header!(DatabaseSchema, SchemaKind::Database, {
    tables,
    relationships,
    constraints,
    indexes,
});

// ---------------------------------------------------------------------------
// API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Resource,
    Group,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteType {
    Single,
    Resource,
    Group,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDef {
    pub method: RouteMethod,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    #[serde(rename = "type")]
    pub route_type: RouteType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiddlewareEntry {
    pub key: String,
    pub class: String,
}

/// Shallow facts about one class, as found by the class extractors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassFacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traits: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uses: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerInfo {
    pub path: String,
    #[serde(flatten)]
    pub facts: ClassFacts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSchema {
    #[serde(flatten)]
    pub header: DocumentHeader,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub routes: BTreeMap<String, Vec<RouteDef>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub middleware: Vec<MiddlewareEntry>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub controllers: BTreeMap<String, ControllerInfo>,
}

impl_document_header!(ApiSchema, SchemaKind::Api, {
    routes,
    middleware,
    controllers,
});

// ---------------------------------------------------------------------------
// Business logic
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessLogicSchema {
    #[serde(flatten)]
    pub header: DocumentHeader,
    #[serde(default, skip_serializing_if = "ScanTree::is_empty")]
    pub models: ScanTree,
    #[serde(default, skip_serializing_if = "ScanTree::is_empty")]
    pub policies: ScanTree,
    #[serde(default, skip_serializing_if = "ScanTree::is_empty")]
    pub services: ScanTree,
    #[serde(default, skip_serializing_if = "ScanTree::is_empty")]
    pub events: ScanTree,
    #[serde(default, skip_serializing_if = "ScanTree::is_empty")]
    pub jobs: ScanTree,
    #[serde(default, skip_serializing_if = "ScanTree::is_empty")]
    pub rules: ScanTree,
    #[serde(default, skip_serializing_if = "ScanTree::is_empty")]
    pub commands: ScanTree,
    #[serde(default, skip_serializing_if = "ScanTree::is_empty")]
    pub middleware: ScanTree,
}

impl_document_header!(BusinessLogicSchema, SchemaKind::BusinessLogic, {
    models,
    policies,
    services,
    events,
    jobs,
    rules,
    commands,
    middleware,
});

// ---------------------------------------------------------------------------
// Component architecture
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependencies {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub require: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub require_dev: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub autoload: serde_json::Value,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub scripts: serde_json::Value,
}

impl Dependencies {
    pub fn is_empty(&self) -> bool {
        self.require.is_empty()
            && self.require_dev.is_empty()
            && self.autoload.is_null()
            && self.scripts.is_null()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnippet {
    pub path: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentArchitectureSchema {
    #[serde(flatten)]
    pub header: DocumentHeader,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub structure: BTreeMap<String, ScanTree>,
    #[serde(default, skip_serializing_if = "Dependencies::is_empty")]
    pub dependencies: Dependencies,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub configuration: BTreeMap<String, ConfigSnippet>,
}

impl_document_header!(ComponentArchitectureSchema, SchemaKind::ComponentArchitecture, {
    structure,
    dependencies,
    configuration,
});

// ---------------------------------------------------------------------------
// Metadata / SchemaSet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMetadata {
    pub framework: FrameworkInfo,
    pub generated_at: DateTime<Utc>,
    pub schema_format_version: String,
    pub project_root: String,
    #[serde(default)]
    pub generator: String,
}

/// The output of one generation run: four documents plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSet {
    pub database: DatabaseSchema,
    pub api: ApiSchema,
    pub business_logic: BusinessLogicSchema,
    pub component_architecture: ComponentArchitectureSchema,
    pub metadata: GenerationMetadata,
}

impl SchemaSet {
    /// Render one document as YAML.
    pub fn to_yaml(&self, kind: SchemaKind) -> Result<String> {
        let yaml = match kind {
            SchemaKind::Database => serde_yaml::to_string(&self.database)?,
            SchemaKind::Api => serde_yaml::to_string(&self.api)?,
            SchemaKind::BusinessLogic => serde_yaml::to_string(&self.business_logic)?,
            SchemaKind::ComponentArchitecture => {
                serde_yaml::to_string(&self.component_architecture)?
            }
        };
        Ok(yaml)
    }

    /// Per-document extraction errors, in [`SchemaKind`] order.
    pub fn errors(&self) -> Vec<(SchemaKind, &str)> {
        [
            (SchemaKind::Database, self.database.error()),
            (SchemaKind::Api, self.api.error()),
            (SchemaKind::BusinessLogic, self.business_logic.error()),
            (
                SchemaKind::ComponentArchitecture,
                self.component_architecture.error(),
            ),
        ]
        .into_iter()
        .filter_map(|(kind, err)| err.map(|e| (kind, e)))
        .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
