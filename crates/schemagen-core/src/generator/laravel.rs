use super::SchemaGenerator;
use crate::config::ArtisanConfig;
use crate::error::{Result, SchemaError};
use crate::extract;
use crate::framework::Framework;
use crate::process;
use crate::scanner::{self, relative_path, ScanTree};
use crate::schema::{
    ApiSchema, BusinessLogicSchema, ComponentArchitectureSchema, ConfigSnippet, Constraint,
    ConstraintKind, ControllerInfo, DatabaseSchema, Dependencies, IndexInfo, Relationship,
    RelationshipKind, RouteDef, RouteMethod, RouteType, SchemaDocument,
};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

const MIGRATIONS_DIR: &str = "database/migrations";
const ROUTES_DIR: &str = "routes";
const CONTROLLERS_DIR: &str = "app/Http/Controllers";
const KERNEL_FILE: &str = "app/Http/Kernel.php";
const BOOTSTRAP_APP_FILE: &str = "bootstrap/app.php";
const CONFIG_DIR: &str = "config";
const PHP: &str = ".php";

/// A business-logic directory and the document field its tree fills.
struct BusinessDir {
    dir: &'static str,
    slot: fn(&mut BusinessLogicSchema) -> &mut ScanTree,
}

const BUSINESS_DIRS: &[BusinessDir] = &[
    BusinessDir { dir: "app/Models", slot: |d| &mut d.models },
    BusinessDir { dir: "app/Policies", slot: |d| &mut d.policies },
    BusinessDir { dir: "app/Services", slot: |d| &mut d.services },
    BusinessDir { dir: "app/Events", slot: |d| &mut d.events },
    BusinessDir { dir: "app/Jobs", slot: |d| &mut d.jobs },
    BusinessDir { dir: "app/Rules", slot: |d| &mut d.rules },
    BusinessDir { dir: "app/Console/Commands", slot: |d| &mut d.commands },
    BusinessDir { dir: "app/Http/Middleware", slot: |d| &mut d.middleware },
];

/// (category, directory, filter) triples for the component structure.
const STRUCTURE_DIRS: &[(&str, &str, &str)] = &[
    ("controllers", "app/Http/Controllers", PHP),
    ("models", "app/Models", PHP),
    ("views", "resources/views", ".blade.php"),
    ("components", "app/View/Components", PHP),
    ("providers", "app/Providers", PHP),
    ("routes", "routes", PHP),
];

pub struct LaravelGenerator {
    artisan: ArtisanConfig,
}

impl LaravelGenerator {
    pub fn new(artisan: ArtisanConfig) -> Self {
        Self { artisan }
    }

    // -----------------------------------------------------------------------
    // Database
    // -----------------------------------------------------------------------

    fn build_database(&self, root: &Path) -> Result<DatabaseSchema> {
        let mut doc = DatabaseSchema::new(Framework::Laravel);
        let mut keys: Vec<(String, bool, Vec<String>)> = Vec::new();

        for path in scanner::list_files(&root.join(MIGRATIONS_DIR), PHP)? {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let text = match std::fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    doc.record_error(format!("{filename}: {e}"));
                    continue;
                }
            };
            let Some(table) = extract::migration_table(&text, &filename) else {
                continue;
            };
            for (unique, columns) in extract::key_definitions(&text) {
                keys.push((table.name.clone(), unique, columns));
            }
            // Later migrations on the same table extend the first record.
            match doc.tables.entry(table.name.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(table);
                }
                Entry::Occupied(mut slot) => {
                    let existing = slot.get_mut();
                    existing.columns.extend(table.columns);
                    existing.foreign_keys.extend(table.foreign_keys);
                }
            }
        }

        for table in doc.tables.values() {
            for column in table.columns.values() {
                if column.unique {
                    doc.constraints.push(Constraint {
                        table: table.name.clone(),
                        column: column.name.clone(),
                        kind: ConstraintKind::Unique,
                    });
                }
                if column.index {
                    doc.indexes.push(IndexInfo {
                        table: table.name.clone(),
                        columns: vec![column.name.clone()],
                    });
                }
            }
            for fk in &table.foreign_keys {
                doc.relationships.push(Relationship {
                    from_table: table.name.clone(),
                    column: fk.column.clone(),
                    to_table: fk.on.clone(),
                    references: fk.references.clone(),
                    kind: RelationshipKind::BelongsTo,
                });
                doc.constraints.push(Constraint {
                    table: table.name.clone(),
                    column: fk.column.clone(),
                    kind: ConstraintKind::Foreign,
                });
            }
        }

        for (table, unique, columns) in keys {
            if unique {
                for column in columns {
                    doc.constraints.push(Constraint {
                        table: table.clone(),
                        column,
                        kind: ConstraintKind::Unique,
                    });
                }
            } else {
                doc.indexes.push(IndexInfo { table, columns });
            }
        }

        tracing::debug!(tables = doc.tables.len(), "database schema extracted");
        Ok(doc)
    }

    // -----------------------------------------------------------------------
    // API
    // -----------------------------------------------------------------------

    fn build_api(&self, root: &Path) -> Result<ApiSchema> {
        let mut doc = ApiSchema::new(Framework::Laravel);

        let routes_dir = root.join(ROUTES_DIR);
        for path in scanner::list_files(&routes_dir, PHP)? {
            let key = relative_path(&routes_dir, &path)
                .trim_end_matches(PHP)
                .to_string();
            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    doc.routes.insert(key, extract::routes(&text));
                }
                Err(e) => doc.record_error(format!("routes/{key}.php: {e}")),
            }
        }

        if self.artisan.enabled {
            match self.artisan_routes(root) {
                Ok(routes) => {
                    doc.routes.insert("artisan".to_string(), routes);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "artisan route:list unavailable, using static routes only");
                }
            }
        }

        for candidate in [KERNEL_FILE, BOOTSTRAP_APP_FILE] {
            let path = root.join(candidate);
            if !path.exists() {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    doc.middleware = extract::middleware_map(&text);
                    break;
                }
                Err(e) => doc.record_error(format!("{candidate}: {e}")),
            }
        }

        let controllers_dir = root.join(CONTROLLERS_DIR);
        for path in scanner::list_files(&controllers_dir, PHP)? {
            let name = relative_path(&controllers_dir, &path)
                .trim_end_matches(PHP)
                .to_string();
            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    doc.controllers.insert(
                        name,
                        ControllerInfo {
                            path: relative_path(root, &path),
                            facts: extract::class_facts(&text),
                        },
                    );
                }
                Err(e) => doc.record_error(format!("{}: {e}", relative_path(root, &path))),
            }
        }

        Ok(doc)
    }

    fn artisan_routes(&self, root: &Path) -> Result<Vec<RouteDef>> {
        let output = process::run(
            &self.artisan.php,
            &["artisan", "route:list", "--json"],
            root,
            Duration::from_secs(self.artisan.timeout_secs),
        )?;
        if !output.success() {
            return Err(SchemaError::ProcessFailed {
                program: self.artisan.php.clone(),
                code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        parse_route_list(&output.stdout)
    }

    // -----------------------------------------------------------------------
    // Business logic
    // -----------------------------------------------------------------------

    fn build_business_logic(&self, root: &Path) -> BusinessLogicSchema {
        let mut doc = BusinessLogicSchema::new(Framework::Laravel);
        for entry in BUSINESS_DIRS {
            let dir = entry.dir;
            let tree = match scanner::scan(root, &root.join(dir), PHP) {
                Ok(tree) => tree,
                Err(e) => {
                    doc.record_error(format!("{dir}: {e}"));
                    continue;
                }
            };
            *(entry.slot)(&mut doc) = tree;
        }
        doc
    }

    // -----------------------------------------------------------------------
    // Component architecture
    // -----------------------------------------------------------------------

    fn build_component_architecture(&self, root: &Path) -> ComponentArchitectureSchema {
        let mut doc = ComponentArchitectureSchema::new(Framework::Laravel);

        for (category, dir, filter) in STRUCTURE_DIRS {
            match scanner::scan(root, &root.join(dir), filter) {
                Ok(tree) if tree.is_empty() => {}
                Ok(tree) => {
                    doc.structure.insert(category.to_string(), tree);
                }
                Err(e) => doc.record_error(format!("{dir}: {e}")),
            }
        }

        match composer_dependencies(root) {
            Ok(deps) => doc.dependencies = deps,
            Err(e) => doc.record_error(format!("composer.json: {e}")),
        }

        match config_snippets(root) {
            Ok(configuration) => doc.configuration = configuration,
            Err(e) => doc.record_error(format!("{CONFIG_DIR}: {e}")),
        }

        doc
    }
}

impl SchemaGenerator for LaravelGenerator {
    fn framework(&self) -> Framework {
        Framework::Laravel
    }

    fn database(&self, root: &Path) -> DatabaseSchema {
        self.build_database(root)
            .unwrap_or_else(|e| DatabaseSchema::failed(Framework::Laravel, e))
    }

    fn api(&self, root: &Path) -> ApiSchema {
        self.build_api(root)
            .unwrap_or_else(|e| ApiSchema::failed(Framework::Laravel, e))
    }

    fn business_logic(&self, root: &Path) -> BusinessLogicSchema {
        self.build_business_logic(root)
    }

    fn component_architecture(&self, root: &Path) -> ComponentArchitectureSchema {
        self.build_component_architecture(root)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn composer_dependencies(root: &Path) -> Result<Dependencies> {
    let path = root.join("composer.json");
    if !path.exists() {
        return Ok(Dependencies::default());
    }
    let raw = std::fs::read_to_string(&path)?;
    let manifest: serde_json::Value = serde_json::from_str(&raw)?;
    Ok(Dependencies {
        require: string_map(&manifest["require"]),
        require_dev: string_map(&manifest["require-dev"]),
        autoload: manifest["autoload"].clone(),
        scripts: manifest["scripts"].clone(),
    })
}

fn string_map(value: &serde_json::Value) -> BTreeMap<String, String> {
    value
        .as_object()
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

fn config_snippets(root: &Path) -> Result<BTreeMap<String, ConfigSnippet>> {
    let config_dir = root.join(CONFIG_DIR);
    let mut out = BTreeMap::new();
    for path in scanner::list_files(&config_dir, PHP)? {
        let name = relative_path(&config_dir, &path)
            .trim_end_matches(PHP)
            .to_string();
        let record = scanner::read_record(root, &path)?;
        let full = std::fs::read_to_string(&path)?;
        out.insert(
            name,
            ConfigSnippet {
                path: record.path,
                size: record.size,
                keys: extract::config_keys(&full),
                content: record.content,
            },
        );
    }
    Ok(out)
}

/// Parse the JSON printed by `php artisan route:list --json`.
pub fn parse_route_list(json: &str) -> Result<Vec<RouteDef>> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
    Ok(entries
        .iter()
        .map(|entry| {
            let verb = entry["method"]
                .as_str()
                .and_then(|m| m.split('|').next())
                .unwrap_or_default()
                .to_ascii_lowercase();
            let method = match verb.as_str() {
                "get" => RouteMethod::Get,
                "post" => RouteMethod::Post,
                "put" => RouteMethod::Put,
                "patch" => RouteMethod::Patch,
                "delete" => RouteMethod::Delete,
                _ => RouteMethod::Unknown,
            };
            let controller = entry["action"]
                .as_str()
                .and_then(|a| a.split('@').next())
                .filter(|a| a.contains("Controller"))
                .map(str::to_string);
            RouteDef {
                method,
                path: entry["uri"].as_str().unwrap_or_default().to_string(),
                controller,
                route_type: RouteType::Single,
            }
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
