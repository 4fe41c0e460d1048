//! Regex extractors over raw source text.
//!
//! These are token-window matchers, not parsers. Anything that does not match
//! a recognised shape is left out; no extractor fails. Where only one match is
//! kept, the earliest occurrence in the text wins.

use crate::schema::{
    ClassFacts, ColumnInfo, ForeignKeyInfo, MiddlewareEntry, ReferentialAction, RouteDef,
    RouteMethod, RouteType, TableInfo, TableOperation,
};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($re).unwrap())
        }
    };
}

pattern!(table_re, r#"Schema::(create|table)\s*\(\s*['"]([^'"]+)['"]"#);
pattern!(column_re, r#"\$table->(\w+)\(\s*['"]([^'"]+)['"]([^;]*);"#);
pattern!(default_re, r#"->default\(\s*((?:[^()]|\([^()]*\))*?)\s*\)"#);
pattern!(foreign_re, r#"\$table->foreign\(\s*['"]([^'"]+)['"]\s*\)([^;]*);"#);
pattern!(foreign_id_re, r#"\$table->foreignId\(\s*['"]([^'"]+)['"]\s*\)([^;]*);"#);
pattern!(references_re, r#"->references\(\s*['"]([^'"]+)['"]"#);
pattern!(on_re, r#"->on\(\s*['"]([^'"]+)['"]"#);
pattern!(
    constrained_re,
    r#"->constrained\(\s*['"]([^'"]+)['"](?:\s*,\s*['"]([^'"]+)['"])?"#
);
pattern!(on_delete_re, r#"->onDelete\(\s*['"]([^'"]+)['"]"#);
pattern!(on_update_re, r#"->onUpdate\(\s*['"]([^'"]+)['"]"#);
pattern!(
    shorthand_action_re,
    r"->(cascade|restrict|null|noAction)On(Delete|Update)\(\)"
);
pattern!(
    key_definition_re,
    r#"\$table->(index|unique)\(\s*(\[[^\]]*\]|['"][^'"]+['"])"#
);
pattern!(quoted_re, r#"['"]([^'"]+)['"]"#);
pattern!(route_re, r#"Route::(\w+)\(\s*['"]([^'"]*)['"]([^\n]*)"#);
pattern!(
    chained_verb_re,
    r#"->(get|post|put|patch|delete|resource|apiResource|resources|apiResources)\(\s*['"]([^'"]*)['"]"#
);
pattern!(chained_prefix_re, r#"->prefix\(\s*['"]([^'"]*)['"]"#);
pattern!(route_group_array_re, r"Route::group\(\s*\[([^\]]*)\]");
pattern!(prefix_option_re, r#"['"]prefix['"]\s*=>\s*['"]([^'"]*)['"]"#);
pattern!(controller_re, r"\\?((?:[A-Za-z_][A-Za-z0-9_]*\\)*[A-Za-z0-9_]*Controller)\b");
pattern!(
    middleware_re,
    r#"['"]([\w.:\-]+)['"]\s*=>\s*(?:\\?([\w\\]+)::class|['"]([\w\\]+)['"])"#
);
pattern!(namespace_re, r"(?m)^\s*namespace\s+([\w\\]+)\s*;");
pattern!(extends_re, r"class\s+\w+\s+extends\s+\\?([\w\\]+)");
pattern!(import_re, r"(?m)^use\s+\\?([\w\\]+)(?:\s+as\s+\w+)?\s*;");
pattern!(trait_re, r"(?m)^[ \t]+use\s+([\w\\][\w\\,\s]*?)\s*[;{]");
pattern!(
    method_re,
    r"(?m)^\s*(?:(?:public|protected|private|static|final|abstract)\s+)*function\s+(\w+)\s*\("
);
pattern!(config_key_re, r#"(?m)^ {4}['"]([\w.\-]+)['"]\s*=>"#);

/// Blueprint calls with a leading string argument that do not define a column.
const NON_COLUMN_CALLS: &[&str] = &[
    "foreign",
    "index",
    "unique",
    "primary",
    "spatialIndex",
    "fullText",
    "dropColumn",
    "dropForeign",
    "dropIndex",
    "dropUnique",
    "dropPrimary",
    "dropIfExists",
    "renameColumn",
    "renameIndex",
];

// ---------------------------------------------------------------------------
// Migrations
// ---------------------------------------------------------------------------

/// First `Schema::create` / `Schema::table` statement in a migration.
pub fn table_definition(text: &str) -> Option<(String, TableOperation)> {
    let caps = table_re().captures(text)?;
    let operation = match &caps[1] {
        "create" => TableOperation::Create,
        _ => TableOperation::Modify,
    };
    Some((caps[2].to_string(), operation))
}

/// Full table record for one migration file: name, columns and foreign keys.
pub fn migration_table(text: &str, filename: &str) -> Option<TableInfo> {
    let (name, operation) = table_definition(text)?;
    let columns = columns(text)
        .into_iter()
        .map(|c| (c.name.clone(), c))
        .collect::<BTreeMap<_, _>>();
    Some(TableInfo {
        name,
        operation,
        filename: filename.to_string(),
        columns,
        foreign_keys: foreign_keys(text),
    })
}

/// Column builder calls, in textual order.
pub fn columns(text: &str) -> Vec<ColumnInfo> {
    column_re()
        .captures_iter(text)
        .filter(|caps| !NON_COLUMN_CALLS.contains(&&caps[1]))
        .map(|caps| {
            let modifiers = &caps[3];
            ColumnInfo {
                name: caps[2].to_string(),
                column_type: caps[1].to_string(),
                nullable: modifiers.contains("->nullable("),
                default: default_re()
                    .captures(modifiers)
                    .map(|d| d[1].replace(['\'', '"'], "")),
                unique: modifiers.contains("->unique("),
                index: modifiers.contains("->index("),
            }
        })
        .collect()
}

/// Foreign keys declared with `foreign()->references()->on()` or
/// `foreignId()->constrained('table')`. Statements missing any of column,
/// referenced column or referenced table are skipped.
pub fn foreign_keys(text: &str) -> Vec<ForeignKeyInfo> {
    let mut found: Vec<(usize, ForeignKeyInfo)> = Vec::new();

    for caps in foreign_re().captures_iter(text) {
        let chain = &caps[2];
        let (Some(references), Some(on)) = (references_re().captures(chain), on_re().captures(chain))
        else {
            continue;
        };
        let start = caps.get(0).map_or(0, |m| m.start());
        found.push((
            start,
            ForeignKeyInfo {
                column: caps[1].to_string(),
                references: references[1].to_string(),
                on: on[1].to_string(),
                on_delete: referential_action(chain, "Delete"),
                on_update: referential_action(chain, "Update"),
            },
        ));
    }

    for caps in foreign_id_re().captures_iter(text) {
        let chain = &caps[2];
        let Some(constrained) = constrained_re().captures(chain) else {
            continue;
        };
        let start = caps.get(0).map_or(0, |m| m.start());
        found.push((
            start,
            ForeignKeyInfo {
                column: caps[1].to_string(),
                references: constrained
                    .get(2)
                    .map_or_else(|| "id".to_string(), |m| m.as_str().to_string()),
                on: constrained[1].to_string(),
                on_delete: referential_action(chain, "Delete"),
                on_update: referential_action(chain, "Update"),
            },
        ));
    }

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, fk)| fk).collect()
}

fn referential_action(chain: &str, event: &str) -> Option<ReferentialAction> {
    let explicit = if event == "Delete" {
        on_delete_re()
    } else {
        on_update_re()
    };
    if let Some(caps) = explicit.captures(chain) {
        return caps[1].parse().ok();
    }
    shorthand_action_re()
        .captures_iter(chain)
        .find(|caps| &caps[2] == event)
        .and_then(|caps| match &caps[1] {
            "cascade" => Some(ReferentialAction::Cascade),
            "restrict" => Some(ReferentialAction::Restrict),
            "null" => Some(ReferentialAction::SetNull),
            "noAction" => Some(ReferentialAction::NoAction),
            _ => None,
        })
}

/// Standalone `$table->index(...)` / `$table->unique(...)` definitions.
/// Returns `(is_unique, columns)` pairs in textual order.
pub fn key_definitions(text: &str) -> Vec<(bool, Vec<String>)> {
    key_definition_re()
        .captures_iter(text)
        .map(|caps| {
            let columns = quoted_re()
                .captures_iter(&caps[2])
                .map(|c| c[1].to_string())
                .collect();
            (&caps[1] == "unique", columns)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// Route definitions in textual order. Routes inside a group keep their own
/// path; the group prefix is not applied.
pub fn routes(text: &str) -> Vec<RouteDef> {
    let mut found: Vec<(usize, RouteDef)> = Vec::new();

    for caps in route_re().captures_iter(text) {
        let token = &caps[1];
        let rest = &caps[3];
        let start = caps.get(0).map_or(0, |m| m.start());
        let (method, route_type, path) = resolve_route(token, &caps[2], rest);
        found.push((
            start,
            RouteDef {
                method,
                path,
                controller: controller_re()
                    .captures(rest)
                    .map(|c| c[1].to_string()),
                route_type,
            },
        ));
    }

    for caps in route_group_array_re().captures_iter(text) {
        let start = caps.get(0).map_or(0, |m| m.start());
        found.push((
            start,
            RouteDef {
                method: RouteMethod::Group,
                path: prefix_option_re()
                    .captures(&caps[1])
                    .map(|c| c[1].to_string())
                    .unwrap_or_default(),
                controller: None,
                route_type: RouteType::Group,
            },
        ));
    }

    found.sort_by_key(|(start, _)| *start);
    found.into_iter().map(|(_, route)| route).collect()
}

/// Leading `Route::` calls whose first argument is a URI.
const PATH_TOKENS: &[&str] = &["view", "redirect", "permanentRedirect", "any", "options"];

fn verb(token: &str) -> Option<(RouteMethod, RouteType)> {
    Some(match token {
        "get" => (RouteMethod::Get, RouteType::Single),
        "post" => (RouteMethod::Post, RouteType::Single),
        "put" => (RouteMethod::Put, RouteType::Single),
        "patch" => (RouteMethod::Patch, RouteType::Single),
        "delete" => (RouteMethod::Delete, RouteType::Single),
        "resource" | "apiResource" | "resources" | "apiResources" => {
            (RouteMethod::Resource, RouteType::Resource)
        }
        _ => return None,
    })
}

/// Method, type and path for one `Route::<token>('<first>')<rest>` call.
///
/// Modifier calls (`middleware`, `name`, `controller`, ...) carry no URI:
/// the verb and path come from a chained call such as `->get('/x')`, a
/// trailing `->group(` makes a group prefixed by any chained `->prefix()`,
/// and anything else is recorded with an empty path.
fn resolve_route(token: &str, first: &str, rest: &str) -> (RouteMethod, RouteType, String) {
    if let Some((method, route_type)) = verb(token) {
        return (method, route_type, first.to_string());
    }
    if token == "prefix" || token == "group" {
        return (RouteMethod::Group, RouteType::Group, first.to_string());
    }

    let chain = rest.split("->group(").next().unwrap_or(rest);
    if let Some(caps) = chained_verb_re().captures(chain) {
        if let Some((method, route_type)) = verb(&caps[1]) {
            return (method, route_type, caps[2].to_string());
        }
    }
    if rest.contains("->group(") {
        let prefix = chained_prefix_re()
            .captures(chain)
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        return (RouteMethod::Group, RouteType::Group, prefix);
    }
    if PATH_TOKENS.contains(&token) {
        return (RouteMethod::Unknown, RouteType::Single, first.to_string());
    }
    (RouteMethod::Unknown, RouteType::Single, String::new())
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

/// `'key' => Class::class` (or `'key' => 'Class'`) pairs from a kernel-style map.
pub fn middleware_map(text: &str) -> Vec<MiddlewareEntry> {
    middleware_re()
        .captures_iter(text)
        .filter_map(|caps| {
            let class = caps.get(2).or_else(|| caps.get(3))?;
            Some(MiddlewareEntry {
                key: caps[1].to_string(),
                class: class.as_str().to_string(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Classes
// ---------------------------------------------------------------------------

pub fn namespace(text: &str) -> Option<String> {
    namespace_re().captures(text).map(|c| c[1].to_string())
}

/// The first `extends` target.
pub fn extends(text: &str) -> Option<String> {
    extends_re().captures(text).map(|c| c[1].to_string())
}

/// Top-level `use` imports; only namespaced entries are kept.
pub fn imports(text: &str) -> Vec<String> {
    import_re()
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .filter(|name| name.contains('\\'))
        .collect()
}

/// Indented `use` statements inside a class body; only namespaced entries are kept.
pub fn traits(text: &str) -> Vec<String> {
    trait_re()
        .captures_iter(text)
        .flat_map(|c| {
            c[1].split(',')
                .map(|t| t.trim().trim_start_matches('\\').to_string())
                .collect::<Vec<_>>()
        })
        .filter(|name| name.contains('\\'))
        .collect()
}

pub fn methods(text: &str) -> Vec<String> {
    method_re()
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

pub fn class_facts(text: &str) -> ClassFacts {
    ClassFacts {
        namespace: namespace(text),
        extends: extends(text),
        traits: traits(text),
        uses: imports(text),
        methods: methods(text),
    }
}

// ---------------------------------------------------------------------------
// Config files
// ---------------------------------------------------------------------------

/// Keys of the top-level array returned by a config file.
pub fn config_keys(text: &str) -> Vec<String> {
    config_key_re()
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
