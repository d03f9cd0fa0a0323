// src/core/url_resolver.rs

//! # URL Resolver
//!
//! Turns a (service, column, environment) triple into the URL to open.
//!
//! ## Precedence
//!
//! 1. `service.overrides[column.id]`, still run through substitution.
//! 2. `column.template`.
//! 3. Nothing: `None` is a normal outcome and callers render a neutral placeholder.
//!
//! ## Variables
//!
//! The substitution table is layered: global variables, then the built-ins
//! (`service_id`, `service_name`, `env`), then `service.variables`. Later layers win, so a
//! service may shadow a built-in. Placeholders without a table entry are left verbatim.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::{BTreeMap, HashMap};

use crate::models::{ColumnDefinition, ColumnType, ServiceDefinition, ServiceLink};

lazy_static! {
    static ref PLACEHOLDER_RE: Regex = Regex::new(r"\{\{([^{}]+)\}\}").unwrap();
}

pub const VAR_SERVICE_ID: &str = "service_id";
pub const VAR_SERVICE_NAME: &str = "service_name";
pub const VAR_ENV: &str = "env";

/// How explicit `service.links[].url` values are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkUrlMode {
    /// The stored URL is already final.
    #[default]
    Literal,
    /// The stored URL goes through the same substitution as column templates.
    Substituted,
}

/// What a single matrix cell shows for a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Url(String),
    Text(String),
    Status(String),
    Empty,
}

/// Builds the substitution table for one resolution.
pub fn variable_table(
    service: &ServiceDefinition,
    environment: &str,
    global_vars: &BTreeMap<String, String>,
) -> HashMap<String, String> {
    let mut table: HashMap<String, String> = global_vars
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    table.insert(VAR_SERVICE_ID.to_string(), service.id.clone());
    table.insert(VAR_SERVICE_NAME.to_string(), service.name.clone());
    table.insert(VAR_ENV.to_string(), environment.to_string());

    // Service variables are applied last and may shadow the built-ins.
    for (key, value) in &service.variables {
        table.insert(key.clone(), value.clone());
    }
    table
}

/// Replaces every `{{key}}` that has a table entry. Single pass: substituted values are
/// not scanned again.
pub fn substitute(template: &str, vars: &HashMap<String, String>) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures<'_>| {
            let key = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            match vars.get(key) {
                Some(value) => value.clone(),
                None => caps.get(0).map(|m| m.as_str()).unwrap_or_default().to_string(),
            }
        })
        .into_owned()
}

/// Returns the template source for a (service, column) pair, honoring overrides.
pub fn template_source<'a>(
    service: &'a ServiceDefinition,
    column: &'a ColumnDefinition,
) -> Option<&'a str> {
    service
        .overrides
        .get(&column.id)
        .map(String::as_str)
        .or(column.template.as_deref())
}

/// Resolves the URL for a service under a column in the given environment.
pub fn resolve(
    service: &ServiceDefinition,
    column: &ColumnDefinition,
    environment: &str,
    global_vars: &BTreeMap<String, String>,
) -> Option<String> {
    let template = template_source(service, column)?;
    let vars = variable_table(service, environment, global_vars);
    let resolved = substitute(template, &vars);
    log::trace!(
        "Resolved '{}' x '{}' @ '{}' -> {}",
        service.id,
        column.id,
        environment,
        resolved
    );
    Some(resolved)
}

/// Renders an explicit link's URL according to `mode`.
pub fn resolve_link(
    service: &ServiceDefinition,
    link: &ServiceLink,
    environment: &str,
    global_vars: &BTreeMap<String, String>,
    mode: LinkUrlMode,
) -> String {
    match mode {
        LinkUrlMode::Literal => link.url.clone(),
        LinkUrlMode::Substituted => {
            substitute(&link.url, &variable_table(service, environment, global_vars))
        }
    }
}

/// Resolves what a cell displays, depending on the column type.
pub fn resolve_cell(
    service: &ServiceDefinition,
    column: &ColumnDefinition,
    environment: &str,
    global_vars: &BTreeMap<String, String>,
) -> CellValue {
    match column.kind {
        ColumnType::Link => resolve(service, column, environment, global_vars)
            .map(CellValue::Url)
            .unwrap_or(CellValue::Empty),
        ColumnType::Text => resolve(service, column, environment, global_vars)
            .map(CellValue::Text)
            .unwrap_or(CellValue::Empty),
        ColumnType::Status => {
            if service.maintenance_mode == Some(true) {
                CellValue::Status("maintenance".to_string())
            } else {
                service
                    .status
                    .clone()
                    .map(CellValue::Status)
                    .unwrap_or(CellValue::Empty)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_globals() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    fn column_with_template(template: Option<&str>) -> ColumnDefinition {
        ColumnDefinition {
            template: template.map(str::to_string),
            ..ColumnDefinition::new("logs", "Logs")
        }
    }

    #[test]
    fn test_override_beats_template() {
        let mut service = ServiceDefinition::new("svc1", "Service One");
        service
            .overrides
            .insert("logs".into(), "https://custom/{{env}}".into());
        let column = column_with_template(Some("https://grafana/{{service_id}}"));

        let url = resolve(&service, &column, "prod", &no_globals());
        assert_eq!(url.as_deref(), Some("https://custom/prod"));
    }

    #[test]
    fn test_full_substitution() {
        let mut service = ServiceDefinition::new("svc1", "Service One");
        service.variables.insert("custom".into(), "v1".into());
        let column = column_with_template(Some("https://x/{{service_id}}/{{env}}/{{custom}}"));

        assert_eq!(
            resolve(&service, &column, "prod", &no_globals()).as_deref(),
            Some("https://x/svc1/prod/v1")
        );
    }

    #[test]
    fn test_unmatched_placeholder_is_kept() {
        let service = ServiceDefinition::new("svc1", "Service One");
        let column = column_with_template(Some("{{unknown}}"));
        assert_eq!(
            resolve(&service, &column, "prod", &no_globals()).as_deref(),
            Some("{{unknown}}")
        );
    }

    #[test]
    fn test_no_template_and_no_override_is_none() {
        let service = ServiceDefinition::new("svc1", "Service One");
        let column = column_with_template(None);
        assert_eq!(resolve(&service, &column, "prod", &no_globals()), None);
    }

    #[test]
    fn test_layering_globals_builtins_service_vars() {
        let mut globals = BTreeMap::new();
        globals.insert("domain".to_string(), "example.com".to_string());
        globals.insert("env".to_string(), "ignored".to_string());

        let mut service = ServiceDefinition::new("svc1", "Service One");
        let column = column_with_template(Some("https://{{env}}.{{domain}}/{{service_name}}"));
        assert_eq!(
            resolve(&service, &column, "prod", &globals).as_deref(),
            Some("https://prod.example.com/Service One")
        );

        // Service variables are applied last, even over built-ins.
        service.variables.insert("env".into(), "production".into());
        assert_eq!(
            resolve(&service, &column, "prod", &globals).as_deref(),
            Some("https://production.example.com/Service One")
        );
    }

    #[test]
    fn test_substitution_is_single_pass() {
        let mut service = ServiceDefinition::new("svc1", "Service One");
        service.variables.insert("a".into(), "{{service_id}}".into());
        let column = column_with_template(Some("{{a}}"));
        assert_eq!(
            resolve(&service, &column, "prod", &no_globals()).as_deref(),
            Some("{{service_id}}")
        );
    }

    #[test]
    fn test_link_url_modes() {
        let service = ServiceDefinition::new("svc1", "Service One");
        let link = ServiceLink {
            id: "l1".into(),
            column_id: "logs".into(),
            name: "Logs".into(),
            url: "https://logs/{{env}}".into(),
            environments: vec![],
        };
        assert_eq!(
            resolve_link(&service, &link, "prod", &no_globals(), LinkUrlMode::Literal),
            "https://logs/{{env}}"
        );
        assert_eq!(
            resolve_link(&service, &link, "prod", &no_globals(), LinkUrlMode::Substituted),
            "https://logs/prod"
        );
    }

    #[test]
    fn test_status_cell() {
        let mut service = ServiceDefinition::new("svc1", "Service One");
        let column = ColumnDefinition {
            kind: ColumnType::Status,
            ..ColumnDefinition::new("status", "Status")
        };
        assert_eq!(
            resolve_cell(&service, &column, "prod", &no_globals()),
            CellValue::Empty
        );
        service.status = Some("healthy".into());
        assert_eq!(
            resolve_cell(&service, &column, "prod", &no_globals()),
            CellValue::Status("healthy".into())
        );
        service.maintenance_mode = Some(true);
        assert_eq!(
            resolve_cell(&service, &column, "prod", &no_globals()),
            CellValue::Status("maintenance".into())
        );
    }
}
