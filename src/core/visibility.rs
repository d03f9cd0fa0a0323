// src/core/visibility.rs

//! # Visibility & Filtering
//!
//! Pure queries that decide which services, columns and links are rendered for the current
//! environment, text query and group filter. Counts are derived here on every call and
//! never stored.

use std::collections::HashSet;

use crate::models::{
    ColumnDefinition, EnvSpecificConfig, OpsMatrixConfig, ServiceDefinition, ServiceLink, ViewMode,
};

/// A link together with the service that owns it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkEntry<'a> {
    pub service: &'a ServiceDefinition,
    pub link: &'a ServiceLink,
}

/// Keeps catalog items whose id appears in `allow`, in catalog order. `None` keeps all.
fn restrict<'a, T>(
    items: &'a [T],
    allow: Option<&Vec<String>>,
    id_of: impl Fn(&T) -> &str,
) -> Vec<&'a T> {
    match allow {
        None => items.iter().collect(),
        Some(ids) => {
            let allowed: HashSet<&str> = ids.iter().map(String::as_str).collect();
            items.iter().filter(|item| allowed.contains(id_of(*item))).collect()
        }
    }
}

/// Services visible in `env`. An absent selection shows everything; an explicit empty
/// selection shows nothing. Unknown ids in the selection are ignored.
pub fn visible_services<'a>(config: &'a OpsMatrixConfig, env: &str) -> Vec<&'a ServiceDefinition> {
    let allow = config
        .env_config(env)
        .and_then(|c| c.visible_services.as_ref());
    restrict(&config.services, allow, |s| s.id.as_str())
}

/// Columns visible in `env`, with the same absent/empty rules as services.
pub fn visible_columns<'a>(config: &'a OpsMatrixConfig, env: &str) -> Vec<&'a ColumnDefinition> {
    let allow = config
        .env_config(env)
        .and_then(|c| c.visible_columns.as_ref());
    restrict(&config.columns, allow, |c| c.id.as_str())
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn normalized_query(query: Option<&str>) -> Option<String> {
    query
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase)
}

/// Applies the free-text query and the group filter (both optional, AND-composed).
pub fn filtered_services<'a>(
    services: &[&'a ServiceDefinition],
    query: Option<&str>,
    group: Option<&str>,
) -> Vec<&'a ServiceDefinition> {
    let query = normalized_query(query);
    services
        .iter()
        .copied()
        .filter(|service| match &query {
            None => true,
            Some(q) => {
                contains_ci(&service.name, q)
                    || contains_ci(&service.id, q)
                    || service
                        .description
                        .as_deref()
                        .is_some_and(|d| contains_ci(d, q))
                    || service.links.iter().any(|l| contains_ci(&l.name, q))
            }
        })
        .filter(|service| match group {
            None => true,
            Some(g) => service.group.as_deref() == Some(g),
        })
        .collect()
}

/// Links categorized under `column_id` for the given services, honoring each link's
/// environment allow-list and the text query.
pub fn links_for_column<'a>(
    services: &[&'a ServiceDefinition],
    column_id: &str,
    env: &str,
    query: Option<&str>,
) -> Vec<LinkEntry<'a>> {
    let query = normalized_query(query);
    let mut entries = Vec::new();
    for &service in services {
        for link in service.links.iter().filter(|l| l.column_id == column_id) {
            if !link.is_visible_in(env) {
                continue;
            }
            if let Some(q) = &query {
                let hit = contains_ci(&service.name, q)
                    || contains_ci(&link.name, q)
                    || contains_ci(&link.url, q);
                if !hit {
                    continue;
                }
            }
            entries.push(LinkEntry { service, link });
        }
    }
    entries
}

/// The view mode saved for `env`, or `default`.
pub fn view_mode_for(config: &OpsMatrixConfig, env: &str, default: ViewMode) -> ViewMode {
    config
        .env_config(env)
        .and_then(|c: &EnvSpecificConfig| c.view_mode)
        .unwrap_or(default)
}

/// One visible column and the links that fall under it.
#[derive(Debug, Clone)]
pub struct ColumnLinks<'a> {
    pub column: &'a ColumnDefinition,
    pub links: Vec<LinkEntry<'a>>,
}

/// Everything the front-end renders for one (env, query, group) combination.
#[derive(Debug, Clone)]
pub struct MatrixView<'a> {
    pub services: Vec<&'a ServiceDefinition>,
    pub columns: Vec<ColumnLinks<'a>>,
}

impl<'a> MatrixView<'a> {
    pub fn build(
        config: &'a OpsMatrixConfig,
        env: &str,
        query: Option<&str>,
        group: Option<&str>,
    ) -> Self {
        let visible = visible_services(config, env);
        let services = filtered_services(&visible, query, group);
        let columns = visible_columns(config, env)
            .into_iter()
            .map(|column| ColumnLinks {
                column,
                links: links_for_column(&services, &column.id, env, query),
            })
            .collect();
        Self { services, columns }
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    pub fn column_link_count(&self, column_id: &str) -> usize {
        self.columns
            .iter()
            .find(|c| c.column.id == column_id)
            .map_or(0, |c| c.links.len())
    }

    pub fn total_links(&self) -> usize {
        self.columns.iter().map(|c| c.links.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(id: &str, column: &str, name: &str, url: &str, envs: &[&str]) -> ServiceLink {
        ServiceLink {
            id: id.into(),
            column_id: column.into(),
            name: name.into(),
            url: url.into(),
            environments: envs.iter().map(|e| e.to_string()).collect(),
        }
    }

    fn sample_config() -> OpsMatrixConfig {
        let mut api = ServiceDefinition::new("api", "Public API");
        api.group = Some("backend".into());
        api.description = Some("Customer facing gateway".into());
        api.links = vec![
            link("kibana", "logs", "Kibana", "https://kibana/api", &[]),
            link("stg-logs", "logs", "Staging Logs", "https://logs.staging/api", &["staging"]),
            link("grafana", "monitoring", "Grafana", "https://grafana/api", &[]),
        ];

        let mut web = ServiceDefinition::new("web", "Web Frontend");
        web.group = Some("frontend".into());
        web.links = vec![link("sentry", "logs", "Sentry", "https://sentry/web", &[])];

        let billing = ServiceDefinition::new("billing", "Billing");

        OpsMatrixConfig {
            environments: vec!["prod".into(), "staging".into()],
            columns: vec![
                ColumnDefinition::new("logs", "Logs"),
                ColumnDefinition::new("monitoring", "Monitoring"),
            ],
            services: vec![api, web, billing],
            ..Default::default()
        }
    }

    fn ids(services: &[&ServiceDefinition]) -> Vec<String> {
        services.iter().map(|s| s.id.clone()).collect()
    }

    #[test]
    fn test_visibility_default_is_everything() {
        let config = sample_config();
        assert_eq!(ids(&visible_services(&config, "prod")), vec!["api", "web", "billing"]);
    }

    #[test]
    fn test_visibility_explicit_empty_is_nothing() {
        let mut config = sample_config();
        config.env_configs.insert(
            "prod".into(),
            EnvSpecificConfig {
                visible_services: Some(vec![]),
                ..Default::default()
            },
        );
        assert!(visible_services(&config, "prod").is_empty());
        // Other environments are unaffected.
        assert_eq!(visible_services(&config, "staging").len(), 3);
    }

    #[test]
    fn test_visibility_keeps_catalog_order_and_drops_dangling() {
        let mut config = sample_config();
        config.env_configs.insert(
            "prod".into(),
            EnvSpecificConfig {
                visible_services: Some(vec!["billing".into(), "ghost".into(), "api".into()]),
                visible_columns: Some(vec!["monitoring".into()]),
                view_mode: None,
            },
        );
        assert_eq!(ids(&visible_services(&config, "prod")), vec!["api", "billing"]);
        let columns: Vec<&str> = visible_columns(&config, "prod")
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(columns, vec!["monitoring"]);
    }

    #[test]
    fn test_filter_by_query_and_group() {
        let config = sample_config();
        let all = visible_services(&config, "prod");

        assert_eq!(ids(&filtered_services(&all, Some("GATEWAY"), None)), vec!["api"]);
        assert_eq!(ids(&filtered_services(&all, Some("sentry"), None)), vec!["web"]);
        assert_eq!(ids(&filtered_services(&all, Some("  "), None)).len(), 3);
        assert_eq!(ids(&filtered_services(&all, None, Some("frontend"))), vec!["web"]);
        assert!(filtered_services(&all, Some("gateway"), Some("frontend")).is_empty());
    }

    #[test]
    fn test_link_environment_filter() {
        let config = sample_config();
        let all = visible_services(&config, "prod");

        let prod: Vec<&str> = links_for_column(&all, "logs", "prod", None)
            .iter()
            .map(|e| e.link.id.as_str())
            .collect();
        assert_eq!(prod, vec!["kibana", "sentry"]);

        let staging: Vec<&str> = links_for_column(&all, "logs", "staging", None)
            .iter()
            .map(|e| e.link.id.as_str())
            .collect();
        assert_eq!(staging, vec!["kibana", "stg-logs", "sentry"]);
    }

    #[test]
    fn test_link_query_matches_service_or_link() {
        let config = sample_config();
        let all = visible_services(&config, "prod");

        let by_service = links_for_column(&all, "logs", "prod", Some("public"));
        assert_eq!(by_service.len(), 1);
        assert_eq!(by_service[0].link.id, "kibana");

        let by_url = links_for_column(&all, "logs", "prod", Some("sentry/web"));
        assert_eq!(by_url.len(), 1);
        assert_eq!(by_url[0].service.id, "web");
    }

    #[test]
    fn test_matrix_view_counts() {
        let config = sample_config();
        let view = MatrixView::build(&config, "prod", None, None);
        assert_eq!(view.service_count(), 3);
        assert_eq!(view.column_link_count("logs"), 2);
        assert_eq!(view.column_link_count("monitoring"), 1);
        assert_eq!(view.column_link_count("missing"), 0);
        assert_eq!(view.total_links(), 3);

        let filtered = MatrixView::build(&config, "staging", None, Some("backend"));
        assert_eq!(filtered.service_count(), 1);
        assert_eq!(filtered.total_links(), 3);
    }

    #[test]
    fn test_view_mode_fallback() {
        let mut config = sample_config();
        assert_eq!(view_mode_for(&config, "prod", ViewMode::Grid), ViewMode::Grid);
        config.env_configs.insert(
            "prod".into(),
            EnvSpecificConfig {
                view_mode: Some(ViewMode::Table),
                ..Default::default()
            },
        );
        assert_eq!(view_mode_for(&config, "prod", ViewMode::Grid), ViewMode::Table);
    }
}
