// src/core/integrity.rs

//! Reports dangling references in a config document. Dangling references are tolerated
//! everywhere else (they are simply filtered out of the views), so nothing here is an
//! error: the result is a list of findings for the operator.

use std::collections::HashSet;
use std::fmt;

use crate::models::OpsMatrixConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    LinkColumnMissing { service_id: String, link_id: String, column_id: String },
    LinkEnvironmentMissing { service_id: String, link_id: String, environment: String },
    OverrideColumnMissing { service_id: String, column_id: String },
    VisibleServiceMissing { environment: String, service_id: String },
    VisibleColumnMissing { environment: String, column_id: String },
    EnvConfigForUnknownEnvironment { environment: String },
    GroupEnvironmentMissing { group_id: String, environment: String },
    FavoriteEnvironmentMissing { environment: String },
    FavoriteServiceMissing { service_id: String },
    DuplicateServiceId { service_id: String },
    DuplicateColumnId { column_id: String },
    DuplicateEnvironment { environment: String },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::LinkColumnMissing { service_id, link_id, column_id } => write!(
                f,
                "service '{}': link '{}' points to unknown column '{}'",
                service_id, link_id, column_id
            ),
            Finding::LinkEnvironmentMissing { service_id, link_id, environment } => write!(
                f,
                "service '{}': link '{}' is restricted to unknown environment '{}'",
                service_id, link_id, environment
            ),
            Finding::OverrideColumnMissing { service_id, column_id } => write!(
                f,
                "service '{}': override for unknown column '{}'",
                service_id, column_id
            ),
            Finding::VisibleServiceMissing { environment, service_id } => write!(
                f,
                "env '{}': visible services list unknown service '{}'",
                environment, service_id
            ),
            Finding::VisibleColumnMissing { environment, column_id } => write!(
                f,
                "env '{}': visible columns list unknown column '{}'",
                environment, column_id
            ),
            Finding::EnvConfigForUnknownEnvironment { environment } => {
                write!(f, "settings exist for unknown environment '{}'", environment)
            }
            Finding::GroupEnvironmentMissing { group_id, environment } => write!(
                f,
                "group '{}': member '{}' is not a known environment",
                group_id, environment
            ),
            Finding::FavoriteEnvironmentMissing { environment } => {
                write!(f, "favorite environment '{}' no longer exists", environment)
            }
            Finding::FavoriteServiceMissing { service_id } => {
                write!(f, "favorite service '{}' no longer exists", service_id)
            }
            Finding::DuplicateServiceId { service_id } => {
                write!(f, "service id '{}' is defined more than once", service_id)
            }
            Finding::DuplicateColumnId { column_id } => {
                write!(f, "column id '{}' is defined more than once", column_id)
            }
            Finding::DuplicateEnvironment { environment } => {
                write!(f, "environment '{}' is listed more than once", environment)
            }
        }
    }
}

fn duplicates<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    ids.filter(|id| !seen.insert(*id) && reported.insert(*id))
        .map(str::to_string)
        .collect()
}

/// Collects every dangling or duplicated reference in `config`.
pub fn check_references(config: &OpsMatrixConfig) -> Vec<Finding> {
    let envs: HashSet<&str> = config.environments.iter().map(String::as_str).collect();
    let columns: HashSet<&str> = config.columns.iter().map(|c| c.id.as_str()).collect();
    let services: HashSet<&str> = config.services.iter().map(|s| s.id.as_str()).collect();
    let mut findings = Vec::new();

    for environment in duplicates(config.environments.iter().map(String::as_str)) {
        findings.push(Finding::DuplicateEnvironment { environment });
    }
    for column_id in duplicates(config.columns.iter().map(|c| c.id.as_str())) {
        findings.push(Finding::DuplicateColumnId { column_id });
    }
    for service_id in duplicates(config.services.iter().map(|s| s.id.as_str())) {
        findings.push(Finding::DuplicateServiceId { service_id });
    }

    for service in &config.services {
        for link in &service.links {
            if !columns.contains(link.column_id.as_str()) {
                findings.push(Finding::LinkColumnMissing {
                    service_id: service.id.clone(),
                    link_id: link.id.clone(),
                    column_id: link.column_id.clone(),
                });
            }
            for environment in link.environments.iter().filter(|e| !envs.contains(e.as_str())) {
                findings.push(Finding::LinkEnvironmentMissing {
                    service_id: service.id.clone(),
                    link_id: link.id.clone(),
                    environment: environment.clone(),
                });
            }
        }
        for column_id in service.overrides.keys().filter(|c| !columns.contains(c.as_str())) {
            findings.push(Finding::OverrideColumnMissing {
                service_id: service.id.clone(),
                column_id: column_id.clone(),
            });
        }
    }

    for (environment, env_config) in &config.env_configs {
        if !envs.contains(environment.as_str()) {
            findings.push(Finding::EnvConfigForUnknownEnvironment {
                environment: environment.clone(),
            });
        }
        for service_id in env_config.visible_services.iter().flatten() {
            if !services.contains(service_id.as_str()) {
                findings.push(Finding::VisibleServiceMissing {
                    environment: environment.clone(),
                    service_id: service_id.clone(),
                });
            }
        }
        for column_id in env_config.visible_columns.iter().flatten() {
            if !columns.contains(column_id.as_str()) {
                findings.push(Finding::VisibleColumnMissing {
                    environment: environment.clone(),
                    column_id: column_id.clone(),
                });
            }
        }
    }

    for group in config.env_groups.iter().filter(|g| g.pattern.is_none()) {
        for environment in group.environments.iter().filter(|e| !envs.contains(e.as_str())) {
            findings.push(Finding::GroupEnvironmentMissing {
                group_id: group.id.clone(),
                environment: environment.clone(),
            });
        }
    }

    for environment in config.favorite_envs.iter().filter(|e| !envs.contains(e.as_str())) {
        findings.push(Finding::FavoriteEnvironmentMissing {
            environment: environment.clone(),
        });
    }
    for service_id in config.favorite_services.iter().filter(|s| !services.contains(s.as_str())) {
        findings.push(Finding::FavoriteServiceMissing {
            service_id: service_id.clone(),
        });
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::*;

    #[test]
    fn test_clean_config_has_no_findings() {
        let config = OpsMatrixConfig {
            environments: vec!["prod".into()],
            columns: vec![ColumnDefinition::new("logs", "Logs")],
            services: vec![ServiceDefinition::new("api", "API")],
            ..Default::default()
        };
        assert!(check_references(&config).is_empty());
    }

    #[test]
    fn test_dangling_references_are_reported() {
        let mut api = ServiceDefinition::new("api", "API");
        api.links.push(ServiceLink {
            id: "l1".into(),
            column_id: "ghost-col".into(),
            name: "Ghost".into(),
            url: "https://ghost".into(),
            environments: vec!["nowhere".into()],
        });
        api.overrides.insert("ghost-col".into(), "https://x".into());

        let mut config = OpsMatrixConfig {
            environments: vec!["prod".into(), "prod".into()],
            services: vec![api],
            favorite_services: vec!["gone".into()],
            ..Default::default()
        };
        config.env_configs.insert(
            "prod".into(),
            EnvSpecificConfig {
                visible_services: Some(vec!["missing".into()]),
                ..Default::default()
            },
        );

        let findings = check_references(&config);
        assert!(findings.contains(&Finding::DuplicateEnvironment {
            environment: "prod".into()
        }));
        assert!(findings.contains(&Finding::LinkColumnMissing {
            service_id: "api".into(),
            link_id: "l1".into(),
            column_id: "ghost-col".into(),
        }));
        assert!(findings.contains(&Finding::LinkEnvironmentMissing {
            service_id: "api".into(),
            link_id: "l1".into(),
            environment: "nowhere".into(),
        }));
        assert!(findings.contains(&Finding::VisibleServiceMissing {
            environment: "prod".into(),
            service_id: "missing".into(),
        }));
        assert!(findings.contains(&Finding::FavoriteServiceMissing {
            service_id: "gone".into()
        }));
        assert_eq!(findings.len(), 6);
    }
}
