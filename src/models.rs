// src/models.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::DEFAULT_TITLE;

// --- DOCUMENT MODELS ---
// These structures are the persisted/exported configuration document. Field names on the
// wire are camelCase, and every optional collection defaults to empty so that partial
// documents import cleanly.

/// A deployment target such as `prod` or `lab-01`. Any string is valid.
pub type Environment = String;

/// What a column cell renders.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[default]
    Link,
    Text,
    Status,
}

/// A named category of link (e.g. "Logs") with an optional template applied to every service.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub id: String,
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl ColumnDefinition {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind: ColumnType::Link,
            template: None,
            icon: None,
        }
    }
}

/// An explicit link owned by a service.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLink {
    pub id: String,
    pub column_id: String,
    pub name: String,
    pub url: String,
    /// Allow-list of environments. Empty means every environment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environments: Vec<Environment>,
}

impl ServiceLink {
    /// Returns `true` when the link may be shown while `env` is selected.
    pub fn is_visible_in(&self, env: &str) -> bool {
        self.environments.is_empty() || self.environments.iter().any(|e| e == env)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDefinition {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<ServiceLink>,
    /// Literal URL (or template) per column id, bypassing the column's template.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_mode: Option<bool>,
    /// Deployed version per environment.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub versions: BTreeMap<Environment, String>,
}

impl ServiceDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn link(&self, link_id: &str) -> Option<&ServiceLink> {
        self.links.iter().find(|l| l.id == link_id)
    }
}

/// A named bucket of environments, by glob `pattern` or by explicit membership.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct EnvGroup {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default)]
    pub environments: Vec<Environment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    Table,
    List,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Grid => "grid",
            ViewMode::Table => "table",
            ViewMode::List => "list",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grid" => Ok(ViewMode::Grid),
            "table" => Ok(ViewMode::Table),
            "list" => Ok(ViewMode::List),
            other => Err(format!("unknown view mode '{}'", other)),
        }
    }
}

/// Per-environment visibility and presentation settings.
///
/// `None` and `Some(vec![])` mean different things: absent selects everything, an explicit
/// empty list selects nothing.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnvSpecificConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_services: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_mode: Option<ViewMode>,
}

impl EnvSpecificConfig {
    pub fn is_empty(&self) -> bool {
        self.visible_services.is_none()
            && self.visible_columns.is_none()
            && self.view_mode.is_none()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecentLink {
    pub service_id: String,
    pub column_id: String,
    /// Unix epoch, milliseconds.
    pub timestamp: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementLevel {
    #[default]
    Info,
    Warning,
    Critical,
}

impl std::str::FromStr for AnnouncementLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "info" => Ok(AnnouncementLevel::Info),
            "warning" | "warn" => Ok(AnnouncementLevel::Warning),
            "critical" => Ok(AnnouncementLevel::Critical),
            other => Err(format!("unknown announcement level '{}'", other)),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub message: String,
    #[serde(default)]
    pub level: AnnouncementLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// The root aggregate. This is exactly what gets loaded, saved, imported and exported.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct OpsMatrixConfig {
    pub title: String,
    pub environments: Vec<Environment>,
    pub columns: Vec<ColumnDefinition>,
    pub services: Vec<ServiceDefinition>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env_groups: Vec<EnvGroup>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub favorite_envs: Vec<Environment>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub favorite_services: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recent_services: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recent_links: Vec<RecentLink>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env_configs: BTreeMap<Environment, EnvSpecificConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub announcement: Option<Announcement>,
}

impl Default for OpsMatrixConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            environments: Vec::new(),
            columns: Vec::new(),
            services: Vec::new(),
            env_groups: Vec::new(),
            favorite_envs: Vec::new(),
            favorite_services: Vec::new(),
            recent_services: Vec::new(),
            recent_links: Vec::new(),
            env_configs: BTreeMap::new(),
            announcement: None,
        }
    }
}

impl OpsMatrixConfig {
    pub fn service(&self, id: &str) -> Option<&ServiceDefinition> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn column(&self, id: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn env_group(&self, id: &str) -> Option<&EnvGroup> {
        self.env_groups.iter().find(|g| g.id == id)
    }

    pub fn has_environment(&self, env: &str) -> bool {
        self.environments.iter().any(|e| e == env)
    }

    pub fn env_config(&self, env: &str) -> Option<&EnvSpecificConfig> {
        self.env_configs.get(env)
    }
}

// --- LOCAL SESSION MODELS ---
// Client-side state that is not part of the shared document. Written to the binary
// session cache between invocations.

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub current_env: Option<Environment>,
    #[serde(default)]
    pub recent_envs: Vec<Environment>,
    pub view_mode: Option<ViewMode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_defaults() {
        let config: OpsMatrixConfig = serde_json::from_str(r#"{"environments":["prod"]}"#).unwrap();
        assert_eq!(config.title, DEFAULT_TITLE);
        assert_eq!(config.environments, vec!["prod".to_string()]);
        assert!(config.services.is_empty());
        assert!(config.env_configs.is_empty());
    }

    #[test]
    fn test_column_type_defaults_to_link() {
        let column: ColumnDefinition =
            serde_json::from_str(r#"{"id":"logs","title":"Logs"}"#).unwrap();
        assert_eq!(column.kind, ColumnType::Link);

        let column: ColumnDefinition =
            serde_json::from_str(r#"{"id":"st","title":"Status","type":"status"}"#).unwrap();
        assert_eq!(column.kind, ColumnType::Status);
    }

    #[test]
    fn test_visibility_absent_and_empty_are_distinct_on_the_wire() {
        let absent: EnvSpecificConfig = serde_json::from_str("{}").unwrap();
        let empty: EnvSpecificConfig = serde_json::from_str(r#"{"visibleServices":[]}"#).unwrap();
        assert_eq!(absent.visible_services, None);
        assert_eq!(empty.visible_services, Some(vec![]));

        let json = serde_json::to_string(&empty).unwrap();
        assert_eq!(json, r#"{"visibleServices":[]}"#);
        assert_eq!(serde_json::to_string(&absent).unwrap(), "{}");
    }

    #[test]
    fn test_link_visibility_allow_list() {
        let mut link = ServiceLink {
            id: "l1".into(),
            column_id: "logs".into(),
            name: "Kibana".into(),
            url: "https://kibana".into(),
            environments: vec![],
        };
        assert!(link.is_visible_in("prod"));
        link.environments = vec!["staging".into()];
        assert!(!link.is_visible_in("prod"));
        assert!(link.is_visible_in("staging"));
    }

    #[test]
    fn test_view_mode_parsing() {
        assert_eq!("Table".parse::<ViewMode>(), Ok(ViewMode::Table));
        assert!("cards".parse::<ViewMode>().is_err());
    }
}
