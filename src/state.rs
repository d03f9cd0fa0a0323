// src/state.rs

//! # Configuration Store
//!
//! `ConfigStore` is the single owner of the in-memory config snapshot plus the client
//! state around it: the selected environment, its MRU list, the active view mode and the
//! loading/error flags.
//!
//! Every mutator follows the same path: clone the current snapshot, apply the change,
//! swap in the new `Arc` and hand it to the [`Persister`]. The caller never waits on I/O.
//! The store is created by the binary's composition root and lent to handlers by `&mut`.

use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::constants::{DEFAULT_DEBOUNCE, MAX_RECENT_ENVS, MAX_RECENT_LINKS, MAX_RECENT_SERVICES};
use crate::core::document::{self, DocumentError, DocumentFormat};
use crate::core::persister::{ChangeScope, PersistStatus, Persister};
use crate::core::visibility;
use crate::models::{
    Announcement, ColumnDefinition, EnvGroup, EnvSpecificConfig, Environment, OpsMatrixConfig,
    RecentLink, ServiceDefinition, ServiceLink, SessionState, ViewMode,
};
use crate::system::config_service::{ConfigService, ServiceError};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },
    #[error("{kind} '{id}' already exists")]
    Duplicate { kind: &'static str, id: String },
    #[error("Unknown environment '{0}'")]
    UnknownEnvironment(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Could not parse config document: {0}")]
    Parse(#[from] DocumentError),
}

fn not_found(kind: &'static str, id: &str) -> StoreError {
    StoreError::NotFound {
        kind,
        id: id.to_string(),
    }
}

fn duplicate(kind: &'static str, id: &str) -> StoreError {
    StoreError::Duplicate {
        kind,
        id: id.to_string(),
    }
}

fn require_id(kind: &str, id: &str) -> Result<(), StoreError> {
    if id.trim().is_empty() {
        return Err(StoreError::InvalidInput(format!("{} id cannot be empty", kind)));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    pub debounce: std::time::Duration,
    pub default_view_mode: ViewMode,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            default_view_mode: ViewMode::default(),
        }
    }
}

pub struct ConfigStore {
    config: Arc<OpsMatrixConfig>,
    current_env: Environment,
    recent_envs: Vec<Environment>,
    view_mode: ViewMode,
    default_view_mode: ViewMode,
    is_loading: bool,
    error: Option<String>,
    service: Arc<dyn ConfigService>,
    persister: Persister,
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("service", &self.service.describe())
            .field("current_env", &self.current_env)
            .field("view_mode", &self.view_mode)
            .field("is_loading", &self.is_loading)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl ConfigStore {
    /// Creates a store holding the default document. Must be called inside a tokio runtime,
    /// since it spawns the persistence task.
    pub fn new(service: Arc<dyn ConfigService>, options: StoreOptions) -> Self {
        let persister = Persister::spawn(Arc::clone(&service), options.debounce);
        Self {
            config: Arc::new(OpsMatrixConfig::default()),
            current_env: Environment::new(),
            recent_envs: Vec::new(),
            view_mode: options.default_view_mode,
            default_view_mode: options.default_view_mode,
            is_loading: true,
            error: None,
            service,
            persister,
        }
    }

    /// Fetches the document from the config service. On failure the error is recorded,
    /// the default document stays in place and the error is returned. Nothing is persisted.
    pub async fn load(&mut self) -> Result<(), ServiceError> {
        log::debug!("Loading config document from {}", self.service.describe());
        let result = self.service.fetch_config().await;
        self.is_loading = false;
        match result {
            Ok(config) => {
                self.config = Arc::new(config);
                self.error = None;
                self.rederive_client_state();
                log::info!(
                    "Loaded {} services, {} columns, {} environments.",
                    self.config.services.len(),
                    self.config.columns.len(),
                    self.config.environments.len()
                );
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load config: {}", e);
                self.error = Some(e.to_string());
                self.config = Arc::new(OpsMatrixConfig::default());
                self.rederive_client_state();
                Err(e)
            }
        }
    }

    /// Applies the cached client state from a previous run. Environments that no longer
    /// exist are ignored.
    pub fn restore_session(&mut self, session: SessionState) {
        if let Some(env) = session.current_env {
            if self.config.has_environment(&env) {
                self.current_env = env;
            }
        }
        let config = &self.config;
        self.recent_envs = session
            .recent_envs
            .into_iter()
            .filter(|e| config.has_environment(e))
            .take(MAX_RECENT_ENVS)
            .collect();
        self.view_mode = session.view_mode.unwrap_or_else(|| {
            visibility::view_mode_for(&self.config, &self.current_env, self.default_view_mode)
        });
    }

    pub fn session(&self) -> SessionState {
        SessionState {
            current_env: if self.current_env.is_empty() {
                None
            } else {
                Some(self.current_env.clone())
            },
            recent_envs: self.recent_envs.clone(),
            view_mode: Some(self.view_mode),
        }
    }

    // --- Accessors ---

    pub fn config(&self) -> &OpsMatrixConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Arc<OpsMatrixConfig> {
        Arc::clone(&self.config)
    }

    pub fn current_env(&self) -> &str {
        &self.current_env
    }

    pub fn recent_envs(&self) -> &[Environment] {
        &self.recent_envs
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn default_view_mode(&self) -> ViewMode {
        self.default_view_mode
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// The most relevant error: a load/import failure first, then the last save failure.
    pub fn error(&self) -> Option<String> {
        self.error
            .clone()
            .or_else(|| self.persister.status().last_error)
    }

    pub fn persist_status(&self) -> PersistStatus {
        self.persister.status()
    }

    pub fn service_description(&self) -> String {
        self.service.describe()
    }

    pub async fn health(&self) -> bool {
        self.service.health_check().await
    }

    /// Saves any pending snapshot immediately.
    pub async fn flush(&self) {
        self.persister.flush().await;
    }

    // --- Internals ---

    fn commit<T>(
        &mut self,
        scope: ChangeScope,
        mutate: impl FnOnce(&mut OpsMatrixConfig) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut next = (*self.config).clone();
        let out = mutate(&mut next)?;
        self.config = Arc::new(next);
        self.persister.schedule(Arc::clone(&self.config), scope);
        Ok(out)
    }

    /// Keeps the current env when still valid, else falls back to the first environment.
    fn rederive_client_state(&mut self) {
        let config = Arc::clone(&self.config);
        if !config.has_environment(&self.current_env) {
            self.current_env = config.environments.first().cloned().unwrap_or_default();
        }
        self.recent_envs.retain(|e| config.has_environment(e));
        self.view_mode =
            visibility::view_mode_for(&config, &self.current_env, self.default_view_mode);
    }

    fn require_environment(&self, env: &str) -> Result<(), StoreError> {
        if self.config.has_environment(env) {
            Ok(())
        } else {
            Err(StoreError::UnknownEnvironment(env.to_string()))
        }
    }

    // --- Environments ---

    pub fn add_environment(&mut self, env: &str) -> Result<(), StoreError> {
        let env = env.trim();
        require_id("environment", env)?;
        if self.config.has_environment(env) {
            return Err(duplicate("environment", env));
        }
        self.commit(ChangeScope::Document, |c| {
            c.environments.push(env.to_string());
            Ok(())
        })?;
        if self.current_env.is_empty() {
            self.current_env = env.to_string();
        }
        Ok(())
    }

    pub fn remove_environment(&mut self, env: &str) -> Result<(), StoreError> {
        if !self.config.has_environment(env) {
            return Err(not_found("environment", env));
        }
        self.commit(ChangeScope::Document, |c| {
            c.environments.retain(|e| e != env);
            c.env_configs.remove(env);
            c.favorite_envs.retain(|e| e != env);
            Ok(())
        })?;
        self.recent_envs.retain(|e| e != env);
        self.rederive_client_state();
        Ok(())
    }

    /// Renames an environment everywhere it is referenced.
    pub fn rename_environment(&mut self, old: &str, new: &str) -> Result<(), StoreError> {
        let new = new.trim();
        require_id("environment", new)?;
        if !self.config.has_environment(old) {
            return Err(not_found("environment", old));
        }
        if old == new {
            return Ok(());
        }
        if self.config.has_environment(new) {
            return Err(duplicate("environment", new));
        }

        let rename = |e: &mut Environment| {
            if *e == old {
                *e = new.to_string();
            }
        };
        self.commit(ChangeScope::Document, |c| {
            c.environments.iter_mut().for_each(rename);
            c.favorite_envs.iter_mut().for_each(rename);
            if let Some(env_config) = c.env_configs.remove(old) {
                c.env_configs.insert(new.to_string(), env_config);
            }
            for group in &mut c.env_groups {
                group.environments.iter_mut().for_each(rename);
            }
            for service in &mut c.services {
                for link in &mut service.links {
                    link.environments.iter_mut().for_each(rename);
                }
                if let Some(version) = service.versions.remove(old) {
                    service.versions.insert(new.to_string(), version);
                }
            }
            Ok(())
        })?;

        self.recent_envs.iter_mut().for_each(rename);
        if self.current_env == old {
            self.current_env = new.to_string();
        }
        Ok(())
    }

    pub fn move_environment(&mut self, env: &str, to_index: usize) -> Result<(), StoreError> {
        let from = self
            .config
            .environments
            .iter()
            .position(|e| e == env)
            .ok_or_else(|| not_found("environment", env))?;
        self.commit(ChangeScope::Document, |c| {
            move_item(&mut c.environments, from, to_index);
            Ok(())
        })
    }

    /// Selects the active environment, records it in the MRU list and adopts its saved
    /// view mode. This is client state and is never written to the document.
    pub fn set_env(&mut self, env: &str) -> Result<(), StoreError> {
        self.require_environment(env)?;
        self.current_env = env.to_string();
        push_recent(&mut self.recent_envs, env.to_string(), MAX_RECENT_ENVS, |a, b| a == b);
        self.view_mode = visibility::view_mode_for(&self.config, env, self.default_view_mode);
        log::debug!("Switched to env '{}' (view mode {})", env, self.view_mode);
        Ok(())
    }

    // --- Columns ---

    /// Adds a column, replacing any column with the same id.
    pub fn add_column(&mut self, column: ColumnDefinition) -> Result<(), StoreError> {
        require_id("column", &column.id)?;
        self.commit(ChangeScope::Document, |c| {
            upsert(&mut c.columns, column, |a, b| a.id == b.id);
            Ok(())
        })
    }

    /// Replaces column `id`. A changed id is carried through links, overrides, per-env
    /// visibility lists and recent links.
    pub fn update_column(&mut self, id: &str, column: ColumnDefinition) -> Result<(), StoreError> {
        require_id("column", &column.id)?;
        let position = self
            .config
            .columns
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| not_found("column", id))?;
        if column.id != id && self.config.column(&column.id).is_some() {
            return Err(duplicate("column", &column.id));
        }

        let new_id = column.id.clone();
        self.commit(ChangeScope::Document, |c| {
            if let Some(slot) = c.columns.get_mut(position) {
                *slot = column;
            }
            if new_id == id {
                return Ok(());
            }
            for service in &mut c.services {
                for link in service.links.iter_mut().filter(|l| l.column_id == id) {
                    link.column_id = new_id.clone();
                }
                if let Some(url) = service.overrides.remove(id) {
                    service.overrides.insert(new_id.clone(), url);
                }
            }
            for env_config in c.env_configs.values_mut() {
                if let Some(columns) = env_config.visible_columns.as_mut() {
                    for column in columns.iter_mut().filter(|col| col.as_str() == id) {
                        *column = new_id.clone();
                    }
                }
            }
            for recent in c.recent_links.iter_mut().filter(|r| r.column_id == id) {
                recent.column_id = new_id.clone();
            }
            Ok(())
        })
    }

    /// Removes a column and every service override for it.
    pub fn remove_column(&mut self, id: &str) -> Result<(), StoreError> {
        if self.config.column(id).is_none() {
            return Err(not_found("column", id));
        }
        self.commit(ChangeScope::Document, |c| {
            c.columns.retain(|col| col.id != id);
            for service in &mut c.services {
                service.overrides.remove(id);
            }
            Ok(())
        })
    }

    pub fn move_column(&mut self, id: &str, to_index: usize) -> Result<(), StoreError> {
        let from = self
            .config
            .columns
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| not_found("column", id))?;
        self.commit(ChangeScope::Document, |c| {
            move_item(&mut c.columns, from, to_index);
            Ok(())
        })
    }

    // --- Services ---

    /// Adds a service, replacing any service with the same id.
    pub fn add_service(&mut self, service: ServiceDefinition) -> Result<(), StoreError> {
        require_id("service", &service.id)?;
        self.commit(ChangeScope::Document, |c| {
            upsert(&mut c.services, service, |a, b| a.id == b.id);
            Ok(())
        })
    }

    /// Replaces service `id`. A changed id is carried through favorites, recents and per-env
    /// visibility lists.
    pub fn update_service(
        &mut self,
        id: &str,
        service: ServiceDefinition,
    ) -> Result<(), StoreError> {
        require_id("service", &service.id)?;
        let position = self
            .config
            .services
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| not_found("service", id))?;
        if service.id != id && self.config.service(&service.id).is_some() {
            return Err(duplicate("service", &service.id));
        }

        let new_id = service.id.clone();
        self.commit(ChangeScope::Document, |c| {
            if let Some(slot) = c.services.get_mut(position) {
                *slot = service;
            }
            if new_id == id {
                return Ok(());
            }
            let rename = |s: &mut String| {
                if *s == id {
                    *s = new_id.clone();
                }
            };
            c.favorite_services.iter_mut().for_each(rename);
            c.recent_services.iter_mut().for_each(rename);
            for recent in &mut c.recent_links {
                rename(&mut recent.service_id);
            }
            for env_config in c.env_configs.values_mut() {
                if let Some(services) = env_config.visible_services.as_mut() {
                    services.iter_mut().for_each(rename);
                }
            }
            Ok(())
        })
    }

    /// Removes a service along with its favorite and recent entries.
    pub fn remove_service(&mut self, id: &str) -> Result<(), StoreError> {
        if self.config.service(id).is_none() {
            return Err(not_found("service", id));
        }
        self.commit(ChangeScope::Document, |c| {
            c.services.retain(|s| s.id != id);
            c.favorite_services.retain(|s| s != id);
            c.recent_services.retain(|s| s != id);
            c.recent_links.retain(|r| r.service_id != id);
            Ok(())
        })
    }

    pub fn move_service(&mut self, id: &str, to_index: usize) -> Result<(), StoreError> {
        let from = self
            .config
            .services
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| not_found("service", id))?;
        self.commit(ChangeScope::Document, |c| {
            move_item(&mut c.services, from, to_index);
            Ok(())
        })
    }

    fn with_service<T>(
        &mut self,
        service_id: &str,
        mutate: impl FnOnce(&mut ServiceDefinition) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        if self.config.service(service_id).is_none() {
            return Err(not_found("service", service_id));
        }
        self.commit(ChangeScope::Document, |c| {
            let service = c
                .services
                .iter_mut()
                .find(|s| s.id == service_id)
                .ok_or_else(|| not_found("service", service_id))?;
            mutate(service)
        })
    }

    /// Sets (or with `None` clears) the URL override of one service for one column.
    pub fn set_service_override(
        &mut self,
        service_id: &str,
        column_id: &str,
        url: Option<String>,
    ) -> Result<(), StoreError> {
        self.with_service(service_id, |s| {
            match url {
                Some(url) => s.overrides.insert(column_id.to_string(), url),
                None => s.overrides.remove(column_id),
            };
            Ok(())
        })
    }

    pub fn set_service_variable(
        &mut self,
        service_id: &str,
        name: &str,
        value: Option<String>,
    ) -> Result<(), StoreError> {
        require_id("variable", name)?;
        self.with_service(service_id, |s| {
            match value {
                Some(value) => s.variables.insert(name.to_string(), value),
                None => s.variables.remove(name),
            };
            Ok(())
        })
    }

    // --- Service links ---

    /// Adds a link to a service, replacing any link with the same id.
    pub fn add_link(&mut self, service_id: &str, link: ServiceLink) -> Result<(), StoreError> {
        require_id("link", &link.id)?;
        self.with_service(service_id, |s| {
            upsert(&mut s.links, link, |a, b| a.id == b.id);
            Ok(())
        })
    }

    pub fn update_link(
        &mut self,
        service_id: &str,
        link_id: &str,
        link: ServiceLink,
    ) -> Result<(), StoreError> {
        require_id("link", &link.id)?;
        self.with_service(service_id, |s| {
            if link.id != link_id && s.link(&link.id).is_some() {
                return Err(duplicate("link", &link.id));
            }
            let slot = s
                .links
                .iter_mut()
                .find(|l| l.id == link_id)
                .ok_or_else(|| not_found("link", link_id))?;
            *slot = link;
            Ok(())
        })
    }

    pub fn remove_link(&mut self, service_id: &str, link_id: &str) -> Result<(), StoreError> {
        self.with_service(service_id, |s| {
            let before = s.links.len();
            s.links.retain(|l| l.id != link_id);
            if s.links.len() == before {
                return Err(not_found("link", link_id));
            }
            Ok(())
        })
    }

    // --- Environment groups ---

    pub fn add_env_group(&mut self, group: EnvGroup) -> Result<(), StoreError> {
        require_id("group", &group.id)?;
        self.commit(ChangeScope::Document, |c| {
            upsert(&mut c.env_groups, group, |a, b| a.id == b.id);
            Ok(())
        })
    }

    pub fn update_env_group(&mut self, id: &str, group: EnvGroup) -> Result<(), StoreError> {
        require_id("group", &group.id)?;
        if group.id != id && self.config.env_group(&group.id).is_some() {
            return Err(duplicate("group", &group.id));
        }
        self.commit(ChangeScope::Document, |c| {
            let slot = c
                .env_groups
                .iter_mut()
                .find(|g| g.id == id)
                .ok_or_else(|| not_found("group", id))?;
            *slot = group;
            Ok(())
        })
    }

    pub fn remove_env_group(&mut self, id: &str) -> Result<(), StoreError> {
        if self.config.env_group(id).is_none() {
            return Err(not_found("group", id));
        }
        self.commit(ChangeScope::Document, |c| {
            c.env_groups.retain(|g| g.id != id);
            Ok(())
        })
    }

    // --- Favorites & recents ---

    /// Returns `true` when the environment is a favorite after the toggle.
    pub fn toggle_favorite_env(&mut self, env: &str) -> Result<bool, StoreError> {
        self.require_environment(env)?;
        self.commit(ChangeScope::Document, |c| Ok(toggle(&mut c.favorite_envs, env)))
    }

    /// Returns `true` when the service is a favorite after the toggle.
    pub fn toggle_favorite_service(&mut self, id: &str) -> Result<bool, StoreError> {
        if self.config.service(id).is_none() {
            return Err(not_found("service", id));
        }
        self.commit(ChangeScope::Document, |c| {
            Ok(toggle(&mut c.favorite_services, id))
        })
    }

    pub fn record_service_visit(&mut self, id: &str) -> Result<(), StoreError> {
        if self.config.service(id).is_none() {
            return Err(not_found("service", id));
        }
        self.commit(ChangeScope::Document, |c| {
            push_recent(&mut c.recent_services, id.to_string(), MAX_RECENT_SERVICES, |a, b| a == b);
            Ok(())
        })
    }

    pub fn record_link_visit(
        &mut self,
        service_id: &str,
        column_id: &str,
    ) -> Result<(), StoreError> {
        if self.config.service(service_id).is_none() {
            return Err(not_found("service", service_id));
        }
        let visit = RecentLink {
            service_id: service_id.to_string(),
            column_id: column_id.to_string(),
            timestamp: now_millis(),
        };
        self.commit(ChangeScope::Document, |c| {
            push_recent(&mut c.recent_links, visit, MAX_RECENT_LINKS, |a, b| {
                a.service_id == b.service_id && a.column_id == b.column_id
            });
            Ok(())
        })
    }

    // --- Environment-specific settings ---

    fn update_env_config(
        &mut self,
        env: &str,
        apply: impl FnOnce(&mut EnvSpecificConfig),
    ) -> Result<(), StoreError> {
        self.require_environment(env)?;
        self.commit(ChangeScope::Environment(env.to_string()), |c| {
            let mut env_config = c.env_configs.remove(env).unwrap_or_default();
            apply(&mut env_config);
            if !env_config.is_empty() {
                c.env_configs.insert(env.to_string(), env_config);
            }
            Ok(())
        })
    }

    /// `None` shows every service; `Some(vec![])` hides them all.
    pub fn set_visible_services(
        &mut self,
        env: &str,
        services: Option<Vec<String>>,
    ) -> Result<(), StoreError> {
        self.update_env_config(env, |ec| ec.visible_services = services)
    }

    /// `None` shows every column; `Some(vec![])` hides them all.
    pub fn set_visible_columns(
        &mut self,
        env: &str,
        columns: Option<Vec<String>>,
    ) -> Result<(), StoreError> {
        self.update_env_config(env, |ec| ec.visible_columns = columns)
    }

    pub fn set_env_view_mode(
        &mut self,
        env: &str,
        mode: Option<ViewMode>,
    ) -> Result<(), StoreError> {
        self.update_env_config(env, |ec| ec.view_mode = mode)?;
        if env == self.current_env {
            self.view_mode = mode.unwrap_or(self.default_view_mode);
        }
        Ok(())
    }

    /// Sets the active view mode and remembers it for the current environment.
    pub fn set_view_mode(&mut self, mode: ViewMode) -> Result<(), StoreError> {
        self.view_mode = mode;
        if self.current_env.is_empty() {
            return Ok(());
        }
        let env = self.current_env.clone();
        self.update_env_config(&env, |ec| ec.view_mode = Some(mode))
    }

    // --- Document-level settings ---

    pub fn set_announcement(
        &mut self,
        announcement: Option<Announcement>,
    ) -> Result<(), StoreError> {
        self.commit(ChangeScope::Document, |c| {
            c.announcement = announcement;
            Ok(())
        })
    }

    pub fn set_title(&mut self, title: &str) -> Result<(), StoreError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(StoreError::InvalidInput("title cannot be empty".to_string()));
        }
        self.commit(ChangeScope::Document, |c| {
            c.title = title.to_string();
            Ok(())
        })
    }

    // --- Import / export ---

    /// Replaces the whole document with `text`. The format is sniffed when not given.
    /// On a parse failure the current document is kept and the error is recorded.
    pub fn import_document(
        &mut self,
        text: &str,
        format: Option<DocumentFormat>,
    ) -> Result<(), StoreError> {
        let parsed = match format {
            Some(format) => document::parse_config(text, format),
            None => document::parse_config_auto(text),
        };
        let config = match parsed {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Import rejected: {}", e);
                self.error = Some(e.to_string());
                return Err(e.into());
            }
        };

        self.error = None;
        self.commit(ChangeScope::Document, |c| {
            *c = config;
            Ok(())
        })?;
        self.rederive_client_state();
        log::info!(
            "Imported document with {} services and {} environments.",
            self.config.services.len(),
            self.config.environments.len()
        );
        Ok(())
    }

    pub fn export_document(&self, format: DocumentFormat) -> Result<String, StoreError> {
        Ok(document::export_config(&self.config, format)?)
    }
}

// --- Collection helpers ---

fn upsert<T>(items: &mut Vec<T>, item: T, same: impl Fn(&T, &T) -> bool) {
    match items.iter_mut().find(|existing| same(existing, &item)) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}

fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from >= items.len() {
        return;
    }
    let item = items.remove(from);
    let to = to.min(items.len());
    items.insert(to, item);
}

/// Inserts `item` at the head, dropping an equal earlier entry and anything past `max`.
fn push_recent<T>(items: &mut Vec<T>, item: T, max: usize, same: impl Fn(&T, &T) -> bool) {
    items.retain(|existing| !same(existing, &item));
    items.insert(0, item);
    items.truncate(max);
}

fn toggle(items: &mut Vec<String>, id: &str) -> bool {
    if items.iter().any(|i| i == id) {
        items.retain(|i| i != id);
        false
    } else {
        items.push(id.to_string());
        true
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::memory_service::MemoryConfigService;
    use std::time::Duration;

    fn seeded() -> OpsMatrixConfig {
        let mut api = ServiceDefinition::new("api", "API Gateway");
        api.overrides.insert("logs".into(), "https://logs/{{env}}".into());
        api.links.push(ServiceLink {
            id: "runbook".into(),
            column_id: "docs".into(),
            name: "Runbook".into(),
            url: "https://wiki/api".into(),
            environments: vec!["prod".into()],
        });
        OpsMatrixConfig {
            environments: vec!["prod".into(), "staging".into(), "dev".into()],
            columns: vec![
                ColumnDefinition::new("logs", "Logs"),
                ColumnDefinition::new("docs", "Docs"),
            ],
            services: vec![api, ServiceDefinition::new("db", "Database")],
            favorite_envs: vec!["staging".into()],
            favorite_services: vec!["api".into()],
            recent_services: vec!["api".into(), "db".into()],
            ..Default::default()
        }
    }

    async fn store_with(config: OpsMatrixConfig) -> (ConfigStore, Arc<MemoryConfigService>) {
        let service = Arc::new(MemoryConfigService::with_config(config));
        let mut store = ConfigStore::new(service.clone(), StoreOptions::default());
        store.load().await.unwrap();
        (store, service)
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_selects_first_environment() {
        let (store, _) = store_with(seeded()).await;
        assert!(!store.is_loading());
        assert_eq!(store.current_env(), "prod");
        assert_eq!(store.config().services.len(), 2);
        assert_eq!(store.error(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_failure_keeps_default_config() {
        let service = Arc::new(MemoryConfigService::with_config(seeded()));
        service.set_failing(true);
        let mut store = ConfigStore::new(service.clone(), StoreOptions::default());
        assert!(store.is_loading());

        assert!(store.load().await.is_err());
        assert!(!store.is_loading());
        assert_eq!(store.config(), &OpsMatrixConfig::default());
        assert!(store.error().is_some());

        store.flush().await;
        assert_eq!(service.save_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quick_mutations_are_saved_once() {
        let (mut store, service) = store_with(seeded()).await;
        for i in 0..5 {
            store.set_title(&format!("Matrix {}", i)).unwrap();
        }
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(service.save_calls(), 1);
        assert_eq!(service.current().title, "Matrix 4");
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_mutations_are_saved_each_time() {
        let (mut store, service) = store_with(seeded()).await;
        for i in 0..3 {
            store.set_title(&format!("Matrix {}", i)).unwrap();
            tokio::time::sleep(Duration::from_millis(600)).await;
        }
        assert_eq!(service.save_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_visibility_change_is_patched_per_environment() {
        let (mut store, service) = store_with(seeded()).await;
        store.set_visible_services("prod", Some(vec![])).unwrap();
        store.flush().await;

        assert_eq!(service.save_calls(), 0);
        assert_eq!(service.patched_envs(), vec!["prod".to_string()]);
        assert_eq!(
            service
                .current()
                .env_config("prod")
                .and_then(|c| c.visible_services.clone()),
            Some(vec![])
        );

        store.set_visible_services("prod", None).unwrap();
        store.flush().await;
        assert!(service.current().env_configs.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_document_save_survives_a_later_env_only_change() {
        let (mut store, service) = store_with(OpsMatrixConfig {
            environments: vec!["prod".into()],
            ..Default::default()
        })
        .await;

        service.set_failing(true);
        store.add_service(ServiceDefinition::new("api", "API")).unwrap();
        store.flush().await;
        assert!(store.error().is_some());

        service.set_failing(false);
        store.set_visible_columns("prod", Some(vec![])).unwrap();
        store.flush().await;

        let backend = service.current();
        assert!(backend.service("api").is_some());
        assert_eq!(
            backend.env_config("prod").and_then(|c| c.visible_columns.clone()),
            Some(vec![])
        );
        assert_eq!(store.error(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_env_tracks_recents_and_view_mode() {
        let (mut store, _) = store_with(seeded()).await;
        store.set_env_view_mode("staging", Some(ViewMode::Table)).unwrap();

        store.set_env("staging").unwrap();
        assert_eq!(store.view_mode(), ViewMode::Table);
        store.set_env("dev").unwrap();
        assert_eq!(store.view_mode(), ViewMode::Grid);
        store.set_env("staging").unwrap();
        assert_eq!(store.recent_envs(), ["staging".to_string(), "dev".to_string()]);

        assert!(matches!(
            store.set_env("nowhere"),
            Err(StoreError::UnknownEnvironment(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recent_envs_are_bounded() {
        let (mut store, _) = store_with(OpsMatrixConfig::default()).await;
        for i in 0..8 {
            store.add_environment(&format!("env-{}", i)).unwrap();
            store.set_env(&format!("env-{}", i)).unwrap();
        }
        assert_eq!(store.recent_envs().len(), MAX_RECENT_ENVS);
        assert_eq!(store.recent_envs().first().map(String::as_str), Some("env-7"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_environment_cascades() {
        let (mut store, _) = store_with(seeded()).await;
        store.set_visible_columns("staging", Some(vec!["logs".into()])).unwrap();
        store.set_env("staging").unwrap();

        store.remove_environment("staging").unwrap();
        let config = store.config();
        assert!(!config.has_environment("staging"));
        assert!(config.env_configs.get("staging").is_none());
        assert!(config.favorite_envs.is_empty());
        assert_eq!(store.current_env(), "prod");
        assert!(store.recent_envs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rename_environment_rewrites_references() {
        let (mut store, _) = store_with(seeded()).await;
        store.set_env_view_mode("prod", Some(ViewMode::List)).unwrap();
        store.rename_environment("prod", "production").unwrap();

        let config = store.config();
        assert_eq!(config.environments.first().map(String::as_str), Some("production"));
        assert!(config.env_configs.contains_key("production"));
        let link = config.service("api").and_then(|s| s.link("runbook")).unwrap();
        assert_eq!(link.environments, vec!["production".to_string()]);
        assert_eq!(store.current_env(), "production");

        assert!(matches!(
            store.rename_environment("production", "dev"),
            Err(StoreError::Duplicate { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_column_drops_overrides() {
        let (mut store, _) = store_with(seeded()).await;
        store.remove_column("logs").unwrap();
        assert!(store.config().service("api").unwrap().overrides.is_empty());
        assert!(matches!(
            store.remove_column("logs"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_column_id_rekeys_links_and_overrides() {
        let (mut store, _) = store_with(seeded()).await;
        store
            .update_column("docs", ColumnDefinition::new("wiki", "Wiki"))
            .unwrap();
        let api = store.config().service("api").unwrap();
        assert_eq!(api.links.first().map(|l| l.column_id.as_str()), Some("wiki"));

        store
            .update_column("logs", ColumnDefinition::new("logging", "Logging"))
            .unwrap();
        let api = store.config().service("api").unwrap();
        assert!(api.overrides.contains_key("logging"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_service_cascades() {
        let (mut store, _) = store_with(seeded()).await;
        store.record_link_visit("api", "logs").unwrap();
        store.remove_service("api").unwrap();

        let config = store.config();
        assert!(config.service("api").is_none());
        assert!(config.favorite_services.is_empty());
        assert_eq!(config.recent_services, vec!["db".to_string()]);
        assert!(config.recent_links.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_service_is_an_upsert() {
        let (mut store, _) = store_with(seeded()).await;
        store.add_service(ServiceDefinition::new("db", "Postgres")).unwrap();
        assert_eq!(store.config().services.len(), 2);
        assert_eq!(store.config().service("db").unwrap().name, "Postgres");
        assert!(matches!(
            store.update_service("ghost", ServiceDefinition::new("ghost", "Ghost")),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_link_crud() {
        let (mut store, _) = store_with(seeded()).await;
        let mut link = ServiceLink {
            id: "grafana".into(),
            column_id: "logs".into(),
            name: "Grafana".into(),
            url: "https://grafana".into(),
            environments: vec![],
        };
        store.add_link("db", link.clone()).unwrap();
        link.name = "Grafana (db)".into();
        store.update_link("db", "grafana", link).unwrap();
        assert_eq!(
            store.config().service("db").and_then(|s| s.link("grafana")).map(|l| l.name.as_str()),
            Some("Grafana (db)")
        );
        store.remove_link("db", "grafana").unwrap();
        assert!(matches!(
            store.remove_link("db", "grafana"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_favorites_and_recents() {
        let (mut store, _) = store_with(seeded()).await;
        assert!(store.toggle_favorite_env("prod").unwrap());
        assert!(!store.toggle_favorite_env("prod").unwrap());
        assert!(!store.toggle_favorite_service("api").unwrap());

        store.record_service_visit("db").unwrap();
        assert_eq!(store.config().recent_services, vec!["db".to_string(), "api".to_string()]);

        store.record_link_visit("api", "logs").unwrap();
        store.record_link_visit("db", "logs").unwrap();
        store.record_link_visit("api", "logs").unwrap();
        let recents = &store.config().recent_links;
        assert_eq!(recents.len(), 2);
        assert_eq!(recents.first().map(|r| r.service_id.as_str()), Some("api"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_import_failure_leaves_config_unchanged() {
        let (mut store, service) = store_with(seeded()).await;
        let before = store.snapshot();

        let result = store.import_document("services: [", Some(DocumentFormat::Yaml));
        assert!(matches!(result, Err(StoreError::Parse(_))));
        assert_eq!(store.config(), before.as_ref());
        assert!(store.error().is_some());

        store.flush().await;
        assert_eq!(service.save_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_import_replaces_config_and_rederives_env() {
        let (mut store, service) = store_with(seeded()).await;
        store.set_env("dev").unwrap();

        store
            .import_document(
                "environments: [qa, dev]\nservices:\n  - id: web\n    name: Web\n",
                None,
            )
            .unwrap();
        assert_eq!(store.current_env(), "dev");
        assert_eq!(store.config().title, crate::constants::DEFAULT_TITLE);
        assert!(store.config().columns.is_empty());

        store.import_document(r#"{"environments":["qa"]}"#, None).unwrap();
        assert_eq!(store.current_env(), "qa");

        store.flush().await;
        assert_eq!(service.save_calls(), 1);
        assert_eq!(service.current().environments, vec!["qa".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_then_import_round_trips() {
        let (mut store, _) = store_with(seeded()).await;
        store.record_link_visit("api", "logs").unwrap();
        store.set_visible_services("dev", Some(vec![])).unwrap();
        let before = store.snapshot();

        for format in [DocumentFormat::Yaml, DocumentFormat::Json] {
            let text = store.export_document(format).unwrap();
            store.import_document(&text, Some(format)).unwrap();
            assert_eq!(store.config(), before.as_ref());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_restore_ignores_unknown_envs() {
        let (mut store, _) = store_with(seeded()).await;
        store.restore_session(SessionState {
            current_env: Some("staging".into()),
            recent_envs: vec!["gone".into(), "staging".into()],
            view_mode: Some(ViewMode::List),
        });
        assert_eq!(store.current_env(), "staging");
        assert_eq!(store.recent_envs(), ["staging".to_string()]);
        assert_eq!(store.view_mode(), ViewMode::List);

        store.restore_session(SessionState {
            current_env: Some("gone".into()),
            ..Default::default()
        });
        assert_eq!(store.current_env(), "staging");
        assert_eq!(store.session().current_env.as_deref(), Some("staging"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_view_mode_is_remembered_for_current_env() {
        let (mut store, _) = store_with(seeded()).await;
        store.set_view_mode(ViewMode::List).unwrap();
        assert_eq!(
            store.config().env_config("prod").and_then(|c| c.view_mode),
            Some(ViewMode::List)
        );
        store.set_env("dev").unwrap();
        assert_eq!(store.view_mode(), ViewMode::Grid);
        store.set_env("prod").unwrap();
        assert_eq!(store.view_mode(), ViewMode::List);
    }
}
