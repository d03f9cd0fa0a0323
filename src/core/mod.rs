// src/core/mod.rs

pub mod document;
pub mod env_grouping;
pub mod icons;
pub mod integrity;
pub mod paths;
pub mod persister;
pub mod session_cache;
pub mod settings;
pub mod url_resolver;
pub mod visibility;
