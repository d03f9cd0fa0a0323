//! # Config Service Layer
//!
//! The boundary between the store and wherever the config document actually lives.
//!
//! ## Modules
//!
//! - **`config_service`**: The `ConfigService` trait (fetch, save, patch one environment,
//!   health probe) and its error type.
//! - **`file_service`**: A local YAML/JSON document with atomic replace-on-write.
//! - **`http_service`**: The config REST API over `reqwest`.
//! - **`memory_service`**: A process-local document used for `--dry-run` and in tests.

pub mod config_service;
pub mod file_service;
pub mod http_service;
pub mod memory_service;
