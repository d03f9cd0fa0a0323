// src/constants.rs

use std::time::Duration;

/// The name of the application directory inside the platform config dir.
pub const APP_DIR_NAME: &str = "opsmatrix";

/// The name of the settings file (in ~/.config/opsmatrix/).
pub const SETTINGS_FILENAME: &str = "settings.toml";

/// The default name of the local config document used by the file backend.
pub const DEFAULT_DOCUMENT_FILENAME: &str = "matrix.yaml";

/// The name of the binary session cache (current env, recent envs, view mode).
pub const SESSION_CACHE_FILENAME: &str = "session.bin";

/// Environment variable pointing at an alternative settings file.
pub const SETTINGS_ENV_VAR: &str = "OPSMATRIX_SETTINGS";

/// Environment variable that forces the HTTP backend at the given base URL.
pub const API_URL_ENV_VAR: &str = "OPSMATRIX_API_URL";

/// Title used when a document does not carry one.
pub const DEFAULT_TITLE: &str = "Ops Matrix";

/// Default quiet period before a burst of mutations is saved.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Length of the most-recently-used environment list.
pub const MAX_RECENT_ENVS: usize = 5;
/// Length of the recently visited services list.
pub const MAX_RECENT_SERVICES: usize = 10;
/// Length of the recently opened links list.
pub const MAX_RECENT_LINKS: usize = 10;

/// Id of the synthetic trailing group for environments no other group claimed.
pub const OTHER_GROUP_ID: &str = "other";
/// Display name of the trailing group.
pub const OTHER_GROUP_NAME: &str = "Other";
/// Icon of the trailing group, also the fallback for unknown prefixes.
pub const OTHER_GROUP_ICON: &str = "📦";
