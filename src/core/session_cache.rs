// src/core/session_cache.rs

//! Binary cache of the client session (selected env, MRU envs, view mode) between runs.
//! The cache is disposable: anything unreadable is logged and replaced by an empty session.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use thiserror::Error;

use crate::models::SessionState;

#[derive(Error, Debug)]
pub enum SessionCacheError {
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode session cache: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("Failed to encode session cache: {0}")]
    Encode(#[from] bincode::error::EncodeError),
}

pub fn read_session(path: &Path) -> Result<SessionState, SessionCacheError> {
    let bytes = fs::read(path)?;
    let (session, _): (SessionState, usize) =
        bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;
    Ok(session)
}

/// Reads the session, treating a missing or corrupt cache as a fresh start.
pub fn load_session(path: &Path) -> SessionState {
    match read_session(path) {
        Ok(session) => session,
        Err(SessionCacheError::Io(e)) if e.kind() == ErrorKind::NotFound => SessionState::default(),
        Err(e) => {
            log::warn!(
                "Ignoring unreadable session cache at '{}': {}",
                path.display(),
                e
            );
            SessionState::default()
        }
    }
}

pub fn write_session(path: &Path, session: &SessionState) -> Result<(), SessionCacheError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let bytes = bincode::serde::encode_to_vec(session, bincode::config::standard())?;
    fs::write(path, bytes)?;
    log::trace!("Session cache written to '{}'", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ViewMode;
    use tempfile::tempdir;

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache").join("session.bin");
        let session = SessionState {
            current_env: Some("staging".into()),
            recent_envs: vec!["staging".into(), "prod".into()],
            view_mode: Some(ViewMode::Table),
        };
        write_session(&path, &session).unwrap();
        assert_eq!(read_session(&path).unwrap(), session);
    }

    #[test]
    fn test_missing_or_corrupt_cache_is_a_fresh_session() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.bin");
        assert_eq!(load_session(&path), SessionState::default());

        fs::write(&path, [0xff, 0xff, 0xff]).unwrap();
        assert_eq!(load_session(&path), SessionState::default());
    }
}
