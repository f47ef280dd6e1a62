//! The locally persisted session.
//!
//! One JSON file holds the server-issued token, its expiry, who it belongs to and the
//! cached checklist view-model. It is read at the start of every command, written on
//! login and removed on logout or once expired.

use chrono::{DateTime, Utc};
use portal_core::models::{Checklist, CompanyResponse};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Not logged in. Run `portal login` first.")]
    NotLoggedIn,

    #[error("Not logged in: the session has expired. Run `portal login` again.")]
    Expired,

    #[error("This command needs {needed} session; run `{hint}`.")]
    WrongRole {
        needed: &'static str,
        hint: &'static str,
    },

    #[error("Session file {path} is unreadable: {reason}. Run `portal logout` and log in again.")]
    Malformed { path: String, reason: String },

    #[error("Session file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Who a stored session belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Principal {
    Company {
        company: CompanyResponse,
        #[serde(default)]
        checklist: Checklist,
    },
    Admin {
        username: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    #[serde(flatten)]
    pub principal: Principal,
}

impl StoredSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Location of the session file on disk.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `PORTAL_SESSION_FILE`, else `<config dir>/portal/session.json`.
    pub fn from_env() -> Self {
        let path = std::env::var_os("PORTAL_SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("portal")
                    .join("session.json")
            });
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the session and enforce expiry. An expired file is removed.
    pub fn load(&self, now: DateTime<Utc>) -> Result<StoredSession, SessionError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SessionError::NotLoggedIn)
            }
            Err(e) => return Err(e.into()),
        };

        let session: StoredSession =
            serde_json::from_str(&raw).map_err(|e| SessionError::Malformed {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        if session.is_expired(now) {
            tracing::debug!(path = %self.path.display(), "Removing expired session");
            self.clear()?;
            return Err(SessionError::Expired);
        }
        Ok(session)
    }

    pub fn save(&self, session: &StoredSession) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session).map_err(|e| SessionError::Malformed {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// Remove the file; a missing file is not an error.
    pub fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
