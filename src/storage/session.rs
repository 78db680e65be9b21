use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::sync::Credentials;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to access token file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse token: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Not logged in")]
    NotLoggedIn,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredSession {
    pub token: String,
    pub username: String,
    pub saved_at: DateTime<Utc>,
}

impl StoredSession {
    pub fn new(credentials: &Credentials, username: impl Into<String>) -> Self {
        Self {
            token: credentials.bearer_token().to_string(),
            username: username.into(),
            saved_at: Utc::now(),
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.token.clone())
    }
}

/// Keeps the bearer token between CLI invocations.
pub struct TokenStorage {
    path: PathBuf,
}

impl TokenStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn save(&self, session: &StoredSession) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn load(&self) -> Result<StoredSession, SessionError> {
        if !self.path.exists() {
            return Err(SessionError::NotLoggedIn);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let session: StoredSession = serde_json::from_str(&content)?;
        Ok(session)
    }

    /// Forgets the stored token; a missing file is not an error.
    pub fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
