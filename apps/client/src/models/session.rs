use serde::{Deserialize, Serialize};

use crate::errors::ClientError;
use crate::models::analysis::AnalysisResult;

/// The identity claims the shell actually reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Identity provider subject id; sent as `X-Google-Id` on uploads.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// An authenticated user plus any analysis the backend kept for them.
///
/// `verified` is false for sessions built from a locally decoded identity
/// token after the backend could not be reached. Those are never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: UserProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_resume: Option<AnalysisResult>,
    #[serde(default)]
    pub verified: bool,
}

impl Session {
    /// Rejects sessions the rest of the client cannot work with.
    pub fn validate(self) -> Result<Self, ClientError> {
        if self.user.id.trim().is_empty() {
            return Err(ClientError::InvalidSession(
                "session has no subject id".to_string(),
            ));
        }
        Ok(self)
    }

    pub fn display_name(&self) -> Option<&str> {
        self.user
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}
