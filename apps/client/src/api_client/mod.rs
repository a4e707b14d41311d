//! Backend client. The only place the client talks HTTP.
//!
//! Three endpoints: identity verification, resume analysis and chat. The
//! shell depends on the [`Backend`] trait so tests can swap in doubles.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::ClientError;
use crate::models::{AnalysisResult, Session, UserProfile};

pub mod file;

pub use file::ResumeFile;

pub const AUTH_PATH: &str = "/api/auth/google";
pub const ANALYZE_PATH: &str = "/api/analyze";
pub const CHAT_PATH: &str = "/api/chat";
/// Header carrying the provider subject id on uploads.
pub const GOOGLE_ID_HEADER: &str = "X-Google-Id";

#[async_trait]
pub trait Backend: Send + Sync {
    /// Exchanges a provider credential for a verified session.
    async fn verify_credential(&self, credential: &str) -> Result<Session, ClientError>;

    /// Uploads a resume for analysis on behalf of `google_id`.
    async fn analyze(&self, google_id: &str, file: ResumeFile)
        -> Result<AnalysisResult, ClientError>;

    /// Asks the assistant about the active analysis.
    async fn chat(&self, message: &str, context: &AnalysisResult) -> Result<String, ClientError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    credential: &'a str,
}

/// What `/api/auth/google` sends back. Loosely typed on purpose; it is
/// narrowed into a [`Session`] before anything else sees it.
#[derive(Debug, Deserialize)]
struct VerifiedUser {
    #[serde(default)]
    uid: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    picture: Option<String>,
    #[serde(default)]
    existing_resume: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ChatRequestBody<'a> {
    message: &'a str,
    context: &'a AnalysisResult,
}

#[derive(Debug, Deserialize)]
struct ChatResponseBody {
    response: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    detail: Value,
}

impl VerifiedUser {
    fn into_session(self) -> Result<Session, ClientError> {
        let existing_resume = match self.existing_resume {
            None | Some(Value::Null) => None,
            Some(raw) => match serde_json::from_value::<AnalysisResult>(raw) {
                Ok(analysis) => Some(analysis.normalized()),
                Err(e) => {
                    warn!("Ignoring stored analysis the client cannot read: {e}");
                    None
                }
            },
        };

        Session {
            user: UserProfile {
                id: self.uid.or(self.sub).unwrap_or_default(),
                name: self.name,
                email: self.email,
                picture: self.picture,
            },
            existing_resume,
            verified: true,
        }
        .validate()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP implementation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turns a non-2xx response into [`ClientError::Api`], preferring the
/// backend's `detail` message over the raw body.
async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|e| match e.detail {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .unwrap_or(body);
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl Backend for HttpBackend {
    async fn verify_credential(&self, credential: &str) -> Result<Session, ClientError> {
        let response = self
            .client
            .post(self.url(AUTH_PATH))
            .json(&AuthRequest { credential })
            .send()
            .await?;
        let user: VerifiedUser = ensure_success(response).await?.json().await?;
        let session = user.into_session()?;
        debug!(
            user_id = %session.user.id,
            has_existing_resume = session.existing_resume.is_some(),
            "credential verified"
        );
        Ok(session)
    }

    async fn analyze(
        &self,
        google_id: &str,
        file: ResumeFile,
    ) -> Result<AnalysisResult, ClientError> {
        debug!(file_name = %file.file_name, bytes = file.bytes.len(), "uploading resume");
        let part = multipart::Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(file.mime_type)?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.url(ANALYZE_PATH))
            .header(GOOGLE_ID_HEADER, google_id)
            .multipart(form)
            .send()
            .await?;
        let analysis: AnalysisResult = ensure_success(response).await?.json().await?;
        Ok(analysis.normalized())
    }

    async fn chat(&self, message: &str, context: &AnalysisResult) -> Result<String, ClientError> {
        let response = self
            .client
            .post(self.url(CHAT_PATH))
            .json(&ChatRequestBody { message, context })
            .send()
            .await?;
        let body: ChatResponseBody = ensure_success(response).await?.json().await?;
        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_verified_user_prefers_uid_over_sub() {
        let user: VerifiedUser = serde_json::from_value(json!({
            "success": true, "uid": "g-1", "sub": "ignored", "name": "Priya"
        }))
        .unwrap();
        let session = user.into_session().unwrap();
        assert_eq!(session.user.id, "g-1");
        assert!(session.verified);
    }

    #[test]
    fn test_verified_user_falls_back_to_sub() {
        let user: VerifiedUser = serde_json::from_value(json!({"sub": "s-9"})).unwrap();
        assert_eq!(user.into_session().unwrap().user.id, "s-9");
    }

    #[test]
    fn test_verified_user_without_id_is_invalid() {
        let user: VerifiedUser = serde_json::from_value(json!({"name": "Ghost"})).unwrap();
        assert!(matches!(
            user.into_session(),
            Err(ClientError::InvalidSession(_))
        ));
    }

    #[test]
    fn test_null_existing_resume_is_none() {
        let user: VerifiedUser =
            serde_json::from_value(json!({"uid": "1", "existing_resume": null})).unwrap();
        assert!(user.into_session().unwrap().existing_resume.is_none());
    }

    #[test]
    fn test_unreadable_existing_resume_is_dropped_not_fatal() {
        let user: VerifiedUser = serde_json::from_value(json!({
            "uid": "1", "existing_resume": {"skills": "not a list"}
        }))
        .unwrap();
        let session = user.into_session().unwrap();
        assert!(session.existing_resume.is_none());
    }

    #[test]
    fn test_existing_resume_is_parsed() {
        let user: VerifiedUser = serde_json::from_value(json!({
            "uid": "1",
            "existing_resume": {"predicted_role": "Designer", "jobs": [
                {"title": "UX", "company": "X", "salary_range": "", "apply_link": "", "match_score": 250}
            ]}
        }))
        .unwrap();
        let resume = user.into_session().unwrap().existing_resume.unwrap();
        assert_eq!(resume.predicted_role, "Designer");
        assert_eq!(resume.jobs[0].match_score, 100.0);
    }

    #[test]
    fn test_http_backend_trims_trailing_slash() {
        let backend = HttpBackend::new("http://localhost:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(backend.url(CHAT_PATH), "http://localhost:8000/api/chat");
    }
}
