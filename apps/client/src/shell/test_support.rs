use std::sync::Mutex;

use async_trait::async_trait;

use crate::api_client::{Backend, ResumeFile};
use crate::errors::ClientError;
use crate::models::{AnalysisResult, Session, UserProfile};

/// Scripted backend. A `None` field makes that endpoint fail with a 503.
#[derive(Default)]
pub(crate) struct StubBackend {
    pub session: Option<Session>,
    pub analysis: Option<AnalysisResult>,
    pub reply: Option<String>,
    pub calls: Mutex<Vec<&'static str>>,
    pub last_google_id: Mutex<Option<String>>,
    pub last_chat: Mutex<Option<(String, AnalysisResult)>>,
}

impl StubBackend {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

fn offline() -> ClientError {
    ClientError::Api {
        status: 503,
        message: "stub offline".to_string(),
    }
}

#[async_trait]
impl Backend for StubBackend {
    async fn verify_credential(&self, _credential: &str) -> Result<Session, ClientError> {
        self.record("verify_credential");
        self.session.clone().ok_or_else(offline)
    }

    async fn analyze(
        &self,
        google_id: &str,
        _file: ResumeFile,
    ) -> Result<AnalysisResult, ClientError> {
        self.record("analyze");
        *self.last_google_id.lock().unwrap() = Some(google_id.to_string());
        self.analysis.clone().ok_or_else(offline)
    }

    async fn chat(&self, message: &str, context: &AnalysisResult) -> Result<String, ClientError> {
        self.record("chat");
        *self.last_chat.lock().unwrap() = Some((message.to_string(), context.clone()));
        self.reply.clone().ok_or_else(offline)
    }
}

pub(crate) fn verified_session(existing_resume: Option<AnalysisResult>) -> Session {
    Session {
        user: UserProfile {
            id: "google-1094".to_string(),
            name: Some("Priya".to_string()),
            email: Some("priya@example.com".to_string()),
            picture: Some("https://img.example.com/p.png".to_string()),
        },
        existing_resume,
        verified: true,
    }
}

pub(crate) fn resume_pdf() -> ResumeFile {
    ResumeFile::new("priya.pdf", b"%PDF-1.7 fake".to_vec())
}
