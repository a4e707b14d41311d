use rand::seq::SliceRandom;
use tracing::{debug, error, info, warn};

use super::{messages, AppStatus, Shell, Ticket};
use crate::animator::RevealSpeed;
use crate::api_client::{Backend, ResumeFile};
use crate::errors::ClientError;
use crate::models::AnalysisResult;
use crate::storage::KeyValueStorage;

/// An upload the shell has committed to; the caller performs the request.
#[derive(Debug)]
pub struct UploadRequest {
    pub ticket: Ticket,
    /// Provider subject id for the `X-Google-Id` header.
    pub google_id: String,
    pub file: ResumeFile,
}

fn pick_loading_vibe() -> &'static str {
    messages::LOADING_VIBES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(messages::LOADING_VIBES[0])
}

impl<S: KeyValueStorage> Shell<S> {
    /// idle → analyzing. Returns `None` without a session or outside idle.
    pub fn begin_upload(&mut self, file: ResumeFile) -> Option<UploadRequest> {
        let Some(session) = self.session.as_ref() else {
            warn!("upload attempted without a session");
            return None;
        };
        if self.status != AppStatus::Idle {
            warn!(status = ?self.status, "upload ignored outside idle");
            return None;
        }
        if !file.has_accepted_extension() {
            debug!(file_name = %file.file_name, "uploading a file type the picker does not offer");
        }

        let google_id = session.user.id.clone();
        self.loading_message = pick_loading_vibe();
        self.status = AppStatus::Analyzing;
        self.error = None;
        info!(file_name = %file.file_name, "analyzing resume");

        Some(UploadRequest {
            ticket: self.ticket(),
            google_id,
            file,
        })
    }

    /// analyzing → dashboard on success, analyzing → idle otherwise.
    /// Results from an older generation are dropped.
    pub fn complete_upload(&mut self, ticket: Ticket, result: Result<AnalysisResult, ClientError>) {
        if ticket != self.ticket() || self.status != AppStatus::Analyzing {
            debug!("dropping stale upload result");
            return;
        }

        match result {
            Ok(analysis) => {
                let welcome =
                    messages::analysis_welcome(analysis.display_name(), &analysis.predicted_role);
                self.remember_analysis(&analysis);
                self.analysis = Some(analysis);
                self.status = AppStatus::Dashboard;
                self.chat_loading = false;
                self.start_reveal(&welcome, RevealSpeed::Welcome, true);
                info!("analysis ready");
            }
            Err(e) => {
                error!("Resume analysis failed: {e}");
                self.status = AppStatus::Idle;
                self.error = Some(messages::ANALYSIS_FAILED.to_string());
            }
        }
    }

    /// Runs a whole upload against `backend`. Returns the resulting status.
    pub async fn upload(&mut self, backend: &dyn Backend, file: ResumeFile) -> AppStatus {
        let Some(request) = self.begin_upload(file) else {
            return self.status;
        };
        let result = backend.analyze(&request.google_id, request.file).await;
        self.complete_upload(request.ticket, result);
        self.status
    }

    /// The backend stores every analysis it produces; keep the saved session
    /// in step so the next run offers the latest one. The offer on screen
    /// stays as it was, so "Scan New" goes straight to the upload prompt.
    fn remember_analysis(&mut self, analysis: &AnalysisResult) {
        if let Some(session) = self.session.as_mut() {
            session.existing_resume = Some(analysis.clone());
            if let Err(e) = self.sessions.persist(session) {
                warn!("Failed to persist session: {e}");
            }
        }
    }
}
