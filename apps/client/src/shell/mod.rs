//! Application shell: one status value decides which screen renders, and
//! every user action is a method that moves it between states.
//!
//! Network-bound actions are split in two (`begin_*` returns a request,
//! `complete_*` applies its result) so a driver can keep handling events
//! while a request is outstanding. Results carry a [`Ticket`]; anything that
//! resets the shell invalidates older tickets and their late results are
//! dropped.

pub mod chat;
pub mod messages;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_support;

use tracing::{error, info, warn};

use crate::animator::{RevealHandle, RevealSpeed, TypingAnimator};
use crate::api_client::Backend;
use crate::models::{AnalysisResult, ChatLog, ChatMessage, Session};
use crate::session::{token, SessionStore};
use crate::storage::KeyValueStorage;

pub use chat::ChatRequest;
pub use upload::UploadRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppStatus {
    Idle,
    Analyzing,
    Dashboard,
}

/// What the front end should draw right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Upload,
    WelcomeBack,
    Analyzing,
    Dashboard,
}

/// Identifies the shell generation a request was issued in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

pub struct Shell<S> {
    sessions: SessionStore<S>,
    session: Option<Session>,
    status: AppStatus,
    analysis: Option<AnalysisResult>,
    existing_resume: Option<AnalysisResult>,
    chat: ChatLog,
    chat_loading: bool,
    error: Option<String>,
    loading_message: &'static str,
    reveal: Option<RevealHandle>,
    generation: u64,
}

impl<S: KeyValueStorage> Shell<S> {
    pub fn new(storage: S) -> Self {
        Self {
            sessions: SessionStore::new(storage),
            session: None,
            status: AppStatus::Idle,
            analysis: None,
            existing_resume: None,
            chat: ChatLog::new(),
            chat_loading: false,
            error: None,
            loading_message: messages::LOADING_VIBES[0],
            reveal: None,
            generation: 0,
        }
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    pub fn status(&self) -> AppStatus {
        self.status
    }

    pub fn screen(&self) -> Screen {
        if self.session.is_none() {
            return Screen::Login;
        }
        match self.status {
            AppStatus::Idle if self.existing_resume.is_some() => Screen::WelcomeBack,
            AppStatus::Idle => Screen::Upload,
            AppStatus::Analyzing => Screen::Analyzing,
            AppStatus::Dashboard => Screen::Dashboard,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    pub fn existing_resume(&self) -> Option<&AnalysisResult> {
        self.existing_resume.as_ref()
    }

    pub fn chat_history(&self) -> Vec<ChatMessage> {
        self.chat.snapshot()
    }

    pub fn is_chat_loading(&self) -> bool {
        self.chat_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn loading_message(&self) -> &'static str {
        self.loading_message
    }

    pub fn is_revealing(&self) -> bool {
        self.reveal.as_ref().is_some_and(|r| !r.is_finished())
    }

    pub fn sessions(&self) -> &SessionStore<S> {
        &self.sessions
    }

    fn ticket(&self) -> Ticket {
        Ticket(self.generation)
    }

    // ── Session ────────────────────────────────────────────────────────────

    /// Picks up a session persisted by an earlier run. Returns whether one
    /// was found.
    pub fn restore(&mut self) -> bool {
        match self.sessions.restore() {
            Some(session) => {
                info!(user_id = %session.user.id, "session restored");
                self.existing_resume = session.existing_resume.clone();
                self.session = Some(session);
                true
            }
            None => false,
        }
    }

    /// Signs in with a provider credential.
    ///
    /// Backend verification is tried first. If that fails for any reason the
    /// credential is decoded locally and an unverified, unsaved session is
    /// used instead. Returns false only when both paths fail.
    pub async fn login(&mut self, backend: &dyn Backend, credential: &str) -> bool {
        match backend.verify_credential(credential).await {
            Ok(session) => {
                info!(user_id = %session.user.id, "signed in (verified)");
                if let Err(e) = self.sessions.persist(&session) {
                    warn!("Failed to persist session: {e}");
                }
                self.existing_resume = session.existing_resume.clone();
                self.session = Some(session);
                self.error = None;
                true
            }
            Err(e) => {
                error!("Backend verification failed: {e}");
                match token::decode_claims(credential) {
                    Ok(claims) => {
                        warn!(user_id = %claims.sub, "signed in from local token decode; saving disabled");
                        self.session = Some(Session::from(claims));
                        self.error = Some(messages::BACKEND_DISCONNECTED.to_string());
                        true
                    }
                    Err(e) => {
                        error!("Local decode failed: {e}");
                        self.error = Some(messages::LOGIN_FAILED.to_string());
                        false
                    }
                }
            }
        }
    }

    /// The identity provider reported an error before handing over a
    /// credential.
    pub fn login_provider_failed(&mut self) {
        warn!("identity provider login failed");
        self.error = Some(messages::PROVIDER_LOGIN_FAILED.to_string());
    }

    pub fn logout(&mut self) {
        self.invalidate();
        if let Err(e) = self.sessions.clear() {
            warn!("Failed to clear saved session: {e}");
        }
        self.session = None;
        self.analysis = None;
        self.existing_resume = None;
        self.chat.clear();
        self.chat_loading = false;
        self.error = None;
        self.status = AppStatus::Idle;
        info!("signed out");
    }

    // ── Dashboard / idle actions ───────────────────────────────────────────

    /// "Scan New": back to the upload screen with a clean slate.
    pub fn reset(&mut self) {
        self.invalidate();
        self.status = AppStatus::Idle;
        self.analysis = None;
        self.chat.clear();
        self.chat_loading = false;
        self.error = None;
    }

    /// Opens the dashboard on the analysis the backend kept for this user.
    /// No request is made. Returns false if there is nothing to restore.
    pub fn use_existing_resume(&mut self) -> bool {
        let Some(existing) = self.existing_resume.clone() else {
            return false;
        };
        if self.session.is_none() || self.status != AppStatus::Idle {
            return false;
        }
        self.invalidate();
        self.analysis = Some(existing);
        self.status = AppStatus::Dashboard;
        self.chat_loading = false;
        self.error = None;
        self.start_reveal(messages::WELCOME_BACK, RevealSpeed::Welcome, true);
        info!("dashboard opened on stored analysis");
        true
    }

    /// "Upload New One": drop the stored-analysis offer.
    pub fn dismiss_existing_resume(&mut self) {
        self.existing_resume = None;
    }

    // ── Reveal plumbing ────────────────────────────────────────────────────

    /// Cancels the running reveal and starts a new shell generation.
    fn invalidate(&mut self) {
        if let Some(reveal) = self.reveal.take() {
            reveal.cancel();
        }
        self.generation += 1;
    }

    /// Finishes the running reveal instantly so it stops being the last
    /// message before something else is appended.
    fn settle_reveal(&mut self) {
        if let Some(reveal) = self.reveal.take() {
            reveal.settle();
        }
    }

    /// Appends an empty assistant message (or makes it the whole transcript
    /// when `fresh`) and reveals `text` into it.
    fn start_reveal(&mut self, text: &str, speed: RevealSpeed, fresh: bool) {
        let index = if fresh {
            if let Some(reveal) = self.reveal.take() {
                reveal.cancel();
            }
            self.chat.replace(vec![ChatMessage::assistant("")]);
            0
        } else {
            self.settle_reveal();
            self.chat.push(ChatMessage::assistant(""))
        };
        self.reveal = Some(TypingAnimator::start(&self.chat, index, text, speed));
    }

    /// Waits until the current reveal, if any, has written its last frame.
    pub async fn reveal_finished(&mut self) {
        if let Some(reveal) = self.reveal.take() {
            reveal.finished().await;
        }
    }
}
