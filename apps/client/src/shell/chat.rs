use tracing::{debug, error};

use super::{messages, AppStatus, Shell, Ticket};
use crate::animator::RevealSpeed;
use crate::api_client::Backend;
use crate::errors::ClientError;
use crate::models::{AnalysisResult, ChatMessage};
use crate::storage::KeyValueStorage;

/// A chat turn the shell has admitted; the caller performs the request.
#[derive(Debug)]
pub struct ChatRequest {
    pub ticket: Ticket,
    pub message: String,
    /// The full active analysis, sent along as context.
    pub context: AnalysisResult,
}

impl<S: KeyValueStorage> Shell<S> {
    /// Admits a chat message.
    ///
    /// Returns `None` and changes nothing when the input is blank, a reply is
    /// still pending, or there is no active analysis. A second send while one
    /// is in flight is dropped, not queued.
    pub fn begin_send(&mut self, input: &str) -> Option<ChatRequest> {
        if input.trim().is_empty() || self.chat_loading || self.status != AppStatus::Dashboard {
            return None;
        }
        let context = self.analysis.clone()?;

        self.settle_reveal();
        self.chat.push(ChatMessage::user(input));
        self.chat_loading = true;
        debug!(chars = input.chars().count(), "chat message sent");

        Some(ChatRequest {
            ticket: self.ticket(),
            message: input.to_string(),
            context,
        })
    }

    /// Applies the backend's answer to an admitted message.
    pub fn complete_send(&mut self, ticket: Ticket, result: Result<String, ClientError>) {
        if ticket != self.ticket() || !self.chat_loading {
            debug!("dropping stale chat reply");
            return;
        }
        self.chat_loading = false;

        match result {
            Ok(reply) => self.start_reveal(&reply, RevealSpeed::Reply, false),
            Err(e) => {
                error!("Chat request failed: {e}");
                self.settle_reveal();
                self.chat.push(ChatMessage::assistant(messages::CHAT_FAILED));
            }
        }
    }

    /// Runs a whole chat turn against `backend`. Returns whether the message
    /// was admitted.
    pub async fn send(&mut self, backend: &dyn Backend, input: &str) -> bool {
        let Some(request) = self.begin_send(input) else {
            return false;
        };
        let result = backend.chat(&request.message, &request.context).await;
        self.complete_send(request.ticket, result);
        true
    }
}
