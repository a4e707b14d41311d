use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only chat transcript shared between the shell and reveal timers.
///
/// The only in-place mutation is [`ChatLog::write_revealed`], which touches
/// a message only while it is still the last one and belongs to the
/// assistant.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    inner: Arc<Mutex<Vec<ChatMessage>>>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ChatMessage>> {
        // A panicking reveal task cannot leave the Vec half-written.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends a message and returns its index.
    pub fn push(&self, message: ChatMessage) -> usize {
        let mut messages = self.lock();
        messages.push(message);
        messages.len() - 1
    }

    /// Replaces the whole transcript.
    pub fn replace(&self, messages: Vec<ChatMessage>) {
        *self.lock() = messages;
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.lock().clone()
    }

    pub fn last(&self) -> Option<ChatMessage> {
        self.lock().last().cloned()
    }

    /// Overwrites the content of the assistant message at `index`.
    ///
    /// Returns false, writing nothing, if `index` is no longer the last
    /// message or is not an assistant message.
    pub fn write_revealed(&self, index: usize, content: &str) -> bool {
        write_last_assistant(&mut self.lock(), index, content)
    }

    /// Like [`ChatLog::write_revealed`], but writes nothing once `stopped`
    /// is set. The flag is read under the transcript lock, so a frame can
    /// never land after whoever set it has written the final text.
    pub fn write_frame(&self, index: usize, content: &str, stopped: &AtomicBool) -> bool {
        let mut messages = self.lock();
        if stopped.load(Ordering::Acquire) {
            return false;
        }
        write_last_assistant(&mut messages, index, content)
    }
}

fn write_last_assistant(messages: &mut [ChatMessage], index: usize, content: &str) -> bool {
    let is_last = messages.len().checked_sub(1) == Some(index);
    match messages.get_mut(index) {
        Some(msg) if is_last && msg.role == Role::Assistant => {
            msg.content.clear();
            msg.content.push_str(content);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_returns_index() {
        let log = ChatLog::new();
        assert_eq!(log.push(ChatMessage::user("hi")), 0);
        assert_eq!(log.push(ChatMessage::assistant("")), 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_write_revealed_updates_last_assistant_message() {
        let log = ChatLog::new();
        log.push(ChatMessage::user("hi"));
        let idx = log.push(ChatMessage::assistant(""));
        assert!(log.write_revealed(idx, "HE"));
        assert_eq!(log.last().unwrap().content, "HE");
        assert_eq!(log.snapshot()[0].content, "hi");
    }

    #[test]
    fn test_write_revealed_refuses_frozen_message() {
        let log = ChatLog::new();
        let idx = log.push(ChatMessage::assistant("done"));
        log.push(ChatMessage::user("next question"));
        assert!(!log.write_revealed(idx, "overwritten"));
        assert_eq!(log.snapshot()[0].content, "done");
    }

    #[test]
    fn test_write_revealed_refuses_user_message() {
        let log = ChatLog::new();
        let idx = log.push(ChatMessage::user("me"));
        assert!(!log.write_revealed(idx, "x"));
    }

    #[test]
    fn test_write_revealed_on_cleared_log_is_noop() {
        let log = ChatLog::new();
        let idx = log.push(ChatMessage::assistant(""));
        log.clear();
        assert!(!log.write_revealed(idx, "H"));
        assert!(log.is_empty());
    }

    #[test]
    fn test_write_frame_refuses_after_stop() {
        let log = ChatLog::new();
        let idx = log.push(ChatMessage::assistant(""));
        let stopped = AtomicBool::new(false);

        assert!(log.write_frame(idx, "H", &stopped));
        stopped.store(true, Ordering::Release);
        assert!(log.write_revealed(idx, "HEY"));
        assert!(!log.write_frame(idx, "HE", &stopped));
        assert_eq!(log.last().unwrap().content, "HEY");
    }

    #[test]
    fn test_clones_share_transcript() {
        let log = ChatLog::new();
        let other = log.clone();
        other.push(ChatMessage::user("shared"));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::assistant("yo")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"yo"}"#);
    }
}
