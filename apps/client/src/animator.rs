//! Typing reveal: shows a string one character at a time in the last chat
//! message.
//!
//! [`Reveal`] produces the frames. [`TypingAnimator::start`] drives them from a
//! tokio interval and hands back a [`RevealHandle`] that every reset path
//! must cancel (or settle) before it clears the transcript.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::models::ChatLog;

/// The two reveal paces the shell uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealSpeed {
    /// Greeting after an analysis lands or a stored one is restored.
    Welcome,
    /// Assistant chat replies.
    Reply,
}

impl RevealSpeed {
    pub fn period(self) -> Duration {
        match self {
            RevealSpeed::Welcome => Duration::from_millis(12),
            RevealSpeed::Reply => Duration::from_millis(8),
        }
    }
}

/// Growing prefixes of a string, one `char` longer each step.
#[derive(Debug, Clone)]
pub struct Reveal {
    chars: Vec<char>,
    shown: usize,
}

impl Reveal {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            shown: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.shown >= self.chars.len()
    }
}

impl Iterator for Reveal {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.is_complete() {
            return None;
        }
        self.shown += 1;
        Some(self.chars[..self.shown].iter().collect())
    }
}

pub struct TypingAnimator;

impl TypingAnimator {
    /// Starts revealing `text` into the message at `index`, which the caller
    /// must have just appended as an empty assistant message.
    ///
    /// The first character appears one period after the call. Must be called
    /// inside a tokio runtime.
    pub fn start(chat: &ChatLog, index: usize, text: &str, speed: RevealSpeed) -> RevealHandle {
        let period = speed.period();
        let frames = Reveal::new(text);
        let target = chat.clone();
        let stopped = Arc::new(AtomicBool::new(false));
        let task_stopped = Arc::clone(&stopped);

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            for frame in frames {
                ticker.tick().await;
                if !target.write_frame(index, &frame, &task_stopped) {
                    debug!(index, "reveal target is gone, stopping");
                    return;
                }
            }
        });

        RevealHandle {
            task,
            stopped,
            chat: chat.clone(),
            index,
            text: text.to_string(),
        }
    }
}

/// Owner of a running reveal. Dropping it stops the timer.
///
/// `abort` alone does not stop a frame already past its tick on another
/// worker, so every stop also raises `stopped`, which the task checks under
/// the transcript lock.
#[derive(Debug)]
pub struct RevealHandle {
    task: JoinHandle<()>,
    stopped: Arc<AtomicBool>,
    chat: ChatLog,
    index: usize,
    text: String,
}

impl RevealHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the timer, leaving whatever was revealed so far.
    pub fn cancel(self) {
        self.stop();
    }

    /// Stops the timer and writes the full text, as if the reveal had
    /// finished. Used before appending a newer message.
    pub fn settle(self) {
        self.stop();
        self.chat.write_revealed(self.index, &self.text);
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        self.task.abort();
    }

    /// Waits for the reveal to run to completion.
    pub async fn finished(mut self) {
        // Aborted and panicked tasks both count as done.
        let _ = (&mut self.task).await;
    }
}

impl Drop for RevealHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatMessage;

    #[test]
    fn test_reveal_frames_grow_one_char_at_a_time() {
        let frames: Vec<String> = Reveal::new("HEY").collect();
        assert_eq!(frames, vec!["H", "HE", "HEY"]);
    }

    #[test]
    fn test_reveal_counts_unicode_scalars() {
        let frames: Vec<String> = Reveal::new("a✨b").collect();
        assert_eq!(frames, vec!["a", "a✨", "a✨b"]);
    }

    #[test]
    fn test_reveal_of_empty_string_is_complete() {
        let mut reveal = Reveal::new("");
        assert!(reveal.is_complete());
        assert_eq!(reveal.next(), None);
    }

    #[test]
    fn test_welcome_is_slower_than_reply() {
        assert!(RevealSpeed::Welcome.period() > RevealSpeed::Reply.period());
    }

    #[tokio::test(start_paused = true)]
    async fn test_animator_reveals_hey_frame_by_frame() {
        let chat = ChatLog::new();
        chat.push(ChatMessage::user("hello"));
        let idx = chat.push(ChatMessage::assistant(""));
        let period = RevealSpeed::Reply.period();

        let handle = TypingAnimator::start(&chat, idx, "HEY", RevealSpeed::Reply);
        assert_eq!(chat.last().unwrap().content, "");

        // Sample halfway between ticks.
        tokio::time::sleep(period / 2).await;
        let mut seen = Vec::new();
        for _ in 0..3 {
            tokio::time::sleep(period).await;
            seen.push(chat.last().unwrap().content);
        }
        assert_eq!(seen, vec!["H", "HE", "HEY"]);
        assert_eq!(chat.snapshot()[0].content, "hello");

        handle.finished().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_mid_reveal() {
        let chat = ChatLog::new();
        let idx = chat.push(ChatMessage::assistant(""));
        let period = RevealSpeed::Welcome.period();

        let handle = TypingAnimator::start(&chat, idx, "HELLO", RevealSpeed::Welcome);
        tokio::time::sleep(period * 2 + period / 2).await;
        handle.cancel();
        tokio::time::sleep(period * 10).await;

        assert_eq!(chat.last().unwrap().content, "HE");
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_writes_full_text_immediately() {
        let chat = ChatLog::new();
        let idx = chat.push(ChatMessage::assistant(""));

        let handle = TypingAnimator::start(&chat, idx, "Done already", RevealSpeed::Reply);
        handle.settle();

        assert_eq!(chat.last().unwrap().content, "Done already");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_settle_mid_reveal_keeps_full_text_on_multi_thread_runtime() {
        let text = "a reply long enough to still be typing when settled";
        for _ in 0..20 {
            let chat = ChatLog::new();
            let idx = chat.push(ChatMessage::assistant(""));

            let handle = TypingAnimator::start(&chat, idx, text, RevealSpeed::Reply);
            tokio::time::sleep(RevealSpeed::Reply.period() * 3).await;
            handle.settle();
            chat.push(ChatMessage::user("next"));
            tokio::time::sleep(RevealSpeed::Reply.period() * 2).await;

            assert_eq!(chat.snapshot()[idx].content, text);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_stops_when_transcript_cleared() {
        let chat = ChatLog::new();
        let idx = chat.push(ChatMessage::assistant(""));
        let period = RevealSpeed::Reply.period();

        let handle = TypingAnimator::start(&chat, idx, "long reply", RevealSpeed::Reply);
        tokio::time::sleep(period + period / 2).await;
        chat.clear();
        tokio::time::sleep(period * 2).await;

        assert!(chat.is_empty());
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_cancels_timer() {
        let chat = ChatLog::new();
        let idx = chat.push(ChatMessage::assistant(""));
        let period = RevealSpeed::Reply.period();

        drop(TypingAnimator::start(&chat, idx, "abc", RevealSpeed::Reply));
        tokio::time::sleep(period * 5).await;

        assert_eq!(chat.last().unwrap().content, "");
    }
}
