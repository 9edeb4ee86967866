//! In-memory state for one assistant panel session.

use crate::models::message::Message;
use crate::settings::Settings;

/// The message log and streaming status of a panel.
///
/// Owned by the front end and passed into the controller explicitly; there
/// is no global session.
#[derive(Debug, Default)]
pub struct SessionState {
    messages: Vec<Message>,
    streaming: bool,
    last_stream_error: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        SessionState::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// True while a chat exchange is in flight.
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// The synthesized error text of the most recent failed exchange, if the
    /// last exchange failed.
    pub fn last_stream_error(&self) -> Option<&str> {
        self.last_stream_error.as_deref()
    }

    pub(crate) fn begin_stream(&mut self) {
        self.streaming = true;
        self.last_stream_error = None;
    }

    pub(crate) fn end_stream(&mut self, error: Option<String>) {
        self.streaming = false;
        self.last_stream_error = error;
    }

    /// The trailing window of messages sent along as conversational memory.
    /// Empty when memory is disabled.
    pub fn memory(&self, settings: &Settings) -> Vec<Message> {
        if !settings.memory_enabled {
            return Vec::new();
        }
        let start = self.messages.len().saturating_sub(settings.memory_size);
        self.messages[start..].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(enabled: bool, size: usize) -> Settings {
        Settings {
            memory_enabled: enabled,
            memory_size: size,
            ..Settings::default()
        }
    }

    #[test]
    fn memory_returns_trailing_window() {
        let mut state = SessionState::new();
        for i in 0..10 {
            state.push(Message::user(format!("msg {i}")));
        }

        let memory = state.memory(&settings(true, 5));
        assert_eq!(memory.len(), 5);
        assert_eq!(memory[0].content, "msg 5");
        assert_eq!(memory[4].content, "msg 9");
    }

    #[test]
    fn memory_is_empty_when_disabled() {
        let mut state = SessionState::new();
        state.push(Message::user("hello"));
        assert!(state.memory(&settings(false, 5)).is_empty());
    }

    #[test]
    fn memory_handles_short_logs() {
        let mut state = SessionState::new();
        state.push(Message::user("only one"));
        assert_eq!(state.memory(&settings(true, 20)).len(), 1);
    }

    #[test]
    fn stream_lifecycle_tracks_error_state() {
        let mut state = SessionState::new();
        assert!(!state.is_streaming());

        state.begin_stream();
        assert!(state.is_streaming());
        assert_eq!(state.last_stream_error(), None);

        state.end_stream(Some("Backend error: 502 ".to_string()));
        assert!(!state.is_streaming());
        assert_eq!(state.last_stream_error(), Some("Backend error: 502 "));

        // a new exchange clears the previous failure
        state.begin_stream();
        assert_eq!(state.last_stream_error(), None);
        state.end_stream(None);
        assert_eq!(state.last_stream_error(), None);
    }
}
