use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::role::Role;

/// A message in the assistant panel log.
///
/// Assistant replies arrive incrementally: the message is created with
/// `streaming` set, `content` grows by appends only, and [`Message::finish`]
/// seals it. A failed exchange replaces the content with an error string via
/// [`Message::fail`], which also seals the message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Unix timestamp of creation.
    pub created: i64,
    #[serde(default)]
    pub streaming: bool,
    /// The GM tool that produced the prompt, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

impl Message {
    /// Create a completed user message with the current timestamp.
    pub fn user<S: Into<String>>(content: S) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
            created: Utc::now().timestamp(),
            streaming: false,
            tool: None,
        }
    }

    /// Create a completed assistant message with the current timestamp.
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Message {
            role: Role::Assistant,
            content: content.into(),
            created: Utc::now().timestamp(),
            streaming: false,
            tool: None,
        }
    }

    /// Create an empty assistant message that is still receiving content.
    pub fn assistant_streaming() -> Self {
        Message {
            role: Role::Assistant,
            content: String::new(),
            created: Utc::now().timestamp(),
            streaming: true,
            tool: None,
        }
    }

    /// Tag the message with the tool that produced it.
    pub fn with_tool(mut self, tool: Option<String>) -> Self {
        self.tool = tool;
        self
    }

    /// Append a piece of streamed reply text. Content only grows while the
    /// message is streaming.
    pub fn push_token(&mut self, token: &str) {
        debug_assert!(self.streaming, "append to a sealed message");
        self.content.push_str(token);
    }

    /// Seal the message; content is immutable afterwards.
    pub fn finish(&mut self) {
        self.streaming = false;
    }

    /// Replace the content with a terminal error description and seal the
    /// message.
    pub fn fail<S: Into<String>>(&mut self, error: S) {
        self.content = error.into();
        self.streaming = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streaming_message_accumulates_tokens() {
        let mut message = Message::assistant_streaming();
        assert!(message.streaming);
        assert_eq!(message.content, "");

        message.push_token("The ");
        message.push_token("goblin");
        assert_eq!(message.content, "The goblin");

        message.finish();
        assert!(!message.streaming);
    }

    #[test]
    fn fail_replaces_content_and_seals() {
        let mut message = Message::assistant_streaming();
        message.push_token("partial");
        message.fail("Backend error: 502 bad gateway");

        assert_eq!(message.content, "Backend error: 502 bad gateway");
        assert!(!message.streaming);
    }

    #[test]
    fn user_message_carries_tool_tag() {
        let message = Message::user("burn it down").with_tool(Some("fireball".into()));
        assert_eq!(message.tool.as_deref(), Some("fireball"));
        assert_eq!(message.role, Role::User);
        assert!(!message.streaming);
    }

    #[test]
    fn serializes_roles_lowercase() {
        let value = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(value["role"], "user");
        assert_eq!(value["content"], "hi");
        // completed messages do not carry a tool field
        assert!(value.get("tool").is_none());
    }
}
