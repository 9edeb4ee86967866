//! The controller driving one chat exchange end to end.

use tracing::warn;

use crate::client::{ChatRequest, RagClient};
use crate::errors::AssistantError;
use crate::models::message::Message;
use crate::scene::SceneContext;
use crate::session::SessionState;
use crate::settings::Settings;
use crate::stream::HighlightHints;

/// Ties the backend client, the settings, and a session together.
///
/// One `send` call is one exchange: record the user message, stream the
/// reply into a fresh assistant message, seal it, and hand the collected
/// highlight hints back for scene resolution. Exchanges are not serialized
/// against each other beyond the exclusive borrow of the session state.
pub struct Assistant {
    client: RagClient,
    settings: Settings,
}

impl Assistant {
    pub fn new(settings: Settings) -> Result<Self, AssistantError> {
        let client = RagClient::new(&settings)?;
        Ok(Assistant { client, settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn client(&self) -> &RagClient {
        &self.client
    }

    /// Send one prompt and stream the reply into the session.
    ///
    /// Returns the highlight hints collected from the stream; a blank prompt
    /// is a no-op. On failure the assistant message carries the synthesized
    /// error text and the session records it as the last stream error.
    pub async fn send<F>(
        &self,
        state: &mut SessionState,
        prompt: &str,
        context: SceneContext,
        tool: Option<String>,
        on_update: F,
    ) -> Result<HighlightHints, AssistantError>
    where
        F: FnMut(&Message),
    {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Ok(HighlightHints::default());
        }

        state.push(Message::user(prompt).with_tool(tool.clone()));
        let memory = state.memory(&self.settings);
        state.begin_stream();

        let request = ChatRequest {
            model: self.settings.model,
            prompt: prompt.to_string(),
            user: context.user.clone(),
            context,
            memory,
            tool,
        };

        let mut message = Message::assistant_streaming();
        let result = self.client.chat_stream(&request, &mut message, on_update).await;
        let error = result.as_ref().err().map(|_| message.content.clone());
        state.push(message);

        match result {
            Ok(hints) => {
                state.end_stream(None);
                Ok(hints)
            }
            Err(err) => {
                warn!(error = %err, "chat exchange failed");
                state.end_stream(error);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::Role;
    use crate::scene::{TokenEntity, UserInfo};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn viewer() -> UserInfo {
        UserInfo {
            id: "u1".into(),
            name: "Alice".into(),
            is_gm: false,
        }
    }

    fn context() -> SceneContext {
        SceneContext::new(
            None,
            vec![TokenEntity {
                id: "t1".into(),
                name: "Goblin".into(),
                disposition: -1,
                x: 10.0,
                y: 20.0,
                hidden: false,
            }],
            viewer(),
        )
    }

    async fn assistant_for(server: &MockServer) -> Assistant {
        let settings = Settings {
            backend_url: server.uri(),
            ..Settings::default()
        };
        Assistant::new(settings).unwrap()
    }

    #[tokio::test]
    async fn send_records_both_sides_of_the_exchange() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/stream"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "{\"token\":\"Found it.\",\"highlight\":[\"Goblin\"]}\n",
                "application/x-ndjson",
            ))
            .mount(&server)
            .await;

        let assistant = assistant_for(&server).await;
        let mut state = SessionState::new();
        let hints = assistant
            .send(&mut state, "find the goblin", context(), None, |_| {})
            .await
            .unwrap();

        assert!(hints.names.contains("Goblin"));
        assert_eq!(state.messages().len(), 2);
        assert_eq!(state.messages()[0].role, Role::User);
        assert_eq!(state.messages()[0].content, "find the goblin");
        assert_eq!(state.messages()[1].role, Role::Assistant);
        assert_eq!(state.messages()[1].content, "Found it.");
        assert!(!state.is_streaming());
        assert_eq!(state.last_stream_error(), None);
    }

    #[tokio::test]
    async fn memory_window_includes_the_new_user_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/stream"))
            .and(body_partial_json(json!({
                "memory": [{ "role": "user", "content": "find the goblin" }]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("{\"token\":\"ok\"}\n", "application/x-ndjson"),
            )
            .mount(&server)
            .await;

        let assistant = assistant_for(&server).await;
        let mut state = SessionState::new();
        assistant
            .send(&mut state, "find the goblin", context(), None, |_| {})
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn blank_prompt_is_a_noop() {
        let server = MockServer::start().await;
        let assistant = assistant_for(&server).await;
        let mut state = SessionState::new();

        let hints = assistant
            .send(&mut state, "   ", context(), None, |_| {})
            .await
            .unwrap();

        assert!(hints.is_empty());
        assert!(state.messages().is_empty());
        assert!(!state.is_streaming());
    }

    #[tokio::test]
    async fn failed_exchange_records_the_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/stream"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let assistant = assistant_for(&server).await;
        let mut state = SessionState::new();
        let result = assistant
            .send(&mut state, "find the goblin", context(), None, |_| {})
            .await;

        assert!(result.is_err());
        assert_eq!(state.messages().len(), 2);
        assert_eq!(
            state.messages()[1].content,
            "Backend error: 503 overloaded"
        );
        assert!(!state.is_streaming());
        assert_eq!(
            state.last_stream_error(),
            Some("Backend error: 503 overloaded")
        );
    }

    #[tokio::test]
    async fn tool_tag_travels_with_request_and_log() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/stream"))
            .and(body_partial_json(json!({ "tool": "describe-scene" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("{\"token\":\"ok\"}\n", "application/x-ndjson"),
            )
            .mount(&server)
            .await;

        let assistant = assistant_for(&server).await;
        let mut state = SessionState::new();
        assistant
            .send(
                &mut state,
                "what do we see?",
                context(),
                Some("describe-scene".to_string()),
                |_| {},
            )
            .await
            .unwrap();

        assert_eq!(state.messages()[0].tool.as_deref(), Some("describe-scene"));
    }
}
