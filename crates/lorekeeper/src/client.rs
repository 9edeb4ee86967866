//! HTTP surface of the RAG backend.
//!
//! One client per backend: an owned `reqwest::Client` with a timeout, the
//! trimmed base URL, and an optional bearer token attached to every request.
//! The streaming chat endpoint is driven through [`StreamDecoder`]; the rest
//! are plain JSON calls. Nothing here retries: a failed exchange is reported
//! and the user resubmits.

use std::time::Duration;

use futures::StreamExt;
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::errors::AssistantError;
use crate::models::message::Message;
use crate::scene::{SceneContext, SceneInfo, UserInfo};
use crate::settings::{ModelChoice, Settings};
use crate::stream::{HighlightHints, StreamDecoder, UpdateThrottle};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Body of a streaming chat request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: ModelChoice,
    pub prompt: String,
    pub context: SceneContext,
    pub memory: Vec<Message>,
    pub tool: Option<String>,
    pub user: UserInfo,
}

/// Body of the simpler non-streaming chat surface.
#[derive(Debug, Serialize)]
struct SidebarChatRequest<'a> {
    content: &'a str,
    scene: Option<SceneRef<'a>>,
}

#[derive(Debug, Serialize)]
struct SceneRef<'a> {
    id: &'a str,
    name: &'a str,
}

/// One retrieved chunk as reported by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct RagChunk {
    pub payload: Value,
    pub score: f64,
}

#[derive(Debug, Deserialize)]
struct ChunksResponse {
    #[serde(default)]
    chunks: Vec<RagChunk>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    models: Vec<String>,
}

/// A journal document pushed into the retrieval index.
#[derive(Debug, Clone, Serialize)]
pub struct JournalEntry {
    pub id: String,
    pub name: String,
    pub text: String,
    #[serde(rename = "sceneId")]
    pub scene_id: Option<String>,
}

pub struct RagClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl RagClient {
    pub fn new(settings: &Settings) -> Result<Self, AssistantError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(RagClient {
            client,
            base_url: settings.backend_base().to_string(),
            auth_token: settings.auth_token().map(str::to_owned),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, url);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        request
    }

    /// Stream a chat reply into `message`, invoking `on_update` (rate
    /// limited) as content arrives.
    ///
    /// On transport failure or a non-success status the message content is
    /// replaced with a synthesized error string, the message is sealed, and
    /// the error is returned; no partial decoding happens after a fault.
    pub async fn chat_stream<F>(
        &self,
        request: &ChatRequest,
        message: &mut Message,
        mut on_update: F,
    ) -> Result<HighlightHints, AssistantError>
    where
        F: FnMut(&Message),
    {
        debug!(prompt = %request.prompt, "sending chat stream request");
        let response = match self
            .request(Method::POST, "/chat/stream")
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                message.fail(format!("Request failed: {err}"));
                return Err(err.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            message.fail(format!("Backend error: {} {}", status.as_u16(), body));
            return Err(AssistantError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let mut decoder = StreamDecoder::new();
        let mut throttle = UpdateThrottle::default();
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => {
                    decoder.feed(&bytes, message);
                    if throttle.ready() {
                        on_update(message);
                    }
                }
                Err(err) => {
                    message.fail(format!("Request failed: {err}"));
                    return Err(err.into());
                }
            }
        }

        let hints = decoder.finish(message);
        message.finish();
        on_update(message);
        Ok(hints)
    }

    /// Ask the sidebar's non-streaming chat endpoint and return the trimmed
    /// reply text.
    pub async fn chat(
        &self,
        content: &str,
        scene: Option<&SceneInfo>,
    ) -> Result<String, AssistantError> {
        let body = SidebarChatRequest {
            content,
            scene: scene.map(|scene| SceneRef {
                id: &scene.id,
                name: &scene.name,
            }),
        };
        let response = self
            .request(Method::POST, "/chat")
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::Backend {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.text().await?.trim().to_string())
    }

    /// List the models the backend can serve.
    pub async fn models(&self) -> Result<Vec<String>, AssistantError> {
        let response = self.request(Method::GET, "/models").send().await?;
        let models: ModelsResponse = Self::expect_json(response).await?;
        Ok(models.models)
    }

    /// Fetch the chunks currently held in the retrieval index.
    pub async fn chunks(&self) -> Result<Vec<RagChunk>, AssistantError> {
        let response = self.request(Method::GET, "/chunks").send().await?;
        let chunks: ChunksResponse = Self::expect_json(response).await?;
        Ok(chunks.chunks)
    }

    /// Ingest the document behind a URL into the retrieval index.
    pub async fn ingest_url(
        &self,
        url: &str,
        scene_id: Option<&str>,
    ) -> Result<(), AssistantError> {
        let body = json!({ "url": url, "sceneId": scene_id });
        self.expect_success(self.request(Method::POST, "/ingest").json(&body))
            .await
    }

    /// Ingest one journal document into the retrieval index.
    pub async fn ingest_journal(&self, entry: &JournalEntry) -> Result<(), AssistantError> {
        self.expect_success(self.request(Method::POST, "/ingest/journal").json(entry))
            .await
    }

    /// Drop everything the backend remembers about a scene.
    pub async fn clear_scene(&self, scene_id: &str) -> Result<(), AssistantError> {
        let body = json!({ "sceneId": scene_id });
        self.expect_success(self.request(Method::POST, "/clear-scene").json(&body))
            .await
    }

    async fn expect_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AssistantError> {
        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::Backend {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response.json().await?)
    }

    async fn expect_success(&self, request: RequestBuilder) -> Result<(), AssistantError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::Backend {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}
