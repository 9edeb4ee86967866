//! Persisted assistant configuration.
//!
//! Settings layer defaults, an optional `lorekeeper.toml` in the user config
//! directory, and `LOREKEEPER_*` environment variables, in that order. The
//! memory window is clamped to the range the panel exposes.

use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::errors::AssistantError;

pub const MEMORY_SIZE_MIN: usize = 5;
pub const MEMORY_SIZE_MAX: usize = 100;

/// Models the backend can route prompts to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ModelChoice {
    #[default]
    Llama3,
    Mistral,
    Phi3,
    Qwen2,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Base URL of the RAG backend service.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Bearer token for the backend; empty or missing means unauthenticated.
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub model: ModelChoice,
    /// Send recent panel messages along as conversational memory.
    #[serde(default = "default_memory_enabled")]
    pub memory_enabled: bool,
    /// How many recent messages the memory window holds.
    #[serde(default = "default_memory_size")]
    pub memory_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            backend_url: default_backend_url(),
            auth_token: None,
            model: ModelChoice::default(),
            memory_enabled: default_memory_enabled(),
            memory_size: default_memory_size(),
        }
    }
}

impl Settings {
    /// Load settings from the config file (if present) and the environment.
    pub fn load() -> Result<Self, AssistantError> {
        Self::load_from(config_file())
    }

    fn load_from(file: Option<PathBuf>) -> Result<Self, AssistantError> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(false));
        }
        let config = builder
            .add_source(Environment::with_prefix("LOREKEEPER").try_parsing(true))
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;
        settings.memory_size = settings.memory_size.clamp(MEMORY_SIZE_MIN, MEMORY_SIZE_MAX);
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), AssistantError> {
        url::Url::parse(&self.backend_url)
            .map_err(|err| AssistantError::InvalidSetting(format!("backend_url: {err}")))?;
        Ok(())
    }

    /// Backend base URL without trailing slashes.
    pub fn backend_base(&self) -> &str {
        self.backend_url.trim_end_matches('/')
    }

    /// Auth token with surrounding whitespace removed; `None` when blank.
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

fn config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("lorekeeper").join("lorekeeper.toml"))
}

fn default_backend_url() -> String {
    "https://foundry.dmathome.com/rag".to_string()
}

fn default_memory_enabled() -> bool {
    true
}

fn default_memory_size() -> usize {
    20
}
