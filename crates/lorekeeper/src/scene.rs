//! Read-only projection of the host scene graph.
//!
//! The hosting application owns the live scene; what travels to the backend
//! (and what the entity resolver matches against) is this flat snapshot.

use serde::{Deserialize, Serialize};

/// Scene metadata as sent with a chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneInfo {
    pub id: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
}

/// One token on the scene canvas.
///
/// The resolver never mutates these; emphasis is requested through the
/// rendering surface instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenEntity {
    pub id: String,
    pub name: String,
    /// Friend/neutral/hostile marker, -1..=1.
    #[serde(default)]
    pub disposition: i32,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub hidden: bool,
}

/// The requesting user's identity and privilege.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    #[serde(rename = "isGM", default)]
    pub is_gm: bool,
}

/// Everything the backend gets to see about the current scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneContext {
    pub scene: Option<SceneInfo>,
    pub tokens: Vec<TokenEntity>,
    pub user: UserInfo,
}

impl SceneContext {
    pub fn new(scene: Option<SceneInfo>, tokens: Vec<TokenEntity>, user: UserInfo) -> Self {
        SceneContext {
            scene,
            tokens,
            user,
        }
    }
}
