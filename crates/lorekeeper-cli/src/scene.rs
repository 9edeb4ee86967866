//! Scene files stand in for the host scene graph.
//!
//! A scene file is a JSON document with optional `scene` metadata, a `tokens`
//! array, and an optional default `user`; command-line flags override the
//! viewer identity.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use lorekeeper::scene::{SceneContext, SceneInfo, TokenEntity, UserInfo};

#[derive(Debug, Default, Deserialize)]
struct SceneFile {
    scene: Option<SceneInfo>,
    #[serde(default)]
    tokens: Vec<TokenEntity>,
    user: Option<UserInfo>,
}

/// The loaded scene plus the viewer driving this run.
#[derive(Debug)]
pub struct Stage {
    pub scene: Option<SceneInfo>,
    pub tokens: Vec<TokenEntity>,
    pub user: UserInfo,
}

impl Stage {
    /// Load a scene file if one was given; without one the stage is empty
    /// and only chat (no highlighting) is useful.
    pub fn load(path: Option<&Path>, user_name: &str, is_gm: bool) -> Result<Self> {
        let file = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading scene file {}", path.display()))?;
                serde_json::from_str::<SceneFile>(&raw)
                    .with_context(|| format!("parsing scene file {}", path.display()))?
            }
            None => SceneFile::default(),
        };

        let user = match file.user {
            // flags take precedence over whatever the file says
            Some(user) if user_name == "Player" && !is_gm => user,
            _ => UserInfo {
                id: if is_gm { "gm" } else { "player" }.to_string(),
                name: user_name.to_string(),
                is_gm,
            },
        };

        Ok(Stage {
            scene: file.scene,
            tokens: file.tokens,
            user,
        })
    }

    pub fn context(&self) -> SceneContext {
        SceneContext::new(self.scene.clone(), self.tokens.clone(), self.user.clone())
    }

    pub fn scene_id(&self) -> Option<&str> {
        self.scene.as_ref().map(|scene| scene.id.as_str())
    }

    /// Display name for a token id, for announcing highlights.
    pub fn token_name(&self, id: &str) -> Option<&str> {
        self.tokens
            .iter()
            .find(|token| token.id == id)
            .map(|token| token.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_tokens_and_scene_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
                "scene": {{ "id": "s1", "name": "Cave", "width": 4000, "height": 3000 }},
                "tokens": [
                    {{ "id": "t1", "name": "Goblin", "x": 1.0, "y": 2.0, "hidden": true }}
                ]
            }}"#
        )
        .unwrap();

        let stage = Stage::load(Some(&path), "Player", false).unwrap();
        assert_eq!(stage.scene_id(), Some("s1"));
        assert_eq!(stage.tokens.len(), 1);
        assert!(stage.tokens[0].hidden);
        assert_eq!(stage.token_name("t1"), Some("Goblin"));
        assert!(!stage.user.is_gm);
    }

    #[test]
    fn missing_file_argument_means_empty_stage() {
        let stage = Stage::load(None, "Morgan", true).unwrap();
        assert!(stage.tokens.is_empty());
        assert!(stage.scene.is_none());
        assert!(stage.user.is_gm);
        assert_eq!(stage.user.name, "Morgan");
    }

    #[test]
    fn gm_flag_overrides_file_user() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{ "tokens": [], "user": {{ "id": "u9", "name": "FileUser", "isGM": false }} }}"#
        )
        .unwrap();

        let stage = Stage::load(Some(&path), "Player", true).unwrap();
        assert!(stage.user.is_gm);

        let stage = Stage::load(Some(&path), "Player", false).unwrap();
        assert_eq!(stage.user.name, "FileUser");
    }
}
