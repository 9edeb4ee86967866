//! Resolves assistant highlight hints against scene tokens and applies the
//! transient outline emphasis.
//!
//! Resolution runs identifier hints first, then name hints, then a free-text
//! scan of the assembled reply; the first shape of hint present wins
//! outright. The matched tokens are filtered by viewer privilege and then
//! emphasized through the host's [`Canvas`] surface: a pan to the first
//! match plus a tagged outline on each, removed again after a fixed delay.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use crate::scene::{TokenEntity, UserInfo};
use crate::stream::HighlightHints;

/// Tag distinguishing assistant outlines from any other canvas effect.
pub const HIGHLIGHT_TAG: &str = "lore-highlight";

/// Outline emphasis applied to matched tokens.
pub const OUTLINE_WIDTH: f32 = 4.0;
pub const OUTLINE_COLOR: u32 = 0xFFFF00;

/// Viewport transition toward the first match.
pub const PAN_SCALE: f32 = 1.5;
pub const PAN_DURATION: Duration = Duration::from_millis(500);

/// How long an outline stays on a token.
pub const HIGHLIGHT_DURATION: Duration = Duration::from_millis(2000);

/// A tagged outline effect as handed to the rendering surface.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineEffect {
    pub tag: String,
    pub width: f32,
    pub color: u32,
}

impl Default for OutlineEffect {
    fn default() -> Self {
        OutlineEffect {
            tag: HIGHLIGHT_TAG.to_string(),
            width: OUTLINE_WIDTH,
            color: OUTLINE_COLOR,
        }
    }
}

/// A request to center the viewport on a point.
#[derive(Debug, Clone, PartialEq)]
pub struct PanRequest {
    pub x: f64,
    pub y: f64,
    pub scale: f32,
    pub duration: Duration,
}

/// The host rendering surface emphasis is applied through.
///
/// Implementations own the actual effect state. Removing an effect that is
/// already gone (token deleted, effects cleared) must be a silent no-op:
/// the delayed removal task races against host state changes.
pub trait Canvas: Send + Sync {
    fn pan_to(&self, pan: PanRequest);
    fn has_outline(&self, token_id: &str, tag: &str) -> bool;
    fn apply_outline(&self, token_id: &str, effect: OutlineEffect);
    fn remove_outline(&self, token_id: &str, tag: &str);
}

/// Select tokens whose id is a member of the hint set. Exact match only.
pub fn select_by_ids<'a>(
    tokens: &'a [TokenEntity],
    ids: &BTreeSet<String>,
) -> Vec<&'a TokenEntity> {
    tokens.iter().filter(|token| ids.contains(&token.id)).collect()
}

/// Select tokens by display name, case-insensitively.
///
/// An exact name match is preferred; failing that, a hint appearing inside
/// the name is enough. Both kinds land in one combined selection.
pub fn select_by_names<'a>(
    tokens: &'a [TokenEntity],
    names: &BTreeSet<String>,
) -> Vec<&'a TokenEntity> {
    let hints: Vec<String> = names.iter().map(|name| name.to_lowercase()).collect();
    tokens
        .iter()
        .filter(|token| {
            let name = token.name.to_lowercase();
            if hints.iter().any(|hint| *hint == name) {
                return true;
            }
            hints.iter().any(|hint| name.contains(hint.as_str()))
        })
        .collect()
}

/// Fall back to scanning the assembled reply text for token names.
///
/// A token matches when its whole name appears in the text, or any single
/// word of its name longer than three characters does; short words carry too
/// little signal.
pub fn infer_from_text<'a>(tokens: &'a [TokenEntity], text: &str) -> Vec<&'a TokenEntity> {
    let text = text.to_lowercase();
    tokens
        .iter()
        .filter(|token| {
            let name = token.name.to_lowercase();
            if name.is_empty() {
                return false;
            }
            if text.contains(name.as_str()) {
                return true;
            }
            name.split_whitespace()
                .filter(|word| word.chars().count() > 3)
                .any(|word| text.contains(word))
        })
        .collect()
}

/// Resolve hints (or the fallback reply text) into the tokens to emphasize.
///
/// Identifier hints preempt name hints, which preempt text inference. The
/// branch is chosen by which hint sets are populated, not by which one
/// happens to match something.
pub fn resolve<'a>(
    tokens: &'a [TokenEntity],
    hints: &HighlightHints,
    text: &str,
) -> Vec<&'a TokenEntity> {
    if !hints.ids.is_empty() {
        select_by_ids(tokens, &hints.ids)
    } else if !hints.names.is_empty() {
        select_by_names(tokens, &hints.names)
    } else {
        infer_from_text(tokens, text)
    }
}

/// Drop tokens the viewer is not allowed to see. GMs see everything.
pub fn visible_to<'a>(
    selection: Vec<&'a TokenEntity>,
    viewer: &UserInfo,
) -> Vec<&'a TokenEntity> {
    if viewer.is_gm {
        return selection;
    }
    selection.into_iter().filter(|token| !token.hidden).collect()
}

/// Applies the transient emphasis for a resolved selection.
pub struct Highlighter {
    canvas: Arc<dyn Canvas>,
}

impl Highlighter {
    pub fn new(canvas: Arc<dyn Canvas>) -> Self {
        Highlighter { canvas }
    }

    /// Resolve hints against the scene and emphasize the matches the viewer
    /// may see. Returns the ids of the emphasized tokens, in selection
    /// order; an empty result means the whole call was a no-op.
    pub fn highlight(
        &self,
        tokens: &[TokenEntity],
        hints: &HighlightHints,
        text: &str,
        viewer: &UserInfo,
    ) -> Vec<String> {
        let selection = visible_to(resolve(tokens, hints, text), viewer);
        if selection.is_empty() {
            return Vec::new();
        }

        let first = selection[0];
        self.canvas.pan_to(PanRequest {
            x: first.x,
            y: first.y,
            scale: PAN_SCALE,
            duration: PAN_DURATION,
        });

        for token in &selection {
            if self.canvas.has_outline(&token.id, HIGHLIGHT_TAG) {
                // an emphasis from an earlier reply is still active
                continue;
            }
            self.canvas
                .apply_outline(&token.id, OutlineEffect::default());
            self.schedule_removal(token.id.clone());
        }

        selection.iter().map(|token| token.id.clone()).collect()
    }

    fn schedule_removal(&self, token_id: String) {
        let canvas = Arc::clone(&self.canvas);
        tokio::spawn(async move {
            tokio::time::sleep(HIGHLIGHT_DURATION).await;
            canvas.remove_outline(&token_id, HIGHLIGHT_TAG);
        });
    }
}
