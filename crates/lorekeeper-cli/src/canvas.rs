//! Terminal rendering surface: announces pans and outlines instead of
//! drawing them, while tracking live effect tags the same way a real canvas
//! would.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use console::style;

use lorekeeper::highlight::{Canvas, OutlineEffect, PanRequest};

#[derive(Default)]
pub struct ConsoleCanvas {
    outlines: Mutex<HashMap<String, HashSet<String>>>,
}

impl ConsoleCanvas {
    pub fn new() -> Self {
        ConsoleCanvas::default()
    }
}

impl Canvas for ConsoleCanvas {
    fn pan_to(&self, pan: PanRequest) {
        println!(
            "{}",
            style(format!(
                "  ⤷ panning to ({:.0}, {:.0}) at {:.1}x",
                pan.x, pan.y, pan.scale
            ))
            .dim()
        );
    }

    fn has_outline(&self, token_id: &str, tag: &str) -> bool {
        self.outlines
            .lock()
            .unwrap()
            .get(token_id)
            .map(|tags| tags.contains(tag))
            .unwrap_or(false)
    }

    fn apply_outline(&self, token_id: &str, effect: OutlineEffect) {
        self.outlines
            .lock()
            .unwrap()
            .entry(token_id.to_string())
            .or_default()
            .insert(effect.tag);
    }

    fn remove_outline(&self, token_id: &str, tag: &str) {
        // the highlight may already be gone; nothing to say either way
        if let Some(tags) = self.outlines.lock().unwrap().get_mut(token_id) {
            tags.remove(tag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorekeeper::highlight::HIGHLIGHT_TAG;

    #[test]
    fn tracks_outline_tags_per_token() {
        let canvas = ConsoleCanvas::new();
        assert!(!canvas.has_outline("t1", HIGHLIGHT_TAG));

        canvas.apply_outline("t1", OutlineEffect::default());
        assert!(canvas.has_outline("t1", HIGHLIGHT_TAG));
        assert!(!canvas.has_outline("t2", HIGHLIGHT_TAG));

        canvas.remove_outline("t1", HIGHLIGHT_TAG);
        assert!(!canvas.has_outline("t1", HIGHLIGHT_TAG));

        // removing twice is fine
        canvas.remove_outline("t1", HIGHLIGHT_TAG);
        canvas.remove_outline("never-there", HIGHLIGHT_TAG);
    }
}
