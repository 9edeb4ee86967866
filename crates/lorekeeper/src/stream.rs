//! Incremental decoding of the newline-delimited JSON chat stream.
//!
//! The backend emits one JSON object per line, each optionally carrying a
//! piece of reply text and/or a list of entity highlight hints:
//! ```text
//! {"token":"The "}
//! {"token":"goblin "}
//! {"token":"is here.","highlight":["Goblin"]}
//! ```
//!
//! Chunk boundaries on the response body are arbitrary: a chunk may end in
//! the middle of a UTF-8 sequence or a line, so both are reassembled here.
//! A line that does not parse as a JSON object is kept as literal reply text
//! rather than dropped.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::models::message::Message;

lazy_static! {
    /// Opaque entity identifiers are fixed-length alphanumeric strings;
    /// anything else in a highlight list is a display name.
    static ref ENTITY_ID: Regex = Regex::new("^[A-Za-z0-9]{16}$").unwrap();
}

/// Minimum interval between re-render notifications while streaming.
pub const UPDATE_INTERVAL: Duration = Duration::from_millis(40);

/// One parsed line of the chat stream.
///
/// Fields are explicitly absent rather than type-sniffed: parsing validates
/// the shape once at this boundary and downstream code matches on `Option`.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRecord {
    /// Reply text to append to the in-flight message.
    pub token: Option<String>,
    /// Entity hints (opaque identifiers or display names).
    pub highlight: Option<Vec<String>>,
}

impl StreamRecord {
    /// Parse one trimmed stream line.
    ///
    /// Returns `None` unless the line is a JSON object. A `token` field that
    /// is not a string, or non-string elements of `highlight`, are treated as
    /// absent rather than as errors.
    pub fn parse(line: &str) -> Option<StreamRecord> {
        let value: Value = serde_json::from_str(line).ok()?;
        let object = value.as_object()?;

        let token = object
            .get("token")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let highlight = object.get("highlight").and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect()
        });

        Some(StreamRecord { token, highlight })
    }
}

/// Entity hints accumulated over a whole stream, deduplicated and split by
/// shape: identifier-shaped hints match tokens by id, the rest by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightHints {
    pub ids: BTreeSet<String>,
    pub names: BTreeSet<String>,
}

impl HighlightHints {
    pub fn insert(&mut self, hint: &str) {
        if ENTITY_ID.is_match(hint) {
            self.ids.insert(hint.to_owned());
        } else {
            self.names.insert(hint.to_owned());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.names.is_empty()
    }
}

/// Reassembles stream records from arbitrarily chunked response bytes and
/// applies them to the in-flight message.
///
/// Feed body chunks with [`StreamDecoder::feed`]; when the body ends, call
/// [`StreamDecoder::finish`] to flush a final unterminated line and take the
/// accumulated hints.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    /// Bytes of an incomplete UTF-8 sequence at the end of the last chunk.
    pending_bytes: Vec<u8>,
    /// Decoded text not yet terminated by a newline.
    pending_text: String,
    hints: HighlightHints,
}

impl StreamDecoder {
    pub fn new() -> Self {
        StreamDecoder::default()
    }

    /// Feed one chunk of the response body, applying every complete line to
    /// `message` in arrival order.
    pub fn feed(&mut self, chunk: &[u8], message: &mut Message) {
        self.decode(chunk);
        while let Some(pos) = self.pending_text.find('\n') {
            let line = self.pending_text[..pos].trim().to_owned();
            self.pending_text.drain(..=pos);
            self.apply_line(&line, message);
        }
    }

    /// Flush any remaining buffered text as one final candidate line and
    /// return the hints collected over the stream.
    pub fn finish(mut self, message: &mut Message) -> HighlightHints {
        if !self.pending_bytes.is_empty() {
            // a sequence still incomplete at end of stream is invalid input
            let tail = std::mem::take(&mut self.pending_bytes);
            self.pending_text.push_str(&String::from_utf8_lossy(&tail));
        }
        let rest = std::mem::take(&mut self.pending_text);
        let line = rest.trim();
        if !line.is_empty() {
            self.apply_line(line, message);
        }
        self.hints
    }

    /// Decode as much buffered input as possible, keeping an incomplete
    /// trailing multi-byte sequence for the next chunk. Invalid sequences
    /// become U+FFFD.
    fn decode(&mut self, chunk: &[u8]) {
        self.pending_bytes.extend_from_slice(chunk);
        let buffered = std::mem::take(&mut self.pending_bytes);
        let mut rest = buffered.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.pending_text.push_str(text);
                    rest = &[];
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    self.pending_text
                        .push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match err.error_len() {
                        Some(bad) => {
                            self.pending_text.push('\u{FFFD}');
                            rest = &after[bad..];
                        }
                        None => {
                            // sequence continues in the next chunk
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }
        self.pending_bytes = rest.to_vec();
    }

    fn apply_line(&mut self, line: &str, message: &mut Message) {
        if line.is_empty() {
            return;
        }
        match StreamRecord::parse(line) {
            Some(record) => {
                if let Some(token) = record.token {
                    message.push_token(&token);
                }
                if let Some(hints) = record.highlight {
                    for hint in hints {
                        self.hints.insert(&hint);
                    }
                }
            }
            // not a record: keep the text rather than dropping it
            None => message.push_token(line),
        }
    }
}

/// Rate limiter for re-render notifications during streaming.
///
/// Bounds how often the front end is asked to repaint, independent of token
/// arrival rate. Purely a pacing concern; skipping it changes nothing but
/// notification frequency.
#[derive(Debug)]
pub struct UpdateThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl UpdateThrottle {
    pub fn new(interval: Duration) -> Self {
        UpdateThrottle {
            interval,
            last: None,
        }
    }

    /// True when enough time has passed since the last permitted update; the
    /// first call is always permitted.
    pub fn ready(&mut self) -> bool {
        match self.last {
            Some(at) if at.elapsed() < self.interval => false,
            _ => {
                self.last = Some(Instant::now());
                true
            }
        }
    }
}

impl Default for UpdateThrottle {
    fn default() -> Self {
        UpdateThrottle::new(UPDATE_INTERVAL)
    }
}
