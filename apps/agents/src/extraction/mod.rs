//! Tolerant JSON extraction from model output.
//!
//! Models wrap their answers in many shapes: a bare object, a fenced code
//! block, prose around an embedded object, JSON escaped a second time, or a
//! stringified `{'role': 'assistant', 'content': [{'text': ...}]}` dict with
//! `<thinking>` spans. [`extract_json_object`] tries each shape in a fixed order
//! and returns the first object that parses. It never fails: `None` means there
//! was nothing recoverable and the caller falls back to text extraction.

mod scanner;
mod shapes;
mod unescape;

use serde_json::{Map, Value};
use tracing::{debug, warn};

/// A decoded JSON object.
pub type JsonObject = Map<String, Value>;

/// How much of an unparseable response is echoed into the warning log.
const PREVIEW_CHARS: usize = 200;

/// Recovers the first JSON object embedded in a model response.
///
/// Order of attempts:
/// 1. the text of a stringified content-parts dict, when the response is one;
/// 2. the response as written: direct parse, then the first fenced block
///    opening with `{`, then a string-aware scan from the first `{`;
/// 3. the same stages after undoing a second layer of escaping, only when the
///    response contains `\"`.
///
/// Decoded escapes are never re-escaped.
pub fn extract_json_object(text: &str) -> Option<JsonObject> {
    let content = text.trim();

    if let Some(inner) = shapes::unwrap_content_parts(content) {
        debug!(len = inner.len(), "Unwrapped stringified content-parts response");
        if let Some(object) = parse_stages(&inner) {
            return Some(object);
        }
        debug!("Content-parts text held no object, retrying on the full response");
    }

    if let Some(object) = parse_stages(content) {
        return Some(object);
    }

    if content.contains("\\\"") {
        let unescaped = unescape::unescape_escaped_json(content);
        if let Some(object) = parse_stages(&unescaped) {
            debug!("Recovered object after undoing double escaping");
            return Some(object);
        }
    }

    warn!(preview = %preview(content), "No JSON object found in model output");
    None
}

fn parse_stages(text: &str) -> Option<JsonObject> {
    let text = text.trim();

    if text.starts_with('{') && text.ends_with('}') {
        match parse_object(text) {
            Ok(object) => return Some(object),
            Err(e) => debug!(error = %e, "Direct parse failed"),
        }
    }

    if let Some(body) = shapes::fenced_object(text) {
        match parse_object(body) {
            Ok(object) => return Some(object),
            Err(e) => debug!(error = %e, "Fenced block did not parse"),
        }
    }

    let span = scanner::find_object_span(text)?;
    let candidate = &text[span];
    match parse_object(candidate) {
        Ok(object) => Some(object),
        Err(e) => {
            debug!(error = %e, "Scanned object did not parse, collapsing whitespace");
            parse_object(&unescape::collapse_whitespace(candidate)).ok()
        }
    }
}

fn parse_object(text: &str) -> Result<JsonObject, serde_json::Error> {
    serde_json::from_str(text)
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
