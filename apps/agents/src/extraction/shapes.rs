//! Detectors for the wrappers models put around their JSON answers.

use once_cell::sync::Lazy;
use regex::Regex;

use super::scanner::find_object_span;
use super::unescape::{strip_thinking, unescape_quoted_literal};

/// Opening of a stringified `{'role': 'assistant', 'content': [{'text': ...}]}` dict.
const CONTENT_PARTS_PREFIX: &str = "{'role': 'assistant', 'content': [{'text': '";
const CONTENT_PARTS_SUFFIX: &str = "'}]}";

static TEXT_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"'text':\s*'").expect("text marker"));
static TEXT_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'\s*\}\s*\]\s*\}\s*$").expect("closing marker"));
static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```(?:json)?\s*(.*?)```").expect("fence pattern"));

/// Unwraps the text of a stringified content-parts dict.
///
/// Returns the unescaped inner text with `<thinking>` spans removed, or `None`
/// when `content` does not have that shape.
pub fn unwrap_content_parts(content: &str) -> Option<String> {
    if !content.starts_with(CONTENT_PARTS_PREFIX) || !content.ends_with(CONTENT_PARTS_SUFFIX) {
        return None;
    }

    let start = TEXT_START.find(content)?.end();
    let end = TEXT_END.find(content)?.start();
    if end < start {
        return None;
    }

    let inner = unescape_quoted_literal(&content[start..end]);
    Some(strip_thinking(&inner).trim().to_string())
}

/// Returns the balanced object inside the first fenced block that opens with `{`.
pub fn fenced_object(text: &str) -> Option<&str> {
    FENCED_BLOCK.captures_iter(text).find_map(|captures| {
        let body = captures.get(1)?.as_str().trim();
        if !body.starts_with('{') {
            return None;
        }
        find_object_span(body).map(|span| &body[span])
    })
}
