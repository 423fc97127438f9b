use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

/// Stand-in for an escaped backslash while the other escapes are rewritten.
const BACKSLASH_SENTINEL: &str = "\u{0}";

static THINKING_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<thinking>.*?</thinking>\s*").expect("thinking pattern"));

/// Reverses the escaping of a single-quoted string literal taken from a
/// stringified dict (`\\`, `\'`, `\n`, `\"`).
pub fn unescape_quoted_literal(text: &str) -> String {
    text.replace("\\\\", BACKSLASH_SENTINEL)
        .replace("\\'", "'")
        .replace("\\n", "\n")
        .replace("\\\"", "\"")
        .replace(BACKSLASH_SENTINEL, "\\")
}

/// Turns JSON that was serialized a second time (`{\"a\": 1}`) back into JSON.
pub fn unescape_escaped_json(text: &str) -> String {
    text.replace("\\\"", "\"")
        .replace("\\n", "\n")
        .replace("\\\\", "\\")
}

/// Drops `<thinking>...</thinking>` spans and the whitespace after them.
pub fn strip_thinking(text: &str) -> Cow<'_, str> {
    if text.contains("<thinking>") && text.contains("</thinking>") {
        THINKING_BLOCK.replace_all(text, "")
    } else {
        Cow::Borrowed(text)
    }
}

/// Collapses every whitespace run to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
