//! Bounded JSON object scanner.
//!
//! Finds where the first top-level `{ ... }` object in free text ends. String
//! literals are tracked, so braces inside quoted values never move the depth
//! counter and an escaped quote never closes a string.

use std::ops::Range;

/// Returns the byte range of the object opened by the first `{` in `text`.
///
/// `None` when the text has no `{` or the object never closes.
pub fn find_object_span(text: &str) -> Option<Range<usize>> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    // Only ASCII bytes are inspected; they never occur inside a multi-byte
    // UTF-8 sequence, so every returned bound is a char boundary.
    for (offset, byte) in text.as_bytes()[start..].iter().enumerate() {
        if in_string {
            if escape_next {
                escape_next = false;
            } else if *byte == b'\\' {
                escape_next = true;
            } else if *byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start..start + offset + 1);
                }
            }
            _ => {}
        }
    }

    None
}
