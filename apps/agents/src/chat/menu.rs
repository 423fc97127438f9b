//! Keyword search over the menu documents.
//!
//! Each document under the menu prefix is split into blank-line separated
//! entries. A query term found in an entry's first line counts fully, one found
//! only in its body counts 0.6; the entry scores the mean over query terms.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::storage::{read_text, ObjectStore, StorageError};

pub const MAX_RESULTS: usize = 5;

const HEADING_WEIGHT: f32 = 1.0;
const BODY_WEIGHT: f32 = 0.6;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "any", "are", "do", "for", "have", "i", "in", "is", "me", "menu", "of",
    "on", "or", "the", "to", "what", "with", "you", "your",
];

#[derive(Debug, Clone, PartialEq)]
pub struct MenuMatch {
    pub source: String,
    pub text: String,
    pub score: f32,
}

/// Best entries for `query`, highest score first. Unreadable documents are
/// skipped; only a failed listing is an error.
pub async fn search_menu(
    objects: &dyn ObjectStore,
    bucket: &str,
    prefix: &str,
    query: &str,
) -> Result<Vec<MenuMatch>, StorageError> {
    let terms = query_terms(query);
    if terms.is_empty() {
        return Ok(Vec::new());
    }

    let mut matches = Vec::new();
    for key in objects.list_objects(bucket, prefix).await? {
        if key.ends_with('/') {
            continue;
        }
        let text = match read_text(objects, bucket, &key).await {
            Ok(text) => text,
            Err(e) => {
                warn!(key = %key, "Skipping unreadable menu document: {e}");
                continue;
            }
        };
        for entry in entries(&text) {
            let score = score_entry(entry, &terms);
            if score > 0.0 {
                matches.push(MenuMatch {
                    source: key.clone(),
                    text: entry.to_string(),
                    score,
                });
            }
        }
    }

    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches.truncate(MAX_RESULTS);
    debug!(query, results = matches.len(), "Menu search finished");
    Ok(matches)
}

pub fn format_matches(query: &str, matches: &[MenuMatch]) -> String {
    if matches.is_empty() {
        return format!("No menu items found matching '{query}'. Please try a different search term.");
    }
    let mut out = String::from("Menu search results:\n\n");
    for (i, item) in matches.iter().enumerate() {
        out.push_str(&format!("{}. {}\n   (Relevance: {:.2})\n\n", i + 1, item.text, item.score));
    }
    out.trim_end().to_string()
}

fn query_terms(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    query
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|t| t.len() > 1 && !STOP_WORDS.contains(&t.as_str()))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

fn entries(text: &str) -> impl Iterator<Item = &str> {
    text.split("\n\n").map(str::trim).filter(|e| !e.is_empty())
}

fn score_entry(entry: &str, terms: &[String]) -> f32 {
    let mut lines = entry.lines();
    let heading = lines.next().unwrap_or_default().to_lowercase();
    let body = lines.collect::<Vec<_>>().join(" ").to_lowercase();

    let total: f32 = terms
        .iter()
        .map(|term| {
            if heading.contains(term.as_str()) {
                HEADING_WEIGHT
            } else if body.contains(term.as_str()) {
                BODY_WEIGHT
            } else {
                0.0
            }
        })
        .sum();
    total / terms.len() as f32
}
