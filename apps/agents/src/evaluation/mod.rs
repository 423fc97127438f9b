//! Résumé evaluation: schema back-fill, the supervisor processor, the step
//! workflow and job description extraction.

pub mod backfill;
pub mod handlers;
pub mod jobs;
pub mod keywords;
pub mod processor;
pub mod prompts;
pub mod record;
pub mod schema;
pub mod workflow;

use crate::storage::Tables;

/// Settings shared by every evaluation flow.
#[derive(Debug, Clone)]
pub struct EvaluationSettings {
    pub tables: Tables,
    /// Fixed job description object; when unset the first `jobs/` object is used.
    pub job_description_key: Option<String>,
    pub max_tokens: u32,
}

#[cfg(test)]
impl EvaluationSettings {
    pub fn for_tests() -> Self {
        Self {
            tables: Tables::new("candidates", "jobs", "reservations"),
            job_description_key: None,
            max_tokens: 1024,
        }
    }
}
