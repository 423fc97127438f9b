//! Job postings: extraction from uploaded descriptions and lookup of the
//! latest one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use super::prompts::JOB_ANALYSIS_PROMPT;
use super::record::title_from_key;
use super::EvaluationSettings;
use crate::errors::AppError;
use crate::extraction::extract_json_object;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, SINGLE_OBJECT_INSTRUCTION};
use crate::llm_client::{ModelInvoker, ModelRequest};
use crate::storage::{read_text, ObjectStore, RecordStore, TableRef};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    pub title: String,
    pub description_key: String,
    pub description_text: String,
    /// Extracted requirements; `{raw_analysis}` when the answer held no JSON,
    /// `{error}` when the model call failed.
    #[serde(default)]
    pub analysis: Value,
    pub created_at: DateTime<Utc>,
}

/// Reads a job description, asks the model for its requirements and stores
/// the posting. A failed analysis still stores the posting.
pub async fn extract_job(
    objects: &dyn ObjectStore,
    store: &dyn RecordStore,
    model: &dyn ModelInvoker,
    settings: &EvaluationSettings,
    bucket: &str,
    key: &str,
) -> Result<JobPosting, AppError> {
    let description_text = read_text(objects, bucket, key).await?;
    if description_text.trim().is_empty() {
        return Err(AppError::MissingInput(format!(
            "job description {key} contains no text"
        )));
    }

    let title = title_from_key(key);
    let analysis = analyze(model, &title, &description_text, settings.max_tokens).await;

    let job = JobPosting {
        id: Uuid::new_v4().to_string(),
        title,
        description_key: key.to_string(),
        description_text,
        analysis,
        created_at: Utc::now(),
    };
    store
        .put_item(&settings.tables.jobs, serde_json::to_value(&job)?)
        .await?;

    info!(job_id = %job.id, title = %job.title, "Stored job posting");
    Ok(job)
}

async fn analyze(model: &dyn ModelInvoker, title: &str, description: &str, max_tokens: u32) -> Value {
    let prompt = JOB_ANALYSIS_PROMPT
        .replace("{job_title}", title)
        .replace("{job_description}", description);
    let request = ModelRequest::new(JSON_ONLY_SYSTEM, format!("{prompt}\n\n{SINGLE_OBJECT_INSTRUCTION}"))
        .with_max_tokens(max_tokens);

    match model.invoke(&request).await {
        Ok(raw) => match extract_json_object(&raw) {
            Some(analysis) => Value::Object(analysis),
            None => json!({ "raw_analysis": raw }),
        },
        Err(e) => {
            warn!(title, "Job analysis failed: {e}");
            json!({ "error": e.to_string() })
        }
    }
}

/// The most recently stored posting, if any.
pub async fn latest_job(store: &dyn RecordStore, table: &TableRef) -> Result<Option<JobPosting>, AppError> {
    match store.scan(table, 1).await?.into_iter().next() {
        Some(item) => Ok(Some(serde_json::from_value(item)?)),
        None => Ok(None),
    }
}
