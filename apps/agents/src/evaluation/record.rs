//! Candidate records and their lifecycle.
//!
//! A record is created `processing` when a résumé is first observed, then moves
//! exactly once to `completed` or `error` through a partial update. Records are
//! never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::extraction::JsonObject;
use crate::storage::{RecordStore, TableRef};

pub const UNKNOWN_CANDIDATE: &str = "Unknown Candidate";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    Processing,
    Completed,
    Error,
}

impl CandidateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

/// The record written when evaluation starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateEvaluation {
    pub id: String,
    pub name: String,
    pub resume_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_text: Option<String>,
    pub status: CandidateStatus,
    pub evaluated_by: String,
    pub created_at: DateTime<Utc>,
}

impl CandidateEvaluation {
    pub fn processing(
        id: impl Into<String>,
        name: impl Into<String>,
        resume_key: impl Into<String>,
        evaluated_by: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            resume_key: resume_key.into(),
            resume_text: None,
            status: CandidateStatus::Processing,
            evaluated_by: evaluated_by.into(),
            created_at: Utc::now(),
        }
    }

    pub fn with_resume_text(mut self, resume_text: impl Into<String>) -> Self {
        self.resume_text = Some(resume_text.into());
        self
    }
}

/// Writes the initial `processing` record. An existing record with the same
/// id is never overwritten.
pub async fn create_processing(
    store: &dyn RecordStore,
    table: &TableRef,
    record: &CandidateEvaluation,
) -> Result<(), AppError> {
    if !store.insert_item(table, serde_json::to_value(record)?).await? {
        warn!(candidate_id = %record.id, "Candidate id already in use");
        return Err(AppError::Conflict(format!("candidate {} already exists", record.id)));
    }
    info!(candidate_id = %record.id, resume_key = %record.resume_key, "Created processing record");
    Ok(())
}

/// Applies the terminal `completed` patch. `patch` carries the sections and
/// metadata; status and completion time are set here.
///
/// When the record has vanished the patch is written as a fresh item so the
/// evaluation is not lost.
pub async fn complete(
    store: &dyn RecordStore,
    table: &TableRef,
    candidate_id: &str,
    mut patch: JsonObject,
) -> Result<Value, AppError> {
    patch.insert("status".into(), serde_json::to_value(CandidateStatus::Completed)?);
    patch.insert("completed_at".into(), Value::String(Utc::now().to_rfc3339()));

    if let Some(updated) = store.update_item(table, candidate_id, patch.clone()).await? {
        info!(candidate_id, "Candidate record completed");
        return Ok(updated);
    }

    warn!(candidate_id, "Processing record missing at completion, writing full item");
    patch.insert(table.key_attribute.into(), Value::String(candidate_id.to_string()));
    patch
        .entry("created_at")
        .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
    let item = Value::Object(patch);
    store.put_item(table, item.clone()).await?;
    Ok(item)
}

/// Records a terminal failure. Storage errors here are logged, never raised,
/// so the caller can still report the original error.
pub async fn mark_failed(
    store: &dyn RecordStore,
    table: &TableRef,
    candidate_id: &str,
    failure: &AppError,
) {
    let mut patch = JsonObject::new();
    patch.insert("status".into(), Value::from(CandidateStatus::Error.as_str()));
    patch.insert("error".into(), Value::String(failure.to_string()));
    patch.insert("failed_at".into(), Value::String(Utc::now().to_rfc3339()));

    match store.update_item(table, candidate_id, patch).await {
        Ok(Some(_)) => info!(candidate_id, "Candidate record marked as error"),
        Ok(None) => warn!(candidate_id, "No candidate record to mark as error"),
        Err(e) => error!(candidate_id, "Failed to record evaluation error: {e}"),
    }
}

/// Display name from an object key: last path segment, extension and a
/// trailing `_resume` dropped, separators turned into spaces, title-cased.
pub fn name_from_key(key: &str) -> String {
    let stem = file_stem(key);
    let stem = strip_suffix_ignore_case(stem, "_resume")
        .or_else(|| strip_suffix_ignore_case(stem, "-resume"))
        .unwrap_or(stem);
    let name = title_case(stem);
    if name.is_empty() {
        UNKNOWN_CANDIDATE.to_string()
    } else {
        name
    }
}

/// Job title from a job description key, e.g. `jobs/ai_engineer.txt` → `Ai Engineer`.
pub fn title_from_key(key: &str) -> String {
    title_case(file_stem(key))
}

fn file_stem(key: &str) -> &str {
    let file = key.rsplit('/').next().unwrap_or(key);
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.chars().all(char::is_alphanumeric) => stem,
        _ => file,
    }
}

fn strip_suffix_ignore_case<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    let split = text.len().checked_sub(suffix.len())?;
    let tail = text.get(split..)?;
    tail.eq_ignore_ascii_case(suffix).then(|| &text[..split])
}

fn title_case(text: &str) -> String {
    text.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryRecordStore;
    use serde_json::json;

    fn table() -> TableRef {
        TableRef::new("candidates", "id")
    }

    #[test]
    fn test_name_from_key() {
        assert_eq!(name_from_key("resumes/jane_doe_resume.pdf"), "Jane Doe");
        assert_eq!(name_from_key("resumes/JOHN-SMITH.txt"), "John Smith");
        assert_eq!(name_from_key("resumes/maria garcia_Resume.txt"), "Maria Garcia");
        assert_eq!(name_from_key("resumes/_resume.txt"), UNKNOWN_CANDIDATE);
        assert_eq!(name_from_key("resumes/"), UNKNOWN_CANDIDATE);
    }

    #[test]
    fn test_title_from_key() {
        assert_eq!(title_from_key("jobs/senior_ml_engineer.txt"), "Senior Ml Engineer");
        assert_eq!(title_from_key("jobs/data-scientist"), "Data Scientist");
    }

    #[test]
    fn test_processing_record_shape() {
        let record = CandidateEvaluation::processing("c-1", "Jane Doe", "resumes/jane.txt", "supervisor")
            .with_resume_text("Jane's resume");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["status"], "processing");
        assert_eq!(value["resume_text"], "Jane's resume");
        assert!(value.get("completed_at").is_none());
    }

    #[tokio::test]
    async fn test_lifecycle_processing_to_completed() {
        let store = MemoryRecordStore::default();
        let record = CandidateEvaluation::processing("c-1", "Jane Doe", "resumes/jane.txt", "supervisor");
        create_processing(&store, &table(), &record).await.unwrap();

        let mut patch = JsonObject::new();
        patch.insert("rating".into(), json!(4));
        let item = complete(&store, &table(), "c-1", patch).await.unwrap();

        assert_eq!(item["status"], "completed");
        assert_eq!(item["rating"], 4);
        assert_eq!(item["resume_key"], "resumes/jane.txt");
        assert!(item.get("completed_at").is_some());
        assert_eq!(store.item(&table(), "c-1").unwrap(), item);
    }

    #[tokio::test]
    async fn test_create_processing_refuses_taken_id() {
        let store = MemoryRecordStore::default();
        let first = CandidateEvaluation::processing("c-1", "Jane Doe", "resumes/jane.txt", "supervisor");
        create_processing(&store, &table(), &first).await.unwrap();

        let second = CandidateEvaluation::processing("c-1", "Bob", "resumes/bob.txt", "supervisor");
        let err = create_processing(&store, &table(), &second).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.item(&table(), "c-1").unwrap()["resume_key"], "resumes/jane.txt");
    }

    #[tokio::test]
    async fn test_complete_recreates_missing_record() {
        let store = MemoryRecordStore::default();
        let item = complete(&store, &table(), "ghost", JsonObject::new()).await.unwrap();
        assert_eq!(item["id"], "ghost");
        assert_eq!(store.item(&table(), "ghost").unwrap()["status"], "completed");
    }

    #[tokio::test]
    async fn test_mark_failed_sets_error_state() {
        let store = MemoryRecordStore::default();
        let record = CandidateEvaluation::processing("c-2", "X", "resumes/x.txt", "workflow");
        create_processing(&store, &table(), &record).await.unwrap();

        mark_failed(&store, &table(), "c-2", &AppError::MissingInput("no resume text".into())).await;

        let item = store.item(&table(), "c-2").unwrap();
        assert_eq!(item["status"], "error");
        assert_eq!(item["error"], "Missing input: no resume text");
    }

    #[tokio::test]
    async fn test_mark_failed_swallows_storage_errors() {
        let store = MemoryRecordStore::default();
        store.fail_writes(true);
        mark_failed(&store, &table(), "c-3", &AppError::Llm("down".into())).await;
    }
}
