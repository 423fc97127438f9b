//! Supervisor evaluation: one prompt, one answer, every section back-filled.

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::backfill::backfill_evaluation;
use super::prompts::{SUPERVISOR_PROMPT, SUPERVISOR_SYSTEM};
use super::record::{
    complete, create_processing, mark_failed, name_from_key, title_from_key, CandidateEvaluation,
    CandidateStatus,
};
use super::EvaluationSettings;
use crate::errors::AppError;
use crate::events::{DocumentKind, JOBS_PREFIX};
use crate::extraction::extract_json_object;
use crate::llm_client::prompts::SINGLE_OBJECT_INSTRUCTION;
use crate::llm_client::{ModelInvoker, ModelRequest};
use crate::storage::{read_text, ObjectStore, RecordStore};

pub const SUPERVISOR_EVALUATOR: &str = "supervisor";

pub const NO_JOB_DESCRIPTION: &str =
    "No specific job description found. Please evaluate general qualifications.";

/// What callers learn about a candidate once a flow has run.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationSummary {
    pub candidate_id: String,
    pub candidate_name: String,
    pub candidate_status: CandidateStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobDescription {
    pub text: String,
    pub title: Option<String>,
}

impl JobDescription {
    fn general() -> Self {
        Self {
            text: NO_JOB_DESCRIPTION.to_string(),
            title: None,
        }
    }
}

/// Loads the job description to evaluate against: the configured key, else the
/// first object under `jobs/`. Any failure degrades to the general-qualifications
/// text.
pub async fn load_job_description(
    objects: &dyn ObjectStore,
    bucket: &str,
    fixed_key: Option<&str>,
) -> JobDescription {
    let key = match fixed_key {
        Some(key) => Some(key.to_string()),
        None => match objects.list_objects(bucket, JOBS_PREFIX).await {
            Ok(keys) => keys
                .into_iter()
                .find(|key| DocumentKind::of(key) == DocumentKind::JobDescription),
            Err(e) => {
                warn!(bucket, "Listing job descriptions failed: {e}");
                None
            }
        },
    };

    let Some(key) = key else {
        info!(bucket, "No job description found, evaluating general qualifications");
        return JobDescription::general();
    };

    match read_text(objects, bucket, &key).await {
        Ok(text) if !text.trim().is_empty() => JobDescription {
            title: Some(title_from_key(&key)),
            text,
        },
        Ok(_) => {
            warn!(key, "Job description is empty");
            JobDescription::general()
        }
        Err(e) => {
            warn!(key, "Reading job description failed: {e}");
            JobDescription::general()
        }
    }
}

pub struct ResumeProcessor<'a> {
    objects: &'a dyn ObjectStore,
    store: &'a dyn RecordStore,
    model: &'a dyn ModelInvoker,
    settings: &'a EvaluationSettings,
}

impl<'a> ResumeProcessor<'a> {
    pub fn new(
        objects: &'a dyn ObjectStore,
        store: &'a dyn RecordStore,
        model: &'a dyn ModelInvoker,
        settings: &'a EvaluationSettings,
    ) -> Self {
        Self {
            objects,
            store,
            model,
            settings,
        }
    }

    /// Evaluates one résumé end to end. The candidate record is created first
    /// and always ends `completed` or `error`. An id that already names a
    /// record is refused with a conflict and that record is left as it is.
    pub async fn process(
        &self,
        bucket: &str,
        resume_key: &str,
        candidate_id: Option<String>,
    ) -> Result<EvaluationSummary, AppError> {
        let candidate_id = candidate_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let name = name_from_key(resume_key);
        let table = &self.settings.tables.candidates;

        let record =
            CandidateEvaluation::processing(&candidate_id, &name, resume_key, SUPERVISOR_EVALUATOR);
        create_processing(self.store, table, &record).await?;

        match self.evaluate(bucket, resume_key, &candidate_id, &name).await {
            Ok(summary) => Ok(summary),
            Err(err) => {
                error!(candidate_id = %candidate_id, resume_key, "Résumé evaluation failed: {err}");
                mark_failed(self.store, table, &candidate_id, &err).await;
                Err(err)
            }
        }
    }

    async fn evaluate(
        &self,
        bucket: &str,
        resume_key: &str,
        candidate_id: &str,
        name: &str,
    ) -> Result<EvaluationSummary, AppError> {
        let resume_text = read_text(self.objects, bucket, resume_key).await?;
        if resume_text.trim().is_empty() {
            return Err(AppError::MissingInput(format!(
                "résumé {resume_key} contains no text"
            )));
        }

        let job = load_job_description(
            self.objects,
            bucket,
            self.settings.job_description_key.as_deref(),
        )
        .await;

        let prompt = SUPERVISOR_PROMPT
            .replace("{candidate_name}", name)
            .replace("{candidate_id}", candidate_id)
            .replace("{job_description}", &job.text)
            .replace("{resume_text}", &resume_text);
        let request = ModelRequest::new(SUPERVISOR_SYSTEM, format!("{prompt}\n\n{SINGLE_OBJECT_INSTRUCTION}"))
            .with_max_tokens(self.settings.max_tokens);

        let raw = self
            .model
            .invoke(&request)
            .await
            .map_err(|e| AppError::Llm(format!("supervisor evaluation failed: {e}")))?;

        let parsed = extract_json_object(&raw);
        let outcome = backfill_evaluation(parsed.as_ref(), &raw);
        let candidate_name = outcome.candidate_name().unwrap_or_else(|| name.to_string());
        let rating = outcome.rating();
        info!(
            candidate_id,
            rating,
            source = ?outcome.source,
            backfilled = outcome.backfilled.len(),
            "Supervisor answer back-filled"
        );

        let mut patch = outcome.into_patch()?;
        patch.insert("name".into(), Value::String(candidate_name.clone()));
        patch.insert("rating".into(), Value::from(rating));
        patch.insert("resume_text".into(), Value::String(resume_text));
        patch.insert("job_title".into(), job.title.map_or(Value::Null, Value::String));
        patch.insert(
            "evaluated_by".into(),
            Value::String(format!("{SUPERVISOR_EVALUATOR}:{}", self.model.model_id())),
        );
        patch.insert("raw_evaluation_response".into(), Value::String(raw));

        complete(self.store, &self.settings.tables.candidates, candidate_id, patch).await?;

        Ok(EvaluationSummary {
            candidate_id: candidate_id.to_string(),
            candidate_name,
            candidate_status: CandidateStatus::Completed,
            rating: Some(rating),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedModel;
    use crate::llm_client::LlmError;
    use crate::storage::memory::{MemoryObjectStore, MemoryRecordStore};
    use crate::storage::StorageError;
    use serde_json::json;

    const BUCKET: &str = "hr-documents";

    fn documents() -> MemoryObjectStore {
        let objects = MemoryObjectStore::default();
        objects.insert(BUCKET, "resumes/jane_doe_resume.txt", "Jane Doe. Python, PyTorch, AWS.");
        objects.insert(BUCKET, "jobs/ml_engineer.txt", "We need an ML engineer with PyTorch.");
        objects
    }

    const ANSWER: &str = r#"Here is the evaluation:
```json
{
  "resume_parsing": {"personal_info": {"name": "Jane Q. Doe"}},
  "evaluation_results": {"skills_summary": {"programming_languages": ["Python"]}},
  "candidate_rating": {"rating": 4, "reasoning": "Strong ML background"}
}
```
Let me know if you need anything else."#;

    #[tokio::test]
    async fn test_supervisor_completes_record() {
        let objects = documents();
        let store = MemoryRecordStore::default();
        let model = ScriptedModel::new([ANSWER]);
        let settings = EvaluationSettings::for_tests();

        let summary = ResumeProcessor::new(&objects, &store, &model, &settings)
            .process(BUCKET, "resumes/jane_doe_resume.txt", Some("cand-1".into()))
            .await
            .unwrap();

        assert_eq!(summary.candidate_id, "cand-1");
        assert_eq!(summary.candidate_name, "Jane Q. Doe");
        assert_eq!(summary.rating, Some(4));

        let item = store.item(&settings.tables.candidates, "cand-1").unwrap();
        assert_eq!(item["status"], "completed");
        assert_eq!(item["rating"], 4);
        assert_eq!(item["job_title"], "Ml Engineer");
        assert_eq!(item["parse_source"], "structured");
        assert_eq!(item["evaluated_by"], "supervisor:scripted-model");
        assert_eq!(item["candidate_rating"]["reasoning"], "Strong ML background");
        assert_eq!(
            item["evaluation_results"]["skills_summary"]["programming_languages"],
            json!(["Python"])
        );
        assert!(item["gaps_analysis"]["gaps_analysis"]["employment_gaps"].is_array());
        assert!(item["interview_notes"]["technical_questions"].is_array());
        assert!(item["backfilled_fields"]
            .as_array()
            .unwrap()
            .contains(&json!("candidate_rating.strengths")));

        let prompt = &model.requests()[0].prompt;
        assert!(prompt.contains("Jane Doe. Python, PyTorch, AWS."));
        assert!(prompt.contains("We need an ML engineer"));
    }

    #[tokio::test]
    async fn test_reused_candidate_id_leaves_record_alone() {
        let objects = documents();
        objects.insert(BUCKET, "resumes/bob.txt", "Bob. Java.");
        let store = MemoryRecordStore::default();
        let model = ScriptedModel::with_results(vec![Ok(ANSWER.to_string()), Err(LlmError::EmptyContent)]);
        let settings = EvaluationSettings::for_tests();
        let processor = ResumeProcessor::new(&objects, &store, &model, &settings);

        processor
            .process(BUCKET, "resumes/jane_doe_resume.txt", Some("c1".into()))
            .await
            .unwrap();
        let before = store.item(&settings.tables.candidates, "c1").unwrap();

        let err = processor
            .process(BUCKET, "resumes/bob.txt", Some("c1".into()))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        let after = store.item(&settings.tables.candidates, "c1").unwrap();
        assert_eq!(after, before);
        assert_eq!(after["status"], "completed");
        assert_eq!(after["resume_key"], "resumes/jane_doe_resume.txt");
        assert_eq!(after["created_at"], before["created_at"]);
        assert_eq!(model.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_prose_answer_falls_back_to_text_scan() {
        let objects = documents();
        let store = MemoryRecordStore::default();
        let model = ScriptedModel::new(["Solid candidate with Python and Docker. Rating: 2 overall."]);
        let settings = EvaluationSettings::for_tests();

        let summary = ResumeProcessor::new(&objects, &store, &model, &settings)
            .process(BUCKET, "resumes/jane_doe_resume.txt", Some("cand-2".into()))
            .await
            .unwrap();

        assert_eq!(summary.rating, Some(2));
        assert_eq!(summary.candidate_name, "Jane Doe");
        let item = store.item(&settings.tables.candidates, "cand-2").unwrap();
        assert_eq!(item["status"], "completed");
        assert_eq!(item["parse_source"], "text_fallback");
        assert_eq!(
            item["candidate_rating"]["raw_rating"],
            "Solid candidate with Python and Docker. Rating: 2 overall."
        );
    }

    #[tokio::test]
    async fn test_general_qualifications_without_job() {
        let objects = MemoryObjectStore::default();
        objects.insert(BUCKET, "resumes/sam.txt", "Sam. Rust and Go.");
        let store = MemoryRecordStore::default();
        let model = ScriptedModel::new([r#"{"candidate_rating": {"rating": 3}}"#]);
        let settings = EvaluationSettings::for_tests();

        ResumeProcessor::new(&objects, &store, &model, &settings)
            .process(BUCKET, "resumes/sam.txt", Some("cand-3".into()))
            .await
            .unwrap();

        assert!(model.requests()[0].prompt.contains(NO_JOB_DESCRIPTION));
        let item = store.item(&settings.tables.candidates, "cand-3").unwrap();
        assert_eq!(item["job_title"], Value::Null);
    }

    #[tokio::test]
    async fn test_missing_resume_marks_error() {
        let objects = MemoryObjectStore::default();
        let store = MemoryRecordStore::default();
        let model = ScriptedModel::new(Vec::<String>::new());
        let settings = EvaluationSettings::for_tests();

        let err = ResumeProcessor::new(&objects, &store, &model, &settings)
            .process(BUCKET, "resumes/ghost.txt", Some("cand-4".into()))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Storage(StorageError::ObjectNotFound(_))));
        let item = store.item(&settings.tables.candidates, "cand-4").unwrap();
        assert_eq!(item["status"], "error");
        assert!(model.requests().is_empty());
    }

    #[tokio::test]
    async fn test_empty_resume_is_missing_input() {
        let objects = MemoryObjectStore::default();
        objects.insert(BUCKET, "resumes/blank.txt", "   \n");
        let store = MemoryRecordStore::default();
        let model = ScriptedModel::new(Vec::<String>::new());
        let settings = EvaluationSettings::for_tests();

        let err = ResumeProcessor::new(&objects, &store, &model, &settings)
            .process(BUCKET, "resumes/blank.txt", Some("cand-5".into()))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MissingInput(_)));
        assert_eq!(
            store.item(&settings.tables.candidates, "cand-5").unwrap()["status"],
            "error"
        );
    }

    #[tokio::test]
    async fn test_model_failure_marks_error() {
        let objects = documents();
        let store = MemoryRecordStore::default();
        let model = ScriptedModel::with_results(vec![Err(LlmError::Api {
            status: 500,
            message: "overloaded".into(),
        })]);
        let settings = EvaluationSettings::for_tests();

        let err = ResumeProcessor::new(&objects, &store, &model, &settings)
            .process(BUCKET, "resumes/jane_doe_resume.txt", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Llm(_)));
        let items = store.items(&settings.tables.candidates);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["status"], "error");
        assert!(items[0]["error"].as_str().unwrap().contains("overloaded"));
    }

    #[tokio::test]
    async fn test_job_description_prefers_configured_key() {
        let objects = documents();
        objects.insert(BUCKET, "jobs/data_scientist.txt", "Statistics and SQL.");

        let job = load_job_description(&objects, BUCKET, Some("jobs/data_scientist.txt")).await;
        assert_eq!(job.title.as_deref(), Some("Data Scientist"));
        assert_eq!(job.text, "Statistics and SQL.");

        let missing = load_job_description(&objects, BUCKET, Some("jobs/nope.txt")).await;
        assert_eq!(missing.text, NO_JOB_DESCRIPTION);
    }
}
