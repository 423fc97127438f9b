//! Step workflow: intake records the candidate and starts an execution; the
//! screening pipeline then runs evaluate, gaps, rate and notes in order, each
//! step back-filled against its own section.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::backfill::{backfill_section, BackfillOutcome};
use super::jobs::{latest_job, JobPosting};
use super::processor::EvaluationSummary;
use super::prompts::{
    EVALUATE_PROMPT, EVALUATE_SYSTEM, GAPS_PROMPT, GAPS_SYSTEM, NOTES_PROMPT, NOTES_SYSTEM,
    RATE_PROMPT, RATE_SYSTEM,
};
use super::record::{
    complete, create_processing, mark_failed, name_from_key, CandidateEvaluation, CandidateStatus,
};
use super::schema::Section;
use super::EvaluationSettings;
use crate::errors::AppError;
use crate::extraction::extract_json_object;
use crate::llm_client::prompts::SINGLE_OBJECT_INSTRUCTION;
use crate::llm_client::{ModelInvoker, ModelRequest};
use crate::storage::{read_text, ObjectStore, RecordStore};

pub const WORKFLOW_EVALUATOR: &str = "workflow";

pub const JOB_REQUIRED: &str = "job description is required for résumé evaluation";

/// Execution input handed from intake to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningInput {
    pub candidate_id: String,
    pub resume_text: String,
    pub name: String,
}

/// Starts named workflow executions.
#[async_trait]
pub trait WorkflowTrigger: Send + Sync {
    /// Starts an execution and returns its identifier. Returns once the
    /// execution is accepted, not when it finishes.
    async fn start_execution(&self, name: &str, input: Value) -> Result<String, AppError>;
}

/// Records a new candidate with its résumé text and hands it to the workflow.
pub async fn intake_resume(
    objects: &dyn ObjectStore,
    store: &dyn RecordStore,
    workflow: &dyn WorkflowTrigger,
    settings: &EvaluationSettings,
    bucket: &str,
    resume_key: &str,
) -> Result<EvaluationSummary, AppError> {
    let resume_text = read_text(objects, bucket, resume_key).await?;
    if resume_text.trim().is_empty() {
        return Err(AppError::MissingInput(format!(
            "résumé {resume_key} contains no text"
        )));
    }

    let candidate_id = Uuid::new_v4().to_string();
    let name = name_from_key(resume_key);
    let table = &settings.tables.candidates;

    let record = CandidateEvaluation::processing(&candidate_id, &name, resume_key, WORKFLOW_EVALUATOR)
        .with_resume_text(resume_text.as_str());
    create_processing(store, table, &record).await?;

    let input = serde_json::to_value(ScreeningInput {
        candidate_id: candidate_id.clone(),
        resume_text,
        name: name.clone(),
    })?;
    let execution = match workflow
        .start_execution(&format!("resume-{candidate_id}"), input)
        .await
    {
        Ok(execution) => execution,
        Err(err) => {
            error!(candidate_id = %candidate_id, "Failed to start screening: {err}");
            mark_failed(store, table, &candidate_id, &err).await;
            return Err(err);
        }
    };

    info!(candidate_id = %candidate_id, execution = %execution, "Screening started");
    Ok(EvaluationSummary {
        candidate_id,
        candidate_name: name,
        candidate_status: CandidateStatus::Processing,
        rating: None,
    })
}

pub struct ScreeningPipeline<'a> {
    store: &'a dyn RecordStore,
    model: &'a dyn ModelInvoker,
    settings: &'a EvaluationSettings,
}

impl<'a> ScreeningPipeline<'a> {
    pub fn new(store: &'a dyn RecordStore, model: &'a dyn ModelInvoker, settings: &'a EvaluationSettings) -> Self {
        Self {
            store,
            model,
            settings,
        }
    }

    /// Runs every step and completes the candidate record. Any failure leaves
    /// the record in `error`.
    pub async fn run(&self, input: &ScreeningInput) -> Result<Value, AppError> {
        match self.screen(input).await {
            Ok(item) => Ok(item),
            Err(err) => {
                error!(candidate_id = %input.candidate_id, "Screening failed: {err}");
                mark_failed(self.store, &self.settings.tables.candidates, &input.candidate_id, &err).await;
                Err(err)
            }
        }
    }

    async fn screen(&self, input: &ScreeningInput) -> Result<Value, AppError> {
        if input.resume_text.trim().is_empty() {
            return Err(AppError::MissingInput("résumé text is empty".to_string()));
        }
        let job = latest_job(self.store, &self.settings.tables.jobs)
            .await?
            .ok_or_else(|| AppError::MissingInput(JOB_REQUIRED.to_string()))?;

        let mut outcome = self.evaluate_resume(input, &job).await?;
        let raw_evaluation = outcome
            .section(Section::EvaluationResults)
            .and_then(|section| section.get("raw_evaluation"))
            .cloned()
            .unwrap_or(Value::Null);
        let gaps = self.identify_gaps(input, &job, &outcome).await?;
        outcome.merge(gaps);
        let rating = self.rate_candidate(&job, &outcome).await?;
        outcome.merge(rating);
        let notes = self.write_interview_notes(input, &job, &outcome).await?;
        outcome.merge(notes);

        let rating = outcome.rating();
        let mut patch = outcome.into_patch()?;
        patch.insert("rating".into(), Value::from(rating));
        patch.insert("job_id".into(), Value::String(job.id));
        patch.insert("job_title".into(), Value::String(job.title));
        patch.insert(
            "evaluated_by".into(),
            Value::String(format!("{WORKFLOW_EVALUATOR}:{}", self.model.model_id())),
        );
        patch.insert("raw_evaluation_response".into(), raw_evaluation);

        complete(self.store, &self.settings.tables.candidates, &input.candidate_id, patch).await
    }

    async fn evaluate_resume(&self, input: &ScreeningInput, job: &JobPosting) -> Result<BackfillOutcome, AppError> {
        let prompt = EVALUATE_PROMPT
            .replace("{job_title}", &job.title)
            .replace("{job_description}", &job.description_text)
            .replace("{resume_text}", &input.resume_text);
        self.run_step(Section::EvaluationResults, EVALUATE_SYSTEM, prompt).await
    }

    async fn identify_gaps(
        &self,
        input: &ScreeningInput,
        job: &JobPosting,
        so_far: &BackfillOutcome,
    ) -> Result<BackfillOutcome, AppError> {
        let prompt = GAPS_PROMPT
            .replace("{job_title}", &job.title)
            .replace("{evaluation}", &section_json(so_far, Section::EvaluationResults))
            .replace("{resume_text}", &input.resume_text);
        self.run_step(Section::GapsAnalysis, GAPS_SYSTEM, prompt).await
    }

    async fn rate_candidate(&self, job: &JobPosting, so_far: &BackfillOutcome) -> Result<BackfillOutcome, AppError> {
        let prompt = RATE_PROMPT
            .replace("{job_title}", &job.title)
            .replace("{evaluation}", &section_json(so_far, Section::EvaluationResults))
            .replace("{gaps}", &section_json(so_far, Section::GapsAnalysis))
            .replace("{job_description}", &job.description_text);
        self.run_step(Section::CandidateRating, RATE_SYSTEM, prompt).await
    }

    async fn write_interview_notes(
        &self,
        input: &ScreeningInput,
        job: &JobPosting,
        so_far: &BackfillOutcome,
    ) -> Result<BackfillOutcome, AppError> {
        let prompt = NOTES_PROMPT
            .replace("{candidate_name}", &input.name)
            .replace("{job_title}", &job.title)
            .replace("{evaluation}", &section_json(so_far, Section::EvaluationResults))
            .replace("{gaps}", &section_json(so_far, Section::GapsAnalysis))
            .replace("{rating}", &section_json(so_far, Section::CandidateRating));
        self.run_step(Section::InterviewNotes, NOTES_SYSTEM, prompt).await
    }

    async fn run_step(&self, section: Section, system: &str, prompt: String) -> Result<BackfillOutcome, AppError> {
        let request = ModelRequest::new(system, format!("{prompt}\n\n{SINGLE_OBJECT_INSTRUCTION}"))
            .with_max_tokens(self.settings.max_tokens);
        let raw = self
            .model
            .invoke(&request)
            .await
            .map_err(|e| AppError::Llm(format!("{} step failed: {e}", section.key())))?;

        let parsed = extract_json_object(&raw);
        let outcome = backfill_section(section, parsed.as_ref(), &raw);
        debug!(
            section = section.key(),
            source = ?outcome.source,
            backfilled = outcome.backfilled.len(),
            "Step answer back-filled"
        );
        Ok(outcome)
    }
}

/// A finished section as prompt context, without the raw model text.
fn section_json(outcome: &BackfillOutcome, section: Section) -> String {
    let mut value = outcome.section(section).cloned().unwrap_or_default();
    if let (Some(raw_key), Some(object)) = (section.raw_key(), value.as_object_mut()) {
        object.remove(raw_key);
    }
    serde_json::to_string_pretty(&value).unwrap_or_default()
}

/// Runs executions in-process on the tokio runtime.
pub struct LocalWorkflow {
    store: Arc<dyn RecordStore>,
    model: Arc<dyn ModelInvoker>,
    settings: Arc<EvaluationSettings>,
}

impl LocalWorkflow {
    pub fn new(
        store: Arc<dyn RecordStore>,
        model: Arc<dyn ModelInvoker>,
        settings: Arc<EvaluationSettings>,
    ) -> Self {
        Self {
            store,
            model,
            settings,
        }
    }
}

#[async_trait]
impl WorkflowTrigger for LocalWorkflow {
    async fn start_execution(&self, name: &str, input: Value) -> Result<String, AppError> {
        let input: ScreeningInput = serde_json::from_value(input)
            .map_err(|e| AppError::Validation(format!("invalid screening input: {e}")))?;

        let store = Arc::clone(&self.store);
        let model = Arc::clone(&self.model);
        let settings = Arc::clone(&self.settings);
        let execution = name.to_string();
        let label = execution.clone();

        tokio::spawn(async move {
            let pipeline = ScreeningPipeline::new(store.as_ref(), model.as_ref(), settings.as_ref());
            match pipeline.run(&input).await {
                Ok(_) => info!(execution = %label, "Screening execution succeeded"),
                Err(e) => error!(execution = %label, "Screening execution failed: {e}"),
            }
        });

        Ok(execution)
    }
}
