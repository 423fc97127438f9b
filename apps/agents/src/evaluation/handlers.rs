//! Axum route handlers for résumé evaluation.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::PipelineMode;
use crate::errors::AppError;
use crate::evaluation::jobs::extract_job;
use crate::evaluation::processor::{EvaluationSummary, ResumeProcessor};
use crate::evaluation::workflow::intake_resume;
use crate::events::{DocumentKind, StorageEvent};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    /// Defaults to the configured documents bucket.
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub resume_key: String,
    #[serde(default)]
    pub candidate_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(flatten)]
    pub summary: EvaluationSummary,
}

#[derive(Debug, Serialize)]
pub struct DocumentOutcome {
    pub key: String,
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StorageEventResponse {
    pub status: &'static str,
    pub message: String,
    pub results: Vec<DocumentOutcome>,
}

#[derive(Debug, Serialize)]
pub struct CandidateResponse {
    pub status: &'static str,
    pub candidate: Value,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/events/storage
///
/// Receives object-created notifications. Résumés are evaluated (or handed to
/// the step workflow), job descriptions are extracted, anything else is
/// skipped. Per-document failures are reported in `results`, never as an HTTP
/// error, so the notifier does not redeliver the batch.
pub async fn handle_storage_event(
    State(state): State<AppState>,
    Json(event): Json<StorageEvent>,
) -> Json<StorageEventResponse> {
    let mut results = Vec::new();
    let mut skipped = 0usize;

    for record in &event.records {
        let bucket = record.bucket();
        let key = record.key();

        let outcome = match DocumentKind::of(&key) {
            DocumentKind::Resume => {
                let summary = match state.config.pipeline_mode {
                    PipelineMode::Supervisor => {
                        ResumeProcessor::new(
                            state.objects.as_ref(),
                            state.store.as_ref(),
                            state.model.as_ref(),
                            &state.evaluation,
                        )
                        .process(bucket, &key, None)
                        .await
                    }
                    PipelineMode::Workflow => {
                        intake_resume(
                            state.objects.as_ref(),
                            state.store.as_ref(),
                            state.workflow.as_ref(),
                            &state.evaluation,
                            bucket,
                            &key,
                        )
                        .await
                    }
                };
                resume_outcome(key, summary)
            }
            DocumentKind::JobDescription => {
                let job = extract_job(
                    state.objects.as_ref(),
                    state.store.as_ref(),
                    state.model.as_ref(),
                    &state.evaluation,
                    bucket,
                    &key,
                )
                .await;
                match job {
                    Ok(job) => DocumentOutcome {
                        key,
                        status: "success",
                        message: format!("Job description '{}' extracted", job.title),
                        candidate_id: None,
                        job_id: Some(job.id),
                    },
                    Err(err) => failed(key, &err),
                }
            }
            DocumentKind::Other => {
                info!(key = %key, "Skipping object outside resumes/ and jobs/");
                skipped += 1;
                continue;
            }
        };
        results.push(outcome);
    }

    let failures = results.iter().filter(|r| r.status == "error").count();
    Json(StorageEventResponse {
        status: if failures == 0 { "success" } else { "error" },
        message: format!(
            "Processed {} document(s): {} failed, {} skipped",
            results.len(),
            failures,
            skipped
        ),
        results,
    })
}

/// POST /api/v1/evaluations
///
/// Evaluates one résumé synchronously with the supervisor prompt.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, AppError> {
    let resume_key = request.resume_key.trim();
    if resume_key.is_empty() {
        return Err(AppError::Validation("resume_key cannot be empty".to_string()));
    }
    let bucket = request
        .bucket
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .unwrap_or(state.config.documents_bucket.as_str());

    let summary = ResumeProcessor::new(
        state.objects.as_ref(),
        state.store.as_ref(),
        state.model.as_ref(),
        &state.evaluation,
    )
    .process(bucket, resume_key, request.candidate_id)
    .await?;

    Ok(Json(EvaluateResponse {
        status: "success",
        message: "Resume evaluation completed successfully".to_string(),
        summary,
    }))
}

/// GET /api/v1/candidates/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CandidateResponse>, AppError> {
    let candidate = state
        .store
        .get_item(&state.evaluation.tables.candidates, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))?;

    Ok(Json(CandidateResponse {
        status: "success",
        candidate,
    }))
}

fn resume_outcome(key: String, summary: Result<EvaluationSummary, AppError>) -> DocumentOutcome {
    match summary {
        Ok(summary) => DocumentOutcome {
            message: format!(
                "Candidate {} is {}",
                summary.candidate_name,
                summary.candidate_status.as_str()
            ),
            key,
            status: "success",
            candidate_id: Some(summary.candidate_id),
            job_id: None,
        },
        Err(err) => failed(key, &err),
    }
}

fn failed(key: String, err: &AppError) -> DocumentOutcome {
    warn!(key = %key, "Document processing failed: {err}");
    let (_, _, message) = err.public_parts();
    DocumentOutcome {
        key,
        status: "error",
        message,
        candidate_id: None,
        job_id: None,
    }
}
