use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Multipart, State},
    Json,
};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{CandidateProfile, JobRoleSpec, ScoreResult};
use crate::parsing::ResumeParser;
use crate::scoring::{rank, PreparedRole, ScoringWeights};
use crate::screening::upload::{UploadForm, UploadedFile};
use crate::state::AppState;

/// Upper bound on files accepted by one bulk request.
pub const MAX_BULK_FILES: usize = 50;

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzedResume {
    pub filename: String,
    pub profile: CandidateProfile,
    pub score: ScoreResult,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkFailure {
    pub filename: String,
    pub code: String,
    pub message: String,
    /// The same file may succeed if resubmitted.
    pub retryable: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkAnalyzeResponse {
    pub total_processed: usize,
    pub shortlisted_count: usize,
    /// Highest overall score first.
    pub results: Vec<AnalyzedResume>,
    pub failures: Vec<BulkFailure>,
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub profile: CandidateProfile,
    pub job_role: JobRoleSpec,
    #[serde(default)]
    pub weights: Option<HashMap<String, f64>>,
}

/// Extraction and parsing are CPU-bound; keep them off the async workers.
async fn parse_upload(
    parser: Arc<ResumeParser>,
    file: UploadedFile,
) -> Result<CandidateProfile, AppError> {
    let format = file.format()?;
    let profile = tokio::task::spawn_blocking(move || parser.parse_document(&file.bytes, format))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("parse task failed: {e}")))??;
    Ok(profile)
}

async fn analyze_one(
    state: &AppState,
    file: UploadedFile,
    prepared: &PreparedRole,
    weights: Option<&ScoringWeights>,
) -> Result<AnalyzedResume, AppError> {
    let filename = file.filename.clone();
    let profile = parse_upload(state.parser.clone(), file).await?;
    let score = state
        .engine
        .score_prepared(&profile, prepared, weights)
        .await?;
    info!(
        "Analyzed {filename}: overall={} shortlisted={}",
        score.overall_score, score.is_shortlisted
    );
    Ok(AnalyzedResume {
        filename,
        profile,
        score,
    })
}

fn single_file(form: &mut UploadForm) -> Result<UploadedFile, AppError> {
    match form.files.len() {
        0 => Err(AppError::Validation("missing 'file' field".to_string())),
        1 => Ok(form.files.remove(0)),
        n => Err(AppError::Validation(format!(
            "expected one file, got {n}; use the bulk endpoint"
        ))),
    }
}

/// POST /api/v1/resumes/parse
pub async fn handle_parse(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<CandidateProfile>, AppError> {
    let mut form = UploadForm::read(multipart, state.config.max_upload_bytes).await?;
    let file = single_file(&mut form)?;
    let filename = file.filename.clone();
    let profile = parse_upload(state.parser.clone(), file).await?;
    info!(
        "Parsed {filename}: {} skills, {} years",
        profile.skills.len(),
        profile.experience_years
    );
    Ok(Json(profile))
}

/// POST /api/v1/resumes/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalyzedResume>, AppError> {
    let mut form = UploadForm::read(multipart, state.config.max_upload_bytes).await?;
    let file = single_file(&mut form)?;
    let role = form.require_job_role()?;
    if let Some(weights) = &form.weights {
        weights.validate()?;
    }

    let prepared = state.engine.prepare_role(&role).await?;
    let analyzed = analyze_one(&state, file, &prepared, form.weights.as_ref()).await?;
    Ok(Json(analyzed))
}

/// POST /api/v1/resumes/analyze/bulk
///
/// A file that fails to parse, score, or finish within the per-item deadline is reported in
/// `failures`; it never fails the request.
pub async fn handle_analyze_bulk(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<BulkAnalyzeResponse>, AppError> {
    let mut form = UploadForm::read(multipart, state.config.max_upload_bytes).await?;
    let role = form.require_job_role()?;
    if form.files.is_empty() {
        return Err(AppError::Validation("no 'file' fields in request".to_string()));
    }
    if form.files.len() > MAX_BULK_FILES {
        return Err(AppError::Validation(format!(
            "at most {MAX_BULK_FILES} files per request, got {}",
            form.files.len()
        )));
    }
    if let Some(weights) = &form.weights {
        weights.validate()?;
    }

    let prepared = state.engine.prepare_role(&role).await?;
    let weights = form.weights;
    let deadline = state.config.bulk_item_timeout;
    let total = form.files.len();

    let state_ref = &state;
    let prepared_ref = &prepared;
    let outcomes: Vec<(String, Result<AnalyzedResume, AppError>)> = stream::iter(form.files)
        .map(move |file| async move {
            let filename = file.filename.clone();
            let outcome = match tokio::time::timeout(
                deadline,
                analyze_one(state_ref, file, prepared_ref, weights.as_ref()),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(AppError::Timeout(format!(
                    "not analyzed within {}s",
                    deadline.as_secs()
                ))),
            };
            (filename, outcome)
        })
        .buffered(state.config.bulk_max_concurrency.max(1))
        .collect()
        .await;

    let mut results = Vec::new();
    let mut failures = Vec::new();
    for (filename, outcome) in outcomes {
        match outcome {
            Ok(analyzed) => results.push(analyzed),
            Err(e) => {
                warn!("Bulk item {filename} failed: {e}");
                failures.push(failure(filename, &e));
            }
        }
    }
    rank(&mut results, |r| &r.score);
    let shortlisted_count = results.iter().filter(|r| r.score.is_shortlisted).count();

    info!(
        "Bulk analysis of {total} files for '{}': {} scored, {shortlisted_count} shortlisted, {} failed",
        role.title,
        results.len(),
        failures.len()
    );

    Ok(Json(BulkAnalyzeResponse {
        total_processed: results.len(),
        shortlisted_count,
        results,
        failures,
    }))
}

fn failure(filename: String, error: &AppError) -> BulkFailure {
    BulkFailure {
        filename,
        code: error.code().to_string(),
        message: error.public_message(),
        retryable: matches!(
            error,
            AppError::Timeout(_) | AppError::EmbeddingUnavailable(_)
        ),
    }
}

/// POST /api/v1/score
pub async fn handle_score(
    State(state): State<AppState>,
    payload: Result<Json<ScoreRequest>, JsonRejection>,
) -> Result<Json<ScoreResult>, AppError> {
    let Json(req) = payload?;
    let weights = req
        .weights
        .as_ref()
        .map(ScoringWeights::from_map)
        .transpose()?;
    let result = state
        .engine
        .score(&req.profile, &req.job_role, weights.as_ref())
        .await?;
    Ok(Json(result))
}
