use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::advisor::SubmissionAssessment;
use crate::applications::service::{self, ApplicantView};
use crate::auth::Identity;
use crate::errors::{AppError, AppJson};
use crate::models::application::Application;
use crate::models::lenient;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    #[serde(default, deserialize_with = "lenient::text")]
    pub job_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitWorkRequest {
    #[serde(default, deserialize_with = "lenient::text")]
    pub job_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub submission_link: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Serialize)]
pub struct ApplicationResponse<T> {
    pub message: String,
    pub application: T,
}

fn required_job_id(job_id: Option<String>) -> Result<String, AppError> {
    job_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("Job ID is required".into()))
}

/// POST /api/jobs/apply
pub async fn handle_apply(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    AppJson(req): AppJson<ApplyRequest>,
) -> Result<(StatusCode, Json<ApplicationResponse<Application>>), AppError> {
    identity.ensure_matches(req.user_id.as_deref())?;
    let job_id = required_job_id(req.job_id)?;
    let application = service::apply(state.store.as_ref(), &identity, &job_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApplicationResponse {
            message: "Application submitted successfully".to_string(),
            application,
        }),
    ))
}

/// GET /api/jobs/:job_id/applicants
pub async fn handle_list_applicants(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(job_id): Path<String>,
) -> Result<Json<Vec<ApplicantView>>, AppError> {
    let applicants = service::list_applicants(state.store.as_ref(), &identity, &job_id).await?;
    Ok(Json(applicants))
}

/// PATCH /api/jobs/:job_id/applicants/:applicant_id
pub async fn handle_update_status(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((job_id, applicant_id)): Path<(String, String)>,
    AppJson(req): AppJson<StatusUpdateRequest>,
) -> Result<Json<ApplicationResponse<ApplicantView>>, AppError> {
    let application = service::update_status(
        state.store.as_ref(),
        &identity,
        &job_id,
        &applicant_id,
        &req.status,
    )
    .await?;
    Ok(Json(ApplicationResponse {
        message: format!("Application moved to {}", application.application.status),
        application,
    }))
}

/// PATCH /api/jobs/:job_id/applicants/:applicant_id/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((job_id, applicant_id)): Path<(String, String)>,
) -> Result<Json<SubmissionAssessment>, AppError> {
    let assessment = service::analyze(
        state.store.as_ref(),
        state.advisor.as_ref(),
        &identity,
        &job_id,
        &applicant_id,
    )
    .await?;
    Ok(Json(assessment))
}

/// POST /api/jobs/submit-work
pub async fn handle_submit_work(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    AppJson(req): AppJson<SubmitWorkRequest>,
) -> Result<Json<ApplicationResponse<Application>>, AppError> {
    identity.ensure_matches(req.user_id.as_deref())?;
    let job_id = required_job_id(req.job_id)?;
    let application = service::submit_work(
        state.store.as_ref(),
        &identity,
        &job_id,
        req.submission_link.as_deref().unwrap_or_default(),
        req.description.as_deref().unwrap_or_default(),
    )
    .await?;
    Ok(Json(ApplicationResponse {
        message: "Work submitted successfully".to_string(),
        application,
    }))
}

/// GET /api/jobs/applications/:user_id
pub async fn handle_candidate_applications(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Value>>, AppError> {
    identity.ensure_is(&user_id)?;
    let applications =
        service::list_candidate_applications(state.store.as_ref(), &user_id).await?;
    Ok(Json(applications))
}
