use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::auth::Identity;
use crate::errors::{AppError, AppJson};
use crate::jobs::actions::{self, BatchActionsRequest, BatchOutcome, InboxPage, SwipeKind};
use crate::jobs::feed::{build_feed, FeedPage};
use crate::jobs::postings;
use crate::jobs::PageParams;
use crate::models::job::Job;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveJobResponse {
    pub message: String,
    pub job_id: String,
}

#[derive(Serialize)]
pub struct JobResponse {
    pub message: String,
    pub job: Value,
}

/// GET /api/jobs/feed/:clerk_id
pub async fn handle_feed(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(clerk_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<FeedPage>, AppError> {
    identity.ensure_is(&clerk_id)?;
    let page = params.resolve(state.config.max_page_size);
    let feed = build_feed(state.store.as_ref(), &clerk_id, page).await?;
    Ok(Json(feed))
}

/// POST /api/jobs/batch-actions/:clerk_id
pub async fn handle_batch_actions(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(clerk_id): Path<String>,
    AppJson(req): AppJson<BatchActionsRequest>,
) -> Result<Json<BatchOutcome>, AppError> {
    identity.ensure_is(&clerk_id)?;
    let outcome = actions::apply_batch(state.store.as_ref(), &clerk_id, &req.actions).await?;
    Ok(Json(outcome))
}

/// POST /api/jobs/save-job/:clerk_id
pub async fn handle_save_job(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(clerk_id): Path<String>,
    AppJson(body): AppJson<Map<String, Value>>,
) -> Result<Json<SaveJobResponse>, AppError> {
    identity.ensure_is(&clerk_id)?;
    let job_id = actions::save_job(state.store.as_ref(), &clerk_id, body).await?;
    Ok(Json(SaveJobResponse {
        message: "Job saved successfully".to_string(),
        job_id,
    }))
}

/// GET /api/jobs/:clerk_id
pub async fn handle_inbox(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(clerk_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<InboxPage>, AppError> {
    identity.ensure_is(&clerk_id)?;
    let page = params.resolve(state.config.max_page_size);
    let inbox = actions::list_inbox(state.store.as_ref(), &clerk_id, page).await?;
    Ok(Json(inbox))
}

/// GET /api/jobs/saved-jobs/:clerk_id
pub async fn handle_saved_jobs(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(clerk_id): Path<String>,
) -> Result<Json<Vec<Value>>, AppError> {
    identity.ensure_is(&clerk_id)?;
    let saved = actions::list_outcomes(state.store.as_ref(), &clerk_id, SwipeKind::Save).await?;
    Ok(Json(saved))
}

/// GET /api/jobs/passed-jobs/:clerk_id
pub async fn handle_passed_jobs(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(clerk_id): Path<String>,
) -> Result<Json<Vec<Value>>, AppError> {
    identity.ensure_is(&clerk_id)?;
    let passed = actions::list_outcomes(state.store.as_ref(), &clerk_id, SwipeKind::Pass).await?;
    Ok(Json(passed))
}

/// POST /api/jobs/post
pub async fn handle_post_job(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    AppJson(mut body): AppJson<Map<String, Value>>,
) -> Result<(StatusCode, Json<JobResponse>), AppError> {
    // Older clients echo the recruiter id in the body.
    let claimed = body.remove("clerkId");
    identity.ensure_matches(claimed.as_ref().and_then(Value::as_str))?;

    let job = postings::post_job(state.store.as_ref(), &identity, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(JobResponse {
            message: "Job posted successfully".to_string(),
            job,
        }),
    ))
}

/// POST /api/jobs/update
pub async fn handle_update_job(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    AppJson(mut body): AppJson<Map<String, Value>>,
) -> Result<Json<JobResponse>, AppError> {
    body.remove("clerkId");
    let job = postings::update_job(state.store.as_ref(), &identity, body).await?;
    Ok(Json(JobResponse {
        message: "Job updated successfully".to_string(),
        job,
    }))
}

/// GET /api/jobs/posted/:recruiter_id
pub async fn handle_posted_jobs(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(recruiter_id): Path<String>,
) -> Result<Json<Vec<Job>>, AppError> {
    identity.ensure_is(&recruiter_id)?;
    let jobs = postings::list_recruiter_jobs(state.store.as_ref(), &recruiter_id).await?;
    Ok(Json(jobs))
}
