use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::advisor::CourseSuggestion;
use crate::auth::Identity;
use crate::errors::{AppError, AppJson};
use crate::models::user::{UserProfile, UserRole};
use crate::state::AppState;
use crate::store::{paths, to_fields, Document, WriteBatch};
use crate::users::skills::skill_gaps;

const DEFAULT_COURSE_LIMIT: usize = 5;
const MAX_COURSE_LIMIT: usize = 10;

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRequest {
    #[serde(default, skip_serializing)]
    pub clerk_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub companies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countries: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub message: String,
    pub data: Value,
}

#[derive(Debug, Deserialize)]
pub struct CourseQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct CourseSuggestionsResponse {
    pub gaps: Vec<String>,
    pub courses: Vec<CourseSuggestion>,
}

/// POST /api/user/onboarding
///
/// Only the onboarding answers are written; anything else in the body is ignored.
pub async fn handle_onboarding(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    AppJson(req): AppJson<OnboardingRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    identity.ensure_matches(req.clerk_id.as_deref())?;

    let doc = paths::user(&identity.user_id);
    let mut fields = to_fields(&doc, &req)?;
    fields.insert("onboarded".into(), json!(true));
    fields.insert("updatedAt".into(), json!(Utc::now()));

    let mut batch = WriteBatch::new();
    batch.merge(doc, fields);
    state.store.commit(batch).await?;

    info!(user_id = %identity.user_id, role = ?req.role, "User onboarded");
    Ok(Json(MessageResponse {
        message: "User onboarding successful".to_string(),
    }))
}

/// POST /api/user/user-profile
pub async fn handle_save_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    AppJson(mut body): AppJson<Map<String, Value>>,
) -> Result<Json<ProfileResponse>, AppError> {
    let claimed = body.remove("clerkId");
    identity.ensure_matches(claimed.as_ref().and_then(Value::as_str))?;
    body.remove("id");

    serde_json::from_value::<UserProfile>(Value::Object(body.clone()))
        .map_err(|e| AppError::Validation(format!("Invalid profile: {e}")))?;
    body.insert("updatedAt".into(), json!(Utc::now()));

    let mut batch = WriteBatch::new();
    batch.merge(paths::user(&identity.user_id), body.clone());
    state.store.commit(batch).await?;

    info!(user_id = %identity.user_id, fields = body.len(), "User profile saved");
    Ok(Json(ProfileResponse {
        message: "User profile updated successfully".to_string(),
        data: Value::Object(body),
    }))
}

/// GET /api/user/user-profile/:clerk_id
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(clerk_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    identity.ensure_is(&clerk_id)?;
    let doc = state
        .store
        .get(&paths::user(&clerk_id))
        .await?
        .ok_or_else(|| AppError::NotFound("User profile not found".into()))?;
    Ok(Json(doc.data))
}

/// GET /api/user/course-suggestions/:clerk_id
pub async fn handle_course_suggestions(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(clerk_id): Path<String>,
    Query(query): Query<CourseQuery>,
) -> Result<Json<CourseSuggestionsResponse>, AppError> {
    identity.ensure_is(&clerk_id)?;
    let limit = query
        .limit
        .filter(|l| *l > 0)
        .unwrap_or(DEFAULT_COURSE_LIMIT)
        .min(MAX_COURSE_LIMIT);

    let profile = state
        .store
        .get(&paths::user(&clerk_id))
        .await?
        .ok_or_else(|| AppError::NotFound("User profile not found".into()))?;
    let skills = profile
        .decode::<UserProfile>()?
        .skills
        .unwrap_or_default();

    let saved: Vec<Document> = state.store.list(&paths::saved_jobs(&clerk_id)).await?;
    let gaps = skill_gaps(&skills, &saved);
    if gaps.is_empty() {
        return Ok(Json(CourseSuggestionsResponse {
            gaps,
            courses: Vec::new(),
        }));
    }

    let courses = state.advisor.suggest_courses(&skills, &gaps, limit).await?;
    info!(user_id = %clerk_id, gaps = gaps.len(), courses = courses.len(), "Course suggestions ready");
    Ok(Json(CourseSuggestionsResponse { gaps, courses }))
}
