use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::auth::Identity;
use crate::errors::{AppError, AppJson};
use crate::models::lenient;
use crate::models::roadmap::{Roadmap, RoadmapStep, StepStatus};
use crate::roadmaps::progress::advance;
use crate::state::AppState;
use crate::store::{paths, DocRef, WriteBatch};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    #[serde(default)]
    pub step_index: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub score: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub message: String,
    pub steps: Vec<RoadmapStep>,
}

/// GET /api/roadmaps/:clerk_id
pub async fn handle_list_roadmaps(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(clerk_id): Path<String>,
) -> Result<Json<Vec<Value>>, AppError> {
    identity.ensure_is(&clerk_id)?;
    let docs = state.store.list(&paths::roadmaps(&clerk_id)).await?;
    Ok(Json(docs.into_iter().map(|d| d.into_json_with_id()).collect()))
}

/// GET /api/roadmaps/:clerk_id/:roadmap_id
pub async fn handle_get_roadmap(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((clerk_id, roadmap_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    identity.ensure_is(&clerk_id)?;
    let doc = state
        .store
        .get(&DocRef::new(paths::roadmaps(&clerk_id), roadmap_id))
        .await?
        .ok_or_else(|| AppError::NotFound("Roadmap not found".into()))?;
    Ok(Json(doc.into_json_with_id()))
}

/// PUT /api/roadmaps/:clerk_id/:roadmap_id/progress
pub async fn handle_update_progress(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((clerk_id, roadmap_id)): Path<(String, String)>,
    AppJson(req): AppJson<ProgressRequest>,
) -> Result<Json<ProgressResponse>, AppError> {
    identity.ensure_is(&clerk_id)?;
    let (Some(step_index), Some(status)) = (req.step_index, req.status.as_deref()) else {
        return Err(AppError::Validation("Missing required fields".into()));
    };
    let status = StepStatus::parse(status)
        .ok_or_else(|| AppError::Validation(format!("Unknown step status '{status}'")))?;

    let doc_ref = DocRef::new(paths::roadmaps(&clerk_id), &roadmap_id);
    let doc = state
        .store
        .get(&doc_ref)
        .await?
        .ok_or_else(|| AppError::NotFound("Roadmap not found".into()))?;
    let mut roadmap: Roadmap = doc.decode()?;

    advance(&mut roadmap.steps, step_index, status, req.score)?;

    let mut fields = Map::new();
    fields.insert("steps".into(), json!(roadmap.steps));
    fields.insert("updatedAt".into(), json!(Utc::now()));
    let mut batch = WriteBatch::new();
    batch.merge(doc_ref, fields);
    state.store.commit(batch).await?;

    info!(user_id = %clerk_id, roadmap_id, step_index, ?status, "Roadmap progress updated");
    Ok(Json(ProgressResponse {
        message: "Roadmap progress updated".to_string(),
        steps: roadmap.steps,
    }))
}
