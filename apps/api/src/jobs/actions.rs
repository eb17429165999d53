//! Swipe actions on the candidate inbox.
//!
//! Every acted-on job leaves the inbox (`users/{u}/job`) and lands in exactly
//! one outcome collection (`saved_jobs` or `passed_jobs`). The outcome write,
//! the delete of the opposite outcome and the inbox delete always travel in the
//! same `WriteBatch`, so a job is never in two of those places.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::errors::AppError;
use crate::jobs::{PageRequest, Pagination};
use crate::models::lenient;
use crate::store::{paths, sort_newest_first, DocRef, DocumentStore, WriteBatch};

/// Upper bound on actions accepted in one batch request.
pub const MAX_BATCH_ACTIONS: usize = 200;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SwipeKind {
    Pass,
    Save,
}

impl SwipeKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "pass" => Some(SwipeKind::Pass),
            "save" => Some(SwipeKind::Save),
            _ => None,
        }
    }

    fn outcome_collection(&self, user_id: &str) -> String {
        match self {
            SwipeKind::Pass => paths::passed_jobs(user_id),
            SwipeKind::Save => paths::saved_jobs(user_id),
        }
    }

    fn opposite(&self) -> Self {
        match self {
            SwipeKind::Pass => SwipeKind::Save,
            SwipeKind::Save => SwipeKind::Pass,
        }
    }

    fn timestamp_field(&self) -> &'static str {
        match self {
            SwipeKind::Pass => "passedAt",
            SwipeKind::Save => "savedAt",
        }
    }
}

/// One queued swipe as sent by the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeAction {
    #[serde(default, deserialize_with = "lenient::text")]
    pub job_id: Option<String>,
    pub action: String,
    /// Snapshot of the job card, stored alongside the outcome.
    #[serde(default)]
    pub job_data: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchActionsRequest {
    #[serde(default)]
    pub actions: Vec<SwipeAction>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BatchOutcome {
    pub message: String,
    pub processed: usize,
    pub skipped: usize,
}

/// Adds the outcome write, the opposite outcome delete and the inbox delete
/// for one job.
fn push_outcome(
    batch: &mut WriteBatch,
    user_id: &str,
    job_id: &str,
    kind: SwipeKind,
    job_data: Option<&Value>,
    now: DateTime<Utc>,
) {
    let mut data: Map<String, Value> = match job_data {
        Some(Value::Object(map)) => map.clone(),
        _ => Map::new(),
    };
    data.insert("jobId".to_string(), Value::String(job_id.to_string()));
    data.insert(kind.timestamp_field().to_string(), json!(now));

    batch.merge(DocRef::new(kind.outcome_collection(user_id), job_id), data);
    batch.delete(DocRef::new(kind.opposite().outcome_collection(user_id), job_id));
    batch.delete(DocRef::new(paths::inbox(user_id), job_id));
}

/// Turns queued swipes into a single write batch. Unknown actions reject the
/// whole request; entries without a job id are skipped. When a job appears more
/// than once, its last action wins.
pub fn plan_batch(
    user_id: &str,
    actions: &[SwipeAction],
    now: DateTime<Utc>,
) -> Result<(WriteBatch, usize), AppError> {
    if actions.len() > MAX_BATCH_ACTIONS {
        return Err(AppError::Validation(format!(
            "At most {MAX_BATCH_ACTIONS} actions per batch"
        )));
    }

    let mut latest: Vec<(&str, SwipeKind, Option<&Value>)> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut processed = 0;
    for item in actions {
        let kind = SwipeKind::parse(&item.action).ok_or_else(|| {
            AppError::Validation(format!(
                "Unknown action '{}': expected 'pass' or 'save'",
                item.action
            ))
        })?;
        let Some(job_id) = item.job_id.as_deref().filter(|id| !id.is_empty()) else {
            continue;
        };
        let entry = (job_id, kind, item.job_data.as_ref());
        match slots.get(job_id) {
            Some(&i) => latest[i] = entry,
            None => {
                slots.insert(job_id, latest.len());
                latest.push(entry);
            }
        }
        processed += 1;
    }

    let mut batch = WriteBatch::new();
    for (job_id, kind, job_data) in latest {
        push_outcome(&mut batch, user_id, job_id, kind, job_data, now);
    }
    Ok((batch, processed))
}

pub async fn apply_batch(
    store: &dyn DocumentStore,
    user_id: &str,
    actions: &[SwipeAction],
) -> Result<BatchOutcome, AppError> {
    if actions.is_empty() {
        return Ok(BatchOutcome {
            message: "No actions to process".to_string(),
            processed: 0,
            skipped: 0,
        });
    }

    let (batch, processed) = plan_batch(user_id, actions, Utc::now())?;
    let skipped = actions.len() - processed;
    if !batch.is_empty() {
        store.commit(batch).await?;
    }

    info!(user_id, processed, skipped, "Applied swipe batch");
    Ok(BatchOutcome {
        message: "Batch actions processing completed".to_string(),
        processed,
        skipped,
    })
}

/// Saves one job right away. Accepts `jobId` or `id`; any other fields are
/// stored as the job snapshot.
pub async fn save_job(
    store: &dyn DocumentStore,
    user_id: &str,
    mut body: Map<String, Value>,
) -> Result<String, AppError> {
    let job_id = ["jobId", "id"]
        .iter()
        .find_map(|k| match body.get(*k) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .ok_or_else(|| AppError::Validation("Job ID is required".to_string()))?;
    body.remove("id");

    let mut batch = WriteBatch::new();
    push_outcome(
        &mut batch,
        user_id,
        &job_id,
        SwipeKind::Save,
        Some(&Value::Object(body)),
        Utc::now(),
    );
    store.commit(batch).await?;

    info!(user_id, job_id, "Saved job");
    Ok(job_id)
}

#[derive(Debug, Clone, Serialize)]
pub struct InboxPage {
    pub jobs: Vec<Value>,
    pub pagination: Pagination,
}

/// The user's inbox, most recently updated first.
pub async fn list_inbox(
    store: &dyn DocumentStore,
    user_id: &str,
    page: PageRequest,
) -> Result<InboxPage, AppError> {
    let mut docs = store.list(&paths::inbox(user_id)).await?;
    sort_newest_first(&mut docs, "updatedAt");
    let (docs, pagination) = page.slice(docs);
    Ok(InboxPage {
        jobs: docs.into_iter().map(|d| d.into_json_with_id()).collect(),
        pagination,
    })
}

pub async fn list_outcomes(
    store: &dyn DocumentStore,
    user_id: &str,
    kind: SwipeKind,
) -> Result<Vec<Value>, AppError> {
    let mut docs = store.list(&kind.outcome_collection(user_id)).await?;
    sort_newest_first(&mut docs, kind.timestamp_field());
    Ok(docs.into_iter().map(|d| d.into_json_with_id()).collect())
}
