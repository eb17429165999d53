//! Recruiter-side job postings.

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::Identity;
use crate::errors::AppError;
use crate::jobs::feed::decode_job;
use crate::models::job::{Job, JobStatus};
use crate::store::{paths, sort_newest_first, Document, DocumentStore, WriteBatch};

/// Fields only the service writes. Stripped from client bodies.
const SERVER_FIELDS: [&str; 7] = [
    "id",
    "jobId",
    "recruiterId",
    "applicantCount",
    "postedAt",
    "createdAt",
    "updatedAt",
];

fn strip_server_fields(body: &mut Map<String, Value>) {
    for key in SERVER_FIELDS {
        body.remove(key);
    }
}

fn required_text(body: &Map<String, Value>, field: &str) -> Result<(), AppError> {
    match body.get(field).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(AppError::Validation(format!("'{field}' is required"))),
    }
}

/// Rejects status values outside the job lifecycle.
fn check_status(body: &Map<String, Value>) -> Result<(), AppError> {
    match body.get("status") {
        None => Ok(()),
        Some(Value::String(s)) if JobStatus::parse(s).is_some() => Ok(()),
        Some(other) => Err(AppError::Validation(format!(
            "Invalid job status {other}: expected Draft, Active, SubmissionOpen or Closed"
        ))),
    }
}

/// Ensures the stored shape still decodes as a `Job`.
fn check_shape(id: &str, fields: &Map<String, Value>) -> Result<Job, AppError> {
    let doc = Document {
        id: id.to_string(),
        data: Value::Object(fields.clone()),
    };
    doc.decode::<Job>()
        .map_err(|e| AppError::Validation(format!("Invalid job: {e}")))
}

pub async fn post_job(
    store: &dyn DocumentStore,
    identity: &Identity,
    mut body: Map<String, Value>,
) -> Result<Value, AppError> {
    required_text(&body, "title")?;
    required_text(&body, "description")?;
    check_status(&body)?;
    strip_server_fields(&mut body);

    let job_id = Uuid::new_v4().to_string();
    let now = json!(Utc::now());
    body.entry("status")
        .or_insert_with(|| json!(JobStatus::Active.as_str()));
    body.insert("recruiterId".into(), json!(identity.user_id));
    body.insert("applicantCount".into(), json!(0));
    body.insert("postedAt".into(), now.clone());
    body.insert("createdAt".into(), now.clone());
    body.insert("updatedAt".into(), now);

    check_shape(&job_id, &body)?;

    let doc = paths::job(&job_id);
    let mut batch = WriteBatch::new();
    batch.create(doc.clone(), body.clone());
    store.commit(batch).await?;

    info!(job_id, recruiter_id = %identity.user_id, "Job posted");
    Ok(Document {
        id: job_id,
        data: Value::Object(body),
    }
    .into_json_with_id())
}

/// Merge-updates a job owned by the caller. The body carries `jobId` plus any
/// editable fields.
pub async fn update_job(
    store: &dyn DocumentStore,
    identity: &Identity,
    mut body: Map<String, Value>,
) -> Result<Value, AppError> {
    let job_id = body
        .get("jobId")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .ok_or_else(|| AppError::Validation("Job ID is required".into()))?;
    check_status(&body)?;
    strip_server_fields(&mut body);

    let doc = paths::job(&job_id);
    let existing = store
        .get(&doc)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    let current = existing.decode::<Job>()?;
    identity.ensure_is(&current.recruiter_id)?;

    body.insert("updatedAt".into(), json!(Utc::now()));

    let mut merged = match existing.data {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    merged.extend(body.clone());
    let updated = check_shape(&job_id, &merged)?;

    let mut batch = WriteBatch::new();
    batch.merge(doc, body);
    store.commit(batch).await?;

    if updated.status != current.status {
        info!(job_id, from = %current.status, to = %updated.status, "Job status changed");
    }
    Ok(Document {
        id: job_id,
        data: Value::Object(merged),
    }
    .into_json_with_id())
}

/// Every job posted by `recruiter_id`, newest first.
pub async fn list_recruiter_jobs(
    store: &dyn DocumentStore,
    recruiter_id: &str,
) -> Result<Vec<Job>, AppError> {
    let mut docs = store
        .list_where_eq(paths::JOBS, "recruiterId", &json!(recruiter_id))
        .await?;
    sort_newest_first(&mut docs, "createdAt");
    Ok(docs.iter().filter_map(decode_job).collect())
}
