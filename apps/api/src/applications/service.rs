//! Apply, review, submit and analyze.
//!
//! The applicant document at `jobs/{jobId}/applicants/{candidateId}` is the
//! source of truth. `users/{candidateId}/applications/{jobId}` is a small index
//! (`jobId`, `status`, timestamps) kept in step with it by writing both in the
//! same batch.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::advisor::{Advisor, SubmissionAssessment, SubmissionContext};
use crate::auth::Identity;
use crate::errors::AppError;
use crate::models::application::{Application, ApplicationStatus, Submission};
use crate::models::job::{Job, JobStatus};
use crate::store::{
    paths, sort_newest_first, to_fields, DocRef, Document, DocumentStore, StoreError, WriteBatch,
};

/// An application as shown to the recruiter, with the moves they may make next.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantView {
    #[serde(flatten)]
    pub application: Application,
    pub available_transitions: Vec<ApplicationStatus>,
}

impl From<Application> for ApplicantView {
    fn from(application: Application) -> Self {
        let available_transitions = application.status.recruiter_transitions().to_vec();
        Self {
            application,
            available_transitions,
        }
    }
}

async fn load_job(store: &dyn DocumentStore, job_id: &str) -> Result<Job, AppError> {
    let doc = store
        .get(&paths::job(job_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    let mut job: Job = doc.decode()?;
    job.id = doc.id;
    Ok(job)
}

/// Loads a job and checks that the caller posted it.
async fn load_owned_job(
    store: &dyn DocumentStore,
    identity: &Identity,
    job_id: &str,
) -> Result<Job, AppError> {
    let job = load_job(store, job_id).await?;
    identity.ensure_is(&job.recruiter_id)?;
    Ok(job)
}

async fn load_application(
    store: &dyn DocumentStore,
    job_id: &str,
    candidate_id: &str,
) -> Result<Document, AppError> {
    store
        .get(&paths::applicant(job_id, candidate_id))
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No application from {candidate_id} for job {job_id}"
            ))
        })
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Applies a merge to an already-loaded document, returning the result the
/// store will hold after commit.
fn merged(doc: &Document, fields: &Map<String, Value>) -> Document {
    let mut data = object(doc.data.clone());
    data.extend(fields.clone());
    Document {
        id: doc.id.clone(),
        data: Value::Object(data),
    }
}

/// Status fields written for a transition, to the applicant and to the index.
fn status_fields(status: ApplicationStatus, now: DateTime<Utc>) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("status".into(), json!(status));
    fields.insert("updatedAt".into(), json!(now));
    fields.insert(status.timestamp_field().into(), json!(now));
    fields
}

fn index_doc(candidate_id: &str, job_id: &str) -> DocRef {
    DocRef::new(paths::user_applications(candidate_id), job_id)
}

pub async fn apply(
    store: &dyn DocumentStore,
    identity: &Identity,
    job_id: &str,
) -> Result<Application, AppError> {
    let candidate_id = identity.user_id.as_str();
    let job = load_job(store, job_id).await?;
    if job.status != JobStatus::Active {
        return Err(AppError::Conflict(format!(
            "Job is not accepting applications (status '{}')",
            job.status
        )));
    }

    let profile = store
        .get(&paths::user(candidate_id))
        .await?
        .ok_or_else(|| AppError::NotFound("User profile not found".into()))?;

    let applicant_doc = paths::applicant(job_id, candidate_id);
    if store.get(&applicant_doc).await?.is_some() {
        return Err(AppError::Conflict("Already applied to this job".into()));
    }

    let now = Utc::now();
    let application = Application::new(job_id, candidate_id, profile.data, now);

    let mut index = Map::new();
    index.insert("jobId".into(), json!(job_id));
    index.insert("status".into(), json!(ApplicationStatus::Applied));
    index.insert("appliedAt".into(), json!(now));
    index.insert("updatedAt".into(), json!(now));

    let mut batch = WriteBatch::new();
    batch
        .create(applicant_doc.clone(), to_fields(&applicant_doc, &application)?)
        .create(index_doc(candidate_id, job_id), index)
        .delete(DocRef::new(paths::inbox(candidate_id), job_id))
        .increment(paths::job(job_id), "applicantCount", 1);

    match store.commit(batch).await {
        Ok(()) => {}
        // Lost a race with a concurrent apply for the same pair.
        Err(StoreError::AlreadyExists(_)) => {
            return Err(AppError::Conflict("Already applied to this job".into()))
        }
        Err(e) => return Err(e.into()),
    }

    info!(job_id, candidate_id, "Application submitted");
    Ok(application)
}

/// Applications for a job the caller posted, newest first.
pub async fn list_applicants(
    store: &dyn DocumentStore,
    identity: &Identity,
    job_id: &str,
) -> Result<Vec<ApplicantView>, AppError> {
    load_owned_job(store, identity, job_id).await?;

    let mut docs = store.list(&paths::applicants(job_id)).await?;
    sort_newest_first(&mut docs, "appliedAt");
    Ok(docs
        .iter()
        .filter_map(|doc| match doc.decode::<Application>() {
            Ok(app) => Some(ApplicantView::from(app)),
            Err(e) => {
                warn!("Skipping malformed application {job_id}/{}: {e}", doc.id);
                None
            }
        })
        .collect())
}

/// A recruiter moving an application along the status graph.
pub async fn update_status(
    store: &dyn DocumentStore,
    identity: &Identity,
    job_id: &str,
    candidate_id: &str,
    requested: &str,
) -> Result<ApplicantView, AppError> {
    let to = ApplicationStatus::parse(requested).ok_or_else(|| {
        AppError::Validation(format!("Unknown application status '{requested}'"))
    })?;
    load_owned_job(store, identity, job_id).await?;

    let doc = load_application(store, job_id, candidate_id).await?;
    let current: Application = doc.decode()?;
    let changed = current
        .status
        .recruiter_move(to)
        .map_err(|e| AppError::Conflict(e.to_string()))?;
    if !changed {
        return Ok(current.into());
    }

    let fields = status_fields(to, Utc::now());
    let mut batch = WriteBatch::new();
    batch
        .merge(paths::applicant(job_id, candidate_id), fields.clone())
        .merge(index_doc(candidate_id, job_id), fields.clone());
    store.commit(batch).await?;

    info!(job_id, candidate_id, from = %current.status, %to, "Application status changed");
    Ok(merged(&doc, &fields).decode::<Application>()?.into())
}

/// The candidate's proof-of-work submission.
pub async fn submit_work(
    store: &dyn DocumentStore,
    identity: &Identity,
    job_id: &str,
    link: &str,
    description: &str,
) -> Result<Application, AppError> {
    let link = link.trim();
    if link.is_empty() {
        return Err(AppError::Validation("Submission link is required".into()));
    }
    let candidate_id = identity.user_id.as_str();
    let job = load_job(store, job_id).await?;
    let doc = load_application(store, job_id, candidate_id).await?;
    let current: Application = doc.decode()?;

    current
        .status
        .candidate_submit(job.status)
        .map_err(|e| AppError::Conflict(e.to_string()))?;

    let now = Utc::now();
    let submission = Submission {
        link: link.to_string(),
        description: description.trim().to_string(),
        submitted_at: now,
    };
    let status = status_fields(ApplicationStatus::WorkSubmitted, now);
    let mut fields = status.clone();
    fields.insert("submission".into(), json!(submission));

    let mut batch = WriteBatch::new();
    batch
        .merge(paths::applicant(job_id, candidate_id), fields.clone())
        .merge(index_doc(candidate_id, job_id), status);
    store.commit(batch).await?;

    info!(job_id, candidate_id, "Work submitted");
    Ok(merged(&doc, &fields).decode()?)
}

/// Scores a submission with the advisor. Re-running replaces the previous
/// assessment; the application status is left alone.
pub async fn analyze(
    store: &dyn DocumentStore,
    advisor: &dyn Advisor,
    identity: &Identity,
    job_id: &str,
    candidate_id: &str,
) -> Result<SubmissionAssessment, AppError> {
    let job = load_owned_job(store, identity, job_id).await?;
    let application: Application = load_application(store, job_id, candidate_id)
        .await?
        .decode()?;
    let submission = application.submission.ok_or_else(|| {
        AppError::UnprocessableEntity("Application has no work submission to analyze".into())
    })?;

    let ctx = SubmissionContext {
        job_title: job.title,
        job_description: job.description,
        tasks: job.tasks,
        tech_stack: job.tech_stack,
        candidate: application.candidate,
        submission_link: submission.link,
        submission_notes: submission.description,
    };
    let assessment = advisor.assess_submission(&ctx).await?;

    let mut fields = Map::new();
    fields.insert("aiScore".into(), json!(assessment.score));
    fields.insert("aiSummary".into(), json!(assessment.summary));
    fields.insert("aiPros".into(), json!(assessment.pros));
    fields.insert("aiAnalyzedAt".into(), json!(Utc::now()));
    let mut batch = WriteBatch::new();
    batch.merge(paths::applicant(job_id, candidate_id), fields);
    store.commit(batch).await?;

    info!(job_id, candidate_id, score = assessment.score, "Submission analyzed");
    Ok(assessment)
}

/// The caller's applications joined with the current job title and status.
pub async fn list_candidate_applications(
    store: &dyn DocumentStore,
    user_id: &str,
) -> Result<Vec<Value>, AppError> {
    let mut entries = store.list(&paths::user_applications(user_id)).await?;
    sort_newest_first(&mut entries, "appliedAt");

    let job_ids: Vec<String> = entries.iter().map(|d| d.id.clone()).collect();
    let jobs: HashMap<String, Job> = store
        .get_all(paths::JOBS, &job_ids)
        .await?
        .iter()
        .filter_map(|doc| doc.decode::<Job>().ok().map(|job| (doc.id.clone(), job)))
        .collect();

    Ok(entries
        .into_iter()
        .map(|entry| {
            let status = entry
                .data
                .get("status")
                .and_then(Value::as_str)
                .and_then(ApplicationStatus::parse);
            let job = jobs.get(&entry.id);
            let can_submit_work = match (status, job) {
                (Some(s), Some(j)) => s.candidate_submit(j.status).is_ok(),
                _ => false,
            };

            let mut view = object(entry.into_json_with_id());
            view.insert("jobTitle".into(), json!(job.map(|j| j.title.as_str())));
            view.insert("jobStatus".into(), json!(job.map(|j| j.status)));
            view.insert("canSubmitWork".into(), json!(can_submit_work));
            Value::Object(view)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::advisor::testing::ScriptedAdvisor;
    use crate::store::MemoryDocumentStore;

    async fn seeded(job_status: &str) -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new();
        store
            .seed(
                paths::job("j1"),
                json!({
                    "title": "Landing page",
                    "description": "Build it",
                    "recruiterId": "r1",
                    "status": job_status,
                    "applicantCount": 0,
                    "techStack": ["React"]
                }),
            )
            .await;
        store
            .seed(paths::user("c1"), json!({"role": "Candidate", "firstName": "Ada"}))
            .await;
        store
            .seed(DocRef::new(paths::inbox("c1"), "j1"), json!({"title": "Landing page"}))
            .await;
        store
    }

    fn recruiter() -> Identity {
        Identity::new("r1")
    }

    fn candidate() -> Identity {
        Identity::new("c1")
    }

    async fn set_job_status(store: &MemoryDocumentStore, status: &str) {
        let mut fields = Map::new();
        fields.insert("status".into(), json!(status));
        let mut batch = WriteBatch::new();
        batch.merge(paths::job("j1"), fields);
        store.commit(batch).await.unwrap();
    }

    #[tokio::test]
    async fn test_apply_writes_everything_in_one_batch() {
        let store = seeded("Active").await;
        let app = apply(&store, &candidate(), "j1").await.unwrap();
        assert_eq!(app.status, ApplicationStatus::Applied);
        assert_eq!(app.candidate["firstName"], json!("Ada"));

        let job = store.get(&paths::job("j1")).await.unwrap().unwrap();
        assert_eq!(job.data["applicantCount"], json!(1));
        assert!(store.get(&index_doc("c1", "j1")).await.unwrap().is_some());
        assert!(store
            .get(&DocRef::new(paths::inbox("c1"), "j1"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_apply_conflicts_without_double_count() {
        let store = seeded("Active").await;
        apply(&store, &candidate(), "j1").await.unwrap();
        let again = apply(&store, &candidate(), "j1").await;
        assert!(matches!(again, Err(AppError::Conflict(_))));

        let job = store.get(&paths::job("j1")).await.unwrap().unwrap();
        assert_eq!(job.data["applicantCount"], json!(1));
    }

    #[tokio::test]
    async fn test_apply_preconditions() {
        let store = seeded("Closed").await;
        assert!(matches!(
            apply(&store, &candidate(), "j1").await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            apply(&store, &candidate(), "missing").await,
            Err(AppError::NotFound(_))
        ));

        set_job_status(&store, "Active").await;
        assert!(matches!(
            apply(&store, &Identity::new("no-profile"), "j1").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_recruiter_walks_the_graph() {
        let store = seeded("Active").await;
        apply(&store, &candidate(), "j1").await.unwrap();

        let view = update_status(&store, &recruiter(), "j1", "c1", "Shortlisted")
            .await
            .unwrap();
        assert_eq!(view.application.status, ApplicationStatus::Shortlisted);
        assert!(view.application.shortlisted_at.is_some());
        assert_eq!(
            view.available_transitions,
            vec![ApplicationStatus::Interview, ApplicationStatus::Rejected]
        );

        let index = store.get(&index_doc("c1", "j1")).await.unwrap().unwrap();
        assert_eq!(index.data["status"], json!("Shortlisted"));

        // Repeating the current status writes nothing and succeeds.
        let same = update_status(&store, &recruiter(), "j1", "c1", "Shortlisted")
            .await
            .unwrap();
        assert_eq!(same.application.updated_at, view.application.updated_at);

        let skip = update_status(&store, &recruiter(), "j1", "c1", "Hired").await;
        assert!(matches!(skip, Err(AppError::Conflict(_))));

        let bogus = update_status(&store, &recruiter(), "j1", "c1", "Promoted").await;
        assert!(matches!(bogus, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_only_the_owner_reviews() {
        let store = seeded("Active").await;
        apply(&store, &candidate(), "j1").await.unwrap();

        assert!(matches!(
            list_applicants(&store, &Identity::new("r2"), "j1").await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            update_status(&store, &candidate(), "j1", "c1", "Shortlisted").await,
            Err(AppError::Forbidden)
        ));

        let listed = list_applicants(&store, &recruiter(), "j1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(
            listed[0].available_transitions,
            vec![ApplicationStatus::Shortlisted, ApplicationStatus::Rejected]
        );
    }

    #[tokio::test]
    async fn test_submission_window_enforced() {
        let store = seeded("Active").await;
        apply(&store, &candidate(), "j1").await.unwrap();
        update_status(&store, &recruiter(), "j1", "c1", "Shortlisted")
            .await
            .unwrap();

        let early = submit_work(&store, &candidate(), "j1", "https://demo", "").await;
        assert!(matches!(early, Err(AppError::Conflict(_))));

        set_job_status(&store, "SubmissionOpen").await;
        let blank = submit_work(&store, &candidate(), "j1", "  ", "").await;
        assert!(matches!(blank, Err(AppError::Validation(_))));

        let app = submit_work(&store, &candidate(), "j1", " https://demo ", "notes")
            .await
            .unwrap();
        assert_eq!(app.status, ApplicationStatus::WorkSubmitted);
        let submission = app.submission.unwrap();
        assert_eq!(submission.link, "https://demo");
        assert_eq!(submission.description, "notes");

        let listed = list_candidate_applications(&store, "c1").await.unwrap();
        assert_eq!(listed[0]["status"], json!("Work Submitted"));
        assert_eq!(listed[0]["jobStatus"], json!("SubmissionOpen"));
        assert_eq!(listed[0]["canSubmitWork"], json!(false));

        let twice = submit_work(&store, &candidate(), "j1", "https://again", "").await;
        assert!(matches!(twice, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_analyze_requires_submission_and_overwrites() {
        let store = seeded("Active").await;
        let advisor = ScriptedAdvisor::default();
        apply(&store, &candidate(), "j1").await.unwrap();

        let early = analyze(&store, &advisor, &recruiter(), "j1", "c1").await;
        assert!(matches!(early, Err(AppError::UnprocessableEntity(_))));
        assert_eq!(advisor.assessments.load(Ordering::SeqCst), 0);

        update_status(&store, &recruiter(), "j1", "c1", "Shortlisted")
            .await
            .unwrap();
        set_job_status(&store, "SubmissionOpen").await;
        submit_work(&store, &candidate(), "j1", "https://demo", "")
            .await
            .unwrap();

        let first = analyze(&store, &advisor, &recruiter(), "j1", "c1").await.unwrap();
        let second = analyze(&store, &advisor, &recruiter(), "j1", "c1").await.unwrap();
        assert_ne!(first.score, second.score);

        let stored: Application = store
            .get(&paths::applicant("j1", "c1"))
            .await
            .unwrap()
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!(stored.ai_score, Some(second.score));
        assert_eq!(stored.ai_summary.as_deref(), Some(second.summary.as_str()));
        assert_eq!(stored.ai_pros, Some(second.pros));
        assert_eq!(stored.status, ApplicationStatus::WorkSubmitted);
    }

    #[tokio::test]
    async fn test_candidate_listing_joins_jobs() {
        let store = seeded("Active").await;
        apply(&store, &candidate(), "j1").await.unwrap();
        store
            .seed(
                index_doc("c1", "gone"),
                json!({"jobId": "gone", "status": "Applied", "appliedAt": "2020-01-01T00:00:00Z"}),
            )
            .await;

        let listed = list_candidate_applications(&store, "c1").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0]["id"], json!("j1"));
        assert_eq!(listed[0]["jobTitle"], json!("Landing page"));
        assert_eq!(listed[0]["jobStatus"], json!("Active"));
        assert_eq!(listed[1]["jobTitle"], Value::Null);
        assert_eq!(listed[1]["canSubmitWork"], json!(false));
    }
}
