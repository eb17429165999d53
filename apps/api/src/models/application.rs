use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use crate::applications::status::ApplicationStatus;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub link: String,
    #[serde(default)]
    pub description: String,
    pub submitted_at: DateTime<Utc>,
}

/// One candidate's application to one job, stored at
/// `jobs/{jobId}/applicants/{candidateId}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub job_id: String,
    pub candidate_id: String,
    pub status: ApplicationStatus,
    /// Candidate profile as it was when they applied.
    #[serde(default)]
    pub candidate: Value,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortlisted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interview_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hired_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission: Option<Submission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_pros: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analyzed_at: Option<DateTime<Utc>>,
}

impl Application {
    pub fn new(job_id: &str, candidate_id: &str, candidate: Value, now: DateTime<Utc>) -> Self {
        Self {
            job_id: job_id.to_string(),
            candidate_id: candidate_id.to_string(),
            status: ApplicationStatus::Applied,
            candidate,
            applied_at: now,
            updated_at: now,
            shortlisted_at: None,
            interview_at: None,
            work_submitted_at: None,
            rejected_at: None,
            hired_at: None,
            submission: None,
            ai_score: None,
            ai_summary: None,
            ai_pros: None,
            ai_analyzed_at: None,
        }
    }
}
