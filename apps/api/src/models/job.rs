use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobStatus {
    Draft,
    #[default]
    Active,
    SubmissionOpen,
    Closed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Draft => "Draft",
            JobStatus::Active => "Active",
            JobStatus::SubmissionOpen => "SubmissionOpen",
            JobStatus::Closed => "Closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Draft" => Some(JobStatus::Draft),
            "Active" => Some(JobStatus::Active),
            "SubmissionOpen" => Some(JobStatus::SubmissionOpen),
            "Closed" => Some(JobStatus::Closed),
            _ => None,
        }
    }

    /// Whether shortlisted candidates may submit proof of work.
    pub fn accepts_submissions(&self) -> bool {
        matches!(self, JobStatus::SubmissionOpen | JobStatus::Closed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobTask {
    #[serde(default)]
    pub description: String,
    /// Share of the budget paid out for this task.
    #[serde(default, deserialize_with = "lenient::amount")]
    pub payout: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub recruiter_id: String,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub tasks: Vec<JobTask>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub tech_stack: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub applicant_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields the client attaches that the service does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_accepts_client_shapes() {
        let job: Job = serde_json::from_value(json!({
            "title": "Landing page",
            "description": "Build it",
            "recruiterId": "r1",
            "status": "SubmissionOpen",
            "tasks": [{"description": "Hero", "payout": "40"}, {"description": "Footer", "payout": ""}],
            "budget": 500,
            "techStack": "React, Tailwind ,",
            "experience": "Junior"
        }))
        .unwrap();

        assert_eq!(job.status, JobStatus::SubmissionOpen);
        assert_eq!(job.tasks[0].payout, Some(40.0));
        assert_eq!(job.tasks[1].payout, None);
        assert_eq!(job.budget.as_deref(), Some("500"));
        assert_eq!(job.tech_stack, vec!["React", "Tailwind"]);
        assert_eq!(job.extra["experience"], json!("Junior"));
        assert_eq!(job.applicant_count, 0);
    }

    #[test]
    fn test_submission_window() {
        assert!(!JobStatus::Draft.accepts_submissions());
        assert!(!JobStatus::Active.accepts_submissions());
        assert!(JobStatus::SubmissionOpen.accepts_submissions());
        assert!(JobStatus::Closed.accepts_submissions());
    }

    #[test]
    fn test_status_wire_names_round_trip() {
        for s in ["Draft", "Active", "SubmissionOpen", "Closed"] {
            let status = JobStatus::parse(s).unwrap();
            assert_eq!(serde_json::to_value(status).unwrap(), json!(s));
        }
        assert!(JobStatus::parse("active").is_none());
    }
}
