//! Advisor — generative-AI assistance behind a trait.
//!
//! `AppState` holds an `Arc<dyn Advisor>`; `LlmAdvisor` is the production
//! implementation. Callers never see the provider or its prompts.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, UNTRUSTED_INPUT_INSTRUCTION};
use crate::llm_client::LlmClient;
use crate::models::job::JobTask;

pub mod prompts;

use prompts::{ASSESS_SUBMISSION_PROMPT, SUGGEST_COURSES_PROMPT};

/// Everything the advisor sees when assessing a submission.
#[derive(Debug, Clone)]
pub struct SubmissionContext {
    pub job_title: String,
    pub job_description: String,
    pub tasks: Vec<JobTask>,
    pub tech_stack: Vec<String>,
    pub candidate: Value,
    pub submission_link: String,
    pub submission_notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmissionAssessment {
    pub score: u8,
    pub summary: String,
    #[serde(default)]
    pub pros: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseSuggestion {
    pub skill: String,
    pub title: String,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[async_trait]
pub trait Advisor: Send + Sync {
    async fn assess_submission(
        &self,
        ctx: &SubmissionContext,
    ) -> Result<SubmissionAssessment, AppError>;

    /// `gaps` is ordered most-requested first and never empty.
    async fn suggest_courses(
        &self,
        skills: &[String],
        gaps: &[String],
        limit: usize,
    ) -> Result<Vec<CourseSuggestion>, AppError>;
}

pub struct LlmAdvisor(pub LlmClient);

/// Raw model output; the score arrives as whatever number the model chose.
#[derive(Debug, Deserialize)]
struct RawAssessment {
    score: f64,
    summary: String,
    #[serde(default)]
    pros: Vec<String>,
}

const MAX_PROS: usize = 5;

#[async_trait]
impl Advisor for LlmAdvisor {
    async fn assess_submission(
        &self,
        ctx: &SubmissionContext,
    ) -> Result<SubmissionAssessment, AppError> {
        let tasks = if ctx.tasks.is_empty() {
            "(none listed)".to_string()
        } else {
            ctx.tasks
                .iter()
                .map(|t| match t.payout {
                    Some(p) => format!("- {} (payout {p})", t.description),
                    None => format!("- {}", t.description),
                })
                .collect::<Vec<_>>()
                .join("\n")
        };
        let prompt = ASSESS_SUBMISSION_PROMPT
            .replace("{title}", &ctx.job_title)
            .replace("{description}", &ctx.job_description)
            .replace("{tasks}", &tasks)
            .replace("{tech_stack}", &ctx.tech_stack.join(", "))
            .replace("{candidate}", &ctx.candidate.to_string())
            .replace("{link}", &ctx.submission_link)
            .replace("{notes}", &ctx.submission_notes);
        let system = format!("{JSON_ONLY_SYSTEM} {UNTRUSTED_INPUT_INSTRUCTION}");

        let raw: RawAssessment = self
            .0
            .call_json(&prompt, &system)
            .await
            .map_err(|e| AppError::Llm(format!("Failed to assess submission: {e}")))?;

        info!(score = raw.score, "Submission assessed");
        Ok(normalize_assessment(raw))
    }

    async fn suggest_courses(
        &self,
        skills: &[String],
        gaps: &[String],
        limit: usize,
    ) -> Result<Vec<CourseSuggestion>, AppError> {
        let prompt = SUGGEST_COURSES_PROMPT
            .replace("{skills}", &or_none(skills))
            .replace("{gaps}", &or_none(gaps))
            .replace("{limit}", &limit.to_string());

        let mut courses: Vec<CourseSuggestion> = self
            .0
            .call_json(&prompt, JSON_ONLY_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("Failed to suggest courses: {e}")))?;

        courses.truncate(limit);
        Ok(courses)
    }
}

fn or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}

fn normalize_assessment(raw: RawAssessment) -> SubmissionAssessment {
    let score = if raw.score.is_finite() {
        raw.score.round().clamp(0.0, 100.0) as u8
    } else {
        0
    };
    let mut pros: Vec<String> = raw
        .pros
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    pros.truncate(MAX_PROS);
    SubmissionAssessment {
        score,
        summary: raw.summary.trim().to_string(),
        pros,
    }
}
