//! Application status state machine.
//!
//! ```text
//! Applied ──► Shortlisted ──► Interview ──► Hired
//!    │             │   ▲          ▲          ▲
//!    │             │   └──────────┤          │
//!    │             └─► Work Submitted ───────┘
//!    └────────────────────────────────────────► Rejected (from any non-terminal)
//! ```
//!
//! `Shortlisted → Work Submitted` is the only candidate-driven edge; every other
//! edge is a recruiter action. `Hired` and `Rejected` are terminal.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::job::JobStatus;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ApplicationStatus {
    Applied,
    Shortlisted,
    Interview,
    #[serde(rename = "Work Submitted")]
    WorkSubmitted,
    Rejected,
    Hired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The edge does not exist in the graph for this actor.
    Illegal {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    /// The candidate edge exists but the job is not accepting submissions.
    SubmissionWindowClosed { job_status: JobStatus },
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionError::Illegal { from, to } => {
                write!(f, "Cannot move an application from '{from}' to '{to}'")
            }
            TransitionError::SubmissionWindowClosed { job_status } => write!(
                f,
                "Work can only be submitted once the job is open for submissions (job is '{job_status}')"
            ),
        }
    }
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Applied,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Interview,
        ApplicationStatus::WorkSubmitted,
        ApplicationStatus::Rejected,
        ApplicationStatus::Hired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::Shortlisted => "Shortlisted",
            ApplicationStatus::Interview => "Interview",
            ApplicationStatus::WorkSubmitted => "Work Submitted",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Hired => "Hired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Hired | ApplicationStatus::Rejected)
    }

    /// The field stamped with the time an application entered this status.
    pub fn timestamp_field(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "appliedAt",
            ApplicationStatus::Shortlisted => "shortlistedAt",
            ApplicationStatus::Interview => "interviewAt",
            ApplicationStatus::WorkSubmitted => "workSubmittedAt",
            ApplicationStatus::Rejected => "rejectedAt",
            ApplicationStatus::Hired => "hiredAt",
        }
    }

    /// Statuses a recruiter may move an application to from here.
    pub fn recruiter_transitions(&self) -> &'static [ApplicationStatus] {
        use ApplicationStatus::*;
        match self {
            Applied => &[Shortlisted, Rejected],
            Shortlisted => &[Interview, Rejected],
            Interview => &[Hired, Rejected],
            WorkSubmitted => &[Interview, Hired, Rejected],
            Rejected | Hired => &[],
        }
    }

    /// Checks a recruiter-driven move. Re-applying the current status is allowed
    /// and reported as `Ok(false)` (nothing to write).
    pub fn recruiter_move(&self, to: ApplicationStatus) -> Result<bool, TransitionError> {
        if *self == to {
            return Ok(false);
        }
        if self.recruiter_transitions().contains(&to) {
            Ok(true)
        } else {
            Err(TransitionError::Illegal { from: *self, to })
        }
    }

    /// Checks the candidate's proof-of-work submission.
    pub fn candidate_submit(&self, job_status: JobStatus) -> Result<(), TransitionError> {
        if *self != ApplicationStatus::Shortlisted {
            return Err(TransitionError::Illegal {
                from: *self,
                to: ApplicationStatus::WorkSubmitted,
            });
        }
        if !job_status.accepts_submissions() {
            return Err(TransitionError::SubmissionWindowClosed { job_status });
        }
        Ok(())
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
