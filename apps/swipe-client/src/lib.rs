//! Client-side swipe handling for the Gigswipe API.
//!
//! Passes are cheap and frequent, so they are queued and sent in batches.
//! Saves and applications are sent as soon as they happen.

pub mod batcher;
pub mod client;
pub mod error;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use batcher::{BatchSink, SwipeBatcher, DEFAULT_BATCH_THRESHOLD};
pub use client::GigswipeClient;
pub use error::ClientError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Pass,
    Save,
}

/// One entry of a `batch-actions` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SwipeAction {
    pub job_id: String,
    pub action: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_data: Option<Value>,
}

impl SwipeAction {
    pub fn pass(job_id: impl Into<String>, job_data: Option<Value>) -> Self {
        Self {
            job_id: job_id.into(),
            action: ActionKind::Pass,
            job_data,
        }
    }

    pub fn save(job_id: impl Into<String>, job_data: Option<Value>) -> Self {
        Self {
            job_id: job_id.into(),
            action: ActionKind::Save,
            job_data,
        }
    }
}
