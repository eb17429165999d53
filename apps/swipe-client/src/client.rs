use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::batcher::BatchSink;
use crate::{ClientError, SwipeAction};

const DEFAULT_IDENTITY_HEADER: &str = "x-user-id";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_jobs: usize,
    pub has_more: bool,
}

/// One page of the swipe deck. Jobs are kept as raw JSON so the UI can show
/// whatever the recruiter attached.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedPage {
    pub jobs: Vec<Value>,
    pub pagination: Pagination,
}

#[derive(Serialize)]
struct BatchActionsBody<'a> {
    actions: &'a [SwipeAction],
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// HTTP client for one signed-in user.
#[derive(Debug, Clone)]
pub struct GigswipeClient {
    http: Client,
    base_url: String,
    user_id: String,
    identity_header: String,
}

impl GigswipeClient {
    pub fn new(base_url: &str, user_id: impl Into<String>) -> Result<Self, ClientError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::BaseUrl(base_url));
        }
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url,
            user_id: user_id.into(),
            identity_header: DEFAULT_IDENTITY_HEADER.to_string(),
        })
    }

    /// Overrides the header carrying the user id (must match the gateway's).
    pub fn with_identity_header(mut self, header: impl Into<String>) -> Self {
        self.identity_header = header.into();
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{path}", self.base_url)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.header(self.identity_header.as_str(), self.user_id.as_str())
    }

    async fn check(resp: Response) -> Result<Response, ClientError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.message)
            .unwrap_or(text);
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    pub async fn fetch_feed(&self, page: usize, limit: usize) -> Result<FeedPage, ClientError> {
        let url = self.url(&format!("/jobs/feed/{}", self.user_id));
        let resp = self
            .authed(self.http.get(url))
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await?;
        let feed: FeedPage = Self::check(resp).await?.json().await?;
        debug!(
            page,
            returned = feed.jobs.len(),
            total = feed.pagination.total_jobs,
            "Fetched feed page"
        );
        Ok(feed)
    }

    pub async fn send_actions(&self, actions: &[SwipeAction]) -> Result<(), ClientError> {
        let url = self.url(&format!("/jobs/batch-actions/{}", self.user_id));
        let resp = self
            .authed(self.http.post(url))
            .json(&BatchActionsBody { actions })
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    pub async fn apply_to_job(&self, job_id: &str) -> Result<(), ClientError> {
        let resp = self
            .authed(self.http.post(self.url("/jobs/apply")))
            .json(&json!({ "jobId": job_id, "userId": self.user_id }))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}

#[async_trait]
impl BatchSink for GigswipeClient {
    async fn send_batch(&self, actions: Vec<SwipeAction>) -> Result<(), ClientError> {
        self.send_actions(&actions).await
    }

    async fn apply(&self, job_id: &str) -> Result<(), ClientError> {
        self.apply_to_job(job_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ActionKind;

    #[test]
    fn test_new_rejects_bad_base_url() {
        assert!(matches!(
            GigswipeClient::new("localhost:8080", "u1"),
            Err(ClientError::BaseUrl(_))
        ));
        let client = GigswipeClient::new("http://localhost:8080/", "u1").unwrap();
        assert_eq!(client.url("/jobs/apply"), "http://localhost:8080/api/jobs/apply");
        assert_eq!(client.user_id(), "u1");
    }

    #[test]
    fn test_batch_body_matches_server_shape() {
        let actions = vec![
            SwipeAction::pass("j1", None),
            SwipeAction::save("j2", Some(json!({"title": "t"}))),
        ];
        let body = serde_json::to_value(BatchActionsBody { actions: &actions }).unwrap();
        assert_eq!(
            body,
            json!({"actions": [
                {"jobId": "j1", "action": "pass"},
                {"jobId": "j2", "action": "save", "jobData": {"title": "t"}}
            ]})
        );
        assert_eq!(actions[1].action, ActionKind::Save);
    }

    #[test]
    fn test_feed_page_decodes() {
        let page: FeedPage = serde_json::from_value(json!({
            "jobs": [{"id": "j1", "title": "x", "companyName": "Acme"}],
            "pagination": {"currentPage": 1, "totalPages": 1, "totalJobs": 1, "hasMore": false}
        }))
        .unwrap();
        assert_eq!(page.jobs[0]["companyName"], "Acme");
        assert!(!page.pagination.has_more);
    }
}
