//! Job feed — the swipe deck.
//!
//! The feed is a read-only projection: every `Active` job the user has not yet
//! saved, passed or applied to, newest first, with company details resolved
//! from the recruiter's profile.
//!
//! Recruiter profiles are fetched with one batched read per page (one lookup per
//! distinct recruiter), never per job.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::jobs::{PageRequest, Pagination};
use crate::models::job::{Job, JobStatus};
use crate::models::user::{CompanyCard, UserProfile};
use crate::store::{paths, sort_newest_first, Document, DocumentStore};

#[derive(Debug, Clone, Serialize)]
pub struct FeedJob {
    #[serde(flatten)]
    pub job: Job,
    #[serde(flatten)]
    pub company: CompanyCard,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub jobs: Vec<FeedJob>,
    pub pagination: Pagination,
}

/// Ids of every job the user has already acted on.
pub async fn acted_job_ids(
    store: &dyn DocumentStore,
    user_id: &str,
) -> Result<HashSet<String>, AppError> {
    let saved = paths::saved_jobs(user_id);
    let passed = paths::passed_jobs(user_id);
    let applied = paths::user_applications(user_id);
    let (saved, passed, applied) = tokio::try_join!(
        store.list(&saved),
        store.list(&passed),
        store.list(&applied),
    )?;

    Ok(saved
        .into_iter()
        .chain(passed)
        .chain(applied)
        .map(|d| d.id)
        .collect())
}

pub async fn build_feed(
    store: &dyn DocumentStore,
    user_id: &str,
    page: PageRequest,
) -> Result<FeedPage, AppError> {
    let active = store
        .list_where_eq(paths::JOBS, "status", &json!(JobStatus::Active.as_str()))
        .await?;
    let acted = acted_job_ids(store, user_id).await?;

    let mut unseen: Vec<Document> = active
        .into_iter()
        .filter(|d| !acted.contains(&d.id))
        .collect();
    // No composite index to lean on; pages are small enough to sort here.
    sort_newest_first(&mut unseen, "createdAt");

    let (page_docs, pagination) = page.slice(unseen);
    let jobs: Vec<Job> = page_docs.iter().filter_map(decode_job).collect();
    let companies = resolve_companies(store, &jobs).await?;

    let jobs = jobs
        .into_iter()
        .map(|mut job| {
            let company = companies
                .get(&job.recruiter_id)
                .cloned()
                .unwrap_or_else(CompanyCard::confidential);
            for key in ["companyName", "companyLogo", "location"] {
                job.extra.remove(key);
            }
            FeedJob { job, company }
        })
        .collect();

    debug!(
        user_id,
        page = pagination.current_page,
        total = pagination.total_jobs,
        "Built job feed"
    );

    Ok(FeedPage { jobs, pagination })
}

/// Decodes a stored job, skipping (and logging) malformed documents so one bad
/// record cannot take down a whole page.
pub(crate) fn decode_job(doc: &Document) -> Option<Job> {
    match doc.decode::<Job>() {
        Ok(mut job) => {
            job.id = doc.id.clone();
            Some(job)
        }
        Err(e) => {
            warn!("Skipping malformed job {}: {e}", doc.id);
            None
        }
    }
}

/// One batched read for all distinct recruiters on the page.
async fn resolve_companies(
    store: &dyn DocumentStore,
    jobs: &[Job],
) -> Result<HashMap<String, CompanyCard>, AppError> {
    let recruiter_ids: Vec<String> = jobs
        .iter()
        .map(|j| j.recruiter_id.clone())
        .filter(|id| !id.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if recruiter_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let profiles = store.get_all(paths::USERS, &recruiter_ids).await?;
    Ok(profiles
        .into_iter()
        .filter_map(|doc| match doc.decode::<UserProfile>() {
            Ok(profile) => Some((doc.id, CompanyCard::from_profile(&profile))),
            Err(e) => {
                warn!("Unreadable recruiter profile {}: {e}", doc.id);
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::*;
    use crate::models::user::CONFIDENTIAL_COMPANY;
    use crate::store::{DocRef, MemoryDocumentStore, StoreError, WriteBatch};

    fn job_json(title: &str, recruiter: &str, status: &str, created: &str) -> Value {
        json!({
            "title": title,
            "description": "d",
            "recruiterId": recruiter,
            "status": status,
            "createdAt": created,
        })
    }

    async fn seeded() -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new();
        store
            .seed(paths::job("j1"), job_json("one", "r1", "Active", "2025-01-01T00:00:00Z"))
            .await;
        store
            .seed(paths::job("j2"), job_json("two", "r1", "Active", "2025-02-01T00:00:00Z"))
            .await;
        store
            .seed(paths::job("j3"), job_json("three", "r2", "Active", "2025-03-01T00:00:00Z"))
            .await;
        store
            .seed(paths::job("j4"), job_json("four", "r1", "Closed", "2025-04-01T00:00:00Z"))
            .await;
        store
            .seed(paths::job("j5"), job_json("five", "ghost", "Active", "2025-05-01T00:00:00Z"))
            .await;
        store
            .seed(
                paths::user("r1"),
                json!({"role": "Recruiter", "companyName": "Acme", "location": "Berlin"}),
            )
            .await;
        store
            .seed(paths::user("r2"), json!({"role": "Recruiter", "companyName": "Globex"}))
            .await;
        store
    }

    fn all() -> PageRequest {
        PageRequest { page: 1, limit: 50 }
    }

    #[tokio::test]
    async fn test_feed_is_newest_first_and_active_only() {
        let store = seeded().await;
        let page = build_feed(&store, "u1", all()).await.unwrap();
        let ids: Vec<_> = page.jobs.iter().map(|j| j.job.id.as_str()).collect();
        assert_eq!(ids, vec!["j5", "j3", "j2", "j1"]);
        assert_eq!(page.pagination.total_jobs, 4);
    }

    #[tokio::test]
    async fn test_feed_excludes_saved_passed_and_applied() {
        let store = seeded().await;
        store
            .seed(DocRef::new(paths::saved_jobs("u1"), "j1"), json!({"jobId": "j1"}))
            .await;
        store
            .seed(DocRef::new(paths::passed_jobs("u1"), "j2"), json!({"jobId": "j2"}))
            .await;
        store
            .seed(DocRef::new(paths::user_applications("u1"), "j3"), json!({"jobId": "j3"}))
            .await;

        let page = build_feed(&store, "u1", all()).await.unwrap();
        let acted = acted_job_ids(&store, "u1").await.unwrap();
        assert!(page.jobs.iter().all(|j| !acted.contains(&j.job.id)));
        assert_eq!(page.jobs.len(), 1);
        assert_eq!(page.jobs[0].job.id, "j5");

        // Another user's actions do not leak into this feed.
        let other = build_feed(&store, "u2", all()).await.unwrap();
        assert_eq!(other.jobs.len(), 4);
    }

    #[tokio::test]
    async fn test_missing_recruiter_is_confidential() {
        let store = seeded().await;
        let page = build_feed(&store, "u1", all()).await.unwrap();

        let ghost = page.jobs.iter().find(|j| j.job.id == "j5").unwrap();
        assert_eq!(ghost.company.company_name, CONFIDENTIAL_COMPANY);
        assert_eq!(ghost.company.location, None);

        let acme = page.jobs.iter().find(|j| j.job.id == "j1").unwrap();
        assert_eq!(acme.company.company_name, "Acme");
        assert_eq!(acme.company.location.as_deref(), Some("Berlin"));

        let json = serde_json::to_value(acme).unwrap();
        assert_eq!(json["companyName"], json!("Acme"));
        assert_eq!(json["title"], json!("one"));
    }

    #[tokio::test]
    async fn test_pagination_slices_after_filtering() {
        let store = seeded().await;
        let page = build_feed(&store, "u1", PageRequest { page: 2, limit: 3 })
            .await
            .unwrap();
        let ids: Vec<_> = page.jobs.iter().map(|j| j.job.id.as_str()).collect();
        assert_eq!(ids, vec!["j1"]);
        assert_eq!(page.pagination.total_pages, 2);
        assert!(!page.pagination.has_more);
    }

    /// Counts batched recruiter lookups.
    struct CountingStore {
        inner: MemoryDocumentStore,
        get_all_calls: AtomicUsize,
    }

    #[async_trait]
    impl DocumentStore for CountingStore {
        async fn get(&self, doc: &DocRef) -> Result<Option<Document>, StoreError> {
            self.inner.get(doc).await
        }
        async fn get_all(&self, c: &str, ids: &[String]) -> Result<Vec<Document>, StoreError> {
            self.get_all_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.get_all(c, ids).await
        }
        async fn list(&self, c: &str) -> Result<Vec<Document>, StoreError> {
            self.inner.list(c).await
        }
        async fn list_where_eq(
            &self,
            c: &str,
            f: &str,
            v: &Value,
        ) -> Result<Vec<Document>, StoreError> {
            self.inner.list_where_eq(c, f, v).await
        }
        async fn commit(&self, b: WriteBatch) -> Result<(), StoreError> {
            self.inner.commit(b).await
        }
    }

    #[tokio::test]
    async fn test_recruiters_resolved_in_one_batched_read() {
        let store = CountingStore {
            inner: seeded().await,
            get_all_calls: AtomicUsize::new(0),
        };
        build_feed(&store, "u1", all()).await.unwrap();
        assert_eq!(store.get_all_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_malformed_job_is_skipped() {
        let store = seeded().await;
        store
            .seed(paths::job("bad"), json!({"status": "Active", "tasks": "nope"}))
            .await;
        let page = build_feed(&store, "u1", all()).await.unwrap();
        assert!(page.jobs.iter().all(|j| j.job.id != "bad"));
        assert_eq!(page.jobs.len(), 4);
    }
}
