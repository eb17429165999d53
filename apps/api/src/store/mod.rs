//! Document store — collections of JSON documents addressed by
//! `(collection path, document id)`.
//!
//! All handlers talk to the store through the `DocumentStore` trait. `AppState`
//! holds an `Arc<dyn DocumentStore>`, selected at startup via `STORE_BACKEND`.
//!
//! Multi-document writes go through `WriteBatch`, which commits all-or-nothing.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to (de)serialize document {path}: {source}")]
    Serde {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Document {0} must be a JSON object")]
    NotAnObject(String),

    #[error("Field '{field}' of {path} is not an integer")]
    NotACounter { path: String, field: String },

    #[error("Document {0} already exists")]
    AlreadyExists(String),

    #[error("Batch aborted: {0}")]
    Aborted(String),
}

/// A stored document together with its id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    /// Deserializes the document body into `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(self.data.clone()).map_err(|source| StoreError::Serde {
            path: self.id.clone(),
            source,
        })
    }

    /// The document body with its id injected as `"id"`, the shape list
    /// endpoints return.
    pub fn into_json_with_id(self) -> Value {
        match self.data {
            Value::Object(mut map) => {
                map.insert("id".to_string(), Value::String(self.id));
                Value::Object(map)
            }
            other => other,
        }
    }
}

/// Fully-qualified location of a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocRef {
    pub collection: String,
    pub id: String,
}

impl DocRef {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn path(&self) -> String {
        format!("{}/{}", self.collection, self.id)
    }
}

/// Collection and document paths used across the service.
pub mod paths {
    use super::DocRef;

    pub const JOBS: &str = "jobs";
    pub const USERS: &str = "users";

    pub fn job(job_id: &str) -> DocRef {
        DocRef::new(JOBS, job_id)
    }

    pub fn user(user_id: &str) -> DocRef {
        DocRef::new(USERS, user_id)
    }

    pub fn applicants(job_id: &str) -> String {
        format!("{JOBS}/{job_id}/applicants")
    }

    pub fn applicant(job_id: &str, candidate_id: &str) -> DocRef {
        DocRef::new(applicants(job_id), candidate_id)
    }

    /// The per-user inbox of jobs awaiting a swipe decision.
    pub fn inbox(user_id: &str) -> String {
        format!("{USERS}/{user_id}/job")
    }

    pub fn saved_jobs(user_id: &str) -> String {
        format!("{USERS}/{user_id}/saved_jobs")
    }

    pub fn passed_jobs(user_id: &str) -> String {
        format!("{USERS}/{user_id}/passed_jobs")
    }

    pub fn user_applications(user_id: &str) -> String {
        format!("{USERS}/{user_id}/applications")
    }

    pub fn roadmaps(user_id: &str) -> String {
        format!("{USERS}/{user_id}/roadmaps")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Creates or replaces the document. With `merge`, top-level fields are
    /// merged into an existing document instead.
    Set {
        doc: DocRef,
        data: Map<String, Value>,
        merge: bool,
    },
    /// Like `Set`, but aborts the whole batch if the document already exists.
    Create {
        doc: DocRef,
        data: Map<String, Value>,
    },
    Delete {
        doc: DocRef,
    },
    /// Atomically adds `by` to an integer field, creating it at zero if absent.
    /// A missing document is an error.
    Increment {
        doc: DocRef,
        field: String,
        by: i64,
    },
}

/// An ordered list of writes committed as a single atomic unit.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, doc: DocRef, data: Map<String, Value>) -> &mut Self {
        self.ops.push(WriteOp::Set {
            doc,
            data,
            merge: false,
        });
        self
    }

    pub fn merge(&mut self, doc: DocRef, data: Map<String, Value>) -> &mut Self {
        self.ops.push(WriteOp::Set {
            doc,
            data,
            merge: true,
        });
        self
    }

    pub fn create(&mut self, doc: DocRef, data: Map<String, Value>) -> &mut Self {
        self.ops.push(WriteOp::Create { doc, data });
        self
    }

    pub fn delete(&mut self, doc: DocRef) -> &mut Self {
        self.ops.push(WriteOp::Delete { doc });
        self
    }

    pub fn increment(&mut self, doc: DocRef, field: &str, by: i64) -> &mut Self {
        self.ops.push(WriteOp::Increment {
            doc,
            field: field.to_string(),
            by,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// The persistence trait. Implement this to swap backends without touching
/// the handlers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, doc: &DocRef) -> Result<Option<Document>, StoreError>;

    /// Fetches several documents of one collection in a single round trip.
    /// Missing ids are simply absent from the result.
    async fn get_all(&self, collection: &str, ids: &[String]) -> Result<Vec<Document>, StoreError>;

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Documents whose top-level `field` equals `value`.
    async fn list_where_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError>;

    /// Applies every op in order, or none of them.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;
}

/// Serializes a model into the top-level field map stored for a document.
pub fn to_fields<T: Serialize>(doc: &DocRef, value: &T) -> Result<Map<String, Value>, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(StoreError::NotAnObject(doc.path())),
        Err(source) => Err(StoreError::Serde {
            path: doc.path(),
            source,
        }),
    }
}

/// Sorts documents newest first by an RFC 3339 timestamp field. Documents
/// missing the field (or holding an unparsable value) sort last; ties fall back to the id.
pub fn sort_newest_first(docs: &mut [Document], field: &str) {
    docs.sort_by(|a, b| {
        let ta = timestamp(a, field);
        let tb = timestamp(b, field);
        match (ta, tb) {
            (Some(x), Some(y)) => y.cmp(&x).then_with(|| a.id.cmp(&b.id)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.id.cmp(&b.id),
        }
    });
}

fn timestamp(doc: &Document, field: &str) -> Option<DateTime<FixedOffset>> {
    doc.data
        .get(field)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, data: Value) -> Document {
        Document {
            id: id.to_string(),
            data,
        }
    }

    #[test]
    fn test_sort_newest_first_puts_missing_last() {
        let mut docs = vec![
            doc("a", json!({})),
            doc("b", json!({"createdAt": "2024-01-01T00:00:00Z"})),
            doc("c", json!({"createdAt": "2025-06-01T00:00:00Z"})),
        ];
        sort_newest_first(&mut docs, "createdAt");
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_paths_nest_under_parent() {
        assert_eq!(paths::applicant("j1", "u1").path(), "jobs/j1/applicants/u1");
        assert_eq!(paths::inbox("u1"), "users/u1/job");
        assert_eq!(paths::saved_jobs("u1"), "users/u1/saved_jobs");
    }

    #[test]
    fn test_into_json_with_id() {
        let d = doc("j1", json!({"title": "x"}));
        assert_eq!(d.into_json_with_id(), json!({"title": "x", "id": "j1"}));
    }

    #[test]
    fn test_to_fields_rejects_scalars() {
        let d = DocRef::new("jobs", "j1");
        assert!(matches!(to_fields(&d, &5), Err(StoreError::NotAnObject(_))));
    }
}
