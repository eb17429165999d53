use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;

use super::{DocRef, Document, DocumentStore, StoreError, WriteBatch, WriteOp};

type Collections = BTreeMap<String, BTreeMap<String, Map<String, Value>>>;

/// In-process document store used for local development (`STORE_BACKEND=memory`)
/// and tests.
///
/// Every batch is applied to a staged copy of the data and swapped in only when
/// all ops succeed, so a failing op leaves the store untouched.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<Collections>,
    fail_at_op: Option<usize>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every batch with more than `n` ops fail when it reaches op `n`
    /// (zero-based).
    #[cfg(test)]
    pub fn fail_after(mut self, n: usize) -> Self {
        self.fail_at_op = Some(n);
        self
    }

    /// Inserts or replaces a document directly, bypassing batching.
    #[cfg(test)]
    pub async fn seed(&self, doc: DocRef, data: Value) {
        let fields = match data {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        self.collections
            .write()
            .await
            .entry(doc.collection)
            .or_default()
            .insert(doc.id, fields);
    }
}

fn apply(state: &mut Collections, op: WriteOp) -> Result<(), StoreError> {
    match op {
        WriteOp::Set { doc, data, merge } => {
            let collection = state.entry(doc.collection).or_default();
            match collection.get_mut(&doc.id) {
                Some(existing) if merge => existing.extend(data),
                _ => {
                    collection.insert(doc.id, data);
                }
            }
        }
        WriteOp::Create { doc, data } => {
            let path = doc.path();
            let collection = state.entry(doc.collection).or_default();
            if collection.contains_key(&doc.id) {
                return Err(StoreError::AlreadyExists(path));
            }
            collection.insert(doc.id, data);
        }
        WriteOp::Delete { doc } => {
            if let Some(collection) = state.get_mut(&doc.collection) {
                collection.remove(&doc.id);
            }
        }
        WriteOp::Increment { doc, field, by } => {
            let path = doc.path();
            let fields = state
                .get_mut(&doc.collection)
                .and_then(|c| c.get_mut(&doc.id))
                .ok_or_else(|| StoreError::Aborted(format!("{path} does not exist")))?;
            let current = match fields.get(&field) {
                None | Some(Value::Null) => 0,
                Some(v) => v.as_i64().ok_or_else(|| StoreError::NotACounter {
                    path: path.clone(),
                    field: field.clone(),
                })?,
            };
            fields.insert(field, Value::from(current + by));
        }
    }
    Ok(())
}

fn to_document(id: &str, fields: &Map<String, Value>) -> Document {
    Document {
        id: id.to_string(),
        data: Value::Object(fields.clone()),
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, doc: &DocRef) -> Result<Option<Document>, StoreError> {
        let state = self.collections.read().await;
        Ok(state
            .get(&doc.collection)
            .and_then(|c| c.get(&doc.id))
            .map(|fields| to_document(&doc.id, fields)))
    }

    async fn get_all(&self, collection: &str, ids: &[String]) -> Result<Vec<Document>, StoreError> {
        let state = self.collections.read().await;
        let Some(docs) = state.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| docs.get(id).map(|fields| to_document(id, fields)))
            .collect())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let state = self.collections.read().await;
        Ok(state
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| to_document(id, fields))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_where_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .list(collection)
            .await?
            .into_iter()
            .filter(|d| d.data.get(field) == Some(value))
            .collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut state = self.collections.write().await;
        let mut staged = state.clone();
        let op_count = batch.len();
        for (i, op) in batch.into_ops().into_iter().enumerate() {
            if self.fail_at_op == Some(i) {
                return Err(StoreError::Aborted(format!("injected failure at op {i}")));
            }
            apply(&mut staged, op)?;
        }
        *state = staged;
        debug!("Committed batch of {op_count} ops");
        Ok(())
    }
}
