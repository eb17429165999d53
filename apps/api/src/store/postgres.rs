use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tracing::debug;

use super::{DocRef, Document, DocumentStore, StoreError, WriteBatch, WriteOp};

#[derive(Debug, FromRow)]
struct DocumentRow {
    doc_id: String,
    data: Value,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.doc_id,
            data: row.data,
        }
    }
}

/// Postgres-backed document store. Every document is one row of the JSONB
/// `documents` table keyed by `(collection, doc_id)`.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, doc: &DocRef) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT doc_id, data FROM documents WHERE collection = $1 AND doc_id = $2",
        )
        .bind(&doc.collection)
        .bind(&doc.id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Document::from))
    }

    async fn get_all(&self, collection: &str, ids: &[String]) -> Result<Vec<Document>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT doc_id, data FROM documents WHERE collection = $1 AND doc_id = ANY($2)",
        )
        .bind(collection)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT doc_id, data FROM documents WHERE collection = $1 ORDER BY doc_id",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn list_where_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT doc_id, data FROM documents WHERE collection = $1 AND data -> $2 = $3 ORDER BY doc_id",
        )
        .bind(collection)
        .bind(field)
        .bind(value)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let op_count = batch.len();
        let mut tx = self.pool.begin().await?;

        for op in batch.into_ops() {
            match op {
                WriteOp::Set { doc, data, merge } => {
                    let sql = if merge {
                        r#"
                        INSERT INTO documents (collection, doc_id, data)
                        VALUES ($1, $2, $3)
                        ON CONFLICT (collection, doc_id)
                        DO UPDATE SET data = documents.data || EXCLUDED.data, updated_at = NOW()
                        "#
                    } else {
                        r#"
                        INSERT INTO documents (collection, doc_id, data)
                        VALUES ($1, $2, $3)
                        ON CONFLICT (collection, doc_id)
                        DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()
                        "#
                    };
                    sqlx::query(sql)
                        .bind(&doc.collection)
                        .bind(&doc.id)
                        .bind(Value::Object(data))
                        .execute(&mut *tx)
                        .await?;
                }
                WriteOp::Create { doc, data } => {
                    let result = sqlx::query(
                        r#"
                        INSERT INTO documents (collection, doc_id, data)
                        VALUES ($1, $2, $3)
                        ON CONFLICT (collection, doc_id) DO NOTHING
                        "#,
                    )
                    .bind(&doc.collection)
                    .bind(&doc.id)
                    .bind(Value::Object(data))
                    .execute(&mut *tx)
                    .await?;

                    if result.rows_affected() == 0 {
                        return Err(StoreError::AlreadyExists(doc.path()));
                    }
                }
                WriteOp::Delete { doc } => {
                    sqlx::query("DELETE FROM documents WHERE collection = $1 AND doc_id = $2")
                        .bind(&doc.collection)
                        .bind(&doc.id)
                        .execute(&mut *tx)
                        .await?;
                }
                WriteOp::Increment { doc, field, by } => {
                    // Single-statement read-modify-write; the row lock makes it atomic.
                    let result = sqlx::query(
                        r#"
                        UPDATE documents
                        SET data = jsonb_set(
                                data,
                                ARRAY[$3::text],
                                to_jsonb(COALESCE((data ->> $3)::bigint, 0) + $4),
                                true
                            ),
                            updated_at = NOW()
                        WHERE collection = $1 AND doc_id = $2
                        "#,
                    )
                    .bind(&doc.collection)
                    .bind(&doc.id)
                    .bind(&field)
                    .bind(by)
                    .execute(&mut *tx)
                    .await?;

                    if result.rows_affected() == 0 {
                        // Dropping `tx` rolls back everything applied so far.
                        return Err(StoreError::Aborted(format!("{} does not exist", doc.path())));
                    }
                }
            }
        }

        tx.commit().await?;
        debug!("Committed batch of {op_count} ops");
        Ok(())
    }
}
