//! SQLite-backed vector store.
//!
//! Chunks and their L2-normalised embeddings live in a single `chunks` table.
//! Queries embed the question, scan the tenant's rows (optionally narrowed to
//! one aircraft model), and rank by Euclidean distance.

use crate::vector;
use aerobrain_core::error::StoreError;
use aerobrain_core::retrieval::{
    DocumentChunk, DocumentMetadata, Embedder, SearchFilter, SearchHit, TenantId, VectorStore,
};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct SqliteVectorStore {
    pool: SqlitePool,
    embedder: Arc<dyn Embedder>,
}

impl SqliteVectorStore {
    /// Open (or create) the index at `path`.
    ///
    /// Pass `"sqlite::memory:"` for an ephemeral database.
    pub async fn new(path: &str, embedder: Arc<dyn Embedder>) -> Result<Self, StoreError> {
        let pool = open_pool(path).await?;
        let store = Self { pool, embedder };
        store.run_migrations().await?;
        info!("SQLite vector store initialized at {path}");
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id             TEXT PRIMARY KEY,
                tenant_id      INTEGER NOT NULL,
                aircraft_model TEXT NOT NULL DEFAULT '',
                ata_chapter    TEXT NOT NULL DEFAULT '',
                doc_type       TEXT NOT NULL DEFAULT '',
                source_path    TEXT NOT NULL DEFAULT '',
                doc_title      TEXT NOT NULL DEFAULT '',
                content        TEXT NOT NULL,
                embedding      BLOB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("chunks table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chunks_tenant_aircraft ON chunks(tenant_id, aircraft_model)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("tenant index: {e}")))?;

        debug!("Vector store migrations complete");
        Ok(())
    }

    fn row_to_hit(
        row: &sqlx::sqlite::SqliteRow,
        query_embedding: &[f32],
    ) -> Result<Option<SearchHit>, StoreError> {
        let get = |col: &str| -> Result<String, StoreError> {
            row.try_get(col)
                .map_err(|e| StoreError::QueryFailed(format!("{col} column: {e}")))
        };
        let tenant_id: i64 = row
            .try_get("tenant_id")
            .map_err(|e| StoreError::QueryFailed(format!("tenant_id column: {e}")))?;
        let blob: Vec<u8> = row
            .try_get("embedding")
            .map_err(|e| StoreError::QueryFailed(format!("embedding column: {e}")))?;

        let embedding = vector::blob_to_embedding(&blob);
        let Some(distance) = vector::l2_distance(&embedding, query_embedding) else {
            warn!(id = %get("id")?, "Skipping chunk with mismatched embedding dimensions");
            return Ok(None);
        };

        Ok(Some(SearchHit {
            content: get("content")?,
            metadata: DocumentMetadata {
                tenant_id: TenantId(tenant_id),
                aircraft_model: get("aircraft_model")?,
                ata_chapter: get("ata_chapter")?,
                doc_type: get("doc_type")?,
                source_path: get("source_path")?,
                doc_title: get("doc_title")?,
            },
            distance,
        }))
    }
}

pub(crate) async fn open_pool(path: &str) -> Result<SqlitePool, StoreError> {
    ensure_parent_dir(path)?;
    let options = SqliteConnectOptions::from_str(path)
        .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

    SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))
}

/// Create the parent directory of a file-backed database.
fn ensure_parent_dir(path: &str) -> Result<(), StoreError> {
    let file = path
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();
    if file.is_empty() || file.contains(":memory:") {
        return Ok(());
    }
    match std::path::Path::new(file).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
            .map_err(|e| StoreError::Storage(format!("Cannot create {}: {e}", dir.display()))),
        _ => Ok(()),
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn query(
        &self,
        text: &str,
        top_k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<SearchHit>, StoreError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let query_embedding = self
            .embedder
            .embed(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .map(|v| vector::normalize(&v))
            .ok_or_else(|| StoreError::EmbeddingFailed("no embedding for query".into()))?;

        let rows = sqlx::query(
            r#"
            SELECT id, tenant_id, aircraft_model, ata_chapter, doc_type, source_path,
                   doc_title, content, embedding
            FROM chunks
            WHERE tenant_id = ?1 AND (?2 IS NULL OR aircraft_model = ?2)
            "#,
        )
        .bind(filter.tenant_id.0)
        .bind(filter.aircraft_model.as_deref())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("Chunk scan: {e}")))?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(hit) = Self::row_to_hit(row, &query_embedding)? {
                hits.push(hit);
            }
        }

        debug!(
            tenant = %filter.tenant_id,
            scanned = rows.len(),
            top_k,
            "Vector query complete"
        );
        Ok(vector::nearest(hits, top_k))
    }

    async fn upsert(&self, chunks: Vec<DocumentChunk>) -> Result<usize, StoreError> {
        let chunks: Vec<DocumentChunk> = chunks
            .into_iter()
            .filter(|c| !c.content.trim().is_empty())
            .collect();
        if chunks.is_empty() {
            return Ok(0);
        }

        let embeddings = self
            .embedder
            .embed(chunks.iter().map(|c| c.content.clone()).collect())
            .await?;
        if embeddings.len() != chunks.len() {
            return Err(StoreError::EmbeddingFailed(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("BEGIN failed: {e}")))?;

        for (chunk, embedding) in chunks.iter().zip(&embeddings) {
            let blob = vector::embedding_to_blob(&vector::normalize(embedding));
            let meta = &chunk.metadata;
            sqlx::query(
                r#"
                INSERT INTO chunks (id, tenant_id, aircraft_model, ata_chapter, doc_type,
                                    source_path, doc_title, content, embedding)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(id) DO UPDATE SET
                    tenant_id = excluded.tenant_id,
                    aircraft_model = excluded.aircraft_model,
                    ata_chapter = excluded.ata_chapter,
                    doc_type = excluded.doc_type,
                    source_path = excluded.source_path,
                    doc_title = excluded.doc_title,
                    content = excluded.content,
                    embedding = excluded.embedding
                "#,
            )
            .bind(&chunk.id)
            .bind(meta.tenant_id.0)
            .bind(&meta.aircraft_model)
            .bind(&meta.ata_chapter)
            .bind(&meta.doc_type)
            .bind(&meta.source_path)
            .bind(&meta.doc_title)
            .bind(&chunk.content)
            .bind(blob)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Storage(format!("INSERT failed: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("COMMIT failed: {e}")))?;

        debug!(count = chunks.len(), "Upserted chunks");
        Ok(chunks.len())
    }

    async fn count(&self, tenant_id: TenantId) -> Result<usize, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM chunks WHERE tenant_id = ?1")
            .bind(tenant_id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("COUNT failed: {e}")))?;
        let n: i64 = row
            .try_get("n")
            .map_err(|e| StoreError::QueryFailed(format!("count column: {e}")))?;
        Ok(n as usize)
    }
}
