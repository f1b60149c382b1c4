//! SQLite-backed storage for projects, files, and embedded chunks.
//!
//! Vectors are stored inline as little-endian `f32` BLOBs; search is a
//! brute-force L2 scan over one project's chunks. Corpora in the intended
//! range (thousands to low hundreds of thousands of chunks) scan in
//! milliseconds, so no ANN index is kept.

use anyhow::Result;
use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// A registered codebase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub path: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One chunk ready for insertion.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub start_line: i64,
    pub end_line: i64,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// One stored chunk, as read back (test support).
#[derive(Debug, Clone)]
pub struct StoredChunk {
    pub id: i64,
    pub start_line: i64,
    pub end_line: i64,
    pub content: String,
    pub embedding: Vec<f32>,
}

/// A chunk matched by vector search, joined with its owning file.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub chunk_id: i64,
    pub file_path: String,
    pub language: String,
    pub content: String,
    pub start_line: i64,
    pub end_line: i64,
    pub distance: f32,
}

/// Handle to the store. Cheap to clone; all clones share one pool.
#[derive(Clone)]
pub struct VectorStore {
    pool: SqlitePool,
}

impl VectorStore {
    /// Open (creating if needed) a store at the given file path.
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    /// Open an in-memory store. Capped at one connection so every query
    /// sees the same database.
    pub async fn open_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let store = Self { pool };
        store.create_tables().await?;
        Ok(store)
    }

    async fn create_tables(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                path TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS files (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                file_path TEXT NOT NULL,
                language TEXT NOT NULL,
                last_modified INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE(project_id, file_path)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS chunks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id INTEGER NOT NULL,
                file_id INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
                start_line INTEGER NOT NULL,
                end_line INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                created_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_project ON chunks(project_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_files_project ON files(project_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert a project, or refresh its path and `updated_at` if the name
    /// already exists.
    pub async fn upsert_project(&self, name: &str, path: &str) -> Result<Project> {
        let now = Utc::now().timestamp();
        sqlx::query(
            "INSERT INTO projects (name, path, created_at, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(name) DO UPDATE SET path = excluded.path,
                                             updated_at = excluded.updated_at",
        )
        .bind(name)
        .bind(path)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_project(name)
            .await?
            .ok_or_else(|| anyhow::anyhow!("project '{name}' missing after upsert"))
    }

    pub async fn get_project(&self, name: &str) -> Result<Option<Project>> {
        let row = sqlx::query(
            "SELECT id, name, path, created_at, updated_at FROM projects WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Project {
            id: r.get("id"),
            name: r.get("name"),
            path: r.get("path"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }))
    }

    /// Insert or refresh a file row, returning its id.
    pub async fn upsert_file(
        &self,
        project_id: i64,
        file_path: &str,
        language: &str,
        last_modified: i64,
    ) -> Result<i64> {
        let now = Utc::now().timestamp();
        sqlx::query(
            "INSERT INTO files (project_id, file_path, language, last_modified, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(project_id, file_path) DO UPDATE SET
                 language = excluded.language,
                 last_modified = excluded.last_modified,
                 updated_at = excluded.updated_at",
        )
        .bind(project_id)
        .bind(file_path)
        .bind(language)
        .bind(last_modified)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query("SELECT id FROM files WHERE project_id = ? AND file_path = ?")
            .bind(project_id)
            .bind(file_path)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("id"))
    }

    /// Stored mtime for a file, if it has been indexed before.
    pub async fn file_last_modified(
        &self,
        project_id: i64,
        file_path: &str,
    ) -> Result<Option<i64>> {
        let row = sqlx::query(
            "SELECT last_modified FROM files WHERE project_id = ? AND file_path = ?",
        )
        .bind(project_id)
        .bind(file_path)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.get("last_modified")))
    }

    /// Replace every chunk of a file in one transaction, so readers never
    /// see a half-indexed file.
    pub async fn replace_chunks(
        &self,
        project_id: i64,
        file_id: i64,
        chunks: &[ChunkRecord],
    ) -> Result<()> {
        let now = Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM chunks WHERE file_id = ?")
            .bind(file_id)
            .execute(&mut *tx)
            .await?;

        for chunk in chunks {
            let blob: &[u8] = bytemuck::cast_slice(&chunk.embedding);
            sqlx::query(
                "INSERT INTO chunks (project_id, file_id, start_line, end_line, content, embedding, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(project_id)
            .bind(file_id)
            .bind(chunk.start_line)
            .bind(chunk.end_line)
            .bind(&chunk.content)
            .bind(blob)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn file_count(&self, project_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM files WHERE project_id = ?")
            .bind(project_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    pub async fn chunk_count(&self, project_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM chunks WHERE project_id = ?")
            .bind(project_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// All chunks for a file, ordered by start line (test support).
    pub async fn get_file_chunks(&self, file_id: i64) -> Result<Vec<StoredChunk>> {
        let rows = sqlx::query(
            "SELECT id, start_line, end_line, content, embedding
             FROM chunks WHERE file_id = ? ORDER BY start_line",
        )
        .bind(file_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| StoredChunk {
                id: r.get("id"),
                start_line: r.get("start_line"),
                end_line: r.get("end_line"),
                content: r.get("content"),
                embedding: decode_embedding(r.get("embedding")),
            })
            .collect())
    }

    /// Nearest chunks to `query` by L2 distance, ascending, ties broken by
    /// chunk id. Rows whose stored vector has a different length rank last.
    pub async fn search_chunks(
        &self,
        project_id: i64,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchHit>> {
        let rows = sqlx::query(
            "SELECT c.id, c.start_line, c.end_line, c.content, c.embedding,
                    f.file_path, f.language
             FROM chunks c
             JOIN files f ON f.id = c.file_id
             WHERE c.project_id = ?",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        let mut hits: Vec<SearchHit> = rows
            .into_iter()
            .map(|r| {
                let embedding = decode_embedding(r.get("embedding"));
                SearchHit {
                    chunk_id: r.get("id"),
                    file_path: r.get("file_path"),
                    language: r.get("language"),
                    content: r.get("content"),
                    start_line: r.get("start_line"),
                    end_line: r.get("end_line"),
                    distance: l2_distance(query, &embedding),
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.chunk_id.cmp(&b.chunk_id))
        });
        hits.truncate(limit);
        Ok(hits)
    }
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore").finish_non_exhaustive()
    }
}

fn decode_embedding(blob: Vec<u8>) -> Vec<f32> {
    if blob.len() % 4 != 0 {
        return Vec::new();
    }
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Euclidean distance between two vectors. Mismatched lengths compare as
/// infinitely far, so stale rows from an older dimension sink to the bottom.
fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
