//! Walks a project tree, chunks and embeds its source files, and persists
//! the result. Re-runs are incremental at file granularity: files whose
//! mtime has not advanced past the stored value are skipped outright.

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use glob::Pattern;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use quarry_chunk::{Chunker, language_for_path};
use quarry_llm::EmbeddingAdapter;

use crate::store::{ChunkRecord, VectorStore};

/// Extensions indexed when the request does not name its own set.
pub const DEFAULT_FILE_EXTENSIONS: &[&str] = &[
    ".py", ".js", ".ts", ".lua", ".c", ".cpp", ".h", ".hpp", ".go", ".rs", ".java",
];

/// Directory and file name patterns skipped when the request does not name
/// its own set.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "node_modules", ".git", "__pycache__", "venv", "env", "dist", "build",
];

/// Totals from one indexing run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub files_indexed: usize,
    pub chunks_created: usize,
}

/// Where a project is in its indexing lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectState {
    NotFound,
    Pending,
    Indexed,
}

/// Status payload for one project.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    pub status: ProjectState,
    pub project_name: String,
    pub file_count: i64,
    pub chunk_count: i64,
    pub last_updated: Option<String>,
}

/// Drives the chunk/embed/store pipeline for whole project trees.
#[derive(Debug, Clone)]
pub struct Indexer {
    store: VectorStore,
    embedder: EmbeddingAdapter,
    chunker: Arc<Chunker>,
}

impl Indexer {
    pub fn new(store: VectorStore, embedder: EmbeddingAdapter, chunker: Chunker) -> Self {
        Self { store, embedder, chunker: Arc::new(chunker) }
    }

    /// Index every matching file under `project_path` into the project
    /// named `project_name`, creating the project row if needed.
    ///
    /// Per-file failures are logged and skipped; only project-level
    /// persistence failures (and invalid exclude patterns) abort the run.
    pub async fn index_project(
        &self,
        project_path: &Path,
        project_name: &str,
        file_extensions: &[String],
        exclude_patterns: &[String],
    ) -> Result<IndexReport> {
        let excludes: Vec<Pattern> = exclude_patterns
            .iter()
            .map(|p| Pattern::new(p).with_context(|| format!("invalid exclude pattern '{p}'")))
            .collect::<Result<_>>()?;

        let project = self
            .store
            .upsert_project(project_name, &project_path.to_string_lossy())
            .await?;

        tracing::info!(
            project = project_name,
            path = %project_path.display(),
            "indexing started"
        );

        let mut report = IndexReport::default();
        let mut dirs: Vec<PathBuf> = vec![project_path.to_path_buf()];

        while let Some(dir) = dirs.pop() {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                    continue;
                }
            };
            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                        continue;
                    }
                };
                let path = entry.path();
                let name = entry.file_name();
                let name = name.to_string_lossy();

                let file_type = match entry.file_type() {
                    Ok(t) => t,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                        continue;
                    }
                };
                if file_type.is_dir() {
                    if excludes.iter().any(|p| p.matches(&name)) {
                        continue;
                    }
                    dirs.push(path);
                    continue;
                }
                // Never descend through directory symlinks: a linked subtree
                // would index every file twice and a link cycle would never
                // terminate. Symlinks to regular files still index.
                if file_type.is_symlink() && path.is_dir() {
                    continue;
                }

                if !file_extensions.iter().any(|ext| name.ends_with(ext.as_str())) {
                    continue;
                }
                if excludes.iter().any(|p| p.matches(&name)) {
                    continue;
                }

                match self.index_file(project.id, project_path, &path).await {
                    Ok(Some(chunks)) => {
                        report.files_indexed += 1;
                        report.chunks_created += chunks;
                    }
                    Ok(None) => {} // unchanged since last run
                    Err(e) => {
                        tracing::error!(file = %path.display(), error = %e, "failed to index file");
                    }
                }
            }
        }

        tracing::info!(
            project = project_name,
            files = report.files_indexed,
            chunks = report.chunks_created,
            "indexing complete"
        );
        Ok(report)
    }

    /// Index one file. Returns the number of chunks written, or `None` when
    /// the stored mtime shows the file has not changed.
    async fn index_file(
        &self,
        project_id: i64,
        project_root: &Path,
        path: &Path,
    ) -> Result<Option<usize>> {
        let rel_path = path
            .strip_prefix(project_root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned();

        let metadata = std::fs::metadata(path)?;
        let mtime = metadata
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        if let Some(stored) = self.store.file_last_modified(project_id, &rel_path).await? {
            if stored >= mtime {
                tracing::debug!(file = %rel_path, "unchanged, skipping");
                return Ok(None);
            }
        }

        let language = language_for_path(path);
        let file_id = self
            .store
            .upsert_file(project_id, &rel_path, language, mtime)
            .await?;

        let bytes = std::fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes);
        let chunks = self.chunker.chunk(&content);

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed(&texts).await;

        let records: Vec<ChunkRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| ChunkRecord {
                start_line: chunk.start_line as i64,
                end_line: chunk.end_line as i64,
                content: chunk.text,
                embedding,
            })
            .collect();

        self.store.replace_chunks(project_id, file_id, &records).await?;
        tracing::debug!(file = %rel_path, chunks = records.len(), "indexed");
        Ok(Some(records.len()))
    }

    /// Current status of a project by name.
    pub async fn status(&self, project_name: &str) -> Result<IndexStatus> {
        let Some(project) = self.store.get_project(project_name).await? else {
            return Ok(IndexStatus {
                status: ProjectState::NotFound,
                project_name: project_name.to_string(),
                file_count: 0,
                chunk_count: 0,
                last_updated: None,
            });
        };

        let file_count = self.store.file_count(project.id).await?;
        let chunk_count = self.store.chunk_count(project.id).await?;
        let state = if file_count == 0 { ProjectState::Pending } else { ProjectState::Indexed };
        let last_updated = Utc
            .timestamp_opt(project.updated_at, 0)
            .single()
            .map(|t| t.to_rfc3339());

        Ok(IndexStatus {
            status: state,
            project_name: project.name,
            file_count,
            chunk_count,
            last_updated,
        })
    }
}

/// Convert a `&[&str]` default set into the owned form handlers pass in.
pub fn owned_defaults(defaults: &[&str]) -> Vec<String> {
    defaults.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_llm::MockProvider;
    use std::sync::Arc;

    fn indexer(store: VectorStore) -> Indexer {
        let provider = Arc::new(MockProvider::new(8));
        let embedder = EmbeddingAdapter::with_dimension(provider, 8);
        Indexer::new(store, embedder, Chunker::new().unwrap())
    }

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn indexes_matching_files_and_prunes_excluded_dirs() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "main.py", "print('hello')\n");
        write(dir.path(), "notes.txt", "not code\n");
        write(dir.path(), "node_modules/dep.py", "ignored\n");

        let store = VectorStore::open_memory().await.unwrap();
        let indexer = indexer(store.clone());
        let report = indexer
            .index_project(
                dir.path(),
                "demo",
                &owned_defaults(DEFAULT_FILE_EXTENSIONS),
                &owned_defaults(DEFAULT_EXCLUDE_PATTERNS),
            )
            .await
            .unwrap();

        assert_eq!(report.files_indexed, 1);
        assert_eq!(report.chunks_created, 1);

        let project = store.get_project("demo").await.unwrap().unwrap();
        assert_eq!(store.file_count(project.id).await.unwrap(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinked_directories_are_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/a.py", "x = 1\n");
        std::os::unix::fs::symlink(dir.path().join("src"), dir.path().join("alias")).unwrap();

        let store = VectorStore::open_memory().await.unwrap();
        let indexer = indexer(store.clone());
        let report = indexer
            .index_project(
                dir.path(),
                "demo",
                &owned_defaults(DEFAULT_FILE_EXTENSIONS),
                &owned_defaults(DEFAULT_EXCLUDE_PATTERNS),
            )
            .await
            .unwrap();

        assert_eq!(report.files_indexed, 1);
        let project = store.get_project("demo").await.unwrap().unwrap();
        assert_eq!(store.file_count(project.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn second_run_skips_unchanged_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "lib.rs", "pub fn one() -> u32 { 1 }\n");

        let store = VectorStore::open_memory().await.unwrap();
        let indexer = indexer(store);
        let exts = owned_defaults(DEFAULT_FILE_EXTENSIONS);
        let excl = owned_defaults(DEFAULT_EXCLUDE_PATTERNS);

        let first = indexer.index_project(dir.path(), "demo", &exts, &excl).await.unwrap();
        assert_eq!(first.files_indexed, 1);

        let second = indexer.index_project(dir.path(), "demo", &exts, &excl).await.unwrap();
        assert_eq!(second.files_indexed, 0);
        assert_eq!(second.chunks_created, 0);
    }

    #[tokio::test]
    async fn invalid_exclude_pattern_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = VectorStore::open_memory().await.unwrap();
        let indexer = indexer(store);
        let result = indexer
            .index_project(dir.path(), "demo", &[".py".into()], &["[bad".into()])
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn status_transitions_through_the_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.py", "x = 1\n");

        let store = VectorStore::open_memory().await.unwrap();
        let indexer = indexer(store.clone());

        let missing = indexer.status("demo").await.unwrap();
        assert_eq!(missing.status, ProjectState::NotFound);
        assert!(missing.last_updated.is_none());

        store.upsert_project("demo", "/tmp/demo").await.unwrap();
        let pending = indexer.status("demo").await.unwrap();
        assert_eq!(pending.status, ProjectState::Pending);

        indexer
            .index_project(
                dir.path(),
                "demo",
                &owned_defaults(DEFAULT_FILE_EXTENSIONS),
                &owned_defaults(DEFAULT_EXCLUDE_PATTERNS),
            )
            .await
            .unwrap();
        let indexed = indexer.status("demo").await.unwrap();
        assert_eq!(indexed.status, ProjectState::Indexed);
        assert_eq!(indexed.file_count, 1);
        assert!(indexed.chunk_count >= 1);
        assert!(indexed.last_updated.is_some());
    }

    #[test]
    fn status_serializes_snake_case() {
        let status = IndexStatus {
            status: ProjectState::NotFound,
            project_name: "x".into(),
            file_count: 0,
            chunk_count: 0,
            last_updated: None,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "not_found");
    }
}
