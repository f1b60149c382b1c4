//! Nearest-neighbor retrieval over an indexed project.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashSet;

use quarry_llm::EmbeddingAdapter;

use crate::store::VectorStore;

/// One chunk returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    pub content: String,
    pub file_path: String,
    pub language: String,
    pub start_line: i64,
    pub end_line: i64,
}

/// A file that contributed at least one retrieved chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMatch {
    pub file_path: String,
}

/// Embeds queries and searches the store.
#[derive(Debug, Clone)]
pub struct Retriever {
    store: VectorStore,
    embedder: EmbeddingAdapter,
}

impl Retriever {
    pub fn new(store: VectorStore, embedder: EmbeddingAdapter) -> Self {
        Self { store, embedder }
    }

    /// Return the `limit` chunks nearest to `query` in the named project,
    /// plus the contributing files deduplicated in first-seen order.
    ///
    /// An unknown project yields two empty vectors rather than an error.
    pub async fn retrieve(
        &self,
        project_name: &str,
        query: &str,
        limit: usize,
    ) -> Result<(Vec<RetrievedChunk>, Vec<FileMatch>)> {
        let Some(project) = self.store.get_project(project_name).await? else {
            tracing::debug!(project = project_name, "retrieval against unknown project");
            return Ok((Vec::new(), Vec::new()));
        };

        let embedded = self.embedder.embed(&[query.to_string()]).await;
        let Some(query_vector) = embedded.first() else {
            return Ok((Vec::new(), Vec::new()));
        };

        let hits = self.store.search_chunks(project.id, query_vector, limit).await?;

        let mut seen = HashSet::new();
        let mut files = Vec::new();
        let chunks = hits
            .into_iter()
            .map(|hit| {
                if seen.insert(hit.file_path.clone()) {
                    files.push(FileMatch { file_path: hit.file_path.clone() });
                }
                RetrievedChunk {
                    content: hit.content,
                    file_path: hit.file_path,
                    language: hit.language,
                    start_line: hit.start_line,
                    end_line: hit.end_line,
                }
            })
            .collect();

        Ok((chunks, files))
    }
}
