//! Request handlers and their wire schemas.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use quarry_llm::{Message, generate_response};
use quarry_retriever::{
    DEFAULT_EXCLUDE_PATTERNS, DEFAULT_FILE_EXTENSIONS, IndexStatus, RetrievedChunk,
    owned_defaults,
};

use crate::state::AppState;

/// Chunks sent to the model per chat turn.
const CHAT_CONTEXT_LIMIT: usize = 5;

#[derive(Debug, Deserialize)]
pub struct IndexRequest {
    pub project_path: String,
    pub project_name: String,
    #[serde(default)]
    pub file_extensions: Option<Vec<String>>,
    #[serde(default)]
    pub exclude_patterns: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub project_name: String,
    pub query: String,
    #[serde(default)]
    pub chat_history: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub context_files: Vec<String>,
}

type HandlerError = (StatusCode, String);

fn internal(e: anyhow::Error) -> HandlerError {
    tracing::error!(error = %e, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Kick off indexing in the background and return immediately.
pub async fn index_codebase(
    State(state): State<AppState>,
    Json(request): Json<IndexRequest>,
) -> Json<Value> {
    let extensions = request
        .file_extensions
        .unwrap_or_else(|| owned_defaults(DEFAULT_FILE_EXTENSIONS));
    let excludes = request
        .exclude_patterns
        .unwrap_or_else(|| owned_defaults(DEFAULT_EXCLUDE_PATTERNS));

    let indexer = state.indexer.clone();
    let project_name = request.project_name.clone();
    let project_path = std::path::PathBuf::from(&request.project_path);
    tokio::spawn(async move {
        if let Err(e) = indexer
            .index_project(&project_path, &project_name, &extensions, &excludes)
            .await
        {
            tracing::error!(project = %project_name, error = %e, "background indexing failed");
        }
    });

    Json(json!({
        "status": "indexing_started",
        "project_name": request.project_name,
    }))
}

pub async fn index_status(
    State(state): State<AppState>,
    Path(project_name): Path<String>,
) -> Result<Json<IndexStatus>, HandlerError> {
    let status = state.indexer.status(&project_name).await.map_err(internal)?;
    Ok(Json(status))
}

pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, HandlerError> {
    let (chunks, files) = state
        .retriever
        .retrieve(&request.project_name, &request.query, CHAT_CONTEXT_LIMIT)
        .await
        .map_err(internal)?;

    let context = format_context(&chunks);
    let response = generate_response(
        state.provider.as_ref(),
        &request.query,
        &context,
        &request.chat_history,
    )
    .await;

    Ok(Json(ChatResponse {
        response,
        context_files: files.into_iter().map(|f| f.file_path).collect(),
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Render retrieved chunks as fenced blocks the model can quote from.
fn format_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|c| format!("File: {}\n```{}\n{}\n```", c.file_path, c.language, c.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_blocks_carry_path_and_language() {
        let chunks = vec![RetrievedChunk {
            content: "fn main() {}".into(),
            file_path: "src/main.rs".into(),
            language: "rust".into(),
            start_line: 1,
            end_line: 1,
        }];
        let out = format_context(&chunks);
        assert_eq!(out, "File: src/main.rs\n```rust\nfn main() {}\n```");
    }

    #[test]
    fn empty_retrieval_formats_to_empty_context() {
        assert_eq!(format_context(&[]), "");
    }
}
