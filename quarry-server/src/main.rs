use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use quarry_chunk::Chunker;
use quarry_llm::{EmbeddingAdapter, LlmConfig, provider_from_config};
use quarry_retriever::{Indexer, Retriever, VectorStore};
use quarry_server::{AppState, build_router};

/// Codebase indexing and retrieval service.
#[derive(Parser, Debug)]
#[command(name = "quarry-server", version)]
struct Args {
    /// Address to bind.
    #[arg(long, env = "QUARRY_BIND", default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on.
    #[arg(long, env = "QUARRY_PORT", default_value_t = 8000)]
    port: u16,

    /// Path to the SQLite database file.
    #[arg(long, env = "QUARRY_DB", default_value = "quarry.db")]
    db: PathBuf,

    /// LLM backend name.
    #[arg(long, env = "QUARRY_PROVIDER", default_value = "ollama")]
    provider: String,

    /// Base URL of the Ollama server.
    #[arg(long, env = "QUARRY_OLLAMA_URL", default_value = "http://localhost:11434")]
    ollama_url: String,

    /// Model used for chat completion.
    #[arg(long, env = "QUARRY_CHAT_MODEL", default_value = "qwen2.5-coder")]
    chat_model: String,

    /// Model used for embeddings.
    #[arg(long, env = "QUARRY_EMBEDDING_MODEL", default_value = "nomic-embed-text")]
    embedding_model: String,

    /// Dimension every stored vector is normalized to.
    #[arg(long, env = "QUARRY_EMBEDDING_DIM", default_value_t = 1024)]
    embedding_dim: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let config = LlmConfig {
        provider: args.provider,
        base_url: args.ollama_url,
        chat_model: args.chat_model,
        embedding_model: args.embedding_model,
        embedding_dim: args.embedding_dim,
    };
    let provider = provider_from_config(&config);
    let embedder = EmbeddingAdapter::with_dimension(provider.clone(), config.embedding_dim);

    let store = VectorStore::open(&args.db).await?;
    let state = AppState {
        indexer: Indexer::new(store.clone(), embedder.clone(), Chunker::new()?),
        retriever: Retriever::new(store, embedder),
        provider,
    };

    let addr = format!("{}:{}", args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, provider = %config.provider, "listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
