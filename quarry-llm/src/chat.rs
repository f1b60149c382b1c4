//! Conversation assembly for retrieval-augmented answers.

use crate::provider::{LlmProvider, Message};

const SYSTEM_TEMPLATE: &str = "You are a helpful coding assistant. Use the \
following code context from the user's codebase to answer their question. \
If the context is not relevant to the question, say so and answer from \
general knowledge.\n\nCODE CONTEXT:\n{context}";

/// Generate an answer to `query` grounded in retrieved `context`.
///
/// The conversation sent to the provider is: a system message carrying the
/// context, every prior turn of `history` except the last (which is the
/// current query as echoed back by the client) with blank turns dropped,
/// then the query itself.
///
/// This function is total: a provider failure degrades to an apologetic
/// message instead of an error.
pub async fn generate_response(
    provider: &dyn LlmProvider,
    query: &str,
    context: &str,
    history: &[Message],
) -> String {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(Message::system(SYSTEM_TEMPLATE.replace("{context}", context)));
    let replay = history.len().saturating_sub(1);
    for turn in &history[..replay] {
        if turn.content.trim().is_empty() {
            continue;
        }
        messages.push(turn.clone());
    }
    messages.push(Message::user(query));

    match provider.chat(&messages).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(provider = provider.name(), error = %e, "chat request failed");
            format!("I'm sorry, I encountered an error while generating a response: {e}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockProvider;
    use crate::provider::Role;

    #[tokio::test]
    async fn context_lands_in_the_system_message() {
        let provider = MockProvider::new(4).with_response("answer");
        let out = generate_response(&provider, "what is foo?", "fn foo() {}", &[]).await;
        assert_eq!(out, "answer");

        let sent = provider.last_messages();
        assert_eq!(sent[0].role, Role::System);
        assert!(sent[0].content.contains("fn foo() {}"));
        assert_eq!(sent.last().unwrap().content, "what is foo?");
    }

    #[tokio::test]
    async fn history_replays_all_but_the_last_turn() {
        let provider = MockProvider::new(4);
        let history = vec![
            Message::user("first question"),
            Message::assistant("first answer"),
            Message::user("second question"),
        ];
        generate_response(&provider, "second question", "", &history).await;

        let sent = provider.last_messages();
        // system + 2 replayed turns + current query
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[1].content, "first question");
        assert_eq!(sent[2].content, "first answer");
        assert_eq!(sent[3].content, "second question");
    }

    #[tokio::test]
    async fn blank_history_turns_are_dropped() {
        let provider = MockProvider::new(4);
        let history = vec![
            Message::user("  "),
            Message::assistant("kept"),
            Message::user("query"),
        ];
        generate_response(&provider, "query", "", &history).await;

        let sent = provider.last_messages();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[1].content, "kept");
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_apology() {
        let provider = MockProvider::new(4).failing_chat();
        let out = generate_response(&provider, "q", "", &[]).await;
        assert!(out.starts_with("I'm sorry, I encountered an error"));
    }
}
