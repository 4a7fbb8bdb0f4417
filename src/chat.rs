//! Conversational Context Manager
//!
//! Maintains the append-only session transcript and builds a bounded prompt
//! per turn: the most recent history window plus, when available, a prefix of
//! the generated blog as reference material. Adapter failures become
//! error-text assistant turns so the transcript always reflects that a
//! question was asked.

use crate::error::QuillError;
use crate::prompt::{self, PromptKind, PromptParams};
use crate::provider::{CompletionClient, ModelConfig};
use crate::types::{Role, Turn};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Reference-document prefix budget, in characters. The cut is a
/// deterministic prefix, never summarization.
pub const REFERENCE_CHAR_BUDGET: usize = 8000;

/// Maximum transcript turns included in a prompt. The stored transcript is
/// never pruned; the window applies only at prompt-construction time.
pub const MAX_HISTORY_TURNS: usize = 20;

/// Chat prompt-construction limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,

    #[serde(default = "default_reference_char_budget")]
    pub reference_char_budget: usize,
}

fn default_max_history_turns() -> usize {
    MAX_HISTORY_TURNS
}

fn default_reference_char_budget() -> usize {
    REFERENCE_CHAR_BUDGET
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_history_turns: default_max_history_turns(),
            reference_char_budget: default_reference_char_budget(),
        }
    }
}

/// Session-exclusive conversational state. The transcript is mutated only by
/// [`ContextManager::respond`]; callers observe it read-only.
#[derive(Debug)]
pub struct ContextManager {
    model: ModelConfig,
    config: ChatConfig,
    transcript: Vec<Turn>,
}

impl ContextManager {
    pub fn new(model: ModelConfig, config: ChatConfig) -> Self {
        Self {
            model,
            config,
            transcript: Vec::new(),
        }
    }

    /// The full ordered transcript, oldest first.
    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    /// Answer a user message, optionally grounded in a reference document
    /// (the current blog export).
    ///
    /// Appends the user turn and the assistant turn, in that order. On
    /// adapter failure the assistant turn carries an error message instead of
    /// an answer; the failure never propagates past this boundary.
    pub async fn respond(
        &mut self,
        client: &dyn CompletionClient,
        user_message: &str,
        reference_document: Option<&str>,
    ) -> String {
        let now = Utc::now();
        let history = self.history_window();
        let current_date = now.format("%Y-%m-%d").to_string();

        let rendered = match reference_document {
            Some(document) => {
                let excerpt = truncate_reference(document, self.config.reference_char_budget);
                debug!(
                    reference_chars = excerpt.chars().count(),
                    "building blog-grounded chat prompt"
                );
                prompt::render(
                    PromptKind::ChatWithReference,
                    &PromptParams::new()
                        .with(prompt::PARAM_CURRENT_DATE, current_date)
                        .with(prompt::PARAM_BLOG_CONTENT, excerpt)
                        .with(prompt::PARAM_HISTORY, history)
                        .with(prompt::PARAM_USER_INPUT, user_message),
                )
            }
            None => prompt::render(
                PromptKind::ChatGeneral,
                &PromptParams::new()
                    .with(prompt::PARAM_CURRENT_DATE, current_date)
                    .with(prompt::PARAM_HISTORY, history)
                    .with(prompt::PARAM_USER_INPUT, user_message),
            ),
        };

        let reply = match rendered {
            Ok(request_text) => client
                .complete(&request_text, &self.model)
                .await
                .unwrap_or_else(|err| error_reply(&err)),
            // Unreachable with well-formed templates; kept as a turn outcome
            // so the transcript invariant holds even for programmer errors.
            Err(err) => error_reply(&err),
        };

        self.transcript
            .push(Turn::new(Role::User, user_message, now));
        self.transcript
            .push(Turn::new(Role::Assistant, reply.clone(), Utc::now()));
        reply
    }

    /// The most recent turns, oldest first, rendered as labeled lines.
    fn history_window(&self) -> String {
        let start = self
            .transcript
            .len()
            .saturating_sub(self.config.max_history_turns);
        self.transcript[start..]
            .iter()
            .map(|turn| format!("{}: {}", turn.role.label(), turn.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn error_reply(err: &QuillError) -> String {
    warn!(error = %err, "chat turn failed; recording error reply");
    format!("Error generating response: {}", err)
}

/// Deterministic prefix cut of the reference document, measured in characters
/// from the document's start.
fn truncate_reference(document: &str, budget: usize) -> String {
    document.chars().take(budget).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedClient {
        reply: Result<String, QuillError>,
    }

    #[async_trait]
    impl CompletionClient for FixedClient {
        async fn complete(
            &self,
            _prompt: &str,
            _config: &ModelConfig,
        ) -> Result<String, QuillError> {
            self.reply.clone()
        }

        fn provider_name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_truncate_reference_is_prefix_cut() {
        let document = "x".repeat(10_000);
        let excerpt = truncate_reference(&document, REFERENCE_CHAR_BUDGET);
        assert_eq!(excerpt.chars().count(), 8000);
        assert!(document.starts_with(&excerpt));

        let short = truncate_reference("short", REFERENCE_CHAR_BUDGET);
        assert_eq!(short, "short");
    }

    #[test]
    fn test_truncate_reference_multibyte_safe() {
        let document = "é".repeat(9000);
        let excerpt = truncate_reference(&document, 8000);
        assert_eq!(excerpt.chars().count(), 8000);
    }

    #[test]
    fn test_history_window_caps_and_preserves_order() {
        let mut manager = ContextManager::new(
            ModelConfig::default(),
            ChatConfig {
                max_history_turns: 2,
                reference_char_budget: REFERENCE_CHAR_BUDGET,
            },
        );
        let now = Utc::now();
        manager.transcript.push(Turn::new(Role::User, "first", now));
        manager
            .transcript
            .push(Turn::new(Role::Assistant, "second", now));
        manager.transcript.push(Turn::new(Role::User, "third", now));

        let window = manager.history_window();
        assert_eq!(window, "Assistant: second\nUser: third");
    }

    #[tokio::test]
    async fn test_respond_appends_user_then_assistant() {
        let mut manager = ContextManager::new(ModelConfig::default(), ChatConfig::default());
        let client = FixedClient {
            reply: Ok("an answer".to_string()),
        };

        let reply = manager.respond(&client, "a question", None).await;
        assert_eq!(reply, "an answer");
        assert_eq!(manager.transcript().len(), 2);
        assert_eq!(manager.transcript()[0].role, Role::User);
        assert_eq!(manager.transcript()[0].content, "a question");
        assert_eq!(manager.transcript()[1].role, Role::Assistant);
        assert_eq!(manager.transcript()[1].content, "an answer");
    }

    #[tokio::test]
    async fn test_respond_failure_becomes_error_turn() {
        let mut manager = ContextManager::new(ModelConfig::default(), ChatConfig::default());
        let client = FixedClient {
            reply: Err(QuillError::transient("rate limited")),
        };

        let before = manager.transcript().len();
        let reply = manager.respond(&client, "a question", Some("blog text")).await;
        assert!(reply.starts_with("Error generating response:"));
        assert_eq!(manager.transcript().len(), before + 2);
        assert_eq!(manager.transcript()[1].content, reply);
    }
}
