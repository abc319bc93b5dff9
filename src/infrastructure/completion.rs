//! # Completion Client
//!
//! Sends bounded conversational context to an OpenAI-compatible completion
//! API. `HttpCompletionApi` is the wire adapter; `CompletionClient` enforces
//! the context budget and the single-retry policy above the `CompletionApi`
//! seam. The caller's window is never mutated here.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::config::{CompletionConfig, RetryConfig};
use crate::domain::error::{ApiError, ApiResult};
use crate::domain::traits::CompletionApi;
use crate::domain::types::{ConversationTurn, ConversationWindow};
use crate::infrastructure::http::{failure_from_response, transport};
use crate::infrastructure::retry::RetryPolicy;

/// Transport failures get one retry before the call is reported unavailable.
const MAX_ATTEMPTS: usize = 2;

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

pub struct HttpCompletionApi {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    system_prompt: String,
}

impl HttpCompletionApi {
    pub fn new(config: &CompletionConfig, api_key: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build completion HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
        })
    }
}

#[async_trait]
impl CompletionApi for HttpCompletionApi {
    async fn complete(&self, turns: &[ConversationTurn]) -> ApiResult<String> {
        let mut messages = vec![WireMessage {
            role: "system",
            content: self.system_prompt.clone(),
        }];
        messages.extend(turns.iter().map(|turn| WireMessage {
            role: turn.role.as_str(),
            content: turn.text.clone(),
        }));

        let request = CompletionRequest {
            model: self.model.clone(),
            messages,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(failure_from_response(response).await);
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ApiError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ApiError::MalformedResponse("no choices in response".to_string()))
    }
}

pub struct CompletionClient {
    api: Arc<dyn CompletionApi>,
    retry: RetryPolicy,
    budget_chars: usize,
}

impl CompletionClient {
    pub fn new(api: Arc<dyn CompletionApi>, retry_config: &RetryConfig, budget_chars: usize) -> Self {
        Self {
            api,
            retry: RetryPolicy::from_config(retry_config).with_max_attempts(MAX_ATTEMPTS),
            budget_chars: budget_chars.max(1),
        }
    }

    /// Ask a question against the supplied window. The window itself is left
    /// untouched; the router decides what to append afterwards.
    pub async fn complete(
        &self,
        window: &ConversationWindow,
        question: &str,
    ) -> ApiResult<String> {
        let turns = self.bounded_context(window, question);
        self.retry
            .run("completion", || self.api.complete(&turns))
            .await
    }

    /// Build the turn sequence to send: as much history as fits the budget,
    /// dropping oldest turns first, with the new question always included as
    /// the final user turn. An oversized question is clipped to the budget.
    fn bounded_context(
        &self,
        window: &ConversationWindow,
        question: &str,
    ) -> Vec<ConversationTurn> {
        let mut question_text = question.to_string();
        if question_text.len() > self.budget_chars {
            let mut cut = self.budget_chars;
            while !question_text.is_char_boundary(cut) {
                cut -= 1;
            }
            question_text.truncate(cut);
        }

        let mut used = question_text.len();
        let mut kept: Vec<ConversationTurn> = Vec::new();
        for turn in window.turns().rev() {
            if used + turn.text.len() > self.budget_chars {
                break;
            }
            used += turn.text.len();
            kept.push(turn.clone());
        }
        kept.reverse();
        kept.push(ConversationTurn::user(question_text));
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Role;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    struct FakeCompletionApi {
        calls: AtomicUsize,
        responses: Mutex<VecDeque<ApiResult<String>>>,
        seen_turns: Mutex<Vec<Vec<ConversationTurn>>>,
    }

    impl FakeCompletionApi {
        fn scripted(responses: Vec<ApiResult<String>>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                responses: Mutex::new(responses.into()),
                seen_turns: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionApi for FakeCompletionApi {
        async fn complete(&self, turns: &[ConversationTurn]) -> ApiResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_turns.lock().await.push(turns.to_vec());
            self.responses
                .lock()
                .await
                .pop_front()
                .expect("unexpected completion call")
        }
    }

    fn retry_config() -> RetryConfig {
        RetryConfig {
            max_attempts: 5, // client clamps this down to one retry
            base_delay_ms: 1,
            max_delay_ms: 4,
        }
    }

    #[tokio::test]
    async fn test_answer_passes_through() {
        let api = FakeCompletionApi::scripted(vec![Ok("Tweezer is a Phish song.".to_string())]);
        let client = CompletionClient::new(api.clone(), &retry_config(), 6000);

        let mut window = ConversationWindow::new(8);
        window.push(ConversationTurn::user("hello"));

        let answer = client.complete(&window, "what is Tweezer").await.unwrap();
        assert_eq!(answer, "Tweezer is a Phish song.");

        // Prior window plus the new question, question last.
        let seen = api.seen_turns.lock().await;
        let turns = &seen[0];
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].text, "hello");
        assert_eq!(turns.last().unwrap().role, Role::User);
        assert_eq!(turns.last().unwrap().text, "what is Tweezer");
    }

    #[tokio::test]
    async fn test_transport_failure_retried_once() {
        let api = FakeCompletionApi::scripted(vec![
            Err(ApiError::Transport("timed out".into())),
            Err(ApiError::Transport("timed out".into())),
        ]);
        let client = CompletionClient::new(api.clone(), &retry_config(), 6000);

        let result = client
            .complete(&ConversationWindow::new(8), "anyone play Gamehendge?")
            .await;

        assert_eq!(result, Err(ApiError::ServiceUnavailable));
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_budget_drops_oldest_turns_first() {
        let api = FakeCompletionApi::scripted(vec![Ok("ok".to_string())]);
        // Budget fits the question (8) plus two 6-char turns, not three.
        let client = CompletionClient::new(api.clone(), &retry_config(), 21);

        let mut window = ConversationWindow::new(8);
        window.push(ConversationTurn::user("oldest"));
        window.push(ConversationTurn::assistant("middle"));
        window.push(ConversationTurn::user("newest"));

        client.complete(&window, "question").await.unwrap();

        let seen = api.seen_turns.lock().await;
        let texts: Vec<&str> = seen[0].iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["middle", "newest", "question"]);

        let total: usize = seen[0].iter().map(|t| t.text.len()).sum();
        assert!(total <= 21);
    }

    #[tokio::test]
    async fn test_oversized_question_is_clipped_but_sent() {
        let api = FakeCompletionApi::scripted(vec![Ok("ok".to_string())]);
        let client = CompletionClient::new(api.clone(), &retry_config(), 10);

        let mut window = ConversationWindow::new(8);
        window.push(ConversationTurn::user("history that can never fit"));

        client
            .complete(&window, "a question far beyond the budget")
            .await
            .unwrap();

        let seen = api.seen_turns.lock().await;
        assert_eq!(seen[0].len(), 1);
        assert_eq!(seen[0][0].text, "a question");
    }

    #[tokio::test]
    async fn test_window_is_not_mutated() {
        let api = FakeCompletionApi::scripted(vec![Ok("ok".to_string())]);
        let client = CompletionClient::new(api.clone(), &retry_config(), 6000);

        let mut window = ConversationWindow::new(8);
        window.push(ConversationTurn::user("hello"));

        client.complete(&window, "question").await.unwrap();
        assert_eq!(window.len(), 1);
    }
}
