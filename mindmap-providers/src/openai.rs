//! OpenAI chat completions generator.

use crate::generator::{GenerateError, Generation, MindMapGenerator};
use crate::prompt::PromptTemplate;
use crate::provider::{ProviderConfig, ProviderError};
use crate::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use async_trait::async_trait;
use bytes::Bytes;
use mindmap_core::{MindMapSettings, MindMapStructure};
use mindmap_retries::{CallRequest, CancellationToken, ResilientCaller, RetryPolicy};
use tracing::{debug, info};

/// Generates mind maps with an OpenAI chat model.
///
/// Each call sends the system instruction and the user's content in one
/// chat completion request, routed through a [`ResilientCaller`]. The
/// assistant reply must be the graph JSON; anything else ends the call
/// as a malformed response without further attempts.
#[derive(Debug, Clone)]
pub struct OpenAIGenerator {
    config: ProviderConfig,
    caller: ResilientCaller,
    prompt: PromptTemplate,
    policy: RetryPolicy,
}

impl OpenAIGenerator {
    /// Create from configuration and a caller.
    pub fn new(config: ProviderConfig, caller: ResilientCaller) -> Result<Self, ProviderError> {
        config.validate()?;
        Ok(Self {
            config,
            caller,
            prompt: PromptTemplate::default(),
            policy: RetryPolicy::default(),
        })
    }

    /// Replace the prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Provider configuration.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Retry policy in use.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Prompt in use.
    pub fn prompt(&self) -> &PromptTemplate {
        &self.prompt
    }

    /// Build the chat completion body.
    pub fn build_body(&self, content: &str, settings: &MindMapSettings) -> ChatCompletionRequest {
        ChatCompletionRequest::new(
            self.config.model.clone(),
            vec![
                ChatMessage::system(self.prompt.render_system(settings.max_depth)),
                ChatMessage::user(self.prompt.render_user(content, settings.max_depth)),
            ],
        )
        .with_temperature(self.config.temperature)
        .with_max_tokens(self.config.max_tokens)
    }

    /// Build the outbound request for one generation.
    pub fn build_request(
        &self,
        content: &str,
        settings: &MindMapSettings,
    ) -> Result<CallRequest, GenerateError> {
        let url = self.config.chat_completions_url()?;
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingApiKey("OPENAI_API_KEY"))?;

        let mut request = CallRequest::post(url.as_str())?
            .with_header("Authorization", format!("Bearer {}", api_key))
            .with_header("Content-Type", "application/json")
            .with_header("Accept", "application/json");

        if let Some(org) = &self.config.organization {
            request = request.with_header("OpenAI-Organization", org.clone());
        }
        if let Some(project) = &self.config.project {
            request = request.with_header("OpenAI-Project", project.clone());
        }

        Ok(request.with_json(&self.build_body(content, settings))?)
    }
}

/// Extracted graph and token usage from a successful reply.
pub type ParsedCompletion = (MindMapStructure, Option<u64>);

/// Validate a 2xx chat completion body into a mind map structure.
///
/// Errors are human-readable reasons; the caller turns them into a
/// malformed-response failure.
pub fn parse_completion(_status: u16, body: &Bytes) -> Result<ParsedCompletion, String> {
    let response: ChatCompletionResponse = serde_json::from_slice(body)
        .map_err(|e| format!("invalid chat completion body: {}", e))?;

    let choice = response
        .choices
        .first()
        .ok_or_else(|| "completion has no choices".to_string())?;

    if let Some(refusal) = &choice.message.refusal {
        return Err(format!("model refused: {}", refusal));
    }

    let content = response
        .first_content()
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| "completion has no content".to_string())?;

    let structure = MindMapStructure::from_json(strip_code_fence(content))
        .map_err(|e| format!("invalid mind map: {}", e))?;

    Ok((structure, response.usage.map(|u| u.total_tokens)))
}

/// Remove a surrounding Markdown code fence, if present.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(inner) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop an info string such as `json` on the opening line.
    match inner.split_once('\n') {
        Some((info, body)) if !info.trim_start().starts_with('{') => body.trim(),
        _ => inner.trim(),
    }
}

#[async_trait]
impl MindMapGenerator for OpenAIGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        content: &str,
        settings: &MindMapSettings,
        cancel: &CancellationToken,
    ) -> Result<Generation, GenerateError> {
        let request = self.build_request(content, settings)?;

        debug!(
            model = %self.config.model,
            max_depth = settings.max_depth,
            "Requesting mind map from OpenAI"
        );

        let success = self
            .caller
            .invoke_validated(&request, &self.policy, cancel, parse_completion)
            .await?;

        let (structure, total_tokens) = success.body;
        info!(
            attempts = success.attempts,
            elapsed_ms = success.elapsed.as_millis() as u64,
            nodes = structure.nodes.len(),
            edges = structure.edges.len(),
            total_tokens,
            "Mind map generated"
        );

        Ok(Generation {
            structure,
            attempts: success.attempts,
            elapsed: success.elapsed,
            total_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindmap_retries::{
        AttemptLog, FailureKind, Transport, TransportError, TransportResponse,
    };
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;

    const GRAPH: &str = r#"{"nodes":[{"id":"1","type":"input","position":{"x":0,"y":0},"data":{"label":"Rust"}},{"id":"2","position":{"x":250,"y":0},"data":{"label":"Ownership"},"parentId":"1"}],"edges":[{"id":"e1-2","source":"1","target":"2","type":"smoothstep"}]}"#;

    fn completion(content: &str) -> String {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1,
            "model": "gpt-4",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 100, "completion_tokens": 50, "total_tokens": 150}
        })
        .to_string()
    }

    #[derive(Debug, Default)]
    struct Canned {
        responses: Mutex<VecDeque<TransportResponse>>,
        seen: Mutex<Vec<CallRequest>>,
    }

    impl Canned {
        fn new(responses: Vec<(u16, String)>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|(s, b)| TransportResponse::new(s, b))
                        .collect(),
                ),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for Canned {
        async fn send(&self, request: &CallRequest) -> Result<TransportResponse, TransportError> {
            self.seen.lock().push(request.clone());
            self.responses
                .lock()
                .pop_front()
                .ok_or_else(|| TransportError::connection("script exhausted"))
        }
    }

    fn generator(transport: Arc<Canned>) -> OpenAIGenerator {
        let config = ProviderConfig::new()
            .with_api_key("sk-test")
            .with_organization("org-1")
            .with_base_url("https://api.example.com/v1");
        let policy = RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(100))
            .unwrap();
        OpenAIGenerator::new(config, ResilientCaller::from_arc(transport).without_observers())
            .unwrap()
            .with_policy(policy)
    }

    #[test]
    fn test_new_requires_api_key() {
        let caller = ResilientCaller::from_arc(Canned::new(vec![]));
        assert!(matches!(
            OpenAIGenerator::new(ProviderConfig::new(), caller),
            Err(ProviderError::MissingApiKey(_))
        ));
    }

    #[test]
    fn test_build_request() {
        let gen = generator(Canned::new(vec![]));
        let request = gen
            .build_request("Rust ownership", &MindMapSettings::default())
            .unwrap();

        assert_eq!(request.method(), "POST");
        assert_eq!(request.target(), "https://api.example.com/v1/chat/completions");
        assert_eq!(request.header("authorization"), Some("Bearer sk-test"));
        assert_eq!(request.header("openai-organization"), Some("org-1"));
        assert_eq!(request.header("openai-project"), None);

        let body: serde_json::Value = serde_json::from_slice(request.body().unwrap()).unwrap();
        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["max_tokens"], 2000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(
            body["messages"][1]["content"],
            "Generate a mind map structure for the following content, responding with JSON only: Rust ownership"
        );
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_parse_completion() {
        let (structure, tokens) =
            parse_completion(200, &Bytes::from(completion(GRAPH))).unwrap();
        assert_eq!(structure.nodes.len(), 2);
        assert_eq!(structure.edges[0].target, "2");
        assert_eq!(tokens, Some(150));
    }

    #[test]
    fn test_parse_completion_fenced() {
        let fenced = format!("```json\n{}\n```", GRAPH);
        let (structure, _) = parse_completion(200, &Bytes::from(completion(&fenced))).unwrap();
        assert_eq!(structure.nodes.len(), 2);
    }

    #[test]
    fn test_parse_completion_rejects() {
        let not_json = parse_completion(200, &Bytes::from_static(b"<html>")).unwrap_err();
        assert!(not_json.starts_with("invalid chat completion body"));

        let prose = parse_completion(200, &Bytes::from(completion("Sure! Here it is."))).unwrap_err();
        assert!(prose.starts_with("invalid mind map"));

        let dangling = r#"{"nodes":[{"id":"1","position":{"x":0,"y":0},"data":{"label":"a"}}],"edges":[{"id":"e","source":"1","target":"9"}]}"#;
        let err = parse_completion(200, &Bytes::from(completion(dangling))).unwrap_err();
        assert!(err.contains("9"));

        let empty = json!({"choices": []}).to_string();
        assert_eq!(
            parse_completion(200, &Bytes::from(empty)).unwrap_err(),
            "completion has no choices"
        );

        let blank = parse_completion(200, &Bytes::from(completion("   "))).unwrap_err();
        assert_eq!(blank, "completion has no content");

        let refused = json!({
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": null, "refusal": "I can't help with that."},
                "finish_reason": "stop"
            }]
        })
        .to_string();
        assert_eq!(
            parse_completion(200, &Bytes::from(refused)).unwrap_err(),
            "model refused: I can't help with that."
        );
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("  {}  "), "{}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```{}```"), "{}");
        assert_eq!(strip_code_fence("```unterminated"), "```unterminated");
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_retries_server_errors() {
        let transport = Canned::new(vec![
            (500, "oops".to_string()),
            (503, "busy".to_string()),
            (200, completion(GRAPH)),
        ]);
        let gen = generator(transport.clone());

        let generation = gen
            .generate("Rust", &MindMapSettings::default(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(generation.attempts, 3);
        assert_eq!(generation.structure.nodes.len(), 2);
        assert_eq!(generation.total_tokens, Some(150));
        assert_eq!(generation.elapsed, Duration::from_millis(30));
        assert_eq!(transport.seen.lock().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_malformed_is_not_retried() {
        let transport = Canned::new(vec![
            (200, completion("not json")),
            (200, completion(GRAPH)),
        ]);
        let log = Arc::new(AttemptLog::new());
        let config = ProviderConfig::new().with_api_key("sk-test");
        let gen = OpenAIGenerator::new(
            config,
            ResilientCaller::from_arc(transport.clone()).with_observer(log.clone()),
        )
        .unwrap();

        let err = gen
            .generate("Rust", &MindMapSettings::default(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::MalformedResponse);
        assert_eq!(err.attempts(), 1);
        assert_eq!(log.len(), 1);
        assert_eq!(transport.seen.lock().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_client_error() {
        let transport = Canned::new(vec![(401, r#"{"error":{"message":"bad key"}}"#.to_string())]);
        let err = generator(transport)
            .generate("Rust", &MindMapSettings::default(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::PermanentClient);
        match err {
            GenerateError::Call(failure) => assert_eq!(failure.status, Some(401)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generate_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = generator(Canned::new(vec![(200, completion(GRAPH))]))
            .generate("Rust", &MindMapSettings::default(), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Cancelled);
    }
}
