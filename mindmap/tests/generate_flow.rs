//! End-to-end generation against a mock chat completions endpoint.

#![cfg(feature = "openai")]

use mindmap::{
    FailureKind, GenerateRequest, HttpClientConfig, InMemoryStore, MindMapService,
    MindMapSettings, OpenAIGenerator, ProviderConfig, ResilientCaller, RetryPolicy, ServiceError,
};
use mindmap::mindmap_retries::ReqwestTransport;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn graph() -> Value {
    json!({
        "nodes": [
            {"id": "1", "type": "input", "position": {"x": 0, "y": 0}, "data": {"label": "Rust"}},
            {"id": "2", "position": {"x": 250, "y": -50}, "data": {"label": "Ownership"}, "parentId": "1"},
            {"id": "3", "type": "output", "position": {"x": 250, "y": 50}, "data": {"label": "Borrowing"}, "parentId": "1"}
        ],
        "edges": [
            {"id": "e1-2", "source": "1", "target": "2", "type": "smoothstep", "animated": false},
            {"id": "e1-3", "source": "1", "target": "3"}
        ]
    })
}

fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1700000000,
        "model": "gpt-4-0613",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 321, "completion_tokens": 123, "total_tokens": 444}
    })
}

fn service(server: &MockServer, store: Arc<InMemoryStore>) -> MindMapService {
    let config = ProviderConfig::new()
        .with_api_key("sk-test")
        .with_organization("org-test")
        .with_base_url(format!("{}/v1", server.uri()));
    let transport = ReqwestTransport::new(&HttpClientConfig::default()).unwrap();
    let policy = RetryPolicy::new(4, Duration::from_millis(10), Duration::from_millis(100))
        .unwrap()
        .with_deadline(Some(Duration::from_secs(30)));
    let generator = OpenAIGenerator::new(config, ResilientCaller::new(transport))
        .unwrap()
        .with_policy(policy);
    MindMapService::new(Arc::new(generator), store)
}

#[tokio::test]
async fn test_generate_survives_transient_upstream_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(header("openai-organization", "org-test"))
        .and(body_partial_json(json!({"model": "gpt-4", "max_tokens": 2000})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(&graph().to_string())))
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryStore::new());
    let service = service(&server, store.clone());

    let record = service
        .generate(GenerateRequest::new("Rust", "Rust ownership and borrowing"))
        .await
        .unwrap();

    assert_eq!(record.title, "Rust");
    assert_eq!(record.structure.nodes.len(), 3);
    assert_eq!(record.structure.edges.len(), 2);
    assert_eq!(record.structure.edges[1].kind, "smoothstep");
    assert_eq!(record.settings, MindMapSettings::default());
    assert_eq!(store.len().await, 1);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    let body: Value = serde_json::from_slice(&requests[2].body).unwrap();
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(
        body["messages"][1]["content"],
        "Generate a mind map structure for the following content, responding with JSON only: Rust ownership and borrowing"
    );

    let rendered = serde_json::to_value(&record).unwrap();
    assert_eq!(rendered["structure"]["nodes"][1]["parentId"], "1");
    assert_eq!(rendered["settings"]["style"]["primaryNodes"]["color"], "#50C878");
}

#[tokio::test]
async fn test_malformed_reply_fails_fast_and_stores_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion("Here is your mind map: ...")),
        )
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryStore::new());
    let err = service(&server, store.clone())
        .generate(GenerateRequest::new("Rust", "ownership"))
        .await
        .unwrap_err();

    assert_eq!(err.failure_kind(), Some(FailureKind::MalformedResponse));
    assert_eq!(err.label(), "Failed to generate mind map");
    assert!(store.is_empty().await);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_rejected_key_is_permanent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let err = service(&server, Arc::new(InMemoryStore::new()))
        .generate(GenerateRequest::new("Rust", "ownership"))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Generation(_)));
    assert_eq!(err.failure_kind(), Some(FailureKind::PermanentClient));
    assert!(!err.user_message().contains("Incorrect API key"));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_custom_depth_reaches_the_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(&graph().to_string())))
        .mount(&server)
        .await;

    let record = service(&server, Arc::new(InMemoryStore::new()))
        .generate(
            GenerateRequest::new("Rust", "ownership")
                .with_settings(MindMapSettings::new().max_depth(5)),
        )
        .await
        .unwrap();
    assert_eq!(record.settings.max_depth, 5);

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let system = body["messages"][0]["content"].as_str().unwrap();
    assert!(system.contains("at most 5 levels"));
}
