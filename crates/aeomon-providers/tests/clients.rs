//! Wiremock tests for the provider clients.
//!
//! Each client is pointed at a local `MockServer`, so no real network
//! traffic is made. Tests cover the happy path, the `NoResult` signals,
//! and the HTTP error mapping for every client.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aeomon_core::ProviderKind;
use aeomon_providers::{
    AnswerLlmClient, AnswerProvider, ChatScrapeClient, CompletionsClient, ProviderError,
    RetryConfig, WebSearchClient,
};

fn answer_llm(server: &MockServer) -> AnswerLlmClient {
    AnswerLlmClient::with_base_url(&server.uri(), "test-key", 5, RetryConfig::none())
        .expect("client construction should not fail")
}

fn web_search(server: &MockServer) -> WebSearchClient {
    WebSearchClient::new(&server.uri(), "test-key", 5, RetryConfig::none())
        .expect("client construction should not fail")
}

fn chat_scrape(server: &MockServer) -> ChatScrapeClient {
    ChatScrapeClient::new(&server.uri(), 5, RetryConfig::none())
        .expect("client construction should not fail")
}

fn completions(server: &MockServer) -> CompletionsClient {
    CompletionsClient::new(&server.uri(), "test-key", 5, RetryConfig::none())
        .expect("client construction should not fail")
}

// ---------------------------------------------------------------------------
// Answer LLM
// ---------------------------------------------------------------------------

#[tokio::test]
async fn answer_llm_returns_content_and_citations() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "messages": [{"role": "user", "content": "best widget vendor"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "Acme is the leading vendor."}}],
            "citations": ["https://example.com/review"]
        })))
        .mount(&server)
        .await;

    let client = answer_llm(&server);
    let answer = client
        .call("best widget vendor")
        .await
        .expect("call should succeed");

    assert_eq!(client.kind(), ProviderKind::AnswerLlm);
    assert_eq!(answer.content, "Acme is the leading vendor.");
    assert_eq!(answer.citations, vec!["https://example.com/review"]);
}

#[tokio::test]
async fn answer_llm_empty_content_is_no_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "   "}}]
        })))
        .mount(&server)
        .await;

    let result = answer_llm(&server).call("anything").await;
    assert!(matches!(result, Err(ProviderError::NoResult)));
}

#[tokio::test]
async fn answer_llm_missing_citations_defaults_empty() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "An answer."}}]
        })))
        .mount(&server)
        .await;

    let answer = answer_llm(&server)
        .call("anything")
        .await
        .expect("call should succeed");
    assert!(answer.citations.is_empty());
}

#[tokio::test]
async fn answer_llm_http_500_maps_to_http_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = answer_llm(&server).call("anything").await;
    assert!(matches!(result, Err(ProviderError::Http(_))));
}

#[tokio::test]
async fn answer_llm_malformed_body_maps_to_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = answer_llm(&server).call("anything").await;
    assert!(matches!(result, Err(ProviderError::Deserialize { .. })));
}

// ---------------------------------------------------------------------------
// Web search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn web_search_builds_answer_from_box_and_snippets() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "best widget vendor"))
        .and(query_param("api_key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer_box": {"answer": "Acme leads the widget market."},
            "organic_results": [
                {"title": "Widget review", "link": "https://a.example/r", "snippet": "Acme is solid."},
                {"title": "Vendor list", "link": "https://b.example/l", "snippet": "Top vendors ranked."}
            ]
        })))
        .mount(&server)
        .await;

    let answer = web_search(&server)
        .call("best widget vendor")
        .await
        .expect("call should succeed");

    assert!(answer.content.starts_with("Acme leads the widget market."));
    assert!(answer.content.contains("Widget review: Acme is solid."));
    assert_eq!(
        answer.citations,
        vec!["https://a.example/r", "https://b.example/l"]
    );
}

#[tokio::test]
async fn web_search_empty_results_is_no_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "organic_results": []
        })))
        .mount(&server)
        .await;

    let result = web_search(&server).call("anything").await;
    assert!(matches!(result, Err(ProviderError::NoResult)));
}

#[tokio::test]
async fn web_search_answer_box_alone_is_enough() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer_box": {"snippet": "Acme, BetaCorp, and others."}
        })))
        .mount(&server)
        .await;

    let answer = web_search(&server)
        .call("anything")
        .await
        .expect("call should succeed");
    assert_eq!(answer.content, "Acme, BetaCorp, and others.");
    assert!(answer.citations.is_empty());
}

// ---------------------------------------------------------------------------
// Chat scrape
// ---------------------------------------------------------------------------

#[tokio::test]
async fn chat_scrape_returns_answer_and_links() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ask"))
        .and(body_partial_json(json!({"prompt": "best widget vendor"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "Most people recommend Acme.",
            "links": ["https://example.com/thread"]
        })))
        .mount(&server)
        .await;

    let client = chat_scrape(&server);
    let answer = client
        .call("best widget vendor")
        .await
        .expect("call should succeed");

    assert_eq!(client.kind(), ProviderKind::ChatScrape);
    assert_eq!(answer.content, "Most people recommend Acme.");
    assert_eq!(answer.citations, vec!["https://example.com/thread"]);
}

#[tokio::test]
async fn chat_scrape_no_answer_flag_is_no_result() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "no_answer": true
        })))
        .mount(&server)
        .await;

    let result = chat_scrape(&server).call("anything").await;
    assert!(matches!(result, Err(ProviderError::NoResult)));
}

#[tokio::test]
async fn chat_scrape_relay_error_maps_to_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "browser session crashed"
        })))
        .mount(&server)
        .await;

    let result = chat_scrape(&server).call("anything").await;
    match result {
        Err(ProviderError::Api(message)) => assert_eq!(message, "browser session crashed"),
        other => panic!("expected Api error, got: {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Completions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn complete_json_parses_fenced_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {
                "content": "```json\n{\"category\": \"review\", \"confidence\": 0.9}\n```"
            }}]
        })))
        .mount(&server)
        .await;

    let value = completions(&server)
        .complete_json("classify", "some page")
        .await
        .expect("call should succeed");

    assert_eq!(value["category"], "review");
}

#[tokio::test]
async fn complete_json_rejects_non_json_content() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "I cannot classify that."}}]
        })))
        .mount(&server)
        .await;

    let result = completions(&server).complete_json("classify", "some page").await;
    assert!(matches!(result, Err(ProviderError::Deserialize { .. })));
}

// ---------------------------------------------------------------------------
// Retry integration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn transient_500_is_retried_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "Recovered."}}]
        })))
        .mount(&server)
        .await;

    let client = AnswerLlmClient::with_base_url(
        &server.uri(),
        "test-key",
        5,
        RetryConfig {
            max_retries: 3,
            backoff_base_ms: 0,
        },
    )
    .expect("client construction should not fail");

    let answer = client.call("anything").await.expect("retries should recover");
    assert_eq!(answer.content, "Recovered.");
}
