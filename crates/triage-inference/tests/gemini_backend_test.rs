//! Wire-level tests for the Gemini backend against a mock server.

use triage_core::{Error, GeminiSettings, GenerationBackend, LlmSettings};
use triage_inference::gemini::{GeminiBackend, GeminiConfig};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.0-flash-exp:generateContent";

fn backend(server: &MockServer) -> GeminiBackend {
    let settings = GeminiSettings {
        api_key: Some("g-key".to_string()),
        base_url: server.uri(),
        ..Default::default()
    };
    let config = GeminiConfig::from_settings(&settings, &LlmSettings::default()).unwrap();
    GeminiBackend::new(config).expect("Failed to create backend")
}

#[tokio::test]
async fn test_generate_joins_parts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "g-key"))
        .and(body_partial_json(serde_json::json!({
            "contents": [{"role": "user", "parts": [{"text": "Summarize"}]}],
            "generationConfig": {"maxOutputTokens": 2000}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "**Summary:**\n"}, {"text": "done"}]},
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let text = backend(&mock_server).generate("Summarize").await.unwrap();
    assert_eq!(text, "**Summary:**\ndone");
}

#[tokio::test]
async fn test_no_candidates_is_inference_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})))
        .mount(&mock_server)
        .await;

    let err = backend(&mock_server).generate("x").await.unwrap_err();
    assert!(matches!(err, Error::Inference(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_blocked_response_is_inference_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{"finishReason": "SAFETY"}]
        })))
        .mount(&mock_server)
        .await;

    let err = backend(&mock_server).generate("x").await.unwrap_err();
    assert!(err.to_string().contains("SAFETY"));
}

#[tokio::test]
async fn test_quota_exhausted_is_retryable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}
        })))
        .mount(&mock_server)
        .await;

    let err = backend(&mock_server).generate("x").await.unwrap_err();
    assert!(err.is_retryable());
    assert!(err.to_string().contains("RESOURCE_EXHAUSTED"));
}

#[tokio::test]
async fn test_bad_key_is_config_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}
        })))
        .mount(&mock_server)
        .await;

    let err = backend(&mock_server).generate("x").await.unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[tokio::test]
async fn test_unknown_model_is_inference_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": {"code": 404, "message": "models/gemini-2.0-flash-exp is not found", "status": "NOT_FOUND"}
        })))
        .mount(&mock_server)
        .await;

    let err = backend(&mock_server).generate("x").await.unwrap_err();
    assert!(matches!(err, Error::Inference(_)), "{err:?}");
}
