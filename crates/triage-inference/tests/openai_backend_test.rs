//! Wire-level tests for the OpenAI-compatible backend against a mock server.

use triage_core::{AzureSettings, Error, GenerationBackend, LlmSettings};
use triage_inference::openai::{OpenAIBackend, OpenAIConfig};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}

fn azure_backend(server: &MockServer) -> OpenAIBackend {
    let azure = AzureSettings {
        endpoint: Some(server.uri()),
        api_key: Some("azure-key".to_string()),
        deployment: "gpt-4o".to_string(),
        api_version: "2024-02-15-preview".to_string(),
    };
    let config = OpenAIConfig::azure(&azure, &LlmSettings::default()).expect("azure config");
    OpenAIBackend::new(config).expect("Failed to create backend")
}

#[tokio::test]
async fn test_azure_request_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-4o/chat/completions"))
        .and(query_param("api-version", "2024-02-15-preview"))
        .and(header("api-key", "azure-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-4o",
            "max_tokens": 2000
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("**Summary:**\nok")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = azure_backend(&mock_server);
    let text = backend.generate("Summarize").await;

    assert_eq!(text.unwrap(), "**Summary:**\nok");
}

#[tokio::test]
async fn test_generate_sends_system_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/deployments/gpt-4o/chat/completions"))
        .and(body_partial_json(serde_json::json!({
            "messages": [{"role": "system"}, {"role": "user", "content": "Summarize"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("done")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = azure_backend(&mock_server);
    assert!(backend.generate("Summarize").await.is_ok());
}

#[tokio::test]
async fn test_bearer_auth_for_plain_openai() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("hi")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = OpenAIConfig {
        base_url: mock_server.uri(),
        api_key: Some("sk-test".to_string()),
        ..Default::default()
    };
    let backend = OpenAIBackend::new(config).unwrap();
    assert_eq!(backend.generate("hello").await.unwrap(), "hi");
}

#[tokio::test]
async fn test_rate_limit_is_retryable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": {"message": "Too many requests", "type": "rate_limit_exceeded", "code": "429"}
        })))
        .mount(&mock_server)
        .await;

    let err = azure_backend(&mock_server).generate("x").await.unwrap_err();
    assert!(err.is_retryable(), "{err:?}");
}

#[tokio::test]
async fn test_auth_failure_is_config_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "error": {"message": "Access denied", "type": "invalid_request_error"}
        })))
        .mount(&mock_server)
        .await;

    let err = azure_backend(&mock_server).generate("x").await.unwrap_err();
    assert!(matches!(err, Error::Config(_)), "{err:?}");
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_server_error_without_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&mock_server)
        .await;

    let err = azure_backend(&mock_server).generate("x").await.unwrap_err();
    assert!(matches!(err, Error::Inference(_)), "{err:?}");
}

#[tokio::test]
async fn test_empty_content_is_inference_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("   ")))
        .mount(&mock_server)
        .await;

    let err = azure_backend(&mock_server).generate("x").await.unwrap_err();
    assert!(matches!(err, Error::Inference(_)));
}

#[tokio::test]
async fn test_missing_deployment_is_inference_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": {"message": "The API deployment for this resource does not exist.", "code": "DeploymentNotFound"}
        })))
        .mount(&mock_server)
        .await;

    let err = azure_backend(&mock_server).generate("x").await.unwrap_err();
    assert!(matches!(err, Error::Inference(_)), "{err:?}");
}
