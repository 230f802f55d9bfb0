mod common;

use serde_json::json;
use textease_common::{Result, TextEaseError};
use textease_llm::ollama::OllamaClient;
use textease_llm::traits::{DecodingParams, LlmClient};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "ruT5-simplify";

async fn server_with_model() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [{ "name": MODEL }]
        })))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn generate_sends_deterministic_options() -> Result<()> {
    common::init_test_tracing();
    let server = server_with_model().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({
            "model": MODEL,
            "prompt": "упрости: Текст.",
            "stream": false,
            "options": { "num_predict": 200, "temperature": 0.0, "top_k": 1 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Простой текст.",
            "eval_count": 4
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OllamaClient::new(format!("{}/", server.uri()), MODEL.to_string(), None).await?;
    let response = client
        .generate("упрости: Текст.", None, &DecodingParams::beam_search(200))
        .await?;

    assert_eq!(response.text, "Простой текст.");
    assert_eq!(response.tokens_used, Some(4));
    assert_eq!(response.model.as_deref(), Some(MODEL));
    assert_eq!(client.model_name(), MODEL);
    // Sub-word estimate, not one token per word.
    assert_eq!(client.count_tokens("Главный герой пошёл в лес."), 11);
    Ok(())
}

#[tokio::test]
async fn missing_model_is_pulled_on_connect() -> Result<()> {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/pull"))
        .and(body_partial_json(json!({ "model": MODEL })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OllamaClient::new(server.uri(), MODEL.to_string(), None).await?;
    assert!(client.health_check().await?);
    Ok(())
}

#[tokio::test]
async fn server_error_surfaces_as_transformation_failure() -> Result<()> {
    common::init_test_tracing();
    let server = server_with_model().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = OllamaClient::new(server.uri(), MODEL.to_string(), None).await?;
    let err = client
        .generate("упрости: x", None, &DecodingParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TextEaseError::Transformation(_)), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn unreachable_server_is_a_config_error() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let result = OllamaClient::new(uri, MODEL.to_string(), None).await;
    assert!(matches!(result, Err(TextEaseError::Config(_))));
}
