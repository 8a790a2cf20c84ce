//! DeepSeek 适配器测试（OpenAI 同构接口，独立变体）

use rustllm::{ConfigDocument, ConfigOverrides, LLMAgent, LlmError, Role};
use rustllm::config::{ProviderEntry, Settings};
use serde_json::json;
use std::collections::HashMap;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn doc(base_url: &str) -> ConfigDocument {
    let mut providers = HashMap::new();
    providers.insert(
        "deepseek".to_string(),
        ProviderEntry {
            api_key: Some("sk-ds".to_string()),
            secret_key: None,
            base_url: Some(base_url.to_string()),
            default_model: Some("deepseek-chat".to_string()),
        },
    );
    ConfigDocument {
        providers,
        settings: Settings {
            timeout: Some(5),
            max_history_length: Some(4),
            ..Default::default()
        },
    }
}

#[tokio::test]
async fn multi_turn_context_is_replayed_and_trimmed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer sk-ds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "ack"}}]
        })))
        .expect(3)
        .mount(&server)
        .await;

    let doc = doc(&server.uri());
    let mut agent =
        LLMAgent::from_document("deepseek", &doc, ConfigOverrides::default()).unwrap();

    agent.ask("q0").await.unwrap();
    agent.ask("q1").await.unwrap();
    agent.ask("q2").await.unwrap();

    // max_history_length = 4 → 三对轮次只保留最近两对
    let history = agent.get_history();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].content, "q1");
    assert_eq!(history[3].role, Role::Assistant);
}

#[tokio::test]
async fn request_carries_full_window() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "one"}}]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    // 第二次请求必须带上第一轮问答作为上下文
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "user", "content": "first"},
                {"role": "assistant", "content": "one"},
                {"role": "user", "content": "second"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "two"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let doc = doc(&server.uri());
    let mut agent =
        LLMAgent::from_document("deepseek", &doc, ConfigOverrides::default()).unwrap();

    assert_eq!(agent.ask("first").await.unwrap(), "one");
    assert_eq!(agent.ask("second").await.unwrap(), "two");
}

#[tokio::test]
async fn clear_history_drops_context() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "ack"}}]
        })))
        .mount(&server)
        .await;

    let doc = doc(&server.uri());
    let mut agent =
        LLMAgent::from_document("deepseek", &doc, ConfigOverrides::default()).unwrap();

    agent.ask("q").await.unwrap();
    agent.clear_history();
    assert!(agent.get_history().is_empty());
}

#[tokio::test]
async fn strict_extraction_rejects_missing_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant"}}]
        })))
        .mount(&server)
        .await;

    let doc = doc(&server.uri());
    let mut agent =
        LLMAgent::from_document("deepseek", &doc, ConfigOverrides::default()).unwrap();

    let err = agent.ask("hi").await.unwrap_err();
    assert!(matches!(err, LlmError::InvalidResponse(_)));
}
