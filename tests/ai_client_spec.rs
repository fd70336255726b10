use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use scriptorium::ai::{AiClient, AiError, Completer, Message, ANTHROPIC_VERSION, GENERIC_SYSTEM_PROMPT, MAX_OUTPUT_TOKENS};
use scriptorium::models::AiConfig;
use serde_json::{json, Value};

type Captured = Arc<Mutex<Vec<(HeaderMap, Value)>>>;

#[derive(Clone)]
struct StubState {
    captured: Captured,
    status: StatusCode,
    reply: Value,
}

async fn messages(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.captured.lock().unwrap().push((headers, body));
    (state.status, Json(state.reply.clone()))
}

/// Serve a fake completion endpoint and return its base URL.
async fn spawn_stub(status: StatusCode, reply: Value) -> (String, Captured) {
    let captured = Captured::default();
    let app = Router::new()
        .route("/v1/messages", post(messages))
        .with_state(StubState {
            captured: captured.clone(),
            status,
            reply,
        });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Stub server failed");
    });

    (format!("http://{}", addr), captured)
}

fn client(base_url: &str) -> AiClient {
    AiClient::new(AiConfig {
        api_key: "sk-test".to_string(),
        model: "test-model".to_string(),
        base_url: Some(base_url.to_string()),
    })
}

fn text_reply(text: &str) -> Value {
    json!({ "content": [{ "type": "text", "text": text }] })
}

mod requests {
    use super::*;

    #[tokio::test]
    async fn sends_credentials_and_the_message_body() {
        let (base, captured) = spawn_stub(StatusCode::OK, text_reply("Hi")).await;

        client(&base)
            .complete(vec![Message::user("Hello")], None)
            .await
            .expect("Completion failed");

        let requests = captured.lock().unwrap();
        let (headers, body) = &requests[0];
        assert_eq!(headers["x-api-key"], "sk-test");
        assert_eq!(headers["anthropic-version"], ANTHROPIC_VERSION);
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["max_tokens"], MAX_OUTPUT_TOKENS);
        assert_eq!(body["system"], GENERIC_SYSTEM_PROMPT);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Hello");
    }

    #[tokio::test]
    async fn uses_the_default_system_prompt_when_none_is_given() {
        let (base, captured) = spawn_stub(StatusCode::OK, text_reply("Hi")).await;

        client(&base)
            .with_default_system("You are a sharp critic.")
            .complete(vec![Message::user("Hello")], None)
            .await
            .expect("Completion failed");

        assert_eq!(captured.lock().unwrap()[0].1["system"], "You are a sharp critic.");
    }

    #[tokio::test]
    async fn an_explicit_system_prompt_wins() {
        let (base, captured) = spawn_stub(StatusCode::OK, text_reply("Hi")).await;

        client(&base)
            .with_default_system("You are a sharp critic.")
            .complete(vec![Message::user("Hello")], Some("Write like Woolf.".to_string()))
            .await
            .expect("Completion failed");

        assert_eq!(captured.lock().unwrap()[0].1["system"], "Write like Woolf.");
    }

    #[tokio::test]
    async fn tolerates_a_trailing_slash_in_the_base_url() {
        let (base, captured) = spawn_stub(StatusCode::OK, text_reply("Hi")).await;

        client(&format!("{}/", base))
            .complete(vec![Message::user("Hello")], None)
            .await
            .expect("Completion failed");

        assert_eq!(captured.lock().unwrap().len(), 1);
    }
}

mod responses {
    use super::*;

    #[tokio::test]
    async fn returns_the_first_text_block() {
        let (base, _) = spawn_stub(StatusCode::OK, text_reply("A continuation.")).await;

        let text = client(&base)
            .complete(vec![Message::user("Hello")], None)
            .await
            .expect("Completion failed");

        assert_eq!(text, "A continuation.");
    }

    #[tokio::test]
    async fn returns_empty_text_when_there_is_no_content() {
        let (base, _) = spawn_stub(StatusCode::OK, json!({ "content": [] })).await;

        let text = client(&base)
            .complete(vec![Message::user("Hello")], None)
            .await
            .expect("Completion failed");

        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn surfaces_the_remote_error_message() {
        let (base, _) = spawn_stub(
            StatusCode::UNAUTHORIZED,
            json!({ "type": "error", "error": { "type": "authentication_error", "message": "invalid x-api-key" } }),
        )
        .await;

        let result = client(&base).complete(vec![Message::user("Hello")], None).await;

        match result {
            Err(AiError::Request(message)) => assert_eq!(message, "invalid x-api-key"),
            other => panic!("Expected a request error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_key_fails_without_a_request() {
        let (base, captured) = spawn_stub(StatusCode::OK, text_reply("Hi")).await;
        let client = AiClient::new(AiConfig {
            base_url: Some(base),
            ..Default::default()
        });

        let result = client.complete(vec![Message::user("Hello")], None).await;

        assert!(matches!(result, Err(AiError::Config)));
        assert!(!client.is_configured());
        assert!(captured.lock().unwrap().is_empty());
    }
}
