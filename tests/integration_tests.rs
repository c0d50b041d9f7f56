//! Integration tests for the lexichat client against a mock backend.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lexichat::{KnownModel, LexiChat, MessagePayload, MessageRole, Model};

fn envelope_ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"code": 0, "data": data}))
}

#[tokio::test]
async fn create_chat_returns_history_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ai/create"))
        .and(body_string_contains("userId=u1"))
        .and(body_string_contains("title=Contract+review"))
        .and(body_string_contains("type=law"))
        .respond_with(envelope_ok(json!({"historyId": 42})))
        .expect(1)
        .mount(&server)
        .await;

    let client = LexiChat::new(server.uri()).unwrap();
    let history_id = client
        .create_chat("u1", "Contract review", "law")
        .await
        .unwrap();
    assert_eq!(history_id, "42");
}

#[tokio::test]
async fn create_chat_validation_happens_before_any_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ai/create"))
        .respond_with(envelope_ok(json!({"historyId": 1})))
        .expect(0)
        .mount(&server)
        .await;

    let client = LexiChat::new(server.uri()).unwrap();
    let err = client.create_chat("", "title", "law").await.unwrap_err();
    assert!(err.is_validation());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn nonzero_envelope_code_surfaces_the_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ai/create"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 1, "message": "duplicate"})),
        )
        .mount(&server)
        .await;

    let client = LexiChat::new(server.uri()).unwrap();
    let err = client.create_chat("u1", "t", "law").await.unwrap_err();
    assert!(err.is_api());
    assert_eq!(err.to_string(), "API error (code 1): duplicate");
}

#[tokio::test]
async fn unauthorized_maps_to_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ai/create"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = LexiChat::new(server.uri()).unwrap();
    let err = client.create_chat("u1", "t", "law").await.unwrap_err();
    assert!(err.is_authentication());
    assert_eq!(err.status_code(), Some(401));
}

#[tokio::test]
async fn auth_token_is_attached_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/ai/rename"))
        .and(header("Authorization", "tok-123"))
        .and(body_string_contains("historyId=7"))
        .and(body_string_contains("newTitle=Renamed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0})))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        LexiChat::with_options(server.uri(), Some("tok-123".to_string()), None).unwrap();
    client.rename_chat("7", "Renamed").await.unwrap();
}

#[tokio::test]
async fn delete_chat_sends_form_encoded_history_id() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/ai/delete"))
        .and(body_string_contains("historyId=7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0})))
        .expect(1)
        .mount(&server)
        .await;

    let client = LexiChat::new(server.uri()).unwrap();
    client.delete_chat("7").await.unwrap();
}

#[tokio::test]
async fn list_chats_maps_the_history_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ai/getHistory"))
        .and(query_param("userId", "u1"))
        .and(query_param("type", "law"))
        .respond_with(envelope_ok(json!([
            {"historyId": 1, "title": "First"},
            {"historyId": 2, "title": "Second"},
        ])))
        .mount(&server)
        .await;

    let client = LexiChat::new(server.uri()).unwrap();
    let chats = client.list_chats("u1", "law").await;
    assert_eq!(chats.len(), 2);
    assert_eq!(chats[0].id, "1");
    assert_eq!(chats[0].title, "First");
    assert_eq!(chats[1].id, "2");
}

#[tokio::test]
async fn list_chats_degrades_to_empty_on_server_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ai/getHistory"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = LexiChat::new(server.uri()).unwrap();
    assert!(client.list_chats("u1", "law").await.is_empty());
}

#[tokio::test]
async fn list_chats_degrades_to_empty_on_envelope_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ai/getHistory"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 3, "message": "no user"})),
        )
        .mount(&server)
        .await;

    let client = LexiChat::new(server.uri()).unwrap();
    assert!(client.list_chats("u1", "law").await.is_empty());
}

#[tokio::test]
async fn chat_messages_expand_into_user_assistant_pairs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ai/getChatInfo"))
        .and(query_param("historyId", "7"))
        .respond_with(envelope_ok(json!([
            {"prompt": "What is article 5?", "answer": "Article 5 says...", "reference": "{\"src\":1}"},
            {"prompt": "And article 6?", "answer": "Article 6 says...", "reference": ""},
        ])))
        .mount(&server)
        .await;

    let client = LexiChat::new(server.uri()).unwrap();
    let messages = client.chat_messages("7").await;
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[0].content, "What is article 5?");
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert_eq!(messages[1].reference.as_deref(), Some("{\"src\":1}"));
    assert_eq!(messages[2].role, MessageRole::User);
    assert!(messages[3].reference.is_none());
}

#[tokio::test]
async fn send_message_streams_and_extracts_the_reference() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ai/chat"))
        .and(body_string_contains("prompt=hello"))
        .and(body_string_contains("historyId=7"))
        .and(body_string_contains("model=deepseek-chat"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            &b"Hello world<!-- REFERENCE_DATA:{\"src\":1} -->!"[..],
            "text/plain",
        ))
        .mount(&server)
        .await;

    let client = LexiChat::new(server.uri()).unwrap();
    let stream = client
        .send_message(
            MessagePayload::text("hello"),
            Some("7"),
            Some(Model::Known(KnownModel::DeepseekChat)),
        )
        .await
        .unwrap();

    let mut updates = Vec::new();
    let final_update = stream.read(|u| updates.push(u.clone())).await.unwrap();
    assert!(final_update.done);
    assert_eq!(final_update.content, "Hello world!");
    assert!(final_update.reference_found);
    assert_eq!(final_update.reference.as_deref(), Some("{\"src\":1}"));
    // updates arrive in order, content only grows, done is last
    for pair in updates.windows(2) {
        assert!(pair[0].content.len() <= pair[1].content.len());
        assert!(!pair[0].done);
    }
    assert_eq!(updates.last(), Some(&final_update));
}

#[tokio::test]
async fn send_message_multipart_carries_session_and_model_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ai/chat"))
        .and(body_string_contains("attachment.txt"))
        .and(body_string_contains("historyId"))
        .and(body_string_contains("deepseek-reasoner"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(&b"received"[..], "text/plain"))
        .expect(1)
        .mount(&server)
        .await;

    let form = reqwest::multipart::Form::new()
        .text("prompt", "summarize this")
        .part(
            "file",
            reqwest::multipart::Part::bytes(b"contents".to_vec()).file_name("attachment.txt"),
        );

    let client = LexiChat::new(server.uri()).unwrap();
    let stream = client
        .send_message(
            MessagePayload::Multipart(form),
            Some("7"),
            Some(Model::Known(KnownModel::DeepseekReasoner)),
        )
        .await
        .unwrap();
    let final_update = stream.read(|_| {}).await.unwrap();
    assert_eq!(final_update.content, "received");
}

#[tokio::test]
async fn send_message_fails_on_http_error_before_streaming() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ai/chat"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client =
        LexiChat::with_options(server.uri(), None, Some(Duration::from_secs(5))).unwrap();
    let err = client
        .send_message(MessagePayload::text("hello"), None, None)
        .await
        .unwrap_err();
    assert!(err.is_transport());
    assert_eq!(err.status_code(), Some(503));
}
