//! Integration tests for the controller driving the real HTTP transport
//!
//! These tests verify the full request/response cycle against an in-process
//! fake backend on a `tokio::net::TcpListener`:
//! - Request body shape and headers on the wire
//! - Reply mapping and history construction across turns
//! - Every failure path collapsing into the fallback reply
//! - Config-driven client construction and the health probe

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use partchat_core::{
    ChatClient, ChatConfig, ChatErrorKind, ConfigOverrides, ControllerOptions,
    ConversationController, HttpTransport, Message, SendOutcome, FALLBACK_REPLY,
};

// =============================================================================
// Fake Backend
// =============================================================================

/// One request as the fake backend saw it
#[derive(Debug)]
struct RecordedRequest {
    method: String,
    path: String,
    content_type: Option<String>,
    body: Vec<u8>,
}

impl RecordedRequest {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

/// Scripted HTTP server answering each connection with the next canned reply
struct FakeBackend {
    base: String,
    requests: mpsc::UnboundedReceiver<RecordedRequest>,
}

impl FakeBackend {
    /// Serve `replies` in order, repeating the last one
    async fn start(replies: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (tx, requests) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut served = 0usize;
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let (status, body) = replies[served.min(replies.len() - 1)];
                served += 1;
                let tx = tx.clone();

                tokio::spawn(async move {
                    let (read_half, mut write_half) = stream.into_split();
                    let mut reader = BufReader::new(read_half);

                    let mut request_line = String::new();
                    reader.read_line(&mut request_line).await.unwrap();
                    let mut parts = request_line.split_whitespace();
                    let method = parts.next().unwrap_or_default().to_string();
                    let path = parts.next().unwrap_or_default().to_string();

                    let mut content_length = 0usize;
                    let mut content_type = None;
                    loop {
                        let mut line = String::new();
                        reader.read_line(&mut line).await.unwrap();
                        let line = line.trim_end();
                        if line.is_empty() {
                            break;
                        }
                        if let Some((name, value)) = line.split_once(':') {
                            match name.trim().to_ascii_lowercase().as_str() {
                                "content-length" => {
                                    content_length = value.trim().parse().unwrap();
                                }
                                "content-type" => content_type = Some(value.trim().to_string()),
                                _ => {}
                            }
                        }
                    }

                    let mut body_bytes = vec![0u8; content_length];
                    reader.read_exact(&mut body_bytes).await.unwrap();
                    let _ = tx.send(RecordedRequest {
                        method,
                        path,
                        content_type,
                        body: body_bytes,
                    });

                    let response = format!(
                        "HTTP/1.1 {status} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    write_half.write_all(response.as_bytes()).await.unwrap();
                    write_half.shutdown().await.unwrap();
                });
            }
        });

        Self { base, requests }
    }

    fn chat_url(&self) -> String {
        format!("{}/api/v1/chat", self.base)
    }

    fn transport(&self) -> HttpTransport {
        HttpTransport::new(self.chat_url().parse().unwrap(), None).unwrap()
    }

    async fn next_request(&mut self) -> RecordedRequest {
        self.requests.recv().await.unwrap()
    }
}

fn controller(
    transport: HttpTransport,
    options: ControllerOptions,
) -> ConversationController<HttpTransport> {
    ConversationController::new(ChatClient::new(transport), options)
}

// =============================================================================
// Successful Round Trips
// =============================================================================

#[tokio::test]
async fn test_part_lookup_scenario_over_http() {
    let mut backend =
        FakeBackend::start(vec![(200, r#"{"response":"Here is what I found..."}"#)]).await;
    let c = controller(backend.transport(), ControllerOptions::unseeded());

    let outcome = c.send_message("PS12586284 water filter").await;

    assert_eq!(
        outcome,
        SendOutcome::Delivered(Message::assistant("Here is what I found..."))
    );
    assert_eq!(
        c.messages(),
        vec![
            Message::user("PS12586284 water filter"),
            Message::assistant("Here is what I found..."),
        ]
    );
    assert!(!c.is_sending());

    let request = backend.next_request().await;
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/api/v1/chat");
    assert_eq!(request.content_type.as_deref(), Some("application/json"));
    assert_eq!(
        request.json(),
        json!({
            "message": "PS12586284 water filter",
            "conversation_history": [
                {"role": "user", "content": "PS12586284 water filter"}
            ]
        })
    );
}

#[tokio::test]
async fn test_history_and_user_id_across_turns() {
    let mut backend = FakeBackend::start(vec![
        (200, r#"{"response":"B"}"#),
        (200, r#"{"response":"D"}"#),
    ])
    .await;
    let client = ChatClient::new(backend.transport()).with_user_id(Some("user123".to_string()));
    let c = ConversationController::new(client, ControllerOptions::default());

    c.send_message("A").await;
    c.send_message("C").await;

    let first = backend.next_request().await.json();
    assert_eq!(first["user_id"], "user123");
    assert_eq!(
        first["conversation_history"],
        json!([{"role": "user", "content": "A"}])
    );

    let second = backend.next_request().await.json();
    assert_eq!(second["message"], "C");
    assert_eq!(
        second["conversation_history"],
        json!([
            {"role": "user", "content": "A"},
            {"role": "assistant", "content": "B"},
            {"role": "user", "content": "C"}
        ])
    );

    // Greeting stays in the transcript even though it is never sent
    assert_eq!(c.messages().len(), 5);
    assert_eq!(c.messages()[0], Message::greeting());
}

#[tokio::test]
async fn test_extra_response_fields_are_tolerated() {
    let backend = FakeBackend::start(vec![(
        200,
        r#"{"response":"Found 2 parts","tools_used":["search_parts","get_part_details"]}"#,
    )])
    .await;
    let c = controller(backend.transport(), ControllerOptions::unseeded());

    let outcome = c.send_message("dishwasher rack wheels").await;

    assert_eq!(
        outcome,
        SendOutcome::Delivered(Message::assistant("Found 2 parts"))
    );
}

// =============================================================================
// Failure Paths
// =============================================================================

#[tokio::test]
async fn test_failures_become_fallback() {
    let cases: [(u16, &'static str); 5] = [
        (500, r#"{"detail":"Internal error"}"#),
        (422, r#"{"detail":"validation"}"#),
        (200, "this is not json"),
        (200, r#"{"answer":"wrong field"}"#),
        (200, r#"{"response":"   "}"#),
    ];

    for (status, body) in cases {
        let backend = FakeBackend::start(vec![(status, body)]).await;
        let c = controller(backend.transport(), ControllerOptions::default());

        let outcome = c.send_message("hello").await;

        let messages = c.messages();
        assert_eq!(messages.len(), 3, "case {status} {body}");
        assert_eq!(messages[1], Message::user("hello"));
        assert_eq!(messages[2].content, FALLBACK_REPLY);
        assert_eq!(outcome, SendOutcome::Delivered(Message::fallback()));
        assert!(!c.is_sending());
    }
}

#[tokio::test]
async fn test_failure_kinds_are_classified() {
    let cases = [
        ((503, r#"{"detail":"down"}"#), ChatErrorKind::ServerStatus(503)),
        ((404, "Not Found"), ChatErrorKind::ClientStatus(404)),
        ((200, "{"), ChatErrorKind::Malformed),
        ((200, r#"{"status":"running"}"#), ChatErrorKind::Malformed),
    ];

    for ((status, body), expected) in cases {
        let backend = FakeBackend::start(vec![(status, body)]).await;
        let client = ChatClient::new(backend.transport());

        let err = client.try_send("hi", &[Message::user("hi")]).await.unwrap_err();

        assert_eq!(err.kind, expected, "case {status} {body}");
    }
}

#[tokio::test]
async fn test_unreachable_backend_becomes_fallback() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport =
        HttpTransport::new(format!("http://{addr}/api/v1/chat").parse().unwrap(), None).unwrap();
    let c = controller(transport, ControllerOptions::unseeded());

    let outcome = c.send_message("hello").await;

    assert_eq!(outcome, SendOutcome::Delivered(Message::fallback()));
    assert!(!c.is_sending());
    assert!(!c.client().health_check().await);
}

#[tokio::test]
async fn test_configured_timeout_is_classified() {
    // Accepts and then never answers
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let transport = HttpTransport::new(
        format!("http://{addr}/api/v1/chat").parse().unwrap(),
        Some(Duration::from_millis(200)),
    )
    .unwrap();
    let client = ChatClient::new(transport);

    let err = client.try_send("hi", &[]).await.unwrap_err();
    assert_eq!(err.kind, ChatErrorKind::Timeout);
    assert!(err.kind.is_retryable());

    assert!(client.send("hi", &[]).await.is_fallback());
}

// =============================================================================
// Configuration and Health
// =============================================================================

#[tokio::test]
async fn test_config_builds_working_stack() {
    let mut backend = FakeBackend::start(vec![
        (200, r#"{"status":"running"}"#),
        (200, r#"{"response":"ready"}"#),
    ])
    .await;

    let mut config = ChatConfig::default();
    ConfigOverrides::new()
        .with_endpoint(backend.chat_url())
        .with_user_id("cli-user")
        .without_greeting()
        .apply(&mut config)
        .unwrap();

    let client = ChatClient::new(config.http_transport().unwrap())
        .with_user_id(config.user_id.clone());
    let c = Arc::new(ConversationController::new(
        client,
        config.controller_options(),
    ));

    assert!(c.client().health_check().await);
    let probe = backend.next_request().await;
    assert_eq!(probe.method, "GET");
    assert_eq!(probe.path, "/");

    assert!(c.send_message("hello").await.is_delivered());
    assert_eq!(
        c.messages(),
        vec![Message::user("hello"), Message::assistant("ready")]
    );
    let request = backend.next_request().await.json();
    assert_eq!(request["user_id"], "cli-user");
}

#[tokio::test]
async fn test_subscriber_sees_final_state_over_http() {
    let backend = FakeBackend::start(vec![(200, r#"{"response":"hi"}"#)]).await;
    let c = Arc::new(controller(backend.transport(), ControllerOptions::unseeded()));
    let mut rx = c.subscribe();
    rx.borrow_and_update();

    c.set_draft("hello");
    let outcome = c.submit_draft().await;
    assert!(outcome.is_delivered());

    assert!(rx.has_changed().unwrap());
    let snapshot = rx.borrow_and_update().clone();
    assert!(!snapshot.sending);
    assert!(snapshot.draft.is_empty());
    assert_eq!(
        snapshot.messages,
        vec![Message::user("hello"), Message::assistant("hi")]
    );
}
