use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::State;
use axum::http::StatusCode as AxumStatus;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use futures::StreamExt;

use super::*;
use crate::chat::types::{HistoryEntry, Role};

type Captured = Arc<Mutex<Vec<ChatRequest>>>;

fn request() -> ChatRequest {
    ChatRequest {
        developer_message: "You are a helpful AI assistant.".into(),
        user_message: "hi".into(),
        chat_history: vec![HistoryEntry { role: Role::User, content: "before".into() }],
        model: "gpt-4.1-mini".into(),
        api_key: "sk-test-abcdefgh".into(),
    }
}

async fn stream_reply(State(captured): State<Captured>, Json(request): Json<ChatRequest>) -> Response {
    captured.lock().unwrap().push(request);
    let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from_static(b"He")),
        Ok(Bytes::from_static(b"llo \xF0\x9F")),
        Ok(Bytes::from_static(b"\x98\x80")),
    ];
    Body::from_stream(futures::stream::iter(chunks)).into_response()
}

async fn fail_reply() -> Response {
    (AxumStatus::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
}

async fn empty_reply() -> Response {
    AxumStatus::NO_CONTENT.into_response()
}

async fn spawn_server(captured: Captured) -> String {
    let app = Router::new()
        .route("/api/chat", post(stream_reply))
        .route("/api/fail", post(fail_reply))
        .route("/api/empty", post(empty_reply))
        .with_state(captured);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client_for(url: &str) -> HttpChatClient {
    let config = ChatConfig::default().with_endpoint(url).unwrap();
    HttpChatClient::new(&config).unwrap()
}

#[tokio::test]
async fn streams_body_and_posts_request_json() {
    let captured = Captured::default();
    let base = spawn_server(captured.clone()).await;
    let client = client_for(&format!("{base}/api/chat"));

    let mut stream = client.open(&request()).await.unwrap();
    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        body.extend_from_slice(&chunk.unwrap());
    }

    assert_eq!(String::from_utf8(body).unwrap(), "Hello 😀");
    let seen = captured.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], request());
}

#[tokio::test]
async fn non_success_status_is_response_error() {
    let base = spawn_server(Captured::default()).await;
    let client = client_for(&format!("{base}/api/fail"));

    let err = client.open(&request()).await.err().unwrap();
    assert_eq!(err, ChatError::Response { status: 500, body: "upstream exploded".into() });
}

#[tokio::test]
async fn no_content_is_missing_body() {
    let base = spawn_server(Captured::default()).await;
    let client = client_for(&format!("{base}/api/empty"));

    let err = client.open(&request()).await.err().unwrap();
    assert_eq!(err, ChatError::MissingBody);
}

#[tokio::test]
async fn unknown_route_is_response_error() {
    let base = spawn_server(Captured::default()).await;
    let client = client_for(&format!("{base}/api/missing"));

    let err = client.open(&request()).await.err().unwrap();
    assert!(matches!(err, ChatError::Response { status: 404, .. }));
}

#[tokio::test]
async fn refused_connection_is_request_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{addr}/api/chat"));
    assert_eq!(client.endpoint(), format!("http://{addr}/api/chat"));
    let err = client.open(&request()).await.err().unwrap();
    assert!(matches!(err, ChatError::Request(_)));
}
