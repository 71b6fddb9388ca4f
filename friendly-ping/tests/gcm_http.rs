use std::sync::Arc;

use anyhow::Result;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::post,
};
use friendly_ping::{
    client::Client,
    directory::Directory,
    gcm::GcmHttpTransport,
    notification,
    relay::Relay,
    transport::{Transport, TransportError},
};
use serde_json::{Map, Value, json};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Default)]
struct Backend {
    requests: Mutex<Vec<(Option<String>, Value)>>,
    canonical: Option<String>,
}

async fn send(
    State(backend): State<Arc<Backend>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    backend.requests.lock().await.push((auth.clone(), body.clone()));

    if auth.as_deref() != Some("key=secret") {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "bad key" })));
    }

    if body.get("to").and_then(Value::as_str) == Some("/topics/newclient") {
        return (StatusCode::OK, Json(json!({ "message_id": 42 })));
    }

    let registration_id = backend.canonical.clone();
    let canonical_ids = u32::from(registration_id.is_some());
    (
        StatusCode::OK,
        Json(json!({
            "multicast_id": 7,
            "success": 1,
            "failure": 0,
            "canonical_ids": canonical_ids,
            "results": [{ "message_id": "0:1", "registration_id": registration_id }],
        })),
    )
}

async fn spawn_backend(backend: Arc<Backend>) -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/gcm/send", post(send))
        .with_state(backend);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}/gcm/send"))
}

#[tokio::test]
async fn sends_key_header_and_parses_report() -> Result<()> {
    let backend = Arc::new(Backend::default());
    let endpoint = spawn_backend(backend.clone()).await?;
    let transport = GcmHttpTransport::new("secret", endpoint);

    let sender = Client::new("alice", "token-a", "");
    let report = transport
        .send(&notification::ping_client("token-b", "token-a", &sender))
        .await?;

    assert_eq!(report.multicast_id, Some(7));
    assert_eq!(report.success, 1);
    assert_eq!(report.canonical_ids, 0);

    let requests = backend.requests.lock().await;
    assert_eq!(requests.len(), 1);
    let (auth, body) = &requests[0];
    assert_eq!(auth.as_deref(), Some("key=secret"));
    assert_eq!(body["to"], "token-b");
    assert_eq!(body["data"]["action"], "ping_client");
    assert_eq!(body["data"]["sender"], "token-a");
    assert_eq!(body["notification"]["title"], "Friendly Ping!");
    Ok(())
}

#[tokio::test]
async fn rejected_send_reports_status() -> Result<()> {
    let backend = Arc::new(Backend::default());
    let endpoint = spawn_backend(backend).await?;
    let transport = GcmHttpTransport::new("wrong", endpoint);

    let result = transport
        .send(&notification::send_client_list("token-a", Vec::new()))
        .await;

    match result {
        Err(TransportError::Rejected { status, body }) => {
            assert_eq!(status, 401);
            assert!(body.contains("bad key"));
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn relay_applies_canonical_ids_from_backend() -> Result<()> {
    let backend = Arc::new(Backend {
        canonical: Some("token-a2".into()),
        ..Backend::default()
    });
    let endpoint = spawn_backend(backend.clone()).await?;

    let directory = Arc::new(Directory::new());
    let transport = Arc::new(GcmHttpTransport::new("secret", endpoint));
    let relay = Relay::new("1234", directory.clone(), transport).await?;

    let mut data = Map::new();
    data.insert("action".into(), json!("register_new_client"));
    data.insert("name".into(), json!("alice"));
    data.insert("registration_token".into(), json!("token-a"));
    data.insert("profile_picture_url".into(), json!(""));
    relay.on_message("token-a", &data).await?;

    // The client list reply came back with a canonical id for alice.
    assert!(directory.get("token-a").await.is_none());
    assert_eq!(directory.get("token-a2").await.map(|c| c.name), Some("alice".into()));

    let requests = backend.requests.lock().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].1["to"], "/topics/newclient");
    assert_eq!(requests[1].1["data"]["action"], "send_client_list");
    Ok(())
}
