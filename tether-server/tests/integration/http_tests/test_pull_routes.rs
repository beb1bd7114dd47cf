use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;
use tether_core::{ClientId, SignalMessage};
use tether_server::{MemoryStore, PullState, RoomConfig, pull_router};

use super::{get, post, send};
use crate::integration::init_tracing;
use crate::utils::{client, connected, disconnected, relay, room};

fn pull_app() -> axum::Router {
    let state = PullState::new(Arc::new(MemoryStore::new()), RoomConfig::default());
    pull_router(state)
}

async fn poll(app: &axum::Router, id: &ClientId, body: &str) -> anyhow::Result<Vec<SignalMessage>> {
    let (status, body) = send(app, post(&format!("/channel/lobby/{id}"), body.to_owned())).await?;
    assert_eq!(status, StatusCode::OK, "poll failed: {body}");
    Ok(serde_json::from_value(body)?)
}

#[tokio::test]
async fn test_issue_peer_has_no_token() -> anyhow::Result<()> {
    init_tracing();
    let app = pull_app();

    let (status, body) = send(&app, get("/channel/lobby")).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("token").is_none());
    let peer = ClientId::new(body["peer"].as_str().unwrap())?;
    assert_eq!(peer.room()?, room("lobby"));

    Ok(())
}

#[tokio::test]
async fn test_poll_lifecycle() -> anyhow::Result<()> {
    init_tracing();
    let app = pull_app();
    let lobby = room("lobby");
    let a = client(&lobby, "A");
    let b = client(&lobby, "B");

    let (_, body) = send(&app, post(&format!("/channel/lobby/{a}/connected"), "")).await?;
    assert_eq!(body, json!({"num_clients": 1}));
    let (_, body) = send(&app, post(&format!("/channel/lobby/{b}/connected"), "")).await?;
    assert_eq!(body, json!({"num_clients": 2}));

    assert_eq!(poll(&app, &a, "").await?, vec![connected(&b, &[&a, &b])]);
    assert_eq!(poll(&app, &b, "").await?, vec![connected(&a, &[&a, &b])]);

    let batch = json!([[null, "candidate"], [b.as_str(), "offer"]]).to_string();
    assert!(poll(&app, &a, &batch).await?.is_empty());
    assert_eq!(
        poll(&app, &b, "").await?,
        vec![relay(&a, "candidate"), relay(&a, "offer")]
    );

    let (_, body) = send(&app, post(&format!("/channel/lobby/{a}/disconnected"), "")).await?;
    assert_eq!(body, json!({"num_clients": 1}));
    assert_eq!(poll(&app, &b, "").await?, vec![disconnected(&a, &[&b])]);

    Ok(())
}

#[tokio::test]
async fn test_poll_with_malformed_batch() -> anyhow::Result<()> {
    init_tracing();
    let app = pull_app();
    let a = client(&room("lobby"), "A");
    send(&app, post(&format!("/channel/lobby/{a}/connected"), "")).await?;

    let (status, body) = send(&app, post(&format!("/channel/lobby/{a}"), "not json")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ValidationError");

    Ok(())
}

#[tokio::test]
async fn test_poll_reconnect_body() -> anyhow::Result<()> {
    init_tracing();
    let app = pull_app();
    let lobby = room("lobby");
    let a = client(&lobby, "A");
    let b = client(&lobby, "B");
    send(&app, post(&format!("/channel/lobby/{a}/connected"), "")).await?;

    let rejoin = poll(&app, &b, tether_core::RECONNECT_MARKER).await?;
    assert_eq!(rejoin, vec![connected(&a, &[&a, &b])]);

    let (_, body) = send(&app, get("/stats/lobby")).await?;
    assert_eq!(body, json!({"num_clients": 2}));

    Ok(())
}
