use crate::http::{
    PullState, PushState, connected_hook, disconnected_hook, issue_channel, issue_peer,
    missing_room, poll, pull_connected, pull_disconnected, push_relay, push_relay_to, room_stats,
};
use crate::signaling::ws_handler;
use axum::Router;
use axum::http::{Method, header};
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};

/// Cross-origin policy applied to every response.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::POST,
            Method::GET,
            Method::PUT,
            Method::PATCH,
            Method::HEAD,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
}

/// Routes for push delivery: clients hold a WebSocket open for incoming
/// signals and relay over plain POSTs.
pub fn push_router(state: PushState) -> Router {
    Router::new()
        .route("/channel", get(missing_room))
        .route("/channel/", get(missing_room))
        .route("/channel/{room_id}", get(issue_channel))
        .route("/channel/{room_id}/{from_id}", post(push_relay))
        .route("/channel/{room_id}/{from_id}/{to_id}", post(push_relay_to))
        .route("/_ah/channel/connected/", post(connected_hook))
        .route("/_ah/channel/disconnected/", post(disconnected_hook))
        .route("/ws/{token}", get(ws_handler))
        .route("/stats/{room_id}", get(room_stats))
        .layer(cors_layer())
        .with_state(state)
}

/// Routes for pull delivery: every POST relays and returns the caller's
/// queued messages.
pub fn pull_router(state: PullState) -> Router {
    Router::new()
        .route("/channel", get(missing_room))
        .route("/channel/", get(missing_room))
        .route("/channel/{room_id}", get(issue_peer))
        .route("/channel/{room_id}/{from_id}/connected", post(pull_connected))
        .route(
            "/channel/{room_id}/{from_id}/disconnected",
            post(pull_disconnected),
        )
        .route("/channel/{room_id}/{from_id}", post(poll))
        .route("/stats/{room_id}", get(room_stats))
        .layer(cors_layer())
        .with_state(state)
}
