use crate::error::SignalingError;
use crate::http::{ApiError, PushState};
use crate::room::RoomCoordinator;
use crate::signaling::ConnectionId;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use tether_core::{ClientId, RoomId};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// A relay sent up the socket instead of over HTTP.
#[derive(Debug, Deserialize)]
struct RelayFrame {
    #[serde(default)]
    to: Option<ClientId>,
    data: Value,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(token): Path<String>,
    State(state): State<PushState>,
) -> Response {
    // Claimed before the upgrade so a token opens at most one socket.
    let Some(client_id) = state.signaling.take_token(&token) else {
        return ApiError(SignalingError::UnknownToken).into_response();
    };
    let room_id = match client_id.room() {
        Ok(room_id) => room_id,
        Err(e) => return ApiError::from(e).into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, room_id, client_id, state))
}

async fn handle_socket(
    socket: WebSocket,
    room_id: RoomId,
    client_id: ClientId,
    state: PushState,
) {
    info!("New WebSocket connection: {}", client_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    // Register before joining so the join notifications reach this socket.
    let conn = state.signaling.add_peer(client_id.clone(), tx);
    if let Err(e) = state.coordinator.join(&room_id, &client_id).await {
        error!("Join failed for {}: {}", client_id, e);
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let coordinator = state.coordinator.clone();
        let room_id = room_id.clone();
        let client_id = client_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<RelayFrame>(&text) {
                        Ok(frame) => {
                            relay_frame(&coordinator, &room_id, &client_id, frame).await
                        }
                        Err(e) => warn!("Invalid relay frame from {}: {:?}", client_id, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    close_peer(&state, &room_id, &client_id, conn).await;
}

/// Unregisters socket `conn` and leaves the room, unless a newer socket of
/// the same client has replaced it. Returns whether the client left.
async fn close_peer(
    state: &PushState,
    room_id: &RoomId,
    client_id: &ClientId,
    conn: ConnectionId,
) -> bool {
    if !state.signaling.remove_peer(client_id, conn) {
        info!("Stale WebSocket closed for {}; newer socket keeps membership", client_id);
        return false;
    }
    if let Err(e) = state.coordinator.leave(room_id, client_id).await {
        error!("Leave failed for {}: {}", client_id, e);
    }
    info!("WebSocket disconnected: {}", client_id);
    true
}

async fn relay_frame(
    coordinator: &RoomCoordinator,
    room_id: &RoomId,
    client_id: &ClientId,
    frame: RelayFrame,
) {
    if let Err(e) = coordinator
        .relay(room_id, client_id, frame.to.as_ref(), frame.data)
        .await
    {
        warn!("Relay from {} failed: {}", client_id, e);
    }
}
