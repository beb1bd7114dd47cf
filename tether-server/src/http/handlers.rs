use crate::error::SignalingError;
use crate::http::{ApiError, ApiResult};
use crate::queue::ClientQueue;
use crate::room::RoomCoordinator;
use crate::signaling::{PushNotifier, SignalingService};
use axum::Form;
use axum::Json;
use axum::extract::{Path, State};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tether_core::{ClientId, IdError, RoomId, RoomStats, SignalMessage};
use tracing::info;

#[derive(Debug, Serialize, Deserialize)]
pub struct ChannelGrant {
    pub peer: ClientId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Body of the transport's lifecycle callbacks.
#[derive(Debug, Deserialize)]
pub struct HookForm {
    #[serde(default)]
    pub from: String,
}

pub async fn missing_room() -> ApiError {
    ApiError::from(IdError::EmptyRoom)
}

pub async fn room_stats(
    State(coordinator): State<RoomCoordinator>,
    Path(room_id): Path<String>,
) -> ApiResult<Json<RoomStats>> {
    let room_id = RoomId::new(room_id)?;
    Ok(Json(coordinator.stats(&room_id).await?))
}

/// Push mode: mint a client id and the token for its WebSocket.
pub async fn issue_channel(
    State(signaling): State<SignalingService>,
    Path(room_id): Path<String>,
) -> ApiResult<Json<ChannelGrant>> {
    let room_id = RoomId::new(room_id)?;
    let peer = ClientId::generate(&room_id);
    let token = signaling.register(&peer).await;
    info!("Issued channel for {}", peer);

    Ok(Json(ChannelGrant {
        peer,
        token: Some(token),
    }))
}

/// Pull mode: mint a client id. Delivery needs no handle.
pub async fn issue_peer(Path(room_id): Path<String>) -> ApiResult<Json<ChannelGrant>> {
    let room_id = RoomId::new(room_id)?;
    Ok(Json(ChannelGrant {
        peer: ClientId::generate(&room_id),
        token: None,
    }))
}

pub async fn connected_hook(
    State(coordinator): State<RoomCoordinator>,
    Form(form): Form<HookForm>,
) -> ApiResult<Json<RoomStats>> {
    let client_id = ClientId::new(form.from)?;
    let room_id = client_id.room()?;

    coordinator.join(&room_id, &client_id).await?;
    let stats = coordinator.stats(&room_id).await?;
    info!("Room {} stats: {:?}", room_id, stats);
    Ok(Json(stats))
}

pub async fn disconnected_hook(
    State(coordinator): State<RoomCoordinator>,
    Form(form): Form<HookForm>,
) -> ApiResult<Json<RoomStats>> {
    let client_id = ClientId::new(form.from)?;
    let room_id = client_id.room()?;

    coordinator.leave(&room_id, &client_id).await?;
    let stats = coordinator.stats(&room_id).await?;
    info!("Room {} stats: {:?}", room_id, stats);
    Ok(Json(stats))
}

pub async fn push_relay(
    State(coordinator): State<RoomCoordinator>,
    Path((room_id, from_id)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    relay_body(&coordinator, room_id, from_id, None, body).await
}

pub async fn push_relay_to(
    State(coordinator): State<RoomCoordinator>,
    Path((room_id, from_id, to_id)): Path<(String, String, String)>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    relay_body(&coordinator, room_id, from_id, Some(to_id), body).await
}

async fn relay_body(
    coordinator: &RoomCoordinator,
    room_id: String,
    from_id: String,
    to_id: Option<String>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let room_id = RoomId::new(room_id)?;
    let from_id = ClientId::new(from_id)?;
    let to_id = to_id.map(ClientId::new).transpose()?;
    let payload = String::from_utf8(body.to_vec()).map_err(|_| SignalingError::NonUtf8Payload)?;

    coordinator
        .relay(&room_id, &from_id, to_id.as_ref(), Value::String(payload))
        .await?;
    Ok(Json(json!({})))
}

pub async fn pull_connected(
    State(coordinator): State<RoomCoordinator>,
    Path((room_id, client_id)): Path<(String, String)>,
) -> ApiResult<Json<RoomStats>> {
    let room_id = RoomId::new(room_id)?;
    let client_id = ClientId::new(client_id)?;

    coordinator.join(&room_id, &client_id).await?;
    Ok(Json(coordinator.stats(&room_id).await?))
}

pub async fn pull_disconnected(
    State(coordinator): State<RoomCoordinator>,
    Path((room_id, client_id)): Path<(String, String)>,
) -> ApiResult<Json<RoomStats>> {
    let room_id = RoomId::new(room_id)?;
    let client_id = ClientId::new(client_id)?;

    coordinator.leave(&room_id, &client_id).await?;
    Ok(Json(coordinator.stats(&room_id).await?))
}

/// Relays whatever the client sent, then hands back its own mailbox.
pub async fn poll(
    State(coordinator): State<RoomCoordinator>,
    State(queue): State<ClientQueue>,
    Path((room_id, from_id)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<Json<Vec<SignalMessage>>> {
    let room_id = RoomId::new(room_id)?;
    let from_id = ClientId::new(from_id)?;

    coordinator.relay_batch(&room_id, &from_id, &body).await?;

    let messages = queue
        .drain_and_return(&room_id, &from_id)
        .await?
        .into_iter()
        .map(|queued| queued.message)
        .collect();
    Ok(Json(messages))
}
