use std::{sync::Arc, time::Duration};

use axum::{
    debug_handler,
    extract::{
        Path, State, WebSocketUpgrade,
        ws::{Message, WebSocket, rejection::WebSocketUpgradeRejection},
    },
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};

use crate::{
    AppResult,
    auth::AuthUser,
    config::Config,
    models::{MessageFrame, RoomId, UserId},
    registry::{Connection, ConnectionRegistry},
    services::ChatService,
};

use super::parse_id;

/// Authorizes before looking at the upgrade headers, so outsiders get the
/// usual error envelope rather than a handshake rejection.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn room_ws(
    Path(room_id): Path<String>,
    State(chat): State<ChatService>,
    State(registry): State<ConnectionRegistry>,
    State(config): State<Arc<Config>>,
    AuthUser(user_id): AuthUser,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> AppResult<Response> {
    let room_id: RoomId = parse_id(&room_id, "room")?;
    chat.authorize_connection(room_id, user_id).await?;

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return Ok(rejection.into_response()),
    };
    let idle_timeout = config.ws_idle_timeout;
    Ok(ws.on_upgrade(move |socket| {
        serve_connection(socket, chat, registry, room_id, user_id, idle_timeout)
    }))
}

enum Inbound {
    Frame(MessageFrame),
    Skip,
    Closed,
}

fn decode(msg: Message) -> Result<Inbound, serde_json::Error> {
    Ok(match msg {
        Message::Text(text) => Inbound::Frame(serde_json::from_str(text.as_str())?),
        Message::Binary(bytes) => Inbound::Frame(serde_json::from_slice(&bytes)?),
        Message::Ping(_) | Message::Pong(_) => Inbound::Skip,
        Message::Close(_) => Inbound::Closed,
    })
}

async fn serve_connection(
    socket: WebSocket,
    chat: ChatService,
    registry: ConnectionRegistry,
    room_id: RoomId,
    user_id: UserId,
    idle_timeout: Duration,
) {
    let (connection, mut outbound) = Connection::open(user_id);
    let connection_id = connection.id;
    registry.register(connection, room_id);

    let (mut sender, mut receiver) = socket.split();

    let mut writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    loop {
        let next = tokio::select! {
            next = tokio::time::timeout(idle_timeout, receiver.next()) => next,
            _ = &mut writer => {
                tracing::debug!(%room_id, connection = ?connection_id, "writer stopped");
                break;
            }
        };

        let msg = match next {
            Err(_) => {
                tracing::info!(%room_id, connection = ?connection_id, "closing idle connection");
                break;
            }
            Ok(None) => break,
            Ok(Some(Err(err))) => {
                tracing::warn!(
                    %room_id,
                    connection = ?connection_id,
                    error = %err,
                    "websocket read failed"
                );
                break;
            }
            Ok(Some(Ok(msg))) => msg,
        };

        match decode(msg) {
            Ok(Inbound::Frame(frame)) => {
                // The frame's sender fields are ignored; the session decides who is talking.
                if let Err(err) = chat.send_message(room_id, user_id, frame.message).await {
                    tracing::warn!(%room_id, %user_id, error = %err, "inbound message rejected");
                }
            }
            Ok(Inbound::Skip) => {}
            Ok(Inbound::Closed) => break,
            Err(err) => {
                tracing::warn!(
                    %room_id,
                    connection = ?connection_id,
                    error = %err,
                    "undecodable frame, closing"
                );
                break;
            }
        }
    }

    registry.unregister(connection_id);
    writer.abort();
}
