use axum::{
    debug_handler,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{AppResult, auth::AuthUser, models::RoomId, res, services::ChatService};

use super::parse_id;

#[debug_handler(state = crate::AppState)]
pub(crate) async fn rooms(
    State(chat): State<ChatService>,
    AuthUser(user_id): AuthUser,
) -> AppResult<impl IntoResponse> {
    let rooms = chat.get_rooms(user_id).await?;
    Ok(res::ok("Successfully get chat rooms", rooms))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn messages(
    Path(room_id): Path<String>,
    State(chat): State<ChatService>,
    AuthUser(user_id): AuthUser,
) -> AppResult<impl IntoResponse> {
    let room_id: RoomId = parse_id(&room_id, "room")?;
    let history = chat.get_messages(room_id, user_id).await?;
    Ok(res::ok("Successfully get messages", history))
}
