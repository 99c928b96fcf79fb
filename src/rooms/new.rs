use axum::{
    debug_handler,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    AppResult,
    auth::AuthUser,
    models::{RoomHandle, UserId},
    res,
    services::ChatService,
};

use super::parse_id;

#[debug_handler(state = crate::AppState)]
pub(crate) async fn get_or_create_room(
    Path(peer_id): Path<String>,
    State(chat): State<ChatService>,
    AuthUser(user_id): AuthUser,
) -> AppResult<impl IntoResponse> {
    let peer_id: UserId = parse_id(&peer_id, "user")?;
    let id = chat.resolve_room(user_id, peer_id).await?;
    Ok(res::ok("Successfully get chat room", RoomHandle { id }))
}
