use axum::{Json, debug_handler, extract::State, http::StatusCode, response::IntoResponse};

use crate::{
    AppResult,
    auth::AuthUser,
    models::{RoomId, SendMessageRequest},
    res,
    services::ChatService,
};

use super::parse_id;

#[debug_handler(state = crate::AppState)]
pub(crate) async fn send_message(
    State(chat): State<ChatService>,
    AuthUser(user_id): AuthUser,
    Json(SendMessageRequest { room_id, message }): Json<SendMessageRequest>,
) -> AppResult<impl IntoResponse> {
    let room_id: RoomId = parse_id(&room_id, "room")?;
    chat.send_message(room_id, user_id, message).await?;
    Ok(res::success::<()>(StatusCode::CREATED, "Successfully create message", None))
}
