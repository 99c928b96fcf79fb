use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppResult, auth::AuthUser, models::NotificationId, res, rooms::parse_id, services::ChatService,
};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn list(
    State(chat): State<ChatService>,
    AuthUser(user_id): AuthUser,
) -> AppResult<impl IntoResponse> {
    let notifications = chat.list_notifications(user_id).await?;
    Ok(res::ok("Successfully get notification", notifications))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn mark_read(
    Path(id): Path<String>,
    State(chat): State<ChatService>,
    AuthUser(user_id): AuthUser,
) -> AppResult<impl IntoResponse> {
    let id: NotificationId = parse_id(&id, "notification")?;
    chat.mark_notification_read(id, user_id).await?;
    Ok(res::success::<()>(StatusCode::OK, "Successfully read notification", None))
}
