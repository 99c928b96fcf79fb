mod msg;
mod new;
mod room;
pub(crate) mod ws;

use std::str::FromStr;

use axum::{
    Router,
    routing::{get, post},
};

use crate::{AppState, error::ChatError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(room::rooms))
        .route("/room/{peer_id}", get(new::get_or_create_room))
        .route("/send", post(msg::send_message))
        .route("/messages/{room_id}", get(room::messages))
}

/// Identifiers arrive as text so a malformed one gets the usual envelope.
pub(crate) fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, ChatError> {
    raw.trim()
        .parse()
        .map_err(|_| ChatError::InvalidRequest(format!("malformed {what} id")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoomId;

    #[test]
    fn malformed_ids_are_invalid_requests() {
        let err = parse_id::<RoomId>("not-a-uuid", "room").unwrap_err();
        assert_eq!(err, ChatError::InvalidRequest("malformed room id".into()));
        assert!(parse_id::<RoomId>(&RoomId::new().to_string(), "room").is_ok());
    }
}
