use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The uniform JSON envelope every non-WebSocket route answers with.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub struct Reply<T>(pub StatusCode, pub Envelope<T>);

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        (self.0, Json(self.1)).into_response()
    }
}

pub fn success<T: Serialize>(status: StatusCode, message: &str, data: Option<T>) -> Reply<T> {
    Reply(
        status,
        Envelope {
            success: true,
            message: message.to_owned(),
            error: None,
            data,
        },
    )
}

pub fn ok<T: Serialize>(message: &str, data: T) -> Reply<T> {
    success(StatusCode::OK, message, Some(data))
}

pub fn failure(status: StatusCode, error: String) -> Reply<()> {
    let message = status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_owned();
    Reply(
        status,
        Envelope {
            success: false,
            message,
            error: Some(error),
            data: None,
        },
    )
}
