use axum::{
    debug_handler,
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::AppResult;

#[derive(Deserialize)]
pub(crate) struct LogoutQuery {
    pub(crate) return_url: Option<String>,
}

#[debug_handler]
pub(crate) async fn logout(
    Query(LogoutQuery { return_url }): Query<LogoutQuery>,
    session: Session,
) -> AppResult<Response> {
    session.flush().await?;
    tracing::debug!("session cleared");

    Ok(match return_url {
        // Same-site paths only.
        Some(return_url) if return_url.starts_with('/') && !return_url.starts_with("//") => {
            Redirect::to(&return_url).into_response()
        }
        _ => StatusCode::NO_CONTENT.into_response(),
    })
}
