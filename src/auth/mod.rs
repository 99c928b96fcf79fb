mod logout;

use axum::{Router, extract::FromRequestParts, http::request::Parts, routing::post};
use tower_sessions::Session;

use crate::{AppError, AppState, error::ChatError, models::UserId};

/// Session key the login flow stores the authenticated user under.
pub const USER_ID: &str = "user_id";

pub fn router() -> Router<AppState> {
    Router::new().route("/logout", post(logout::logout))
}

/// The authenticated caller of a request.
///
/// Identity is established elsewhere (the login flow writes [`USER_ID`] into
/// the session); handlers take this instead of poking at the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub UserId);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, reason)| AppError::from(reason))?;

        match session.get::<UserId>(USER_ID).await? {
            Some(user_id) => Ok(AuthUser(user_id)),
            None => Err(ChatError::Unauthorized.into()),
        }
    }
}
