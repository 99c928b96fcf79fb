pub mod auth;
pub mod broadcast;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod notifications;
pub mod registry;
pub mod res;
pub mod rooms;
pub mod services;

use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::Config, error::ChatError, registry::ConnectionRegistry, services::ChatService};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub chat: ChatService,
    pub registry: ConnectionRegistry,
    pub config: Arc<Config>,
}

/// Every route, without the session layer (the caller picks the store).
pub fn router(app_state: AppState) -> Router {
    Router::new()
        .nest("/api/chat", rooms::router())
        .nest("/api/notifications", notifications::router())
        .nest("/auth", auth::router())
        .route("/ws/{room_id}", axum::routing::get(rooms::ws::room_ws))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub type AppResult<T> = Result<T, AppError>;
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.0.downcast_ref::<ChatError>() {
            Some(err) => res::failure(err.status_code(), err.public_message()).into_response(),
            None => {
                tracing::error!(error = ?self.0, "unhandled error");
                res::failure(StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_owned())
                    .into_response()
            }
        }
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        Self(anyhow::Error::msg(err.to_owned()))
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(ChatError);
apperr_impl!(tower_sessions::session::Error);
