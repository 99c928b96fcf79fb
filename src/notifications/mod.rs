mod read;

use axum::{
    Router,
    routing::{get, patch},
};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(read::list))
        .route("/{id}/read", patch(read::mark_read))
}
