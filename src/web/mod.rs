pub mod uploads;

use axum::Router;
use tower_http::services::ServeDir;

use crate::api::state::AppState;

/// Serves stored uploads back under `/uploads`.
pub fn create_web_routes(state: AppState) -> Router {
    let uploads_dir = state.settings.uploads.dir.clone();

    Router::new()
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .with_state(state)
}
