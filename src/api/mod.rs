pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    Router,
    routing::{get, patch, post, put},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::Settings,
    domain::{Audience, CreateAnnouncementRequest, Pagination, PinRequest, UpdateAnnouncementRequest},
    service::ServiceContext,
    web,
};
use dto::{AnnouncementDto, UploadedFile};
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::announcements::list,
        handlers::announcements::slides,
        handlers::announcements::pinned,
        handlers::announcements::public,
        handlers::announcements::get,
        handlers::announcements::create,
        handlers::announcements::update,
        handlers::announcements::set_pin,
        handlers::announcements::delete,
        handlers::announcements::count,
        handlers::announcements::pinned_count,
        handlers::announcements::weekly_count,
        handlers::uploads::upload,
    ),
    components(schemas(
        AnnouncementDto,
        Audience,
        CreateAnnouncementRequest,
        UpdateAnnouncementRequest,
        PinRequest,
        Pagination,
        UploadedFile,
    )),
    tags((name = "announcements", description = "Announcement lifecycle"))
)]
pub struct ApiDoc;

pub fn create_app(
    service_context: Arc<ServiceContext>,
    settings: Arc<Settings>,
) -> Router {
    let app_state = AppState::new(service_context, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))

        // API routes
        .nest("/api", api_routes(app_state.clone()))
        .merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", ApiDoc::openapi()))

        // Add state to the router
        .with_state(app_state.clone())

        // Stored uploads
        .merge(web::create_web_routes(app_state))

        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive()) // Configure properly for production
        .layer(TraceLayer::new_for_http())
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/announcements", announcement_routes(state.clone()))
        .nest("/uploads", upload_routes(state))
}

fn announcement_routes(state: AppState) -> Router<AppState> {
    // Readable by anyone; the caller's role narrows what is returned
    let open = Router::new()
        .route("/public", get(handlers::announcements::public))
        .route("/slide", get(handlers::announcements::slides))
        .route("/pinned", get(handlers::announcements::pinned))
        .route("/:id", get(handlers::announcements::get))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::optional_auth,
        ));

    let stats = Router::new()
        .route("/stats/count", get(handlers::announcements::count))
        .route("/stats/pinned/count", get(handlers::announcements::pinned_count))
        .route("/stats/weekly/count", get(handlers::announcements::weekly_count))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    let publisher = Router::new()
        .route("/", get(handlers::announcements::list).post(handlers::announcements::create))
        .route("/:id", put(handlers::announcements::update).delete(handlers::announcements::delete))
        .route("/:id/pin", patch(handlers::announcements::set_pin))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_publisher,
        ));

    open.merge(stats).merge(publisher)
}

fn upload_routes(state: AppState) -> Router<AppState> {
    let limit = state.settings.uploads.max_bytes + 64 * 1024;

    Router::new()
        .route("/", post(handlers::uploads::upload))
        .layer(DefaultBodyLimit::max(limit))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ))
}
