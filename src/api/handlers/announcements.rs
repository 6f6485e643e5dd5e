use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
    Extension,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    api::{
        dto::{AnnouncementDto, ApiResponse},
        middleware::auth::CurrentUser,
        state::AppState,
    },
    domain::{Announcement, CreateAnnouncementRequest, PinRequest, UpdateAnnouncementRequest, Viewer},
    error::Result,
};

type ListResponse = Json<ApiResponse<Vec<AnnouncementDto>>>;
type ItemResponse = Json<ApiResponse<AnnouncementDto>>;
type CountResponse = Json<ApiResponse<i64>>;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SlideQuery {
    /// 1-based page number (default 1).
    pub page: Option<i64>,
    /// Page size (default 10, at most 100).
    pub limit: Option<i64>,
}

fn viewer_of(user: Option<Extension<CurrentUser>>) -> Viewer {
    user.map(|Extension(user)| user.viewer())
        .unwrap_or(Viewer::Anonymous)
}

fn to_dtos(announcements: Vec<Announcement>) -> Vec<AnnouncementDto> {
    announcements.into_iter().map(AnnouncementDto::from).collect()
}

#[utoipa::path(
    get,
    path = "/api/announcements",
    tag = "announcements",
    responses(
        (status = 200, description = "Every announcement, pinned first", body = [AnnouncementDto]),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Not an admin or moderator"),
    )
)]
pub async fn list(State(state): State<AppState>) -> Result<ListResponse> {
    let announcements = state.service_context.announcement_service.list_all().await?;
    Ok(Json(ApiResponse::ok(to_dtos(announcements))))
}

#[utoipa::path(
    get,
    path = "/api/announcements/slide",
    tag = "announcements",
    params(SlideQuery),
    responses((status = 200, description = "One page of announcements visible to the caller", body = [AnnouncementDto]))
)]
pub async fn slides(
    State(state): State<AppState>,
    Query(params): Query<SlideQuery>,
    user: Option<Extension<CurrentUser>>,
) -> Result<ListResponse> {
    let viewer = viewer_of(user);
    let (announcements, pagination) = state.service_context.announcement_service
        .slides(&viewer, params.page, params.limit, Utc::now())
        .await?;

    Ok(Json(ApiResponse::paginated(to_dtos(announcements), pagination)))
}

#[utoipa::path(
    get,
    path = "/api/announcements/pinned",
    tag = "announcements",
    responses((status = 200, description = "Pinned announcements visible to the caller", body = [AnnouncementDto]))
)]
pub async fn pinned(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> Result<ListResponse> {
    let viewer = viewer_of(user);
    let announcements = state.service_context.announcement_service
        .pinned(&viewer, Utc::now())
        .await?;

    Ok(Json(ApiResponse::ok(to_dtos(announcements))))
}

#[utoipa::path(
    get,
    path = "/api/announcements/public",
    tag = "announcements",
    responses((status = 200, description = "Public announcements", body = [AnnouncementDto]))
)]
pub async fn public(State(state): State<AppState>) -> Result<ListResponse> {
    let announcements = state.service_context.announcement_service
        .public(Utc::now())
        .await?;

    Ok(Json(ApiResponse::ok(to_dtos(announcements))))
}

#[utoipa::path(
    get,
    path = "/api/announcements/{id}",
    tag = "announcements",
    params(("id" = i64, Path, description = "Announcement id")),
    responses(
        (status = 200, description = "The announcement", body = AnnouncementDto),
        (status = 404, description = "Unknown or not visible to the caller"),
    )
)]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: Option<Extension<CurrentUser>>,
) -> Result<ItemResponse> {
    let viewer = viewer_of(user);
    let announcement = state.service_context.announcement_service
        .get(id, &viewer, Utc::now())
        .await?;

    Ok(Json(ApiResponse::ok(announcement.into())))
}

#[utoipa::path(
    post,
    path = "/api/announcements",
    tag = "announcements",
    request_body = CreateAnnouncementRequest,
    responses(
        (status = 201, description = "Created", body = AnnouncementDto),
        (status = 422, description = "Validation failed"),
    )
)]
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(request): Json<CreateAnnouncementRequest>,
) -> Result<(StatusCode, ItemResponse)> {
    let announcement = state.service_context.announcement_service
        .create(request, user.id, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(announcement.into()))))
}

#[utoipa::path(
    put,
    path = "/api/announcements/{id}",
    tag = "announcements",
    params(("id" = i64, Path, description = "Announcement id")),
    request_body = UpdateAnnouncementRequest,
    responses(
        (status = 200, description = "Updated", body = AnnouncementDto),
        (status = 404, description = "Unknown id"),
        (status = 422, description = "Validation failed"),
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateAnnouncementRequest>,
) -> Result<ItemResponse> {
    let announcement = state.service_context.announcement_service
        .update(id, request)
        .await?;

    Ok(Json(ApiResponse::ok(announcement.into())))
}

#[utoipa::path(
    patch,
    path = "/api/announcements/{id}/pin",
    tag = "announcements",
    params(("id" = i64, Path, description = "Announcement id")),
    request_body = PinRequest,
    responses((status = 200, description = "Pin state changed", body = AnnouncementDto))
)]
pub async fn set_pin(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<PinRequest>,
) -> Result<ItemResponse> {
    let announcement = state.service_context.announcement_service
        .set_pinned(id, request.pinned)
        .await?;

    Ok(Json(ApiResponse::ok(announcement.into())))
}

#[utoipa::path(
    delete,
    path = "/api/announcements/{id}",
    tag = "announcements",
    params(("id" = i64, Path, description = "Announcement id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Unknown id"),
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<()>>> {
    state.service_context.announcement_service.delete(id).await?;
    tracing::debug!(id, user_id = user.id, "Delete requested by user");

    Ok(Json(ApiResponse::message("Announcement deleted")))
}

#[utoipa::path(
    get,
    path = "/api/announcements/stats/count",
    tag = "announcements",
    responses((status = 200, description = "Total number of announcements", body = i64))
)]
pub async fn count(State(state): State<AppState>) -> Result<CountResponse> {
    let count = state.service_context.announcement_service.count().await?;
    Ok(Json(ApiResponse::ok(count)))
}

#[utoipa::path(
    get,
    path = "/api/announcements/stats/pinned/count",
    tag = "announcements",
    responses((status = 200, description = "Number of pinned announcements", body = i64))
)]
pub async fn pinned_count(State(state): State<AppState>) -> Result<CountResponse> {
    let count = state.service_context.announcement_service.count_pinned().await?;
    Ok(Json(ApiResponse::ok(count)))
}

#[utoipa::path(
    get,
    path = "/api/announcements/stats/weekly/count",
    tag = "announcements",
    responses((status = 200, description = "Announcements created in the last seven days", body = i64))
)]
pub async fn weekly_count(State(state): State<AppState>) -> Result<CountResponse> {
    let count = state.service_context.announcement_service.count_weekly(Utc::now()).await?;
    Ok(Json(ApiResponse::ok(count)))
}
