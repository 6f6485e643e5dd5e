use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Extension,
    Json,
};

use crate::{
    api::{
        dto::{ApiResponse, UploadedFile},
        middleware::auth::CurrentUser,
        state::AppState,
    },
    error::{AppError, Result},
    web::uploads::save_uploaded_file,
};

/// Accepts a multipart form with a single `file` field.
#[utoipa::path(
    post,
    path = "/api/uploads",
    tag = "uploads",
    responses(
        (status = 201, description = "Stored", body = UploadedFile),
        (status = 422, description = "Missing file or too large"),
    )
)]
pub async fn upload(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<UploadedFile>>)> {
    let uploads = &state.settings.uploads;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        let path = save_uploaded_file(&uploads.dir, &filename, &data, uploads.max_bytes).await?;
        tracing::info!(user_id = user.id, %path, size = data.len(), "File uploaded");

        return Ok((StatusCode::CREATED, Json(ApiResponse::ok(UploadedFile { path }))));
    }

    Err(AppError::Validation("No file field in upload".to_string()))
}
