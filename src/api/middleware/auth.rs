use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{
    api::state::AppState,
    error::AppError,
};

pub use crate::auth::CurrentUser;

type BearerHeader = TypedHeader<Authorization<Bearer>>;

fn authenticate(state: &AppState, bearer: Option<BearerHeader>) -> Result<CurrentUser, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AppError::Unauthorized)?;
    state.service_context.token_verifier.verify(bearer.token())
}

pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Option<BearerHeader>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&state, bearer)?;

    // Insert current user into request extensions
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Admins and moderators only.
pub async fn require_publisher(
    State(state): State<AppState>,
    bearer: Option<BearerHeader>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&state, bearer)?;

    if !user.role.can_publish() {
        tracing::debug!(user_id = user.id, "Publisher route refused");
        return Err(AppError::Forbidden);
    }

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Attaches the user when a valid token is present; anonymous otherwise.
pub async fn optional_auth(
    State(state): State<AppState>,
    bearer: Option<BearerHeader>,
    mut request: Request,
    next: Next,
) -> Response {
    if bearer.is_some() {
        if let Ok(user) = authenticate(&state, bearer) {
            request.extensions_mut().insert(user);
        }
    }

    next.run(request).await
}
