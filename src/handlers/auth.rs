use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::WithRejection;

use crate::service::users;
use crate::types::User;
use crate::types::user::{LoginRequest, SignupRequest};
use crate::{NrcError, router::NrcState};
use super::JsonBody;

/// POST /api/auth/signup
pub async fn signup_handler(
    State(state): State<NrcState>,
    WithRejection(Json(req), _): JsonBody<SignupRequest>,
) -> Result<(StatusCode, Json<User>), NrcError> {
    let user = state
        .store
        .atomic(move |db| Box::pin(async move { users::signup(db, req).await }))
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/auth/login
///
/// Attempts are throttled per username before the password is looked at.
pub async fn login_handler(
    State(state): State<NrcState>,
    WithRejection(Json(req), _): JsonBody<LoginRequest>,
) -> Result<Json<User>, NrcError> {
    state.throttle.check(&req.username)?;
    let user = state
        .store
        .atomic(move |db| Box::pin(async move { users::login(&*db, req).await }))
        .await?;
    Ok(Json(user))
}
