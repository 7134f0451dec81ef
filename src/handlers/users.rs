use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::middleware::auth::RequireAdmin;
use crate::service::users;
use crate::types::User;
use crate::types::user::UserQuery;
use crate::{NrcError, router::NrcState};

pub async fn list_users_handler(
    _admin: RequireAdmin,
    State(state): State<NrcState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<User>>, NrcError> {
    let list = state
        .store
        .atomic(move |db| Box::pin(async move { users::list(&*db, query).await }))
        .await?;
    Ok(Json(list))
}

pub async fn get_user_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
) -> Result<Json<User>, NrcError> {
    let user = state
        .store
        .atomic(move |db| Box::pin(async move { users::get(&*db, &id).await }))
        .await?;
    Ok(Json(user))
}

pub async fn delete_user_handler(
    _admin: RequireAdmin,
    State(state): State<NrcState>,
    Path(id): Path<String>,
) -> Result<StatusCode, NrcError> {
    state
        .store
        .atomic(move |db| Box::pin(async move { users::delete(db, &id).await }))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
