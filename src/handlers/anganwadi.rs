use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;

use crate::service::anganwadi;
use crate::types::AnganwadiCenter;
use crate::types::anganwadi::{CenterPatch, NewCenter};
use crate::{NrcError, router::NrcState};
use super::JsonBody;

pub async fn list_centers_handler(
    State(state): State<NrcState>,
) -> Result<Json<Vec<AnganwadiCenter>>, NrcError> {
    let list = state
        .store
        .atomic(|db| Box::pin(async move { anganwadi::list(&*db).await }))
        .await?;
    Ok(Json(list))
}

pub async fn create_center_handler(
    State(state): State<NrcState>,
    WithRejection(Json(input), _): JsonBody<NewCenter>,
) -> Result<(StatusCode, Json<AnganwadiCenter>), NrcError> {
    let center = state
        .store
        .atomic(move |db| Box::pin(async move { anganwadi::create(db, input).await }))
        .await?;
    Ok((StatusCode::CREATED, Json(center)))
}

pub async fn get_center_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
) -> Result<Json<AnganwadiCenter>, NrcError> {
    let center = state
        .store
        .atomic(move |db| Box::pin(async move { anganwadi::get(&*db, &id).await }))
        .await?;
    Ok(Json(center))
}

pub async fn update_center_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
    WithRejection(Json(input), _): JsonBody<CenterPatch>,
) -> Result<Json<AnganwadiCenter>, NrcError> {
    let center = state
        .store
        .atomic(move |db| Box::pin(async move { anganwadi::update(db, &id, input).await }))
        .await?;
    Ok(Json(center))
}

pub async fn delete_center_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
) -> Result<StatusCode, NrcError> {
    state
        .store
        .atomic(move |db| Box::pin(async move { anganwadi::delete(db, &id).await }))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
