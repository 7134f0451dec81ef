use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;

use crate::service::workers;
use crate::types::Worker;
use crate::types::worker::{NewWorker, WorkerPatch, WorkerQuery};
use crate::{NrcError, router::NrcState};
use super::JsonBody;

pub async fn list_workers_handler(
    State(state): State<NrcState>,
    Query(query): Query<WorkerQuery>,
) -> Result<Json<Vec<Worker>>, NrcError> {
    let list = state
        .store
        .atomic(move |db| Box::pin(async move { workers::list(&*db, query).await }))
        .await?;
    Ok(Json(list))
}

pub async fn create_worker_handler(
    State(state): State<NrcState>,
    WithRejection(Json(input), _): JsonBody<NewWorker>,
) -> Result<(StatusCode, Json<Worker>), NrcError> {
    let worker = state
        .store
        .atomic(move |db| Box::pin(async move { workers::create(db, input).await }))
        .await?;
    Ok((StatusCode::CREATED, Json(worker)))
}

pub async fn get_worker_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
) -> Result<Json<Worker>, NrcError> {
    let worker = state
        .store
        .atomic(move |db| Box::pin(async move { workers::get(&*db, &id).await }))
        .await?;
    Ok(Json(worker))
}

pub async fn update_worker_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
    WithRejection(Json(input), _): JsonBody<WorkerPatch>,
) -> Result<Json<Worker>, NrcError> {
    let worker = state
        .store
        .atomic(move |db| Box::pin(async move { workers::update(db, &id, input).await }))
        .await?;
    Ok(Json(worker))
}

pub async fn delete_worker_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
) -> Result<StatusCode, NrcError> {
    state
        .store
        .atomic(move |db| Box::pin(async move { workers::delete(db, &id).await }))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
