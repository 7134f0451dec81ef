use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;

use crate::service::visits;
use crate::types::Visit;
use crate::types::visit::{NewVisit, VisitPatch, VisitQuery};
use crate::{NrcError, router::NrcState};
use super::JsonBody;

pub async fn list_visits_handler(
    State(state): State<NrcState>,
    Query(query): Query<VisitQuery>,
) -> Result<Json<Vec<Visit>>, NrcError> {
    let list = state
        .store
        .atomic(move |db| Box::pin(async move { visits::list(&*db, query).await }))
        .await?;
    Ok(Json(list))
}

pub async fn schedule_visit_handler(
    State(state): State<NrcState>,
    WithRejection(Json(input), _): JsonBody<NewVisit>,
) -> Result<(StatusCode, Json<Visit>), NrcError> {
    let visit = state
        .store
        .atomic(move |db| Box::pin(async move { visits::schedule(db, input).await }))
        .await?;
    Ok((StatusCode::CREATED, Json(visit)))
}

pub async fn get_visit_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
) -> Result<Json<Visit>, NrcError> {
    let visit = state
        .store
        .atomic(move |db| Box::pin(async move { visits::get(&*db, &id).await }))
        .await?;
    Ok(Json(visit))
}

pub async fn update_visit_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
    WithRejection(Json(input), _): JsonBody<VisitPatch>,
) -> Result<Json<Visit>, NrcError> {
    let visit = state
        .store
        .atomic(move |db| Box::pin(async move { visits::update(db, &id, input).await }))
        .await?;
    Ok(Json(visit))
}

pub async fn delete_visit_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
) -> Result<StatusCode, NrcError> {
    state
        .store
        .atomic(move |db| Box::pin(async move { visits::delete(db, &id).await }))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
