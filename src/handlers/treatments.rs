use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;

use crate::service::treatments;
use crate::types::TreatmentTracker;
use crate::types::treatment::{DailyRecord, NewTracker, Progress, TrackerPatch, TrackerQuery};
use crate::{NrcError, router::NrcState};
use super::JsonBody;

pub async fn list_trackers_handler(
    State(state): State<NrcState>,
    Query(query): Query<TrackerQuery>,
) -> Result<Json<Vec<TreatmentTracker>>, NrcError> {
    let list = state
        .store
        .atomic(move |db| Box::pin(async move { treatments::list(&*db, query).await }))
        .await?;
    Ok(Json(list))
}

pub async fn create_tracker_handler(
    State(state): State<NrcState>,
    WithRejection(Json(input), _): JsonBody<NewTracker>,
) -> Result<(StatusCode, Json<TreatmentTracker>), NrcError> {
    let tracker = state
        .store
        .atomic(move |db| Box::pin(async move { treatments::create(db, input).await }))
        .await?;
    Ok((StatusCode::CREATED, Json(tracker)))
}

pub async fn get_tracker_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
) -> Result<Json<TreatmentTracker>, NrcError> {
    let tracker = state
        .store
        .atomic(move |db| Box::pin(async move { treatments::get(&*db, &id).await }))
        .await?;
    Ok(Json(tracker))
}

pub async fn update_tracker_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
    WithRejection(Json(input), _): JsonBody<TrackerPatch>,
) -> Result<Json<TreatmentTracker>, NrcError> {
    let tracker = state
        .store
        .atomic(move |db| Box::pin(async move { treatments::update(db, &id, input).await }))
        .await?;
    Ok(Json(tracker))
}

/// POST /api/treatments/{id}/records
pub async fn add_record_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
    WithRejection(Json(record), _): JsonBody<DailyRecord>,
) -> Result<Json<TreatmentTracker>, NrcError> {
    let tracker = state
        .store
        .atomic(move |db| Box::pin(async move { treatments::add_record(db, &id, record).await }))
        .await?;
    Ok(Json(tracker))
}

pub async fn progress_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
) -> Result<Json<Progress>, NrcError> {
    let progress = state
        .store
        .atomic(move |db| Box::pin(async move { treatments::progress(&*db, &id).await }))
        .await?;
    Ok(Json(progress))
}
