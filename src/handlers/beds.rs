use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;

use crate::service::beds::{self, Release};
use crate::types::Bed;
use crate::types::bed::{
    AssignBedRequest, BedQuery, BedSummary, MaintenanceRequest, NewBed, ReleaseBedRequest,
};
use crate::{NrcError, router::NrcState};
use super::JsonBody;

pub async fn list_beds_handler(
    State(state): State<NrcState>,
    Query(query): Query<BedQuery>,
) -> Result<Json<Vec<Bed>>, NrcError> {
    let list = state
        .store
        .atomic(move |db| Box::pin(async move { beds::list(&*db, query).await }))
        .await?;
    Ok(Json(list))
}

pub async fn create_bed_handler(
    State(state): State<NrcState>,
    WithRejection(Json(input), _): JsonBody<NewBed>,
) -> Result<(StatusCode, Json<Bed>), NrcError> {
    let bed = state
        .store
        .atomic(move |db| Box::pin(async move { beds::create(db, input).await }))
        .await?;
    Ok((StatusCode::CREATED, Json(bed)))
}

pub async fn bed_summary_handler(
    State(state): State<NrcState>,
) -> Result<Json<BedSummary>, NrcError> {
    let summary = state
        .store
        .atomic(|db| Box::pin(async move { beds::summary(&*db).await }))
        .await?;
    Ok(Json(summary))
}

pub async fn get_bed_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
) -> Result<Json<Bed>, NrcError> {
    let bed = state
        .store
        .atomic(move |db| Box::pin(async move { beds::get(&*db, &id).await }))
        .await?;
    Ok(Json(bed))
}

pub async fn delete_bed_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
) -> Result<StatusCode, NrcError> {
    state
        .store
        .atomic(move |db| Box::pin(async move { beds::delete(db, &id).await }))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/beds/{id}/assign
pub async fn assign_bed_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
    WithRejection(Json(req), _): JsonBody<AssignBedRequest>,
) -> Result<Json<Bed>, NrcError> {
    let bed = state
        .store
        .atomic(move |db| {
            Box::pin(async move { beds::assign(db, &id, &req.patient_id).await })
        })
        .await?;
    Ok(Json(bed))
}

/// POST /api/beds/{id}/release. An empty body frees the bed without discharge.
pub async fn release_bed_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
    WithRejection(req, _): WithRejection<Option<Json<ReleaseBedRequest>>, NrcError>,
) -> Result<Json<Release>, NrcError> {
    let req = req.map(|Json(r)| r).unwrap_or_default();
    let followup = state.followup;
    let out = state
        .store
        .atomic(move |db| Box::pin(async move { beds::release(db, &id, req, followup).await }))
        .await?;
    Ok(Json(out))
}

pub async fn bed_maintenance_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
    WithRejection(Json(req), _): JsonBody<MaintenanceRequest>,
) -> Result<Json<Bed>, NrcError> {
    let bed = state
        .store
        .atomic(move |db| Box::pin(async move { beds::set_maintenance(db, &id, req.on).await }))
        .await?;
    Ok(Json(bed))
}
