use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;

use crate::service::{patients, treatments};
use crate::types::patient::{NewPatient, PatientPatch, PatientQuery};
use crate::types::{Patient, TreatmentTracker};
use crate::{NrcError, router::NrcState};
use super::JsonBody;

pub async fn list_patients_handler(
    State(state): State<NrcState>,
    Query(query): Query<PatientQuery>,
) -> Result<Json<Vec<Patient>>, NrcError> {
    let list = state
        .store
        .atomic(move |db| Box::pin(async move { patients::list(&*db, query).await }))
        .await?;
    Ok(Json(list))
}

/// POST /api/patients. SAM children trigger alerts in the same job.
pub async fn create_patient_handler(
    State(state): State<NrcState>,
    WithRejection(Json(input), _): JsonBody<NewPatient>,
) -> Result<(StatusCode, Json<Patient>), NrcError> {
    let patient = state
        .store
        .atomic(move |db| Box::pin(async move { patients::create(db, input).await }))
        .await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

pub async fn get_patient_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, NrcError> {
    let patient = state
        .store
        .atomic(move |db| Box::pin(async move { patients::get(&*db, &id).await }))
        .await?;
    Ok(Json(patient))
}

pub async fn update_patient_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
    WithRejection(Json(input), _): JsonBody<PatientPatch>,
) -> Result<Json<Patient>, NrcError> {
    let patient = state
        .store
        .atomic(move |db| Box::pin(async move { patients::update(db, &id, input).await }))
        .await?;
    Ok(Json(patient))
}

pub async fn delete_patient_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
) -> Result<StatusCode, NrcError> {
    state
        .store
        .atomic(move |db| Box::pin(async move { patients::delete(db, &id).await }))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/patients/{id}/treatment
pub async fn patient_treatment_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
) -> Result<Json<TreatmentTracker>, NrcError> {
    let tracker = state
        .store
        .atomic(move |db| Box::pin(async move { treatments::for_patient(&*db, &id).await }))
        .await?;
    Ok(Json(tracker))
}
