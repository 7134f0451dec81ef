use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;

use crate::service::notifications;
use crate::types::Notification;
use crate::types::notification::{MarkAllReadRequest, NewNotification, NotificationQuery};
use crate::{NrcError, router::NrcState};
use super::JsonBody;

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: usize,
}

pub async fn list_notifications_handler(
    State(state): State<NrcState>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Vec<Notification>>, NrcError> {
    let list = state
        .store
        .atomic(move |db| Box::pin(async move { notifications::list(&*db, query).await }))
        .await?;
    Ok(Json(list))
}

pub async fn create_notification_handler(
    State(state): State<NrcState>,
    WithRejection(Json(input), _): JsonBody<NewNotification>,
) -> Result<(StatusCode, Json<Notification>), NrcError> {
    let n = state
        .store
        .atomic(move |db| Box::pin(async move { notifications::create(db, input).await }))
        .await?;
    Ok((StatusCode::CREATED, Json(n)))
}

pub async fn get_notification_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
) -> Result<Json<Notification>, NrcError> {
    let n = state
        .store
        .atomic(move |db| Box::pin(async move { notifications::get(&*db, &id).await }))
        .await?;
    Ok(Json(n))
}

pub async fn mark_read_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
) -> Result<Json<Notification>, NrcError> {
    let n = state
        .store
        .atomic(move |db| Box::pin(async move { notifications::mark_read(db, &id).await }))
        .await?;
    Ok(Json(n))
}

/// POST /api/notifications/read-all
pub async fn mark_all_read_handler(
    State(state): State<NrcState>,
    WithRejection(Json(req), _): JsonBody<MarkAllReadRequest>,
) -> Result<Json<MarkedRead>, NrcError> {
    let updated = state
        .store
        .atomic(move |db| {
            Box::pin(async move { notifications::mark_all_read(db, &req.user_id, req.role).await })
        })
        .await?;
    Ok(Json(MarkedRead { updated }))
}

pub async fn delete_notification_handler(
    State(state): State<NrcState>,
    Path(id): Path<String>,
) -> Result<StatusCode, NrcError> {
    state
        .store
        .atomic(move |db| Box::pin(async move { notifications::delete(db, &id).await }))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
